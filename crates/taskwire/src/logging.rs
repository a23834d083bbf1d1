use clap::ValueEnum;
use tracing::Level;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Install the global subscriber.
///
/// Everything goes to stderr: stdout belongs to the port handshake in `serve`
/// and to command output in `submit`. Safe to call more than once; a second
/// call is a no-op.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let base = tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false);

    let _ = match format {
        LogFormat::Json => base.json().try_init(),
        LogFormat::Text => base.try_init(),
    };
}
