use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod serve;
pub mod submit;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a worker server: bind, announce the port on stdout, serve forever.
    Serve(ServeArgs),
    /// Submit one task to a running worker server and print its outputs.
    Submit(SubmitArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Submit(args) => submit::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind, e.g. 127.0.0.1:0 (port 0 = OS-assigned).
    pub address: String,
    /// Number of acceptor threads sharing the listening socket.
    #[arg(long, default_value = "1")]
    pub acceptors: usize,
    /// Worker pool size (the concurrency ceiling).
    #[arg(long, default_value = "8")]
    pub pool_size: usize,
    /// Accepted connections that may wait for a free worker.
    #[arg(long, default_value = "64")]
    pub queue_depth: usize,
    /// Serializer pipeline expression, e.g. "batched(compressed(plain), 10)".
    #[arg(long, default_value = "plain")]
    pub serializer: String,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Address of a running worker server, e.g. 127.0.0.1:7077.
    pub address: String,
    /// Split index to execute.
    #[arg(long, default_value = "0")]
    pub split_index: i32,
    /// Serializer pipeline expression; must match the server's.
    #[arg(long, default_value = "plain")]
    pub serializer: String,
    /// Input value as a JSON literal. Repeatable, order-preserving.
    #[arg(long = "input", value_name = "JSON")]
    pub inputs: Vec<String>,
    /// Emit these literal values (JSON array) before other stages.
    #[arg(long, value_name = "JSON_ARRAY")]
    pub emit: Option<String>,
    /// Add this integer to every value.
    #[arg(long, value_name = "N")]
    pub map_add: Option<i64>,
    /// Multiply every value by this integer.
    #[arg(long, value_name = "N")]
    pub map_mul: Option<i64>,
    /// Keep only integers greater than this.
    #[arg(long, value_name = "N")]
    pub filter_gt: Option<i64>,
    /// Keep at most the first N values.
    #[arg(long, value_name = "N")]
    pub take: Option<u64>,
    /// Collapse the stream into its integer sum.
    #[arg(long, conflicts_with = "count")]
    pub sum: bool,
    /// Collapse the stream into its length.
    #[arg(long, conflicts_with = "sum")]
    pub count: bool,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {}
