use std::net::SocketAddr;

/// Errors that can occur in server and client operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to a worker server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error on a connection outside the framing layer.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] taskwire_frame::FrameError),

    /// Serializer stack error.
    #[error("codec error: {0}")]
    Codec(#[from] taskwire_codec::CodecError),

    /// The closure blob did not decode to a task.
    #[error("malformed closure: {0}")]
    MalformedClosure(#[source] bincode::Error),

    /// Task evaluation failed.
    #[error("task failed: {0}")]
    Task(#[from] crate::task::TaskError),

    /// The peer closed the connection before the response terminator.
    ///
    /// The protocol has no in-band error signaling; this is the only way a
    /// worker-side failure is observable.
    #[error("peer disconnected before the terminator frame: {0}")]
    Disconnected(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
