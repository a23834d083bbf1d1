/// Errors that can occur in serializer construction and use.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A value failed to encode to bytes.
    #[error("encode failed: {0}")]
    Encode(#[source] bincode::Error),

    /// Bytes failed to decode to a value.
    #[error("decode failed: {0}")]
    Decode(#[source] bincode::Error),

    /// A compressed payload could not be inflated.
    #[error("corrupt compressed payload: {0}")]
    Compression(#[source] std::io::Error),

    /// Strict registry lookup missed.
    #[error("serializer {0:?} is not registered")]
    UnknownSerializer(String),

    /// A builder expression could not be parsed or resolved.
    #[error("invalid serializer expression: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
