//! Length-prefixed wire framing for the taskwire worker protocol.
//!
//! Every frame is a 4-byte big-endian signed length followed by that many
//! payload bytes. A length of exactly zero is reserved as the output-stream
//! terminator (the sentinel) and is never sent for input data.
//!
//! The raw, unprefixed 4-byte integer form is also part of the protocol: the
//! split index at the start of a request and the port announcement at server
//! startup are written without a length prefix.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, LENGTH_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
