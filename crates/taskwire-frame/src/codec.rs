use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Length prefix size: one big-endian signed 32-bit integer.
pub const LENGTH_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A length-prefixed unit of the wire protocol.
///
/// A frame with an empty payload is the sentinel: the reserved zero-length
/// frame that terminates an output stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The frame payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The zero-length output-stream terminator.
    pub fn sentinel() -> Self {
        Self {
            payload: Bytes::new(),
        }
    }

    /// Whether this frame is the zero-length terminator.
    pub fn is_sentinel(&self) -> bool {
        self.payload.is_empty()
    }

    /// The total wire size of this frame (length prefix + payload).
    pub fn wire_size(&self) -> usize {
        LENGTH_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────────┬──────────────────┐
/// │ Length (4B BE) │ Payload          │
/// │ signed int32   │ (Length bytes)   │
/// └────────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > i32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: i32::MAX as usize,
        });
    }
    dst.reserve(LENGTH_SIZE + payload.len());
    dst.put_i32(payload.len() as i32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. A zero length
/// decodes as the sentinel frame.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < LENGTH_SIZE {
        return Ok(None); // Need more data
    }

    let declared = i32::from_be_bytes(src[0..4].try_into().unwrap());
    if declared < 0 {
        return Err(FrameError::InvalidLength(declared));
    }
    let payload_len = declared as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = LENGTH_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(LENGTH_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
