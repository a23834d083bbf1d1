use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{CodecError, Result};
use crate::value::Value;

/// An immutable, stateless codec value.
///
/// Composition is structural: equality recurses through wrapped serializers
/// and compares scalar parameters, so two independently built pipelines with
/// the same shape compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serializer {
    /// Direct byte serialization of a value and its inverse.
    Plain,
    /// Wraps another serializer with a deflate pass.
    Compressed(Box<Serializer>),
    /// Groups values into chunks of `size` before delegating to the inner
    /// serializer. `size <= 0` denotes a single unbounded chunk.
    Batched(Box<Serializer>, i64),
}

impl Serializer {
    /// Wrap `inner` with compression.
    pub fn compressed(inner: Serializer) -> Self {
        Serializer::Compressed(Box::new(inner))
    }

    /// Wrap `inner` with batching of `size` values per chunk.
    pub fn batched(inner: Serializer, size: i64) -> Self {
        Serializer::Batched(Box::new(inner), size)
    }

    /// Serialize one value to bytes.
    ///
    /// For `Batched` this delegates to the inner serializer; chunking is a
    /// stream-level concern handled by [`dump_stream`](Self::dump_stream).
    pub fn dump(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            Serializer::Plain => bincode::serialize(value).map_err(CodecError::Encode),
            Serializer::Compressed(inner) => Ok(compress(&inner.dump(value)?)?),
            Serializer::Batched(inner, _) => inner.dump(value),
        }
    }

    /// Deserialize one value from bytes. Inverse of [`dump`](Self::dump).
    pub fn load(&self, bytes: &[u8]) -> Result<Value> {
        match self {
            Serializer::Plain => bincode::deserialize(bytes).map_err(CodecError::Decode),
            Serializer::Compressed(inner) => inner.load(&decompress(bytes)?),
            Serializer::Batched(inner, _) => inner.load(bytes),
        }
    }

    /// Serialize an ordered sequence of values into wire payloads.
    ///
    /// `Plain` and `Compressed` emit one payload per value. `Batched` groups
    /// the sequence into chunks of at most `size` values (the final chunk may
    /// be shorter) and encodes each chunk as one list value via the inner
    /// serializer.
    pub fn dump_stream(&self, values: &[Value]) -> Result<Vec<Vec<u8>>> {
        match self {
            Serializer::Batched(inner, size) => {
                let mut payloads = Vec::new();
                for chunk in chunk_values(values, *size) {
                    payloads.push(inner.dump(&Value::List(chunk.to_vec()))?);
                }
                Ok(payloads)
            }
            _ => values.iter().map(|v| self.dump(v)).collect(),
        }
    }

    /// Deserialize wire payloads back into the value sequence.
    ///
    /// Inverse of [`dump_stream`](Self::dump_stream): `Batched` flattens
    /// each decoded chunk list back into individual values.
    pub fn load_stream<P: AsRef<[u8]>>(&self, payloads: &[P]) -> Result<Vec<Value>> {
        match self {
            Serializer::Batched(inner, _) => {
                let mut values = Vec::new();
                for payload in payloads {
                    match inner.load(payload.as_ref())? {
                        Value::List(chunk) => values.extend(chunk),
                        other => values.push(other),
                    }
                }
                Ok(values)
            }
            _ => payloads.iter().map(|p| self.load(p.as_ref())).collect(),
        }
    }

    /// Terse pipeline description, matching the builder expression syntax.
    pub fn describe(&self) -> String {
        match self {
            Serializer::Plain => "plain".to_string(),
            Serializer::Compressed(inner) => format!("compressed({})", inner.describe()),
            Serializer::Batched(inner, size) => format!("batched({}, {size})", inner.describe()),
        }
    }
}

fn chunk_values(values: &[Value], size: i64) -> impl Iterator<Item = &[Value]> {
    // size <= 0 means one unbounded chunk
    let chunk_len = if size > 0 {
        size as usize
    } else {
        values.len().max(1)
    };
    values.chunks(chunk_len)
}

/// Deflate `bytes` (zlib stream, default level).
pub(crate) fn compress(bytes: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(CodecError::Compression)?;
    encoder.finish().map_err(CodecError::Compression)
}

/// Inflate `bytes`. Corrupt input is a `Compression` error.
pub(crate) fn decompress(bytes: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(CodecError::Compression)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_sample() -> Value {
        Value::List(vec![
            Value::Int(1),
            Value::Text("test".into()),
            Value::Float(2.0),
            Value::List(vec![Value::Int(3)]),
            Value::Map(vec![(Value::Symbol("key".into()), Value::Text("value".into()))]),
            Value::Symbol("test".into()),
            Value::Bytes(vec![0x00, 0xFF, 0x7E]),
            Value::Null,
            Value::Bool(true),
        ])
    }

    #[test]
    fn plain_roundtrip_nested() {
        let plain = Serializer::Plain;
        let value = nested_sample();

        let bytes = plain.dump(&value).unwrap();
        assert_eq!(plain.load(&bytes).unwrap(), value);
    }

    #[test]
    fn plain_dump_is_deterministic() {
        let plain = Serializer::Plain;
        let value = nested_sample();

        assert_eq!(plain.dump(&value).unwrap(), plain.dump(&value).unwrap());
    }

    #[test]
    fn compressed_roundtrip() {
        let codec = Serializer::compressed(Serializer::Plain);
        let value = nested_sample();

        let bytes = codec.dump(&value).unwrap();
        assert_eq!(codec.load(&bytes).unwrap(), value);
    }

    #[test]
    fn compressed_dump_is_deflate_of_inner_dump() {
        let codec = Serializer::compressed(Serializer::Plain);
        let value = nested_sample();

        let expected = compress(&Serializer::Plain.dump(&value).unwrap()).unwrap();
        assert_eq!(codec.dump(&value).unwrap(), expected);
    }

    #[test]
    fn doubly_compressed_roundtrip() {
        let codec = Serializer::compressed(Serializer::compressed(Serializer::Plain));
        let value = Value::Text("squeeze me twice".into());

        let bytes = codec.dump(&value).unwrap();
        assert_eq!(codec.load(&bytes).unwrap(), value);
    }

    #[test]
    fn corrupt_compressed_payload_errors() {
        let codec = Serializer::compressed(Serializer::Plain);
        let mut bytes = codec.dump(&Value::Int(1)).unwrap();
        for b in bytes.iter_mut() {
            *b ^= 0x5A;
        }

        let err = codec.load(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Compression(_)));
    }

    #[test]
    fn truncated_plain_payload_errors() {
        let plain = Serializer::Plain;
        let bytes = plain.dump(&Value::Text("truncate me".into())).unwrap();

        let err = plain.load(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn stream_one_payload_per_value_without_batching() {
        let plain = Serializer::Plain;
        let values = vec![Value::Int(10), Value::Int(20), Value::Int(30)];

        let payloads = plain.dump_stream(&values).unwrap();
        assert_eq!(payloads.len(), 3);
        assert_eq!(plain.load_stream(&payloads).unwrap(), values);
    }

    #[test]
    fn batched_chunk_boundary_rule() {
        let codec = Serializer::batched(Serializer::Plain, 2);
        let values: Vec<Value> = (0..5).map(Value::Int).collect();

        // 5 values, size 2 -> ceil(5/2) = 3 chunks: [0,1] [2,3] [4]
        let payloads = codec.dump_stream(&values).unwrap();
        assert_eq!(payloads.len(), 3);

        let chunks: Vec<Value> = payloads
            .iter()
            .map(|p| Serializer::Plain.load(p).unwrap())
            .collect();
        assert_eq!(chunks[0], Value::ints([0, 1]));
        assert_eq!(chunks[1], Value::ints([2, 3]));
        assert_eq!(chunks[2], Value::ints([4]));

        assert_eq!(codec.load_stream(&payloads).unwrap(), values);
    }

    #[test]
    fn batched_evenly_divisible() {
        let codec = Serializer::batched(Serializer::Plain, 3);
        let values: Vec<Value> = (0..6).map(Value::Int).collect();

        let payloads = codec.dump_stream(&values).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(codec.load_stream(&payloads).unwrap(), values);
    }

    #[test]
    fn batched_nonpositive_size_single_chunk() {
        for size in [0, -1] {
            let codec = Serializer::batched(Serializer::Plain, size);
            let values: Vec<Value> = (0..7).map(Value::Int).collect();

            let payloads = codec.dump_stream(&values).unwrap();
            assert_eq!(payloads.len(), 1, "size {size} must produce one chunk");
            assert_eq!(codec.load_stream(&payloads).unwrap(), values);
        }
    }

    #[test]
    fn batched_empty_stream() {
        let codec = Serializer::batched(Serializer::Plain, 4);
        let payloads = codec.dump_stream(&[]).unwrap();
        assert!(payloads.is_empty());
        assert!(codec.load_stream(&payloads).unwrap().is_empty());
    }

    #[test]
    fn batched_over_compressed_roundtrip() {
        let codec = Serializer::batched(Serializer::compressed(Serializer::Plain), 10);
        let values: Vec<Value> = (0..25).map(Value::Int).collect();

        let payloads = codec.dump_stream(&values).unwrap();
        assert_eq!(payloads.len(), 3);
        assert_eq!(codec.load_stream(&payloads).unwrap(), values);
    }

    #[test]
    fn structural_equality() {
        // One variant
        let plain1 = Serializer::Plain;
        let plain2 = Serializer::Plain;
        assert_eq!(plain1, plain1);
        assert_eq!(plain1, plain2);

        // Two variants
        let compressed1 = Serializer::compressed(plain1.clone());
        let compressed2 = Serializer::compressed(plain2);
        assert_eq!(compressed1, compressed1);
        assert_eq!(compressed1, compressed2);

        // Three variants
        let batched1 = Serializer::batched(compressed1.clone(), 1);
        let batched2 = Serializer::batched(compressed2, 1);
        let batched3 = Serializer::batched(compressed1, 2);
        assert_eq!(batched1, batched2);
        assert_ne!(batched1, batched3);
    }

    #[test]
    fn variant_inequality() {
        assert_ne!(
            Serializer::Plain,
            Serializer::compressed(Serializer::Plain)
        );
        assert_ne!(
            Serializer::batched(Serializer::Plain, 1),
            Serializer::compressed(Serializer::Plain)
        );
    }

    #[test]
    fn describe_matches_builder_syntax() {
        let codec = Serializer::batched(Serializer::compressed(Serializer::Plain), 10);
        assert_eq!(codec.describe(), "batched(compressed(plain), 10)");
    }
}
