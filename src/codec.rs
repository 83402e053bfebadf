//! Value serialization boundary
//!
//! The cache stores opaque byte payloads; a [`Codec`] turns caller values
//! into those payloads and back. `decode(encode(v)) == v` holds for every
//! value the codec's data model can represent (handles and other
//! non-serializable resources are outside that domain by construction,
//! since they cannot implement `Serialize`).

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Codec errors
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// The value encodes to the codec's nil representation
    Nil,

    /// Serialization failure
    Encode(String),

    /// Deserialization failure
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Nil => write!(f, "value encodes to nil"),
            CodecError::Encode(msg) => write!(f, "encode error: {}", msg),
            CodecError::Decode(msg) => write!(f, "decode error: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

/// Serialization contract consumed by the cache facade
pub trait Codec {
    /// Serialize a value to bytes
    ///
    /// Values whose encoding is the codec's nil representation are rejected
    /// with [`CodecError::Nil`]; the cache never stores nothing.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes, CodecError>;

    /// Deserialize a value from bytes
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes, CodecError> {
        let raw = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;
        if raw == b"null" {
            return Err(CodecError::Nil);
        }
        Ok(Bytes::from(raw))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: i64,
        b: String,
        c: Vec<String>,
    }

    #[test]
    fn test_round_trip() {
        let codec = JsonCodec;
        let sample = Sample {
            a: 5,
            b: "a".to_string(),
            c: vec!["x".to_string()],
        };

        let encoded = codec.encode(&sample).unwrap();
        let decoded: Sample = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, sample);
    }

    #[test]
    fn test_nil_rejected() {
        let codec = JsonCodec;
        let nothing: Option<i64> = None;

        assert_eq!(codec.encode(&nothing), Err(CodecError::Nil));
    }

    #[test]
    fn test_decode_garbage() {
        let codec = JsonCodec;
        let result: Result<i64, _> = codec.decode(b"not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
