//! Cache-level error taxonomy
//!
//! Invalid arguments fail fast before any store mutation; store failures
//! propagate unmodified (no masking, no retry). Stale index references are
//! not errors at all; they are pruned silently during retrieval.

use crate::codec::CodecError;
use crate::store::StoreError;
use std::fmt;

/// Errors surfaced by the cache facade
#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Attempt to store or enqueue a value that encodes to nil
    NilValue,

    /// TTL outside the accepted bounds (seconds)
    TtlOutOfRange(u64),

    /// Attempt to tag a key that does not currently resolve to a value
    NoSuchKey(String),

    /// Serialization or deserialization failure
    Codec(CodecError),

    /// Failure in the underlying store
    Store(StoreError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NilValue => write!(f, "can't store a nil value"),
            CacheError::TtlOutOfRange(ttl) => write!(
                f,
                "TTL must be between {} and {} seconds inclusive, got {}",
                crate::cache::MIN_TTL,
                crate::cache::MAX_TTL,
                ttl
            ),
            CacheError::NoSuchKey(key) => {
                write!(f, "can't tag non-existing key '{}'", key)
            }
            CacheError::Codec(err) => write!(f, "codec: {}", err),
            CacheError::Store(err) => write!(f, "store: {}", err),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CodecError> for CacheError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Nil => CacheError::NilValue,
            other => CacheError::Codec(other),
        }
    }
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        CacheError::Store(err)
    }
}
