//! Store abstraction module
//!
//! Defines the primitive operation contract the cache facade issues against
//! a key-value store, plus the bundled implementations. The facade never
//! talks to a backend directly; everything goes through the [`Store`] trait
//! (loose coupling between cache semantics and storage).

mod entry;
mod memory;
mod value;

#[cfg(feature = "redis")]
mod redis;

pub use entry::Entry;
pub use memory::MemoryStore;
pub use value::Value;

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use bytes::Bytes;
use std::fmt;

/// The shape a membership collection is currently stored as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Unordered member set
    PlainSet,

    /// Score-ordered member set
    ScoredSet,
}

/// A single write primitive inside a batch
///
/// Multi-step cache operations (store a value, add it to a tag, record the
/// reverse index) are assembled as a sequence of these and handed to
/// [`Store::apply`] in one call, so backends with native multi-command
/// support can execute them atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Store a payload under a key, without expiration
    Put { key: String, value: Bytes },

    /// Store a payload under a key with a relative TTL in seconds
    PutEx {
        key: String,
        value: Bytes,
        ttl_seconds: u64,
    },

    /// Remove a key (payload or whole collection)
    Remove { key: String },

    /// Add a member to a plain set
    SetAdd { collection: String, member: String },

    /// Remove a member from a plain set
    SetRemove { collection: String, member: String },

    /// Add a member to a score-ordered set (updates the score if present)
    SortedAdd {
        collection: String,
        member: String,
        score: f64,
    },

    /// Remove a member from a score-ordered set
    SortedRemove { collection: String, member: String },
}

/// Store-level errors
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation
    Unavailable(String),

    /// Operation against a key holding the wrong kind of value
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Counter operation against a value that is not an integer
    NotAnInteger(String),
}

impl StoreError {
    pub(crate) fn wrong_type(name: &str, expected: &'static str, found: &'static str) -> Self {
        StoreError::WrongType {
            name: name.to_string(),
            expected,
            found,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::WrongType {
                name,
                expected,
                found,
            } => write!(
                f,
                "wrong type for '{}': expected {}, found {}",
                name, expected, found
            ),
            StoreError::NotAnInteger(name) => {
                write!(f, "value of '{}' is not an integer or out of range", name)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Primitive operation contract against the underlying store
///
/// Each method is individually atomic. Sequences of writes issued through
/// [`Store::apply`] are atomic only where the backend supports multi-command
/// execution; callers must assume partial application on failure otherwise.
///
/// Range arguments (`start`, `stop`) are inclusive and accept negative
/// indices counted from the end of the collection. Sorted ranges order by
/// score ascending with lexicographic tie-break on the member.
pub trait Store {
    /// Get the payload stored under a key, or None if absent or expired
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Store a payload without expiration
    fn set(&mut self, key: &str, value: Bytes) -> Result<(), StoreError>;

    /// Store a payload with a relative TTL in seconds
    fn set_ex(&mut self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Remove a key; no error if it does not exist
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Destroy every key in the store
    fn flush_all(&mut self) -> Result<(), StoreError>;

    /// Add a member to a plain set, creating the set if needed
    fn set_add(&mut self, collection: &str, member: &str) -> Result<(), StoreError>;

    /// Remove a member from a plain set; no error if either is missing
    fn set_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError>;

    /// Enumerate the members of a plain set (empty if the set is missing)
    fn set_members(&mut self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Number of members in a plain set (0 if missing)
    fn set_cardinality(&mut self, collection: &str) -> Result<u64, StoreError>;

    /// Add a member to a score-ordered set, creating it if needed
    fn sorted_add(&mut self, collection: &str, score: f64, member: &str)
        -> Result<(), StoreError>;

    /// Remove a member from a score-ordered set; no error if missing
    fn sorted_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError>;

    /// Members of a score-ordered set within an inclusive index window
    fn sorted_range(
        &mut self,
        collection: &str,
        start: i64,
        stop: i64,
        reversed: bool,
    ) -> Result<Vec<String>, StoreError>;

    /// Number of members in a score-ordered set (0 if missing)
    fn sorted_cardinality(&mut self, collection: &str) -> Result<u64, StoreError>;

    /// Probe how a membership collection is currently stored
    ///
    /// Returns None when the key is absent or holds something that is not
    /// a membership collection.
    fn collection_kind(&mut self, collection: &str)
        -> Result<Option<CollectionKind>, StoreError>;

    /// Append a payload to the tail of a list, creating it if needed
    fn list_push(&mut self, list: &str, value: Bytes) -> Result<(), StoreError>;

    /// Pop the head payload of a list, or None if the list is empty
    fn list_pop(&mut self, list: &str) -> Result<Option<Bytes>, StoreError>;

    /// Payloads of a list within an inclusive index window
    fn list_range(&mut self, list: &str, start: i64, stop: i64)
        -> Result<Vec<Bytes>, StoreError>;

    /// Length of a list (0 if missing)
    fn list_len(&mut self, list: &str) -> Result<u64, StoreError>;

    /// Atomically add a delta to an integer value, creating it at `delta`
    /// if missing; returns the new value
    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Apply a batch of write primitives
    ///
    /// The default implementation replays the batch one primitive at a time
    /// and stops at the first error. Backends with native multi-command
    /// transactions should override this with an atomic execution.
    fn apply(&mut self, batch: Vec<StoreOp>) -> Result<(), StoreError> {
        for op in batch {
            match op {
                StoreOp::Put { key, value } => self.set(&key, value)?,
                StoreOp::PutEx {
                    key,
                    value,
                    ttl_seconds,
                } => self.set_ex(&key, value, ttl_seconds)?,
                StoreOp::Remove { key } => self.delete(&key)?,
                StoreOp::SetAdd { collection, member } => self.set_add(&collection, &member)?,
                StoreOp::SetRemove { collection, member } => {
                    self.set_remove(&collection, &member)?
                }
                StoreOp::SortedAdd {
                    collection,
                    member,
                    score,
                } => self.sorted_add(&collection, score, &member)?,
                StoreOp::SortedRemove { collection, member } => {
                    self.sorted_remove(&collection, &member)?
                }
            }
        }
        Ok(())
    }
}
