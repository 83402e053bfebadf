//! Value types for store-backed collections

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

/// Represents the different shapes a stored entry can take
///
/// Serialized cache payloads are opaque blobs; tags live in plain or
/// score-ordered membership collections; queues are lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Opaque serialized payload (binary-safe)
    Blob(Bytes),

    /// Integer value (used for counters)
    Integer(i64),

    /// List of payloads (ordered, FIFO queues)
    List(VecDeque<Bytes>),

    /// Plain membership set (unordered)
    Set(HashSet<String>),

    /// Score-ordered membership set (member -> score)
    Sorted(HashMap<String, f64>),
}

impl Value {
    /// Create a blob value
    pub fn blob(bytes: impl Into<Bytes>) -> Self {
        Value::Blob(bytes.into())
    }

    /// Create an integer value
    pub fn integer(i: i64) -> Self {
        Value::Integer(i)
    }

    /// Create an empty list
    pub fn empty_list() -> Self {
        Value::List(VecDeque::new())
    }

    /// Create an empty plain set
    pub fn empty_set() -> Self {
        Value::Set(HashSet::new())
    }

    /// Create an empty score-ordered set
    pub fn empty_sorted() -> Self {
        Value::Sorted(HashMap::new())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Blob(_) => "blob",
            Value::Integer(_) => "integer",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Sorted(_) => "sorted-set",
        }
    }

    /// Check whether the collection behind this value has no members left
    ///
    /// Blobs and integers are never considered empty; only collections
    /// disappear from the store once their last member is removed.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Blob(_) | Value::Integer(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::Sorted(sorted) => sorted.is_empty(),
        }
    }
}
