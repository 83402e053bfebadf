//! Entry structure for stored values

use super::value::Value;
use std::time::{Duration, Instant};

/// Represents a single entry in the store
#[derive(Debug, Clone)]
pub struct Entry {
    /// The value
    pub value: Value,

    /// Optional expiration time (absolute)
    pub expire_at: Option<Instant>,
}

impl Entry {
    /// Create a new entry without expiration
    pub fn new(value: Value) -> Self {
        Entry {
            value,
            expire_at: None,
        }
    }

    /// Create a new entry with expiration
    pub fn with_expiration(value: Value, ttl: Duration) -> Self {
        Entry {
            value,
            expire_at: Some(Instant::now() + ttl),
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        if let Some(expire_at) = self.expire_at {
            Instant::now() >= expire_at
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expiration() {
        let entry = Entry::new(Value::blob("v"));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_already_elapsed_ttl() {
        let entry = Entry::with_expiration(Value::blob("v"), Duration::from_secs(0));
        assert!(entry.is_expired());
    }
}
