//! In-memory store implementation
//!
//! A single-threaded implementation of the [`Store`] contract, used by the
//! test suite and for embedding the cache without a server. Expiration is
//! lazy: an expired entry is removed the first time an operation touches it.

use super::entry::Entry;
use super::value::Value;
use super::{CollectionKind, Store, StoreError};
use bytes::Bytes;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::time::Duration;

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<String, Entry, BuildHasherDefault<SipHasher13>>;

/// In-memory key-value store
pub struct MemoryStore {
    /// The main storage map; payloads, collections and queues share one
    /// namespace, as the remote backend does
    map: StoreMap,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            map: HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            ),
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.map.values().filter(|e| !e.is_expired()).count()
    }

    /// Check if the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry if its TTL has elapsed
    fn purge_if_expired(&mut self, key: &str) {
        let expired = self
            .map
            .get(key)
            .map(|entry| entry.is_expired())
            .unwrap_or(false);
        if expired {
            self.map.remove(key);
        }
    }

    /// Drop the entry if its collection has no members left
    fn purge_if_drained(&mut self, key: &str) {
        let drained = self
            .map
            .get(key)
            .map(|entry| entry.value.is_empty_collection())
            .unwrap_or(false);
        if drained {
            self.map.remove(key);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.purge_if_expired(key);
        match self.map.get(key) {
            Some(entry) => match &entry.value {
                Value::Blob(bytes) => Ok(Some(bytes.clone())),
                Value::Integer(i) => Ok(Some(Bytes::from(i.to_string()))),
                other => Err(StoreError::wrong_type(key, "blob", other.type_name())),
            },
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), Entry::new(Value::Blob(value)));
        Ok(())
    }

    fn set_ex(&mut self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<(), StoreError> {
        let entry = Entry::with_expiration(Value::Blob(value), Duration::from_secs(ttl_seconds));
        self.map.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        self.map.clear();
        Ok(())
    }

    fn set_add(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        self.purge_if_expired(collection);
        let entry = self
            .map
            .entry(collection.to_string())
            .or_insert_with(|| Entry::new(Value::empty_set()));
        match &mut entry.value {
            Value::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            other => Err(StoreError::wrong_type(collection, "set", other.type_name())),
        }
    }

    fn set_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        self.purge_if_expired(collection);
        if let Some(entry) = self.map.get_mut(collection) {
            match &mut entry.value {
                Value::Set(set) => {
                    set.remove(member);
                }
                other => {
                    return Err(StoreError::wrong_type(collection, "set", other.type_name()))
                }
            }
        }
        self.purge_if_drained(collection);
        Ok(())
    }

    fn set_members(&mut self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.purge_if_expired(collection);
        match self.map.get(collection) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.iter().cloned().collect()),
                other => Err(StoreError::wrong_type(collection, "set", other.type_name())),
            },
            None => Ok(Vec::new()),
        }
    }

    fn set_cardinality(&mut self, collection: &str) -> Result<u64, StoreError> {
        self.purge_if_expired(collection);
        match self.map.get(collection) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.len() as u64),
                other => Err(StoreError::wrong_type(collection, "set", other.type_name())),
            },
            None => Ok(0),
        }
    }

    fn sorted_add(
        &mut self,
        collection: &str,
        score: f64,
        member: &str,
    ) -> Result<(), StoreError> {
        self.purge_if_expired(collection);
        let entry = self
            .map
            .entry(collection.to_string())
            .or_insert_with(|| Entry::new(Value::empty_sorted()));
        match &mut entry.value {
            Value::Sorted(sorted) => {
                sorted.insert(member.to_string(), score);
                Ok(())
            }
            other => Err(StoreError::wrong_type(
                collection,
                "sorted-set",
                other.type_name(),
            )),
        }
    }

    fn sorted_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        self.purge_if_expired(collection);
        if let Some(entry) = self.map.get_mut(collection) {
            match &mut entry.value {
                Value::Sorted(sorted) => {
                    sorted.remove(member);
                }
                other => {
                    return Err(StoreError::wrong_type(
                        collection,
                        "sorted-set",
                        other.type_name(),
                    ))
                }
            }
        }
        self.purge_if_drained(collection);
        Ok(())
    }

    fn sorted_range(
        &mut self,
        collection: &str,
        start: i64,
        stop: i64,
        reversed: bool,
    ) -> Result<Vec<String>, StoreError> {
        self.purge_if_expired(collection);
        let mut scored: Vec<(String, f64)> = match self.map.get(collection) {
            Some(entry) => match &entry.value {
                Value::Sorted(sorted) => {
                    sorted.iter().map(|(m, s)| (m.clone(), *s)).collect()
                }
                other => {
                    return Err(StoreError::wrong_type(
                        collection,
                        "sorted-set",
                        other.type_name(),
                    ))
                }
            },
            None => return Ok(Vec::new()),
        };

        // Score ascending, ties broken lexicographically by member
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        if reversed {
            scored.reverse();
        }

        let members: Vec<String> = match window(scored.len(), start, stop) {
            Some((lo, hi)) => scored[lo..=hi].iter().map(|(m, _)| m.clone()).collect(),
            None => Vec::new(),
        };
        Ok(members)
    }

    fn sorted_cardinality(&mut self, collection: &str) -> Result<u64, StoreError> {
        self.purge_if_expired(collection);
        match self.map.get(collection) {
            Some(entry) => match &entry.value {
                Value::Sorted(sorted) => Ok(sorted.len() as u64),
                other => Err(StoreError::wrong_type(
                    collection,
                    "sorted-set",
                    other.type_name(),
                )),
            },
            None => Ok(0),
        }
    }

    fn collection_kind(
        &mut self,
        collection: &str,
    ) -> Result<Option<CollectionKind>, StoreError> {
        self.purge_if_expired(collection);
        Ok(self.map.get(collection).and_then(|entry| match entry.value {
            Value::Set(_) => Some(CollectionKind::PlainSet),
            Value::Sorted(_) => Some(CollectionKind::ScoredSet),
            _ => None,
        }))
    }

    fn list_push(&mut self, list: &str, value: Bytes) -> Result<(), StoreError> {
        self.purge_if_expired(list);
        let entry = self
            .map
            .entry(list.to_string())
            .or_insert_with(|| Entry::new(Value::empty_list()));
        match &mut entry.value {
            Value::List(items) => {
                items.push_back(value);
                Ok(())
            }
            other => Err(StoreError::wrong_type(list, "list", other.type_name())),
        }
    }

    fn list_pop(&mut self, list: &str) -> Result<Option<Bytes>, StoreError> {
        self.purge_if_expired(list);
        let popped = match self.map.get_mut(list) {
            Some(entry) => match &mut entry.value {
                Value::List(items) => items.pop_front(),
                other => return Err(StoreError::wrong_type(list, "list", other.type_name())),
            },
            None => None,
        };
        self.purge_if_drained(list);
        Ok(popped)
    }

    fn list_range(
        &mut self,
        list: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, StoreError> {
        self.purge_if_expired(list);
        let items = match self.map.get(list) {
            Some(entry) => match &entry.value {
                Value::List(items) => items,
                other => return Err(StoreError::wrong_type(list, "list", other.type_name())),
            },
            None => return Ok(Vec::new()),
        };

        let range: Vec<Bytes> = match window(items.len(), start, stop) {
            Some((lo, hi)) => items.iter().skip(lo).take(hi - lo + 1).cloned().collect(),
            None => Vec::new(),
        };
        Ok(range)
    }

    fn list_len(&mut self, list: &str) -> Result<u64, StoreError> {
        self.purge_if_expired(list);
        match self.map.get(list) {
            Some(entry) => match &entry.value {
                Value::List(items) => Ok(items.len() as u64),
                other => Err(StoreError::wrong_type(list, "list", other.type_name())),
            },
            None => Ok(0),
        }
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.purge_if_expired(key);
        match self.map.get_mut(key) {
            Some(entry) => match &mut entry.value {
                Value::Integer(i) => {
                    *i = i
                        .checked_add(delta)
                        .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
                    Ok(*i)
                }
                Value::Blob(bytes) => {
                    // Numeric strings are promoted to integer counters
                    let parsed = std::str::from_utf8(bytes)
                        .ok()
                        .and_then(|s| s.parse::<i64>().ok())
                        .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
                    let next = parsed
                        .checked_add(delta)
                        .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
                    entry.value = Value::Integer(next);
                    Ok(next)
                }
                other => Err(StoreError::wrong_type(key, "integer", other.type_name())),
            },
            None => {
                self.map
                    .insert(key.to_string(), Entry::new(Value::Integer(delta)));
                Ok(delta)
            }
        }
    }
}

/// Normalize an inclusive index window over a collection of `len` items
///
/// Negative indices count from the end. Returns None when the window is
/// empty or entirely out of bounds.
fn window(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
