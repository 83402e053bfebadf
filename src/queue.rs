//! FIFO queue operations
//!
//! Queues are plain store lists, independent of tagging: `enqueue` appends
//! to the tail, `pop` removes from the head. The historical contract had a
//! single `pop(range)` that destructively popped one element for `range == 1`
//! but silently degraded to a non-destructive range read otherwise; the two
//! behaviors are deliberately split into `pop` and `peek` here so neither
//! can be invoked by accident.

use crate::cache::Cache;
use crate::codec::Codec;
use crate::error::CacheError;
use crate::store::Store;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<S: Store, C: Codec> Cache<S, C> {
    /// Append a value to the tail of a queue
    ///
    /// Values that encode to nil are rejected before touching the store.
    pub fn enqueue<T: Serialize>(&mut self, queue: &str, value: &T) -> Result<(), CacheError> {
        let payload = self.codec.encode(value)?;
        Ok(self.store.list_push(queue, payload)?)
    }

    /// Append already-encoded bytes to the tail of a queue
    pub fn enqueue_raw(&mut self, queue: &str, payload: Bytes) -> Result<(), CacheError> {
        if payload.is_empty() {
            return Err(CacheError::NilValue);
        }
        Ok(self.store.list_push(queue, payload)?)
    }

    /// Pop and decode the head of a queue, or None when it is empty
    pub fn pop<T: DeserializeOwned>(&mut self, queue: &str) -> Result<Option<T>, CacheError> {
        match self.store.list_pop(queue)? {
            Some(raw) => Ok(Some(self.codec.decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Pop the head of a queue without decoding
    pub fn pop_raw(&mut self, queue: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.store.list_pop(queue)?)
    }

    /// Read up to `count` elements from the head without removing them
    ///
    /// Returns an empty vec when the queue is empty or `count` is zero.
    pub fn peek<T: DeserializeOwned>(
        &mut self,
        queue: &str,
        count: u64,
    ) -> Result<Vec<T>, CacheError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let raws = self.store.list_range(queue, 0, count as i64 - 1)?;
        raws.iter()
            .map(|raw| self.codec.decode(raw).map_err(CacheError::from))
            .collect()
    }

    /// Read up to `count` head elements without removing or decoding them
    pub fn peek_raw(&mut self, queue: &str, count: u64) -> Result<Vec<Bytes>, CacheError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.list_range(queue, 0, count as i64 - 1)?)
    }

    /// Number of elements currently in a queue
    pub fn queue_len(&mut self, queue: &str) -> Result<u64, CacheError> {
        Ok(self.store.list_len(queue)?)
    }
}
