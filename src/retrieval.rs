//! Tagged and ranked retrieval
//!
//! Both read paths share one algorithm: fetch the member list, resolve each
//! member through the cache, and silently prune members whose entry expired
//! after being indexed. Cleanup cost is amortized into normal read traffic
//! instead of a background sweep, which keeps index collections from
//! accumulating stale references.

use crate::cache::Cache;
use crate::codec::Codec;
use crate::error::CacheError;
use crate::store::Store;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::marker::PhantomData;
use tracing::debug;

impl<S: Store, C: Codec> Cache<S, C> {
    /// Iterate the live members of a tag, resolved to their current values
    ///
    /// Members whose entry has expired are not yielded; they are deleted on
    /// the spot (cascading through every tag they belonged to) so later
    /// calls do not pay for them again. Enumeration order is whatever the
    /// store returns.
    pub fn get_tagged<T: DeserializeOwned>(
        &mut self,
        tag: &str,
    ) -> Result<Entries<'_, S, C, T>, CacheError> {
        let members = self.store.set_members(tag)?;
        Ok(Entries {
            cache: self,
            members: members.into(),
            _value: PhantomData,
        })
    }

    /// Iterate a window of a score-ordered set, resolved to current values
    ///
    /// The window spans `count` members starting at `offset`, by score
    /// ascending (or descending when `reversed`); equal scores order
    /// lexicographically by member. Expired members are pruned the same way
    /// as in [`Cache::get_tagged`], so the window may come back shorter
    /// than `count`.
    pub fn get_sorted<T: DeserializeOwned>(
        &mut self,
        set: &str,
        count: u64,
        offset: u64,
        reversed: bool,
    ) -> Result<Entries<'_, S, C, T>, CacheError> {
        let members = if count == 0 {
            Vec::new()
        } else {
            let start = offset as i64;
            let stop = (offset + count - 1) as i64;
            self.store.sorted_range(set, start, stop, reversed)?
        };
        Ok(Entries {
            cache: self,
            members: members.into(),
            _value: PhantomData,
        })
    }
}

/// Finite iterator over `(key, value)` pairs of a membership collection
///
/// Produced by [`Cache::get_tagged`] and [`Cache::get_sorted`]; each call
/// re-reads the membership, so the iteration is restartable by calling
/// again.
pub struct Entries<'a, S: Store, C: Codec, T> {
    cache: &'a mut Cache<S, C>,
    members: VecDeque<String>,
    _value: PhantomData<fn() -> T>,
}

impl<'a, S: Store, C: Codec, T: DeserializeOwned> Iterator for Entries<'a, S, C, T> {
    type Item = Result<(String, T), CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let member = self.members.pop_front()?;
            match self.cache.get::<T>(&member) {
                Ok(Some(value)) => return Some(Ok((member, value))),
                Ok(None) => {
                    // Expired after being indexed; heal the index now
                    debug!("Pruning stale member '{}'", member);
                    if let Err(err) = self.cache.delete(&member) {
                        return Some(Err(err));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
