//! Cache facade
//!
//! The primary entry point: composes a [`Store`] and a [`Codec`] into
//! tag-aware value storage. Multi-step writes (value + tag membership +
//! reverse index) travel as one [`StoreOp`] batch so backends with
//! multi-command transactions apply them atomically.

use crate::codec::{Codec, JsonCodec};
use crate::error::CacheError;
use crate::store::{CollectionKind, Store, StoreOp};
use crate::tags;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

/// Minimum accepted TTL, in seconds
pub const MIN_TTL: u64 = 1;

/// Maximum accepted TTL, in seconds (30 days)
pub const MAX_TTL: u64 = 30 * 24 * 3600;

/// Optional knobs for [`Cache::set`]
///
/// Tag, TTL and score are independent; a score only matters when a tag is
/// given (it switches the membership to the score-ordered representation).
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    tag: Option<String>,
    ttl: Option<u64>,
    score: Option<f64>,
}

impl SetOptions {
    /// No tag, no TTL, no score
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the key to a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Expire the entry after `seconds` (must be within [MIN_TTL, MAX_TTL])
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// Rank the key inside the tag's score-ordered membership
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Tag-indexed cache over an abstract key-value store
pub struct Cache<S: Store, C: Codec = JsonCodec> {
    pub(crate) store: S,
    pub(crate) codec: C,
}

impl<S: Store> Cache<S> {
    /// Create a cache over the given store with the default JSON codec
    pub fn new(store: S) -> Self {
        Cache {
            store,
            codec: JsonCodec,
        }
    }
}

impl<S: Store, C: Codec> Cache<S, C> {
    /// Create a cache with a custom codec
    pub fn with_codec(store: S, codec: C) -> Self {
        Cache { store, codec }
    }

    /// Get reference to the store (for testing/inspection)
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get mutable reference to the store (for testing/inspection)
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Store a value under a key
    ///
    /// Rejects values that encode to nil and TTLs outside the accepted
    /// bounds, before anything reaches the store. When a tag is given the
    /// membership and reverse-index writes ride in the same batch as the
    /// value itself.
    ///
    /// Overwriting a key does NOT detach tags attached by earlier calls;
    /// unrelated tag associations survive the overwrite. This is deliberate,
    /// long-standing behavior that downstream callers rely on.
    pub fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        opts: SetOptions,
    ) -> Result<(), CacheError> {
        let payload = self.codec.encode(value)?;

        let mut batch = match opts.ttl {
            Some(ttl) => {
                if !(MIN_TTL..=MAX_TTL).contains(&ttl) {
                    return Err(CacheError::TtlOutOfRange(ttl));
                }
                vec![StoreOp::PutEx {
                    key: key.to_string(),
                    value: payload,
                    ttl_seconds: ttl,
                }]
            }
            None => vec![StoreOp::Put {
                key: key.to_string(),
                value: payload,
            }],
        };

        if let Some(tag) = &opts.tag {
            batch.push(match opts.score {
                Some(score) => StoreOp::SortedAdd {
                    collection: tag.clone(),
                    member: key.to_string(),
                    score,
                },
                None => StoreOp::SetAdd {
                    collection: tag.clone(),
                    member: key.to_string(),
                },
            });
            batch.push(StoreOp::SetAdd {
                collection: tags::reverse_key(key),
                member: tag.clone(),
            });
        }

        debug!("Storing '{}' ({} ops)", key, batch.len());
        self.store.apply(batch)?;
        Ok(())
    }

    /// Get the value stored under a key, or None if absent or expired
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(self.codec.decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Get the raw stored bytes without decoding
    pub fn get_raw(&mut self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.store.get(key)?)
    }

    /// Delete a key and detach it from every tag it belongs to
    ///
    /// The forward memberships, the reverse index and the key itself go in
    /// one batch; no dangling membership survives.
    pub fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        let mut batch = tags::untag_all_ops(&mut self.store, key)?;
        batch.push(StoreOp::Remove {
            key: key.to_string(),
        });

        debug!("Deleting '{}' ({} ops)", key, batch.len());
        self.store.apply(batch)?;
        Ok(())
    }

    /// Delete only the stored value, leaving tag bookkeeping untouched
    ///
    /// The skipped memberships become stale and are pruned lazily by the
    /// next retrieval that encounters them.
    pub fn delete_value(&mut self, key: &str) -> Result<(), CacheError> {
        Ok(self.store.delete(key)?)
    }

    /// Destroy all entries, tags and queues
    pub fn clear(&mut self) -> Result<(), CacheError> {
        info!("Flushing the entire store");
        Ok(self.store.flush_all()?)
    }

    /// Attach an existing key to a tag
    ///
    /// Fails with [`CacheError::NoSuchKey`] when the key does not currently
    /// resolve to a value; an entry that expired can no longer be tagged.
    /// With a score the membership is score-ordered, otherwise plain.
    pub fn tag(&mut self, key: &str, tag: &str, score: Option<f64>) -> Result<(), CacheError> {
        if self.store.get(key)?.is_none() {
            return Err(CacheError::NoSuchKey(key.to_string()));
        }

        let forward = match score {
            Some(score) => StoreOp::SortedAdd {
                collection: tag.to_string(),
                member: key.to_string(),
                score,
            },
            None => StoreOp::SetAdd {
                collection: tag.to_string(),
                member: key.to_string(),
            },
        };
        let reverse = StoreOp::SetAdd {
            collection: tags::reverse_key(key),
            member: tag.to_string(),
        };

        self.store.apply(vec![forward, reverse])?;
        Ok(())
    }

    /// Detach a key from a tag
    ///
    /// Uses whichever representation the tag is currently stored as. Not an
    /// error when the membership did not exist.
    pub fn untag(&mut self, key: &str, tag: &str) -> Result<(), CacheError> {
        let mut batch = Vec::with_capacity(2);
        if let Some(op) = tags::forward_removal(&mut self.store, tag, key)? {
            batch.push(op);
        }
        batch.push(StoreOp::SetRemove {
            collection: tags::reverse_key(key),
            member: tag.to_string(),
        });

        self.store.apply(batch)?;
        Ok(())
    }

    /// Delete every current member of a tag
    ///
    /// Each member cascades through [`Cache::delete`], so it also leaves any
    /// other tags it belonged to.
    pub fn clear_by_tag(&mut self, tag: &str) -> Result<(), CacheError> {
        let members = match self.store.collection_kind(tag)? {
            Some(CollectionKind::PlainSet) => self.store.set_members(tag)?,
            Some(CollectionKind::ScoredSet) => self.store.sorted_range(tag, 0, -1, false)?,
            None => Vec::new(),
        };

        debug!("Clearing tag '{}' ({} members)", tag, members.len());
        for member in members {
            self.delete(&member)?;
        }
        Ok(())
    }

    /// Atomically add `by` to the integer counter under a key
    ///
    /// Creates the counter at `by` when the key is missing; returns the new
    /// value.
    pub fn increase(&mut self, key: &str, by: i64) -> Result<i64, CacheError> {
        Ok(self.store.incr_by(key, by)?)
    }

    /// Atomically subtract `by` from the integer counter under a key
    pub fn decrease(&mut self, key: &str, by: i64) -> Result<i64, CacheError> {
        Ok(self.store.incr_by(key, by.saturating_neg())?)
    }

    /// Member count of a plain (`scored == false`) or score-ordered
    /// (`scored == true`) collection
    pub fn cardinality(&mut self, name: &str, scored: bool) -> Result<u64, CacheError> {
        let count = if scored {
            self.store.sorted_cardinality(name)?
        } else {
            self.store.set_cardinality(name)?
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        a: i64,
        b: String,
    }

    fn sample() -> Payload {
        Payload {
            a: 5,
            b: "a".to_string(),
        }
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut cache = Cache::new(MemoryStore::new());
        cache.set("key", &sample(), SetOptions::new()).unwrap();

        let got: Option<Payload> = cache.get("key").unwrap();
        assert_eq!(got, Some(sample()));
    }

    #[test]
    fn test_get_missing() {
        let mut cache = Cache::new(MemoryStore::new());
        let got: Option<Payload> = cache.get("missing").unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_get_raw_skips_decoding() {
        let mut cache = Cache::new(MemoryStore::new());
        cache.set("key", &42i64, SetOptions::new()).unwrap();

        assert_eq!(cache.get_raw("key").unwrap(), Some(Bytes::from("42")));
        assert_eq!(cache.get_raw("missing").unwrap(), None);
    }

    #[test]
    fn test_set_nil_rejected() {
        let mut cache = Cache::new(MemoryStore::new());
        let nothing: Option<i64> = None;

        assert_eq!(
            cache.set("key", &nothing, SetOptions::new()),
            Err(CacheError::NilValue)
        );
        assert_eq!(cache.get_raw("key").unwrap(), None);
    }

    #[test]
    fn test_ttl_bounds() {
        let mut cache = Cache::new(MemoryStore::new());

        assert_eq!(
            cache.set("key", &1i64, SetOptions::new().ttl(MIN_TTL - 1)),
            Err(CacheError::TtlOutOfRange(MIN_TTL - 1))
        );
        assert_eq!(
            cache.set("key", &1i64, SetOptions::new().ttl(MAX_TTL + 1)),
            Err(CacheError::TtlOutOfRange(MAX_TTL + 1))
        );

        // Rejected writes leave no trace
        assert_eq!(cache.get_raw("key").unwrap(), None);

        cache
            .set("key", &1i64, SetOptions::new().ttl(MAX_TTL))
            .unwrap();
        assert!(cache.get_raw("key").unwrap().is_some());
    }

    #[test]
    fn test_set_with_tag_updates_both_sides() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("news"))
            .unwrap();

        let members = cache.store_mut().set_members("news").unwrap();
        assert_eq!(members, vec!["key".to_string()]);

        let reverse = cache.store_mut().set_members("TAGS:key").unwrap();
        assert_eq!(reverse, vec!["news".to_string()]);
    }

    #[test]
    fn test_set_with_score_uses_sorted_membership() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("ranked").score(7.0))
            .unwrap();

        assert_eq!(
            cache.store_mut().collection_kind("ranked").unwrap(),
            Some(CollectionKind::ScoredSet)
        );
        assert_eq!(cache.cardinality("ranked", true).unwrap(), 1);
    }

    #[test]
    fn test_overwrite_preserves_existing_tags() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &1i64, SetOptions::new().tag("first"))
            .unwrap();
        cache
            .set("key", &2i64, SetOptions::new().tag("second"))
            .unwrap();

        // Both associations survive; overwrite is not replace-on-write
        assert_eq!(
            cache.store_mut().set_members("first").unwrap(),
            vec!["key".to_string()]
        );
        assert_eq!(
            cache.store_mut().set_members("second").unwrap(),
            vec!["key".to_string()]
        );
        let mut reverse = cache.store_mut().set_members("TAGS:key").unwrap();
        reverse.sort();
        assert_eq!(reverse, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_delete_cascades_through_tags() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("news"))
            .unwrap();
        cache.tag("key", "ranked", Some(1.0)).unwrap();

        cache.delete("key").unwrap();

        assert_eq!(cache.get_raw("key").unwrap(), None);
        assert_eq!(cache.cardinality("news", false).unwrap(), 0);
        assert_eq!(cache.cardinality("ranked", true).unwrap(), 0);
        assert_eq!(
            cache.store_mut().set_members("TAGS:key").unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_delete_value_leaves_memberships() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("news"))
            .unwrap();

        cache.delete_value("key").unwrap();

        assert_eq!(cache.get_raw("key").unwrap(), None);
        // Stale on purpose; retrieval prunes it later
        assert_eq!(cache.cardinality("news", false).unwrap(), 1);
    }

    #[test]
    fn test_tag_missing_key_fails() {
        let mut cache = Cache::new(MemoryStore::new());

        assert_eq!(
            cache.tag("ghost", "news", None),
            Err(CacheError::NoSuchKey("ghost".to_string()))
        );
        assert_eq!(cache.cardinality("news", false).unwrap(), 0);
    }

    #[test]
    fn test_untag() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("news"))
            .unwrap();

        cache.untag("key", "news").unwrap();

        assert_eq!(cache.cardinality("news", false).unwrap(), 0);
        assert_eq!(
            cache.store_mut().set_members("TAGS:key").unwrap(),
            Vec::<String>::new()
        );

        // Untagging something that was never tagged is fine
        cache.untag("key", "nope").unwrap();
    }

    #[test]
    fn test_untag_scored_membership() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("ranked").score(3.0))
            .unwrap();

        cache.untag("key", "ranked").unwrap();
        assert_eq!(cache.cardinality("ranked", true).unwrap(), 0);
    }

    #[test]
    fn test_clear_by_tag() {
        let mut cache = Cache::new(MemoryStore::new());
        cache.set("k1", &1i64, SetOptions::new().tag("batch")).unwrap();
        cache.set("k2", &2i64, SetOptions::new().tag("batch")).unwrap();
        cache.set("k3", &3i64, SetOptions::new().tag("other")).unwrap();

        cache.clear_by_tag("batch").unwrap();

        assert_eq!(cache.get_raw("k1").unwrap(), None);
        assert_eq!(cache.get_raw("k2").unwrap(), None);
        assert_eq!(cache.cardinality("batch", false).unwrap(), 0);
        // Unrelated tags untouched
        assert!(cache.get_raw("k3").unwrap().is_some());
    }

    #[test]
    fn test_clear_by_scored_tag() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("k1", &1i64, SetOptions::new().tag("ranked").score(1.0))
            .unwrap();
        cache
            .set("k2", &2i64, SetOptions::new().tag("ranked").score(2.0))
            .unwrap();

        cache.clear_by_tag("ranked").unwrap();

        assert_eq!(cache.get_raw("k1").unwrap(), None);
        assert_eq!(cache.cardinality("ranked", true).unwrap(), 0);
    }

    #[test]
    fn test_increase_decrease() {
        let mut cache = Cache::new(MemoryStore::new());

        assert_eq!(cache.increase("hits", 2).unwrap(), 2);
        assert_eq!(cache.increase("hits", 3).unwrap(), 5);
        assert_eq!(cache.decrease("hits", 1).unwrap(), 4);
    }

    #[test]
    fn test_clear() {
        let mut cache = Cache::new(MemoryStore::new());
        cache
            .set("key", &sample(), SetOptions::new().tag("news"))
            .unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.get_raw("key").unwrap(), None);
        assert_eq!(cache.cardinality("news", false).unwrap(), 0);
    }
}
