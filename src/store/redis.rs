//! Redis-backed store implementation
//!
//! Maps the [`Store`] contract onto Redis commands over a synchronous
//! connection. Batches go through an atomic MULTI/EXEC pipeline. Connection
//! failures surface as [`StoreError::Unavailable`] and are never retried
//! here; reconnection policy belongs to the caller.

use super::{CollectionKind, Store, StoreError, StoreOp};
use bytes::Bytes;
use redis::{Client, Commands, Connection};

/// Store implementation backed by a Redis server
pub struct RedisStore {
    conn: Connection,
}

impl RedisStore {
    /// Connect to a Redis server, e.g. `redis://127.0.0.1:6379`
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(StoreError::from)?;
        let conn = client.get_connection().map_err(StoreError::from)?;
        Ok(RedisStore { conn })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl Store for RedisStore {
    fn get(&mut self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let value: Option<Vec<u8>> = self.conn.get(key)?;
        Ok(value.map(Bytes::from))
    }

    fn set(&mut self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let _: () = self.conn.set(key, &value[..])?;
        Ok(())
    }

    fn set_ex(&mut self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<(), StoreError> {
        let _: () = self.conn.set_ex(key, &value[..], ttl_seconds)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        let _: i64 = self.conn.del(key)?;
        Ok(())
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        let _: () = redis::cmd("FLUSHALL").query(&mut self.conn)?;
        Ok(())
    }

    fn set_add(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        let _: i64 = self.conn.sadd(collection, member)?;
        Ok(())
    }

    fn set_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        let _: i64 = self.conn.srem(collection, member)?;
        Ok(())
    }

    fn set_members(&mut self, collection: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.conn.smembers(collection)?)
    }

    fn set_cardinality(&mut self, collection: &str) -> Result<u64, StoreError> {
        Ok(self.conn.scard(collection)?)
    }

    fn sorted_add(
        &mut self,
        collection: &str,
        score: f64,
        member: &str,
    ) -> Result<(), StoreError> {
        let _: i64 = self.conn.zadd(collection, member, score)?;
        Ok(())
    }

    fn sorted_remove(&mut self, collection: &str, member: &str) -> Result<(), StoreError> {
        let _: i64 = self.conn.zrem(collection, member)?;
        Ok(())
    }

    fn sorted_range(
        &mut self,
        collection: &str,
        start: i64,
        stop: i64,
        reversed: bool,
    ) -> Result<Vec<String>, StoreError> {
        let members: Vec<String> = if reversed {
            self.conn
                .zrevrange(collection, start as isize, stop as isize)?
        } else {
            self.conn.zrange(collection, start as isize, stop as isize)?
        };
        Ok(members)
    }

    fn sorted_cardinality(&mut self, collection: &str) -> Result<u64, StoreError> {
        Ok(self.conn.zcard(collection)?)
    }

    fn collection_kind(
        &mut self,
        collection: &str,
    ) -> Result<Option<CollectionKind>, StoreError> {
        let kind: String = redis::cmd("TYPE").arg(collection).query(&mut self.conn)?;
        Ok(match kind.as_str() {
            "set" => Some(CollectionKind::PlainSet),
            "zset" => Some(CollectionKind::ScoredSet),
            _ => None,
        })
    }

    fn list_push(&mut self, list: &str, value: Bytes) -> Result<(), StoreError> {
        let _: i64 = self.conn.rpush(list, &value[..])?;
        Ok(())
    }

    fn list_pop(&mut self, list: &str) -> Result<Option<Bytes>, StoreError> {
        let value: Option<Vec<u8>> = self.conn.lpop(list, None)?;
        Ok(value.map(Bytes::from))
    }

    fn list_range(
        &mut self,
        list: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, StoreError> {
        let items: Vec<Vec<u8>> = self.conn.lrange(list, start as isize, stop as isize)?;
        Ok(items.into_iter().map(Bytes::from).collect())
    }

    fn list_len(&mut self, list: &str) -> Result<u64, StoreError> {
        Ok(self.conn.llen(list)?)
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        Ok(self.conn.incr(key, delta)?)
    }

    fn apply(&mut self, batch: Vec<StoreOp>) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch {
            match op {
                StoreOp::Put { key, value } => {
                    pipe.set(key, &value[..]).ignore();
                }
                StoreOp::PutEx {
                    key,
                    value,
                    ttl_seconds,
                } => {
                    pipe.set_ex(key, &value[..], ttl_seconds).ignore();
                }
                StoreOp::Remove { key } => {
                    pipe.del(key).ignore();
                }
                StoreOp::SetAdd { collection, member } => {
                    pipe.sadd(collection, member).ignore();
                }
                StoreOp::SetRemove { collection, member } => {
                    pipe.srem(collection, member).ignore();
                }
                StoreOp::SortedAdd {
                    collection,
                    member,
                    score,
                } => {
                    pipe.zadd(collection, member, score).ignore();
                }
                StoreOp::SortedRemove { collection, member } => {
                    pipe.zrem(collection, member).ignore();
                }
            }
        }
        let _: () = pipe.query(&mut self.conn)?;
        Ok(())
    }
}
