//! TagCache - a tag-indexed caching facade over a key-value store
//!
//! TagCache stores serialized values with optional expiration and keeps a
//! secondary tag index so related entries can be grouped, enumerated and
//! bulk-invalidated. It is designed with strong cohesion and loose coupling
//! principles:
//! - Cache semantics never touch a backend directly; everything goes
//!   through the [`Store`] primitive contract
//! - Value encoding is behind the [`Codec`] boundary (JSON by default)
//! - Tag membership and the per-key reverse index are mutated together,
//!   so the relation stays consistent in both directions
//!
//! Entries can expire out from under the index; retrieval prunes the stale
//! references it encounters instead of relying on a background sweep.
//!
//! ```
//! use tagcache::{Cache, MemoryStore, SetOptions};
//!
//! let mut cache = Cache::new(MemoryStore::new());
//! cache.set("article:1", &"hello", SetOptions::new().tag("articles"))?;
//!
//! for entry in cache.get_tagged::<String>("articles")? {
//!     let (key, value) = entry?;
//!     println!("{} => {}", key, value);
//! }
//! # Ok::<(), tagcache::CacheError>(())
//! ```

pub mod cache;
pub mod codec;
pub mod error;
pub mod store;

mod queue;
mod retrieval;
mod tags;

/// Re-export commonly used types
pub use cache::{Cache, SetOptions, MAX_TTL, MIN_TTL};
pub use codec::{Codec, CodecError, JsonCodec};
pub use error::CacheError;
pub use retrieval::Entries;
pub use store::{CollectionKind, Entry, MemoryStore, Store, StoreError, StoreOp, Value};

#[cfg(feature = "redis")]
pub use store::RedisStore;
