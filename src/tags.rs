//! Tag index bookkeeping
//!
//! Two collection families keep the tag relation queryable in both
//! directions: the forward collection is named by the tag itself and holds
//! member keys; the reverse collection is named by the key under a reserved
//! prefix and holds the tags attached to that key. Every mutation touches
//! both sides in the same batch so that, between operations,
//! `k in members(t)` iff `t in tags(k)`.

use crate::store::{CollectionKind, Store, StoreError, StoreOp};

/// Reserved namespace prefix for reverse-index collections
///
/// User-chosen tag names come from application identifiers; the colon-
/// suffixed uppercase prefix keeps the reverse family out of their way.
pub(crate) const REVERSE_INDEX_PREFIX: &str = "TAGS:";

/// Name of the reverse-index collection for a key
pub(crate) fn reverse_key(key: &str) -> String {
    format!("{}{}", REVERSE_INDEX_PREFIX, key)
}

/// Build the op removing a member from a tag's forward collection
///
/// A tag may be stored as a plain or a score-ordered set; the collection is
/// probed so the matching removal primitive is used. None when the tag does
/// not exist (nothing to remove).
pub(crate) fn forward_removal<S: Store>(
    store: &mut S,
    tag: &str,
    member: &str,
) -> Result<Option<StoreOp>, StoreError> {
    Ok(match store.collection_kind(tag)? {
        Some(CollectionKind::PlainSet) => Some(StoreOp::SetRemove {
            collection: tag.to_string(),
            member: member.to_string(),
        }),
        Some(CollectionKind::ScoredSet) => Some(StoreOp::SortedRemove {
            collection: tag.to_string(),
            member: member.to_string(),
        }),
        None => None,
    })
}

/// Build the ops detaching a key from every tag in its reverse index
///
/// Enumerates the reverse collection, removes the key from each forward
/// collection, then drops the reverse collection itself.
pub(crate) fn untag_all_ops<S: Store>(
    store: &mut S,
    key: &str,
) -> Result<Vec<StoreOp>, StoreError> {
    let rkey = reverse_key(key);
    let tags = store.set_members(&rkey)?;

    let mut ops = Vec::with_capacity(tags.len() + 1);
    for tag in tags {
        if let Some(op) = forward_removal(store, &tag, key)? {
            ops.push(op);
        }
    }
    ops.push(StoreOp::Remove { key: rkey });
    Ok(ops)
}
