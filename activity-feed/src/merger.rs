use crate::types::{FeedEntry, RemoteEvent};

/// Merge local digests with remote events, most recent first.
///
/// Nothing is deduplicated. The sort is stable, so entries with equal
/// timestamps keep their concatenation order: local digests ahead of remote
/// events, each side in its input order.
pub fn merge(local: Vec<FeedEntry>, remote: Vec<RemoteEvent>) -> Vec<FeedEntry> {
    let mut feed = local;
    feed.reserve(remote.len());
    feed.extend(remote.into_iter().map(FeedEntry::remote));

    feed.sort_by(|a, b| b.recency().cmp(&a.recency()));
    feed
}
