use crate::types::{FeedEntry, Interaction, InteractionGroup};
use chrono::{DateTime, Utc};

/// Turn interaction groups into comment and like digests.
///
/// Each group yields a `CommentDigest` when it has comments and a `LikeDigest`
/// when it has likes, both keyed by the mirrored post's id. The interaction
/// lists are reversed to newest first and each digest is stamped with the
/// latest timestamp of its list. Output order carries no meaning.
pub fn normalize(groups: Vec<InteractionGroup>) -> Vec<FeedEntry> {
    groups.into_iter().flat_map(normalize_group).collect()
}

fn normalize_group(group: InteractionGroup) -> Vec<FeedEntry> {
    let InteractionGroup {
        post,
        mut comments,
        mut likes,
    } = group;
    comments.reverse();
    likes.reverse();

    let mut entries = Vec::with_capacity(2);

    if !comments.is_empty() {
        let recency = latest_timestamp(&comments);
        entries.push(FeedEntry::comment_digest(post.clone(), comments, recency));
    }

    if !likes.is_empty() {
        let recency = latest_timestamp(&likes);
        entries.push(FeedEntry::like_digest(post, likes, recency));
    }

    entries
}

/// Latest timestamp among `interactions`, or the Unix epoch when empty.
pub fn latest_timestamp(interactions: &[Interaction]) -> DateTime<Utc> {
    interactions
        .iter()
        .map(|interaction| interaction.timestamp)
        .max()
        .unwrap_or_default()
}
