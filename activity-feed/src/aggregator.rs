use crate::collector::LocalInteractionCollector;
use crate::fetcher::RemoteEventFetcher;
use crate::merger::merge;
use crate::normalizer::normalize;
use crate::traits::{InteractionStore, RemoteApi};
use crate::types::{FeedConfig, FeedEntry, RemoteEvent, Result, User};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Builds a user's unified activity feed from the remote platform and the
/// local interaction store.
pub struct FeedAggregator {
    fetcher: RemoteEventFetcher,
    collector: LocalInteractionCollector,
}

impl FeedAggregator {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<dyn InteractionStore>, config: FeedConfig) -> Self {
        Self {
            fetcher: RemoteEventFetcher::new(api, config),
            collector: LocalInteractionCollector::new(store),
        }
    }

    pub async fn build_feed(&self, user: &User) -> Result<Vec<FeedEntry>> {
        self.build_feed_at(user, Utc::now()).await
    }

    /// Run both branches concurrently and merge. The first failure on either
    /// side aborts the whole feed.
    ///
    /// The user's own events are fetched once: the local branch queries the
    /// store with them and they lead the remote half of the feed.
    pub async fn build_feed_at(&self, user: &User, now: DateTime<Utc>) -> Result<Vec<FeedEntry>> {
        info!("Building activity feed for {}", user.login);

        let (repo_events, (mut remote_events, local_entries)) = tokio::try_join!(
            self.fetcher.fetch_repo_activity_at(user, now),
            self.own_events_with_digests(user),
        )?;
        remote_events.extend(repo_events);

        let remote_count = remote_events.len();
        let local_count = local_entries.len();
        let feed = merge(local_entries, remote_events);

        info!(
            "Feed for {}: {} entries ({} remote, {} local digests)",
            user.login,
            feed.len(),
            remote_count,
            local_count
        );
        Ok(feed)
    }

    async fn own_events_with_digests(&self, user: &User) -> Result<(Vec<RemoteEvent>, Vec<FeedEntry>)> {
        let events = self.fetcher.fetch_own_events(user).await?;
        let groups = self.collector.collect_interactions(&events).await?;
        Ok((events, normalize(groups)))
    }
}
