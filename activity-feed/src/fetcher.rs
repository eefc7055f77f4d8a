use crate::traits::RemoteApi;
use crate::types::{FeedConfig, FeedError, RawEvent, RemoteEvent, RepoSummary, Result, User};
use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Pulls a user's own events plus the events of repositories they touched
/// within the recency window.
pub struct RemoteEventFetcher {
    api: Arc<dyn RemoteApi>,
    config: FeedConfig,
}

impl RemoteEventFetcher {
    pub fn new(api: Arc<dyn RemoteApi>, config: FeedConfig) -> Self {
        Self { api, config }
    }

    pub async fn fetch_user_activity(&self, user: &User) -> Result<Vec<RemoteEvent>> {
        self.fetch_user_activity_at(user, Utc::now()).await
    }

    /// Same as [`fetch_user_activity`](Self::fetch_user_activity) with the
    /// recency window measured from `now`.
    pub async fn fetch_user_activity_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let (mut events, repo_events) = tokio::try_join!(
            self.fetch_own_events(user),
            self.fetch_repo_activity_at(user, now),
        )?;

        // Own events first; an event present in both lists is kept twice.
        events.extend(repo_events);
        Ok(events)
    }

    /// Events of every repository the user touched within the recency window,
    /// fetched in parallel.
    pub async fn fetch_repo_activity_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let window = self.config.recency_window()?;
        let repos = self
            .api
            .user_repos(&user.access_token, &user.login, self.config.repos_per_page)
            .await?;

        let listed = repos.len();
        let recent = recent_repos(repos, now, window)?;
        info!(
            "User {}: {} of {} repositories updated in the last {}h",
            user.login,
            recent.len(),
            listed,
            self.config.recency_window_hours
        );

        // Fail-fast: the first failed page drops the remaining requests.
        let pages = try_join_all(recent.iter().map(|repo| {
            debug!("Fetching events for {}", repo.full_name());
            self.api.repo_events(
                &user.access_token,
                &repo.owner.login,
                &repo.name,
                self.config.repo_events_per_page,
            )
        }))
        .await?;

        let repo_events = normalize_events(pages.into_iter().flatten())?;
        info!("User {}: {} repository events", user.login, repo_events.len());
        Ok(repo_events)
    }

    /// The user's own event stream, single page.
    pub async fn fetch_own_events(&self, user: &User) -> Result<Vec<RemoteEvent>> {
        let raw = self
            .api
            .user_events(&user.access_token, &user.login, self.config.user_events_per_page)
            .await?;
        normalize_events(raw)
    }
}

/// Repositories updated strictly after `now - window`.
pub fn recent_repos(
    repos: Vec<RepoSummary>,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Vec<RepoSummary>> {
    let threshold = now.checked_sub_signed(window).ok_or_else(|| {
        FeedError::InvalidConfig(format!("recency window {} reaches before the representable range", window))
    })?;

    Ok(repos
        .into_iter()
        .filter(|repo| repo.updated_at > threshold)
        .collect())
}

fn normalize_events(raw: impl IntoIterator<Item = RawEvent>) -> Result<Vec<RemoteEvent>> {
    raw.into_iter().map(RemoteEvent::try_from).collect()
}
