#![allow(dead_code)]

use activity_feed::{
    Actor, FeedError, Interaction, InteractionGroup, InteractionStore, MirroredPost, RawEvent,
    RemoteApi, RemoteEvent, RepoOwner, RepoRef, RepoSummary, Result, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

pub fn test_user() -> User {
    User {
        id: 583231,
        login: "octocat".to_string(),
        access_token: "t0k3n".to_string(),
    }
}

pub fn raw_event(id: &str, event_type: &str, repo: &str, created_at: DateTime<Utc>) -> RawEvent {
    RawEvent {
        id: id.to_string(),
        event_type: event_type.to_string(),
        actor: Some(Actor {
            id: 583231,
            login: "octocat".to_string(),
            avatar_url: None,
        }),
        repo: RepoRef {
            id: 1296269,
            name: repo.to_string(),
            url: None,
        },
        payload: json!({}),
        public: true,
        created_at: created_at.to_rfc3339(),
    }
}

pub fn remote_event(id: &str, created_at: DateTime<Utc>) -> RemoteEvent {
    RemoteEvent::try_from(raw_event(id, "PushEvent", "octocat/Hello-World", created_at))
        .expect("valid event")
}

pub fn repo(owner: &str, name: &str, updated_at: DateTime<Utc>) -> RepoSummary {
    RepoSummary {
        id: 1296269,
        owner: RepoOwner {
            login: owner.to_string(),
        },
        name: name.to_string(),
        updated_at,
    }
}

pub fn post(id: &str) -> MirroredPost {
    MirroredPost {
        id: id.to_string(),
        event_type: "PushEvent".to_string(),
        repo_name: "octocat/Hello-World".to_string(),
        author_login: "octocat".to_string(),
        created_at: at(0),
    }
}

pub fn comment(actor: &str, text: &str, timestamp: DateTime<Utc>) -> Interaction {
    Interaction {
        id: Uuid::new_v4(),
        actor_id: actor.to_string(),
        content: Some(text.to_string()),
        timestamp,
    }
}

pub fn like(actor: &str, timestamp: DateTime<Utc>) -> Interaction {
    Interaction {
        id: Uuid::new_v4(),
        actor_id: actor.to_string(),
        content: None,
        timestamp,
    }
}

pub fn group(post_id: &str, comments: Vec<Interaction>, likes: Vec<Interaction>) -> InteractionGroup {
    InteractionGroup {
        post: post(post_id),
        comments,
        likes,
    }
}

pub fn hours_ago(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    now - Duration::hours(hours)
}

/// In-memory platform API that records every path it was asked for
#[derive(Default)]
pub struct MockRemoteApi {
    pub user_events: Vec<RawEvent>,
    pub repos: Vec<RepoSummary>,
    pub repo_events: HashMap<String, Vec<RawEvent>>,
    pub failing_repos: Vec<String>,
    /// When set, the repo listing only returns once every party has arrived
    pub repos_barrier: Option<Arc<Barrier>>,
    /// When set, every repository page waits for the others before returning
    pub repo_events_barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<String>>,
}

impl MockRemoteApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn user_events(&self, _token: &str, login: &str, _per_page: u32) -> Result<Vec<RawEvent>> {
        self.record(format!("users/{}/events", login));
        Ok(self.user_events.clone())
    }

    async fn user_repos(&self, _token: &str, login: &str, _per_page: u32) -> Result<Vec<RepoSummary>> {
        self.record(format!("users/{}/repos", login));
        if let Some(barrier) = &self.repos_barrier {
            barrier.wait().await;
        }
        Ok(self.repos.clone())
    }

    async fn repo_events(
        &self,
        _token: &str,
        owner: &str,
        repo: &str,
        _per_page: u32,
    ) -> Result<Vec<RawEvent>> {
        let full_name = format!("{}/{}", owner, repo);
        self.record(format!("repos/{}/events", full_name));
        if let Some(barrier) = &self.repo_events_barrier {
            barrier.wait().await;
        }

        if self.failing_repos.contains(&full_name) {
            return Err(FeedError::RemoteStatus {
                status: 502,
                url: format!("https://api.github.com/repos/{}/events", full_name),
            });
        }
        Ok(self.repo_events.get(&full_name).cloned().unwrap_or_default())
    }
}

/// In-memory interaction store returning canned groups
#[derive(Default)]
pub struct MockInteractionStore {
    pub groups: Vec<InteractionGroup>,
    pub fail: bool,
    /// When set, queries only return once every party has arrived
    pub barrier: Option<Arc<Barrier>>,
    received: Mutex<Vec<String>>,
}

impl MockInteractionStore {
    pub fn with_groups(groups: Vec<InteractionGroup>) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Ids of the events the store was queried with
    pub fn received_event_ids(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionStore for MockInteractionStore {
    async fn collect_interactions(&self, events: &[RemoteEvent]) -> Result<Vec<InteractionGroup>> {
        self.received
            .lock()
            .unwrap()
            .extend(events.iter().map(|event| event.id.clone()));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.fail {
            return Err(FeedError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.groups.clone())
    }
}
