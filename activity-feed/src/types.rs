use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Repository reference carried by every platform event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRef {
    pub id: u64,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
}

/// An event exactly as the platform delivers it, timestamp still in wire form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: Option<Actor>,
    pub repo: RepoRef,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub public: bool,
    pub created_at: String,
}

/// A platform event with its creation time normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: Option<Actor>,
    pub repo: RepoRef,
    pub payload: Value,
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RawEvent> for RemoteEvent {
    type Error = FeedError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let created_at = DateTime::parse_from_rfc3339(&raw.created_at)
            .map_err(|e| {
                FeedError::MalformedPayload(format!(
                    "event {} has invalid created_at {:?}: {}",
                    raw.id, raw.created_at, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            id: raw.id,
            event_type: raw.event_type,
            actor: raw.actor,
            repo: raw.repo,
            payload: raw.payload,
            public: raw.public,
            created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Repository listing entry, only used to decide which repositories to poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub id: u64,
    pub owner: RepoOwner,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl RepoSummary {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

/// Local record mirroring one platform event; comments and likes hang off it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirroredPost {
    /// Platform-assigned event id
    pub id: String,
    pub event_type: String,
    pub repo_name: String,
    pub author_login: String,
    pub created_at: DateTime<Utc>,
}

/// A single comment or like recorded against a mirrored post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub actor_id: String,
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub type Comment = Interaction;
pub type Like = Interaction;

/// All interactions on one mirrored post, each list oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionGroup {
    pub post: MirroredPost,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedEntryKind {
    RemoteEvent,
    CommentDigest,
    LikeDigest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum FeedPayload {
    RemoteEvent {
        event: RemoteEvent,
    },
    CommentDigest {
        comments: Vec<Comment>,
        post: MirroredPost,
    },
    LikeDigest {
        likes: Vec<Like>,
        post: MirroredPost,
    },
}

/// One item of the merged feed.
///
/// The recency timestamp is fixed at construction and only used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    id: String,
    #[serde(rename = "created_at")]
    recency: DateTime<Utc>,
    #[serde(flatten)]
    payload: FeedPayload,
}

impl FeedEntry {
    pub fn remote(event: RemoteEvent) -> Self {
        Self {
            id: event.id.clone(),
            recency: event.created_at,
            payload: FeedPayload::RemoteEvent { event },
        }
    }

    pub fn comment_digest(post: MirroredPost, comments: Vec<Comment>, recency: DateTime<Utc>) -> Self {
        Self {
            id: post.id.clone(),
            recency,
            payload: FeedPayload::CommentDigest { comments, post },
        }
    }

    pub fn like_digest(post: MirroredPost, likes: Vec<Like>, recency: DateTime<Utc>) -> Self {
        Self {
            id: post.id.clone(),
            recency,
            payload: FeedPayload::LikeDigest { likes, post },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> FeedEntryKind {
        match self.payload {
            FeedPayload::RemoteEvent { .. } => FeedEntryKind::RemoteEvent,
            FeedPayload::CommentDigest { .. } => FeedEntryKind::CommentDigest,
            FeedPayload::LikeDigest { .. } => FeedEntryKind::LikeDigest,
        }
    }

    pub fn recency(&self) -> DateTime<Utc> {
        self.recency
    }

    pub fn payload(&self) -> &FeedPayload {
        &self.payload
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Platform numeric id
    pub id: i64,
    pub login: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

/// Entry in a user's append-only notification log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    pub post_id: String,
    pub kind: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub user_events_per_page: u32,
    pub repos_per_page: u32,
    pub repo_events_per_page: u32,
    pub recency_window_hours: i64,
}

impl FeedConfig {
    /// The recency window as a duration. Must be a positive number of hours
    /// small enough for chrono to represent.
    pub fn recency_window(&self) -> Result<Duration> {
        if self.recency_window_hours <= 0 {
            return Err(FeedError::InvalidConfig(format!(
                "recency window must be positive, got {}h",
                self.recency_window_hours
            )));
        }
        Duration::try_hours(self.recency_window_hours).ok_or_else(|| {
            FeedError::InvalidConfig(format!(
                "recency window of {}h is out of range",
                self.recency_window_hours
            ))
        })
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            user_agent: "activity-feed/0.1".to_string(),
            timeout_seconds: 30,
            user_events_per_page: 30,
            repos_per_page: 50,
            repo_events_per_page: 50,
            recency_window_hours: 48,
        }
    }
}

/// Which side of the aggregation an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RemoteApi,
    LocalStore,
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API returned HTTP {status} for {url}")]
    RemoteStatus { status: u16, url: String },

    #[error("Rate limited by remote API")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("User not found: {login}")]
    UserNotFound { login: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("General error: {0}")]
    General(String),
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Http(_)
            | FeedError::RemoteStatus { .. }
            | FeedError::RateLimited { .. }
            | FeedError::MalformedPayload(_)
            | FeedError::InvalidUrl(_) => ErrorKind::RemoteApi,
            FeedError::Database(_) | FeedError::Migration(_) | FeedError::UserNotFound { .. } => {
                ErrorKind::LocalStore
            }
            FeedError::Serialization(_) | FeedError::InvalidConfig(_) | FeedError::General(_) => {
                ErrorKind::Other
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
