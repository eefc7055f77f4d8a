use crate::traits::{InteractionStore, UserStore};
use crate::types::{
    Interaction, InteractionGroup, MirroredPost, RemoteEvent, Result, StoredNotification, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
enum InteractionKind {
    Comment,
    Like,
}

impl InteractionKind {
    fn table(self) -> &'static str {
        match self {
            InteractionKind::Comment => "comments",
            InteractionKind::Like => "likes",
        }
    }
}

const UNPARSEABLE_DATABASE_URL: &str = "<unparseable database url>";

/// Connection string safe for logs: any password is masked. When the URL
/// cannot be parsed or masked, nothing of it is returned.
pub fn redact_database_url(database_url: &str) -> String {
    let Ok(mut url) = Url::parse(database_url) else {
        return UNPARSEABLE_DATABASE_URL.to_string();
    };
    if url.password().is_some() && url.set_password(Some("***")).is_err() {
        return UNPARSEABLE_DATABASE_URL.to_string();
    }
    url.to_string()
}

/// PostgreSQL-backed store for users, mirrored posts and their interactions
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// Mirror a platform event locally. Returns false if it was already mirrored.
    pub async fn mirror_post(&self, post: &MirroredPost) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, event_type, repo_name, author_login, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&post.id)
        .bind(&post.event_type)
        .bind(&post.repo_name)
        .bind(&post.author_login)
        .bind(post.created_at)
        .execute(&self.db)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            info!("Mirrored post {} ({} on {})", post.id, post.event_type, post.repo_name);
        }
        Ok(inserted)
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        actor_id: &str,
        content: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Interaction> {
        self.insert_interaction(InteractionKind::Comment, post_id, actor_id, Some(content), recorded_at)
            .await
    }

    pub async fn add_like(
        &self,
        post_id: &str,
        actor_id: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Interaction> {
        self.insert_interaction(InteractionKind::Like, post_id, actor_id, None, recorded_at)
            .await
    }

    async fn insert_interaction(
        &self,
        kind: InteractionKind,
        post_id: &str,
        actor_id: &str,
        content: Option<&str>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Interaction> {
        let interaction = Interaction {
            id: Uuid::new_v4(),
            actor_id: actor_id.to_string(),
            content: content.map(str::to_string),
            timestamp: recorded_at,
        };

        let sql = format!(
            "INSERT INTO {} (id, post_id, actor_id, content, recorded_at) VALUES ($1, $2, $3, $4, $5)",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(interaction.id)
            .bind(post_id)
            .bind(&interaction.actor_id)
            .bind(&interaction.content)
            .bind(interaction.timestamp)
            .execute(&self.db)
            .await?;

        debug!("Recorded {:?} {} on post {}", kind, interaction.id, post_id);
        Ok(interaction)
    }

    /// Interactions of one kind for the given posts, keyed by post id, in
    /// recording order.
    async fn interactions_for(
        &self,
        kind: InteractionKind,
        post_ids: &[String],
    ) -> Result<HashMap<String, Vec<Interaction>>> {
        let sql = format!(
            "SELECT id, post_id, actor_id, content, recorded_at FROM {} WHERE post_id = ANY($1) ORDER BY seq ASC",
            kind.table()
        );
        let rows = sqlx::query(&sql).bind(post_ids).fetch_all(&self.db).await?;

        let mut by_post: HashMap<String, Vec<Interaction>> = HashMap::new();
        for row in rows {
            let post_id: String = row.try_get("post_id")?;
            by_post.entry(post_id).or_default().push(interaction_from_row(&row)?);
        }
        Ok(by_post)
    }

    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, login, access_token, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                login = EXCLUDED.login,
                access_token = EXCLUDED.access_token,
                updated_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.access_token)
        .execute(&self.db)
        .await?;

        info!("Stored user {} ({})", user.login, user.id);
        Ok(())
    }

    /// Append to a user's notification log. The log is never read by the feed.
    pub async fn append_notification(&self, user_id: i64, notification: &StoredNotification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, post_id, kind, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(&notification.post_id)
        .bind(&notification.kind)
        .bind(&notification.content)
        .bind(notification.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn notifications(&self, user_id: i64) -> Result<Vec<StoredNotification>> {
        let rows = sqlx::query(
            "SELECT post_id, kind, content, created_at FROM notifications WHERE user_id = $1 ORDER BY seq ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            notifications.push(StoredNotification {
                post_id: row.try_get("post_id")?,
                kind: row.try_get("kind")?,
                content: row.try_get("content")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(notifications)
    }
}

fn post_from_row(row: &PgRow) -> Result<MirroredPost> {
    Ok(MirroredPost {
        id: row.try_get("id")?,
        event_type: row.try_get("event_type")?,
        repo_name: row.try_get("repo_name")?,
        author_login: row.try_get("author_login")?,
        created_at: row.try_get("created_at")?,
    })
}

fn interaction_from_row(row: &PgRow) -> Result<Interaction> {
    Ok(Interaction {
        id: row.try_get("id")?,
        actor_id: row.try_get("actor_id")?,
        content: row.try_get("content")?,
        timestamp: row.try_get("recorded_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        access_token: row.try_get("access_token")?,
    })
}

#[async_trait]
impl InteractionStore for PgStore {
    async fn collect_interactions(&self, events: &[RemoteEvent]) -> Result<Vec<InteractionGroup>> {
        let event_ids: Vec<String> = events.iter().map(|event| event.id.clone()).collect();
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, event_type, repo_name, author_login, created_at
            FROM posts
            WHERE id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&event_ids)
        .fetch_all(&self.db)
        .await?;

        let posts = rows.iter().map(post_from_row).collect::<Result<Vec<_>>>()?;
        debug!("{} of {} events are mirrored locally", posts.len(), event_ids.len());
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<String> = posts.iter().map(|post| post.id.clone()).collect();
        let mut comments = self.interactions_for(InteractionKind::Comment, &post_ids).await?;
        let mut likes = self.interactions_for(InteractionKind::Like, &post_ids).await?;

        let groups = posts
            .into_iter()
            .filter_map(|post| {
                let post_comments = comments.remove(&post.id).unwrap_or_default();
                let post_likes = likes.remove(&post.id).unwrap_or_default();
                if post_comments.is_empty() && post_likes.is_empty() {
                    return None;
                }
                Some(InteractionGroup {
                    post,
                    comments: post_comments,
                    likes: post_likes,
                })
            })
            .collect();

        Ok(groups)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, login, access_token FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_git_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, login, access_token FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}
