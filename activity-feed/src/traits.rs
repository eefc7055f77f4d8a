use crate::types::{InteractionGroup, RawEvent, RemoteEvent, RepoSummary, Result, User};
use async_trait::async_trait;

/// Read access to the code-hosting platform's REST API
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Recent public events performed by `login`
    async fn user_events(&self, token: &str, login: &str, per_page: u32) -> Result<Vec<RawEvent>>;

    /// Repositories `login` owns or collaborates on
    async fn user_repos(&self, token: &str, login: &str, per_page: u32) -> Result<Vec<RepoSummary>>;

    /// Recent events of a single repository
    async fn repo_events(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawEvent>>;
}

/// Store of comments and likes recorded against mirrored posts
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Group the interactions of every mirrored post matching one of `events`.
    /// Each group's comments and likes come back in recorded order, oldest first.
    async fn collect_interactions(&self, events: &[RemoteEvent]) -> Result<Vec<InteractionGroup>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;

    async fn find_by_git_id(&self, id: i64) -> Result<Option<User>>;
}
