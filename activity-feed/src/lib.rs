pub mod types;
pub mod traits;
pub mod github;
pub mod fetcher;
pub mod collector;
pub mod normalizer;
pub mod merger;
pub mod aggregator;
pub mod store;
pub mod response;

pub use types::*;
pub use traits::{InteractionStore, RemoteApi, UserStore};
pub use github::GitHubClient;
pub use fetcher::{recent_repos, RemoteEventFetcher};
pub use collector::LocalInteractionCollector;
pub use normalizer::normalize;
pub use merger::merge;
pub use aggregator::FeedAggregator;
pub use store::{redact_database_url, PgStore};
pub use response::FeedResponse;
