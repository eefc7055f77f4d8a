use crate::traits::RemoteApi;
use crate::types::{FeedConfig, FeedError, RawEvent, RepoSummary, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// GitHub REST client. One instance is shared by every request; the access
/// token is supplied per call.
pub struct GitHubClient {
    client: Client,
    base_url: Url,
}

impl GitHubClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::General(format!(
                "API base URL cannot carry a path: {}",
                config.api_base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if is_rate_limited(&response) {
                let reset_at = rate_limit_reset(&response);
                warn!("Rate limited on {} (resets at {:?})", url, reset_at);
                return Err(FeedError::RateLimited { reset_at });
            }

            warn!("HTTP {} from {}", status, url);
            return Err(FeedError::RemoteStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| FeedError::MalformedPayload(format!("{}: {}", url, e)))
    }
}

fn is_rate_limited(response: &Response) -> bool {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|remaining| remaining.trim() == "0")
            .unwrap_or(false),
        _ => false,
    }
}

fn rate_limit_reset(response: &Response) -> Option<DateTime<Utc>> {
    response
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[async_trait]
impl RemoteApi for GitHubClient {
    async fn user_events(&self, token: &str, login: &str, per_page: u32) -> Result<Vec<RawEvent>> {
        let per_page = per_page.to_string();
        let url = self.endpoint(&["users", login, "events"], &[("per_page", per_page.as_str())]);
        self.get_json(token, url).await
    }

    async fn user_repos(&self, token: &str, login: &str, per_page: u32) -> Result<Vec<RepoSummary>> {
        let per_page = per_page.to_string();
        let url = self.endpoint(
            &["users", login, "repos"],
            &[("per_page", per_page.as_str()), ("type", "all")],
        );
        self.get_json(token, url).await
    }

    async fn repo_events(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawEvent>> {
        let per_page = per_page.to_string();
        let url = self.endpoint(&["repos", owner, repo, "events"], &[("per_page", per_page.as_str())]);
        self.get_json(token, url).await
    }
}
