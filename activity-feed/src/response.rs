use crate::types::{FeedEntry, Result};
use serde_json::{json, Value};
use tracing::error;

/// What the caller receives for one feed request: a status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: Value,
}

impl FeedResponse {
    /// `200` with the feed as a JSON array, or `500` with `{"error": message}`.
    pub fn from_result(result: Result<Vec<FeedEntry>>) -> Self {
        let outcome = result.and_then(|feed| Ok(serde_json::to_value(&feed)?));
        match outcome {
            Ok(body) => Self { status: 200, body },
            Err(e) => {
                error!("Feed request failed: {}", e);
                Self {
                    status: 500,
                    body: json!({ "error": e.to_string() }),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
