//! Suggestion source trait and candidate types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single suggestion shown to the user before commitment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Record identifier (empty when the backend sends none)
    pub id: String,
    /// Text displayed in the suggestion list
    pub label: String,
    /// The full record as returned by the backend
    pub record: serde_json::Value,
}

impl Candidate {
    /// Create a candidate without a backing record
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            record: serde_json::Value::Null,
        }
    }

    /// Attach the backend record
    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.record = record;
        self
    }
}

/// Lookup failures reported by a suggestion source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status
    #[error("server returned {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },
    /// The response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
    /// No adapter is registered under this name
    #[error("unknown suggestion source: {0}")]
    UnknownSource(String),
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl From<anyhow::Error> for SuggestError {
    fn from(err: anyhow::Error) -> Self {
        SuggestError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SuggestError {
    fn from(err: serde_json::Error) -> Self {
        SuggestError::Decode(err.to_string())
    }
}

/// Per-entity adapter producing ranked candidates for a free-text query
///
/// Implementations must be safe under overlapping calls with different
/// queries; the controller polices response ordering, not the source.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Source name, used in logs and metrics
    fn name(&self) -> &str;

    /// Fetch at most `limit` candidates for `query`
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SuggestError>;
}
