//! Suggestion source implementations for the inventory entities

use super::source::{Candidate, SuggestError, SuggestionSource};
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Listing adapter for one inventory collection
///
/// Issues `GET /api/v1/<collection>/?_filter=<query>&_limit=<limit>` and
/// reads the ranked records from the top-level `data` array.
pub struct ListingSource {
    name: String,
    collection: &'static str,
    label_fields: &'static [&'static str],
    client: HttpClient,
    base_url: Url,
}

/// `{"data": [...]}` envelope of a listing response
#[derive(Debug, Deserialize)]
struct Listing {
    data: Vec<serde_json::Value>,
}

/// `{"error": "..."}` body the API sends on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

impl ListingSource {
    pub fn new(
        collection: &'static str,
        label_fields: &'static [&'static str],
        client: HttpClient,
        base_url: Url,
    ) -> Self {
        Self {
            name: collection.to_string(),
            collection,
            label_fields,
            client,
            base_url,
        }
    }

    pub fn datacenters(client: HttpClient, base_url: Url) -> Self {
        Self::new("datacenters", &["name"], client, base_url)
    }

    pub fn projects(client: HttpClient, base_url: Url) -> Self {
        Self::new("projects", &["name"], client, base_url)
    }

    pub fn groups(client: HttpClient, base_url: Url) -> Self {
        Self::new("groups", &["name"], client, base_url)
    }

    pub fn hosts(client: HttpClient, base_url: Url) -> Self {
        Self::new("hosts", &["fqdn", "name"], client, base_url)
    }

    /// Endpoint for this collection, below any path prefix of the base URL
    fn endpoint(&self) -> Result<Url, SuggestError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        base.join(&format!("api/v1/{}/", self.collection))
            .map_err(|e| SuggestError::Transport(e.to_string()))
    }

    /// Turn a raw record into a candidate, if it carries a label
    fn to_candidate(&self, record: serde_json::Value) -> Option<Candidate> {
        let label = self
            .label_fields
            .iter()
            .find_map(|field| record.get(*field).and_then(|v| v.as_str()))?
            .to_string();

        let id = match record.get("_id") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        Some(Candidate::new(id, label).with_record(record))
    }
}

#[async_trait]
impl SuggestionSource for ListingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SuggestError> {
        let url = self.endpoint()?;
        let params = [("_filter", query.to_string()), ("_limit", limit.to_string())];

        let response = self.client.get_with_params(url.as_str(), &params).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&response.text)
                .ok()
                .and_then(|body| body.error);
            return Err(SuggestError::Status {
                status: response.status,
                message,
            });
        }

        let listing: Listing = serde_json::from_str(&response.text)?;

        Ok(listing
            .data
            .into_iter()
            .filter_map(|record| self.to_candidate(record))
            .take(limit)
            .collect())
    }
}

/// Get a source by entity name
pub fn get_source(
    name: &str,
    client: HttpClient,
    base_url: Url,
) -> Option<Arc<dyn SuggestionSource>> {
    match name.to_lowercase().as_str() {
        "datacenters" | "datacenter" | "dc" => {
            Some(Arc::new(ListingSource::datacenters(client, base_url)))
        }
        "projects" | "project" => Some(Arc::new(ListingSource::projects(client, base_url))),
        "groups" | "group" => Some(Arc::new(ListingSource::groups(client, base_url))),
        "hosts" | "host" => Some(Arc::new(ListingSource::hosts(client, base_url))),
        _ => None,
    }
}

/// List available sources
pub fn list_sources() -> Vec<&'static str> {
    vec!["datacenters", "projects", "groups", "hosts"]
}
