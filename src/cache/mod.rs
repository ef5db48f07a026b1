//! Caching module
//!
//! Memoises successful lookups so a source can be shared by several
//! pickers without repeating identical requests.

use crate::autocomplete::{Candidate, SuggestError, SuggestionSource};
use crate::config::CacheSettings;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Caching decorator over any suggestion source
pub struct CachedSource {
    inner: Arc<dyn SuggestionSource>,
    cache: Cache<String, Vec<Candidate>>,
}

impl CachedSource {
    /// Wrap `inner` with the given TTL and capacity
    pub fn new(inner: Arc<dyn SuggestionSource>, ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { inner, cache }
    }

    pub fn with_settings(inner: Arc<dyn SuggestionSource>, settings: &CacheSettings) -> Self {
        Self::new(inner, settings.ttl_seconds, settings.max_capacity)
    }

    /// Drop every cached lookup
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache size
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl SuggestionSource for CachedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SuggestError> {
        let key = lookup_cache_key(self.inner.name(), query, limit);

        if let Some(hit) = self.cache.get(&key).await {
            trace!(source = %self.inner.name(), query = %query, "cache hit");
            return Ok(hit);
        }

        let candidates = self.inner.lookup(query, limit).await?;
        self.cache.insert(key, candidates.clone()).await;
        Ok(candidates)
    }
}

/// Generate a cache key for a lookup
pub fn lookup_cache_key(source: &str, query: &str, limit: usize) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(query.as_bytes());
    hasher.update([0u8]);
    hasher.update(limit.to_string().as_bytes());

    format!("{:x}", hasher.finalize())
}
