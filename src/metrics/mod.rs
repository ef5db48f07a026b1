//! Lookup metrics
//!
//! Tracks dispatched lookups, stale discards, failures and latency per source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Metrics collector shared by pickers
pub struct LookupMetrics {
    /// Total lookups dispatched
    pub total_lookups: AtomicU64,
    /// Lookups per source
    dispatched: RwLock<HashMap<String, u64>>,
    /// Response times (last 100, in ms)
    response_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Responses applied to the picker
    accepted: RwLock<HashMap<String, u64>>,
    /// Responses dropped because a newer lookup superseded them
    stale: RwLock<HashMap<String, u64>>,
    /// Failures surfaced to the user
    failures: RwLock<HashMap<String, u64>>,
}

impl LookupMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_lookups: AtomicU64::new(0),
            dispatched: RwLock::new(HashMap::new()),
            response_times: RwLock::new(HashMap::new()),
            accepted: RwLock::new(HashMap::new()),
            stale: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
        }
    }

    fn bump(map: &RwLock<HashMap<String, u64>>, source: &str) {
        let mut counts = map.write().unwrap();
        *counts.entry(source.to_string()).or_insert(0) += 1;
    }

    fn read(map: &RwLock<HashMap<String, u64>>, source: &str) -> u64 {
        *map.read().unwrap().get(source).unwrap_or(&0)
    }

    /// Record a dispatched lookup
    pub fn record_dispatch(&self, source: &str) {
        self.total_lookups.fetch_add(1, Ordering::Relaxed);
        Self::bump(&self.dispatched, source);
    }

    /// Record lookup latency
    pub fn record_response_time(&self, source: &str, time_ms: u64) {
        let mut times = self.response_times.write().unwrap();
        let entry = times.entry(source.to_string()).or_default();

        if entry.len() >= 100 {
            entry.remove(0);
        }
        entry.push(time_ms);
    }

    pub fn record_accepted(&self, source: &str) {
        Self::bump(&self.accepted, source);
    }

    pub fn record_stale(&self, source: &str) {
        Self::bump(&self.stale, source);
    }

    pub fn record_failure(&self, source: &str) {
        Self::bump(&self.failures, source);
    }

    pub fn get_total_lookups(&self) -> u64 {
        self.total_lookups.load(Ordering::Relaxed)
    }

    pub fn get_dispatched(&self, source: &str) -> u64 {
        Self::read(&self.dispatched, source)
    }

    pub fn get_stale(&self, source: &str) -> u64 {
        Self::read(&self.stale, source)
    }

    pub fn get_failures(&self, source: &str) -> u64 {
        Self::read(&self.failures, source)
    }

    /// Get average response time for a source
    pub fn get_avg_response_time(&self, source: &str) -> Option<u64> {
        let times = self.response_times.read().unwrap();
        times.get(source).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Share of applied responses that were not failures, in percent
    pub fn get_reliability(&self, source: &str) -> f64 {
        let failure_count = self.get_failures(source);
        let success_count = Self::read(&self.accepted, source);

        let total = failure_count + success_count;
        if total == 0 {
            100.0
        } else {
            (success_count as f64 / total as f64) * 100.0
        }
    }

    /// Statistics for every source that dispatched a lookup
    pub fn get_source_stats(&self) -> HashMap<String, SourceStats> {
        let dispatched = self.dispatched.read().unwrap();
        let mut stats = HashMap::new();

        for (source, count) in dispatched.iter() {
            stats.insert(
                source.clone(),
                SourceStats {
                    lookups: *count,
                    stale: self.get_stale(source),
                    failures: self.get_failures(source),
                    avg_response_time: self.get_avg_response_time(source),
                    reliability: self.get_reliability(source),
                },
            );
        }

        stats
    }
}

impl Default for LookupMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single source
#[derive(Debug, Clone)]
pub struct SourceStats {
    pub lookups: u64,
    pub stale: u64,
    pub failures: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
