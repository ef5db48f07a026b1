//! Error reporting collaborators
//!
//! Lookup failures are forwarded here by the controller. Reporters are
//! injected per picker; the console's alert banner reads from an
//! [`AlertBox`] shared by all of its pickers.

use crate::autocomplete::SuggestError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Receives lookup failures from a controller
pub trait ErrorReporter: Send + Sync {
    fn report(&self, source: &str, error: &SuggestError);
}

/// Reporter that only logs
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, source: &str, error: &SuggestError) {
        warn!(source = %source, "lookup failed: {}", error);
    }
}

/// Severity shown on the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

impl AlertLevel {
    /// Client errors are warnings, everything else is an error
    pub fn for_error(error: &SuggestError) -> Self {
        match error {
            SuggestError::Status { status, .. } if (400..500).contains(status) => {
                AlertLevel::Warning
            }
            _ => AlertLevel::Error,
        }
    }
}

/// A single banner entry
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub source: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Bounded list of alerts waiting to be shown or dismissed
pub struct AlertBox {
    alerts: RwLock<VecDeque<Alert>>,
    capacity: usize,
}

impl AlertBox {
    /// Create an alert box keeping at most `capacity` alerts
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Add an alert, evicting the oldest when full
    pub fn push(
        &self,
        level: AlertLevel,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Uuid {
        let alert = Alert {
            id: Uuid::new_v4(),
            level,
            source: source.into(),
            message: message.into(),
            raised_at: Utc::now(),
        };
        let id = alert.id;

        let mut alerts = self.alerts.write().unwrap();
        if alerts.len() >= self.capacity {
            alerts.pop_front();
        }
        alerts.push_back(alert);
        id
    }

    /// Current alerts, oldest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().unwrap().iter().cloned().collect()
    }

    /// Remove an alert; returns false if it was already gone
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut alerts = self.alerts.write().unwrap();
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        alerts.len() != before
    }

    pub fn clear(&self) {
        self.alerts.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.alerts.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlertBox {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ErrorReporter for AlertBox {
    fn report(&self, source: &str, error: &SuggestError) {
        debug!(source = %source, "raising alert: {}", error);
        self.push(AlertLevel::for_error(error), source, error.to_string());
    }
}
