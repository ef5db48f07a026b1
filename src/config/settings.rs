//! Settings structures for the inventory console pickers

use crate::autocomplete::ControllerOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub outgoing: OutgoingSettings,
    pub suggest: SuggestSettings,
    pub cache: CacheSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    ///
    /// Values are checked by [`Settings::validate`] once overrides are merged.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge with environment variables (INVENTORY_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable lookup
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("INVENTORY_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("INVENTORY_API_URL") {
            self.api.base_url = val;
        }
        if let Some(val) = lookup("INVENTORY_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                self.suggest.debounce_ms = ms;
            }
        }
        if let Some(val) = lookup("INVENTORY_SUGGEST_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.suggest.limit = limit;
            }
        }
        if let Some(val) = lookup("INVENTORY_REQUEST_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.outgoing.request_timeout = timeout;
            }
        }
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.suggest.limit == 0 {
            return Err(ConfigError::Invalid {
                field: "suggest.limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.outgoing.request_timeout <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "outgoing.request_timeout",
                reason: "must be positive".to_string(),
            });
        }
        self.api.url()?;
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Console name shown by the demo host
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Inventory".to_string(),
        }
    }
}

/// Backend API location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL the `/api/v1/...` paths are resolved against
    pub base_url: String,
}

impl ApiSettings {
    /// Parsed base URL
    pub fn url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
            field: "api.base_url",
            reason: e.to_string(),
        })
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// User agent sent with every request
    pub user_agent: String,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send (e.g. an API token)
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            pool_maxsize: 20,
            verify_ssl: true,
            user_agent: format!("inventory-suggest/{}", crate::VERSION),
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Typeahead behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestSettings {
    /// Quiet period after the last keystroke before a lookup, in ms
    pub debounce_ms: u64,
    /// Number of candidates requested per lookup
    pub limit: usize,
    /// Entity picked when none is named
    pub default_source: String,
}

impl SuggestSettings {
    /// Controller options derived from these settings
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            limit: self.limit,
        }
    }
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self {
            debounce_ms: crate::DEFAULT_DEBOUNCE_MS,
            limit: crate::DEFAULT_LIMIT,
            default_source: "datacenters".to_string(),
        }
    }
}

/// Lookup cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: 30,
            max_capacity: 1000,
        }
    }
}
