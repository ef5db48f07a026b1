//! Configuration module
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use std::path::PathBuf;
use tracing::info;

/// Candidate settings locations, in lookup order
pub fn settings_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/inventory/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("inventory-suggest/settings.yml"));
    }
    paths
}

/// Load settings from the first file found, or use defaults
///
/// `INVENTORY_SETTINGS_PATH` takes precedence over the default locations.
/// Environment overrides are applied last in every case.
pub fn load() -> Result<Settings, ConfigError> {
    let explicit = std::env::var("INVENTORY_SETTINGS_PATH")
        .ok()
        .map(PathBuf::from)
        .filter(|p| p.exists());

    let found = explicit.or_else(|| settings_paths().into_iter().find(|p| p.exists()));

    let mut settings = match found {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
