//! Typeahead pickers for inventory entities
//!
//! A picker pairs an [`AutosuggestController`] with a [`SuggestionSource`]
//! for one entity type and drives it on a tokio task.

mod backends;
mod controller;
mod picker;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use backends::{get_source, list_sources, ListingSource};
pub use controller::{
    AutosuggestController, ControllerOptions, Direction, Effect, Key, LookupRequest, NoopHost,
    PickerHost, PickerSnapshot, RequestToken, SelectionChange, SelectionState,
};
pub use picker::{Picker, PickerHandle};
pub use source::{Candidate, SuggestError, SuggestionSource};

use crate::cache::CachedSource;
use crate::config::Settings;
use crate::network::HttpClient;
use anyhow::Result;
use std::sync::Arc;

/// Build the source for an entity, wrapped in a cache when enabled
pub fn build_source(
    name: &str,
    settings: &Settings,
    client: HttpClient,
) -> Result<Arc<dyn SuggestionSource>> {
    let base_url = settings.api.url()?;
    let source = get_source(name, client, base_url)
        .ok_or_else(|| SuggestError::UnknownSource(name.to_string()))?;

    if settings.cache.enabled {
        Ok(Arc::new(CachedSource::with_settings(source, &settings.cache)))
    } else {
        Ok(source)
    }
}
