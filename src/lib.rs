//! inventory-suggest: typeahead pickers for the inventory console
//!
//! Each picker turns keystrokes into a committed project, group,
//! datacenter or host, querying the inventory API as the user types.

pub mod autocomplete;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod network;
pub mod report;

pub use autocomplete::{
    AutosuggestController, Candidate, ControllerOptions, Picker, PickerHandle, PickerSnapshot,
    SuggestError, SuggestionSource,
};
pub use config::Settings;
pub use report::{AlertBox, ErrorReporter};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default quiet period before a lookup, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Default number of candidates per lookup
pub const DEFAULT_LIMIT: usize = 5;
