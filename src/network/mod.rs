//! HTTP networking module
//!
//! Provides the HTTP client used by the suggestion adapters.

mod client;

pub use client::{ApiResponse, HttpClient};
