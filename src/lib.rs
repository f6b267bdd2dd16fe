//! places-rs: asynchronous place autocomplete and place details
//!
//! A connection manager gates access to a geodata service; the autocomplete
//! engine and the details fetcher issue bounded, timed requests through it,
//! and the binding layer turns keystrokes into generation-tagged queries.

pub mod autocomplete;
pub mod binding;
pub mod config;
pub mod connection;
pub mod details;
pub mod metrics;
pub mod network;
pub mod places;
pub mod request;
pub mod service;
pub mod web;

pub use autocomplete::AutocompleteEngine;
pub use config::Settings;
pub use connection::{ConnectionManager, ConnectionState};
pub use details::PlaceDetailFetcher;
pub use places::{BoundingBox, PlaceDetail, Prediction, QueryError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default wait for a query response in seconds
pub const DEFAULT_QUERY_TIMEOUT: u64 = 60;
