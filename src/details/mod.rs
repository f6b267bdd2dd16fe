//! Place details
//!
//! Resolves a place identifier picked from a prediction into full details.

mod fetcher;

pub use fetcher::PlaceDetailFetcher;
