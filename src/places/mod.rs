//! Place data model
//!
//! Predictions, place details, geographic bounds and the query error
//! taxonomy shared by the autocomplete engine and the details fetcher.

mod error;
mod types;

pub use error::QueryError;
pub use types::*;
