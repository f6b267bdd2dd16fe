//! Place autocomplete
//!
//! Turns a text constraint into an ordered list of place predictions from
//! the geodata service.

mod engine;

pub use engine::AutocompleteEngine;
