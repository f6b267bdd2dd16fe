//! Web server module
//!
//! Exposes the autocomplete engine and details fetcher as a JSON API.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
