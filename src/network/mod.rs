//! HTTP networking module
//!
//! Provides the HTTP client used to talk to the places web service.

mod client;
mod request;

pub use client::HttpClient;
pub use request::{HttpRequest, HttpResponse};
