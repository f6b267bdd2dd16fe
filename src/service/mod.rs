//! External geodata service boundary
//!
//! The [`GeoDataService`] trait is the request/response contract the
//! autocomplete engine and details fetcher are written against.
//! [`HttpPlacesService`] implements it over the Places web-service JSON API.

mod buffer;
mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use buffer::{
    AutocompletePredictionBuffer, DataBuffer, PlaceBuffer, ReleaseHook, Status,
};
pub use http::HttpPlacesService;

use crate::connection::ConnectionHandle;
use crate::places::{BoundingBox, PlaceFilter};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Autocomplete request
#[derive(Debug, Clone)]
pub struct AutocompleteRequest {
    /// Handle of the live connection the request is issued on
    pub handle: ConnectionHandle,
    /// Text typed so far
    pub input: String,
    /// Bounds biasing the predictions
    pub bounds: BoundingBox,
    /// Optional place type restriction
    pub filter: Option<PlaceFilter>,
    /// Token grouping the keystrokes of one search session
    pub session_token: Option<String>,
}

/// Place details request
#[derive(Debug, Clone)]
pub struct DetailsRequest {
    pub handle: ConnectionHandle,
    pub place_id: String,
    pub session_token: Option<String>,
}

/// Transport-level failures talking to the service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error: {0}")]
    Http(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ServiceError::Http(status.as_u16())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

/// Reason a connection attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("connection failed with code {code}: {message}")]
pub struct ConnectionFailure {
    pub code: i32,
    pub message: String,
}

impl ConnectionFailure {
    /// The service is not enabled for this client
    pub const SERVICE_DISABLED: i32 = 3;
    /// Missing or rejected credentials
    pub const INVALID_ACCOUNT: i32 = 5;
    /// The service could not be reached
    pub const NETWORK_ERROR: i32 = 7;
    /// Unexpected internal failure
    pub const INTERNAL_ERROR: i32 = 8;
    /// The attempt did not finish in time
    pub const TIMEOUT: i32 = 14;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Reason a live connection was suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendCause {
    /// The network went away
    NetworkLost,
    /// The service side went away
    ServiceDisconnected,
}

impl fmt::Display for SuspendCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkLost => write!(f, "network lost"),
            Self::ServiceDisconnected => write!(f, "service disconnected"),
        }
    }
}

/// Contract of the external geodata service
#[async_trait]
pub trait GeoDataService: Send + Sync {
    /// Service name, for logs
    fn name(&self) -> &str;

    /// Establish the connection
    async fn connect(&self) -> Result<(), ConnectionFailure>;

    /// Fetch autocomplete predictions
    async fn autocomplete(
        &self,
        request: AutocompleteRequest,
    ) -> Result<AutocompletePredictionBuffer, ServiceError>;

    /// Fetch the records for a place id
    async fn place_by_id(&self, request: DetailsRequest) -> Result<PlaceBuffer, ServiceError>;
}
