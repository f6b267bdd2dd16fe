//! Query error taxonomy

use serde::Serialize;
use thiserror::Error;

/// Errors returned by autocomplete queries and detail fetches
///
/// None of these is fatal: the engine and fetcher stay usable after any of
/// them. The core never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum QueryError {
    /// The geodata service connection is not established
    #[error("not connected to the geodata service")]
    NotConnected,
    /// No constraint was supplied, so no query was made
    #[error("no constraint given, query skipped")]
    SkippedNoConstraint,
    /// An empty place identifier was supplied
    #[error("place id must not be empty")]
    InvalidPlaceId,
    /// The service did not answer within the query timeout
    #[error("query timed out")]
    Timeout,
    /// The service answered with an unsuccessful status
    #[error("service error: {0}")]
    ServiceError(String),
    /// The service reported success but returned no records
    #[error("service returned no records")]
    EmptyResult,
}

impl QueryError {
    /// Short machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::SkippedNoConstraint => "skipped_no_constraint",
            Self::InvalidPlaceId => "invalid_place_id",
            Self::Timeout => "timeout",
            Self::ServiceError(_) => "service_error",
            Self::EmptyResult => "empty_result",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            QueryError::ServiceError("OVER_QUERY_LIMIT".to_string()).to_string(),
            "service error: OVER_QUERY_LIMIT"
        );
        assert_eq!(QueryError::Timeout.kind(), "timeout");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(QueryError::ServiceError("DENIED".into())).unwrap();
        assert_eq!(json["kind"], "service_error");
        assert_eq!(json["message"], "DENIED");
    }
}
