//! Autocomplete engine

use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::metrics::Metrics;
use crate::places::{BoundingBox, PlaceFilter, Prediction, QueryError};
use crate::request::{PendingRequest, RequestKind};
use crate::service::AutocompleteRequest;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

/// Issues autocomplete queries against the connected geodata service
///
/// Each call to [`AutocompleteEngine::query`] is independent: the engine does
/// not cancel, serialize or deduplicate in-flight queries, and responses may
/// complete in any order. Callers that care about staleness tag their
/// queries and drop outdated results.
pub struct AutocompleteEngine {
    connection: Arc<ConnectionManager>,
    bounds: RwLock<BoundingBox>,
    filter: RwLock<Option<PlaceFilter>>,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl AutocompleteEngine {
    /// Create an engine with the default query timeout
    pub fn new(
        connection: Arc<ConnectionManager>,
        bounds: BoundingBox,
        filter: Option<PlaceFilter>,
    ) -> Self {
        Self {
            connection,
            bounds: RwLock::new(bounds),
            filter: RwLock::new(filter),
            timeout: Duration::from_secs(crate::DEFAULT_QUERY_TIMEOUT),
            metrics: None,
        }
    }

    /// Create an engine from the search and service settings
    pub fn from_settings(connection: Arc<ConnectionManager>, settings: &Settings) -> Self {
        Self::new(
            connection,
            settings.search.bounds,
            settings.search.place_filter(),
        )
        .with_timeout(settings.service.query_timeout())
    }

    /// Set the maximum wait for a response
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record request outcomes into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Bounds used by subsequent queries; in-flight queries are unaffected
    pub fn set_bounds(&self, bounds: BoundingBox) {
        *self.bounds.write().unwrap_or_else(PoisonError::into_inner) = bounds;
    }

    pub fn bounds(&self) -> BoundingBox {
        *self.bounds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Filter used by subsequent queries
    pub fn set_filter(&self, filter: Option<PlaceFilter>) {
        *self.filter.write().unwrap_or_else(PoisonError::into_inner) = filter;
    }

    pub fn filter(&self) -> Option<PlaceFilter> {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query with the engine's current bounds and filter
    pub async fn query(&self, constraint: Option<&str>) -> Result<Vec<Prediction>, QueryError> {
        self.query_in_session(constraint, None).await
    }

    /// Query with the engine's current bounds and filter, tagged with a session token
    pub async fn query_in_session(
        &self,
        constraint: Option<&str>,
        session_token: Option<String>,
    ) -> Result<Vec<Prediction>, QueryError> {
        let bounds = self.bounds();
        let filter = self.filter();
        self.query_with(constraint, bounds, filter, session_token)
            .await
    }

    /// Query with explicit bounds and filter
    ///
    /// A missing or empty constraint is skipped without touching the
    /// network. Without a live connection the query fails immediately.
    /// Otherwise the response is awaited for at most the engine's timeout and
    /// the predictions come back in the order the service gave them.
    pub async fn query_with(
        &self,
        constraint: Option<&str>,
        bounds: BoundingBox,
        filter: Option<PlaceFilter>,
        session_token: Option<String>,
    ) -> Result<Vec<Prediction>, QueryError> {
        let input = match constraint {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                debug!("Skipping autocomplete: no constraint");
                return Err(QueryError::SkippedNoConstraint);
            }
        };

        let mut request = PendingRequest::new(RequestKind::Autocomplete, self.metrics.clone());
        let handle = match self.connection.handle() {
            Some(handle) => handle,
            None => return Err(request.reject_not_connected()),
        };

        debug!("Starting autocomplete for '{}'", input);
        let service = self.connection.service().clone();
        let service_request = AutocompleteRequest {
            handle,
            input,
            bounds,
            filter,
            session_token,
        };

        let buffer = request
            .dispatch(self.timeout, async move {
                service.autocomplete(service_request).await
            })
            .await?;

        let predictions = buffer.freeze_and_close();
        request.succeed();
        debug!("Autocomplete returned {} predictions", predictions.len());

        Ok(predictions)
    }
}
