//! Place detail fetcher

use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::metrics::Metrics;
use crate::places::{PlaceDetail, QueryError};
use crate::request::{PendingRequest, RequestKind};
use crate::service::DetailsRequest;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches full details for a place id
pub struct PlaceDetailFetcher {
    connection: Arc<ConnectionManager>,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl PlaceDetailFetcher {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self {
            connection,
            timeout: Duration::from_secs(crate::DEFAULT_QUERY_TIMEOUT),
            metrics: None,
        }
    }

    pub fn from_settings(connection: Arc<ConnectionManager>, settings: &Settings) -> Self {
        Self::new(connection).with_timeout(settings.service.query_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fetch details for `place_id`
    pub async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetail, QueryError> {
        self.fetch_details_in_session(place_id, None).await
    }

    /// Fetch details for `place_id`, closing the given autocomplete session
    ///
    /// The first record of the response becomes the detail. A successful
    /// response without records is reported as `EmptyResult`. Attribution
    /// text is copied verbatim; `None` means nothing has to be credited.
    pub async fn fetch_details_in_session(
        &self,
        place_id: &str,
        session_token: Option<String>,
    ) -> Result<PlaceDetail, QueryError> {
        if place_id.is_empty() {
            return Err(QueryError::InvalidPlaceId);
        }

        let mut request = PendingRequest::new(RequestKind::Details, self.metrics.clone());
        let handle = match self.connection.handle() {
            Some(handle) => handle,
            None => return Err(request.reject_not_connected()),
        };

        let service = self.connection.service().clone();
        let service_request = DetailsRequest {
            handle,
            place_id: place_id.to_string(),
            session_token,
        };

        let buffer = request
            .dispatch(self.timeout, async move {
                service.place_by_id(service_request).await
            })
            .await?;

        let (record, attribution) = buffer.take_first();
        let record = match record {
            Some(record) => record,
            None => return Err(request.fail(QueryError::EmptyResult)),
        };
        request.succeed();

        if record.id != place_id {
            debug!("Details for {} came back as {}", place_id, record.id);
        }
        info!("Fetched details for {}", record.name);

        Ok(PlaceDetail::from_record(record, attribution))
    }
}
