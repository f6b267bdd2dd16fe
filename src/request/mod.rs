//! Request lifecycle shared by autocomplete queries and detail fetches
//!
//! ```text
//! Idle -> Requested -> { Succeeded | ServiceFailed | TimedOut | NotConnectedRejected }
//! ```
//!
//! The service call runs on its own task. When the await times out the task
//! is left to finish on its own; its buffer is released on drop when it
//! arrives. There is no retry at this layer.

use crate::metrics::Metrics;
use crate::places::QueryError;
use crate::service::{DataBuffer, ServiceError};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Kind of request flowing through the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Autocomplete,
    Details,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [RequestKind::Autocomplete, RequestKind::Details];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Autocomplete => write!(f, "autocomplete"),
            Self::Details => write!(f, "details"),
        }
    }
}

/// Lifecycle state of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Requested,
    Succeeded,
    ServiceFailed,
    TimedOut,
    NotConnectedRejected,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Idle | RequestState::Requested)
    }
}

/// One request moving through the lifecycle
pub struct PendingRequest {
    kind: RequestKind,
    state: RequestState,
    started: Option<Instant>,
    metrics: Option<Arc<Metrics>>,
}

impl PendingRequest {
    pub fn new(kind: RequestKind, metrics: Option<Arc<Metrics>>) -> Self {
        if let Some(ref m) = metrics {
            m.inc_request();
        }
        Self {
            kind,
            state: RequestState::Idle,
            started: None,
            metrics,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Reject the request because there is no live connection
    pub fn reject_not_connected(&mut self) -> QueryError {
        debug!("{} request rejected: not connected", self.kind);
        self.finish(RequestState::NotConnectedRejected);
        QueryError::NotConnected
    }

    /// Run the service call on a worker task and wait for it
    ///
    /// Unsuccessful statuses are turned into `QueryError::ServiceError` after
    /// releasing the buffer. A successful buffer is handed back with the
    /// request still `Requested`; the caller finishes it with
    /// [`PendingRequest::succeed`] or [`PendingRequest::fail`].
    pub async fn dispatch<T, F>(
        &mut self,
        timeout: Duration,
        call: F,
    ) -> Result<DataBuffer<T>, QueryError>
    where
        T: Send + 'static,
        F: Future<Output = Result<DataBuffer<T>, ServiceError>> + Send + 'static,
    {
        self.state = RequestState::Requested;
        self.started = Some(Instant::now());

        let task = tokio::spawn(call);

        match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                warn!("{} request timed out after {:?}", self.kind, timeout);
                self.finish(RequestState::TimedOut);
                Err(QueryError::Timeout)
            }
            Ok(Err(join_error)) => {
                warn!("{} request task failed: {}", self.kind, join_error);
                self.finish(RequestState::ServiceFailed);
                Err(QueryError::ServiceError(format!(
                    "request task failed: {}",
                    join_error
                )))
            }
            Ok(Ok(Err(service_error))) => {
                warn!("{} request failed: {}", self.kind, service_error);
                self.finish(RequestState::ServiceFailed);
                Err(QueryError::ServiceError(service_error.to_string()))
            }
            Ok(Ok(Ok(buffer))) => {
                if buffer.status().is_success() {
                    return Ok(buffer);
                }
                let description = buffer.status().description().to_string();
                buffer.release();
                warn!("{} request unsuccessful: {}", self.kind, description);
                self.finish(RequestState::ServiceFailed);
                Err(QueryError::ServiceError(description))
            }
        }
    }

    /// Finish a dispatched request successfully
    pub fn succeed(&mut self) {
        self.finish(RequestState::Succeeded);
    }

    /// Finish a dispatched request with an error found while reading the buffer
    pub fn fail(&mut self, error: QueryError) -> QueryError {
        warn!("{} request failed: {}", self.kind, error);
        self.finish(RequestState::ServiceFailed);
        error
    }

    fn finish(&mut self, state: RequestState) {
        debug_assert!(state.is_terminal());
        if self.state.is_terminal() {
            return;
        }
        self.state = state;

        if let Some(ref metrics) = self.metrics {
            metrics.record_outcome(self.kind, state);
            if let Some(started) = self.started {
                if state != RequestState::TimedOut {
                    metrics.record_response_time(self.kind, started.elapsed());
                }
            }
        }

        if let Some(started) = self.started {
            debug!("{} request {:?} in {:?}", self.kind, state, started.elapsed());
        }
    }
}
