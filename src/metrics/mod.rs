//! Metrics collection module
//!
//! Tracks request counts, terminal outcomes and response times per request kind.

use crate::request::{RequestKind, RequestState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Number of response times kept per request kind
const RESPONSE_TIME_WINDOW: usize = 100;

/// Request metrics shared by the autocomplete engine and the details fetcher
pub struct Metrics {
    /// Total requests started (including rejected ones)
    pub total_requests: AtomicU64,
    /// Terminal outcomes per kind
    outcomes: RwLock<HashMap<(RequestKind, RequestState), u64>>,
    /// Response times per kind (rolling window in ms)
    response_times: RwLock<HashMap<RequestKind, Vec<u64>>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            outcomes: RwLock::new(HashMap::new()),
            response_times: RwLock::new(HashMap::new()),
        }
    }

    /// Increment total request count
    pub fn inc_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the terminal state of a request
    pub fn record_outcome(&self, kind: RequestKind, state: RequestState) {
        let mut outcomes = self.outcomes.write().unwrap();
        *outcomes.entry((kind, state)).or_insert(0) += 1;
    }

    /// Record a response time for a request that reached the service
    pub fn record_response_time(&self, kind: RequestKind, elapsed: Duration) {
        let mut times = self.response_times.write().unwrap();
        let entry = times.entry(kind).or_insert_with(Vec::new);

        if entry.len() >= RESPONSE_TIME_WINDOW {
            entry.remove(0);
        }
        entry.push(elapsed.as_millis() as u64);
    }

    /// Get total requests
    pub fn get_total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Count of requests of `kind` that ended in `state`
    pub fn get_outcome_count(&self, kind: RequestKind, state: RequestState) -> u64 {
        let outcomes = self.outcomes.read().unwrap();
        *outcomes.get(&(kind, state)).unwrap_or(&0)
    }

    /// Get average response time for a request kind
    pub fn get_avg_response_time(&self, kind: RequestKind) -> Option<u64> {
        let times = self.response_times.read().unwrap();
        times.get(&kind).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Success percentage for a request kind
    pub fn get_reliability(&self, kind: RequestKind) -> f64 {
        let outcomes = self.outcomes.read().unwrap();
        let mut total = 0;
        let mut succeeded = 0;
        for ((k, state), count) in outcomes.iter() {
            if *k != kind {
                continue;
            }
            total += count;
            if *state == RequestState::Succeeded {
                succeeded += count;
            }
        }

        if total == 0 {
            100.0
        } else {
            (succeeded as f64 / total as f64) * 100.0
        }
    }

    /// Statistics for every request kind
    pub fn snapshot(&self) -> HashMap<RequestKind, RequestStats> {
        RequestKind::ALL
            .iter()
            .map(|&kind| {
                let outcome = |state| self.get_outcome_count(kind, state);
                (
                    kind,
                    RequestStats {
                        succeeded: outcome(RequestState::Succeeded),
                        service_failed: outcome(RequestState::ServiceFailed),
                        timed_out: outcome(RequestState::TimedOut),
                        not_connected: outcome(RequestState::NotConnectedRejected),
                        avg_response_time: self.get_avg_response_time(kind),
                        reliability: self.get_reliability(kind),
                    },
                )
            })
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single request kind
#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    pub succeeded: u64,
    pub service_failed: u64,
    pub timed_out: u64,
    pub not_connected: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
