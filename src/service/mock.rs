//! Scripted in-memory service for tests

use super::{
    AutocompletePredictionBuffer, AutocompleteRequest, ConnectionFailure, DataBuffer,
    DetailsRequest, GeoDataService, PlaceBuffer, ServiceError, Status,
};
use crate::places::{PlaceRecord, Prediction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Reply<T> {
    Buffer {
        status: Status,
        items: Vec<T>,
        attributions: Option<String>,
    },
    Error(ServiceError),
}

#[derive(Clone)]
struct Scripted<T> {
    delay: Duration,
    reply: Reply<T>,
}

impl<T> Scripted<T> {
    fn items(items: Vec<T>) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Reply::Buffer {
                status: Status::ok(),
                items,
                attributions: None,
            },
        }
    }
}

/// Service answering from a fixed script, counting calls and releases
///
/// Inputs and place ids without a script get a successful empty buffer.
pub(crate) struct ScriptedService {
    connect_result: Result<(), ConnectionFailure>,
    connect_delay: Duration,
    autocomplete: HashMap<String, Scripted<Prediction>>,
    details: HashMap<String, Scripted<PlaceRecord>>,
    connect_calls: AtomicUsize,
    autocomplete_calls: AtomicUsize,
    details_calls: AtomicUsize,
    released: Arc<AtomicUsize>,
    last_autocomplete: Mutex<Option<AutocompleteRequest>>,
    last_details: Mutex<Option<DetailsRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            connect_result: Ok(()),
            connect_delay: Duration::ZERO,
            autocomplete: HashMap::new(),
            details: HashMap::new(),
            connect_calls: AtomicUsize::new(0),
            autocomplete_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
            last_autocomplete: Mutex::new(None),
            last_details: Mutex::new(None),
        }
    }

    pub fn with_connect_failure(mut self, code: i32) -> Self {
        self.connect_result = Err(ConnectionFailure::new(code, "scripted failure"));
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_predictions(mut self, input: &str, predictions: Vec<Prediction>) -> Self {
        self.autocomplete
            .insert(input.to_string(), Scripted::items(predictions));
        self
    }

    pub fn with_autocomplete_status(mut self, input: &str, status: Status) -> Self {
        self.autocomplete.insert(
            input.to_string(),
            Scripted {
                delay: Duration::ZERO,
                reply: Reply::Buffer {
                    status,
                    items: vec![],
                    attributions: None,
                },
            },
        );
        self
    }

    pub fn with_autocomplete_error(mut self, input: &str, error: ServiceError) -> Self {
        self.autocomplete.insert(
            input.to_string(),
            Scripted {
                delay: Duration::ZERO,
                reply: Reply::Error(error),
            },
        );
        self
    }

    /// Delay the reply for `input`; the input must already be scripted
    pub fn with_autocomplete_delay(mut self, input: &str, delay: Duration) -> Self {
        let entry = self
            .autocomplete
            .entry(input.to_string())
            .or_insert_with(|| Scripted::items(vec![]));
        entry.delay = delay;
        self
    }

    pub fn with_place(mut self, record: PlaceRecord, attributions: Option<&str>) -> Self {
        self.details.insert(
            record.id.clone(),
            Scripted {
                delay: Duration::ZERO,
                reply: Reply::Buffer {
                    status: Status::ok(),
                    items: vec![record],
                    attributions: attributions.map(String::from),
                },
            },
        );
        self
    }

    pub fn with_details_status(mut self, place_id: &str, status: Status) -> Self {
        self.details.insert(
            place_id.to_string(),
            Scripted {
                delay: Duration::ZERO,
                reply: Reply::Buffer {
                    status,
                    items: vec![],
                    attributions: None,
                },
            },
        );
        self
    }

    pub fn with_details_delay(mut self, place_id: &str, delay: Duration) -> Self {
        let entry = self
            .details
            .entry(place_id.to_string())
            .or_insert_with(|| Scripted::items(vec![]));
        entry.delay = delay;
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    /// Number of buffers released so far
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn last_autocomplete(&self) -> Option<AutocompleteRequest> {
        self.last_autocomplete.lock().unwrap().clone()
    }

    pub fn last_details(&self) -> Option<DetailsRequest> {
        self.last_details.lock().unwrap().clone()
    }

    fn build<T>(&self, scripted: Option<Scripted<T>>) -> Result<DataBuffer<T>, ServiceError> {
        let scripted = scripted.unwrap_or_else(|| Scripted::items(vec![]));
        match scripted.reply {
            Reply::Buffer {
                status,
                items,
                attributions,
            } => {
                let released = self.released.clone();
                Ok(DataBuffer::new(status, items)
                    .with_attributions(attributions)
                    .on_release(Box::new(move || {
                        released.fetch_add(1, Ordering::SeqCst);
                    })))
            }
            Reply::Error(e) => Err(e),
        }
    }
}

#[async_trait]
impl GeoDataService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn connect(&self) -> Result<(), ConnectionFailure> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        self.connect_result.clone()
    }

    async fn autocomplete(
        &self,
        request: AutocompleteRequest,
    ) -> Result<AutocompletePredictionBuffer, ServiceError> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.autocomplete.get(&request.input).cloned();
        *self.last_autocomplete.lock().unwrap() = Some(request);

        if let Some(delay) = scripted.as_ref().map(|s| s.delay) {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        self.build(scripted)
    }

    async fn place_by_id(&self, request: DetailsRequest) -> Result<PlaceBuffer, ServiceError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.details.get(&request.place_id).cloned();
        *self.last_details.lock().unwrap() = Some(request);

        if let Some(delay) = scripted.as_ref().map(|s| s.delay) {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        self.build(scripted)
    }
}
