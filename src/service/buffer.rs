//! Service response buffers
//!
//! Every response from the geodata service arrives as a [`DataBuffer`] that
//! must be released once it has been read. Release happens exactly once:
//! explicitly through [`DataBuffer::release`] or [`DataBuffer::freeze_and_close`],
//! or on drop for a buffer nobody consumed (for example one that arrived
//! after its query timed out).

use crate::places::{PlaceRecord, Prediction};
use std::fmt;
use tracing::debug;

/// Callback run when a buffer is released
pub type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Success/failure status attached to every service response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    success: bool,
    description: String,
}

impl Status {
    /// A successful status
    pub fn ok() -> Self {
        Self {
            success: true,
            description: "OK".to_string(),
        }
    }

    /// An unsuccessful status with a description
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// A released-once response buffer holding records of type `T`
pub struct DataBuffer<T> {
    status: Status,
    items: Vec<T>,
    attributions: Option<String>,
    on_release: Option<ReleaseHook>,
    released: bool,
}

/// Response to an autocomplete request
pub type AutocompletePredictionBuffer = DataBuffer<Prediction>;

/// Response to a details request
pub type PlaceBuffer = DataBuffer<PlaceRecord>;

impl<T> DataBuffer<T> {
    /// Create a buffer with the given status and records
    pub fn new(status: Status, items: Vec<T>) -> Self {
        Self {
            status,
            items,
            attributions: None,
            on_release: None,
            released: false,
        }
    }

    /// Successful buffer
    pub fn success(items: Vec<T>) -> Self {
        Self::new(Status::ok(), items)
    }

    /// Unsuccessful buffer with no records
    pub fn failure(description: impl Into<String>) -> Self {
        Self::new(Status::error(description), vec![])
    }

    /// Attach third-party attribution text
    pub fn with_attributions(mut self, attributions: Option<String>) -> Self {
        self.attributions = attributions;
        self
    }

    /// Register a callback run on release
    pub fn on_release(mut self, hook: ReleaseHook) -> Self {
        self.on_release = Some(hook);
        self
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn attributions(&self) -> Option<&str> {
        self.attributions.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Release the buffer without keeping its records
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Move the records out, then release the buffer
    pub fn freeze_and_close(mut self) -> Vec<T> {
        let items = std::mem::take(&mut self.items);
        self.release_inner();
        items
    }

    /// Take the first record and the attributions, then release the buffer
    pub fn take_first(mut self) -> (Option<T>, Option<String>) {
        let first = if self.items.is_empty() {
            None
        } else {
            Some(self.items.swap_remove(0))
        };
        let attributions = self.attributions.take();
        self.release_inner();
        (first, attributions)
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.items.clear();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl<T> Drop for DataBuffer<T> {
    fn drop(&mut self) {
        if !self.released {
            debug!("Releasing unconsumed buffer (status: {})", self.status);
            self.release_inner();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DataBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBuffer")
            .field("status", &self.status)
            .field("items", &self.items)
            .field("attributions", &self.attributions)
            .field("released", &self.released)
            .finish()
    }
}
