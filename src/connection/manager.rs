//! Connection manager state machine

use super::state::{ConnectionHandle, ConnectionState};
use crate::service::{ConnectionFailure, GeoDataService, SuspendCause};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Listener for connection lifecycle events
///
/// All methods default to no-ops so listeners only implement what they use.
///
/// Callbacks run after the state change is published and outside the state
/// lock. A `disconnect()` racing with a finishing attempt can therefore land
/// before `on_connected` is delivered; [`ConnectionManager::state`] is the
/// source of truth.
pub trait ConnectionCallbacks: Send + Sync {
    /// The connection is up, either freshly or after a suspension
    fn on_connected(&self) {}

    /// The connection was suspended and may come back on its own
    fn on_connection_suspended(&self, _cause: SuspendCause) {}

    /// A connection attempt failed
    fn on_connection_failed(&self, _failure: &ConnectionFailure) {}
}

struct Inner {
    state: ConnectionState,
    /// Bumped on every connect attempt and every disconnect; a finishing
    /// attempt whose session no longer matches is stale.
    session: u64,
}

/// Owner of the connection to the geodata service
pub struct ConnectionManager {
    service: Arc<dyn GeoDataService>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConnectionState>,
    callbacks: RwLock<Vec<Arc<dyn ConnectionCallbacks>>>,
}

enum Event {
    Connected,
    Suspended(SuspendCause),
    Failed(ConnectionFailure),
}

impl ConnectionManager {
    /// Create a disconnected manager for the given service
    pub fn new(service: Arc<dyn GeoDataService>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            service,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                session: 0,
            }),
            state_tx,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Register a lifecycle listener
    pub fn add_callbacks(&self, callbacks: Arc<dyn ConnectionCallbacks>) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callbacks);
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Check whether requests may be issued
    pub fn is_connected(&self) -> bool {
        self.lock().state.is_connected()
    }

    /// Handle for issuing requests, present only while connected
    pub fn handle(&self) -> Option<ConnectionHandle> {
        let inner = self.lock();
        if inner.state.is_connected() {
            Some(ConnectionHandle::new(inner.session))
        } else {
            None
        }
    }

    /// The service this manager connects to
    pub fn service(&self) -> &Arc<dyn GeoDataService> {
        &self.service
    }

    /// Establish the connection
    ///
    /// Does nothing when already connected, connecting or suspended. A
    /// `disconnect` issued while the attempt is in flight wins over it.
    pub async fn connect(&self) {
        let attempt = {
            let mut inner = self.lock();
            if !inner.state.can_connect() {
                debug!("connect() ignored in state {}", inner.state);
                return;
            }
            inner.session += 1;
            self.transition(&mut inner, ConnectionState::Connecting);
            inner.session
        };

        info!("Connecting to {}", self.service.name());
        let guard = AttemptGuard {
            manager: self,
            attempt,
        };
        let result = self.service.connect().await;
        std::mem::forget(guard);

        let event = {
            let mut inner = self.lock();
            if inner.session != attempt || inner.state != ConnectionState::Connecting {
                debug!("Discarding result of superseded connection attempt {}", attempt);
                return;
            }
            match result {
                Ok(()) => {
                    self.transition(&mut inner, ConnectionState::Connected);
                    Event::Connected
                }
                Err(failure) => {
                    self.transition(&mut inner, ConnectionState::Failed(failure.code));
                    Event::Failed(failure)
                }
            }
        };

        if matches!(event, Event::Connected) && self.lock().session != attempt {
            debug!("Attempt {} superseded before on_connected", attempt);
            return;
        }
        match &event {
            Event::Connected => info!("Connected to {}", self.service.name()),
            Event::Failed(failure) => warn!("Connection to {} failed: {}", self.service.name(), failure),
            Event::Suspended(_) => {}
        }
        self.emit(event);
    }

    /// Tear down the connection; safe from any state
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.session += 1;
        if inner.state != ConnectionState::Disconnected {
            info!("Disconnecting from {}", self.service.name());
            self.transition(&mut inner, ConnectionState::Disconnected);
        }
    }

    /// Mark a live connection as suspended
    ///
    /// Returns whether a transition happened; only `Connected` can be suspended.
    pub fn suspend(&self, cause: SuspendCause) -> bool {
        {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Connected {
                return false;
            }
            self.transition(&mut inner, ConnectionState::Suspended);
        }
        warn!("Connection suspended: {}", cause);
        self.emit(Event::Suspended(cause));
        true
    }

    /// Bring a suspended connection back without reconnecting
    pub fn resume(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Suspended {
                return false;
            }
            self.transition(&mut inner, ConnectionState::Connected);
        }
        info!("Connection resumed");
        self.emit(Event::Connected);
        true
    }

    fn transition(&self, inner: &mut Inner, state: ConnectionState) {
        debug!("Connection state {} -> {}", inner.state, state);
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: Event) {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for cb in callbacks {
            match &event {
                Event::Connected => cb.on_connected(),
                Event::Suspended(cause) => cb.on_connection_suspended(*cause),
                Event::Failed(failure) => cb.on_connection_failed(failure),
            }
        }
    }

    /// Reset a `Connecting` state left behind by a dropped `connect()` future
    fn abandon(&self, attempt: u64) {
        let mut inner = self.lock();
        if inner.session == attempt && inner.state == ConnectionState::Connecting {
            debug!("Connection attempt {} abandoned", attempt);
            inner.session += 1;
            self.transition(&mut inner, ConnectionState::Disconnected);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Armed while `connect()` awaits the service
struct AttemptGuard<'a> {
    manager: &'a ConnectionManager,
    attempt: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.manager.abandon(self.attempt);
    }
}
