//! Connection state types.

use serde::Serialize;
use std::fmt;

/// State of the connection to the geodata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "code", rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connected and usable.
    Connected,
    /// Temporarily lost; may come back without a reconnect.
    Suspended,
    /// The last connection attempt failed with the given code.
    Failed(i32),
}

impl ConnectionState {
    /// Check if requests may be issued in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Check if a call to `connect` should start a new attempt.
    pub fn can_connect(&self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed(_)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Suspended => write!(f, "suspended"),
            Self::Failed(code) => write!(f, "failed ({})", code),
        }
    }
}

/// Proof of a live connection, carried by every service request.
///
/// Only [`super::ConnectionManager::handle`] hands these out, and only in the
/// `Connected` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    session: u64,
}

impl ConnectionHandle {
    pub(crate) fn new(session: u64) -> Self {
        Self { session }
    }

    /// Identifier of the connection session this handle belongs to.
    pub fn session(&self) -> u64 {
        self.session
    }
}
