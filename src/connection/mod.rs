//! Connection lifecycle for the geodata service
//!
//! [`ConnectionManager`] owns the single logical connection and its
//! [`ConnectionState`]. Everything else only reads the state, and can only
//! issue requests through a [`ConnectionHandle`], which exists only while
//! the connection is up.

mod manager;
mod state;

pub use manager::{ConnectionCallbacks, ConnectionManager};
pub use state::{ConnectionHandle, ConnectionState};
