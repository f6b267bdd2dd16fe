//! UI binding layer
//!
//! Turns keystrokes into autocomplete queries and a picked row into a
//! detail fetch, delivering results through a [`PlacesListener`].

mod listener;
mod session;

pub use listener::{PlacesListener, TracingListener};
pub use session::SearchSession;
