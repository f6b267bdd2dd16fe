//! Listener callbacks for the display side

use crate::connection::ConnectionState;
use crate::places::{PlaceDetail, Prediction, QueryError};
use tracing::{debug, info, warn};

/// Receives results from a [`super::SearchSession`]
///
/// Callbacks run on worker tasks and must not block.
pub trait PlacesListener: Send + Sync {
    /// New predictions replaced the displayed list
    fn on_predictions_available(&self, _predictions: &[Prediction]) {}

    /// A query failed; the displayed list is unchanged
    fn on_predictions_failed(&self, _error: &QueryError) {}

    fn on_detail_fetched(&self, _detail: &PlaceDetail) {}

    fn on_detail_fetch_failed(&self, _error: &QueryError) {}

    fn on_connection_state_changed(&self, _state: ConnectionState) {}
}

/// Listener that logs every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl PlacesListener for TracingListener {
    fn on_predictions_available(&self, predictions: &[Prediction]) {
        debug!("{} predictions available", predictions.len());
    }

    fn on_predictions_failed(&self, error: &QueryError) {
        warn!("Autocomplete failed: {}", error);
    }

    fn on_detail_fetched(&self, detail: &PlaceDetail) {
        info!("Place selected: {} ({})", detail.name, detail.address);
        if let Some(ref attribution) = detail.attribution {
            info!("Attribution: {}", attribution);
        }
    }

    fn on_detail_fetch_failed(&self, error: &QueryError) {
        warn!("Place details failed: {}", error);
    }

    fn on_connection_state_changed(&self, state: ConnectionState) {
        info!("Connection state: {}", state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::PlaceRecord;

    #[test]
    fn test_tracing_listener_accepts_every_callback() {
        let listener: &dyn PlacesListener = &TracingListener;
        let detail = PlaceDetail::from_record(
            PlaceRecord::new("A", "Eiffel Tower", "Champ de Mars"),
            Some("Data by Example".to_string()),
        );

        listener.on_predictions_available(&[Prediction::new("A", "Eiffel Tower", "Paris")]);
        listener.on_predictions_failed(&QueryError::Timeout);
        listener.on_detail_fetched(&detail);
        listener.on_detail_fetch_failed(&QueryError::EmptyResult);
        listener.on_connection_state_changed(ConnectionState::Failed(7));
    }
}
