//! Application state shared across handlers

use crate::autocomplete::AutocompleteEngine;
use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::details::PlaceDetailFetcher;
use crate::metrics::Metrics;
use crate::service::GeoDataService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Connection to the geodata service
    pub connection: Arc<ConnectionManager>,
    pub engine: Arc<AutocompleteEngine>,
    pub fetcher: Arc<PlaceDetailFetcher>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state around `service`
    ///
    /// The connection starts out disconnected; call
    /// [`ConnectionManager::connect`] before serving.
    pub fn new(settings: Settings, service: Arc<dyn GeoDataService>) -> Self {
        let settings = Arc::new(settings);
        let metrics = Arc::new(Metrics::new());
        let connection = Arc::new(ConnectionManager::new(service));
        let engine = Arc::new(
            AutocompleteEngine::from_settings(connection.clone(), &settings)
                .with_metrics(metrics.clone()),
        );
        let fetcher = Arc::new(
            PlaceDetailFetcher::from_settings(connection.clone(), &settings)
                .with_metrics(metrics.clone()),
        );

        Self {
            settings,
            connection,
            engine,
            fetcher,
            metrics,
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
