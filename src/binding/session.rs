//! Search session driving the display side

use super::PlacesListener;
use crate::autocomplete::AutocompleteEngine;
use crate::connection::ConnectionManager;
use crate::details::PlaceDetailFetcher;
use crate::places::{BoundingBox, Prediction, QueryError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

struct SessionState {
    generation: AtomicU64,
    /// Held across the generation check, the list update and the callback
    delivery: Mutex<()>,
    displayed: RwLock<Vec<Prediction>>,
    token: RwLock<String>,
}

/// One search box: the displayed predictions plus the queries feeding them
///
/// Every text change starts a new generation. Queries run on worker tasks
/// and their results are delivered only while their generation is still the
/// latest, so a slow response for an older prefix never overwrites a newer
/// list.
pub struct SearchSession {
    engine: Arc<AutocompleteEngine>,
    fetcher: Arc<PlaceDetailFetcher>,
    listener: Arc<dyn PlacesListener>,
    state: Arc<SessionState>,
}

impl SearchSession {
    pub fn new(
        engine: Arc<AutocompleteEngine>,
        fetcher: Arc<PlaceDetailFetcher>,
        listener: Arc<dyn PlacesListener>,
    ) -> Self {
        Self {
            engine,
            fetcher,
            listener,
            state: Arc::new(SessionState {
                generation: AtomicU64::new(0),
                delivery: Mutex::new(()),
                displayed: RwLock::new(Vec::new()),
                token: RwLock::new(new_session_token()),
            }),
        }
    }

    /// Query for `text` on a worker task
    pub fn on_text_changed(&self, text: &str) -> JoinHandle<()> {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let engine = self.engine.clone();
        let listener = self.listener.clone();
        let state = self.state.clone();
        let text = text.to_string();
        let token = self.session_token();

        tokio::spawn(async move {
            let result = engine.query_in_session(Some(&text), Some(token)).await;

            let _delivery = state.delivery.lock().await;
            if state.generation.load(Ordering::SeqCst) != generation {
                debug!("Dropping stale results for generation {}", generation);
                return;
            }

            let delivered = {
                let mut displayed = state.displayed.write().unwrap_or_else(PoisonError::into_inner);
                match result {
                    Ok(predictions) => {
                        *displayed = predictions;
                        Ok(displayed.clone())
                    }
                    Err(QueryError::SkippedNoConstraint) => {
                        displayed.clear();
                        Ok(Vec::new())
                    }
                    Err(e) => Err(e),
                }
            };

            match delivered {
                Ok(predictions) => listener.on_predictions_available(&predictions),
                Err(e) => listener.on_predictions_failed(&e),
            }
        })
    }

    /// Number of displayed predictions
    pub fn count(&self) -> usize {
        self.displayed().len()
    }

    pub fn item(&self, position: usize) -> Option<Prediction> {
        self.displayed().get(position).cloned()
    }

    /// Text put into the search box when `position` is picked
    pub fn display_text(&self, position: usize) -> Option<String> {
        self.displayed().get(position).map(|p| p.full_text.clone())
    }

    /// Fetch details for the displayed prediction at `position`
    ///
    /// Closes the current session token; later keystrokes start a new one.
    pub fn select(&self, position: usize) -> Option<JoinHandle<()>> {
        let prediction = self.item(position)?;
        let token = {
            let mut token = self.state.token.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *token, new_session_token())
        };
        let fetcher = self.fetcher.clone();
        let listener = self.listener.clone();
        let bounds = self.engine.bounds();

        debug!("Selected {} at position {}", prediction.place_id, position);
        Some(tokio::spawn(async move {
            match fetcher
                .fetch_details_in_session(&prediction.place_id, Some(token))
                .await
            {
                Ok(detail) => {
                    if let Some(location) = detail.location.filter(|l| !bounds.contains(*l)) {
                        debug!("{} at {} lies outside the search bounds", detail.id, location);
                    }
                    listener.on_detail_fetched(&detail)
                }
                Err(e) => listener.on_detail_fetch_failed(&e),
            }
        }))
    }

    /// Forward connection state changes to the listener
    pub fn watch_connection(&self, connection: &ConnectionManager) -> JoinHandle<()> {
        let mut states = connection.subscribe();
        let listener = self.listener.clone();

        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                listener.on_connection_state_changed(state);
            }
        })
    }

    /// Bounds for subsequent queries
    pub fn set_bounds(&self, bounds: BoundingBox) {
        self.engine.set_bounds(bounds);
    }

    pub fn session_token(&self) -> String {
        self.state
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn displayed(&self) -> std::sync::RwLockReadGuard<'_, Vec<Prediction>> {
        self.state
            .displayed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use crate::places::{LatLng, PlaceDetail, PlaceRecord};
    use crate::service::mock::ScriptedService;
    use crate::service::Status;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Predictions(Vec<String>),
        PredictionsFailed(QueryError),
        Detail(String),
        DetailFailed(QueryError),
        State(ConnectionState),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl PlacesListener for Recorder {
        fn on_predictions_available(&self, predictions: &[Prediction]) {
            self.push(Event::Predictions(
                predictions.iter().map(|p| p.place_id.clone()).collect(),
            ));
        }

        fn on_predictions_failed(&self, error: &QueryError) {
            self.push(Event::PredictionsFailed(error.clone()));
        }

        fn on_detail_fetched(&self, detail: &PlaceDetail) {
            self.push(Event::Detail(detail.id.clone()));
        }

        fn on_detail_fetch_failed(&self, error: &QueryError) {
            self.push(Event::DetailFailed(error.clone()));
        }

        fn on_connection_state_changed(&self, state: ConnectionState) {
            self.push(Event::State(state));
        }
    }

    fn paris() -> BoundingBox {
        BoundingBox::new(LatLng::new(48.81, 2.22), LatLng::new(48.91, 2.47)).unwrap()
    }

    fn eiffel_service() -> ScriptedService {
        ScriptedService::new()
            .with_predictions(
                "Eiffel",
                vec![
                    Prediction::new("A", "Eiffel Tower", "Champ de Mars, Paris"),
                    Prediction::new("B", "Eiffel Tower Restaurant", "Paris"),
                ],
            )
            .with_place(PlaceRecord::new("A", "Eiffel Tower", "Champ de Mars"), None)
    }

    async fn session_for(
        service: ScriptedService,
    ) -> (Arc<ScriptedService>, Arc<Recorder>, SearchSession) {
        let service = Arc::new(service);
        let connection = Arc::new(ConnectionManager::new(service.clone()));
        connection.connect().await;
        let engine = Arc::new(AutocompleteEngine::new(connection.clone(), paris(), None));
        let fetcher = Arc::new(PlaceDetailFetcher::new(connection));
        let recorder = Arc::new(Recorder::default());
        let session = SearchSession::new(engine, fetcher, recorder.clone());
        (service, recorder, session)
    }

    #[tokio::test]
    async fn test_predictions_replace_displayed_list() {
        let (_, recorder, session) = session_for(eiffel_service()).await;

        session.on_text_changed("Eiffel").await.unwrap();

        assert_eq!(
            recorder.events(),
            vec![Event::Predictions(vec!["A".to_string(), "B".to_string()])]
        );
        assert_eq!(session.count(), 2);
        assert_eq!(session.item(1).unwrap().place_id, "B");
        assert_eq!(
            session.display_text(0).as_deref(),
            Some("Eiffel Tower, Champ de Mars, Paris")
        );
        assert!(session.item(2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_results_are_dropped() {
        let service = ScriptedService::new()
            .with_predictions("E", vec![Prediction::new("slow", "E", "")])
            .with_autocomplete_delay("E", Duration::from_secs(5))
            .with_predictions("Ei", vec![Prediction::new("fast", "Ei", "")]);
        let (_, recorder, session) = session_for(service).await;

        let older = session.on_text_changed("E");
        let newer = session.on_text_changed("Ei");
        newer.await.unwrap();
        older.await.unwrap();

        assert_eq!(
            recorder.events(),
            vec![Event::Predictions(vec!["fast".to_string()])]
        );
        assert_eq!(session.item(0).unwrap().place_id, "fast");
    }

    #[tokio::test]
    async fn test_cleared_text_clears_list() {
        let (service, recorder, session) = session_for(eiffel_service()).await;

        session.on_text_changed("Eiffel").await.unwrap();
        session.on_text_changed("").await.unwrap();

        assert_eq!(session.count(), 0);
        assert_eq!(recorder.events().last(), Some(&Event::Predictions(vec![])));
        assert_eq!(service.autocomplete_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_list() {
        let service =
            eiffel_service().with_autocomplete_status("Eiffel T", Status::error("OVER_QUERY_LIMIT"));
        let (_, recorder, session) = session_for(service).await;

        session.on_text_changed("Eiffel").await.unwrap();
        session.on_text_changed("Eiffel T").await.unwrap();

        assert_eq!(session.count(), 2);
        assert_eq!(
            recorder.events().last(),
            Some(&Event::PredictionsFailed(QueryError::ServiceError(
                "OVER_QUERY_LIMIT".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_select_fetches_details_and_renews_token() {
        let (service, recorder, session) = session_for(eiffel_service()).await;
        let token = session.session_token();

        session.on_text_changed("Eiffel").await.unwrap();
        session.select(0).unwrap().await.unwrap();

        assert_eq!(recorder.events().last(), Some(&Event::Detail("A".to_string())));
        assert_eq!(
            service.last_autocomplete().unwrap().session_token,
            Some(token.clone())
        );
        assert_eq!(service.last_details().unwrap().session_token, Some(token.clone()));
        assert_ne!(session.session_token(), token);
    }

    #[tokio::test]
    async fn test_select_failure_is_reported() {
        let (_, recorder, session) = session_for(eiffel_service()).await;

        session.on_text_changed("Eiffel").await.unwrap();
        // "B" has no scripted record
        session.select(1).unwrap().await.unwrap();

        assert_eq!(
            recorder.events().last(),
            Some(&Event::DetailFailed(QueryError::EmptyResult))
        );
    }

    #[tokio::test]
    async fn test_select_out_of_range() {
        let (service, _, session) = session_for(eiffel_service()).await;
        assert!(session.select(0).is_none());
        assert_eq!(service.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_set_bounds_forwards_to_engine() {
        let (service, _, session) = session_for(eiffel_service()).await;
        let london =
            BoundingBox::new(LatLng::new(51.28, -0.51), LatLng::new(51.69, 0.33)).unwrap();

        session.set_bounds(london);
        session.on_text_changed("Tower").await.unwrap();

        assert_eq!(service.last_autocomplete().unwrap().bounds, london);
    }

    #[tokio::test]
    async fn test_watch_connection() {
        let service = Arc::new(ScriptedService::new());
        let connection = Arc::new(ConnectionManager::new(service));
        let engine = Arc::new(AutocompleteEngine::new(connection.clone(), paris(), None));
        let fetcher = Arc::new(PlaceDetailFetcher::new(connection.clone()));
        let recorder = Arc::new(Recorder::default());
        let session = SearchSession::new(engine, fetcher, recorder.clone());

        let _watcher = session.watch_connection(&connection);
        connection.connect().await;
        wait_for(|| recorder.events().contains(&Event::State(ConnectionState::Connected))).await;

        connection.disconnect();
        wait_for(|| {
            recorder.events().last() == Some(&Event::State(ConnectionState::Disconnected))
        })
        .await;
    }

    /// Blocks inside its first delivery until released
    struct GatedListener {
        entered: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
        deliveries: Mutex<Vec<Vec<String>>>,
    }

    impl PlacesListener for GatedListener {
        fn on_predictions_available(&self, predictions: &[Prediction]) {
            let entered = self.entered.lock().unwrap().take();
            if let Some(entered) = entered {
                let _ = entered.send(());
                let _ = self.release.lock().unwrap().recv();
            }
            self.deliveries
                .lock()
                .unwrap()
                .push(predictions.iter().map(|p| p.place_id.clone()).collect());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_newest_list_is_delivered_last() {
        let service = Arc::new(
            ScriptedService::new()
                .with_predictions("E", vec![Prediction::new("older", "E", "")])
                .with_predictions("Ei", vec![Prediction::new("newer", "Ei", "")]),
        );
        let connection = Arc::new(ConnectionManager::new(service));
        connection.connect().await;
        let engine = Arc::new(AutocompleteEngine::new(connection.clone(), paris(), None));
        let fetcher = Arc::new(PlaceDetailFetcher::new(connection));

        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let listener = Arc::new(GatedListener {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
            deliveries: Mutex::new(Vec::new()),
        });
        let session = SearchSession::new(engine, fetcher, listener.clone());

        // The older list is inside the listener when the newer query starts
        let older = session.on_text_changed("E");
        entered_rx.await.unwrap();
        let newer = session.on_text_changed("Ei");
        tokio::time::sleep(Duration::from_millis(50)).await;
        release_tx.send(()).unwrap();

        older.await.unwrap();
        newer.await.unwrap();

        let deliveries = listener.deliveries.lock().unwrap().clone();
        assert_eq!(deliveries.last(), Some(&vec!["newer".to_string()]));
        assert_eq!(session.item(0).unwrap().place_id, "newer");
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }
}
