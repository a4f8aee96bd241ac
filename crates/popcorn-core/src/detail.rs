use crate::title::{DocumentTitle, TitleGuard};
use popcorn_models::{MovieDetail, UserRating};
use popcorn_sources::MovieDatabase;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// `Idle --select(id)--> Loading(id) --fetched--> Ready(id, detail)`.
/// Any `select` from any state cancels what was in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailStatus {
    Idle,
    Loading { id: String },
    Ready { id: String, detail: MovieDetail },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub status: DetailStatus,
    /// Rating changes reported for the current selection
    pub rating_change_count: u32,
    /// Last rating the user picked for the current selection
    pub user_rating: Option<UserRating>,
    generation: u64,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            status: DetailStatus::Idle,
            rating_change_count: 0,
            user_rating: None,
            generation: 0,
        }
    }
}

impl DetailState {
    pub fn selected_id(&self) -> Option<&str> {
        match &self.status {
            DetailStatus::Idle => None,
            DetailStatus::Loading { id } | DetailStatus::Ready { id, .. } => Some(id),
        }
    }

    pub fn detail(&self) -> Option<&MovieDetail> {
        match &self.status {
            DetailStatus::Ready { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == DetailStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, DetailStatus::Loading { .. })
    }
}

type TitleSlot = Arc<Mutex<Option<TitleGuard>>>;

fn lock_slot(slot: &TitleSlot) -> MutexGuard<'_, Option<TitleGuard>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the selected-movie → detail pipeline and the title override that
/// lives exactly as long as a detail is `Ready`.
///
/// Fetch failures are logged and leave the session in `Loading`; unlike
/// `SearchSession` there is no error state.
pub struct DetailSession {
    database: Arc<dyn MovieDatabase>,
    title: DocumentTitle,
    state: Arc<watch::Sender<DetailState>>,
    // Only ever locked inside a `watch` modify closure, so it is ordered with state changes
    title_slot: TitleSlot,
    in_flight: Option<CancellationToken>,
}

impl DetailSession {
    pub fn new(database: Arc<dyn MovieDatabase>, title: DocumentTitle) -> Self {
        let (tx, _) = watch::channel(DetailState::default());
        Self {
            database,
            title,
            state: Arc::new(tx),
            title_slot: Arc::new(Mutex::new(None)),
            in_flight: None,
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn close(&mut self) {
        self.select(None);
    }

    pub fn select(&mut self, id: Option<String>) {
        self.cancel_in_flight();

        let mut generation = 0;
        let mut released = None;
        let title_slot = Arc::clone(&self.title_slot);
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            released = lock_slot(&title_slot).take();
            state.rating_change_count = 0;
            state.user_rating = None;
            state.status = match &id {
                Some(id) => DetailStatus::Loading { id: id.clone() },
                None => DetailStatus::Idle,
            };
        });
        // Leaving Ready reverts the title, outside the state lock
        drop(released);

        let Some(id) = id else {
            debug!("Details closed");
            return;
        };

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        let database = Arc::clone(&self.database);
        let state = Arc::clone(&self.state);
        let title = self.title.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Detail fetch for {} cancelled", id);
                    return;
                }
                result = database.details(&id) => result,
            };

            match result {
                Ok(detail) => {
                    let applied = state.send_if_modified(|state| {
                        if state.generation != generation {
                            return false;
                        }
                        if !detail.title.is_empty() {
                            *lock_slot(&title_slot) = Some(title.acquire(&detail.title));
                        }
                        info!("Loaded details for {} ({})", detail.title, id);
                        state.status = DetailStatus::Ready { id: id.clone(), detail };
                        state.rating_change_count = 0;
                        state.user_rating = None;
                        true
                    });
                    if !applied {
                        debug!("Discarded stale details for {}", id);
                    }
                }
                Err(e) => {
                    if state.borrow().generation == generation {
                        warn!("Failed to load details for {}: {}", id, e.detail());
                    } else {
                        debug!("Stale detail fetch for {} failed: {}", id, e.detail());
                    }
                }
            }
        });
    }

    /// Report that the rating input for `id` now shows `rating`. Counts only
    /// while `id` is selected and only when the value actually changed.
    pub fn record_rating(&self, id: &str, rating: UserRating) -> bool {
        self.state.send_if_modified(|state| {
            if state.selected_id() != Some(id) || state.user_rating == Some(rating) {
                return false;
            }
            state.user_rating = Some(rating);
            state.rating_change_count += 1;
            debug!("Rating for {} changed to {} (change #{})", id, rating, state.rating_change_count);
            true
        })
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

impl Drop for DetailSession {
    fn drop(&mut self) {
        self.cancel_in_flight();
        let mut released = None;
        let title_slot = Arc::clone(&self.title_slot);
        self.state.send_if_modified(|state| {
            state.generation += 1;
            released = lock_slot(&title_slot).take();
            false
        });
        drop(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{advance, movie_detail, ScriptedDatabase};
    use crate::title::{RecordingTitle, TitleSink};
    use std::sync::OnceLock;

    fn rating(value: u8) -> UserRating {
        UserRating::new(value).unwrap()
    }

    fn session(db: &Arc<ScriptedDatabase>) -> (DetailSession, Arc<RecordingTitle>) {
        let sink = Arc::new(RecordingTitle::new());
        let title = DocumentTitle::new(sink.clone(), "Popcorn");
        (DetailSession::new(db.clone(), title), sink)
    }

    fn batman_db() -> ScriptedDatabase {
        ScriptedDatabase::new()
            .with_detail(movie_detail("tt0096895", "Batman"), 50)
            .with_detail(movie_detail("tt0103776", "Batman Returns"), 50)
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_loads_then_ready() {
        let db = Arc::new(batman_db());
        let (mut details, sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        assert!(details.state().is_loading());
        assert_eq!(details.state().selected_id(), Some("tt0096895"));

        advance(100).await;
        let state = details.state();
        assert_eq!(state.detail().map(|d| d.title.as_str()), Some("Batman"));
        assert_eq!(state.rating_change_count, 0);
        assert_eq!(sink.history(), vec!["Movie | Batman".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_reselect_ends_on_latest() {
        let db = Arc::new(
            ScriptedDatabase::new()
                .with_detail(movie_detail("tt0096895", "Batman"), 100)
                .with_detail(movie_detail("tt0103776", "Batman Returns"), 10),
        );
        let (mut details, sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        details.select(Some("tt0103776".to_string()));

        advance(500).await;
        let state = details.state();
        match &state.status {
            DetailStatus::Ready { id, detail } => {
                assert_eq!(id, "tt0103776");
                assert_eq!(detail.id, "tt0103776");
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert_eq!(sink.history(), vec!["Movie | Batman Returns".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_loading_stays_idle() {
        let db = Arc::new(batman_db());
        let (mut details, sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        details.close();
        assert!(details.state().is_idle());

        advance(500).await;
        assert!(details.state().is_idle());
        assert!(sink.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_aborted() {
        let db = Arc::new(
            ScriptedDatabase::new()
                .with_detail(movie_detail("tt0096895", "Batman"), 100)
                .with_detail(movie_detail("tt0103776", "Batman Returns"), 100),
        );
        let (mut details, _sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(10).await;
        details.select(Some("tt0103776".to_string()));
        advance(1).await;
        assert_eq!(db.aborted(), 1);

        advance(10).await;
        details.close();
        advance(1).await;
        assert_eq!(db.aborted(), 2);

        details.select(Some("tt0096895".to_string()));
        advance(10).await;
        drop(details);
        advance(1).await;
        assert_eq!(db.aborted(), 3);
        assert_eq!(db.detail_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_reverted_once_per_selection_change() {
        let db = Arc::new(batman_db());
        let (mut details, sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(100).await;
        details.select(Some("tt0103776".to_string()));
        advance(100).await;
        details.close();
        details.close();

        assert_eq!(
            sink.history(),
            vec![
                "Movie | Batman".to_string(),
                "Popcorn".to_string(),
                "Movie | Batman Returns".to_string(),
                "Popcorn".to_string(),
            ]
        );
    }

    /// Reads the session state whenever the title goes back to the default.
    #[derive(Default)]
    struct StateReadingTitle {
        state: OnceLock<watch::Receiver<DetailState>>,
        idle_on_revert: Mutex<Vec<bool>>,
    }

    impl TitleSink for StateReadingTitle {
        fn set_title(&self, title: &str) {
            if title != "Popcorn" {
                return;
            }
            if let Some(state) = self.state.get() {
                let idle = state.borrow().is_idle();
                self.idle_on_revert.lock().unwrap().push(idle);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_reverts_after_state_lock_is_released() {
        let db = Arc::new(batman_db());
        let sink = Arc::new(StateReadingTitle::default());
        let mut details = DetailSession::new(db.clone(), DocumentTitle::new(sink.clone(), "Popcorn"));
        assert!(sink.state.set(details.subscribe()).is_ok());

        details.select(Some("tt0096895".to_string()));
        advance(100).await;
        details.close();
        assert_eq!(*sink.idle_on_revert.lock().unwrap(), vec![true]);

        details.select(Some("tt0103776".to_string()));
        advance(100).await;
        drop(details);
        assert_eq!(sink.idle_on_revert.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_reverts_title() {
        let db = Arc::new(batman_db());
        let (mut details, sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(100).await;
        drop(details);

        assert_eq!(sink.history(), vec!["Movie | Batman".to_string(), "Popcorn".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rating_changes_counted_and_reset_on_reselect() {
        let db = Arc::new(batman_db());
        let (mut details, _sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(100).await;

        assert!(details.record_rating("tt0096895", rating(5)));
        assert!(details.record_rating("tt0096895", rating(9)));
        assert!(details.record_rating("tt0096895", rating(7)));
        let state = details.state();
        assert_eq!(state.rating_change_count, 3);
        assert_eq!(state.user_rating, Some(rating(7)));

        details.select(Some("tt0096895".to_string()));
        assert_eq!(details.state().rating_change_count, 0);
        advance(100).await;
        assert_eq!(details.state().rating_change_count, 0);
        assert_eq!(details.state().user_rating, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_or_foreign_rating_is_not_a_change() {
        let db = Arc::new(batman_db());
        let (mut details, _sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(100).await;

        assert!(details.record_rating("tt0096895", rating(8)));
        assert!(!details.record_rating("tt0096895", rating(8)));
        assert!(!details.record_rating("tt0103776", rating(3)));
        assert_eq!(details.state().rating_change_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_stays_loading() {
        let db = Arc::new(ScriptedDatabase::new().with_detail_failure("tt0000001", 20, 500));
        let (mut details, sink) = session(&db);

        details.select(Some("tt0000001".to_string()));
        advance(200).await;

        assert!(details.state().is_loading());
        assert!(sink.history().is_empty());
        assert_eq!(db.detail_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_selection_refetches() {
        let db = Arc::new(batman_db());
        let (mut details, _sink) = session(&db);

        details.select(Some("tt0096895".to_string()));
        advance(100).await;
        details.close();
        details.select(Some("tt0096895".to_string()));
        advance(100).await;

        assert_eq!(db.detail_calls(), 2);
        assert!(details.state().detail().is_some());
    }
}
