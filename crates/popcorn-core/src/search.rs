use popcorn_models::SearchResult;
use popcorn_sources::MovieDatabase;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub status: SearchStatus,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
    /// Bumped for every query change; a response is applied only while its
    /// generation is still current.
    generation: u64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            error: None,
            generation: 0,
        }
    }
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

/// Owns the query → results pipeline. At most one search is live; every
/// `set_query` cancels the previous one.
///
/// Must be driven from inside a Tokio runtime.
pub struct SearchSession {
    database: Arc<dyn MovieDatabase>,
    min_query_length: usize,
    state: Arc<watch::Sender<SearchState>>,
    in_flight: Option<CancellationToken>,
}

impl SearchSession {
    pub fn new(database: Arc<dyn MovieDatabase>, min_query_length: usize) -> Self {
        let (tx, _) = watch::channel(SearchState::default());
        Self {
            database,
            min_query_length,
            state: Arc::new(tx),
            in_flight: None,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.cancel_in_flight();

        let too_short = query.chars().count() < self.min_query_length;
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.query = query.clone();
            state.error = None;
            if too_short {
                state.status = SearchStatus::Success;
                state.results.clear();
            } else {
                state.status = SearchStatus::Loading;
            }
        });

        if too_short {
            debug!("Query {:?} below {} characters, not searching", query, self.min_query_length);
            return;
        }

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        let database = Arc::clone(&self.database);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Search for {:?} cancelled", query);
                    return;
                }
                result = database.search(&query) => result,
            };

            let applied = state.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                match result {
                    Ok(results) => {
                        info!("Search {:?} returned {} results", query, results.len());
                        state.status = SearchStatus::Success;
                        state.results = results;
                        state.error = None;
                    }
                    Err(e) => {
                        if e.is_not_found() {
                            debug!("Search {:?} matched nothing: {}", query, e.detail());
                        } else {
                            warn!("Search {:?} failed: {}", query, e.detail());
                        }
                        state.status = SearchStatus::Error;
                        state.results.clear();
                        state.error = Some(e.to_string());
                    }
                }
                true
            });

            if !applied {
                debug!("Discarded stale response for {:?}", query);
            }
        });
    }

    /// Wait until the current query is no longer loading.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cancel_in_flight();
        self.state.send_if_modified(|state| {
            state.generation += 1;
            false
        });
    }
}
