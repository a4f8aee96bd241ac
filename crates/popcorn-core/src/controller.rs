use crate::detail::{DetailSession, DetailState, DetailStatus};
use crate::search::{SearchSession, SearchState};
use crate::title::DocumentTitle;
use crate::watchlist::WatchlistStore;
use popcorn_models::{UserRating, WatchedEntry, WatchedSummary};
use popcorn_sources::MovieDatabase;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("No movie is selected")]
    NoSelection,
    #[error("Movie details are still loading")]
    DetailNotReady,
    #[error("Pick a rating before adding the movie")]
    NoRating,
    #[error("You already rated this movie with {0}")]
    AlreadyWatched(UserRating),
    #[error("Failed to save watched list: {0}")]
    Persist(#[source] anyhow::Error),
}

/// Routes user intents between the search, detail and watched-list parts.
pub struct AppController {
    search: SearchSession,
    details: DetailSession,
    watchlist: WatchlistStore,
}

impl AppController {
    pub fn new(
        database: Arc<dyn MovieDatabase>,
        watchlist: WatchlistStore,
        title: DocumentTitle,
        min_query_length: usize,
    ) -> Self {
        Self {
            search: SearchSession::new(Arc::clone(&database), min_query_length),
            details: DetailSession::new(database, title),
            watchlist,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.search.set_query(query);
    }

    pub fn select_movie(&mut self, id: impl Into<String>) {
        self.details.select(Some(id.into()));
    }

    pub fn close_details(&mut self) {
        self.details.close();
    }

    /// The rating input for the open movie emitted `rating`.
    pub fn rate(&mut self, rating: UserRating) -> Result<bool, ControllerError> {
        let state = self.details.state();
        let id = ready_id(&state)?;
        if let Some(existing) = self.watchlist.user_rating(id) {
            return Err(ControllerError::AlreadyWatched(existing));
        }
        Ok(self.details.record_rating(id, rating))
    }

    /// Add the open movie to the watched list with the last picked rating,
    /// then close the details.
    pub fn commit_rating(&mut self) -> Result<WatchedEntry, ControllerError> {
        let state = self.details.state();
        let id = ready_id(&state)?;
        let Some(detail) = state.detail() else {
            return Err(ControllerError::DetailNotReady);
        };
        if let Some(existing) = self.watchlist.user_rating(id) {
            return Err(ControllerError::AlreadyWatched(existing));
        }
        let rating = state.user_rating.ok_or(ControllerError::NoRating)?;

        let mut entry = WatchedEntry::from_detail(detail, rating, state.rating_change_count);
        entry.id = id.to_string();

        self.watchlist
            .add(entry.clone())
            .map_err(ControllerError::Persist)?;
        info!("Added {} to watched list with rating {}", entry.title, entry.user_rating);

        self.close_details();
        Ok(entry)
    }

    pub fn delete_watched(&mut self, id: &str) -> Result<usize, ControllerError> {
        self.watchlist.remove(id).map_err(ControllerError::Persist)
    }

    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    pub fn detail_state(&self) -> DetailState {
        self.details.state()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchState> {
        self.search.subscribe()
    }

    pub fn subscribe_details(&self) -> watch::Receiver<DetailState> {
        self.details.subscribe()
    }

    pub fn watched(&self) -> &[WatchedEntry] {
        self.watchlist.list()
    }

    pub fn watched_rating(&self, id: &str) -> Option<UserRating> {
        self.watchlist.user_rating(id)
    }

    pub fn summary(&self) -> WatchedSummary {
        self.watchlist.summary()
    }
}

fn ready_id(state: &DetailState) -> Result<&str, ControllerError> {
    match &state.status {
        DetailStatus::Idle => Err(ControllerError::NoSelection),
        DetailStatus::Loading { .. } => Err(ControllerError::DetailNotReady),
        DetailStatus::Ready { id, .. } => Ok(id),
    }
}
