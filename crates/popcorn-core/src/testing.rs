//! Scripted `MovieDatabase` for session tests. Replies are delayed with
//! `tokio::time::sleep`, so tests run on a paused clock decide exactly which
//! response lands first.

use async_trait::async_trait;
use popcorn_models::{MovieDetail, SearchResult};
use popcorn_sources::{MovieDatabase, SourceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    NotFound,
    Status(u16),
}

impl<T: Clone> Reply<T> {
    fn into_result(self) -> Result<T, SourceError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::NotFound => Err(SourceError::NotFound {
                reason: "Movie not found!".to_string(),
            }),
            Reply::Status(status) => Err(SourceError::Status { status }),
        }
    }
}

#[derive(Default)]
pub struct ScriptedDatabase {
    searches: HashMap<String, (Duration, Reply<Vec<SearchResult>>)>,
    details: HashMap<String, (Duration, Reply<MovieDetail>)>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    aborted: AtomicUsize,
}

/// Counts a reply that was dropped before its delay ran out.
struct Pending<'a> {
    aborted: &'a AtomicUsize,
    delivered: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.delivered {
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, delay_ms: u64, reply: Reply<Vec<SearchResult>>) -> Self {
        self.searches
            .insert(query.to_string(), (Duration::from_millis(delay_ms), reply));
        self
    }

    pub fn with_detail(mut self, detail: MovieDetail, delay_ms: u64) -> Self {
        self.details
            .insert(detail.id.clone(), (Duration::from_millis(delay_ms), Reply::Ok(detail)));
        self
    }

    pub fn with_detail_failure(mut self, id: &str, delay_ms: u64, status: u16) -> Self {
        self.details
            .insert(id.to_string(), (Duration::from_millis(delay_ms), Reply::Status(status)));
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Requests whose future was dropped mid-flight
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    async fn deliver<T: Clone>(&self, delay: Duration, reply: Reply<T>) -> Result<T, SourceError> {
        let mut pending = Pending {
            aborted: &self.aborted,
            delivered: false,
        };
        tokio::time::sleep(delay).await;
        pending.delivered = true;
        reply.into_result()
    }
}

#[async_trait]
impl MovieDatabase for ScriptedDatabase {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, reply) = self
            .searches
            .get(query)
            .cloned()
            .unwrap_or((Duration::from_millis(1), Reply::NotFound));
        self.deliver(delay, reply).await
    }

    async fn details(&self, id: &str) -> Result<MovieDetail, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, reply) = self
            .details
            .get(id)
            .cloned()
            .unwrap_or((Duration::from_millis(1), Reply::NotFound));
        self.deliver(delay, reply).await
    }
}

pub fn search_result(id: &str, title: &str, year: &str) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        title: title.to_string(),
        year: year.to_string(),
        poster: format!("https://img/{}.jpg", id),
    }
}

pub fn movie_detail(id: &str, title: &str) -> MovieDetail {
    MovieDetail {
        id: id.to_string(),
        title: title.to_string(),
        year: "1989".to_string(),
        poster: format!("https://img/{}.jpg", id),
        runtime_minutes: Some(126),
        imdb_rating: Some(7.5),
        plot: format!("{} plot", title),
        released: "23 Jun 1989".to_string(),
        actors: "Michael Keaton, Jack Nicholson".to_string(),
        director: "Tim Burton".to_string(),
        genre: "Action".to_string(),
    }
}

/// Let spawned tasks run and the paused clock advance by `ms`.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
