use async_trait::async_trait;
use popcorn_models::{MovieDetail, SearchResult};
use crate::error::SourceError;

/// A remote catalogue that can be searched by title and queried by id.
///
/// Dropping a returned future must abort the underlying request; sessions
/// rely on this to cancel superseded fetches.
#[async_trait]
pub trait MovieDatabase: Send + Sync {
    /// Search by title fragment. An empty match set is reported as
    /// `SourceError::NotFound`, never as `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError>;

    async fn details(&self, id: &str) -> Result<MovieDetail, SourceError>;
}
