use crate::error::SourceError;
use crate::omdb::api;
use crate::traits::MovieDatabase;
use async_trait::async_trait;
use popcorn_config::OmdbConfig;
use popcorn_models::{MovieDetail, SearchResult};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the OMDb API. Cheap to clone.
#[derive(Clone)]
pub struct OmdbClient {
    client: Arc<Client>,
    config: OmdbConfig,
}

impl OmdbClient {
    pub fn new(config: OmdbConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("popcorn/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: Client, config: OmdbConfig) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }
}

#[async_trait]
impl MovieDatabase for OmdbClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        debug!("OMDb search: {:?}", query);
        api::search(&self.client, &self.config, query).await
    }

    async fn details(&self, id: &str) -> Result<MovieDetail, SourceError> {
        debug!("OMDb details: {}", id);
        api::get_details(&self.client, &self.config, id).await
    }
}
