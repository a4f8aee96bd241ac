pub mod browse;
pub mod config;
pub mod search;
pub mod show;
pub mod watched;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use popcorn_config::{Config, PathManager};
use popcorn_core::{JsonFileStore, PersistentStore, WatchlistStore};
use popcorn_sources::OmdbClient;
use std::sync::Arc;

/// Load the config file (or defaults) and make sure it can reach the API.
pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.validate().map_err(|e| eyre!("{}", e))?;
    Ok(config)
}

pub fn omdb_client(config: &Config) -> Result<OmdbClient> {
    OmdbClient::new(config.omdb.clone()).map_err(|e| eyre!("Failed to create HTTP client: {}", e.detail()))
}

pub fn watched_store(path_manager: &PathManager) -> Result<Arc<dyn PersistentStore>> {
    let store = JsonFileStore::new(path_manager.data_dir())
        .map_err(|e| eyre!("Failed to open data directory {}: {}", path_manager.data_dir().display(), e))?;
    Ok(Arc::new(store))
}

pub fn open_watchlist(path_manager: &PathManager) -> Result<WatchlistStore> {
    Ok(WatchlistStore::open(watched_store(path_manager)?))
}
