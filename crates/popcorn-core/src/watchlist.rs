use crate::store::PersistentStore;
use anyhow::Result;
use popcorn_models::{UserRating, WatchedEntry, WatchedSummary};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key the watched list is persisted under
pub const WATCHED_KEY: &str = "watched";

/// The user's watched movies, mirrored to a `PersistentStore` on every change.
///
/// Entries are not deduplicated: adding the same id twice keeps both.
pub struct WatchlistStore {
    store: Arc<dyn PersistentStore>,
    entries: Vec<WatchedEntry>,
}

impl WatchlistStore {
    /// Rehydrate from `store`. A missing or malformed value starts an empty list.
    pub fn open(store: Arc<dyn PersistentStore>) -> Self {
        let entries = match store.load(WATCHED_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<WatchedEntry>>(value) {
                Ok(entries) => {
                    info!("Loaded {} watched entries", entries.len());
                    entries
                }
                Err(e) => {
                    warn!("Stored watched list is malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored watched list, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to load watched list, starting empty: {}", e);
                Vec::new()
            }
        };

        Self { store, entries }
    }

    pub fn list(&self) -> &[WatchedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&WatchedEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn user_rating(&self, id: &str) -> Option<UserRating> {
        self.find(id).map(|e| e.user_rating)
    }

    pub fn summary(&self) -> WatchedSummary {
        WatchedSummary::from_entries(&self.entries)
    }

    pub fn add(&mut self, entry: WatchedEntry) -> Result<()> {
        let mut next = self.entries.clone();
        debug!("Adding {} ({}) to watched list", entry.title, entry.id);
        next.push(entry);
        self.commit(next)
    }

    /// Drop every entry with `id`. Returns how many were removed; removing an
    /// unknown id changes nothing and writes nothing.
    pub fn remove(&mut self, id: &str) -> Result<usize> {
        let next: Vec<WatchedEntry> = self.entries.iter().filter(|e| e.id != id).cloned().collect();
        let removed = self.entries.len() - next.len();
        if removed == 0 {
            debug!("Remove of {} ignored, not in watched list", id);
            return Ok(0);
        }
        self.commit(next)?;
        Ok(removed)
    }

    // Persist first so memory never runs ahead of disk
    fn commit(&mut self, next: Vec<WatchedEntry>) -> Result<()> {
        let value = serde_json::to_value(&next)?;
        self.store.save(WATCHED_KEY, &value)?;
        self.entries = next;
        Ok(())
    }
}
