pub mod store;
pub mod watchlist;
pub mod title;
pub mod search;
pub mod detail;
pub mod keys;
pub mod controller;

#[cfg(test)]
pub(crate) mod testing;

pub use store::{PersistentStore, JsonFileStore, MemoryStore};
pub use watchlist::WatchlistStore;
pub use title::{DocumentTitle, TitleGuard, TitleSink, NoopTitle};
pub use search::{SearchSession, SearchState, SearchStatus};
pub use detail::{DetailSession, DetailState, DetailStatus};
pub use keys::{BindingId, KeyBindings};
pub use controller::{AppController, ControllerError};
