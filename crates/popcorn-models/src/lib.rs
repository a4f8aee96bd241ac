pub mod movie;
pub mod rating;
pub mod watched;

pub use movie::{MovieDetail, SearchResult};
pub use rating::UserRating;
pub use watched::{WatchedEntry, WatchedSummary};
