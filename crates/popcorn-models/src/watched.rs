use serde::{Deserialize, Serialize};
use crate::movie::MovieDetail;
use crate::rating::UserRating;

/// A movie the user has committed to their watched list together with their
/// own rating. Field names on disk match the format earlier releases wrote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEntry {
    #[serde(rename = "imdbID")]
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<f32>,
    #[serde(rename = "userRating")]
    pub user_rating: UserRating,
    #[serde(rename = "runtime")]
    pub runtime_minutes: Option<u32>,
    /// How many times the rating was changed before it was committed
    #[serde(rename = "countRatingDecisions", default)]
    pub rating_change_count: u32,
}

impl WatchedEntry {
    pub fn from_detail(detail: &MovieDetail, user_rating: UserRating, rating_change_count: u32) -> Self {
        Self {
            id: detail.id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster: detail.poster.clone(),
            imdb_rating: detail.imdb_rating,
            user_rating,
            runtime_minutes: detail.runtime_minutes,
            rating_change_count,
        }
    }
}

/// Aggregate figures shown above the watched list.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_imdb_rating: f32,
    pub avg_user_rating: f32,
    pub avg_runtime_minutes: f32,
}

impl WatchedSummary {
    pub fn from_entries(entries: &[WatchedEntry]) -> Self {
        Self {
            count: entries.len(),
            avg_imdb_rating: average(entries.iter().filter_map(|e| e.imdb_rating)),
            avg_user_rating: average(entries.iter().map(|e| e.user_rating.value() as f32)),
            avg_runtime_minutes: average(entries.iter().filter_map(|e| e.runtime_minutes.map(|m| m as f32))),
        }
    }
}

// Unknown values are skipped rather than counted as zero
fn average(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0_f32, 0_u32), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}
