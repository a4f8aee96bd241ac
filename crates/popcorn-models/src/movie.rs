use serde::{Deserialize, Serialize};

/// One row of a search response. Keyed by `id` within a single response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub id: String, // IMDb id, e.g. "tt0096895"
    pub title: String,
    pub year: String, // Series report ranges like "2005–2008"
    pub poster: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    pub runtime_minutes: Option<u32>,
    pub imdb_rating: Option<f32>, // 0-10
    pub plot: String,
    pub released: String,
    pub actors: String,
    pub director: String,
    pub genre: String,
}

impl MovieDetail {
    pub fn runtime_label(&self) -> String {
        match self.runtime_minutes {
            Some(minutes) => format!("{} min", minutes),
            None => "N/A".to_string(),
        }
    }
}
