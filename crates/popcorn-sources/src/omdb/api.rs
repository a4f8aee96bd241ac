use crate::error::SourceError;
use popcorn_config::OmdbConfig;
use popcorn_models::{MovieDetail, SearchResult};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, trace};

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Option<Vec<OmdbSearchItem>>,
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

// A "Response": "False" payload carries none of the movie fields, so all default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmdbDetailResponse {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Poster")]
    poster: String,
    #[serde(rename = "Runtime")]
    runtime: String,
    #[serde(rename = "imdbRating")]
    imdb_rating: String,
    #[serde(rename = "Plot")]
    plot: String,
    #[serde(rename = "Released")]
    released: String,
    #[serde(rename = "Actors")]
    actors: String,
    #[serde(rename = "Director")]
    director: String,
    #[serde(rename = "Genre")]
    genre: String,
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

fn is_false(response: &Option<String>) -> bool {
    response.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("false"))
}

/// "136 min" -> 136, "N/A" -> None
pub fn parse_runtime(runtime: &str) -> Option<u32> {
    runtime.split_whitespace().next()?.parse().ok()
}

/// "7.5" -> 7.5, "N/A" -> None
pub fn parse_imdb_rating(rating: &str) -> Option<f32> {
    rating
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|r| (0.0..=10.0).contains(r))
}

/// Parse a search body. Duplicate ids within one response are collapsed,
/// keeping the first occurrence.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, SourceError> {
    let data: OmdbSearchResponse = serde_json::from_str(body)?;

    if is_false(&data.response) {
        return Err(SourceError::NotFound {
            reason: data.error.unwrap_or_else(|| "no error message".to_string()),
        });
    }

    let mut seen = HashSet::new();
    let results: Vec<SearchResult> = data
        .search
        .unwrap_or_default()
        .into_iter()
        .filter(|item| seen.insert(item.imdb_id.clone()))
        .map(|item| SearchResult {
            id: item.imdb_id,
            title: item.title,
            year: item.year,
            poster: item.poster,
        })
        .collect();

    if results.is_empty() {
        return Err(SourceError::NotFound {
            reason: "empty result set".to_string(),
        });
    }

    Ok(results)
}

pub fn parse_detail_response(body: &str) -> Result<MovieDetail, SourceError> {
    let data: OmdbDetailResponse = serde_json::from_str(body)?;

    if is_false(&data.response) {
        return Err(SourceError::NotFound {
            reason: data.error.unwrap_or_else(|| "no error message".to_string()),
        });
    }

    Ok(MovieDetail {
        runtime_minutes: parse_runtime(&data.runtime),
        imdb_rating: parse_imdb_rating(&data.imdb_rating),
        id: data.imdb_id,
        title: data.title,
        year: data.year,
        poster: data.poster,
        plot: data.plot,
        released: data.released,
        actors: data.actors,
        director: data.director,
        genre: data.genre,
    })
}

async fn get_body(client: &Client, config: &OmdbConfig, params: &[(&str, &str)]) -> Result<String, SourceError> {
    let response = client
        .get(&config.base_url)
        .query(&[("apikey", config.api_key.as_str())])
        .query(params)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        debug!("OMDb request failed with status {}", status);
        return Err(SourceError::Status { status: status.as_u16() });
    }

    let body = response.text().await?;
    trace!("OMDb response body: {}", body);
    Ok(body)
}

/// Search titles matching `query`
pub async fn search(client: &Client, config: &OmdbConfig, query: &str) -> Result<Vec<SearchResult>, SourceError> {
    let body = get_body(client, config, &[("s", query)]).await?;
    parse_search_response(&body)
}

/// Fetch full details for one IMDb id
pub async fn get_details(client: &Client, config: &OmdbConfig, id: &str) -> Result<MovieDetail, SourceError> {
    let body = get_body(client, config, &[("i", id)]).await?;
    let mut detail = parse_detail_response(&body)?;
    if detail.id.is_empty() {
        detail.id = id.to_string();
    }
    Ok(detail)
}
