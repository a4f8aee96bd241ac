use super::{load_config, omdb_client, open_watchlist};
use crate::output::Output;
use crate::render;
use color_eyre::Result;
use popcorn_config::PathManager;
use popcorn_sources::MovieDatabase;
use serde_json::json;

pub async fn run_show(id: String, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = omdb_client(&config)?;
    let watchlist = open_watchlist(&path_manager)?;

    let spinner = output.spinner(format!("Loading {}...", id));
    let result = client.details(&id).await;
    spinner.finish_and_clear();

    let detail = match result {
        Ok(detail) => detail,
        Err(e) => {
            tracing::warn!("Failed to load details for {}: {}", id, e.detail());
            output.error(e.to_string());
            return Ok(());
        }
    };

    let your_rating = watchlist.user_rating(&id);
    output.json(&json!({
        "detail": {
            "id": detail.id,
            "title": detail.title,
            "year": detail.year,
            "poster": detail.poster,
            "runtime_minutes": detail.runtime_minutes,
            "imdb_rating": detail.imdb_rating,
            "plot": detail.plot,
            "released": detail.released,
            "actors": detail.actors,
            "director": detail.director,
            "genre": detail.genre,
        },
        "user_rating": your_rating.map(u8::from),
    }));

    if output.is_human() && !output.is_quiet() {
        println!("{}", render::detail_text(&detail));
        if let Some(rating) = your_rating {
            println!("\nYou rated that movie with {}⭐", rating);
        }
    }

    Ok(())
}
