use super::{load_config, omdb_client};
use crate::output::Output;
use crate::render;
use color_eyre::Result;
use popcorn_config::PathManager;
use popcorn_core::{SearchSession, SearchStatus};
use serde_json::json;
use std::sync::Arc;

pub async fn run_search(query: String, output: &Output) -> Result<()> {
    tracing::debug!("Search command started");

    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = omdb_client(&config)?;

    let mut session = SearchSession::new(Arc::new(client), config.search.min_query_length);
    let spinner = output.spinner(format!("Searching for \"{}\"...", query));
    session.set_query(query);
    let state = session.settled().await;
    spinner.finish_and_clear();

    output.json(&json!({
        "query": state.query,
        "status": format!("{:?}", state.status).to_lowercase(),
        "error": state.error,
        "results": state.results,
    }));

    match state.status {
        SearchStatus::Error => {
            output.error(state.error.unwrap_or_default());
        }
        _ if state.results.is_empty() => {
            output.info(format!(
                "Type at least {} characters to search",
                config.search.min_query_length
            ));
        }
        _ => {
            if output.is_human() && !output.is_quiet() {
                println!("Found {} results", state.result_count());
                println!("{}", render::results_table(&state.results));
            }
        }
    }

    Ok(())
}
