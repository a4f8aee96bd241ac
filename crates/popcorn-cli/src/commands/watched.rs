use super::open_watchlist;
use crate::output::Output;
use crate::render;
use crate::WatchedCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::Confirm;
use popcorn_config::PathManager;
use serde_json::json;

pub fn run_watched(cmd: WatchedCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let mut watchlist = open_watchlist(&path_manager)?;

    match cmd {
        WatchedCommands::List => {
            output.json(&json!({ "watched": watchlist.list() }));
            if output.is_human() && !output.is_quiet() {
                if watchlist.is_empty() {
                    println!("No watched movies yet");
                } else {
                    println!("{}", render::summary_line(&watchlist.summary()));
                    println!("{}", render::watched_table(watchlist.list()));
                }
            }
        }
        WatchedCommands::Summary => {
            let summary = watchlist.summary();
            output.json(&json!({ "summary": summary }));
            if output.is_human() {
                output.info(render::summary_line(&summary));
            }
        }
        WatchedCommands::Remove { id, yes } => {
            let Some(entry) = watchlist.find(&id) else {
                output.warn(format!("{} is not in your watched list", id));
                return Ok(());
            };

            if !yes && output.is_human() {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove \"{}\" from your watched list?", entry.title))
                    .default(false)
                    .interact()
                    .map_err(|e| eyre!("Prompt failed: {}", e))?;
                if !confirmed {
                    output.info("Nothing removed");
                    return Ok(());
                }
            }

            let removed = watchlist
                .remove(&id)
                .map_err(|e| eyre!("Failed to save watched list: {}", e))?;
            output.json(&json!({ "removed": removed, "id": id }));
            output.success(format!("Removed {} entr{} for {}", removed, if removed == 1 { "y" } else { "ies" }, id));
        }
    }

    Ok(())
}
