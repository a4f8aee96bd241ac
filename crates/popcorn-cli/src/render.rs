use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use crossterm::execute;
use crossterm::terminal::SetTitle;
use owo_colors::OwoColorize;
use popcorn_core::TitleSink;
use popcorn_models::{MovieDetail, SearchResult, WatchedEntry, WatchedSummary};
use std::io::{self, IsTerminal};
use tracing::debug;

fn styled_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

pub fn results_table(results: &[SearchResult]) -> Table {
    let mut table = styled_table(vec!["#", "Title", "Year", "IMDb id"]);
    for (i, result) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&result.title),
            Cell::new(&result.year),
            Cell::new(&result.id),
        ]);
    }
    table
}

pub fn watched_table(entries: &[WatchedEntry]) -> Table {
    let mut table = styled_table(vec!["Title", "Year", "IMDb ⭐", "Your 🌟", "Runtime", "IMDb id"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.title),
            Cell::new(&entry.year),
            Cell::new(entry.imdb_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "N/A".to_string())),
            Cell::new(entry.user_rating),
            Cell::new(entry.runtime_minutes.map(|m| format!("{} min", m)).unwrap_or_else(|| "N/A".to_string())),
            Cell::new(&entry.id),
        ]);
    }
    table
}

pub fn summary_line(summary: &WatchedSummary) -> String {
    format!(
        "#️⃣ {} movies   ⭐️ {:.1}   🌟 {:.1}   ⏳ {:.0} min",
        summary.count, summary.avg_imdb_rating, summary.avg_user_rating, summary.avg_runtime_minutes
    )
}

pub fn detail_text(detail: &MovieDetail) -> String {
    let rating = detail
        .imdb_rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "{}\n{} • {}\n{}\n⭐ {} IMDb rating\n\n{}\n\nStarring {}\nDirected by {}",
        detail.title.bold(),
        detail.released,
        detail.runtime_label(),
        detail.genre,
        rating,
        detail.plot.italic(),
        detail.actors,
        detail.director,
    )
}

/// Sets the terminal window/tab title.
pub struct TerminalTitle;

impl TitleSink for TerminalTitle {
    fn set_title(&self, title: &str) {
        let mut stderr = io::stderr();
        if !stderr.is_terminal() {
            return;
        }
        if let Err(e) = execute!(stderr, SetTitle(title)) {
            debug!("Failed to set terminal title: {}", e);
        }
    }
}
