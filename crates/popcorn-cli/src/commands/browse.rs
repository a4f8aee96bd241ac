use super::{load_config, omdb_client, watched_store};
use crate::output::Output;
use crate::render::{self, TerminalTitle};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use popcorn_config::PathManager;
use popcorn_core::{
    AppController, BindingId, DetailState, DetailStatus, DocumentTitle, KeyBindings, MemoryStore,
    PersistentStore, SearchState, SearchStatus, WatchlistStore,
};
use popcorn_models::UserRating;
use serde_json::json;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Search,
    Details,
}

struct Browser {
    app: AppController,
    focus: Focus,
    /// What the user is typing: the search box, or a `:command`
    input: String,
    quit: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Open(usize),
    Rate(u8),
    Add,
    Close,
    Remove(String),
    Watched,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let rest = line.trim().trim_start_matches(':');
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    let command = match (name.as_str(), arg) {
        ("open" | "o", Some(n)) => Command::Open(n.parse().map_err(|_| format!("Not a result number: {}", n))?),
        ("rate" | "r", Some(n)) => Command::Rate(n.parse().map_err(|_| format!("Not a rating: {}", n))?),
        ("add" | "a", _) => Command::Add,
        ("close" | "c", _) => Command::Close,
        ("rm" | "remove", Some(id)) => Command::Remove(id.to_string()),
        ("watched" | "w", _) => Command::Watched,
        ("help" | "h" | "?", _) => Command::Help,
        ("quit" | "q", _) => Command::Quit,
        ("open" | "o" | "rate" | "r" | "rm" | "remove", None) => {
            return Err(format!(":{} needs an argument (see :help)", name));
        }
        _ => return Err(format!("Unknown command :{} (see :help)", name)),
    };
    Ok(command)
}

/// Name a key is bound under in `KeyBindings`
fn key_name(code: KeyCode) -> Option<&'static str> {
    match code {
        KeyCode::Enter => Some("Enter"),
        KeyCode::Esc => Some("Escape"),
        _ => None,
    }
}

/// Enter jumps back to the search box and clears it, unless it already has focus.
fn bind_enter(keys: &mut KeyBindings<Browser>) -> BindingId {
    keys.bind("Enter", |browser: &mut Browser| {
        if browser.focus == Focus::Search {
            return;
        }
        browser.focus = Focus::Search;
        browser.input.clear();
        browser.app.set_query("");
    })
}

/// Escape is bound only while details are open.
fn sync_escape_binding(browser: &Browser, keys: &mut KeyBindings<Browser>, escape: &mut Option<BindingId>) {
    let details_open = !browser.app.detail_state().is_idle();
    match (details_open, *escape) {
        (true, None) => {
            *escape = Some(keys.bind("Escape", |browser: &mut Browser| browser.app.close_details()));
        }
        (false, Some(id)) => {
            keys.unbind(id);
            *escape = None;
        }
        _ => {}
    }
}

/// Raw mode for as long as the browse loop runs. Output is printed with raw
/// mode lifted so line endings stay intact; the prompt is drawn on stderr so
/// JSON output on stdout stays clean.
struct Screen {
    raw: bool,
}

impl Screen {
    fn raw() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { raw: true })
    }

    #[cfg(test)]
    fn detached() -> Self {
        Self { raw: false }
    }

    fn print(&self, f: impl FnOnce()) {
        if !self.raw {
            f();
            return;
        }
        let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = terminal::disable_raw_mode();
        f();
        let _ = terminal::enable_raw_mode();
    }

    fn prompt(&self, line: &str) {
        if !self.raw {
            return;
        }
        let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line));
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if self.raw {
            let _ = execute!(io::stderr(), Print("\r\n"));
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Key presses read on a blocking thread. The thread stops once the receiver
/// is dropped or reading fails.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<io::Result<KeyEvent>> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            let key = match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Ok(key),
                    Ok(_) => continue,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            let failed = key.is_err();
            if tx.send(key).is_err() || failed {
                return;
            }
        }
    });
    rx
}

pub async fn run_browse(ephemeral: bool, output: &Output) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(eyre!("popcorn browse needs an interactive terminal"));
    }

    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = omdb_client(&config)?;

    let store: Arc<dyn PersistentStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        watched_store(&path_manager)?
    };
    let title = DocumentTitle::new(Arc::new(TerminalTitle), config.ui.default_title.clone());
    let app = AppController::new(
        Arc::new(client),
        WatchlistStore::open(store),
        title,
        config.search.min_query_length,
    );

    let mut search_rx = app.subscribe_search();
    let mut detail_rx = app.subscribe_details();
    let mut browser = Browser {
        app,
        focus: Focus::Search,
        input: String::new(),
        quit: false,
    };
    let mut keys = KeyBindings::new();
    bind_enter(&mut keys);
    let mut escape = None;
    let mut last_status = DetailStatus::Idle;

    print_help(output);
    let screen = Screen::raw().map_err(|e| eyre!("Failed to enable raw mode: {}", e))?;
    let mut key_rx = spawn_key_reader();

    while !browser.quit {
        screen.prompt(&prompt_line(&browser));
        tokio::select! {
            key = key_rx.recv() => {
                let Some(key) = key else { break };
                let key = key.map_err(|e| eyre!("Failed to read key: {}", e))?;
                handle_key(&mut browser, &mut keys, key, &screen, output);
                sync_escape_binding(&browser, &mut keys, &mut escape);
            }
            Ok(()) = search_rx.changed() => {
                let state = search_rx.borrow_and_update().clone();
                screen.print(|| render_search(&state, output));
            }
            Ok(()) = detail_rx.changed() => {
                let state = detail_rx.borrow_and_update().clone();
                screen.print(|| render_details(&browser.app, &state, &last_status, output));
                last_status = state.status;
                sync_escape_binding(&browser, &mut keys, &mut escape);
            }
        }
    }

    drop(screen);
    // Reverts the terminal title if a movie is still open
    browser.app.close_details();
    Ok(())
}

fn prompt_line(browser: &Browser) -> String {
    let marker = match browser.app.search_state().status {
        SearchStatus::Loading => "… ",
        SearchStatus::Error => "✗ ",
        SearchStatus::Idle | SearchStatus::Success => "",
    };
    let focus = match browser.focus {
        Focus::Search => "search",
        Focus::Details => "details",
    };
    format!("{}{}> {}", marker, focus, browser.input)
}

fn handle_key(browser: &mut Browser, keys: &mut KeyBindings<Browser>, key: KeyEvent, screen: &Screen, output: &Output) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d')) {
            browser.quit = true;
        }
        return;
    }

    match key.code {
        KeyCode::Char(c) => {
            browser.input.push(c);
            input_changed(browser);
        }
        KeyCode::Backspace => {
            if browser.input.pop().is_some() {
                input_changed(browser);
            }
        }
        KeyCode::Enter if browser.input.starts_with(':') => {
            let line = std::mem::take(&mut browser.input);
            match parse_command(&line) {
                Ok(command) => screen.print(|| run_command(browser, command, output)),
                Err(msg) => screen.print(|| output.warn(msg)),
            }
        }
        code => {
            let Some(name) = key_name(code) else {
                return;
            };
            if keys.dispatch(name, browser) == 0 {
                debug!("Nothing bound to {}", name);
                if code == KeyCode::Esc && browser.input.starts_with(':') {
                    browser.input.clear();
                }
            }
        }
    }
}

/// Plain text is the search box and searches as it changes; a leading ':'
/// starts a command instead.
fn input_changed(browser: &mut Browser) {
    if browser.input.starts_with(':') {
        return;
    }
    browser.focus = Focus::Search;
    browser.app.set_query(browser.input.clone());
}

fn run_command(browser: &mut Browser, command: Command, output: &Output) {
    let app = &mut browser.app;
    match command {
        Command::Open(n) => {
            let results = app.search_state().results;
            match n.checked_sub(1).and_then(|i| results.get(i)) {
                Some(result) => {
                    app.select_movie(result.id.clone());
                    browser.focus = Focus::Details;
                }
                None => output.warn(format!("No result #{} (have {})", n, results.len())),
            }
        }
        Command::Rate(value) => {
            let Some(rating) = UserRating::new(value) else {
                output.warn(format!("Rating must be between {} and {}", UserRating::MIN, UserRating::MAX));
                return;
            };
            if let Err(e) = app.rate(rating) {
                output.warn(e.to_string());
            }
        }
        Command::Add => match app.commit_rating() {
            Ok(entry) => {
                output.success(format!("Added \"{}\" with your rating {}", entry.title, entry.user_rating));
                browser.focus = Focus::Search;
            }
            Err(e) => output.warn(e.to_string()),
        },
        Command::Close => {
            app.close_details();
            browser.focus = Focus::Search;
        }
        Command::Remove(id) => match app.delete_watched(&id) {
            Ok(0) => output.warn(format!("{} is not in your watched list", id)),
            Ok(_) => output.success(format!("Removed {} from your watched list", id)),
            Err(e) => output.error(e.to_string()),
        },
        Command::Watched => render_watched(app, output),
        Command::Help => print_help(output),
        Command::Quit => browser.quit = true,
    }
}

fn render_search(state: &SearchState, output: &Output) {
    output.json(&json!({
        "type": "search",
        "query": state.query,
        "status": format!("{:?}", state.status).to_lowercase(),
        "error": state.error,
        "results": state.results,
    }));
    if !output.is_human() {
        return;
    }

    // Loading shows in the prompt
    match state.status {
        SearchStatus::Idle | SearchStatus::Loading => {}
        SearchStatus::Error => output.error(state.error.clone().unwrap_or_default()),
        SearchStatus::Success if state.results.is_empty() => {}
        SearchStatus::Success => {
            output.info(format!("Found {} results", state.result_count()));
            output.info(render::results_table(&state.results).to_string());
        }
    }
}

fn render_details(app: &AppController, state: &DetailState, last_status: &DetailStatus, output: &Output) {
    // Only the rating moved: report it without redrawing the whole movie
    if &state.status == last_status {
        if let Some(rating) = state.user_rating {
            output.json(&json!({
                "type": "rating",
                "user_rating": u8::from(rating),
                "rating_change_count": state.rating_change_count,
            }));
            if output.is_human() {
                output.info(format!("Your rating: {}🌟 (':add' to add it to the list)", rating));
            }
        }
        return;
    }

    match &state.status {
        DetailStatus::Idle => render_watched(app, output),
        DetailStatus::Loading { id } => {
            output.json(&json!({ "type": "details", "status": "loading", "id": id }));
            if output.is_human() {
                output.info("LOADING...");
            }
        }
        DetailStatus::Ready { id, detail } => {
            let watched_rating = app.watched_rating(id);
            output.json(&json!({
                "type": "details",
                "status": "ready",
                "id": id,
                "title": detail.title,
                "user_rating": watched_rating.map(u8::from),
            }));
            if !output.is_human() {
                return;
            }
            output.info(render::detail_text(detail));
            match watched_rating {
                Some(rating) => output.info(format!("You rated that movie with {}⭐", rating)),
                None => output.info("Rate it with ':rate 1-10', then ':add'"),
            }
        }
    }
}

fn render_watched(app: &AppController, output: &Output) {
    output.json(&json!({ "type": "watched", "summary": app.summary(), "watched": app.watched() }));
    if !output.is_human() {
        return;
    }
    output.info(render::summary_line(&app.summary()));
    if !app.watched().is_empty() {
        output.info(render::watched_table(app.watched()).to_string());
    }
}

fn print_help(output: &Output) {
    if !output.is_human() {
        return;
    }
    output.info(
        "Type to search; results update as you type. Enter jumps back to the search box, Esc closes the details.\n\
         Commands: :open N, :rate N, :add, :close, :rm ID, :watched, :help, :quit. Ctrl-C quits.",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use popcorn_config::OmdbConfig;
    use popcorn_core::NoopTitle;
    use popcorn_sources::OmdbClient;

    fn browser() -> Browser {
        // Requests fail while being built, so no socket is ever opened
        let client = OmdbClient::new(OmdbConfig {
            api_key: "test".to_string(),
            base_url: "not a url".to_string(),
        })
        .unwrap();
        let app = AppController::new(
            Arc::new(client),
            WatchlistStore::open(Arc::new(MemoryStore::new())),
            DocumentTitle::new(Arc::new(NoopTitle), "Popcorn"),
            3,
        );
        Browser {
            app,
            focus: Focus::Search,
            input: String::new(),
            quit: false,
        }
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Human, true)
    }

    fn press(browser: &mut Browser, keys: &mut KeyBindings<Browser>, code: KeyCode) {
        handle_key(browser, keys, KeyEvent::new(code, KeyModifiers::NONE), &Screen::detached(), &quiet());
    }

    fn type_text(browser: &mut Browser, keys: &mut KeyBindings<Browser>, text: &str) {
        for c in text.chars() {
            press(browser, keys, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(":open 2"), Ok(Command::Open(2)));
        assert_eq!(parse_command(":rate 8"), Ok(Command::Rate(8)));
        assert_eq!(parse_command(":rm tt0096895"), Ok(Command::Remove("tt0096895".to_string())));
        assert_eq!(parse_command(":Q"), Ok(Command::Quit));
        assert_eq!(parse_command(":add"), Ok(Command::Add));
        assert!(parse_command(":open").is_err());
        assert!(parse_command(":rate ten").is_err());
        assert!(parse_command(":dance").is_err());
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(KeyCode::Esc), Some("Escape"));
        assert_eq!(key_name(KeyCode::Enter), Some("Enter"));
        assert_eq!(key_name(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_typing_updates_query() {
        let mut browser = browser();
        let mut keys = KeyBindings::new();

        type_text(&mut browser, &mut keys, "ba");
        assert_eq!(browser.app.search_state().query, "ba");
        assert_eq!(browser.app.search_state().status, SearchStatus::Success);

        press(&mut browser, &mut keys, KeyCode::Backspace);
        assert_eq!(browser.input, "b");
        assert_eq!(browser.app.search_state().query, "b");
    }

    #[test]
    fn test_command_input_is_not_a_query() {
        let mut browser = browser();
        let mut keys = KeyBindings::new();
        bind_enter(&mut keys);

        type_text(&mut browser, &mut keys, ":q");
        assert_eq!(browser.app.search_state().status, SearchStatus::Idle);
        assert!(!browser.quit);

        press(&mut browser, &mut keys, KeyCode::Enter);
        assert!(browser.quit);
        assert!(browser.input.is_empty());
    }

    #[test]
    fn test_escape_clears_pending_command_when_nothing_is_open() {
        let mut browser = browser();
        let mut keys = KeyBindings::new();

        type_text(&mut browser, &mut keys, ":ra");
        press(&mut browser, &mut keys, KeyCode::Esc);
        assert!(browser.input.is_empty());
    }

    #[test]
    fn test_enter_refocuses_search_and_clears_query() {
        let mut browser = browser();
        let mut keys = KeyBindings::new();
        bind_enter(&mut keys);

        browser.focus = Focus::Details;
        press(&mut browser, &mut keys, KeyCode::Enter);
        assert_eq!(browser.focus, Focus::Search);
        let state = browser.app.search_state();
        assert_eq!(state.query, "");
        assert_eq!(state.status, SearchStatus::Success);

        // Already focused: nothing happens
        type_text(&mut browser, &mut keys, "ba");
        let before = browser.app.search_state();
        press(&mut browser, &mut keys, KeyCode::Enter);
        assert_eq!(browser.app.search_state(), before);
        assert_eq!(browser.input, "ba");
    }

    #[tokio::test]
    async fn test_escape_key_closes_open_details() {
        let mut browser = browser();
        let mut keys = KeyBindings::new();
        let mut escape = None;

        sync_escape_binding(&browser, &mut keys, &mut escape);
        assert!(!keys.is_bound("Escape"));

        browser.app.select_movie("tt0096895");
        browser.focus = Focus::Details;
        sync_escape_binding(&browser, &mut keys, &mut escape);
        assert!(keys.is_bound("Escape"));

        press(&mut browser, &mut keys, KeyCode::Esc);
        assert!(browser.app.detail_state().is_idle());

        sync_escape_binding(&browser, &mut keys, &mut escape);
        assert!(escape.is_none());
        assert!(!keys.is_bound("Escape"));
    }
}
