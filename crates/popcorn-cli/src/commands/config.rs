use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{modifiers, presets, Attribute, Cell, Table};
use popcorn_config::{Config, PathManager, API_KEY_ENV};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::SetKey { key } => set_key(&path_manager, key, output),
        ConfigCommands::Path => {
            let path = path_manager.config_file();
            output.json(&json!({ "config_file": path }));
            if output.is_human() {
                output.info(path.display().to_string());
            }
            Ok(())
        }
    }
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Defaults are used until you run 'popcorn config set-key'.");
    }

    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let api_key = if full { config.omdb.api_key.clone() } else { config.masked_api_key() };

    output.json(&json!({
        "config_file": config_file,
        "omdb": { "api_key": api_key, "base_url": config.omdb.base_url },
        "search": { "min_query_length": config.search.min_query_length },
        "ui": { "default_title": config.ui.default_title },
        "valid": config.validate().is_ok(),
    }));

    if !output.is_human() || output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Config File").add_attribute(Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    table.add_row(vec![Cell::new("OMDb API key"), Cell::new(api_key)]);
    table.add_row(vec![Cell::new("OMDb base URL"), Cell::new(&config.omdb.base_url)]);
    table.add_row(vec![Cell::new("Min query length"), Cell::new(config.search.min_query_length)]);
    table.add_row(vec![Cell::new("Default title"), Cell::new(&config.ui.default_title)]);
    println!("{}", table);

    if let Err(e) = config.validate() {
        output.warn(e.to_string());
    }
    Ok(())
}

fn set_key(path_manager: &PathManager, key: Option<String>, output: &Output) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => rpassword::prompt_password("OMDb API key: ").map_err(|e| eyre!("Failed to read API key: {}", e))?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(eyre!("API key cannot be empty"));
    }

    let config_file = path_manager.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.omdb.api_key = key;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("API key saved to {}", config_file.display()));
    if std::env::var(API_KEY_ENV).is_ok() {
        output.warn(format!("{} is set and overrides the stored key", API_KEY_ENV));
    }
    Ok(())
}
