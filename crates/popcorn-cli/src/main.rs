use clap::{ArgAction, Parser, Subcommand};
use commands::{browse, config, search, show, watched};

mod commands;
mod logging;
mod output;
mod render;

#[derive(Parser)]
#[command(name = "popcorn")]
#[command(about = "Popcorn - search movies and keep a list of what you've watched")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to the rotating log file instead of stderr
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search movies by title
    #[command(long_about = "Search the movie database by title. Queries shorter than the configured minimum (3 characters by default) return no results without contacting the API.")]
    Search {
        /// Title or part of a title
        query: String,
    },
    /// Show full details for one movie
    Show {
        /// IMDb id, e.g. tt0096895
        id: String,
    },
    /// Interactive search, details and rating
    #[command(long_about = "Interactive session in raw terminal mode. Type to search (results update as you type), ':open N' to show a result, ':rate N' to pick a rating, ':add' to add the movie to your watched list, Esc or ':close' to close details, Enter to jump back to the search box, ':rm ID' to delete a watched movie, ':watched' to list them and ':quit' or Ctrl-C to leave.")]
    Browse {
        /// Keep the watched list in memory only
        #[arg(long, action = ArgAction::SetTrue)]
        ephemeral: bool,
    },
    /// Manage the watched list
    Watched {
        #[command(subcommand)]
        cmd: Option<WatchedCommands>,
    },
    /// Configure the API key and settings
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum WatchedCommands {
    /// List watched movies
    List,
    /// Show averages across the watched list
    Summary,
    /// Remove every entry with this IMDb id
    Remove {
        id: String,

        /// Don't ask for confirmation
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Store the OMDb API key
    #[command(long_about = "Store the OMDb API key in the config file. When KEY is omitted you are prompted for it without echo. The POPCORN_OMDB_API_KEY environment variable takes precedence over the stored key.")]
    SetKey {
        key: Option<String>,
    },
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .then(|| popcorn_config::PathManager::default().log_file());
    let _log_guard = logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Search { query } => search::run_search(query, &output).await,
        Commands::Show { id } => show::run_show(id, &output).await,
        Commands::Browse { ephemeral } => browse::run_browse(ephemeral, &output).await,
        Commands::Watched { cmd } => {
            let cmd = cmd.unwrap_or(WatchedCommands::List);
            watched::run_watched(cmd, &output)
        }
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output)
        }
    }
}
