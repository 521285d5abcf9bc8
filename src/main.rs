use clap::{ArgAction, Parser};
use episode_lister::{
    CredentialStore, DEFAULT_LANGUAGE, EpisodeListerError, FetchRunner, ProgressEvent,
    SUPPORTED_LANGUAGES, SearchQuery, TMDB_BASE_URL, TerminalPrompt, TmdbConfig, TmdbProvider,
    export_to_file, render_text,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Look up a tv series on TMDB and list the titles of all its episodes.
#[derive(Debug, Parser)]
#[command(version, about, after_help = languages_help())]
struct Cli {
    /// Name of the tv series to look up
    show: String,

    /// Language tag for localized titles
    #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Write the listing to this file, or into this directory named after the show
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// File holding the TMDB API key [default: api_key.txt next to the executable]
    #[arg(long, value_name = "PATH")]
    api_key_file: Option<PathBuf>,

    /// Base URL of the TMDB API
    #[arg(long, value_name = "URL", default_value = TMDB_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds, 0 to wait indefinitely
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print the listing and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn languages_help() -> String {
    let mut help = String::from("Languages:\n");
    for (tag, name) in SUPPORTED_LANGUAGES {
        help.push_str(&format!("  {tag:<8}{name}\n"));
    }
    help.push_str("  Any other IETF language tag is passed to TMDB as is.");
    help
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the flags
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("episode_lister={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Handles progress events and prints formatted output to stderr
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Searching { title, language } => {
            eprintln!("Searching TMDB for '{}' ({})...", title, language);
        }
        ProgressEvent::NoMatch { .. } => {}
        ProgressEvent::ShowFound { show } => {
            eprintln!("Found '{}' (ID: {})", show.name, show.id);
        }
        ProgressEvent::SeasonsListed { count } => {
            eprintln!("Fetching episodes of {} season(s)", count);
        }
        ProgressEvent::FetchingSeason {
            index,
            total,
            season_number,
        } => {
            eprintln!("[{}/{}] Season {}", index + 1, total, season_number);
        }
        ProgressEvent::SeasonFetched { .. } => {}
        ProgressEvent::Complete {
            season_count,
            episode_count,
        } => {
            eprintln!(
                "Retrieved {} episode(s) in {} season(s)\n",
                episode_count, season_count
            );
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, EpisodeListerError> {
    let query = SearchQuery::new(&cli.show, &cli.language)?;

    let store = match cli.api_key_file {
        Some(path) => CredentialStore::at(path),
        None => CredentialStore::open_default()?,
    };
    let Some(credential) = store.obtain(&TerminalPrompt) else {
        eprintln!(
            "A TMDB API key is required. Put it into {} or enter it when asked.",
            store.path().display()
        );
        return Ok(ExitCode::FAILURE);
    };

    let provider = TmdbProvider::with_config(
        credential,
        TmdbConfig {
            base_url: cli.base_url,
            timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
        },
    )?;
    let runner = FetchRunner::new(Arc::new(provider));

    let title = query.title().to_string();
    let mut handle = runner.start(query);
    while let Some(event) = handle.next_progress() {
        if !cli.quiet {
            handle_progress_event(event);
        }
    }

    let Some(outcome) = handle.wait().and_then(|outcome| runner.accept(outcome)) else {
        eprintln!("Lookup of '{title}' was superseded by a newer one; nothing to show.");
        return Ok(ExitCode::FAILURE);
    };

    if outcome.is_failed() {
        eprintln!(
            "Looking up '{}' failed. Run with -v for details.",
            outcome.query.title()
        );
        return Ok(ExitCode::FAILURE);
    }

    if outcome.result.is_empty() {
        println!("No episodes found for '{}'.", outcome.query.title());
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", render_text(&outcome.result));

    if let Some(target) = cli.output {
        let path = export_to_file(&outcome.result, &target)?;
        eprintln!("\nEpisode titles exported to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("\nError: {e}");
            ExitCode::FAILURE
        }
    }
}
