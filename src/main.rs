//! # Soundscape
//!
//! Pick genres and moods, get a playlist from a curated album catalog, and
//! publish it to your Spotify account.
//!
//! ## Architecture
//!
//! - `cli`: Command-line interface definitions
//! - `completion`: Shell completion scripts
//! - everything else lives in the `soundscape` library crate
//!
//! ## Usage
//!
//! ```bash
//! # See what the catalog offers
//! soundscape tags
//!
//! # Preview a playlist
//! soundscape curate -g Jazz -m Chill
//!
//! # Log in once, then publish
//! soundscape login
//! soundscape callback 'http://127.0.0.1:3000/callback?code=...'
//! soundscape publish -g Jazz -m Chill --name "Sunday Morning"
//! ```

mod cli;
mod completion;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use soundscape::catalog::Catalog;
use soundscape::config::RuntimeConfig;
use soundscape::matcher::{CatalogMatcher, MatchTier, Selection};
use soundscape::playlist::{explain, CuratedTrack, PlaylistAssembler};
use soundscape::publisher::{self, DEFAULT_DESCRIPTION, DEFAULT_PLAYLIST_NAME};
use soundscape::resolver;
use soundscape::session::{self, AuthSession, CallbackOutcome, SessionState};
use soundscape::spotify::SpotifyClient;
use soundscape::store::{SessionStore, SqliteStore, ACCESS_TOKEN};
use soundscape::Error;

/// Main entry point for Soundscape.
///
/// Initializes logging, loads configuration, and routes commands. Network
/// commands run on a single-threaded tokio runtime.
///
/// # Logging
///
/// Controlled via `RUST_LOG`:
/// - `RUST_LOG=debug soundscape publish ...` - Enable debug logging
/// - `RUST_LOG=soundscape::resolver=debug soundscape publish ...` - Resolver only
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut config = RuntimeConfig::load()?;
    if let Some(path) = &args.catalog {
        config = config.with_catalog(path)?;
    }
    debug!("Using catalog {}", config.catalog_path.display());

    match args.command {
        cli::Command::Tags => {
            let catalog = load_catalog(&config)?;
            println!("Genres: {}", catalog.all_genres().join(", "));
            println!("Moods:  {}", catalog.all_moods().join(", "));
        }
        cli::Command::Curate { selection } => {
            let catalog = load_catalog(&config)?;
            let selection = Selection::new(selection.genres, selection.moods);
            let playlist = curate(&catalog, &selection)?;

            println!("{}", explain(&selection));
            println!();
            for (i, track) in playlist.iter().enumerate() {
                println!("{:2}. {track}", i + 1);
            }
        }
        cli::Command::Login => {
            let mut session = open_session(&config)?;
            let request = session.begin_login()?;

            println!("Open this URL in your browser and approve access:");
            println!();
            println!("  {}", request.url);
            println!();
            println!("Then run: soundscape callback '<the URL you were redirected to>'");
        }
        cli::Command::Callback { redirect_url } => {
            let mut session = open_session(&config)?;
            match CallbackOutcome::from_redirect(&redirect_url)? {
                CallbackOutcome::Denied(reason) => {
                    session.cancel_login()?;
                    bail!("Spotify login was not approved ({reason}). Run `soundscape login` to try again.");
                }
                CallbackOutcome::Code(code) => {
                    runtime()?
                        .block_on(session.complete_login(&code))
                        .map_err(with_user_message)?;
                    println!("Logged in to Spotify.");
                }
            }
        }
        cli::Command::Publish { selection, name, description } => {
            let store = open_store(&config)?;
            let Some(token) = store.get(ACCESS_TOKEN)? else {
                bail!("Not logged in. Run `soundscape login` first.");
            };

            let catalog = load_catalog(&config)?;
            let selection = Selection::new(selection.genres, selection.moods);
            let playlist = curate(&catalog, &selection)?;
            let name = name.unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string());
            let description = description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

            let client = SpotifyClient::new(config.http_client()?, config.api_url.clone(), token);
            let result = runtime()?.block_on(async {
                let resolutions = resolver::resolve_all(&client, &playlist).await;
                publisher::publish(&client, &name, &description, &resolutions).await
            });

            let outcome = result.map_err(with_user_message)?;
            if outcome.is_partial() {
                println!(
                    "Created '{name}' with {} tracks; {} could not be found on Spotify.",
                    outcome.added, outcome.unresolved
                );
            } else {
                println!("Created '{name}' with all {} tracks.", outcome.added);
            }
            if let Some(url) = &outcome.playlist_url {
                println!("{url}");
            }
        }
        cli::Command::Status => {
            let store = open_store(&config)?;
            let message = match session::session_state(&store)? {
                SessionState::Authenticated => "Logged in to Spotify.",
                SessionState::PendingExchange => {
                    "Login in progress. Finish it with `soundscape callback <URL>`."
                }
                SessionState::Unauthenticated => "Not logged in. Run `soundscape login`.",
            };
            println!("{message}");
        }
        cli::Command::Logout => {
            let mut store = open_store(&config)?;
            session::clear_session(&mut store)?;
            println!("Logged out.");
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
            if shell == cli::Shell::Fish {
                print!("{}", completion::fish_tag_completions(cmd.get_name()));
            }
        }
        cli::Command::CompleteTags => {
            // Used by completion scripts; a missing catalog just means no candidates
            if let Ok(catalog) = load_catalog(&config) {
                completion::print_tag_completions(&catalog)?;
            }
        }
    }

    Ok(())
}

fn load_catalog(config: &RuntimeConfig) -> Result<Catalog> {
    let (catalog, report) = Catalog::load(&config.catalog_path)
        .with_context(|| format!("Failed to load catalog {}", config.catalog_path.display()))?;
    if !report.quarantined.is_empty() {
        eprintln!(
            "Warning: skipped {} invalid catalog record(s); run with RUST_LOG=warn for details",
            report.quarantined.len()
        );
    }
    Ok(catalog)
}

/// Match and assemble with the default bounds.
fn curate(catalog: &Catalog, selection: &Selection) -> Result<Vec<CuratedTrack>> {
    let matched = CatalogMatcher::default()
        .match_albums(catalog, selection)
        .map_err(with_user_message)?;

    let fallback = matched.iter().filter(|m| m.tier != MatchTier::Exact).count();
    if fallback > 0 {
        info!("{fallback} of {} albums came from relaxed matching", matched.len());
    }

    Ok(PlaylistAssembler::default().assemble(matched.iter().map(|m| m.album)))
}

fn open_store(config: &RuntimeConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.session_db)
        .with_context(|| format!("Failed to open session store {}", config.session_db.display()))
}

fn open_session(config: &RuntimeConfig) -> Result<AuthSession<SqliteStore>> {
    Ok(AuthSession::new(config.auth_config()?, open_store(config)?, config.http_client()?))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Lead with the user-facing message; the library error stays as the cause.
fn with_user_message(err: Error) -> anyhow::Error {
    let message = user_message(&err);
    anyhow::Error::new(err).context(message)
}

/// What to tell the user, and what to do next, for each failure kind.
fn user_message(err: &Error) -> String {
    match err {
        Error::MatchingExhausted => {
            "The album catalog is empty, so there is nothing to build a playlist from.".to_string()
        }
        Error::MissingVerifier => {
            "No login is in progress. Run `soundscape login` and use the URL it prints.".to_string()
        }
        Error::ExchangeFailed(reason) => {
            format!("Spotify rejected the login ({reason}). Run `soundscape login` to try again.")
        }
        Error::NoResolvableTracks => {
            "None of the curated songs could be found on Spotify. Try different genres or moods.".to_string()
        }
        Error::PublishFailed { stage, status: Some(401), .. } => format!(
            "Spotify refused the request at '{stage}'; your login has probably expired. Run `soundscape login`."
        ),
        Error::PublishFailed { stage, reason, .. } => {
            format!("Could not publish the playlist ({stage}: {reason}). You can retry `soundscape publish`.")
        }
        other => other.to_string(),
    }
}
