//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `soundscape` binary.
//!
//! ## Commands
//!
//! - `tags`: List the genres and moods present in the catalog
//! - `curate`: Match albums and print the assembled playlist
//! - `login` / `callback`: The two halves of the Spotify login
//! - `publish`: Curate, resolve, and create the playlist on Spotify
//! - `status` / `logout`: Inspect or clear the stored session
//! - `completion`: Print a shell completion script
//!
//! ## Examples
//!
//! ```bash
//! soundscape curate -g Jazz -m Chill -m Smooth
//! soundscape login
//! soundscape callback 'http://127.0.0.1:3000/callback?code=AQB...'
//! soundscape publish -g "Hip Hop" -m Energetic --name "Gym"
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
#[command(name = "soundscape")]
#[command(about = "Soundscape: curated playlists from genre & mood picks, published to Spotify")]
#[command(version)]
pub struct Args {
    /// Album catalog to read instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Genre and mood picks shared by `curate` and `publish`.
#[derive(ClapArgs, Debug, Clone)]
pub struct SelectionArgs {
    /// Favorite genre (repeatable)
    #[arg(short, long = "genre", value_name = "GENRE")]
    pub genres: Vec<String>,

    /// Current mood (repeatable)
    #[arg(short, long = "mood", value_name = "MOOD")]
    pub moods: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every genre and mood in the catalog
    Tags,

    /// Build a playlist from the catalog and print it
    ///
    /// Albums matching both a genre and a mood come first; if fewer than
    /// five match, genre-only, mood-only, and finally the most popular
    /// albums fill in.
    Curate {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Start a Spotify login and print the authorization URL
    ///
    /// Open the URL in a browser, approve access, then pass the URL you are
    /// redirected to into `soundscape callback`.
    Login,

    /// Finish a login with the redirect URL from the browser
    Callback {
        /// Full redirect URL (or just its query string)
        redirect_url: String,
    },

    /// Curate a playlist and publish it to your Spotify account
    Publish {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Playlist name
        #[arg(long)]
        name: Option<String>,

        /// Playlist description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show whether you are logged in
    Status,

    /// Forget stored tokens and any pending login
    Logout,

    /// Generate shell completion scripts
    ///
    /// Usage: soundscape completion bash > ~/.local/share/bash-completion/completions/soundscape
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List catalog tags for completion (hidden command)
    #[command(hide = true)]
    CompleteTags,
}
