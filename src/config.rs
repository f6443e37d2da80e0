//! # Configuration Module
//!
//! Runtime settings and data directory management for Soundscape.
//!
//! ## Data Storage
//!
//! Soundscape keeps its files in the platform-standard data directory:
//! - Linux: `~/.local/share/soundscape/`
//! - macOS: `~/Library/Application Support/soundscape/`
//! - Windows: `%APPDATA%\soundscape\`
//!
//! It holds `session.db` (login state), the default `catalog.json`, and an
//! optional `config.json`.
//!
//! ## Precedence
//!
//! Built-in defaults, then `config.json`, then environment variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `SOUNDSCAPE_CLIENT_ID` | OAuth client id |
//! | `SOUNDSCAPE_REDIRECT_URI` | registered callback URL |
//! | `SOUNDSCAPE_ACCOUNTS_URL` | authorization server base URL |
//! | `SOUNDSCAPE_API_URL` | Web API base URL |
//! | `SOUNDSCAPE_CATALOG` | album catalog file |
//! | `SOUNDSCAPE_SESSION_DB` | session database file |
//! | `SOUNDSCAPE_HTTP_TIMEOUT_SECS` | per-request timeout |

use crate::session::AuthConfig;
use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Scopes needed to read the profile and write private or public playlists.
pub const DEFAULT_SCOPES: &[&str] = &[
    "playlist-modify-private",
    "playlist-modify-public",
    "user-read-private",
    "user-read-email",
    "user-library-read",
];

/// Returns the platform-appropriate data directory for Soundscape,
/// creating it if it does not exist yet.
///
/// # Errors
///
/// Fails if the system data directory cannot be determined or the
/// `soundscape` subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let app_dir = data_dir.join("soundscape");
    fs::create_dir_all(&app_dir)
        .with_context(|| format!(
            "Failed to create Soundscape data directory at {}. Please check file permissions.",
            app_dir.display()
        ))?;

    Ok(app_dir)
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub client_id: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub accounts_url: String,
    pub api_url: String,
    pub catalog_path: PathBuf,
    pub session_db: PathBuf,
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let data_dir = get_data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            client_id: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            catalog_path: data_dir.join("catalog.json"),
            session_db: data_dir.join("session.db"),
            http_timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl RuntimeConfig {
    /// Defaults, overlaid with `config.json` from the data directory and
    /// then with `SOUNDSCAPE_*` environment variables.
    pub fn load() -> Result<Self> {
        let config_file = get_data_dir()?.join("config.json");
        let mut config = if config_file.exists() {
            Self::from_file(&config_file)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Override settings from environment-style variables supplied by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("SOUNDSCAPE_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(uri) = lookup("SOUNDSCAPE_REDIRECT_URI") {
            self.redirect_uri = uri;
        }
        if let Some(url) = lookup("SOUNDSCAPE_ACCOUNTS_URL") {
            self.accounts_url = url;
        }
        if let Some(url) = lookup("SOUNDSCAPE_API_URL") {
            self.api_url = url;
        }
        if let Some(path) = lookup("SOUNDSCAPE_CATALOG") {
            self.catalog_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SOUNDSCAPE_SESSION_DB") {
            self.session_db = PathBuf::from(path);
        }
        if let Some(secs) = lookup("SOUNDSCAPE_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = secs
                .parse()
                .with_context(|| format!("SOUNDSCAPE_HTTP_TIMEOUT_SECS must be a number, got '{secs}'"))?;
        }
        Ok(())
    }

    /// Use `path` as the catalog, resolved against the working directory.
    pub fn with_catalog(mut self, path: &Path) -> Result<Self> {
        self.catalog_path = path
            .absolutize()
            .with_context(|| format!("Cannot resolve catalog path {}", path.display()))?
            .into_owned();
        Ok(self)
    }

    /// OAuth settings; fails when no client id is configured.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let client_id = self
            .client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .context("No Spotify client id configured. Set SOUNDSCAPE_CLIENT_ID or add \"client_id\" to config.json")?;

        Ok(AuthConfig {
            client_id,
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
            accounts_url: self.accounts_url.clone(),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Shared HTTP client with the configured timeouts.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout())
            .connect_timeout(self.connect_timeout())
            .build()
            .context("Failed to build HTTP client")
    }
}
