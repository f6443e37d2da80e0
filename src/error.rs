//! Error taxonomy shared by every stage of the curate → login → publish flow.
//!
//! Per-track failures inside the resolver never reach the caller as an `Err`;
//! they are logged as [`TrackUnresolved`] and folded into
//! [`crate::resolver::Resolution::Unresolved`].

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which network call of the publication pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    /// Fetching the authenticated user's identifier
    FetchUser,
    /// Creating the empty playlist
    CreatePlaylist,
    /// Appending the resolved track URIs
    AddTracks,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchUser => "fetch user",
            Self::CreatePlaylist => "create playlist",
            Self::AddTracks => "add tracks",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The catalog produced nothing at any matching tier (it is empty).
    #[error("no albums available to match against; the catalog is empty")]
    MatchingExhausted,

    /// `complete_login` ran without a verifier from `begin_login`.
    #[error("no PKCE code verifier stored; start the login again")]
    MissingVerifier,

    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// None of the curated tracks could be mapped to a remote track.
    #[error("none of the curated tracks could be found on the service")]
    NoResolvableTracks,

    /// `status` is the HTTP status when the service answered with an error.
    #[error("publishing failed at stage '{stage}': {reason}")]
    PublishFailed {
        stage: PublishStage,
        status: Option<u16>,
        reason: String,
    },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("session storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid authorization callback: {0}")]
    InvalidCallback(String),

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Attach a publish stage to a lower-level failure.
    pub(crate) fn at_stage(self, stage: PublishStage) -> Self {
        Self::PublishFailed {
            stage,
            status: self.http_status(),
            reason: self.to_string(),
        }
    }

    /// HTTP status behind this error, if the service sent one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::PublishFailed { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Why a single curated track did not resolve. Logged, never propagated.
#[derive(Debug, Error)]
#[error("could not resolve '{title}' by {artist}: {reason}")]
pub struct TrackUnresolved {
    pub title: String,
    pub artist: String,
    pub reason: String,
}
