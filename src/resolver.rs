//! # Track Resolution
//!
//! Maps each [`CuratedTrack`] onto a Spotify track URI.
//!
//! ## Per-track lookup
//!
//! 1. **Album listing**: when the album's Spotify URL carries an album id,
//!    list that album's tracks and take the first whose title contains, or
//!    is contained in, the curated title (case-insensitive). This trusts the
//!    known album over free-text search.
//! 2. **Search**: otherwise search `track:"…" artist:"…" album:"…"` and
//!    prefer a result whose album name matches the same way, else the top hit.
//! 3. Anything else leaves the track unresolved.
//!
//! Title matching is a plain substring heuristic and can pick a live or
//! remastered cut; there is no confidence score.
//!
//! All tracks are looked up concurrently and joined; results come back in
//! input order and one track's failure never affects another.

use crate::error::{Result, TrackUnresolved};
use crate::playlist::CuratedTrack;
use crate::spotify::{RemoteTrack, SpotifyClient};
use futures::future::join_all;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

/// Results requested from the search fallback
pub const SEARCH_LIMIT: u32 = 5;

lazy_static! {
    static ref ALBUM_ID: Regex = Regex::new(r"album/([A-Za-z0-9]+)").expect("valid album id pattern");
}

/// Outcome for one curated track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

impl Resolution {
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Resolved(uri) => Some(uri),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub resolved: usize,
    pub unresolved: usize,
}

impl ResolutionSummary {
    pub fn of(resolutions: &[Resolution]) -> Self {
        let resolved = resolutions.iter().filter(|r| r.is_resolved()).count();
        Self {
            resolved,
            unresolved: resolutions.len() - resolved,
        }
    }
}

/// Pull the album id out of an `open.spotify.com/album/<id>` style URL.
pub fn album_id_from_url(url: &str) -> Option<&str> {
    ALBUM_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Case-insensitive substring match in either direction.
pub fn loosely_matches(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// The free-text query used by the search fallback.
pub fn search_query(track: &CuratedTrack) -> String {
    format!(
        "track:\"{}\" artist:\"{}\" album:\"{}\"",
        track.title, track.album_artist, track.album_name
    )
}

/// Resolve every track concurrently. Output order and length match `tracks`.
pub async fn resolve_all(client: &SpotifyClient, tracks: &[CuratedTrack]) -> Vec<Resolution> {
    let results = join_all(tracks.iter().map(|track| resolve_track(client, track))).await;

    let resolutions: Vec<Resolution> = results
        .into_iter()
        .map(|result| match result {
            Ok(uri) => Resolution::Resolved(uri),
            Err(unresolved) => {
                warn!("{unresolved}");
                Resolution::Unresolved
            }
        })
        .collect();

    let summary = ResolutionSummary::of(&resolutions);
    info!(
        "Resolved {} of {} tracks ({} unresolved)",
        summary.resolved,
        tracks.len(),
        summary.unresolved
    );
    resolutions
}

/// Resolve a single track, album listing first, then search.
pub async fn resolve_track(
    client: &SpotifyClient,
    track: &CuratedTrack,
) -> std::result::Result<String, TrackUnresolved> {
    if let Some(album_id) = track.album_remote_url.as_deref().and_then(album_id_from_url) {
        match from_album(client, album_id, track).await {
            Ok(Some(uri)) => {
                debug!("'{}' found in album {album_id}", track.title);
                return Ok(uri);
            }
            Ok(None) => debug!("'{}' not listed in album {album_id}; searching", track.title),
            Err(e) => debug!("Album {album_id} unavailable ({e}); searching"),
        }
    }

    let unresolved = |reason: String| TrackUnresolved {
        title: track.title.clone(),
        artist: track.album_artist.clone(),
        reason,
    };

    let results = client
        .search_tracks(&search_query(track), SEARCH_LIMIT)
        .await
        .map_err(|e| unresolved(format!("search failed: {e}")))?;

    pick_search_result(&results, &track.album_name)
        .map(|hit| {
            debug!("'{}' found via search as '{}'", track.title, hit.name);
            hit.uri.clone()
        })
        .ok_or_else(|| unresolved("no search results".to_string()))
}

async fn from_album(client: &SpotifyClient, album_id: &str, track: &CuratedTrack) -> Result<Option<String>> {
    let listing = client.album_tracks(album_id).await?;
    Ok(listing
        .into_iter()
        .find(|remote| loosely_matches(&remote.name, &track.title))
        .map(|remote| remote.uri))
}

/// Prefer a result from the expected album, otherwise the top-ranked one.
fn pick_search_result<'a>(results: &'a [RemoteTrack], album_name: &str) -> Option<&'a RemoteTrack> {
    results
        .iter()
        .find(|hit| {
            hit.album
                .as_ref()
                .is_some_and(|album| loosely_matches(&album.name, album_name))
        })
        .or_else(|| results.first())
}
