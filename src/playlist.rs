//! # Playlist Assembly
//!
//! Turns matched albums into an ordered list of [`CuratedTrack`]s.
//!
//! Tracks are interleaved round-robin so no single album dominates the start
//! of the playlist: round `r` takes the `r`-th top track of every album, in
//! matched order, using at most [`PlaylistConfig::tracks_per_album`] tracks
//! per album. Interleaving stops at [`PlaylistConfig::max_songs`] or when a
//! round adds nothing. If the result is still shorter than
//! [`PlaylistConfig::min_songs`], a top-up pass walks each album again from
//! the round where interleaving stopped, past the per-album cap if needed.

use crate::catalog::Album;
use crate::matcher::Selection;
use log::{debug, info};
use std::fmt;

/// Size bounds for an assembled playlist
#[derive(Debug, Clone, Copy)]
pub struct PlaylistConfig {
    pub min_songs: usize,
    pub max_songs: usize,
    pub tracks_per_album: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            min_songs: 5,
            max_songs: 20,
            tracks_per_album: 4,
        }
    }
}

/// A track picked for the playlist, carrying its album's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedTrack {
    pub title: String,
    pub album_name: String,
    pub album_artist: String,
    pub album_image_path: Option<String>,
    pub album_remote_url: Option<String>,
}

impl CuratedTrack {
    fn from_album(album: &Album, title: &str) -> Self {
        Self {
            title: title.to_string(),
            album_name: album.name.clone(),
            album_artist: album.artist.clone(),
            album_image_path: album.local_image_path.clone(),
            album_remote_url: album.remote_url.clone(),
        }
    }
}

impl fmt::Display for CuratedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.album_artist, self.title, self.album_name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistAssembler {
    config: PlaylistConfig,
}

impl PlaylistAssembler {
    #[must_use]
    pub fn new(config: PlaylistConfig) -> Self {
        Self { config }
    }

    /// Assemble a playlist from albums in matched order.
    pub fn assemble<'a, I>(&self, albums: I) -> Vec<CuratedTrack>
    where
        I: IntoIterator<Item = &'a Album>,
    {
        let PlaylistConfig {
            min_songs,
            max_songs,
            tracks_per_album,
        } = self.config;

        let per_album: Vec<Vec<CuratedTrack>> = albums
            .into_iter()
            .filter(|album| !album.top_tracks.is_empty())
            .map(|album| {
                album
                    .top_tracks
                    .iter()
                    .map(|title| CuratedTrack::from_album(album, title))
                    .collect()
            })
            .collect();

        let mut playlist = Vec::new();
        let mut round = 0;

        'rounds: while playlist.len() < max_songs && round < tracks_per_album {
            let mut added = false;
            for tracks in &per_album {
                if let Some(track) = tracks.get(round) {
                    playlist.push(track.clone());
                    added = true;
                    if playlist.len() >= max_songs {
                        break 'rounds;
                    }
                }
            }
            if !added {
                break;
            }
            round += 1;
        }
        debug!("Interleaved {} tracks over {round} rounds", playlist.len());

        if playlist.len() < min_songs {
            'top_up: for tracks in &per_album {
                for track in tracks.iter().skip(round) {
                    if playlist.len() >= min_songs {
                        break 'top_up;
                    }
                    playlist.push(track.clone());
                }
            }
            debug!("Topped up to {} tracks", playlist.len());
        }

        info!(
            "Assembled {} tracks from {} albums",
            playlist.len(),
            per_album.len()
        );
        playlist
    }
}

/// Assemble with the default 5..=20 bounds.
pub fn assemble<'a, I>(albums: I) -> Vec<CuratedTrack>
where
    I: IntoIterator<Item = &'a Album>,
{
    PlaylistAssembler::default().assemble(albums)
}

/// The "why these songs?" blurb shown with a playlist.
pub fn explain(selection: &Selection) -> String {
    let join = |tags: &std::collections::BTreeSet<String>| {
        if tags.is_empty() {
            "anything goes".to_string()
        } else {
            tags.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "Based on your favorite genres ({}) and your vibe ({}), here is a playlist curated for you.",
        join(&selection.genres),
        join(&selection.moods)
    )
}
