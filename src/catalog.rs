//! # Album Catalog
//!
//! Read-only, in-memory album dataset loaded once at startup from a JSON file.
//!
//! ## File Format
//!
//! The catalog is a JSON array of album records:
//!
//! ```json
//! [
//!   {
//!     "rank": 1,
//!     "name": "Kind Of Blue (Legacy Edition)",
//!     "artist": "Miles Davis",
//!     "genres": ["Jazz", "Modal Jazz"],
//!     "moods": ["Chill", "Smooth"],
//!     "top_tracks": ["So What", "Blue in Green"],
//!     "local_image": "/album_images/001_kind_of_blue.jpg",
//!     "spotify_url": "https://open.spotify.com/album/1weenld61qoidwYuZ1GESA"
//!   }
//! ]
//! ```
//!
//! ## Validation
//!
//! Records are checked while loading. A record without a `rank`, `name` or
//! `artist`, or one reusing an earlier `rank`, is quarantined: it is skipped,
//! logged, and listed in the [`LoadReport`]. Blank tags and blank track titles
//! are dropped from otherwise valid records.

use crate::error::{Error, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// An album in the curated catalog. `rank` is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub rank: u32,
    pub name: String,
    pub artist: String,
    pub genres: Vec<String>,
    pub moods: Vec<String>,
    /// Lower is more popular. Defaults to the 1-based position in the file.
    pub popularity: u32,
    /// Track titles, most representative first.
    pub top_tracks: Vec<String>,
    pub local_image_path: Option<String>,
    pub remote_url: Option<String>,
}

impl Album {
    /// True if any of this album's genres is in `wanted`.
    pub fn has_any_genre(&self, wanted: &BTreeSet<String>) -> bool {
        self.genres.iter().any(|g| wanted.contains(g))
    }

    /// True if any of this album's moods is in `wanted`.
    pub fn has_any_mood(&self, wanted: &BTreeSet<String>) -> bool {
        self.moods.iter().any(|m| wanted.contains(m))
    }
}

/// Album record exactly as it appears on disk, before validation.
#[derive(Debug, Deserialize)]
struct RawAlbum {
    rank: Option<u32>,
    name: Option<String>,
    artist: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    moods: Vec<String>,
    popularity: Option<u32>,
    #[serde(default)]
    top_tracks: Vec<String>,
    local_image: Option<String>,
    spotify_url: Option<String>,
}

/// A record rejected during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantined {
    /// Zero-based position in the source array
    pub index: usize,
    pub reason: String,
}

/// Outcome of loading a catalog file.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub quarantined: Vec<Quarantined>,
}

/// The in-memory album store. Album order is catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    albums: Vec<Album>,
}

impl Catalog {
    /// Build a catalog from already-validated albums.
    ///
    /// Later albums reusing a `rank` are dropped.
    pub fn new(albums: Vec<Album>) -> Self {
        let mut seen = HashSet::new();
        let albums = albums
            .into_iter()
            .filter(|album| seen.insert(album.rank))
            .collect();
        Self { albums }
    }

    /// Load and validate the catalog file at `path`.
    pub fn load(path: &Path) -> Result<(Self, LoadReport)> {
        info!("Loading album catalog from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a catalog from its JSON text.
    pub fn from_json(text: &str) -> Result<(Self, LoadReport)> {
        let values: Vec<serde_json::Value> = serde_json::from_str(text)
            .map_err(|e| Error::Catalog(format!("catalog must be a JSON array: {e}")))?;

        let mut report = LoadReport::default();
        let mut albums = Vec::with_capacity(values.len());
        let mut ranks = HashSet::new();

        for (index, value) in values.into_iter().enumerate() {
            let outcome = serde_json::from_value::<RawAlbum>(value)
                .map_err(|e| e.to_string())
                .and_then(|raw| validate(raw, index));

            match outcome {
                Ok(album) if !ranks.insert(album.rank) => {
                    quarantine(&mut report, index, format!("duplicate rank {}", album.rank));
                }
                Ok(album) => albums.push(album),
                Err(reason) => quarantine(&mut report, index, reason),
            }
        }

        info!(
            "Catalog ready: {} albums ({} quarantined)",
            albums.len(),
            report.quarantined.len()
        );
        Ok((Self { albums }, report))
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    /// Every genre tag in the catalog, sorted.
    pub fn all_genres(&self) -> Vec<String> {
        collect_tags(self.albums.iter().flat_map(|a| a.genres.iter()))
    }

    /// Every mood tag in the catalog, sorted.
    pub fn all_moods(&self) -> Vec<String> {
        collect_tags(self.albums.iter().flat_map(|a| a.moods.iter()))
    }
}

fn quarantine(report: &mut LoadReport, index: usize, reason: String) {
    warn!("Quarantining catalog record #{index}: {reason}");
    report.quarantined.push(Quarantined { index, reason });
}

fn validate(raw: RawAlbum, index: usize) -> std::result::Result<Album, String> {
    let rank = raw.rank.ok_or("missing rank")?;
    let name = non_blank(raw.name).ok_or("missing album name")?;
    let artist = non_blank(raw.artist).ok_or("missing artist")?;

    let top_tracks = clean_list(raw.top_tracks, false);
    if top_tracks.is_empty() {
        debug!("Album '{name}' has no top tracks; it will never contribute songs");
    }

    Ok(Album {
        rank,
        name,
        artist,
        genres: clean_list(raw.genres, true),
        moods: clean_list(raw.moods, true),
        popularity: raw.popularity.unwrap_or(index as u32 + 1),
        top_tracks,
        local_image_path: non_blank(raw.local_image),
        remote_url: non_blank(raw.spotify_url),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim entries, drop blanks, and optionally drop repeats (tags are sets).
fn clean_list(items: Vec<String>, dedup: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .filter(|item| !dedup || seen.insert(item.clone()))
        .collect()
}

fn collect_tags<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<String> {
    tags.cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "rank": 1,
            "name": "Kind Of Blue",
            "artist": "Miles Davis",
            "genres": ["Jazz", "Modal Jazz", "Jazz"],
            "moods": ["Chill", " "],
            "top_tracks": ["So What", "", "Blue in Green"],
            "local_image": "/img/kob.jpg",
            "spotify_url": "https://open.spotify.com/album/1weenld61qoidwYuZ1GESA"
        },
        { "rank": 2, "name": "Mama's Gun", "artist": "Erykah Badu",
          "genres": ["Soul"], "moods": ["Smooth"], "top_tracks": ["Bag Lady"] },
        { "rank": 2, "name": "Duplicate", "artist": "Someone" },
        { "name": "No Rank", "artist": "Someone" },
        { "rank": 5, "name": "   ", "artist": "Blank Name" },
        { "rank": "six", "name": "Bad Type", "artist": "X" }
    ]"#;

    #[test]
    fn test_load_quarantines_malformed_records() {
        let (catalog, report) = Catalog::from_json(SAMPLE).unwrap();

        assert_eq!(catalog.len(), 2);
        let indexes: Vec<usize> = report.quarantined.iter().map(|q| q.index).collect();
        assert_eq!(indexes, vec![2, 3, 4, 5]);
        assert!(report.quarantined[0].reason.contains("duplicate rank"));
        assert!(report.quarantined[1].reason.contains("rank"));
        assert!(report.quarantined[2].reason.contains("name"));
    }

    #[test]
    fn test_load_cleans_tags_and_tracks() {
        let (catalog, _) = Catalog::from_json(SAMPLE).unwrap();
        let album = &catalog.albums()[0];

        assert_eq!(album.genres, vec!["Jazz", "Modal Jazz"]);
        assert_eq!(album.moods, vec!["Chill"]);
        assert_eq!(album.top_tracks, vec!["So What", "Blue in Green"]);
        assert_eq!(album.popularity, 1);
        assert_eq!(album.local_image_path.as_deref(), Some("/img/kob.jpg"));
        assert!(album.remote_url.is_some());

        let second = &catalog.albums()[1];
        assert_eq!(second.popularity, 2);
        assert_eq!(second.remote_url, None);
    }

    #[test]
    fn test_non_array_is_error() {
        assert!(matches!(
            Catalog::from_json(r#"{"rank": 1}"#),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_tag_discovery_sorted_and_unique() {
        let (catalog, _) = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.all_genres(), vec!["Jazz", "Modal Jazz", "Soul"]);
        assert_eq!(catalog.all_moods(), vec!["Chill", "Smooth"]);
    }

    #[test]
    fn test_new_drops_repeated_ranks() {
        let album = Album {
            rank: 7,
            name: "A".to_string(),
            artist: "B".to_string(),
            genres: vec![],
            moods: vec![],
            popularity: 1,
            top_tracks: vec![],
            local_image_path: None,
            remote_url: None,
        };
        let twin = Album { name: "Other".to_string(), ..album.clone() };

        let catalog = Catalog::new(vec![album, twin]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.albums()[0].name, "A");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/definitely/not/here/catalog.json"));
        assert!(matches!(result, Err(Error::Catalog(_))));
    }
}
