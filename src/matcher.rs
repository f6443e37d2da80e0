//! # Catalog Matching
//!
//! Picks candidate albums for a genre/mood selection with a cascading
//! fallback, so the playlist assembler always has material to work with even
//! when the selection matches almost nothing.
//!
//! ## Tiers
//!
//! 1. **Exact**: a requested genre *and* a requested mood
//! 2. **Genre**: a requested genre
//! 3. **Mood**: a requested mood
//! 4. **Popular**: the [`MatchConfig::fallback_size`] most popular albums
//!    (lowest `popularity`; ties keep catalog order)
//!
//! A tier only runs while fewer than [`MatchConfig::min_albums`] albums have
//! been collected. Each tier is evaluated in full and then appended minus the
//! albums already present, compared by `rank`.
//!
//! ```
//! use soundscape::catalog::Catalog;
//! use soundscape::matcher::{CatalogMatcher, Selection};
//!
//! let (catalog, _) = Catalog::from_json(r#"[
//!     {"rank": 1, "name": "Kind Of Blue", "artist": "Miles Davis",
//!      "genres": ["Jazz"], "moods": ["Chill"], "top_tracks": ["So What"]}
//! ]"#)?;
//! let selection = Selection::new(["Jazz"], ["Chill"]);
//! let matched = CatalogMatcher::default().match_albums(&catalog, &selection)?;
//! assert_eq!(matched.len(), 1);
//! # Ok::<(), soundscape::Error>(())
//! ```

use crate::catalog::{Album, Catalog};
use crate::error::{Error, Result};
use log::{debug, info};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Matching thresholds
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Stop relaxing once this many albums are collected
    pub min_albums: usize,
    /// How many catalog-order albums the popularity tier offers
    pub fallback_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_albums: 5,
            fallback_size: 10,
        }
    }
}

/// The user's taste filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub genres: BTreeSet<String>,
    pub moods: BTreeSet<String>,
}

impl Selection {
    pub fn new<G, M>(genres: G, moods: M) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            genres: genres.into_iter().map(Into::into).collect(),
            moods: moods.into_iter().map(Into::into).collect(),
        }
    }
}

/// Relaxation level that admitted an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Genre,
    Mood,
    Popular,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "genre + mood",
            Self::Genre => "genre",
            Self::Mood => "mood",
            Self::Popular => "popular pick",
        })
    }
}

/// An album chosen by the matcher, with the tier that chose it.
#[derive(Debug, Clone, Copy)]
pub struct MatchedAlbum<'a> {
    pub album: &'a Album,
    pub tier: MatchTier,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogMatcher {
    config: MatchConfig,
}

impl CatalogMatcher {
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Select candidate albums for `selection`, most relevant first.
    ///
    /// # Errors
    ///
    /// [`Error::MatchingExhausted`] when no tier yields anything, which only
    /// happens for an empty catalog.
    pub fn match_albums<'a>(
        &self,
        catalog: &'a Catalog,
        selection: &Selection,
    ) -> Result<Vec<MatchedAlbum<'a>>> {
        let albums = catalog.albums();
        let mut matched: Vec<MatchedAlbum<'a>> = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();

        for tier in [MatchTier::Exact, MatchTier::Genre, MatchTier::Mood, MatchTier::Popular] {
            if tier != MatchTier::Exact && matched.len() >= self.config.min_albums {
                break;
            }

            let candidates: Vec<&Album> = match tier {
                MatchTier::Exact => albums
                    .iter()
                    .filter(|a| a.has_any_genre(&selection.genres) && a.has_any_mood(&selection.moods))
                    .collect(),
                MatchTier::Genre => albums
                    .iter()
                    .filter(|a| a.has_any_genre(&selection.genres))
                    .collect(),
                MatchTier::Mood => albums
                    .iter()
                    .filter(|a| a.has_any_mood(&selection.moods))
                    .collect(),
                MatchTier::Popular => {
                    let mut by_popularity: Vec<&Album> = albums.iter().collect();
                    // stable, so equal popularity keeps catalog order
                    by_popularity.sort_by_key(|a| a.popularity);
                    by_popularity.truncate(self.config.fallback_size);
                    by_popularity
                }
            };

            let before = matched.len();
            matched.extend(
                candidates
                    .into_iter()
                    .filter(|album| seen.insert(album.rank))
                    .map(|album| MatchedAlbum { album, tier }),
            );
            debug!("Tier '{tier}' added {} albums", matched.len() - before);
        }

        if matched.is_empty() {
            return Err(Error::MatchingExhausted);
        }

        info!(
            "Matched {} albums for genres {:?} / moods {:?}",
            matched.len(),
            selection.genres,
            selection.moods
        );
        Ok(matched)
    }
}

/// Convenience wrapper using the default thresholds.
pub fn match_albums<'a>(catalog: &'a Catalog, selection: &Selection) -> Result<Vec<MatchedAlbum<'a>>> {
    CatalogMatcher::default().match_albums(catalog, selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(rank: u32, genres: &[&str], moods: &[&str]) -> Album {
        Album {
            rank,
            name: format!("Album {rank}"),
            artist: format!("Artist {rank}"),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            moods: moods.iter().map(|s| s.to_string()).collect(),
            popularity: rank,
            top_tracks: vec![format!("Track {rank}")],
            local_image_path: None,
            remote_url: None,
        }
    }

    fn ranks(matched: &[MatchedAlbum<'_>]) -> Vec<u32> {
        matched.iter().map(|m| m.album.rank).collect()
    }

    #[test]
    fn test_exact_tier_alone_when_enough() {
        let catalog = Catalog::new(
            (1..=7)
                .map(|r| album(r, &["Jazz"], &["Chill"]))
                .chain([album(8, &["Jazz"], &["Dark"]), album(9, &["Rock"], &["Chill"])])
                .collect(),
        );
        let selection = Selection::new(["Jazz"], ["Chill"]);

        let matched = match_albums(&catalog, &selection).unwrap();
        assert_eq!(ranks(&matched), vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(matched.iter().all(|m| m.tier == MatchTier::Exact));
    }

    #[test]
    fn test_cascade_order_and_tiers() {
        let catalog = Catalog::new(vec![
            album(1, &["Rock"], &["Dark"]),
            album(2, &["Jazz"], &["Dark"]),
            album(3, &["Pop"], &["Chill"]),
            album(4, &["Jazz"], &["Chill"]),
            album(5, &["Metal"], &["Angry"]),
            album(6, &["Folk"], &["Calm"]),
        ]);
        let selection = Selection::new(["Jazz"], ["Chill"]);

        let matched = match_albums(&catalog, &selection).unwrap();
        // exact 4, genre adds 2, mood adds 3, popular fills from catalog order
        assert_eq!(ranks(&matched), vec![4, 2, 3, 1, 5, 6]);
        let tiers: Vec<MatchTier> = matched.iter().map(|m| m.tier).collect();
        assert_eq!(
            tiers,
            vec![
                MatchTier::Exact,
                MatchTier::Genre,
                MatchTier::Mood,
                MatchTier::Popular,
                MatchTier::Popular,
                MatchTier::Popular,
            ]
        );
    }

    #[test]
    fn test_genre_tier_stops_cascade() {
        let mut albums: Vec<Album> = (1..=6).map(|r| album(r, &["Jazz"], &["Dark"])).collect();
        albums.push(album(7, &["Pop"], &["Chill"]));
        let catalog = Catalog::new(albums);

        let matched = match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"])).unwrap();
        // Genre tier is appended whole, even past the threshold; mood never runs
        assert_eq!(ranks(&matched), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_empty_selection_falls_back_to_popular() {
        let catalog = Catalog::new((1..=12).map(|r| album(r, &["Jazz"], &["Chill"])).collect());

        let matched = match_albums(&catalog, &Selection::default()).unwrap();
        assert_eq!(ranks(&matched), (1..=10).collect::<Vec<_>>());
        assert!(matched.iter().all(|m| m.tier == MatchTier::Popular));
    }

    #[test]
    fn test_empty_mood_skips_exact_tier() {
        let catalog = Catalog::new((1..=3).map(|r| album(r, &["Jazz"], &["Chill"])).collect());

        let matched = match_albums(&catalog, &Selection::new(["Jazz"], Vec::<String>::new())).unwrap();
        assert_eq!(matched[0].tier, MatchTier::Genre);
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_no_duplicate_ranks() {
        let catalog = Catalog::new(vec![
            album(1, &["Jazz"], &["Chill"]),
            album(2, &["Jazz"], &["Dark"]),
            album(3, &["Rock"], &["Chill"]),
        ]);

        let matched = match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"])).unwrap();
        let unique: HashSet<u32> = matched.iter().map(|m| m.album.rank).collect();
        assert_eq!(unique.len(), matched.len());
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_same_name_different_rank_both_kept() {
        let mut twin = album(2, &["Jazz"], &["Chill"]);
        twin.name = "Album 1".to_string();
        let catalog = Catalog::new(vec![album(1, &["Jazz"], &["Chill"]), twin]);

        let matched = match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"])).unwrap();
        assert_eq!(ranks(&matched), vec![1, 2]);
    }

    #[test]
    fn test_empty_catalog_is_exhausted() {
        let catalog = Catalog::default();
        let result = match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"]));
        assert!(matches!(result, Err(Error::MatchingExhausted)));
    }

    #[test]
    fn test_popular_tier_orders_by_popularity() {
        let mut albums: Vec<Album> = (1..=3).map(|r| album(r, &["Rock"], &["Dark"])).collect();
        albums[0].popularity = 3;
        albums[1].popularity = 2;
        albums[2].popularity = 1;
        let catalog = Catalog::new(albums);
        let matcher = CatalogMatcher::new(MatchConfig { min_albums: 5, fallback_size: 2 });

        let matched = matcher.match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"])).unwrap();
        assert_eq!(ranks(&matched), vec![3, 2]);
    }

    #[test]
    fn test_custom_thresholds() {
        let catalog = Catalog::new((1..=8).map(|r| album(r, &["Rock"], &["Dark"])).collect());
        let matcher = CatalogMatcher::new(MatchConfig { min_albums: 2, fallback_size: 3 });

        let matched = matcher.match_albums(&catalog, &Selection::new(["Jazz"], ["Chill"])).unwrap();
        assert_eq!(ranks(&matched), vec![1, 2, 3]);
    }
}
