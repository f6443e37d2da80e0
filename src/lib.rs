//! Curated playlists from a fixed album catalog, published to Spotify.
//!
//! Core modules:
//! - [`catalog`] - Album catalog loading and validation
//! - [`matcher`] - Four-tier album matching for a genre/mood selection
//! - [`playlist`] - Round-robin playlist assembly
//! - [`session`] - OAuth 2.0 PKCE login state
//! - [`resolver`] - Curated track to Spotify URI resolution
//! - [`publisher`] - Playlist creation on the user's account
//!
//! ### Supporting Modules
//!
//! - [`spotify`] - Bearer-authenticated Web API client
//! - [`store`] - Durable key-value session storage
//! - [`config`] - Runtime configuration and data directory management
//! - [`error`] - Error types shared by every stage
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use soundscape::catalog::Catalog;
//! use soundscape::matcher::{match_albums, Selection};
//! use soundscape::playlist::assemble;
//!
//! let (catalog, _report) = Catalog::load("catalog.json".as_ref())?;
//! let selection = Selection::new(["Jazz"], ["Chill"]);
//! let matched = match_albums(&catalog, &selection)?;
//! let playlist = assemble(matched.iter().map(|m| m.album));
//! for track in &playlist {
//!     println!("{track}");
//! }
//! # Ok::<(), soundscape::Error>(())
//! ```
//!
//! ## Publishing
//!
//! Publishing needs a logged-in [`session::AuthSession`]. The login is split
//! in two so a browser redirect can happen in between:
//! [`session::AuthSession::begin_login`] returns the URL to open, and
//! [`session::AuthSession::complete_login`] consumes the code from the
//! redirect. With an access token, [`resolver::resolve_all`] maps the
//! playlist onto Spotify tracks and [`publisher::publish`] creates the
//! playlist.

pub mod catalog;
pub mod config;
pub mod error;
pub mod matcher;
pub mod playlist;
pub mod publisher;
pub mod resolver;
pub mod session;
pub mod spotify;
pub mod store;

pub use error::{Error, Result};
