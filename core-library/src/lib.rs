//! # Library Management Module
//!
//! The track catalog and saved playlists, as served by the remote API.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models: [`Track`](models::Track), [`TrackId`](models::TrackId),
//!   [`Playlist`](models::Playlist)
//! - Repository traits with HTTP implementations for the catalog and playlists
//! - In-memory queries: filtering, artist/album facets, and playlist
//!   resolution that skips references missing from the catalog

pub mod error;
pub mod models;
pub mod query;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{Playlist, Track, TrackId};
pub use query::{resolve_playlist, LibraryFacets, ResolvedPlaylist, TrackFilter};
pub use repositories::{
    ApiClient, HttpPlaylistRepository, HttpTrackCatalog, PlaylistRepository, TrackCatalog,
};
