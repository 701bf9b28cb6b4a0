//! # Repository Pattern Implementation
//!
//! Repository traits for the remote catalog API, with HTTP implementations
//! built on the [`HttpClient`](bridge_traits::HttpClient) bridge.
//!
//! ## Available Repositories
//!
//! - `TrackCatalog` - the full track list and its artist/album facets
//! - `PlaylistRepository` - named playlists with create/replace, rename,
//!   delete, and per-track edits
//!
//! Both HTTP implementations share an [`ApiClient`], which owns the base
//! URL, the request timeout, and the anti-forgery header for writes.

pub mod api;
pub mod catalog;
pub mod playlist;

pub use api::ApiClient;
pub use catalog::{HttpTrackCatalog, TrackCatalog};
pub use playlist::{HttpPlaylistRepository, PlaylistRepository};
