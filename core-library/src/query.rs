//! Catalog query helpers
//!
//! Filtering, facet extraction, and playlist resolution all run on the
//! in-memory catalog; the API only serves the full track list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::models::{Playlist, Track, TrackId};

/// Selector value meaning "no constraint" for artist/album inputs.
pub const ANY: &str = "all";

/// Filter options for the track list.
///
/// All active predicates must hold (logical AND). `None` means the field
/// is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFilter {
    /// Exact artist match
    pub artist: Option<String>,
    /// Exact album match
    pub album: Option<String>,
    /// Lowercased, trimmed substring matched against title, artist, album
    pub search: Option<String>,
}

impl TrackFilter {
    /// Build a filter from raw selector/search inputs.
    ///
    /// Empty selectors and the [`ANY`] sentinel become wildcards; the search
    /// term is trimmed and lowercased, and dropped if blank.
    pub fn from_inputs(artist: &str, album: &str, search: &str) -> Self {
        fn selector(value: &str) -> Option<String> {
            if value.is_empty() || value == ANY {
                None
            } else {
                Some(value.to_string())
            }
        }

        let search = search.trim().to_lowercase();
        Self {
            artist: selector(artist),
            album: selector(album),
            search: (!search.is_empty()).then_some(search),
        }
    }

    pub fn is_active(&self) -> bool {
        self.artist.is_some() || self.album.is_some() || self.search.is_some()
    }

    pub fn matches(&self, track: &Track) -> bool {
        if let Some(artist) = &self.artist {
            if &track.artist != artist {
                return false;
            }
        }
        if let Some(album) = &self.album {
            if &track.album != album {
                return false;
            }
        }
        match &self.search {
            Some(term) => [&track.title, &track.artist, &track.album]
                .iter()
                .any(|field| field.to_lowercase().contains(term.as_str())),
            None => true,
        }
    }

    /// The ordered subsequence of `library` satisfying this filter.
    pub fn apply(&self, library: &[Track]) -> Vec<Track> {
        library
            .iter()
            .filter(|track| self.matches(track))
            .cloned()
            .collect()
    }
}

/// Distinct artists and albums for filter selectors, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFacets {
    pub artists: Vec<String>,
    pub albums: Vec<String>,
}

impl LibraryFacets {
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let artists: BTreeSet<&str> = tracks.iter().map(|t| t.artist.as_str()).collect();
        let albums: BTreeSet<&str> = tracks.iter().map(|t| t.album.as_str()).collect();
        Self {
            artists: artists.into_iter().map(String::from).collect(),
            albums: albums.into_iter().map(String::from).collect(),
        }
    }
}

/// A playlist resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    pub name: String,
    pub tracks: Vec<Track>,
    /// References that no longer exist in the catalog
    pub dropped: Vec<TrackId>,
}

/// Resolve playlist references in order, silently skipping stale ids.
pub fn resolve_playlist(playlist: &Playlist, catalog: &[Track]) -> ResolvedPlaylist {
    let index: HashMap<&TrackId, &Track> = catalog.iter().map(|t| (&t.id, t)).collect();

    let mut tracks = Vec::with_capacity(playlist.tracks.len());
    let mut dropped = Vec::new();
    for id in &playlist.tracks {
        match index.get(id) {
            Some(track) => tracks.push((*track).clone()),
            None => dropped.push(id.clone()),
        }
    }

    if !dropped.is_empty() {
        tracing::debug!(
            playlist = %playlist.name,
            dropped = dropped.len(),
            "Skipped playlist entries missing from catalog"
        );
    }

    ResolvedPlaylist {
        name: playlist.name.clone(),
        tracks,
        dropped,
    }
}
