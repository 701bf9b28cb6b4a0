//! Domain models for the music library
//!
//! Records as served by the catalog API. They are created from API
//! responses and never mutated afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{LibraryError, Result};

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track.
///
/// The catalog uses the track's relative file path as its id; older
/// playlist files may hold numeric ids, so both JSON strings and integers
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for TrackId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => TrackId(s),
            RawId::Unsigned(n) => TrackId(n.to_string()),
            RawId::Signed(n) => TrackId(n.to_string()),
        })
    }
}

// =============================================================================
// Track
// =============================================================================

/// A playable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Catalog-relative locator, possibly carrying routing prefixes
    pub url: String,
    /// Artwork shown by the cover visualizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            url: url.into(),
            cover: None,
        }
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    /// `"Title - Artist (Album)"`, shown in the now-playing display.
    pub fn now_playing_text(&self) -> String {
        format!("{} - {} ({})", self.title, self.artist, self.album)
    }

    /// `"3. Title - Artist"` for the entry at zero-based `index` in a list.
    pub fn queue_label(&self, index: usize) -> String {
        format!("{}. {} - {}", index + 1, self.title, self.artist)
    }
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, ordered list of track references.
///
/// References are resolved against the catalog at open time; ids that no
/// longer exist are dropped then, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<TrackId>,
}

impl Playlist {
    /// Create a playlist, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidInput`] when the name is blank.
    pub fn new(name: impl AsRef<str>, tracks: Vec<TrackId>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "Playlist name cannot be empty".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            tracks,
        })
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.tracks.contains(id)
    }

    /// Append a reference unless it is already present. Returns whether it was added.
    pub fn add_track(&mut self, id: TrackId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.tracks.push(id);
        true
    }

    /// Remove every occurrence of `id`. Returns whether anything was removed.
    pub fn remove_track(&mut self, id: &TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t != id);
        self.tracks.len() != before
    }
}
