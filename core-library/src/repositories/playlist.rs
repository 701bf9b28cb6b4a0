//! Playlist repository trait and implementation

use bridge_traits::platform::PlatformSendSync;
use bridge_traits::HttpMethod;

use crate::error::{LibraryError, Result};
use crate::models::{Playlist, TrackId};
use crate::repositories::api::{ensure_success, ApiClient};

/// Playlist repository interface
///
/// Playlists are keyed by name. Saving under an existing name replaces it.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlaylistRepository: PlatformSendSync {
    /// List all saved playlists
    async fn list(&self) -> Result<Vec<Playlist>>;

    /// Create or replace a playlist by name
    ///
    /// # Errors
    /// Returns error if:
    /// - The server rejects the payload (e.g. missing name)
    /// - The request fails
    async fn save(&self, playlist: &Playlist) -> Result<()>;

    /// Delete a playlist by name
    ///
    /// # Returns
    /// - `Ok(true)` if the playlist was deleted
    /// - `Ok(false)` if it did not exist
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Find a playlist by name
    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        let name = name.trim();
        Ok(self.list().await?.into_iter().find(|p| p.name == name))
    }

    /// Save the playlist under `new_name`, then delete the old entry.
    ///
    /// # Errors
    /// - `NotFound` if `old_name` does not exist
    /// - `InvalidInput` if `new_name` is blank
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<Playlist> {
        let existing = self.find_by_name(old_name).await?.ok_or_else(|| not_found(old_name))?;
        let renamed = Playlist::new(new_name, existing.tracks.clone())?;
        if renamed.name == existing.name {
            return Ok(existing);
        }
        self.save(&renamed).await?;
        self.delete(&existing.name).await?;
        Ok(renamed)
    }

    /// Append a track reference
    ///
    /// # Returns
    /// `Ok(false)` if the track was already in the playlist
    async fn add_track(&self, name: &str, track_id: &TrackId) -> Result<bool> {
        let mut playlist = self.find_by_name(name).await?.ok_or_else(|| not_found(name))?;
        if !playlist.add_track(track_id.clone()) {
            return Ok(false);
        }
        self.save(&playlist).await?;
        Ok(true)
    }

    /// Remove a track reference
    ///
    /// # Returns
    /// `Ok(false)` if the track was not in the playlist
    async fn remove_track(&self, name: &str, track_id: &TrackId) -> Result<bool> {
        let mut playlist = self.find_by_name(name).await?.ok_or_else(|| not_found(name))?;
        if !playlist.remove_track(track_id) {
            return Ok(false);
        }
        self.save(&playlist).await?;
        Ok(true)
    }
}

fn not_found(name: &str) -> LibraryError {
    LibraryError::NotFound {
        entity_type: "Playlist".to_string(),
        id: name.to_string(),
    }
}

/// Playlists served at `<api>/playlists/`.
#[derive(Clone)]
pub struct HttpPlaylistRepository {
    api: ApiClient,
}

impl HttpPlaylistRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl PlaylistRepository for HttpPlaylistRepository {
    async fn list(&self) -> Result<Vec<Playlist>> {
        self.api.get_json("playlists/").await
    }

    async fn save(&self, playlist: &Playlist) -> Result<()> {
        let request = self
            .api
            .protect(self.api.request(HttpMethod::Post, "playlists/"))
            .json(playlist)?;
        let url = request.url.clone();
        let response = self.api.send(request).await?;
        ensure_success(&url, &response)?;
        tracing::info!(playlist = %playlist.name, tracks = playlist.tracks.len(), "Playlist saved");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = format!("playlists/?name={}", urlencoding::encode(name.trim()));
        let request = self.api.protect(self.api.request(HttpMethod::Delete, &path));
        let url = request.url.clone();
        let response = self.api.send(request).await?;
        if response.status == 404 {
            return Ok(false);
        }
        ensure_success(&url, &response)?;
        tracing::info!(playlist = %name, "Playlist deleted");
        Ok(true)
    }
}
