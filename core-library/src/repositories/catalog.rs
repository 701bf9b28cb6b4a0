//! Track catalog repository

use bridge_traits::platform::PlatformSendSync;

use crate::error::Result;
use crate::models::Track;
use crate::query::LibraryFacets;
use crate::repositories::api::ApiClient;

/// Read access to the full track catalog.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TrackCatalog: PlatformSendSync {
    /// Fetch every track, in server order.
    ///
    /// # Errors
    /// Returns error if the request fails or the server answers non-2xx.
    async fn fetch_tracks(&self) -> Result<Vec<Track>>;

    /// Fetch the distinct artists and albums.
    ///
    /// The default derives them from [`fetch_tracks`](Self::fetch_tracks).
    async fn fetch_facets(&self) -> Result<LibraryFacets> {
        Ok(LibraryFacets::from_tracks(&self.fetch_tracks().await?))
    }
}

/// Catalog served at `<api>/tracks/` and `<api>/filters/`.
#[derive(Clone)]
pub struct HttpTrackCatalog {
    api: ApiClient,
}

impl HttpTrackCatalog {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl TrackCatalog for HttpTrackCatalog {
    async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        let tracks: Vec<Track> = self.api.get_json("tracks/").await?;
        tracing::info!(count = tracks.len(), "Fetched track catalog");
        Ok(tracks)
    }

    async fn fetch_facets(&self) -> Result<LibraryFacets> {
        let mut facets: LibraryFacets = self.api.get_json("filters/").await?;
        facets.artists.sort();
        facets.artists.dedup();
        facets.albums.sort();
        facets.albums.dedup();
        Ok(facets)
    }
}
