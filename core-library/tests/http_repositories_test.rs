//! Repository behaviour against a mocked HTTP bridge.

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse, StaticCsrfToken};
use bytes::Bytes;
use core_library::{
    ApiClient, HttpPlaylistRepository, HttpTrackCatalog, LibraryError, Playlist,
    PlaylistRepository, TrackCatalog, TrackId,
};
use mockall::predicate::function;
use mockall::Sequence;
use std::collections::HashMap;
use std::sync::Arc;

mockall::mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

fn api(http: MockHttp) -> ApiClient {
    ApiClient::new(Arc::new(http), "/api/")
        .with_csrf(Arc::new(StaticCsrfToken("tok".into())), "X-CSRFToken")
}

#[tokio::test]
async fn fetch_tracks_decodes_catalog() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .with(function(|req: &HttpRequest| {
            req.method == HttpMethod::Get
                && req.url == "/api/tracks/"
                && !req.headers.contains_key("X-CSRFToken")
        }))
        .times(1)
        .returning(|_| {
            Ok(response(
                200,
                r#"[{"id":"a.mp3","title":"A","artist":"X","album":"Y","url":"music_stream/a.mp3"}]"#,
            ))
        });

    let catalog = HttpTrackCatalog::new(api(http));
    let tracks = catalog.fetch_tracks().await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, TrackId::from("a.mp3"));
}

#[tokio::test]
async fn fetch_tracks_reports_server_errors() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Ok(response(500, r#"{"error":"MUSIC_ROOT missing"}"#)));

    let catalog = HttpTrackCatalog::new(api(http));
    let err = catalog.fetch_tracks().await.unwrap_err();
    assert!(matches!(err, LibraryError::Api { status: 500, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn fetch_facets_sorts_server_lists() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .with(function(|req: &HttpRequest| req.url == "/api/filters/"))
        .returning(|_| Ok(response(200, r#"{"artists":["b","a","a"],"albums":["z"]}"#)));

    let facets = HttpTrackCatalog::new(api(http)).fetch_facets().await.unwrap();
    assert_eq!(facets.artists, vec!["a", "b"]);
    assert_eq!(facets.albums, vec!["z"]);
}

#[tokio::test]
async fn save_posts_json_with_csrf_header() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .with(function(|req: &HttpRequest| {
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_deref().unwrap_or_default()).unwrap_or_default();
            req.method == HttpMethod::Post
                && req.url == "/api/playlists/"
                && req.headers.get("X-CSRFToken").map(String::as_str) == Some("tok")
                && body["name"] == "Road"
                && body["tracks"] == serde_json::json!(["1", "2"])
        }))
        .times(1)
        .returning(|_| Ok(response(200, r#"{"status":"ok"}"#)));

    let repo = HttpPlaylistRepository::new(api(http));
    let playlist = Playlist::new("Road", vec![TrackId::from(1u64), TrackId::from(2u64)]).unwrap();
    repo.save(&playlist).await.unwrap();
}

#[tokio::test]
async fn delete_encodes_name_and_maps_missing_to_false() {
    let mut http = MockHttp::new();
    let mut seq = Sequence::new();
    http.expect_execute()
        .with(function(|req: &HttpRequest| {
            req.method == HttpMethod::Delete && req.url == "/api/playlists/?name=Road%20Trip"
        }))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(response(200, "{}")));
    http.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(response(404, r#"{"status":"not found"}"#)));

    let repo = HttpPlaylistRepository::new(api(http));
    assert!(repo.delete("Road Trip").await.unwrap());
    assert!(!repo.delete("Road Trip").await.unwrap());
}

#[tokio::test]
async fn rename_saves_new_then_deletes_old() {
    let mut http = MockHttp::new();
    let mut seq = Sequence::new();
    http.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(response(200, r#"[{"name":"Old","tracks":["a"]}]"#)));
    http.expect_execute()
        .with(function(|req: &HttpRequest| req.method == HttpMethod::Post))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(response(200, "{}")));
    http.expect_execute()
        .with(function(|req: &HttpRequest| {
            req.method == HttpMethod::Delete && req.url.ends_with("?name=Old")
        }))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(response(200, "{}")));

    let repo = HttpPlaylistRepository::new(api(http));
    let renamed = repo.rename("Old", " New ").await.unwrap();
    assert_eq!(renamed.name, "New");
    assert_eq!(renamed.tracks, vec![TrackId::from("a")]);
}

#[tokio::test]
async fn add_track_skips_duplicates_without_writing() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .with(function(|req: &HttpRequest| req.method == HttpMethod::Get))
        .times(1)
        .returning(|_| Ok(response(200, r#"[{"name":"Mix","tracks":[5]}]"#)));

    let repo = HttpPlaylistRepository::new(api(http));
    assert!(!repo.add_track("Mix", &TrackId::from(5u64)).await.unwrap());
}

#[tokio::test]
async fn remove_track_from_missing_playlist_is_not_found() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|_| Ok(response(200, "[]")));

    let repo = HttpPlaylistRepository::new(api(http));
    let err = repo
        .remove_track("Ghost", &TrackId::from(1u64))
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));
}
