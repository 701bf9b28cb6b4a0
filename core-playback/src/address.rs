//! Media address resolution.
//!
//! Catalog urls come in several routed shapes (`/api/music_stream/a.mp3`,
//! `music_stream/a.mp3`, `/a.mp3`, ...). The resolver reduces them to the
//! bare relative path and builds `<origin>/<prefix>/<encoded path>`, where
//! the path is encoded as one segment with `encodeURIComponent` rules.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};

/// Builds fetchable media addresses from catalog locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAddressResolver {
    origin: String,
    prefix: String,
    /// Sorted longest first so overlapping prefixes resolve the same way
    /// whatever order they were configured in.
    redundant_prefixes: Vec<String>,
}

impl MediaAddressResolver {
    pub fn new(
        origin: impl AsRef<str>,
        prefix: impl AsRef<str>,
        redundant_prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut redundant_prefixes: Vec<String> = redundant_prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        redundant_prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        redundant_prefixes.dedup();

        Self {
            origin: origin.as_ref().trim().trim_end_matches('/').to_string(),
            prefix: prefix.as_ref().trim().trim_matches('/').to_string(),
            redundant_prefixes,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(
            &config.media_origin,
            &config.media_prefix,
            config.redundant_prefixes.iter().cloned(),
        )
    }

    /// Strip at most one redundant routing prefix, then any leading
    /// slashes it leaves behind (`/api//a.mp3` -> `a.mp3`).
    pub fn relative_path<'a>(&self, url: &'a str) -> &'a str {
        let url = url.trim();
        self.redundant_prefixes
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix.as_str()))
            .unwrap_or(url)
            .trim_start_matches('/')
    }

    /// Resolve a catalog locator into the address handed to the media element.
    pub fn resolve(&self, url: &str) -> Result<String> {
        let relative = self.relative_path(url);
        if relative.is_empty() {
            return Err(PlaybackError::InvalidTrackUrl(url.to_string()));
        }

        let encoded = encode_component(relative);
        if self.prefix.is_empty() {
            Ok(format!("{}/{}", self.origin, encoded))
        } else {
            Ok(format!("{}/{}/{}", self.origin, self.prefix, encoded))
        }
    }
}

impl Default for MediaAddressResolver {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

/// Percent-encode with the `encodeURIComponent` unreserved set.
///
/// `urlencoding` leaves only `A-Z a-z 0-9 - _ . ~` alone; browsers also
/// leave `! ' ( ) *` unescaped, and the media server expects that form.
pub fn encode_component(raw: &str) -> String {
    let encoded = urlencoding::encode(raw);
    if !encoded.contains('%') {
        return encoded.into_owned();
    }
    encoded
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: &[&str] = &[
        "Artist/Album/01 Intro.mp3",
        "Café del Mar/Vol. 1/02 (Remix)!.flac",
        "loose-file.ogg",
    ];

    #[test]
    fn test_resolves_bare_path() {
        let resolver = MediaAddressResolver::default();
        assert_eq!(
            resolver.resolve("Artist/Album/01 Intro.mp3").unwrap(),
            "http://127.0.0.1:8000/media/Artist%2FAlbum%2F01%20Intro.mp3"
        );
    }

    #[test]
    fn test_prefixed_variants_resolve_identically() {
        let resolver = MediaAddressResolver::default();
        for path in PATHS {
            let bare = resolver.resolve(path).unwrap();
            for prefix in ["/api/music_stream/", "/api/", "music_stream/", "/"] {
                let prefixed = format!("{}{}", prefix, path);
                assert_eq!(resolver.resolve(&prefixed).unwrap(), bare, "{}", prefixed);
            }
        }
    }

    #[test]
    fn test_relative_path_is_idempotent() {
        let resolver = MediaAddressResolver::default();
        for path in PATHS {
            for prefix in ["", "/api/music_stream/", "/api/", "music_stream/", "/"] {
                let url = format!("{}{}", prefix, path);
                let once = resolver.relative_path(&url);
                assert_eq!(resolver.relative_path(once), once);
                assert_eq!(resolver.resolve(once).unwrap(), resolver.resolve(&url).unwrap());
            }
        }
    }

    #[test]
    fn test_doubled_slash_after_prefix_collapses() {
        let resolver = MediaAddressResolver::default();
        for url in ["/api//x.mp3", "music_stream//x.mp3", "//x.mp3"] {
            assert_eq!(resolver.relative_path(url), "x.mp3", "{}", url);
            assert_eq!(
                resolver.resolve(url).unwrap(),
                "http://127.0.0.1:8000/media/x.mp3"
            );
            let once = resolver.relative_path(url);
            assert_eq!(resolver.resolve(once).unwrap(), resolver.resolve(url).unwrap());
        }
    }

    #[test]
    fn test_prefix_order_does_not_matter() {
        let forward = MediaAddressResolver::new("http://h", "media", ["/", "/api/", "/api/music_stream/"]);
        let reverse = MediaAddressResolver::new("http://h", "media", ["/api/music_stream/", "/api/", "/"]);
        let url = "/api/music_stream/a b.mp3";
        assert_eq!(forward.resolve(url).unwrap(), reverse.resolve(url).unwrap());
        assert_eq!(forward.resolve(url).unwrap(), "http://h/media/a%20b.mp3");
    }

    #[test]
    fn test_encoding_matches_encode_uri_component() {
        assert_eq!(encode_component("it's (live)!*~"), "it's%20(live)!*~");
        assert_eq!(encode_component("a/b?c#d&e"), "a%2Fb%3Fc%23d%26e");
        assert_eq!(encode_component("è"), "%C3%A8");
    }

    #[test]
    fn test_origin_and_prefix_slashes_are_normalized() {
        let resolver = MediaAddressResolver::new("http://host:8000/", "/media/", Vec::<String>::new());
        assert_eq!(resolver.resolve("x.mp3").unwrap(), "http://host:8000/media/x.mp3");

        let no_prefix = MediaAddressResolver::new("http://host", "", Vec::<String>::new());
        assert_eq!(no_prefix.resolve("x.mp3").unwrap(), "http://host/x.mp3");
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let resolver = MediaAddressResolver::default();
        assert!(matches!(
            resolver.resolve("/api/"),
            Err(PlaybackError::InvalidTrackUrl(_))
        ));
        assert!(resolver.resolve("   ").is_err());
    }
}
