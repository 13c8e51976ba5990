//! Remote catalog access.
//!
//! The pipeline only needs two operations from the catalog: a keyword
//! search returning candidate hits, and a page fetch returning HTML.
//! [`RemoteCatalog`] is that seam; [`HttpCatalog`] implements it against
//! a Genius-style HTTP API through the rate-limited [`Gateway`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use cantiga_core::Candidate;

use crate::error::{ResolveError, ResolveResult};
use crate::gateway::Gateway;

/// The two catalog operations the pipeline consumes.
///
/// Implementations must be shareable across concurrent resolution
/// pipelines; all methods take `&self`.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Keyword search with a single free-text query.
    async fn search(&self, query: &str) -> ResolveResult<Vec<Candidate>>;

    /// Fetch a catalog page as HTML.
    async fn fetch_page(&self, url: &str) -> ResolveResult<String>;
}

// ---------------------------------------------------------------------------
// API response types (private -- the search endpoint nests JSON deeply)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: HitResult,
}

#[derive(Debug, Deserialize)]
struct HitResult {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    song_art_image_thumbnail_url: Option<String>,
    #[serde(default)]
    primary_artist: Option<HitArtist>,
}

#[derive(Debug, Deserialize)]
struct HitArtist {
    #[serde(default)]
    name: String,
}

impl HitResult {
    /// Map the wire shape onto the domain candidate. Hits with missing
    /// fields become invalid candidates and are dropped by the scorer.
    fn into_candidate(self) -> Candidate {
        Candidate {
            id: self.id.to_string(),
            title: self.title,
            url: self.url,
            thumbnail_url: self.song_art_image_thumbnail_url,
            primary_artist: self.primary_artist.map(|a| a.name).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Genius-style catalog client.
///
/// Searches go to `{base_url}/search?q=` with an optional bearer token;
/// page fetches are plain HTML GETs with rotated browser headers. Both
/// pass through the shared [`Gateway`].
#[derive(Debug)]
pub struct HttpCatalog {
    gateway: Arc<Gateway>,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalog {
    /// Create a catalog client over the shared gateway.
    ///
    /// A trailing slash on `base_url` is tolerated.
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, base_url: impl Into<String>, token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            gateway,
            base_url,
            token,
        }
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn search(&self, query: &str) -> ResolveResult<Vec<Candidate>> {
        let mut builder = self
            .gateway
            .get(&format!("{}/search", self.base_url))
            .query(&[("q", query)]);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = self
            .gateway
            .execute(builder)
            .await?
            .error_for_status()
            .map_err(|e| ResolveError::Http {
                source_name: "catalog".to_string(),
                message: e.to_string(),
            })?;

        let parsed: SearchResponse =
            response.json().await.map_err(|e| ResolveError::Parse {
                source_name: "catalog".to_string(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .response
            .hits
            .into_iter()
            .map(|hit| hit.result.into_candidate())
            .collect())
    }

    async fn fetch_page(&self, url: &str) -> ResolveResult<String> {
        self.gateway.fetch_html(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::{RateGate, ThrottlePolicy};
    use tokio::time::Duration;

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "response": {
                "hits": [
                    {
                        "result": {
                            "id": 57412,
                            "title": "Midnight City",
                            "url": "https://example.com/m83-midnight-city-lyrics",
                            "song_art_image_thumbnail_url": "https://example.com/thumb.jpg",
                            "primary_artist": {"name": "M83"}
                        }
                    }
                ]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response.hits.len(), 1);
        let hit = &parsed.response.hits[0].result;
        assert_eq!(hit.id, 57412);
        assert_eq!(hit.title, "Midnight City");
        assert_eq!(
            hit.primary_artist.as_ref().map(|a| a.name.as_str()),
            Some("M83")
        );
    }

    #[test]
    fn test_search_response_deserialize_empty() {
        let json = r#"{"response": {"hits": []}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.response.hits.is_empty());
    }

    #[test]
    fn test_search_response_deserialize_missing_hits() {
        let json = r#"{"response": {}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.response.hits.is_empty());
    }

    #[test]
    fn test_hit_maps_to_valid_candidate() {
        let json = r#"{
            "id": 1,
            "title": "Song",
            "url": "https://example.com/song-lyrics",
            "primary_artist": {"name": "Artist"}
        }"#;
        let hit: HitResult = serde_json::from_str(json).unwrap();
        let candidate = hit.into_candidate();
        assert!(candidate.is_valid());
        assert_eq!(candidate.id, "1");
        assert!(candidate.thumbnail_url.is_none());
    }

    #[test]
    fn test_hit_without_artist_maps_to_invalid_candidate() {
        let json = r#"{"id": 2, "title": "Song", "url": "https://example.com/x"}"#;
        let hit: HitResult = serde_json::from_str(json).unwrap();
        let candidate = hit.into_candidate();
        assert!(!candidate.is_valid());
        assert!(candidate.primary_artist.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = Arc::new(Gateway::new(
            RateGate::new(1, Duration::from_secs(1), ThrottlePolicy::FailFast),
            Duration::from_secs(15),
        ));
        let catalog = HttpCatalog::new(gateway, "https://api.example.com/", None);
        assert_eq!(catalog.base_url, "https://api.example.com");
    }
}
