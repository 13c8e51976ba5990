use serde::{Deserialize, Serialize};

/// Everything extracted from one song page.
///
/// Every field is independently optional: the page markup drifts over
/// time and a missing album or release date must not invalidate the
/// lyrics that were found. Constructed once per successful extraction
/// and returned to the caller as an immutable value; any caching is the
/// caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedContent {
    /// Cleaned lyric text, if a lyrics container was found.
    pub lyrics: Option<String>,
    /// Full-size cover art URL.
    pub cover_art_url: Option<String>,
    /// Song title as displayed on the page.
    pub song_title: Option<String>,
    /// Primary artist name as displayed on the page.
    pub artist_name: Option<String>,
    /// Album the song appears on.
    pub album_name: Option<String>,
    /// Release date, verbatim from the page (no date parsing).
    pub release_date: Option<String>,
    /// Featured artists credited on the page.
    pub featured_artists: Vec<String>,
    /// Producers credited on the page.
    pub producers: Vec<String>,
    /// Writers credited on the page.
    pub writers: Vec<String>,
}

impl ScrapedContent {
    /// True when no field was extracted at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lyrics.is_none()
            && self.cover_art_url.is_none()
            && self.song_title.is_none()
            && self.artist_name.is_none()
            && self.album_name.is_none()
            && self.release_date.is_none()
            && self.featured_artists.is_empty()
            && self.producers.is_empty()
            && self.writers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(ScrapedContent::default().is_empty());
    }

    #[test]
    fn test_single_field_is_not_empty() {
        let content = ScrapedContent {
            lyrics: Some("Hello".to_string()),
            ..ScrapedContent::default()
        };
        assert!(!content.is_empty());
    }

    #[test]
    fn test_round_trips_through_json() {
        let content = ScrapedContent {
            lyrics: Some("line one\nline two".to_string()),
            song_title: Some("Midnight City".to_string()),
            featured_artists: vec!["Dragonette".to_string()],
            ..ScrapedContent::default()
        };
        let json = serde_json::to_string(&content).unwrap();
        let back: ScrapedContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
