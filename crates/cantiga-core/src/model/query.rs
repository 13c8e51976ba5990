use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// A song lookup request: the raw `(title, artist)` pair from local
/// audio tags plus a derived normalized form.
///
/// The normalized fields have special characters stripped and whitespace
/// collapsed; they feed the "normalized" search strategy while the raw
/// fields feed the verbatim strategies. A `SongQuery` is created once
/// per resolution attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongQuery {
    pub title: String,
    pub artist: String,
    pub normalized_title: String,
    pub normalized_artist: String,
}

impl SongQuery {
    #[must_use]
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        let title = title.into();
        let artist = artist.into();
        let normalized_title = normalize(&title);
        let normalized_artist = normalize(&artist);
        Self {
            title,
            artist,
            normalized_title,
            normalized_artist,
        }
    }

    /// The verbatim free-text form, `"{title} {artist}"`.
    #[must_use]
    pub fn direct(&self) -> String {
        format!("{} {}", self.title, self.artist).trim().to_string()
    }

    /// The normalized free-text form.
    #[must_use]
    pub fn normalized(&self) -> String {
        format!("{} {}", self.normalized_title, self.normalized_artist)
            .trim()
            .to_string()
    }

    /// The artist-first form, `"{artist} {title}"`. The remote search is
    /// keyword-order-sensitive in practice, so this sometimes hits when
    /// the direct form misses.
    #[must_use]
    pub fn artist_first(&self) -> String {
        format!("{} {}", self.artist, self.title).trim().to_string()
    }
}
