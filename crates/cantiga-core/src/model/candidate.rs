use serde::{Deserialize, Serialize};

/// One catalog search hit.
///
/// A candidate is the remote catalog's view of a song: an opaque
/// external id, a display title, the canonical song page URL, an
/// optional thumbnail, and the primary artist's name. Candidates are
/// plain value objects; whichever layer holds one owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque id assigned by the remote catalog.
    pub id: String,
    /// Display title as shown on the catalog page.
    pub title: String,
    /// Canonical song page URL.
    pub url: String,
    /// Thumbnail of the cover art, if the catalog provides one.
    pub thumbnail_url: Option<String>,
    /// Name of the primary artist credited on the hit.
    pub primary_artist: String,
}

impl Candidate {
    /// A candidate is usable only when id, title, and url are non-empty
    /// and a primary artist is present. Hits failing this are discarded
    /// silently by the scorer.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.title.trim().is_empty()
            && !self.url.trim().is_empty()
            && !self.primary_artist.trim().is_empty()
    }
}
