//! Candidate similarity scoring.
//!
//! The remote search is keyword-based and happily returns covers,
//! remixes, and unrelated songs that happen to share a word with the
//! query. The scorer re-ranks hits against the original query:
//!
//! ```text
//! score = title_weight * jaccard(tokens(hit.title), tokens(query))
//!       + artist_bonus   (when the hit's primary artist appears
//!                         case-insensitively in the query)
//! ```
//!
//! Malformed hits (missing id, title, url, or artist) are dropped
//! silently before scoring.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cantiga_core::text::tokenize;
use cantiga_core::Candidate;

/// Scoring weights. The defaults are empirically tuned; treat them as
/// configuration, not invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the title token-set similarity.
    pub title_weight: f64,
    /// Flat bonus when the primary artist is a substring of the query.
    pub artist_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            title_weight: 0.6,
            artist_bonus: 0.3,
        }
    }
}

/// Jaccard index over two token sets: `|A ∩ B| / |A ∪ B|`, defined as
/// 0.0 when either set is empty.
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

/// Score a single candidate against the original query string.
#[must_use]
pub fn score_candidate(
    candidate: &Candidate,
    query: &str,
    query_tokens: &HashSet<String>,
    weights: ScoreWeights,
) -> f64 {
    let title_tokens = tokenize(&candidate.title);
    let mut score = weights.title_weight * jaccard(&title_tokens, query_tokens);

    let artist = candidate.primary_artist.trim();
    if !artist.is_empty() && query.to_lowercase().contains(&artist.to_lowercase()) {
        score += weights.artist_bonus;
    }
    score
}

/// Pick the best valid candidate, or `None` when every hit is invalid
/// (or the list is empty).
///
/// Selection is the strict maximum score; ties keep the first-seen
/// candidate, so result order from the catalog acts as the final
/// tie-break.
#[must_use]
pub fn best_candidate(
    candidates: &[Candidate],
    query: &str,
    weights: ScoreWeights,
) -> Option<(Candidate, f64)> {
    let query_tokens = tokenize(query);
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates.iter().filter(|c| c.is_valid()) {
        let score = score_candidate(candidate, query, &query_tokens, weights);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, score)| (candidate.clone(), score))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_lowercase()).collect()
    }

    fn candidate(id: &str, title: &str, artist: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://example.com/{id}"),
            thumbnail_url: None,
            primary_artist: artist.to_string(),
        }
    }

    #[test]
    fn test_jaccard_identical_sets() {
        let a = tokens(&["hello", "world"]);
        assert_eq!(jaccard(&a, &a.clone()), 1.0);
    }

    #[test]
    fn test_jaccard_empty_set_is_zero() {
        let empty = HashSet::new();
        let some = tokens(&["x"]);
        assert_eq!(jaccard(&empty, &some), 0.0);
        assert_eq!(jaccard(&some, &empty), 0.0);
        assert_eq!(jaccard(&empty, &empty.clone()), 0.0);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let a = tokens(&["midnight", "city"]);
        let b = tokens(&["midnight", "city", "m83"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert!((jaccard(&a, &b) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_includes_artist_bonus() {
        let c = candidate("1", "Midnight City", "M83");
        let query = "Midnight City M83";
        let score = score_candidate(&c, query, &tokenize(query), ScoreWeights::default());
        // Title similarity 2/3 weighted 0.6, plus the 0.3 artist bonus.
        assert!((score - (0.6 * (2.0 / 3.0) + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_score_artist_match_is_case_insensitive() {
        let c = candidate("1", "Halo", "BEYONCÉ");
        let query = "halo beyoncé";
        let score = score_candidate(&c, query, &tokenize(query), ScoreWeights::default());
        // Title similarity 1/2 weighted 0.6, plus the bonus.
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_best_candidate_filters_invalid_hits() {
        let mut broken = candidate("", "Midnight City", "M83");
        broken.url = String::new();
        let hits = vec![broken, candidate("2", "Midnight City", "M83")];
        let (best, _) = best_candidate(&hits, "Midnight City M83", ScoreWeights::default())
            .expect("one valid hit");
        assert_eq!(best.id, "2");
    }

    #[test]
    fn test_best_candidate_none_when_all_invalid() {
        let hits = vec![candidate("1", "", "M83"), candidate("", "Song", "X")];
        assert!(best_candidate(&hits, "anything", ScoreWeights::default()).is_none());
    }

    #[test]
    fn test_best_candidate_none_on_empty_list() {
        assert!(best_candidate(&[], "anything", ScoreWeights::default()).is_none());
    }

    #[test]
    fn test_best_candidate_picks_strict_maximum() {
        let hits = vec![
            candidate("1", "Midnight", "Nobody"),
            candidate("2", "Midnight City", "M83"),
            candidate("3", "City Lights", "Nobody"),
        ];
        let (best, score) = best_candidate(&hits, "Midnight City M83", ScoreWeights::default())
            .expect("a best hit");
        assert_eq!(best.id, "2");
        assert!(score >= 0.6);
    }

    #[test]
    fn test_best_candidate_tie_keeps_first_seen() {
        let hits = vec![
            candidate("first", "Same Song", "Artist"),
            candidate("second", "Same Song", "Artist"),
        ];
        let (best, _) = best_candidate(&hits, "Same Song Artist", ScoreWeights::default())
            .expect("a best hit");
        assert_eq!(best.id, "first");
    }
}
