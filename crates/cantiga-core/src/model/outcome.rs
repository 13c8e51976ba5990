use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::candidate::Candidate;

/// One query-reformulation pattern tried by the search orchestrator.
///
/// Strategies run in the declared order, stopping at the first success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// `"{title} {artist}"` verbatim.
    Direct,
    /// Same, with punctuation stripped and whitespace collapsed.
    Normalized,
    /// `"{artist} {title}"` verbatim.
    ArtistFirst,
    /// Title string alone.
    TitleOnly,
    /// Artist string alone.
    ArtistOnly,
}

impl SearchStrategy {
    /// All strategies, in execution order.
    pub const ALL: [SearchStrategy; 5] = [
        SearchStrategy::Direct,
        SearchStrategy::Normalized,
        SearchStrategy::ArtistFirst,
        SearchStrategy::TitleOnly,
        SearchStrategy::ArtistOnly,
    ];
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::Direct => "direct",
            SearchStrategy::Normalized => "normalized",
            SearchStrategy::ArtistFirst => "artist-first",
            SearchStrategy::TitleOnly => "title-only",
            SearchStrategy::ArtistOnly => "artist-only",
        };
        f.write_str(name)
    }
}

/// Terminal result of one orchestration run.
///
/// Produced exactly once per run and never mutated afterward. `Error`
/// carries a message rather than a typed error because per-strategy
/// failures have already been absorbed by then; only scaffolding
/// failures end a run this way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// A confident match, with the strategy that produced it.
    Success {
        candidate: Candidate,
        strategy: SearchStrategy,
    },
    /// Every strategy was exhausted without an acceptable match.
    NotFound,
    /// The orchestration itself failed.
    Error { message: String },
}

impl MatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, MatchOutcome::Success { .. })
    }

    /// The matched candidate, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            MatchOutcome::Success { candidate, .. } => Some(candidate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_order() {
        assert_eq!(SearchStrategy::ALL[0], SearchStrategy::Direct);
        assert_eq!(SearchStrategy::ALL[4], SearchStrategy::ArtistOnly);
        assert_eq!(SearchStrategy::ALL.len(), 5);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(SearchStrategy::TitleOnly.to_string(), "title-only");
        assert_eq!(SearchStrategy::Direct.to_string(), "direct");
    }

    #[test]
    fn test_outcome_accessors() {
        let candidate = Candidate {
            id: "1".to_string(),
            title: "Song".to_string(),
            url: "https://example.com/song".to_string(),
            thumbnail_url: None,
            primary_artist: "Artist".to_string(),
        };
        let outcome = MatchOutcome::Success {
            candidate: candidate.clone(),
            strategy: SearchStrategy::Direct,
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.candidate(), Some(&candidate));

        assert!(!MatchOutcome::NotFound.is_success());
        assert!(MatchOutcome::NotFound.candidate().is_none());
    }

    #[test]
    fn test_outcome_serializes() {
        let json = serde_json::to_string(&MatchOutcome::NotFound).unwrap();
        assert!(json.contains("NotFound"));
    }
}
