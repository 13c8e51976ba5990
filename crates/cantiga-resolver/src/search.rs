//! Multi-strategy search orchestration.
//!
//! Local tags rarely match catalog titles exactly, so a single search
//! is not enough. The orchestrator walks a fixed ladder of query
//! reformulations (direct, normalized, artist-first, title-only,
//! artist-only), scoring each strategy's hits against the original
//! query and stopping at the first acceptable match.
//!
//! A failing strategy never aborts the run: its error is logged and the
//! next reformulation is tried. Only exhausting the whole ladder yields
//! `NotFound`, and only a failure in the orchestration scaffolding
//! itself surfaces as `MatchOutcome::Error`.

use std::fmt;
use std::sync::Arc;

use tokio::time::{sleep, Duration};

use cantiga_core::{MatchOutcome, SearchStrategy, SongQuery};

use crate::catalog::RemoteCatalog;
use crate::error::ResolveResult;
use crate::score::{best_candidate, ScoreWeights};

/// Drives the strategy ladder for one `(title, artist)` pair at a time.
///
/// Within one run, strategies execute strictly in order, each completing
/// (including scoring) before the next begins. Distinct runs interleave
/// freely and share only the gateway's rate window.
pub struct SearchResolver {
    catalog: Arc<dyn RemoteCatalog>,
    weights: ScoreWeights,
    strategy_delay: Duration,
}

impl fmt::Debug for SearchResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResolver")
            .field("weights", &self.weights)
            .field("strategy_delay", &self.strategy_delay)
            .finish_non_exhaustive()
    }
}

impl SearchResolver {
    /// Create a resolver over the given catalog.
    ///
    /// `strategy_delay` is a courtesy pause between consecutive search
    /// attempts, independent of (and in addition to) the gateway's own
    /// rate limiting.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        weights: ScoreWeights,
        strategy_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            weights,
            strategy_delay,
        }
    }

    /// Resolve a noisy `(title, artist)` pair to one [`MatchOutcome`].
    ///
    /// Never panics and never returns `Err`; the outcome value is the
    /// only channel.
    pub async fn resolve(&self, title: &str, artist: &str) -> MatchOutcome {
        match self.run(title, artist).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("resolution of {title:?} / {artist:?} failed: {e}");
                MatchOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, title: &str, artist: &str) -> ResolveResult<MatchOutcome> {
        let query = SongQuery::new(title, artist);
        // Hits are always scored against the original, unreformulated
        // query, regardless of which strategy produced them.
        let original = query.direct();

        let mut attempted = false;
        for strategy in SearchStrategy::ALL {
            let Some(text) = Self::query_text(strategy, &query) else {
                log::debug!("skipping {strategy} strategy: blank query");
                continue;
            };

            if attempted {
                sleep(self.strategy_delay).await;
            }
            attempted = true;

            log::debug!("searching via {strategy} strategy: {text:?}");
            match self.catalog.search(&text).await {
                Ok(hits) if hits.is_empty() => {
                    log::debug!("{strategy} strategy returned no hits");
                }
                Ok(hits) => match best_candidate(&hits, &original, self.weights) {
                    Some((candidate, score)) => {
                        log::info!(
                            "matched {:?} by {:?} via {strategy} strategy (score {score:.2})",
                            candidate.title,
                            candidate.primary_artist,
                        );
                        return Ok(MatchOutcome::Success {
                            candidate,
                            strategy,
                        });
                    }
                    None => {
                        log::debug!(
                            "{strategy} strategy returned {} hits, none valid",
                            hits.len()
                        );
                    }
                },
                Err(e) => {
                    log::warn!("{strategy} strategy failed: {e}");
                }
            }
        }

        Ok(MatchOutcome::NotFound)
    }

    /// The query text for a strategy, or `None` when its source field is
    /// blank (searching an empty string is a guaranteed miss and wastes
    /// budget).
    fn query_text(strategy: SearchStrategy, query: &SongQuery) -> Option<String> {
        let text = match strategy {
            SearchStrategy::Direct => query.direct(),
            SearchStrategy::Normalized => query.normalized(),
            SearchStrategy::ArtistFirst => query.artist_first(),
            SearchStrategy::TitleOnly => query.title.trim().to_string(),
            SearchStrategy::ArtistOnly => query.artist.trim().to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
