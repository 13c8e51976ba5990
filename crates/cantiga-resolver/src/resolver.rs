//! The inbound call surface of the pipeline.

use std::sync::Arc;

use cantiga_core::{MatchOutcome, ScrapedContent};

use crate::catalog::{HttpCatalog, RemoteCatalog};
use crate::config::Config;
use crate::extract::PageExtractor;
use crate::gateway::Gateway;
use crate::search::SearchResolver;
use crate::throttle::{RateGate, RateWindowSnapshot};

/// Bundles the gateway, catalog client, search orchestrator, and page
/// extractor behind the four calls the rest of the application uses.
///
/// One `Resolver` is shared across concurrent resolution pipelines; the
/// only cross-call state is the gateway's rate window.
#[derive(Debug)]
pub struct Resolver {
    gateway: Arc<Gateway>,
    search: SearchResolver,
    extractor: PageExtractor,
}

impl Resolver {
    /// Build a resolver talking to the configured HTTP catalog.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let mut gate = RateGate::new(config.max_requests, config.window(), config.policy)
            .with_backoff(
                config.backoff_base(),
                config.backoff_max(),
                config.backoff_retries,
            );
        if let Some(host) = &config.scope_host {
            gate = gate.scoped_to(host.clone());
        }
        let gateway = Arc::new(Gateway::new(gate, config.http_timeout()));
        let catalog: Arc<dyn RemoteCatalog> = Arc::new(HttpCatalog::new(
            Arc::clone(&gateway),
            config.catalog_base_url.clone(),
            config.api_token.clone(),
        ));
        Self::assemble(catalog, gateway, config)
    }

    /// Build a resolver over an alternative catalog backend (tests, or
    /// a different remote API). The gateway still tracks its window so
    /// `gateway_state` stays meaningful, but the injected backend
    /// decides whether to route through it.
    #[must_use]
    pub fn with_catalog(catalog: Arc<dyn RemoteCatalog>, config: &Config) -> Self {
        let gate = RateGate::new(config.max_requests, config.window(), config.policy);
        let gateway = Arc::new(Gateway::new(gate, config.http_timeout()));
        Self::assemble(catalog, gateway, config)
    }

    fn assemble(catalog: Arc<dyn RemoteCatalog>, gateway: Arc<Gateway>, config: &Config) -> Self {
        let search = SearchResolver::new(
            Arc::clone(&catalog),
            config.weights(),
            config.strategy_delay(),
        );
        let extractor = PageExtractor::new(catalog);
        Self {
            gateway,
            search,
            extractor,
        }
    }

    /// Resolve a noisy `(title, artist)` pair to a match outcome.
    pub async fn resolve(&self, title: &str, artist: &str) -> MatchOutcome {
        self.search.resolve(title, artist).await
    }

    /// Fetch and extract only the lyric text from a song page.
    pub async fn extract_lyrics(&self, url: &str) -> Option<String> {
        self.extractor.extract_lyrics(url).await
    }

    /// Fetch and extract the full content of a song page.
    pub async fn extract_all(&self, url: &str) -> Option<ScrapedContent> {
        self.extractor.extract_all(url).await
    }

    /// Diagnostic view of the gateway's rate window.
    #[must_use]
    pub fn gateway_state(&self) -> RateWindowSnapshot {
        self.gateway.state()
    }

    /// Clear the gateway's rate window.
    pub fn reset_gateway(&self) {
        self.gateway.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_builds_from_default_config() {
        let resolver = Resolver::new(&Config::default());
        let state = resolver.gateway_state();
        assert_eq!(state.in_window, 0);
        assert_eq!(state.remaining, Config::default().max_requests);
    }
}
