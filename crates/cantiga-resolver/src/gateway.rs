//! Rate-limited outbound HTTP gateway.
//!
//! Every outbound request the pipeline makes funnels through
//! [`Gateway::execute`], which asks the [`RateGate`] for admission
//! (keyed by the request's host, so a scoped gate can ignore CDN or
//! thumbnail traffic) before handing the request to `reqwest`.
//!
//! Page fetches additionally rotate through a small pool of browser
//! user agents and send browser-like headers; lyric hosts are quicker
//! to block obvious bot fingerprints than API traffic.

use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use tokio::time::Duration;

use crate::error::{ResolveError, ResolveResult};
use crate::throttle::{RateGate, RateWindowSnapshot};

/// Browser user agents rotated for page fetches.
const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// HTTP client wrapper enforcing the rate gate on every request.
#[derive(Debug)]
pub struct Gateway {
    http: Client,
    gate: RateGate,
}

impl Gateway {
    /// Create a gateway with the given gate and request timeout.
    ///
    /// The underlying client carries the crate user agent; page fetches
    /// override it per request via [`fetch_html`](Self::fetch_html).
    #[must_use]
    pub fn new(gate: RateGate, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .user_agent(concat!("cantiga/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client"),
            gate,
        }
    }

    /// Start building a GET request against the inner client.
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Send a built request through the rate gate.
    ///
    /// # Errors
    /// `RateLimited` from the gate under a failing policy, or `Request`
    /// on transport failure.
    pub async fn execute(&self, builder: RequestBuilder) -> ResolveResult<reqwest::Response> {
        let request = builder.build()?;
        self.gate.admit(request.url().host_str()).await?;
        Ok(self.http.execute(request).await?)
    }

    /// Fetch a page as HTML with a rotated browser user agent.
    ///
    /// # Errors
    /// `Http` on a non-success status, otherwise as [`execute`](Self::execute).
    pub async fn fetch_html(&self, url: &str) -> ResolveResult<String> {
        let agent = USER_AGENT_POOL
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("Mozilla/5.0");
        let builder = self
            .http
            .get(url)
            .header(USER_AGENT, agent)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        let response = self
            .execute(builder)
            .await?
            .error_for_status()
            .map_err(|e| ResolveError::Http {
                source_name: "page".to_string(),
                message: e.to_string(),
            })?;
        Ok(response.text().await?)
    }

    /// Read-only view of the rate window, for diagnostics.
    #[must_use]
    pub fn state(&self) -> RateWindowSnapshot {
        self.gate.snapshot()
    }

    /// Clear the rate window.
    pub fn reset(&self) {
        self.gate.reset();
    }
}
