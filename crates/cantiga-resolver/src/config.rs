use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::score::ScoreWeights;
use crate::throttle::ThrottlePolicy;

/// Configuration for cantiga.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CANTIGA_* prefix)
/// 3. Config file (~/.config/cantiga/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the catalog search API.
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,

    /// API bearer token, if the catalog requires one.
    ///
    /// Can be set via:
    /// - ENV: CANTIGA_API_TOKEN
    /// - Config: api_token = "..."
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request budget: at most this many requests per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Rate window duration, in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// What to do when the budget is exhausted:
    /// "wait", "fail-fast", or "retry-with-backoff".
    #[serde(default = "default_policy")]
    pub policy: ThrottlePolicy,

    /// When set, only requests to this host are rate-gated.
    #[serde(default)]
    pub scope_host: Option<String>,

    /// Courtesy pause between search strategies, in milliseconds.
    /// Independent of the rate gate. Empirically tuned.
    #[serde(default = "default_strategy_delay_ms")]
    pub strategy_delay_ms: u64,

    /// Weight of title similarity in candidate scoring. Empirically tuned.
    #[serde(default = "default_title_weight")]
    pub title_weight: f64,

    /// Bonus when the hit's artist appears in the query. Empirically tuned.
    #[serde(default = "default_artist_bonus")]
    pub artist_bonus: f64,

    /// HTTP connect/read timeout, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Base delay for the retry-with-backoff policy, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Delay ceiling for the retry-with-backoff policy, in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Retry ceiling for the retry-with-backoff policy.
    #[serde(default = "default_backoff_retries")]
    pub backoff_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_base_url: default_catalog_base_url(),
            api_token: None,
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            policy: default_policy(),
            scope_host: None,
            strategy_delay_ms: default_strategy_delay_ms(),
            title_weight: default_title_weight(),
            artist_bonus: default_artist_bonus(),
            http_timeout_secs: default_http_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            backoff_retries: default_backoff_retries(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cantiga/config.toml
    /// Reads environment variables with CANTIGA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file path (plus environment).
    ///
    /// This is used when the --config CLI flag is provided.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cantiga");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn strategy_delay(&self) -> Duration {
        Duration::from_millis(self.strategy_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            title_weight: self.title_weight,
            artist_bonus: self.artist_bonus,
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://api.genius.com".to_string()
}

fn default_max_requests() -> usize {
    10
}

fn default_window_ms() -> u64 {
    10_000
}

fn default_policy() -> ThrottlePolicy {
    ThrottlePolicy::Wait
}

fn default_strategy_delay_ms() -> u64 {
    200
}

fn default_title_weight() -> f64 {
    0.6
}

fn default_artist_bonus() -> f64 {
    0.3
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    2_000
}

fn default_backoff_retries() -> usize {
    3
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cantiga/config.toml
/// - macOS: ~/Library/Application Support/cantiga/config.toml
/// - Windows: %APPDATA%\cantiga\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantiga")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cantiga Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CANTIGA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# API bearer token for the catalog search endpoint
#
# Can also be set via:
# - Environment: CANTIGA_API_TOKEN=your-token-here
#api_token = "your-api-token-here"

# Base URL of the catalog search API
#catalog_base_url = "https://api.genius.com"

# Outbound request budget: max_requests per window_ms
#max_requests = 10
#window_ms = 10000

# Budget-exhaustion policy: "wait", "fail-fast", or "retry-with-backoff"
#policy = "wait"

# Gate only requests to this host; all others pass through untouched
#scope_host = "api.genius.com"

# Courtesy pause between search strategies, in milliseconds
#strategy_delay_ms = 200

# Candidate scoring weights
#title_weight = 0.6
#artist_bonus = 0.3
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
