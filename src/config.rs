//! Scanner configuration.
//!
//! Mirrors the shape handed over by the configuration collaborator: an `rpc` section, a
//! `retry` section, the monitored event signatures and the cost-weight table. The
//! scanner reads the configuration once at construction; there are no reload semantics.
//!
//! All sections deserialize with `serde`, so the structs can be loaded from whatever
//! format the embedding application uses. Every field except `rpc.url` has a default.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ScanError;

/// Top-level scanner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// RPC endpoint and throughput settings.
    pub rpc: RpcConfig,
    /// Retry and adaptation policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Event signatures to monitor, e.g. `"Transfer(address,address,uint256)"`.
    ///
    /// Resolved to topic hashes at construction. Empty means no topic filtering.
    #[serde(default)]
    pub events: Vec<String>,
    /// Cost accounting weights.
    #[serde(default)]
    pub cost: CostConfig,
    /// When true, the first chunk that exhausts its retries aborts the whole scan
    /// instead of being reported in [`ScanReport::failed_ranges`](crate::ScanReport).
    #[serde(default)]
    pub strict: bool,
}

/// RPC endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// HTTP(S) endpoint URL. The hostname also selects the provider block-window cap.
    pub url: String,
    /// Sustained request rate in requests per second. Burst allowance is twice this.
    #[serde(default = "default_rps")]
    pub rps: u32,
    /// Base (and maximum) number of concurrently in-flight chunk fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Floor the adaptive controller may never shrink below.
    #[serde(default = "default_min_concurrency")]
    pub min_concurrency: usize,
    /// Requested block window per `eth_getLogs` call, capped by the provider.
    #[serde(default = "default_block_window")]
    pub block_window: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Retry policy and adaptation thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per chunk fetch, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each retry. Must be at least 1.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f32,
    /// Ceiling on any single backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Consecutive failures before concurrency is stepped down.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Consecutive successes before concurrency is stepped back up.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

/// Cost accounting settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    /// Credit weight per RPC method name.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, u64>,
    /// USD conversion rate for one credit.
    #[serde(default = "default_usd_per_credit")]
    pub usd_per_credit: f64,
}

fn default_rps() -> u32 {
    10
}

fn default_concurrency() -> usize {
    8
}

fn default_min_concurrency() -> usize {
    2
}

fn default_block_window() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f32 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_success_threshold() -> u32 {
    5
}

fn default_weights() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("eth_getLogs".to_owned(), 75),
        ("eth_blockNumber".to_owned(), 10),
        ("eth_getBlockByNumber".to_owned(), 16),
    ])
}

fn default_usd_per_credit() -> f64 {
    0.000_000_4
}

impl ScannerConfig {
    /// Creates a configuration for `url` with defaults everywhere else.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            rpc: RpcConfig::new(url),
            retry: RetryConfig::default(),
            events: Vec::new(),
            cost: CostConfig::default(),
            strict: false,
        }
    }

    /// Checks every section for values the scanner cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.rpc.url.parse::<url::Url>().is_err() {
            return Err(ScanError::InvalidConfiguration("rpc.url is not a valid URL"));
        }
        if self.rpc.rps == 0 {
            return Err(ScanError::InvalidConfiguration("rpc.rps must be greater than zero"));
        }
        if self.rpc.concurrency == 0 {
            return Err(ScanError::InvalidConfiguration(
                "rpc.concurrency must be greater than zero",
            ));
        }
        if self.rpc.min_concurrency == 0 {
            return Err(ScanError::InvalidConfiguration(
                "rpc.min_concurrency must be greater than zero",
            ));
        }
        if self.rpc.min_concurrency > self.rpc.concurrency {
            return Err(ScanError::InvalidConfiguration(
                "rpc.min_concurrency must not exceed rpc.concurrency",
            ));
        }
        if self.rpc.block_window == 0 {
            return Err(ScanError::InvalidConfiguration(
                "rpc.block_window must be greater than zero",
            ));
        }
        if self.rpc.request_timeout_ms == 0 {
            return Err(ScanError::InvalidConfiguration(
                "rpc.request_timeout_ms must be greater than zero",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScanError::InvalidConfiguration(
                "retry.max_attempts must be greater than zero",
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ScanError::InvalidConfiguration(
                "retry.backoff_multiplier must be at least 1",
            ));
        }
        if self.retry.failure_threshold == 0 {
            return Err(ScanError::InvalidConfiguration(
                "retry.failure_threshold must be greater than zero",
            ));
        }
        if self.retry.success_threshold == 0 {
            return Err(ScanError::InvalidConfiguration(
                "retry.success_threshold must be greater than zero",
            ));
        }
        if self.cost.usd_per_credit < 0.0 {
            return Err(ScanError::InvalidConfiguration("cost.usd_per_credit must not be negative"));
        }
        Ok(())
    }
}

impl RpcConfig {
    /// Creates an RPC section for `url` with default throughput settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rps: default_rps(),
            concurrency: default_concurrency(),
            min_concurrency: default_min_concurrency(),
            block_window: default_block_window(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
        }
    }
}

impl RetryConfig {
    /// Delay before the first retry as a [`Duration`].
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Backoff delay ceiling as a [`Duration`].
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self { weights: default_weights(), usd_per_credit: default_usd_per_credit() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ScannerConfig {
        ScannerConfig::new("http://localhost:8545")
    }

    #[test]
    fn default_config_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_url() {
        let mut config = valid();
        config.rpc.url = "not a url".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration("rpc.url is not a valid URL"))
        ));
    }

    #[test]
    fn rejects_zero_rps() {
        let mut config = valid();
        config.rpc.rps = 0;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_min_concurrency_above_concurrency() {
        let mut config = valid();
        config.rpc.concurrency = 4;
        config.rpc.min_concurrency = 5;
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration("rpc.min_concurrency must not exceed rpc.concurrency"))
        ));
    }

    #[test]
    fn rejects_zero_max_attempts() {
        let mut config = valid();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_sub_one_backoff_multiplier() {
        let mut config = valid();
        config.retry.backoff_multiplier = 0.5;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn deserializes_with_section_defaults() {
        let config: ScannerConfig =
            serde_json::from_value(serde_json::json!({ "rpc": { "url": "http://localhost:8545" } }))
                .unwrap();

        assert_eq!(config.rpc.rps, 10);
        assert_eq!(config.rpc.concurrency, 8);
        assert_eq!(config.rpc.block_window, 1000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.cost.weights["eth_getLogs"], 75);
        assert!(!config.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn request_timeout_and_delays_convert_to_durations() {
        let config = valid();
        assert_eq!(config.rpc.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry.initial_delay(), Duration::from_millis(500));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(8));
    }
}
