use std::sync::Arc;

use alloy::network::{Ethereum, Network};
use alloy::providers::{Provider, RootProvider};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::config::ScannerConfig;
use crate::cost::{CostMeter, Meter};
use crate::error::ScanError;
use crate::events::resolve_event_topics;
use crate::provider_caps::provider_cap;
use crate::rate_limit::TokenBucket;
use crate::scanner::adaptive::AdaptiveConcurrency;
use crate::scanner::scanner::LogScanner;

/// Builder for [`LogScanner`].
///
/// Wraps a [`ScannerConfig`] with a few ergonomic overrides, validates it once, and
/// assembles the scanner's collaborators: the token-bucket limiter, the cost meter,
/// the adaptive concurrency controller and the resolved event-topic set.
#[derive(Debug, Clone)]
pub struct LogScannerBuilder {
    config: ScannerConfig,
}

impl LogScannerBuilder {
    /// Starts a builder from a configuration.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Overrides the configured requested block window.
    #[must_use]
    pub fn block_window(mut self, block_window: u64) -> Self {
        self.config.rpc.block_window = block_window;
        self
    }

    /// Overrides the configured base (and maximum) concurrency.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.rpc.concurrency = concurrency;
        self
    }

    /// Overrides the configured request rate.
    #[must_use]
    pub fn rps(mut self, rps: u32) -> Self {
        self.config.rpc.rps = rps;
        self
    }

    /// Makes the first exhausted chunk abort the whole scan.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Validates the configuration and connects over HTTP to `rpc.url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfiguration`] naming the offending field.
    pub fn connect(self) -> Result<LogScanner, ScanError> {
        self.config.validate()?;
        let url = self.parse_url()?;
        let provider = RootProvider::<Ethereum>::new_http(url.clone());
        self.assemble(url, provider)
    }

    /// Validates the configuration and wraps an existing provider.
    ///
    /// The provider cap and the endpoint label are still derived from `rpc.url`; the
    /// given provider is expected to front the same endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfiguration`] naming the offending field.
    pub fn connect_provider<N: Network>(
        self,
        provider: impl Provider<N>,
    ) -> Result<LogScanner<N>, ScanError> {
        self.config.validate()?;
        let url = self.parse_url()?;
        let root = provider.root().clone();
        self.assemble(url, root)
    }

    fn parse_url(&self) -> Result<Url, ScanError> {
        self.config
            .rpc
            .url
            .parse()
            .map_err(|_| ScanError::InvalidConfiguration("rpc.url is not a valid URL"))
    }

    fn assemble<N: Network>(
        self,
        url: Url,
        provider: RootProvider<N>,
    ) -> Result<LogScanner<N>, ScanError> {
        let cap = provider_cap(&url);
        let endpoint_host = url.host_str().unwrap_or("unknown").to_owned();
        let limiter = Arc::new(TokenBucket::new(self.config.rpc.rps)?);
        let meter: Arc<dyn Meter> = Arc::new(CostMeter::new(self.config.cost.clone()));
        let adaptive = Arc::new(AdaptiveConcurrency::new(&self.config.rpc, &self.config.retry));
        let topics = resolve_event_topics(&self.config.events);

        info!(
            endpoint = %endpoint_host,
            provider_cap = cap,
            rps = self.config.rpc.rps,
            concurrency = self.config.rpc.concurrency,
            block_window = self.config.rpc.block_window,
            events = self.config.events.len(),
            "log scanner ready"
        );

        Ok(LogScanner {
            provider,
            limiter,
            meter,
            adaptive,
            topics,
            provider_cap: cap,
            endpoint_host,
            config: self.config,
            cancel: CancellationToken::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;
    use alloy::providers::mock::Asserter;
    use alloy::rpc::client::RpcClient;

    use super::*;

    fn mocked_provider() -> RootProvider<Ethereum> {
        RootProvider::new(RpcClient::mocked(Asserter::new()))
    }

    #[test]
    fn connect_rejects_invalid_configuration() {
        let mut config = ScannerConfig::new("http://localhost:8545");
        config.rpc.rps = 0;
        let result = LogScannerBuilder::new(config).connect_provider(mocked_provider());
        assert!(matches!(result, Err(ScanError::InvalidConfiguration(_))));
    }

    #[test]
    fn connect_builds_http_scanner_from_url() {
        let scanner =
            LogScannerBuilder::new(ScannerConfig::new("http://localhost:8545")).connect().unwrap();
        assert_eq!(scanner.provider_cap(), 1000);
    }

    #[test]
    fn provider_cap_follows_the_endpoint_host() {
        let capped = LogScannerBuilder::new(ScannerConfig::new("https://cloudflare-eth.com"))
            .connect_provider(mocked_provider())
            .unwrap();
        assert_eq!(capped.provider_cap(), 25);

        let generous =
            LogScannerBuilder::new(ScannerConfig::new("https://eth-mainnet.g.alchemy.com/v2/key"))
                .connect_provider(mocked_provider())
                .unwrap();
        assert_eq!(generous.provider_cap(), 2000);
    }

    #[test]
    fn configured_events_resolve_to_topics() {
        let mut config = ScannerConfig::new("http://localhost:8545");
        config.events = vec!["Transfer(address,address,uint256)".to_owned()];
        let scanner =
            LogScannerBuilder::new(config).connect_provider(mocked_provider()).unwrap();
        assert_eq!(
            scanner.topics,
            vec![b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")]
        );
    }

    #[test]
    fn builder_overrides_replace_config_values() {
        let builder = LogScannerBuilder::new(ScannerConfig::new("http://localhost:8545"))
            .block_window(50)
            .concurrency(3)
            .rps(42)
            .strict(true);
        let scanner = builder.connect_provider(mocked_provider()).unwrap();
        assert_eq!(scanner.config.rpc.block_window, 50);
        assert_eq!(scanner.config.rpc.concurrency, 3);
        assert_eq!(scanner.config.rpc.rps, 42);
        assert!(scanner.config.strict);
    }
}
