//! logsweep retrieves EVM event logs over arbitrary block ranges while staying inside
//! a provider's operating limits.
//!
//! The main entry point is [`LogScanner`], built via [`LogScannerBuilder`] from a
//! [`ScannerConfig`]. One [`scan`](LogScanner::scan) call partitions the requested
//! range into chunks no larger than the effective block window, fetches the chunks
//! concurrently and returns a [`ScanReport`] with the matching logs in range order.
//!
//! # Provider awareness
//!
//! Every `eth_getLogs` span is capped by a per-provider ceiling derived from the
//! endpoint hostname (see [`DEFAULT_PROVIDER_CAP`]), every request is throttled by a
//! token-bucket rate limiter with a burst allowance of twice the sustained rate, and
//! every issued call is tracked by a cost meter (see
//! [`cost_summary`](LogScanner::cost_summary)).
//!
//! # Adaptation
//!
//! Chunk fetches run under a bounded concurrency pool. The pool size self-tunes with
//! an increase/decrease-by-one policy driven by consecutive-outcome streaks: a streak
//! of failures steps concurrency down toward the configured floor, a streak of
//! successes steps it back up toward the configured base. Transient RPC failures are
//! retried per chunk with exponential backoff.
//!
//! # Failure handling
//!
//! By default a chunk that exhausts its retry budget does not poison the scan: its
//! range is reported in [`ScanReport::failed_ranges`] alongside the logs every other
//! chunk produced. Configuring [`strict`](LogScannerBuilder::strict) restores
//! all-or-nothing behavior where the first exhausted chunk aborts the scan.
//!
//! # Example
//!
//! ```no_run
//! use logsweep::{LogScannerBuilder, ScanRequest, ScannerConfig};
//!
//! # async fn example() -> Result<(), logsweep::ScanError> {
//! let mut config = ScannerConfig::new("https://eth-mainnet.g.alchemy.com/v2/KEY");
//! config.events = vec!["Transfer(address,address,uint256)".to_owned()];
//!
//! let scanner = LogScannerBuilder::new(config).connect()?;
//! let report = scanner.scan(ScanRequest::new(1_000_000, 1_001_999)).await?;
//! println!("{} logs over {} blocks", report.logs.len(), report.scanned_blocks);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cost;
pub mod rate_limit;

mod error;
mod events;
mod provider_caps;
mod scanner;
mod types;

pub use config::{CostConfig, RetryConfig, RpcConfig, ScannerConfig};
pub use cost::{CostMeter, CostSummary, Meter, RpcMethod};
pub use error::ScanError;
pub use events::resolve_event_topics;
pub use provider_caps::DEFAULT_PROVIDER_CAP;
pub use rate_limit::{RateLimit, TokenBucket};
pub use scanner::{ADDRESS_BATCH_SIZE, LogScanner, LogScannerBuilder};
pub use types::{FailedRange, ScanReport, ScanRequest};
