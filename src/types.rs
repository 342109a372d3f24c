use std::ops::RangeInclusive;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;

use crate::error::ScanError;

/// One scan over an inclusive block range.
///
/// Built with [`ScanRequest::new`] plus chained setters, then consumed by
/// [`LogScanner::scan`](crate::LogScanner::scan).
///
/// ```
/// use alloy::primitives::address;
/// use logsweep::ScanRequest;
///
/// let request = ScanRequest::new(1_000_000, 1_001_999)
///     .address(address!("0xd8dA6BF26964af9d7eed9e03e53415d37aa96045"))
///     .token_ids(["42"])
///     .block_window(500);
/// ```
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// First block of the range, inclusive.
    pub from_block: u64,
    /// Last block of the range, inclusive.
    pub to_block: u64,
    /// Contract addresses to filter on. Empty means no address filter.
    pub addresses: Vec<Address>,
    /// Decimal token-id allow-list applied to `topics[1]` of every returned log.
    pub token_ids: Option<Vec<String>>,
    /// Topic-hash set overriding the configured event signatures for this request.
    pub topics: Option<Vec<B256>>,
    /// When true, plan the scan and log it, but issue no RPC calls.
    pub dry_run: bool,
    /// Per-request block-window override, still capped by the provider.
    pub block_window: Option<u64>,
}

impl ScanRequest {
    /// Creates a request covering `from_block..=to_block`.
    #[must_use]
    pub const fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            addresses: Vec::new(),
            token_ids: None,
            topics: None,
            dry_run: false,
            block_window: None,
        }
    }

    /// Adds one contract address to filter on.
    #[must_use]
    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    /// Replaces the contract-address filter.
    #[must_use]
    pub fn addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.addresses = addresses.into_iter().collect();
        self
    }

    /// Restricts returned logs to those whose indexed id is in `ids`.
    #[must_use]
    pub fn token_ids<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.token_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the configured event-topic set for this request.
    #[must_use]
    pub fn topics(mut self, topics: impl IntoIterator<Item = B256>) -> Self {
        self.topics = Some(topics.into_iter().collect());
        self
    }

    /// Plans the scan without issuing RPC calls.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Overrides the configured block window for this request.
    #[must_use]
    pub const fn block_window(mut self, window: u64) -> Self {
        self.block_window = Some(window);
        self
    }
}

/// Outcome of one [`scan`](crate::LogScanner::scan) call.
#[derive(Debug)]
pub struct ScanReport {
    /// Matching logs, concatenated in block-range order.
    pub logs: Vec<Log>,
    /// Number of block heights covered: `to_block - from_block + 1`.
    pub scanned_blocks: u64,
    /// Wall-clock duration of the scan.
    pub elapsed: Duration,
    /// Retries consumed across all chunks, successful and failed.
    pub retries_used: u32,
    /// Chunks that exhausted their retry budget or were cancelled.
    ///
    /// Empty on a fully successful scan. In strict mode a failed chunk aborts the scan
    /// instead and this list is never populated.
    pub failed_ranges: Vec<FailedRange>,
}

/// A block range the scan could not complete.
#[derive(Debug, Clone)]
pub struct FailedRange {
    /// The chunk that failed.
    pub range: RangeInclusive<u64>,
    /// The terminal error for this chunk.
    pub error: ScanError,
}
