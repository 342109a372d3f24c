use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use alloy::consensus::BlockHeader;
use alloy::network::{BlockResponse, Ethereum, Network};
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, RootProvider};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ScannerConfig;
use crate::cost::{CostSummary, Meter, RpcMethod};
use crate::error::ScanError;
use crate::provider_caps::effective_window;
use crate::rate_limit::{RateLimit, TokenBucket};
use crate::scanner::adaptive::AdaptiveConcurrency;
use crate::scanner::batch::{ADDRESS_BATCH_SIZE, address_batches};
use crate::scanner::fetch::{ChunkContext, ChunkOutcome, fetch_chunk};
use crate::scanner::range_iterator::RangeIterator;
use crate::types::{FailedRange, ScanReport, ScanRequest};

/// Adaptive, rate-limited event-log scanner over a single RPC endpoint.
///
/// Built with [`LogScannerBuilder`](crate::LogScannerBuilder). One instance owns its
/// adaptation state and may serve many sequential [`scan`](LogScanner::scan) calls;
/// concurrency learned from one scan carries into the next.
pub struct LogScanner<N: Network = Ethereum, L: RateLimit = TokenBucket> {
    pub(crate) provider: RootProvider<N>,
    pub(crate) limiter: Arc<L>,
    pub(crate) meter: Arc<dyn Meter>,
    pub(crate) adaptive: Arc<AdaptiveConcurrency>,
    pub(crate) topics: Vec<B256>,
    pub(crate) provider_cap: u64,
    pub(crate) endpoint_host: String,
    pub(crate) config: ScannerConfig,
    pub(crate) cancel: CancellationToken,
}

impl<N: Network, L: RateLimit> LogScanner<N, L> {
    /// Scans `request`'s block range for matching logs.
    ///
    /// The range is partitioned into chunks no larger than the effective block window
    /// (`min(requested window, provider cap)`). Chunks are fetched concurrently under
    /// the adaptive concurrency limit, each under its own retry budget, and the
    /// results are concatenated in range order.
    ///
    /// Chunks that exhaust their retries are reported in
    /// [`ScanReport::failed_ranges`] unless the scanner is configured `strict`, in
    /// which case the first such failure aborts the scan.
    ///
    /// # Errors
    ///
    /// * [`ScanError::InvalidRange`] - `from_block > to_block`; nothing is fetched.
    /// * [`ScanError::InvalidConfiguration`] - a per-request window override of zero.
    /// * [`ScanError::ExhaustedRetries`] - strict mode only, first failed chunk.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanReport, ScanError> {
        let started = Instant::now();

        if request.from_block > request.to_block {
            return Err(ScanError::InvalidRange {
                from: request.from_block,
                to: request.to_block,
            });
        }
        if request.block_window == Some(0) {
            return Err(ScanError::InvalidConfiguration("block_window must be greater than zero"));
        }

        let requested_window = request.block_window.unwrap_or(self.config.rpc.block_window);
        let window = effective_window(requested_window, self.provider_cap);
        self.adaptive.set_block_window(window);

        let ranges: Vec<RangeInclusive<u64>> =
            RangeIterator::new(request.from_block, request.to_block, window).collect();
        let batches: Vec<Vec<Address>> = if request.addresses.is_empty() {
            vec![Vec::new()]
        } else {
            address_batches(&request.addresses, ADDRESS_BATCH_SIZE)
        };
        let scanned_blocks =
            request.to_block.saturating_sub(request.from_block).saturating_add(1);

        info!(
            endpoint = %self.endpoint_host,
            from = request.from_block,
            to = request.to_block,
            requested_window,
            provider_cap = self.provider_cap,
            effective_window = window,
            chunks = ranges.len(),
            address_batches = batches.len(),
            concurrency = self.adaptive.current(),
            "starting log scan"
        );

        if request.dry_run {
            info!(planned_calls = ranges.len() * batches.len(), "dry run, no fetches issued");
            return Ok(ScanReport {
                logs: Vec::new(),
                scanned_blocks,
                elapsed: started.elapsed(),
                retries_used: 0,
                failed_ranges: Vec::new(),
            });
        }

        let topics = Arc::new(request.topics.clone().unwrap_or_else(|| self.topics.clone()));
        let token_ids: Option<Arc<HashSet<String>>> =
            request.token_ids.as_ref().map(|ids| Arc::new(ids.iter().cloned().collect()));

        let ctx = ChunkContext {
            provider: self.provider.clone(),
            limiter: Arc::clone(&self.limiter),
            meter: Arc::clone(&self.meter),
            adaptive: Arc::clone(&self.adaptive),
            retry: self.config.retry.clone(),
            request_timeout: self.config.rpc.request_timeout(),
            topics,
            token_ids,
        };

        let mut tasks: JoinSet<ChunkOutcome> = JoinSet::new();
        let mut outcomes: Vec<Option<ChunkOutcome>> = (0..ranges.len()).map(|_| None).collect();
        let mut cancelled_from = None;

        for (index, range) in ranges.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled_from = Some(index);
                break;
            }
            // The limit is re-read before every dispatch so adaptive changes apply to
            // chunks not yet in flight.
            while tasks.len() >= self.adaptive.current() {
                let Some(outcome) = join_one(&mut tasks).await else { break };
                self.admit(outcome, &mut outcomes, &mut tasks)?;
            }
            tasks.spawn(fetch_chunk(ctx.clone(), index, range.clone(), batches.clone()));
        }

        while let Some(outcome) = join_one(&mut tasks).await {
            self.admit(outcome, &mut outcomes, &mut tasks)?;
        }

        let mut logs = Vec::new();
        let mut retries_used = 0u32;
        let mut failed_ranges = Vec::new();
        for slot in outcomes {
            let Some(outcome) = slot else { continue };
            retries_used += outcome.retries;
            match outcome.result {
                Ok(chunk_logs) => logs.extend(chunk_logs),
                Err(error) => failed_ranges.push(FailedRange { range: outcome.range, error }),
            }
        }
        if let Some(start) = cancelled_from {
            debug!(skipped_chunks = ranges.len() - start, "scan cancelled mid-dispatch");
            for range in &ranges[start..] {
                failed_ranges
                    .push(FailedRange { range: range.clone(), error: ScanError::Cancelled });
            }
        }

        let elapsed = started.elapsed();
        let summary = self.meter.summary();
        info!(
            scope = "cost",
            total_credits = summary.total_credits,
            usd_estimate = summary.usd_estimate,
            by_method = ?summary.by_method,
            "scan cost summary"
        );
        info!(
            logs = logs.len(),
            retries = retries_used,
            failed_chunks = failed_ranges.len(),
            concurrency = self.adaptive.current(),
            block_window = self.adaptive.block_window(),
            elapsed_ms = elapsed.as_millis() as u64,
            "scan complete"
        );

        Ok(ScanReport { logs, scanned_blocks, elapsed, retries_used, failed_ranges })
    }

    /// Records `outcome`, aborting everything in flight on a strict-mode failure.
    fn admit(
        &self,
        outcome: ChunkOutcome,
        outcomes: &mut [Option<ChunkOutcome>],
        tasks: &mut JoinSet<ChunkOutcome>,
    ) -> Result<(), ScanError> {
        if self.config.strict {
            if let Err(error) = &outcome.result {
                tasks.abort_all();
                return Err(error.clone());
            }
        }
        let index = outcome.index;
        outcomes[index] = Some(outcome);
        Ok(())
    }

    /// Latest block number on the endpoint.
    ///
    /// A single rate-limited, cost-tracked call with no retry wrapping; the caller
    /// decides what to do on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Rpc`] or [`ScanError::Timeout`] from the single attempt.
    pub async fn latest_block(&self) -> Result<u64, ScanError> {
        self.limiter
            .schedule(|| async {
                self.meter.track(RpcMethod::BlockNumber);
                match timeout(self.config.rpc.request_timeout(), self.provider.get_block_number())
                    .await
                {
                    Ok(Ok(number)) => Ok(number),
                    Ok(Err(error)) => Err(ScanError::from(error)),
                    Err(_) => Err(ScanError::Timeout),
                }
            })
            .await
    }

    /// Unix timestamp of block `number`.
    ///
    /// A single rate-limited, cost-tracked call with no retry wrapping.
    ///
    /// # Errors
    ///
    /// * [`ScanError::BlockNotFound`] - the endpoint has no block at `number`.
    /// * [`ScanError::Rpc`] / [`ScanError::Timeout`] - from the single attempt.
    pub async fn block_timestamp(&self, number: u64) -> Result<u64, ScanError> {
        let block = self
            .limiter
            .schedule(|| async {
                self.meter.track(RpcMethod::GetBlockByNumber);
                match timeout(
                    self.config.rpc.request_timeout(),
                    self.provider.get_block_by_number(number.into()),
                )
                .await
                {
                    Ok(Ok(block)) => Ok(block),
                    Ok(Err(error)) => Err(ScanError::from(error)),
                    Err(_) => Err(ScanError::Timeout),
                }
            })
            .await?;

        let block = block.ok_or(ScanError::BlockNotFound(number))?;
        Ok(block.header().timestamp())
    }

    /// Snapshot of the credits spent by this scanner so far.
    #[must_use]
    pub fn cost_summary(&self) -> CostSummary {
        self.meter.summary()
    }

    /// Block-window ceiling imposed by the connected endpoint.
    #[must_use]
    pub const fn provider_cap(&self) -> u64 {
        self.provider_cap
    }

    /// Handle for cancelling an in-progress scan.
    ///
    /// Once triggered, no further chunks are dispatched; in-flight fetches drain and
    /// every undispatched range is reported in [`ScanReport::failed_ranges`] as
    /// [`ScanError::Cancelled`].
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

async fn join_one(tasks: &mut JoinSet<ChunkOutcome>) -> Option<ChunkOutcome> {
    loop {
        match tasks.join_next().await? {
            Ok(outcome) => return Some(outcome),
            Err(join_error) => {
                // Only reachable if a chunk task panicked or was aborted.
                error!(error = %join_error, "chunk task did not complete");
            }
        }
    }
}
