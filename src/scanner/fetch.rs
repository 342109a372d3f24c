use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::Network;
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{Filter, Log};
use backon::{ExponentialBuilder, Retryable};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::RetryConfig;
use crate::cost::{Meter, RpcMethod};
use crate::error::ScanError;
use crate::rate_limit::RateLimit;
use crate::scanner::adaptive::AdaptiveConcurrency;
use crate::scanner::filter::filter_logs;

/// Everything a spawned chunk task needs, cloned per chunk.
pub(crate) struct ChunkContext<N: Network, L: RateLimit> {
    pub provider: RootProvider<N>,
    pub limiter: Arc<L>,
    pub meter: Arc<dyn Meter>,
    pub adaptive: Arc<AdaptiveConcurrency>,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub topics: Arc<Vec<B256>>,
    pub token_ids: Option<Arc<HashSet<String>>>,
}

impl<N: Network, L: RateLimit> Clone for ChunkContext<N, L> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            limiter: Arc::clone(&self.limiter),
            meter: Arc::clone(&self.meter),
            adaptive: Arc::clone(&self.adaptive),
            retry: self.retry.clone(),
            request_timeout: self.request_timeout,
            topics: Arc::clone(&self.topics),
            token_ids: self.token_ids.clone(),
        }
    }
}

/// Result of one chunk task, tagged with its dispatch index so the orchestrator can
/// reassemble logs in range order.
pub(crate) struct ChunkOutcome {
    pub index: usize,
    pub range: RangeInclusive<u64>,
    pub retries: u32,
    pub result: Result<Vec<Log>, ScanError>,
}

/// Fetches one chunk: every address batch in sequence, each under its own retry
/// budget, followed by the post-fetch log filter.
pub(crate) async fn fetch_chunk<N: Network, L: RateLimit>(
    ctx: ChunkContext<N, L>,
    index: usize,
    range: RangeInclusive<u64>,
    batches: Vec<Vec<Address>>,
) -> ChunkOutcome {
    let mut logs = Vec::new();
    let mut retries = 0u32;

    for batch in &batches {
        match fetch_batch(&ctx, &range, batch).await {
            Ok((batch_logs, used)) => {
                retries += used;
                logs.extend(batch_logs);
            }
            Err((error, used)) => {
                retries += used;
                error!(
                    from = *range.start(),
                    to = *range.end(),
                    error = %error,
                    "chunk fetch failed"
                );
                return ChunkOutcome { index, range, retries, result: Err(error) };
            }
        }
    }

    let logs = filter_logs(logs, &ctx.topics, ctx.token_ids.as_deref());
    debug!(from = *range.start(), to = *range.end(), logs = logs.len(), retries, "chunk fetched");
    ChunkOutcome { index, range, retries, result: Ok(logs) }
}

/// One `eth_getLogs` for one chunk x one address batch, under exponential backoff.
///
/// Every attempt is rate-limited and cost-tracked individually. Each failed attempt,
/// retried or terminal, feeds the adaptive controller; so does the eventual success.
/// Returns the retries consumed alongside either the logs or the terminal error.
async fn fetch_batch<N: Network, L: RateLimit>(
    ctx: &ChunkContext<N, L>,
    range: &RangeInclusive<u64>,
    batch: &[Address],
) -> Result<(Vec<Log>, u32), (ScanError, u32)> {
    let mut filter = Filter::new().from_block(*range.start()).to_block(*range.end());
    if !batch.is_empty() {
        filter = filter.address(batch.to_vec());
    }
    if !ctx.topics.is_empty() {
        filter = filter.event_signature(ctx.topics.as_ref().clone());
    }

    let mut used = 0u32;
    let strategy = ExponentialBuilder::default()
        .with_min_delay(ctx.retry.initial_delay())
        .with_max_delay(ctx.retry.max_delay())
        .with_factor(ctx.retry.backoff_multiplier)
        .with_max_times(ctx.retry.max_attempts.saturating_sub(1) as usize);

    let result = (|| attempt(ctx, &filter))
        .retry(strategy)
        .sleep(tokio::time::sleep)
        .notify(|error: &ScanError, delay: Duration| {
            used += 1;
            ctx.adaptive.on_failure();
            debug!(error = %error, delay_ms = delay.as_millis() as u64, "retrying eth_getLogs");
        })
        .await;

    match result {
        Ok(logs) => {
            ctx.adaptive.on_success();
            Ok((logs, used))
        }
        Err(last) => {
            ctx.adaptive.on_failure();
            let exhausted = ScanError::ExhaustedRetries {
                from: *range.start(),
                to: *range.end(),
                attempts: used + 1,
                last: Arc::new(last),
            };
            Err((exhausted, used))
        }
    }
}

async fn attempt<N: Network, L: RateLimit>(
    ctx: &ChunkContext<N, L>,
    filter: &Filter,
) -> Result<Vec<Log>, ScanError> {
    ctx.limiter
        .schedule(|| async {
            ctx.meter.track(RpcMethod::GetLogs);
            match timeout(ctx.request_timeout, ctx.provider.get_logs(filter)).await {
                Ok(Ok(logs)) => Ok(logs),
                Ok(Err(error)) => Err(ScanError::from(error)),
                Err(_) => Err(ScanError::Timeout),
            }
        })
        .await
}
