use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::{RetryConfig, RpcConfig};

/// Shared adaptation state, owned exclusively by one scanner instance.
///
/// Outcome signals arrive from concurrently running chunk tasks, so the streak
/// counters and the concurrency value live behind a single mutex.
#[derive(Debug)]
struct ScannerState {
    concurrency: usize,
    consecutive_failures: u32,
    consecutive_successes: u32,
    block_window: u64,
}

/// Increase/decrease-by-one concurrency controller driven by outcome streaks.
///
/// Every fetch failure and success feeds this controller, whether or not the failure is
/// later retried successfully. A failure streak reaching `failure_threshold` steps the
/// concurrency down by one (floored at the configured minimum); a success streak
/// reaching `success_threshold` steps it back up (capped at the originally configured
/// maximum). Incrementing one streak zeroes the other, and reaching a threshold zeroes
/// its own streak whether or not the step changed anything.
///
/// Changes apply to subsequently dispatched chunks only; in-flight fetches are never
/// preempted.
#[derive(Debug)]
pub(crate) struct AdaptiveConcurrency {
    min: usize,
    max: usize,
    failure_threshold: u32,
    success_threshold: u32,
    state: Mutex<ScannerState>,
}

impl AdaptiveConcurrency {
    pub fn new(rpc: &RpcConfig, retry: &RetryConfig) -> Self {
        Self {
            min: rpc.min_concurrency,
            max: rpc.concurrency,
            failure_threshold: retry.failure_threshold,
            success_threshold: retry.success_threshold,
            state: Mutex::new(ScannerState {
                concurrency: rpc.concurrency,
                consecutive_failures: 0,
                consecutive_successes: 0,
                block_window: rpc.block_window,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScannerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Concurrency limit for the next dispatch.
    pub fn current(&self) -> usize {
        self.state().concurrency
    }

    /// Effective block window of the scan in progress.
    pub fn block_window(&self) -> u64 {
        self.state().block_window
    }

    /// Records the effective window at scan start.
    pub fn set_block_window(&self, window: u64) {
        self.state().block_window = window;
    }

    /// Feeds one fetch failure into the controller.
    pub fn on_failure(&self) {
        let mut state = self.state();
        state.consecutive_successes = 0;
        state.consecutive_failures += 1;
        if state.consecutive_failures < self.failure_threshold {
            return;
        }
        state.consecutive_failures = 0;
        let previous = state.concurrency;
        state.concurrency = state.concurrency.saturating_sub(1).max(self.min);
        if state.concurrency == previous {
            debug!(concurrency = previous, "failure streak hit threshold at minimum concurrency");
        } else {
            warn!(
                previous,
                current = state.concurrency,
                threshold = self.failure_threshold,
                "reduced fetch concurrency after failure streak"
            );
        }
    }

    /// Feeds one fetch success into the controller.
    pub fn on_success(&self) {
        let mut state = self.state();
        state.consecutive_failures = 0;
        state.consecutive_successes += 1;
        if state.consecutive_successes < self.success_threshold {
            return;
        }
        state.consecutive_successes = 0;
        let previous = state.concurrency;
        state.concurrency = (state.concurrency + 1).min(self.max);
        if state.concurrency != previous {
            info!(
                previous,
                current = state.concurrency,
                threshold = self.success_threshold,
                "raised fetch concurrency after success streak"
            );
        }
    }
}
