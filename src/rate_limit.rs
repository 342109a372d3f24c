//! Token-bucket request throttling.
//!
//! Every RPC attempt the scanner makes is routed through a [`RateLimit`]
//! implementation, so the effective call rate across all concurrent chunk tasks never
//! exceeds the configured requests-per-second. The default implementation,
//! [`TokenBucket`], wraps a `governor` direct rate limiter with a burst allowance of
//! twice the sustained rate; callers that arrive faster than the refill rate queue on
//! `until_ready`.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::error::ScanError;

/// Throttling seam between the scanner and the wire.
///
/// Implementations must be shareable across concurrently running chunk tasks. The
/// trait exists so tests can substitute a limiter with deterministic behavior.
pub trait RateLimit: Send + Sync + 'static {
    /// Resolves once the caller may issue the next request.
    fn until_ready(&self) -> impl Future<Output = ()> + Send;

    /// Runs `task` no sooner than the limiter permits.
    fn schedule<T, F, Fut>(&self, task: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
        T: Send,
    {
        async move {
            self.until_ready().await;
            task().await
        }
    }
}

/// Token-bucket limiter with rate `rps` and burst capacity `2 * rps`.
pub struct TokenBucket {
    inner: DefaultDirectRateLimiter,
}

impl TokenBucket {
    /// Creates a bucket sustaining `rps` requests per second.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfiguration`] when `rps` is zero.
    pub fn new(rps: u32) -> Result<Self, ScanError> {
        let rate = NonZeroU32::new(rps)
            .ok_or(ScanError::InvalidConfiguration("rpc.rps must be greater than zero"))?;
        let burst = NonZeroU32::new(rps.saturating_mul(2)).unwrap_or(rate);
        Ok(Self { inner: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)) })
    }
}

impl RateLimit for TokenBucket {
    async fn until_ready(&self) {
        self.inner.until_ready().await;
    }
}
