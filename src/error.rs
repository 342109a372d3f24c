use std::sync::Arc;

use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Errors emitted by the scanner.
///
/// `ScanError` values are returned by [`LogScannerBuilder`](crate::LogScannerBuilder)
/// construction methods and by the scan operations themselves.
///
/// [`ScanError::Rpc`] and [`ScanError::Timeout`] are transient: the retry controller
/// absorbs them and callers only observe them wrapped inside
/// [`ScanError::ExhaustedRetries`]. All other variants are terminal.
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    /// The requested range has `from_block > to_block`.
    ///
    /// Rejected before any network or cost-meter activity.
    #[error("invalid block range: from_block {from} exceeds to_block {to}")]
    InvalidRange {
        /// Requested start of the range.
        from: u64,
        /// Requested end of the range.
        to: u64,
    },

    /// A collaborator configuration value is malformed. Raised once, at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// The underlying RPC transport returned an error.
    #[error("RPC error: {0}")]
    Rpc(Arc<RpcError<TransportErrorKind>>),

    /// A request exceeded the configured timeout.
    #[error("RPC request timed out")]
    Timeout,

    /// A chunk fetch failed on every attempt of its retry budget.
    #[error("retries exhausted for blocks {from}..={to} after {attempts} attempts: {last}")]
    ExhaustedRetries {
        /// First block of the failed chunk.
        from: u64,
        /// Last block of the failed chunk.
        to: u64,
        /// Total attempts consumed, including the first.
        attempts: u32,
        /// The transient error observed on the final attempt.
        last: Arc<ScanError>,
    },

    /// A requested block does not exist on the endpoint.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// The scan was cancelled before this range was dispatched.
    #[error("scan cancelled")]
    Cancelled,
}

impl From<RpcError<TransportErrorKind>> for ScanError {
    fn from(error: RpcError<TransportErrorKind>) -> Self {
        ScanError::Rpc(Arc::new(error))
    }
}

impl ScanError {
    /// True for errors the retry controller is allowed to absorb.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanError::Rpc(_) | ScanError::Timeout)
    }
}
