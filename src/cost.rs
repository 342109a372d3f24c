//! RPC cost accounting.
//!
//! Providers bill RPC methods in abstract credits. The scanner ticks a [`Meter`] once
//! per issued call (retries included) and exposes the aggregate through
//! [`CostSummary`], suitable both for callers and for the structured `scope = "cost"`
//! log line emitted at the end of every scan.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::config::CostConfig;

/// RPC methods the scanner issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    /// `eth_getLogs`
    GetLogs,
    /// `eth_blockNumber`
    BlockNumber,
    /// `eth_getBlockByNumber`
    GetBlockByNumber,
}

impl RpcMethod {
    /// Wire name of the method, used as the cost-weight table key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RpcMethod::GetLogs => "eth_getLogs",
            RpcMethod::BlockNumber => "eth_blockNumber",
            RpcMethod::GetBlockByNumber => "eth_getBlockByNumber",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost-accounting seam between the scanner and the billing model.
pub trait Meter: Send + Sync {
    /// Records one issued call of `method`.
    fn track(&self, method: RpcMethod);

    /// Snapshot of everything tracked so far.
    fn summary(&self) -> CostSummary;
}

/// Read-only snapshot of accumulated call cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    /// Total credits across all methods.
    pub total_credits: u64,
    /// `total_credits` converted at the configured USD rate.
    pub usd_estimate: f64,
    /// Raw call count per method name.
    pub by_method: BTreeMap<String, u64>,
}

/// Default [`Meter`]: per-method counters weighted by the configured credit table.
pub struct CostMeter {
    weights: BTreeMap<String, u64>,
    usd_per_credit: f64,
    counts: Mutex<BTreeMap<&'static str, u64>>,
}

impl CostMeter {
    /// Creates a meter with the given weight table and USD rate.
    #[must_use]
    pub fn new(config: CostConfig) -> Self {
        Self {
            weights: config.weights,
            usd_per_credit: config.usd_per_credit,
            counts: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Meter for CostMeter {
    fn track(&self, method: RpcMethod) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(method.as_str()).or_insert(0) += 1;
    }

    fn summary(&self) -> CostSummary {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let total_credits = counts
            .iter()
            .map(|(method, count)| count * self.weights.get(*method).copied().unwrap_or(0))
            .sum::<u64>();
        #[allow(clippy::cast_precision_loss)]
        let usd_estimate = total_credits as f64 * self.usd_per_credit;
        CostSummary {
            total_credits,
            usd_estimate,
            by_method: counts.iter().map(|(method, count)| ((*method).to_owned(), *count)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_meter_reports_zero() {
        let meter = CostMeter::new(CostConfig::default());
        let summary = meter.summary();
        assert_eq!(summary.total_credits, 0);
        assert_eq!(summary.usd_estimate, 0.0);
        assert!(summary.by_method.is_empty());
    }

    #[test]
    fn credits_are_weighted_per_method() {
        let meter = CostMeter::new(CostConfig::default());
        meter.track(RpcMethod::GetLogs);
        meter.track(RpcMethod::GetLogs);
        meter.track(RpcMethod::BlockNumber);

        let summary = meter.summary();
        assert_eq!(summary.by_method["eth_getLogs"], 2);
        assert_eq!(summary.by_method["eth_blockNumber"], 1);
        assert_eq!(summary.total_credits, 2 * 75 + 10);
    }

    #[test]
    fn usd_estimate_uses_configured_rate() {
        let config = CostConfig {
            weights: BTreeMap::from([("eth_getLogs".to_owned(), 100)]),
            usd_per_credit: 0.01,
        };
        let meter = CostMeter::new(config);
        meter.track(RpcMethod::GetLogs);

        let summary = meter.summary();
        assert_eq!(summary.total_credits, 100);
        assert!((summary.usd_estimate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_methods_count_but_cost_nothing() {
        let config = CostConfig { weights: BTreeMap::new(), usd_per_credit: 1.0 };
        let meter = CostMeter::new(config);
        meter.track(RpcMethod::GetBlockByNumber);

        let summary = meter.summary();
        assert_eq!(summary.by_method["eth_getBlockByNumber"], 1);
        assert_eq!(summary.total_credits, 0);
    }
}
