//! Event-signature to topic-hash resolution.

use alloy::primitives::{B256, keccak256};

/// Resolves event signatures (`"Transfer(address,address,uint256)"`) to the topic
/// hashes an `eth_getLogs` filter matches on.
///
/// An empty input yields an empty set, which the scanner treats as "no topic filter".
#[must_use]
pub fn resolve_event_topics(events: &[String]) -> Vec<B256> {
    events.iter().map(|signature| keccak256(signature.trim().as_bytes())).collect()
}
