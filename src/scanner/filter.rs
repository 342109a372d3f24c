use std::collections::HashSet;

use alloy::primitives::{B256, U256};
use alloy::rpc::types::Log;

/// Post-fetch log filtering.
///
/// Two independent, composable passes:
///
/// 1. a topic re-check against the resolved event-topic set. The same set is already
///    applied server-side, but some providers ignore or only partially honor topic
///    filters, so the response is checked again here. An empty set disables the pass.
/// 2. an optional token-id allow-list for ERC-721-style events: `topics[1]` is decoded
///    as an unsigned big-endian integer and its base-10 rendering must be a member of
///    the allow-list. Logs without a second topic are dropped while this pass is
///    active.
pub(crate) fn filter_logs(
    logs: Vec<Log>,
    topics: &[B256],
    token_ids: Option<&HashSet<String>>,
) -> Vec<Log> {
    logs.into_iter()
        .filter(|log| matches_topic(log, topics))
        .filter(|log| matches_token_id(log, token_ids))
        .collect()
}

fn matches_topic(log: &Log, topics: &[B256]) -> bool {
    if topics.is_empty() {
        return true;
    }
    log.inner.data.topics().first().is_some_and(|topic| topics.contains(topic))
}

fn matches_token_id(log: &Log, allow: Option<&HashSet<String>>) -> bool {
    let Some(allow) = allow else {
        return true;
    };
    let Some(topic) = log.inner.data.topics().get(1) else {
        return false;
    };
    allow.contains(&U256::from_be_slice(topic.as_slice()).to_string())
}
