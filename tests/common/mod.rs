#![allow(dead_code)]

use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use alloy::providers::mock::Asserter;
use alloy::rpc::client::RpcClient;
use logsweep::{LogScanner, LogScannerBuilder, ScannerConfig};
use serde_json::{Value, json};

pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
pub const APPROVAL_TOPIC: &str =
    "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";

/// A configuration that makes mocked scans deterministic: one chunk in flight at a
/// time, a rate limit far above anything a test issues, and short retry delays.
pub fn sequential_config() -> ScannerConfig {
    let mut config = ScannerConfig::new("http://localhost:8545");
    config.rpc.rps = 1000;
    config.rpc.concurrency = 1;
    config.rpc.min_concurrency = 1;
    config.retry.initial_delay_ms = 10;
    config.retry.max_delay_ms = 50;
    config
}

/// Builds a scanner backed by a mocked transport; queued responses are served in
/// FIFO order.
pub fn mocked_scanner(config: ScannerConfig) -> (LogScanner, Asserter) {
    let asserter = Asserter::new();
    let provider = RootProvider::<Ethereum>::new(RpcClient::mocked(asserter.clone()));
    let scanner = LogScannerBuilder::new(config)
        .connect_provider(provider)
        .expect("scanner construction should succeed");
    (scanner, asserter)
}

/// A 32-byte topic word holding `value`.
pub fn topic_word(value: u64) -> String {
    format!("0x{value:064x}")
}

/// Minimal `eth_getLogs` entry as the transport would return it.
pub fn log_json(block_number: u64, topics: &[&str]) -> Value {
    json!({
        "address": "0x0d4a11d5eeaac28ec3f61d100daf4d40471f1852",
        "topics": topics,
        "data": "0x",
        "blockNumber": format!("0x{block_number:x}"),
        "logIndex": "0x0",
        "removed": false,
    })
}

/// Full `eth_getBlockByNumber` response with the given number and timestamp.
pub fn block_json(number: u64, timestamp: u64) -> Value {
    let zero_hash = format!("0x{}", "0".repeat(64));
    json!({
        "hash": format!("0x{number:064x}"),
        "parentHash": zero_hash,
        "sha3Uncles": zero_hash,
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": zero_hash,
        "transactionsRoot": zero_hash,
        "receiptsRoot": zero_hash,
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "difficulty": "0x0",
        "number": format!("0x{number:x}"),
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "timestamp": format!("0x{timestamp:x}"),
        "extraData": "0x",
        "mixHash": zero_hash,
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x0",
        "size": "0x0",
        "uncles": [],
        "transactions": [],
    })
}
