use alloy::primitives::Address;

/// Maximum number of contract addresses one `eth_getLogs` filter may carry.
///
/// A protocol-imposed filter limit, unrelated to the block-window cap.
pub const ADDRESS_BATCH_SIZE: usize = 20;

/// Splits `addresses` into ordered groups of at most `batch_size`.
///
/// Input order is preserved and the last group may be smaller. Empty input yields no
/// groups; the orchestrator maps that case to a single unconstrained fetch.
pub(crate) fn address_batches(addresses: &[Address], batch_size: usize) -> Vec<Vec<Address>> {
    addresses.chunks(batch_size.max(1)).map(<[Address]>::to_vec).collect()
}
