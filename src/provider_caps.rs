//! Provider-specific block-window ceilings.
//!
//! Some public endpoints hard-limit the span an `eth_getLogs` call may cover. The table
//! below maps hostname substrings to those ceilings; unmatched hosts get
//! [`DEFAULT_PROVIDER_CAP`]. The table is a business rule, not configuration.

use url::Url;

/// Block-window ceiling applied to endpoints not present in the cap table.
pub const DEFAULT_PROVIDER_CAP: u64 = 1000;

/// Ordered `(hostname substring, cap)` pairs; first match wins.
const HOST_CAPS: &[(&str, u64)] = &[("cloudflare-eth.com", 25), ("alchemy.com", 2000)];

/// Returns the block-window cap for the endpoint behind `url`.
pub(crate) fn provider_cap(url: &Url) -> u64 {
    let Some(host) = url.host_str() else {
        return DEFAULT_PROVIDER_CAP;
    };
    HOST_CAPS
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map_or(DEFAULT_PROVIDER_CAP, |(_, cap)| *cap)
}

/// Clamps a requested block window to the provider cap.
pub(crate) fn effective_window(requested: u64, cap: u64) -> u64 {
    requested.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap_for(url: &str) -> u64 {
        provider_cap(&url.parse().unwrap())
    }

    #[test]
    fn low_throughput_host_caps_at_25() {
        assert_eq!(cap_for("https://cloudflare-eth.com"), 25);
    }

    #[test]
    fn high_throughput_host_caps_at_2000() {
        assert_eq!(cap_for("https://eth-mainnet.g.alchemy.com/v2/some-key"), 2000);
    }

    #[test]
    fn unknown_hosts_default_to_1000() {
        assert_eq!(cap_for("http://localhost:8545"), DEFAULT_PROVIDER_CAP);
        assert_eq!(cap_for("https://rpc.example.org"), DEFAULT_PROVIDER_CAP);
    }

    #[test]
    fn effective_window_never_exceeds_cap() {
        assert_eq!(effective_window(5000, 25), 25);
        assert_eq!(effective_window(1000, 2000), 1000);
        assert_eq!(effective_window(u64::MAX, DEFAULT_PROVIDER_CAP), DEFAULT_PROVIDER_CAP);
    }
}
