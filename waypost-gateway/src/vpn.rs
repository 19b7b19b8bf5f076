use sysinfo::Networks;
use tracing::debug;

/// Interface name prefixes associated with tunnel-style VPNs. A
/// prefix match is a heuristic signal; some VPN implementations will
/// not be detected.
pub const VPN_INTERFACE_PREFIXES: [&str; 8] = [
    "tap", "tun", "ppp", "ipsec", "utun", "ipsec0", "utun1", "utun2",
];

/// Reports whether a VPN-like tunnel interface is currently present.
/// An unavailable configuration snapshot yields `false`, never an
/// error.
pub fn is_vpn_active() -> bool {
    match scoped_interface_keys() {
        Some(keys) => has_vpn_prefix(&keys),
        None => {
            debug!("interface configuration unavailable, assuming no VPN");
            false
        }
    }
}

/// Per-interface configuration keys from the current network snapshot.
fn scoped_interface_keys() -> Option<Vec<String>> {
    let networks = Networks::new_with_refreshed_list();
    let keys: Vec<String> = networks.iter().map(|(name, _)| name.clone()).collect();
    if keys.is_empty() {
        return None;
    }
    Some(keys)
}

fn has_vpn_prefix(keys: &[String]) -> bool {
    keys.iter()
        .any(|key| VPN_INTERFACE_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
}
