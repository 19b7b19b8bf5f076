use std::net::IpAddr;

use sysinfo::Networks;

/// Interface classes the profile reports an address for, each bound to
/// a fixed platform interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Wifi,
    Cellular,
}

impl InterfaceKind {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    pub fn interface_name(self) -> &'static str {
        match self {
            Self::Wifi => "en0",
            Self::Cellular => "pdp_ip0",
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    pub fn interface_name(self) -> &'static str {
        match self {
            Self::Wifi => "wlan0",
            Self::Cellular => "wwan0",
        }
    }
}

/// One interface/address pair from the enumeration snapshot. The
/// address is IPv4 or IPv6 by construction; other families never enter
/// the snapshot.
#[derive(Debug, Clone)]
pub struct InterfaceRecord {
    pub name: String,
    pub addr: IpAddr,
}

/// Takes a point-in-time snapshot of every interface address the host
/// exposes. An empty snapshot means enumeration turned up nothing and
/// resolves every kind to `None`.
pub fn snapshot() -> Vec<InterfaceRecord> {
    let networks = Networks::new_with_refreshed_list();
    let mut records = Vec::new();
    for (name, data) in networks.iter() {
        for ip in data.ip_networks() {
            records.push(InterfaceRecord {
                name: name.clone(),
                addr: ip.addr,
            });
        }
    }
    records
}

/// Resolves the numeric textual address of the interface bound to
/// `kind`, or `None` when no such interface has an address.
pub fn resolve_address(kind: InterfaceKind) -> Option<String> {
    resolve_from_records(&snapshot(), kind)
}

fn resolve_from_records(records: &[InterfaceRecord], kind: InterfaceKind) -> Option<String> {
    let target = kind.interface_name();
    let mut address = None;
    for record in records {
        if record.name == target {
            // Last match wins when an interface carries several addresses.
            address = Some(record.addr.to_string());
        }
    }
    address
}
