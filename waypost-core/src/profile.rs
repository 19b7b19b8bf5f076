use serde::{Deserialize, Serialize};

/// Per-interface-class addresses. An entry is `None` when the named
/// interface has no assigned address, never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddresses {
    pub wifi: Option<String>,
    pub cellular: Option<String>,
}

/// Snapshot of device, network, and locale attributes, collected once
/// per process start and handed to the reporting side as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub vpn_active: bool,
    pub device_name: String,
    pub device_model: String,
    pub unique_id: String,
    pub network_addresses: NetworkAddresses,
    pub carriers: Vec<String>,
    pub os_version: String,
    pub preferred_language: String,
    pub time_zone: String,
    pub region: String,
    pub is_charging: bool,
    pub memory_gib: String,
    /// Battery charge in percent, 0.0 to 100.0.
    pub battery_level: f64,
    /// Always equals `battery_level == 100.0`.
    pub is_fully_charged: bool,
    pub input_languages: Vec<String>,
    pub uses_metric_system: bool,
}
