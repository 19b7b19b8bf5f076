use std::fs;
use std::process::Command;

use sysinfo::System;
use tracing::debug;

use waypost_core::{DeviceProfile, NetworkAddresses};

use crate::device_id::DeviceId;
use crate::netif::{self, InterfaceKind};
use crate::vpn;

const BYTES_PER_GIB: u64 = 1_073_741_824;

/// Regions that have not adopted the metric system.
const IMPERIAL_REGIONS: [&str; 3] = ["US", "LR", "MM"];

/// One-shot snapshot of the host. Every platform query degrades to an
/// empty or default value on failure; the profile is always
/// producible.
pub fn collect_profile() -> DeviceProfile {
    let mut sys = System::new_all();
    sys.refresh_memory();

    let battery = battery_status();
    let locale = locale_facts();

    DeviceProfile {
        vpn_active: vpn::is_vpn_active(),
        device_name: System::host_name().unwrap_or_default(),
        device_model: device_model(),
        unique_id: DeviceId::derive().to_string(),
        network_addresses: NetworkAddresses {
            wifi: netif::resolve_address(InterfaceKind::Wifi),
            cellular: netif::resolve_address(InterfaceKind::Cellular),
        },
        carriers: carrier_names(),
        os_version: System::os_version().unwrap_or_default(),
        preferred_language: locale.language,
        time_zone: time_zone_id(),
        region: locale.region.clone(),
        is_charging: battery.charging,
        memory_gib: (sys.total_memory() / BYTES_PER_GIB).to_string(),
        battery_level: battery.level_percent,
        is_fully_charged: is_fully_charged(battery.level_percent),
        input_languages: locale.input_languages,
        uses_metric_system: uses_metric_system(&locale.region),
    }
}

fn is_fully_charged(level_percent: f64) -> bool {
    level_percent == 100.0
}

fn uses_metric_system(region: &str) -> bool {
    !IMPERIAL_REGIONS.contains(&region)
}

fn device_model() -> String {
    if let Ok(product) = fs::read_to_string("/sys/devices/virtual/dmi/id/product_name") {
        let product = product.trim();
        if !product.is_empty() {
            return product.to_string();
        }
    }
    System::name().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BatteryStatus {
    level_percent: f64,
    charging: bool,
}

fn battery_status() -> BatteryStatus {
    read_power_supply().unwrap_or(BatteryStatus {
        level_percent: 0.0,
        charging: false,
    })
}

fn read_power_supply() -> Option<BatteryStatus> {
    let entries = fs::read_dir("/sys/class/power_supply").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with("BAT") {
            continue;
        }
        let path = entry.path();
        let capacity = fs::read_to_string(path.join("capacity")).ok()?;
        let status = fs::read_to_string(path.join("status")).unwrap_or_default();
        return parse_battery(&capacity, &status);
    }
    None
}

fn parse_battery(capacity: &str, status: &str) -> Option<BatteryStatus> {
    let level_percent = capacity.trim().parse::<f64>().ok()?;
    Some(BatteryStatus {
        level_percent,
        charging: status.trim() == "Charging",
    })
}

struct LocaleFacts {
    language: String,
    region: String,
    input_languages: Vec<String>,
}

fn locale_facts() -> LocaleFacts {
    let tag = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
    let (language, region) = match tag.as_deref() {
        Some(tag) => parse_locale_tag(tag),
        None => ("en".to_string(), String::new()),
    };

    let input_languages = std::env::var("LANGUAGE")
        .map(|list| parse_language_list(&list))
        .unwrap_or_default();

    LocaleFacts {
        language,
        region,
        input_languages,
    }
}

/// Splits a POSIX locale tag into language and region:
/// `"en_US.UTF-8"` becomes `("en", "US")`. The `C` and `POSIX`
/// locales carry no user preference and map to the defaults.
fn parse_locale_tag(tag: &str) -> (String, String) {
    let tag = tag.split('.').next().unwrap_or(tag);
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return ("en".to_string(), String::new());
    }
    match tag.split_once('_') {
        Some((language, region)) => (language.to_string(), region.to_string()),
        None => (tag.to_string(), String::new()),
    }
}

fn parse_language_list(list: &str) -> Vec<String> {
    list.split(':')
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_locale_tag(entry).0)
        .collect()
}

fn time_zone_id() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() {
            return tz;
        }
    }
    if let Ok(tz) = fs::read_to_string("/etc/timezone") {
        let tz = tz.trim();
        if !tz.is_empty() {
            return tz.to_string();
        }
    }
    if let Ok(link) = fs::read_link("/etc/localtime") {
        let link = link.to_string_lossy().into_owned();
        if let Some(idx) = link.find("zoneinfo/") {
            return link[idx + "zoneinfo/".len()..].to_string();
        }
    }
    String::new()
}

/// Names of the mobile network operators for every modem the host
/// exposes via ModemManager. Hosts without modems (or without the
/// `mmcli` tool) yield the empty sequence.
fn carrier_names() -> Vec<String> {
    let listing = match Command::new("mmcli").arg("-L").output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
        _ => {
            debug!("modem listing unavailable, reporting no carriers");
            return Vec::new();
        }
    };

    parse_modem_paths(&listing)
        .iter()
        .filter_map(|path| {
            let output = Command::new("mmcli")
                .args(["-m", path, "--output-keyvalue"])
                .output()
                .ok()?;
            if !output.status.success() {
                return None;
            }
            parse_operator_name(&String::from_utf8_lossy(&output.stdout))
        })
        .collect()
}

fn parse_modem_paths(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.starts_with("/org/freedesktop/ModemManager1/Modem/") {
                return None;
            }
            line.split_whitespace().next().map(|path| path.to_string())
        })
        .collect()
}

fn parse_operator_name(keyvalues: &str) -> Option<String> {
    keyvalues.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() != "modem.3gpp.operator-name" {
            return None;
        }
        let value = value.trim();
        if value.is_empty() || value == "--" {
            return None;
        }
        Some(value.to_string())
    })
}
