use std::fmt;
use std::fs;

use uuid::Uuid;

/// Stable unique identifier for this device, surfaced in the profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn derive() -> Self {
        let id_override = std::env::var("WAYPOST_DEVICE_ID").ok();
        let machine_id = std::env::var("WAYPOST_MACHINE_ID_PATH")
            .ok()
            .and_then(|path| fs::read_to_string(path).ok())
            .or_else(|| fs::read_to_string("/etc/machine-id").ok());
        let hostname = std::env::var("HOSTNAME").ok();

        Self::derive_from_sources(id_override, machine_id, hostname)
    }

    pub(crate) fn derive_from_sources(
        id_override: Option<String>,
        machine_id: Option<String>,
        hostname: Option<String>,
    ) -> Self {
        if let Some(candidate) = id_override {
            if let Ok(id) = Uuid::parse_str(candidate.trim()) {
                return Self(id);
            }
        }

        if let Some(machine_id) = machine_id {
            let name = format!("waypost:{}", machine_id.trim());
            return Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()));
        }

        if let Some(hostname) = hostname {
            let name = format!("waypost:{}", hostname.trim());
            return Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()));
        }

        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_prefers_env_override() {
        let derived = DeviceId::derive_from_sources(
            Some("0fb8bdfd-4015-40c4-9d48-908496c372b1".into()),
            Some("ignored-machine-id".into()),
            Some("ignored-host".into()),
        );

        assert_eq!(
            derived.as_uuid(),
            &Uuid::parse_str("0fb8bdfd-4015-40c4-9d48-908496c372b1").unwrap(),
        );
    }

    #[test]
    fn derive_uses_machine_id() {
        let derived = DeviceId::derive_from_sources(
            None,
            Some("test-machine-id\n".into()),
            Some("ignored-host".into()),
        );

        let expected = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"waypost:test-machine-id");
        assert_eq!(derived.as_uuid(), &expected);
    }

    #[test]
    fn derive_falls_back_to_hostname() {
        let derived = DeviceId::derive_from_sources(None, None, Some("way-host".into()));

        let expected = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"waypost:way-host");
        assert_eq!(derived.as_uuid(), &expected);
    }

    #[test]
    fn derive_ignores_malformed_override() {
        let derived = DeviceId::derive_from_sources(
            Some("not-a-uuid".into()),
            Some("test-machine-id".into()),
            None,
        );

        let expected = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"waypost:test-machine-id");
        assert_eq!(derived.as_uuid(), &expected);
    }
}
