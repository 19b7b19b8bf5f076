pub mod collector;
pub mod config;
pub mod cookies;
pub mod device_id;
pub mod loader;
pub mod netif;
pub mod store;
pub mod version;
pub mod vpn;

pub use collector::collect_profile;
pub use config::GatewayConfig;
pub use cookies::{CookieJar, SharedCookieJar};
pub use device_id::DeviceId;
pub use loader::{ContentLoader, LoaderState, NavigationEvent};
pub use netif::{resolve_address, InterfaceKind};
pub use store::SessionStore;
pub use version::VersionInfo;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
