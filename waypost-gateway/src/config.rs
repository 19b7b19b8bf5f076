use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// User-agent sent with every navigation request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; AOSP on x86_64) \
AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/89.0.4389.105 Mobile Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Externally supplied web destination to bootstrap from.
    pub target_url: String,
    /// Directory holding the persisted session entries.
    pub state_dir: PathBuf,
    /// Watchdog deadline for a single navigation hop, in seconds.
    pub watchdog_secs: u64,
    /// HTTP client timeout, in seconds.
    pub request_timeout_secs: u64,
    /// User-agent override for navigation requests.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            state_dir: default_state_dir(),
            watchdog_secs: 5,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/share/waypost"),
        None => std::env::temp_dir().join("waypost"),
    }
}

impl GatewayConfig {
    pub fn watchdog_deadline(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("WAYPOST_TARGET_URL") {
            config.target_url = url;
        }

        if let Ok(dir) = std::env::var("WAYPOST_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        if let Ok(secs) = std::env::var("WAYPOST_WATCHDOG_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.watchdog_secs = secs;
            }
        }

        if let Ok(secs) = std::env::var("WAYPOST_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(agent) = std::env::var("WAYPOST_USER_AGENT") {
            config.user_agent = agent;
        }

        config
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.target_url.is_empty() {
            return Err(GatewayError::Config("Target URL cannot be empty".to_string()));
        }

        if !self.target_url.starts_with("http://") && !self.target_url.starts_with("https://") {
            return Err(GatewayError::Config(
                "Target URL must be http or https".to_string(),
            ));
        }

        if self.watchdog_secs == 0 {
            return Err(GatewayError::Config(
                "Watchdog deadline must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(GatewayError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
