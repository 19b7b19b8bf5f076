use serde::{Deserialize, Serialize};

/// Build identity stamped in by the build script, reported at startup
/// and by `--version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub git_branch: String,
    pub build_time: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: env!("GIT_HASH").to_string(),
            git_branch: env!("GIT_BRANCH").to_string(),
            build_time: env!("BUILD_TIME").to_string(),
        }
    }

    /// `0.1.0-abc1234` from a git checkout, plain `0.1.0` otherwise.
    pub fn full_version(&self) -> String {
        if self.git_hash == "unknown" {
            self.version.clone()
        } else {
            format!("{}-{}", self.version, self.git_hash)
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_version())
    }
}
