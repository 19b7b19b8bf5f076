use std::fs;
use std::path::PathBuf;

use tracing::warn;

use waypost_core::Cookie;

use crate::GatewayError;

const REDIRECT_FILE: &str = "redirect_url.json";
const COOKIES_FILE: &str = "cookies.json";

/// Durable key/value store for the two session entries that must
/// survive process restarts: the last-redirected-to URL and the
/// serialized cookie jar. One file per entry; saves overwrite.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the persisted redirect URL, or `None` when nothing has
    /// been written yet. Unreadable contents degrade to `None`; the
    /// store is not load-bearing.
    pub fn load_redirect_url(&self) -> Result<Option<String>, GatewayError> {
        let path = self.dir.join(REDIRECT_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<String>(&raw) {
            Ok(url) => Ok(Some(url)),
            Err(e) => {
                warn!(error = %e, "discarding unparseable persisted redirect URL");
                Ok(None)
            }
        }
    }

    pub fn save_redirect_url(&self, url: &str) -> Result<(), GatewayError> {
        self.ensure_dir()?;
        fs::write(self.dir.join(REDIRECT_FILE), serde_json::to_string(url)?)?;
        Ok(())
    }

    /// Returns the persisted cookie jar; a never-written store yields
    /// the empty set.
    pub fn load_cookies(&self) -> Result<Vec<Cookie>, GatewayError> {
        let path = self.dir.join(COOKIES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<Vec<Cookie>>(&raw) {
            Ok(cookies) => Ok(cookies),
            Err(e) => {
                warn!(error = %e, "discarding unparseable persisted cookie jar");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_cookies(&self, cookies: &[Cookie]) -> Result<(), GatewayError> {
        self.ensure_dir()?;
        fs::write(
            self.dir.join(COOKIES_FILE),
            serde_json::to_string(cookies)?,
        )?;
        Ok(())
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }
}
