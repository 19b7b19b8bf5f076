use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single cookie as stored in the session store and replayed on
/// outgoing requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: default_path(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Parses a `Set-Cookie` response header. Returns `None` for headers
    /// without a `name=value` pair. Unknown attributes are ignored;
    /// `Max-Age` takes precedence over `Expires` regardless of order.
    pub fn parse_set_cookie(header: &str, default_domain: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            domain: default_domain.to_string(),
            path: default_path(),
            expires: None,
            secure: false,
            http_only: false,
        };

        let mut saw_max_age = false;
        for attr in parts {
            let attr = attr.trim();
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr, None),
            };

            match key.to_ascii_lowercase().as_str() {
                "domain" => {
                    if let Some(v) = val {
                        cookie.domain = v.trim_start_matches('.').to_string();
                    }
                }
                "path" => {
                    if let Some(v) = val {
                        if !v.is_empty() {
                            cookie.path = v.to_string();
                        }
                    }
                }
                "max-age" => {
                    if let Some(secs) = val.and_then(|v| v.parse::<i64>().ok()) {
                        cookie.expires = Some(Utc::now() + Duration::seconds(secs));
                        saw_max_age = true;
                    }
                }
                "expires" => {
                    if !saw_max_age {
                        if let Some(t) = val.and_then(|v| DateTime::parse_from_rfc2822(v).ok()) {
                            cookie.expires = Some(t.with_timezone(&Utc));
                        }
                    }
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }

        Some(cookie)
    }
}

/// Builds the outgoing `Cookie` request header for a set of cookies.
/// Returns `None` when there is nothing to send.
pub fn request_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let pairs: Vec<String> = cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect();
    Some(pairs.join("; "))
}
