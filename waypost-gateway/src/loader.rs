use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use waypost_core::{cookie, Cookie};

use crate::config::GatewayConfig;
use crate::cookies::CookieJar;
use crate::store::SessionStore;
use crate::GatewayError;

/// Persisted sentinel meaning "no redirect recorded".
pub const ABOUT_BLANK: &str = "about:blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Requesting,
    Loading,
    Loaded,
    Failed,
}

/// Navigation callbacks from the transport layer, expressed as typed
/// events so the transition logic stays independent of any particular
/// rendering or HTTP surface.
#[derive(Debug, Clone)]
pub enum NavigationEvent {
    Started { url: String },
    Succeeded { final_url: String },
    Failed { reason: String },
}

/// Picks the URL a navigation attempt starts from: the persisted
/// redirect target when one exists, the supplied target otherwise.
pub fn effective_url(persisted: Option<&str>, target: &str) -> String {
    match persisted {
        Some(url) if !url.is_empty() && url != ABOUT_BLANK => url.to_string(),
        _ => target.to_string(),
    }
}

/// One-shot deadline timer describing a slow navigation hop. Firing is
/// a diagnostic signal only; it forces no state change and no retry.
struct Watchdog {
    deadline: Duration,
    task: Option<JoinHandle<()>>,
}

impl Watchdog {
    fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            task: None,
        }
    }

    /// Arms the timer for a new hop, invalidating any previous one.
    fn arm(&mut self, url: &str) {
        self.cancel();
        let deadline = self.deadline;
        let url = url.to_string();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!(
                %url,
                deadline_secs = deadline.as_secs(),
                "page did not finish loading before the watchdog deadline"
            );
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Loads the remotely specified destination, carrying cookies across
/// restarts and recording where redirects land so the next start
/// resumes there.
pub struct ContentLoader {
    target_url: String,
    effective_url: String,
    state: LoaderState,
    page_loaded: bool,
    watchdog: Watchdog,
    store: SessionStore,
    jar: Arc<dyn CookieJar>,
    client: reqwest::Client,
}

impl ContentLoader {
    pub fn new(
        config: &GatewayConfig,
        store: SessionStore,
        jar: Arc<dyn CookieJar>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            target_url: config.target_url.clone(),
            effective_url: config.target_url.clone(),
            state: LoaderState::Idle,
            page_loaded: false,
            watchdog: Watchdog::new(config.watchdog_deadline()),
            store,
            jar,
            client,
        })
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// The URL the current navigation attempt started from.
    pub fn effective_url(&self) -> &str {
        &self.effective_url
    }

    pub fn page_loaded(&self) -> bool {
        self.page_loaded
    }

    /// Runs one navigation attempt to completion. Each call re-reads
    /// the persisted redirect URL, so a fresh attempt resumes wherever
    /// the previous one was redirected to.
    pub async fn navigate(&mut self) -> Result<LoaderState, GatewayError> {
        self.restore_cookies()?;

        let persisted = self.store.load_redirect_url()?;
        self.effective_url = effective_url(persisted.as_deref(), &self.target_url);
        self.state = LoaderState::Requesting;
        self.page_loaded = false;
        info!(url = %self.effective_url, "starting navigation");

        let request = self.build_request();
        self.apply_event(NavigationEvent::Started {
            url: self.effective_url.clone(),
        });

        match request.send().await {
            Ok(response) => {
                let final_url = response.url().to_string();
                self.capture_cookies(&response);
                self.apply_event(NavigationEvent::Succeeded { final_url });
            }
            Err(err) => {
                self.apply_event(NavigationEvent::Failed {
                    reason: err.to_string(),
                });
            }
        }

        Ok(self.state)
    }

    /// Applies one navigation event to the state machine. Terminal
    /// events invalidate the watchdog; every `Started` re-arms it so
    /// the deadline describes the current hop, not the whole chain.
    pub fn apply_event(&mut self, event: NavigationEvent) {
        match event {
            NavigationEvent::Started { url } => {
                self.page_loaded = false;
                self.state = LoaderState::Loading;
                self.watchdog.arm(&url);
            }
            NavigationEvent::Succeeded { final_url } => {
                self.watchdog.cancel();
                self.page_loaded = true;
                self.state = LoaderState::Loaded;

                if final_url != self.effective_url {
                    info!(from = %self.effective_url, to = %final_url, "persisting redirect target");
                    if let Err(err) = self.store.save_redirect_url(&final_url) {
                        warn!(error = %err, "failed to persist redirect target");
                    }
                }
            }
            NavigationEvent::Failed { reason } => {
                self.watchdog.cancel();
                self.page_loaded = false;
                self.state = LoaderState::Failed;
                error!(%reason, "navigation failed");
            }
        }
    }

    /// The bootstrap handshake POSTs to the original target; a
    /// persisted redirect target is fetched with a plain GET.
    fn build_request(&self) -> reqwest::RequestBuilder {
        let mut request = if self.effective_url == self.target_url {
            self.client
                .post(self.effective_url.as_str())
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
        } else {
            self.client.get(self.effective_url.as_str())
        };

        if let Some(header) = cookie::request_header(&self.jar.cookies()) {
            request = request.header(COOKIE, header);
        }

        request
    }

    /// Merges persisted cookies into the shared jar so the store and
    /// the jar agree before the request goes out.
    fn restore_cookies(&self) -> Result<(), GatewayError> {
        for cookie in self.store.load_cookies()? {
            self.jar.set(cookie);
        }
        Ok(())
    }

    fn capture_cookies(&self, response: &reqwest::Response) {
        let default_domain = response.url().host_str().unwrap_or("").to_string();

        let mut captured = false;
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                if let Some(cookie) = Cookie::parse_set_cookie(raw, &default_domain) {
                    self.jar.set(cookie);
                    captured = true;
                }
            }
        }

        if captured {
            if let Err(err) = self.store.save_cookies(&self.jar.cookies()) {
                warn!(error = %err, "failed to persist cookie jar");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::SharedCookieJar;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_loader(target: &str, dir: &TempDir) -> ContentLoader {
        let config = GatewayConfig {
            target_url: target.to_string(),
            state_dir: dir.path().to_path_buf(),
            request_timeout_secs: 5,
            ..GatewayConfig::default()
        };
        let store = SessionStore::new(dir.path());
        ContentLoader::new(&config, store, Arc::new(SharedCookieJar::new())).unwrap()
    }

    #[test]
    fn effective_url_falls_back_to_target() {
        let target = "https://start.example/landing";

        assert_eq!(effective_url(None, target), target);
        assert_eq!(effective_url(Some(""), target), target);
        assert_eq!(effective_url(Some("about:blank"), target), target);
    }

    #[test]
    fn effective_url_prefers_persisted_redirect() {
        assert_eq!(
            effective_url(Some("https://x.example/path"), "https://start.example"),
            "https://x.example/path"
        );
    }

    #[tokio::test]
    async fn started_event_enters_loading_and_arms_watchdog() {
        let dir = TempDir::new().unwrap();
        let mut loader = test_loader("https://start.example", &dir);
        loader.state = LoaderState::Requesting;

        loader.apply_event(NavigationEvent::Started {
            url: "https://start.example".into(),
        });

        assert_eq!(loader.state(), LoaderState::Loading);
        assert!(!loader.page_loaded());
        assert!(loader.watchdog.is_armed());
    }

    #[tokio::test]
    async fn success_with_redirect_persists_final_url() {
        let dir = TempDir::new().unwrap();
        let mut loader = test_loader("https://start.example", &dir);
        loader.state = LoaderState::Loading;

        loader.apply_event(NavigationEvent::Succeeded {
            final_url: "https://moved.example/here".into(),
        });

        assert_eq!(loader.state(), LoaderState::Loaded);
        assert!(loader.page_loaded());
        assert!(!loader.watchdog.is_armed());
        assert_eq!(
            loader.store.load_redirect_url().unwrap(),
            Some("https://moved.example/here".to_string())
        );
    }

    #[tokio::test]
    async fn success_without_redirect_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let mut loader = test_loader("https://start.example", &dir);
        loader.store.save_redirect_url("https://sticky.example").unwrap();
        loader.state = LoaderState::Loading;

        loader.apply_event(NavigationEvent::Succeeded {
            final_url: "https://start.example".into(),
        });

        assert_eq!(loader.state(), LoaderState::Loaded);
        assert_eq!(
            loader.store.load_redirect_url().unwrap(),
            Some("https://sticky.example".to_string())
        );
    }

    #[tokio::test]
    async fn failure_is_terminal_from_any_prior_state() {
        for prior in [LoaderState::Requesting, LoaderState::Loading] {
            let dir = TempDir::new().unwrap();
            let mut loader = test_loader("https://start.example", &dir);
            loader.state = prior;
            if prior == LoaderState::Loading {
                loader.apply_event(NavigationEvent::Started {
                    url: "https://start.example".into(),
                });
            }

            loader.apply_event(NavigationEvent::Failed {
                reason: "connection reset".into(),
            });

            assert_eq!(loader.state(), LoaderState::Failed);
            assert!(!loader.page_loaded());
            assert!(!loader.watchdog.is_armed());
        }
    }

    #[tokio::test]
    async fn each_redirect_hop_rearms_the_watchdog() {
        let dir = TempDir::new().unwrap();
        let mut loader = test_loader("https://start.example", &dir);
        loader.state = LoaderState::Requesting;

        for hop in ["https://start.example", "https://hop.example/a"] {
            loader.apply_event(NavigationEvent::Started { url: hop.into() });
            assert!(loader.watchdog.is_armed());
            assert!(!loader.page_loaded());
        }
    }

    #[tokio::test]
    async fn watchdog_firing_forces_no_transition_and_no_retry() {
        let dir = TempDir::new().unwrap();
        let config = GatewayConfig {
            target_url: "https://start.example".to_string(),
            state_dir: dir.path().to_path_buf(),
            watchdog_secs: 1,
            ..GatewayConfig::default()
        };
        let store = SessionStore::new(dir.path());
        let mut loader =
            ContentLoader::new(&config, store, Arc::new(SharedCookieJar::new())).unwrap();
        loader.state = LoaderState::Requesting;

        loader.apply_event(NavigationEvent::Started {
            url: "https://start.example".into(),
        });
        assert!(loader.watchdog.is_armed());

        // Let the deadline pass; the timer logs and runs to completion.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!loader.watchdog.is_armed());

        // Firing is diagnostic only: still mid-load, nothing re-issued.
        assert_eq!(loader.state(), LoaderState::Loading);
        assert!(!loader.page_loaded());
        assert_eq!(loader.store.load_redirect_url().unwrap(), None);

        // The attempt's own terminal callback still lands normally.
        loader.apply_event(NavigationEvent::Succeeded {
            final_url: "https://start.example".into(),
        });
        assert_eq!(loader.state(), LoaderState::Loaded);
    }

    #[tokio::test]
    async fn navigate_to_unreachable_target_fails_without_retry() {
        let dir = TempDir::new().unwrap();
        // Nothing listens on port 1.
        let mut loader = test_loader("http://127.0.0.1:1/", &dir);

        let state = loader.navigate().await.unwrap();

        assert_eq!(state, LoaderState::Failed);
        assert_eq!(loader.store.load_redirect_url().unwrap(), None);
    }

    /// Minimal HTTP server: redirects `/` to `/landing`, serves
    /// `/landing` with a session cookie, and records request heads.
    async fn spawn_redirect_server(requests: Arc<Mutex<Vec<String>>>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let requests = requests.clone();

                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let head = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let path = head
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    requests.lock().unwrap().push(head);

                    let response = if path == "/landing" {
                        "HTTP/1.1 200 OK\r\n\
                         Set-Cookie: sid=abc123; Path=/; HttpOnly\r\n\
                         Content-Length: 2\r\n\
                         Connection: close\r\n\r\nok"
                            .to_string()
                    } else {
                        format!(
                            "HTTP/1.1 302 Found\r\n\
                             Location: http://{addr}/landing\r\n\
                             Content-Length: 0\r\n\
                             Connection: close\r\n\r\n"
                        )
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn navigate_follows_redirect_and_persists_session() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let addr = spawn_redirect_server(requests.clone()).await;
        let dir = TempDir::new().unwrap();
        let target = format!("http://{addr}/");

        let mut loader = test_loader(&target, &dir);
        loader.store.save_cookies(&[Cookie::new("stored", "v1")]).unwrap();

        let state = loader.navigate().await.unwrap();

        assert_eq!(state, LoaderState::Loaded);
        assert_eq!(loader.effective_url(), target);
        // Redirect stickiness: the final URL survives for the next start.
        assert_eq!(
            loader.store.load_redirect_url().unwrap(),
            Some(format!("http://{addr}/landing"))
        );
        // The response cookie landed in the jar and the store.
        let persisted = loader.store.load_cookies().unwrap();
        assert!(persisted.iter().any(|c| c.name == "sid" && c.value == "abc123"));
        assert!(persisted.iter().any(|c| c.name == "stored"));

        // The bootstrap hop was a POST carrying the stored cookie.
        let heads = requests.lock().unwrap().clone();
        assert!(heads[0].starts_with("POST / "));
        assert!(heads[0].contains("stored=v1"));
    }

    #[tokio::test]
    async fn second_navigation_resumes_persisted_redirect() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let addr = spawn_redirect_server(requests.clone()).await;
        let dir = TempDir::new().unwrap();
        let target = format!("http://{addr}/");

        let mut loader = test_loader(&target, &dir);
        loader.navigate().await.unwrap();
        let state = loader.navigate().await.unwrap();

        assert_eq!(state, LoaderState::Loaded);
        // Second attempt starts from the persisted landing URL.
        assert_eq!(loader.effective_url(), format!("http://{addr}/landing"));
        // Final equals effective, so the entry is unchanged.
        assert_eq!(
            loader.store.load_redirect_url().unwrap(),
            Some(format!("http://{addr}/landing"))
        );

        let heads = requests.lock().unwrap().clone();
        // A resumed destination is fetched with a plain GET.
        let last = heads.last().unwrap();
        assert!(last.starts_with("GET /landing "));
    }
}
