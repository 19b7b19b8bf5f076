use std::sync::Mutex;

use waypost_core::Cookie;

/// The process-wide cookie storage the loader reads from and writes
/// back into, injected as an explicit collaborator so tests can run
/// without a real network stack.
pub trait CookieJar: Send + Sync {
    fn cookies(&self) -> Vec<Cookie>;
    fn set(&self, cookie: Cookie);
    fn clear(&self);
}

/// Mutex-guarded in-memory jar, the production stand-in for shared
/// cookie storage. `set` replaces an existing cookie with the same
/// (name, domain, path) triple.
#[derive(Default)]
pub struct SharedCookieJar {
    cookies: Mutex<Vec<Cookie>>,
}

impl SharedCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for SharedCookieJar {
    fn cookies(&self) -> Vec<Cookie> {
        self.cookies
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn set(&self, cookie: Cookie) {
        if let Ok(mut guard) = self.cookies.lock() {
            let existing = guard.iter_mut().find(|c| {
                c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path
            });
            match existing {
                Some(slot) => *slot = cookie,
                None => guard.push(cookie),
            }
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.cookies.lock() {
            guard.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_adds_then_replaces_matching_cookie() {
        let jar = SharedCookieJar::new();

        jar.set(Cookie::new("sid", "first"));
        jar.set(Cookie::new("other", "x"));
        assert_eq!(jar.cookies().len(), 2);

        jar.set(Cookie::new("sid", "second"));
        let cookies = jar.cookies();
        assert_eq!(cookies.len(), 2);
        let sid = cookies.iter().find(|c| c.name == "sid").unwrap();
        assert_eq!(sid.value, "second");
    }

    #[test]
    fn same_name_different_path_is_a_distinct_cookie() {
        let jar = SharedCookieJar::new();

        let mut scoped = Cookie::new("sid", "a");
        scoped.path = "/app".to_string();
        jar.set(scoped);
        jar.set(Cookie::new("sid", "b"));

        assert_eq!(jar.cookies().len(), 2);
    }

    #[test]
    fn clear_empties_the_jar() {
        let jar = SharedCookieJar::new();
        jar.set(Cookie::new("sid", "a"));

        jar.clear();
        assert!(jar.cookies().is_empty());
    }
}
