use std::collections::HashMap;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;

use crate::auth::{ClientStorage, SESSION_TOKEN_KEY};

/// `ClientStorage` over HTTP cookies: reads the request's `Cookie` header and
/// queues `Set-Cookie` headers for the response.
#[derive(Debug, Clone, Default)]
pub struct CookieStorage {
    incoming: HashMap<String, String>,
    outgoing: Vec<String>,
    secure: bool,
}

impl CookieStorage {
    /// A bearer token, when sent, stands in for the session cookie.
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let mut incoming = HashMap::new();

        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            for pair in value.split(';') {
                if let Some((name, val)) = pair.trim().split_once('=') {
                    incoming.insert(name.trim().to_string(), val.trim().to_string());
                }
            }
        }

        if let Some(token) = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            incoming.insert(SESSION_TOKEN_KEY.to_string(), token.trim().to_string());
        }

        Self {
            incoming,
            outgoing: Vec::new(),
            secure,
        }
    }

    /// `Set-Cookie` values queued so far.
    pub fn pending(&self) -> &[String] {
        &self.outgoing
    }

    pub fn apply(self, response: &mut Response) {
        for cookie in self.outgoing {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("dropping unencodable cookie: {}", e),
            }
        }
    }

    fn attributes(&self) -> &'static str {
        if self.secure {
            "; Path=/; HttpOnly; SameSite=Lax; Secure"
        } else {
            "; Path=/; HttpOnly; SameSite=Lax"
        }
    }
}

impl ClientStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.incoming.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) {
        let max_age = ttl
            .map(|ttl| format!("; Max-Age={}", ttl.as_secs()))
            .unwrap_or_default();
        self.outgoing
            .push(format!("{}={}{}{}", key, value, self.attributes(), max_age));
        self.incoming.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self, key: &str) {
        self.outgoing
            .push(format!("{}={}; Max-Age=0", key, self.attributes()));
        self.incoming.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn reads_token_from_cookie_header() {
        let storage = CookieStorage::from_headers(
            &headers(&[("cookie", "theme=dark; session_token=abc123")]),
            false,
        );
        assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));
        assert!(storage.get("missing").is_none());
    }

    #[test]
    fn bearer_header_overrides_cookie() {
        let storage = CookieStorage::from_headers(
            &headers(&[
                ("cookie", "session_token=from-cookie"),
                ("authorization", "Bearer from-header"),
            ]),
            false,
        );
        assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some("from-header"));
    }

    #[test]
    fn set_and_clear_emit_headers() {
        let mut storage = CookieStorage::from_headers(&HeaderMap::new(), true);
        storage.set(SESSION_TOKEN_KEY, "tok", Some(Duration::from_secs(3600)));
        storage.set("plain", "v", None);
        storage.clear("old");

        assert_eq!(
            storage.pending(),
            [
                "session_token=tok; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=3600",
                "plain=v; Path=/; HttpOnly; SameSite=Lax; Secure",
                "old=; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=0",
            ]
        );
        assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some("tok"));

        let mut response = Response::new(axum::body::Body::empty());
        storage.apply(&mut response);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 3);
    }
}
