use std::collections::HashMap;
use std::time::Duration;

/// Slot name under which the session token is kept on the client.
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// A client-side key/value slot (cookie jar, local storage, preference store).
///
/// A `ttl` of `None` means the value lives as long as the client session.
pub trait ClientStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>);
    fn clear(&mut self, key: &str);
}

/// In-process storage, used by embedded hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, (String, Option<Duration>)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The expiry hint the value was stored with.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.values.get(key).and_then(|(_, ttl)| *ttl)
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|(value, _)| value.clone())
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) {
        self.values.insert(key.to_string(), (value.to_string(), ttl));
    }

    fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }
}
