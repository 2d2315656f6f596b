use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_CHAT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Upper bound for `SESSION_EXPIRY_HOURS` (one year).
pub const MAX_SESSION_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_expiry_hours: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub store_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub chat_api_url: String,
    pub chat_api_key: Option<String>,
    pub chat_model: String,
    pub chat_timeout_secs: u64,
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://frejus_chat.db?mode=rwc".to_string(),
            session_expiry_hours: 720,
            db_max_connections: 20,
            db_min_connections: 1,
            store_timeout_secs: 10,
            request_timeout_secs: 90,
            chat_api_url: DEFAULT_CHAT_API_URL.to_string(),
            chat_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_timeout_secs: 60,
            cookie_secure: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        let config = Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            session_expiry_hours: parse_var("SESSION_EXPIRY_HOURS", defaults.session_expiry_hours)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            store_timeout_secs: parse_var("STORE_TIMEOUT_SECS", defaults.store_timeout_secs)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            chat_api_url: std::env::var("CHAT_API_URL").unwrap_or(defaults.chat_api_url),
            chat_api_key: std::env::var("CHAT_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or(defaults.chat_model),
            chat_timeout_secs: parse_var("CHAT_TIMEOUT_SECS", defaults.chat_timeout_secs)?,
            cookie_secure: parse_var("COOKIE_SECURE", defaults.cookie_secure)?,
        };

        config.session_ttl()?;

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Session lifetime; must be between one hour and `MAX_SESSION_EXPIRY_HOURS`.
    pub fn session_ttl(&self) -> Result<chrono::Duration, AppError> {
        let hours = self.session_expiry_hours;
        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&hours) {
            return Err(AppError::Config(format!(
                "SESSION_EXPIRY_HOURS must be between 1 and {}, got {}",
                MAX_SESSION_EXPIRY_HOURS, hours
            )));
        }

        chrono::Duration::try_hours(hours)
            .ok_or_else(|| AppError::Config(format!("SESSION_EXPIRY_HOURS out of range: {}", hours)))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_address(), "127.0.0.1:8080");
        assert_eq!(config.chat_timeout(), Duration::from_secs(60));
        assert_eq!(config.store_timeout(), Duration::from_secs(10));
        assert_eq!(config.session_ttl().unwrap(), chrono::Duration::hours(720));
        assert!(config.chat_api_key.is_none());
    }

    #[test]
    fn session_expiry_out_of_range_is_a_config_error() {
        for hours in [0, -5, MAX_SESSION_EXPIRY_HOURS + 1, i64::MAX / 10, i64::MIN] {
            let config = Config {
                session_expiry_hours: hours,
                ..Config::default()
            };
            assert!(
                matches!(config.session_ttl(), Err(AppError::Config(_))),
                "{} hours should be rejected",
                hours
            );
        }

        let config = Config {
            session_expiry_hours: MAX_SESSION_EXPIRY_HOURS,
            ..Config::default()
        };
        assert_eq!(
            config.session_ttl().unwrap(),
            chrono::Duration::hours(MAX_SESSION_EXPIRY_HOURS)
        );
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("FREJUS_TEST_BAD_PORT", "eighty");
        let err = parse_var::<u16>("FREJUS_TEST_BAD_PORT", 1).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("FREJUS_TEST_BAD_PORT")));
        std::env::remove_var("FREJUS_TEST_BAD_PORT");
    }
}
