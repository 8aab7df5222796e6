use std::net::SocketAddr;

use taskboard_core::Db;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3003";
pub const DEFAULT_SESSION_COOKIE: &str = "better-auth.session_token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address `{value}`: {source}")]
    InvalidAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("session cookie name must not be empty")]
    EmptySessionCookie,
    #[error("could not resolve the default database location: {0}")]
    DatabaseLocation(#[source] taskboard_core::Error),
}

/// Resolved settings for `taskboard serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub session_cookie: String,
}

impl ServerConfig {
    pub fn resolve(
        database_url: Option<String>,
        addr: &str,
        session_cookie: &str,
    ) -> Result<Self, ConfigError> {
        let addr = addr.parse().map_err(|source| ConfigError::InvalidAddr {
            value: addr.to_owned(),
            source,
        })?;

        let session_cookie = session_cookie.trim();
        if session_cookie.is_empty() {
            return Err(ConfigError::EmptySessionCookie);
        }

        Ok(ServerConfig {
            database_url: resolve_database_url(database_url)?,
            addr,
            session_cookie: session_cookie.to_owned(),
        })
    }
}

/// An explicit URL wins; otherwise the per-user state directory.
pub fn resolve_database_url(database_url: Option<String>) -> Result<String, ConfigError> {
    match database_url.filter(|url| !url.is_empty()) {
        Some(url) => Ok(url),
        None => Db::default_url().map_err(ConfigError::DatabaseLocation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Option<String> {
        Some("sqlite::memory:".into())
    }

    #[test]
    fn resolves_explicit_values() {
        let config = ServerConfig::resolve(memory(), "0.0.0.0:8080", "sid").unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.session_cookie, "sid");
    }

    #[test]
    fn rejects_bad_address() {
        let err = ServerConfig::resolve(memory(), "localhost", "sid").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr { ref value, .. } if value == "localhost"));
    }

    #[test]
    fn rejects_blank_cookie_name() {
        let err = ServerConfig::resolve(memory(), DEFAULT_ADDR, "  ").unwrap_err();
        assert!(matches!(err, ConfigError::EmptySessionCookie));
    }
}
