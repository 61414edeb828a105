//! Configuration types, read from the environment with defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Backend server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    pub port: u16,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Allowed CORS origin; `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            db_path: PathBuf::from("./data/onboard-flow.db"),
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Build from `ONBOARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: std::env::var("ONBOARD_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var("ONBOARD_PORT")?.unwrap_or(defaults.port),
            db_path: std::env::var("ONBOARD_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            cors_origin: std::env::var("ONBOARD_CORS_ORIGIN")
                .ok()
                .filter(|o| !o.is_empty() && o != "*"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration for [`crate::client::BackendClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.listen_addr(), "0.0.0.0:5000");
        assert!(server.cors_origin.is_none());

        let client = ClientConfig::default();
        assert_eq!(client.base_url, "http://localhost:5000");
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_variable_is_none() {
        let parsed: Option<u16> = parse_var("ONBOARD_TEST_SURELY_UNSET_VARIABLE").unwrap();
        assert!(parsed.is_none());
    }
}
