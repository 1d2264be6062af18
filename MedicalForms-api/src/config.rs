//! HTTP server configuration read from the environment

use std::env;

use axum::http::HeaderValue;
use thiserror::Error;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Default origin allowed to call `/search`
pub const DEFAULT_SEARCH_ORIGIN: &str = "http://localhost:3000";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is present but cannot be used
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Server settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port
    pub port: u16,
    /// The only origin allowed by the `/search` CORS policy
    pub search_allowed_origin: HeaderValue,
    /// Deployment name reported by `/health`
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            search_allowed_origin: HeaderValue::from_static(DEFAULT_SEARCH_ORIGIN),
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `SEARCH_ALLOWED_ORIGIN` and `APP_ENV`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value })?,
            None => defaults.port,
        };

        let search_allowed_origin = match lookup("SEARCH_ALLOWED_ORIGIN") {
            Some(value) => HeaderValue::from_str(&value)
                .map_err(|_| ConfigError::InvalidValue { name: "SEARCH_ALLOWED_ORIGIN", value })?,
            None => defaults.search_allowed_origin,
        };

        Ok(Self {
            port,
            search_allowed_origin,
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
        })
    }
}
