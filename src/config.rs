//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;

/// Signing secret used outside production when `JWT_SECRET` is unset.
/// Never acceptable for a deployed server.
pub const DEV_JWT_SECRET: &str = "dev-secret-not-for-production";

/// Token signing secret. `Debug` output is redacted.
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret([REDACTED])")
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secret for signing bearer tokens
    pub jwt_secret: JwtSecret,

    /// True when `jwt_secret` is the development fallback
    pub jwt_secret_is_fallback: bool,

    /// Origin allowed by CORS
    pub allow_origin: String,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = var("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let (jwt_secret, jwt_secret_is_fallback) = match var("JWT_SECRET") {
            Some(secret) => (JwtSecret::new(secret), false),
            None if environment == "production" => {
                return Err(ConfigError::MissingEnv("JWT_SECRET"));
            }
            None => (JwtSecret::new(DEV_JWT_SECRET), true),
        };

        let allow_origin =
            var("ALLOW_ORIGIN").unwrap_or_else(|| "http://localhost:5174".to_string());

        let run_migrations = match var("RUN_MIGRATIONS").as_deref() {
            None => true,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(_) => return Err(ConfigError::InvalidValue("RUN_MIGRATIONS")),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            jwt_secret_is_fallback,
            allow_origin,
            run_migrations,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db")]))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.allow_origin, "http://localhost:5174");
        assert!(config.run_migrations);
        assert_eq!(config.environment, "development");
        assert!(config.jwt_secret_is_fallback);
        assert_eq!(config.jwt_secret.as_bytes(), DEV_JWT_SECRET.as_bytes());
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("DATABASE_URL")));
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("JWT_SECRET")));

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "a-real-secret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, "production");
        assert!(!config.jwt_secret_is_fallback);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("PORT")));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "super-sensitive-value"),
        ]))
        .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-sensitive-value"));
        assert!(printed.contains("[REDACTED]"));
    }
}
