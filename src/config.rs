// Application configuration loaded from the environment at startup

use std::fmt;
use std::time::Duration;

/// Configuration errors raised while reading the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment environment, read from APP_ENV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::Invalid {
                name: "APP_ENV",
                reason: format!("unknown environment '{}'", other),
            }),
        }
    }
}

/// Argon2 work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    /// OWASP-recommended Argon2id baseline (19 MiB, 2 passes, 1 lane)
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Process-wide configuration, constructed once by the composition root
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub prune_interval: Duration,
    pub hashing: HashingConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("prune_interval", &self.prune_interval)
            .field("hashing", &self.hashing)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", lookup("PORT"), 8080u16)?;

        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Development,
        };

        let prune_secs = parse_or(
            "REVOCATION_PRUNE_INTERVAL_SECS",
            lookup("REVOCATION_PRUNE_INTERVAL_SECS"),
            3600u64,
        )?;
        if prune_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REVOCATION_PRUNE_INTERVAL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_or("ARGON2_MEMORY_KIB", lookup("ARGON2_MEMORY_KIB"), defaults.memory_kib)?,
            iterations: parse_or("ARGON2_ITERATIONS", lookup("ARGON2_ITERATIONS"), defaults.iterations)?,
            parallelism: parse_or("ARGON2_PARALLELISM", lookup("ARGON2_PARALLELISM"), defaults.parallelism)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            environment,
            prune_interval: Duration::from_secs(prune_secs),
            hashing,
        })
    }

    /// Whether the first-registered-user-becomes-admin rule applies
    pub fn bootstrap_admin_enabled(&self) -> bool {
        self.environment.is_development()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/kudos"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.prune_interval, Duration::from_secs(3600));
        assert_eq!(config.hashing, HashingConfig::default());
        assert!(config.bootstrap_admin_enabled());
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/kudos"),
            ("JWT_SECRET", "   "),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_production_disables_bootstrap_admin() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/kudos"),
            ("JWT_SECRET", "secret"),
            ("APP_ENV", "Production"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.bootstrap_admin_enabled());
    }

    #[test]
    fn test_invalid_port_and_interval() {
        let bad_port = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(bad_port, Err(ConfigError::Invalid { name: "PORT", .. })));

        let zero_interval = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "secret"),
            ("REVOCATION_PRUNE_INTERVAL_SECS", "0"),
        ]));
        assert!(zero_interval.is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://user:pw@localhost/kudos"),
            ("JWT_SECRET", "super-secret-value"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("user:pw"));
    }
}
