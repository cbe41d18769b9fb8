// ABOUTME: Configuration loading and validation for the vaglio server.
// ABOUTME: Reads VAGLIO_* environment variables and applies defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use http::HeaderValue;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VAGLIO_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("VAGLIO_ALLOWED_ORIGINS contains an invalid origin: {0}")]
    InvalidOrigin(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct VaglioConfig {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub lease_ttl_secs: u64,
    pub max_concurrent: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for VaglioConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            lease_ttl_secs: 1800,
            max_concurrent: 50,
            allowed_origins: vec!["http://localhost".to_string()],
        }
    }
}

impl VaglioConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - VAGLIO_DATA_DIR: data directory (default: ./data)
    /// - VAGLIO_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - VAGLIO_LEASE_TTL_SECS: seconds before an abandoned lease is reclaimed (default: 1800)
    /// - VAGLIO_MAX_CONCURRENT: maximum in-flight requests (default: 50)
    /// - VAGLIO_ALLOWED_ORIGINS: comma-separated CORS origins (default: http://localhost)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = std::env::var("VAGLIO_DATA_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let bind = match std::env::var("VAGLIO_BIND") {
            Ok(bind_str) => bind_str
                .parse()
                .map_err(|_| ConfigError::InvalidBind(bind_str))?,
            Err(_) => defaults.bind,
        };

        let lease_ttl_secs = positive_var("VAGLIO_LEASE_TTL_SECS")?.unwrap_or(defaults.lease_ttl_secs);
        let max_concurrent = positive_var("VAGLIO_MAX_CONCURRENT")?
            .map(|n| n as usize)
            .unwrap_or(defaults.max_concurrent);

        let allowed_origins = match std::env::var("VAGLIO_ALLOWED_ORIGINS") {
            Ok(list) => parse_origins(&list)?,
            Err(_) => defaults.allowed_origins,
        };

        Ok(Self {
            data_dir,
            bind,
            lease_ttl_secs,
            max_concurrent,
            allowed_origins,
        })
    }
}

fn positive_var(var: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}

fn parse_origins(list: &str) -> Result<Vec<String>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            HeaderValue::from_str(o)
                .map(|_| o.to_string())
                .map_err(|_| ConfigError::InvalidOrigin(o.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 5] = [
        "VAGLIO_DATA_DIR",
        "VAGLIO_BIND",
        "VAGLIO_LEASE_TTL_SECS",
        "VAGLIO_MAX_CONCURRENT",
        "VAGLIO_ALLOWED_ORIGINS",
    ];

    // Environment is process-global; keep every env-mutating assertion in one test.
    #[test]
    fn config_reads_environment() {
        // SAFETY: test-only code, no other test touches VAGLIO_* variables
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }

        let config = VaglioConfig::from_env().unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.lease_ttl_secs, 1800);
        assert_eq!(config.max_concurrent, 50);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.allowed_origins, vec!["http://localhost".to_string()]);

        // SAFETY: as above
        unsafe {
            std::env::set_var("VAGLIO_LEASE_TTL_SECS", "60");
            std::env::set_var("VAGLIO_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
        }
        let config = VaglioConfig::from_env().unwrap();
        assert_eq!(config.lease_ttl_secs, 60);
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);

        // SAFETY: as above
        unsafe {
            std::env::set_var("VAGLIO_LEASE_TTL_SECS", "0");
        }
        let err = VaglioConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("VAGLIO_LEASE_TTL_SECS"), "got {}", err);

        // SAFETY: as above
        unsafe {
            std::env::remove_var("VAGLIO_LEASE_TTL_SECS");
            std::env::set_var("VAGLIO_BIND", "not-an-address");
        }
        let err = VaglioConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind(_)), "got {}", err);

        // SAFETY: as above
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn parse_origins_rejects_control_characters() {
        let err = parse_origins("http://ok.test,http://bad\n.test").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin(_)));
    }
}
