//! Gateway configuration.
//!
//! Configuration is built once at startup via [`Config::from_env`] and passed
//! by reference into every component; no component reads environment
//! variables itself.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use palisade_core::{Error, Result};

/// One week, the default catalog refresh cadence.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default bound on a single upstream catalog fetch.
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// CORS configuration for browser-based access.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Use `["*"]` to allow all origins (development only).
    /// Empty list disables CORS entirely.
    pub allowed_origins: Vec<String>,

    /// Max age for preflight cache (seconds).
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Default: disabled (secure-by-default).
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
        }
    }
}

/// Configuration for the Palisade gateway.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub http_port: u16,

    /// HTTP listen address.
    pub http_host: IpAddr,

    /// Enable development mode.
    ///
    /// When enabled, logs are pretty-printed and wildcard CORS origins are
    /// permitted. Production deployments run with `debug = false`.
    pub debug: bool,

    /// CORS configuration.
    pub cors: CorsConfig,

    /// Root directory for catalog snapshot files.
    pub cache_dir: PathBuf,

    /// Root directory for submission record files.
    pub submission_dir: PathBuf,

    /// Bound on a single upstream catalog fetch.
    pub fetch_timeout: Duration,

    /// Cadence of the unattended catalog refresh.
    pub refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            http_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            debug: false,
            cors: CorsConfig::default(),
            cache_dir: PathBuf::from("data/cache"),
            submission_dir: PathBuf::from("data/submissions"),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `PALISADE_HTTP_PORT`
    /// - `PALISADE_HTTP_HOST`
    /// - `PALISADE_DEBUG`
    /// - `PALISADE_CORS_ALLOWED_ORIGINS` (comma-separated, or `*`)
    /// - `PALISADE_CORS_MAX_AGE_SECONDS`
    /// - `PALISADE_CACHE_DIR`
    /// - `PALISADE_SUBMISSION_DIR`
    /// - `PALISADE_FETCH_TIMEOUT_SECS`
    /// - `PALISADE_REFRESH_INTERVAL_SECS`
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be
    /// parsed, or if the resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("PALISADE_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(host) = env_string("PALISADE_HTTP_HOST") {
            config.http_host = host.parse::<IpAddr>().map_err(|e| {
                Error::InvalidInput(format!("PALISADE_HTTP_HOST must be an IP address: {e}"))
            })?;
        }
        if let Some(debug) = env_bool("PALISADE_DEBUG")? {
            config.debug = debug;
        }
        if let Some(origins) = env_string("PALISADE_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_cors_allowed_origins(&origins);
        }
        if let Some(max_age) = env_u64("PALISADE_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }
        if let Some(dir) = env_string("PALISADE_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_string("PALISADE_SUBMISSION_DIR") {
            config.submission_dir = PathBuf::from(dir);
        }
        if let Some(secs) = env_u64("PALISADE_FETCH_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(Error::InvalidInput(
                    "PALISADE_FETCH_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("PALISADE_REFRESH_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(Error::InvalidInput(
                    "PALISADE_REFRESH_INTERVAL_SECS must be greater than 0".to_string(),
                ));
            }
            config.refresh_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if wildcard CORS origins are configured outside of
    /// development mode.
    pub fn validate(&self) -> Result<()> {
        if !self.debug
            && self
                .cors
                .allowed_origins
                .iter()
                .any(|origin| origin == "*")
        {
            return Err(Error::InvalidInput(
                "cors.allowed_origins cannot include '*' when debug=false".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    parse_bool(name, &v).map(Some)
}

fn parse_cors_allowed_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == "*" {
        return vec!["*".to_string()];
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.http_host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!config.debug);
        assert_eq!(config.refresh_interval, Duration::from_secs(604_800));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn parse_bool_accepts_true_values() {
        assert!(parse_bool("TEST", "true").unwrap());
        assert!(parse_bool("TEST", "1").unwrap());
        assert!(parse_bool("TEST", "yes").unwrap());
        assert!(parse_bool("TEST", "TRUE").unwrap());
    }

    #[test]
    fn parse_bool_accepts_false_values() {
        assert!(!parse_bool("TEST", "false").unwrap());
        assert!(!parse_bool("TEST", "0").unwrap());
        assert!(!parse_bool("TEST", "no").unwrap());
        assert!(!parse_bool("TEST", "FALSE").unwrap());
    }

    #[test]
    fn parse_bool_rejects_invalid_values() {
        assert!(parse_bool("TEST", "maybe").is_err());
        assert!(parse_bool("TEST", "").is_err());
    }

    #[test]
    fn cors_origins_parse_wildcard_and_lists() {
        assert_eq!(parse_cors_allowed_origins("*"), vec!["*".to_string()]);
        assert_eq!(
            parse_cors_allowed_origins("http://localhost:3000, http://localhost:8080"),
            vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
            ]
        );
        assert!(parse_cors_allowed_origins("  ").is_empty());
    }

    #[test]
    fn wildcard_cors_rejected_outside_debug() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec!["*".to_string()];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        config.debug = true;
        config.validate().expect("wildcard allowed in debug");
    }
}
