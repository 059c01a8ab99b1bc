//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::backends::BackendKind;

/// Errors raised while reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown backend '{0}', expected one of: memory, moka, sled")]
    UnknownBackend(String),

    #[error("DEFAULT_TTL {default_ttl} outlives MAX_TTL {max_ttl}")]
    DefaultTtlExceedsMax { default_ttl: u64, max_ttl: u64 },
}

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Storage engine selected at startup
    pub backend: BackendKind,
    /// Default TTL in seconds applied by the backend, 0 = never expire
    pub default_ttl: u64,
    /// Largest TTL a request can obtain, 0 = no cap
    pub max_ttl: u64,
    /// Maximum number of entries for in-process engines
    pub max_entries: usize,
    /// Memory engine cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Directory of the sled database
    pub sled_path: PathBuf,
    /// Deadline applied to every backend call
    pub backend_timeout: Duration,
    /// Largest accepted payload in bytes
    pub max_size_bytes: usize,
    /// Largest number of values in a single put request
    pub max_num_values: usize,
    /// Whether clients may choose their own keys
    pub allow_setting_keys: bool,
    /// When false, metrics are not recorded
    pub metrics_enabled: bool,
    /// Prefix of every metric name
    pub metrics_namespace: String,
    /// Second prefix of every metric name, may be empty
    pub metrics_subsystem: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` (default: 2424)
    /// - `BACKEND` - memory | moka | sled (default: memory)
    /// - `DEFAULT_TTL` (default: 3600)
    /// - `MAX_TTL` (default: 3600)
    /// - `MAX_ENTRIES` (default: 10000)
    /// - `CLEANUP_INTERVAL` (default: 1)
    /// - `SLED_PATH` (default: data/cache.sled)
    /// - `BACKEND_TIMEOUT_MS` (default: 2000)
    /// - `MAX_SIZE_BYTES` (default: 10240)
    /// - `MAX_NUM_VALUES` (default: 10)
    /// - `ALLOW_SETTING_KEYS` (default: false)
    /// - `METRICS_ENABLED` (default: true)
    /// - `METRICS_NAMESPACE` (default: cache_gateway)
    /// - `METRICS_SUBSYSTEM` (default: empty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// With a TTL cap in place the default TTL must fit under it; a default
    /// of 0 (never expire) is rejected too.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = &lookup;

        let backend = match lookup("BACKEND") {
            Some(value) => BackendKind::from_str(&value)?,
            None => defaults.backend,
        };

        let config = Self {
            server_port: parse(lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            backend,
            default_ttl: parse(lookup, "DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            max_ttl: parse(lookup, "MAX_TTL").unwrap_or(defaults.max_ttl),
            max_entries: parse(lookup, "MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cleanup_interval: parse(lookup, "CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
            sled_path: lookup("SLED_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sled_path),
            backend_timeout: parse(lookup, "BACKEND_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backend_timeout),
            max_size_bytes: parse(lookup, "MAX_SIZE_BYTES").unwrap_or(defaults.max_size_bytes),
            max_num_values: parse(lookup, "MAX_NUM_VALUES").unwrap_or(defaults.max_num_values),
            allow_setting_keys: parse(lookup, "ALLOW_SETTING_KEYS")
                .unwrap_or(defaults.allow_setting_keys),
            metrics_enabled: parse(lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
            metrics_namespace: lookup("METRICS_NAMESPACE").unwrap_or(defaults.metrics_namespace),
            metrics_subsystem: lookup("METRICS_SUBSYSTEM").unwrap_or(defaults.metrics_subsystem),
        };

        let uncapped_default = config.default_ttl == 0 || config.default_ttl > config.max_ttl;
        if config.max_ttl > 0 && uncapped_default {
            return Err(ConfigError::DefaultTtlExceedsMax {
                default_ttl: config.default_ttl,
                max_ttl: config.max_ttl,
            });
        }

        Ok(config)
    }
}

/// Parses a variable, treating unparsable values as unset.
fn parse<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 2424,
            backend: BackendKind::Memory,
            default_ttl: 3600,
            max_ttl: 3600,
            max_entries: 10_000,
            cleanup_interval: 1,
            sled_path: PathBuf::from("data/cache.sled"),
            backend_timeout: Duration::from_millis(2000),
            max_size_bytes: 10 * 1024,
            max_num_values: 10,
            allow_setting_keys: false,
            metrics_enabled: true,
            metrics_namespace: "cache_gateway".to_string(),
            metrics_subsystem: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 2424);
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.max_num_values, 10);
        assert!(config.metrics_enabled);
        assert!(!config.allow_setting_keys);
    }

    #[test]
    fn test_config_empty_lookup_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_port, 2424);
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.metrics_namespace, "cache_gateway");
        assert_eq!(config.backend_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BACKEND", "sled"),
            ("DEFAULT_TTL", "0"),
            ("MAX_TTL", "0"),
            ("BACKEND_TIMEOUT_MS", "150"),
            ("ALLOW_SETTING_KEYS", "true"),
            ("METRICS_NAMESPACE", "prebid"),
            ("METRICS_SUBSYSTEM", "cache"),
        ]))
        .unwrap();
        assert_eq!(config.backend, BackendKind::Sled);
        assert_eq!(config.default_ttl, 0);
        assert_eq!(config.backend_timeout, Duration::from_millis(150));
        assert!(config.allow_setting_keys);
        assert_eq!(config.metrics_namespace, "prebid");
        assert_eq!(config.metrics_subsystem, "cache");
    }

    #[test]
    fn test_config_unparsable_value_falls_back() {
        let config = Config::from_lookup(lookup(&[("SERVER_PORT", "not-a-port")])).unwrap();
        assert_eq!(config.server_port, 2424);
    }

    #[test]
    fn test_config_unknown_backend() {
        let err = Config::from_lookup(lookup(&[("BACKEND", "cassandra")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "cassandra"));
    }

    #[test]
    fn test_config_default_ttl_must_fit_max_ttl() {
        let err = Config::from_lookup(lookup(&[("DEFAULT_TTL", "7200"), ("MAX_TTL", "60")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DefaultTtlExceedsMax {
                default_ttl: 7200,
                max_ttl: 60
            }
        ));

        let never_expire = Config::from_lookup(lookup(&[("DEFAULT_TTL", "0")]));
        assert!(matches!(never_expire, Err(ConfigError::DefaultTtlExceedsMax { .. })));

        let uncapped = Config::from_lookup(lookup(&[("DEFAULT_TTL", "7200"), ("MAX_TTL", "0")]));
        assert_eq!(uncapped.unwrap().default_ttl, 7200);

        let fits = Config::from_lookup(lookup(&[("DEFAULT_TTL", "60"), ("MAX_TTL", "60")]));
        assert_eq!(fits.unwrap().default_ttl, 60);
    }
}
