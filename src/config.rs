//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::codec::Threshold;

/// Configuration loading failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Settings consumed by compression registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Minimum serialized size that gets compressed
    pub threshold: Threshold,
    /// Names of the cache managers to wrap
    pub target_cache_managers: Vec<String>,
}

/// Server configuration parameters.
///
/// The compression threshold and default TTL have no defaults and must be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// TTL applied to every entry; zero never expires
    pub default_ttl: Duration,
    /// Caches created when the manager is built
    pub cache_names: Vec<String>,
    /// Whether explicit nulls may be cached
    pub allow_null_values: bool,
    /// Compression threshold and allow-list
    pub compression: CompressionSettings,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `COMPRESS_THRESHOLD_BYTES` - Compression threshold in bytes (required)
    /// - `DEFAULT_TTL` - Entry TTL in seconds, 0 for no expiry (required)
    /// - `COMPRESS_TARGET_MANAGERS` - Comma-separated manager names (default: none)
    /// - `CACHE_NAMES` - Comma-separated initial caches (default: "default")
    /// - `ALLOW_NULL_VALUES` - Cache explicit nulls (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through `lookup` instead of the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let threshold: u64 = required(&lookup, "COMPRESS_THRESHOLD_BYTES")?;
        let default_ttl: u64 = required(&lookup, "DEFAULT_TTL")?;

        Ok(Self {
            server_port: optional(&lookup, "SERVER_PORT")?.unwrap_or(3000),
            cleanup_interval: optional(&lookup, "CLEANUP_INTERVAL")?.unwrap_or(1),
            default_ttl: Duration::from_secs(default_ttl),
            cache_names: lookup("CACHE_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| vec!["default".to_string()]),
            allow_null_values: optional(&lookup, "ALLOW_NULL_VALUES")?.unwrap_or(true),
            compression: CompressionSettings {
                threshold: Threshold::new(threshold),
                target_cache_managers: lookup("COMPRESS_TARGET_MANAGERS")
                    .map(|v| split_list(&v))
                    .unwrap_or_default(),
            },
        })
    }
}

fn required<T, F>(lookup: &F, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)?.ok_or(ConfigError::Missing(name))
}

fn optional<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                message: e.to_string(),
            })
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
