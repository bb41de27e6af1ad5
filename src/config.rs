//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{CoordinatorConfig, DEFAULT_MAX_VALUE_SIZE};

/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the in-memory backend holds
    pub max_entries: usize,
    /// Maximum serialized size of a cached value in bytes
    pub max_value_size: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Optional upper bound on a single origin fetch
    pub fetch_timeout: Option<Duration>,
    /// Token required for flushing the cache over HTTP
    pub admin_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum backend entries (default: 10000)
    /// - `MAX_VALUE_SIZE` - Maximum serialized value size in bytes (default: 1 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `FETCH_TIMEOUT_MS` - Origin fetch timeout in milliseconds (default: none)
    /// - `ADMIN_TOKEN` - Token for `DELETE /cache` (default: none, flush disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            max_value_size: parse_var("MAX_VALUE_SIZE").unwrap_or(defaults.max_value_size),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            fetch_timeout: parse_var::<u64>("FETCH_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// Coordinator settings derived from this configuration.
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_value_size: self.max_value_size,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            server_port: 3000,
            cleanup_interval: 1,
            fetch_timeout: None,
            admin_token: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
