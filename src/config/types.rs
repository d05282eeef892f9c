// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::time::Duration;

use crate::logger::LogFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub proxy: ProxyConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Static file root, relative paths resolve against the working directory
    pub root: String,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default)]
    pub access_log_format: LogFormat,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Inbound connection tuning
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds a client may take to send request headers
    pub header_read_timeout: u64,
}

/// Outbound proxy fetch configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Total bound on a single upstream fetch, body included
    pub timeout_ms: u64,
    pub user_agent: String,
    pub max_redirects: usize,
    /// Upper bound on each relayed image chunk
    pub chunk_size: usize,
    pub default_image_type: String,
    /// Optional cap on buffered HTML bodies (unbounded if not set)
    #[serde(default)]
    pub max_html_bytes: Option<u64>,
}

impl ProxyConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
