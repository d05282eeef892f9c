// Configuration module entry point
// Loads layered configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ProxyConfig, ServerConfig};

/// Desktop browser User-Agent sent on every proxy fetch
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Environment variable prefix, e.g. `CORSDEV_SERVER__PORT=9000`
const ENV_PREFIX: &str = "CORSDEV";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config" (config.toml, config.yaml, ...) when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.root", ".")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("proxy.timeout_ms", 10_000)?
            .set_default("proxy.user_agent", DEFAULT_USER_AGENT)?
            .set_default("proxy.max_redirects", 30)?
            .set_default("proxy.chunk_size", 8192)?
            .set_default("proxy.default_image_type", "image/jpeg")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|_| StartupError::InvalidAddress(addr))
    }

    /// Resolve the configured static root to a canonical directory path
    pub fn resolve_root(&self) -> Result<PathBuf, StartupError> {
        canonical_dir(Path::new(&self.server.root))
    }
}

/// Canonicalize `path` and make sure it names a directory
pub(crate) fn canonical_dir(path: &Path) -> Result<PathBuf, StartupError> {
    let canonical = path.canonicalize().map_err(|source| StartupError::Root {
        path: path.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(StartupError::NotADirectory(canonical));
    }
    Ok(canonical)
}
