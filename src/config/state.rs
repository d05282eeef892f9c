// Application state module
// Immutable state shared by every connection task

use std::path::PathBuf;

use super::types::{Config, ProxyConfig};
use crate::error::StartupError;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical static file root
    pub root: PathBuf,
    /// Pooled outbound client used by both proxy endpoints
    pub client: reqwest::Client,
}

impl AppState {
    /// Build state from configuration, resolving `server.root`
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let root = config.resolve_root()?;
        Self::with_root(config, root)
    }

    /// Build state with an explicit static root
    pub fn with_root(config: Config, root: PathBuf) -> Result<Self, StartupError> {
        let root = super::canonical_dir(&root)?;
        let client = build_client(&config.proxy)?;

        Ok(Self {
            config,
            root,
            client,
        })
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

/// Outbound client: fixed User-Agent, total timeout and bounded redirects
fn build_client(proxy: &ProxyConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(proxy.user_agent.clone())
        .timeout(proxy.timeout())
        .redirect(reqwest::redirect::Policy::limited(proxy.max_redirects))
        .build()
}
