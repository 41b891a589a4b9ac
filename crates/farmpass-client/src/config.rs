//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client starts with zero configuration
//! against a local backend.

use std::path::PathBuf;

use farmpass_shared::constants::{DEFAULT_API_URL, DEFAULT_EXPLORER_TX_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend REST root, including the `/api` segment.
    /// Env: `FARMPASS_API_URL`
    /// Default: `http://localhost:3002/api`
    pub api_base_url: String,

    /// SQLite file holding persisted sessions.
    /// Env: `FARMPASS_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// Prefix for transaction links.
    /// Env: `FARMPASS_EXPLORER_URL`
    /// Default: `https://sepolia.etherscan.io/tx/`
    pub explorer_tx_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            db_path: None,
            explorer_tx_base: DEFAULT_EXPLORER_TX_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("FARMPASS_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_base_url = url.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(value = %url, "Invalid FARMPASS_API_URL, using default");
            }
        }

        if let Some(path) = lookup("FARMPASS_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(url) = lookup("FARMPASS_EXPLORER_URL").filter(|u| !u.is_empty()) {
            config.explorer_tx_base = if url.ends_with('/') { url } else { format!("{url}/") };
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
