//! # Gateway Configuration
//!
//! Configuration for the hosted data API connection.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ESTOQUE_REMOTE_URL=https://xyz.supabase.co                         │
//! │     ESTOQUE_REMOTE_KEY=eyJhbGciOi...                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/estoque/config.toml (Linux)                              │
//! │     ~/Library/Application Support/br.qq-palavra.estoque/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     empty url/key → the gateway simply never becomes available         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # config.toml
//! url = "https://xyz.supabase.co"
//! api_key = "service-or-anon-key"
//! connect_timeout_secs = 10
//! request_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Environment override for the remote URL.
const ENV_URL: &str = "ESTOQUE_REMOTE_URL";
/// Environment override for the API key.
const ENV_KEY: &str = "ESTOQUE_REMOTE_KEY";

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

// =============================================================================
// Gateway Config
// =============================================================================

/// Connection settings for the hosted data API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the hosted API (e.g. `https://xyz.supabase.co`).
    #[serde(default)]
    pub url: String,

    /// API key sent as `apikey` + bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Connection timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            url: String::new(),
            api_key: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Whether both the URL and the key are present.
    ///
    /// An unconfigured gateway is not an error - the app just runs in
    /// permanent offline mode against the local cache.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    /// Connection timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Platform config file path (`<config dir>/estoque/config.toml`).
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br", "qq-palavra", "estoque")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration: file (if present) then environment overrides.
    ///
    /// A missing file is not an error; an unparseable one is.
    pub fn load() -> SyncResult<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading gateway config");
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| SyncError::Config(e.to_string()))?;
                toml::from_str(&raw).map_err(|e| SyncError::Config(e.to_string()))?
            }
            _ => GatewayConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Applies `ESTOQUE_REMOTE_URL` / `ESTOQUE_REMOTE_KEY` overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_URL) {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
        if let Ok(key) = std::env::var(ENV_KEY) {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }
    }

    /// Persists the configuration to the platform config file.
    pub fn save(&self) -> SyncResult<()> {
        let Some(path) = Self::config_path() else {
            warn!("No config directory available on this platform");
            return Err(SyncError::Config("no config directory".into()));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::Config(e.to_string()))?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| SyncError::Config(e.to_string()))?;
        debug!(path = %path.display(), "Gateway config saved");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unconfigured() {
        let config = GatewayConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_toml_round_trip() {
        let raw = "url = \"https://xyz.supabase.co\"\napi_key = \"secret\"\n";
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert!(config.is_configured());
        assert_eq!(config.connect_timeout_secs, 10);

        let out = toml::to_string_pretty(&config).unwrap();
        assert!(out.contains("https://xyz.supabase.co"));
    }
}
