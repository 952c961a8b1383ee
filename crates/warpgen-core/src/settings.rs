//! Runtime settings
//!
//! Loaded once at start up from TOML. Every field has a default so an
//! empty (or missing) file yields a working service.
//!
//! ```toml
//! bind_address = "0.0.0.0:3000"
//!
//! [upstream]
//! base_url = "https://api.cloudflareclient.com/v0i1909051800"
//! timeout_secs = 15
//!
//! [captcha]
//! secret = "0x..."
//!
//! [services]
//! homelab = ["192.168.0.0/16"]
//! ```

use crate::routes::RouteCatalog;
use crate::upstream::{CloudflareClient, DEFAULT_API_BASE, UpstreamError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable naming the settings file
pub const CONFIG_ENV: &str = "WARPGEN_CONFIG";

/// Settings file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "warpgen.toml";

/// Environment variable that overrides `captcha.secret`
pub const CAPTCHA_SECRET_ENV: &str = "HCAPTCHA_SECRET_KEY";

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP listen address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Upstream registration API
    #[serde(default)]
    pub upstream: UpstreamSettings,
    /// Bot-abuse mitigation
    #[serde(default)]
    pub captcha: CaptchaSettings,
    /// Extra or replacement service → CIDR entries
    #[serde(default)]
    pub services: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_api_base")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaSettings {
    /// hCaptcha secret; verification is off when unset
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_verify_url() -> String {
    "https://hcaptcha.com/siteverify".to_string()
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CaptchaSettings {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: default_verify_url(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            upstream: UpstreamSettings::default(),
            captcha: CaptchaSettings::default(),
            services: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Load from TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Resolve settings from the environment.
    ///
    /// `WARPGEN_CONFIG` must point at a readable file when set. Otherwise
    /// `warpgen.toml` is used if present, else built-in defaults.
    pub fn load() -> Result<Self, SettingsError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut settings = match explicit {
            Some(path) => Self::from_toml_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                info!("No settings file, using defaults");
                Self::default()
            }
        };

        if let Ok(secret) = std::env::var(CAPTCHA_SECRET_ENV) {
            settings.captcha.secret = Some(secret).filter(|s| !s.is_empty());
        }
        Ok(settings)
    }

    /// Export as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Built-in catalog with this file's `[services]` applied
    pub fn route_catalog(&self) -> RouteCatalog {
        RouteCatalog::builtin().with_overrides(self.services.clone())
    }

    /// Upstream client for the configured API
    pub fn upstream_client(&self) -> Result<CloudflareClient, UpstreamError> {
        CloudflareClient::new(&self.upstream.base_url, self.upstream_timeout())
    }
}

/// Settings errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
