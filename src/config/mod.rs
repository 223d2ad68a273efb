// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from the default file location.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file (`path`, or `~/.offline-gateway/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let file = match path {
            // An explicitly named file must exist
            Some(p) => File::with_name(p).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // Override with environment variables (prefix: OFFLINE_GATEWAY_, nesting: __)
            .add_source(
                Environment::with_prefix("OFFLINE_GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gateway.manifest")
                    .with_list_parse_key("notifications.vibrate")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.cache_name.trim().is_empty() {
            return Err(GatewayError::Config("gateway.cache_name must not be empty".into()));
        }
        reqwest::Url::parse(&self.gateway.origin).map_err(|e| {
            GatewayError::Config(format!("gateway.origin '{}' is not a URL: {}", self.gateway.origin, e))
        })?;
        if !self.gateway.fallback_document.starts_with('/') {
            return Err(GatewayError::Config(
                "gateway.fallback_document must be an absolute path".into(),
            ));
        }
        match self.cache.backend.as_str() {
            "disk" | "memory" => Ok(()),
            other => Err(GatewayError::Config(format!("unknown cache backend '{}'", other))),
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GatewayError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".offline-gateway")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
