//! Configuration module for portflow
//!
//! Runtime configuration is a single TOML document:
//!
//! ```toml
//! log_filter = "info,portflow=debug"
//!
//! [port]
//! initial_buffer_queue_capacity = 4
//! initial_label_queue_capacity = 4
//! default_reserve = 0
//! domain = ""
//!
//! [pool]
//! buffer_count = 4
//! buffer_bytes = 4096
//! token_count = 2
//! ```
//!
//! Every field is optional; missing fields take their defaults.
//!
//! # Example
//!
//! ```ignore
//! use portflow::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::load("portflow.toml")?;
//! let port = OutputPort::with_config(0, "out", DType::F32, &config.port);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{FlowError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,portflow=debug";

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Settings for newly created output ports
    pub port: PortConfig,

    /// Shape of the built-in pools
    pub pool: PoolConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            port: PortConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(FlowError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded runtime config from {:?}", path);
        Ok(config)
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load runtime config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FlowError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FlowError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the configuration as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(FlowError::from)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .map_err(FlowError::from)
            .with_context(|| format!("Failed to write config file {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        self.port.validate()?;
        self.pool.validate()
    }
}
