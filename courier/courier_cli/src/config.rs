//! CLI configuration file handling.
//!
//! The optional TOML file has three sections, all optional:
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [mailbox]
//! capacity = 0
//! timeout_ms = 100
//!
//! [supervisor]
//! ready_timeout_ms = 5000
//! ```

use courier_concurrency::{ActorSystemConfig, MailboxConfig, SupervisorConfig};
use courier_core::LogLevel;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error when loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Logging section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written to stderr
    pub level: LogLevel,
}

/// Whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Logging settings
    pub logging: LoggingConfig,

    /// Mailbox settings applied to every actor the CLI creates
    pub mailbox: MailboxConfig,

    /// Startup and shutdown settings
    pub supervisor: SupervisorConfig,
}

impl CliConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Actor system settings derived from this file
    pub fn system_config(&self) -> ActorSystemConfig {
        ActorSystemConfig {
            default_mailbox: self.mailbox.clone(),
            supervisor: self.supervisor.clone(),
            ..Default::default()
        }
    }
}
