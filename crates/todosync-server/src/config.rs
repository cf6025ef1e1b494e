//! Configuration loading and typed config structures.
//!
//! The configuration lives in `todosync.yaml` in the working directory.
//! Every field has a default, so the file (and any section of it) may be
//! omitted. Environment variables override the file for deployment:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DATABASE_URL` | `database.url` |
//! | `TODOSYNC_HOST` | `server.host` |
//! | `TODOSYNC_PORT` | `server.port` |
//! | `TODOSYNC_STORE` | `store.backend` |

use std::path::Path;

use serde::Deserialize;
pub use todosync_db::DatabaseConfig;

use crate::server::ServerConfig;
use crate::state::DEFAULT_OUTBOUND_BUFFER;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value {value:?} for {variable}")]
    Env {
        /// The environment variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `todosync.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TodosyncConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// `PostgreSQL` connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Which store backend to use.
    #[serde(default)]
    pub store: StoreConfig,

    /// Sync engine tuning.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TodosyncConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    ///
    /// # Errors
    ///
    /// Same as [`TodosyncConfig::from_file`].
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides looked up through `lookup` (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `TODOSYNC_PORT` is not a port
    /// number or `TODOSYNC_STORE` is not a known backend.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("TODOSYNC_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("TODOSYNC_PORT") {
            self.server.port = val.parse().map_err(|_e| ConfigError::Env {
                variable: "TODOSYNC_PORT",
                value: val,
            })?;
        }
        if let Some(val) = lookup("TODOSYNC_STORE") {
            self.store.backend = match val.as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => {
                    return Err(ConfigError::Env {
                        variable: "TODOSYNC_STORE",
                        value: val,
                    });
                }
            };
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSection {
    /// Listener configuration for [`crate::server::start_server`].
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `PostgreSQL` via [`DatabaseConfig`].
    #[default]
    Postgres,
    /// In-process store; contents are lost on restart.
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Sync engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Per-connection outbound queue capacity. A client this many
    /// broadcasts behind is disconnected.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8081
}

const fn default_outbound_buffer() -> usize {
    DEFAULT_OUTBOUND_BUFFER
}

fn default_log_level() -> String {
    String::from("info")
}
