//! Configuration loading.
//!
//! Configuration comes from a YAML file, located in priority order:
//! an explicit path in `TASKBOARD_CONFIG_PATH`, the project-level
//! `taskboard/config.yaml`, then the user-level `~/.taskboard/config.yaml`.
//! Built-in defaults apply when no file is present. CLI arguments override
//! individual fields after loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the RPC server.
pub const DEFAULT_RPC_PORT: u16 = 2022;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the RPC server listens on (default: 2022).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskboard").join("tasks.db")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from the highest-priority source available.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("TASKBOARD_CONFIG_PATH") {
            return Self::from_file(Path::new(&path));
        }

        let project = Path::new("taskboard").join("config.yaml");
        if project.exists() {
            return Self::from_file(&project);
        }

        if let Some(home) = dirs::home_dir() {
            let user = home.join(".taskboard").join("config.yaml");
            if user.exists() {
                return Self::from_file(&user);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Ensure the directory holding the database file exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
