//! Host settings
//!
//! Read from `<config dir>/rwp/config.toml` when it exists, then overridden
//! by `RWP_*` environment variables, then by command-line flags.
//!
//! ```toml
//! server_program = "/opt/wr22/bin/wr22-regex-server"
//! client_program = "wr22-client"
//! command_timeout_secs = 30
//! start_server = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};
use crate::host::{ExecutorOptions, CLIENT_PROGRAM, SERVER_PROGRAM};

pub const ENV_SERVER_PROGRAM: &str = "RWP_SERVER_PROGRAM";
pub const ENV_CLIENT_PROGRAM: &str = "RWP_CLIENT_PROGRAM";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "RWP_COMMAND_TIMEOUT_SECS";

/// Host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine server executable
    pub server_program: String,
    /// Client executable
    pub client_program: String,
    /// Kill a client call after this many seconds; absent or 0 waits forever
    pub command_timeout_secs: Option<u64>,
    /// Launch the engine server at session start
    pub start_server: bool,
    /// Working directory for both executables
    pub working_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_program: SERVER_PROGRAM.to_string(),
            client_program: CLIENT_PROGRAM.to_string(),
            command_timeout_secs: None,
            start_server: true,
            working_directory: None,
        }
    }
}

impl Settings {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rwp").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> HostResult<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file, which must exist
    pub fn load_from(path: &Path) -> HostResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| HostError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `RWP_*` overrides from the process environment
    pub fn apply_env(&mut self) -> HostResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `RWP_*` overrides using `lookup` to read variables
    pub fn apply_env_from<F>(&mut self, lookup: F) -> HostResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(program) = lookup(ENV_SERVER_PROGRAM).filter(|v| !v.trim().is_empty()) {
            self.server_program = program;
        }
        if let Some(program) = lookup(ENV_CLIENT_PROGRAM).filter(|v| !v.trim().is_empty()) {
            self.client_program = program;
        }
        if let Some(raw) = lookup(ENV_COMMAND_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| HostError::invalid_env(ENV_COMMAND_TIMEOUT_SECS, raw.clone()))?;
            self.command_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            program: self.client_program.clone(),
            timeout: self.command_timeout(),
            working_directory: self.working_directory.clone(),
        }
    }
}
