//! Error types for host setup
//!
//! Command execution itself never returns these; it reports through
//! diagnostics and [`crate::host::ExecutionResult`]. These cover the
//! fallible steps around it: configuration, supervisor startup, input checks.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for host setup operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised while configuring or starting the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::Settings`].
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment override had a value we could not use.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    /// `start()` was called on a supervisor that already launched its server.
    #[error("Engine server already started for this session")]
    ServerAlreadyStarted,

    /// The supervisor thread could not be spawned.
    #[error("Failed to spawn supervisor thread: {0}")]
    SupervisorThread(#[source] std::io::Error),

    /// No pattern was selected, so no command may be issued.
    #[error("Pattern must not be empty")]
    EmptyPattern,
}

impl HostError {
    /// Creates an invalid environment value error.
    pub fn invalid_env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnv {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether the error comes from configuration rather than runtime state.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HostError::ConfigRead { .. }
                | HostError::ConfigParse { .. }
                | HostError::InvalidEnv { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostError::invalid_env("RWP_COMMAND_TIMEOUT_SECS", "soon");
        assert!(err.to_string().contains("RWP_COMMAND_TIMEOUT_SECS"));
        assert!(err.to_string().contains("soon"));

        let err = HostError::ServerAlreadyStarted;
        assert!(err.to_string().contains("already started"));
    }

    #[test]
    fn test_is_config() {
        assert!(HostError::invalid_env("K", "v").is_config());
        assert!(!HostError::EmptyPattern.is_config());
        assert!(!HostError::ServerAlreadyStarted.is_config());
    }
}
