//! Error types for Cadence operations.
//!
//! This module defines [`CadenceError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `CadenceError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `CadenceError::Other`) for unexpected errors
//! - Invalid step registrations are logged and skipped, never raised

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Cadence operations.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A step's execute call failed.
    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// A lane worker terminated abnormally instead of returning a result.
    #[error("Lane '{lane}' terminated abnormally")]
    LanePanic { lane: String },

    /// A plugin registration hook failed.
    #[error("Plugin '{plugin}' failed to register: {message}")]
    PluginFailed { plugin: String, message: String },

    /// Reading from or writing to the status sink failed.
    #[error("Status sink error: {message}")]
    StatusSink { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Cadence operations.
pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = CadenceError::ConfigNotFound {
            path: PathBuf::from("/foo/cadence.yml"),
        };
        assert!(err.to_string().contains("/foo/cadence.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = CadenceError::ConfigParseError {
            path: PathBuf::from("/cadence.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/cadence.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn step_failed_displays_step_and_message() {
        let err = CadenceError::StepFailed {
            step: "load_data".into(),
            message: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("load_data"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn lane_panic_displays_lane() {
        let err = CadenceError::LanePanic {
            lane: "export".into(),
        };
        assert!(err.to_string().contains("export"));
    }

    #[test]
    fn plugin_failed_displays_plugin_and_message() {
        let err = CadenceError::PluginFailed {
            plugin: "forecast".into(),
            message: "duplicate sequence".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("forecast"));
        assert!(msg.contains("duplicate sequence"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CadenceError = io_err.into();
        assert!(matches!(err, CadenceError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(CadenceError::StatusSink {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
