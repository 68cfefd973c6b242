//! Error types for `gliderqc`
//!
//! Re-exports the configuration errors from `gliderqc-core` and adds the
//! deployment and derivation errors of the pipeline side, plus the process
//! exit codes.

use std::path::PathBuf;
use thiserror::Error;

pub use gliderqc_core::error::{ConfigError, Severity, ValidationIssue};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `gliderqc` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Deployment layout error (data home, deployment directories)
    pub const DEPLOYMENT_ERROR: i32 = 4;

    /// Derivation error (missing implementation, bad calculation output)
    pub const DERIVATION_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `gliderqc` operations.
#[derive(Debug, Error)]
pub enum GliderQcError {
    /// Document loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Deployment layout error
    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    /// Derivation error
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GliderQcError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Deployment(_) => ExitCode::DEPLOYMENT_ERROR,
            Self::Derivation(_) => ExitCode::DERIVATION_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Deployment Errors
// ============================================================================

/// Errors locating a deployment in the glider data tree.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// Data home environment variable is not set
    #[error("{var} not set")]
    DataHomeUnset {
        /// Environment variable name
        var: &'static str,
    },

    /// Data home or one of its required subdirectories is not a directory
    #[error("invalid {what}: {path}")]
    InvalidDirectory {
        /// What the directory was expected to be
        what: &'static str,
        /// Offending path
        path: PathBuf,
    },

    /// Deployment name does not follow `glider-YYYYmmddTHHMM`
    #[error("cannot parse deployment name '{name}': {reason}")]
    InvalidName {
        /// The name given
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Deployment directory does not exist
    #[error("deployment location does not exist: {path}")]
    LocationNotFound {
        /// Expected deployment directory
        path: PathBuf,
    },

    /// Deployment data directory does not exist
    #[error("{deployment} data directory not found: {path}")]
    DataPathNotFound {
        /// Canonical deployment name
        deployment: String,
        /// Expected data directory
        path: PathBuf,
    },
}

// ============================================================================
// Derivation Errors
// ============================================================================

/// Errors while applying a derived-variable document to a dataset.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// No implementation registered for a calculation
    #[error("no implementation registered for calculation '{0}'")]
    UnknownCalculation(String),

    /// No runner registered for a QC module
    #[error("no runner registered for QC module '{0}'")]
    UnknownQcModule(String),

    /// A calculation failed
    #[error("calculation '{calculation}' failed for '{source_var}': {message}")]
    CalculationFailed {
        /// Calculation name
        calculation: String,
        /// Source variable
        source_var: String,
        /// Failure description
        message: String,
    },

    /// A calculation or QC test returned the wrong number of values
    #[error("'{variable}' has {actual} values, expected {expected}")]
    LengthMismatch {
        /// Variable being produced
        variable: String,
        /// Expected number of values (source length)
        expected: usize,
        /// Number of values returned
        actual: usize,
    },

    /// A QC test failed to run
    #[error("QC test '{test}' failed on '{target}': {message}")]
    QcFailed {
        /// Test name
        test: String,
        /// Target variable
        target: String,
        /// Failure description
        message: String,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `gliderqc` operations.
pub type Result<T> = std::result::Result<T, GliderQcError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::DEPLOYMENT_ERROR, 4);
        assert_eq!(ExitCode::DERIVATION_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_exit_code_mapping() {
        let cases: Vec<(GliderQcError, i32)> = vec![
            (
                ConfigError::MissingFile {
                    path: PathBuf::from("/x"),
                }
                .into(),
                ExitCode::CONFIG_ERROR,
            ),
            (
                DeploymentError::DataHomeUnset {
                    var: "GLIDER_DATA_HOME",
                }
                .into(),
                ExitCode::DEPLOYMENT_ERROR,
            ),
            (
                DerivationError::UnknownCalculation("x".into()).into(),
                ExitCode::DERIVATION_ERROR,
            ),
            (
                GliderQcError::Usage("x".into()),
                ExitCode::USAGE_ERROR,
            ),
            (
                std::io::Error::new(std::io::ErrorKind::NotFound, "x").into(),
                ExitCode::IO_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "Wrong exit code for {err}");
        }
    }

    #[test]
    fn test_deployment_error_display() {
        let err = DeploymentError::DataHomeUnset {
            var: "GLIDER_DATA_HOME_TEST",
        };
        assert_eq!(err.to_string(), "GLIDER_DATA_HOME_TEST not set");
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = DerivationError::LengthMismatch {
            variable: "pH".to_string(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.to_string(), "'pH' has 9 values, expected 10");
    }
}
