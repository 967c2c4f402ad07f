//! Error handling for the totaling engine.
//!
//! This module provides:
//! - A single error enum covering every failure the engine can report
//! - Stable machine-readable error codes with numeric values and categories
//! - Severity levels that drive how an error is logged
//! - Cube references (index and path) so failures can be diagnosed without
//!   inspecting engine internals
//!
//! # Usage
//!
//! ```rust,ignore
//! use facts_total_core::error::{Result, TotalError};
//!
//! fn load() -> Result<()> {
//!     Err(TotalError::EmptyInput)
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::cube::AttrValue;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for totaling operations.
pub type Result<T> = std::result::Result<T, TotalError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and can be matched by callers and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input Errors (1000-1099)
    EmptyInput,
    PathCountMismatch,
    InvalidPath,
    InvalidCube,
    NonUniformYearStep,

    // Compatibility Errors (1100-1199)
    AlignmentFailed,
    AttributeConflict,

    // Storage Errors (2000-2099)
    IoError,
    SerializationError,

    // Configuration Errors (5000-5099)
    ConfigurationError,

    // Internal Errors (9000-9099)
    AssemblyFailed,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::EmptyInput => 1000,
            Self::PathCountMismatch => 1001,
            Self::InvalidPath => 1002,
            Self::InvalidCube => 1003,
            Self::NonUniformYearStep => 1004,

            Self::AlignmentFailed => 1100,
            Self::AttributeConflict => 1101,

            Self::IoError => 2000,
            Self::SerializationError => 2001,

            Self::ConfigurationError => 5000,

            Self::AssemblyFailed => 9000,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "input",
            1100..=1199 => "compatibility",
            2000..=2099 => "storage",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }

    /// Misaligned or conflicting data is never a transient condition.
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller errors (bad input, incompatible cubes)
    Low,
    /// Environment issues (unreadable files, bad configuration)
    Medium,
    /// Bugs in the engine itself
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::EmptyInput
            | ErrorCode::PathCountMismatch
            | ErrorCode::InvalidPath
            | ErrorCode::InvalidCube
            | ErrorCode::NonUniformYearStep
            | ErrorCode::AlignmentFailed
            | ErrorCode::AttributeConflict => Self::Low,

            ErrorCode::IoError
            | ErrorCode::SerializationError
            | ErrorCode::ConfigurationError => Self::Medium,

            ErrorCode::AssemblyFailed => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cube References
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies one input cube in an error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeRef {
    /// Position of the cube in the caller-supplied sequence
    pub index: usize,

    /// Path the cube was loaded from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CubeRef {
    pub fn new(index: usize) -> Self {
        Self { index, path: None }
    }

    fn resolve(mut self, paths: &[String]) -> Self {
        if self.path.is_none() {
            self.path = paths.get(self.index).cloned();
        }
        self
    }
}

impl fmt::Display for CubeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "#{} ({})", self.index, path),
            None => write!(f, "#{}", self.index),
        }
    }
}

fn display_refs(cubes: &[CubeRef]) -> String {
    cubes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Alignment Error
// ═══════════════════════════════════════════════════════════════════════════════

/// Input cubes disagree on a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dimension '{dimension}' does not align across cubes {}: {detail}", display_refs(.cubes))]
pub struct AlignmentError {
    /// The offending dimension
    pub dimension: String,

    /// The cubes that disagree
    pub cubes: Vec<CubeRef>,

    /// What exactly differs
    pub detail: String,
}

impl AlignmentError {
    pub fn new(dimension: impl Into<String>, cubes: Vec<CubeRef>, detail: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            cubes,
            detail: detail.into(),
        }
    }

    /// Fill in the source path of every referenced cube.
    pub fn with_paths(mut self, paths: &[String]) -> Self {
        self.cubes = self.cubes.into_iter().map(|c| c.resolve(paths)).collect();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The error type for every totaling operation.
#[derive(Debug, Error)]
pub enum TotalError {
    #[error("no cubes were supplied for totaling")]
    EmptyInput,

    #[error("received {cubes} cubes but {paths} source paths")]
    PathCountMismatch { cubes: usize, paths: usize },

    #[error("source path for cube #{index} is empty or not valid UTF-8")]
    InvalidPath { index: usize },

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(
        "attribute '{key}' conflicts between cubes {}: {first} vs {second}",
        display_refs(.cubes)
    )]
    AttributeConflict {
        key: String,
        first: AttrValue,
        second: AttrValue,
        cubes: Vec<CubeRef>,
    },

    #[error("assembled data has shape {actual:?} but the dimensions imply {expected:?}")]
    Assembly {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("invalid cube: {reason}")]
    InvalidCube { reason: String },

    #[error("year steps in {path} are not uniform: {steps:?}")]
    NonUniformYearStep { path: String, steps: Vec<i64> },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to process cube file {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl TotalError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn invalid_cube(reason: impl Into<String>) -> Self {
        Self::InvalidCube {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }

    /// Attach source paths to any cube references carried by this error.
    pub fn with_paths(self, paths: &[String]) -> Self {
        match self {
            Self::Alignment(e) => Self::Alignment(e.with_paths(paths)),
            Self::AttributeConflict {
                key,
                first,
                second,
                cubes,
            } => Self::AttributeConflict {
                key,
                first,
                second,
                cubes: cubes.into_iter().map(|c| c.resolve(paths)).collect(),
            },
            other => other,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyInput => ErrorCode::EmptyInput,
            Self::PathCountMismatch { .. } => ErrorCode::PathCountMismatch,
            Self::InvalidPath { .. } => ErrorCode::InvalidPath,
            Self::Alignment(_) => ErrorCode::AlignmentFailed,
            Self::AttributeConflict { .. } => ErrorCode::AttributeConflict,
            Self::Assembly { .. } => ErrorCode::AssemblyFailed,
            Self::InvalidCube { .. } => ErrorCode::InvalidCube,
            Self::NonUniformYearStep { .. } => ErrorCode::NonUniformYearStep,
            Self::Io { .. } => ErrorCode::IoError,
            Self::Serialization { .. } => ErrorCode::SerializationError,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code())
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code();
        let category = code.category();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    numeric_code = code.numeric_code(),
                    category = category,
                    message = %self,
                    "CRITICAL ERROR"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    message = %self,
                    "Totaling failed"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    message = %self,
                    "Rejected input"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_categories() {
        assert_eq!(ErrorCode::EmptyInput.numeric_code(), 1000);
        assert_eq!(ErrorCode::AlignmentFailed.category(), "compatibility");
        assert_eq!(ErrorCode::AssemblyFailed.category(), "internal");
        assert_eq!(ErrorCode::IoError.category(), "storage");
        assert!(!ErrorCode::AlignmentFailed.is_retryable());
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(TotalError::EmptyInput.severity(), ErrorSeverity::Low);
        let assembly = TotalError::Assembly {
            expected: vec![2],
            actual: vec![3],
        };
        assert_eq!(assembly.severity(), ErrorSeverity::Critical);
        assert_eq!(assembly.code(), ErrorCode::AssemblyFailed);
    }

    #[test]
    fn test_alignment_error_display_names_dimension_and_cubes() {
        let error = AlignmentError::new(
            "x",
            vec![CubeRef::new(0), CubeRef::new(1)],
            "tick 2 differs: 2 vs 3",
        )
        .with_paths(&["/data/a.json".to_string(), "/data/b.json".to_string()]);

        let message = error.to_string();
        assert!(message.contains("'x'"));
        assert!(message.contains("#0 (/data/a.json)"));
        assert!(message.contains("#1 (/data/b.json)"));
    }

    #[test]
    fn test_with_paths_leaves_other_errors_untouched() {
        let error = TotalError::InvalidPath { index: 3 }.with_paths(&[]);
        assert!(matches!(error, TotalError::InvalidPath { index: 3 }));
    }

    #[test]
    fn test_conflict_error_resolves_paths() {
        let error = TotalError::AttributeConflict {
            key: "units".into(),
            first: AttrValue::from("mm"),
            second: AttrValue::from("cm"),
            cubes: vec![CubeRef::new(0), CubeRef::new(1)],
        }
        .with_paths(&["/a".to_string(), "/b".to_string()]);

        match error {
            TotalError::AttributeConflict { cubes, .. } => {
                assert_eq!(cubes[1].path.as_deref(), Some("/b"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
