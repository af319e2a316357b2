//! # Application Error Types
//!
//! This module defines the error type used by the driver and configuration
//! layers. Algorithm-level failures are reported as
//! [`ThresholdError`](crate::threshold::ThresholdError) and converted here.

use std::fmt;

use crate::threshold::ThresholdError;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Thresholding parameter or processing errors
    Threshold(String),
    /// File system errors
    FileSystem(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Threshold(msg) => write!(f, "[THRESHOLD] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ThresholdError> for AppError {
    fn from(err: ThresholdError) -> Self {
        match err {
            ThresholdError::UnreadableInput { .. } | ThresholdError::WriteFailed { .. } => {
                AppError::FileSystem(err.to_string())
            }
            _ => AppError::Threshold(err.to_string()),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::error;

    /// Log thresholding errors with raster context
    pub fn log_threshold_error(
        error: &impl std::fmt::Display,
        operation: &str,
        field: Option<&str>,
        dimensions: Option<(u32, u32)>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            field = ?field,
            dimensions = ?dimensions,
            "Thresholding failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    /// Log configuration errors during startup
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
