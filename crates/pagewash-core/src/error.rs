// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewash.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Pagewash operations.
///
/// Detection shortfalls (no edge found, rotation rejected, mask fallback) are
/// not errors. They surface as values in the sheet report.
#[derive(Debug, Error)]
pub enum PagewashError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Buffers --
    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("failed to allocate {bytes} bytes for pixel buffer")]
    Allocation { bytes: usize },

    // -- Codec --
    #[error("input file not found: {path}")]
    InputNotFound { path: String },

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How far an error reaches: the whole run, or just the sheet being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Bad option or configuration value; reported before any sheet runs.
    Configuration,
    /// Load/save failure of one sheet.
    Sheet,
    /// Allocation failure; the run cannot continue.
    Resource,
}

impl PagewashError {
    /// Classify the error for batch control flow.
    pub fn class(&self) -> ErrorClass {
        match self {
            PagewashError::Config(_) | PagewashError::Serialization(_) => {
                ErrorClass::Configuration
            }
            PagewashError::Allocation { .. } => ErrorClass::Resource,
            PagewashError::Io(io_err) if io_err.kind() == std::io::ErrorKind::OutOfMemory => {
                ErrorClass::Resource
            }
            PagewashError::InvalidDimensions { .. }
            | PagewashError::BufferSize { .. }
            | PagewashError::InputNotFound { .. }
            | PagewashError::ImageError(_)
            | PagewashError::UnsupportedFormat(_)
            | PagewashError::Io(_) => ErrorClass::Sheet,
        }
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        self.class().exit_code()
    }
}

impl ErrorClass {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorClass::Configuration => 1,
            ErrorClass::Sheet => 2,
            ErrorClass::Resource => 3,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewashError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Configuration problems end the run with status 1.
    #[test]
    fn config_errors_exit_with_one() {
        let err = PagewashError::Config("bad rectangle".into());
        assert_eq!(err.class(), ErrorClass::Configuration);
        assert_eq!(err.exit_code(), 1);
    }

    /// A missing input file only affects its sheet.
    #[test]
    fn missing_input_is_sheet_scoped() {
        let err = PagewashError::InputNotFound {
            path: "scan001.pbm".into(),
        };
        assert_eq!(err.class(), ErrorClass::Sheet);
        assert_eq!(err.exit_code(), 2);
    }

    /// Allocation failures are resource errors, including the I/O flavour.
    #[test]
    fn out_of_memory_is_resource_class() {
        let err = PagewashError::Allocation { bytes: 1 << 40 };
        assert_eq!(err.class(), ErrorClass::Resource);

        let io = PagewashError::Io(std::io::Error::from(std::io::ErrorKind::OutOfMemory));
        assert_eq!(io.class(), ErrorClass::Resource);
        assert_eq!(io.exit_code(), 3);
    }
}
