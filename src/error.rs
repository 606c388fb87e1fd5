//! Error types and error codes for the build driver.
//!
//! `BuildError` bridges engine, filesystem, JSON and configuration failures
//! into a single type that the CLI renders as a JSON error response.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, malformed configuration)
//! - `3`: Not found (source directory or document missing)
//! - `4`: Transform failed (unreadable source tree, rule failure)
//! - `5`: Write failed (output directory or file not writable)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use mystbuild_core::TransformError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flag, malformed config file).
    InvalidArguments = 2,
    /// Source directory or document not found.
    NotFound = 3,
    /// A document could not be parsed or transformed.
    TransformFailed = 4,
    /// Output could not be written.
    WriteFailed = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the build driver.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The project configuration file could not be used.
    #[error("invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Source directory does not exist.
    #[error("source directory not found: {path}")]
    SourceDirNotFound { path: PathBuf },

    /// Document file does not exist.
    #[error("document not found: {path}")]
    DocumentNotFound { path: PathBuf },

    /// Document file is not a valid source tree.
    #[error("cannot parse document '{docname}': {source}")]
    Parse {
        docname: String,
        #[source]
        source: serde_json::Error,
    },

    /// A rule failed while transforming the document.
    #[error("cannot transform document '{docname}': {source}")]
    Transform {
        docname: String,
        #[source]
        source: TransformError,
    },

    /// Output could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Filesystem error outside of output writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error outside of document parsing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl BuildError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        BuildError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        BuildError::Internal {
            message: message.into(),
        }
    }

    /// Create a write error for `path`.
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Write {
            path: path.into(),
            source,
        }
    }

    /// Name of the document this error belongs to, if any.
    pub fn docname(&self) -> Option<&str> {
        match self {
            BuildError::Parse { docname, .. } | BuildError::Transform { docname, .. } => {
                Some(docname)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&BuildError> for OutputErrorCode {
    fn from(err: &BuildError) -> Self {
        match err {
            BuildError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            BuildError::InvalidConfig { .. } => OutputErrorCode::InvalidArguments,
            BuildError::SourceDirNotFound { .. } => OutputErrorCode::NotFound,
            BuildError::DocumentNotFound { .. } => OutputErrorCode::NotFound,
            BuildError::Parse { .. } => OutputErrorCode::TransformFailed,
            BuildError::Transform { .. } => OutputErrorCode::TransformFailed,
            BuildError::Write { .. } => OutputErrorCode::WriteFailed,
            BuildError::Io(_) => OutputErrorCode::InternalError,
            BuildError::Json(_) => OutputErrorCode::InternalError,
            BuildError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<BuildError> for OutputErrorCode {
    fn from(err: BuildError) -> Self {
        OutputErrorCode::from(&err)
    }
}

/// Result type for driver operations.
pub type BuildResult<T> = Result<T, BuildError>;
