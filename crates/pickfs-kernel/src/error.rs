//! Store and transfer error types.

use std::io;
use thiserror::Error;

/// Errors raised by the path store, the transfer bridge and the provider.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No node at the given path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node exists but cannot be used this way (e.g. reading a folder).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Transfer mode string was neither `"r"` nor `"w"`.
    #[error("unrecognized mode: {0}")]
    UnsupportedMode(String),

    /// I/O failure while draining a pipe or a temp file.
    #[error("transfer failed: {0}")]
    TransferFailure(#[from] io::Error),

    /// The authentication gate is closed.
    #[error("please authenticate ({0})")]
    AuthenticationRequired(String),
}

impl StoreError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an InvalidOperation error.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an UnsupportedMode error.
    pub fn unsupported_mode(mode: impl Into<String>) -> Self {
        Self::UnsupportedMode(mode.into())
    }

    /// Create an AuthenticationRequired error for the named operation.
    pub fn authentication_required(operation: impl Into<String>) -> Self {
        Self::AuthenticationRequired(operation.into())
    }

    /// True for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convert StoreError to std::io::Error so it can travel through a pipe.
impl From<StoreError> for io::Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            StoreError::InvalidOperation(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            StoreError::UnsupportedMode(mode) => io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unrecognized mode: {mode}"),
            ),
            StoreError::TransferFailure(e) => e,
            StoreError::AuthenticationRequired(op) => io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("please authenticate ({op})"),
            ),
        }
    }
}

/// Store result type.
pub type StoreResult<T> = Result<T, StoreError>;
