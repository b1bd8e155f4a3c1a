//! Error type shared by the field, cache and range modules.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code returned for successful operations.
pub const OK: i32 = 1;
/// Status code for invalid arguments.
pub const ERROR_ARGUMENT: i32 = -2;
/// Status code for requests that reference something not (yet) computed.
pub const ERROR_NOT_FOUND: i32 = -5;
/// Status code for requests outside the implemented scope.
pub const ERROR_NOT_IMPLEMENTED: i32 = -7;
/// Status code for internal or evaluation failures.
pub const ERROR_GENERAL: i32 = -1;

/// Universal error type for field evaluation and range queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Invalid handle, mismatched region, undersized buffer or bad index.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The requested result has not been computed.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is valid but outside what is implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Sampling, derivative or evaluation failure.
    #[error("{0}")]
    General(String),
}

/// Discriminant of a [`FieldError`], usable as a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Argument,
    NotFound,
    NotImplemented,
    General,
}

impl ErrorKind {
    pub fn status_code(self) -> i32 {
        match self {
            ErrorKind::Argument => ERROR_ARGUMENT,
            ErrorKind::NotFound => ERROR_NOT_FOUND,
            ErrorKind::NotImplemented => ERROR_NOT_IMPLEMENTED,
            ErrorKind::General => ERROR_GENERAL,
        }
    }
}

impl FieldError {
    pub fn argument(message: impl Into<String>) -> Self {
        FieldError::Argument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        FieldError::NotFound(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        FieldError::NotImplemented(message.into())
    }

    pub fn general(message: impl Into<String>) -> Self {
        FieldError::General(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FieldError::Argument(_) => ErrorKind::Argument,
            FieldError::NotFound(_) => ErrorKind::NotFound,
            FieldError::NotImplemented(_) => ErrorKind::NotImplemented,
            FieldError::General(_) => ErrorKind::General,
        }
    }

    pub fn status_code(&self) -> i32 {
        self.kind().status_code()
    }
}

pub type Result<T, E = FieldError> = std::result::Result<T, E>;

/// Collapses a result into the integer status code used by C-style callers.
pub fn status_of<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => OK,
        Err(err) => err.status_code(),
    }
}
