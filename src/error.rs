//! Error taxonomy
//!
//! Every failure the compiler or the execution engine can produce maps to
//! exactly one [`ErrorKind`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SpecLoad,
    SpecInvalid,
    InvalidArgument,
    NotFound,
    StatusMismatch,
    Parse,
    Network,
    Validation,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SpecLoad => "SpecLoadError",
            ErrorKind::SpecInvalid => "SpecInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::StatusMismatch => "StatusMismatch",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Validation => "ValidationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while compiling or executing a test plan
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Failed to load contract {path}: {reason}")]
    SpecLoad { path: String, reason: String },

    #[error("Invalid contract: {0}")]
    SpecInvalid(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Endpoint not found: {url}")]
    NotFound { url: String },

    #[error("Expected {expected}, got {actual}: {body}")]
    StatusMismatch {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Failed to parse JSON response: {0}")]
    Parse(String),

    #[error("API request failed after {attempts} attempt(s): {source}")]
    Network {
        attempts: u32,
        #[source]
        source: crate::http::TransportError,
    },

    #[error("Response validation failed: {0}")]
    Validation(String),
}

impl ForgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForgeError::SpecLoad { .. } => ErrorKind::SpecLoad,
            ForgeError::SpecInvalid(_) => ErrorKind::SpecInvalid,
            ForgeError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ForgeError::NotFound { .. } => ErrorKind::NotFound,
            ForgeError::StatusMismatch { .. } => ErrorKind::StatusMismatch,
            ForgeError::Parse(_) => ErrorKind::Parse,
            ForgeError::Network { .. } => ErrorKind::Network,
            ForgeError::Validation(_) => ErrorKind::Validation,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ForgeError::SpecInvalid(message.into())
    }
}

pub type ForgeResult<T> = std::result::Result<T, ForgeError>;
