//! Error taxonomy shared by every record module

use crate::keys::KeyError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Machine-readable error class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
pub enum ErrorKind {
    /// Wrong argument count or shape
    Validation,
    /// Malformed payload or key encoding failure
    Encoding,
    /// Insert on an existing primary key
    AlreadyExists,
    /// Operation on a missing key
    NotFound,
    /// Non-numeric string where a number is required
    Parse,
    /// Unrecognized field name in a field-level update
    InvalidField,
    /// Underlying store I/O failure
    Storage,
    /// Workflow operation not allowed in the current state
    InvalidTransition,
}

/// Errors surfaced at the operation boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("{0}")]
    Validation(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Cannot parse {field} as a decimal number: {value:?}")]
    Parse { field: String, value: String },

    #[error("wrong field: {0}")]
    InvalidField(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Result alias used across record modules
pub type RecordResult<T> = Result<T, RecordError>;

impl RecordError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &str, id: &str) -> Self {
        Self::AlreadyExists {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn parse(field: &str, value: &str) -> Self {
        Self::Parse {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::InvalidField(_) => ErrorKind::InvalidField,
            Self::Storage(_) => ErrorKind::Storage,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<KeyError> for RecordError {
    fn from(err: KeyError) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
