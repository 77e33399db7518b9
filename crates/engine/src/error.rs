//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] returned when an amount is malformed or not positive.
//! - [`MissingField`] returned when a spend form lacks a required field.
//! - [`KeyNotFound`] returned when a category is not in the catalog.
//! - [`UnsupportedSchema`] returned when the store was written by a newer
//!   version.
//!
//! Storage failures are carried as [`Io`] and [`Json`].
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`MissingField`]: EngineError::MissingField
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`UnsupportedSchema`]: EngineError::UnsupportedSchema
//!  [`Io`]: EngineError::Io
//!  [`Json`]: EngineError::Json
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Unsupported schema version {found} (max supported {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::MissingField(a), Self::MissingField(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (
                Self::UnsupportedSchema {
                    found: a,
                    supported: x,
                },
                Self::UnsupportedSchema {
                    found: b,
                    supported: y,
                },
            ) => a == b && x == y,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind() && a.to_string() == b.to_string(),
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
