//! Error types for frac-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Reason an action payload was rejected.
///
/// Rejections are values, not faults: the dispatcher logs them and reports
/// the action as not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid numeric field: {0}")]
    InvalidNumeric(&'static str),

    #[error("invalid enum field: {0}")]
    InvalidEnum(&'static str),
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(name) | Self::InvalidNumeric(name) | Self::InvalidEnum(name) => name,
        }
    }
}
