//! Error types for RelicDB.

use thiserror::Error;

/// Result type alias using RelicError.
pub type Result<T> = std::result::Result<T, RelicError>;

/// Errors that can occur in RelicDB operations.
#[derive(Debug, Error)]
pub enum RelicError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("slot {slot} out of range for page with {size} rows")]
    SlotOutOfRange { slot: usize, size: usize },

    #[error("cursor does not address a row")]
    CursorOutOfRange,

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("cannot infer a field type from width {0}")]
    UnsupportedFieldSize(usize),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("page full, unable to insert row")]
    PageFull,

    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
