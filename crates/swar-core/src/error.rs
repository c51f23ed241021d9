//! Error types for packed-lane operations

use thiserror::Error;

use crate::shape::Shape;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwarError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: Shape, right: Shape },

    #[error("Data needs {bits} bits but {shape} holds only {capacity}")]
    DataTooWide {
        bits: u64,
        capacity: u64,
        shape: Shape,
    },

    #[error("Non-zero padding in lane {lane} of {shape}")]
    DirtyPadding { lane: usize, shape: Shape },

    #[error("Value {value} does not fit in {bits_val} bits")]
    ValueOutOfRange { value: u64, bits_val: u32 },

    #[error("Expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Result type for packed-lane operations
pub type Result<T> = std::result::Result<T, SwarError>;
