use super::geometry::GridShape;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Tensor shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: GridShape, found: GridShape },

    #[error("Grid geometry mismatch: expected {expected}, found {found}")]
    GeometryMismatch { expected: String, found: String },

    #[error("Tensor data length mismatch: geometry {shape} requires {expected} values, found {found}")]
    LengthMismatch {
        shape: GridShape,
        expected: usize,
        found: usize,
    },

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error("Invalid input in {location}: {reason}")]
    InvalidInput { location: String, reason: String },
}

impl ModelError {
    pub(crate) fn invalid_parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(location: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidInput {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
