//! Errors raised by scaler and classifier operations.

/// Error type for model operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Feature count mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Non-finite value produced by {0}")]
    NonFinite(&'static str),

    #[error("Classifier returned unknown label {0}")]
    UnknownLabel(u8),
}

impl ModelError {
    /// Shape check shared by every port implementation.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` when `got != expected`.
    pub fn check_shape(expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::ShapeMismatch { expected, got })
        }
    }
}
