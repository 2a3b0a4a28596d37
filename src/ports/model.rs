//! Model ports: Traits for the fitted scaler and classifier.
//!
//! These traits abstract the exported artifacts from the application logic.
//! Implementations are loaded once and must be read-only afterwards.

use crate::domain::ModelError;

/// A fitted feature transform.
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Map a raw feature row to the normalized row the classifier expects.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if `row.len() != n_features()`.
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Number of features the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Predict the class label (0 or 1) of a scaled row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` on a wrong row length.
    fn predict(&self, row: &[f64]) -> Result<u8, ModelError>;

    /// Class probabilities `[P(0), P(1)]` of a scaled row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` on a wrong row length, or
    /// `ModelError::NonFinite` if the result is not a finite number.
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ModelError>;
}
