//! Inference service: Orchestrates one prediction request.
//!
//! This service coordinates:
//! - Range validation of the patient features
//! - Assembly of the 13-element feature row
//! - Scaling with the fitted scaler
//! - Label and probability from the fitted classifier

use std::sync::Arc;

use crate::domain::{Diagnosis, ModelError, PatientFeatures};
use crate::ports::{Classifier, Scaler};
use crate::HeartcheckError;

/// Service for running heart disease risk inference.
///
/// Holds the scaler and classifier loaded at start-up. Both are read-only, so
/// the service needs no interior mutability and every call is independent.
pub struct InferenceService<S, C>
where
    S: Scaler,
    C: Classifier,
{
    scaler: Arc<S>,
    classifier: Arc<C>,
}

impl<S, C> Clone for InferenceService<S, C>
where
    S: Scaler,
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            scaler: Arc::clone(&self.scaler),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<S, C> InferenceService<S, C>
where
    S: Scaler,
    C: Classifier,
{
    /// Create a new inference service.
    pub fn new(scaler: Arc<S>, classifier: Arc<C>) -> Self {
        Self { scaler, classifier }
    }

    /// Run inference on patient features.
    ///
    /// Performs the full pipeline:
    /// 1. Validate ranges and assemble the feature row
    /// 2. Scale the row
    /// 3. Predict the label
    /// 4. Predict the positive-class probability
    ///
    /// # Errors
    /// Returns `Validation` if a feature is out of range, or `Model` if the
    /// scaler or classifier rejects the row.
    pub fn predict(&self, features: &PatientFeatures) -> Result<Diagnosis, HeartcheckError> {
        features
            .validate()
            .map_err(|errors| HeartcheckError::Validation(errors.join(", ")))?;

        let row = features.to_array();

        tracing::debug!("Step 1: Scaling feature row...");
        let scaled = self.scaler.transform(&row)?;

        tracing::debug!("Step 2: Predicting label...");
        let label = self.classifier.predict(&scaled)?;

        tracing::debug!("Step 3: Predicting probability...");
        let [_, probability] = self.classifier.predict_proba(&scaled)?;
        if !probability.is_finite() {
            return Err(ModelError::NonFinite("predict_proba").into());
        }

        let diagnosis =
            Diagnosis::new(label, probability).ok_or(ModelError::UnknownLabel(label))?;

        tracing::info!(
            "Inference complete: prediction={}, probability={}, risk={}",
            diagnosis.prediction,
            diagnosis.probability_percent(),
            diagnosis.risk_level
        );

        Ok(diagnosis)
    }
}
