//! # heartcheck
//!
//! Terminal heart disease risk form backed by a scaler and a binary classifier
//! exported from a scikit-learn training pipeline.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Patient features, their encoding, diagnosis text
//! - `ports`: `Scaler` and `Classifier` traits
//! - `adapters`: JSON artifact implementations and integrity checks
//! - `application`: The predict use case
//! - `config`: Environment configuration
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Diagnosis, PatientFeatures, RiskLevel};

/// Result type for heartcheck operations
pub type Result<T> = std::result::Result<T, HeartcheckError>;

/// Main error type for heartcheck
#[derive(Debug, thiserror::Error)]
pub enum HeartcheckError {
    #[error("Model operation failed: {0}")]
    Model(#[from] domain::ModelError),

    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HeartcheckError {
    /// Short category name, safe to log: never carries patient values.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Artifact(_) => "artifact",
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
        }
    }
}
