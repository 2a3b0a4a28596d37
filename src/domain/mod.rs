//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Patient input, its fixed-order encoding and
//! the interpretation of a classifier result live here.

mod diagnosis;
mod model;
mod patient;

pub use diagnosis::{format_probability, Diagnosis, RiskLevel};
pub use model::ModelError;
pub use patient::{
    Feature, FeatureSpec, FieldKind, PatientFeatures, Sex, YesNo, FEATURE_COUNT,
};
