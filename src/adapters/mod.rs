//! Adapters layer: Concrete implementations of ports.
//!
//! - `sklearn`: scaler and classifier exported from scikit-learn as JSON
//! - `integrity`: manifest hashing and signature checks for those files

pub mod integrity;
pub mod sklearn;

pub use sklearn::ArtifactError;
