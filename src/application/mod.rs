//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement the predict
//! use case.

mod inference;

pub use inference::InferenceService;
