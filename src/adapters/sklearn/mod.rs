//! scikit-learn adapter: Implementation of the model ports from exported JSON.
//!
//! The training pipeline exports the fitted `StandardScaler` and
//! `LogisticRegression` as plain JSON parameter files. This module parses them,
//! checks they are consistent with the 13-feature patient vector and evaluates
//! them with the same arithmetic scikit-learn uses:
//!
//! - `transform(x)_i = (x_i - mean_i) / scale_i`
//! - `decision(x) = intercept + Σ coef_i * x_i`
//! - `predict(x) = 1` if `decision(x) > 0`, else `0`
//! - `predict_proba(x) = [1 - σ(decision), σ(decision)]`

use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::adapters::integrity::{self, Verification};
use crate::domain::{Feature, ModelError, FEATURE_COUNT};
use crate::ports::{Classifier, Scaler};

/// File name of the exported scaler.
pub const SCALER_FILE: &str = "scaler.json";

/// File name of the exported classifier.
pub const MODEL_FILE: &str = "heart_model.json";

const SCALER_TYPE: &str = "standard_scaler";
const CLASSIFIER_TYPE: &str = "logistic_regression";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is invalid: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Scaler and classifier disagree on feature count: {scaler} vs {classifier}")]
    Inconsistent { scaler: usize, classifier: usize },

    #[error("Artifact integrity check failed: {0}")]
    Integrity(String),
}

fn check_finite(what: &str, values: &[f64]) -> Result<(), ModelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ModelError::InvalidArtifact(format!(
            "{what}[{i}] is not finite"
        ))),
        None => Ok(()),
    }
}

fn check_len(what: &str, len: usize, expected: usize) -> Result<(), ModelError> {
    if len == expected {
        Ok(())
    } else {
        Err(ModelError::InvalidArtifact(format!(
            "{what} has {len} entries, expected {expected}"
        )))
    }
}

fn check_model_type(found: &str, expected: &str) -> Result<(), ModelError> {
    if found == expected {
        Ok(())
    } else {
        Err(ModelError::InvalidArtifact(format!(
            "model_type is {found:?}, expected {expected:?}"
        )))
    }
}

/// Fitted standardization exported from `sklearn.preprocessing.StandardScaler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub model_type: String,
    pub n_features_in: usize,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Build a scaler from fitted means and scales.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` if the parameters are inconsistent.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        let scaler = Self {
            model_type: SCALER_TYPE.to_string(),
            n_features_in: mean.len(),
            mean,
            scale,
            feature_names: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check internal consistency of the exported parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` describing the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_model_type(&self.model_type, SCALER_TYPE)?;
        if self.n_features_in == 0 {
            return Err(ModelError::InvalidArtifact("n_features_in is 0".into()));
        }
        check_len("mean", self.mean.len(), self.n_features_in)?;
        check_len("scale", self.scale.len(), self.n_features_in)?;
        if let Some(names) = &self.feature_names {
            check_len("feature_names", names.len(), self.n_features_in)?;
        }
        check_finite("mean", &self.mean)?;
        check_finite("scale", &self.scale)?;
        if let Some(i) = self.scale.iter().position(|s| *s == 0.0) {
            return Err(ModelError::InvalidArtifact(format!("scale[{i}] is zero")));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.n_features_in
    }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        ModelError::check_shape(self.n_features_in, row.len())?;

        let out: Vec<f64> = row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect();

        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("scaler transform"));
        }
        Ok(out)
    }
}

/// Fitted binary classifier exported from `sklearn.linear_model.LogisticRegression`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub model_type: String,
    pub n_features_in: usize,
    pub classes: Vec<u8>,
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    /// Build a classifier from fitted coefficients.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` if the parameters are inconsistent.
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        let model = Self {
            model_type: CLASSIFIER_TYPE.to_string(),
            n_features_in: coef.len(),
            classes: vec![0, 1],
            coef,
            intercept,
            feature_names: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check internal consistency of the exported parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` describing the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_model_type(&self.model_type, CLASSIFIER_TYPE)?;
        if self.n_features_in == 0 {
            return Err(ModelError::InvalidArtifact("n_features_in is 0".into()));
        }
        if self.classes != [0, 1] {
            return Err(ModelError::InvalidArtifact(format!(
                "classes must be [0, 1], got {:?}",
                self.classes
            )));
        }
        check_len("coef", self.coef.len(), self.n_features_in)?;
        if let Some(names) = &self.feature_names {
            check_len("feature_names", names.len(), self.n_features_in)?;
        }
        check_finite("coef", &self.coef)?;
        check_finite("intercept", &[self.intercept])?;
        Ok(())
    }

    /// Signed distance to the decision boundary.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` on a wrong row length.
    pub fn decision_function(&self, row: &[f64]) -> Result<f64, ModelError> {
        ModelError::check_shape(self.n_features_in, row.len())?;
        let z = self.intercept
            + self
                .coef
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        if z.is_finite() {
            Ok(z)
        } else {
            Err(ModelError::NonFinite("decision function"))
        }
    }
}

/// Logistic function, evaluated without overflow for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.n_features_in
    }

    fn predict(&self, row: &[f64]) -> Result<u8, ModelError> {
        // `validate` pins classes to [0, 1]
        Ok(u8::from(self.decision_function(row)? > 0.0))
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ModelError> {
        let p = sigmoid(self.decision_function(row)?);
        Ok([1.0 - p, p])
    }
}

/// Scaler and classifier loaded from the artifact directory.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
    pub verification: Verification,
}

/// Loader for the exported artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    verifying_key: Option<VerifyingKey>,
    require_signed: bool,
}

impl ArtifactLoader {
    /// Create a loader reading `scaler.json` and `heart_model.json` from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            verifying_key: None,
            require_signed: false,
        }
    }

    /// Verify the manifest signature with this key.
    #[must_use]
    pub fn with_verifying_key(mut self, key: Option<VerifyingKey>) -> Self {
        self.verifying_key = key;
        self
    }

    /// Refuse artifacts without a signed manifest.
    #[must_use]
    pub fn require_signed(mut self, required: bool) -> Self {
        self.require_signed = required;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Verify and load both artifacts.
    ///
    /// # Errors
    /// Returns error if a file is missing or unparseable, fails integrity
    /// checks, or does not describe the 13-feature patient vector.
    pub fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
        let verification = integrity::verify_artifacts(
            &self.dir,
            &[SCALER_FILE, MODEL_FILE],
            self.verifying_key.as_ref(),
            self.require_signed,
        )?;

        let scaler_path = self.dir.join(SCALER_FILE);
        let scaler: StandardScaler = read_json(&scaler_path)?;
        validate_artifact(&scaler_path, scaler.validate(), scaler.feature_names.as_deref())?;

        let model_path = self.dir.join(MODEL_FILE);
        let classifier: LogisticRegression = read_json(&model_path)?;
        validate_artifact(
            &model_path,
            classifier.validate(),
            classifier.feature_names.as_deref(),
        )?;

        if scaler.n_features_in != classifier.n_features_in {
            return Err(ArtifactError::Inconsistent {
                scaler: scaler.n_features_in,
                classifier: classifier.n_features_in,
            });
        }
        if scaler.n_features_in != FEATURE_COUNT {
            return Err(ArtifactError::Invalid {
                path: scaler_path,
                source: ModelError::ShapeMismatch {
                    expected: FEATURE_COUNT,
                    got: scaler.n_features_in,
                },
            });
        }

        tracing::info!(
            dir = %self.dir.display(),
            n_features = scaler.n_features_in,
            verification = ?verification,
            "Loaded scaler and classifier"
        );

        Ok(LoadedArtifacts {
            scaler,
            classifier,
            verification,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Attach the path to a validation failure and check column names, if exported.
fn validate_artifact(
    path: &Path,
    validation: Result<(), ModelError>,
    feature_names: Option<&[String]>,
) -> Result<(), ArtifactError> {
    let invalid = |source| ArtifactError::Invalid {
        path: path.to_path_buf(),
        source,
    };
    validation.map_err(invalid)?;

    if let Some(names) = feature_names {
        let expected = Feature::ALL.map(|f| f.spec().name);
        if names.len() == FEATURE_COUNT && names.iter().zip(expected).any(|(a, b)| a != b) {
            return Err(invalid(ModelError::InvalidArtifact(format!(
                "feature_names {names:?} do not match column order {expected:?}"
            ))));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientFeatures;
    use tempfile::tempdir;

    fn unit_scaler(n: usize) -> StandardScaler {
        StandardScaler::new(vec![0.0; n], vec![1.0; n]).expect("valid scaler")
    }

    fn write_artifacts(dir: &Path, scaler: &StandardScaler, model: &LogisticRegression) {
        std::fs::write(
            dir.join(SCALER_FILE),
            serde_json::to_vec(scaler).expect("serialize scaler"),
        )
        .expect("write scaler");
        std::fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(model).expect("serialize model"),
        )
        .expect("write model");
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = StandardScaler::new(vec![10.0, 0.5], vec![2.0, 0.25]).expect("valid");
        let out = scaler.transform(&[14.0, 0.0]).expect("transform");
        assert_eq!(out, vec![2.0, -2.0]);
    }

    #[test]
    fn test_scaler_shape_mismatch() {
        let scaler = unit_scaler(13);
        let err = scaler.transform(&[1.0; 12]).expect_err("must fail");
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                expected: 13,
                got: 12
            }
        );
    }

    #[test]
    fn test_scaler_rejects_bad_parameters() {
        assert!(StandardScaler::new(vec![0.0, 0.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![0.0], vec![0.0]).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_logistic_regression_predictions() {
        let model = LogisticRegression::new(vec![2.0, -1.0], 0.0).expect("valid");

        assert_eq!(model.predict(&[1.0, 0.0]).expect("predict"), 1);
        assert_eq!(model.predict(&[0.0, 1.0]).expect("predict"), 0);

        let [p0, p1] = model.predict_proba(&[1.0, 0.0]).expect("proba");
        assert!((p1 - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_decision_boundary_predicts_negative_class() {
        let model = LogisticRegression::new(vec![1.0], 0.0).expect("valid");
        assert_eq!(model.predict(&[0.0]).expect("predict"), 0);
        let [_, p1] = model.predict_proba(&[0.0]).expect("proba");
        assert!((p1 - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_agrees_with_probability() {
        let model = LogisticRegression::new(vec![0.7, -1.3, 0.2], -0.1).expect("valid");
        for row in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [3.0, 2.0, -1.0], [-4.0, -4.0, 9.0]] {
            let label = model.predict(&row).expect("predict");
            let [_, p1] = model.predict_proba(&row).expect("proba");
            assert_eq!(label == 1, p1 > 0.5);
        }
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(-1000.0).is_finite());
        assert!(sigmoid(1000.0).is_finite());
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }

    #[test]
    fn test_classifier_rejects_bad_classes() {
        let mut model = LogisticRegression::new(vec![1.0], 0.0).expect("valid");
        model.classes = vec![1, 2];
        assert!(model.validate().is_err());
        model.classes = vec![0, 1];
        model.model_type = "random_forest".into();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_predict_does_not_read_classes() {
        // Deserialized directly, without the loader's validation
        let model: LogisticRegression = serde_json::from_str(
            r#"{"model_type":"logistic_regression","n_features_in":1,"classes":[],"coef":[2.0],"intercept":0.0}"#,
        )
        .expect("parse");
        assert!(model.validate().is_err());
        assert_eq!(model.predict(&[1.0]), Ok(1));
        assert_eq!(model.predict(&[-1.0]), Ok(0));
    }

    #[test]
    fn test_load_shipped_artifacts() {
        let loaded = ArtifactLoader::new(".").load().expect("shipped artifacts load");
        assert_eq!(loaded.scaler.n_features(), FEATURE_COUNT);
        assert_eq!(loaded.classifier.n_features(), FEATURE_COUNT);

        let row = PatientFeatures::default().to_array();
        let scaled = loaded.scaler.transform(&row).expect("transform");
        let [p0, p1] = loaded.classifier.predict_proba(&scaled).expect("proba");
        assert!((0.0..=1.0).contains(&p1));
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_wrong_feature_count() {
        let temp = tempdir().expect("tempdir");
        let model = LogisticRegression::new(vec![1.0; 9], 0.0).expect("valid");
        write_artifacts(temp.path(), &unit_scaler(9), &model);

        let err = ArtifactLoader::new(temp.path()).load().expect_err("must fail");
        assert!(matches!(err, ArtifactError::Invalid { .. }));
    }

    #[test]
    fn test_load_rejects_inconsistent_artifacts() {
        let temp = tempdir().expect("tempdir");
        let model = LogisticRegression::new(vec![1.0; 12], 0.0).expect("valid");
        write_artifacts(temp.path(), &unit_scaler(13), &model);

        let err = ArtifactLoader::new(temp.path()).load().expect_err("must fail");
        assert!(matches!(
            err,
            ArtifactError::Inconsistent {
                scaler: 13,
                classifier: 12
            }
        ));
    }

    #[test]
    fn test_load_rejects_reordered_columns() {
        let temp = tempdir().expect("tempdir");
        let mut scaler = unit_scaler(13);
        let mut names: Vec<String> = Feature::ALL
            .iter()
            .map(|f| f.spec().name.to_string())
            .collect();
        names.swap(0, 1);
        scaler.feature_names = Some(names);
        let model = LogisticRegression::new(vec![0.1; 13], 0.0).expect("valid");
        write_artifacts(temp.path(), &scaler, &model);

        let err = ArtifactLoader::new(temp.path()).load().expect_err("must fail");
        assert!(err.to_string().contains("feature_names"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().expect("tempdir");
        let err = ArtifactLoader::new(temp.path()).load().expect_err("must fail");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join(SCALER_FILE), b"not json").expect("write");
        std::fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write");

        let err = ArtifactLoader::new(temp.path()).load().expect_err("must fail");
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
