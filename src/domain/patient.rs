//! Patient data types for heart disease risk prediction.
//!
//! Based on the 13-attribute UCI Cleveland heart disease dataset. The order of
//! [`Feature::ALL`] is the column order the exported scaler and classifier
//! were fitted on.

use serde::{Deserialize, Serialize};

/// Number of features in a patient vector.
pub const FEATURE_COUNT: usize = 13;

/// Biological sex as collected by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    /// Choice labels in display order.
    pub const OPTIONS: &'static [&'static str] = &["Male", "Female"];

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Model encoding: Male = 1, Female = 0.
    #[must_use]
    pub fn encode(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }
}

/// Two-valued answer used by the fasting blood sugar and exercise angina fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl YesNo {
    /// Choice labels in display order.
    pub const OPTIONS: &'static [&'static str] = &["No", "Yes"];

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "No" => Some(Self::No),
            "Yes" => Some(Self::Yes),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }

    /// Model encoding: Yes = 1, No = 0.
    #[must_use]
    pub fn encode(self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Yes => 1.0,
        }
    }
}

/// How a feature is entered on the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Bounded number input. `decimals == 0` means whole numbers only.
    Numeric {
        min: f64,
        max: f64,
        default: f64,
        step: f64,
        decimals: usize,
    },
    /// Select box over fixed labels.
    Choice {
        options: &'static [&'static str],
        default: usize,
    },
}

/// Static description of one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSpec {
    /// Column name used by the training pipeline
    pub name: &'static str,
    /// Form label
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn int_field(
    name: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    default: f64,
) -> FeatureSpec {
    FeatureSpec {
        name,
        label,
        kind: FieldKind::Numeric {
            min,
            max,
            default,
            step: 1.0,
            decimals: 0,
        },
    }
}

/// The thirteen clinical features, in model column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Sex,
    ChestPain,
    RestingBp,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    Oldpeak,
    Slope,
    MajorVessels,
    Thal,
}

impl Feature {
    /// All features in vector order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Sex,
        Feature::ChestPain,
        Feature::RestingBp,
        Feature::Cholesterol,
        Feature::FastingBloodSugar,
        Feature::RestingEcg,
        Feature::MaxHeartRate,
        Feature::ExerciseAngina,
        Feature::Oldpeak,
        Feature::Slope,
        Feature::MajorVessels,
        Feature::Thal,
    ];

    #[must_use]
    pub const fn spec(self) -> FeatureSpec {
        match self {
            Self::Age => int_field("age", "Age", 1.0, 120.0, 45.0),
            Self::Sex => FeatureSpec {
                name: "sex",
                label: "Sex",
                kind: FieldKind::Choice {
                    options: Sex::OPTIONS,
                    default: 0,
                },
            },
            Self::ChestPain => int_field("cp", "Chest Pain Type (0-3)", 0.0, 3.0, 1.0),
            Self::RestingBp => int_field(
                "trestbps",
                "Resting Blood Pressure (mm Hg)",
                80.0,
                200.0,
                120.0,
            ),
            Self::Cholesterol => {
                int_field("chol", "Serum Cholesterol (mg/dl)", 100.0, 600.0, 200.0)
            }
            Self::FastingBloodSugar => FeatureSpec {
                name: "fbs",
                label: "Fasting Blood Sugar > 120 mg/dl",
                kind: FieldKind::Choice {
                    options: YesNo::OPTIONS,
                    default: 0,
                },
            },
            Self::RestingEcg => int_field("restecg", "Resting ECG Results (0-2)", 0.0, 2.0, 1.0),
            Self::MaxHeartRate => {
                int_field("thalach", "Max Heart Rate Achieved", 60.0, 220.0, 150.0)
            }
            Self::ExerciseAngina => FeatureSpec {
                name: "exang",
                label: "Exercise Induced Angina",
                kind: FieldKind::Choice {
                    options: YesNo::OPTIONS,
                    default: 0,
                },
            },
            Self::Oldpeak => FeatureSpec {
                name: "oldpeak",
                label: "ST Depression (Oldpeak)",
                kind: FieldKind::Numeric {
                    min: 0.0,
                    max: 10.0,
                    default: 1.0,
                    step: 0.01,
                    decimals: 2,
                },
            },
            Self::Slope => int_field(
                "slope",
                "Slope of Peak Exercise ST Segment (0-2)",
                0.0,
                2.0,
                1.0,
            ),
            Self::MajorVessels => int_field("ca", "Major Vessels Colored (0-4)", 0.0, 4.0, 0.0),
            Self::Thal => int_field("thal", "Thalassemia (0-3)", 0.0, 3.0, 2.0),
        }
    }

    /// Encode a select box answer for this feature to its model value.
    ///
    /// Returns `None` for numeric features or an unknown label.
    #[must_use]
    pub fn encode_choice(self, label: &str) -> Option<f64> {
        match self {
            Self::Sex => Sex::from_label(label).map(Sex::encode),
            Self::FastingBloodSugar | Self::ExerciseAngina => {
                YesNo::from_label(label).map(YesNo::encode)
            }
            _ => None,
        }
    }
}

/// Clinical features for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    /// Age in years (1-120)
    pub age: u16,
    pub sex: Sex,
    /// Chest pain type (0-3)
    pub cp: u8,
    /// Resting blood pressure in mm Hg (80-200)
    pub trestbps: u16,
    /// Serum cholesterol in mg/dl (100-600)
    pub chol: u16,
    /// Fasting blood sugar > 120 mg/dl
    pub fbs: YesNo,
    /// Resting ECG results (0-2)
    pub restecg: u8,
    /// Maximum heart rate achieved (60-220)
    pub thalach: u16,
    /// Exercise induced angina
    pub exang: YesNo,
    /// ST depression induced by exercise relative to rest (0.0-10.0)
    pub oldpeak: f64,
    /// Slope of the peak exercise ST segment (0-2)
    pub slope: u8,
    /// Number of major vessels colored by fluoroscopy (0-4)
    pub ca: u8,
    /// Thalassemia (0-3)
    pub thal: u8,
}

impl Default for PatientFeatures {
    /// The values a freshly opened form shows.
    fn default() -> Self {
        Self {
            age: 45,
            sex: Sex::Male,
            cp: 1,
            trestbps: 120,
            chol: 200,
            fbs: YesNo::No,
            restecg: 1,
            thalach: 150,
            exang: YesNo::No,
            oldpeak: 1.0,
            slope: 1,
            ca: 0,
            thal: 2,
        }
    }
}

fn whole<T: TryFrom<i64>>(feature: Feature, v: f64) -> Result<T, String> {
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(format!(
            "{}: expected a whole number, got {v}",
            feature.spec().label
        ));
    }
    T::try_from(v as i64).map_err(|_| format!("{}: {v} does not fit", feature.spec().label))
}

fn flag(feature: Feature, v: f64) -> Result<bool, String> {
    if v == 1.0 {
        Ok(true)
    } else if v == 0.0 {
        Ok(false)
    } else {
        Err(format!("{}: {v} must be 0 or 1", feature.spec().label))
    }
}

fn yes_no(feature: Feature, v: f64) -> Result<YesNo, String> {
    Ok(if flag(feature, v)? { YesNo::Yes } else { YesNo::No })
}

impl PatientFeatures {
    /// Encoded model value of one feature.
    #[must_use]
    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Age => f64::from(self.age),
            Feature::Sex => self.sex.encode(),
            Feature::ChestPain => f64::from(self.cp),
            Feature::RestingBp => f64::from(self.trestbps),
            Feature::Cholesterol => f64::from(self.chol),
            Feature::FastingBloodSugar => self.fbs.encode(),
            Feature::RestingEcg => f64::from(self.restecg),
            Feature::MaxHeartRate => f64::from(self.thalach),
            Feature::ExerciseAngina => self.exang.encode(),
            Feature::Oldpeak => self.oldpeak,
            Feature::Slope => f64::from(self.slope),
            Feature::MajorVessels => f64::from(self.ca),
            Feature::Thal => f64::from(self.thal),
        }
    }

    /// Assemble the model input row in [`Feature::ALL`] order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|f| self.value(f))
    }

    /// Build features from an already encoded row.
    ///
    /// # Errors
    /// Returns an error if the row does not have 13 entries, a whole-number
    /// field has a fraction, or a two-valued field is not 0 or 1.
    pub fn from_encoded(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            age: whole(Feature::Age, v[0])?,
            sex: if flag(Feature::Sex, v[1])? {
                Sex::Male
            } else {
                Sex::Female
            },
            cp: whole(Feature::ChestPain, v[2])?,
            trestbps: whole(Feature::RestingBp, v[3])?,
            chol: whole(Feature::Cholesterol, v[4])?,
            fbs: yes_no(Feature::FastingBloodSugar, v[5])?,
            restecg: whole(Feature::RestingEcg, v[6])?,
            thalach: whole(Feature::MaxHeartRate, v[7])?,
            exang: yes_no(Feature::ExerciseAngina, v[8])?,
            oldpeak: v[9],
            slope: whole(Feature::Slope, v[10])?,
            ca: whole(Feature::MajorVessels, v[11])?,
            thal: whole(Feature::Thal, v[12])?,
        })
    }

    /// Validate that every numeric feature lies within its form bounds.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for feature in Feature::ALL {
            let spec = feature.spec();
            if let FieldKind::Numeric { min, max, .. } = spec.kind {
                let value = self.value(feature);
                if !value.is_finite() || !(min..=max).contains(&value) {
                    errors.push(format!(
                        "{} {value} out of range [{min}, {max}]",
                        spec.label
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
