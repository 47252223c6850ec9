//! Request and response types for the anonymization and utility endpoints

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Multipart field carrying the CSV upload.
pub const FILE_FIELD: &str = "csvfile";

/// Value of the `private` field that selects the anonymization path.
pub const PRIVATE_FLAG_ON: &str = "on";

const DEFAULT_TRAIN_TEST: &str = "80,20";
const DEFAULT_MODEL_EPSILON: &str = "1.0";

/// Plain text form fields of a request, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// `private=on` selects anonymization, anything else selects evaluation.
    pub fn wants_anonymization(&self) -> bool {
        self.get("private") == Some(PRIVATE_FLAG_ON)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Splits a comma list into trimmed column names, dropping empty entries.
pub fn parse_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Epsilon, sensitivity and delta shared by every noised column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrivacyParams {
    pub epsilon: f64,
    pub sensitivity: f64,
    /// Accepted for approximate DP but not consumed by either mechanism.
    pub delta: f64,
}

impl PrivacyParams {
    /// Parses `"epsilon,sensitivity,delta"`. Every element must be a number and
    /// at least three must be present.
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        let raw = raw.ok_or(ServiceError::InvalidPrivacyParams)?;
        let values = raw
            .split(',')
            .map(|x| x.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| ServiceError::InvalidPrivacyParams)?;

        let [epsilon, sensitivity, delta] = match values.as_slice() {
            [e, s, d, ..] => [*e, *s, *d],
            _ => return Err(ServiceError::InvalidPrivacyParams),
        };

        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ServiceError::InvalidPrivacyParams);
        }
        if !sensitivity.is_finite() || sensitivity < 0.0 || !delta.is_finite() {
            return Err(ServiceError::InvalidPrivacyParams);
        }

        Ok(Self {
            epsilon,
            sensitivity,
            delta,
        })
    }
}

/// Caller-designated roles of columns for the anonymizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Meta list, carried but not used for dispatch.
    pub private: Vec<String>,
    pub binary: Vec<String>,
    /// Accepted and ignored.
    pub categorical: Vec<String>,
    pub numerical: Vec<String>,
}

impl ColumnRoles {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            private: parse_column_list(fields.get_or("private", "")),
            binary: parse_column_list(fields.get_or("binary", "")),
            categorical: parse_column_list(fields.get_or("categorical", "")),
            numerical: parse_column_list(fields.get_or("numerical", "")),
        }
    }
}

/// Train/test proportions as sent by the client, e.g. `80,20`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    pub test_fraction: f64,
}

impl SplitRatio {
    /// Only the second element (test percentage) is read.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let test_percent = raw
            .split(',')
            .nth(1)
            .ok_or(ServiceError::InvalidSplit)?
            .trim()
            .parse::<f64>()
            .map_err(|_| ServiceError::InvalidSplit)?;

        let test_fraction = test_percent / 100.0;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ServiceError::InvalidSplit);
        }

        Ok(Self { test_fraction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelAlgorithm {
    Classification,
    Regression,
}

impl ModelAlgorithm {
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw.map(str::trim) {
            None | Some("") | Some("1") => Ok(ModelAlgorithm::Classification),
            Some("2") => Ok(ModelAlgorithm::Regression),
            Some(other) => Err(ServiceError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Everything the utility evaluator needs besides the table itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationRequest {
    pub input_columns: Vec<String>,
    pub output_column: String,
    pub split: SplitRatio,
    pub model_epsilon: f64,
    pub algorithm: ModelAlgorithm,
    pub seed: Option<u64>,
}

impl ModelEvaluationRequest {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ServiceError> {
        let split = SplitRatio::parse(fields.get_or("traintest", DEFAULT_TRAIN_TEST))?;

        let model_epsilon = fields
            .get_or("mlpara", DEFAULT_MODEL_EPSILON)
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .parse::<f64>()
            .map_err(|_| ServiceError::InvalidModelEpsilon)?;
        if !model_epsilon.is_finite() || model_epsilon <= 0.0 {
            return Err(ServiceError::InvalidModelEpsilon);
        }

        let seed = match fields.get("seed").map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ServiceError::InvalidSeed)?),
        };

        Ok(Self {
            input_columns: parse_column_list(fields.get_or("colinp", "")),
            output_column: fields.get_or("colop", "").trim().to_string(),
            split,
            model_epsilon,
            algorithm: ModelAlgorithm::parse(fields.get("mlalgo"))?,
            seed,
        })
    }
}

/// Scores of the baseline (`accuracy1`) and private (`accuracy2`) models.
///
/// Classification reports accuracy in [0, 1]. Regression (`mlalgo=2`) reports
/// R² under the same keys, which is negative when a model does worse than
/// predicting the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyOutput {
    pub accuracy1: f64,
    pub accuracy2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub error: String,
}
