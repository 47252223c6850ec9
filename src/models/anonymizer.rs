//! Column-wise differential-privacy perturbation of a CSV table

use std::path::Path;

use rand::Rng;
use serde::Serialize;

use crate::error::ServiceError;
use crate::mechanisms::{Binary, Laplace, Mechanism};
use crate::preprocessing::table::{is_missing, Dataset, TableLimits};
use crate::types::{ColumnRoles, PrivacyParams};

/// Binary columns are randomised with a fixed sensitivity.
const BINARY_SENSITIVITY: f64 = 1.0;

/// What was done to each requested column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnonymizationReport {
    pub noised_numerical: Vec<String>,
    pub noised_binary: Vec<String>,
    /// Binary-listed columns without exactly two distinct values.
    pub skipped_binary: Vec<String>,
    /// Requested columns absent from the table.
    pub absent: Vec<String>,
    pub rows: usize,
}

pub struct Anonymizer {
    params: PrivacyParams,
    roles: ColumnRoles,
}

impl Anonymizer {
    pub fn new(params: PrivacyParams, roles: ColumnRoles) -> Self {
        Self { params, roles }
    }

    /// Loads `input`, perturbs it, and writes the result to `output`.
    pub fn anonymize_file(
        &self,
        input: &Path,
        output: &Path,
        limits: TableLimits,
    ) -> Result<AnonymizationReport, ServiceError> {
        let mut dataset = Dataset::from_path(input, limits)?;
        tracing::info!(
            "Loaded {} rows x {} columns, numerical={:?}, binary={:?}",
            dataset.n_rows(),
            dataset.n_columns(),
            self.roles.numerical,
            self.roles.binary
        );
        let report = self.anonymize(&mut dataset, &mut rand::thread_rng())?;
        dataset.to_path(output)?;
        Ok(report)
    }

    /// Every numerical column gets independent Laplace noise per cell; every
    /// binary column with exactly two distinct values gets an independent
    /// Binary draw per cell. Missing cells are left as they are.
    pub fn anonymize<R: Rng + ?Sized>(
        &self,
        dataset: &mut Dataset,
        rng: &mut R,
    ) -> Result<AnonymizationReport, ServiceError> {
        let mut report = AnonymizationReport {
            rows: dataset.n_rows(),
            ..Default::default()
        };

        if !self.roles.categorical.is_empty() {
            tracing::debug!("Categorical columns accepted and ignored: {:?}", self.roles.categorical);
        }

        let laplace = Laplace::new(self.params.epsilon, self.params.sensitivity)?;
        for name in &self.roles.numerical {
            let Some(index) = dataset.column_index(name) else {
                report.absent.push(name.clone());
                continue;
            };

            let mut row = 0;
            dataset.map_column(index, |cell| {
                row += 1;
                if is_missing(cell) {
                    return Ok(cell.to_string());
                }
                let value = cell.trim().parse::<f64>().map_err(|_| {
                    ServiceError::Data(format!(
                        "column '{}' has non-numeric value {:?} at row {}",
                        name, cell, row
                    ))
                })?;
                Ok(laplace.randomise(&value, rng)?.to_string())
            })?;

            tracing::debug!("Laplace noise applied to column '{}'", name);
            report.noised_numerical.push(name.clone());
        }

        for name in &self.roles.binary {
            let Some(index) = dataset.column_index(name) else {
                report.absent.push(name.clone());
                continue;
            };

            let values: Vec<String> = dataset
                .distinct_values(index)
                .into_iter()
                .map(str::to_string)
                .collect();
            let [value0, value1] = values.as_slice() else {
                tracing::debug!(
                    "Column '{}' has {} distinct values, not binary; left unchanged",
                    name,
                    values.len()
                );
                report.skipped_binary.push(name.clone());
                continue;
            };

            let binary = Binary::new(self.params.epsilon, BINARY_SENSITIVITY, value0.as_str(), value1.as_str())?;
            dataset.map_column(index, |cell| {
                if is_missing(cell) {
                    Ok(cell.to_string())
                } else {
                    Ok(binary.randomise(cell, rng)?)
                }
            })?;

            tracing::debug!("Binary mechanism applied to column '{}'", name);
            report.noised_binary.push(name.clone());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CSV: &str = "age,income,smoker,city,label\n\
        34,52000,yes,Oslo,1\n\
        45,61000,no,Rome,0\n\
        29,,yes,Oslo,1\n\
        51,73000,no,Lima,0\n";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), TableLimits::default()).unwrap()
    }

    fn params() -> PrivacyParams {
        PrivacyParams {
            epsilon: 1.0,
            sensitivity: 1.0,
            delta: 0.01,
        }
    }

    fn roles(numerical: &[&str], binary: &[&str]) -> ColumnRoles {
        ColumnRoles {
            numerical: numerical.iter().map(|s| s.to_string()).collect(),
            binary: binary.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_numerical_columns_are_perturbed() {
        let original = dataset();
        let mut data = dataset();
        let anonymizer = Anonymizer::new(params(), roles(&["age", "income", "missing"], &[]));
        let report = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(report.noised_numerical, vec!["age", "income"]);
        assert_eq!(report.absent, vec!["missing"]);
        assert_eq!(data.columns(), original.columns());
        assert_eq!(data.n_rows(), original.n_rows());

        let age = data.column_index("age").unwrap();
        let changed = data
            .column_values(age)
            .zip(original.column_values(age))
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0);
        // missing income stays missing
        assert_eq!(data.row(2)[1], "");
        // untouched column
        let label = data.column_index("label").unwrap();
        assert!(data.column_values(label).eq(original.column_values(label)));
    }

    #[test]
    fn test_repeated_runs_differ() {
        let anonymizer = Anonymizer::new(params(), roles(&["age"], &[]));
        let mut first = dataset();
        let mut second = dataset();
        anonymizer.anonymize(&mut first, &mut rand::thread_rng()).unwrap();
        anonymizer.anonymize(&mut second, &mut rand::thread_rng()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_binary_column_stays_in_domain() {
        let mut data = dataset();
        let anonymizer = Anonymizer::new(params(), roles(&[], &["smoker"]));
        let report = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(report.noised_binary, vec!["smoker"]);
        let smoker = data.column_index("smoker").unwrap();
        assert!(data.column_values(smoker).all(|v| v == "yes" || v == "no"));
    }

    #[test]
    fn test_non_binary_column_is_skipped() {
        let original = dataset();
        let mut data = dataset();
        let anonymizer = Anonymizer::new(params(), roles(&[], &["city", "label"]));
        let report = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(report.skipped_binary, vec!["city"]);
        assert_eq!(report.noised_binary, vec!["label"]);
        let city = data.column_index("city").unwrap();
        assert!(data.column_values(city).eq(original.column_values(city)));
    }

    #[test]
    fn test_low_cardinality_binary_columns_are_skipped() {
        let csv = "flag,note,smoker\n1,,yes\n1,NA,\n1,,no\n1,,yes\n";
        let original = Dataset::from_reader(csv.as_bytes(), TableLimits::default()).unwrap();
        let mut data = original.clone();
        let anonymizer = Anonymizer::new(params(), roles(&[], &["flag", "note", "smoker"]));
        let report = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(report.skipped_binary, vec!["flag", "note"]);
        assert_eq!(report.noised_binary, vec!["smoker"]);
        for name in ["flag", "note"] {
            let index = data.column_index(name).unwrap();
            assert!(data.column_values(index).eq(original.column_values(index)));
        }
    }

    #[test]
    fn test_missing_binary_cells_are_kept() {
        let csv = "id,smoker\n1,yes\n2,\n3,no\n4,NA\n5,yes\n";
        let mut data = Dataset::from_reader(csv.as_bytes(), TableLimits::default()).unwrap();
        let anonymizer = Anonymizer::new(params(), roles(&[], &["smoker"]));

        for seed in 0..20 {
            let mut run = data.clone();
            anonymizer.anonymize(&mut run, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(run.row(1)[1], "");
            assert_eq!(run.row(3)[1], "NA");
            assert!(["yes", "no"].contains(&run.row(0)[1].as_str()));
        }
        let report = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(report.noised_binary, vec!["smoker"]);
        assert_eq!(data.n_rows(), 5);
    }

    #[test]
    fn test_categorical_list_is_ignored() {
        let original = dataset();
        let mut data = dataset();
        let anonymizer = Anonymizer::new(
            params(),
            ColumnRoles {
                categorical: vec!["city".to_string()],
                ..Default::default()
            },
        );
        anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_non_numeric_cell_is_data_error() {
        let mut data = dataset();
        let anonymizer = Anonymizer::new(params(), roles(&["city"], &[]));
        let err = anonymizer.anonymize(&mut data, &mut StdRng::seed_from_u64(3)).unwrap_err();
        assert!(matches!(err, ServiceError::Data(_)));
    }
}
