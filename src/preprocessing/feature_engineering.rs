//! Feature engineering для оценки моделей

use ndarray::{s, Array1, Array2};

use crate::error::ServiceError;
use crate::preprocessing::table::{is_missing, Dataset};

/// Sorted classes of a label column; a label's id is its position.
///
/// A column whose labels all parse as numbers is keyed by value, so `1` and
/// `1.0` are the same class.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassEncoding {
    Numeric(Vec<f64>),
    Labels(Vec<String>),
}

impl ClassEncoding {
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().map(str::trim).collect();
        let numeric: Option<Vec<f64>> = labels.iter().map(|l| parse_label(l)).collect();

        match numeric {
            Some(mut values) => {
                values.sort_by(f64::total_cmp);
                values.dedup();
                ClassEncoding::Numeric(values)
            }
            None => {
                let mut names: Vec<String> = labels.into_iter().map(str::to_string).collect();
                names.sort();
                names.dedup();
                ClassEncoding::Labels(names)
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        match self {
            ClassEncoding::Numeric(values) => values.len(),
            ClassEncoding::Labels(names) => names.len(),
        }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        match self {
            ClassEncoding::Numeric(values) => {
                let value = parse_label(label)?;
                values.binary_search_by(|v| v.total_cmp(&value)).ok()
            }
            ClassEncoding::Labels(names) => names.binary_search_by(|n| n.as_str().cmp(label)).ok(),
        }
    }
}

fn parse_label(label: &str) -> Option<f64> {
    let value = label.parse::<f64>().ok().filter(|v| v.is_finite())?;
    // -0.0 and 0.0 are one class
    Some(value + 0.0)
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn parse_numeric(value: &str, column: &str, row: usize) -> Result<f64, ServiceError> {
        if is_missing(value) {
            return Err(ServiceError::Data(format!(
                "column '{}' has a missing value at row {}",
                column,
                row + 1
            )));
        }
        value.trim().parse::<f64>().map_err(|_| {
            ServiceError::Data(format!(
                "column '{}' has non-numeric value {:?} at row {}",
                column,
                value,
                row + 1
            ))
        })
    }

    /// Numeric matrix of `columns` restricted to `rows`, in the given order.
    pub fn extract_features(
        dataset: &Dataset,
        columns: &[String],
        rows: &[usize],
    ) -> Result<Array2<f64>, ServiceError> {
        let indices = Self::resolve_columns(dataset, columns)?;
        let mut features = Array2::zeros((rows.len(), indices.len()));

        for (i, &row) in rows.iter().enumerate() {
            let record = dataset.row(row);
            for (j, &col) in indices.iter().enumerate() {
                features[[i, j]] = Self::parse_numeric(&record[col], &columns[j], row)?;
            }
        }

        Ok(features)
    }

    /// Class encoding over every non-missing value of the label column.
    pub fn class_encoding(dataset: &Dataset, column: &str) -> Result<ClassEncoding, ServiceError> {
        let index = dataset.column_index(column).ok_or(ServiceError::InvalidColumns)?;
        Ok(ClassEncoding::from_labels(dataset.distinct_values(index)))
    }

    pub fn extract_class_labels(
        dataset: &Dataset,
        column: &str,
        rows: &[usize],
        encoding: &ClassEncoding,
    ) -> Result<Array1<usize>, ServiceError> {
        let index = dataset.column_index(column).ok_or(ServiceError::InvalidColumns)?;
        rows.iter()
            .map(|&row| {
                let value = &dataset.row(row)[index];
                encoding.encode(value.trim()).ok_or_else(|| {
                    ServiceError::Data(format!(
                        "column '{}' has a missing label at row {}",
                        column,
                        row + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    pub fn extract_numeric_target(
        dataset: &Dataset,
        column: &str,
        rows: &[usize],
    ) -> Result<Array1<f64>, ServiceError> {
        let index = dataset.column_index(column).ok_or(ServiceError::InvalidColumns)?;
        rows.iter()
            .map(|&row| Self::parse_numeric(&dataset.row(row)[index], column, row))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    /// Appends a constant 1 column for the intercept term.
    pub fn with_intercept(features: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::ones((features.nrows(), features.ncols() + 1));
        out.slice_mut(s![.., ..features.ncols()]).assign(features);
        out
    }

    fn resolve_columns(dataset: &Dataset, columns: &[String]) -> Result<Vec<usize>, ServiceError> {
        columns
            .iter()
            .map(|name| dataset.column_index(name).ok_or(ServiceError::InvalidColumns))
            .collect()
    }
}
