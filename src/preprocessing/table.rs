//! In-memory CSV table

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::ServiceError;

/// Cell values read as missing, matching what common dataframe readers treat as NA.
const MISSING_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
];

pub fn is_missing(value: &str) -> bool {
    MISSING_VALUES.contains(&value.trim())
}

pub const DEFAULT_MAX_ROWS: usize = 200_000;
pub const DEFAULT_MAX_COLUMNS: usize = 512;

/// Upper bounds on what a single upload may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::Args)]
pub struct TableLimits {
    /// Maximum data rows per CSV
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS, env = "DP_UTILITY_MAX_ROWS")]
    pub max_rows: usize,

    /// Maximum columns per CSV
    #[arg(long, default_value_t = DEFAULT_MAX_COLUMNS, env = "DP_UTILITY_MAX_COLUMNS")]
    pub max_columns: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

/// Row-major table of raw string cells with a named header.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_path(path: &Path, limits: TableLimits) -> Result<Self, ServiceError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, limits)
    }

    /// Reads a headed CSV, stopping as soon as a limit is exceeded.
    pub fn from_reader<R: Read>(reader: R, limits: TableLimits) -> Result<Self, ServiceError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|name| name.to_owned())
            .collect();
        if columns.len() > limits.max_columns {
            return Err(ServiceError::DatasetTooLarge {
                limit: limits.max_columns,
                unit: "columns",
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if rows.len() == limits.max_rows {
                return Err(ServiceError::DatasetTooLarge {
                    limit: limits.max_rows,
                    unit: "rows",
                });
            }
            rows.push(record.iter().map(|cell| cell.to_owned()).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn to_path(&self, path: &Path) -> Result<(), ServiceError> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ServiceError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row(&self, i: usize) -> &[String] {
        &self.rows[i]
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// Distinct non-missing values of a column, sorted.
    pub fn distinct_values(&self, index: usize) -> BTreeSet<&str> {
        self.column_values(index).filter(|v| !is_missing(v)).collect()
    }

    /// Rewrites every cell of a column in place.
    pub fn map_column<F>(&mut self, index: usize, mut f: F) -> Result<(), ServiceError>
    where
        F: FnMut(&str) -> Result<String, ServiceError>,
    {
        for row in self.rows.iter_mut() {
            row[index] = f(&row[index])?;
        }
        Ok(())
    }
}
