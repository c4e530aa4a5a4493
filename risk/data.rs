//! # Dataset Loading and Validation
//!
//! Reads a delimited table with a header row and turns it into the numeric
//! feature matrix and label vector the estimator consumes.
//!
//! - Strict Schema: column names are fixed by [`crate::schema`]. Extra columns
//!   are ignored; a missing one fails the whole load.
//! - Incomplete rows are filtered, not fatal: a row with an empty cell or a
//!   missing-value marker ([`MISSING_VALUE_TOKENS`]) in any required column is
//!   dropped, and the count is reported. Blank lines are skipped and not counted.
//! - Row order of the retained records is the row order of the file.

use crate::schema::{self, Feature, LABEL_COLUMN, NUM_FEATURES};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cell contents read as a missing value in every column, in addition to an
/// empty cell.
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A validated, fully populated set of training records.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Shape: [n_records, NUM_FEATURES], columns in `Feature::ALL` order.
    features: Array2<f64>,
    /// Binary outcome, from the `target` column.
    labels: Array1<f64>,
    dropped_rows: usize,
}

/// Knobs for reading the tabular source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub separator: u8,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { separator: b',' }
    }
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("The data source '{}' does not exist or is not a regular file.", .0.display())]
    SourceNotFound(PathBuf),
    #[error("The data source is missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
    #[error(
        "The required column '{column}' contains non-numeric data and could not be read as numbers. (Found type: {found_type})"
    )]
    ColumnWrongType { column: String, found_type: String },
    #[error("Non-finite values (NaN or Infinity) were found in the required column '{0}'.")]
    NonFiniteValue(String),
    #[error(
        "Feature matrix has shape [{rows}, {cols}] and label vector has {labels} entries; expected [{labels}, {expected_cols}]."
    )]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        labels: usize,
        expected_cols: usize,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    Polars(#[from] PolarsError),
}

impl Dataset {
    /// Builds a dataset from in-memory arrays, applying the same shape and
    /// finiteness checks the file loader applies.
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self, DataError> {
        if features.ncols() != NUM_FEATURES || features.nrows() != labels.len() {
            return Err(DataError::ShapeMismatch {
                rows: features.nrows(),
                cols: features.ncols(),
                labels: labels.len(),
                expected_cols: NUM_FEATURES,
            });
        }
        for feature in Feature::ALL {
            if features.column(feature.index()).iter().any(|v| !v.is_finite()) {
                return Err(DataError::NonFiniteValue(feature.column().to_string()));
            }
        }
        if labels.iter().any(|v| !v.is_finite()) {
            return Err(DataError::NonFiniteValue(LABEL_COLUMN.to_string()));
        }
        Ok(Self {
            features,
            labels,
            dropped_rows: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    /// Number of source rows filtered out because a required cell was empty.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }
}

/// Reads and validates a dataset from `path`.
pub fn load_dataset(path: impl AsRef<Path>, options: &LoaderOptions) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DataError::SourceNotFound(path.to_path_buf()));
    }

    log::info!("Loading data from '{}'", path.display());
    let null_values = NullValues::AllColumns(
        MISSING_VALUE_TOKENS
            .iter()
            .map(|&token| PlSmallStr::from(token))
            .collect(),
    );
    let read = CsvReader::new(File::open(path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None)
                .with_parse_options(
                    CsvParseOptions::default()
                        .with_separator(options.separator)
                        .with_null_values(Some(null_values)),
                ),
        )
        .finish();
    let df = match read {
        Ok(df) => df,
        // A source without even a header row.
        Err(PolarsError::NoData(_)) => {
            return Err(DataError::SchemaMismatch {
                missing: schema::required_columns().map(str::to_string).collect(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let header: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let missing: Vec<String> = schema::required_columns()
        .filter(|col| !header.contains(*col))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(DataError::SchemaMismatch { missing });
    }

    let feature_columns = Feature::ALL
        .iter()
        .map(|feature| internal::extract_optional_column(&df, feature.column()))
        .collect::<Result<Vec<_>, _>>()?;
    let label_column = internal::extract_optional_column(&df, LABEL_COLUMN)?;

    let blank = internal::blank_rows(&df);
    let total_rows = blank.iter().filter(|&&is_blank| !is_blank).count();
    let kept: Vec<usize> = (0..df.height())
        .filter(|&row| {
            !blank[row]
                && label_column[row].is_some()
                && feature_columns.iter().all(|col| col[row].is_some())
        })
        .collect();
    let dropped_rows = total_rows - kept.len();

    let mut features = Array2::<f64>::zeros((kept.len(), NUM_FEATURES));
    for (feature, column) in Feature::ALL.iter().zip(&feature_columns) {
        for (out_row, &row) in kept.iter().enumerate() {
            let value = column[row].unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(DataError::NonFiniteValue(feature.column().to_string()));
            }
            features[[out_row, feature.index()]] = value;
        }
    }
    let labels = kept
        .iter()
        .map(|&row| label_column[row].unwrap_or(f64::NAN))
        .collect::<Array1<f64>>();
    if labels.iter().any(|v| !v.is_finite()) {
        return Err(DataError::NonFiniteValue(LABEL_COLUMN.to_string()));
    }

    if dropped_rows > 0 {
        log::warn!(
            "Dropped {dropped_rows} of {total_rows} rows with missing values in required columns."
        );
    }
    log::info!("Loaded {} complete records.", kept.len());

    Ok(Dataset {
        features,
        labels,
        dropped_rows,
    })
}

mod internal {
    use super::*;

    /// Reads one required column as `f64`, keeping empty cells as `None`.
    /// Cells that hold text which is not a number are an error, not a gap.
    pub(super) fn extract_optional_column(
        df: &DataFrame,
        column_name: &str,
    ) -> Result<Vec<Option<f64>>, DataError> {
        let column = df.column(column_name)?;
        let wrong_type = || DataError::ColumnWrongType {
            column: column_name.to_string(),
            found_type: format!("{:?}", column.dtype()),
        };

        let casted = column.cast(&DataType::Float64).map_err(|_| wrong_type())?;
        // A non-strict cast turns unparseable text into nulls.
        if casted.null_count() > column.null_count() {
            return Err(wrong_type());
        }

        Ok(casted.f64()?.into_iter().collect())
    }

    /// Rows with no value in any column, as produced by blank lines.
    pub(super) fn blank_rows(df: &DataFrame) -> Vec<bool> {
        let mut blank = vec![true; df.height()];
        for column in df.get_columns() {
            let nulls = column.is_null();
            for (row, is_null) in (&nulls).into_iter().enumerate() {
                if is_null != Some(true) {
                    blank[row] = false;
                }
            }
        }
        blank
    }
}
