//! Pipeline error taxonomy.
//!
//! Source and cache failures live in [`crate::data::DataError`]; the resolver
//! turns them into fallback behavior. Everything a caller of the pipeline can
//! observe is a `PrepError`.

use crate::domain::Column;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("incorrect date format '{value}', should be YYYY-MM-DD")]
    InvalidDateFormat { value: String },

    #[error("start date {start} is after end date {end}")]
    InvalidDateWindow { start: NaiveDate, end: NaiveDate },

    #[error("no data available for '{ticker}' from any source or the local cache")]
    NoDataAvailable { ticker: String },

    #[error("invalid frequency choice '{0}': expected 1-5 or daily/weekly/monthly/quarterly/annual")]
    InvalidFrequencyChoice(String),

    #[error("invalid split date '{value}', should be YYYY-MM-DD")]
    InvalidSplitDate { value: String },

    #[error("column {column} has zero variance and cannot be standardized")]
    DegenerateColumn { column: Column },

    #[error("config error: {0}")]
    Config(String),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("export error: {0}")]
    Export(String),
}

pub type Result<T, E = PrepError> = std::result::Result<T, E>;
