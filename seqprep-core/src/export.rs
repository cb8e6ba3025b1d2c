//! Row set export: Polars DataFrame, Parquet, and CSV files.

use crate::data::cache::write_rows_csv;
use crate::domain::{Column as RowColumn, RowSet};
use crate::error::{PrepError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Convert a row set to a DataFrame with a `Date` column followed by the
/// schema columns.
pub fn to_dataframe(rows: &RowSet) -> Result<DataFrame> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| PrepError::Export("epoch date".into()))?;
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    let mut columns = vec![Column::new("Date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| PrepError::Export(format!("date cast: {e}")))?];
    for c in RowColumn::ALL {
        columns.push(Column::new(c.label().into(), rows.column(c)));
    }

    DataFrame::new(columns).map_err(|e| PrepError::Export(format!("dataframe creation: {e}")))
}

/// Write a row set to a Parquet file.
pub fn write_parquet(rows: &RowSet, path: &Path) -> Result<()> {
    let mut df = to_dataframe(rows)?;
    let file = fs::File::create(path)
        .map_err(|e| PrepError::Export(format!("create {}: {e}", path.display())))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| PrepError::Export(format!("write parquet: {e}")))?;
    Ok(())
}

/// Write a row set in the cache's CSV table format.
pub fn write_csv(rows: &RowSet, path: &Path) -> Result<()> {
    write_rows_csv(path, rows.rows()).map_err(|e| PrepError::Export(e.to_string()))
}

/// Write by file extension: `.parquet` or `.csv`.
pub fn write_file(rows: &RowSet, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => write_parquet(rows, path),
        Some("csv") => write_csv(rows, path),
        other => Err(PrepError::Export(format!(
            "unsupported output extension {:?}, expected .parquet or .csv",
            other.unwrap_or("")
        ))),
    }
}
