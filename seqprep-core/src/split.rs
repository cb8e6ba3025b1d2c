//! Chronological train/test split shaped for a sequence model.
//!
//! Rows dated on or before the split date train, later rows test. The
//! Adjusted_Close column is the target; the remaining columns become a
//! `[samples, 1, features]` tensor (one timestep per sample).

use crate::domain::{Column, RowSet};
use crate::error::{PrepError, Result};
use crate::window::parse_date;
use chrono::NaiveDate;
use ndarray::{Array1, Array3};

/// Feature tensors and target vectors for both partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub split_date: NaiveDate,
    /// Training features, shape `[train_rows, 1, features]`
    pub x_train: Array3<f64>,
    /// Training targets (Adjusted_Close)
    pub y_train: Array1<f64>,
    /// Testing features, shape `[test_rows, 1, features]`
    pub x_test: Array3<f64>,
    /// Testing targets (Adjusted_Close)
    pub y_test: Array1<f64>,
    pub train_dates: Vec<NaiveDate>,
    pub test_dates: Vec<NaiveDate>,
    pub feature_names: Vec<&'static str>,
}

impl TrainTestSplit {
    pub fn train_len(&self) -> usize {
        self.y_train.len()
    }

    pub fn test_len(&self) -> usize {
        self.y_test.len()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// Parse `split_date` and split `rowset` at it.
pub fn split(rowset: &RowSet, split_date: &str) -> Result<TrainTestSplit> {
    let date = parse_date(split_date).ok_or_else(|| PrepError::InvalidSplitDate {
        value: split_date.to_string(),
    })?;
    split_at(rowset, date)
}

/// Split `rowset` at an already-parsed date. A date outside the data range
/// leaves one partition empty.
pub fn split_at(rowset: &RowSet, split_date: NaiveDate) -> Result<TrainTestSplit> {
    let train = rowset.filter_dates(|d| d <= split_date);
    let test = rowset.filter_dates(|d| d > split_date);

    let (x_train, y_train) = to_tensors(&train)?;
    let (x_test, y_test) = to_tensors(&test)?;

    Ok(TrainTestSplit {
        split_date,
        x_train,
        y_train,
        x_test,
        y_test,
        train_dates: train.dates(),
        test_dates: test.dates(),
        feature_names: Column::FEATURES.iter().map(|c| c.label()).collect(),
    })
}

fn to_tensors(rows: &RowSet) -> Result<(Array3<f64>, Array1<f64>)> {
    let features: Vec<f64> = rows
        .iter()
        .flat_map(|row| Column::FEATURES.map(|c| row.get(c)))
        .collect();
    let x = Array3::from_shape_vec((rows.len(), 1, Column::FEATURES.len()), features)?;
    let y = Array1::from(rows.column(Column::TARGET));
    Ok((x, y))
}
