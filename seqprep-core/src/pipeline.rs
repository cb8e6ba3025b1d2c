//! End-to-end preparation: resolve → clip → resample → standardize → split.
//!
//! The optional stages run only when the plan asks for them. The first
//! failing stage aborts the run; no partial result is returned.

use crate::config::PipelinePlan;
use crate::data::provider::DataSource;
use crate::data::resolver::SourceResolver;
use crate::domain::RowSet;
use crate::error::Result;
use crate::resample::{resample, Frequency};
use crate::split::{split_at, TrainTestSplit};
use crate::standardize::{standardize_with, StandardScaler};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Everything a prepared run produced.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub ticker: String,
    pub source: DataSource,
    /// Final row set (resampled and/or standardized when requested).
    pub rows: RowSet,
    pub frequency: Option<Frequency>,
    /// Present when the plan asked for normalization.
    pub scaler: Option<StandardScaler>,
    /// Present when the plan asked for a split.
    pub split: Option<TrainTestSplit>,
}

/// Printable digest of a prepared run.
#[derive(Debug, Clone, Serialize)]
pub struct PrepSummary {
    pub ticker: String,
    pub source: String,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    pub normalized: bool,
    pub split: Option<SplitSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub split_date: NaiveDate,
    pub x_train_shape: Vec<usize>,
    pub y_train_len: usize,
    pub x_test_shape: Vec<usize>,
    pub y_test_len: usize,
}

impl PreparedData {
    pub fn summary(&self) -> PrepSummary {
        PrepSummary {
            ticker: self.ticker.clone(),
            source: self.source.to_string(),
            rows: self.rows.len(),
            first_date: self.rows.first_date(),
            last_date: self.rows.last_date(),
            frequency: self.frequency,
            normalized: self.scaler.is_some(),
            split: self.split.as_ref().map(|s| SplitSummary {
                split_date: s.split_date,
                x_train_shape: s.x_train.shape().to_vec(),
                y_train_len: s.train_len(),
                x_test_shape: s.x_test.shape().to_vec(),
                y_test_len: s.test_len(),
            }),
        }
    }
}

/// Transform already-resolved rows according to `plan`.
pub fn transform(
    rows: RowSet,
    plan: &PipelinePlan,
) -> Result<(RowSet, Option<StandardScaler>, Option<TrainTestSplit>)> {
    let rows = match plan.frequency {
        Some(frequency) => {
            let resampled = resample(&rows, frequency);
            debug!(
                frequency = %frequency,
                before = rows.len(),
                after = resampled.len(),
                "resampled"
            );
            resampled
        }
        None => rows,
    };

    let (rows, scaler) = if plan.normalize {
        let (scaled, scaler) = standardize_with(&rows, plan.degenerate)?;
        debug!(rows = scaled.len(), "standardized");
        (scaled, Some(scaler))
    } else {
        (rows, None)
    };

    let split = plan
        .split_date
        .map(|date| split_at(&rows, date))
        .transpose()?;
    if let Some(s) = &split {
        debug!(train = s.train_len(), test = s.test_len(), "split");
    }

    Ok((rows, scaler, split))
}

/// Resolve data for the plan's ticker and run every requested stage.
pub fn prepare(resolver: &SourceResolver<'_>, plan: &PipelinePlan) -> Result<PreparedData> {
    let resolution = resolver.resolve_window(&plan.ticker, &plan.window)?;
    debug!(
        ticker = %plan.ticker,
        source = %resolution.source,
        rows = resolution.rows.len(),
        "resolved"
    );

    let (rows, scaler, split) = transform(resolution.rows, plan)?;

    Ok(PreparedData {
        ticker: plan.ticker.clone(),
        source: resolution.source,
        rows,
        frequency: plan.frequency,
        scaler,
        split,
    })
}
