//! Column-wise standardization to zero mean and unit variance.
//!
//! Statistics use the population standard deviation (ddof = 0) over the
//! non-NaN values of the row set being transformed. NaN stays NaN.

use crate::domain::{Column, RowSet};
use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};

/// What to do with a column whose standard deviation is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegeneratePolicy {
    /// Fail with `DegenerateColumn`.
    #[default]
    Error,
    /// Emit 0.0 for every value of the column.
    ZeroFill,
}

/// Mean and population standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: Column,
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnStats {
    fn compute(column: Column, values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if finite.is_empty() {
            return Self {
                column,
                mean: f64::NAN,
                std_dev: 0.0,
            };
        }
        // Constant column: sigma is exactly 0 whatever the mean rounds to.
        let first = finite[0];
        if finite.iter().all(|v| *v == first) {
            return Self {
                column,
                mean: first,
                std_dev: 0.0,
            };
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            column,
            mean,
            std_dev: variance.sqrt(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !self.std_dev.is_finite() || self.std_dev <= 0.0
    }
}

/// Per-column scaling fitted on a row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// One entry per column, in schema order.
    stats: [ColumnStats; Column::COUNT],
    policy: DegeneratePolicy,
}

impl StandardScaler {
    /// Compute statistics for every column of `rowset`.
    ///
    /// Under `DegeneratePolicy::Error` a zero-variance column fails here,
    /// before anything is transformed.
    pub fn fit(rowset: &RowSet, policy: DegeneratePolicy) -> Result<Self> {
        let stats = Column::ALL.map(|c| ColumnStats::compute(c, &rowset.column(c)));

        if policy == DegeneratePolicy::Error && !rowset.is_empty() {
            if let Some(bad) = stats.iter().find(|s| s.is_degenerate()) {
                return Err(PrepError::DegenerateColumn { column: bad.column });
            }
        }

        Ok(Self { stats, policy })
    }

    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    pub fn column_stats(&self, column: Column) -> &ColumnStats {
        &self.stats[column as usize]
    }

    pub fn policy(&self) -> DegeneratePolicy {
        self.policy
    }

    fn scale(stats: &ColumnStats, value: f64) -> f64 {
        if value.is_nan() {
            value
        } else if stats.is_degenerate() {
            0.0
        } else {
            (value - stats.mean) / stats.std_dev
        }
    }

    /// Apply the fitted scaling; dates pass through unchanged.
    pub fn transform(&self, rowset: &RowSet) -> RowSet {
        RowSet::from_sorted(
            rowset
                .iter()
                .map(|row| {
                    let mut scaled = *row;
                    for stats in &self.stats {
                        scaled.set(stats.column, Self::scale(stats, row.get(stats.column)));
                    }
                    scaled
                })
                .collect(),
        )
    }

    /// Map standardized target values (e.g. model predictions) back to
    /// Adjusted_Close price units.
    pub fn inverse_target(&self, values: &[f64]) -> Vec<f64> {
        let stats = self.column_stats(Column::TARGET);
        values
            .iter()
            .map(|v| v * stats.std_dev + stats.mean)
            .collect()
    }
}

/// Fit on `rowset` and transform it, failing on zero-variance columns.
pub fn standardize(rowset: &RowSet) -> Result<RowSet> {
    standardize_with(rowset, DegeneratePolicy::Error).map(|(rows, _)| rows)
}

/// Fit and transform under an explicit degenerate-column policy, returning
/// the scaler for later inverse transforms.
pub fn standardize_with(
    rowset: &RowSet,
    policy: DegeneratePolicy,
) -> Result<(RowSet, StandardScaler)> {
    let scaler = StandardScaler::fit(rowset, policy)?;
    Ok((scaler.transform(rowset), scaler))
}
