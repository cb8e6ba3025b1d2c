//! Calendar resampling by per-bucket arithmetic mean.
//!
//! Each output row is labelled with the last calendar day of its bucket:
//! the date itself (daily), the Sunday closing the ISO week, month end,
//! quarter end, or December 31. Buckets without input rows are not emitted.

use crate::domain::{Column, OhlcvRow, RowSet};
use crate::error::{PrepError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Resampling frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Annual,
    ];

    /// Map a 1-based menu choice (1 = daily … 5 = annual).
    pub fn from_choice(choice: i64) -> Result<Self> {
        usize::try_from(choice)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| PrepError::InvalidFrequencyChoice(choice.to_string()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annual => "annual",
        }
    }

    /// The canonical label date of the bucket containing `date`.
    pub fn bucket_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
                date.checked_add_days(Days::new(to_sunday))
                    .unwrap_or(NaiveDate::MAX)
            }
            Frequency::Monthly => month_end(date.year(), date.month()),
            Frequency::Quarterly => {
                let quarter_last_month = (date.month() - 1) / 3 * 3 + 3;
                month_end(date.year(), quarter_last_month)
            }
            Frequency::Annual => month_end(date.year(), 12),
        }
    }
}

/// Last day of `year`-`month`.
fn month_end(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = PrepError;

    /// Accepts names, pandas-style aliases, or a menu number.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(choice) = trimmed.parse::<i64>() {
            return Self::from_choice(choice);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Frequency::Daily),
            "weekly" | "week" | "w" => Ok(Frequency::Weekly),
            "monthly" | "month" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "quarter" | "q" => Ok(Frequency::Quarterly),
            "annual" | "annually" | "yearly" | "year" | "a" | "y" => Ok(Frequency::Annual),
            _ => Err(PrepError::InvalidFrequencyChoice(trimmed.to_string())),
        }
    }
}

/// Running per-column sums over one bucket. NaN inputs are skipped.
#[derive(Default)]
struct Bucket {
    sums: [f64; Column::COUNT],
    counts: [usize; Column::COUNT],
}

impl Bucket {
    fn add(&mut self, row: &OhlcvRow) {
        for (i, value) in row.values().into_iter().enumerate() {
            if !value.is_nan() {
                self.sums[i] += value;
                self.counts[i] += 1;
            }
        }
    }

    fn mean_row(&self, date: NaiveDate) -> OhlcvRow {
        let mut means = [f64::NAN; Column::COUNT];
        for (i, mean) in means.iter_mut().enumerate() {
            if self.counts[i] > 0 {
                *mean = self.sums[i] / self.counts[i] as f64;
            }
        }
        OhlcvRow::from_values(date, means)
    }
}

/// Aggregate `rowset` to `frequency`, one row per non-empty bucket in
/// chronological order.
pub fn resample(rowset: &RowSet, frequency: Frequency) -> RowSet {
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for row in rowset {
        buckets
            .entry(frequency.bucket_end(row.date))
            .or_default()
            .add(row);
    }

    RowSet::from_sorted(
        buckets
            .iter()
            .map(|(date, bucket)| bucket.mean_row(*date))
            .collect(),
    )
}
