//! RowSet — a date-ordered table of OHLCV rows.

use super::row::{Column, OhlcvRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rows sorted ascending by date with unique dates.
///
/// Every pipeline stage takes a `&RowSet` and returns a new one, so a row set
/// is never shared between stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    rows: Vec<OhlcvRow>,
}

impl RowSet {
    /// Canonicalize raw rows: stable sort by date, then keep the first row
    /// for any duplicated date.
    pub fn from_rows(mut rows: Vec<OhlcvRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        rows.dedup_by_key(|r| r.date);
        Self { rows }
    }

    /// Wrap rows already known to be strictly increasing by date.
    pub(crate) fn from_sorted(rows: Vec<OhlcvRow>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[OhlcvRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OhlcvRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcvRow> {
        self.rows.iter()
    }

    /// The date index.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// All values of one column, in date order.
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.rows.iter().map(|r| r.get(column)).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Rows whose date satisfies `keep`, order preserved.
    pub fn filter_dates(&self, mut keep: impl FnMut(NaiveDate) -> bool) -> RowSet {
        Self::from_sorted(self.rows.iter().filter(|r| keep(r.date)).copied().collect())
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a OhlcvRow;
    type IntoIter = std::slice::Iter<'a, OhlcvRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
