//! Date filter: boundary date validation and inclusive window clipping.

use crate::domain::RowSet;
use crate::error::{PrepError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date. `2020-02-30` is rejected.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn parse_bound(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| PrepError::InvalidDateFormat {
        value: value.to_string(),
    })
}

/// Check that both bounds are well-formed calendar dates.
pub fn validate(start: &str, end: &str) -> Result<()> {
    parse_bound(start)?;
    parse_bound(end)?;
    Ok(())
}

/// Inclusive `[start, end]` date window, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PrepError::InvalidDateWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse and validate both bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_bound(start)?, parse_bound(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Rows with `start <= date <= end`, order preserved. An empty result is valid.
pub fn clip(rowset: &RowSet, window: &DateWindow) -> RowSet {
    rowset.filter_dates(|d| window.contains(d))
}
