//! OhlcvRow — one trading day of price data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily OHLCV row for a single ticker.
///
/// Volume is carried as `f64` so a resampled bucket can hold the mean volume
/// without a second row type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adjusted_close: f64,
}

impl OhlcvRow {
    /// Value of one numeric column.
    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::Open => self.open,
            Column::High => self.high,
            Column::Low => self.low,
            Column::Close => self.close,
            Column::Volume => self.volume,
            Column::AdjustedClose => self.adjusted_close,
        }
    }

    /// Overwrite one numeric column.
    pub fn set(&mut self, column: Column, value: f64) {
        match column {
            Column::Open => self.open = value,
            Column::High => self.high = value,
            Column::Low => self.low = value,
            Column::Close => self.close = value,
            Column::Volume => self.volume = value,
            Column::AdjustedClose => self.adjusted_close = value,
        }
    }

    /// Build a row from a date and values in `Column::ALL` order.
    pub fn from_values(date: NaiveDate, values: [f64; Column::COUNT]) -> Self {
        let [open, high, low, close, volume, adjusted_close] = values;
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            adjusted_close,
        }
    }

    /// Values in `Column::ALL` order.
    pub fn values(&self) -> [f64; Column::COUNT] {
        Column::ALL.map(|c| self.get(c))
    }

    /// True if every price and the volume are NaN (a placeholder day).
    pub fn is_void(&self) -> bool {
        self.values().iter().all(|v| v.is_nan())
    }
}

/// The fixed numeric column schema of a row set.
///
/// `AdjustedClose` is always last: the splitter treats it as the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
    AdjustedClose,
}

impl Column {
    pub const COUNT: usize = 6;

    /// All columns in schema order.
    pub const ALL: [Column; Column::COUNT] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
        Column::AdjustedClose,
    ];

    /// The prediction target.
    pub const TARGET: Column = Column::AdjustedClose;

    /// Every column except the target, in schema order.
    pub const FEATURES: [Column; Column::COUNT - 1] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    /// Canonical table label (CSV header, DataFrame column name).
    pub fn label(self) -> &'static str {
        match self {
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
            Column::AdjustedClose => "Adjusted_Close",
        }
    }

    /// Resolve a header label, normalizing the adjusted-close spellings
    /// used by different providers.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Open" => Some(Column::Open),
            "High" => Some(Column::High),
            "Low" => Some(Column::Low),
            "Close" => Some(Column::Close),
            "Volume" => Some(Column::Volume),
            "Adjusted_Close" | "Adjusted Close" | "Adj Close" | "Adj_Close" => {
                Some(Column::AdjustedClose)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> OhlcvRow {
        OhlcvRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
            adjusted_close: 102.5,
        }
    }

    #[test]
    fn target_is_last_column() {
        assert_eq!(Column::ALL[Column::COUNT - 1], Column::TARGET);
        assert!(!Column::FEATURES.contains(&Column::TARGET));
    }

    #[test]
    fn adjusted_close_labels_normalize() {
        for label in ["Adjusted_Close", "Adjusted Close", "Adj Close", "Adj_Close"] {
            assert_eq!(Column::from_label(label), Some(Column::AdjustedClose));
        }
        assert_eq!(Column::AdjustedClose.label(), "Adjusted_Close");
        assert_eq!(Column::from_label("Dividends"), None);
    }

    #[test]
    fn values_follow_schema_order() {
        let row = sample_row();
        assert_eq!(row.values(), [100.0, 105.0, 98.0, 103.0, 50_000.0, 102.5]);
        assert_eq!(OhlcvRow::from_values(row.date, row.values()), row);
    }

    #[test]
    fn set_then_get() {
        let mut row = sample_row();
        row.set(Column::Volume, 1.5);
        assert_eq!(row.get(Column::Volume), 1.5);
    }

    #[test]
    fn void_row_detected() {
        let row = OhlcvRow::from_values(sample_row().date, [f64::NAN; Column::COUNT]);
        assert!(row.is_void());
        assert!(!sample_row().is_void());
    }
}
