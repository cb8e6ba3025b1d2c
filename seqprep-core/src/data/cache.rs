//! CSV cache store, one file per ticker.
//!
//! Layout: `{cache_dir}/data_{TICKER}.csv` plus a `data_{TICKER}.meta.json`
//! sidecar.
//!
//! Features:
//! - Table format `Date,Open,High,Low,Close,Volume,Adjusted_Close`, dates as
//!   `YYYY-MM-DD`, NaN written as an empty cell
//! - Legacy adjusted-close headers (`Adj Close`, `Adj_Close`, `Adjusted Close`)
//!   accepted on read
//! - Atomic writes (write to .tmp, rename into place)
//! - Metadata sidecar per ticker (hash, date range, source)

use super::provider::{CacheStore, DataError};
use crate::domain::OhlcvRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk row layout.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
    #[serde(
        rename = "Adjusted_Close",
        alias = "Adjusted Close",
        alias = "Adj Close",
        alias = "Adj_Close"
    )]
    adjusted_close: Option<f64>,
}

impl CsvRecord {
    fn from_row(row: &OhlcvRow) -> Self {
        let finite = |v: f64| (!v.is_nan()).then_some(v);
        Self {
            date: row.date.format("%Y-%m-%d").to_string(),
            open: finite(row.open),
            high: finite(row.high),
            low: finite(row.low),
            close: finite(row.close),
            volume: finite(row.volume),
            adjusted_close: finite(row.adjusted_close),
        }
    }

    fn into_row(self) -> Result<OhlcvRow, DataError> {
        let date = parse_cached_date(&self.date)?;
        Ok(OhlcvRow {
            date,
            open: self.open.unwrap_or(f64::NAN),
            high: self.high.unwrap_or(f64::NAN),
            low: self.low.unwrap_or(f64::NAN),
            close: self.close.unwrap_or(f64::NAN),
            volume: self.volume.unwrap_or(f64::NAN),
            adjusted_close: self.adjusted_close.unwrap_or(f64::NAN),
        })
    }
}

/// Accept `YYYY-MM-DD` optionally followed by a time part
/// (`2020-01-02 00:00:00`, `2020-01-02T00:00:00`).
fn parse_cached_date(raw: &str) -> Result<NaiveDate, DataError> {
    let day = raw.trim().split([' ', 'T']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DataError::Cache(format!("bad date '{raw}' in cache: {e}")))
}

/// Metadata sidecar for a cached ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// Cache status for a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub ticker: String,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub row_count: Option<usize>,
}

/// The CSV cache.
#[derive(Debug, Clone)]
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path to the data file: `{cache_dir}/data_{TICKER}.csv`
    pub fn data_path(&self, ticker: &str) -> PathBuf {
        self.cache_dir
            .join(format!("data_{}.csv", file_safe_ticker(ticker)))
    }

    /// Path to the metadata sidecar for a ticker.
    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.cache_dir
            .join(format!("data_{}.meta.json", file_safe_ticker(ticker)))
    }

    /// Metadata for a cached ticker, if any.
    pub fn get_meta(&self, ticker: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Which tickers have cached data, and their date ranges.
    pub fn status(&self, tickers: &[&str]) -> Vec<CacheStatus> {
        tickers
            .iter()
            .map(|ticker| {
                let meta = self.get_meta(ticker);
                CacheStatus {
                    ticker: ticker.to_string(),
                    cached: meta.is_some() || self.data_path(ticker).exists(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    row_count: meta.as_ref().map(|m| m.row_count),
                }
            })
            .collect()
    }

    fn write_meta(&self, ticker: &str, rows: &[OhlcvRow], source: &str) -> Result<(), DataError> {
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Ok(());
        };
        let hash_input = serde_json::to_vec(rows)
            .map_err(|e| DataError::Cache(format!("hash serialization: {e}")))?;
        let meta = CacheMeta {
            ticker: ticker.to_string(),
            start_date: first.date,
            end_date: last.date,
            row_count: rows.len(),
            data_hash: blake3::hash(&hash_input).to_hex().to_string(),
            source: source.to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Cache(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(ticker), meta_json)?;
        Ok(())
    }
}

/// Ticker as used in cache file names. Path separators and other
/// characters outside `[A-Za-z0-9.^=-]` become `_`, so `BRK/B` maps to
/// `BRK_B` and a ticker can never leave the cache directory.
fn file_safe_ticker(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write rows as a CSV table. Shared with the CLI's `.csv` export.
pub fn write_rows_csv(path: &Path, rows: &[OhlcvRow]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(CsvRecord::from_row(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CSV table written by [`write_rows_csv`] or a pandas export.
pub fn read_rows_csv(path: &Path) -> Result<Vec<OhlcvRow>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<CsvRecord>()
        .map(|record| record?.into_row())
        .collect()
}

impl CacheStore for CsvCache {
    fn read(&self, ticker: &str) -> Result<Option<Vec<OhlcvRow>>, DataError> {
        let path = self.data_path(ticker);
        if !path.exists() {
            return Ok(None);
        }
        let rows = read_rows_csv(&path)?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows))
    }

    fn write(&self, ticker: &str, rows: &[OhlcvRow], source: &str) -> Result<(), DataError> {
        if rows.is_empty() {
            return Err(DataError::Cache("no rows to cache".into()));
        }

        fs::create_dir_all(&self.cache_dir)?;

        let path = self.data_path(ticker);
        let tmp_path = path.with_extension("csv.tmp");

        if let Err(e) = write_rows_csv(&tmp_path, rows) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename failed: {e}"))
        })?;

        self.write_meta(ticker, rows, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<OhlcvRow> {
        vec![
            OhlcvRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000.0,
                adjusted_close: 100.5,
            },
            OhlcvRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100.0,
                adjusted_close: f64::NAN,
            },
        ]
    }

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());

        cache.write("SPY", &sample_rows(), "test").unwrap();
        let loaded = cache.read("SPY").unwrap().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(loaded[0].adjusted_close, 100.5);
        assert!(loaded[1].adjusted_close.is_nan());
        assert!(!cache.data_path("SPY").with_extension("csv.tmp").exists());
    }

    #[test]
    fn header_uses_canonical_labels() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        cache.write("SPY", &sample_rows(), "test").unwrap();

        let content = fs::read_to_string(cache.data_path("SPY")).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, "Date,Open,High,Low,Close,Volume,Adjusted_Close");
    }

    #[test]
    fn read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        assert!(cache.read("NONEXISTENT").unwrap().is_none());
    }

    #[test]
    fn reads_legacy_adj_close_header_and_datetime_dates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.data_path("AAPL"),
            "Open,High,Low,Close,Adj Close,Volume,Date\n\
             10,11,9,10.5,10.4,500,2021-03-01 00:00:00\n",
        )
        .unwrap();

        let rows = cache.read("AAPL").unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].adjusted_close, 10.4);
        assert_eq!(rows[0].volume, 500.0);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
    }

    #[test]
    fn unreadable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        fs::write(
            cache.data_path("BAD"),
            "Date,Open,High,Low,Close,Volume,Adjusted_Close\nnot-a-date,1,1,1,1,1,1\n",
        )
        .unwrap();
        assert!(cache.read("BAD").is_err());
    }

    #[test]
    fn meta_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());

        cache.write("SPY", &sample_rows(), "yahoo_finance").unwrap();
        let meta = cache.get_meta("SPY").unwrap();
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.source, "yahoo_finance");
        assert_eq!(meta.end_date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

        let statuses = cache.status(&["SPY", "QQQ"]);
        assert!(statuses[0].cached);
        assert!(!statuses[1].cached);
    }

    #[test]
    fn ticker_path_separators_stay_inside_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path().join("cache"));

        for ticker in ["BRK/B", "../escape", "a\\b"] {
            let path = cache.data_path(ticker);
            assert_eq!(path.parent(), Some(cache.cache_dir()), "{ticker}");
        }
        assert_eq!(cache.data_path("BRK/B"), cache.cache_dir().join("data_BRK_B.csv"));
        assert_eq!(cache.data_path("^GSPC"), cache.cache_dir().join("data_^GSPC.csv"));

        cache.write("../escape", &sample_rows(), "test").unwrap();
        assert_eq!(cache.read("../escape").unwrap().unwrap().len(), sample_rows().len());
        assert!(!dir.path().join("escape.csv").exists());
        assert!(cache.get_meta("../escape").is_some());
    }

    #[test]
    fn empty_write_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvCache::new(dir.path());
        assert!(cache.write("SPY", &[], "test").is_err());
    }
}
