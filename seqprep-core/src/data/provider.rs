//! Price source and cache store traits, plus structured data errors.
//!
//! `PriceSource` abstracts over remote providers (Yahoo Finance, a mock in
//! tests) so the resolver can chain them. `CacheStore` abstracts the local
//! per-ticker cache. Sources don't know about the cache; the resolver sits
//! above both.

use crate::domain::OhlcvRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structured error types for source and cache operations.
///
/// These never escape `resolve`: the resolver logs them and falls back.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider refused the request (HTTP 403)")]
    Forbidden,

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("HTTP {status} for {ticker}")]
    HttpStatus { status: u16, ticker: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a resolved row set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// A remote price source, by its `PriceSource::name`.
    Remote(String),
    /// The local cache, after every remote source came back empty.
    Cache,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote(name) => write!(f, "{name}"),
            DataSource::Cache => f.write_str("cache"),
        }
    }
}

/// A provider of daily OHLCV rows.
///
/// An empty `Vec` is a normal, expected outcome (unknown range, provider
/// outage reported as no rows). Implementations make exactly one attempt per
/// call.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily rows for `ticker` over `[start, end]`.
    ///
    /// The result may extend beyond the window; the resolver clips it.
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, DataError>;
}

/// A per-ticker key-value store of full row series.
pub trait CacheStore: Send + Sync {
    /// Read the cached series for `ticker`; `Ok(None)` when absent.
    fn read(&self, ticker: &str) -> Result<Option<Vec<OhlcvRow>>, DataError>;

    /// Replace the cached series for `ticker`.
    fn write(&self, ticker: &str, rows: &[OhlcvRow], source: &str) -> Result<(), DataError>;
}
