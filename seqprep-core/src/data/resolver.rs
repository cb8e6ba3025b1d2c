//! Source resolution with cache fallback.
//!
//! Fallback policy for `resolve(ticker, start, end)`:
//! 1. Validate both dates (fails before any fetch)
//! 2. Try each price source in order; an error or an empty result counts as absent
//! 3. First non-empty result → write the full series to the cache, return it clipped
//! 4. Every source absent → read the cache and clip it
//! 5. Cache absent or unreadable → `NoDataAvailable`
//!
//! One attempt per source, no retries. The cache is only written after a
//! successful fetch, never on fallback.

use super::provider::{CacheStore, DataSource, PriceSource};
use crate::domain::RowSet;
use crate::error::{PrepError, Result};
use crate::window::{clip, DateWindow};
use tracing::{debug, info, warn};

/// A row set plus where it came from.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub rows: RowSet,
    pub source: DataSource,
}

/// Ordered chain of price sources backed by a cache store.
pub struct SourceResolver<'a> {
    sources: Vec<&'a dyn PriceSource>,
    cache: &'a dyn CacheStore,
}

impl<'a> SourceResolver<'a> {
    /// Resolver with no price sources yet; until one is added it reads the
    /// cache only.
    pub fn new(cache: &'a dyn CacheStore) -> Self {
        Self {
            sources: Vec::new(),
            cache,
        }
    }

    /// Append a source to the end of the chain.
    pub fn with_source(mut self, source: &'a dyn PriceSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Resolve from string bounds, validating them first.
    pub fn resolve(&self, ticker: &str, start: &str, end: &str) -> Result<Resolution> {
        let window = DateWindow::parse(start, end)?;
        self.resolve_window(ticker, &window)
    }

    /// Resolve over an already-validated window.
    pub fn resolve_window(&self, ticker: &str, window: &DateWindow) -> Result<Resolution> {
        for source in &self.sources {
            match source.fetch(ticker, window.start(), window.end()) {
                Ok(rows) if !rows.is_empty() => {
                    let full = RowSet::from_rows(rows);
                    info!(
                        ticker,
                        source = source.name(),
                        rows = full.len(),
                        "retrieved data from price source"
                    );
                    if let Err(e) = self.cache.write(ticker, full.rows(), source.name()) {
                        warn!(ticker, error = %e, "failed to write cache");
                    }
                    return Ok(Resolution {
                        rows: clip(&full, window),
                        source: DataSource::Remote(source.name().to_string()),
                    });
                }
                Ok(_) => {
                    debug!(ticker, source = source.name(), "price source returned no rows");
                }
                Err(e) => {
                    warn!(ticker, source = source.name(), error = %e, "price source failed");
                }
            }
        }

        match self.cache.read(ticker) {
            Ok(Some(rows)) => {
                let full = RowSet::from_rows(rows);
                info!(
                    ticker,
                    rows = full.len(),
                    "no data from price sources, using locally cached data"
                );
                Ok(Resolution {
                    rows: clip(&full, window),
                    source: DataSource::Cache,
                })
            }
            Ok(None) => Err(PrepError::NoDataAvailable {
                ticker: ticker.to_string(),
            }),
            Err(e) => {
                warn!(ticker, error = %e, "cache entry is unreadable");
                Err(PrepError::NoDataAvailable {
                    ticker: ticker.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::DataError;
    use crate::domain::OhlcvRow;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rows(dates: &[&str]) -> Vec<OhlcvRow> {
        dates
            .iter()
            .enumerate()
            .map(|(i, s)| OhlcvRow::from_values(d(s), [i as f64 + 1.0; 6]))
            .collect()
    }

    struct FixedSource {
        rows: Vec<OhlcvRow>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn with_rows(rows: Vec<OhlcvRow>) -> Self {
            Self {
                rows,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                rows: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<Vec<OhlcvRow>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::NetworkUnreachable("offline".into()));
            }
            Ok(self.rows.clone())
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, Vec<OhlcvRow>>>,
        writes: AtomicUsize,
    }

    impl CacheStore for MemoryCache {
        fn read(&self, ticker: &str) -> Result<Option<Vec<OhlcvRow>>, DataError> {
            Ok(self.entries.lock().unwrap().get(ticker).cloned())
        }

        fn write(&self, ticker: &str, rows: &[OhlcvRow], _: &str) -> Result<(), DataError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .insert(ticker.to_string(), rows.to_vec());
            Ok(())
        }
    }

    /// Reads nothing, rejects every write.
    struct ReadOnlyCache;

    impl CacheStore for ReadOnlyCache {
        fn read(&self, _: &str) -> Result<Option<Vec<OhlcvRow>>, DataError> {
            Ok(None)
        }

        fn write(&self, _: &str, _: &[OhlcvRow], _: &str) -> Result<(), DataError> {
            Err(DataError::Cache("read-only".into()))
        }
    }

    #[test]
    fn invalid_date_fails_before_fetch() {
        let source = FixedSource::with_rows(rows(&["2020-01-01"]));
        let cache = MemoryCache::default();
        let resolver = SourceResolver::new(&cache).with_source(&source);

        let err = resolver.resolve("SPY", "2020-13-01", "2020-12-31").unwrap_err();
        assert!(matches!(err, PrepError::InvalidDateFormat { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fetch_caches_full_series_and_clips_result() {
        let source = FixedSource::with_rows(rows(&["2020-01-01", "2020-01-02", "2020-01-03"]));
        let cache = MemoryCache::default();
        let resolver = SourceResolver::new(&cache).with_source(&source);

        let res = resolver.resolve("SPY", "2020-01-02", "2020-01-02").unwrap();
        assert_eq!(res.rows.dates(), vec![d("2020-01-02")]);
        assert_eq!(res.source, DataSource::Remote("fixed".into()));
        assert_eq!(cache.read("SPY").unwrap().unwrap().len(), 3);
    }

    #[test]
    fn cache_write_failure_does_not_fail_resolve() {
        let source = FixedSource::with_rows(rows(&["2020-01-01", "2020-01-02", "2020-01-03"]));
        let resolver = SourceResolver::new(&ReadOnlyCache).with_source(&source);

        let res = resolver.resolve("SPY", "2020-01-02", "2020-01-03").unwrap();
        assert_eq!(res.source, DataSource::Remote("fixed".into()));
        assert_eq!(res.rows.dates(), vec![d("2020-01-02"), d("2020-01-03")]);
    }

    #[test]
    fn empty_source_falls_back_to_cache_without_writing() {
        let source = FixedSource::with_rows(Vec::new());
        let cache = MemoryCache::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert("SPY".into(), rows(&["2020-01-01", "2020-01-05"]));
        let resolver = SourceResolver::new(&cache).with_source(&source);

        let res = resolver.resolve("SPY", "2020-01-02", "2020-01-31").unwrap();
        assert_eq!(res.source, DataSource::Cache);
        assert_eq!(res.rows.dates(), vec![d("2020-01-05")]);
        assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sources_tried_in_order() {
        let broken = FixedSource::failing();
        let backup = FixedSource::with_rows(rows(&["2020-01-01"]));
        let never = FixedSource::with_rows(rows(&["2020-01-01"]));
        let cache = MemoryCache::default();
        let resolver = SourceResolver::new(&cache)
            .with_source(&broken)
            .with_source(&backup)
            .with_source(&never);

        let res = resolver.resolve("SPY", "2020-01-01", "2020-01-01").unwrap();
        assert_eq!(res.rows.len(), 1);
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(never.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_source_and_no_cache_is_no_data() {
        let source = FixedSource::failing();
        let cache = MemoryCache::default();
        let resolver = SourceResolver::new(&cache).with_source(&source);

        let err = resolver.resolve("SPY", "2020-01-01", "2020-12-31").unwrap_err();
        assert!(matches!(err, PrepError::NoDataAvailable { ticker } if ticker == "SPY"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn offline_reads_cache_only() {
        let cache = MemoryCache::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert("QQQ".into(), rows(&["2020-01-01"]));
        let resolver = SourceResolver::new(&cache);

        let res = resolver.resolve("QQQ", "2020-01-01", "2020-01-31").unwrap();
        assert_eq!(res.source, DataSource::Cache);
        assert_eq!(res.rows.len(), 1);
    }
}
