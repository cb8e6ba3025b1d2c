//! Data sources, the ticker cache, and source resolution

pub mod cache;
pub mod provider;
pub mod resolver;
pub mod yahoo;

pub use cache::{CacheMeta, CacheStatus, CsvCache};
pub use provider::{CacheStore, DataError, DataSource, PriceSource};
pub use resolver::{Resolution, SourceResolver};
pub use yahoo::YahooSource;
