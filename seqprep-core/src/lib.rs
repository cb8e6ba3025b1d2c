//! SeqPrep Core — turns a ticker's daily OHLCV history into model-ready data.
//!
//! This crate contains the whole preparation pipeline:
//! - Domain types (rows, row sets, the fixed column schema)
//! - Price sources and the per-ticker CSV cache, chained by a resolver with
//!   cache fallback
//! - Date window validation and clipping
//! - Calendar resampling (daily/weekly/monthly/quarterly/annual means)
//! - Standardization with an explicit zero-variance policy
//! - Chronological train/test splitting into `[samples, 1, features]` tensors
//! - Config loading and export to Parquet/CSV

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod resample;
pub mod split;
pub mod standardize;
pub mod window;

pub use config::{FrequencySetting, PipelinePlan, PrepConfig};
pub use domain::{Column, OhlcvRow, RowSet};
pub use error::{PrepError, Result};
pub use pipeline::{prepare, PrepSummary, PreparedData};
pub use resample::{resample, Frequency};
pub use split::{split, split_at, TrainTestSplit};
pub use standardize::{standardize, standardize_with, DegeneratePolicy, StandardScaler};
pub use window::{clip, validate, DateWindow};
