//! Serializable preparation config, validated once into a typed plan.
//!
//! Every choice a user would otherwise be prompted for lives here:
//! normalization, resampling frequency, and the train/test split date.

use crate::error::{PrepError, Result};
use crate::resample::Frequency;
use crate::standardize::DegeneratePolicy;
use crate::window::{parse_date, DateWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Frequency as written in a config file: a 1-5 menu choice or a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrequencySetting {
    Choice(i64),
    Name(String),
}

impl FrequencySetting {
    pub fn resolve(&self) -> Result<Frequency> {
        match self {
            FrequencySetting::Choice(n) => Frequency::from_choice(*n),
            FrequencySetting::Name(name) => name.parse(),
        }
    }
}

/// Raw preparation settings, as loaded from TOML or assembled by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepConfig {
    pub ticker: String,
    pub start: String,
    pub end: String,
    /// Standardize every column after resampling.
    #[serde(default)]
    pub normalize: bool,
    /// Resample to this frequency; omitted means no resampling.
    #[serde(default)]
    pub frequency: Option<FrequencySetting>,
    /// Produce a chronological train/test split.
    #[serde(default)]
    pub split: bool,
    /// Required when `split` is true.
    #[serde(default)]
    pub split_date: Option<String>,
    #[serde(default)]
    pub degenerate: DegeneratePolicy,
}

impl PrepConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PrepError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PrepError::Config(format!("parse config TOML: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PrepError::Config(format!("serialize config: {e}")))
    }

    /// Check every setting and produce the typed plan the pipeline runs.
    pub fn validate(&self) -> Result<PipelinePlan> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return Err(PrepError::Config("ticker must not be empty".into()));
        }

        let window = DateWindow::parse(&self.start, &self.end)?;

        let frequency = self
            .frequency
            .as_ref()
            .map(FrequencySetting::resolve)
            .transpose()?;

        let split_date = if self.split {
            let raw = self.split_date.as_deref().unwrap_or_default();
            Some(parse_date(raw).ok_or_else(|| PrepError::InvalidSplitDate {
                value: raw.to_string(),
            })?)
        } else {
            None
        };

        Ok(PipelinePlan {
            ticker: ticker.to_string(),
            window,
            frequency,
            normalize: self.normalize,
            split_date,
            degenerate: self.degenerate,
        })
    }
}

/// A validated preparation request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    pub ticker: String,
    pub window: DateWindow,
    pub frequency: Option<Frequency>,
    pub normalize: bool,
    pub split_date: Option<NaiveDate>,
    pub degenerate: DegeneratePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PrepConfig {
        PrepConfig {
            ticker: "SPY".into(),
            start: "2020-01-01".into(),
            end: "2020-12-31".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_config_means_no_optional_stages() {
        let plan = base().validate().unwrap();
        assert_eq!(plan.frequency, None);
        assert!(!plan.normalize);
        assert_eq!(plan.split_date, None);
        assert_eq!(plan.degenerate, DegeneratePolicy::Error);
    }

    #[test]
    fn parses_full_toml() {
        let cfg = PrepConfig::from_toml(
            r#"
            ticker = "SPY"
            start = "2020-01-01"
            end = "2020-12-31"
            normalize = true
            frequency = 2
            split = true
            split_date = "2020-09-30"
            degenerate = "zero-fill"
            "#,
        )
        .unwrap();
        let plan = cfg.validate().unwrap();
        assert_eq!(plan.frequency, Some(Frequency::Weekly));
        assert!(plan.normalize);
        assert_eq!(plan.split_date, NaiveDate::from_ymd_opt(2020, 9, 30));
        assert_eq!(plan.degenerate, DegeneratePolicy::ZeroFill);
    }

    #[test]
    fn frequency_by_name() {
        let cfg = PrepConfig::from_toml(
            "ticker = \"SPY\"\nstart = \"2020-01-01\"\nend = \"2020-12-31\"\nfrequency = \"quarterly\"\n",
        )
        .unwrap();
        assert_eq!(cfg.validate().unwrap().frequency, Some(Frequency::Quarterly));
    }

    #[test]
    fn out_of_range_frequency_choice_rejected() {
        for n in [0, 6] {
            let cfg = PrepConfig {
                frequency: Some(FrequencySetting::Choice(n)),
                ..base()
            };
            assert!(matches!(
                cfg.validate(),
                Err(PrepError::InvalidFrequencyChoice(_))
            ));
        }
    }

    #[test]
    fn split_without_date_rejected() {
        let cfg = PrepConfig {
            split: true,
            ..base()
        };
        assert!(matches!(cfg.validate(), Err(PrepError::InvalidSplitDate { .. })));
    }

    #[test]
    fn split_date_ignored_when_split_disabled() {
        let cfg = PrepConfig {
            split_date: Some("garbage".into()),
            ..base()
        };
        assert_eq!(cfg.validate().unwrap().split_date, None);
    }

    #[test]
    fn bad_window_rejected() {
        let cfg = PrepConfig {
            start: "2020-02-30".into(),
            ..base()
        };
        assert!(matches!(cfg.validate(), Err(PrepError::InvalidDateFormat { .. })));
    }

    #[test]
    fn empty_ticker_rejected() {
        let cfg = PrepConfig {
            ticker: "  ".into(),
            ..base()
        };
        assert!(matches!(cfg.validate(), Err(PrepError::Config(_))));
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = PrepConfig {
            normalize: true,
            frequency: Some(FrequencySetting::Name("monthly".into())),
            ..base()
        };
        let parsed = PrepConfig::from_toml(&cfg.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, cfg);
    }
}
