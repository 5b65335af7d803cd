//! Engine configuration
//!
//! Thresholds, weights and the keyword dictionary are plain immutable
//! structs handed to each component, so tests and locales can swap them
//! without touching globals.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/tally/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Files may be partial: every missing field keeps its documented default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorize::keywords::{default_dictionary, KeywordGroup};
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Tolerance for the health weights summing to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration for the whole engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub categorizer: CategorizerConfig,
    pub anomaly: AnomalyConfig,
    pub health: HealthConfig,
}

impl EngineConfig {
    /// Load from the default override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Reject configs the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        self.categorizer.validate()?;
        self.anomaly.validate()?;
        self.health.validate()
    }
}

/// Categorizer stage confidences and similarity thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Confidence of a matching user rule
    pub rule_confidence: f64,
    /// Confidence of a category's own keyword hit
    pub keyword_confidence: f64,
    /// Confidence of a global dictionary hit
    pub dictionary_confidence: f64,
    /// Historical learning: `min(cap, base + share * span)`
    pub history_base_confidence: f64,
    pub history_confidence_span: f64,
    pub history_confidence_cap: f64,
    /// Dice coefficient at which two descriptions count as the same merchant
    pub history_similarity: f64,
    /// Minimum similar transactions for the winning category
    pub history_min_occurrences: usize,
    /// Dice coefficient a category name must exceed in the fuzzy fallback
    pub fuzzy_threshold: f64,
    /// Multiplier turning fuzzy similarity into confidence
    pub fuzzy_confidence_scale: f64,
    /// Minimum occurrences for a learned pattern
    pub pattern_min_occurrences: usize,
    /// Minimum confidence for a suggested rule
    pub suggestion_min_confidence: f64,
    /// Global keyword table; replaces the built-in one when set in a file
    pub dictionary: Vec<KeywordGroup>,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            rule_confidence: 0.95,
            keyword_confidence: 0.85,
            dictionary_confidence: 0.75,
            history_base_confidence: 0.5,
            history_confidence_span: 0.4,
            history_confidence_cap: 0.9,
            history_similarity: 0.7,
            history_min_occurrences: 2,
            fuzzy_threshold: 0.6,
            fuzzy_confidence_scale: 0.6,
            pattern_min_occurrences: 3,
            suggestion_min_confidence: 0.5,
            dictionary: default_dictionary(),
        }
    }
}

impl CategorizerConfig {
    fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("rule_confidence", self.rule_confidence),
            ("keyword_confidence", self.keyword_confidence),
            ("dictionary_confidence", self.dictionary_confidence),
            ("history_base_confidence", self.history_base_confidence),
            ("history_confidence_cap", self.history_confidence_cap),
            ("history_similarity", self.history_similarity),
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("fuzzy_confidence_scale", self.fuzzy_confidence_scale),
            ("suggestion_min_confidence", self.suggestion_min_confidence),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "categorizer.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Anomaly detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Z-score beyond which an amount is anomalous
    pub amount_threshold: f64,
    /// Z-score above which a high amount is a warning
    pub zscore_warning: f64,
    /// Z-score above which a high amount is an alert
    pub zscore_alert: f64,
    /// History window before the analyzed transaction
    pub lookback_days: i64,
    /// Expenses required before spending patterns are analyzed
    pub min_transactions: usize,
    /// Fence multiplier for mild IQR outliers
    pub iqr_multiplier: f64,
    /// Category share of history below which a category is rare
    pub rare_category_share: f64,
    /// History size required before the rare-category check runs
    pub rare_category_min_history: usize,
    /// Same-day count that must be exceeded to flag frequency
    pub frequency_min_count: usize,
    /// Multiple of the average daily count that must be exceeded
    pub frequency_multiplier: f64,
    /// Category growth (percent) flagged as a warning
    pub category_growth_warning: f64,
    /// Category growth (percent) flagged as an alert
    pub category_growth_alert: f64,
    /// Growth (percent) of daily totals flagged as a warning
    pub daily_growth_warning: f64,
    /// Coefficient of variation of daily totals flagged as info
    pub volatility_info: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            amount_threshold: 2.5,
            zscore_warning: 3.0,
            zscore_alert: 4.0,
            lookback_days: 90,
            min_transactions: 5,
            iqr_multiplier: 1.5,
            rare_category_share: 0.02,
            rare_category_min_history: 20,
            frequency_min_count: 10,
            frequency_multiplier: 3.0,
            category_growth_warning: 30.0,
            category_growth_alert: 50.0,
            daily_growth_warning: 20.0,
            volatility_info: 0.5,
        }
    }
}

impl AnomalyConfig {
    fn validate(&self) -> Result<()> {
        if self.amount_threshold <= 0.0 || self.iqr_multiplier <= 0.0 {
            return Err(Error::InvalidConfig(
                "anomaly.amount_threshold and anomaly.iqr_multiplier must be positive".to_string(),
            ));
        }
        if self.zscore_warning > self.zscore_alert {
            return Err(Error::InvalidConfig(format!(
                "anomaly.zscore_warning ({}) must not exceed anomaly.zscore_alert ({})",
                self.zscore_warning, self.zscore_alert
            )));
        }
        if self.category_growth_warning > self.category_growth_alert {
            return Err(Error::InvalidConfig(format!(
                "anomaly.category_growth_warning ({}) must not exceed anomaly.category_growth_alert ({})",
                self.category_growth_warning, self.category_growth_alert
            )));
        }
        if self.lookback_days < 0 {
            return Err(Error::InvalidConfig(format!(
                "anomaly.lookback_days must not be negative, got {}",
                self.lookback_days
            )));
        }
        Ok(())
    }
}

/// Sub-score weights of the overall health score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthWeights {
    pub savings: f64,
    pub budget: f64,
    pub debt: f64,
    pub stability: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            savings: 0.30,
            budget: 0.25,
            debt: 0.20,
            stability: 0.25,
        }
    }
}

impl HealthWeights {
    pub fn sum(&self) -> f64 {
        self.savings + self.budget + self.debt + self.stability
    }
}

/// Metric values anchoring the excellent/good/fair/poor score points
///
/// For higher-is-better metrics `excellent > good > fair > poor`; for
/// lower-is-better metrics the order is reversed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl ScoreBands {
    pub fn higher_is_better(&self) -> bool {
        self.excellent >= self.poor
    }

    fn is_monotonic(&self) -> bool {
        let ordered = |a: f64, b: f64, c: f64, d: f64| a > b && b > c && c > d;
        ordered(self.excellent, self.good, self.fair, self.poor)
            || ordered(self.poor, self.fair, self.good, self.excellent)
    }
}

/// Scores awarded exactly at each band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandScores {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl Default for BandScores {
    fn default() -> Self {
        Self {
            excellent: 100.0,
            good: 80.0,
            fair: 60.0,
            poor: 40.0,
        }
    }
}

/// Health scoring thresholds and weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub weights: HealthWeights,
    pub band_scores: BandScores,
    /// Savings rate (higher is better)
    pub savings: ScoreBands,
    /// Budget adherence rate (higher is better)
    pub budget: ScoreBands,
    /// Credit share of expenses (lower is better)
    pub debt: ScoreBands,
    /// Coefficient of variation of daily expenses (lower is better)
    pub stability: ScoreBands,
    /// Stability points lost per adverse income/expense trend
    pub trend_penalty: f64,
    /// Months of history feeding the income/expense trends
    pub trend_months: u32,
    /// Sub-score below which a recommendation is produced
    pub recommendation_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            band_scores: BandScores::default(),
            savings: ScoreBands {
                excellent: 0.30,
                good: 0.20,
                fair: 0.10,
                poor: 0.0,
            },
            budget: ScoreBands {
                excellent: 1.0,
                good: 0.8,
                fair: 0.6,
                poor: 0.4,
            },
            debt: ScoreBands {
                excellent: 0.1,
                good: 0.3,
                fair: 0.5,
                poor: 0.7,
            },
            stability: ScoreBands {
                excellent: 0.3,
                good: 0.5,
                fair: 0.8,
                poor: 1.2,
            },
            trend_penalty: 10.0,
            trend_months: 6,
            recommendation_threshold: 60.0,
        }
    }
}

impl HealthConfig {
    fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "health.weights must sum to 1.0, got {}",
                sum
            )));
        }

        let bands = [
            ("savings", self.savings),
            ("budget", self.budget),
            ("debt", self.debt),
            ("stability", self.stability),
        ];
        for (name, band) in bands {
            if !band.is_monotonic() {
                return Err(Error::InvalidConfig(format!(
                    "health.{} thresholds must be strictly ordered",
                    name
                )));
            }
        }

        let scores = self.band_scores;
        if !(scores.excellent > scores.good
            && scores.good > scores.fair
            && scores.fair > scores.poor
            && scores.poor >= 0.0
            && scores.excellent <= 100.0)
        {
            return Err(Error::InvalidConfig(
                "health.band_scores must decrease from excellent to poor within [0, 100]"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("engine.toml"))
}

/// Load configuration (override first, then default)
///
/// An explicit path must exist; the default override location is optional.
pub fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    let content = match override_path {
        Some(path) => {
            debug!(path = %path.display(), "Loading engine config");
            fs::read_to_string(path)?
        }
        None => match default_config_path() {
            Some(default_path) if default_path.exists() => {
                debug!(path = %default_path.display(), "Loading engine config override");
                fs::read_to_string(&default_path)?
            }
            _ => DEFAULT_CONFIG.to_string(),
        },
    };

    parse_config(&content)
}

/// Parse and validate config from TOML content
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidConfig(format!("Invalid config TOML: {}", e)))?;
    config.validate()?;
    Ok(config)
}
