//! Tally Core Library
//!
//! The financial analytics engine behind the Tally personal finance tracker:
//! - Categorizer: layered heuristics mapping descriptions to categories
//! - Forecast engine: regression, forecasts, trend classification, moving averages
//! - Anomaly detector: Z-score and IQR checks over transaction history
//! - Health scorer: composite 0-100 score with recommendations
//! - Config loader for thresholds, weights and the keyword dictionary
//! - Import helpers for loading datasets from CSV/JSON
//!
//! Every analytics entry point is a pure function of its inputs. Nothing here
//! touches storage, the network, or the wall clock.

pub mod anomaly;
pub mod categorize;
pub mod config;
pub mod error;
pub mod forecast;
pub mod health;
pub mod import;
pub mod models;

/// Fixture builders for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use anomaly::{
    AnomalyDetails, AnomalyDetector, AnomalyRecord, AnomalyType, Assessment, DetectedAnomaly,
    IqrLevel, IqrTest, Severity, SpendingPatternReport, ZScoreTest,
};
pub use categorize::{
    Categorizer, CategoryPrediction, LearnedPattern, PredictionSource, SuggestedRule,
};
pub use config::{
    load_config, parse_config, AnomalyConfig, CategorizerConfig, EngineConfig, HealthConfig,
};
pub use error::{Error, Result};
pub use forecast::{Forecast, Regression, SeriesPoint, Trend, TrendDirection};
pub use health::{
    Grade, HealthAnalysis, HealthMetrics, HealthScore, HealthScorer, HealthSnapshot, Priority,
    Recommendation,
};
pub use import::Dataset;
pub use models::{
    Budget, BudgetPeriod, Category, CategoryKind, CategoryRule, Goal, Transaction,
    TransactionType,
};
