//! Anomaly detection
//!
//! Statistical outlier tests (Z-score, IQR) plus two analyses built on them:
//! - Per-transaction checks against a lookback window of history
//! - Aggregate spending-pattern analysis over categories and days
//!
//! Sparse history never raises; checks that lack data simply don't fire.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnomalyConfig;
use crate::forecast::{analyze_trend, mean, percentile, std_dev};
use crate::models::{Category, Transaction};

/// History points required before a Z-score can flag anything
const MIN_ZSCORE_HISTORY: usize = 5;
/// History points required for quartiles
const MIN_IQR_HISTORY: usize = 4;
/// Fence multiplier for extreme IQR outliers
const EXTREME_IQR_MULTIPLIER: f64 = 3.0;

/// Kind of anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    HighAmount,
    UnusualCategory,
    Frequency,
    NewMerchant,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighAmount => "high_amount",
            Self::UnusualCategory => "unusual_category",
            Self::Frequency => "frequency",
            Self::NewMerchant => "new_merchant",
        }
    }
}

impl std::str::FromStr for AnomalyType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high_amount" => Ok(Self::HighAmount),
            "unusual_category" => Ok(Self::UnusualCategory),
            "frequency" => Ok(Self::Frequency),
            "new_merchant" => Ok(Self::NewMerchant),
            _ => Err(format!("Unknown anomaly type: {}", s)),
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Criticality of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing, no action needed
    Info,
    /// Should be looked at
    Warning,
    /// Needs attention now
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Warning => 2,
            Self::Alert => 3,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "alert" => Ok(Self::Alert),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// IQR outlier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IqrLevel {
    #[default]
    None,
    Mild,
    Extreme,
}

impl IqrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Extreme => "extreme",
        }
    }
}

impl std::str::FromStr for IqrLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "mild" => Ok(Self::Mild),
            "extreme" => Ok(Self::Extreme),
            _ => Err(format!("Unknown IQR level: {}", s)),
        }
    }
}

impl std::fmt::Display for IqrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case-specific data attached to an anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyDetails {
    /// Amount far above the recent mean
    HighAmount {
        z_score: f64,
        mean: f64,
        std_dev: f64,
        /// History had zero spread, so no Z-score exists
        degenerate: bool,
    },
    /// Amount above the category's IQR fence
    CategoryOutlier {
        category_id: i64,
        q1: f64,
        q3: f64,
        upper_fence: f64,
        level: IqrLevel,
    },
    /// Category rarely seen in history
    RareCategory {
        category_id: i64,
        share: f64,
        history_size: usize,
    },
    /// Burst of transactions on one day
    Frequency {
        same_day_count: usize,
        average_daily: f64,
    },
    /// Category spending growing over time
    CategoryTrend {
        category_id: i64,
        category_name: String,
        change_percent: f64,
        slope: f64,
    },
    /// Daily spending growing over time
    SpendingTrend { change_percent: f64 },
    /// Daily spending swinging widely
    Volatility { volatility: f64 },
}

/// An anomaly found by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedAnomaly {
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub message: String,
    pub details: AnomalyDetails,
}

impl DetectedAnomaly {
    fn new(
        anomaly_type: AnomalyType,
        severity: Severity,
        message: impl Into<String>,
        details: AnomalyDetails,
    ) -> Self {
        Self {
            anomaly_type,
            severity,
            message: message.into(),
            details,
        }
    }

    /// Persistable shape of this anomaly
    pub fn into_record(self, transaction_id: Option<i64>, detected_on: NaiveDate) -> AnomalyRecord {
        AnomalyRecord {
            transaction_id,
            anomaly_type: self.anomaly_type,
            severity: self.severity,
            message: self.message,
            details: self.details,
            detected_on,
        }
    }
}

/// An anomaly as stored by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub message: String,
    pub details: AnomalyDetails,
    pub detected_on: NaiveDate,
}

/// Outcome of a Z-score test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ZScoreTest {
    pub is_anomaly: bool,
    pub z_score: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// History had zero spread; `z_score` is reported as 0
    pub degenerate: bool,
}

/// Outcome of an IQR test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct IqrTest {
    pub level: IqrLevel,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
}

/// Z-score test of `value` against `history`
///
/// Fewer than five history points never flag anything. When the history has
/// no spread at all, any value different from it is anomalous.
pub fn is_anomaly(value: f64, history: &[f64], threshold: f64) -> ZScoreTest {
    if history.len() < MIN_ZSCORE_HISTORY {
        return ZScoreTest::default();
    }

    let avg = mean(history);
    let spread = std_dev(history);

    if spread == 0.0 {
        return ZScoreTest {
            is_anomaly: value != avg,
            z_score: 0.0,
            mean: avg,
            std_dev: 0.0,
            degenerate: true,
        };
    }

    let z_score = (value - avg) / spread;
    ZScoreTest {
        is_anomaly: z_score.abs() > threshold,
        z_score,
        mean: avg,
        std_dev: spread,
        degenerate: false,
    }
}

/// Interquartile-range outlier test of `value` against `history`
///
/// Needs at least four points. Outside the 3×IQR fences is extreme, outside
/// the `multiplier`×IQR fences is mild.
pub fn detect_anomalies_iqr(value: f64, history: &[f64], multiplier: f64) -> IqrTest {
    if history.len() < MIN_IQR_HISTORY {
        return IqrTest::default();
    }

    let q1 = percentile(history, 0.25);
    let q3 = percentile(history, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - multiplier * iqr;
    let upper_fence = q3 + multiplier * iqr;
    let extreme_lower = q1 - EXTREME_IQR_MULTIPLIER * iqr;
    let extreme_upper = q3 + EXTREME_IQR_MULTIPLIER * iqr;

    let level = if value < extreme_lower || value > extreme_upper {
        IqrLevel::Extreme
    } else if value < lower_fence || value > upper_fence {
        IqrLevel::Mild
    } else {
        IqrLevel::None
    };

    IqrTest {
        level,
        q1,
        q3,
        iqr,
        lower_fence,
        upper_fence,
    }
}

/// Overall judgement of a spending-pattern analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    InsufficientData,
    Normal,
    MinorDeviations,
    RequiresAttention,
}

impl Assessment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::Normal => "normal",
            Self::MinorDeviations => "minor_deviations",
            Self::RequiresAttention => "requires_attention",
        }
    }

    /// Bucket by number of anomalies found
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::Normal,
            1..=2 => Self::MinorDeviations,
            _ => Self::RequiresAttention,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InsufficientData => "Not enough expense history to analyze spending patterns",
            Self::Normal => "Spending looks normal",
            Self::MinorDeviations => "Spending shows minor deviations",
            Self::RequiresAttention => "Spending patterns require attention",
        }
    }
}

impl std::str::FromStr for Assessment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "insufficient_data" => Ok(Self::InsufficientData),
            "normal" => Ok(Self::Normal),
            "minor_deviations" => Ok(Self::MinorDeviations),
            "requires_attention" => Ok(Self::RequiresAttention),
            _ => Err(format!("Unknown assessment: {}", s)),
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of [`AnomalyDetector::analyze_spending_patterns`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingPatternReport {
    pub anomalies: Vec<DetectedAnomaly>,
    pub assessment: Assessment,
    pub message: String,
    /// Expense transactions analyzed
    pub expense_count: usize,
}

/// Anomaly detector with configurable thresholds
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Check one transaction against its recent history
    ///
    /// Only expenses are checked. History is restricted to other expenses
    /// dated within `lookback_days` before the transaction (inclusive). The
    /// four checks run independently and are not deduplicated.
    pub fn detect_transaction_anomalies(
        &self,
        tx: &Transaction,
        history: &[Transaction],
        categories: &[Category],
    ) -> Vec<DetectedAnomaly> {
        if !tx.is_expense() {
            return vec![];
        }

        let lookback = u64::try_from(self.config.lookback_days).unwrap_or(0);
        let window_start = tx
            .date
            .checked_sub_days(Days::new(lookback))
            .unwrap_or(NaiveDate::MIN);

        let window: Vec<&Transaction> = history
            .iter()
            .filter(|h| h.is_expense() && h.id != tx.id)
            .filter(|h| h.date >= window_start && h.date <= tx.date)
            .collect();

        let mut anomalies = Vec::new();
        anomalies.extend(self.check_high_amount(tx, &window));
        anomalies.extend(self.check_category_outlier(tx, &window, categories));
        anomalies.extend(self.check_rare_category(tx, &window, categories));
        anomalies.extend(self.check_frequency(tx, &window));

        debug!(
            transaction_id = tx.id,
            history = window.len(),
            found = anomalies.len(),
            "Transaction anomaly checks complete"
        );
        anomalies
    }

    fn check_high_amount(
        &self,
        tx: &Transaction,
        window: &[&Transaction],
    ) -> Option<DetectedAnomaly> {
        let amounts: Vec<f64> = window.iter().map(|h| h.amount).collect();
        let test = is_anomaly(tx.amount, &amounts, self.config.amount_threshold);

        if !test.is_anomaly || tx.amount <= test.mean {
            return None;
        }

        let z = test.z_score.abs();
        let severity = if test.degenerate || z > self.config.zscore_alert {
            Severity::Alert
        } else if z > self.config.zscore_warning {
            Severity::Warning
        } else {
            Severity::Info
        };

        let message = if test.degenerate {
            format!(
                "Amount {:.2} differs from a history that is always {:.2}",
                tx.amount, test.mean
            )
        } else {
            format!(
                "Amount {:.2} is {:.1} standard deviations above the average {:.2}",
                tx.amount, test.z_score, test.mean
            )
        };

        Some(DetectedAnomaly::new(
            AnomalyType::HighAmount,
            severity,
            message,
            AnomalyDetails::HighAmount {
                z_score: test.z_score,
                mean: test.mean,
                std_dev: test.std_dev,
                degenerate: test.degenerate,
            },
        ))
    }

    fn check_category_outlier(
        &self,
        tx: &Transaction,
        window: &[&Transaction],
        categories: &[Category],
    ) -> Option<DetectedAnomaly> {
        let category_id = tx.category_id?;
        let amounts: Vec<f64> = window
            .iter()
            .filter(|h| h.category_id == Some(category_id))
            .map(|h| h.amount)
            .collect();

        let test = detect_anomalies_iqr(tx.amount, &amounts, self.config.iqr_multiplier);
        if test.level == IqrLevel::None || tx.amount <= test.upper_fence {
            return None;
        }

        let severity = match test.level {
            IqrLevel::Extreme => Severity::Alert,
            _ => Severity::Warning,
        };

        Some(DetectedAnomaly::new(
            AnomalyType::HighAmount,
            severity,
            format!(
                "Amount {:.2} is unusually high for {} (typical up to {:.2})",
                tx.amount,
                category_label(categories, category_id),
                test.upper_fence
            ),
            AnomalyDetails::CategoryOutlier {
                category_id,
                q1: test.q1,
                q3: test.q3,
                upper_fence: test.upper_fence,
                level: test.level,
            },
        ))
    }

    fn check_rare_category(
        &self,
        tx: &Transaction,
        window: &[&Transaction],
        categories: &[Category],
    ) -> Option<DetectedAnomaly> {
        let category_id = tx.category_id?;
        if window.len() <= self.config.rare_category_min_history {
            return None;
        }

        let seen = window
            .iter()
            .filter(|h| h.category_id == Some(category_id))
            .count();
        let share = seen as f64 / window.len() as f64;
        if share >= self.config.rare_category_share {
            return None;
        }

        Some(DetectedAnomaly::new(
            AnomalyType::NewMerchant,
            Severity::Info,
            format!(
                "Spending in {} is rare for you ({:.1}% of recent transactions)",
                category_label(categories, category_id),
                share * 100.0
            ),
            AnomalyDetails::RareCategory {
                category_id,
                share,
                history_size: window.len(),
            },
        ))
    }

    fn check_frequency(
        &self,
        tx: &Transaction,
        window: &[&Transaction],
    ) -> Option<DetectedAnomaly> {
        let same_day_count = window.iter().filter(|h| h.date == tx.date).count() + 1;

        let other_days: Vec<&&Transaction> = window.iter().filter(|h| h.date != tx.date).collect();
        let active_days: BTreeSet<NaiveDate> = other_days.iter().map(|h| h.date).collect();
        let average_daily = if active_days.is_empty() {
            0.0
        } else {
            other_days.len() as f64 / active_days.len() as f64
        };

        if same_day_count <= self.config.frequency_min_count
            || same_day_count as f64 <= self.config.frequency_multiplier * average_daily
        {
            return None;
        }

        Some(DetectedAnomaly::new(
            AnomalyType::Frequency,
            Severity::Warning,
            format!(
                "{} transactions on {} (usually {:.1} per day)",
                same_day_count, tx.date, average_daily
            ),
            AnomalyDetails::Frequency {
                same_day_count,
                average_daily,
            },
        ))
    }

    /// Look for growth and volatility across all expenses
    ///
    /// Each category's amounts (in date order) and the daily expense totals
    /// are run through trend analysis. Anomalies come back most severe first.
    pub fn analyze_spending_patterns(
        &self,
        transactions: &[Transaction],
        categories: &[Category],
    ) -> SpendingPatternReport {
        let expenses: Vec<&Transaction> = transactions.iter().filter(|t| t.is_expense()).collect();

        if expenses.len() < self.config.min_transactions {
            debug!(
                expenses = expenses.len(),
                required = self.config.min_transactions,
                "Not enough expenses for pattern analysis"
            );
            let assessment = Assessment::InsufficientData;
            return SpendingPatternReport {
                anomalies: vec![],
                assessment,
                message: assessment.message().to_string(),
                expense_count: expenses.len(),
            };
        }

        let mut anomalies = Vec::new();

        let mut by_category: BTreeMap<i64, Vec<&Transaction>> = BTreeMap::new();
        for tx in &expenses {
            if let Some(category_id) = tx.category_id {
                by_category.entry(category_id).or_default().push(tx);
            }
        }

        for (category_id, mut items) in by_category {
            items.sort_by_key(|t| t.date);
            let amounts: Vec<f64> = items.iter().map(|t| t.amount).collect();
            let trend = analyze_trend(&amounts);

            if !trend.is_up() || trend.change_percent <= self.config.category_growth_warning {
                continue;
            }

            let severity = if trend.change_percent > self.config.category_growth_alert {
                Severity::Alert
            } else {
                Severity::Warning
            };
            let category_name = category_label(categories, category_id);

            anomalies.push(DetectedAnomaly::new(
                AnomalyType::UnusualCategory,
                severity,
                format!(
                    "Spending in {} grew {:.0}%",
                    category_name, trend.change_percent
                ),
                AnomalyDetails::CategoryTrend {
                    category_id,
                    category_name,
                    change_percent: trend.change_percent,
                    slope: trend.slope,
                },
            ));
        }

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for tx in &expenses {
            *daily.entry(tx.date).or_insert(0.0) += tx.amount;
        }
        let daily_totals: Vec<f64> = daily.into_values().collect();
        let daily_trend = analyze_trend(&daily_totals);

        if daily_trend.is_up() && daily_trend.change_percent > self.config.daily_growth_warning {
            anomalies.push(DetectedAnomaly::new(
                AnomalyType::HighAmount,
                Severity::Warning,
                format!(
                    "Daily spending grew {:.0}% over the period",
                    daily_trend.change_percent
                ),
                AnomalyDetails::SpendingTrend {
                    change_percent: daily_trend.change_percent,
                },
            ));
        }

        if daily_trend.volatility > self.config.volatility_info {
            anomalies.push(DetectedAnomaly::new(
                AnomalyType::Frequency,
                Severity::Info,
                format!(
                    "Daily spending is uneven (variation {:.0}%)",
                    daily_trend.volatility * 100.0
                ),
                AnomalyDetails::Volatility {
                    volatility: daily_trend.volatility,
                },
            ));
        }

        // Most urgent first; equal severities keep detection order
        anomalies.sort_by_key(|a| std::cmp::Reverse(a.severity.priority()));

        let assessment = Assessment::from_count(anomalies.len());
        debug!(
            expenses = expenses.len(),
            anomalies = anomalies.len(),
            assessment = assessment.as_str(),
            "Spending pattern analysis complete"
        );

        SpendingPatternReport {
            anomalies,
            assessment,
            message: assessment.message().to_string(),
            expense_count: expenses.len(),
        }
    }
}

fn category_label(categories: &[Category], category_id: i64) -> String {
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("category #{}", category_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryKind;
    use crate::test_utils::{categorized_expense, category, date, expense, income};

    const IQR_SAMPLE: [f64; 8] = [10.0, 12.0, 11.0, 13.0, 12.0, 10.0, 11.0, 14.0];

    #[test]
    fn test_zscore_needs_five_points() {
        let test = is_anomaly(1_000_000.0, &[1.0, 2.0, 3.0, 4.0], 2.5);
        assert!(!test.is_anomaly);
        assert_eq!(test.z_score, 0.0);
    }

    #[test]
    fn test_zscore_flags_outlier() {
        let history = [100.0, 110.0, 90.0, 105.0, 95.0];
        let test = is_anomaly(300.0, &history, 2.5);
        assert!(test.is_anomaly);
        assert!(test.z_score > 2.5);
        assert_eq!(test.mean, 100.0);

        assert!(!is_anomaly(104.0, &history, 2.5).is_anomaly);
    }

    #[test]
    fn test_zscore_degenerate_history() {
        let history = [50.0; 6];

        let same = is_anomaly(50.0, &history, 2.5);
        assert!(!same.is_anomaly);
        assert!(same.degenerate);

        let different = is_anomaly(51.0, &history, 2.5);
        assert!(different.is_anomaly);
        assert!(different.degenerate);
        assert_eq!(different.z_score, 0.0);
        assert!(different.z_score.is_finite());
    }

    #[test]
    fn test_iqr_levels() {
        let extreme = detect_anomalies_iqr(100.0, &IQR_SAMPLE, 1.5);
        assert_eq!(extreme.level, IqrLevel::Extreme);
        assert!((extreme.q1 - 10.75).abs() < 1e-9);
        assert!((extreme.q3 - 12.25).abs() < 1e-9);

        assert_eq!(detect_anomalies_iqr(13.0, &IQR_SAMPLE, 1.5).level, IqrLevel::None);
        assert_eq!(detect_anomalies_iqr(15.0, &IQR_SAMPLE, 1.5).level, IqrLevel::Mild);
        assert_eq!(detect_anomalies_iqr(7.0, &IQR_SAMPLE, 1.5).level, IqrLevel::Mild);
    }

    #[test]
    fn test_iqr_needs_four_points() {
        let test = detect_anomalies_iqr(1000.0, &[1.0, 2.0, 3.0], 1.5);
        assert_eq!(test.level, IqrLevel::None);
    }

    fn steady_history(start_id: i64, day: NaiveDate, count: i64) -> Vec<Transaction> {
        (0..count)
            .map(|i| {
                let amount = 1000.0 + if i % 2 == 0 { 50.0 } else { -50.0 };
                let tx_date = day - chrono::Days::new((i % 30 + 1) as u64);
                categorized_expense(start_id + i, amount, tx_date, 1, "grocery store")
            })
            .collect()
    }

    #[test]
    fn test_high_amount_detected() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let history = steady_history(1, today, 20);
        let tx = categorized_expense(100, 5000.0, today, 1, "grocery store");

        let anomalies = detector.detect_transaction_anomalies(&tx, &history, &[]);

        let high: Vec<_> = anomalies
            .iter()
            .filter(|a| a.anomaly_type == AnomalyType::HighAmount)
            .collect();
        // Z-score and category IQR both fire
        assert_eq!(high.len(), 2);
        assert!(high.iter().all(|a| a.severity == Severity::Alert));
    }

    #[test]
    fn test_high_amount_severity_rises_with_deviation() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        // Alternating 900 / 1100: mean 1000, std dev 100
        let history: Vec<Transaction> = (0..20)
            .map(|i| {
                let amount = if i % 2 == 0 { 900.0 } else { 1100.0 };
                expense(i, amount, today - chrono::Days::new(i as u64 + 1))
            })
            .collect();

        let severity_for = |amount: f64| {
            let tx = expense(100, amount, today);
            let anomalies = detector.detect_transaction_anomalies(&tx, &history, &[]);
            assert_eq!(anomalies.len(), 1);
            assert_eq!(anomalies[0].anomaly_type, AnomalyType::HighAmount);
            anomalies[0].severity
        };

        assert!(detector
            .detect_transaction_anomalies(&expense(100, 1200.0, today), &history, &[])
            .is_empty());
        assert_eq!(severity_for(1280.0), Severity::Info);
        assert_eq!(severity_for(1350.0), Severity::Warning);
        assert_eq!(severity_for(1500.0), Severity::Alert);
    }

    #[test]
    fn test_mild_category_outlier_is_warning() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let history: Vec<Transaction> = IQR_SAMPLE
            .iter()
            .enumerate()
            .map(|(i, &amount)| {
                let tx_date = today - chrono::Days::new(i as u64 + 1);
                categorized_expense(i as i64, amount, tx_date, 1, "bakery")
            })
            .collect();
        let tx = categorized_expense(100, 15.0, today, 1, "bakery");

        let anomalies = detector.detect_transaction_anomalies(&tx, &history, &[]);

        let outlier = anomalies
            .iter()
            .find(|a| matches!(a.details, AnomalyDetails::CategoryOutlier { .. }))
            .unwrap();
        assert_eq!(outlier.severity, Severity::Warning);
        assert!(matches!(
            outlier.details,
            AnomalyDetails::CategoryOutlier {
                level: IqrLevel::Mild,
                ..
            }
        ));
        assert!(outlier.message.contains("category #1"));
    }

    #[test]
    fn test_low_amount_not_flagged() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let history = steady_history(1, today, 20);
        let tx = categorized_expense(100, 10.0, today, 1, "grocery store");

        assert!(detector
            .detect_transaction_anomalies(&tx, &history, &[])
            .is_empty());
    }

    #[test]
    fn test_income_is_ignored() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let history = steady_history(1, today, 20);
        let tx = income(100, 500_000.0, today);

        assert!(detector
            .detect_transaction_anomalies(&tx, &history, &[])
            .is_empty());
    }

    #[test]
    fn test_history_outside_lookback_is_ignored() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        // All history is older than 90 days
        let history: Vec<Transaction> = (0..10)
            .map(|i| expense(i, 100.0 + i as f64, date(2023, 1, 1 + i as u32)))
            .collect();
        let tx = expense(100, 10_000.0, today);

        assert!(detector
            .detect_transaction_anomalies(&tx, &history, &[])
            .is_empty());
    }

    #[test]
    fn test_rare_category_flagged() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let history = steady_history(1, today, 25);
        let categories = vec![category(9, "Jewelry", CategoryKind::Expense, &[])];
        let tx = categorized_expense(100, 1000.0, today, 9, "gold ring");

        let anomalies = detector.detect_transaction_anomalies(&tx, &history, &categories);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::NewMerchant);
        assert_eq!(anomalies[0].severity, Severity::Info);
        assert!(anomalies[0].message.contains("Jewelry"));
    }

    #[test]
    fn test_frequency_burst() {
        let detector = AnomalyDetector::new();
        let today = date(2024, 6, 15);
        let mut history: Vec<Transaction> = (0..10)
            .map(|i| expense(i, 100.0, today - chrono::Days::new(i as u64 + 1)))
            .collect();
        // Ten more earlier the same day
        history.extend((0..10).map(|i| expense(100 + i, 100.0, today)));

        let tx = expense(500, 100.0, today);
        let anomalies = detector.detect_transaction_anomalies(&tx, &history, &[]);

        let frequency: Vec<_> = anomalies
            .iter()
            .filter(|a| a.anomaly_type == AnomalyType::Frequency)
            .collect();
        assert_eq!(frequency.len(), 1);
        assert_eq!(
            frequency[0].details,
            AnomalyDetails::Frequency {
                same_day_count: 11,
                average_daily: 1.0
            }
        );
    }

    #[test]
    fn test_patterns_need_min_transactions() {
        let detector = AnomalyDetector::new();
        let transactions: Vec<Transaction> = (0..4)
            .map(|i| expense(i, 100.0, date(2024, 1, 1 + i as u32)))
            .collect();

        let report = detector.analyze_spending_patterns(&transactions, &[]);
        assert_eq!(report.assessment, Assessment::InsufficientData);
        assert!(report.anomalies.is_empty());
        assert_eq!(report.expense_count, 4);
    }

    #[test]
    fn test_patterns_steady_spending_is_normal() {
        let detector = AnomalyDetector::new();
        let transactions: Vec<Transaction> = (0..10)
            .map(|i| categorized_expense(i, 100.0, date(2024, 1, 1 + i as u32), 1, "lunch"))
            .collect();

        let report = detector.analyze_spending_patterns(&transactions, &[]);
        assert_eq!(report.assessment, Assessment::Normal);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_patterns_category_growth() {
        let detector = AnomalyDetector::new();
        let categories = vec![category(1, "Dining", CategoryKind::Expense, &[])];
        let transactions: Vec<Transaction> = (0..8)
            .map(|i| {
                categorized_expense(
                    i,
                    100.0 + 50.0 * i as f64,
                    date(2024, 1, 1 + i as u32),
                    1,
                    "dinner",
                )
            })
            .collect();

        let report = detector.analyze_spending_patterns(&transactions, &categories);

        let category_growth = report
            .anomalies
            .iter()
            .find(|a| a.anomaly_type == AnomalyType::UnusualCategory)
            .unwrap();
        assert_eq!(category_growth.severity, Severity::Alert);
        assert!(category_growth.message.contains("Dining"));

        // Daily totals mirror the category series
        assert!(report
            .anomalies
            .iter()
            .any(|a| matches!(a.details, AnomalyDetails::SpendingTrend { .. })));
        assert_eq!(report.assessment, Assessment::MinorDeviations);
    }

    #[test]
    fn test_patterns_moderate_category_growth_is_warning() {
        let detector = AnomalyDetector::new();
        // 100..170: second half is ~35% above the first
        let transactions: Vec<Transaction> = (0..8)
            .map(|i| {
                categorized_expense(
                    i,
                    100.0 + 10.0 * i as f64,
                    date(2024, 1, 1 + i as u32),
                    1,
                    "dinner",
                )
            })
            .collect();

        let report = detector.analyze_spending_patterns(&transactions, &[]);

        let category_growth = report
            .anomalies
            .iter()
            .find(|a| a.anomaly_type == AnomalyType::UnusualCategory)
            .unwrap();
        assert_eq!(category_growth.severity, Severity::Warning);
        match &category_growth.details {
            AnomalyDetails::CategoryTrend { change_percent, .. } => {
                assert!(*change_percent > 30.0 && *change_percent <= 50.0);
            }
            other => panic!("unexpected details: {:?}", other),
        }
        assert!(report
            .anomalies
            .iter()
            .all(|a| a.anomaly_type != AnomalyType::Frequency));
        assert_eq!(report.assessment, Assessment::MinorDeviations);
    }

    #[test]
    fn test_patterns_uneven_days_are_info() {
        let detector = AnomalyDetector::new();
        // Alternating small and large days, no usable trend
        let transactions: Vec<Transaction> = (0..8)
            .map(|i| {
                let amount = if i % 2 == 0 { 10.0 } else { 200.0 };
                expense(i, amount, date(2024, 1, 1 + i as u32))
            })
            .collect();

        let report = detector.analyze_spending_patterns(&transactions, &[]);

        assert_eq!(report.anomalies.len(), 1);
        let anomaly = &report.anomalies[0];
        assert_eq!(anomaly.anomaly_type, AnomalyType::Frequency);
        assert_eq!(anomaly.severity, Severity::Info);
        match &anomaly.details {
            AnomalyDetails::Volatility { volatility } => assert!(*volatility > 0.5),
            other => panic!("unexpected details: {:?}", other),
        }
        assert_eq!(report.assessment, Assessment::MinorDeviations);
    }

    #[test]
    fn test_patterns_sorted_by_severity() {
        let detector = AnomalyDetector::new();
        let mut transactions = Vec::new();
        for i in 0..8 {
            let day = date(2024, 1, 1 + i as u32);
            // Category 1 grows ~35% (warning), category 2 grows 160% (alert)
            transactions.push(categorized_expense(i, 100.0 + 10.0 * i as f64, day, 1, "lunch"));
            transactions.push(categorized_expense(100 + i, 100.0 * (i + 1) as f64, day, 2, "bar"));
        }

        let report = detector.analyze_spending_patterns(&transactions, &[]);

        assert_eq!(report.anomalies[0].severity, Severity::Alert);
        assert!(matches!(
            report.anomalies[0].details,
            AnomalyDetails::CategoryTrend { category_id: 2, .. }
        ));
        let priorities: Vec<u8> = report
            .anomalies
            .iter()
            .map(|a| a.severity.priority())
            .collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_assessment_buckets() {
        assert_eq!(Assessment::from_count(0), Assessment::Normal);
        assert_eq!(Assessment::from_count(2), Assessment::MinorDeviations);
        assert_eq!(Assessment::from_count(3), Assessment::RequiresAttention);
    }

    #[test]
    fn test_record_serialization() {
        let anomaly = DetectedAnomaly::new(
            AnomalyType::Frequency,
            Severity::Warning,
            "burst",
            AnomalyDetails::Frequency {
                same_day_count: 12,
                average_daily: 2.0,
            },
        );
        let record = anomaly.into_record(Some(42), date(2024, 6, 15));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "frequency");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["transaction_id"], 42);
        assert_eq!(json["details"]["kind"], "frequency");
        assert_eq!(json["detected_on"], "2024-06-15");
    }
}
