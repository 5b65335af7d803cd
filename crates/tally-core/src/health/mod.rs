//! Financial health scoring
//!
//! Scores the current calendar month on four axes, each mapped to 0-100 by
//! interpolating across configurable bands:
//! - Savings: net savings over income
//! - Budget: share of budgets not exceeded
//! - Debt: credit-paid share of expenses
//! - Stability: variation of daily spending, penalized by adverse trends
//!
//! The weighted sum is the overall score, graded A-F, with recommendations
//! for the weak areas and a comparison against earlier snapshots.

pub mod metrics;
pub mod recommendations;
pub mod scoring;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HealthConfig;
use crate::forecast::{analyze_trend, monthly_totals, Trend};
use crate::models::{Budget, Goal, Transaction, TransactionType};

pub use metrics::{compute_metrics, HealthMetrics};
pub use recommendations::{Priority, Recommendation, RecommendationDetails};
pub use scoring::{interpolate, Grade};

/// Sub-scores, overall score and grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Weighted sum of the sub-scores, rounded
    pub overall: u8,
    pub savings: f64,
    pub budget: f64,
    pub debt: f64,
    pub stability: f64,
    pub grade: Grade,
    pub summary: String,
}

/// Monthly income and expense trends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HealthTrends {
    pub expense: Trend,
    pub income: Trend,
}

/// Change of the overall score against earlier snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Comparison {
    pub previous_month: i16,
    pub previous_quarter: i16,
}

/// Full result of a health analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAnalysis {
    pub score: HealthScore,
    pub metrics: HealthMetrics,
    pub recommendations: Vec<Recommendation>,
    pub trends: HealthTrends,
    pub comparison: Comparison,
}

impl HealthAnalysis {
    /// The record a host persists to compare against later
    pub fn snapshot(&self, date: NaiveDate) -> HealthSnapshot {
        HealthSnapshot {
            date,
            overall: self.score.overall,
            savings: self.score.savings,
            budget: self.score.budget,
            debt: self.score.debt,
            stability: self.score.stability,
            grade: self.score.grade,
        }
    }
}

/// A past health score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub date: NaiveDate,
    pub overall: u8,
    pub savings: f64,
    pub budget: f64,
    pub debt: f64,
    pub stability: f64,
    pub grade: Grade,
}

/// Health scorer with configurable weights and bands
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    config: HealthConfig,
}

impl HealthScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Score the calendar month containing `today`
    ///
    /// `previous_snapshots` may be empty or in any order.
    pub fn analyze_financial_health(
        &self,
        transactions: &[Transaction],
        budgets: &[Budget],
        goals: &[Goal],
        previous_snapshots: &[HealthSnapshot],
        today: NaiveDate,
    ) -> HealthAnalysis {
        let metrics = compute_metrics(transactions, budgets, goals, today);
        let trends = self.trends(transactions, today);
        let score = self.score(&metrics, &trends);
        let recommendations = recommendations::recommend(&self.config, &score, &metrics, &trends);
        let comparison = compare(score.overall, previous_snapshots, today);

        debug!(
            overall = score.overall,
            grade = score.grade.as_str(),
            recommendations = recommendations.len(),
            "Health analysis complete"
        );

        HealthAnalysis {
            score,
            metrics,
            recommendations,
            trends,
            comparison,
        }
    }

    fn score(&self, metrics: &HealthMetrics, trends: &HealthTrends) -> HealthScore {
        let config = &self.config;
        let scores = &config.band_scores;

        let savings = interpolate(metrics.savings_rate, &config.savings, scores);
        let budget = interpolate(metrics.budget_adherence_rate, &config.budget, scores);
        let debt = interpolate(metrics.credit_ratio, &config.debt, scores);

        let mut stability = interpolate(metrics.expense_volatility, &config.stability, scores);
        if trends.expense.is_up() {
            stability -= config.trend_penalty;
        }
        if trends.income.is_down() {
            stability -= config.trend_penalty;
        }
        let stability = stability.clamp(0.0, 100.0);

        let weights = &config.weights;
        let weighted = savings * weights.savings
            + budget * weights.budget
            + debt * weights.debt
            + stability * weights.stability;
        let overall = weighted.round().clamp(0.0, 100.0) as u8;
        let grade = Grade::from_score(overall);

        HealthScore {
            overall,
            savings,
            budget,
            debt,
            stability,
            grade,
            summary: grade.summary().to_string(),
        }
    }

    /// Trends of monthly totals over the last `trend_months` months
    fn trends(&self, transactions: &[Transaction], today: NaiveDate) -> HealthTrends {
        let Some((month_start, month_end)) = metrics::month_bounds(today) else {
            return HealthTrends::default();
        };
        let span = self.config.trend_months.saturating_sub(1);
        let window_start = month_start
            .checked_sub_months(Months::new(span))
            .unwrap_or(NaiveDate::MIN);

        let recent: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.date >= window_start && t.date <= month_end)
            .cloned()
            .collect();

        let series = |kind: TransactionType| -> Vec<f64> {
            monthly_totals(&recent, kind)
                .into_iter()
                .map(|p| p.amount)
                .collect()
        };

        HealthTrends {
            expense: analyze_trend(&series(TransactionType::Expense)),
            income: analyze_trend(&series(TransactionType::Income)),
        }
    }
}

/// Overall score minus the latest snapshot before each reference date
fn compare(overall: u8, snapshots: &[HealthSnapshot], today: NaiveDate) -> Comparison {
    let Some((month_start, _)) = metrics::month_bounds(today) else {
        return Comparison::default();
    };
    let quarter_start = month_start
        .checked_sub_months(Months::new(2))
        .unwrap_or(NaiveDate::MIN);

    let delta = |before: NaiveDate| -> i16 {
        snapshots
            .iter()
            .filter(|s| s.date < before)
            .max_by_key(|s| s.date)
            .map(|s| i16::from(overall) - i16::from(s.overall))
            .unwrap_or(0)
    };

    Comparison {
        previous_month: delta(month_start),
        previous_quarter: delta(quarter_start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthWeights;
    use crate::test_utils::{budget, date, expense, goal, income};

    fn snapshot(on: NaiveDate, overall: u8) -> HealthSnapshot {
        HealthSnapshot {
            date: on,
            overall,
            savings: 0.0,
            budget: 0.0,
            debt: 0.0,
            stability: 0.0,
            grade: Grade::from_score(overall),
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert_eq!(HealthWeights::default().sum(), 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        let scorer = HealthScorer::new();
        let analysis = scorer.analyze_financial_health(&[], &[], &[], &[], date(2024, 5, 20));

        // Savings sits at the poor band (40), everything else is perfect
        assert_eq!(analysis.score.savings, 40.0);
        assert_eq!(analysis.score.budget, 100.0);
        assert_eq!(analysis.score.overall, 82);
        assert_eq!(analysis.score.grade, Grade::B);
        assert_eq!(analysis.comparison, Comparison::default());
        assert!(!analysis.recommendations.is_empty());
    }

    #[test]
    fn test_healthy_month() {
        let scorer = HealthScorer::new();
        let today = date(2024, 5, 20);
        let transactions = vec![
            income(1, 100_000.0, date(2024, 5, 1)),
            expense(2, 50_000.0, date(2024, 5, 3)),
        ];
        let budgets = vec![budget(1, None, 60_000.0, date(2024, 1, 1))];

        let analysis = scorer.analyze_financial_health(&transactions, &budgets, &[], &[], today);

        assert_eq!(analysis.score.overall, 100);
        assert_eq!(analysis.score.grade, Grade::A);
        // 50k of 60k is past the 80% alert threshold
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(
            analysis.recommendations[0].details,
            RecommendationDetails::BudgetNearLimit { near_limit: 1 }
        );

        let analysis = scorer.analyze_financial_health(&transactions, &[], &[], &[], today);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(
            analysis.recommendations[0].details,
            RecommendationDetails::General
        );
    }

    #[test]
    fn test_overspending_month() {
        let scorer = HealthScorer::new();
        let today = date(2024, 5, 20);
        let transactions = vec![
            income(1, 50_000.0, date(2024, 5, 1)),
            Transaction {
                is_credit: true,
                ..expense(2, 70_000.0, date(2024, 5, 3))
            },
        ];
        let budgets = vec![budget(1, None, 40_000.0, date(2024, 1, 1))];

        let analysis = scorer.analyze_financial_health(&transactions, &budgets, &[], &[], today);

        assert!(analysis.metrics.savings_rate < 0.0);
        assert_eq!(analysis.score.savings, 0.0);
        assert_eq!(analysis.score.budget, 0.0);
        // Credit ratio 1.0 is 0.3 past the poor band
        assert!((analysis.score.debt - 10.0).abs() < 1e-9);
        assert_eq!(analysis.score.overall, 27);
        assert_eq!(analysis.score.grade, Grade::F);

        let priorities: Vec<Priority> = analysis
            .recommendations
            .iter()
            .map(|r| r.priority)
            .collect();
        assert_eq!(priorities, vec![Priority::High, Priority::High, Priority::High]);
        assert!(matches!(
            analysis.recommendations[0].details,
            RecommendationDetails::Savings { .. }
        ));
    }

    #[test]
    fn test_recommendations_sorted_by_priority() {
        let scorer = HealthScorer::new();
        let today = date(2024, 5, 20);
        // Small positive savings rate, one overdue goal
        let transactions = vec![
            income(1, 1000.0, date(2024, 5, 1)),
            expense(2, 980.0, date(2024, 5, 2)),
        ];
        let goals = vec![goal(1, 1000.0, 100.0, Some(date(2024, 4, 1)))];

        let analysis = scorer.analyze_financial_health(&transactions, &[], &goals, &[], today);

        let priorities: Vec<Priority> = analysis
            .recommendations
            .iter()
            .map(|r| r.priority)
            .collect();
        // Savings rate 2% is below half the fair band: medium; overdue goal: medium
        assert_eq!(priorities, vec![Priority::Medium, Priority::Medium]);
        assert!(matches!(
            analysis.recommendations[1].details,
            RecommendationDetails::Goals { overdue: 1, .. }
        ));
    }

    #[test]
    fn test_rising_expenses_penalize_stability() {
        let scorer = HealthScorer::new();
        let today = date(2024, 6, 10);
        let transactions: Vec<Transaction> = (1..=6)
            .map(|m| expense(i64::from(m), 1000.0 * f64::from(m), date(2024, m, 5)))
            .collect();

        let analysis = scorer.analyze_financial_health(&transactions, &[], &[], &[], today);

        assert!(analysis.trends.expense.is_up());
        assert_eq!(analysis.score.stability, 90.0);
    }

    #[test]
    fn test_comparison_with_snapshots() {
        let scorer = HealthScorer::new();
        let today = date(2024, 5, 20);
        let snapshots = vec![
            snapshot(date(2024, 1, 31), 50),
            snapshot(date(2024, 2, 29), 60),
            snapshot(date(2024, 4, 30), 70),
            // Same month as today: ignored
            snapshot(date(2024, 5, 2), 99),
        ];

        let analysis = scorer.analyze_financial_health(&[], &[], &[], &snapshots, today);

        assert_eq!(analysis.comparison.previous_month, 82 - 70);
        assert_eq!(analysis.comparison.previous_quarter, 82 - 60);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let scorer = HealthScorer::new();
        let analysis = scorer.analyze_financial_health(&[], &[], &[], &[], date(2024, 5, 20));
        let snap = analysis.snapshot(date(2024, 5, 31));

        let json = serde_json::to_string(&snap).unwrap();
        let back: HealthSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.overall, analysis.score.overall);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let scorer = HealthScorer::new();
        let today = date(2024, 5, 20);
        let transactions = vec![
            income(1, 3000.0, date(2024, 5, 1)),
            expense(2, 1200.0, date(2024, 5, 9)),
        ];

        let first = scorer.analyze_financial_health(&transactions, &[], &[], &[], today);
        let second = scorer.analyze_financial_health(&transactions, &[], &[], &[], today);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
