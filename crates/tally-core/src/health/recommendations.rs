//! Rule cascade turning weak sub-scores into recommendations

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::metrics::HealthMetrics;
use super::{HealthScore, HealthTrends};
use crate::config::HealthConfig;

/// How urgently a recommendation should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Numeric rank for sorting (higher = more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Area a recommendation addresses, with the figures behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationDetails {
    Savings {
        savings_rate: f64,
        target_rate: f64,
    },
    Budget {
        adherence_rate: f64,
        exceeded: usize,
        overspend: f64,
    },
    BudgetNearLimit {
        near_limit: usize,
    },
    Debt {
        credit_ratio: f64,
        target_ratio: f64,
    },
    Stability {
        volatility: f64,
        expense_trend_rising: bool,
        income_trend_falling: bool,
    },
    Goals {
        overdue: usize,
        progress: f64,
    },
    General,
}

/// A suggested action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub details: RecommendationDetails,
}

impl Recommendation {
    fn new(
        priority: Priority,
        title: impl Into<String>,
        description: impl Into<String>,
        details: RecommendationDetails,
    ) -> Self {
        Self {
            priority,
            title: title.into(),
            description: description.into(),
            details,
        }
    }
}

/// Build recommendations, most urgent first
pub(crate) fn recommend(
    config: &HealthConfig,
    score: &HealthScore,
    metrics: &HealthMetrics,
    trends: &HealthTrends,
) -> Vec<Recommendation> {
    let threshold = config.recommendation_threshold;
    let mut out = Vec::new();

    if score.savings < threshold {
        let rate = metrics.savings_rate;
        let priority = if rate < 0.0 {
            Priority::High
        } else if rate < config.savings.fair / 2.0 {
            Priority::Medium
        } else {
            Priority::Low
        };
        let description = if rate < 0.0 {
            format!(
                "You spent {:.0} more than you earned this month. Cut discretionary spending first.",
                -metrics.net_savings
            )
        } else {
            format!(
                "You are saving {:.0}% of income. Aim for at least {:.0}%.",
                rate * 100.0,
                config.savings.good * 100.0
            )
        };
        out.push(Recommendation::new(
            priority,
            "Increase your savings rate",
            description,
            RecommendationDetails::Savings {
                savings_rate: rate,
                target_rate: config.savings.good,
            },
        ));
    }

    if score.budget < threshold {
        let priority = if metrics.budget_adherence_rate < config.budget.poor {
            Priority::High
        } else {
            Priority::Medium
        };
        out.push(Recommendation::new(
            priority,
            "Get back within your budgets",
            format!(
                "{} budget(s) exceeded by {:.0} in total. Review those categories.",
                metrics.budgets_exceeded, metrics.budget_overspend
            ),
            RecommendationDetails::Budget {
                adherence_rate: metrics.budget_adherence_rate,
                exceeded: metrics.budgets_exceeded,
                overspend: metrics.budget_overspend,
            },
        ));
    }

    if score.debt < threshold {
        let priority = if metrics.credit_ratio > config.debt.poor {
            Priority::High
        } else {
            Priority::Medium
        };
        out.push(Recommendation::new(
            priority,
            "Reduce spending on credit",
            format!(
                "{:.0}% of this month's expenses were paid with credit. Keep it under {:.0}%.",
                metrics.credit_ratio * 100.0,
                config.debt.good * 100.0
            ),
            RecommendationDetails::Debt {
                credit_ratio: metrics.credit_ratio,
                target_ratio: config.debt.good,
            },
        ));
    }

    if score.stability < threshold {
        let priority = if metrics.expense_volatility > config.stability.poor {
            Priority::Medium
        } else {
            Priority::Low
        };
        out.push(Recommendation::new(
            priority,
            "Smooth out your spending",
            "Daily spending varies a lot. Plan large purchases and spread recurring costs.",
            RecommendationDetails::Stability {
                volatility: metrics.expense_volatility,
                expense_trend_rising: trends.expense.is_up(),
                income_trend_falling: trends.income.is_down(),
            },
        ));
    }

    if metrics.budgets_near_limit > 0 {
        out.push(Recommendation::new(
            Priority::Low,
            "Budgets close to their limit",
            format!(
                "{} budget(s) passed their alert threshold. Slow down in those categories.",
                metrics.budgets_near_limit
            ),
            RecommendationDetails::BudgetNearLimit {
                near_limit: metrics.budgets_near_limit,
            },
        ));
    }

    if metrics.overdue_goals > 0 {
        out.push(Recommendation::new(
            Priority::Medium,
            "Revisit overdue goals",
            format!(
                "{} goal(s) are past their deadline. Adjust the target date or contributions.",
                metrics.overdue_goals
            ),
            RecommendationDetails::Goals {
                overdue: metrics.overdue_goals,
                progress: metrics.goals_progress,
            },
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            Priority::Low,
            "Keep it up",
            "Your finances look healthy. Consider putting surplus savings toward a goal.",
            RecommendationDetails::General,
        ));
    }

    out.sort_by_key(|r| Reverse(r.priority.rank()));
    out
}
