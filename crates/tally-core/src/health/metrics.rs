//! Monthly metrics feeding the health score

use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::forecast::{coefficient_of_variation, first_of_month};
use crate::models::{Budget, Goal, Transaction};

/// Raw figures for the month being scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HealthMetrics {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_income: f64,
    pub total_expense: f64,
    pub net_savings: f64,
    /// Net savings over income; 0 without income
    pub savings_rate: f64,
    /// Share of active budgets not exceeded; 1.0 without budgets
    pub budget_adherence_rate: f64,
    pub budgets_on_track: usize,
    pub budgets_exceeded: usize,
    /// On track but past the budget's alert threshold
    pub budgets_near_limit: usize,
    /// Total amount spent beyond exceeded limits
    pub budget_overspend: f64,
    /// Credit-paid share of expenses
    pub credit_ratio: f64,
    /// Coefficient of variation of daily expense totals
    pub expense_volatility: f64,
    /// Mean progress of incomplete goals; 1.0 when none
    pub goals_progress: f64,
    pub active_goals: usize,
    pub overdue_goals: usize,
}

/// First and last day of the month containing `date`
pub(crate) fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = first_of_month(date)?;
    let end = start
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))?;
    Some((start, end))
}

/// Compute the metrics for the calendar month containing `today`
pub fn compute_metrics(
    transactions: &[Transaction],
    budgets: &[Budget],
    goals: &[Goal],
    today: NaiveDate,
) -> HealthMetrics {
    let Some((start, end)) = month_bounds(today) else {
        return HealthMetrics {
            budget_adherence_rate: 1.0,
            goals_progress: 1.0,
            ..HealthMetrics::default()
        };
    };

    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
        .collect();

    let total_income: f64 = in_month.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
    let expenses: Vec<&Transaction> = in_month.iter().copied().filter(|t| t.is_expense()).collect();
    let total_expense: f64 = expenses.iter().map(|t| t.amount).sum();
    let net_savings = total_income - total_expense;

    let savings_rate = if total_income > 0.0 {
        net_savings / total_income
    } else {
        0.0
    };

    let credit_expense: f64 = expenses.iter().filter(|t| t.is_credit).map(|t| t.amount).sum();
    let credit_ratio = if total_expense > 0.0 {
        credit_expense / total_expense
    } else {
        0.0
    };

    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in &expenses {
        *daily.entry(tx.date).or_insert(0.0) += tx.amount;
    }
    let daily_totals: Vec<f64> = daily.into_values().collect();
    let expense_volatility = coefficient_of_variation(&daily_totals);

    let budget_stats = budget_usage(budgets, &expenses, start, end);
    let tracked = budget_stats.on_track + budget_stats.exceeded;
    let budget_adherence_rate = if tracked == 0 {
        1.0
    } else {
        budget_stats.on_track as f64 / tracked as f64
    };

    let incomplete: Vec<&Goal> = goals.iter().filter(|g| !g.is_complete()).collect();
    let goals_progress = if incomplete.is_empty() {
        1.0
    } else {
        incomplete.iter().map(|g| g.progress()).sum::<f64>() / incomplete.len() as f64
    };
    let overdue_goals = incomplete
        .iter()
        .filter(|g| g.deadline.is_some_and(|deadline| deadline < today))
        .count();

    HealthMetrics {
        period_start: Some(start),
        period_end: Some(end),
        total_income,
        total_expense,
        net_savings,
        savings_rate,
        budget_adherence_rate,
        budgets_on_track: budget_stats.on_track,
        budgets_exceeded: budget_stats.exceeded,
        budgets_near_limit: budget_stats.near_limit,
        budget_overspend: budget_stats.overspend,
        credit_ratio,
        expense_volatility,
        goals_progress,
        active_goals: incomplete.len(),
        overdue_goals,
    }
}

#[derive(Debug, Default)]
struct BudgetUsage {
    on_track: usize,
    exceeded: usize,
    near_limit: usize,
    overspend: f64,
}

fn budget_usage(
    budgets: &[Budget],
    expenses: &[&Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> BudgetUsage {
    let mut usage = BudgetUsage::default();

    for budget in budgets.iter().filter(|b| b.is_active_between(start, end)) {
        let limit = budget.monthly_limit();
        let spent: f64 = expenses
            .iter()
            .filter(|t| budget.category_id.is_none() || t.category_id == budget.category_id)
            .map(|t| t.amount)
            .sum();

        if spent > limit {
            usage.exceeded += 1;
            usage.overspend += spent - limit;
        } else {
            usage.on_track += 1;
            if spent >= limit * f64::from(budget.alert_threshold) / 100.0 && spent > 0.0 {
                usage.near_limit += 1;
            }
        }
    }

    usage
}
