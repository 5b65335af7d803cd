//! Test utilities for tally-core
//!
//! Small fixture builders shared by unit tests, integration tests and the
//! CLI tests. Enable the `test-utils` feature to use them outside this crate.

use chrono::NaiveDate;

use crate::models::{
    Budget, BudgetPeriod, Category, CategoryKind, CategoryRule, Goal, Transaction, TransactionType,
};

/// Date shorthand; panics on an invalid date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {}-{}-{}", year, month, day))
}

fn transaction(id: i64, kind: TransactionType, amount: f64, date: NaiveDate) -> Transaction {
    Transaction {
        id,
        kind,
        amount,
        currency: "RUB".to_string(),
        date,
        category_id: None,
        description: None,
        is_shared: false,
        is_credit: false,
        tags: vec![],
    }
}

/// Uncategorized expense without a description
pub fn expense(id: i64, amount: f64, date: NaiveDate) -> Transaction {
    transaction(id, TransactionType::Expense, amount, date)
}

/// Uncategorized income without a description
pub fn income(id: i64, amount: f64, date: NaiveDate) -> Transaction {
    transaction(id, TransactionType::Income, amount, date)
}

/// Uncategorized expense with a description
pub fn described_expense(id: i64, amount: f64, date: NaiveDate, description: &str) -> Transaction {
    Transaction {
        description: Some(description.to_string()),
        ..expense(id, amount, date)
    }
}

/// Expense with a category and description
pub fn categorized_expense(
    id: i64,
    amount: f64,
    date: NaiveDate,
    category_id: i64,
    description: &str,
) -> Transaction {
    Transaction {
        category_id: Some(category_id),
        ..described_expense(id, amount, date, description)
    }
}

pub fn category(id: i64, name: &str, kind: CategoryKind, keywords: &[&str]) -> Category {
    Category {
        id,
        name: name.to_string(),
        kind,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        parent_id: None,
    }
}

pub fn rule(id: i64, category_id: i64, pattern: &str, priority: i32) -> CategoryRule {
    CategoryRule {
        id,
        category_id,
        pattern: pattern.to_string(),
        priority,
        match_count: 0,
    }
}

/// Open-ended monthly budget with an 80% alert threshold
pub fn budget(id: i64, category_id: Option<i64>, amount: f64, start_date: NaiveDate) -> Budget {
    Budget {
        id,
        category_id,
        amount,
        period: BudgetPeriod::Monthly,
        alert_threshold: 80,
        start_date,
        end_date: None,
    }
}

pub fn goal(id: i64, target: f64, current: f64, deadline: Option<NaiveDate>) -> Goal {
    Goal {
        id,
        name: format!("Goal {}", id),
        target_amount: target,
        current_amount: current,
        deadline,
    }
}
