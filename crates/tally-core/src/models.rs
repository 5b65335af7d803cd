//! Domain models supplied by the persistence layer
//!
//! These are read-only to the engine. Engine outputs live next to the
//! component that produces them (`categorize`, `anomaly`, `health`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of money flow for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    /// Movement between own accounts; ignored by every metric
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive; the direction comes from `kind`
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
    /// Paid with borrowed money (credit card, loan)
    #[serde(default)]
    pub is_credit: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_currency() -> String {
    "RUB".to_string()
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

/// Whether a category collects income or expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category type: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending or income category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Lowercase hint strings matched against descriptions
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// A user-authored categorization override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    pub category_id: i64,
    /// Wildcard pattern (`*` matches any run); other regex syntax passes through
    pub pattern: String,
    /// Higher priority rules are checked first
    #[serde(default)]
    pub priority: i32,
    /// How often the rule has fired (maintained by the host)
    #[serde(default)]
    pub match_count: i64,
}

/// Length of the period a budget limit covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Factor converting a limit for this period into a monthly limit
    pub fn monthly_factor(&self) -> f64 {
        match self {
            Self::Weekly => 52.0 / 12.0,
            Self::Monthly => 1.0,
            Self::Quarterly => 1.0 / 3.0,
            Self::Yearly => 1.0 / 12.0,
        }
    }
}

impl std::str::FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            "yearly" | "year" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown budget period: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending limit, optionally scoped to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    /// None applies the budget to all expense categories
    #[serde(default)]
    pub category_id: Option<i64>,
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    /// Percentage of the limit (1-100) at which the host warns
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u8,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_alert_threshold() -> u8 {
    80
}

impl Budget {
    /// Whether the budget covers any day in `[from, to]`
    pub fn is_active_between(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_date <= to && self.end_date.is_none_or(|end| end >= from)
    }

    /// Limit expressed per calendar month
    pub fn monthly_limit(&self) -> f64 {
        self.amount * self.period.monthly_factor()
    }
}

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl Goal {
    pub fn is_complete(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Progress in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 1.0;
        }
        (self.current_amount / self.target_amount).clamp(0.0, 1.0)
    }
}
