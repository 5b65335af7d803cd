//! Loading engine inputs from files
//!
//! The engine itself never does I/O; these helpers are for hosts (and the
//! CLI) that keep their data in a JSON dataset or a transaction CSV export.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::health::HealthSnapshot;
use crate::models::{Budget, Category, CategoryRule, Goal, Transaction, TransactionType};

/// Everything the engine can analyze, as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub rules: Vec<CategoryRule>,
    pub snapshots: Vec<HealthSnapshot>,
}

impl Dataset {
    /// Transactions without a category
    pub fn uncategorized(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.category_id.is_none())
            .cloned()
            .collect()
    }

    /// Transactions with a category
    pub fn categorized(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.category_id.is_some())
            .cloned()
            .collect()
    }
}

/// Read a JSON dataset
pub fn load_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let dataset: Dataset = serde_json::from_reader(reader)?;
    debug!(
        transactions = dataset.transactions.len(),
        categories = dataset.categories.len(),
        budgets = dataset.budgets.len(),
        goals = dataset.goals.len(),
        rules = dataset.rules.len(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Column positions resolved from the header row
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { index }
    }

    fn require(&self, name: &str) -> Result<()> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(Error::Import(format!("Missing required column: {}", name)))
        }
    }

    /// Trimmed cell value; None when the column is absent or the cell blank
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let i = *self.index.get(name)?;
        record.get(i).map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Parse transactions from a CSV export
///
/// Columns (by header name, any order): `id`, `date`, `type`, `amount` are
/// required; `currency`, `category_id`, `description`, `is_credit`,
/// `is_shared` and `tags` (`;`-separated) are optional and may be blank.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    for required in ["id", "date", "type", "amount"] {
        columns.require(required)?;
    }

    let mut transactions = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;
        let field = |name: &str| {
            columns
                .get(&record, name)
                .ok_or_else(|| Error::Import(format!("Line {}: missing {}", line, name)))
        };

        let id = field("id")?
            .parse::<i64>()
            .map_err(|_| Error::Import(format!("Line {}: invalid id", line)))?;
        let date = parse_date(field("date")?)?;
        let kind: TransactionType = field("type")?
            .parse()
            .map_err(|e: String| Error::Import(format!("Line {}: {}", line, e)))?;
        let amount = parse_amount(field("amount")?)?;

        let category_id = columns
            .get(&record, "category_id")
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| Error::Import(format!("Line {}: invalid category_id", line)))
            })
            .transpose()?;

        let tags = columns
            .get(&record, "tags")
            .map(|s| {
                s.split(';')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        transactions.push(Transaction {
            id,
            kind,
            amount,
            currency: columns
                .get(&record, "currency")
                .unwrap_or("RUB")
                .to_uppercase(),
            date,
            category_id,
            description: columns.get(&record, "description").map(String::from),
            is_shared: parse_bool(columns.get(&record, "is_shared")),
            is_credit: parse_bool(columns.get(&record, "is_credit")),
            tags,
        });
    }

    debug!("Parsed {} transactions from CSV", transactions.len());
    Ok(transactions)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%d.%m.%Y", // 15.01.2024
        "%d.%m.%y", // 15.01.24
        "%m/%d/%Y", // 01/15/2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount, dropping currency symbols and thousands separators
///
/// A lone comma is a decimal separator (`1 234,50`). The sign is dropped
/// since direction comes from the `type` column.
fn parse_amount(s: &str) -> Result<f64> {
    let mut cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '₽' | '€'))
        .collect();

    if cleaned.contains(',') {
        cleaned = if cleaned.contains('.') {
            cleaned.replace(',', "")
        } else {
            cleaned.replace(',', ".")
        };
    }

    cleaned
        .parse::<f64>()
        .map(f64::abs)
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.to_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "y")
    )
}
