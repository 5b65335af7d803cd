//! Anomaly detection commands

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::{AnomalyDetector, AnomalyRecord, SpendingPatternReport};
use tracing::{info, warn};

use super::core::{parse_today, print_json, Workspace};

#[derive(Serialize)]
struct AnomalyScan {
    patterns: SpendingPatternReport,
    transactions: Vec<AnomalyRecord>,
}

/// Check one transaction, or every expense plus overall spending patterns
pub fn cmd_anomalies(ws: &Workspace, transaction: Option<i64>, today: Option<&str>) -> Result<()> {
    let today = parse_today(today)?;
    let detector = AnomalyDetector::with_config(ws.config.anomaly.clone());
    let transactions = &ws.dataset.transactions;
    let categories = &ws.dataset.categories;

    if let Some(id) = transaction {
        let tx = transactions
            .iter()
            .find(|t| t.id == id)
            .with_context(|| format!("Transaction {} not found", id))?;

        let records: Vec<AnomalyRecord> = detector
            .detect_transaction_anomalies(tx, transactions, categories)
            .into_iter()
            .map(|a| a.into_record(Some(tx.id), today))
            .collect();

        info!(transaction = id, anomalies = records.len(), "Transaction checked");
        return print_json(&records);
    }

    let records: Vec<AnomalyRecord> = transactions
        .iter()
        .filter(|t| t.is_expense())
        .flat_map(|tx| {
            detector
                .detect_transaction_anomalies(tx, transactions, categories)
                .into_iter()
                .map(move |a| a.into_record(Some(tx.id), today))
        })
        .collect();

    let patterns = detector.analyze_spending_patterns(transactions, categories);

    if records.is_empty() && patterns.anomalies.is_empty() {
        info!(assessment = %patterns.assessment, "No anomalies found");
    } else {
        warn!(
            flagged = records.len(),
            pattern_anomalies = patterns.anomalies.len(),
            assessment = %patterns.assessment,
            "Anomalies found"
        );
    }

    print_json(&AnomalyScan {
        patterns,
        transactions: records,
    })
}
