//! Categorization commands

use anyhow::Result;
use serde::Serialize;
use tally_core::{Categorizer, CategoryPrediction, CategoryRule};
use tracing::info;

use super::core::{print_json, Workspace};

fn categorizer(ws: &Workspace) -> Categorizer {
    Categorizer::with_config(ws.config.categorizer.clone())
}

pub fn cmd_categorize(ws: &Workspace, description: &str) -> Result<()> {
    let history = ws.dataset.categorized();
    let prediction = categorizer(ws).predict(
        description,
        &ws.dataset.categories,
        &history,
        &ws.dataset.rules,
    );

    match &prediction {
        Some(p) => info!(
            category = %p.category_name,
            source = %p.source,
            confidence = p.confidence,
            "Predicted category"
        ),
        None => info!("No category matched"),
    }

    print_json(&prediction)
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    transaction_id: i64,
    description: Option<&'a str>,
    prediction: &'a CategoryPrediction,
}

pub fn cmd_categorize_all(ws: &Workspace) -> Result<()> {
    let uncategorized = ws.dataset.uncategorized();
    let history = ws.dataset.categorized();
    let predictions = categorizer(ws).batch_categorize(
        &uncategorized,
        &ws.dataset.categories,
        &history,
        &ws.dataset.rules,
    );

    let entries: Vec<BatchEntry> = uncategorized
        .iter()
        .filter_map(|tx| {
            predictions.get(&tx.id).map(|prediction| BatchEntry {
                transaction_id: tx.id,
                description: tx.description.as_deref(),
                prediction,
            })
        })
        .collect();

    info!(
        uncategorized = uncategorized.len(),
        predicted = entries.len(),
        "Batch categorization complete"
    );

    print_json(&entries)
}

pub fn cmd_patterns(ws: &Workspace) -> Result<()> {
    let patterns = categorizer(ws).extract_learning_patterns(&ws.dataset.transactions);
    info!(patterns = patterns.len(), "Extracted learning patterns");
    print_json(&patterns)
}

pub fn cmd_suggest_rules(ws: &Workspace) -> Result<()> {
    let uncategorized = ws.dataset.uncategorized();
    let suggestions = categorizer(ws).suggest_rules(&uncategorized, &ws.dataset.categories);
    info!(suggestions = suggestions.len(), "Rule suggestions ready");
    print_json(&suggestions)
}

/// Show the rules that would fire for a description, highest priority first
pub fn cmd_rules_test(ws: &Workspace, description: &str) -> Result<()> {
    let matches: Vec<&CategoryRule> = categorizer(ws).explain_rules(description, &ws.dataset.rules);

    if matches.is_empty() {
        info!("No rules match");
    } else {
        info!(
            matched = matches.len(),
            first = %matches[0].pattern,
            "Rules matched"
        );
    }

    print_json(&matches)
}
