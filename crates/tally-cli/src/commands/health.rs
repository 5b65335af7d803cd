//! Financial health command

use anyhow::Result;
use serde::Serialize;
use tally_core::{HealthAnalysis, HealthScorer, HealthSnapshot};
use tracing::info;

use super::core::{parse_today, print_json, Workspace};

#[derive(Serialize)]
struct HealthOutput {
    analysis: HealthAnalysis,
    /// Snapshot to persist for future comparisons
    snapshot: HealthSnapshot,
}

pub fn cmd_health(ws: &Workspace, today: Option<&str>) -> Result<()> {
    let today = parse_today(today)?;
    let scorer = HealthScorer::with_config(ws.config.health.clone());

    let analysis = scorer.analyze_financial_health(
        &ws.dataset.transactions,
        &ws.dataset.budgets,
        &ws.dataset.goals,
        &ws.dataset.snapshots,
        today,
    );

    info!(
        overall = analysis.score.overall,
        grade = %analysis.score.grade,
        recommendations = analysis.recommendations.len(),
        "{}",
        analysis.score.summary
    );

    let snapshot = analysis.snapshot(today);
    print_json(&HealthOutput { analysis, snapshot })
}
