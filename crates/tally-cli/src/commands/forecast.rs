//! Forecast and trend commands

use anyhow::{bail, Result};
use serde::Serialize;
use tally_core::forecast::{
    analyze_trend, exponential_moving_average, forecast_expenses, monthly_totals, moving_average,
};
use tally_core::{Forecast, SeriesPoint, Trend, TransactionType};
use tracing::info;

use super::core::{print_json, Workspace};

#[derive(Serialize)]
struct ForecastOutput {
    history: Vec<SeriesPoint>,
    forecast: Vec<Forecast>,
}

pub fn cmd_forecast(ws: &Workspace, periods: usize) -> Result<()> {
    let history = monthly_totals(&ws.dataset.transactions, TransactionType::Expense);
    let forecast = forecast_expenses(&history, periods);

    if forecast.is_empty() {
        info!(
            months = history.len(),
            "Not enough monthly history to forecast (need 3 months)"
        );
    } else {
        info!(
            months = history.len(),
            periods = forecast.len(),
            "Forecast ready"
        );
    }

    print_json(&ForecastOutput { history, forecast })
}

#[derive(Serialize)]
struct SeriesTrend {
    months: Vec<SeriesPoint>,
    trend: Trend,
    moving_average: Vec<f64>,
    exponential_moving_average: Vec<f64>,
}

#[derive(Serialize)]
struct TrendOutput {
    expense: SeriesTrend,
    income: SeriesTrend,
}

fn series_trend(ws: &Workspace, kind: TransactionType, window: usize, alpha: f64) -> SeriesTrend {
    let months = monthly_totals(&ws.dataset.transactions, kind);
    let values: Vec<f64> = months.iter().map(|p| p.amount).collect();

    SeriesTrend {
        trend: analyze_trend(&values),
        moving_average: moving_average(&values, window),
        exponential_moving_average: exponential_moving_average(&values, alpha),
        months,
    }
}

pub fn cmd_trend(ws: &Workspace, window: usize, alpha: f64) -> Result<()> {
    if window == 0 {
        bail!("--window must be at least 1");
    }
    if !(0.0..=1.0).contains(&alpha) {
        bail!("--alpha must be between 0 and 1");
    }

    let output = TrendOutput {
        expense: series_trend(ws, TransactionType::Expense, window, alpha),
        income: series_trend(ws, TransactionType::Income, window, alpha),
    };

    info!(
        expense = %output.expense.trend.direction,
        income = %output.income.trend.direction,
        "Trends classified"
    );

    print_json(&output)
}
