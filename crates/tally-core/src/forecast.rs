//! Trend and forecast engine
//!
//! Generic numeric-series utilities shared by the anomaly detector and the
//! health scorer:
//! - Ordinary least-squares regression
//! - Monthly expense forecasts with widening confidence bands
//! - Trend classification (up / down / stable)
//! - Simple and exponential moving averages
//!
//! Only [`linear_regression`] can fail, and only on caller bugs (mismatched
//! or too-short series). Everything else degrades to empty or stable results
//! on sparse data.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionType};

/// Relative slope below which a series counts as flat
const FLAT_SLOPE_RATIO: f64 = 0.02;
/// Fit quality below which a slope is not trusted
const MIN_TREND_R_SQUARED: f64 = 0.3;
/// Band growth per forecast step
const MARGIN_GROWTH_PER_PERIOD: f64 = 0.1;
/// Minimum points needed before forecasting
const MIN_FORECAST_POINTS: usize = 3;
/// Longest horizon a forecast will produce (100 years of months)
pub const MAX_FORECAST_PERIODS: usize = 1200;

/// Result of an ordinary least-squares fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Fitted value one step past the series (`x = n`), floored at 0
    pub prediction: f64,
    pub confidence: f64,
}

impl Regression {
    /// Fitted value at `x`, never negative
    pub fn predict(&self, x: f64) -> f64 {
        (self.slope * x + self.intercept).max(0.0)
    }
}

/// Fit `y = slope * x + intercept`
///
/// Fails when the series have different lengths or fewer than two points.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<Regression> {
    if x.len() != y.len() {
        return Err(Error::InvalidInput(format!(
            "regression series length mismatch: {} x values, {} y values",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "regression needs at least 2 points, got {}",
            x.len()
        )));
    }

    let n = x.len() as f64;
    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        ss_xy += (xi - mean_x) * (yi - mean_y);
        ss_xx += (xi - mean_x).powi(2);
    }

    let slope = if ss_xx == 0.0 { 0.0 } else { ss_xy / ss_xx };
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let fitted = slope * xi + intercept;
        ss_res += (yi - fitted).powi(2);
        ss_tot += (yi - mean_y).powi(2);
    }

    // A constant series is fitted perfectly by a flat line
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    let prediction = (slope * n + intercept).max(0.0);
    let confidence = (r_squared * (1.0 - 1.0 / n)).clamp(0.1, 0.95);

    Ok(Regression {
        slope,
        intercept,
        r_squared,
        prediction,
        confidence,
    })
}

/// One observation in a dated series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// A forecasted period with its confidence band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

/// Forecast the next `periods_ahead` monthly amounts
///
/// Needs at least three points; fewer yields an empty forecast. Points are
/// ordered by date before fitting. The horizon is capped at
/// [`MAX_FORECAST_PERIODS`] and stops early if a date would overflow.
pub fn forecast_expenses(series: &[SeriesPoint], periods_ahead: usize) -> Vec<Forecast> {
    if series.len() < MIN_FORECAST_POINTS || periods_ahead == 0 {
        return vec![];
    }

    let mut sorted = series.to_vec();
    sorted.sort_by_key(|p| p.date);

    let xs: Vec<f64> = (0..sorted.len()).map(|i| i as f64).collect();
    let ys: Vec<f64> = sorted.iter().map(|p| p.amount).collect();

    let Ok(regression) = linear_regression(&xs, &ys) else {
        return vec![];
    };

    let spread = std_dev(&ys);
    let n = sorted.len() as f64;
    let last_date = sorted[sorted.len() - 1].date;

    (1..=periods_ahead.min(MAX_FORECAST_PERIODS))
        .map_while(|i| {
            let step = i as f64;
            let predicted = regression.predict(n - 1.0 + step);
            let margin = spread * (1.0 + step * MARGIN_GROWTH_PER_PERIOD);
            let date = last_date.checked_add_months(Months::new(u32::try_from(i).ok()?))?;

            Some(Forecast {
                date,
                predicted,
                lower: (predicted - margin).max(0.0),
                upper: predicted + margin,
                confidence: regression.confidence,
            })
        })
        .collect()
}

/// Direction of a classified trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

impl std::str::FromStr for TrendDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "stable" => Ok(Self::Stable),
            _ => Err(format!("Unknown trend direction: {}", s)),
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified trend of a numeric series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Trend {
    pub direction: TrendDirection,
    pub slope: f64,
    pub r_squared: f64,
    /// Percent change of the second-half mean over the first-half mean
    pub change_percent: f64,
    /// Coefficient of variation (population std dev / mean)
    pub volatility: f64,
    pub mean: f64,
}

impl Trend {
    pub fn is_up(&self) -> bool {
        self.direction == TrendDirection::Up
    }

    pub fn is_down(&self) -> bool {
        self.direction == TrendDirection::Down
    }
}

/// Classify the trend of a series
pub fn analyze_trend(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend {
            mean: values.first().copied().unwrap_or(0.0),
            ..Trend::default()
        };
    }

    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let Ok(regression) = linear_regression(&xs, values) else {
        return Trend::default();
    };

    let avg = mean(values);
    let direction = if avg == 0.0
        || (regression.slope / avg).abs() < FLAT_SLOPE_RATIO
        || regression.r_squared < MIN_TREND_R_SQUARED
    {
        TrendDirection::Stable
    } else if regression.slope > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let (first_half, second_half) = values.split_at(values.len() / 2);
    let first_mean = mean(first_half);
    let change_percent = if first_mean == 0.0 {
        0.0
    } else {
        (mean(second_half) - first_mean) / first_mean * 100.0
    };

    Trend {
        direction,
        slope: regression.slope,
        r_squared: regression.r_squared,
        change_percent,
        volatility: coefficient_of_variation(values),
        mean: avg,
    }
}

/// Simple moving average; the first `window - 1` points use an expanding window
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Exponential moving average seeded with the first raw value
pub fn exponential_moving_average(values: &[f64], alpha: f64) -> Vec<f64> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;

    for &value in values {
        let next = match previous {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        out.push(next);
        previous = Some(next);
    }

    out
}

/// Sum transaction amounts of one type per calendar month
///
/// Each point is dated on the first day of its month; months without
/// transactions are omitted.
pub fn monthly_totals(transactions: &[Transaction], kind: TransactionType) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for tx in transactions.iter().filter(|t| t.kind == kind) {
        if let Some(month_start) = first_of_month(tx.date) {
            *buckets.entry(month_start).or_insert(0.0) += tx.amount;
        }
    }

    buckets
        .into_iter()
        .map(|(date, amount)| SeriesPoint::new(date, amount))
        .collect()
}

pub(crate) fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

// ========== Basic statistics ==========

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (0 for an empty slice)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation over mean; 0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let avg = mean(values);
    if avg == 0.0 {
        return 0.0;
    }
    std_dev(values) / avg
}

/// Linear-interpolated percentile, `p` in [0, 1]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_regression_on_linear_data() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 2.0).collect();

        let fit = linear_regression(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-5);
        assert!((fit.intercept - 2.0).abs() < 1e-5);
        assert!((fit.r_squared - 1.0).abs() < 1e-5);
        // Value at x = n = 5
        assert!((fit.prediction - 12.0).abs() < 1e-9);
        // r² * (1 - 1/5) = 0.8
        assert!((fit.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_regression_rejects_bad_input() {
        assert!(matches!(
            linear_regression(&[1.0, 2.0], &[1.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            linear_regression(&[1.0], &[1.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_regression_predict_never_negative() {
        let fit = linear_regression(&[0.0, 1.0, 2.0], &[10.0, 5.0, 0.0]).unwrap();
        assert!((fit.slope + 5.0).abs() < 1e-9);
        assert_eq!(fit.predict(10.0), 0.0);
        assert_eq!(fit.prediction, 0.0);
        assert!((fit.predict(1.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_constant_series() {
        let fit = linear_regression(&[0.0, 1.0, 2.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 1.0);
        assert!(fit.confidence <= 0.95);
    }

    #[test]
    fn test_regression_zero_x_variance() {
        let fit = linear_regression(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 2.0).abs() < 1e-9);
        assert_eq!(fit.r_squared, 0.0);
        assert_eq!(fit.confidence, 0.1);
    }

    #[test]
    fn test_forecast_needs_three_points() {
        let series = [
            SeriesPoint::new(date(2024, 1, 1), 100.0),
            SeriesPoint::new(date(2024, 2, 1), 110.0),
        ];
        assert!(forecast_expenses(&series, 3).is_empty());
    }

    #[test]
    fn test_forecast_steps_months_and_widens() {
        // Deliberately unsorted input
        let series = [
            SeriesPoint::new(date(2024, 3, 31), 300.0),
            SeriesPoint::new(date(2024, 1, 31), 100.0),
            SeriesPoint::new(date(2024, 2, 29), 200.0),
        ];

        let forecasts = forecast_expenses(&series, 2);
        assert_eq!(forecasts.len(), 2);

        assert_eq!(forecasts[0].date, date(2024, 4, 30));
        assert_eq!(forecasts[1].date, date(2024, 5, 31));
        assert!((forecasts[0].predicted - 400.0).abs() < 1e-6);
        assert!((forecasts[1].predicted - 500.0).abs() < 1e-6);

        let width_1 = forecasts[0].upper - forecasts[0].lower;
        let width_2 = forecasts[1].upper - forecasts[1].lower;
        assert!(width_2 > width_1);
        assert!(forecasts.iter().all(|f| f.lower >= 0.0));
    }

    #[test]
    fn test_forecast_lower_band_clipped() {
        let series = [
            SeriesPoint::new(date(2024, 1, 1), 500.0),
            SeriesPoint::new(date(2024, 2, 1), 10.0),
            SeriesPoint::new(date(2024, 3, 1), 400.0),
            SeriesPoint::new(date(2024, 4, 1), 5.0),
        ];
        let forecasts = forecast_expenses(&series, 3);
        assert_eq!(forecasts.len(), 3);
        assert!(forecasts.iter().all(|f| f.lower >= 0.0 && f.predicted >= 0.0));
    }

    #[test]
    fn test_forecast_horizon_is_bounded() {
        let series = [
            SeriesPoint::new(date(2024, 1, 1), 100.0),
            SeriesPoint::new(date(2024, 2, 1), 120.0),
            SeriesPoint::new(date(2024, 3, 1), 140.0),
        ];

        let forecasts = forecast_expenses(&series, usize::MAX);
        assert_eq!(forecasts.len(), MAX_FORECAST_PERIODS);
        assert_eq!(forecasts[0].date, date(2024, 4, 1));
        assert_eq!(forecasts[MAX_FORECAST_PERIODS - 1].date, date(2124, 3, 1));
    }

    #[test]
    fn test_forecast_stops_at_date_overflow() {
        let last = NaiveDate::MAX.with_day(1).unwrap();
        let series = [
            SeriesPoint::new(last - Months::new(2), 100.0),
            SeriesPoint::new(last - Months::new(1), 120.0),
            SeriesPoint::new(last, 140.0),
        ];

        // No month after the last representable one
        assert!(forecast_expenses(&series, 5).is_empty());
    }

    #[test]
    fn test_trend_degenerate_inputs() {
        assert_eq!(analyze_trend(&[]).direction, TrendDirection::Stable);
        let single = analyze_trend(&[42.0]);
        assert_eq!(single.direction, TrendDirection::Stable);
        assert_eq!(single.change_percent, 0.0);

        let zeros = analyze_trend(&[0.0, 0.0, 0.0]);
        assert_eq!(zeros.direction, TrendDirection::Stable);
        assert_eq!(zeros.volatility, 0.0);
    }

    #[test]
    fn test_trend_up_and_change_percent() {
        let trend = analyze_trend(&[100.0, 120.0, 140.0, 160.0]);
        assert_eq!(trend.direction, TrendDirection::Up);
        // First half mean 110, second half mean 150
        assert!((trend.change_percent - 36.363636).abs() < 1e-4);
        assert!(trend.volatility > 0.0);
    }

    #[test]
    fn test_trend_down() {
        let trend = analyze_trend(&[200.0, 150.0, 100.0, 50.0]);
        assert_eq!(trend.direction, TrendDirection::Down);
        assert!(trend.change_percent < 0.0);
    }

    #[test]
    fn test_trend_noisy_series_is_stable() {
        let trend = analyze_trend(&[100.0, 300.0, 90.0, 310.0, 95.0, 305.0, 100.0]);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_trend_flat_slope_is_stable() {
        // Perfect fit but tiny relative slope
        let trend = analyze_trend(&[1000.0, 1001.0, 1002.0, 1003.0]);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_moving_average_expanding_window() {
        let ma = moving_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(ma, vec![10.0, 15.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_moving_average_zero_window() {
        assert_eq!(moving_average(&[1.0, 2.0], 0), vec![1.0, 2.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn test_exponential_moving_average() {
        let ema = exponential_moving_average(&[10.0, 20.0, 30.0], 0.5);
        assert_eq!(ema, vec![10.0, 15.0, 22.5]);
        assert!(exponential_moving_average(&[], 0.3).is_empty());
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 10.0, 11.0, 14.0];
        assert!((percentile(&values, 0.25) - 10.75).abs() < 1e-9);
        assert!((percentile(&values, 0.75) - 12.25).abs() < 1e-9);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
    }

    #[test]
    fn test_std_dev_and_cv() {
        assert_eq!(std_dev(&[]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_monthly_totals_buckets_by_month() {
        use crate::test_utils::{expense, income};

        let txs = vec![
            expense(1, 100.0, date(2024, 1, 5)),
            expense(2, 50.0, date(2024, 1, 20)),
            income(3, 1000.0, date(2024, 1, 25)),
            expense(4, 70.0, date(2024, 3, 2)),
        ];

        let totals = monthly_totals(&txs, TransactionType::Expense);
        assert_eq!(
            totals,
            vec![
                SeriesPoint::new(date(2024, 1, 1), 150.0),
                SeriesPoint::new(date(2024, 3, 1), 70.0),
            ]
        );
    }
}
