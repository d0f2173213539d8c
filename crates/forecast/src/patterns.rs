//! Pattern detection over a raw consumption series.
//!
//! Runs independently of forecasting: every detector reads the series
//! directly and none of them depends on a model's output.

use serde::{Deserialize, Serialize};

use crate::models::SEASON_LENGTH;
use crate::stats::{linear_fit, mean, quantile_sorted};

/// Shortest series the detectors run on.
pub const MIN_PATTERN_POINTS: usize = 4;

const SEASONALITY_MIN_LAG: usize = 2;
const SEASONALITY_THRESHOLD: f64 = 0.5;
const TREND_DEADBAND: f64 = 0.1;
const IQR_FACTOR: f64 = 1.5;
const CYCLE_MIN_PERIOD: usize = 3;
const CYCLE_MAX_PERIOD: usize = 24;
const CYCLE_MIN_AMPLITUDE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Seasonality {
    pub detected: bool,
    /// Lag with the strongest autocorrelation; 0 when none was evaluated.
    pub period: usize,
    pub strength: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute OLS slope per period.
    pub magnitude: f64,
    /// R² of the linear fit.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Anomalies {
    pub indices: Vec<usize>,
    /// Distance from the median, parallel to `indices`.
    pub scores: Vec<f64>,
    /// 1.5 × IQR.
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclicPattern {
    pub period: usize,
    pub amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternDetectionResult {
    pub seasonality: Seasonality,
    pub trend: Trend,
    pub anomalies: Anomalies,
    /// Strongest first.
    pub cyclic_patterns: Vec<CyclicPattern>,
}

/// Run all detectors over `series`.
///
/// Series shorter than [`MIN_PATTERN_POINTS`] yield the neutral result.
pub fn detect(series: &[f64]) -> PatternDetectionResult {
    if series.len() < MIN_PATTERN_POINTS {
        return PatternDetectionResult::default();
    }

    PatternDetectionResult {
        seasonality: detect_seasonality(series),
        trend: detect_trend(series),
        anomalies: detect_anomalies(series),
        cyclic_patterns: detect_cycles(series),
    }
}

/// Lag-`lag` autocorrelation, normalised by the full-series variance.
fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    let m = mean(series);
    let denominator: f64 = series.iter().map(|x| (x - m).powi(2)).sum();
    if denominator <= f64::EPSILON {
        return 0.0;
    }
    let numerator: f64 = series
        .iter()
        .zip(&series[lag..])
        .map(|(a, b)| (a - m) * (b - m))
        .sum();
    numerator / denominator
}

pub fn detect_seasonality(series: &[f64]) -> Seasonality {
    let max_lag = SEASON_LENGTH.min(series.len() / 2);

    let mut best = Seasonality::default();
    for lag in SEASONALITY_MIN_LAG..=max_lag {
        let r = autocorrelation(series, lag);
        if best.period == 0 || r > best.strength {
            best.period = lag;
            best.strength = r;
        }
    }
    best.detected = best.strength > SEASONALITY_THRESHOLD;
    best
}

pub fn detect_trend(series: &[f64]) -> Trend {
    let fit = linear_fit(series);
    let direction = if fit.slope > TREND_DEADBAND {
        TrendDirection::Increasing
    } else if fit.slope < -TREND_DEADBAND {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    Trend {
        direction,
        magnitude: fit.slope.abs(),
        confidence: fit.r_squared,
    }
}

/// Tukey fences: points outside `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]`.
pub fn detect_anomalies(series: &[f64]) -> Anomalies {
    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let median = quantile_sorted(&sorted, 0.5);
    let threshold = IQR_FACTOR * (q3 - q1);
    let (low, high) = (q1 - threshold, q3 + threshold);

    let mut anomalies = Anomalies {
        threshold,
        ..Anomalies::default()
    };
    for (i, &x) in series.iter().enumerate() {
        if x < low || x > high {
            anomalies.indices.push(i);
            anomalies.scores.push((x - median).abs());
        }
    }
    anomalies
}

pub fn detect_cycles(series: &[f64]) -> Vec<CyclicPattern> {
    let max_period = CYCLE_MAX_PERIOD.min(series.len() / 2);

    let mut cycles: Vec<CyclicPattern> = (CYCLE_MIN_PERIOD..=max_period)
        .filter_map(|period| {
            let diffs: Vec<f64> = series
                .iter()
                .zip(&series[period..])
                .map(|(a, b)| b - a)
                .collect();
            let amplitude = mean(&diffs.iter().map(|d| d * d).collect::<Vec<_>>()).sqrt();
            (amplitude > CYCLE_MIN_AMPLITUDE).then_some(CyclicPattern { period, amplitude })
        })
        .collect();

    cycles.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude));
    cycles
}
