//! Time-series primitives: Pearson correlation, least-squares trend
//! fitting, z-score anomaly flagging and trailing moving averages.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Z-score multiple above which a point counts as anomalous.
pub const DEFAULT_ANOMALY_SENSITIVITY: f64 = 2.0;

/// Trailing window used when smoothing daily series.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

// ── Trend fitting ───────────────────────────────────────────────────────

/// Direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Result of fitting a least-squares line through a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Change per point of the fitted line.
    pub slope: f64,
    /// R-squared of the fit, `0.0..=1.0`.
    pub confidence: f64,
    /// Human-readable one-liner quoting the relative change.
    pub summary: String,
}

/// Fit a least-squares line through `series`, using point index as x.
///
/// Slopes within ±0.01 count as stable. The summary quotes the total
/// change across the series as a percentage of the series mean, so a
/// flat or near-zero-mean series reports 0.0%.
pub fn analyze_trend(series: &[f64]) -> TrendAnalysis {
    if series.len() < 2 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            slope: 0.0,
            confidence: 0.0,
            summary: "Insufficient data for trend analysis".to_string(),
        };
    }

    let n = series.len() as f64;
    let sum_x: f64 = (0..series.len()).map(|i| i as f64).sum();
    let sum_y: f64 = series.iter().sum();
    let sum_xy: f64 = series.iter().enumerate().map(|(i, v)| i as f64 * v).sum();
    let sum_x2: f64 = (0..series.len()).map(|i| (i * i) as f64).sum();

    // The x values are 0..n-1, so this denominator is never zero for n >= 2.
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_total: f64 = series.iter().map(|v| (v - mean_y).powi(2)).sum();
    let ss_residual: f64 = series
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let predicted = intercept + slope * i as f64;
            (v - predicted).powi(2)
        })
        .sum();
    let confidence = if ss_total <= f64::EPSILON {
        0.0
    } else {
        (1.0 - ss_residual / ss_total).clamp(0.0, 1.0)
    };

    let direction = if slope.abs() < 0.01 {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let change_percent = if mean_y.abs() <= f64::EPSILON {
        0.0
    } else {
        (slope * (n - 1.0) / mean_y * 100.0).abs()
    };

    let summary = match direction {
        TrendDirection::Stable => {
            format!("Stable trend with minimal change ({:.1}%)", change_percent)
        }
        TrendDirection::Increasing => {
            format!(
                "Increasing trend with {:.1}% growth over period",
                change_percent
            )
        }
        TrendDirection::Decreasing => {
            format!(
                "Decreasing trend with {:.1}% decline over period",
                change_percent
            )
        }
    };

    TrendAnalysis {
        direction,
        slope,
        confidence,
        summary,
    }
}

// ── Correlation ─────────────────────────────────────────────────────────

/// Pearson correlation coefficient between two equal-length series.
///
/// Returns 0.0 for mismatched lengths, empty input or zero variance in
/// either series.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|v| v * v).sum();
    let sum_y2: f64 = y.iter().map(|v| v * v).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denom_sq = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);
    if denom_sq <= f64::EPSILON {
        return 0.0;
    }
    numerator / denom_sq.sqrt()
}

// ── Anomaly detection ───────────────────────────────────────────────────

/// Severity of a flagged point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    /// z within sensitivity: unflagged.
    Low,
    /// z above sensitivity.
    Medium,
    /// z above 1.5x sensitivity.
    High,
}

/// Expected band for a point given the whole-series baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Per-point anomaly verdict, parallel to the input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub value: f64,
    pub is_anomaly: bool,
    pub severity: AnomalySeverity,
    pub expected_range: ValueRange,
}

/// Flag points whose z-score against the whole-series mean exceeds
/// `sensitivity` standard deviations.
///
/// Fewer than 3 points yields no anomalies: every point comes back
/// unflagged with a collapsed expected range around its own value.
pub fn detect_anomalies(series: &[f64], sensitivity: f64) -> Vec<AnomalyPoint> {
    if series.len() < 3 {
        return series
            .iter()
            .map(|&v| AnomalyPoint {
                value: v,
                is_anomaly: false,
                severity: AnomalySeverity::Low,
                expected_range: ValueRange { min: v, max: v },
            })
            .collect();
    }

    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let expected_range = ValueRange {
        min: mean - sensitivity * stddev,
        max: mean + sensitivity * stddev,
    };

    let points: Vec<AnomalyPoint> = series
        .iter()
        .map(|&value| {
            let z = z_score(value, mean, stddev).abs();
            let severity = if z > sensitivity * 1.5 {
                AnomalySeverity::High
            } else if z > sensitivity {
                AnomalySeverity::Medium
            } else {
                AnomalySeverity::Low
            };
            AnomalyPoint {
                value,
                is_anomaly: z > sensitivity,
                severity,
                expected_range,
            }
        })
        .collect();

    debug!(
        points = points.len(),
        anomalies = points.iter().filter(|p| p.is_anomaly).count(),
        "anomaly scan complete"
    );

    points
}

// ── Moving average ──────────────────────────────────────────────────────

/// One smoothed point, parallel to the input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub value: f64,
    pub moving_average: f64,
}

/// Trailing moving average over `window` points.
///
/// A series shorter than the window is passed through unsmoothed: every
/// point's average is its own value. Otherwise each point averages the
/// window ending at it, with shorter windows at the start of the series.
pub fn moving_average(series: &[f64], window: usize) -> Vec<MovingAveragePoint> {
    let window = window.max(1);
    if series.len() < window {
        return series
            .iter()
            .map(|&v| MovingAveragePoint {
                value: v,
                moving_average: v,
            })
            .collect();
    }

    series
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &series[start..=i];
            let moving_average = slice.iter().sum::<f64>() / slice.len() as f64;
            MovingAveragePoint {
                value,
                moving_average,
            }
        })
        .collect()
}

/// Compute z-score for a value against a baseline.
pub fn z_score(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev <= f64::EPSILON {
        return 0.0;
    }
    (value - mean) / stddev
}

// ── Tests ───────────────────────────────────────────────────────────────
