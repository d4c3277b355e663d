//! Two-group significance helpers: Welch's t statistic with banded
//! p-values, Cohen's d effect size and correlation strength labels.
//!
//! The p-values are coarse lookup bands rather than exact tail
//! probabilities. Downstream rankings only ever compare bands, so the
//! approximation is sufficient and keeps this crate dependency-free.

use serde::{Deserialize, Serialize};

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); 0.0 below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Cohen's d effect size between two groups, against the pooled
/// standard deviation.
///
/// Returns 0.0 when either group has fewer than two values or the
/// pooled deviation vanishes.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }
    let pooled = ((sample_variance(a) + sample_variance(b)) / 2.0).sqrt();
    if pooled <= f64::EPSILON {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled
}

/// Banded two-sample p-value from the Welch t statistic.
///
/// Groups below two values, or with no variance between them, are
/// reported as indistinguishable (p = 1.0).
pub fn approx_p_value(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 1.0;
    }
    let standard_error =
        (sample_variance(a) / a.len() as f64 + sample_variance(b) / b.len() as f64).sqrt();
    if standard_error <= f64::EPSILON {
        return 1.0;
    }
    let t = ((mean(a) - mean(b)) / standard_error).abs();

    if t > 3.0 {
        0.001
    } else if t > 2.5 {
        0.01
    } else if t > 2.0 {
        0.05
    } else if t > 1.5 {
        0.1
    } else {
        0.5
    }
}

// ── Correlation strength ────────────────────────────────────────────────

/// Qualitative label for a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

impl CorrelationStrength {
    /// Band |r|: above 0.7 strong, 0.4 moderate, 0.2 weak, else none.
    pub fn from_r(r: f64) -> Self {
        let abs = r.abs();
        if abs > 0.7 {
            CorrelationStrength::Strong
        } else if abs > 0.4 {
            CorrelationStrength::Moderate
        } else if abs > 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::None => "none",
        }
    }
}

impl std::fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
