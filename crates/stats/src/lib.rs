//! Pure statistical primitives shared by the analytics and rules crates.
//!
//! Nothing here touches the store or the domain model. Functions take
//! numeric slices and return plain values, so they stay trivially
//! testable and safe to call from parallel workers. Degenerate inputs
//! (empty series, constant series, zero variance) produce neutral
//! results instead of NaN.

pub mod significance;
pub mod timeseries;

pub use significance::{approx_p_value, cohens_d, mean, sample_variance, CorrelationStrength};
pub use timeseries::{
    analyze_trend, detect_anomalies, moving_average, pearson_correlation, z_score, AnomalyPoint,
    AnomalySeverity, MovingAveragePoint, TrendAnalysis, TrendDirection, ValueRange,
    DEFAULT_ANOMALY_SENSITIVITY, DEFAULT_MOVING_AVERAGE_WINDOW,
};
