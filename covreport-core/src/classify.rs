//! Coverage percentage classification
//!
//! Global invariants enforced:
//! - Classification is a pure function of (covered, instrumented, thresholds)
//! - Every input maps to exactly one class, including a zero denominator

use serde::{Deserialize, Serialize};

/// Default low cut point, matching the producer's `--limits` default
pub const DEFAULT_PERCENT_LOW: f64 = 25.0;

/// Default high cut point, matching the producer's `--limits` default
pub const DEFAULT_PERCENT_HIGH: f64 = 75.0;

/// Three-way visual classification of a coverage ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageClass {
    Low,
    Medium,
    High,
}

impl CoverageClass {
    /// CSS class the page shell styles the percent display with
    pub fn css_class(&self) -> &'static str {
        match self {
            CoverageClass::Low => "coverPerLeftLo",
            CoverageClass::Medium => "coverPerLeftMed",
            CoverageClass::High => "coverPerLeftHi",
        }
    }
}

/// Low/high cut points of the classification, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub percent_low: f64,
    pub percent_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            percent_low: DEFAULT_PERCENT_LOW,
            percent_high: DEFAULT_PERCENT_HIGH,
        }
    }
}

/// Coverage ratio in percent.
///
/// No guard on the denominator: `0/0` is NaN and `n/0` is +inf.
pub fn coverage_ratio(covered: u64, instrumented: u64) -> f64 {
    (covered as f64 / instrumented as f64) * 100.0
}

/// Classify a covered/instrumented pair.
///
/// - `Low` when ratio <= percent_low
/// - `High` when ratio >= percent_high
/// - `Medium` otherwise
///
/// A NaN ratio (nothing instrumented, nothing covered) fails both
/// comparisons and lands in `Medium`.
pub fn classify(covered: u64, instrumented: u64, thresholds: &Thresholds) -> CoverageClass {
    classify_ratio(coverage_ratio(covered, instrumented), thresholds)
}

/// Classify an already computed ratio
pub fn classify_ratio(ratio: f64, thresholds: &Thresholds) -> CoverageClass {
    if ratio <= thresholds.percent_low {
        CoverageClass::Low
    } else if ratio >= thresholds.percent_high {
        CoverageClass::High
    } else {
        CoverageClass::Medium
    }
}

/// Format a ratio the way the header displays it: one decimal digit and a
/// trailing `%`.
///
/// Exact halves round up, as a browser's `toFixed(1)` does; every other
/// value rounds to the nearest tenth.
pub fn format_percent(ratio: f64) -> String {
    if ratio.is_nan() {
        "NaN%".to_string()
    } else if ratio.is_infinite() {
        if ratio > 0.0 {
            "Infinity%".to_string()
        } else {
            "-Infinity%".to_string()
        }
    } else {
        format!("{}%", to_fixed_1(ratio))
    }
}

fn to_fixed_1(x: f64) -> String {
    // an exact binary tie at the second decimal is an odd number of quarters
    let quarters = x * 4.0;
    if x >= 0.0 && quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        let tenths = (x * 10.0).ceil() as u64;
        return format!("{}.{}", tenths / 10, tenths % 10);
    }
    format!("{:.1}", x)
}
