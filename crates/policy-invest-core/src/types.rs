use serde::{Deserialize, Serialize};

/// Monetary amounts, in a single implicit currency.
pub type Money = f64;

/// Rates expressed as decimals (0.05 = 5%). Used inside the engine only.
pub type Rate = f64;

/// Rates expressed as percentages (5.0 = 5%). Used on every public record.
pub type Percent = f64;

/// Year fractions or counts
pub type Years = f64;

/// Convert a percentage into a decimal rate.
pub fn pct(value: Percent) -> Rate {
    value / 100.0
}

/// Convert a decimal rate into a percentage.
pub fn to_pct(value: Rate) -> Percent {
    value * 100.0
}

/// Round to two decimal places (ratios reported to users).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replace a non-finite value with zero, returning whether a coercion happened.
pub fn finite_or_zero(value: f64) -> (f64, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (0.0, true)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
