//! Floating-point helpers for cost arithmetic.
//!
//! Quantities, rates and values are plain `f64`. Equality between figures
//! derived along different paths (a queue sum vs. a stored aggregate) must go
//! through [`approx_eq`].

/// Absolute tolerance for comparing quantities and values.
pub const COST_TOLERANCE: f64 = 0.01;

/// `|a - b| <= COST_TOLERANCE`.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= COST_TOLERANCE
}

/// Divide, yielding `0.0` instead of `NaN`/`inf` when the divisor is zero.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
