//! Fail-open numeric policy.
//!
//! Indicators never raise on bad numbers. NaN is the "no value yet"
//! sentinel and these helpers spell out how each formula treats it, so the
//! rules are testable instead of being left to ambient float behaviour.

/// NaN reads as zero. Used by rolling sums so one missing sample does not
/// poison the whole window.
#[inline]
pub fn or_zero(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

/// Division that yields NaN for a zero or NaN denominator.
#[inline]
pub fn div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// A "nonzero sample": finite and different from zero.
#[inline]
pub fn is_signal(v: f64) -> bool {
    v.is_finite() && v != 0.0
}

/// Larger of two values, ignoring a NaN operand. NaN only if both are NaN.
#[inline]
pub fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.max(b)
    }
}

/// Smaller of two values, ignoring a NaN operand. NaN only if both are NaN.
#[inline]
pub fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.min(b)
    }
}
