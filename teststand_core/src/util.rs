//! Shared numeric/time helpers for teststand_core.

/// Seconds in one minute, as used by the per-minute rate conversion.
pub const SECS_PER_MIN: f64 = 60.0;

/// Round to `decimals` fractional digits, half away from zero.
/// Non-finite values pass through unchanged.
#[inline]
pub fn round_to(x: f64, decimals: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let scale = 10f64.powi(decimals as i32);
    (x * scale).round() / scale
}
