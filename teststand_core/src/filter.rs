//! Exponential moving average smoothing of a raw scalar stream.

/// EMA filter state. Absent until the first raw value seeds it.
///
/// The output is a convex combination of the newest sample and history:
/// `output = alpha * raw + (1 - alpha) * previous`. Zero and negative
/// inputs are ordinary data.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmaFilter {
    previous: Option<f64>,
}

impl EmaFilter {
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Apply the filter; the first call returns `raw` exactly.
    pub fn apply(&mut self, raw: f64, alpha: f64) -> f64 {
        debug_assert!(
            alpha > 0.0 && alpha <= 1.0,
            "ema alpha must be in (0.0, 1.0], got {alpha}"
        );
        let y = match self.previous {
            None => raw,
            Some(prev) => alpha * raw + (1.0 - alpha) * prev,
        };
        self.previous = Some(y);
        y
    }

    /// Current filtered value, if any raw reading has been observed.
    pub fn value(&self) -> Option<f64> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
