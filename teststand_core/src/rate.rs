//! Time-windowed rate-of-change estimation from a cumulative weight.
//!
//! A falling stable weight models fuel leaving the tank; the estimator
//! emits grams/min and liters/min once per completed wall-clock interval
//! and zero in between (no partial-interval interpolation).

use crate::util::{SECS_PER_MIN, round_to};
use std::time::{Duration, Instant};

/// Rate estimator configuration; validated at channel construction.
#[derive(Debug, Clone, Copy)]
pub struct RateCfg {
    /// Measurement window length.
    pub interval: Duration,
    /// Fuel density used for the volume rate, in g/L.
    pub density_g_per_l: f64,
}

impl Default for RateCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            density_g_per_l: 871.0,
        }
    }
}

/// One rate observation. `measured` distinguishes a completed-interval
/// measurement (possibly 0.0) from the zero emitted while the window is
/// still open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub mass_g_per_min: f64,
    pub volume_l_per_min: f64,
    pub measured: bool,
}

impl RateSample {
    const fn gated() -> Self {
        Self {
            mass_g_per_min: 0.0,
            volume_l_per_min: 0.0,
            measured: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateEstimator {
    cfg: RateCfg,
    // Start time and stable value of the open window; both present or both
    // absent, reset together exactly once per completed interval.
    window: Option<(Instant, f64)>,
}

impl RateEstimator {
    pub fn new(cfg: RateCfg) -> Self {
        Self { cfg, window: None }
    }

    /// Advance the estimator with the channel's current stable value.
    ///
    /// Opens the window on first call. Once `now - start >= interval`,
    /// emits `max(0, start_value - stable) * 60 / interval_secs` g/min
    /// (volume = mass / density) and re-opens the window at (now, stable),
    /// keeping intervals contiguous and non-overlapping.
    pub fn update(&mut self, stable: f64, now: Instant) -> RateSample {
        let Some((start, start_value)) = self.window else {
            self.window = Some((now, stable));
            return RateSample::gated();
        };

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.cfg.interval {
            return RateSample::gated();
        }

        // Falling weight => positive delta; refueling or noise clamps to 0.
        let delta = start_value - stable;
        let per_min = SECS_PER_MIN / self.cfg.interval.as_secs_f64();
        let mass = (delta * per_min).max(0.0);
        let volume = mass / self.cfg.density_g_per_l;
        self.window = Some((now, stable));
        RateSample {
            mass_g_per_min: round_to(mass, 2),
            volume_l_per_min: round_to(volume, 4),
            measured: true,
        }
    }

    pub fn reset(&mut self) {
        self.window = None;
    }
}
