#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Sensor signal conditioning for the test-stand monitor (hardware-agnostic).
//!
//! All hardware interaction goes through `teststand_traits::RawSource`; time
//! goes through `teststand_traits::Clock`. One `Channel` per physical
//! sensor, each owning its state exclusively:
//!
//! - **Filter**: EMA smoothing of the raw stream (`filter` module)
//! - **Stability gate**: outlier rejection and stable-value commit (`gate`)
//! - **Rate estimator**: interval grams/min and liters/min from the stable
//!   weight (`rate`, flow channels only)
//! - **Controller**: `Channel` orchestrates one poll cycle and packages a
//!   `Reading`
//!
//! A channel moves from uninitialized to tracking on its first successful
//! raw reading and stays there for the life of the process; an unavailable
//! reading freezes state for one cycle and is never an error. The host's
//! "clear data" action clears display history only and deliberately does
//! not touch channel state; `Channel::reset` exists for an explicit reset.

pub mod conversions;
pub mod error;
pub mod filter;
pub mod gate;
pub mod mocks;
pub mod rate;
pub mod runner;
pub mod util;

pub use error::{BuildError, Result, UnavailableKind};
pub use filter::EmaFilter;
pub use gate::{GateDecision, StabilityGate};
pub use rate::{RateCfg, RateEstimator, RateSample};

use std::sync::Arc;
use std::time::Duration;
use teststand_traits::RawSource;
use teststand_traits::clock::{Clock, MonotonicClock};

/// Per-channel conditioning constants; validated at channel construction.
#[derive(Debug, Clone)]
pub struct ChannelCfg {
    /// EMA smoothing factor, (0.0, 1.0]
    pub ema_alpha: f64,
    /// Absolute outlier threshold floor (grams)
    pub outlier_floor: f64,
    /// Relative outlier threshold as a fraction of |stable|
    pub outlier_fraction: f64,
    /// Max |filtered - stable| that still commits a new stable value
    pub commit_band: f64,
    /// Rate estimation; None for plain load-cell channels
    pub rate: Option<RateCfg>,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self {
            ema_alpha: 0.2,
            outlier_floor: 15.0,
            outlier_fraction: 0.15,
            commit_band: 5.0,
            rate: None,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms)
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 150 }
    }
}

/// One poll cycle's packaged result, as handed to the GUI/logger.
///
/// Weights are unrounded; the rate fields carry the estimator's fixed
/// display precision (2 decimals mass, 4 volume). Rate fields are `None`
/// for channels without a rate estimator and zero while a measurement
/// window is still open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub available: bool,
    /// Why no data was produced this cycle, when `available` is false.
    pub unavailable: Option<UnavailableKind>,
    pub raw: Option<f64>,
    pub filtered: Option<f64>,
    pub stable: Option<f64>,
    /// The filtered value was judged a transient outlier this cycle.
    pub outlier: bool,
    pub mass_g_per_min: Option<f64>,
    pub volume_l_per_min: Option<f64>,
}

impl Reading {
    fn no_data(kind: UnavailableKind, stable: Option<f64>, filtered: Option<f64>) -> Self {
        Self {
            available: false,
            unavailable: Some(kind),
            raw: None,
            filtered,
            stable,
            outlier: false,
            mass_g_per_min: None,
            volume_l_per_min: None,
        }
    }
}

/// Channel controller: one physical sensor's conditioning pipeline.
pub struct Channel<S: RawSource> {
    label: String,
    source: S,
    cfg: ChannelCfg,
    sensor_timeout: Duration,
    clock: Arc<dyn Clock + Send + Sync>,
    filter: EmaFilter,
    gate: StabilityGate,
    rate: Option<RateEstimator>,
}

/// Boxed-source channel, for heterogeneous channel sets in one host.
pub type BoxedChannel = Channel<Box<dyn RawSource + Send>>;

impl<S: RawSource> core::fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Channel")
            .field("label", &self.label)
            .field("filtered", &self.filter.value())
            .field("stable", &self.gate.stable())
            .field("tracking", &self.is_tracking())
            .finish()
    }
}

fn validate(cfg: &ChannelCfg, timeouts: &Timeouts) -> Result<()> {
    if !(cfg.ema_alpha > 0.0 && cfg.ema_alpha <= 1.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "ema_alpha must be in (0.0, 1.0]",
        )));
    }
    if !cfg.outlier_floor.is_finite() || cfg.outlier_floor < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "outlier_floor must be >= 0",
        )));
    }
    if !cfg.outlier_fraction.is_finite() || cfg.outlier_fraction < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "outlier_fraction must be >= 0",
        )));
    }
    if !(cfg.commit_band > 0.0) || !cfg.commit_band.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "commit_band must be > 0",
        )));
    }
    if let Some(rate) = &cfg.rate {
        if rate.interval.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "rate interval must be > 0",
            )));
        }
        if !(rate.density_g_per_l > 0.0) || !rate.density_g_per_l.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "density must be > 0",
            )));
        }
    }
    if timeouts.sensor_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sensor_ms must be >= 1",
        )));
    }
    Ok(())
}

impl<S: RawSource> Channel<S> {
    /// Build a channel with the default monotonic clock.
    pub fn new(
        label: impl Into<String>,
        source: S,
        cfg: ChannelCfg,
        timeouts: Timeouts,
    ) -> Result<Self> {
        Self::with_clock(label, source, cfg, timeouts, Arc::new(MonotonicClock::new()))
    }

    /// Build a channel with an explicit clock (deterministic in tests).
    pub fn with_clock(
        label: impl Into<String>,
        source: S,
        cfg: ChannelCfg,
        timeouts: Timeouts,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        validate(&cfg, &timeouts)?;
        let gate = StabilityGate::new(cfg.outlier_floor, cfg.outlier_fraction, cfg.commit_band);
        let rate = cfg.rate.map(RateEstimator::new);
        Ok(Self {
            label: label.into(),
            source,
            sensor_timeout: Duration::from_millis(timeouts.sensor_ms),
            clock,
            filter: EmaFilter::new(),
            gate,
            rate,
            cfg,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True once the first successful raw reading has seeded the channel.
    pub fn is_tracking(&self) -> bool {
        self.filter.value().is_some()
    }

    /// Current EMA output, if tracking.
    pub fn filtered(&self) -> Option<f64> {
        self.filter.value()
    }

    /// Current stable reference value, if any reading has been accepted.
    pub fn stable(&self) -> Option<f64> {
        self.gate.stable()
    }

    /// Run one poll cycle: read the source, then condition the value.
    ///
    /// A failed or non-finite read yields an unavailable `Reading` with all
    /// channel state untouched; the next good reading resumes from the last
    /// good state.
    pub fn poll(&mut self) -> Reading {
        let raw = match self.source.read(self.sensor_timeout) {
            Ok(v) if v.is_finite() => v,
            Ok(v) => {
                tracing::warn!(channel = %self.label, value = v, "non-finite raw reading");
                return Reading::no_data(
                    UnavailableKind::NonFinite,
                    self.gate.stable(),
                    self.filter.value(),
                );
            }
            Err(e) => {
                let kind = classify_unavailable(&*e);
                tracing::warn!(channel = %self.label, error = %e, ?kind, "raw reading unavailable");
                return Reading::no_data(kind, self.gate.stable(), self.filter.value());
            }
        };
        self.sample_from_raw(raw)
    }

    /// Condition a pre-sampled raw value (host-driven sampling).
    pub fn sample_from_raw(&mut self, raw: f64) -> Reading {
        let filtered = self.filter.apply(raw, self.cfg.ema_alpha);
        let decision = self.gate.offer(filtered);
        // Seeding guarantees a stable value from here on.
        let stable = self.gate.stable().unwrap_or(filtered);

        let (mass, volume) = match &mut self.rate {
            Some(est) => {
                let s = est.update(stable, self.clock.now());
                (Some(s.mass_g_per_min), Some(s.volume_l_per_min))
            }
            None => (None, None),
        };

        tracing::trace!(
            channel = %self.label,
            raw,
            filtered,
            stable,
            ?decision,
            "sample"
        );

        Reading {
            available: true,
            unavailable: None,
            raw: Some(raw),
            filtered: Some(filtered),
            stable: Some(stable),
            outlier: decision.is_outlier(),
            mass_g_per_min: mass,
            volume_l_per_min: volume,
        }
    }

    /// Explicit full reset back to the uninitialized state. Not wired to
    /// the host's "clear data" action on purpose.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.gate.reset();
        if let Some(est) = &mut self.rate {
            est.reset();
        }
    }
}

// Classify a read failure for the unavailable flag, with typed hardware
// errors when the hardware-errors feature is enabled.
fn classify_unavailable(e: &(dyn std::error::Error + 'static)) -> UnavailableKind {
    #[cfg(feature = "hardware-errors")]
    {
        use teststand_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => UnavailableKind::Timeout,
                _ => UnavailableKind::Fault,
            };
        }
    }
    if e.to_string().to_lowercase().contains("timeout") {
        UnavailableKind::Timeout
    } else {
        UnavailableKind::Fault
    }
}
