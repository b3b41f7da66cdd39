//! Raw-reading providers for the test-stand channels.
//!
//! Everything here yields grams through `teststand_traits::RawSource`:
//! a deterministic fuel-burn simulator, a mean-of-N averaging wrapper
//! (the stand reads 5 sub-samples per cycle), and a feature-gated HX711
//! bit-bang driver for real load cells.

pub mod error;
#[cfg(feature = "hardware")]
pub mod hx711;

use error::HwError;
use std::time::Duration;
use teststand_traits::RawSource;

// Deterministic tiny PRNG (xorshift32) for simulator noise.
#[derive(Debug, Clone)]
struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
    /// Uniform in [-1.0, 1.0)
    fn next_signed(&mut self) -> f64 {
        (f64::from(self.next_u32()) / f64::from(u32::MAX)) * 2.0 - 1.0
    }
}

/// Simulated load cell draining like a fuel tank: each read burns a fixed
/// amount plus bounded noise. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct SimulatedCell {
    weight_g: f64,
    burn_g_per_read: f64,
    noise_g: f64,
    rng: XorShift32,
}

impl SimulatedCell {
    pub fn new(start_g: f64, burn_g_per_read: f64, noise_g: f64, seed: u32) -> Self {
        Self {
            weight_g: start_g,
            burn_g_per_read,
            noise_g,
            rng: XorShift32::new(seed),
        }
    }

    /// A static cell that only jitters around its starting weight.
    pub fn steady(start_g: f64, noise_g: f64, seed: u32) -> Self {
        Self::new(start_g, 0.0, noise_g, seed)
    }
}

impl RawSource for SimulatedCell {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        self.weight_g = (self.weight_g - self.burn_g_per_read).max(0.0);
        let sample = self.weight_g + self.rng.next_signed() * self.noise_g;
        tracing::trace!(grams = sample, "simulated cell sample");
        Ok(sample)
    }
}

/// Mean-of-N wrapper: reads `samples_per_read` sub-samples from the inner
/// source and returns their average, so the channel controller always sees
/// pre-averaged input. The first sub-sample failure fails the whole read.
pub struct AveragedSource<S: RawSource> {
    inner: S,
    samples_per_read: u32,
}

impl<S: RawSource> AveragedSource<S> {
    pub fn new(inner: S, samples_per_read: u32) -> Self {
        Self {
            inner,
            samples_per_read: samples_per_read.max(1),
        }
    }
}

impl<S: RawSource> RawSource for AveragedSource<S> {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let mut sum = 0.0;
        for _ in 0..self.samples_per_read {
            sum += self.inner.read(timeout)?;
        }
        Ok(sum / f64::from(self.samples_per_read))
    }
}

#[cfg(feature = "hardware")]
pub use hardware::HardwareCell;

#[cfg(feature = "hardware")]
mod hardware {
    use super::*;
    use crate::hx711::{Gain, Hx711};

    /// HX711-backed load cell. Calibration is the original stand's single
    /// scale ratio: grams = raw counts / scale_ratio.
    pub struct HardwareCell {
        hx711: Hx711,
        scale_ratio: f64,
    }

    impl HardwareCell {
        pub fn new(dt_pin: u8, sck_pin: u8, scale_ratio: f64) -> crate::error::Result<Self> {
            let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let dt = gpio
                .get(dt_pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_input();
            let sck = gpio
                .get(sck_pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            Ok(HardwareCell {
                hx711: Hx711::new(dt, sck, Gain::A128)?,
                scale_ratio,
            })
        }
    }

    impl RawSource for HardwareCell {
        fn read(
            &mut self,
            timeout: Duration,
        ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            let mut attempts = 0;
            let max_attempts = 3;
            loop {
                match self.hx711.read_counts(timeout) {
                    Ok(raw) => {
                        tracing::debug!(raw, "hx711 sample");
                        return Ok(f64::from(raw) / self.scale_ratio);
                    }
                    Err(HwError::Timeout | HwError::DataReadyTimeout) if attempts < max_attempts => {
                        attempts += 1;
                        tracing::warn!(retries = attempts, "cell timeout, retrying");
                    }
                    Err(e) => {
                        tracing::error!("cell read error: {e}");
                        return Err(Box::new(e));
                    }
                }
            }
        }
    }
}

/// A source that fails every read with a typed timeout; used by tests and
/// the self-check path to exercise unavailable handling.
pub struct DeadSource;

impl RawSource for DeadSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(HwError::Timeout))
    }
}
