//! Minimal HX711 bit-bang driver (Raspberry Pi GPIO via rppal).
//!
//! The stand wires each load cell bridge to one HX711; channel A at gain
//! 128 needs 25 clock pulses after the 24 data bits.

use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

const DATA_BITS: u32 = 24;
const READY_POLL: Duration = Duration::from_micros(200);

/// Gain/channel selection, expressed as post-read clock pulses.
#[derive(Debug, Clone, Copy)]
pub enum Gain {
    /// Channel A, gain 128 (the stand's wiring)
    A128,
    /// Channel B, gain 32
    B32,
    /// Channel A, gain 64
    A64,
}

impl Gain {
    fn pulses(self) -> u32 {
        match self {
            Gain::A128 => 1,
            Gain::B32 => 2,
            Gain::A64 => 3,
        }
    }
}

pub struct Hx711 {
    data: rppal::gpio::InputPin,
    clock: rppal::gpio::OutputPin,
    gain: Gain,
}

impl Hx711 {
    pub fn new(
        data: rppal::gpio::InputPin,
        mut clock: rppal::gpio::OutputPin,
        gain: Gain,
    ) -> Result<Self> {
        clock.set_low(); // clock idle low; high >60us would power the chip down
        Ok(Self { data, clock, gain })
    }

    /// Block until the chip signals data-ready (DT low) or the deadline
    /// passes, then clock out one signed 24-bit conversion.
    pub fn read_counts(&mut self, timeout: Duration) -> Result<i32> {
        self.wait_ready(timeout)?;

        let mut counts: i32 = 0;
        for _ in 0..DATA_BITS {
            counts = (counts << 1) | i32::from(self.clock_bit());
        }

        // Extra pulses select gain/channel for the next conversion.
        for _ in 0..self.gain.pulses() {
            self.pulse_clock();
        }

        // Sign-extend from 24 bits.
        if counts & 0x0080_0000 != 0 {
            counts |= !0x00FF_FFFF;
        }
        tracing::trace!(counts, "hx711 conversion");
        Ok(counts)
    }

    fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while self.data.is_high() {
            if Instant::now() >= deadline {
                return Err(HwError::DataReadyTimeout);
            }
            std::thread::sleep(READY_POLL);
        }
        Ok(())
    }

    fn clock_bit(&mut self) -> bool {
        self.clock.set_high();
        settle();
        let bit = self.data.is_high();
        self.clock.set_low();
        settle();
        bit
    }

    fn pulse_clock(&mut self) {
        self.clock.set_high();
        settle();
        self.clock.set_low();
        settle();
    }
}

// HX711 wants >=0.2us between clock edges; a spin hint is plenty on the Pi.
#[inline(always)]
fn settle() {
    std::hint::spin_loop();
}
