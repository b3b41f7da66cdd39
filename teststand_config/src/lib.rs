#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the test-stand monitor.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! One `[[channel]]` table per physical sensor; conditioning constants
//! default to the stand's reference values (EMA alpha 0.2, outlier floor
//! 15 g / 15%, commit band 5 g, 1 s rate interval, 871 g/L fuel density).
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollCfg {
    /// Poll-loop tick period in milliseconds.
    pub tick_ms: u64,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for a sensor sample before flagging the cycle
    pub sensor_read_timeout_ms: u64,
    /// Raw sub-samples averaged per reading by the provider
    pub samples_per_read: u32,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
            samples_per_read: 5,
        }
    }
}

/// Which outputs a channel produces.
///
/// `Flow` channels derive mass/volume rates from the stable weight;
/// `LoadCell` channels report raw/filtered/stable only.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    LoadCell,
    Flow,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChannelToml {
    pub name: String,
    pub kind: ChannelKind,
    /// EMA smoothing factor, (0.0, 1.0]
    pub ema_alpha: f64,
    /// Absolute outlier threshold floor (grams)
    pub outlier_floor: f64,
    /// Relative outlier threshold as a fraction of |stable|
    pub outlier_fraction: f64,
    /// Max |filtered - stable| that still commits a new stable value (grams)
    pub commit_band: f64,
    /// Rate window length in seconds (flow channels)
    pub interval_s: f64,
    /// Fuel density in g/L (flow channels)
    pub density_g_per_l: f64,
    /// HX711 data pin (hardware builds)
    pub dt_pin: Option<u8>,
    /// HX711 clock pin (hardware builds)
    pub sck_pin: Option<u8>,
    /// HX711 calibration ratio: grams = raw counts / scale_ratio
    pub scale_ratio: f64,
    /// Simulator starting weight (grams)
    pub sim_start_g: f64,
    /// Simulator burn rate (grams per reading)
    pub sim_burn_g: f64,
}

impl Default for ChannelToml {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ChannelKind::LoadCell,
            ema_alpha: 0.2,
            outlier_floor: 15.0,
            outlier_fraction: 0.15,
            commit_band: 5.0,
            interval_s: 1.0,
            density_g_per_l: 871.0,
            dt_pin: None,
            sck_pin: None,
            scale_ratio: 40.0,
            sim_start_g: 1000.0,
            sim_burn_g: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub poll: PollCfg,
    pub logging: Logging,
    pub hardware: Hardware,
    #[serde(rename = "channel")]
    pub channels: Vec<ChannelToml>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.poll.tick_ms == 0 {
            eyre::bail!("poll.tick_ms must be >= 1");
        }
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }
        if self.hardware.samples_per_read == 0 {
            eyre::bail!("hardware.samples_per_read must be >= 1");
        }
        if self.channels.is_empty() {
            eyre::bail!("at least one [[channel]] is required");
        }

        for ch in &self.channels {
            if ch.name.is_empty() {
                eyre::bail!("channel.name must not be empty");
            }
            let name = ch.name.as_str();
            if !(ch.ema_alpha > 0.0 && ch.ema_alpha <= 1.0) {
                eyre::bail!("channel {name}: ema_alpha must be in (0.0, 1.0]");
            }
            if !ch.outlier_floor.is_finite() || ch.outlier_floor < 0.0 {
                eyre::bail!("channel {name}: outlier_floor must be >= 0");
            }
            if !ch.outlier_fraction.is_finite() || ch.outlier_fraction < 0.0 {
                eyre::bail!("channel {name}: outlier_fraction must be >= 0");
            }
            if !(ch.commit_band > 0.0) || !ch.commit_band.is_finite() {
                eyre::bail!("channel {name}: commit_band must be > 0");
            }
            if ch.kind == ChannelKind::Flow {
                if !(ch.interval_s > 0.0) || !ch.interval_s.is_finite() {
                    eyre::bail!("channel {name}: interval_s must be > 0");
                }
                if !(ch.density_g_per_l > 0.0) || !ch.density_g_per_l.is_finite() {
                    eyre::bail!("channel {name}: density_g_per_l must be > 0");
                }
            }
            if !(ch.scale_ratio != 0.0 && ch.scale_ratio.is_finite()) {
                eyre::bail!("channel {name}: scale_ratio must be non-zero");
            }
            if !ch.sim_burn_g.is_finite() || ch.sim_burn_g < 0.0 {
                eyre::bail!("channel {name}: sim_burn_g must be >= 0");
            }
        }

        // Channel names double as log/output keys; duplicates would collide.
        for (i, a) in self.channels.iter().enumerate() {
            for b in &self.channels[i + 1..] {
                if a.name == b.name {
                    eyre::bail!("duplicate channel name: {}", a.name);
                }
            }
        }

        Ok(())
    }
}
