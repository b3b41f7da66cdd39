//! Mapping from `teststand_config` TOML structs to core config.

use crate::{ChannelCfg, RateCfg, Timeouts};
use std::time::Duration;
use teststand_config::{ChannelKind, ChannelToml, Hardware};

impl From<&ChannelToml> for ChannelCfg {
    fn from(ch: &ChannelToml) -> Self {
        let rate = match ch.kind {
            ChannelKind::Flow => Some(RateCfg {
                interval: Duration::from_secs_f64(ch.interval_s),
                density_g_per_l: ch.density_g_per_l,
            }),
            ChannelKind::LoadCell => None,
        };
        ChannelCfg {
            ema_alpha: ch.ema_alpha,
            outlier_floor: ch.outlier_floor,
            outlier_fraction: ch.outlier_fraction,
            commit_band: ch.commit_band,
            rate,
        }
    }
}

impl From<&Hardware> for Timeouts {
    fn from(hw: &Hardware) -> Self {
        Timeouts {
            sensor_ms: hw.sensor_read_timeout_ms,
        }
    }
}
