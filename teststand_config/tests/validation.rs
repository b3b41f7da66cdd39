use rstest::rstest;
use teststand_config::{ChannelKind, load_toml};

const GOOD: &str = r#"
[poll]
tick_ms = 1000

[hardware]
sensor_read_timeout_ms = 150
samples_per_read = 5

[[channel]]
name = "load_cell_1"
kind = "load_cell"

[[channel]]
name = "fuel_flow"
kind = "flow"
ema_alpha = 0.2
outlier_floor = 15.0
outlier_fraction = 0.15
commit_band = 5.0
interval_s = 1.0
density_g_per_l = 871.0
dt_pin = 21
sck_pin = 20
scale_ratio = 40.0
"#;

#[test]
fn good_config_parses_and_validates() {
    let cfg = load_toml(GOOD).expect("parse");
    cfg.validate().expect("validate");
    assert_eq!(cfg.poll.tick_ms, 1000);
    assert_eq!(cfg.channels.len(), 2);
    assert_eq!(cfg.channels[0].kind, ChannelKind::LoadCell);
    assert_eq!(cfg.channels[1].kind, ChannelKind::Flow);
    assert_eq!(cfg.channels[1].dt_pin, Some(21));
}

#[test]
fn defaults_match_reference_constants() {
    let cfg = load_toml("[[channel]]\nname = \"lc\"\n").expect("parse");
    cfg.validate().expect("validate");
    let ch = &cfg.channels[0];
    assert_eq!(ch.ema_alpha, 0.2);
    assert_eq!(ch.outlier_floor, 15.0);
    assert_eq!(ch.outlier_fraction, 0.15);
    assert_eq!(ch.commit_band, 5.0);
    assert_eq!(ch.interval_s, 1.0);
    assert_eq!(ch.density_g_per_l, 871.0);
    assert_eq!(cfg.hardware.samples_per_read, 5);
}

#[rstest]
#[case("ema_alpha = 0.0", "ema_alpha")]
#[case("ema_alpha = 1.5", "ema_alpha")]
#[case("commit_band = 0.0", "commit_band")]
#[case("outlier_floor = -1.0", "outlier_floor")]
#[case("outlier_fraction = -0.1", "outlier_fraction")]
#[case("scale_ratio = 0.0", "scale_ratio")]
fn bad_channel_values_fail_validation(#[case] line: &str, #[case] needle: &str) {
    let toml = format!("[[channel]]\nname = \"ch\"\n{line}\n");
    let cfg = load_toml(&toml).expect("parse");
    let err = cfg.validate().expect_err("should fail");
    assert!(err.to_string().contains(needle), "got: {err}");
}

#[rstest]
#[case("interval_s = 0.0", "interval_s")]
#[case("density_g_per_l = 0.0", "density_g_per_l")]
#[case("density_g_per_l = -871.0", "density_g_per_l")]
fn flow_only_values_fail_validation(#[case] line: &str, #[case] needle: &str) {
    let toml = format!("[[channel]]\nname = \"flow\"\nkind = \"flow\"\n{line}\n");
    let cfg = load_toml(&toml).expect("parse");
    let err = cfg.validate().expect_err("should fail");
    assert!(err.to_string().contains(needle), "got: {err}");

    // The same values are accepted on a load-cell channel (rate path unused).
    let toml = format!("[[channel]]\nname = \"lc\"\n{line}\n");
    load_toml(&toml).expect("parse").validate().expect("ok");
}

#[test]
fn empty_channel_name_is_rejected() {
    let cfg = load_toml("[[channel]]\nname = \"\"\n").expect("parse");
    let err = cfg.validate().expect_err("should fail");
    assert!(err.to_string().contains("channel.name"));
}

#[test]
fn empty_channel_list_is_rejected() {
    let cfg = load_toml("[poll]\ntick_ms = 500\n").expect("parse");
    assert!(cfg.validate().is_err());
}

#[test]
fn duplicate_channel_names_are_rejected() {
    let toml = "[[channel]]\nname = \"a\"\n[[channel]]\nname = \"a\"\n";
    let cfg = load_toml(toml).expect("parse");
    let err = cfg.validate().expect_err("should fail");
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn zero_tick_is_rejected() {
    let cfg = load_toml("[poll]\ntick_ms = 0\n[[channel]]\nname = \"a\"\n").expect("parse");
    assert!(cfg.validate().is_err());
}
