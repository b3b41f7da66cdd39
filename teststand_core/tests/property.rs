use proptest::prelude::*;
use std::time::{Duration, Instant};
use teststand_core::{EmaFilter, RateCfg, RateEstimator, StabilityGate};

proptest! {
    // EMA output is a convex combination: always between the previous
    // filtered value and the new raw sample.
    #[test]
    fn ema_stays_between_previous_and_raw(
        seed in -1000.0f64..1000.0,
        raws in prop::collection::vec(-1000.0f64..1000.0, 1..200),
        alpha in 0.01f64..1.0,
    ) {
        let mut f = EmaFilter::new();
        let mut prev = f.apply(seed, alpha);
        for raw in raws {
            let y = f.apply(raw, alpha);
            let (lo, hi) = if prev <= raw { (prev, raw) } else { (raw, prev) };
            prop_assert!(y >= lo - 1e-9 && y <= hi + 1e-9,
                "{y} outside [{lo}, {hi}]");
            prev = y;
        }
    }

    // The mass rate is clamped: never negative for any stable-value path.
    #[test]
    fn mass_rate_is_never_negative(
        start in 0.0f64..2000.0,
        deltas in prop::collection::vec(-20.0f64..20.0, 1..100),
    ) {
        let mut est = RateEstimator::new(RateCfg::default());
        let t0 = Instant::now();
        let mut now = t0;
        let mut stable = start;
        est.update(stable, now);
        for d in deltas {
            stable += d;
            now += Duration::from_millis(700);
            let s = est.update(stable, now);
            prop_assert!(s.mass_g_per_min >= 0.0);
            prop_assert!(s.volume_l_per_min >= 0.0);
        }
    }

    // A strictly increasing stable weight (refueling) yields exactly zero.
    #[test]
    fn increasing_weight_rates_are_exactly_zero(
        start in 0.0f64..2000.0,
        ups in prop::collection::vec(0.0f64..20.0, 1..50),
    ) {
        let mut est = RateEstimator::new(RateCfg::default());
        let t0 = Instant::now();
        let mut now = t0;
        let mut stable = start;
        est.update(stable, now);
        for d in ups {
            stable += d;
            now += Duration::from_secs(2);
            let s = est.update(stable, now);
            prop_assert!(s.measured);
            prop_assert_eq!(s.mass_g_per_min, 0.0);
            prop_assert_eq!(s.volume_l_per_min, 0.0);
        }
    }

    // Whatever the input sequence, the gate moves the stable value at most
    // once per offer and only inside the commit band.
    #[test]
    fn gate_moves_stable_only_within_commit_band(
        seed in -500.0f64..500.0,
        readings in prop::collection::vec(-500.0f64..500.0, 1..200),
    ) {
        let mut g = StabilityGate::new(15.0, 0.15, 5.0);
        g.offer(seed);
        for x in readings {
            let before = g.stable().unwrap();
            g.offer(x);
            let after = g.stable().unwrap();
            if after != before {
                prop_assert_eq!(after, x);
                prop_assert!((x - before).abs() < 5.0);
            }
        }
    }
}
