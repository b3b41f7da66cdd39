//! Stability gate: decides whether a filtered reading replaces the
//! channel's stable reference value.
//!
//! Two explicit bands (see DESIGN.md):
//! - reject band: `deviation >= max(outlier_floor, outlier_fraction * |stable|)`
//!   marks the reading as a transient outlier; stable unchanged.
//! - commit band: `deviation < commit_band` treats the reading as converged
//!   and overwrites the stable value.
//! - anything between holds the previous stable value without flagging.
//!
//! The first offered value seeds the stable reference unconditionally.

/// Outcome of offering one filtered reading to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No stable value existed; the reading seeded it.
    Seeded,
    /// Within the commit band; stable value overwritten.
    Committed,
    /// Between the commit and reject bands; stable value kept.
    Held,
    /// At or beyond the outlier threshold; stable value kept.
    Rejected,
}

impl GateDecision {
    /// True when the reading was judged a transient outlier.
    pub fn is_outlier(self) -> bool {
        matches!(self, GateDecision::Rejected)
    }
}

#[derive(Debug, Clone)]
pub struct StabilityGate {
    outlier_floor: f64,
    outlier_fraction: f64,
    commit_band: f64,
    stable: Option<f64>,
}

impl StabilityGate {
    pub fn new(outlier_floor: f64, outlier_fraction: f64, commit_band: f64) -> Self {
        Self {
            outlier_floor,
            outlier_fraction,
            commit_band,
            stable: None,
        }
    }

    /// Offer a filtered reading; updates the stable value at most once.
    pub fn offer(&mut self, filtered: f64) -> GateDecision {
        let Some(stable) = self.stable else {
            self.stable = Some(filtered);
            return GateDecision::Seeded;
        };
        let deviation = (filtered - stable).abs();
        let threshold = self
            .outlier_floor
            .max(self.outlier_fraction * stable.abs());
        if deviation >= threshold {
            return GateDecision::Rejected;
        }
        if deviation < self.commit_band {
            self.stable = Some(filtered);
            return GateDecision::Committed;
        }
        GateDecision::Held
    }

    /// Last value accepted as non-transient, if any.
    pub fn stable(&self) -> Option<f64> {
        self.stable
    }

    pub fn reset(&mut self) {
        self.stable = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gate() -> StabilityGate {
        StabilityGate::new(15.0, 0.15, 5.0)
    }

    #[test]
    fn first_reading_seeds_unconditionally() {
        let mut g = gate();
        assert_eq!(g.offer(1234.5), GateDecision::Seeded);
        assert_eq!(g.stable(), Some(1234.5));
    }

    #[test]
    fn small_delta_commits() {
        let mut g = gate();
        g.offer(100.0);
        assert_eq!(g.offer(103.0), GateDecision::Committed);
        assert_eq!(g.stable(), Some(103.0));
    }

    #[test]
    fn spike_is_rejected_and_stable_kept() {
        let mut g = gate();
        g.offer(100.0);
        // threshold = max(15, 0.15 * 100) = 15; deviation 100
        assert_eq!(g.offer(200.0), GateDecision::Rejected);
        assert!(g.offer(200.0).is_outlier());
        assert_eq!(g.stable(), Some(100.0));
    }

    #[test]
    fn mid_band_holds_without_outlier_flag() {
        let mut g = gate();
        g.offer(100.0);
        // deviation 10: below the 15 g floor, above the 5 g commit band
        let d = g.offer(110.0);
        assert_eq!(d, GateDecision::Held);
        assert!(!d.is_outlier());
        assert_eq!(g.stable(), Some(100.0));
    }

    #[rstest]
    #[case(1000.0, 1150.0)] // relative band dominates: 0.15 * 1000
    #[case(20.0, 35.0)] // absolute floor dominates: 15 > 0.15 * 20
    fn threshold_is_max_of_floor_and_fraction(#[case] stable: f64, #[case] spike: f64) {
        let mut g = gate();
        g.offer(stable);
        assert_eq!(g.offer(spike), GateDecision::Rejected);
    }

    #[test]
    fn stable_tracks_filtered_under_small_deltas() {
        let mut g = gate();
        let mut x = 100.0;
        g.offer(x);
        for _ in 0..20 {
            x += 2.0;
            assert_eq!(g.offer(x), GateDecision::Committed);
            assert_eq!(g.stable(), Some(x));
        }
    }

    #[test]
    fn negative_stable_uses_absolute_magnitude() {
        let mut g = gate();
        g.offer(-200.0);
        // threshold = max(15, 0.15 * 200) = 30; deviation 25 -> held
        assert_eq!(g.offer(-175.0), GateDecision::Held);
        // deviation 35 -> rejected
        assert_eq!(g.offer(-235.0), GateDecision::Rejected);
    }
}
