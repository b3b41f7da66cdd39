//! Synchronous poll loop over a set of channels.
//!
//! One logical thread of control ticks every channel once per period and
//! hands each `Reading` to the caller. Stop is honored at tick boundaries;
//! no in-flight cleanup is needed since reads are atomic per call.

use crate::{BoxedChannel, Reading};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use teststand_traits::clock::Clock;

/// Run the poll loop until `stop` is raised or `max_ticks` completes.
/// Returns the number of completed ticks.
pub fn run_poll_loop<F>(
    channels: &mut [BoxedChannel],
    tick: Duration,
    clock: &dyn Clock,
    stop: &AtomicBool,
    max_ticks: Option<u64>,
    mut on_reading: F,
) -> u64
where
    F: FnMut(u64, &str, &Reading),
{
    tracing::info!(
        channels = channels.len(),
        tick_ms = tick.as_millis() as u64,
        "poll loop start"
    );
    let mut ticks: u64 = 0;
    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!(ticks, "poll loop stopped");
            break;
        }
        for ch in channels.iter_mut() {
            let reading = ch.poll();
            on_reading(ticks, ch.label(), &reading);
        }
        ticks += 1;
        if let Some(max) = max_ticks
            && ticks >= max
        {
            tracing::info!(ticks, "poll loop tick budget reached");
            break;
        }
        clock.sleep(tick);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedSource;
    use crate::{Channel, ChannelCfg, Timeouts};
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use teststand_traits::RawSource;
    use teststand_traits::clock::ManualClock;

    fn boxed_channel(label: &str, vals: Vec<f64>, clock: Arc<ManualClock>) -> BoxedChannel {
        let source: Box<dyn RawSource + Send> = Box::new(ScriptedSource::values(vals));
        Channel::with_clock(
            label,
            source,
            ChannelCfg::default(),
            Timeouts::default(),
            clock,
        )
        .unwrap()
    }

    #[test]
    fn ticks_all_channels_and_counts() {
        let clock = Arc::new(ManualClock::new());
        let mut channels = vec![
            boxed_channel("a", vec![1.0, 2.0, 3.0], clock.clone()),
            boxed_channel("b", vec![10.0, 20.0, 30.0], clock.clone()),
        ];
        let stop = AtomicBool::new(false);
        let mut seen = Vec::new();
        let ticks = run_poll_loop(
            &mut channels,
            Duration::from_millis(10),
            &*clock,
            &stop,
            Some(3),
            |tick, label, r| seen.push((tick, label.to_string(), r.available)),
        );
        assert_eq!(ticks, 3);
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|(_, _, ok)| *ok));
        assert_eq!(seen[0], (0, "a".to_string(), true));
        assert_eq!(seen[5], (2, "b".to_string(), true));
    }

    #[test]
    fn stop_flag_halts_before_first_tick() {
        let clock = Arc::new(ManualClock::new());
        let mut channels = vec![boxed_channel("a", vec![1.0], clock.clone())];
        let stop = AtomicBool::new(true);
        let ticks = run_poll_loop(
            &mut channels,
            Duration::from_millis(10),
            &*clock,
            &stop,
            None,
            |_, _, _| panic!("no readings expected"),
        );
        assert_eq!(ticks, 0);
    }
}
