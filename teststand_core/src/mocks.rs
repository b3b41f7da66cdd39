//! Test and helper mocks for teststand_core

use std::collections::VecDeque;
use std::time::Duration;

/// A raw source that always errors on read; useful when driving a channel
/// with externally sampled values via `sample_from_raw`.
pub struct NoopSource;

impl teststand_traits::RawSource for NoopSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop source")))
    }
}

/// One scripted poll-cycle outcome.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Value(f64),
    Unavailable,
}

/// Replays a prepared sequence of readings, then repeats the last value.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    last: f64,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            last: 0.0,
        }
    }

    /// Convenience: a script of plain values only.
    pub fn values(vals: impl IntoIterator<Item = f64>) -> Self {
        Self::new(vals.into_iter().map(Step::Value))
    }
}

impl teststand_traits::RawSource for ScriptedSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        match self.steps.pop_front() {
            Some(Step::Value(v)) => {
                self.last = v;
                Ok(v)
            }
            Some(Step::Unavailable) => Err(Box::new(std::io::Error::other("scripted dropout"))),
            None => Ok(self.last),
        }
    }
}
