pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One physical sensor's raw-reading provider.
///
/// Implementations return an already-calibrated, already-averaged scalar
/// (grams for weight channels). A failed read is a transient condition the
/// caller treats as "no data this cycle", never as fatal.
pub trait RawSource {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: RawSource + ?Sized> RawSource for Box<T> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
