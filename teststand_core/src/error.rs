use thiserror::Error;

/// Why a raw reading produced no data this cycle. Never fatal; the channel
/// freezes its state and resumes on the next good reading.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableKind {
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("sensor fault")]
    Fault,
    #[error("non-finite reading")]
    NonFinite,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
