use thiserror::Error;

/// Errors surfaced by the tracker and its record queue.
///
/// None of these are retried internally. They are contract violations or
/// back-pressure signals that the caller decides how to handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The key was empty.
    #[error("invalid key: keys must be non-empty")]
    InvalidKey,

    /// A counter would exceed `u64::MAX`.
    #[error("count overflow for key '{key}'")]
    CountOverflow { key: String },

    /// A Top-K index cannot hold zero entries.
    #[error("invalid capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// The record queue is at capacity.
    #[error("record queue is full")]
    QueueFull,

    /// The record queue consumer has stopped.
    #[error("record queue is closed")]
    QueueClosed,

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
