use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Result, TrackerError};

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Tracker settings. Defaults match the dashboard's Top-100 view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of keys kept in the Top-K index.
    pub capacity: usize,
    /// Bound on pending commands in the record queue.
    pub queue_capacity: usize,
    /// Period of automatic epoch resets. `None` disables them.
    pub reset_interval: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            reset_interval: None,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `TRACKER_CAPACITY`, `TRACKER_QUEUE_CAPACITY`
    /// and `TRACKER_RESET_INTERVAL_SECS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(capacity) = parse_var::<usize>(&lookup, "TRACKER_CAPACITY")? {
            config.capacity = capacity;
        }
        if let Some(queue_capacity) = parse_var::<usize>(&lookup, "TRACKER_QUEUE_CAPACITY")? {
            config.queue_capacity = queue_capacity;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "TRACKER_RESET_INTERVAL_SECS")? {
            // 0 disables the scheduler
            config.reset_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(TrackerError::InvalidCapacity(self.capacity));
        }
        if self.queue_capacity == 0 {
            return Err(TrackerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| TrackerError::Config(format!("{name}={raw:?}: {e}"))),
    }
}
