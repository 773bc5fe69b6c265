use std::collections::HashMap;

use super::error::{Result, TrackerError};

/// Unbounded map of key -> observation count for the current epoch.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the count for `key` and return the new value.
    ///
    /// A key seen for the first time starts at 1. On overflow the stored
    /// count is left untouched.
    pub fn increment(&mut self, key: &str) -> Result<u64> {
        // Avoid allocating an owned key on the hot path for keys already seen.
        if let Some(count) = self.counts.get_mut(key) {
            *count = count.checked_add(1).ok_or_else(|| TrackerError::CountOverflow {
                key: key.to_owned(),
            })?;
            return Ok(*count);
        }
        self.counts.insert(key.to_owned(), 1);
        Ok(1)
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, key: &str, count: u64) {
        self.counts.insert(key.to_owned(), count);
    }
}
