use std::time::Instant;

use parking_lot::RwLock;
use prometheus::Gauge;
use tracing::debug;

use super::config::TrackerConfig;
use super::error::{Result, TrackerError};
use super::frequency_table::FrequencyTable;
use super::metrics;
use super::snapshot::Snapshot;
use super::top_k_index::TopKIndex;

struct TrackerState {
    table: FrequencyTable,
    index: TopKIndex,
    epoch: u64,
}

/// Thread-safe tracker of the K most frequently recorded keys.
pub struct Tracker {
    state: RwLock<TrackerState>,
    /// Published under the write guard so it never lags behind a reset.
    distinct_keys_gauge: Gauge,
}

impl Tracker {
    /// Create a tracker keeping the top `capacity` keys.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::with_index(TopKIndex::new(capacity)?))
    }

    fn with_index(index: TopKIndex) -> Self {
        Self {
            state: RwLock::new(TrackerState {
                table: FrequencyTable::new(),
                index,
                epoch: 0,
            }),
            distinct_keys_gauge: metrics::DISTINCT_KEYS.clone(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity)
    }

    /// Record one observation of `key`.
    ///
    /// Fails with `InvalidKey` for an empty key and `CountOverflow` if the
    /// counter is exhausted; neither failure mutates state.
    pub fn record(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            metrics::INVALID_KEYS_TOTAL.inc();
            return Err(TrackerError::InvalidKey);
        }

        {
            let mut state = self.state.write();
            let TrackerState { table, index, .. } = &mut *state;

            let new_count = table.increment(key)?;
            if index.contains(key) {
                index.update(key, new_count);
            } else {
                index.try_insert(key, new_count);
            }
            self.distinct_keys_gauge.set(table.len() as f64);
        }

        metrics::RECORDS_TOTAL.inc();
        Ok(())
    }

    /// Keys of the current Top-K, highest count first.
    pub fn snapshot(&self) -> Vec<String> {
        self.snapshot_entries().into_keys()
    }

    /// Current Top-K with counts.
    ///
    /// The read guard is held only while the K slots are copied; ranking
    /// happens after it is released.
    pub fn snapshot_entries(&self) -> Snapshot {
        let started = Instant::now();
        let (epoch, ranked) = {
            let state = self.state.read();
            (state.epoch, state.index.copy_entries())
        };
        let snapshot = Snapshot::new(epoch, ranked);
        metrics::SNAPSHOT_LATENCY_MS.observe(started.elapsed().as_secs_f64() * 1_000.0);
        snapshot
    }

    /// End the current epoch, discarding every count.
    pub fn reset(&self) {
        let mut state = self.state.write();
        let discarded = state.table.len();
        state.table.clear();
        state.index.clear();
        state.epoch += 1;
        let epoch = state.epoch;
        self.distinct_keys_gauge.set(0.0);
        drop(state);

        metrics::RESETS_TOTAL.inc();
        debug!("Tracker reset: epoch {} started, {} keys discarded", epoch, discarded);
    }

    /// Count for `key` in the current epoch.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.state.read().table.get(key)
    }

    /// Distinct keys observed in the current epoch.
    pub fn distinct_keys(&self) -> usize {
        self.state.read().table.len()
    }

    pub fn capacity(&self) -> usize {
        self.state.read().index.capacity()
    }

    pub fn epoch(&self) -> u64 {
        self.state.read().epoch
    }

    #[cfg(test)]
    fn with_gauge(capacity: usize, gauge: Gauge) -> Self {
        let mut tracker = Self::new(capacity).unwrap();
        tracker.distinct_keys_gauge = gauge;
        tracker
    }

    #[cfg(test)]
    pub(crate) fn preload_count(&self, key: &str, count: u64) {
        self.state.write().table.set(key, count);
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let state = self.state.read();
        state.index.assert_heap_invariants();
        assert_eq!(
            state.index.len(),
            state.table.len().min(state.index.capacity())
        );
        for entry in state.index.copy_entries() {
            assert_eq!(state.table.get(&entry.key), Some(entry.count));
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::with_index(TopKIndex::default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
