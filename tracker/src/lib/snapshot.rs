use serde::{Deserialize, Serialize};

/// A key and its observation count as published to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub key: String,
    pub count: u64,
}

/// Raw copy of an index slot, taken while the tracker lock is held.
///
/// `admitted` is the admission sequence number and only used to order ties.
#[derive(Debug, Clone)]
pub(crate) struct RankedEntry {
    pub(crate) key: String,
    pub(crate) count: u64,
    pub(crate) admitted: u64,
}

/// Point-in-time view of the Top-K, ordered by descending count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub epoch: u64,
    pub entries: Vec<AccessEntry>,
}

impl Snapshot {
    pub(crate) fn new(epoch: u64, ranked: Vec<RankedEntry>) -> Self {
        Self {
            epoch,
            entries: rank(ranked),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.entries.into_iter().map(|e| e.key).collect()
    }
}

/// Sort by count descending, earlier admission first among equal counts.
pub(crate) fn rank(mut ranked: Vec<RankedEntry>) -> Vec<AccessEntry> {
    ranked.sort_unstable_by(|a, b| b.count.cmp(&a.count).then(a.admitted.cmp(&b.admitted)));
    ranked
        .into_iter()
        .map(|RankedEntry { key, count, .. }| AccessEntry { key, count })
        .collect()
}
