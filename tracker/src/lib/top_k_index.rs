use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use super::config::DEFAULT_CAPACITY;
use super::error::{Result, TrackerError};
use super::snapshot::{rank, AccessEntry, RankedEntry};

#[derive(Debug, Clone)]
struct HeapEntry {
    key: String,
    count: u64,
    admitted: u64,
}

impl HeapEntry {
    /// Heap order: lower count first, and among equal counts the most
    /// recently admitted entry first. The root is always the entry that
    /// ranks last in a snapshot.
    fn heap_cmp(&self, other: &Self) -> Ordering {
        (self.count, Reverse(self.admitted)).cmp(&(other.count, Reverse(other.admitted)))
    }
}

/// Bounded, addressable min-heap holding the K highest counts.
///
/// `positions` maps every indexed key to its slot in `heap`, so membership
/// checks are O(1) and count bumps are fixed up in O(log K) without
/// touching the rest of the key population.
#[derive(Debug)]
pub struct TopKIndex {
    capacity: usize,
    heap: Vec<HeapEntry>,
    positions: HashMap<String, usize>,
    next_admission: u64,
}

impl TopKIndex {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrackerError::InvalidCapacity(capacity));
        }
        Ok(Self::with_valid_capacity(capacity))
    }

    fn with_valid_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            heap: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            next_admission: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        self.positions.get(key).map(|&pos| self.heap[pos].count)
    }

    /// Smallest count currently indexed.
    pub fn min_count(&self) -> Option<u64> {
        self.heap.first().map(|e| e.count)
    }

    /// Set the count of an already indexed key. Returns `false` if the key
    /// is not indexed.
    ///
    /// Counts only grow, so the entry can only move toward the leaves.
    pub fn update(&mut self, key: &str, new_count: u64) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        debug_assert!(new_count >= self.heap[pos].count);
        self.heap[pos].count = new_count;
        self.sift_down(pos);
        true
    }

    /// Offer a key that is not yet indexed. Returns `true` if it was admitted.
    ///
    /// When the index is full the candidate must strictly beat the current
    /// minimum; on a tie the incumbent stays.
    pub fn try_insert(&mut self, key: &str, new_count: u64) -> bool {
        debug_assert!(!self.contains(key));

        if self.heap.len() < self.capacity {
            let pos = self.heap.len();
            let entry = self.admit(key, new_count);
            self.heap.push(entry);
            self.positions.insert(key.to_owned(), pos);
            self.sift_up(pos);
            return true;
        }

        let beats_min = self.heap.first().is_some_and(|root| new_count > root.count);
        if !beats_min {
            return false;
        }

        let entry = self.admit(key, new_count);
        let evicted = std::mem::replace(&mut self.heap[0], entry);
        self.positions.remove(&evicted.key);
        self.positions.insert(key.to_owned(), 0);
        self.sift_down(0);
        true
    }

    /// Unordered copy of every slot. O(K).
    pub(crate) fn copy_entries(&self) -> Vec<RankedEntry> {
        self.heap
            .iter()
            .map(|e| RankedEntry {
                key: e.key.clone(),
                count: e.count,
                admitted: e.admitted,
            })
            .collect()
    }

    /// Entries sorted by count descending, ties by admission order.
    pub fn snapshot_entries(&self) -> Vec<AccessEntry> {
        rank(self.copy_entries())
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
        self.next_admission = 0;
    }

    // ---- private helpers ----

    fn admit(&mut self, key: &str, count: u64) -> HeapEntry {
        let admitted = self.next_admission;
        self.next_admission += 1;
        HeapEntry {
            key: key.to_owned(),
            count,
            admitted,
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].heap_cmp(&self.heap[parent]) == Ordering::Less {
                self.swap_slots(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.heap[left].heap_cmp(&self.heap[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && self.heap[right].heap_cmp(&self.heap[smallest]) == Ordering::Less {
                smallest = right;
            }
            if smallest == pos {
                break;
            }

            self.swap_slots(pos, smallest);
            pos = smallest;
        }
    }

    fn swap_slots(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        if let Some(slot) = self.positions.get_mut(&self.heap[i].key) {
            *slot = i;
        }
        if let Some(slot) = self.positions.get_mut(&self.heap[j].key) {
            *slot = j;
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_heap_invariants(&self) {
        assert_eq!(self.heap.len(), self.positions.len());
        assert!(self.heap.len() <= self.capacity);
        for (pos, entry) in self.heap.iter().enumerate() {
            assert_eq!(self.positions.get(&entry.key), Some(&pos));
            if pos > 0 {
                let parent = &self.heap[(pos - 1) / 2];
                assert_ne!(entry.heap_cmp(parent), Ordering::Less, "heap order broken at {pos}");
            }
        }
    }
}

impl Default for TopKIndex {
    fn default() -> Self {
        Self::with_valid_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(index: &TopKIndex) -> Vec<String> {
        index.snapshot_entries().into_iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            TopKIndex::new(0).unwrap_err(),
            TrackerError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_insert_until_full() {
        let mut index = TopKIndex::new(3).unwrap();
        assert!(index.try_insert("a", 5));
        assert!(index.try_insert("b", 2));
        assert!(index.try_insert("c", 8));
        index.assert_heap_invariants();

        assert_eq!(index.len(), 3);
        assert_eq!(index.min_count(), Some(2));
        assert_eq!(keys(&index), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_evicts_minimum_when_beaten() {
        let mut index = TopKIndex::new(3).unwrap();
        index.try_insert("a", 5);
        index.try_insert("b", 2);
        index.try_insert("c", 8);

        assert!(index.try_insert("d", 3));
        index.assert_heap_invariants();

        assert!(!index.contains("b"));
        assert_eq!(index.count("d"), Some(3));
        assert_eq!(keys(&index), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_incumbent_wins_tie() {
        let mut index = TopKIndex::new(2).unwrap();
        index.try_insert("a", 4);
        index.try_insert("b", 2);

        assert!(!index.try_insert("c", 2));
        assert!(index.contains("b"));
        assert!(!index.contains("c"));
    }

    #[test]
    fn test_lower_candidate_ignored() {
        let mut index = TopKIndex::new(2).unwrap();
        index.try_insert("a", 4);
        index.try_insert("b", 3);

        assert!(!index.try_insert("c", 1));
        assert_eq!(keys(&index), vec!["a", "b"]);
    }

    #[test]
    fn test_update_sifts_down() {
        let mut index = TopKIndex::new(4).unwrap();
        for (key, count) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            index.try_insert(key, count);
        }
        assert_eq!(index.min_count(), Some(1));

        assert!(index.update("a", 10));
        index.assert_heap_invariants();

        assert_eq!(index.min_count(), Some(2));
        assert_eq!(keys(&index), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn test_update_unknown_key() {
        let mut index = TopKIndex::new(2).unwrap();
        assert!(!index.update("ghost", 3));
        assert!(index.is_empty());
    }

    #[test]
    fn test_ties_rank_by_admission() {
        let mut index = TopKIndex::new(5).unwrap();
        for key in ["first", "second", "third"] {
            index.try_insert(key, 1);
        }
        assert_eq!(keys(&index), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_tied_eviction_drops_latest_admitted() {
        let mut index = TopKIndex::new(3).unwrap();
        index.try_insert("old", 1);
        index.try_insert("mid", 1);
        index.try_insert("new", 1);

        assert!(index.try_insert("winner", 2));
        index.assert_heap_invariants();
        assert_eq!(keys(&index), vec!["winner", "old", "mid"]);
    }

    #[test]
    fn test_clear_restarts_admission() {
        let mut index = TopKIndex::new(3).unwrap();
        index.try_insert("a", 1);
        index.try_insert("b", 1);
        index.clear();

        assert!(index.is_empty());
        assert!(!index.contains("a"));
        assert_eq!(index.min_count(), None);

        index.try_insert("b", 1);
        index.try_insert("a", 1);
        assert_eq!(keys(&index), vec!["b", "a"]);
    }

    #[test]
    fn test_heap_invariants_under_churn() {
        let mut index = TopKIndex::new(8).unwrap();
        let mut counts: HashMap<String, u64> = HashMap::new();

        // Deterministic pseudo-random key stream over 40 keys
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..5_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let key = format!("k{}", state % 40);
            let count = counts.entry(key.clone()).or_insert(0);
            *count += 1;

            if index.contains(&key) {
                index.update(&key, *count);
            } else {
                index.try_insert(&key, *count);
            }
            index.assert_heap_invariants();
        }

        let min = index.min_count().unwrap();
        for (key, count) in &counts {
            match index.count(key) {
                Some(indexed) => assert_eq!(indexed, *count),
                None => assert!(*count <= min, "{key} with {count} missing, min {min}"),
            }
        }
    }
}
