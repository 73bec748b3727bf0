use crate::core::records::TrialBatch;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

// A worker that panics mid-merge must not wedge the merges of the remaining
// workers; the dispatcher reports the panic after the round has joined.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sum-merge: on key collision the incoming value is added to the existing
/// one; new keys are inserted as-is.
pub fn merge_sum<K>(target: &Mutex<HashMap<K, u64>>, incoming: &HashMap<K, u64>)
where
    K: Eq + Hash + Clone,
{
    let mut guard = lock(target);
    for (key, value) in incoming {
        *guard.entry(key.clone()).or_insert(0) += value;
    }
}

/// First-write-wins merge: existing entries are kept untouched; only new keys
/// are inserted.
pub fn merge_first_write<K, V>(target: &Mutex<HashMap<K, V>>, incoming: &HashMap<K, V>)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let mut guard = lock(target);
    for (key, value) in incoming {
        guard.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

/// Binary-increment merge: every key whose incoming value is positive counts
/// as one occurrence; zero-valued entries are skipped entirely.
pub fn merge_binary<K>(target: &Mutex<HashMap<K, u64>>, incoming: &HashMap<K, u64>)
where
    K: Eq + Hash + Clone,
{
    let mut guard = lock(target);
    for (key, value) in incoming {
        if *value > 0 {
            *guard.entry(key.clone()).or_insert(0) += 1;
        }
    }
}

/// Append-merge: all incoming elements are appended in order. Entries already
/// merged are never reordered.
pub fn merge_append<T: Clone>(target: &Mutex<Vec<T>>, incoming: &[T]) {
    let mut guard = lock(target);
    guard.extend_from_slice(incoming);
}

/// Scalar accumulator merge.
pub fn merge_add_count(target: &Mutex<u64>, amount: u64) {
    *lock(target) += amount;
}

/// One worker's private partial analysis of its own trial batch. Workers fill
/// this freely without any locking; the aggregator folds it into the shared
/// totals afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisPartial {
    /// Per-position occupancy counts, sum-merged.
    pub position_counts: HashMap<String, u64>,
    /// Per-structure-fingerprint counts; the shared structure map keeps the
    /// first observation, while the binary map counts workers that saw the
    /// fingerprint at all.
    pub structure_counts: HashMap<String, u64>,
    /// Per-index structure counts, sum-merged slot by slot.
    pub indexed_counts: Vec<HashMap<String, u64>>,
    /// Scalar path properties, append-merged.
    pub path_properties: Vec<f64>,
    /// Number of trajectories this partial covers.
    pub path_count: u64,
}

/// Computes a private [`AnalysisPartial`] from one worker's batch. The
/// auxiliary analysis step of a dispatch run; optional.
pub trait TrialAnalyzer: Send + Sync {
    fn analyze(&self, batch: &TrialBatch) -> AnalysisPartial;
}

/// The shared analysis accumulators for one dispatch run.
///
/// Created empty when the dispatcher is built, mutated only through
/// [`SharedAnalysisMaps::merge_partial`] while workers are running, and read
/// through the snapshot accessors after the round has joined. Every structure
/// carries its own lock so merges into unrelated structures never serialize
/// each other; no operation spans two locks, so cross-structure totals are
/// consistent only after the join barrier.
#[derive(Debug, Default)]
pub struct SharedAnalysisMaps {
    position_counts: Mutex<HashMap<String, u64>>,
    structure_counts: Mutex<HashMap<String, u64>>,
    binary_counts: Mutex<HashMap<String, u64>>,
    indexed_counts: Vec<Mutex<HashMap<String, u64>>>,
    path_properties: Mutex<Vec<f64>>,
    path_count: Mutex<u64>,
}

impl SharedAnalysisMaps {
    pub fn new(indexed_slots: usize) -> Self {
        Self {
            indexed_counts: (0..indexed_slots).map(|_| Mutex::default()).collect(),
            ..Self::default()
        }
    }

    pub fn indexed_slots(&self) -> usize {
        self.indexed_counts.len()
    }

    /// Folds one worker's partial into the shared totals, one policy per
    /// structure. Partial slots beyond the configured indexed capacity are
    /// dropped.
    pub fn merge_partial(&self, partial: &AnalysisPartial) {
        merge_sum(&self.position_counts, &partial.position_counts);
        merge_first_write(&self.structure_counts, &partial.structure_counts);
        merge_binary(&self.binary_counts, &partial.structure_counts);
        for (slot, incoming) in self.indexed_counts.iter().zip(&partial.indexed_counts) {
            merge_sum(slot, incoming);
        }
        merge_append(&self.path_properties, &partial.path_properties);
        merge_add_count(&self.path_count, partial.path_count);
    }

    pub fn position_counts(&self) -> HashMap<String, u64> {
        lock(&self.position_counts).clone()
    }

    pub fn structure_counts(&self) -> HashMap<String, u64> {
        lock(&self.structure_counts).clone()
    }

    pub fn binary_counts(&self) -> HashMap<String, u64> {
        lock(&self.binary_counts).clone()
    }

    pub fn indexed_counts(&self, slot: usize) -> Option<HashMap<String, u64>> {
        self.indexed_counts.get(slot).map(|m| lock(m).clone())
    }

    pub fn path_properties(&self) -> Vec<f64> {
        lock(&self.path_properties).clone()
    }

    pub fn path_count(&self) -> u64 {
        *lock(&self.path_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn map(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn sum_merge_adds_on_collision_and_inserts_new_keys() {
        let target = Mutex::new(map(&[("a", 2)]));
        merge_sum(&target, &map(&[("a", 3), ("b", 1)]));
        assert_eq!(*target.lock().unwrap(), map(&[("a", 5), ("b", 1)]));
    }

    #[test]
    fn first_write_merge_keeps_existing_values() {
        let target = Mutex::new(map(&[("a", 2)]));
        merge_first_write(&target, &map(&[("a", 9), ("b", 1)]));
        assert_eq!(*target.lock().unwrap(), map(&[("a", 2), ("b", 1)]));
    }

    #[test]
    fn binary_merge_counts_occurrences_and_skips_zero_values() {
        let target = Mutex::new(HashMap::new());
        merge_binary(&target, &map(&[("seen", 7), ("unseen", 0)]));
        merge_binary(&target, &map(&[("seen", 1)]));
        assert_eq!(*target.lock().unwrap(), map(&[("seen", 2)]));
    }

    #[test]
    fn append_merge_preserves_order_of_merged_entries() {
        let target = Mutex::new(vec![1.0]);
        merge_append(&target, &[2.0, 3.0]);
        assert_eq!(*target.lock().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn merge_partial_feeds_every_structure() {
        let maps = SharedAnalysisMaps::new(2);
        let partial = AnalysisPartial {
            position_counts: map(&[("0", 4)]),
            structure_counts: map(&[("(((+)))", 3)]),
            indexed_counts: vec![map(&[("x", 1)]), map(&[("y", 2)])],
            path_properties: vec![0.5],
            path_count: 3,
        };

        maps.merge_partial(&partial);
        maps.merge_partial(&partial);

        assert_eq!(maps.position_counts(), map(&[("0", 8)]));
        assert_eq!(maps.structure_counts(), map(&[("(((+)))", 3)]));
        assert_eq!(maps.binary_counts(), map(&[("(((+)))", 2)]));
        assert_eq!(maps.indexed_counts(0), Some(map(&[("x", 2)])));
        assert_eq!(maps.indexed_counts(1), Some(map(&[("y", 4)])));
        assert_eq!(maps.path_properties(), vec![0.5, 0.5]);
        assert_eq!(maps.path_count(), 6);
    }

    #[test]
    fn concurrent_merges_lose_nothing() {
        let maps = SharedAnalysisMaps::new(1);
        let workers = 8;
        let merges_per_worker = 50;

        thread::scope(|scope| {
            for worker in 0..workers {
                let maps = &maps;
                scope.spawn(move || {
                    let partial = AnalysisPartial {
                        position_counts: map(&[("shared", 1)]),
                        structure_counts: map(&[(&format!("w{worker}"), 1)]),
                        indexed_counts: vec![map(&[("slot", 1)])],
                        path_properties: vec![worker as f64],
                        path_count: 1,
                    };
                    for _ in 0..merges_per_worker {
                        maps.merge_partial(&partial);
                    }
                });
            }
        });

        let total = (workers * merges_per_worker) as u64;
        assert_eq!(maps.position_counts()["shared"], total);
        assert_eq!(maps.indexed_counts(0).unwrap()["slot"], total);
        assert_eq!(maps.path_properties().len(), total as usize);
        assert_eq!(maps.path_count(), total);
        // One first-write entry per worker, each seen merges_per_worker times.
        assert_eq!(maps.structure_counts().len(), workers);
        for worker in 0..workers {
            assert_eq!(maps.binary_counts()[&format!("w{worker}")], merges_per_worker as u64);
        }
    }
}
