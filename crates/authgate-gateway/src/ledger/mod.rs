//! Bounded in-memory ledgers (audit decisions, HTTP traffic).
//!
//! Both ledgers share one discipline: FIFO eviction at a fixed capacity,
//! writes serialized behind a mutex, reads served from a copied snapshot so
//! concurrent appends never produce a torn view.

pub mod audit;
pub mod demo;
pub mod traffic;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

pub use audit::{AuditFilter, AuditLedger, AuditLogEntry, AuditStats};
pub use traffic::{TrafficFilter, TrafficLedger, TrafficLogEntry, TrafficStats};

pub const DEFAULT_CAPACITY: usize = 1000;
/// Size of "top N" rollups.
pub const TOP_N: usize = 10;

/// Fixed-capacity ring buffer with a monotonically increasing sequence.
pub struct BoundedLog<T> {
    capacity: usize,
    entries: Mutex<VecDeque<T>>,
    seq: AtomicU64,
}

impl<T: Clone> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            seq: AtomicU64::new(0),
        }
    }

    /// Append; returns the evicted oldest entry when the log was full.
    pub fn push(&self, entry: T) -> Option<T> {
        let mut g = self.lock();
        let evicted = if g.len() >= self.capacity {
            g.pop_front()
        } else {
            None
        };
        g.push_back(entry);
        evicted
    }

    /// Build and append under one lock, so sequence numbers and anything
    /// stamped inside `build` follow queue order.
    pub fn push_with<F>(&self, build: F) -> Option<T>
    where
        F: FnOnce(u64) -> T,
    {
        let mut g = self.lock();
        let entry = build(self.next_seq());
        let evicted = if g.len() >= self.capacity {
            g.pop_front()
        } else {
            None
        };
        g.push_back(entry);
        evicted
    }

    /// Copy of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Next sequence number (never reused, survives eviction).
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    // A poisoned lock only means a writer panicked mid-push; the deque itself
    // is still structurally valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `<prefix>_<seq>_<YYYYmmdd_HHMMSS>`
pub fn entry_id(prefix: &str, seq: u64, at: &DateTime<Utc>) -> String {
    format!("{prefix}_{seq}_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Newest first. Snapshot order is insertion order, so reversing before the
/// stable sort puts the most recently inserted entry first among equal timestamps.
pub(crate) fn newest_first<T, F>(mut entries: Vec<T>, ts: F, limit: usize) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    entries.reverse();
    entries.sort_by(|a, b| ts(b).cmp(&ts(a)));
    entries.truncate(limit);
    entries
}

/// Frequency ranking, descending. Ties keep first-encountered order.
pub(crate) fn rank_by_count<'a, I>(keys: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<(&'a str, u64)> = Vec::new();
    for k in keys {
        match index.get(k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(k, counts.len());
                counts.push((k, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect()
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percentage rounded to 2 decimals; 0 for an empty denominator.
pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

/// Case-insensitive substring match; an empty needle matches everything.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_keeps_first_seen_order_on_ties() {
        let ranked = rank_by_count(["b", "a", "c", "a", "b", "d"]);
        let keys: Vec<_> = ranked.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c", "d"]);
        assert_eq!(ranked[0].1, 2);
    }

    #[test]
    fn push_evicts_oldest() {
        let log = BoundedLog::new(2);
        assert_eq!(log.push(1), None);
        assert_eq!(log.push(2), None);
        assert_eq!(log.push(3), Some(1));
        assert_eq!(log.snapshot(), vec![2, 3]);
    }

    #[test]
    fn push_with_numbers_in_queue_order() {
        let log = BoundedLog::new(2);
        log.push_with(|seq| seq);
        log.push_with(|seq| seq);
        assert_eq!(log.push_with(|seq| seq), Some(0));
        assert_eq!(log.snapshot(), vec![1, 2]);
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
    }
}
