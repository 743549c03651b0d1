// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interval index over inclusive frame ranges.
//!
//! Entries are `(interval, key)` pairs. A pair is unique, but many keys may
//! share an interval. There is no update primitive: an entry whose range
//! changes must be removed with its old range and inserted again.

use crate::models::track::Frame;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive `[begin, end]` frame range.
pub type Interval = (Frame, Frame);

/// Range-keyed membership structure supporting overlap queries.
#[derive(Debug, Clone)]
pub struct IntervalTree<K> {
    entries: BTreeMap<Interval, BTreeSet<K>>,
    /// Widest `end - begin` seen since the tree was last empty. Bounds how far
    /// left of a query an overlapping interval can start.
    max_span: Frame,
    len: usize,
}

impl<K: Ord + Clone> Default for IntervalTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> IntervalTree<K> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            max_span: 0,
            len: 0,
        }
    }

    /// Number of `(interval, key)` entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add `key` under `interval`. Inserting an existing pair is a no-op.
    pub fn insert(&mut self, interval: Interval, key: K) {
        debug_assert!(interval.0 <= interval.1, "interval begin exceeds end");
        if self.entries.entry(interval).or_default().insert(key) {
            self.len += 1;
            self.max_span = self.max_span.max(interval.1 - interval.0);
        }
    }

    /// Remove the exact `(interval, key)` pair.
    ///
    /// Returns `false` when the pair is not present, including when `key` is
    /// stored under a different interval.
    pub fn remove(&mut self, interval: Interval, key: &K) -> bool {
        let Some(keys) = self.entries.get_mut(&interval) else {
            return false;
        };
        if !keys.remove(key) {
            return false;
        }
        if keys.is_empty() {
            self.entries.remove(&interval);
        }
        self.len -= 1;
        if self.len == 0 {
            self.max_span = 0;
        }
        true
    }

    /// Keys whose interval overlaps `[begin, end]`, both ends inclusive.
    ///
    /// Results are ordered by interval, then by key.
    pub fn search(&self, begin: Frame, end: Frame) -> Vec<K> {
        let (begin, end) = if begin <= end { (begin, end) } else { (end, begin) };
        let lower = begin.saturating_sub(self.max_span);
        self.entries
            .range((lower, 0)..=(end, Frame::MAX))
            .filter(|((_, stored_end), _)| *stored_end >= begin)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Keys whose interval contains `frame`.
    pub fn search_point(&self, frame: Frame) -> Vec<K> {
        self.search(frame, frame)
    }

    /// Whether the exact `(interval, key)` pair is stored.
    #[cfg(test)]
    fn contains(&self, interval: Interval, key: &K) -> bool {
        self.entries
            .get(&interval)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Iterate every entry in interval order.
    pub fn iter(&self) -> impl Iterator<Item = (Interval, &K)> + '_ {
        self.entries
            .iter()
            .flat_map(|(interval, keys)| keys.iter().map(move |key| (*interval, key)))
    }
}
