// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Track enablement by type and confidence.
//!
//! A track is enabled when one of its confidence pairs has a checked label
//! and a score at or above that label's threshold. The first such pair
//! becomes the track's active classification.

use crate::models::track::Track;
use crate::store::TrackHandle;
use std::collections::{BTreeSet, HashMap};

/// Per-track render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackContext {
    /// Index of the active confidence pair.
    pub confidence_pair_index: usize,
}

/// An enabled track and its render context.
#[derive(Debug, Clone)]
pub struct TrackWithContext {
    pub track: TrackHandle,
    pub context: TrackContext,
}

/// Which types are shown and how confident a pair must be to count.
#[derive(Debug, Clone, Default)]
pub struct TrackFilter {
    /// `None` checks every type.
    pub checked_types: Option<BTreeSet<String>>,
    pub default_threshold: f64,
    /// Per-type thresholds. The effective threshold is the larger of this and
    /// `default_threshold`.
    pub type_thresholds: HashMap<String, f64>,
}

impl TrackFilter {
    pub fn new(default_threshold: f64) -> Self {
        Self {
            default_threshold,
            ..Self::default()
        }
    }

    /// Restrict enablement to the given types.
    pub fn with_checked_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checked_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_type_threshold(mut self, label: impl Into<String>, threshold: f64) -> Self {
        self.type_thresholds.insert(label.into(), threshold);
        self
    }

    pub fn is_checked(&self, label: &str) -> bool {
        self.checked_types
            .as_ref()
            .map_or(true, |checked| checked.contains(label))
    }

    pub fn threshold_for(&self, label: &str) -> f64 {
        self.type_thresholds
            .get(label)
            .copied()
            .unwrap_or(0.0)
            .max(self.default_threshold)
    }

    /// Index of the first confidence pair passing the filter.
    pub fn confidence_pair_index(&self, track: &Track) -> Option<usize> {
        track
            .confidence_pairs()
            .iter()
            .position(|(label, score)| *score >= self.threshold_for(label) && self.is_checked(label))
    }
}

/// Tracks passing `filter`, in the order given.
pub fn enabled_tracks(tracks: &[TrackHandle], filter: &TrackFilter) -> Vec<TrackWithContext> {
    tracks
        .iter()
        .filter_map(|track| {
            let index = filter.confidence_pair_index(&track.borrow())?;
            Some(TrackWithContext {
                track: track.clone(),
                context: TrackContext {
                    confidence_pair_index: index,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn handle(id: u32, pairs: &[(&str, f64)]) -> TrackHandle {
        let pairs = pairs.iter().map(|(l, s)| (l.to_string(), *s)).collect();
        Rc::new(RefCell::new(Track::new(id, 0, 0, pairs).unwrap()))
    }

    #[test]
    fn test_first_passing_pair_is_active() {
        let tracks = vec![handle(0, &[("fish", 0.9), ("crab", 0.6)])];
        let filter = TrackFilter::new(0.1).with_checked_types(["crab"]);

        let enabled = enabled_tracks(&tracks, &filter);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].context.confidence_pair_index, 1);
    }

    #[test]
    fn test_thresholds_take_the_larger_value() {
        let filter = TrackFilter::new(0.3).with_type_threshold("fish", 0.8);
        assert_eq!(filter.threshold_for("fish"), 0.8);
        assert_eq!(filter.threshold_for("crab"), 0.3);

        let tracks = vec![
            handle(0, &[("fish", 0.5)]),
            handle(1, &[("crab", 0.5)]),
            handle(2, &[]),
        ];
        let enabled = enabled_tracks(&tracks, &filter);
        let ids: Vec<u32> = enabled.iter().map(|t| t.track.borrow().track_id()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_unfiltered_checks_everything() {
        let filter = TrackFilter::default();
        assert!(filter.is_checked("anything"));
        let tracks = vec![handle(0, &[("eel", 0.0)])];
        assert_eq!(enabled_tracks(&tracks, &filter).len(), 1);
    }
}
