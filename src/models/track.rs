// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Track data structures.
//!
//! A track is an annotated object trajectory across an inclusive frame range.
//! All mutation goes through `Track`'s own methods, each of which notifies
//! every subscriber synchronously before returning.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type TrackId = u32;
pub type Frame = u32;

/// Inclusive `(begin, end)` frame range of a track.
pub type Bounds = (Frame, Frame);

/// A `(label, score)` classification candidate.
pub type ConfidencePair = (String, f64);

/// Per-frame feature data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub frame: Frame,
    /// Box as `[x1, y1, x2, y2]` in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
    /// Explicitly annotated, as opposed to interpolated.
    #[serde(default)]
    pub keyframe: bool,
    /// Interpolate from this keyframe to the next one.
    #[serde(default)]
    pub interpolate: bool,
}

impl Feature {
    /// Create a keyframe feature with no interpolation.
    pub fn keyframe(frame: Frame, bounds: Option<[f64; 4]>) -> Self {
        Self {
            frame,
            bounds,
            keyframe: true,
            interpolate: false,
        }
    }
}

/// Plain, serializable snapshot of a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackData {
    pub track_id: TrackId,
    pub begin: Frame,
    pub end: Frame,
    pub confidence_pairs: Vec<ConfidencePair>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Kind of change delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackChange {
    /// `begin` or `end` moved. Carries the range before the change.
    Bounds { previous: Bounds },
    /// A feature was set, deleted or had its flags changed.
    Feature { frame: Frame },
    ConfidencePairs,
    Attributes,
}

/// Handle returned by [`Track::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Track, &TrackChange) -> Result<()>>;

/// A temporally bounded annotated entity.
pub struct Track {
    track_id: TrackId,
    begin: Frame,
    end: Frame,
    confidence_pairs: Vec<ConfidencePair>,
    features: BTreeMap<Frame, Feature>,
    /// Sorted frames holding keyframe features. Every entry is a key of `features`.
    feature_index: Vec<Frame>,
    attributes: BTreeMap<String, serde_json::Value>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("track_id", &self.track_id)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("confidence_pairs", &self.confidence_pairs)
            .field("feature_index", &self.feature_index)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Track {
    /// Create a track with no features.
    pub fn new(
        track_id: TrackId,
        begin: Frame,
        end: Frame,
        confidence_pairs: Vec<ConfidencePair>,
    ) -> Result<Self> {
        if begin > end {
            return Err(Error::InvalidBounds { begin, end });
        }
        Ok(Self {
            track_id,
            begin,
            end,
            confidence_pairs: sorted_pairs(confidence_pairs)?,
            features: BTreeMap::new(),
            feature_index: Vec::new(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Rebuild a track from a snapshot. Subscribers are not carried over.
    pub fn from_data(data: TrackData) -> Result<Self> {
        let mut track = Self::new(data.track_id, data.begin, data.end, data.confidence_pairs)?;
        for feature in data.features {
            if feature.keyframe {
                track.index_frame(feature.frame);
            }
            track.features.insert(feature.frame, feature);
        }
        track.attributes = data.attributes;
        Ok(track)
    }

    /// Snapshot the current state.
    pub fn to_data(&self) -> TrackData {
        TrackData {
            track_id: self.track_id,
            begin: self.begin,
            end: self.end,
            confidence_pairs: self.confidence_pairs.clone(),
            features: self.features.values().cloned().collect(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn begin(&self) -> Frame {
        self.begin
    }

    pub fn end(&self) -> Frame {
        self.end
    }

    pub fn bounds(&self) -> Bounds {
        (self.begin, self.end)
    }

    /// Confidence pairs, highest score first.
    pub fn confidence_pairs(&self) -> &[ConfidencePair] {
        &self.confidence_pairs
    }

    pub fn features(&self) -> &BTreeMap<Frame, Feature> {
        &self.features
    }

    pub fn feature(&self, frame: Frame) -> Option<&Feature> {
        self.features.get(&frame)
    }

    /// Frames holding explicit keyframe features, ascending.
    pub fn feature_index(&self) -> &[Frame] {
        &self.feature_index
    }

    /// Label and score of the confidence pair at `index`.
    pub fn get_type(&self, index: usize) -> Option<(&str, f64)> {
        self.confidence_pairs
            .get(index)
            .map(|(label, score)| (label.as_str(), *score))
    }

    /// Highest classification score, if the track has any confidence pairs.
    pub fn best_confidence(&self) -> Option<f64> {
        self.confidence_pairs
            .iter()
            .map(|(_, score)| *score)
            .max_by(f64::total_cmp)
    }

    /// Register a listener invoked after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Track, &TrackChange) -> Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Remove every listener, returning how many there were.
    pub fn unsubscribe_all(&mut self) -> usize {
        let count = self.listeners.len();
        self.listeners.clear();
        count
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move the track to `[begin, end]`.
    pub fn set_bounds(&mut self, begin: Frame, end: Frame) -> Result<()> {
        if begin > end {
            return Err(Error::InvalidBounds { begin, end });
        }
        if (begin, end) == self.bounds() {
            return Ok(());
        }
        let previous = self.bounds();
        self.begin = begin;
        self.end = end;
        self.notify(&TrackChange::Bounds { previous })
    }

    /// Insert or replace the feature at `feature.frame`, growing the bounds to
    /// cover it when needed.
    pub fn set_feature(&mut self, feature: Feature) -> Result<()> {
        let frame = feature.frame;
        if feature.keyframe {
            self.index_frame(frame);
        } else {
            self.unindex_frame(frame);
        }
        self.features.insert(frame, feature);

        if frame < self.begin || frame > self.end {
            let previous = self.bounds();
            self.begin = self.begin.min(frame);
            self.end = self.end.max(frame);
            self.notify(&TrackChange::Bounds { previous })?;
        }
        self.notify(&TrackChange::Feature { frame })
    }

    /// Delete the feature at `frame`, shrinking the bounds to the remaining
    /// keyframes. Returns `false` if there was nothing to delete.
    pub fn delete_feature(&mut self, frame: Frame) -> Result<bool> {
        if self.features.remove(&frame).is_none() {
            return Ok(false);
        }
        self.unindex_frame(frame);

        if let (Some(&first), Some(&last)) = (self.feature_index.first(), self.feature_index.last()) {
            if (first, last) != self.bounds() {
                let previous = self.bounds();
                self.begin = first;
                self.end = last;
                self.notify(&TrackChange::Bounds { previous })?;
            }
        }
        self.notify(&TrackChange::Feature { frame })?;
        Ok(true)
    }

    /// Set the interpolate flag of the feature at `frame`. Returns `false` if
    /// there is no feature there.
    pub fn set_interpolation(&mut self, frame: Frame, interpolate: bool) -> Result<bool> {
        let Some(feature) = self.features.get_mut(&frame) else {
            return Ok(false);
        };
        feature.interpolate = interpolate;
        self.notify(&TrackChange::Feature { frame })?;
        Ok(true)
    }

    /// Replace all confidence pairs. They are kept sorted by score, descending.
    /// A non-finite score is rejected and leaves the pairs untouched.
    pub fn set_confidence_pairs(&mut self, pairs: Vec<ConfidencePair>) -> Result<()> {
        self.confidence_pairs = sorted_pairs(pairs)?;
        self.notify(&TrackChange::ConfidencePairs)
    }

    /// Replace all confidence pairs with a single `(label, score)`.
    pub fn set_type(&mut self, label: impl Into<String>, score: f64) -> Result<()> {
        self.set_confidence_pairs(vec![(label.into(), score)])
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) -> Result<()> {
        self.attributes.insert(key.into(), value);
        self.notify(&TrackChange::Attributes)
    }

    fn notify(&self, change: &TrackChange) -> Result<()> {
        for (_, listener) in &self.listeners {
            listener(self, change)?;
        }
        Ok(())
    }

    fn index_frame(&mut self, frame: Frame) {
        if let Err(pos) = self.feature_index.binary_search(&frame) {
            self.feature_index.insert(pos, frame);
        }
    }

    fn unindex_frame(&mut self, frame: Frame) {
        if let Ok(pos) = self.feature_index.binary_search(&frame) {
            self.feature_index.remove(pos);
        }
    }
}

fn sorted_pairs(mut pairs: Vec<ConfidencePair>) -> Result<Vec<ConfidencePair>> {
    if let Some((label, _)) = pairs.iter().find(|(_, score)| !score.is_finite()) {
        return Err(Error::InvalidConfidence {
            label: label.clone(),
        });
    }
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(track: &mut Track) -> Rc<RefCell<Vec<TrackChange>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        track.subscribe(move |_, change| {
            sink.borrow_mut().push(change.clone());
            Ok(())
        });
        seen
    }

    fn fish(id: TrackId, frame: Frame) -> Track {
        Track::new(id, frame, frame, vec![("fish".to_string(), 1.0)]).unwrap()
    }

    #[test]
    fn test_set_bounds_notifies_previous_range() {
        let mut track = fish(0, 10);
        let seen = recorder(&mut track);

        track.set_bounds(10, 20).unwrap();
        assert_eq!(track.bounds(), (10, 20));
        assert_eq!(
            *seen.borrow(),
            vec![TrackChange::Bounds { previous: (10, 10) }]
        );

        // unchanged bounds are silent
        track.set_bounds(10, 20).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_set_bounds_rejects_inverted_range() {
        let mut track = fish(0, 10);
        assert_eq!(
            track.set_bounds(8, 4),
            Err(Error::InvalidBounds { begin: 8, end: 4 })
        );
        assert_eq!(track.bounds(), (10, 10));
        assert!(Track::new(1, 5, 2, vec![]).is_err());
    }

    #[test]
    fn test_set_feature_expands_bounds_first() {
        let mut track = fish(0, 10);
        let seen = recorder(&mut track);

        track.set_feature(Feature::keyframe(25, Some([0.0, 0.0, 4.0, 4.0]))).unwrap();
        assert_eq!(track.bounds(), (10, 25));
        assert_eq!(track.feature_index(), &[25]);
        assert_eq!(
            *seen.borrow(),
            vec![
                TrackChange::Bounds { previous: (10, 10) },
                TrackChange::Feature { frame: 25 },
            ]
        );

        // inside the bounds: feature notification only
        track.set_feature(Feature::keyframe(12, None)).unwrap();
        assert_eq!(track.feature_index(), &[12, 25]);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_non_keyframe_feature_is_not_indexed() {
        let mut track = fish(0, 10);
        track.set_feature(Feature::keyframe(10, None)).unwrap();
        track
            .set_feature(Feature {
                frame: 10,
                bounds: None,
                keyframe: false,
                interpolate: false,
            })
            .unwrap();
        assert!(track.feature_index().is_empty());
        assert!(track.feature(10).is_some());
    }

    #[test]
    fn test_delete_feature_shrinks_bounds() {
        let mut track = fish(0, 10);
        for frame in [10, 15, 20] {
            track.set_feature(Feature::keyframe(frame, None)).unwrap();
        }
        let seen = recorder(&mut track);

        assert!(track.delete_feature(20).unwrap());
        assert_eq!(track.bounds(), (10, 15));
        assert_eq!(track.feature_index(), &[10, 15]);
        assert_eq!(
            *seen.borrow(),
            vec![
                TrackChange::Bounds { previous: (10, 20) },
                TrackChange::Feature { frame: 20 },
            ]
        );

        assert!(!track.delete_feature(99).unwrap());
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_set_interpolation() {
        let mut track = fish(0, 10);
        track.set_feature(Feature::keyframe(10, None)).unwrap();

        assert!(track.set_interpolation(10, true).unwrap());
        assert!(track.feature(10).unwrap().interpolate);
        assert!(!track.set_interpolation(11, true).unwrap());
    }

    #[test]
    fn test_confidence_pairs_sorted_and_best() {
        let mut track = fish(0, 0);
        track
            .set_confidence_pairs(vec![
                ("crab".to_string(), 0.2),
                ("fish".to_string(), 0.7),
                ("eel".to_string(), 0.5),
            ])
            .unwrap();

        assert_eq!(track.get_type(0), Some(("fish", 0.7)));
        assert_eq!(track.get_type(2), Some(("crab", 0.2)));
        assert_eq!(track.get_type(3), None);
        assert_eq!(track.best_confidence(), Some(0.7));

        track.set_confidence_pairs(Vec::new()).unwrap();
        assert_eq!(track.best_confidence(), None);
    }

    #[test]
    fn test_non_finite_confidence_is_rejected() {
        let pairs: Vec<ConfidencePair> = (0..40)
            .map(|i| {
                let score = if i % 3 == 0 { f64::NAN } else { f64::from(i) / 40.0 };
                (format!("type{i}"), score)
            })
            .collect();
        assert!(matches!(
            Track::new(0, 0, 0, pairs),
            Err(Error::InvalidConfidence { label }) if label == "type0"
        ));

        let mut track = fish(0, 0);
        let seen = recorder(&mut track);
        assert_eq!(
            track.set_type("eel", f64::INFINITY),
            Err(Error::InvalidConfidence {
                label: "eel".to_string()
            })
        );
        assert_eq!(track.get_type(0), Some(("fish", 1.0)));
        assert!(seen.borrow().is_empty());

        let mut data = fish(1, 0).to_data();
        data.confidence_pairs.push(("eel".to_string(), f64::NAN));
        assert!(Track::from_data(data).is_err());
    }

    #[test]
    fn test_listener_error_propagates() {
        let mut track = fish(3, 0);
        track.subscribe(|t, _| Err(Error::TrackNotFound(t.track_id())));

        assert_eq!(track.set_type("eel", 0.4), Err(Error::TrackNotFound(3)));
    }

    #[test]
    fn test_unsubscribe() {
        let mut track = fish(0, 0);
        let seen = recorder(&mut track);
        let other = track.subscribe(|_, _| Ok(()));

        assert_eq!(track.listener_count(), 2);
        assert!(track.unsubscribe(other));
        assert!(!track.unsubscribe(other));
        assert_eq!(track.unsubscribe_all(), 1);

        track.set_attribute("note", serde_json::json!("occluded")).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_data_snapshot_roundtrip() {
        let mut track = fish(4, 3);
        track.set_feature(Feature::keyframe(3, Some([1.0, 2.0, 3.0, 4.0]))).unwrap();
        track.set_feature(Feature::keyframe(9, None)).unwrap();
        track.set_interpolation(3, true).unwrap();

        let data = track.to_data();
        assert_eq!(data.begin, 3);
        assert_eq!(data.end, 9);
        assert_eq!(data.features.len(), 2);

        let rebuilt = Track::from_data(data.clone()).unwrap();
        assert_eq!(rebuilt.feature_index(), &[3, 9]);
        assert_eq!(rebuilt.listener_count(), 0);
        assert_eq!(rebuilt.to_data(), data);
    }
}
