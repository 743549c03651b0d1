// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Event chart projection.
//!
//! Flattens the enabled tracks into one renderable row per track: its color,
//! selection state, frame range and keyframe markers. Holds no state; call
//! again whenever the tracks, the selection or the styling change.

use super::filters::TrackWithContext;
use super::styling::TypeStyling;
use crate::models::track::{Bounds, Frame, TrackId};
use serde::Serialize;

/// One chart row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventChartEntry {
    pub track_id: TrackId,
    pub name: String,
    pub color: String,
    pub selected: bool,
    pub range: Bounds,
    /// `(frame, interpolate)` for every keyframe.
    pub markers: Vec<(Frame, bool)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventChartData {
    /// Set whenever some track is selected, so unselected rows can be dimmed.
    pub muted: bool,
    pub values: Vec<EventChartEntry>,
}

/// Project `enabled` tracks into chart rows.
///
/// Tracks without confidence pairs are skipped. A context index past the end
/// of a track's pairs falls back to its best pair.
pub fn event_chart_data<S>(
    enabled: &[TrackWithContext],
    selected_track_id: Option<TrackId>,
    styling: &S,
) -> EventChartData
where
    S: TypeStyling + ?Sized,
{
    let mut values = Vec::with_capacity(enabled.len());
    for filtered in enabled {
        let track = filtered.track.borrow();
        let Some((label, _)) = track
            .get_type(filtered.context.confidence_pair_index)
            .or_else(|| track.get_type(0))
        else {
            continue;
        };

        let track_id = track.track_id();
        values.push(EventChartEntry {
            track_id,
            name: format!("Track {track_id}"),
            color: styling.color(label),
            selected: selected_track_id == Some(track_id),
            range: track.bounds(),
            markers: track
                .feature_index()
                .iter()
                .map(|&frame| {
                    let interpolate = track.feature(frame).is_some_and(|f| f.interpolate);
                    (frame, interpolate)
                })
                .collect(),
        });
    }

    EventChartData {
        muted: selected_track_id.is_some(),
        values,
    }
}
