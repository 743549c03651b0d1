// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Library error type.
//!
//! Lookup failures mean the store's map, id list and interval index have
//! drifted apart. They are returned to the caller and never repaired.

use crate::models::track::{Frame, TrackId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("TrackId {0} not found in trackMap")]
    TrackNotFound(TrackId),

    #[error("TrackId {0} not found in trackIds")]
    TrackNotListed(TrackId),

    #[error("TrackId {track_id} with range [{begin}, {end}] not found in interval tree")]
    IntervalNotFound {
        track_id: TrackId,
        begin: Frame,
        end: Frame,
    },

    #[error("TrackId {0} is already present in the store")]
    DuplicateTrackId(TrackId),

    #[error("Invalid bounds [{begin}, {end}]: begin must not exceed end")]
    InvalidBounds { begin: Frame, end: Frame },

    #[error("Confidence for type {label:?} is not a finite number")]
    InvalidConfidence { label: String },

    #[error("No track id left above {0}")]
    TrackIdExhausted(TrackId),
}

pub type Result<T> = std::result::Result<T, Error>;
