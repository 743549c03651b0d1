// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project pairs a media file with the tracks annotated on it.

use super::track::TrackData;
use serde::{Deserialize, Serialize};

/// Complete project data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub media_file: String,
    #[serde(default)]
    pub tracks: Vec<TrackData>,
}

impl ProjectData {
    /// Create a new project for the given media file with no tracks.
    pub fn new(media_file: String) -> Self {
        Self {
            media_file,
            tracks: Vec::new(),
        }
    }
}
