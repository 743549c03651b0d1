// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Loaded from a YAML file. Every field has a default, so the file and each
//! of its keys are optional.

use crate::views::filters::TrackFilter;
use crate::views::styling::{TypeColors, DEFAULT_PALETTE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Type given to tracks created without one.
    pub default_type: String,
    /// Minimum confidence for a pair to enable its track.
    pub confidence_threshold: f64,
    /// Per-type minimum confidence, raised to at least `confidence_threshold`.
    pub type_thresholds: HashMap<String, f64>,
    /// Fixed display colors by type.
    pub type_colors: HashMap<String, String>,
    /// Colors for types missing from `type_colors`.
    pub palette: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_type: "unknown".to_string(),
            confidence_threshold: 0.1,
            type_thresholds: HashMap::new(),
            type_colors: HashMap::new(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load config from `path`.
    /// Returns the default config if no path is given or the file doesn't exist.
    /// Logs a warning and uses defaults if the file can't be read or parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|contents| Self::from_yaml_str(&contents));
        match parsed {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Filter enabling every type at the configured thresholds.
    pub fn track_filter(&self) -> TrackFilter {
        TrackFilter {
            checked_types: None,
            default_threshold: self.confidence_threshold,
            type_thresholds: self.type_thresholds.clone(),
        }
    }

    pub fn type_colors(&self) -> TypeColors {
        TypeColors::new(self.type_colors.clone(), self.palette.clone())
    }
}
