// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Type to color mapping.

use std::collections::HashMap;

/// Ten-color categorical palette used for types without a configured color.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Color used when no palette is available.
pub const FALLBACK_COLOR: &str = "#ffffff";

/// Maps a classification label to a display color.
pub trait TypeStyling {
    fn color(&self, label: &str) -> String;
}

impl<F> TypeStyling for F
where
    F: Fn(&str) -> String,
{
    fn color(&self, label: &str) -> String {
        self(label)
    }
}

/// Configured colors with a deterministic palette fallback.
#[derive(Debug, Clone)]
pub struct TypeColors {
    colors: HashMap<String, String>,
    palette: Vec<String>,
}

impl Default for TypeColors {
    fn default() -> Self {
        Self::new(HashMap::new(), DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl TypeColors {
    pub fn new(colors: HashMap<String, String>, palette: Vec<String>) -> Self {
        Self { colors, palette }
    }
}

impl TypeStyling for TypeColors {
    fn color(&self, label: &str) -> String {
        if let Some(color) = self.colors.get(label) {
            return color.clone();
        }
        if self.palette.is_empty() {
            return FALLBACK_COLOR.to_string();
        }
        let index = (fnv1a(label) % self.palette.len() as u64) as usize;
        self.palette[index].clone()
    }
}

// Stable across runs, unlike the std hasher.
fn fnv1a(label: &str) -> u64 {
    label.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}
