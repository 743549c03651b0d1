// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project file reading and writing.
//!
//! A project file holds the media path plus a snapshot of every track. The
//! file extension picks the format, `.json` or `.yaml`/`.yml`.

use crate::models::project::ProjectData;
use anyhow::{bail, Result};
use std::path::Path;

/// Export project data to YAML format.
pub fn export_yaml(data: &ProjectData, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(data: &ProjectData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import project data from YAML format.
pub fn import_yaml(path: &Path) -> Result<ProjectData> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import project data from JSON format.
pub fn import_json(path: &Path) -> Result<ProjectData> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

/// Import project data, choosing the format from the file extension.
pub fn load(path: &Path) -> Result<ProjectData> {
    let data = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path)?,
        Some("json") => import_json(path)?,
        extension => bail!("Unsupported file extension: {:?}", extension),
    };
    log::info!("Imported {} tracks from {}", data.tracks.len(), path.display());
    Ok(data)
}

/// Export project data, choosing the format from the file extension.
pub fn save(data: &ProjectData, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(data, path)?,
        Some("json") => export_json(data, path)?,
        extension => bail!("Unsupported file extension: {:?}", extension),
    }
    log::info!("Exported {} tracks to {}", data.tracks.len(), path.display());
    Ok(())
}
