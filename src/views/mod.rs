// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Views derived from the track store.
//!
//! Nothing here mutates tracks. Callers re-derive after the store's revision
//! or membership changes instead of holding results across mutations.

pub mod event_chart;
pub mod filters;
pub mod styling;
