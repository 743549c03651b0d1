// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Track store and event chart projection for video annotation.
//!
//! Tracks are annotated object trajectories over a frame range. The
//! [`store::TrackStore`] keeps them indexed by id, by list position and by
//! frame interval, and reports every change to a pending-change ledger.
//! The [`views`] derive renderable summaries from the store.

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod store;
pub mod util;
pub mod views;

pub use error::{Error, Result};
pub use models::track::{Feature, Frame, Track, TrackChange, TrackData, TrackId};
pub use store::ledger::{ChangeAction, PendingChange, PendingChangeLog, PendingChanges};
pub use store::{TrackHandle, TrackStore};
