// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pending-change ledger.
//!
//! The store reports every committed mutation here, in order, as an upsert
//! or delete of a track snapshot. Persisting the changes is the ledger
//! owner's job.

use crate::models::track::{TrackData, TrackId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Upsert,
    Delete,
}

/// One ledger report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub action: ChangeAction,
    pub data: TrackData,
}

/// Sink for store change reports.
pub trait PendingChanges {
    fn mark_changes_pending(&mut self, change: PendingChange);
}

/// Discards every report.
impl PendingChanges for () {
    fn mark_changes_pending(&mut self, _change: PendingChange) {}
}

/// Lets the caller keep a handle on a ledger owned by the store.
impl<L: PendingChanges + ?Sized> PendingChanges for Rc<RefCell<L>> {
    fn mark_changes_pending(&mut self, change: PendingChange) {
        self.borrow_mut().mark_changes_pending(change);
    }
}

/// Net effect of the pending changes, ready to be saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub upsert: Vec<TrackData>,
    pub delete: Vec<TrackId>,
}

impl SavePayload {
    pub fn is_empty(&self) -> bool {
        self.upsert.is_empty() && self.delete.is_empty()
    }
}

/// In-memory ledger keeping every report in arrival order.
#[derive(Debug, Clone, Default)]
pub struct PendingChangeLog {
    changes: Vec<PendingChange>,
}

impl PendingChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report received since the last discard, oldest first.
    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }

    /// Number of reports awaiting a save.
    pub fn pending_save_count(&self) -> usize {
        self.changes.len()
    }

    /// Number of reports with the given action.
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }

    /// Collapse the log to its net effect. The latest report for an id wins:
    /// an upsert cancels an earlier delete and a delete cancels an earlier upsert.
    pub fn save_payload(&self) -> SavePayload {
        let mut upsert: BTreeMap<TrackId, &TrackData> = BTreeMap::new();
        let mut delete: BTreeSet<TrackId> = BTreeSet::new();
        for change in &self.changes {
            let id = change.data.track_id;
            match change.action {
                ChangeAction::Upsert => {
                    delete.remove(&id);
                    upsert.insert(id, &change.data);
                }
                ChangeAction::Delete => {
                    upsert.remove(&id);
                    delete.insert(id);
                }
            }
        }
        SavePayload {
            upsert: upsert.into_values().cloned().collect(),
            delete: delete.into_iter().collect(),
        }
    }

    /// Forget every pending report.
    pub fn discard_changes(&mut self) {
        self.changes.clear();
    }
}

impl PendingChanges for PendingChangeLog {
    fn mark_changes_pending(&mut self, change: PendingChange) {
        self.changes.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(track_id: TrackId, begin: u32) -> TrackData {
        TrackData {
            track_id,
            begin,
            end: begin,
            confidence_pairs: vec![("fish".to_string(), 1.0)],
            features: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn report(log: &mut PendingChangeLog, action: ChangeAction, data: TrackData) {
        log.mark_changes_pending(PendingChange { action, data });
    }

    #[test]
    fn test_log_keeps_order() {
        let mut log = PendingChangeLog::new();
        report(&mut log, ChangeAction::Upsert, data(0, 1));
        report(&mut log, ChangeAction::Delete, data(0, 1));

        assert_eq!(log.pending_save_count(), 2);
        assert_eq!(log.changes()[0].action, ChangeAction::Upsert);
        assert_eq!(log.changes()[1].action, ChangeAction::Delete);
        assert_eq!(log.count(ChangeAction::Delete), 1);
    }

    #[test]
    fn test_save_payload_latest_wins() {
        let mut log = PendingChangeLog::new();
        report(&mut log, ChangeAction::Upsert, data(0, 1));
        report(&mut log, ChangeAction::Upsert, data(0, 5));
        report(&mut log, ChangeAction::Upsert, data(1, 2));
        report(&mut log, ChangeAction::Delete, data(1, 2));
        report(&mut log, ChangeAction::Delete, data(2, 3));
        report(&mut log, ChangeAction::Upsert, data(2, 4));

        let payload = log.save_payload();
        assert_eq!(payload.upsert, vec![data(0, 5), data(2, 4)]);
        assert_eq!(payload.delete, vec![1]);
    }

    #[test]
    fn test_discard_changes() {
        let mut log = PendingChangeLog::new();
        report(&mut log, ChangeAction::Upsert, data(0, 1));
        log.discard_changes();

        assert_eq!(log.pending_save_count(), 0);
        assert!(log.save_payload().is_empty());
    }

    #[test]
    fn test_shared_handle_records() {
        let log = Rc::new(RefCell::new(PendingChangeLog::new()));
        let mut sink = Rc::clone(&log);
        sink.mark_changes_pending(PendingChange {
            action: ChangeAction::Delete,
            data: data(7, 0),
        });

        assert_eq!(log.borrow().pending_save_count(), 1);
    }

    #[test]
    fn test_change_serializes_lowercase_action() {
        let change = PendingChange {
            action: ChangeAction::Upsert,
            data: data(0, 0),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["action"], "upsert");
        assert_eq!(json["data"]["track_id"], 0);
    }
}
