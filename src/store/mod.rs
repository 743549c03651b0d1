// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Track store.
//!
//! The store owns a collection of tracks and keeps three views of it in step:
//! a map by id, an ordered id list, and an interval index keyed by each
//! track's current bounds. Operations on individual tracks (setting features,
//! moving bounds, reclassifying) are made directly on the track; the store
//! observes them through the track's subscription and reacts.

pub mod ledger;

use crate::error::{Error, Result};
use crate::models::project::ProjectData;
use crate::models::track::{Frame, SubscriptionId, Track, TrackChange, TrackId};
use crate::util::interval_tree::IntervalTree;
use ledger::{ChangeAction, PendingChange, PendingChanges};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared handle to a track owned by a [`TrackStore`].
///
/// Callers may hold and mutate tracks through their own API but must not
/// keep a borrow alive across calls into the store.
pub type TrackHandle = Rc<RefCell<Track>>;

struct StoreState {
    track_map: HashMap<TrackId, TrackHandle>,
    track_ids: Vec<TrackId>,
    interval_tree: IntervalTree<TrackId>,
    subscriptions: HashMap<TrackId, SubscriptionId>,
    /// Bumped on every observed track mutation.
    revision: u64,
    /// Bumped on every insert and removal.
    membership: u64,
    ledger: Box<dyn PendingChanges>,
}

impl StoreState {
    fn get(&self, track_id: TrackId) -> Result<TrackHandle> {
        self.track_map
            .get(&track_id)
            .cloned()
            .ok_or(Error::TrackNotFound(track_id))
    }

    fn on_change(&mut self, track: &Track, change: &TrackChange) -> Result<()> {
        if let TrackChange::Bounds { previous } = change {
            let track_id = track.track_id();
            if !self.interval_tree.remove(*previous, &track_id) {
                return Err(Error::IntervalNotFound {
                    track_id,
                    begin: previous.0,
                    end: previous.1,
                });
            }
            self.interval_tree.insert(track.bounds(), track_id);
        }
        self.revision += 1;
        self.ledger.mark_changes_pending(PendingChange {
            action: ChangeAction::Upsert,
            data: track.to_data(),
        });
        Ok(())
    }
}

struct SortedCache {
    revision: u64,
    membership: u64,
    tracks: Vec<TrackHandle>,
}

/// Mutable collection of tracks with interval lookup and change reporting.
pub struct TrackStore {
    state: Rc<RefCell<StoreState>>,
    sorted: RefCell<Option<SortedCache>>,
}

impl fmt::Debug for TrackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TrackStore")
            .field("track_ids", &state.track_ids)
            .field("revision", &state.revision)
            .finish()
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(())
    }
}

impl TrackStore {
    /// Create an empty store reporting changes to `ledger`.
    pub fn new(ledger: impl PendingChanges + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(StoreState {
                track_map: HashMap::new(),
                track_ids: Vec::new(),
                interval_tree: IntervalTree::new(),
                subscriptions: HashMap::new(),
                revision: 0,
                membership: 0,
                ledger: Box::new(ledger),
            })),
            sorted: RefCell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().track_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.state.borrow().track_map.contains_key(&track_id)
    }

    /// Member ids in list order.
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.state.borrow().track_ids.clone()
    }

    /// Changes whenever a member track is mutated. Only meaningful compared
    /// with an earlier read.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    /// Look up a member track. A missing id is a caller bug.
    pub fn get_track(&self, track_id: TrackId) -> Result<TrackHandle> {
        self.state.borrow().get(track_id)
    }

    /// Next id `add_track` would assign: one past the largest member id, or 0.
    pub fn new_track_id(&self) -> Result<TrackId> {
        match self.state.borrow().track_map.keys().max() {
            Some(&max) => max.checked_add(1).ok_or(Error::TrackIdExhausted(max)),
            None => Ok(0),
        }
    }

    /// Take ownership of `track` and start observing it.
    ///
    /// The id is placed right after `after_id` when that id is a member,
    /// otherwise at the end of the list. No ledger report is made.
    pub fn insert_track(&self, track: Track, after_id: Option<TrackId>) -> Result<TrackHandle> {
        let track_id = track.track_id();
        let mut state = self.state.borrow_mut();
        if state.track_map.contains_key(&track_id) {
            return Err(Error::DuplicateTrackId(track_id));
        }

        let bounds = track.bounds();
        let handle = Rc::new(RefCell::new(track));
        let weak: Weak<RefCell<StoreState>> = Rc::downgrade(&self.state);
        let subscription = handle.borrow_mut().subscribe(move |track, change| {
            match weak.upgrade() {
                Some(state) => state.borrow_mut().on_change(track, change),
                None => Ok(()),
            }
        });

        state.subscriptions.insert(track_id, subscription);
        state.track_map.insert(track_id, Rc::clone(&handle));
        state.interval_tree.insert(bounds, track_id);
        let position = after_id
            .and_then(|after| state.track_ids.iter().position(|id| *id == after))
            .map(|index| index + 1);
        match position {
            Some(index) => state.track_ids.insert(index, track_id),
            None => state.track_ids.push(track_id),
        }
        state.membership += 1;

        log::debug!("Inserted track {} at [{}, {}]", track_id, bounds.0, bounds.1);
        Ok(handle)
    }

    /// Create a single-frame track at `frame` classified as `default_type`.
    pub fn add_track(
        &self,
        frame: Frame,
        default_type: &str,
        after_id: Option<TrackId>,
    ) -> Result<TrackHandle> {
        let track = Track::new(
            self.new_track_id()?,
            frame,
            frame,
            vec![(default_type.to_string(), 1.0)],
        )?;
        let handle = self.insert_track(track, after_id)?;
        let data = handle.borrow().to_data();
        self.state.borrow_mut().ledger.mark_changes_pending(PendingChange {
            action: ChangeAction::Upsert,
            data,
        });
        Ok(handle)
    }

    /// Remove a track from every view. `None` means nothing is selected and
    /// is a no-op.
    pub fn remove_track(&self, track_id: Option<TrackId>) -> Result<()> {
        let Some(track_id) = track_id else {
            return Ok(());
        };
        let mut state = self.state.borrow_mut();
        let handle = state.get(track_id)?;
        let (begin, end) = handle.borrow().bounds();
        if !state.interval_tree.remove((begin, end), &track_id) {
            return Err(Error::IntervalNotFound {
                track_id,
                begin,
                end,
            });
        }
        if let Some(subscription) = state.subscriptions.remove(&track_id) {
            handle.borrow_mut().unsubscribe(subscription);
        }
        state.track_map.remove(&track_id);
        let index = state
            .track_ids
            .iter()
            .position(|id| *id == track_id)
            .ok_or(Error::TrackNotListed(track_id))?;
        state.track_ids.remove(index);
        state.membership += 1;

        let data = handle.borrow().to_data();
        state.ledger.mark_changes_pending(PendingChange {
            action: ChangeAction::Delete,
            data,
        });
        log::debug!("Removed track {}", track_id);
        Ok(())
    }

    /// Discard every track whose best confidence is below `threshold`.
    /// Tracks without confidence pairs count as zero confidence.
    ///
    /// Returns the removed ids in list order.
    pub fn remove_tracks_below_confidence(&self, threshold: f64) -> Result<Vec<TrackId>> {
        let snapshot = self.track_ids();
        let mut removed = Vec::new();
        for track_id in snapshot {
            let confidence = self
                .get_track(track_id)?
                .borrow()
                .best_confidence()
                .unwrap_or(0.0);
            if confidence < threshold {
                self.remove_track(Some(track_id))?;
                removed.push(track_id);
            }
        }
        if !removed.is_empty() {
            log::info!(
                "Removed {} tracks below confidence {}",
                removed.len(),
                threshold
            );
        }
        Ok(removed)
    }

    /// Member tracks ordered by `begin`. Ties keep list order.
    ///
    /// Cached until a member is mutated, added or removed.
    pub fn sorted_tracks(&self) -> Result<Vec<TrackHandle>> {
        let state = self.state.borrow();
        let mut cache = self.sorted.borrow_mut();
        if let Some(cached) = cache.as_ref() {
            if cached.revision == state.revision && cached.membership == state.membership {
                return Ok(cached.tracks.clone());
            }
        }

        let mut tracks = state
            .track_ids
            .iter()
            .map(|id| state.get(*id))
            .collect::<Result<Vec<_>>>()?;
        tracks.sort_by_key(|track| track.borrow().begin());

        *cache = Some(SortedCache {
            revision: state.revision,
            membership: state.membership,
            tracks: tracks.clone(),
        });
        Ok(tracks)
    }

    /// Ids of tracks active at `frame`, in list order.
    pub fn tracks_at(&self, frame: Frame) -> Vec<TrackId> {
        self.tracks_in_range(frame, frame)
    }

    /// Ids of tracks overlapping `[begin, end]`, in list order.
    pub fn tracks_in_range(&self, begin: Frame, end: Frame) -> Vec<TrackId> {
        let state = self.state.borrow();
        let hits: HashSet<TrackId> = state.interval_tree.search(begin, end).into_iter().collect();
        state
            .track_ids
            .iter()
            .copied()
            .filter(|id| hits.contains(id))
            .collect()
    }

    /// Insert every track of a project. Loading is not reported to the ledger.
    pub fn load_project(&self, project: &ProjectData) -> Result<()> {
        for data in &project.tracks {
            self.insert_track(Track::from_data(data.clone())?, None)?;
        }
        log::info!("Loaded {} tracks", project.tracks.len());
        Ok(())
    }

    /// Snapshot every member, in list order.
    pub fn to_project(&self, media_file: String) -> Result<ProjectData> {
        let state = self.state.borrow();
        let tracks = state
            .track_ids
            .iter()
            .map(|id| state.get(*id).map(|track| track.borrow().to_data()))
            .collect::<Result<Vec<_>>>()?;
        let mut project = ProjectData::new(media_file);
        project.tracks = tracks;
        Ok(project)
    }
}
