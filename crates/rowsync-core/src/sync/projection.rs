//! Observable engine state.
//!
//! The engine is the only writer. Readers either take a [`SyncSnapshot`] or
//! hold a `watch::Receiver` and react to changes.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::watch;

use super::types::SyncState;
use crate::device::{SessionId, SessionSummary};
use crate::health::{ExerciseRecord, HealthAvailability};

/// Point-in-time view of everything a presentation layer shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    /// Session list from the last successful refresh.
    pub sessions: Vec<SessionSummary>,
    /// In-flight operations; absent ids are idle.
    pub states: BTreeMap<SessionId, SyncState>,
    pub is_loading: bool,
    pub is_connected: bool,
    /// Last user-facing message (errors, warnings, bulk summaries).
    pub message: Option<String>,
    pub health_availability: Option<HealthAvailability>,
    pub has_health_permissions: bool,
    pub health_workouts: Vec<ExerciseRecord>,
    pub is_loading_health: bool,
    pub deleting_workouts: BTreeSet<String>,
}

impl SyncSnapshot {
    pub fn state_of(&self, id: SessionId) -> SyncState {
        self.states.get(&id).copied().unwrap_or(SyncState::Idle)
    }

    pub fn session(&self, id: SessionId) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn unsynced_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().filter(|s| !s.synced).map(|s| s.id).collect()
    }

    pub fn synced_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().filter(|s| s.synced).map(|s| s.id).collect()
    }
}

/// Single-writer holder of the [`SyncSnapshot`].
#[derive(Debug)]
pub struct StateProjection {
    tx: watch::Sender<SyncSnapshot>,
}

impl Default for StateProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl StateProjection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.tx.borrow().clone()
    }

    pub(crate) fn update(&self, change: impl FnOnce(&mut SyncSnapshot)) {
        self.tx.send_modify(change);
    }

    pub(crate) fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.message = Some(message));
    }

    /// Claim `id` for `state`. Fails with the current state if another
    /// operation already holds it.
    pub(crate) fn try_begin(&self, id: SessionId, state: SyncState) -> Result<StateGuard<'_>, SyncState> {
        let mut current = SyncState::Idle;
        self.tx.send_if_modified(|s| match s.states.get(&id) {
            Some(existing) => {
                current = *existing;
                false
            }
            None => {
                s.states.insert(id, state);
                true
            }
        });
        if current == SyncState::Idle {
            Ok(StateGuard { projection: self, id })
        } else {
            Err(current)
        }
    }

    fn finish(&self, id: SessionId) {
        self.tx.send_if_modified(|s| s.states.remove(&id).is_some());
    }

    /// Apply `set` now and `reset` when the returned guard drops.
    pub(crate) fn scoped<F>(&self, set: impl FnOnce(&mut SyncSnapshot), reset: F) -> ResetGuard<'_, F>
    where
        F: FnOnce(&mut SyncSnapshot),
    {
        self.update(set);
        ResetGuard {
            projection: self,
            reset: Some(reset),
        }
    }
}

/// Clears a session's transient state when dropped, including when the
/// owning future is cancelled.
#[derive(Debug)]
pub(crate) struct StateGuard<'a> {
    projection: &'a StateProjection,
    id: SessionId,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.projection.finish(self.id);
    }
}

/// Undoes a transient snapshot change (loading flags, in-flight workout
/// deletes) when dropped, including on cancellation.
pub(crate) struct ResetGuard<'a, F>
where
    F: FnOnce(&mut SyncSnapshot),
{
    projection: &'a StateProjection,
    reset: Option<F>,
}

impl<F> Drop for ResetGuard<'_, F>
where
    F: FnOnce(&mut SyncSnapshot),
{
    fn drop(&mut self) {
        if let Some(reset) = self.reset.take() {
            self.projection.update(reset);
        }
    }
}
