//! Core types for session synchronization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{DeviceError, SessionId};
use crate::health::{HealthAvailability, HealthError};

/// Transient per-session operation state.
///
/// Sessions with no operation in flight are `Idle` and are not stored; the
/// durable truth is the device's `synced` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Syncing,
    Deleting,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Deleting => "deleting",
        })
    }
}

/// Sync and delete errors, as surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Could not reach the device: {0}")]
    Network(String),

    #[error("Unexpected response from the device: {0}")]
    Protocol(String),

    #[error("{}", .0.message())]
    Availability(HealthAvailability),

    #[error("Health store permissions are required")]
    Permission,

    #[error("Failed to write to the health store: {0}")]
    StoreWrite(String),

    #[error("Failed to read from the health store: {0}")]
    StoreRead(String),

    /// The store write succeeded but the device was not marked.
    #[error("Session {session_id} was saved to the health store, but the device could not mark it synced: {reason}")]
    PartialSync { session_id: SessionId, reason: String },

    #[error("Session {session_id} has not been synced yet and cannot be deleted from the device")]
    DeleteBlocked { session_id: SessionId },

    #[error("Session {session_id} is already {state}")]
    Busy { session_id: SessionId, state: SyncState },

    #[error("Session {0} is not on the device")]
    SessionNotFound(SessionId),

    #[error("Device refused the request for session {session_id}: {reason}")]
    Rejected { session_id: SessionId, reason: String },

    #[error("Workout {0} is not in the health store")]
    WorkoutNotFound(String),
}

impl From<DeviceError> for SyncError {
    fn from(err: DeviceError) -> Self {
        if err.is_unreachable() {
            SyncError::Network(err.to_string())
        } else {
            SyncError::Protocol(err.to_string())
        }
    }
}

impl From<HealthError> for SyncError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::Unavailable(availability) => SyncError::Availability(availability),
            HealthError::PermissionDenied => SyncError::Permission,
            HealthError::NotFound(id) => SyncError::WorkoutNotFound(id),
            HealthError::Write(message) => SyncError::StoreWrite(message),
            HealthError::Read(message) => SyncError::StoreRead(message),
        }
    }
}

/// Result of one `sync_one` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Written to the store and marked on the device.
    Synced,
    /// Written to the store; the device was not marked.
    SyncedWithWarning(SyncError),
    /// Nothing was written.
    Failed(SyncError),
}

impl SyncOutcome {
    /// True when the session's data is in the health store.
    pub fn is_synced(&self) -> bool {
        !matches!(self, SyncOutcome::Failed(_))
    }

    pub fn warning(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::SyncedWithWarning(warning) => Some(warning),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Aggregate result of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub warnings: Vec<SyncError>,
    pub errors: Vec<SyncError>,
    /// Summary shown to the user, if any.
    pub message: Option<String>,
}

impl BulkReport {
    pub(crate) fn record_outcome(&mut self, outcome: SyncOutcome) {
        self.attempted += 1;
        match outcome {
            SyncOutcome::Synced => self.succeeded += 1,
            SyncOutcome::SyncedWithWarning(warning) => {
                self.succeeded += 1;
                self.warnings.push(warning);
            }
            SyncOutcome::Failed(error) => {
                self.failed += 1;
                self.errors.push(error);
            }
        }
    }

    pub(crate) fn record_result(&mut self, result: Result<(), SyncError>) {
        self.attempted += 1;
        match result {
            Ok(()) => self.succeeded += 1,
            Err(error) => {
                self.failed += 1;
                self.errors.push(error);
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors.is_empty() && self.warnings.is_empty()
    }
}
