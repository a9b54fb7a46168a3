//! The health store abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::records::{ExerciseRecord, HealthRecordSet, RecordKind, TimeWindow};

/// Whether the health platform can be used on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthAvailability {
    Available,
    NotInstalled,
    UpdateRequired,
}

impl HealthAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, HealthAvailability::Available)
    }

    /// Human-readable status line.
    pub fn message(&self) -> &'static str {
        match self {
            HealthAvailability::Available => "Health store is available",
            HealthAvailability::NotInstalled => "Health store is not installed",
            HealthAvailability::UpdateRequired => "Health store requires an update",
        }
    }
}

/// Failures reported by a [`HealthStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("{}", .0.message())]
    Unavailable(HealthAvailability),

    #[error("Health store permissions have not been granted")]
    PermissionDenied,

    #[error("Health record not found: {0}")]
    NotFound(String),

    #[error("Failed to write health records: {0}")]
    Write(String),

    #[error("Failed to read health records: {0}")]
    Read(String),
}

/// Capability-gated sink for workout records.
///
/// Implementations fail closed: when availability or permissions are
/// missing every data operation returns an error and changes nothing.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn availability(&self) -> HealthAvailability;

    async fn is_available(&self) -> bool {
        self.availability().await.is_available()
    }

    /// True when read and write access is held for every [`RecordKind::ALL`].
    async fn has_permissions(&self) -> bool;

    /// Write all records of `set` atomically. Returns the id the store
    /// assigned to the exercise-session record.
    async fn insert(&self, set: &HealthRecordSet) -> Result<String, HealthError>;

    /// Exercise sessions of any type whose window lies inside `window`.
    async fn list_exercise_sessions(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<ExerciseRecord>, HealthError>;

    async fn delete_exercise_session(&self, id: &str) -> Result<(), HealthError>;

    /// Delete every record of `kind` overlapping `window`. Returns the count
    /// removed.
    async fn delete_records_in_range(
        &self,
        kind: RecordKind,
        window: TimeWindow,
    ) -> Result<usize, HealthError>;
}
