//! JSON-file implementation of [`HealthStore`].
//!
//! Stands in for a platform health service on desktop hosts. The whole store
//! is one JSON document rewritten after every mutation; a mutation that
//! cannot be persisted is not applied.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::records::{ExerciseRecord, ExerciseType, HealthRecordSet, RecordKind, Sample, TimeWindow};
use super::store::{HealthAvailability, HealthError, HealthStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordBody {
    ExerciseSession {
        exercise_type: ExerciseType,
        title: Option<String>,
        start_offset_secs: i32,
        end_offset_secs: i32,
    },
    Distance {
        meters: f64,
    },
    TotalCalories {
        kcal: f64,
    },
    HeartRate {
        samples: Vec<Sample<u32>>,
    },
    Power {
        samples: Vec<Sample<f64>>,
    },
    Speed {
        samples: Vec<Sample<f64>>,
    },
}

impl RecordBody {
    fn kind(&self) -> RecordKind {
        match self {
            RecordBody::ExerciseSession { .. } => RecordKind::ExerciseSession,
            RecordBody::Distance { .. } => RecordKind::Distance,
            RecordBody::TotalCalories { .. } => RecordKind::TotalCalories,
            RecordBody::HeartRate { .. } => RecordKind::HeartRate,
            RecordBody::Power { .. } => RecordKind::Power,
            RecordBody::Speed { .. } => RecordKind::Speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(flatten)]
    body: RecordBody,
}

impl StoredRecord {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>, body: RecordBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start,
            end,
            body,
        }
    }

    fn as_exercise(&self) -> Option<ExerciseRecord> {
        match &self.body {
            RecordBody::ExerciseSession {
                exercise_type,
                title,
                ..
            } => Some(ExerciseRecord {
                id: self.id.clone(),
                title: title.clone(),
                exercise_type: *exercise_type,
                start: self.start,
                end: self.end,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreState {
    availability: HealthAvailability,
    #[serde(default)]
    permissions_granted: bool,
    #[serde(default)]
    records: Vec<StoredRecord>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            availability: HealthAvailability::Available,
            permissions_granted: false,
            records: Vec::new(),
        }
    }
}

/// Health store persisted as a JSON document.
#[derive(Debug)]
pub struct FileHealthStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl FileHealthStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HealthError> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| HealthError::Read(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(HealthError::Read(format!("{}: {e}", path.display()))),
        };
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// A store that lives only in memory.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Grant or revoke all required permissions.
    pub fn set_permissions(&self, granted: bool) -> Result<(), HealthError> {
        self.mutate(|state| {
            state.permissions_granted = granted;
            Ok(())
        })
    }

    pub fn set_availability(&self, availability: HealthAvailability) -> Result<(), HealthError> {
        self.mutate(|state| {
            state.availability = availability;
            Ok(())
        })
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: RecordKind) -> Result<usize, HealthError> {
        let state = self.lock()?;
        Ok(state.records.iter().filter(|r| r.body.kind() == kind).count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, HealthError> {
        self.state
            .lock()
            .map_err(|_| HealthError::Read("store lock poisoned".into()))
    }

    /// Apply `change` to a copy of the state, persist it, then commit.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut StoreState) -> Result<T, HealthError>,
    ) -> Result<T, HealthError> {
        let mut state = self.lock()?;
        let mut next = state.clone();
        let result = change(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(result)
    }

    fn persist(&self, state: &StoreState) -> Result<(), HealthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content =
            serde_json::to_string_pretty(state).map_err(|e| HealthError::Write(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| HealthError::Write(format!("{}: {e}", path.display())))
    }

    fn ensure_access(state: &StoreState) -> Result<(), HealthError> {
        if !state.availability.is_available() {
            return Err(HealthError::Unavailable(state.availability));
        }
        if !state.permissions_granted {
            return Err(HealthError::PermissionDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthStore for FileHealthStore {
    async fn availability(&self) -> HealthAvailability {
        self.lock()
            .map(|state| state.availability)
            .unwrap_or(HealthAvailability::NotInstalled)
    }

    async fn has_permissions(&self) -> bool {
        self.lock()
            .map(|state| state.availability.is_available() && state.permissions_granted)
            .unwrap_or(false)
    }

    async fn insert(&self, set: &HealthRecordSet) -> Result<String, HealthError> {
        let (start, end) = (set.session.start, set.session.end);
        let exercise = StoredRecord::new(
            start,
            end,
            RecordBody::ExerciseSession {
                exercise_type: set.session.exercise_type,
                title: Some(set.session.title.clone()),
                start_offset_secs: set.session.start_offset_secs,
                end_offset_secs: set.session.end_offset_secs,
            },
        );
        let id = exercise.id.clone();

        let mut records = vec![
            exercise,
            StoredRecord::new(start, end, RecordBody::Distance { meters: set.distance_meters }),
            StoredRecord::new(start, end, RecordBody::TotalCalories { kcal: set.energy_kcal }),
        ];
        if let Some(samples) = &set.heart_rate {
            records.push(StoredRecord::new(start, end, RecordBody::HeartRate { samples: samples.clone() }));
        }
        if let Some(samples) = &set.power {
            records.push(StoredRecord::new(start, end, RecordBody::Power { samples: samples.clone() }));
        }
        if let Some(samples) = &set.speed {
            records.push(StoredRecord::new(start, end, RecordBody::Speed { samples: samples.clone() }));
        }

        let written = records.len();
        self.mutate(|state| {
            Self::ensure_access(state)?;
            state.records.extend(records);
            Ok(())
        })?;
        info!(%id, records = written, "inserted workout records");
        Ok(id)
    }

    async fn list_exercise_sessions(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<ExerciseRecord>, HealthError> {
        let state = self.lock()?;
        Self::ensure_access(&state)?;
        Ok(state
            .records
            .iter()
            .filter(|r| window.covers(r.start, r.end))
            .filter_map(StoredRecord::as_exercise)
            .collect())
    }

    async fn delete_exercise_session(&self, id: &str) -> Result<(), HealthError> {
        self.mutate(|state| {
            Self::ensure_access(state)?;
            let position = state
                .records
                .iter()
                .position(|r| r.id == id && r.body.kind() == RecordKind::ExerciseSession)
                .ok_or_else(|| HealthError::NotFound(id.to_string()))?;
            state.records.remove(position);
            Ok(())
        })?;
        debug!(%id, "deleted exercise session");
        Ok(())
    }

    async fn delete_records_in_range(
        &self,
        kind: RecordKind,
        window: TimeWindow,
    ) -> Result<usize, HealthError> {
        let removed = self.mutate(|state| {
            Self::ensure_access(state)?;
            let before = state.records.len();
            state
                .records
                .retain(|r| !(r.body.kind() == kind && window.overlaps(r.start, r.end)));
            Ok(before - state.records.len())
        })?;
        debug!(%kind, removed, "deleted records in range");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::records::{ExerciseSessionRecord, SESSION_TITLE};
    use chrono::Duration;

    fn record_set(start_secs: i64, with_hr: bool) -> HealthRecordSet {
        let start = DateTime::from_timestamp(start_secs, 0).unwrap();
        let end = start + Duration::minutes(20);
        HealthRecordSet {
            session: ExerciseSessionRecord {
                start,
                end,
                start_offset_secs: 0,
                end_offset_secs: 0,
                exercise_type: ExerciseType::RowingMachine,
                title: SESSION_TITLE.to_string(),
            },
            distance_meters: 4_000.0,
            energy_kcal: 300.0,
            heart_rate: with_hr.then(|| vec![Sample { time: start, value: 130 }]),
            power: None,
            speed: None,
        }
    }

    fn all_time() -> TimeWindow {
        TimeWindow::new(
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(4_000_000_000, 0).unwrap(),
        )
    }

    fn granted() -> FileHealthStore {
        let store = FileHealthStore::ephemeral();
        store.set_permissions(true).unwrap();
        store
    }

    #[tokio::test]
    async fn insert_requires_permissions() {
        let store = FileHealthStore::ephemeral();
        assert!(!store.has_permissions().await);

        let result = store.insert(&record_set(1_700_000_000, false)).await;
        assert_eq!(result, Err(HealthError::PermissionDenied));
        assert_eq!(store.count(RecordKind::ExerciseSession).unwrap(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_closed() {
        let store = granted();
        store.set_availability(HealthAvailability::UpdateRequired).unwrap();

        assert!(!store.is_available().await);
        assert!(!store.has_permissions().await);
        let result = store.list_exercise_sessions(all_time()).await;
        assert_eq!(
            result,
            Err(HealthError::Unavailable(HealthAvailability::UpdateRequired))
        );
    }

    #[tokio::test]
    async fn insert_writes_one_record_per_kind() {
        let store = granted();
        let id = store.insert(&record_set(1_700_000_000, true)).await.unwrap();

        assert_eq!(store.count(RecordKind::ExerciseSession).unwrap(), 1);
        assert_eq!(store.count(RecordKind::Distance).unwrap(), 1);
        assert_eq!(store.count(RecordKind::HeartRate).unwrap(), 1);
        assert_eq!(store.count(RecordKind::Power).unwrap(), 0);

        let listed = store.list_exercise_sessions(all_time()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].duration_minutes(), 20);
    }

    #[tokio::test]
    async fn delete_range_only_touches_overlapping_records() {
        let store = granted();
        let first = record_set(1_700_000_000, true);
        store.insert(&first).await.unwrap();
        store.insert(&record_set(1_700_100_000, true)).await.unwrap();

        let removed = store
            .delete_records_in_range(RecordKind::HeartRate, first.window())
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count(RecordKind::HeartRate).unwrap(), 1);
        assert_eq!(store.count(RecordKind::Distance).unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_unknown_session_is_not_found() {
        let store = granted();
        let result = store.delete_exercise_session("missing").await;
        assert_eq!(result, Err(HealthError::NotFound("missing".into())));
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("health_store.json");

        let id = {
            let store = FileHealthStore::open(&path).unwrap();
            store.set_permissions(true).unwrap();
            store.insert(&record_set(1_700_000_000, false)).await.unwrap()
        };

        let reopened = FileHealthStore::open(&path).unwrap();
        assert!(reopened.has_permissions().await);
        let listed = reopened.list_exercise_sessions(all_time()).await.unwrap();
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].title.as_deref(), Some(SESSION_TITLE));
    }

    #[test]
    fn corrupt_file_is_a_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("health_store.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(FileHealthStore::open(&path), Err(HealthError::Read(_))));
    }
}
