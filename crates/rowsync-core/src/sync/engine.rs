//! Session sync engine.
//!
//! Copies device sessions into the health store, marks them on the device,
//! and deletes them from either side. All commands take `&self`; per-session
//! exclusion comes from the state map in the [`StateProjection`], so two
//! commands for the same id never run at once while different ids may.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::projection::{StateGuard, StateProjection, SyncSnapshot};
use super::types::{BulkReport, SyncError, SyncOutcome, SyncState};
use crate::device::{
    DeviceAddress, DeviceClient, DeviceError, DeviceStatus, RemoteSessionSource, SessionId,
    SessionSummary,
};
use crate::health::{
    ExerciseRecord, HealthAvailability, HealthRecordSet, HealthStore, RecordKind, TimeWindow,
};
use crate::storage::DeviceConfig;

const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// Orchestrates a [`RemoteSessionSource`] and a [`HealthStore`].
pub struct SessionSyncEngine<S, H> {
    source: S,
    store: H,
    projection: StateProjection,
    lookback_days: u32,
}

impl<S, H> SessionSyncEngine<S, H>
where
    S: RemoteSessionSource,
    H: HealthStore,
{
    pub fn new(source: S, store: H) -> Self {
        Self {
            source,
            store,
            projection: StateProjection::new(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// How far back health workout listings reach.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    /// Swap the device source. The session list belongs to the old device
    /// and is cleared.
    pub fn replace_source(&mut self, source: S) -> S {
        self.projection.update(|s| {
            s.sessions.clear();
            s.is_connected = false;
        });
        std::mem::replace(&mut self.source, source)
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SyncSnapshot> {
        self.projection.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.projection.snapshot()
    }

    pub fn clear_message(&self) {
        self.projection.update(|s| s.message = None);
    }

    fn fail(&self, error: SyncError) -> SyncError {
        self.projection.set_message(error.to_string());
        error
    }

    /// Query availability and permissions once and record them.
    pub async fn check_health(&self) -> Result<(), SyncError> {
        let availability = self.store.availability().await;
        let permitted = availability.is_available() && self.store.has_permissions().await;
        self.projection.update(|s| {
            s.health_availability = Some(availability);
            s.has_health_permissions = permitted;
        });

        if !availability.is_available() {
            return Err(SyncError::Availability(availability));
        }
        if !permitted {
            return Err(SyncError::Permission);
        }
        Ok(())
    }

    pub async fn health_availability(&self) -> HealthAvailability {
        let availability = self.store.availability().await;
        self.projection
            .update(|s| s.health_availability = Some(availability));
        availability
    }

    /// Re-read the device's session list.
    #[instrument(skip(self))]
    pub async fn refresh_sessions(&self) -> Result<Vec<SessionSummary>, SyncError> {
        self.reload_sessions()
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// List sessions and publish them; errors are returned without touching
    /// the user-facing message.
    async fn reload_sessions(&self) -> Result<Vec<SessionSummary>, DeviceError> {
        let _loading = self
            .projection
            .scoped(|s| s.is_loading = true, |s| s.is_loading = false);

        match self.source.list_sessions().await {
            Ok(sessions) => {
                debug!(count = sessions.len(), "refreshed session list");
                let listed = sessions.clone();
                self.projection.update(|s| {
                    s.sessions = listed;
                    s.is_connected = true;
                });
                Ok(sessions)
            }
            Err(e) => {
                warn!(error = %e, "failed to list sessions");
                if e.is_unreachable() {
                    self.projection.update(|s| s.is_connected = false);
                }
                Err(e)
            }
        }
    }

    pub async fn device_status(&self) -> Result<DeviceStatus, SyncError> {
        match self.source.status().await {
            Ok(status) => {
                let online = status.online;
                self.projection.update(|s| s.is_connected = online);
                Ok(status)
            }
            Err(e) => {
                if e.is_unreachable() {
                    self.projection.update(|s| s.is_connected = false);
                }
                Err(self.fail(e.into()))
            }
        }
    }

    /// Copy one session into the health store and mark it on the device.
    #[instrument(skip(self))]
    pub async fn sync_one(&self, id: SessionId) -> SyncOutcome {
        if let Err(e) = self.check_health().await {
            return SyncOutcome::Failed(self.fail(e));
        }

        let _guard = match self.projection.try_begin(id, SyncState::Syncing) {
            Ok(guard) => guard,
            Err(state) => {
                return SyncOutcome::Failed(self.fail(SyncError::Busy {
                    session_id: id,
                    state,
                }))
            }
        };

        let outcome = self.sync_claimed(id).await;
        match &outcome {
            SyncOutcome::Synced => {
                info!(session_id = id, "session synced");
                self.projection
                    .set_message(format!("Session {id} synced to the health store"));
            }
            SyncOutcome::SyncedWithWarning(warning) => {
                warn!(session_id = id, %warning, "session synced with warning");
                self.projection.set_message(warning.to_string());
            }
            SyncOutcome::Failed(error) => {
                warn!(session_id = id, %error, "session sync failed");
                self.projection.set_message(error.to_string());
            }
        }
        outcome
    }

    async fn sync_claimed(&self, id: SessionId) -> SyncOutcome {
        let detail = match self.source.get_detail(id).await {
            Ok(detail) => detail,
            Err(e) => return SyncOutcome::Failed(e.into()),
        };

        if detail.summary.synced {
            debug!(session_id = id, "device reports session already synced");
            self.refresh_quietly().await;
            return SyncOutcome::Synced;
        }

        let Some(records) = HealthRecordSet::from_detail(&detail) else {
            return SyncOutcome::Failed(SyncError::Protocol(format!(
                "session {id} has an out-of-range start time"
            )));
        };

        if let Err(e) = self.store.insert(&records).await {
            return SyncOutcome::Failed(match SyncError::from(e) {
                SyncError::StoreRead(message) => SyncError::StoreWrite(message),
                other => other,
            });
        }

        let warning = match self.source.mark_synced(id).await {
            Ok(ack) => ack.rejection(),
            Err(e) => Some(e.to_string()),
        }
        .map(|reason| SyncError::PartialSync {
            session_id: id,
            reason,
        });

        self.refresh_quietly().await;

        match warning {
            Some(warning) => SyncOutcome::SyncedWithWarning(warning),
            None => SyncOutcome::Synced,
        }
    }

    /// Refresh after a write; a failure here does not undo the write.
    async fn refresh_quietly(&self) {
        let _ = self.reload_sessions().await;
    }

    /// Sync every session that was unsynced when the call started, in order.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> BulkReport {
        let ids = self.projection.snapshot().unsynced_ids();
        let mut report = BulkReport::default();

        if let Err(e) = self.check_health().await {
            let e = self.fail(e);
            report.message = Some(e.to_string());
            report.errors.push(e);
            return report;
        }

        if ids.is_empty() {
            report.message = Some("No unsynced sessions".to_string());
            self.projection.set_message("No unsynced sessions");
            return report;
        }

        for id in ids {
            let outcome = self.sync_one(id).await;
            report.record_outcome(outcome);
        }

        let message = if report.failed > 0 {
            format!("{} synced, {} failed", report.succeeded, report.failed)
        } else {
            format!("{} synced", report.succeeded)
        };
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk sync finished"
        );
        self.projection.set_message(message.clone());
        report.message = Some(message);
        report
    }

    /// Delete a synced session from the device.
    #[instrument(skip(self))]
    pub async fn delete_remote_session(&self, id: SessionId) -> Result<(), SyncError> {
        let _guard = self.claim_for_delete(id)?;

        match self.delete_claimed(id).await {
            Ok(()) => {
                info!(session_id = id, "session deleted from device");
                self.refresh_after_delete(&[id]).await;
                Ok(())
            }
            Err(e) => {
                warn!(session_id = id, error = %e, "device delete failed");
                Err(self.fail(e))
            }
        }
    }

    fn claim_for_delete(
        &self,
        id: SessionId,
    ) -> Result<StateGuard<'_>, SyncError> {
        let snapshot = self.projection.snapshot();
        let session = snapshot
            .session(id)
            .ok_or_else(|| self.fail(SyncError::SessionNotFound(id)))?;
        if !session.synced {
            return Err(self.fail(SyncError::DeleteBlocked { session_id: id }));
        }

        self.projection
            .try_begin(id, SyncState::Deleting)
            .map_err(|state| {
                self.fail(SyncError::Busy {
                    session_id: id,
                    state,
                })
            })
    }

    async fn delete_claimed(&self, id: SessionId) -> Result<(), SyncError> {
        let ack = self.source.delete_session(id).await?;
        if ack.confirmed() {
            Ok(())
        } else {
            Err(SyncError::Rejected {
                session_id: id,
                reason: ack
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }

    /// Re-list after deletes. If the device cannot be listed, drop the
    /// deleted ids locally so the list does not show them.
    async fn refresh_after_delete(&self, deleted: &[SessionId]) {
        if self.reload_sessions().await.is_err() {
            self.projection
                .update(|s| s.sessions.retain(|session| !deleted.contains(&session.id)));
        }
    }

    /// Delete every session that was synced when the call started.
    #[instrument(skip(self))]
    pub async fn delete_all_synced_remote(&self) -> BulkReport {
        let ids = self.projection.snapshot().synced_ids();
        let mut report = BulkReport::default();

        if ids.is_empty() {
            let message = "No synced sessions to delete".to_string();
            self.projection.set_message(message.clone());
            report.message = Some(message);
            return report;
        }

        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            let result = match self.claim_for_delete(id) {
                Ok(_guard) => self.delete_claimed(id).await,
                Err(e) => Err(e),
            };
            match &result {
                Ok(()) => deleted.push(id),
                Err(e) => warn!(session_id = id, error = %e, "bulk delete item failed"),
            }
            report.record_result(result);
        }

        self.refresh_after_delete(&deleted).await;

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk delete finished"
        );
        if report.failed > 0 {
            let message = format!("{} deleted, {} failed", report.succeeded, report.failed);
            self.projection.set_message(message.clone());
            report.message = Some(message);
        }
        report
    }

    /// Rowing workouts in the store within the lookback window, newest first.
    #[instrument(skip(self))]
    pub async fn load_health_workouts(&self) -> Result<Vec<ExerciseRecord>, SyncError> {
        if let Err(e) = self.check_health().await {
            return Err(self.fail(e));
        }

        let _loading = self
            .projection
            .scoped(|s| s.is_loading_health = true, |s| s.is_loading_health = false);
        let window = TimeWindow::lookback(self.lookback_days, Utc::now());
        let result = self.store.list_exercise_sessions(window).await;

        match result {
            Ok(records) => {
                let mut workouts: Vec<ExerciseRecord> = records
                    .into_iter()
                    .filter(|r| r.exercise_type.is_rowing())
                    .collect();
                workouts.sort_by(|a, b| b.start.cmp(&a.start));

                let listed = workouts.clone();
                self.projection.update(|s| s.health_workouts = listed);
                Ok(workouts)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Delete a rowing workout and the records written alongside it.
    #[instrument(skip(self))]
    pub async fn delete_health_workout(&self, id: &str) -> Result<(), SyncError> {
        let result = self.delete_health_workout_quietly(id).await;
        match result {
            Ok(()) => {
                let _ = self.load_health_workouts().await;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn delete_health_workout_quietly(&self, id: &str) -> Result<(), SyncError> {
        self.check_health().await?;

        let window = TimeWindow::lookback(self.lookback_days, Utc::now());
        let workout = self
            .store
            .list_exercise_sessions(window)
            .await?
            .into_iter()
            .find(|r| r.id == id && r.exercise_type.is_rowing())
            .ok_or_else(|| SyncError::WorkoutNotFound(id.to_string()))?;

        let owned = id.to_string();
        let _deleting = self.projection.scoped(
            |s| {
                s.deleting_workouts.insert(owned);
            },
            |s| {
                s.deleting_workouts.remove(id);
            },
        );
        self.delete_workout_records(&workout).await
    }

    async fn delete_workout_records(&self, workout: &ExerciseRecord) -> Result<(), SyncError> {
        self.store.delete_exercise_session(&workout.id).await?;

        let window = workout.window();
        for kind in RecordKind::ASSOCIATED {
            if let Err(e) = self.store.delete_records_in_range(kind, window).await {
                warn!(workout_id = %workout.id, %kind, error = %e, "could not delete associated records");
            }
        }
        info!(workout_id = %workout.id, "deleted health workout");
        Ok(())
    }

    /// Delete every listed rowing workout one at a time. Returns how many
    /// were deleted.
    #[instrument(skip(self))]
    pub async fn delete_all_health_workouts(&self) -> Result<usize, SyncError> {
        let workouts = self.load_health_workouts().await?;

        let mut deleted = 0;
        {
            let _loading = self
                .projection
                .scoped(|s| s.is_loading_health = true, |s| s.is_loading_health = false);
            for workout in &workouts {
                match self.delete_workout_records(workout).await {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(workout_id = %workout.id, error = %e, "failed to delete workout"),
                }
            }
        }

        if deleted > 0 {
            info!(deleted, "deleted health workouts");
        }
        let _ = self.load_health_workouts().await;
        Ok(deleted)
    }
}

impl<H: HealthStore> SessionSyncEngine<DeviceClient, H> {
    /// Point the engine at a new device address.
    pub fn set_device_address(
        &mut self,
        address: DeviceAddress,
        config: &DeviceConfig,
    ) -> Result<(), DeviceError> {
        let client = DeviceClient::new(address, config)?;
        info!(address = %client.address(), "device address changed");
        self.replace_source(client);
        Ok(())
    }
}
