//! Wire models for the rowing monitor's HTTP API.
//!
//! The device speaks camelCase JSON and omits fields it has no value for,
//! so everything optional carries a serde default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device-assigned session identifier.
pub type SessionId = u32;

/// Convert a device epoch-millisecond timestamp.
pub(crate) fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// One completed session as listed by `GET api/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Seconds.
    pub duration: u32,
    /// Meters.
    pub distance: f32,
    pub strokes: u32,
    /// Kilocalories.
    pub calories: u32,
    /// Watts.
    pub avg_power: f32,
    /// Seconds per 500 m.
    pub avg_pace: f32,
    #[serde(default)]
    pub avg_heart_rate: f64,
    #[serde(default)]
    pub max_heart_rate: f64,
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub hr_sample_count: u32,
    #[serde(default)]
    pub drag_factor: Option<f32>,
}

impl SessionSummary {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.start_time)
    }

    pub fn avg_heart_rate_bpm(&self) -> u32 {
        self.avg_heart_rate as u32
    }

    pub fn max_heart_rate_bpm(&self) -> u32 {
        self.max_heart_rate as u32
    }
}

/// Envelope of `GET api/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Epoch milliseconds.
    pub time: i64,
    pub bpm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    pub time: i64,
    pub watts: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedSample {
    pub time: i64,
    pub meters_per_second: f32,
}

/// Full session as returned by `GET api/sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub summary: SessionSummary,
    #[serde(default)]
    pub heart_rate_samples: Vec<HeartRateSample>,
    #[serde(default)]
    pub power_samples: Vec<PowerSample>,
    #[serde(default)]
    pub speed_samples: Vec<SpeedSample>,
}

impl SessionDetail {
    pub fn id(&self) -> SessionId {
        self.summary.id
    }
}

/// `GET api/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub online: bool,
    pub workout_in_progress: bool,
    #[serde(default)]
    pub session_count: u32,
    #[serde(default)]
    pub current_heart_rate: u32,
    #[serde(default)]
    pub free_heap: u64,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub ble_connected: bool,
    #[serde(default)]
    pub ws_clients: u32,
    // Present only while a workout is running.
    #[serde(default)]
    pub current_session_id: Option<SessionId>,
    #[serde(default)]
    pub current_distance: Option<f32>,
    #[serde(default)]
    pub current_strokes: Option<u32>,
    #[serde(default)]
    pub current_power: Option<f32>,
    #[serde(default)]
    pub current_pace: Option<f32>,
    #[serde(default)]
    pub current_stroke_rate: Option<u32>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub hr_samples: Option<u32>,
}

/// `GET live`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
    pub session_id: SessionId,
    pub distance: f32,
    pub strokes: u32,
    pub duration: u64,
    pub power: f32,
    pub pace: f32,
    pub stroke_rate: f32,
    pub heart_rate: u32,
    pub phase: String,
    #[serde(default)]
    pub avg_pace: Option<f32>,
    #[serde(default)]
    pub avg_power: Option<f32>,
}

/// `POST workout/start` and `POST workout/stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutResponse {
    pub status: String,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub strokes: Option<u32>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub hr_samples: Option<u32>,
    #[serde(default)]
    pub avg_heart_rate: Option<f64>,
    #[serde(default)]
    pub max_heart_rate: Option<f64>,
}

/// Acknowledgement returned by mark-synced and delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    /// The device positively confirmed the operation.
    pub fn confirmed(&self) -> bool {
        self.error.is_none()
            && (self.success == Some(true) || self.status.as_deref() == Some("ok"))
    }

    /// Reason the device gave for refusing, if it refused explicitly.
    pub fn rejection(&self) -> Option<String> {
        match (&self.error, self.success) {
            (Some(error), _) => Some(error.clone()),
            (None, Some(false)) => Some("device reported failure".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_parses_with_optional_fields_missing() {
        let json = r#"{"id":3,"startTime":1700000000000,"duration":600,"distance":2000.5,
            "strokes":240,"calories":150,"avgPower":180.0,"avgPace":125.0}"#;
        let summary: SessionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.id, 3);
        assert!(!summary.synced);
        assert_eq!(summary.drag_factor, None);
        assert_eq!(summary.avg_heart_rate_bpm(), 0);
        assert_eq!(
            summary.started_at().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn detail_flattens_summary_and_series() {
        let json = r#"{"id":7,"startTime":1700000000000,"duration":60,"distance":250.0,
            "strokes":30,"calories":12,"avgPower":150.0,"avgPace":130.0,
            "avgHeartRate":141.7,"maxHeartRate":160.2,"synced":false,"dragFactor":118.0,
            "heartRateSamples":[{"time":1700000001000,"bpm":120}],
            "powerSamples":[{"time":1700000001000,"watts":151.5}],
            "speedSamples":[{"time":1700000001000,"metersPerSecond":4.1}]}"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.id(), 7);
        assert_eq!(detail.summary.drag_factor, Some(118.0));
        assert_eq!(detail.summary.avg_heart_rate_bpm(), 141);
        assert_eq!(detail.heart_rate_samples[0].bpm, 120);
        assert_eq!(detail.power_samples[0].watts, 151.5);
        assert_eq!(detail.speed_samples[0].meters_per_second, 4.1);
    }

    #[test]
    fn detail_without_series_has_empty_vectors() {
        let json = r#"{"id":1,"startTime":0,"duration":1,"distance":1.0,"strokes":1,
            "calories":1,"avgPower":1.0,"avgPace":1.0}"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();
        assert!(detail.heart_rate_samples.is_empty());
        assert!(detail.power_samples.is_empty());
        assert!(detail.speed_samples.is_empty());
    }

    #[test]
    fn ack_confirmation_rules() {
        let ok_status = Ack { status: Some("ok".into()), ..Ack::default() };
        let ok_flag = Ack { success: Some(true), ..Ack::default() };
        let empty = Ack::default();
        let refused = Ack { error: Some("session not found".into()), ..Ack::default() };
        let negative = Ack { success: Some(false), ..Ack::default() };

        assert!(ok_status.confirmed());
        assert!(ok_flag.confirmed());
        assert!(!empty.confirmed());
        assert!(!refused.confirmed());

        assert_eq!(empty.rejection(), None);
        assert_eq!(refused.rejection().as_deref(), Some("session not found"));
        assert!(negative.rejection().is_some());
    }

    #[test]
    fn status_parses_idle_device() {
        let json = r#"{"online":true,"workoutInProgress":false,"sessionCount":4,
            "currentHeartRate":0,"freeHeap":123456,"uptime":999}"#;
        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        assert!(status.online);
        assert_eq!(status.session_count, 4);
        assert_eq!(status.current_session_id, None);
    }
}
