//! Health record types written to and read from a [`HealthStore`].
//!
//! [`HealthStore`]: super::HealthStore

use chrono::{DateTime, Duration, FixedOffset, Local, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{millis_to_utc, SessionDetail};

/// Title given to every exercise record created from a device session.
pub const SESSION_TITLE: &str = "Rowing Session";

/// Record types the store keeps. Read and write access is required for all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    ExerciseSession,
    Distance,
    TotalCalories,
    HeartRate,
    Power,
    Speed,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::ExerciseSession,
        RecordKind::Distance,
        RecordKind::TotalCalories,
        RecordKind::HeartRate,
        RecordKind::Power,
        RecordKind::Speed,
    ];

    /// Kinds written alongside an exercise session and removed with it.
    pub const ASSOCIATED: [RecordKind; 5] = [
        RecordKind::Distance,
        RecordKind::TotalCalories,
        RecordKind::HeartRate,
        RecordKind::Power,
        RecordKind::Speed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::ExerciseSession => "exercise_session",
            RecordKind::Distance => "distance",
            RecordKind::TotalCalories => "total_calories",
            RecordKind::HeartRate => "heart_rate",
            RecordKind::Power => "power",
            RecordKind::Speed => "speed",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    RowingMachine,
    Rowing,
    Running,
    Cycling,
    Walking,
    Other,
}

impl ExerciseType {
    /// Only rowing workouts are listed or deleted by this application.
    pub fn is_rowing(&self) -> bool {
        matches!(self, ExerciseType::RowingMachine | ExerciseType::Rowing)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseType::RowingMachine => "Rowing Machine",
            ExerciseType::Rowing => "Rowing",
            ExerciseType::Running => "Running",
            ExerciseType::Cycling => "Cycling",
            ExerciseType::Walking => "Walking",
            ExerciseType::Other => "Exercise",
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` leading up to `now`.
    pub fn lookback(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }

    /// True when `[start, end]` lies inside this window.
    pub fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// A timestamped value in a sample series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub time: DateTime<Utc>,
    pub value: T,
}

/// The exercise-session record of a [`HealthRecordSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSessionRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Zone offsets in seconds east of UTC.
    pub start_offset_secs: i32,
    pub end_offset_secs: i32,
    pub exercise_type: ExerciseType,
    pub title: String,
}

impl ExerciseSessionRecord {
    pub fn start_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.start_offset_secs)
    }

    pub fn end_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.end_offset_secs)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Everything written to the store for one device session.
///
/// All records share the session window. Sample series are `None` when the
/// device recorded nothing for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecordSet {
    pub session: ExerciseSessionRecord,
    pub distance_meters: f64,
    pub energy_kcal: f64,
    pub heart_rate: Option<Vec<Sample<u32>>>,
    pub power: Option<Vec<Sample<f64>>>,
    pub speed: Option<Vec<Sample<f64>>>,
}

fn series<S, T>(
    samples: &[S],
    convert: impl Fn(&S) -> Option<Sample<T>>,
) -> Option<Vec<Sample<T>>> {
    let converted: Vec<Sample<T>> = samples.iter().filter_map(convert).collect();
    (!converted.is_empty()).then_some(converted)
}

impl HealthRecordSet {
    /// Build the record set for `detail`, using the local zone for offsets.
    ///
    /// Returns `None` if the session start time is out of range.
    pub fn from_detail(detail: &SessionDetail) -> Option<Self> {
        Self::from_detail_in(detail, &Local)
    }

    /// Build the record set for `detail`, taking zone offsets from `zone`.
    pub fn from_detail_in<Tz: TimeZone>(detail: &SessionDetail, zone: &Tz) -> Option<Self> {
        let summary = &detail.summary;
        let start = millis_to_utc(summary.start_time)?;
        let end = start + Duration::seconds(i64::from(summary.duration));
        let offset_at = |at: DateTime<Utc>| {
            zone.offset_from_utc_datetime(&at.naive_utc())
                .fix()
                .local_minus_utc()
        };

        let session = ExerciseSessionRecord {
            start,
            end,
            start_offset_secs: offset_at(start),
            end_offset_secs: offset_at(end),
            exercise_type: ExerciseType::RowingMachine,
            title: SESSION_TITLE.to_string(),
        };

        Some(Self {
            session,
            distance_meters: f64::from(summary.distance),
            energy_kcal: f64::from(summary.calories),
            heart_rate: series(&detail.heart_rate_samples, |s| {
                Some(Sample { time: millis_to_utc(s.time)?, value: s.bpm })
            }),
            power: series(&detail.power_samples, |s| {
                Some(Sample { time: millis_to_utc(s.time)?, value: f64::from(s.watts) })
            }),
            speed: series(&detail.speed_samples, |s| {
                Some(Sample {
                    time: millis_to_utc(s.time)?,
                    value: f64::from(s.meters_per_second),
                })
            }),
        })
    }

    pub fn window(&self) -> TimeWindow {
        self.session.window()
    }

    /// Record kinds present in this set.
    pub fn kinds(&self) -> Vec<RecordKind> {
        let mut kinds = vec![
            RecordKind::ExerciseSession,
            RecordKind::Distance,
            RecordKind::TotalCalories,
        ];
        if self.heart_rate.is_some() {
            kinds.push(RecordKind::HeartRate);
        }
        if self.power.is_some() {
            kinds.push(RecordKind::Power);
        }
        if self.speed.is_some() {
            kinds.push(RecordKind::Speed);
        }
        kinds
    }
}

/// An exercise session as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    /// Store-assigned identifier.
    pub id: String,
    pub title: Option<String>,
    pub exercise_type: ExerciseType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExerciseRecord {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn display_name(&self) -> &'static str {
        self.exercise_type.display_name()
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}
