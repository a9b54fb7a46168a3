//! Health data sink.
//!
//! [`HealthStore`] is the seam the sync engine writes through;
//! [`FileHealthStore`] is the local implementation used by the CLI.

mod file_store;
mod records;
mod store;

pub use file_store::FileHealthStore;
pub use records::{
    ExerciseRecord, ExerciseSessionRecord, ExerciseType, HealthRecordSet, RecordKind, Sample,
    TimeWindow, SESSION_TITLE,
};
pub use store::{HealthAvailability, HealthError, HealthStore};
