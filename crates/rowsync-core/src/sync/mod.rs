//! Session synchronization layer.
//!
//! Moves workout sessions from the rower into the health store and keeps
//! the device's `synced` flags and storage in step with it.

pub mod engine;
pub mod projection;
pub mod types;


pub use engine::SessionSyncEngine;
pub use projection::{StateProjection, SyncSnapshot};
pub use types::{BulkReport, SyncError, SyncOutcome, SyncState};
