//! # Rowsync Core Library
//!
//! Pulls workout sessions from a networked rowing monitor and copies them
//! into a permission-gated health store, tracking which sessions have been
//! copied so nothing is duplicated or lost. Every operation is exposed
//! through the `rowsync` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Device**: the rower's HTTP API behind the [`RemoteSessionSource`] trait
//! - **Health**: the [`HealthStore`] sink and its record types
//! - **Sync**: the [`SessionSyncEngine`] orchestrating both, with an
//!   observable [`SyncSnapshot`]
//! - **Storage**: TOML configuration and the data directory
//!
//! ## Key Components
//!
//! - [`SessionSyncEngine`]: sync, bulk sync and delete commands
//! - [`DeviceClient`]: reqwest implementation of [`RemoteSessionSource`]
//! - [`FileHealthStore`]: JSON-file implementation of [`HealthStore`]
//! - [`Config`]: Application configuration management

pub mod device;
pub mod error;
pub mod health;
pub mod storage;
pub mod sync;

pub use device::{DeviceAddress, DeviceClient, DeviceError, RemoteSessionSource, SessionSummary};
pub use error::{ConfigError, CoreError};
pub use health::{FileHealthStore, HealthAvailability, HealthError, HealthStore};
pub use storage::Config;
pub use sync::{BulkReport, SessionSyncEngine, SyncError, SyncOutcome, SyncSnapshot, SyncState};
