//! Rowing monitor access.
//!
//! - `address`: locator normalization
//! - `models`: JSON wire types
//! - `source`: the `RemoteSessionSource` seam and its error type
//! - `client`: the reqwest-backed implementation

mod address;
mod client;
mod models;
mod source;

pub use address::{normalize, DeviceAddress};
pub use client::DeviceClient;
pub use models::{
    Ack, DeviceStatus, HeartRateSample, LiveData, PowerSample, SessionDetail, SessionId,
    SessionSummary, SessionsResponse, SpeedSample, WorkoutResponse,
};
pub(crate) use models::millis_to_utc;
pub use source::{DeviceError, RemoteSessionSource};
