//! The remote session source abstraction.
//!
//! The sync engine talks to the rower only through [`RemoteSessionSource`],
//! so tests can substitute an in-memory fake for the HTTP client.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Ack, DeviceStatus, SessionDetail, SessionId, SessionSummary};

/// Failures talking to the device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Transport failure: unreachable host, refused connection, reset.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The device answered with a non-success HTTP status.
    #[error("Device returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Unexpected response from device: {0}")]
    Protocol(String),

    /// An endpoint URL could not be built from the device address.
    #[error("Invalid device URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeviceError::Timeout
        } else if err.is_decode() {
            DeviceError::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            DeviceError::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            DeviceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeviceError {
    fn from(err: serde_json::Error) -> Self {
        DeviceError::Protocol(err.to_string())
    }
}

impl DeviceError {
    /// True when the device could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, DeviceError::Network(_) | DeviceError::Timeout)
    }
}

/// Read and acknowledge sessions stored on the rower.
#[async_trait]
pub trait RemoteSessionSource: Send + Sync {
    /// All sessions currently retained by the device, in device order.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, DeviceError>;

    /// Full detail of one session, including sample series.
    async fn get_detail(&self, id: SessionId) -> Result<SessionDetail, DeviceError>;

    /// Flag a session as copied to the health store.
    async fn mark_synced(&self, id: SessionId) -> Result<Ack, DeviceError>;

    /// Remove a session from device storage.
    async fn delete_session(&self, id: SessionId) -> Result<Ack, DeviceError>;

    /// Device health and workout state.
    async fn status(&self) -> Result<DeviceStatus, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_covers_transport_failures_only() {
        assert!(DeviceError::Timeout.is_unreachable());
        assert!(DeviceError::Network("refused".into()).is_unreachable());
        assert!(!DeviceError::Protocol("bad json".into()).is_unreachable());
        assert!(!DeviceError::Http { status: 500, body: String::new() }.is_unreachable());
    }

    #[test]
    fn json_errors_become_protocol_errors() {
        let err = serde_json::from_str::<SessionSummary>("{").unwrap_err();
        assert!(matches!(DeviceError::from(err), DeviceError::Protocol(_)));
    }
}
