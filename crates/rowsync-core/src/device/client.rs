//! HTTP client for the rowing monitor.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::address::DeviceAddress;
use super::models::{
    Ack, DeviceStatus, LiveData, SessionDetail, SessionId, SessionSummary, SessionsResponse,
    WorkoutResponse,
};
use super::source::{DeviceError, RemoteSessionSource};
use crate::storage::DeviceConfig;

/// Talks JSON over HTTP to the rower at a fixed address.
///
/// The client holds no state besides its address and connection pool; a new
/// address means a new client.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    address: DeviceAddress,
    http: reqwest::Client,
}

impl DeviceClient {
    /// Build a client for `address` using the timeouts in `config`.
    pub fn new(address: DeviceAddress, config: &DeviceConfig) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DeviceError::Network(e.to_string()))?;
        Ok(Self { address, http })
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, DeviceError> {
        let url = self.address.endpoint(path)?;
        debug!(%method, %url, "device request");
        Ok(self.http.request(method, url))
    }

    /// Send `request` and return the body of a success response.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, DeviceError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "device returned error status");
            return Err(DeviceError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DeviceError> {
        let body = self.send_raw(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like `send`, but an empty body counts as an empty acknowledgement.
    async fn send_ack(&self, request: RequestBuilder) -> Result<Ack, DeviceError> {
        let body = self.send_raw(request).await?;
        if body.trim().is_empty() {
            return Ok(Ack::default());
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Begin a workout on the device.
    #[instrument(skip(self))]
    pub async fn start_workout(&self) -> Result<WorkoutResponse, DeviceError> {
        let request = self
            .request(Method::POST, "workout/start")?
            .json(&serde_json::json!({}));
        self.send(request).await
    }

    /// End the running workout.
    #[instrument(skip(self))]
    pub async fn stop_workout(&self) -> Result<WorkoutResponse, DeviceError> {
        let request = self
            .request(Method::POST, "workout/stop")?
            .json(&serde_json::json!({}));
        self.send(request).await
    }

    /// Current metrics of the running workout.
    #[instrument(skip(self))]
    pub async fn live(&self) -> Result<LiveData, DeviceError> {
        self.send(self.request(Method::GET, "live")?).await
    }

    /// Current reading of the paired heart rate monitor, in bpm. The device
    /// answers with a bare number.
    #[instrument(skip(self))]
    pub async fn heart_rate(&self) -> Result<u32, DeviceError> {
        let body = self.send_raw(self.request(Method::GET, "hr")?).await?;
        body.trim()
            .parse::<u32>()
            .map_err(|_| DeviceError::Protocol(format!("not a heart rate: {:?}", body.trim())))
    }
}

#[async_trait]
impl RemoteSessionSource for DeviceClient {
    #[instrument(skip(self))]
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, DeviceError> {
        let response: SessionsResponse = self.send(self.request(Method::GET, "api/sessions")?).await?;
        debug!(count = response.sessions.len(), "listed device sessions");
        Ok(response.sessions)
    }

    #[instrument(skip(self))]
    async fn get_detail(&self, id: SessionId) -> Result<SessionDetail, DeviceError> {
        self.send(self.request(Method::GET, &format!("api/sessions/{id}"))?)
            .await
    }

    #[instrument(skip(self))]
    async fn mark_synced(&self, id: SessionId) -> Result<Ack, DeviceError> {
        let request = self
            .request(Method::POST, &format!("api/sessions/{id}/synced"))?
            .json(&serde_json::json!({}));
        self.send_ack(request).await
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, id: SessionId) -> Result<Ack, DeviceError> {
        self.send_ack(self.request(Method::DELETE, &format!("api/sessions/{id}"))?)
            .await
    }

    #[instrument(skip(self))]
    async fn status(&self) -> Result<DeviceStatus, DeviceError> {
        self.send(self.request(Method::GET, "api/status")?).await
    }
}
