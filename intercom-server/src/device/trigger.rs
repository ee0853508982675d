//! Device trigger client
//!
//! One short-timeout GET per device per event. Callers log failures; nothing
//! here retries.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Port every intercom listens on
pub const DEVICE_PORT: u16 = 8084;

/// Priority sent with every sound trigger
pub const TRIGGER_PRIORITY: i64 = 100;

/// Trigger failures; never fatal to a dispatch
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Device returned HTTP {0}")]
    Status(u16),
}

/// One sound event for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundTrigger {
    /// Filename token the device resolves locally
    pub message: String,
    pub volume: i64,
    pub command_id: i64,
    /// Unix seconds at which playback should begin
    pub start_time: i64,
}

/// Result of a `/status` probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub ip: String,
    pub online: bool,
    pub response: Option<String>,
}

/// Network calls the dispatcher and stop operations make to devices
#[async_trait]
pub trait DeviceTrigger: Send + Sync {
    /// Ask a device to play one sound once
    async fn play_sound(&self, address: &str, trigger: &SoundTrigger) -> Result<(), TriggerError>;

    /// Ask a device to halt all local playback
    async fn stop_all(&self, address: &str) -> Result<(), TriggerError>;

    /// Fetch the device status page
    ///
    /// `Ok(None)` means the device answered with a non-success status.
    async fn probe_status(&self, address: &str) -> Result<Option<String>, TriggerError>;
}

/// reqwest-backed trigger client
#[derive(Clone)]
pub struct HttpDeviceTrigger {
    http_client: reqwest::Client,
    port: u16,
}

impl HttpDeviceTrigger {
    pub fn new(timeout: Duration) -> Result<Self, TriggerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriggerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            port: DEVICE_PORT,
        })
    }

    /// Use a non-standard device port (local test listeners)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn sound_url(&self, address: &str, trigger: &SoundTrigger) -> String {
        format!(
            "http://{}:{}/?type=sound&message={}&times=1&volume={}&priority={}&id={}&start_time={}",
            address,
            self.port,
            trigger.message,
            trigger.volume,
            TRIGGER_PRIORITY,
            trigger.command_id,
            trigger.start_time
        )
    }

    pub fn stop_url(&self, address: &str) -> String {
        format!("http://{}:{}/?type=cmd&cmd=stopall", address, self.port)
    }

    pub fn status_url(&self, address: &str) -> String {
        format!("http://{}:{}/status", address, self.port)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TriggerError> {
        debug!("GET {}", url);
        self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TriggerError::Network(e.to_string()))
    }

    async fn get_ok(&self, url: &str) -> Result<(), TriggerError> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceTrigger for HttpDeviceTrigger {
    async fn play_sound(&self, address: &str, trigger: &SoundTrigger) -> Result<(), TriggerError> {
        self.get_ok(&self.sound_url(address, trigger)).await
    }

    async fn stop_all(&self, address: &str) -> Result<(), TriggerError> {
        self.get_ok(&self.stop_url(address)).await
    }

    async fn probe_status(&self, address: &str) -> Result<Option<String>, TriggerError> {
        let response = self.get(&self.status_url(address)).await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| TriggerError::Network(e.to_string()))?;
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpDeviceTrigger {
        HttpDeviceTrigger::new(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_sound_url_format() {
        let trigger = SoundTrigger {
            message: "chime.wav".to_string(),
            volume: 15,
            command_id: 7,
            start_time: 1_700_000_005,
        };
        assert_eq!(
            client().sound_url("10.0.0.21", &trigger),
            "http://10.0.0.21:8084/?type=sound&message=chime.wav&times=1&volume=15&priority=100&id=7&start_time=1700000005"
        );
    }

    #[test]
    fn test_stop_url_format() {
        assert_eq!(
            client().stop_url("10.0.0.21"),
            "http://10.0.0.21:8084/?type=cmd&cmd=stopall"
        );
    }

    #[test]
    fn test_status_url_uses_configured_port() {
        assert_eq!(
            client().with_port(9999).status_url("127.0.0.1"),
            "http://127.0.0.1:9999/status"
        );
    }

    #[tokio::test]
    async fn test_unreachable_device_is_network_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let client = HttpDeviceTrigger::new(Duration::from_millis(200))
            .unwrap()
            .with_port(9);
        let result = client.stop_all("127.0.0.1").await;
        assert!(matches!(result, Err(TriggerError::Network(_))));
    }
}
