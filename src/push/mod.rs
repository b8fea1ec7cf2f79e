//! Push-delivery seam.
//!
//! Delivery is best effort and fire-and-forget: the engine logs and
//! swallows send errors, so implementations only need to report them.

mod http;

pub use http::HttpPushSender;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

/// A notification: display title/body plus structured data for the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<()>;
}

/// Logs deliveries instead of sending them. Default sender for the CLI
/// when no push endpoint is configured.
pub struct LoggingPushSender;

#[async_trait]
impl PushSender for LoggingPushSender {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<()> {
        info!(token, title = %message.title, "push delivery (log only)");
        Ok(())
    }
}

/// Records every delivery for later inspection. Test fixture.
#[derive(Default)]
pub struct RecordingPushSender {
    sent: Mutex<Vec<(String, PushMessage)>>,
    /// When set, every send fails with this message.
    pub fail_with: Option<String>,
}

impl RecordingPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub async fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl PushSender for RecordingPushSender {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(anyhow::anyhow!("push delivery failed: {reason}"));
        }
        self.sent
            .lock()
            .await
            .push((token.to_string(), message.clone()));
        Ok(())
    }
}
