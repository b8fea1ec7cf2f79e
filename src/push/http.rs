use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use super::{PushMessage, PushSender};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryRequest<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
}

/// Delivers notifications by POSTing JSON to a push gateway endpoint.
pub struct HttpPushSender {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPushSender {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<()> {
        let delivery = DeliveryRequest {
            to: token,
            title: &message.title,
            body: &message.body,
            data: &message.data,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&delivery)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("failed to send push request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "push gateway returned status {}: {}",
                status,
                body
            ));
        }

        Ok(())
    }
}
