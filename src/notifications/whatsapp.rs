use super::{MessageChannel, NotificationError};
use async_trait::async_trait;
use serde_json::json;

const GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";

/// Plain-text messages via the WhatsApp Cloud API.
pub struct WhatsappCloudClient {
    client: reqwest::Client,
    token: String,
    phone_id: String,
}

impl WhatsappCloudClient {
    pub fn new(token: String, phone_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            phone_id,
        }
    }
}

#[async_trait]
impl MessageChannel for WhatsappCloudClient {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), NotificationError> {
        let url = format!("{}/{}/messages", GRAPH_BASE, self.phone_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": text },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Provider(format!(
                "WhatsApp Cloud API returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
