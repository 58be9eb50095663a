use crate::configuration::ViberSettings;
use crate::delivery::DeliveryStrategy;
use anyhow::{bail, Context};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use shared_kernel::http_client::HttpClient;
use std::collections::HashMap;
use url::Url;

const CHANNEL_API_URL: &str = "https://chatapi.viber.com/pa/post";

pub struct ViberChannelStrategy {
    channel_token: Secret<String>,
    sender_id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelPostResponse {
    status: i64,
    status_message: Option<String>,
    message_token: Option<i64>,
}

impl ViberChannelStrategy {
    pub fn new(settings: ViberSettings) -> Self {
        Self {
            channel_token: settings.channel_token,
            sender_id: settings.superadmin_user_id,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for ViberChannelStrategy {
    async fn deliver(&self, text: &str) -> anyhow::Result<()> {
        let url = Url::parse(CHANNEL_API_URL).context("Invalid channel API URL")?;
        let headers = HashMap::from([("Content-Type", "application/json".to_string())]);
        let body = json!({
            "auth_token": self.channel_token.expose_secret(),
            "from": self.sender_id,
            "type": "text",
            "text": text,
        });

        let response: ChannelPostResponse = HttpClient::post_json(url, headers, body)
            .await
            .context("Failed to post to Viber channel")?;
        let message_token = ensure_delivered(response)?;
        tracing::info!(message_token, "Posted to Viber channel");
        Ok(())
    }
}

fn ensure_delivered(response: ChannelPostResponse) -> anyhow::Result<Option<i64>> {
    if response.status != 0 {
        bail!(
            "Viber channel rejected the post: status {} ({})",
            response.status,
            response.status_message.unwrap_or_default()
        );
    }
    Ok(response.message_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_zero_is_a_successful_delivery() {
        let response = ChannelPostResponse {
            status: 0,
            status_message: Some("ok".to_string()),
            message_token: Some(5_098_034_272_017_990_000),
        };
        assert_eq!(
            ensure_delivered(response).unwrap(),
            Some(5_098_034_272_017_990_000)
        );
    }

    #[test]
    fn non_zero_status_carries_the_status_message() {
        let response = ChannelPostResponse {
            status: 2,
            status_message: Some("invalidAuthToken".to_string()),
            message_token: None,
        };
        let error = ensure_delivered(response).unwrap_err();
        assert!(error.to_string().contains("invalidAuthToken"));
    }

    #[test]
    fn response_deserializes_from_the_channel_api_shape() {
        let response: ChannelPostResponse = serde_json::from_str(
            r#"{"status":0,"status_message":"ok","message_token":123,"chat_hostname":"SN-CHAT-05"}"#,
        )
        .unwrap();
        assert_eq!(response.status, 0);
        assert_eq!(response.message_token, Some(123));
    }
}
