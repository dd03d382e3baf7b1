//! Messaging API client

use super::error::ClientError;
use super::types::{OutboundMessage, Quota, QuotaResponse, ReplyRequest};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Outbound side of the messaging platform
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Send a single text reply addressed by `reply_token`
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ClientError>;

    /// Remaining monthly message quota
    async fn message_quota(&self) -> Result<Quota, ClientError>;
}

#[async_trait]
impl<T: MessagingClient + ?Sized> MessagingClient for Arc<T> {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ClientError> {
        (**self).reply(reply_token, text).await
    }

    async fn message_quota(&self) -> Result<Quota, ClientError> {
        (**self).message_quota().await
    }
}

/// reqwest-backed client for the LINE Messaging API
pub struct LineClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl LineClient {
    pub fn new(
        access_token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ClientError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::timeout(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ClientError::network(format!("Connection failed: {e}"))
    } else {
        ClientError::unknown(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl MessagingClient for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ClientError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![OutboundMessage::Text { text }],
        };

        self.send(self.client.post(self.url("/v2/bot/message/reply")).json(&body))
            .await?;
        Ok(())
    }

    async fn message_quota(&self) -> Result<Quota, ClientError> {
        let body = self
            .send(self.client.get(self.url("/v2/bot/message/quota")))
            .await?;

        let quota: QuotaResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;
        Ok(quota.into())
    }
}
