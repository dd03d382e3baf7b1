//! Webhook and Messaging API wire types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a webhook delivery
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<WebhookEvent>,
}

/// A single webhook event. Only message events are acted on.
///
/// `reply_token` is absent on events that cannot be replied to, such as
/// message events delivered in standby mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        message: InboundMessage,
    },
    #[serde(other)]
    Other,
}

/// Message carried by a message event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Text { id: String, text: String },
    #[serde(other)]
    Other,
}

/// Body of `POST /v2/bot/message/reply`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<OutboundMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage<'a> {
    Text { text: &'a str },
}

/// Body of `GET /v2/bot/message/quota`
#[derive(Debug, Deserialize)]
pub struct QuotaResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<i64>,
}

/// Remaining monthly message allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Limited(i64),
    Unlimited,
}

impl From<QuotaResponse> for Quota {
    fn from(resp: QuotaResponse) -> Self {
        match (resp.kind.as_str(), resp.value) {
            ("limited", Some(value)) => Quota::Limited(value),
            _ => Quota::Unlimited,
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Limited(n) => write!(f, "{n}"),
            Quota::Unlimited => f.write_str("unlimited"),
        }
    }
}
