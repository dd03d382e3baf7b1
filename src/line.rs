//! LINE Messaging API integration
//!
//! Inbound: signature check and webhook parsing. Outbound: replies and
//! quota lookup through `MessagingClient`.

mod client;
mod error;
mod signature;
mod types;

#[cfg(test)]
pub mod testing;

pub use client::{LineClient, MessagingClient, DEFAULT_API_BASE};
#[allow(unused_imports)] // Public API re-exports
pub use error::{ClientError, ClientErrorKind};
#[cfg(test)]
pub use signature::sign;
pub use signature::{verify_signature, SIGNATURE_HEADER};
#[allow(unused_imports)] // Public API re-exports
pub use types::{InboundMessage, Quota, WebhookEvent, WebhookPayload};

use thiserror::Error;

/// Rejected webhook delivery
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Malformed webhook payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Authenticate and parse a webhook delivery.
///
/// The signature is checked against the raw bytes before any parsing.
pub fn parse_webhook(
    channel_secret: &str,
    signature: Option<&str>,
    body: &[u8],
) -> Result<WebhookPayload, WebhookError> {
    let signature = signature.ok_or(WebhookError::InvalidSignature)?;
    if !verify_signature(channel_secret, body, signature) {
        return Err(WebhookError::InvalidSignature);
    }
    Ok(serde_json::from_slice(body)?)
}
