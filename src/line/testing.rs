//! Mock messaging client for tests

use super::client::MessagingClient;
use super::error::ClientError;
use super::types::Quota;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records replies instead of sending them
pub struct MockMessagingClient {
    replies: Mutex<Vec<(String, String)>>,
    quota: Mutex<Option<Quota>>,
    fail_replies: AtomicBool,
    quota_calls: AtomicUsize,
}

impl MockMessagingClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            quota: Mutex::new(Some(Quota::Limited(1000))),
            fail_replies: AtomicBool::new(false),
            quota_calls: AtomicUsize::new(0),
        }
    }

    /// Make every reply fail, as if the token had expired
    pub fn fail_replies(&self) {
        self.fail_replies.store(true, Ordering::SeqCst);
    }

    /// `None` makes quota lookups fail
    pub fn set_quota(&self, quota: Option<Quota>) {
        *self.quota.lock().unwrap() = quota;
    }

    /// (reply token, text) pairs in send order
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn quota_calls(&self) -> usize {
        self.quota_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockMessagingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingClient for MockMessagingClient {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ClientError> {
        // Attempts are recorded even when they fail
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), text.to_string()));
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(ClientError::invalid_request("Invalid reply token"));
        }
        Ok(())
    }

    async fn message_quota(&self) -> Result<Quota, ClientError> {
        self.quota_calls.fetch_add(1, Ordering::SeqCst);
        (*self.quota.lock().unwrap()).ok_or_else(|| ClientError::network("Connection failed"))
    }
}
