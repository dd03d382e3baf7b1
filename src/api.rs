//! HTTP API for Whereabouts
//!
//! One webhook endpoint for the messaging platform, plus a version probe.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::dispatch::Dispatcher;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub channel_secret: Arc<str>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, channel_secret: &str) -> Self {
        Self {
            dispatcher,
            channel_secret: Arc::from(channel_secret),
        }
    }
}
