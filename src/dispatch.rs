//! Maps inbound messages to replies

use crate::line::{InboundMessage, MessagingClient, WebhookEvent};
use crate::toggle::Toggle;
use std::sync::Arc;

/// The only text that consults the day state
pub const WHERE_COMMAND: &str = "Where";

pub const STORE_FAILURE_REPLY: &str =
    "Sorry, I can't tell where today is right now. Please try again later.";

/// Per-delivery counts, for logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub replied: usize,
    pub reply_failed: usize,
    pub ignored: usize,
}

/// Stateless request dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    toggle: Toggle,
    messenger: Arc<dyn MessagingClient>,
}

impl Dispatcher {
    pub fn new(toggle: Toggle, messenger: Arc<dyn MessagingClient>) -> Self {
        Self { toggle, messenger }
    }

    /// Build the reply text for one text message
    pub async fn handle_text_message(&self, message_id: &str, text: &str) -> String {
        if text == WHERE_COMMAND {
            return match self.toggle.resolve_today().await {
                Ok(side) => format!("Today is {side}"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to resolve today's side");
                    STORE_FAILURE_REPLY.to_string()
                }
            };
        }

        let remaining = match self.messenger.message_quota().await {
            Ok(quota) => quota.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind, "Quota lookup failed");
                "unknown".to_string()
            }
        };
        format!("{message_id}:{text} OK! remain message:{remaining}")
    }

    /// Reply to every text message event that carries a reply token;
    /// everything else is ignored.
    ///
    /// Reply failures are logged and never abort the remaining events.
    pub async fn handle_events(&self, events: Vec<WebhookEvent>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for event in events {
            let (reply_token, id, text) = match event {
                WebhookEvent::Message {
                    reply_token: Some(reply_token),
                    message: InboundMessage::Text { id, text },
                } => (reply_token, id, text),
                other => {
                    tracing::debug!(event = ?other, "Ignoring event without a text reply target");
                    summary.ignored += 1;
                    continue;
                }
            };

            let reply = self.handle_text_message(&id, &text).await;
            match self.messenger.reply(&reply_token, &reply).await {
                Ok(()) => summary.replied += 1,
                Err(e) => {
                    tracing::error!(
                        message_id = %id,
                        error = %e,
                        kind = ?e.kind,
                        "Failed to send reply"
                    );
                    summary.reply_failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Side;
    use crate::line::testing::MockMessagingClient;
    use crate::line::Quota;
    use crate::toggle::testing::{FixedClock, MemoryStore};

    struct Harness {
        dispatcher: Dispatcher,
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        messenger: Arc<MockMessagingClient>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::ymd(2024, 3, 1));
        let messenger = Arc::new(MockMessagingClient::new());
        let toggle = Toggle::new(store.clone(), clock.clone(), Side::Right);
        Harness {
            dispatcher: Dispatcher::new(toggle, messenger.clone()),
            store,
            clock,
            messenger,
        }
    }

    fn text_event(token: &str, id: &str, text: &str) -> WebhookEvent {
        WebhookEvent::Message {
            reply_token: Some(token.to_string()),
            message: InboundMessage::Text {
                id: id.to_string(),
                text: text.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_where_scenario_across_two_days() {
        let h = harness();

        assert_eq!(
            h.dispatcher.handle_text_message("1", "Where").await,
            "Today is right"
        );
        h.clock.advance_days(1);
        assert_eq!(
            h.dispatcher.handle_text_message("2", "Where").await,
            "Today is left"
        );

        let rows = h.store.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, Side::Right);
        assert_eq!(rows[1].1, Side::Left);
    }

    #[tokio::test]
    async fn test_other_text_echoes_without_touching_store() {
        let h = harness();

        let reply = h.dispatcher.handle_text_message("325708", "where").await;
        assert_eq!(reply, "325708:where OK! remain message:1000");
        assert_eq!(h.store.call_count(), 0);
        assert_eq!(h.messenger.quota_calls(), 1);
    }

    #[tokio::test]
    async fn test_where_does_not_fetch_quota() {
        let h = harness();
        h.dispatcher.handle_text_message("1", "Where").await;
        assert_eq!(h.messenger.quota_calls(), 0);
    }

    #[tokio::test]
    async fn test_echo_with_failed_quota_lookup() {
        let h = harness();
        h.messenger.set_quota(None);

        let reply = h.dispatcher.handle_text_message("7", "hello").await;
        assert_eq!(reply, "7:hello OK! remain message:unknown");
    }

    #[tokio::test]
    async fn test_echo_with_unlimited_quota() {
        let h = harness();
        h.messenger.set_quota(Some(Quota::Unlimited));

        let reply = h.dispatcher.handle_text_message("7", "hello").await;
        assert_eq!(reply, "7:hello OK! remain message:unlimited");
    }

    #[tokio::test]
    async fn test_store_failure_replies_with_notice() {
        let h = harness();
        h.store.fail_all();

        let reply = h.dispatcher.handle_text_message("1", "Where").await;
        assert_eq!(reply, STORE_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_handle_events_replies_once_per_text_event() {
        let h = harness();

        let summary = h
            .dispatcher
            .handle_events(vec![
                text_event("t1", "1", "Where"),
                WebhookEvent::Other,
                WebhookEvent::Message {
                    reply_token: Some("t2".to_string()),
                    message: InboundMessage::Other,
                },
                text_event("t3", "3", "hi"),
            ])
            .await;

        assert_eq!(
            summary,
            DispatchSummary {
                replied: 2,
                reply_failed: 0,
                ignored: 2,
            }
        );
        assert_eq!(
            h.messenger.replies(),
            vec![
                ("t1".to_string(), "Today is right".to_string()),
                ("t3".to_string(), "3:hi OK! remain message:1000".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_event_without_reply_token_is_ignored() {
        let h = harness();

        let summary = h
            .dispatcher
            .handle_events(vec![
                WebhookEvent::Message {
                    reply_token: None,
                    message: InboundMessage::Text {
                        id: "1".to_string(),
                        text: "Where".to_string(),
                    },
                },
                text_event("t2", "2", "Where"),
            ])
            .await;

        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.replied, 1);
        assert_eq!(
            h.messenger.replies(),
            vec![("t2".to_string(), "Today is right".to_string())]
        );
    }

    #[tokio::test]
    async fn test_reply_failure_does_not_stop_later_events() {
        let h = harness();
        h.messenger.fail_replies();

        let summary = h
            .dispatcher
            .handle_events(vec![
                text_event("t1", "1", "Where"),
                text_event("t2", "2", "Where"),
            ])
            .await;

        assert_eq!(summary.reply_failed, 2);
        assert_eq!(h.messenger.replies().len(), 2);
        // State was still created exactly once
        assert_eq!(h.store.rows().len(), 1);
    }
}
