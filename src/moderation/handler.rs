//! Delete-and-respond handling for a single message.

use log::{debug, error, info};

use crate::config::ModerationSet;
use crate::gateway::{Gateway, IncomingMessage};

use super::selector::pick;

/// What happened while handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// No detection pattern matched; nothing was sent.
    Ignored,
    /// The message matched. Each flag records whether that call succeeded.
    Moderated {
        deleted: bool,
        response_sent: bool,
        media_sent: bool,
    },
}

/// Check a message against the detection patterns and, on a match, delete it
/// and post a reaction phrase followed by a media link.
///
/// Gateway failures are logged and never stop the remaining steps.
pub async fn moderate<G: Gateway + ?Sized>(
    gateway: &G,
    set: &ModerationSet,
    message: &IncomingMessage,
) -> ModerationOutcome {
    let Some(pattern) = set.matcher().first_match(&message.content) else {
        debug!(
            "No flag in message {} from {} in channel {}",
            message.id, message.author_name, message.channel_id
        );
        return ModerationOutcome::Ignored;
    };

    info!(
        "Removing message from {} in channel {} (pattern '{}'): {}",
        message.author_name, message.channel_id, pattern, message.content
    );

    let deleted = match gateway.delete_message(message.channel_id, message.id).await {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Could not delete message {} in channel {}: {}",
                message.id, message.channel_id, e
            );
            false
        }
    };

    let response_sent = if let Some(response) = pick(set.responses()) {
        let text = format!("{} {}", message.author_mention(), response);
        send(gateway, message, &text, "post-delete text").await
    } else {
        error!("No responses configured, skipping post-delete text");
        false
    };

    let media_sent = if let Some(link) = pick(set.media()) {
        send(gateway, message, link, "post-delete gif").await
    } else {
        error!("No media links configured, skipping post-delete gif");
        false
    };

    ModerationOutcome::Moderated {
        deleted,
        response_sent,
        media_sent,
    }
}

async fn send<G: Gateway + ?Sized>(
    gateway: &G,
    message: &IncomingMessage,
    text: &str,
    what: &str,
) -> bool {
    match gateway.send_message(message.channel_id, text).await {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Could not send {} for message {} in channel {}: {}",
                what, message.id, message.channel_id, e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use poise::serenity_prelude::{ChannelId, MessageId, UserId};

    use super::*;
    use crate::error::{BotError, Result};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Delete(ChannelId, MessageId),
        Send(ChannelId, String),
    }

    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<Call>>,
        fail_delete: bool,
        fail_send: bool,
    }

    impl RecordingGateway {
        fn failing(fail_delete: bool, fail_send: bool) -> Self {
            Self {
                fail_delete,
                fail_send,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn gateway_failure() -> BotError {
        BotError::Serenity(Box::new(poise::serenity_prelude::Error::Other(
            "gateway unavailable",
        )))
    }

    #[async_trait]
    impl Gateway for RecordingGateway {
        async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(channel_id, message_id));
            if self.fail_delete {
                return Err(gateway_failure());
            }
            Ok(())
        }

        async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Send(channel_id, text.to_string()));
            if self.fail_send {
                return Err(gateway_failure());
            }
            Ok(())
        }
    }

    fn set(responses: &[&str], media: &[&str]) -> ModerationSet {
        ModerationSet::new(
            responses.iter().map(ToString::to_string).collect(),
            media.iter().map(ToString::to_string).collect(),
            &[r"sun\{.*\}".to_string()],
        )
        .expect("valid set")
    }

    fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            id: MessageId::new(555),
            channel_id: ChannelId::new(42),
            author_id: UserId::new(7),
            author_name: "player".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn matching_message_is_deleted_then_answered() {
        let gateway = RecordingGateway::default();
        let set = set(&["no flags here!"], &["https://example.com/nope.gif"]);

        let outcome = moderate(&gateway, &set, &message("found sun{abc123}")).await;

        assert_eq!(
            outcome,
            ModerationOutcome::Moderated {
                deleted: true,
                response_sent: true,
                media_sent: true,
            }
        );
        assert_eq!(
            gateway.calls(),
            vec![
                Call::Delete(ChannelId::new(42), MessageId::new(555)),
                Call::Send(ChannelId::new(42), "<@7> no flags here!".to_string()),
                Call::Send(
                    ChannelId::new(42),
                    "https://example.com/nope.gif".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn non_matching_message_is_untouched() {
        let gateway = RecordingGateway::default();
        let set = set(&["no flags here!"], &["https://example.com/nope.gif"]);

        let outcome = moderate(&gateway, &set, &message("hello world")).await;

        assert_eq!(outcome, ModerationOutcome::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_does_not_stop_replies() {
        let gateway = RecordingGateway::failing(true, false);
        let set = set(&["hey"], &["gif"]);

        let outcome = moderate(&gateway, &set, &message("sun{x}")).await;

        assert_eq!(
            outcome,
            ModerationOutcome::Moderated {
                deleted: false,
                response_sent: true,
                media_sent: true,
            }
        );
        assert_eq!(gateway.calls().len(), 3);
    }

    #[tokio::test]
    async fn every_call_is_attempted_when_all_fail() {
        let gateway = RecordingGateway::failing(true, true);
        let set = set(&["hey"], &["gif"]);

        let outcome = moderate(&gateway, &set, &message("sun{x}")).await;

        assert_eq!(
            outcome,
            ModerationOutcome::Moderated {
                deleted: false,
                response_sent: false,
                media_sent: false,
            }
        );
        let calls = gateway.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::Delete(..)));
        assert!(matches!(calls[1], Call::Send(..)));
        assert!(matches!(calls[2], Call::Send(..)));
    }

    #[tokio::test]
    async fn replies_come_from_configured_lists() {
        let responses = ["one", "two", "three"];
        let media = ["https://a.gif", "https://b.gif"];
        let set = set(&responses, &media);

        for _ in 0..20 {
            let gateway = RecordingGateway::default();
            moderate(&gateway, &set, &message("sun{}")).await;

            let calls = gateway.calls();
            let Call::Send(_, phrase) = &calls[1] else {
                panic!("expected phrase send, got {:?}", calls[1]);
            };
            let Call::Send(_, link) = &calls[2] else {
                panic!("expected media send, got {:?}", calls[2]);
            };
            let phrase = phrase.strip_prefix("<@7> ").expect("mention prefix");
            assert!(responses.contains(&phrase));
            assert!(media.contains(&link.as_str()));
        }
    }

    #[tokio::test]
    async fn each_matching_message_is_handled_independently() {
        let gateway = RecordingGateway::default();
        let set = set(&["hey"], &["gif"]);

        moderate(&gateway, &set, &message("sun{1}")).await;
        moderate(&gateway, &set, &message("sun{1}")).await;

        let deletes = gateway
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Delete(..)))
            .count();
        assert_eq!(deletes, 2);
        assert_eq!(gateway.calls().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_each_delete_once_and_send_twice() {
        let gateway = Arc::new(RecordingGateway::default());
        let set = Arc::new(set(&["hey"], &["gif"]));

        let handles: Vec<_> = (1..=16u64)
            .map(|n| {
                let gateway = Arc::clone(&gateway);
                let set = Arc::clone(&set);
                let mut message = message(&format!("sun{{{n}}}"));
                message.id = MessageId::new(n);
                tokio::spawn(async move { moderate(&*gateway, &set, &message).await })
            })
            .collect();

        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                ModerationOutcome::Moderated { deleted: true, .. }
            ));
        }

        let calls = gateway.calls();
        assert_eq!(calls.len(), 48);
        for n in 1..=16u64 {
            let deletes = calls
                .iter()
                .filter(|call| **call == Call::Delete(ChannelId::new(42), MessageId::new(n)))
                .count();
            assert_eq!(deletes, 1, "message {n}");
        }
        let sends = calls
            .iter()
            .filter(|call| matches!(call, Call::Send(..)))
            .count();
        assert_eq!(sends, 32);
    }
}
