//! Discord operations used by the moderation flow.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{
    ChannelId, CreateMessage, Http, Mentionable, Message as SerenityMessage, MessageId, UserId,
};

use crate::error::Result;

/// The parts of a newly created Discord message that moderation needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
}

impl IncomingMessage {
    /// Mention string for the author, e.g. `<@1234>`.
    #[must_use]
    pub fn author_mention(&self) -> String {
        self.author_id.mention().to_string()
    }
}

impl From<&SerenityMessage> for IncomingMessage {
    fn from(message: &SerenityMessage) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author.id,
            author_name: message.author.name.clone(),
            content: message.content.clone(),
        }
    }
}

/// Outbound message operations.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()>;
}

/// [`Gateway`] backed by the serenity HTTP client.
#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    #[must_use]
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        self.http
            .delete_message(channel_id, message_id, None)
            .await?;
        Ok(())
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<()> {
        let message = CreateMessage::new().content(text);
        channel_id.send_message(&self.http, message).await?;
        Ok(())
    }
}
