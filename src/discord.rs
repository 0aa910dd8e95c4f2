use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::DiscordConfig;
use crate::message::{AttachmentInfo, MediaKind, Message};

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    content: String,
    author: ApiAuthor,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAttachment {
    id: String,
    #[serde(default)]
    content_type: Option<String>,
    url: String,
}

impl ApiMessage {
    fn into_message(self) -> Result<Message> {
        let id = parse_snowflake(&self.id).context("Invalid message id")?;
        let first_attachment = match self.attachments.into_iter().next() {
            None => None,
            Some(a) => Some(AttachmentInfo {
                id: parse_snowflake(&a.id).context("Invalid attachment id")?,
                media: MediaKind::from_content_type(a.content_type.as_deref()),
                url: a.url,
            }),
        };

        Ok(Message::from_parts(
            id,
            self.author.global_name,
            self.content,
            self.timestamp,
            first_attachment,
        ))
    }
}

// Discord serializes snowflakes as decimal strings.
fn parse_snowflake(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("Not a snowflake id: {raw}"))
}

/// Channel operations the poller depends on, kept behind a trait so tests
/// can drive the sweep with a fake instead of the live API.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Most recent message in the channel, fully extracted and classified.
    async fn latest_message(&self, channel_id: u64) -> Result<Message>;

    /// Post `text` to the channel. True only if the platform reported
    /// success; failures are logged here and never propagate.
    async fn post_reply(&self, channel_id: u64, text: &str) -> bool;
}

/// Discord REST client; the credential and endpoint come in through config,
/// never from ambient process state.
pub struct DiscordClient {
    http: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn messages_url(&self, channel_id: u64) -> String {
        format!("{}/channels/{}/messages", self.config.api_base, channel_id)
    }
}

#[async_trait]
impl ChannelGateway for DiscordClient {
    async fn latest_message(&self, channel_id: u64) -> Result<Message> {
        let url = self.messages_url(channel_id);
        debug!("Fetching latest message from channel {}", channel_id);

        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.config.token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch messages for channel {channel_id}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Discord API error ({status}) for channel {channel_id}");
        }

        // Most-recent-first; only index 0 is ever read.
        let messages: Vec<ApiMessage> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse messages for channel {channel_id}"))?;

        let recent = messages
            .into_iter()
            .next()
            .with_context(|| format!("Channel {channel_id} returned no messages"))?;

        recent.into_message()
    }

    async fn post_reply(&self, channel_id: u64, text: &str) -> bool {
        let url = self.messages_url(channel_id);
        let payload = serde_json::json!({ "content": text });

        match self
            .http
            .post(&url)
            .header("Authorization", &self.config.token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    info!("Sent reply to channel {}", channel_id);
                    true
                } else {
                    error!("Discord rejected reply to channel {} ({})", channel_id, status);
                    false
                }
            }
            Err(e) => {
                error!("Cannot send reply to channel {}: {}", channel_id, e);
                false
            }
        }
    }
}
