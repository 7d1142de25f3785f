//! Publisher adapter: one Telegram media group per run.

use crate::source::CandidateImage;
use std::str::FromStr;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, Recipient};
use teloxide::ApiError;
use thiserror::Error;
use tracing::info;

/// How a publish attempt failed. Both variants abort the run before any
/// state is committed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The bot lacks the rights to post in the target channel.
    #[error("no permission to post: {0}")]
    PermissionDenied(String),
    /// Any other remote failure.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Seam between the orchestrator and the chat platform.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    /// Publish the images as one grouped post, caption on the first image.
    async fn publish(
        &self,
        caption: &str,
        images: &[CandidateImage],
    ) -> Result<(), PublishError>;
}

/// A channel identifier that can be either a numeric ID or a username.
#[derive(Debug, Clone)]
pub enum ChannelIdentifier {
    /// Numeric chat ID (e.g., -1001234567890)
    Id(ChatId),
    /// Username starting with @ (e.g., @channelname)
    Username(String),
}

impl ChannelIdentifier {
    pub fn to_recipient(&self) -> Recipient {
        match self {
            ChannelIdentifier::Id(id) => Recipient::Id(*id),
            ChannelIdentifier::Username(username) => Recipient::ChannelUsername(username.clone()),
        }
    }
}

impl FromStr for ChannelIdentifier {
    type Err = String;

    /// Parse a channel identifier from string.
    ///
    /// Supports:
    /// - Numeric channel IDs (e.g., "-1001234567890")
    /// - Channel usernames starting with @ (e.g., "@channelname")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input.is_empty() {
            return Err("Channel id must not be empty".to_string());
        }

        if let Ok(id) = input.parse::<i64>() {
            return Ok(ChannelIdentifier::Id(ChatId(id)));
        }

        if let Some(username) = input.strip_prefix('@') {
            // Telegram usernames: at least 5 chars, alphanumeric and underscores
            if username.len() >= 5
                && username
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Ok(ChannelIdentifier::Username(input.to_string()));
            } else {
                return Err(format!("Invalid channel username: {}", input));
            }
        }

        Err(format!("Invalid channel id: {}", input))
    }
}

/// Publishes to a Telegram channel via `sendMediaGroup`.
pub struct TelegramPublisher {
    bot: Bot,
    channel: ChannelIdentifier,
}

impl TelegramPublisher {
    pub fn new(bot: Bot, channel: ChannelIdentifier) -> Self {
        Self { bot, channel }
    }
}

impl Publisher for TelegramPublisher {
    async fn publish(
        &self,
        caption: &str,
        images: &[CandidateImage],
    ) -> Result<(), PublishError> {
        if images.is_empty() {
            return Err(PublishError::Platform("no images to send".to_string()));
        }

        info!(
            "Sending media group with {} photos to channel {:?}",
            images.len(),
            self.channel
        );

        let media: Vec<InputMedia> = images
            .iter()
            .enumerate()
            .map(|(idx, image)| {
                let file = InputFile::memory(image.bytes.clone())
                    .file_name(format!("wallpaper_{:02}.jpg", idx + 1));
                let mut photo = InputMediaPhoto::new(file);

                // One caption for the whole grouped post, carried by the
                // first photo only.
                if idx == 0 {
                    photo = photo.caption(caption);
                }

                InputMedia::Photo(photo)
            })
            .collect();

        self.bot
            .send_media_group(self.channel.to_recipient(), media)
            .await
            .map_err(map_send_error)?;

        info!("✅ Media group sent successfully");
        Ok(())
    }
}

fn map_send_error(e: teloxide::RequestError) -> PublishError {
    match &e {
        teloxide::RequestError::Api(api) => match api {
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::NotEnoughRightsToPostMessages => {
                PublishError::PermissionDenied(e.to_string())
            }
            _ => PublishError::Platform(e.to_string()),
        },
        _ => PublishError::Platform(e.to_string()),
    }
}
