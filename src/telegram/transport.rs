//! Outbound Telegram operations behind the [`Messenger`] trait.
//!
//! The processor only talks to [`Messenger`], so tests can record what it
//! would have done. [`TeloxideMessenger`] is the live implementation and also
//! serves invite-link lookups for source attribution.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InputFile, LinkPreviewOptions, MessageEntity, MessageId, ParseMode,
};
use tracing::{debug, warn};
use url::Url;

use crate::telegram::post::{MediaKind, MediaRef};
use crate::telegram::source::InviteLinkLookup;

/// Errors from outbound Telegram requests.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The Bot API rejected the request or could not be reached.
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
}

/// A post to send as a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPost {
    /// Text, or caption when `media` is set.
    pub text: String,
    /// Entities anchored to `text`.
    pub entities: Vec<MessageEntity>,
    /// Media to re-attach by file id.
    pub media: Option<MediaRef>,
    /// Whether link previews are suppressed.
    pub disable_preview: bool,
}

/// Outbound operations the processor needs.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Replace the text of a text post.
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        entities: &[MessageEntity],
        disable_preview: bool,
    ) -> Result<(), TransportError>;

    /// Replace the caption of a media post.
    async fn edit_caption(
        &self,
        chat_id: i64,
        message_id: i32,
        caption: &str,
        entities: &[MessageEntity],
    ) -> Result<(), TransportError>;

    /// Send `post` as a new message.
    async fn send(&self, chat_id: i64, post: &OutgoingPost) -> Result<(), TransportError>;

    /// Send an HTML notice.
    async fn send_notice(&self, chat_id: i64, html: &str) -> Result<(), TransportError>;

    /// Replace a text post with an HTML notice.
    async fn edit_notice(&self, chat_id: i64, message_id: i32, html: &str)
        -> Result<(), TransportError>;

    /// Delete a post.
    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;
}

/// [`Messenger`] and [`InviteLinkLookup`] over a teloxide [`Bot`].
#[derive(Debug, Clone)]
pub struct TeloxideMessenger {
    bot: Bot,
}

impl TeloxideMessenger {
    /// Wrap `bot`.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn preview_options(disable_preview: bool) -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: disable_preview,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl Messenger for TeloxideMessenger {
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        entities: &[MessageEntity],
        disable_preview: bool,
    ) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .entities(entities.to_vec())
            .link_preview_options(preview_options(disable_preview))
            .await?;
        Ok(())
    }

    async fn edit_caption(
        &self,
        chat_id: i64,
        message_id: i32,
        caption: &str,
        entities: &[MessageEntity],
    ) -> Result<(), TransportError> {
        self.bot
            .edit_message_caption(ChatId(chat_id), MessageId(message_id))
            .caption(caption)
            .caption_entities(entities.to_vec())
            .await?;
        Ok(())
    }

    async fn send(&self, chat_id: i64, post: &OutgoingPost) -> Result<(), TransportError> {
        let chat = ChatId(chat_id);
        let Some(media) = &post.media else {
            self.bot
                .send_message(chat, post.text.as_str())
                .entities(post.entities.clone())
                .link_preview_options(preview_options(post.disable_preview))
                .await?;
            return Ok(());
        };

        let file = InputFile::file_id(media.file_id.as_str());
        let caption = post.text.as_str();
        let entities = post.entities.clone();
        match media.kind {
            MediaKind::Photo => {
                self.bot
                    .send_photo(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::Video => {
                self.bot
                    .send_video(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::Document => {
                self.bot
                    .send_document(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::Audio => {
                self.bot
                    .send_audio(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::Animation => {
                self.bot
                    .send_animation(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::Voice => {
                self.bot
                    .send_voice(chat, file)
                    .caption(caption)
                    .caption_entities(entities)
                    .await?;
            }
            MediaKind::VideoNote | MediaKind::Sticker => {
                if media.kind == MediaKind::Sticker {
                    self.bot.send_sticker(chat, file).await?;
                } else {
                    self.bot.send_video_note(chat, file).await?;
                }
                // no caption on these; the text follows as its own message
                if !post.text.trim().is_empty() {
                    self.bot
                        .send_message(chat, caption)
                        .entities(entities)
                        .link_preview_options(preview_options(post.disable_preview))
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn send_notice(&self, chat_id: i64, html: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .link_preview_options(preview_options(true))
            .await?;
        Ok(())
    }

    async fn edit_notice(
        &self,
        chat_id: i64,
        message_id: i32,
        html: &str,
    ) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), html)
            .parse_mode(ParseMode::Html)
            .link_preview_options(preview_options(true))
            .await?;
        Ok(())
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InviteLinkLookup for TeloxideMessenger {
    async fn invite_link(&self, chat_id: i64) -> Option<Url> {
        match self.bot.get_chat(ChatId(chat_id)).await {
            Ok(chat) => {
                if let Some(link) = chat.invite_link() {
                    debug!(chat_id, "using existing invite link");
                    return Url::parse(link).ok();
                }
            }
            Err(e) => {
                warn!(chat_id, error = %e, "failed to look up source chat");
                return None;
            }
        }
        match self.bot.create_chat_invite_link(ChatId(chat_id)).await {
            Ok(link) => Url::parse(&link.invite_link).ok(),
            Err(e) => {
                warn!(chat_id, error = %e, "failed to create invite link");
                None
            }
        }
    }
}
