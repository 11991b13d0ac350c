//! Channel posts as the processor sees them.
//!
//! [`InboundPost::from_message`] flattens a teloxide [`Message`] into the
//! handful of facts the processor decides on, so the processing pipeline can
//! be driven without a live bot.

use teloxide::types::{Message, MessageEntity, MessageKind, MessageOrigin};

use crate::engine::{redact, Interval, MessageLimit, PositionMap, Redacted};

/// Command prefix that addresses this bot.
pub const COMMAND_PREFIX: &str = "/pdzs";

/// Trailing tag that asks for a post to be left unprocessed.
pub const OPT_OUT_TAG: &str = "nopdzs";

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Photo (largest size kept).
    Photo,
    /// Video.
    Video,
    /// General file.
    Document,
    /// Audio track.
    Audio,
    /// GIF or silent video.
    Animation,
    /// Voice note.
    Voice,
    /// Round video message.
    VideoNote,
    /// Sticker.
    Sticker,
}

impl MediaKind {
    /// Whether Telegram accepts a caption on this kind of media.
    pub fn supports_caption(&self) -> bool {
        !matches!(self, Self::VideoNote | Self::Sticker)
    }

    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Animation => "animation",
            Self::Voice => "voice",
            Self::VideoNote => "video_note",
            Self::Sticker => "sticker",
        }
    }
}

/// Media that can be re-sent by file id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// What the file is.
    pub kind: MediaKind,
    /// Telegram file id.
    pub file_id: String,
}

impl MediaRef {
    /// Reference `file_id` as media of `kind`.
    pub fn new(kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            file_id: file_id.into(),
        }
    }
}

/// Where a forwarded post came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOrigin {
    /// A post in a channel.
    Channel {
        /// Channel chat id.
        chat_id: i64,
        /// Channel title.
        title: Option<String>,
        /// Public username, if the channel has one.
        username: Option<String>,
        /// Id of the original post.
        message_id: i32,
    },
    /// A user account.
    User {
        /// First name.
        first_name: String,
        /// Last name.
        last_name: Option<String>,
        /// Public username.
        username: Option<String>,
        /// Whether the account is a bot.
        is_bot: bool,
    },
    /// A user who hides their account when forwarded.
    HiddenUser {
        /// Name shown in place of the account.
        sender_name: String,
    },
    /// A group posting on its own behalf.
    Chat {
        /// Group chat id.
        chat_id: i64,
        /// Group title.
        title: Option<String>,
        /// Public username.
        username: Option<String>,
    },
}

impl ForwardOrigin {
    /// Convert teloxide's origin.
    pub fn from_origin(origin: &MessageOrigin) -> Self {
        match origin {
            MessageOrigin::Channel {
                chat, message_id, ..
            } => Self::Channel {
                chat_id: chat.id.0,
                title: chat.title().map(str::to_owned),
                username: chat.username().map(str::to_owned),
                message_id: message_id.0,
            },
            MessageOrigin::User { sender_user, .. } => Self::User {
                first_name: sender_user.first_name.clone(),
                last_name: sender_user.last_name.clone(),
                username: sender_user.username.clone(),
                is_bot: sender_user.is_bot,
            },
            MessageOrigin::HiddenUser {
                sender_user_name, ..
            } => Self::HiddenUser {
                sender_name: sender_user_name.clone(),
            },
            MessageOrigin::Chat { sender_chat, .. } => Self::Chat {
                chat_id: sender_chat.id.0,
                title: sender_chat.title().map(str::to_owned),
                username: sender_chat.username().map(str::to_owned),
            },
        }
    }
}

/// A channel post reduced to what processing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPost {
    /// Chat the post lives in.
    pub chat_id: i64,
    /// Id of the post within the chat.
    pub message_id: i32,
    /// Text, or caption for media posts. Empty when there is neither.
    pub text: String,
    /// Entities anchored to `text`.
    pub entities: Vec<MessageEntity>,
    /// Attached media.
    pub media: Option<MediaRef>,
    /// Whether the post belongs to an album.
    pub in_media_group: bool,
    /// Whether this is a service message (pin, title change, …).
    pub is_system: bool,
    /// Forward origin, for forwarded posts.
    pub forward_origin: Option<ForwardOrigin>,
    /// The post this one replies to.
    pub reply_to: Option<Box<InboundPost>>,
}

impl InboundPost {
    /// A plain text post with no media, forward or reply.
    pub fn text(chat_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            entities: Vec::new(),
            media: None,
            in_media_group: false,
            is_system: false,
            forward_origin: None,
            reply_to: None,
        }
    }

    /// Extract the post from a teloxide message.
    pub fn from_message(msg: &Message) -> Self {
        let (text, entities) = match msg.text() {
            Some(text) => (text, msg.entities()),
            None => (msg.caption().unwrap_or_default(), msg.caption_entities()),
        };
        Self {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
            text: text.to_owned(),
            entities: entities.map(<[_]>::to_vec).unwrap_or_default(),
            media: media_of(msg),
            in_media_group: msg.media_group_id().is_some(),
            is_system: is_system_message(&msg.kind),
            forward_origin: msg.forward_origin().map(ForwardOrigin::from_origin),
            reply_to: msg
                .reply_to_message()
                .map(|reply| Box::new(Self::from_message(reply))),
        }
    }

    /// Whether the post was forwarded from elsewhere.
    pub fn is_forwarded(&self) -> bool {
        self.forward_origin.is_some()
    }

    /// Whether media is attached.
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Length limit for the post's text.
    ///
    /// Text for media that cannot carry a caption goes out as its own message.
    pub fn limit(&self) -> MessageLimit {
        MessageLimit::for_post(
            self.media
                .as_ref()
                .is_some_and(|media| media.kind.supports_caption()),
        )
    }

    /// Whether the post addresses the bot with `/pdzs`.
    pub fn is_command(&self) -> bool {
        let Some(rest) = self.text.strip_prefix(COMMAND_PREFIX) else {
            return false;
        };
        rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('@')
    }

    /// Whether the post is a bare `/pdzs` replying to another post.
    pub fn is_reprocess_request(&self) -> bool {
        self.reply_to.is_some() && self.text.trim() == COMMAND_PREFIX
    }

    /// Text and entities with the trailing opt-out tag removed.
    ///
    /// `None` unless the trimmed text ends with the tag. Surrounding
    /// whitespace goes with it; entities are clipped to what remains.
    pub fn without_opt_out_tag(&self) -> Option<Redacted> {
        let without_tag = self.text.trim_end().strip_suffix(OPT_OUT_TAG)?;
        let kept = without_tag.trim();
        let kept_start = without_tag.len().saturating_sub(without_tag.trim_start().len());
        let kept_end = kept_start.saturating_add(kept.len());

        let map = PositionMap::new(&self.text);
        let intervals = [
            Interval::new(0, map.byte_to_char(kept_start)),
            Interval::new(map.byte_to_char(kept_end), map.char_count()),
        ];
        Some(redact(&self.text, &self.entities, &intervals))
    }
}

fn media_of(msg: &Message) -> Option<MediaRef> {
    if let Some(sizes) = msg.photo() {
        return sizes
            .last()
            .map(|size| MediaRef::new(MediaKind::Photo, &size.file.id));
    }
    let (kind, file) = if let Some(video) = msg.video() {
        (MediaKind::Video, &video.file)
    } else if let Some(document) = msg.document() {
        (MediaKind::Document, &document.file)
    } else if let Some(audio) = msg.audio() {
        (MediaKind::Audio, &audio.file)
    } else if let Some(animation) = msg.animation() {
        (MediaKind::Animation, &animation.file)
    } else if let Some(voice) = msg.voice() {
        (MediaKind::Voice, &voice.file)
    } else if let Some(note) = msg.video_note() {
        (MediaKind::VideoNote, &note.file)
    } else if let Some(sticker) = msg.sticker() {
        (MediaKind::Sticker, &sticker.file)
    } else {
        return None;
    };
    Some(MediaRef::new(kind, &file.id))
}

fn is_system_message(kind: &MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::NewChatMembers(_)
            | MessageKind::LeftChatMember(_)
            | MessageKind::NewChatTitle(_)
            | MessageKind::NewChatPhoto(_)
            | MessageKind::DeleteChatPhoto(_)
            | MessageKind::Pinned(_)
            | MessageKind::ChatShared(_)
            | MessageKind::VideoChatStarted(_)
            | MessageKind::VideoChatEnded(_)
    )
}
