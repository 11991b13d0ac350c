//! Turn a forward origin into the attribution the composer renders.

use async_trait::async_trait;
use url::Url;

use crate::engine::{SourceDescriptor, SourceKind};
use crate::telegram::post::ForwardOrigin;

/// Marked ids of channels and supergroups are the bare id minus this value.
const MARKED_CHANNEL_OFFSET: i64 = -1_000_000_000_000;

/// Appended to the names of bot accounts.
const BOT_MARKER: &str = " 🤖";

/// Finds an invite link for a private chat.
#[async_trait]
pub trait InviteLinkLookup: Send + Sync {
    /// Invite link for `chat_id`, if one exists or can be created.
    ///
    /// Failures are the implementation's to log; they surface as `None`.
    async fn invite_link(&self, chat_id: i64) -> Option<Url>;
}

/// Describe `origin` for attribution.
///
/// Public chats link by username. Private chats use `lookup` and fall back to
/// a `t.me/c/` deep link when it yields nothing.
pub async fn resolve_source(
    origin: &ForwardOrigin,
    lookup: Option<&dyn InviteLinkLookup>,
) -> SourceDescriptor {
    match origin {
        ForwardOrigin::Channel {
            chat_id,
            title,
            username,
            message_id,
        } => {
            let name = non_empty(title.as_deref())
                .or(non_empty(username.as_deref()))
                .unwrap_or("Unknown channel");
            let public = username
                .as_deref()
                .and_then(|u| parse_url(&format!("https://t.me/{u}/{message_id}")));
            let url = match public {
                Some(url) => Some(url),
                None => private_link(*chat_id, Some(*message_id), lookup).await,
            };
            SourceDescriptor::new(SourceKind::Channel, name, url)
        }
        ForwardOrigin::User {
            first_name,
            last_name,
            username,
            is_bot,
        } => {
            let full = format!("{first_name} {}", last_name.as_deref().unwrap_or_default());
            let mut name = non_empty(Some(full.trim()))
                .unwrap_or("Unknown user")
                .to_owned();
            if *is_bot {
                name.push_str(BOT_MARKER);
            }
            let url = username
                .as_deref()
                .and_then(|u| parse_url(&format!("https://t.me/{u}")));
            SourceDescriptor {
                is_bot: *is_bot,
                ..SourceDescriptor::new(SourceKind::User, name, url)
            }
        }
        ForwardOrigin::HiddenUser { sender_name } => {
            let name = non_empty(Some(sender_name.trim())).unwrap_or("Anonymous user");
            SourceDescriptor::new(SourceKind::HiddenUser, name, None)
        }
        ForwardOrigin::Chat {
            chat_id,
            title,
            username,
        } => {
            let name = non_empty(title.as_deref()).unwrap_or("Unknown group");
            let public = username
                .as_deref()
                .and_then(|u| parse_url(&format!("https://t.me/{u}")));
            let url = match public {
                Some(url) => Some(url),
                None => private_link(*chat_id, None, lookup).await,
            };
            SourceDescriptor::new(SourceKind::Chat, name, url)
        }
    }
}

async fn private_link(
    chat_id: i64,
    message_id: Option<i32>,
    lookup: Option<&dyn InviteLinkLookup>,
) -> Option<Url> {
    if let Some(lookup) = lookup {
        if let Some(url) = lookup.invite_link(chat_id).await {
            return Some(url);
        }
    }
    let id = bare_chat_id(chat_id);
    let link = match message_id {
        Some(message_id) => format!("https://t.me/c/{id}/{message_id}"),
        None => format!("https://t.me/c/{id}"),
    };
    parse_url(&link)
}

/// Id as it appears in `t.me/c/` links: the `-100` marker removed.
pub fn bare_chat_id(chat_id: i64) -> u64 {
    if chat_id < MARKED_CHANNEL_OFFSET {
        MARKED_CHANNEL_OFFSET.saturating_sub(chat_id).unsigned_abs()
    } else {
        chat_id.unsigned_abs()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(url = raw, error = %e, "discarding unparseable source link");
            None
        }
    }
}
