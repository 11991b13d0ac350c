//! Channel post pipeline.
//!
//! [`PostProcessor::process`] decides what to do with one channel post and
//! carries it out through the [`Messenger`]. The checks run in a fixed order:
//!
//! 1. a bare `/pdzs` replying to a post re-sends that post processed;
//! 2. service messages are deleted when the channel asks for it;
//! 3. a trailing `nopdzs` is stripped and the post otherwise left alone;
//! 4. `/pdzs <command>` posts are answered in place;
//! 5. forwarded albums are left alone;
//! 6. posts that already carry the footer are left alone;
//! 7. forwards are re-posted with an attribution when enabled;
//! 8. anything else is edited in place.

use std::sync::Arc;

use teloxide::types::MessageEntity;
use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::engine::{transform, AttributionPosition, Transformed};
use crate::settings::{ChannelSettings, SettingsStore};
use crate::telegram::commands;
use crate::telegram::post::InboundPost;
use crate::telegram::source::{resolve_source, InviteLinkLookup};
use crate::telegram::transport::{Messenger, OutgoingPost, TransportError};
use crate::telegram::ui::TOO_LONG_NOTICE;

/// What the processor did with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The replied-to post was re-sent processed and the request deleted.
    Reprocessed,
    /// A service message was deleted.
    SystemDeleted,
    /// The opt-out tag was stripped.
    OptOutRestored,
    /// A command was answered.
    CommandHandled,
    /// A forward was re-posted with attribution and the original deleted.
    Forwarded,
    /// The post was edited in place.
    Edited,
    /// Editing failed, so the processed post was sent anew and the original deleted.
    Resent,
    /// Processing would not change the post.
    Unchanged,
    /// The output was over the length limit; a notice was posted instead.
    TooLong,
    /// Nothing to do.
    Skipped(SkipReason),
    /// A Telegram request failed; details are in the log.
    Failed,
}

/// Why a post was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Service message in a channel that keeps them.
    ServiceMessage,
    /// `/pdzs` with no subcommand.
    NoSubcommand,
    /// Part of a forwarded album.
    ForwardedAlbum,
    /// Album item without a caption.
    CaptionlessAlbumItem,
    /// The footer is already present.
    AlreadyProcessed,
    /// Neither text nor media to work with.
    NoContent,
    /// Media whose caption cannot be edited.
    CaptionUnsupported,
}

/// Runs the post pipeline against a settings store and a messenger.
pub struct PostProcessor {
    store: Arc<dyn SettingsStore>,
    messenger: Arc<dyn Messenger>,
    lookup: Option<Arc<dyn InviteLinkLookup>>,
    limits: LimitsConfig,
}

impl PostProcessor {
    /// Processor without invite-link lookups; private sources get deep links.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        messenger: Arc<dyn Messenger>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            store,
            messenger,
            lookup: None,
            limits,
        }
    }

    /// Resolve private source chats through `lookup`.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn InviteLinkLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Process one channel post.
    pub async fn process(&self, post: &InboundPost) -> Outcome {
        let outcome = self.run(post).await;
        debug!(
            chat_id = post.chat_id,
            message_id = post.message_id,
            media = post.media.as_ref().map_or("none", |m| m.kind.as_str()),
            ?outcome,
            "post processed"
        );
        outcome
    }

    async fn run(&self, post: &InboundPost) -> Outcome {
        if post.is_reprocess_request() {
            return self.reprocess(post).await;
        }

        let settings = self.store.get(post.chat_id).await;

        if post.is_system {
            if !settings.delete_system_messages {
                return Outcome::Skipped(SkipReason::ServiceMessage);
            }
            return match self.messenger.delete(post.chat_id, post.message_id).await {
                Ok(()) => Outcome::SystemDeleted,
                Err(e) => self.failed(post, "failed to delete service message", &e),
            };
        }

        if !post.is_forwarded() {
            if let Some(restored) = post.without_opt_out_tag() {
                return self.restore(post, &restored.text, &restored.entities).await;
            }
        }

        if post.is_command() {
            return self.answer_command(post).await;
        }

        if post.is_forwarded() && post.in_media_group {
            return Outcome::Skipped(SkipReason::ForwardedAlbum);
        }

        if let Some(footer) = settings.rendered_footer() {
            if post.text.contains(footer.trim()) {
                return Outcome::Skipped(SkipReason::AlreadyProcessed);
            }
        }

        if settings.forward_optimization && post.is_forwarded() {
            return self.repost_forward(post, &settings).await;
        }

        self.edit_in_place(post, &settings).await
    }

    async fn reprocess(&self, request: &InboundPost) -> Outcome {
        let Some(target) = request.reply_to.as_deref() else {
            return Outcome::Skipped(SkipReason::NoContent);
        };
        if target.text.is_empty() && !target.has_media() {
            return Outcome::Skipped(SkipReason::NoContent);
        }
        let settings = self.store.get(request.chat_id).await;
        let out = self.render(target, &settings).await;
        if !self.fits(target, &out.text) {
            return self.reject_too_long(target).await;
        }

        let outgoing = outgoing(out, target, &settings);
        if let Err(e) = self.messenger.send(request.chat_id, &outgoing).await {
            return self.failed(target, "failed to send reprocessed post", &e);
        }
        self.delete_original(request).await;
        info!(
            chat_id = request.chat_id,
            message_id = target.message_id,
            "post reprocessed"
        );
        Outcome::Reprocessed
    }

    async fn restore(
        &self,
        post: &InboundPost,
        text: &str,
        entities: &[MessageEntity],
    ) -> Outcome {
        let result = match &post.media {
            Some(_) => {
                self.messenger
                    .edit_caption(post.chat_id, post.message_id, text, entities)
                    .await
            }
            None if text.trim().is_empty() => {
                return Outcome::Skipped(SkipReason::NoContent);
            }
            None => {
                self.messenger
                    .edit_text(post.chat_id, post.message_id, text, entities, true)
                    .await
            }
        };
        match result {
            Ok(()) => Outcome::OptOutRestored,
            Err(e) => self.failed(post, "failed to strip opt-out tag", &e),
        }
    }

    async fn answer_command(&self, post: &InboundPost) -> Outcome {
        let Some(reply) = commands::dispatch(self.store.as_ref(), post.chat_id, &post.text).await
        else {
            return Outcome::Skipped(SkipReason::NoSubcommand);
        };
        match self
            .messenger
            .edit_notice(post.chat_id, post.message_id, &reply)
            .await
        {
            Ok(()) => Outcome::CommandHandled,
            Err(e) => self.failed(post, "failed to answer command", &e),
        }
    }

    async fn repost_forward(&self, post: &InboundPost, settings: &ChannelSettings) -> Outcome {
        if post.text.is_empty() && !post.has_media() {
            return Outcome::Skipped(SkipReason::NoContent);
        }
        let out = self.render(post, settings).await;
        if !self.fits(post, &out.text) {
            return self.reject_too_long(post).await;
        }
        let outgoing = outgoing(out, post, settings);
        if let Err(e) = self.messenger.send(post.chat_id, &outgoing).await {
            return self.failed(post, "failed to re-post forward", &e);
        }
        self.delete_original(post).await;
        Outcome::Forwarded
    }

    async fn edit_in_place(&self, post: &InboundPost, settings: &ChannelSettings) -> Outcome {
        if post.in_media_group && post.text.is_empty() {
            return Outcome::Skipped(SkipReason::CaptionlessAlbumItem);
        }
        match &post.media {
            None if post.text.is_empty() => return Outcome::Skipped(SkipReason::NoContent),
            Some(media) if !media.kind.supports_caption() => {
                return Outcome::Skipped(SkipReason::CaptionUnsupported);
            }
            _ => {}
        }

        let out = self.render(post, settings).await;
        if out.text == post.text && out.entities == post.entities {
            return Outcome::Unchanged;
        }
        if !self.fits(post, &out.text) {
            return self.reject_too_long(post).await;
        }

        let edited = if post.has_media() {
            self.messenger
                .edit_caption(post.chat_id, post.message_id, &out.text, &out.entities)
                .await
        } else {
            self.messenger
                .edit_text(
                    post.chat_id,
                    post.message_id,
                    &out.text,
                    &out.entities,
                    settings.disable_preview,
                )
                .await
        };
        let Err(e) = edited else {
            return Outcome::Edited;
        };

        warn!(
            chat_id = post.chat_id,
            message_id = post.message_id,
            error = %e,
            "edit failed, sending a new post instead"
        );
        let outgoing = outgoing(out, post, settings);
        if let Err(e) = self.messenger.send(post.chat_id, &outgoing).await {
            return self.failed(post, "failed to send replacement post", &e);
        }
        self.delete_original(post).await;
        Outcome::Resent
    }

    /// Transform `post` with the channel's settings, attributing its forward
    /// source when the layout shows one.
    async fn render(&self, post: &InboundPost, settings: &ChannelSettings) -> Transformed {
        let shows_source = settings.forward_optimization
            && settings.forward_position != AttributionPosition::None;
        let source = match &post.forward_origin {
            Some(origin) if shows_source => {
                let source = resolve_source(origin, self.lookup.as_deref()).await;
                debug!(
                    chat_id = post.chat_id,
                    source_kind = source.kind.as_str(),
                    linked = source.url.is_some(),
                    "forward source resolved"
                );
                Some(source)
            }
            _ => None,
        };
        transform(
            &post.text,
            &post.entities,
            &settings.compiled_patterns(),
            &settings.composition_config(),
            source.as_ref(),
        )
    }

    fn fits(&self, post: &InboundPost, text: &str) -> bool {
        let limit = post.limit();
        !limit.exceeds_configured(text, self.limits.max_for(limit))
    }

    async fn reject_too_long(&self, post: &InboundPost) -> Outcome {
        warn!(
            chat_id = post.chat_id,
            message_id = post.message_id,
            "processed post exceeds the length limit"
        );
        if let Err(e) = self.messenger.send_notice(post.chat_id, TOO_LONG_NOTICE).await {
            warn!(chat_id = post.chat_id, error = %e, "failed to post length notice");
        }
        Outcome::TooLong
    }

    async fn delete_original(&self, post: &InboundPost) {
        if let Err(e) = self.messenger.delete(post.chat_id, post.message_id).await {
            warn!(
                chat_id = post.chat_id,
                message_id = post.message_id,
                error = %e,
                "failed to delete original post"
            );
        }
    }

    fn failed(
        &self,
        post: &InboundPost,
        what: &str,
        error: &TransportError,
    ) -> Outcome {
        warn!(
            chat_id = post.chat_id,
            message_id = post.message_id,
            error = %error,
            "{what}"
        );
        Outcome::Failed
    }
}

fn outgoing(out: Transformed, post: &InboundPost, settings: &ChannelSettings) -> OutgoingPost {
    OutgoingPost {
        text: out.text,
        entities: out.entities,
        media: post.media.clone(),
        disable_preview: settings.disable_preview,
    }
}
