//! Post pipeline decisions and the requests they produce.

use std::sync::Arc;

use pdzs::config::LimitsConfig;
use pdzs::engine::{AttributionPosition, LinkSegment};
use pdzs::settings::{ChannelSettings, PatternSpec};
use pdzs::telegram::post::{ForwardOrigin, InboundPost, MediaKind, MediaRef};
use pdzs::telegram::processor::{Outcome, PostProcessor, SkipReason};
use pdzs::telegram::transport::OutgoingPost;
use pdzs::telegram::ui::TOO_LONG_NOTICE;
use teloxide::types::MessageEntity;
use url::Url;

use super::fakes::{processor, Call, FixedLookup, MemoryStore, RecordingMessenger};

const CHAT: i64 = -1_001_234_567_890;

fn url(s: &str) -> Url {
    Url::parse(s).expect("valid test url")
}

fn with_footer(label: &str) -> ChannelSettings {
    let mut settings = ChannelSettings::default();
    settings.footer.enabled = true;
    settings.footer.links = vec![LinkSegment::plain(label)];
    settings
}

fn forwarding(position: AttributionPosition) -> ChannelSettings {
    let mut settings = ChannelSettings::default();
    settings.forward_optimization = true;
    settings.forward_position = position;
    settings
}

fn public_channel() -> ForwardOrigin {
    ForwardOrigin::Channel {
        chat_id: -1_009_999,
        title: Some("News".to_owned()),
        username: Some("news".to_owned()),
        message_id: 42,
    }
}

fn private_channel() -> ForwardOrigin {
    ForwardOrigin::Channel {
        chat_id: -1_001_111_111_111,
        title: Some("Secret".to_owned()),
        username: None,
        message_id: 7,
    }
}

fn post(text: &str) -> InboundPost {
    InboundPost::text(CHAT, 100, text)
}

fn with_media(text: &str, kind: MediaKind) -> InboundPost {
    InboundPost {
        media: Some(MediaRef::new(kind, "file-1")),
        ..post(text)
    }
}

fn forwarded(text: &str, origin: ForwardOrigin) -> InboundPost {
    InboundPost {
        forward_origin: Some(origin),
        ..post(text)
    }
}

fn setup(settings: ChannelSettings) -> (Arc<MemoryStore>, Arc<RecordingMessenger>) {
    (
        Arc::new(MemoryStore::with(CHAT, settings)),
        Arc::new(RecordingMessenger::default()),
    )
}

#[tokio::test]
async fn text_post_is_edited_with_footer() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&post("Hello"))
        .await;
    assert_eq!(outcome, Outcome::Edited);
    assert_eq!(
        messenger.calls(),
        vec![Call::EditText {
            chat_id: CHAT,
            message_id: 100,
            text: "Hello\n\nFooter".to_owned(),
            entities: vec![],
            disable_preview: true,
        }]
    );
}

#[tokio::test]
async fn media_caption_is_redacted() {
    let mut settings = ChannelSettings::default();
    settings.banned_words = vec![PatternSpec::plain("spam ")];
    let (store, messenger) = setup(settings);
    let mut photo = with_media("Nice spam pic", MediaKind::Photo);
    photo.entities = vec![MessageEntity::bold(10, 3)];

    let outcome = processor(store, messenger.clone()).process(&photo).await;
    assert_eq!(outcome, Outcome::Edited);
    assert_eq!(
        messenger.calls(),
        vec![Call::EditCaption {
            chat_id: CHAT,
            message_id: 100,
            caption: "Nice pic".to_owned(),
            entities: vec![MessageEntity::bold(5, 3)],
        }]
    );
}

#[tokio::test]
async fn unchanged_post_is_not_touched() {
    let (store, messenger) = setup(ChannelSettings::default());
    let outcome = processor(store, messenger.clone())
        .process(&post("Hello"))
        .await;
    assert_eq!(outcome, Outcome::Unchanged);
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn post_already_carrying_footer_is_skipped() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&post("Hello\n\nFooter"))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::AlreadyProcessed));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn failed_edit_falls_back_to_send_and_delete() {
    let store = Arc::new(MemoryStore::with(CHAT, with_footer("Footer")));
    let messenger = Arc::new(RecordingMessenger::failing_edits());
    let outcome = processor(store, messenger.clone())
        .process(&post("Hello"))
        .await;
    assert_eq!(outcome, Outcome::Resent);

    let calls = messenger.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], Call::EditText { .. }));
    assert_eq!(
        calls[1],
        Call::Send {
            chat_id: CHAT,
            post: OutgoingPost {
                text: "Hello\n\nFooter".to_owned(),
                entities: vec![],
                media: None,
                disable_preview: true,
            },
        }
    );
    assert_eq!(
        calls[2],
        Call::Delete {
            chat_id: CHAT,
            message_id: 100
        }
    );
}

#[tokio::test]
async fn over_length_output_posts_a_notice() {
    let (store, messenger) = setup(with_footer("Footer"));
    let long = "x".repeat(4090);
    let outcome = processor(store, messenger.clone())
        .process(&post(&long))
        .await;
    assert_eq!(outcome, Outcome::TooLong);
    assert_eq!(
        messenger.calls(),
        vec![Call::SendNotice {
            chat_id: CHAT,
            html: TOO_LONG_NOTICE.to_owned(),
        }]
    );
}

#[tokio::test]
async fn caption_limit_applies_to_media() {
    let (store, messenger) = setup(with_footer("Footer"));
    let long = "x".repeat(1020);
    let outcome = processor(store, messenger.clone())
        .process(&with_media(&long, MediaKind::Video))
        .await;
    assert_eq!(outcome, Outcome::TooLong);
}

#[tokio::test]
async fn forward_is_reposted_with_newline_attribution() {
    let (store, messenger) = setup(forwarding(AttributionPosition::Newline));
    let outcome = processor(store, messenger.clone())
        .process(&forwarded("Hello", public_channel()))
        .await;
    assert_eq!(outcome, Outcome::Forwarded);
    assert_eq!(
        messenger.calls(),
        vec![
            Call::Send {
                chat_id: CHAT,
                post: OutgoingPost {
                    text: "Hello\n\nvia News".to_owned(),
                    entities: vec![MessageEntity::text_link(url("https://t.me/news/42"), 11, 4)],
                    media: None,
                    disable_preview: true,
                },
            },
            Call::Delete {
                chat_id: CHAT,
                message_id: 100
            },
        ]
    );
}

#[tokio::test]
async fn inline_attribution_joins_the_footer_line() {
    let mut settings = forwarding(AttributionPosition::Inline);
    settings.footer.enabled = true;
    settings.footer.links = vec![LinkSegment::plain("Footer")];
    let (store, messenger) = setup(settings);
    processor(store, messenger.clone())
        .process(&forwarded("Hello", public_channel()))
        .await;
    let calls = messenger.calls();
    let Call::Send { post, .. } = &calls[0] else {
        panic!("expected a send first");
    };
    assert_eq!(post.text, "Hello\n\nFooter | via News");
}

#[tokio::test]
async fn forward_without_shown_source_skips_lookup() {
    let (store, messenger) = setup(forwarding(AttributionPosition::None));
    let lookup = Arc::new(FixedLookup::new(Some("https://t.me/+abc")));
    let outcome = processor(store, messenger.clone())
        .with_lookup(lookup.clone())
        .process(&forwarded("Hello", private_channel()))
        .await;
    assert_eq!(outcome, Outcome::Forwarded);
    assert!(lookup.asked.lock().expect("lookup lock").is_empty());
    let calls = messenger.calls();
    let Call::Send { post, .. } = &calls[0] else {
        panic!("expected a send first");
    };
    assert_eq!(post.text, "Hello");
}

#[tokio::test]
async fn private_source_uses_invite_link() {
    let (store, messenger) = setup(forwarding(AttributionPosition::Newline));
    let lookup = Arc::new(FixedLookup::new(Some("https://t.me/+abc")));
    processor(store, messenger.clone())
        .with_lookup(lookup.clone())
        .process(&forwarded("Hi", private_channel()))
        .await;
    assert_eq!(
        *lookup.asked.lock().expect("lookup lock"),
        vec![-1_001_111_111_111]
    );
    let calls = messenger.calls();
    let Call::Send { post, .. } = &calls[0] else {
        panic!("expected a send first");
    };
    assert_eq!(
        post.entities,
        vec![MessageEntity::text_link(url("https://t.me/+abc"), 8, 6)]
    );
}

#[tokio::test]
async fn private_source_without_lookup_gets_deep_link() {
    let (store, messenger) = setup(forwarding(AttributionPosition::Newline));
    processor(store, messenger.clone())
        .process(&forwarded("Hi", private_channel()))
        .await;
    let calls = messenger.calls();
    let Call::Send { post, .. } = &calls[0] else {
        panic!("expected a send first");
    };
    assert_eq!(
        post.entities,
        vec![MessageEntity::text_link(url("https://t.me/c/1111111111/7"), 8, 6)]
    );
}

#[tokio::test]
async fn failed_repost_keeps_the_original() {
    let store = Arc::new(MemoryStore::with(
        CHAT,
        forwarding(AttributionPosition::Newline),
    ));
    let messenger = Arc::new(RecordingMessenger::failing_sends());
    let outcome = processor(store, messenger.clone())
        .process(&forwarded("Hello", public_channel()))
        .await;
    assert_eq!(outcome, Outcome::Failed);
    assert!(!messenger
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Delete { .. })));
}

#[tokio::test]
async fn forward_without_optimization_is_edited_in_place() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&forwarded("Hello", public_channel()))
        .await;
    assert_eq!(outcome, Outcome::Edited);
}

#[tokio::test]
async fn forwarded_album_is_left_alone() {
    let (store, messenger) = setup(forwarding(AttributionPosition::Newline));
    let mut item = forwarded("Caption", public_channel());
    item.media = Some(MediaRef::new(MediaKind::Photo, "file-1"));
    item.in_media_group = true;
    let outcome = processor(store, messenger.clone()).process(&item).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::ForwardedAlbum));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn captionless_album_item_is_skipped() {
    let (store, messenger) = setup(with_footer("Footer"));
    let mut item = with_media("", MediaKind::Photo);
    item.in_media_group = true;
    let outcome = processor(store, messenger.clone()).process(&item).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::CaptionlessAlbumItem));
}

#[tokio::test]
async fn sticker_cannot_be_edited() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&with_media("", MediaKind::Sticker))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::CaptionUnsupported));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn empty_post_is_skipped() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&post(""))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoContent));
}

#[tokio::test]
async fn opt_out_tag_is_stripped_and_nothing_else() {
    let (store, messenger) = setup(with_footer("Footer"));
    let mut tagged = post("Hello world nopdzs");
    tagged.entities = vec![MessageEntity::bold(6, 5)];
    let outcome = processor(store, messenger.clone()).process(&tagged).await;
    assert_eq!(outcome, Outcome::OptOutRestored);
    assert_eq!(
        messenger.calls(),
        vec![Call::EditText {
            chat_id: CHAT,
            message_id: 100,
            text: "Hello world".to_owned(),
            entities: vec![MessageEntity::bold(6, 5)],
            disable_preview: true,
        }]
    );
}

#[tokio::test]
async fn opt_out_on_media_edits_the_caption() {
    let (store, messenger) = setup(ChannelSettings::default());
    let outcome = processor(store, messenger.clone())
        .process(&with_media("Look nopdzs", MediaKind::Photo))
        .await;
    assert_eq!(outcome, Outcome::OptOutRestored);
    assert!(matches!(
        &messenger.calls()[0],
        Call::EditCaption { caption, .. } if caption == "Look"
    ));
}

#[tokio::test]
async fn bare_opt_out_tag_on_text_is_skipped() {
    let (store, messenger) = setup(ChannelSettings::default());
    let outcome = processor(store, messenger.clone())
        .process(&post("nopdzs"))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoContent));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn opt_out_tag_on_forward_is_not_honoured() {
    let (store, messenger) = setup(with_footer("Footer"));
    let outcome = processor(store, messenger.clone())
        .process(&forwarded("Hello nopdzs", public_channel()))
        .await;
    assert_eq!(outcome, Outcome::Edited);
}

#[tokio::test]
async fn command_updates_settings_and_replaces_the_post() {
    let (store, messenger) = setup(ChannelSettings::default());
    let outcome = processor(store.clone(), messenger.clone())
        .process(&post("/pdzs sep -"))
        .await;
    assert_eq!(outcome, Outcome::CommandHandled);
    assert_eq!(store.stored(CHAT).expect("saved").separator, "-");
    assert!(matches!(
        &messenger.calls()[0],
        Call::EditNotice { message_id: 100, html, .. } if html.starts_with('\u{2705}')
    ));
}

#[tokio::test]
async fn bare_command_without_reply_is_skipped() {
    let (store, messenger) = setup(ChannelSettings::default());
    let outcome = processor(store, messenger.clone())
        .process(&post("/pdzs"))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoSubcommand));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn reply_with_bare_command_reprocesses_the_target() {
    let (store, messenger) = setup(with_footer("Footer"));
    let target = InboundPost {
        message_id: 50,
        ..with_media("Old post", MediaKind::Photo)
    };
    let request = InboundPost {
        message_id: 51,
        reply_to: Some(Box::new(target)),
        ..post("/pdzs")
    };
    let outcome = processor(store, messenger.clone()).process(&request).await;
    assert_eq!(outcome, Outcome::Reprocessed);
    assert_eq!(
        messenger.calls(),
        vec![
            Call::Send {
                chat_id: CHAT,
                post: OutgoingPost {
                    text: "Old post\n\nFooter".to_owned(),
                    entities: vec![],
                    media: Some(MediaRef::new(MediaKind::Photo, "file-1")),
                    disable_preview: true,
                },
            },
            Call::Delete {
                chat_id: CHAT,
                message_id: 51
            },
        ]
    );
}

#[tokio::test]
async fn service_message_is_deleted_when_enabled() {
    let mut settings = ChannelSettings::default();
    settings.delete_system_messages = true;
    let (store, messenger) = setup(settings);
    let pin = InboundPost {
        is_system: true,
        ..post("")
    };
    let outcome = processor(store, messenger.clone()).process(&pin).await;
    assert_eq!(outcome, Outcome::SystemDeleted);
    assert_eq!(
        messenger.calls(),
        vec![Call::Delete {
            chat_id: CHAT,
            message_id: 100
        }]
    );
}

#[tokio::test]
async fn service_message_is_kept_by_default() {
    let (store, messenger) = setup(ChannelSettings::default());
    let pin = InboundPost {
        is_system: true,
        ..post("")
    };
    let outcome = processor(store, messenger.clone()).process(&pin).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::ServiceMessage));
    assert!(messenger.calls().is_empty());
}

#[tokio::test]
async fn link_previews_follow_the_setting() {
    let mut settings = with_footer("Footer");
    settings.disable_preview = false;
    let (store, messenger) = setup(settings);
    processor(store, messenger.clone())
        .process(&post("https://example.org"))
        .await;
    assert!(matches!(
        &messenger.calls()[0],
        Call::EditText {
            disable_preview: false,
            ..
        }
    ));
}

#[tokio::test]
async fn configured_text_limit_applies_below_telegram_maximum() {
    let (store, messenger) = setup(with_footer("Footer"));
    let limits = LimitsConfig {
        max_text_length: 12,
        ..LimitsConfig::default()
    };
    let processor = PostProcessor::new(store, messenger.clone(), limits);

    // "Hi\n\nFooter" is 10 units
    assert_eq!(processor.process(&post("Hi")).await, Outcome::Edited);
    // "Hello\n\nFooter" is 13 units
    assert_eq!(processor.process(&post("Hello")).await, Outcome::TooLong);
    assert!(matches!(
        messenger.calls().last(),
        Some(Call::SendNotice { .. })
    ));
}
