//! Telegram adapter: post extraction, source resolution, commands and the bot dispatcher.
//!
//! Channel posts go through [`processor::PostProcessor`]; private chats only
//! get usage help. Everything else is ignored.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info};

use crate::config::Config;
use crate::settings::SettingsStore;

pub mod commands;
pub mod post;
pub mod processor;
pub mod source;
pub mod transport;
pub mod ui;

use self::post::InboundPost;
use self::processor::PostProcessor;
use self::source::InviteLinkLookup;
use self::transport::{Messenger, TeloxideMessenger};

// ---------------------------------------------------------------------------
// Shared state for handler injection
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    processor: Arc<PostProcessor>,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the bot until Ctrl+C.
///
/// # Errors
///
/// Currently infallible once started; the signature leaves room for startup checks.
pub async fn run_bot(
    bot_token: &str,
    config: Arc<Config>,
    store: Arc<dyn SettingsStore>,
) -> anyhow::Result<()> {
    let bot = Bot::new(bot_token);

    let live = Arc::new(TeloxideMessenger::new(bot.clone()));
    let messenger: Arc<dyn Messenger> = live.clone();
    let lookup: Arc<dyn InviteLinkLookup> = live;
    let processor =
        PostProcessor::new(store, messenger, config.limits.clone()).with_lookup(lookup);

    let shared = SharedState {
        processor: Arc::new(processor),
    };

    let handler = dptree::entry()
        .branch(Update::filter_channel_post().endpoint(handle_channel_post))
        .branch(Update::filter_message().endpoint(handle_private_message));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_channel_post(msg: Message, state: SharedState) -> ResponseResult<()> {
    let post = InboundPost::from_message(&msg);
    debug!(
        chat_id = post.chat_id,
        message_id = post.message_id,
        forwarded = post.is_forwarded(),
        "channel post received"
    );
    state.processor.process(&post).await;
    Ok(())
}

/// Private chats get help on `/help` and a pointer to it otherwise.
async fn handle_private_message(bot: Bot, msg: Message) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let reply = private_reply(msg.text().unwrap_or_default());
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Reply text for a private message.
pub fn private_reply(text: &str) -> String {
    let command = text.trim().split('@').next().unwrap_or_default();
    if command.eq_ignore_ascii_case("/help") || command.eq_ignore_ascii_case("/start") {
        ui::help_text()
    } else {
        ui::CHANNELS_ONLY_NOTICE.to_owned()
    }
}
