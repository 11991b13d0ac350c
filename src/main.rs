//! pdzs CLI entry point.
//!
//! Provides `start` to run the bot, plus `show`, `reset` and `preview` for
//! inspecting and exercising a channel's stored settings offline.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use pdzs::config::{load_env_file, runtime_paths, Config, RuntimePaths};
use pdzs::settings::{SettingsStore, SqliteSettingsStore};

/// pdzs: channel post editor bot for Telegram.
#[derive(Parser)]
#[command(name = "pdzs", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the bot.
    Start,
    /// Print a channel's settings as JSON.
    Show {
        /// Channel chat id, e.g. -1001234567890.
        #[arg(long, allow_negative_numbers = true)]
        chat: i64,
    },
    /// Restore a channel's settings to defaults.
    Reset {
        /// Channel chat id.
        #[arg(long, allow_negative_numbers = true)]
        chat: i64,
    },
    /// Run the transformation on TEXT with a channel's settings and print the result.
    Preview {
        /// Channel chat id.
        #[arg(long, allow_negative_numbers = true)]
        chat: i64,
        /// Post text to transform.
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start => handle_start().await,
        Command::Show { chat } => handle_show(chat).await,
        Command::Reset { chat } => handle_reset(chat).await,
        Command::Preview { chat, text } => handle_preview(chat, &text).await,
    }
}

/// Run the bot with production logging.
async fn handle_start() -> anyhow::Result<()> {
    let paths = runtime_paths()?;
    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("failed to create {}", paths.root.display()))?;

    let _logging_guard = pdzs::logging::init_production(&paths.logs_dir)?;

    let config = load_config(&paths)?;
    let token = config.bot_token(|key| std::env::var(key).ok())?;
    let store = open_store(&config, &paths).await?;

    info!(
        database = %config.database_path(&paths).display(),
        "pdzs starting"
    );

    pdzs::telegram::run_bot(&token, Arc::new(config), store).await
}

/// Print a channel's settings.
async fn handle_show(chat: i64) -> anyhow::Result<()> {
    pdzs::logging::init_cli();
    let paths = runtime_paths()?;
    let config = load_config(&paths)?;
    let store = open_store(&config, &paths).await?;

    let settings = store.get(chat).await;
    let json = serde_json::to_string_pretty(&settings).context("failed to serialize settings")?;
    println!("{json}");
    Ok(())
}

/// Clear a channel's settings.
async fn handle_reset(chat: i64) -> anyhow::Result<()> {
    pdzs::logging::init_cli();
    let paths = runtime_paths()?;
    let config = load_config(&paths)?;
    let store = open_store(&config, &paths).await?;

    let removed = store
        .clear(chat)
        .await
        .with_context(|| format!("failed to reset settings for chat {chat}"))?;
    info!(chat_id = chat, removed, "settings reset");
    Ok(())
}

/// Transform `text` as the bot would for `chat`, without a forward source.
async fn handle_preview(chat: i64, text: &str) -> anyhow::Result<()> {
    pdzs::logging::init_cli();
    let paths = runtime_paths()?;
    let config = load_config(&paths)?;
    let store = open_store(&config, &paths).await?;

    let settings = store.get(chat).await;
    let out = pdzs::engine::transform(
        text,
        &[],
        &settings.compiled_patterns(),
        &settings.composition_config(),
        None,
    );
    let json = serde_json::json!({
        "text": out.text,
        "entities": out.entities,
        "length": pdzs::engine::utf16_len(&out.text),
    });
    let rendered = serde_json::to_string_pretty(&json).context("failed to serialize preview")?;
    println!("{rendered}");
    Ok(())
}

fn load_config(paths: &RuntimePaths) -> anyhow::Result<Config> {
    load_env_file(&paths.env_file)?;
    Config::load().context("failed to load configuration")
}

async fn open_store(
    config: &Config,
    paths: &RuntimePaths,
) -> anyhow::Result<Arc<dyn SettingsStore>> {
    let db_path = config.database_path(paths);
    let store = SqliteSettingsStore::open(&db_path)
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    Ok(Arc::new(store))
}
