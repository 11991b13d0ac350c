//! `/pdzs` command handlers.
//!
//! Each handler reads the channel's settings, applies one change and returns
//! an HTML reply. The reply replaces the command post in the channel.

use tracing::{info, warn};

use crate::engine::AttributionPosition;
use crate::settings::{parse_footer, ChannelSettings, PatternSpec, SettingsStore};
use crate::telegram::post::COMMAND_PREFIX;
use crate::telegram::ui::{describe_separator, escape_html, format_config, help_text};

/// A parsed `/pdzs <name> [args]` post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Subcommand, lowercased.
    pub name: String,
    /// Everything after the subcommand, trimmed. May span lines.
    pub args: &'a str,
}

/// Split a command post into subcommand and arguments.
///
/// `None` when the text is not addressed to the bot or names no subcommand.
pub fn parse_invocation(text: &str) -> Option<Invocation<'_>> {
    let rest = text.trim_start().strip_prefix(COMMAND_PREFIX)?;
    let rest = match rest.strip_prefix('@') {
        Some(mention) => mention.trim_start_matches(|c: char| !c.is_whitespace()),
        None => rest,
    };
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Some(Invocation {
        name: name.to_lowercase(),
        args: args.trim(),
    })
}

/// Run the command in `text` against `chat_id`'s settings.
///
/// Returns the HTML reply, or `None` when there is no subcommand to run.
pub async fn dispatch(store: &dyn SettingsStore, chat_id: i64, text: &str) -> Option<String> {
    let invocation = parse_invocation(text)?;
    info!(chat_id, command = %invocation.name, "handling command");
    let args = invocation.args;
    let reply = match invocation.name.as_str() {
        "footer" => handle_footer(store, chat_id, args).await,
        "delword" => handle_delword(store, chat_id, args).await,
        "forward" => handle_forward(store, chat_id, args).await,
        "dispreview" => handle_dispreview(store, chat_id, args).await,
        "sep" => handle_sep(store, chat_id, args).await,
        "viaword" => handle_viaword(store, chat_id, args).await,
        "delsys" => handle_delsys(store, chat_id, args).await,
        "config" => format_config(&store.get(chat_id).await),
        "reset" => handle_reset(store, chat_id).await,
        "help" => help_text(),
        other => format!("\u{274C} Unknown command: {}", escape_html(other)),
    };
    Some(reply)
}

/// `footer <entries>` sets the footer, `footer none` removes it.
pub async fn handle_footer(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let mut settings = store.get(chat_id).await;
    if args.eq_ignore_ascii_case("none") {
        settings.footer.enabled = false;
        settings.footer.links.clear();
        return save(store, chat_id, &settings, "\u{2705} Footer removed").await;
    }
    let content = strip_quotes(args);
    if content.is_empty() {
        return "\u{274C} Footer content cannot be empty".to_owned();
    }
    match parse_footer(content, &settings.separator) {
        Ok(links) => {
            settings.footer.enabled = true;
            settings.footer.links = links;
            let reply = format!("\u{2705} Footer set with {} entries", settings.footer.links.len());
            save(store, chat_id, &settings, &reply).await
        }
        Err(e) => format!("\u{274C} Invalid footer: {}", escape_html(&e.to_string())),
    }
}

/// `delword <pattern>|add <pattern>|enable <n>|disable <n>|none`.
pub async fn handle_delword(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    if args.is_empty() {
        return "\u{274C} Give a pattern, <code>add</code>, <code>enable</code>, <code>disable</code> or <code>none</code>".to_owned();
    }
    let mut settings = store.get(chat_id).await;
    let (first, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    let rest = rest.trim();

    match first.to_lowercase().as_str() {
        "none" if rest.is_empty() => {
            settings.banned_words.clear();
            save(store, chat_id, &settings, "\u{2705} Banned words cleared").await
        }
        "add" if !rest.is_empty() => match PatternSpec::parse(strip_quotes(rest)) {
            Ok(spec) => {
                settings.banned_words.push(spec);
                let reply = format!(
                    "\u{2705} Banned word added, {} in total",
                    settings.banned_words.len()
                );
                save(store, chat_id, &settings, &reply).await
            }
            Err(e) => pattern_error(&e),
        },
        toggle @ ("enable" | "disable") if !rest.is_empty() => {
            let enabled = toggle == "enable";
            let Some(spec) = rest
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| settings.banned_words.get_mut(i))
            else {
                return format!(
                    "\u{274C} No banned word number {}; see <code>/pdzs config</code>",
                    escape_html(rest)
                );
            };
            spec.enabled = enabled;
            let reply = format!(
                "\u{2705} Banned word <code>{}</code> {}",
                escape_html(&spec.display()),
                if enabled { "enabled" } else { "disabled" }
            );
            save(store, chat_id, &settings, &reply).await
        }
        _ => match PatternSpec::parse(strip_quotes(args)) {
            Ok(spec) => {
                settings.banned_words = vec![spec];
                save(store, chat_id, &settings, "\u{2705} Banned word set").await
            }
            Err(e) => pattern_error(&e),
        },
    }
}

/// `forward off|none|newline|inline`.
pub async fn handle_forward(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let value = first_word(args).to_lowercase();
    let position = match value.as_str() {
        "off" | "none" => AttributionPosition::None,
        "newline" => AttributionPosition::Newline,
        "inline" => AttributionPosition::Inline,
        _ => return "\u{274C} Use one of off, none, newline, inline".to_owned(),
    };
    let mut settings = store.get(chat_id).await;
    settings.forward_optimization = value != "off";
    settings.forward_position = position;
    let reply = if settings.forward_optimization {
        format!("\u{2705} Forward optimization on ({})", position.as_str())
    } else {
        "\u{2705} Forward optimization off".to_owned()
    };
    save(store, chat_id, &settings, &reply).await
}

/// `dispreview on|off`: `on` suppresses link previews.
pub async fn handle_dispreview(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let Some(on) = parse_switch(args) else {
        return "\u{274C} Use on or off".to_owned();
    };
    let mut settings = store.get(chat_id).await;
    settings.disable_preview = on;
    let reply = if on {
        "\u{2705} Link previews disabled"
    } else {
        "\u{2705} Link previews enabled"
    };
    save(store, chat_id, &settings, reply).await
}

/// `sep <text>`; `sep none` selects a single space.
pub async fn handle_sep(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let value = first_word(args);
    if value.is_empty() {
        return "\u{274C} Give a separator".to_owned();
    }
    let mut settings = store.get(chat_id).await;
    settings.separator = if value.eq_ignore_ascii_case("none") {
        " ".to_owned()
    } else {
        value.to_owned()
    };
    let reply = format!(
        "\u{2705} Separator set to {}",
        describe_separator(&settings.separator)
    );
    save(store, chat_id, &settings, &reply).await
}

/// `viaword <text…>`; words are joined by single spaces.
pub async fn handle_viaword(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let value = args.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() {
        return "\u{274C} Give the text to show before the source name".to_owned();
    }
    let mut settings = store.get(chat_id).await;
    let reply = format!("\u{2705} Source prefix set to \"{}\"", escape_html(&value));
    settings.via_word = value;
    save(store, chat_id, &settings, &reply).await
}

/// `delsys on|off`.
pub async fn handle_delsys(store: &dyn SettingsStore, chat_id: i64, args: &str) -> String {
    let Some(on) = parse_switch(args) else {
        return "\u{274C} Use on or off".to_owned();
    };
    let mut settings = store.get(chat_id).await;
    settings.delete_system_messages = on;
    let reply = if on {
        "\u{2705} Service messages will be deleted"
    } else {
        "\u{2705} Service messages will be kept"
    };
    save(store, chat_id, &settings, reply).await
}

/// `reset`: drop the stored record.
pub async fn handle_reset(store: &dyn SettingsStore, chat_id: i64) -> String {
    match store.clear(chat_id).await {
        Ok(_) => "\u{2705} Settings restored to defaults".to_owned(),
        Err(e) => {
            warn!(chat_id, error = %e, "failed to reset settings");
            "\u{274C} Reset failed".to_owned()
        }
    }
}

async fn save(
    store: &dyn SettingsStore,
    chat_id: i64,
    settings: &ChannelSettings,
    reply: &str,
) -> String {
    match store.set(chat_id, settings).await {
        Ok(()) => reply.to_owned(),
        Err(e) => {
            warn!(chat_id, error = %e, "failed to save settings");
            "\u{274C} Failed to save settings".to_owned()
        }
    }
}

fn pattern_error(e: &crate::settings::PatternError) -> String {
    format!("\u{274C} Invalid pattern: {}", escape_html(&e.to_string()))
}

fn parse_switch(args: &str) -> Option<bool> {
    match first_word(args).to_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn first_word(args: &str) -> &str {
    args.split_whitespace().next().unwrap_or_default()
}

/// Drop one pair of surrounding double quotes.
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(value)
}
