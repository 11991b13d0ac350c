//! HTML text for command replies and notices.
//!
//! All output uses HTML parse mode.

use crate::settings::{render_footer_markup, ChannelSettings};

/// Notice posted when processed output would exceed Telegram's limit.
pub const TOO_LONG_NOTICE: &str =
    "\u{274C} This post is too long to process. Shorten it and try again.";

/// Reply to private chats that are not asking for help.
pub const CHANNELS_ONLY_NOTICE: &str =
    "This bot only works in channels. Send /help for usage.";

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Usage text for `/pdzs help` and private `/help`.
pub fn help_text() -> String {
    [
        "<b>pdzs: channel post editor</b>",
        "",
        "Add the bot to a channel as an admin that can post, edit and delete messages, then configure it there:",
        "",
        "/pdzs footer &lt;entries&gt; — append a footer. Entries are split by the separator; <code>[label](url)</code> makes a link",
        "/pdzs footer none — remove the footer",
        "/pdzs delword &lt;pattern&gt; — replace banned words with one pattern (<code>/body/flags</code> or bare, case-insensitive)",
        "/pdzs delword add &lt;pattern&gt; — add a banned word",
        "/pdzs delword enable|disable &lt;n&gt; — toggle banned word number n",
        "/pdzs delword none — clear banned words",
        "/pdzs forward off|none|newline|inline — re-post forwards with a source line",
        "/pdzs dispreview on|off — suppress link previews",
        "/pdzs sep &lt;text&gt;|none — footer separator (none is a space)",
        "/pdzs viaword &lt;text&gt; — prefix before the source name",
        "/pdzs delsys on|off — delete service messages",
        "/pdzs config — show the current settings",
        "/pdzs reset — restore defaults",
        "/pdzs help — show this message",
        "",
        "End a post with <code>nopdzs</code> to leave it untouched.",
        "Reply to a post with <code>/pdzs</code> to process it again.",
    ]
    .join("\n")
}

/// Render a channel's settings for `/pdzs config`.
pub fn format_config(settings: &ChannelSettings) -> String {
    let mut lines = vec!["<b>Channel settings</b>".to_owned(), String::new()];

    lines.push(format!("<b>Footer:</b> {}", on_off(settings.footer.enabled)));
    if settings.footer.enabled {
        let markup = render_footer_markup(&settings.footer.links, &settings.separator);
        lines.push(format!("  <code>{}</code>", escape_html(&markup)));
    }

    if settings.banned_words.is_empty() {
        lines.push("<b>Banned words:</b> none".to_owned());
    } else {
        lines.push(format!(
            "<b>Banned words:</b> {}",
            settings.banned_words.len()
        ));
        for (i, spec) in settings.banned_words.iter().enumerate() {
            let state = if spec.enabled { "" } else { " (disabled)" };
            lines.push(format!(
                "  {}. <code>{}</code>{state}",
                i.saturating_add(1),
                escape_html(&spec.display())
            ));
        }
    }

    lines.push(format!(
        "<b>Forward optimization:</b> {}",
        on_off(settings.forward_optimization)
    ));
    if settings.forward_optimization {
        lines.push(format!(
            "  position: {}",
            settings.forward_position.as_str()
        ));
    }
    lines.push(format!(
        "<b>Link preview:</b> {}",
        if settings.disable_preview {
            "disabled"
        } else {
            "enabled"
        }
    ));
    lines.push(format!(
        "<b>Separator:</b> {}",
        describe_separator(&settings.separator)
    ));
    lines.push(format!(
        "<b>Source prefix:</b> \"{}\"",
        escape_html(&settings.via_word)
    ));
    lines.push(format!(
        "<b>Delete service messages:</b> {}",
        on_off(settings.delete_system_messages)
    ));

    lines.join("\n")
}

/// How a separator reads in replies; a lone space is named.
pub fn describe_separator(separator: &str) -> String {
    if separator == " " {
        "space".to_owned()
    } else {
        format!("\"{}\"", escape_html(separator))
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
