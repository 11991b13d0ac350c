//! Reply text shown to admins and private chats.

use pdzs::engine::LinkSegment;
use pdzs::settings::ChannelSettings;
use pdzs::telegram::private_reply;
use pdzs::telegram::ui::{escape_html, format_config, help_text, CHANNELS_ONLY_NOTICE};
use url::Url;

#[test]
fn html_special_characters_are_escaped() {
    assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn help_covers_every_command() {
    let help = help_text();
    for command in [
        "footer", "delword", "forward", "dispreview", "sep", "viaword", "delsys", "config",
        "reset", "help",
    ] {
        assert!(
            help.contains(&format!("/pdzs {command}")),
            "help is missing {command}"
        );
    }
    assert!(help.contains("nopdzs"));
}

#[test]
fn private_chats_get_help_or_a_pointer() {
    assert_eq!(private_reply("/help"), help_text());
    assert_eq!(private_reply("/start"), help_text());
    assert_eq!(private_reply("/help@pdzs_bot"), help_text());
    assert_eq!(private_reply("hello"), CHANNELS_ONLY_NOTICE);
}

#[test]
fn config_shows_footer_markup_and_switches() {
    let mut settings = ChannelSettings::default();
    settings.footer.enabled = true;
    settings.footer.links = vec![
        LinkSegment::linked("Site", Url::parse("https://example.org").expect("url")),
        LinkSegment::plain("Chat"),
    ];
    settings.delete_system_messages = true;

    let html = format_config(&settings);
    assert!(html.contains("<b>Footer:</b> on"), "{html}");
    assert!(html.contains("[Site](https://example.org/)"), "{html}");
    assert!(html.contains("<b>Delete service messages:</b> on"), "{html}");
    assert!(html.contains("<b>Forward optimization:</b> off"), "{html}");
    assert!(html.contains("<b>Banned words:</b> none"), "{html}");
}
