//! Footer definitions: parsing admin input into link segments and rendering them back.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::engine::LinkSegment;

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("markdown link pattern is valid")
});

/// Errors from parsing a footer definition.
#[derive(Debug, thiserror::Error)]
pub enum FooterError {
    /// No segment survived parsing.
    #[error("footer has no content")]
    Empty,

    /// A `[label](url)` segment carried a URL that does not parse.
    #[error("invalid link for {label:?}: {url}")]
    InvalidUrl {
        /// Label of the offending segment.
        label: String,
        /// The URL as written.
        url: String,
        /// Why it was rejected.
        #[source]
        source: url::ParseError,
    },
}

/// Parse a footer definition into ordered segments.
///
/// Each line is split on `separator`; every trimmed part becomes one segment.
/// A part containing `[label](url)` is a link (`url` of `none` means no link),
/// anything else non-empty is plain text.
///
/// # Errors
///
/// Returns [`FooterError::InvalidUrl`] for an unparseable link target and
/// [`FooterError::Empty`] when nothing remains.
pub fn parse_footer(input: &str, separator: &str) -> Result<Vec<LinkSegment>, FooterError> {
    let mut segments = Vec::new();
    for line in input.lines() {
        let parts: Vec<&str> = if separator.is_empty() {
            vec![line]
        } else {
            line.split(separator).collect()
        };
        for part in parts.into_iter().map(str::trim) {
            if let Some(caps) = MARKDOWN_LINK.captures(part) {
                let label = caps[1].trim().to_owned();
                let target = caps[2].trim();
                if target.eq_ignore_ascii_case("none") {
                    segments.push(LinkSegment::plain(label));
                    continue;
                }
                let url = Url::parse(target).map_err(|source| FooterError::InvalidUrl {
                    label: label.clone(),
                    url: target.to_owned(),
                    source,
                })?;
                segments.push(LinkSegment::linked(label, url));
            } else if !part.is_empty() {
                segments.push(LinkSegment::plain(part));
            }
        }
    }
    if segments.is_empty() {
        return Err(FooterError::Empty);
    }
    Ok(segments)
}

/// Visible footer text: labels joined by the padded separator.
pub fn render_footer(links: &[LinkSegment], separator: &str) -> String {
    let joiner = format!(" {separator} ");
    links
        .iter()
        .map(|link| link.label.as_str())
        .collect::<Vec<_>>()
        .join(&joiner)
}

/// Footer as `[label](url)` markup, the form accepted by [`parse_footer`].
pub fn render_footer_markup(links: &[LinkSegment], separator: &str) -> String {
    let joiner = format!(" {separator} ");
    links
        .iter()
        .map(|link| match &link.url {
            Some(url) => format!("[{}]({url})", link.label),
            None => link.label.clone(),
        })
        .collect::<Vec<_>>()
        .join(&joiner)
}
