//! Assembly of the final post body: text, attribution line and footer.
//!
//! Offsets of generated link entities come from a single UTF-16 cursor that
//! advances with every fragment appended. The assembled string is never
//! searched to find where a segment landed.

use serde::{Deserialize, Serialize};
use teloxide::types::MessageEntity;
use url::Url;

use super::position::utf16_len;
use super::source::SourceDescriptor;

/// Paragraph break between body, attribution and footer.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Default footer separator.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Default text placed before the source name.
pub const DEFAULT_ATTRIBUTION_PREFIX: &str = "via ";

/// A labelled footer entry, optionally linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSegment {
    /// Visible text.
    pub label: String,
    /// Target of the link covering `label`, if any.
    pub url: Option<Url>,
}

impl LinkSegment {
    /// A segment linking `label` to `url`.
    pub fn linked(label: impl Into<String>, url: Url) -> Self {
        Self {
            label: label.into(),
            url: Some(url),
        }
    }

    /// A plain text segment.
    pub fn plain(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
        }
    }
}

/// Where the attribution goes relative to the footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributionPosition {
    /// No attribution.
    #[default]
    None,
    /// Appended to the footer line, or as the last paragraph without a footer.
    Inline,
    /// A paragraph of its own between the body and the footer.
    Newline,
}

impl AttributionPosition {
    /// Lowercase name as used by the `forward` command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Inline => "inline",
            Self::Newline => "newline",
        }
    }
}

/// Everything composition needs to know about a channel's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionConfig {
    /// Whether the footer is appended.
    pub footer_enabled: bool,
    /// Footer entries in display order.
    pub footer_links: Vec<LinkSegment>,
    /// Text placed (with a space on each side) between footer entries.
    pub separator: String,
    /// Whether forwarded posts get an attribution.
    pub attribution_enabled: bool,
    /// Layout of the attribution.
    pub attribution_position: AttributionPosition,
    /// Text placed before the source name.
    pub attribution_prefix: String,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            footer_enabled: false,
            footer_links: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_owned(),
            attribution_enabled: false,
            attribution_position: AttributionPosition::None,
            attribution_prefix: DEFAULT_ATTRIBUTION_PREFIX.to_owned(),
        }
    }
}

impl CompositionConfig {
    /// Separator with its surrounding spaces, as placed between footer entries.
    pub fn joiner(&self) -> String {
        format!(" {} ", self.separator)
    }

    fn has_footer(&self) -> bool {
        self.footer_enabled && !self.footer_links.is_empty()
    }

    fn attribution<'a>(
        &self,
        position: AttributionPosition,
        source: Option<&'a SourceDescriptor>,
    ) -> Option<&'a SourceDescriptor> {
        if !self.attribution_enabled || self.attribution_position != position {
            return None;
        }
        source.filter(|s| !s.display_name.is_empty())
    }
}

/// Final body and the entities describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    /// Complete post text.
    pub text: String,
    /// Original entities followed by the generated link entities.
    pub entities: Vec<MessageEntity>,
}

/// Append the attribution and footer configured in `config` to `text`.
///
/// `entities` must already be anchored to `text`; they are carried over
/// unchanged and the generated links follow them in layout order.
pub fn compose(
    text: &str,
    entities: &[MessageEntity],
    config: &CompositionConfig,
    source: Option<&SourceDescriptor>,
) -> Composed {
    let mut body = Body::new(text, entities);

    if let Some(src) = config.attribution(AttributionPosition::Newline, source) {
        body.paragraph();
        body.push(&config.attribution_prefix);
        body.push_linked(&src.display_name, src.url.as_ref());
    }

    let has_footer = config.has_footer();
    if has_footer {
        let joiner = config.joiner();
        body.paragraph();
        for (index, link) in config.footer_links.iter().enumerate() {
            if index > 0 {
                body.push(&joiner);
            }
            body.push_linked(&link.label, link.url.as_ref());
        }
    }

    if let Some(src) = config.attribution(AttributionPosition::Inline, source) {
        if has_footer {
            body.push(&config.joiner());
        } else {
            body.paragraph();
        }
        body.push(&config.attribution_prefix);
        body.push_linked(&src.display_name, src.url.as_ref());
    }

    body.finish()
}

/// Output buffer with its UTF-16 cursor.
struct Body {
    text: String,
    cursor: usize,
    entities: Vec<MessageEntity>,
}

impl Body {
    fn new(text: &str, entities: &[MessageEntity]) -> Self {
        Self {
            text: text.to_owned(),
            cursor: utf16_len(text),
            entities: entities.to_vec(),
        }
    }

    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.cursor = self.cursor.saturating_add(utf16_len(fragment));
    }

    /// Start a new paragraph unless nothing has been written yet.
    fn paragraph(&mut self) {
        if !self.text.is_empty() {
            self.push(PARAGRAPH_BREAK);
        }
    }

    fn push_linked(&mut self, label: &str, url: Option<&Url>) {
        let offset = self.cursor;
        self.push(label);
        let length = self.cursor.saturating_sub(offset);
        if let Some(url) = url {
            if length > 0 {
                self.entities
                    .push(MessageEntity::text_link(url.clone(), offset, length));
            }
        }
    }

    fn finish(self) -> Composed {
        Composed {
            text: self.text,
            entities: self.entities,
        }
    }
}
