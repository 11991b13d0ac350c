//! Entity-preserving text transformation.
//!
//! Pure, synchronous functions over in-memory data: banned-pattern matching
//! ([`find_intervals`]), deletion with entity re-anchoring ([`redact`]) and
//! suffix composition ([`compose`]). [`transform`] chains the three. Nothing
//! here performs I/O, and no input is mutated.
//!
//! Entity offsets are UTF-16 code units, the unit Telegram uses. Conversions
//! to code points and UTF-8 bytes live in [`position`].

pub mod compose;
pub mod matcher;
pub mod position;
pub mod redact;
pub mod source;

use teloxide::types::MessageEntity;

pub use self::compose::{compose, AttributionPosition, Composed, CompositionConfig, LinkSegment};
pub use self::matcher::{find_intervals, BannedPattern, Interval};
pub use self::position::{utf16_len, PositionMap};
pub use self::redact::{redact, Redacted};
pub use self::source::{SourceDescriptor, SourceKind};

/// Maximum length of a text message, in UTF-16 code units.
pub const MAX_TEXT_MESSAGE_LENGTH: usize = 4096;

/// Maximum length of a media caption, in UTF-16 code units.
pub const MAX_CAPTION_LENGTH: usize = 1024;

/// Length limit that applies to a post's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLimit {
    /// Plain text message.
    Text,
    /// Caption attached to media.
    Caption,
}

impl MessageLimit {
    /// Limit for a post with or without media.
    pub fn for_post(has_media: bool) -> Self {
        if has_media {
            Self::Caption
        } else {
            Self::Text
        }
    }

    /// Maximum length in UTF-16 code units.
    pub fn max_len(&self) -> usize {
        match self {
            Self::Text => MAX_TEXT_MESSAGE_LENGTH,
            Self::Caption => MAX_CAPTION_LENGTH,
        }
    }

    /// Whether `text` is too long to be sent under this limit.
    pub fn exceeds(&self, text: &str) -> bool {
        self.exceeds_configured(text, self.max_len())
    }

    /// Whether `text` is longer than `configured` units. The configured
    /// value is capped at [`max_len`](Self::max_len).
    pub fn exceeds_configured(&self, text: &str, configured: usize) -> bool {
        utf16_len(text) > configured.min(self.max_len())
    }
}

/// Output of [`transform`].
pub type Transformed = Composed;

/// Redact every match of `patterns`, then compose the result per `config`.
pub fn transform(
    text: &str,
    entities: &[MessageEntity],
    patterns: &[BannedPattern],
    config: &CompositionConfig,
    source: Option<&SourceDescriptor>,
) -> Transformed {
    let intervals = find_intervals(text, patterns);
    let redacted = redact(text, entities, &intervals);
    compose(&redacted.text, &redacted.entities, config, source)
}
