//! Per-channel settings: the persisted record, its engine views, and storage.
//!
//! A [`ChannelSettings`] record is stored as JSON keyed by chat id. Fields
//! missing from a stored record take their defaults, so records written by
//! older builds keep loading.

pub mod footer;
pub mod patterns;
pub mod store;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::engine::compose::{DEFAULT_ATTRIBUTION_PREFIX, DEFAULT_SEPARATOR};
use crate::engine::{AttributionPosition, BannedPattern, CompositionConfig, LinkSegment};

pub use self::footer::{parse_footer, render_footer, render_footer_markup, FooterError};
pub use self::patterns::{PatternError, PatternSpec};
pub use self::store::{SettingsStore, SqliteSettingsStore};

/// Errors from the settings subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The record could not be encoded for storage.
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Footer part of a channel's settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterSettings {
    /// Whether the footer is appended to posts.
    pub enabled: bool,
    /// Entries in display order.
    pub links: Vec<LinkSegment>,
}

impl Default for FooterSettings {
    fn default() -> Self {
        let links = Url::parse("https://example.com")
            .map(|url| vec![LinkSegment::linked("example", url)])
            .unwrap_or_default();
        Self {
            enabled: false,
            links,
        }
    }
}

/// Everything a channel admin can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Footer appended to posts.
    pub footer: FooterSettings,
    /// Patterns removed from posts.
    pub banned_words: Vec<PatternSpec>,
    /// Whether forwarded posts are re-sent with an attribution.
    pub forward_optimization: bool,
    /// Layout of the attribution.
    pub forward_position: AttributionPosition,
    /// Whether link previews are suppressed on edited and sent posts.
    pub disable_preview: bool,
    /// Text between footer entries.
    pub separator: String,
    /// Text before the forward source name.
    pub via_word: String,
    /// Whether service messages (pins, title changes, …) are deleted.
    pub delete_system_messages: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            footer: FooterSettings::default(),
            banned_words: Vec::new(),
            forward_optimization: false,
            forward_position: AttributionPosition::None,
            disable_preview: true,
            separator: DEFAULT_SEPARATOR.to_owned(),
            via_word: DEFAULT_ATTRIBUTION_PREFIX.to_owned(),
            delete_system_messages: false,
        }
    }
}

impl ChannelSettings {
    /// Layout configuration handed to the composition engine.
    pub fn composition_config(&self) -> CompositionConfig {
        CompositionConfig {
            footer_enabled: self.footer.enabled,
            footer_links: self.footer.links.clone(),
            separator: self.separator.clone(),
            attribution_enabled: self.forward_optimization,
            attribution_position: self.forward_position,
            attribution_prefix: self.via_word.clone(),
        }
    }

    /// Compile the stored banned words.
    ///
    /// Definitions are validated when added, so a failure here means the
    /// stored record was edited by hand; such entries are skipped.
    pub fn compiled_patterns(&self) -> Vec<BannedPattern> {
        self.banned_words
            .iter()
            .filter_map(|spec| match spec.compile() {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %spec.source, error = %e, "skipping stored pattern");
                    None
                }
            })
            .collect()
    }

    /// Footer text as it appears at the end of processed posts, if a footer is active.
    pub fn rendered_footer(&self) -> Option<String> {
        if !self.footer.enabled || self.footer.links.is_empty() {
            return None;
        }
        let text = render_footer(&self.footer.links, &self.separator);
        (!text.trim().is_empty()).then_some(text)
    }
}
