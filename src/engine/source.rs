//! Normalized description of where a forwarded post came from.

use serde::{Deserialize, Serialize};
use url::Url;

/// Kind of origin a forwarded post was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A channel post.
    Channel,
    /// A user who allows linking their account.
    User,
    /// A user who hides their account behind a plain name.
    HiddenUser,
    /// A group or supergroup posting as itself.
    Chat,
}

impl SourceKind {
    /// Stable lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::User => "user",
            Self::HiddenUser => "hidden_user",
            Self::Chat => "chat",
        }
    }
}

/// Attribution data consumed read-only by composition.
///
/// A missing `url` is a valid state: the attribution is then rendered as
/// plain text without a link entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// What kind of origin this is.
    pub kind: SourceKind,
    /// Name shown in the attribution line.
    pub display_name: String,
    /// Link target for the name, if one is known.
    pub url: Option<Url>,
    /// Whether the origin is a bot account.
    pub is_bot: bool,
}

impl SourceDescriptor {
    /// Build a descriptor for a non-bot origin.
    pub fn new(kind: SourceKind, display_name: impl Into<String>, url: Option<Url>) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            url,
            is_bot: false,
        }
    }
}
