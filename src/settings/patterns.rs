//! Banned word definitions as typed by channel admins.
//!
//! Two input forms are accepted: a bare expression, which matches
//! case-insensitively, and the `/body/flags` form, whose flags decide case
//! sensitivity and line handling. Definitions are compiled on entry so that an
//! invalid one is rejected before it is stored.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::engine::BannedPattern;

/// Upper bound on the compiled size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Errors from parsing or compiling a banned word definition.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The definition has no expression body.
    #[error("pattern is empty")]
    Empty,

    /// A `/body/flags` definition used a flag this bot does not understand.
    #[error("unsupported pattern flag: {0}")]
    UnknownFlag(char),

    /// The expression does not compile.
    #[error("invalid pattern: {0}")]
    Invalid(#[from] regex::Error),
}

/// Serializable form of a banned pattern, stored in channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Expression source without delimiters or flags.
    pub source: String,
    /// Match letters regardless of case.
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// `^` and `$` match at line boundaries.
    #[serde(default)]
    pub multi_line: bool,
    /// `.` also matches `\n`.
    #[serde(default)]
    pub dot_matches_new_line: bool,
    /// Whether the pattern is applied to posts.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl PatternSpec {
    /// Parse an admin-supplied definition and check that it compiles.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the definition is empty, uses an unknown
    /// flag, or is not a valid expression.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        let input = input.trim();
        let spec = match split_delimited(input) {
            Some((body, flags)) => {
                let mut spec = Self::plain(body);
                spec.case_insensitive = false;
                for flag in flags.chars() {
                    match flag {
                        'i' => spec.case_insensitive = true,
                        'm' => spec.multi_line = true,
                        's' => spec.dot_matches_new_line = true,
                        // global, unicode and sticky have no effect on a full scan
                        'g' | 'u' | 'y' => {}
                        other => return Err(PatternError::UnknownFlag(other)),
                    }
                }
                spec
            }
            None => Self::plain(input),
        };
        if spec.source.is_empty() {
            return Err(PatternError::Empty);
        }
        spec.compile()?;
        Ok(spec)
    }

    /// A case-insensitive, enabled pattern over `source`.
    pub fn plain(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            case_insensitive: true,
            multi_line: false,
            dot_matches_new_line: false,
            enabled: true,
        }
    }

    /// Compile into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Invalid`] if the expression does not compile.
    pub fn compile(&self) -> Result<BannedPattern, PatternError> {
        let regex = RegexBuilder::new(&self.source)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;
        Ok(BannedPattern::new(regex).with_enabled(self.enabled))
    }

    /// Render back into the `/body/flags` form.
    pub fn display(&self) -> String {
        let mut flags = String::new();
        if self.case_insensitive {
            flags.push('i');
        }
        if self.multi_line {
            flags.push('m');
        }
        if self.dot_matches_new_line {
            flags.push('s');
        }
        format!("/{}/{flags}", self.source)
    }
}

/// Split `/body/flags` into its parts; `None` for a bare expression.
fn split_delimited(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    Some((&rest[..close], &rest[close.saturating_add(1)..]))
}
