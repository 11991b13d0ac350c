//! Banned pattern matching in code point coordinates.

use regex::Regex;

use super::position::PositionMap;

/// Half-open range of code points `[start, end)` selected for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    /// First code point covered.
    pub start: usize,
    /// One past the last code point covered.
    pub end: usize,
}

impl Interval {
    /// Create an interval. `end` is raised to `start` if it is smaller.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of code points covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the interval covers nothing.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A compiled banned pattern that can be switched off without being removed.
#[derive(Debug, Clone)]
pub struct BannedPattern {
    regex: Regex,
    enabled: bool,
}

impl BannedPattern {
    /// Wrap an already compiled regex as an enabled pattern.
    pub fn new(regex: Regex) -> Self {
        Self {
            regex,
            enabled: true,
        }
    }

    /// Return the same pattern with the given enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The compiled expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Whether the pattern takes part in matching.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Collect every non-empty match of every enabled pattern as code point intervals.
///
/// Intervals come back in pattern evaluation order and may overlap; merging
/// is left to [`super::redact`].
pub fn find_intervals(text: &str, patterns: &[BannedPattern]) -> Vec<Interval> {
    if text.is_empty() {
        return Vec::new();
    }
    let map = PositionMap::new(text);
    let mut intervals = Vec::new();
    for pattern in patterns.iter().filter(|p| p.is_enabled()) {
        for found in pattern.regex().find_iter(text) {
            if found.is_empty() {
                continue;
            }
            let interval = Interval::new(
                map.byte_to_char(found.start()),
                map.byte_to_char(found.end()),
            );
            if !interval.is_empty() {
                intervals.push(interval);
            }
        }
    }
    intervals
}
