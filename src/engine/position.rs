//! Coordinate conversions between UTF-8 bytes, UTF-16 code units and code points.
//!
//! Telegram addresses entities in UTF-16 code units, the `regex` crate reports
//! UTF-8 byte offsets, and deletions are computed over code points. Every
//! conversion between the three goes through a [`PositionMap`] so that no
//! caller mixes units by hand.

/// Number of UTF-16 code units needed to encode `text`.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Per-text lookup table of code point start positions.
///
/// Index `i` of each table holds where code point `i` starts; the final
/// element holds the total length, so both tables have `char_count() + 1`
/// entries and are strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    byte_starts: Vec<usize>,
    utf16_starts: Vec<usize>,
}

impl PositionMap {
    /// Walk `text` once and record where every code point starts.
    pub fn new(text: &str) -> Self {
        let capacity = text.len().saturating_add(1);
        let mut byte_starts = Vec::with_capacity(capacity);
        let mut utf16_starts = Vec::with_capacity(capacity);
        let mut unit: usize = 0;
        for (byte, ch) in text.char_indices() {
            byte_starts.push(byte);
            utf16_starts.push(unit);
            unit = unit.saturating_add(ch.len_utf16());
        }
        byte_starts.push(text.len());
        utf16_starts.push(unit);
        Self {
            byte_starts,
            utf16_starts,
        }
    }

    /// Number of code points in the mapped text.
    pub fn char_count(&self) -> usize {
        self.byte_starts.len().saturating_sub(1)
    }

    /// Length of the mapped text in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        self.utf16_starts.last().copied().unwrap_or(0)
    }

    /// Code point index of a UTF-8 byte offset.
    ///
    /// Offsets that do not sit on a char boundary resolve to the code point
    /// containing them. Offsets past the end clamp to [`Self::char_count`].
    pub fn byte_to_char(&self, byte: usize) -> usize {
        floor_index(&self.byte_starts, byte)
    }

    /// Code point containing the UTF-16 offset `unit`.
    ///
    /// An offset that points at the low half of a surrogate pair maps to the
    /// pair's code point. Offsets past the end clamp to [`Self::char_count`].
    pub fn utf16_to_char_floor(&self, unit: usize) -> usize {
        floor_index(&self.utf16_starts, unit)
    }

    /// Number of code points that start before the UTF-16 offset `unit`.
    ///
    /// This is the end-exclusive counterpart of [`Self::utf16_to_char_floor`]:
    /// a range ending in the middle of a surrogate pair still covers the pair.
    pub fn utf16_to_char_ceil(&self, unit: usize) -> usize {
        let count = self.char_count();
        self.utf16_starts[..count]
            .partition_point(|&start| start < unit)
            .min(count)
    }

    /// UTF-16 offset at which code point `index` starts.
    ///
    /// Indices past the end clamp to the total UTF-16 length.
    pub fn char_to_utf16(&self, index: usize) -> usize {
        let clamped = index.min(self.char_count());
        self.utf16_starts[clamped]
    }
}

/// Largest `i` with `starts[i] <= offset`, limited to the last real entry.
fn floor_index(starts: &[usize], offset: usize) -> usize {
    let count = starts.len().saturating_sub(1);
    starts
        .partition_point(|&start| start <= offset)
        .saturating_sub(1)
        .min(count)
}
