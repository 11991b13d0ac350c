//! Deletion of matched spans with entity re-anchoring.

use teloxide::types::MessageEntity;

use super::matcher::Interval;
use super::position::PositionMap;

/// Text and entities after redaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redacted {
    /// Text with every matched span removed.
    pub text: String,
    /// Surviving entities, re-anchored to `text`, in their original order.
    pub entities: Vec<MessageEntity>,
}

/// Remove `intervals` (code point coordinates) from `text` and shift `entities` to match.
///
/// Overlapping and adjacent intervals are merged first. Entities keep their
/// kind and order; an entity whose whole span was deleted is dropped. With no
/// intervals the input comes back unchanged.
pub fn redact(text: &str, entities: &[MessageEntity], intervals: &[Interval]) -> Redacted {
    let deletions = Deletions::new(intervals);
    if deletions.is_empty() {
        return Redacted {
            text: text.to_owned(),
            entities: entities.to_vec(),
        };
    }

    let new_text = deletions.apply(text);
    let old_map = PositionMap::new(text);
    let new_map = PositionMap::new(&new_text);

    let new_entities = entities
        .iter()
        .filter_map(|entity| {
            let start = old_map.utf16_to_char_floor(entity.offset);
            let end = old_map.utf16_to_char_ceil(entity.offset.saturating_add(entity.length));
            let new_start = start.saturating_sub(deletions.deleted_before(start));
            let new_end = end.saturating_sub(deletions.deleted_before(end));
            if new_end <= new_start {
                return None;
            }
            let offset = new_map.char_to_utf16(new_start);
            let length = new_map.char_to_utf16(new_end).saturating_sub(offset);
            (length > 0).then(|| MessageEntity::new(entity.kind.clone(), offset, length))
        })
        .collect();

    Redacted {
        text: new_text,
        entities: new_entities,
    }
}

/// Sorted, disjoint, non-adjacent deletion intervals with running totals.
#[derive(Debug)]
struct Deletions {
    intervals: Vec<Interval>,
    /// `totals[k]` is the number of code points deleted by `intervals[..k]`.
    totals: Vec<usize>,
}

impl Deletions {
    fn new(raw: &[Interval]) -> Self {
        let mut sorted: Vec<Interval> = raw.iter().copied().filter(|i| !i.is_empty()).collect();
        sorted.sort_by_key(|i| (i.start, i.end));

        let mut intervals: Vec<Interval> = Vec::with_capacity(sorted.len());
        for next in sorted {
            match intervals.last_mut() {
                Some(last) if next.start <= last.end => last.end = last.end.max(next.end),
                _ => intervals.push(next),
            }
        }

        let mut totals = Vec::with_capacity(intervals.len());
        let mut running: usize = 0;
        for interval in &intervals {
            totals.push(running);
            running = running.saturating_add(interval.len());
        }

        Self { intervals, totals }
    }

    fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of deleted code points whose original index is below `index`.
    fn deleted_before(&self, index: usize) -> usize {
        let started = self.intervals.partition_point(|i| i.start < index);
        let Some(last) = started.checked_sub(1) else {
            return 0;
        };
        let interval = self.intervals[last];
        let inside = index.min(interval.end).saturating_sub(interval.start);
        self.totals[last].saturating_add(inside)
    }

    /// Keep only the code points of `text` outside every interval.
    fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending = self.intervals.iter().peekable();
        for (index, ch) in text.chars().enumerate() {
            while pending.peek().is_some_and(|i| i.end <= index) {
                pending.next();
            }
            let deleted = pending.peek().is_some_and(|i| i.start <= index);
            if !deleted {
                out.push(ch);
            }
        }
        out
    }
}
