//! Typed / pasted / deleted classification of raw content changes.
//!
//! No editor API reliably says "this insertion came from a paste", so the
//! decision is a heuristic built from the inserted text, the replaced range
//! and the current clipboard. Paste detection favours precision over recall:
//! small insertions that happen to match the clipboard are counted as typed,
//! and line-count reconciliation corrects the totals later.

use serde::Serialize;

use crate::event::RawChange;

/// Characters per line assumed when estimating deleted lines.
pub const DELETE_CHARS_PER_LINE: u64 = 50;

/// Insertions longer than this (in characters) qualify as paste-sized.
pub const PASTE_MIN_CHARS: usize = 100;

/// What a change did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Typed,
    Pasted,
    Deleted,
}

/// A classified change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub text: String,
    pub range_length: u64,
    pub is_delete: bool,
    pub is_paste: bool,
    /// Estimated line delta.
    pub line_count: u64,
}

impl ChangeEvent {
    pub const fn kind(&self) -> ChangeKind {
        if self.is_delete {
            ChangeKind::Deleted
        } else if self.is_paste {
            ChangeKind::Pasted
        } else {
            ChangeKind::Typed
        }
    }
}

/// Classifies one raw change against the current clipboard text.
pub fn classify(change: &RawChange, clipboard: &str) -> ChangeEvent {
    let text = change.text.as_str();
    let range_length = change.range_length;
    let is_delete = range_length > 0 && text.is_empty();

    // A range length alone cannot tell how many lines went away; this is an
    // approximation, not an exact count.
    let line_count = if is_delete {
        (range_length / DELETE_CHARS_PER_LINE).max(1)
    } else {
        count_lines(text)
    };

    let is_paste = !is_delete
        && range_length == 0
        && clipboard_matches(clipboard, text)
        && is_paste_shaped(text);

    ChangeEvent {
        text: change.text.clone(),
        range_length,
        is_delete,
        is_paste,
        line_count,
    }
}

/// Number of segments after splitting on `\r?\n`; zero for empty input.
pub fn count_lines(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    // `\r\n` and `\n` both end in `\n`, so segments = newlines + 1.
    text.bytes().filter(|&b| b == b'\n').count() as u64 + 1
}

/// Whether the inserted text plausibly came from the clipboard.
///
/// Exact match, clipboard containing the text (partial selection), or text
/// containing the trimmed clipboard (trailing whitespace differences). An
/// empty clipboard never matches.
fn clipboard_matches(clipboard: &str, text: &str) -> bool {
    if clipboard.is_empty() {
        return false;
    }
    if clipboard == text || clipboard.contains(text) {
        return true;
    }
    let trimmed = clipboard.trim();
    !trimmed.is_empty() && text.contains(trimmed)
}

/// More than one newline, or longer than [`PASTE_MIN_CHARS`].
fn is_paste_shaped(text: &str) -> bool {
    text.matches('\n').count() > 1 || text.chars().count() > PASTE_MIN_CHARS
}
