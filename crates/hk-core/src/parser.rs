//! Splitting of free-text "need to buy" notes into list items.
//!
//! Rules, first match wins:
//!
//! 1. The note contains the conjunction `" und "`: split on every occurrence,
//!    trim each piece. These are confident splits and are not flagged.
//! 2. The note contains whitespace: split on whitespace. A multi-word item
//!    name is indistinguishable from several one-word items here, so every
//!    token is flagged for human review.
//! 3. Otherwise the trimmed note is a single unflagged item.
//!
//! Pieces that trim to the empty string are dropped.

/// Conjunction treated as an explicit multi-item separator.
pub const CONJUNCTION: &str = " und ";

/// One item extracted from a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub text: String,
    /// True when the split was a heuristic guess that needs confirmation.
    pub flagged: bool,
}

impl ParsedItem {
    fn confident(text: &str) -> Self {
        Self {
            text: text.to_string(),
            flagged: false,
        }
    }

    fn needs_review(text: &str) -> Self {
        Self {
            text: text.to_string(),
            flagged: true,
        }
    }
}

/// Split a raw note into ordered items.
pub fn split_items(raw: &str) -> Vec<ParsedItem> {
    if raw.contains(CONJUNCTION) {
        return raw
            .split(CONJUNCTION)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(ParsedItem::confident)
            .collect();
    }

    if raw.contains(char::is_whitespace) {
        return raw
            .split_whitespace()
            .map(ParsedItem::needs_review)
            .collect();
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![ParsedItem::confident(trimmed)]
}
