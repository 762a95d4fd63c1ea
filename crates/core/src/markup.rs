//! Inline error markup extraction.
//!
//! Marked-up transcripts carry error occurrences as `[TYPE:CONTENT]`, e.g.
//! `"hello [DEL:world] [INS:foo] [SUB:bar->baz]"`. `TYPE` is one or more
//! uppercase ASCII letters and `CONTENT` is any run of characters other than
//! `]`. There is no nesting and no escaping of `]` inside content.
//!
//! Extraction never fails: text without recognizable markup simply yields no
//! spans.

use std::sync::LazyLock;

use regex::{CaptureMatches, Regex};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Regex pattern matching one `[TYPE:CONTENT]` error span.
pub const ERROR_MARKUP_PATTERN: &str = r"\[([A-Z]+):([^\]]+)\]";

static ERROR_MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ERROR_MARKUP_PATTERN).expect("valid regex"));

/// A word present in the reference but missing from the hypothesis.
pub const ERROR_TYPE_DELETION: &str = "DEL";

/// A word replaced by another; content is conventionally `before->after`.
pub const ERROR_TYPE_SUBSTITUTION: &str = "SUB";

/// A word present in the hypothesis but not in the reference.
pub const ERROR_TYPE_INSERTION: &str = "INS";

/// The canonical error vocabulary. The grammar accepts other uppercase tags.
pub const CANONICAL_ERROR_TYPES: &[&str] = &[
    ERROR_TYPE_DELETION,
    ERROR_TYPE_SUBSTITUTION,
    ERROR_TYPE_INSERTION,
];

/// Separator between the two sides of a substitution's content.
pub const SUBSTITUTION_SEPARATOR: &str = "->";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One error occurrence found inside a marked-up text.
///
/// Offsets are character offsets (not bytes) into the marked text, with
/// `end_offset` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpan {
    pub error_type: String,
    pub content: String,
    pub full_match: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub occurrence_index: usize,
}

/// Lazy iterator over the error spans of one text, in document order.
///
/// Created by [`extract`]. Calling [`extract`] again on the same text
/// restarts the sequence and reproduces the same spans.
pub struct Spans<'t> {
    text: &'t str,
    matches: CaptureMatches<'static, 't>,
    next_index: usize,
    byte_cursor: usize,
    char_cursor: usize,
}

impl Iterator for Spans<'_> {
    type Item = ErrorSpan;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.matches.next()?;
        let whole = caps.get(0)?;
        let error_type = caps.get(1)?.as_str();
        let content = caps.get(2)?.as_str();

        // Matches arrive in order, so character offsets can be counted
        // incrementally from the end of the previous match.
        let start_offset =
            self.char_cursor + self.text[self.byte_cursor..whole.start()].chars().count();
        let end_offset = start_offset + whole.as_str().chars().count();
        self.byte_cursor = whole.end();
        self.char_cursor = end_offset;

        let occurrence_index = self.next_index;
        self.next_index += 1;

        Some(ErrorSpan {
            error_type: error_type.to_string(),
            content: content.to_string(),
            full_match: whole.as_str().to_string(),
            start_offset,
            end_offset,
            occurrence_index,
        })
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract error spans from a marked-up text.
///
/// Matches are found left to right without overlap and numbered from 0 in
/// that order. Malformed or absent markup yields an empty sequence.
pub fn extract(marked_text: &str) -> Spans<'_> {
    Spans {
        text: marked_text,
        matches: ERROR_MARKUP_RE.captures_iter(marked_text),
        next_index: 0,
        byte_cursor: 0,
        char_cursor: 0,
    }
}

/// Count error spans without materializing them.
pub fn count_spans(marked_text: &str) -> usize {
    ERROR_MARKUP_RE.find_iter(marked_text).count()
}

/// Split substitution content of the form `before->after`.
///
/// Returns `None` when the separator is absent. Both sides are trimmed.
pub fn split_substitution(content: &str) -> Option<(&str, &str)> {
    content
        .split_once(SUBSTITUTION_SEPARATOR)
        .map(|(before, after)| (before.trim(), after.trim()))
}

/// Whether `error_type` is one of [`CANONICAL_ERROR_TYPES`].
pub fn is_canonical_error_type(error_type: &str) -> bool {
    CANONICAL_ERROR_TYPES.contains(&error_type)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
