//! Character-Offset String Utilities
//!
//! Caret offsets in the document model count characters, not bytes, so that
//! a host can address positions without knowing about UTF-8. Rust strings are
//! indexed by byte, so every text edit converts through these helpers.
//!
//! All functions clamp out-of-range offsets to the end of the string instead of
//! panicking.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{insert_at_char, char_len};
//!
//! let mut text = String::from("Hei deg");
//! insert_at_char(&mut text, 3, " på");
//! assert_eq!(text, "Hei på deg");
//! assert_eq!(char_len(&text), 10);
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Offset Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Number of characters in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a character offset into a byte index.
///
/// Returns the string length if `char_index` is beyond the string.
pub fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Slicing and Editing
// ─────────────────────────────────────────────────────────────────────────────

/// Slice `s` between two character offsets.
pub fn slice_chars(s: &str, start: usize, end: usize) -> &str {
    let start = byte_index(s, start);
    let end = byte_index(s, end);
    if start >= end {
        return "";
    }
    &s[start..end]
}

/// Insert `text` at a character offset.
pub fn insert_at_char(s: &mut String, char_index: usize, text: &str) {
    let at = byte_index(s, char_index);
    s.insert_str(at, text);
}

/// Remove `len` characters starting at a character offset.
pub fn remove_chars(s: &mut String, start: usize, len: usize) {
    let from = byte_index(s, start);
    let to = byte_index(s, start + len);
    s.replace_range(from..to, "");
}

/// Split the string at a character offset, returning the tail.
pub fn split_off_at_char(s: &mut String, char_index: usize) -> String {
    let at = byte_index(s, char_index);
    s.split_off(at)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
