//! Document statistics
//!
//! Word count, character count and estimated reading time, derived from the
//! text of the document with marks ignored.

use crate::model::{Document, Node};

/// Reading speed used when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// DocumentStats
// ─────────────────────────────────────────────────────────────────────────────

/// Statistics for a document snapshot.
///
/// # Example
///
/// ```ignore
/// let doc = Document::new(vec![Node::paragraph("Hello, World!")]);
/// let stats = DocumentStats::from_document(&doc);
/// assert_eq!(stats.words, 2);
/// assert_eq!(stats.reading_minutes, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    /// Number of words (sequences of non-whitespace characters)
    pub words: usize,
    /// Number of characters in text leaves, including whitespace
    pub characters: usize,
    /// Estimated reading time, never below one minute
    pub reading_minutes: usize,
}

impl DocumentStats {
    /// Statistics at the default reading speed.
    pub fn from_document(doc: &Document) -> Self {
        Self::from_document_with_rate(doc, DEFAULT_WORDS_PER_MINUTE)
    }

    /// Statistics at `words_per_minute`. Lines are counted separately so that
    /// words never run together across block boundaries.
    pub fn from_document_with_rate(doc: &Document, words_per_minute: usize) -> Self {
        let mut words = 0;
        let mut characters = 0;
        for (_, node) in doc.descendants() {
            match node {
                Node::Text(text) => characters += text.len(),
                Node::Element(_) if node.is_text_block() => {
                    words += count_words(&node.text_content());
                }
                Node::Element(_) => {}
            }
        }
        Self {
            words,
            characters,
            reading_minutes: reading_minutes(words, words_per_minute),
        }
    }

    /// Compact status line like "150 words | 892 chars | 1 min read".
    pub fn format_compact(&self) -> String {
        format!(
            "{} words | {} chars | {} min read",
            self.words, self.characters, self.reading_minutes
        )
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `ceil(words / rate)`, minimum 1.
fn reading_minutes(words: usize, words_per_minute: usize) -> usize {
    let rate = words_per_minute.max(1);
    words.div_ceil(rate).max(1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, HeadingLevel, ImageProps, Marks, Text};

    #[test]
    fn test_stats_empty_document() {
        let stats = DocumentStats::from_document(&Document::new(vec![Node::paragraph("")]));
        assert_eq!(stats.words, 0);
        assert_eq!(stats.characters, 0);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn test_words_do_not_join_across_blocks() {
        let doc = Document::new(vec![
            Node::heading(HeadingLevel::H1, "Hello"),
            Node::paragraph("World"),
        ]);
        assert_eq!(DocumentStats::from_document(&doc).words, 2);
    }

    #[test]
    fn test_marks_ignored_and_runs_joined() {
        let bold = Marks {
            bold: true,
            ..Marks::default()
        };
        let doc = Document::new(vec![Node::element(
            ElementKind::Paragraph,
            vec![
                Node::text("un"),
                Node::Text(Text::with_marks("believ", bold)),
                Node::text("able words"),
            ],
        )]);
        let stats = DocumentStats::from_document(&doc);
        assert_eq!(stats.words, 2);
        assert_eq!(stats.characters, 18);
    }

    #[test]
    fn test_voids_contribute_nothing() {
        let doc = Document::new(vec![
            Node::paragraph("one two"),
            Node::image(ImageProps::new("a.png", "alt text")),
        ]);
        assert_eq!(DocumentStats::from_document(&doc).words, 2);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let words = |n: usize| Document::new(vec![Node::paragraph(vec!["word"; n].join(" "))]);
        let stats = DocumentStats::from_document(&words(201));
        assert_eq!(stats.words, 201);
        assert_eq!(stats.reading_minutes, 2);
        assert_eq!(DocumentStats::from_document(&words(200)).reading_minutes, 1);
    }

    #[test]
    fn test_format_compact() {
        let doc = Document::new(vec![Node::paragraph("Hello world")]);
        let stats = DocumentStats::from_document(&doc);
        assert_eq!(stats.format_compact(), "2 words | 11 chars | 1 min read");
    }
}
