//! Markdown conversion module
//!
//! This module converts between the document tree and Markdown text.
//!
//! # Features
//! - Serialize a document to Markdown with fixed mark wrapping order
//! - Optional front matter header carrying the document metadata
//! - Import Markdown (CommonMark + GFM tables) through comrak
//!
//! # Example
//! ```ignore
//! use crate::markdown::{parse_markdown, to_markdown};
//!
//! let imported = parse_markdown("# Hello\n\nThis is **bold** text.")?;
//! let markdown = to_markdown(&imported.document, imported.metadata.as_ref());
//! ```

mod front_matter;
mod import;
mod serializer;

pub use front_matter::{emit_front_matter, parse_front_matter};
pub use import::{parse_markdown, ImportedMarkdown};
pub use serializer::{serialize, serialize_node, serialize_text};

use crate::model::{Document, Metadata};

/// Serialize `doc`, preceded by a front matter block when `metadata` is given.
pub fn to_markdown(doc: &Document, metadata: Option<&Metadata>) -> String {
    let body = serialize(doc);
    match metadata {
        Some(meta) => format!("{}{}", emit_front_matter(meta), body),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    #[test]
    fn test_to_markdown_with_front_matter() {
        let doc = Document::new(vec![Node::paragraph("Body")]);
        let meta = Metadata::new("Notes");
        assert_eq!(
            to_markdown(&doc, Some(&meta)),
            "---\ntitle: Notes\n---\n\nBody"
        );
        assert_eq!(to_markdown(&doc, None), "Body");
    }
}
