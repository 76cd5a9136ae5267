//! Quire - a block-structured rich-text document model
//!
//! The crate owns the document tree and every rule about how it may change:
//! typed input with Markdown shortcuts, structural edits that always leave a
//! normalized tree, undo/redo, and Markdown export. Rendering belongs to the
//! host; the [`editor::Editor`] publishes cheap `Arc` snapshots for it to draw.
//!
//! # Example
//! ```ignore
//! use quire::editor::Editor;
//!
//! let mut editor = Editor::default();
//! for c in "## Title".chars() {
//!     editor.insert_text(&c.to_string());
//! }
//! assert_eq!(editor.to_markdown(None), "## Title");
//! ```

pub mod config;
pub mod diagram;
pub mod editor;
pub mod error;
pub mod export;
pub mod markdown;
pub mod model;
pub mod rules;
pub mod storage;
pub mod string_utils;
