//! Document Export Module for Quire
//!
//! This module writes the serialized Markdown out of the editor, either to a
//! `.md` file or to the system clipboard.
//!
//! # Architecture
//!
//! - `file.rs` - Filename sanitisation and Markdown file writing
//! - `clipboard.rs` - Platform clipboard operations

pub mod clipboard;
pub mod file;

pub use clipboard::{copy_markdown_to_clipboard, ClipboardError};
pub use file::{export_markdown_file, markdown_filename, sanitize_filename};
