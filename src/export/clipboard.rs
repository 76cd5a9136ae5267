//! Clipboard Operations for Markdown Export
//!
//! This module provides cross-platform clipboard functionality for copying
//! the serialized document to the system clipboard using the arboard crate.

use arboard::Clipboard;
use log::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during clipboard operations.
#[derive(Debug)]
pub enum ClipboardError {
    /// Failed to access clipboard
    Access(String),
    /// Failed to set clipboard content
    Write(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::Access(msg) => write!(f, "Clipboard access error: {}", msg),
            ClipboardError::Write(msg) => write!(f, "Clipboard write error: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Copy plain text to clipboard.
///
/// Uses arboard for cross-platform clipboard support.
pub fn copy_text_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;

    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::Write(e.to_string()))?;

    Ok(())
}

/// Copy serialized Markdown to the clipboard.
///
/// Returns `false` when the platform rejects the copy. The failure is logged
/// and not retried.
pub fn copy_markdown_to_clipboard(markdown: &str) -> bool {
    match copy_text_to_clipboard(markdown) {
        Ok(()) => {
            info!("Copied {} bytes of Markdown to clipboard", markdown.len());
            true
        }
        Err(e) => {
            warn!("Failed to copy Markdown: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_error_display() {
        let err = ClipboardError::Access("no display".to_string());
        assert_eq!(err.to_string(), "Clipboard access error: no display");
    }

    #[test]
    fn test_clipboard_error_write() {
        let err = ClipboardError::Write("write failed".to_string());
        assert!(err.to_string().contains("write failed"));
    }
}
