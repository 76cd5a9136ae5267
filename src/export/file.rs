//! Markdown file export

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Characters that are not allowed in exported file names.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Name used when the document has no title.
const FALLBACK_NAME: &str = "untitled";

/// Replace every forbidden character with `-`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Sanitized file name for `title`, with `.md` appended unless already there.
pub fn markdown_filename(title: &str) -> String {
    let title = title.trim();
    let name = if title.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitize_filename(title)
    };
    if name.to_lowercase().ends_with(".md") {
        name
    } else {
        format!("{}.md", name)
    }
}

/// Write `markdown` as UTF-8 into `dir`, named after `title`.
///
/// Returns the path of the written file.
pub fn export_markdown_file(dir: &Path, title: &str, markdown: &str) -> Result<PathBuf> {
    let path = dir.join(markdown_filename(title));
    fs::write(&path, markdown).map_err(|e| Error::FileWrite {
        path: path.clone(),
        source: e,
    })?;
    info!("Exported Markdown to {}", path.display());
    Ok(path)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
