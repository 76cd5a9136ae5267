//! User settings and preferences for Quire
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::editor::{DEFAULT_HISTORY_LIMIT, DEFAULT_WORDS_PER_MINUTE};

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────
    /// Whether the host should persist the document on a timer
    pub auto_save: bool,

    /// Debounce interval for auto-save (in seconds)
    pub auto_save_interval_secs: u32,

    /// Overrides the platform data directory used for persisted state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────
    /// Number of undo steps kept
    pub history_limit: usize,

    /// Reading speed used for the reading time estimate
    pub words_per_minute: usize,

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Prepend a front matter block built from the metadata on export
    pub front_matter_on_export: bool,

    /// Directory the last Markdown file was exported to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_export_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval_secs: 2,
            storage_dir: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            front_matter_on_export: true,
            last_export_directory: None,
        }
    }
}

impl Settings {
    /// Minimum auto-save interval (in seconds)
    pub const MIN_AUTO_SAVE_INTERVAL: u32 = 1;
    /// Maximum auto-save interval (in seconds)
    pub const MAX_AUTO_SAVE_INTERVAL: u32 = 600;
    /// Minimum undo depth
    pub const MIN_HISTORY_LIMIT: usize = 1;
    /// Maximum undo depth
    pub const MAX_HISTORY_LIMIT: usize = 1000;
    /// Minimum reading speed (words per minute)
    pub const MIN_WORDS_PER_MINUTE: usize = 50;
    /// Maximum reading speed (words per minute)
    pub const MAX_WORDS_PER_MINUTE: usize = 1000;

    /// Clamp every value into its valid range.
    ///
    /// Called after deserialization so that a hand-edited config file cannot
    /// put the editor into an unusable state.
    pub fn sanitize(&mut self) {
        self.auto_save_interval_secs = self
            .auto_save_interval_secs
            .clamp(Self::MIN_AUTO_SAVE_INTERVAL, Self::MAX_AUTO_SAVE_INTERVAL);

        self.history_limit = self
            .history_limit
            .clamp(Self::MIN_HISTORY_LIMIT, Self::MAX_HISTORY_LIMIT);

        self.words_per_minute = self
            .words_per_minute
            .clamp(Self::MIN_WORDS_PER_MINUTE, Self::MAX_WORDS_PER_MINUTE);

        // An empty override means "use the platform directory"
        if self
            .storage_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.storage_dir = None;
        }
    }

    /// Deserialize settings from JSON and sanitize the result.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
