//! Document metadata record
//!
//! Persisted next to the node tree and emitted as front matter on export.

use serde::{Deserialize, Serialize};

/// Descriptive fields of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Free-form date string as entered by the user
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.tags.is_empty()
            && self.date.is_empty()
            && self.author.as_deref().map_or(true, str::is_empty)
    }
}
