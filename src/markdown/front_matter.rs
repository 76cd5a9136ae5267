//! Front matter
//!
//! A small YAML-like header delimited by `---` lines, holding the document
//! metadata as `key: value` pairs. Arrays are written as `[a, b]` and read
//! back by splitting on commas; there is no escaping, so values containing
//! commas or brackets do not survive a round trip.

use log::debug;

use crate::model::Metadata;

const DELIMITER: &str = "---";

/// Render `metadata` as a front matter block followed by a blank line.
/// Empty fields are left out.
pub fn emit_front_matter(metadata: &Metadata) -> String {
    let mut out = String::from("---\n");
    let mut field = |key: &str, value: &str| {
        if !value.is_empty() {
            out.push_str(&format!("{}: {}\n", key, value));
        }
    };
    field("title", &metadata.title);
    field("description", &metadata.description);
    if !metadata.tags.is_empty() {
        field("tags", &format!("[{}]", metadata.tags.join(", ")));
    }
    field("date", &metadata.date);
    if let Some(author) = &metadata.author {
        field("author", author);
    }
    out.push_str("---\n\n");
    out
}

/// Split a leading front matter block off `source`.
///
/// Returns the parsed metadata (if the source opens with a complete block)
/// and the remaining body with leading blank lines removed. Unknown keys are
/// ignored.
pub fn parse_front_matter(source: &str) -> (Option<Metadata>, &str) {
    let mut lines = source.split_inclusive('\n');
    let mut consumed = match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => first.len(),
        _ => return (None, source),
    };

    let mut metadata = Metadata::default();
    for line in lines {
        consumed += line.len();
        let line = line.trim_end();
        if line == DELIMITER {
            let body = source[consumed..].trim_start_matches(['\n', '\r']);
            return (Some(metadata), body);
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => metadata.title = value.to_string(),
            "description" => metadata.description = value.to_string(),
            "tags" => metadata.tags = parse_array(value),
            "date" => metadata.date = value.to_string(),
            "author" => metadata.author = Some(value.to_string()).filter(|a| !a.is_empty()),
            other => debug!("Ignoring unknown front matter key '{}'", other),
        }
    }
    debug!("Unterminated front matter treated as body text");
    (None, source)
}

/// `[a, b]` or a bare `a, b` into trimmed, non-empty items.
fn parse_array(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata {
            title: "Trip notes".to_string(),
            description: "Day one".to_string(),
            tags: vec!["travel".to_string(), "norway".to_string()],
            date: "2024-06-01".to_string(),
            author: Some("Kari".to_string()),
        }
    }

    #[test]
    fn test_emit_front_matter() {
        assert_eq!(
            emit_front_matter(&sample()),
            "---\ntitle: Trip notes\ndescription: Day one\ntags: [travel, norway]\ndate: 2024-06-01\nauthor: Kari\n---\n\n"
        );
    }

    #[test]
    fn test_emit_skips_empty_fields() {
        let meta = Metadata::new("Only title");
        assert_eq!(emit_front_matter(&meta), "---\ntitle: Only title\n---\n\n");
    }

    #[test]
    fn test_parse_round_trip() {
        let source = format!("{}# Body", emit_front_matter(&sample()));
        let (meta, body) = parse_front_matter(&source);
        assert_eq!(meta, Some(sample()));
        assert_eq!(body, "# Body");
    }

    #[test]
    fn test_parse_without_front_matter() {
        let (meta, body) = parse_front_matter("Just text\n---\n");
        assert!(meta.is_none());
        assert_eq!(body, "Just text\n---\n");
    }

    #[test]
    fn test_parse_unterminated_block_is_body() {
        let (meta, body) = parse_front_matter("---\ntitle: x\n");
        assert!(meta.is_none());
        assert_eq!(body, "---\ntitle: x\n");
    }

    #[test]
    fn test_array_split_has_no_escaping() {
        let (meta, _) = parse_front_matter("---\ntags: [a, \"b, c\"]\n---\n");
        assert_eq!(
            meta.unwrap().tags,
            vec!["a".to_string(), "\"b".to_string(), "c\"".to_string()]
        );
    }
}
