//! Markdown serializer
//!
//! A pure walk over the node tree. Each element type has one rendering rule;
//! text leaves get their mark wrappers applied code first, then bold, then
//! italic, so inline code always ends up innermost.
//!
//! Image alignment, size and filters have no Markdown form and are dropped.

use crate::model::{Alignment, Document, Element, ElementKind, Node, Text};

/// Separator placed between top-level blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Render a whole document. Top-level blocks are separated by a blank line.
pub fn serialize(doc: &Document) -> String {
    doc.children
        .iter()
        .map(serialize_node)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

pub fn serialize_node(node: &Node) -> String {
    match node {
        Node::Text(text) => serialize_text(text),
        Node::Element(element) => serialize_element(element),
    }
}

/// Render a text leaf with its mark wrappers. Empty text renders as nothing.
pub fn serialize_text(text: &Text) -> String {
    if text.text.is_empty() {
        return String::new();
    }
    let mut out = text.text.clone();
    if text.code {
        out = format!("`{}`", out);
    }
    if text.bold {
        out = format!("**{}**", out);
    }
    if text.italic {
        out = format!("*{}*", out);
    }
    out
}

fn inline_content(children: &[Node]) -> String {
    children.iter().map(serialize_node).collect()
}

fn serialize_element(element: &Element) -> String {
    let children = &element.children;
    match &element.kind {
        ElementKind::Paragraph | ElementKind::ListItem | ElementKind::TableCell => {
            inline_content(children)
        }
        ElementKind::Heading { level } => format!(
            "{} {}",
            "#".repeat(usize::from(level.as_u8())),
            inline_content(children)
        ),
        ElementKind::BlockQuote => format!("> {}", inline_content(children)),
        ElementKind::BulletedList => children
            .iter()
            .map(|item| format!("- {}", serialize_node(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        ElementKind::NumberedList => children
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, serialize_node(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        ElementKind::CodeBlock { language } => {
            let code: String = children.iter().map(Node::text_content).collect();
            fence(language.as_deref().unwrap_or(""), &code)
        }
        ElementKind::Image(props) => format!("![{}]({})", props.alt, props.url),
        ElementKind::Diagram(props) => fence(&props.diagram_type, &props.code),
        ElementKind::Link { url } => format!("[{}]({})", inline_content(children), url),
        ElementKind::Table => serialize_table(children),
        ElementKind::TableRow => table_row(children),
    }
}

fn fence(info: &str, code: &str) -> String {
    format!("```{}\n{}\n```", info, code)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

/// Header row, separator, then the remaining rows. Column alignment is read
/// from the header cells.
fn serialize_table(rows: &[Node]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };
    let mut lines = vec![table_row(header.children())];
    let separator: Vec<&str> = header
        .children()
        .iter()
        .map(|cell| {
            let align = cell.as_element().and_then(|element| element.align);
            alignment_marker(align)
        })
        .collect();
    lines.push(format!("| {} |", separator.join(" | ")));
    lines.extend(body.iter().map(|row| table_row(row.children())));
    lines.join("\n")
}

fn table_row(cells: &[Node]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|cell| serialize_node(cell).trim().to_string())
        .collect();
    format!("| {} |", cells.join(" | "))
}

fn alignment_marker(align: Option<Alignment>) -> &'static str {
    match align {
        Some(Alignment::Left) => ":---",
        Some(Alignment::Center) => ":---:",
        Some(Alignment::Right) => "---:",
        Some(Alignment::Justify) | None => "---",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
