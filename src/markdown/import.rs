//! Markdown import using comrak
//!
//! Parses Markdown (CommonMark + GFM tables) and maps the comrak AST onto the
//! document vocabulary. Constructs without a counterpart are flattened:
//! headings deeper than three clamp to level 3, nested lists join their
//! parent list, multi-paragraph quotes become one quote per paragraph, and
//! images are lifted out of paragraphs into their own blocks.

use comrak::{
    nodes::{
        AstNode, ListType as ComrakListType, NodeValue, TableAlignment as ComrakTableAlignment,
    },
    parse_document, Arena, Options,
};

use crate::editor::normalize_document;
use crate::error::{Error, Result};
use crate::model::{
    Alignment, Document, Element, ElementKind, HeadingLevel, ImageProps, Marks, Metadata, Node,
    Text,
};

use super::front_matter::parse_front_matter;

/// Fence info strings imported as diagram blocks instead of code blocks.
const DIAGRAM_LANGUAGES: &[&str] = &["mermaid", "plantuml", "graphviz", "dot"];

/// Result of importing a Markdown source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMarkdown {
    /// The normalized document
    pub document: Document,
    /// Metadata from a leading front matter block, if any
    pub metadata: Option<Metadata>,
}

fn comrak_options() -> Options {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

/// Parse Markdown text into a normalized document.
///
/// # Example
/// ```ignore
/// let imported = parse_markdown("# Hello\n\nThis is **bold** text.")?;
/// assert_eq!(imported.document.children.len(), 2);
/// ```
pub fn parse_markdown(markdown: &str) -> Result<ImportedMarkdown> {
    if markdown.contains('\0') {
        return Err(Error::MarkdownImport(
            "source contains NUL bytes and is not a text file".to_string(),
        ));
    }

    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, markdown, &options);

    let mut metadata = None;
    let mut blocks = Vec::new();
    for child in root.children() {
        if let NodeValue::FrontMatter(raw) = &child.data.borrow().value {
            metadata = parse_front_matter(raw).0;
            continue;
        }
        convert_block(child, &mut blocks);
    }

    Ok(ImportedMarkdown {
        document: normalize_document(Document::new(blocks)),
        metadata,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Append the blocks for one comrak block node to `out`.
fn convert_block<'a>(node: &'a AstNode<'a>, out: &mut Vec<Node>) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Paragraph => paragraph_blocks(node, ElementKind::Paragraph, out),
        NodeValue::Heading(heading) => {
            let level = HeadingLevel::from_u8(heading.level.min(3)).unwrap_or(HeadingLevel::H3);
            paragraph_blocks(node, ElementKind::heading(level), out);
        }
        NodeValue::BlockQuote => {
            for child in node.children() {
                if matches!(child.data.borrow().value, NodeValue::Paragraph) {
                    paragraph_blocks(child, ElementKind::BlockQuote, out);
                } else {
                    convert_block(child, out);
                }
            }
        }
        NodeValue::List(list) => {
            let kind = match list.list_type {
                ComrakListType::Bullet => ElementKind::BulletedList,
                ComrakListType::Ordered => ElementKind::NumberedList,
            };
            let mut items = Vec::new();
            collect_items(node, &mut items);
            out.push(Node::element(kind, items));
        }
        NodeValue::CodeBlock(code) => {
            let info = code.info.split_whitespace().next().unwrap_or("").to_string();
            let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
            if DIAGRAM_LANGUAGES.contains(&info.as_str()) {
                out.push(Node::diagram(info, literal));
            } else {
                let language = Some(info).filter(|lang| !lang.is_empty());
                out.push(Node::element(
                    ElementKind::CodeBlock { language },
                    vec![Node::text(literal)],
                ));
            }
        }
        NodeValue::HtmlBlock(html) => {
            out.push(Node::paragraph(html.literal.trim_end()));
        }
        NodeValue::Table(table) => {
            let alignments: Vec<Option<Alignment>> =
                table.alignments.iter().map(|a| convert_alignment(*a)).collect();
            let rows = node
                .children()
                .map(|row| {
                    let cells = row
                        .children()
                        .enumerate()
                        .map(|(column, cell)| {
                            let mut element =
                                Element::new(ElementKind::TableCell, inline_children(cell));
                            element.align = alignments.get(column).copied().flatten();
                            Node::Element(element)
                        })
                        .collect();
                    Node::element(ElementKind::TableRow, cells)
                })
                .collect();
            out.push(Node::element(ElementKind::Table, rows));
        }
        NodeValue::ThematicBreak | NodeValue::FrontMatter(_) => {}
        _ => {
            for child in node.children() {
                convert_block(child, out);
            }
        }
    }
}

/// List items of `list`, with nested lists joined in order.
fn collect_items<'a>(list: &'a AstNode<'a>, items: &mut Vec<Node>) {
    for item in list.children() {
        for child in item.children() {
            let value = child.data.borrow().value.clone();
            match value {
                NodeValue::List(_) => collect_items(child, items),
                NodeValue::Paragraph => {
                    let mut blocks = Vec::new();
                    paragraph_blocks(child, ElementKind::ListItem, &mut blocks);
                    items.extend(blocks);
                }
                _ => items.push(Node::list_item(plain_text(child))),
            }
        }
    }
}

fn convert_alignment(align: ComrakTableAlignment) -> Option<Alignment> {
    match align {
        ComrakTableAlignment::Left => Some(Alignment::Left),
        ComrakTableAlignment::Center => Some(Alignment::Center),
        ComrakTableAlignment::Right => Some(Alignment::Right),
        ComrakTableAlignment::None => None,
    }
}

/// Emit the inline content of `node` as blocks of `kind`, with any images
/// split out into image blocks between them. Blank text around images is
/// dropped.
fn paragraph_blocks<'a>(node: &'a AstNode<'a>, kind: ElementKind, out: &mut Vec<Node>) {
    let has_image = node
        .children()
        .any(|child| matches!(child.data.borrow().value, NodeValue::Image(_)));
    let mut run: Vec<Node> = Vec::new();
    for child in node.children() {
        let value = child.data.borrow().value.clone();
        if let NodeValue::Image(link) = value {
            flush_run(&mut run, &kind, has_image, out);
            out.push(Node::image(ImageProps::new(link.url, plain_text(child))));
            continue;
        }
        convert_inline(child, Marks::default(), &mut run);
    }
    flush_run(&mut run, &kind, has_image, out);
}

fn flush_run(run: &mut Vec<Node>, kind: &ElementKind, has_image: bool, out: &mut Vec<Node>) {
    let blank = run.iter().all(|node| node.text_content().trim().is_empty());
    if has_image && blank {
        run.clear();
        return;
    }
    out.push(Node::element(kind.clone(), std::mem::take(run)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Conversion
// ─────────────────────────────────────────────────────────────────────────────

fn inline_children<'a>(node: &'a AstNode<'a>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in node.children() {
        convert_inline(child, Marks::default(), &mut out);
    }
    out
}

/// Append text leaves (and links) for an inline node under `marks`.
fn convert_inline<'a>(node: &'a AstNode<'a>, marks: Marks, out: &mut Vec<Node>) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Text(text) => out.push(Node::Text(Text::with_marks(text, marks))),
        NodeValue::Code(code) => {
            let marks = Marks { code: true, ..marks };
            out.push(Node::Text(Text::with_marks(code.literal, marks)));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            out.push(Node::Text(Text::with_marks(" ", marks)));
        }
        NodeValue::HtmlInline(html) => out.push(Node::Text(Text::with_marks(html, marks))),
        NodeValue::Emph => {
            let marks = Marks { italic: true, ..marks };
            for child in node.children() {
                convert_inline(child, marks, out);
            }
        }
        NodeValue::Strong => {
            let marks = Marks { bold: true, ..marks };
            for child in node.children() {
                convert_inline(child, marks, out);
            }
        }
        NodeValue::Link(link) => {
            let mut children = Vec::new();
            for child in node.children() {
                convert_inline(child, marks, &mut children);
            }
            out.push(Node::element(ElementKind::Link { url: link.url }, children));
        }
        NodeValue::Image(_) => out.push(Node::Text(Text::with_marks(plain_text(node), marks))),
        _ => {
            for child in node.children() {
                convert_inline(child, marks, out);
            }
        }
    }
}

/// Concatenated literal text below `node`.
fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
