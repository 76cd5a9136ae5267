//! Node vocabulary of the document tree
//!
//! A document is a tree of [`Node`]s. Every node is either an [`Element`]
//! (a typed container with ordered children) or a [`Text`] leaf, which is the
//! only place literal characters live.
//!
//! The three predicates [`is_void`], [`is_inline`] and [`is_block`] are the single
//! classification surface every other component consults. They depend only on
//! the node's type.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Scalar Properties
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level. Only three levels are part of the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl HeadingLevel {
    /// Numeric level (1-3).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Build a level from a hash count, rejecting anything outside 1-3.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        HeadingLevel::from_u8(level).ok_or_else(|| format!("heading level {} out of range", level))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.as_u8()
    }
}

/// Horizontal alignment of a block or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Visual filters applied to an image by the host. Percentages except `blur`,
/// which is in pixels. Not representable in Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    pub brightness: u16,
    pub contrast: u16,
    pub saturation: u16,
    pub grayscale: u16,
    pub blur: u16,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100,
            contrast: 100,
            saturation: 100,
            grayscale: 0,
            blur: 0,
        }
    }
}

/// Payload of an image void block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageProps {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    /// Display width as a percentage of the content column
    #[serde(default = "default_image_size")]
    pub size: u16,
    #[serde(default = "default_image_alignment")]
    pub alignment: Alignment,
    #[serde(default)]
    pub filters: ImageFilters,
}

fn default_image_size() -> u16 {
    100
}

fn default_image_alignment() -> Alignment {
    Alignment::Center
}

impl ImageProps {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
            size: default_image_size(),
            alignment: default_image_alignment(),
            filters: ImageFilters::default(),
        }
    }
}

/// Payload of a diagram void block. Rendering is delegated to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagramProps {
    pub diagram_type: String,
    pub code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Element Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// What an element's children are allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentModel {
    /// Text leaves and inline elements
    Inline,
    /// Text leaves only
    TextOnly,
    /// `ListItem` elements only
    ListItems,
    /// `TableRow` elements only
    TableRows,
    /// `TableCell` elements only
    TableCells,
    /// A single empty text placeholder
    Void,
}

/// The closed set of element types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    Heading {
        level: HeadingLevel,
    },
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Table,
    TableRow,
    TableCell,
    Image(ImageProps),
    Diagram(DiagramProps),
    Link {
        url: String,
    },
}

impl ElementKind {
    pub fn heading(level: HeadingLevel) -> Self {
        ElementKind::Heading { level }
    }

    pub fn code_block() -> Self {
        ElementKind::CodeBlock { language: None }
    }

    /// Void elements carry an opaque payload and no editable text.
    pub fn is_void(&self) -> bool {
        matches!(self, ElementKind::Image(_) | ElementKind::Diagram(_))
    }

    /// Inline elements flow within a line alongside text.
    pub fn is_inline(&self) -> bool {
        matches!(self, ElementKind::Link { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ElementKind::BulletedList | ElementKind::NumberedList)
    }

    /// Blocks whose children are inline content (the "lines" of the document).
    pub fn is_text_block(&self) -> bool {
        !self.is_inline() && self.content_model() == ContentModel::Inline
    }

    pub fn content_model(&self) -> ContentModel {
        match self {
            ElementKind::Paragraph
            | ElementKind::Heading { .. }
            | ElementKind::BlockQuote
            | ElementKind::ListItem
            | ElementKind::CodeBlock { .. }
            | ElementKind::TableCell => ContentModel::Inline,
            ElementKind::Link { .. } => ContentModel::TextOnly,
            ElementKind::BulletedList | ElementKind::NumberedList => ContentModel::ListItems,
            ElementKind::Table => ContentModel::TableRows,
            ElementKind::TableRow => ContentModel::TableCells,
            ElementKind::Image(_) | ElementKind::Diagram(_) => ContentModel::Void,
        }
    }

    /// Short type tag, matching the serialized `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::Heading { .. } => "heading",
            ElementKind::BlockQuote => "block-quote",
            ElementKind::BulletedList => "bulleted-list",
            ElementKind::NumberedList => "numbered-list",
            ElementKind::ListItem => "list-item",
            ElementKind::CodeBlock { .. } => "code-block",
            ElementKind::Table => "table",
            ElementKind::TableRow => "table-row",
            ElementKind::TableCell => "table-cell",
            ElementKind::Image(_) => "image",
            ElementKind::Diagram(_) => "diagram",
            ElementKind::Link { .. } => "link",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Leaves and Marks
// ─────────────────────────────────────────────────────────────────────────────

/// Text-level formatting flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Code,
}

/// The full set of marks a text leaf can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl Marks {
    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Code => self.code = on,
        }
    }

    pub fn toggled(mut self, mark: Mark) -> Self {
        let on = !self.has(mark);
        self.set(mark, on);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A run of characters sharing the same marks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            bold: marks.bold,
            italic: marks.italic,
            code: marks.code,
        }
    }

    pub fn marks(&self) -> Marks {
        Marks {
            bold: self.bold,
            italic: self.italic,
            code: self.code,
        }
    }

    pub fn set_mark(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Code => self.code = on,
        }
    }

    /// Length in characters (caret offsets count characters).
    pub fn len(&self) -> usize {
        crate::string_utils::char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements and Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A typed container node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            align: None,
            children,
        }
    }

    /// An element carrying one plain text leaf.
    pub fn with_text(kind: ElementKind, text: impl Into<String>) -> Self {
        Self::new(kind, vec![Node::Text(Text::new(text))])
    }

    /// A void element with its placeholder text child.
    pub fn void(kind: ElementKind) -> Self {
        Self::new(kind, vec![Node::Text(Text::default())])
    }

    /// A copy of this element's properties without children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            align: self.align,
            children: Vec::new(),
        }
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn element(kind: ElementKind, children: Vec<Node>) -> Self {
        Node::Element(Element::new(kind, children))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Element(Element::with_text(ElementKind::Paragraph, text))
    }

    pub fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Node::Element(Element::with_text(ElementKind::heading(level), text))
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Node::Element(Element::with_text(ElementKind::ListItem, text))
    }

    pub fn image(props: ImageProps) -> Self {
        Node::Element(Element::void(ElementKind::Image(props)))
    }

    pub fn diagram(diagram_type: impl Into<String>, code: impl Into<String>) -> Self {
        Node::Element(Element::void(ElementKind::Diagram(DiagramProps {
            diagram_type: diagram_type.into(),
            code: code.into(),
        })))
    }

    pub fn link(url: impl Into<String>, text: impl Into<String>) -> Self {
        Node::Element(Element::with_text(ElementKind::Link { url: url.into() }, text))
    }

    /// An empty table; the first row acts as the header when exported.
    pub fn table(rows: usize, columns: usize) -> Self {
        let rows = (0..rows.max(1))
            .map(|_| {
                let cells = (0..columns.max(1))
                    .map(|_| Node::Element(Element::with_text(ElementKind::TableCell, "")))
                    .collect();
                Node::element(ElementKind::TableRow, cells)
            })
            .collect();
        Node::element(ElementKind::Table, rows)
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&ElementKind> {
        self.as_element().map(|e| &e.kind)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Text leaf or inline element.
    pub fn is_inline_content(&self) -> bool {
        match self {
            Node::Text(_) => true,
            Node::Element(element) => element.kind.is_inline(),
        }
    }

    pub fn is_text_block(&self) -> bool {
        self.kind().is_some_and(ElementKind::is_text_block)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(element) => Some(&mut element.children),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of all leaves, ignoring marks.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification Predicates
// ─────────────────────────────────────────────────────────────────────────────

/// True for Image and Diagram elements.
pub fn is_void(node: &Node) -> bool {
    node.kind().is_some_and(ElementKind::is_void)
}

/// True for inline elements (Link).
pub fn is_inline(node: &Node) -> bool {
    node.kind().is_some_and(ElementKind::is_inline)
}

/// True for every element that is not inline. Text leaves are neither.
pub fn is_block(node: &Node) -> bool {
    matches!(node, Node::Element(_)) && !is_inline(node)
}

// ─────────────────────────────────────────────────────────────────────────────
// Property Patches
// ─────────────────────────────────────────────────────────────────────────────

/// Partial update of an image payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePatch {
    pub url: Option<String>,
    pub alt: Option<String>,
    pub size: Option<u16>,
    pub alignment: Option<Alignment>,
    pub filters: Option<ImageFilters>,
}

/// Shallow property merge applied by `set_nodes`. Children are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub kind: Option<ElementKind>,
    pub align: Option<Option<Alignment>>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub code: Option<bool>,
    pub image: Option<ImagePatch>,
    pub diagram: Option<DiagramProps>,
}

impl NodePatch {
    pub fn kind(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn align(align: Option<Alignment>) -> Self {
        Self {
            align: Some(align),
            ..Self::default()
        }
    }

    pub fn mark(mark: Mark, on: bool) -> Self {
        let mut patch = Self::default();
        match mark {
            Mark::Bold => patch.bold = Some(on),
            Mark::Italic => patch.italic = Some(on),
            Mark::Code => patch.code = Some(on),
        }
        patch
    }

    pub fn image(image: ImagePatch) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Merge the patch into `node`. Returns whether anything changed.
    pub fn apply(&self, node: &mut Node) -> bool {
        let before = node.clone();
        match node {
            Node::Text(text) => {
                if let Some(on) = self.bold {
                    text.bold = on;
                }
                if let Some(on) = self.italic {
                    text.italic = on;
                }
                if let Some(on) = self.code {
                    text.code = on;
                }
            }
            Node::Element(element) => {
                if let Some(kind) = &self.kind {
                    element.kind = kind.clone();
                }
                if let Some(align) = self.align {
                    element.align = align;
                }
                if let (Some(patch), ElementKind::Image(props)) = (&self.image, &mut element.kind) {
                    if let Some(url) = &patch.url {
                        props.url = url.clone();
                    }
                    if let Some(alt) = &patch.alt {
                        props.alt = alt.clone();
                    }
                    if let Some(size) = patch.size {
                        props.size = size;
                    }
                    if let Some(alignment) = patch.alignment {
                        props.alignment = alignment;
                    }
                    if let Some(filters) = patch.filters {
                        props.filters = filters;
                    }
                }
                if let (Some(diagram), ElementKind::Diagram(props)) =
                    (&self.diagram, &mut element.kind)
                {
                    *props = diagram.clone();
                }
            }
        }
        *node != before
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Predicate Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_predicates_by_type() {
        let image = Node::image(ImageProps::new("a.png", "A"));
        assert!(is_void(&image));
        assert!(is_block(&image));
        assert!(!is_inline(&image));

        let link = Node::link("https://example.com", "site");
        assert!(is_inline(&link));
        assert!(!is_block(&link));
        assert!(!is_void(&link));

        let text = Node::text("x");
        assert!(!is_inline(&text));
        assert!(!is_block(&text));

        assert!(is_block(&Node::paragraph("p")));
    }

    #[test]
    fn test_text_blocks() {
        assert!(ElementKind::Paragraph.is_text_block());
        assert!(ElementKind::ListItem.is_text_block());
        assert!(ElementKind::TableCell.is_text_block());
        assert!(!ElementKind::BulletedList.is_text_block());
        assert!(!ElementKind::Link { url: String::new() }.is_text_block());
    }

    #[test]
    fn test_heading_level_range() {
        assert_eq!(HeadingLevel::from_u8(2), Some(HeadingLevel::H2));
        assert_eq!(HeadingLevel::from_u8(4), None);
        assert_eq!(HeadingLevel::from_u8(0), None);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_node_json_shape() {
        let node = Node::heading(HeadingLevel::H2, "Title");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
        assert_eq!(json["children"][0]["text"], "Title");
        assert!(json["children"][0].get("bold").is_none());
    }

    #[test]
    fn test_image_json_round_trip() {
        let mut props = ImageProps::new("a.png", "A");
        props.filters.blur = 3;
        let node = Node::image(props);
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_invalid_heading_level_rejected() {
        let json = r#"{"type":"heading","level":5,"children":[{"text":""}]}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Patch Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_patch_kind_keeps_children() {
        let mut node = Node::paragraph("keep me");
        assert!(NodePatch::kind(ElementKind::BlockQuote).apply(&mut node));
        assert_eq!(node.kind(), Some(&ElementKind::BlockQuote));
        assert_eq!(node.text_content(), "keep me");
    }

    #[test]
    fn test_patch_image_is_shallow_merge() {
        let mut node = Node::image(ImageProps::new("a.png", "A"));
        let patch = NodePatch::image(ImagePatch {
            size: Some(50),
            ..ImagePatch::default()
        });
        assert!(patch.apply(&mut node));
        match node.kind() {
            Some(ElementKind::Image(props)) => {
                assert_eq!(props.size, 50);
                assert_eq!(props.url, "a.png");
                assert_eq!(props.alt, "A");
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_unchanged_reports_false() {
        let mut node = Node::text("plain");
        assert!(!NodePatch::mark(Mark::Bold, false).apply(&mut node));
        assert!(NodePatch::mark(Mark::Bold, true).apply(&mut node));
    }
}
