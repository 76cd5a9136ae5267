//! Editing Commands
//!
//! Host-level actions composed from the mutation operations in
//! [`transforms`](super::transforms):
//! - **Voids**: insert and update images and diagrams
//! - **Tables**: insert a table, add a row or a column
//! - **Inline**: links, mark toggling, formatting state for toolbars
//! - **Blocks**: block type toggling, alignment, Enter handling
//! - **Paste/drop**: plain text, URLs and decoded image data
//!
//! # Usage
//! ```ignore
//! let mut tx = Transaction::new(doc, selection);
//! commands::toggle_block(&mut tx, BlockType::Heading(HeadingLevel::H2))?;
//! let (doc, selection) = tx.commit();
//! ```

use log::debug;

use crate::error::EditError;
use crate::model::{
    Alignment, DiagramProps, Document, Element, ElementKind, HeadingLevel, ImagePatch, ImageProps,
    Mark, Marks, Node, NodePatch, Path, Point, Selection, Text,
};

use super::transaction::Transaction;
use super::transforms::{self, At};

/// File extensions treated as images when pasted or dropped as a URL.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "avif",
];

// ─────────────────────────────────────────────────────────────────────────────
// Command Types
// ─────────────────────────────────────────────────────────────────────────────

/// Block types offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    BlockQuote,
    CodeBlock,
    BulletedList,
    NumberedList,
}

impl BlockType {
    /// Kind given to each line of this type. List types produce list items.
    fn line_kind(self) -> ElementKind {
        match self {
            BlockType::Paragraph => ElementKind::Paragraph,
            BlockType::Heading(level) => ElementKind::heading(level),
            BlockType::BlockQuote => ElementKind::BlockQuote,
            BlockType::CodeBlock => ElementKind::code_block(),
            BlockType::BulletedList | BlockType::NumberedList => ElementKind::ListItem,
        }
    }

    fn list_kind(self) -> Option<ElementKind> {
        match self {
            BlockType::BulletedList => Some(ElementKind::BulletedList),
            BlockType::NumberedList => Some(ElementKind::NumberedList),
            _ => None,
        }
    }
}

/// Content handed over by a paste or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain text, possibly several lines
    Text(String),
    /// A single URL
    Url(String),
    /// Binary image data already encoded as a `data:` URL by the host
    ImageData(String),
}

/// Formatting at the caret, for toolbar state reflection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattingState {
    /// Marks carried by every selected text run
    pub marks: Marks,
    /// Block type of the line under the focus
    pub block: Option<BlockType>,
    /// Is the focus inside a link?
    pub in_link: bool,
    /// Alignment of the line under the focus
    pub alignment: Option<Alignment>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Images and Diagrams
// ─────────────────────────────────────────────────────────────────────────────

/// Whether `url` looks like an image: a `data:image/` URL, or a path whose
/// last segment ends in a known image extension. Query and fragment are
/// ignored.
pub fn is_image_url(url: &str) -> bool {
    let url = url.trim();
    if url.to_ascii_lowercase().starts_with("data:image/") {
        return true;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rsplit_once('.').is_some_and(|(_, ext)| {
        let ext = ext.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    !text.contains(char::is_whitespace)
        && ["http://", "https://", "data:"]
            .iter()
            .any(|scheme| text.starts_with(scheme))
}

/// Insert an image block at the caret. Returns its path.
pub fn insert_image(tx: &mut Transaction, props: ImageProps) -> Result<Path, EditError> {
    insert_block(tx, Node::image(props))
}

/// Merge `patch` onto the image at `path`.
pub fn update_image(tx: &mut Transaction, path: Path, patch: ImagePatch) -> Result<(), EditError> {
    if !matches!(tx.document().kind(&path), Some(ElementKind::Image(_))) {
        return Err(EditError::InvalidOperation(format!(
            "no image at {:?}",
            path.as_slice()
        )));
    }
    tx.set_node(path, NodePatch::image(patch))
}

/// Insert a diagram block at the caret. Returns its path.
pub fn insert_diagram(
    tx: &mut Transaction,
    diagram_type: &str,
    code: &str,
) -> Result<Path, EditError> {
    insert_block(tx, Node::diagram(diagram_type, code))
}

/// Replace the type and source of the diagram at `path`.
pub fn update_diagram(
    tx: &mut Transaction,
    path: Path,
    props: DiagramProps,
) -> Result<(), EditError> {
    if !matches!(tx.document().kind(&path), Some(ElementKind::Diagram(_))) {
        return Err(EditError::InvalidOperation(format!(
            "no diagram at {:?}",
            path.as_slice()
        )));
    }
    let patch = NodePatch {
        diagram: Some(props),
        ..NodePatch::default()
    };
    tx.set_node(path, patch)
}

fn insert_block(tx: &mut Transaction, node: Node) -> Result<Path, EditError> {
    transforms::insert_nodes(tx, vec![node], None)?
        .into_iter()
        .next()
        .ok_or_else(|| EditError::InvalidOperation("nothing inserted".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

/// Insert an empty `rows` x `columns` table and put the caret in its first
/// cell. The first row is the header row on export.
pub fn insert_table(tx: &mut Transaction, rows: usize, columns: usize) -> Result<Path, EditError> {
    let path = insert_block(tx, Node::table(rows, columns))?;
    if let Some(start) = tx.document().start_of(&path) {
        tx.set_selection(Some(Selection::collapsed(start)));
    }
    Ok(path)
}

/// Add an empty row below the row under the caret.
pub fn insert_table_row(tx: &mut Transaction) -> Result<Path, EditError> {
    let row = caret_ancestor(tx, |kind| *kind == ElementKind::TableRow)?;
    let cells = tx
        .document()
        .node(&row)
        .map(|node| node.children().len())
        .unwrap_or(1);
    let node = Node::element(
        ElementKind::TableRow,
        (0..cells.max(1))
            .map(|_| Node::Element(Element::with_text(ElementKind::TableCell, "")))
            .collect(),
    );
    let at = row.next();
    tx.insert_node(at.clone(), node)?;
    if let Some(start) = tx.document().start_of(&at) {
        tx.set_selection(Some(Selection::collapsed(start)));
    }
    Ok(at)
}

/// Add an empty column to the right of the cell under the caret.
pub fn insert_table_column(tx: &mut Transaction) -> Result<(), EditError> {
    let cell = caret_ancestor(tx, |kind| *kind == ElementKind::TableCell)?;
    let table = caret_ancestor(tx, |kind| *kind == ElementKind::Table)?;
    let column = cell.index().unwrap_or(0) + 1;
    let rows = tx
        .document()
        .node(&table)
        .map(|node| node.children().len())
        .unwrap_or(0);
    for row in 0..rows {
        let row_path = table.child(row);
        let len = tx
            .document()
            .node(&row_path)
            .map(|node| node.children().len())
            .unwrap_or(0);
        tx.insert_node(
            row_path.child(column.min(len)),
            Node::Element(Element::with_text(ElementKind::TableCell, "")),
        )?;
    }
    Ok(())
}

fn caret_ancestor(
    tx: &Transaction,
    pred: impl Fn(&ElementKind) -> bool,
) -> Result<Path, EditError> {
    let focus = tx.selection().ok_or(EditError::NoSelection)?.focus.clone();
    tx.document()
        .closest(&focus.path, pred)
        .ok_or_else(|| EditError::InvalidOperation("caret is not in a table".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Links and Marks
// ─────────────────────────────────────────────────────────────────────────────

/// Link the selected text to `url`, or insert a link at the caret whose text
/// is `text` (the URL itself when absent).
pub fn insert_link(tx: &mut Transaction, url: &str, text: Option<&str>) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        transforms::unwrap_nodes(tx, |node| node.kind().is_some_and(ElementKind::is_inline), None, false)?;
        let wrapper = Element::new(ElementKind::Link { url: url.to_string() }, Vec::new());
        return transforms::wrap_nodes(tx, wrapper, None, true);
    }
    let label = text.filter(|t| !t.is_empty()).unwrap_or(url);
    transforms::insert_nodes(tx, vec![Node::link(url, label)], None)?;
    Ok(())
}

/// Text leaves holding characters of the range, voids excluded.
fn covered_leaves(doc: &Document, start: &Point, end: &Point) -> Vec<Path> {
    if start == end {
        return vec![start.path.clone()];
    }
    doc.text_leaves()
        .into_iter()
        .filter(|leaf| *leaf >= start.path && *leaf <= end.path)
        .filter(|leaf| doc.void_above(leaf).is_none())
        .filter(|leaf| !(*leaf == end.path && end.offset == 0))
        .filter(|leaf| {
            let len = doc.text(leaf).map(Text::len).unwrap_or(0);
            !(*leaf == start.path && start.offset >= len && len > 0)
        })
        .collect()
}

/// Marks of the text leaf under `point`.
pub fn marks_at(doc: &Document, point: &Point) -> Marks {
    doc.text(&point.path).map(Text::marks).unwrap_or_default()
}

/// Whether every text run in the selection carries `mark`.
pub fn is_mark_active(doc: &Document, selection: &Selection, mark: Mark) -> bool {
    let leaves = covered_leaves(doc, selection.start(), selection.end());
    !leaves.is_empty()
        && leaves
            .iter()
            .all(|leaf| doc.text(leaf).is_some_and(|text| text.marks().has(mark)))
}

/// Flip `mark` on the selected characters. It is removed when every selected
/// run already has it, and added everywhere otherwise. The selection keeps
/// covering the same characters.
pub fn toggle_mark_range(tx: &mut Transaction, mark: Mark) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_collapsed() {
        debug!("Mark toggle on a collapsed selection has no range to format");
        return Ok(());
    }
    let on = !is_mark_active(tx.document(), &sel, mark);
    let Some((first, last)) =
        transforms::isolate_leaves(tx, sel.start().clone(), sel.end().clone(), true)?
    else {
        return Ok(());
    };
    let leaves: Vec<Path> = tx
        .document()
        .text_leaves()
        .into_iter()
        .filter(|leaf| *leaf >= first && *leaf <= last)
        .filter(|leaf| tx.document().void_above(leaf).is_none())
        .collect();
    for leaf in leaves {
        tx.set_node(leaf, NodePatch::mark(mark, on))?;
    }
    let last_len = tx.document().text(&last).map(Text::len).unwrap_or(0);
    tx.set_selection(Some(Selection::new(
        Point::new(first, 0),
        Point::new(last, last_len),
    )));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Types and Alignment
// ─────────────────────────────────────────────────────────────────────────────

/// Block type of a line, looking through list items to their list.
pub fn block_type_at(doc: &Document, line: &Path) -> Option<BlockType> {
    match doc.kind(line)? {
        ElementKind::Paragraph => Some(BlockType::Paragraph),
        ElementKind::Heading { level } => Some(BlockType::Heading(*level)),
        ElementKind::BlockQuote => Some(BlockType::BlockQuote),
        ElementKind::CodeBlock { .. } => Some(BlockType::CodeBlock),
        ElementKind::ListItem => match doc.kind(&line.parent()?)? {
            ElementKind::BulletedList => Some(BlockType::BulletedList),
            ElementKind::NumberedList => Some(BlockType::NumberedList),
            _ => None,
        },
        _ => None,
    }
}

/// Lines in the selection whose type can be toggled. Table cells and voids
/// keep their type.
fn toggleable_lines(tx: &Transaction) -> Result<Vec<Path>, EditError> {
    let doc = tx.document();
    Ok(transforms::lines_in_range(tx, None)?
        .into_iter()
        .filter(|line| {
            matches!(
                doc.kind(line),
                Some(
                    ElementKind::Paragraph
                        | ElementKind::Heading { .. }
                        | ElementKind::BlockQuote
                        | ElementKind::CodeBlock { .. }
                        | ElementKind::ListItem
                )
            )
        })
        .collect())
}

/// Convert the selected lines to `block`, or back to paragraphs when they all
/// already are `block`. Lines leave any list they are in first.
pub fn toggle_block(tx: &mut Transaction, block: BlockType) -> Result<(), EditError> {
    let lines = toggleable_lines(tx)?;
    if lines.is_empty() {
        return Ok(());
    }
    let doc = tx.document();
    let active = lines
        .iter()
        .all(|line| block_type_at(doc, line) == Some(block));
    let in_list = lines
        .iter()
        .any(|line| doc.kind(line) == Some(&ElementKind::ListItem));

    if in_list {
        transforms::unwrap_nodes(
            tx,
            |node| node.kind().is_some_and(ElementKind::is_list),
            None,
            true,
        )?;
    }

    let target = if active { BlockType::Paragraph } else { block };
    let lines = toggleable_lines(tx)?;
    for line in &lines {
        tx.set_node(line.clone(), NodePatch::kind(target.line_kind()))?;
    }
    if let Some(list) = target.list_kind() {
        wrap_runs(tx, &lines, list)?;
    }
    Ok(())
}

/// Wrap each run of adjacent sibling lines in its own `list`, so blocks
/// between the lines are never pulled into the list.
fn wrap_runs(tx: &mut Transaction, lines: &[Path], list: ElementKind) -> Result<(), EditError> {
    let mut runs: Vec<(Path, usize, usize)> = Vec::new();
    for line in lines {
        let (Some(parent), Some(index)) = (line.parent(), line.index()) else {
            continue;
        };
        match runs.last_mut() {
            Some((run_parent, _, to)) if *run_parent == parent && *to + 1 == index => *to = index,
            _ => runs.push((parent, index, index)),
        }
    }
    for (parent, from, to) in runs.into_iter().rev() {
        tx.wrap_nodes(parent, from, to - from + 1, Element::new(list.clone(), Vec::new()))?;
    }
    Ok(())
}

/// Align the selected text blocks and images. `None` clears text alignment
/// and centers images.
pub fn set_alignment(tx: &mut Transaction, align: Option<Alignment>) -> Result<(), EditError> {
    for line in transforms::lines_in_range(tx, None)? {
        let patch = match tx.document().kind(&line) {
            Some(ElementKind::Image(_)) => NodePatch::image(ImagePatch {
                alignment: Some(align.unwrap_or(Alignment::Center)),
                ..ImagePatch::default()
            }),
            Some(kind) if kind.is_text_block() => NodePatch::align(align),
            _ => continue,
        };
        tx.set_node(line, patch)?;
    }
    Ok(())
}

/// Toolbar state for the selection.
pub fn formatting_state(doc: &Document, selection: Option<&Selection>) -> FormattingState {
    let Some(sel) = selection else {
        return FormattingState::default();
    };
    let mut marks = Marks::default();
    for mark in [Mark::Bold, Mark::Italic, Mark::Code] {
        marks.set(mark, is_mark_active(doc, sel, mark));
    }
    let line = doc.line_block(&sel.focus.path);
    FormattingState {
        marks,
        block: line.as_ref().and_then(|line| block_type_at(doc, line)),
        in_link: doc.closest(&sel.focus.path, ElementKind::is_inline).is_some(),
        alignment: line
            .as_ref()
            .and_then(|line| doc.element(line))
            .and_then(|element| element.align),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enter
// ─────────────────────────────────────────────────────────────────────────────

/// Default Enter behaviour once no input rule has handled it.
///
/// - On a void block: a new paragraph goes below it
/// - In a code block: a literal newline
/// - In an empty list item or quote: the line becomes a paragraph
/// - In a table cell: nothing
/// - Otherwise the line splits; a heading continues as a paragraph when the
///   split happens at its end
pub fn insert_break(tx: &mut Transaction) -> Result<(), EditError> {
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        transforms::delete_range(tx, sel.start().clone(), sel.end().clone())?;
    }
    let point = tx
        .selection()
        .map(|sel| sel.focus.clone())
        .ok_or(EditError::NoSelection)?;

    let doc = tx.document();
    if let Some(void) = doc.void_above(&point.path) {
        transforms::insert_nodes(tx, vec![Node::paragraph("")], Some(At::Path(void.next())))?;
        return Ok(());
    }
    let line = doc
        .line_block(&point.path)
        .ok_or_else(|| EditError::InvalidPath(point.path.clone()))?;
    let kind = doc
        .kind(&line)
        .cloned()
        .ok_or_else(|| EditError::InvalidPath(line.clone()))?;
    let empty = doc.node(&line).is_some_and(|node| node.text_content().is_empty());

    match kind {
        ElementKind::CodeBlock { .. } => transforms::insert_text(tx, "\n", None),
        ElementKind::TableCell => {
            debug!("Enter inside a table cell ignored");
            Ok(())
        }
        ElementKind::ListItem if empty => {
            tx.set_node(line.clone(), NodePatch::kind(ElementKind::Paragraph))?;
            transforms::lift_node(tx, &line).map(|_| ())
        }
        ElementKind::BlockQuote if empty => {
            tx.set_node(line, NodePatch::kind(ElementKind::Paragraph))
        }
        ElementKind::Heading { .. } => {
            let new = transforms::split_block(tx, &point)?;
            tx.set_node(new, NodePatch::kind(ElementKind::Paragraph))
        }
        _ => transforms::split_block(tx, &point).map(|_| ()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paste and Drop
// ─────────────────────────────────────────────────────────────────────────────

/// Insert pasted or dropped content at the caret.
pub fn paste(tx: &mut Transaction, payload: Payload) -> Result<(), EditError> {
    match payload {
        Payload::ImageData(data_url) => insert_image(tx, ImageProps::new(data_url, "")).map(|_| ()),
        Payload::Url(url) => paste_url(tx, url.trim()),
        Payload::Text(text) if looks_like_url(&text) => paste_url(tx, text.trim()),
        Payload::Text(text) => paste_text(tx, &text),
    }
}

fn paste_url(tx: &mut Transaction, url: &str) -> Result<(), EditError> {
    if is_image_url(url) {
        insert_image(tx, ImageProps::new(url, "")).map(|_| ())
    } else {
        insert_link(tx, url, None)
    }
}

/// Each pasted line becomes its own block, except inside code blocks (kept
/// verbatim) and table cells (joined with spaces).
fn paste_text(tx: &mut Transaction, text: &str) -> Result<(), EditError> {
    let text = text.replace("\r\n", "\n");
    let sel = tx.selection().cloned().ok_or(EditError::NoSelection)?;
    if sel.is_expanded() {
        transforms::delete_range(tx, sel.start().clone(), sel.end().clone())?;
    }
    let focus = current_focus(tx)?;
    if let Some(void) = tx.document().void_above(&focus.path) {
        transforms::insert_nodes(tx, vec![Node::paragraph("")], Some(At::Path(void.next())))?;
    }

    let focus = current_focus(tx)?;
    let doc = tx.document();
    let line_kind = doc.line_block(&focus.path).and_then(|line| doc.kind(&line).cloned());
    match line_kind {
        Some(ElementKind::CodeBlock { .. }) => transforms::insert_text(tx, &text, None),
        Some(ElementKind::TableCell) => {
            let joined = text.split('\n').collect::<Vec<_>>().join(" ");
            transforms::insert_text(tx, &joined, None)
        }
        _ => {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    let caret = current_focus(tx)?;
                    transforms::split_block(tx, &caret)?;
                }
                transforms::insert_text(tx, line, None)?;
            }
            Ok(())
        }
    }
}

fn current_focus(tx: &Transaction) -> Result<Point, EditError> {
    tx.selection()
        .map(|sel| sel.focus.clone())
        .ok_or(EditError::NoSelection)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn caret(path: &[usize], offset: usize) -> Option<Selection> {
        Some(Selection::collapsed(Point::new(path.to_vec(), offset)))
    }

    fn range(from: (&[usize], usize), to: (&[usize], usize)) -> Option<Selection> {
        Some(Selection::new(
            Point::new(from.0.to_vec(), from.1),
            Point::new(to.0.to_vec(), to.1),
        ))
    }

    fn run<F>(doc: Document, selection: Option<Selection>, f: F) -> (Document, Option<Selection>)
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditError>,
    {
        let mut tx = Transaction::new(doc, selection);
        f(&mut tx).unwrap();
        tx.commit()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Image URL Heuristic
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_is_image_url_extensions() {
        assert!(is_image_url("https://example.com/cat.PNG"));
        assert!(is_image_url("https://example.com/a/b.webp?size=2#top"));
        assert!(is_image_url("photo.jpeg"));
        assert!(!is_image_url("https://example.com/page.html"));
        assert!(!is_image_url("https://example.com"));
        assert!(!is_image_url("https://example.png/page"));
    }

    #[test]
    fn test_is_image_url_data_prefix() {
        assert!(is_image_url("data:image/png;base64,AAAA"));
        assert!(!is_image_url("data:text/plain;base64,AAAA"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Voids and Tables
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_update_image_merges_patch() {
        let doc = Document::new(vec![Node::image(ImageProps::new("a.png", "A"))]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            update_image(
                tx,
                Path::new(vec![0]),
                ImagePatch {
                    size: Some(50),
                    ..ImagePatch::default()
                },
            )
        });
        let Some(ElementKind::Image(props)) = doc.kind(&Path::new(vec![0])) else {
            panic!("image expected");
        };
        assert_eq!(props.size, 50);
        assert_eq!(props.alt, "A");
    }

    #[test]
    fn test_update_image_rejects_other_nodes() {
        let mut tx = Transaction::new(Document::new(vec![Node::paragraph("x")]), None);
        assert!(update_image(&mut tx, Path::new(vec![0]), ImagePatch::default()).is_err());
    }

    #[test]
    fn test_update_diagram_keeps_placeholder() {
        let doc = Document::new(vec![Node::diagram("mermaid", "graph TD")]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            update_diagram(
                tx,
                Path::new(vec![0]),
                DiagramProps {
                    diagram_type: "mermaid".into(),
                    code: "graph LR".into(),
                },
            )
        });
        assert_eq!(doc.children[0], Node::diagram("mermaid", "graph LR"));
    }

    #[test]
    fn test_insert_table_places_caret_in_first_cell() {
        let doc = Document::new(vec![Node::paragraph("intro")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 5), |tx| insert_table(tx, 2, 3).map(|_| ()));
        assert_eq!(doc.kind(&Path::new(vec![1])), Some(&ElementKind::Table));
        assert_eq!(doc.children[1].children().len(), 2);
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0, 0, 0], 0));
    }

    #[test]
    fn test_insert_table_row_and_column() {
        let doc = Document::new(vec![Node::table(2, 2)]);
        let (doc, _) = run(doc, caret(&[0, 0, 1, 0], 0), |tx| {
            insert_table_column(tx)?;
            insert_table_row(tx).map(|_| ())
        });
        let rows = doc.children[0].children();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.children().len() == 3));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links and Marks
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_link_collapsed_uses_url_as_text() {
        let doc = Document::new(vec![Node::paragraph("see ")]);
        let (doc, _) = run(doc, caret(&[0, 0], 4), |tx| {
            insert_link(tx, "https://example.com", None)
        });
        assert_eq!(
            doc.children[0].children()[1],
            Node::link("https://example.com", "https://example.com")
        );
    }

    #[test]
    fn test_insert_link_wraps_selection() {
        let doc = Document::new(vec![Node::paragraph("read the docs")]);
        let (doc, _) = run(doc, range((&[0, 0], 9), (&[0, 0], 13)), |tx| {
            insert_link(tx, "https://docs.rs", None)
        });
        let children = doc.children[0].children();
        assert_eq!(children[0], Node::text("read the "));
        assert_eq!(children[1], Node::link("https://docs.rs", "docs"));
    }

    #[test]
    fn test_toggle_mark_on_partial_range() {
        let doc = Document::new(vec![Node::paragraph("hello world")]);
        let (doc, sel) = run(doc, range((&[0, 0], 0), (&[0, 0], 5)), |tx| {
            toggle_mark_range(tx, Mark::Bold)
        });
        let children = doc.children[0].children();
        assert_eq!(children.len(), 2);
        assert!(children[0].as_text().unwrap().bold);
        assert!(!children[1].as_text().unwrap().bold);
        assert!(is_mark_active(&doc, &sel.unwrap(), Mark::Bold));
    }

    #[test]
    fn test_toggle_mark_twice_restores_single_run() {
        let doc = Document::new(vec![Node::paragraph("hello world")]);
        let (doc, sel) = run(doc, range((&[0, 0], 0), (&[0, 0], 5)), |tx| {
            toggle_mark_range(tx, Mark::Italic)
        });
        let (doc, _) = run(doc, sel, |tx| toggle_mark_range(tx, Mark::Italic));
        assert_eq!(doc.children[0], Node::paragraph("hello world"));
    }

    #[test]
    fn test_formatting_state_reports_block_and_marks() {
        let doc = Document::new(vec![Node::element(
            ElementKind::NumberedList,
            vec![Node::list_item("one")],
        )]);
        let sel = Selection::collapsed(Point::new(vec![0, 0, 0], 1));
        let state = formatting_state(&doc, Some(&sel));
        assert_eq!(state.block, Some(BlockType::NumberedList));
        assert!(!state.marks.bold);
        assert!(!state.in_link);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Block Toggling and Alignment
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_toggle_heading_and_back() {
        let doc = Document::new(vec![Node::paragraph("title")]);
        let h2 = BlockType::Heading(HeadingLevel::H2);
        let (doc, sel) = run(doc, caret(&[0, 0], 2), |tx| toggle_block(tx, h2));
        assert_eq!(doc.children[0], Node::heading(HeadingLevel::H2, "title"));
        let (doc, _) = run(doc, sel, |tx| toggle_block(tx, h2));
        assert_eq!(doc.children[0], Node::paragraph("title"));
    }

    #[test]
    fn test_toggle_list_wraps_adjacent_lines() {
        let doc = Document::new(vec![Node::paragraph("a"), Node::paragraph("b")]);
        let (doc, _) = run(doc, range((&[0, 0], 0), (&[1, 0], 1)), |tx| {
            toggle_block(tx, BlockType::BulletedList)
        });
        assert_eq!(
            doc.children,
            vec![Node::element(
                ElementKind::BulletedList,
                vec![Node::list_item("a"), Node::list_item("b")]
            )]
        );
    }

    #[test]
    fn test_toggle_list_off_lifts_items() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a"), Node::list_item("b")],
        )]);
        let (doc, _) = run(doc, caret(&[0, 1, 0], 0), |tx| {
            toggle_block(tx, BlockType::BulletedList)
        });
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[1], Node::paragraph("b"));
    }

    #[test]
    fn test_toggle_list_kind_switches_list() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a")],
        )]);
        let (doc, _) = run(doc, caret(&[0, 0, 0], 0), |tx| {
            toggle_block(tx, BlockType::NumberedList)
        });
        assert_eq!(doc.kind(&Path::new(vec![0])), Some(&ElementKind::NumberedList));
    }

    #[test]
    fn test_set_alignment_on_text_and_image() {
        let doc = Document::new(vec![
            Node::paragraph("a"),
            Node::image(ImageProps::new("a.png", "")),
        ]);
        let (doc, _) = run(doc, range((&[0, 0], 0), (&[1, 0], 0)), |tx| {
            set_alignment(tx, Some(Alignment::Right))
        });
        assert_eq!(doc.element(&Path::new(vec![0])).unwrap().align, Some(Alignment::Right));
        let Some(ElementKind::Image(props)) = doc.kind(&Path::new(vec![1])) else {
            panic!("image expected");
        };
        assert_eq!(props.alignment, Alignment::Right);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Enter
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_break_at_heading_end_continues_as_paragraph() {
        let doc = Document::new(vec![Node::heading(HeadingLevel::H1, "Title")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 5), insert_break);
        assert_eq!(doc.children[1], Node::paragraph(""));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));
    }

    #[test]
    fn test_break_mid_heading_moves_rest_to_paragraph() {
        let doc = Document::new(vec![Node::heading(HeadingLevel::H1, "Title rest")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 5), insert_break);
        assert_eq!(doc.children[0], Node::heading(HeadingLevel::H1, "Title"));
        assert_eq!(doc.children[1], Node::paragraph(" rest"));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));
        assert_eq!(crate::markdown::serialize(&doc), "# Title\n\n rest");
    }

    #[test]
    fn test_break_in_code_block_inserts_newline() {
        let doc = Document::new(vec![Node::element(
            ElementKind::code_block(),
            vec![Node::text("fn main()")],
        )]);
        let (doc, _) = run(doc, caret(&[0, 0], 9), insert_break);
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].text_content(), "fn main()\n");
    }

    #[test]
    fn test_break_in_empty_list_item_exits_list() {
        let doc = Document::new(vec![Node::element(
            ElementKind::BulletedList,
            vec![Node::list_item("a"), Node::list_item("")],
        )]);
        let (doc, sel) = run(doc, caret(&[0, 1, 0], 0), insert_break);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[1], Node::paragraph(""));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));
    }

    #[test]
    fn test_break_on_image_adds_paragraph_below() {
        let doc = Document::new(vec![Node::image(ImageProps::new("a.png", ""))]);
        let (doc, sel) = run(doc, caret(&[0, 0], 0), insert_break);
        assert_eq!(doc.children[1], Node::paragraph(""));
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 0));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paste
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_paste_multiline_text_splits_blocks() {
        let doc = Document::new(vec![Node::paragraph("")]);
        let (doc, sel) = run(doc, caret(&[0, 0], 0), |tx| {
            paste(tx, Payload::Text("one\r\ntwo".into()))
        });
        assert_eq!(doc.children, vec![Node::paragraph("one"), Node::paragraph("two")]);
        assert_eq!(sel.unwrap().focus, Point::new(vec![1, 0], 3));
    }

    #[test]
    fn test_paste_image_url_inserts_image() {
        let doc = Document::new(vec![Node::paragraph("x")]);
        let (doc, _) = run(doc, caret(&[0, 0], 1), |tx| {
            paste(tx, Payload::Text("https://example.com/cat.gif".into()))
        });
        assert!(doc.children[1].kind().is_some_and(ElementKind::is_void));
    }

    #[test]
    fn test_paste_plain_url_inserts_link() {
        let doc = Document::new(vec![Node::paragraph("")]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            paste(tx, Payload::Url("https://example.com".into()))
        });
        assert!(doc.children[0]
            .children()
            .iter()
            .any(|child| child.kind().is_some_and(ElementKind::is_inline)));
    }

    #[test]
    fn test_paste_image_data() {
        let doc = Document::new(vec![Node::paragraph("")]);
        let (doc, _) = run(doc, caret(&[0, 0], 0), |tx| {
            paste(tx, Payload::ImageData("data:image/png;base64,AAAA".into()))
        });
        assert!(doc
            .children
            .iter()
            .any(|node| matches!(node.kind(), Some(ElementKind::Image(props)) if props.alt.is_empty())));
    }
}
