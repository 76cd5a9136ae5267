//! Document model
//!
//! The closed node vocabulary, index paths, caret addressing and the document
//! root. Nothing here mutates; edits are applied by the `editor` module on a
//! staged copy and published as a new snapshot.

mod document;
mod metadata;
mod node;
mod path;
mod selection;

pub use document::Document;
pub use metadata::Metadata;
pub use node::{
    is_block, is_inline, is_void, Alignment, ContentModel, DiagramProps, Element, ElementKind,
    HeadingLevel, ImageFilters, ImagePatch, ImageProps, Mark, Marks, Node, NodePatch, Text,
};
pub use path::Path;
pub use selection::{Edge, Point, Selection};
