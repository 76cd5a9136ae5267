//! Diagram rendering boundary
//!
//! Diagram nodes only store their type and source. Turning that into a picture
//! is the job of an external renderer, which may fail or even panic. Whatever
//! happens, the node is left as it was and the host gets something to show:
//! either the rendered SVG or the raw code with the reason it failed.

use log::warn;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::model::{DiagramProps, ElementKind, Node};

// ─────────────────────────────────────────────────────────────────────────────
// Renderer Boundary
// ─────────────────────────────────────────────────────────────────────────────

/// Error reported by a diagram renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diagram rendering failed: {}", self.0)
    }
}

impl std::error::Error for RenderError {}

/// Converts diagram source into SVG markup.
pub trait DiagramRenderer {
    fn render(&self, diagram: &DiagramProps) -> Result<String, RenderError>;
}

/// What the host should display for a diagram node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramView {
    Rendered { svg: String },
    /// Show the source instead of a blank area
    Fallback { code: String, reason: String },
}

impl DiagramView {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DiagramView::Fallback { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Render `node` if it is a diagram. Returns `None` for any other node.
///
/// Renderer errors and panics are both turned into [`DiagramView::Fallback`].
pub fn render_diagram(renderer: &dyn DiagramRenderer, node: &Node) -> Option<DiagramView> {
    match node.kind()? {
        ElementKind::Diagram(props) => Some(render_props(renderer, props)),
        _ => None,
    }
}

fn render_props(renderer: &dyn DiagramRenderer, props: &DiagramProps) -> DiagramView {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(props)));
    let reason = match outcome {
        Ok(Ok(svg)) => return DiagramView::Rendered { svg },
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    warn!(
        "Showing source for {} diagram: {}",
        props.diagram_type, reason
    );
    DiagramView::Fallback {
        code: props.code.clone(),
        reason,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("renderer panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("renderer panicked: {}", message)
    } else {
        "renderer panicked".to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl DiagramRenderer for Echo {
        fn render(&self, diagram: &DiagramProps) -> Result<String, RenderError> {
            Ok(format!("<svg>{}</svg>", diagram.code))
        }
    }

    struct Broken;

    impl DiagramRenderer for Broken {
        fn render(&self, _diagram: &DiagramProps) -> Result<String, RenderError> {
            Err(RenderError("syntax error on line 1".to_string()))
        }
    }

    struct Panicking;

    impl DiagramRenderer for Panicking {
        fn render(&self, _diagram: &DiagramProps) -> Result<String, RenderError> {
            panic!("boom")
        }
    }

    #[test]
    fn test_rendered_svg() {
        let node = Node::diagram("mermaid", "graph TD; A-->B");
        assert_eq!(
            render_diagram(&Echo, &node),
            Some(DiagramView::Rendered {
                svg: "<svg>graph TD; A-->B</svg>".to_string()
            })
        );
    }

    #[test]
    fn test_renderer_error_falls_back_to_code() {
        let node = Node::diagram("mermaid", "graph ??");
        let before = node.clone();
        let view = render_diagram(&Broken, &node).unwrap();
        assert!(view.is_fallback());
        match view {
            DiagramView::Fallback { code, reason } => {
                assert_eq!(code, "graph ??");
                assert!(reason.contains("syntax error"));
            }
            DiagramView::Rendered { .. } => unreachable!(),
        }
        assert_eq!(node, before);
    }

    #[test]
    fn test_renderer_panic_is_contained() {
        let node = Node::diagram("mermaid", "graph TD");
        let view = render_diagram(&Panicking, &node).unwrap();
        assert_eq!(
            view,
            DiagramView::Fallback {
                code: "graph TD".to_string(),
                reason: "renderer panicked: boom".to_string(),
            }
        );
    }

    #[test]
    fn test_non_diagram_node() {
        assert_eq!(render_diagram(&Echo, &Node::paragraph("x")), None);
    }
}
