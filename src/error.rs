//! Error types.
//!
//! Two layers fail independently:
//! - [`DocumentError`] - a document primitive rejected an operation
//! - [`RenderError`] - a render or flush pass could not complete
//!
//! Neither layer rolls back. A failed pass leaves the snapshot of the affected
//! container (or component subtree) undefined; callers should treat it as fatal
//! for that container and render it again from scratch.

use thiserror::Error;

use crate::types::NodeId;

/// Failure reported by a [`Document`](crate::document::Document) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("unknown document node {0}")]
    UnknownNode(NodeId),

    #[error("document node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("document node {0} is not a text node")]
    NotText(NodeId),

    #[error("document node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("cannot insert {child} into {parent}: {parent} is inside {child}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("document is out of node handles")]
    Exhausted,
}

/// Failure of a render or flush pass.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A component lost its rendered subtree, which only happens after an
    /// earlier pass failed halfway through that component.
    #[error("component `{component}` has no rendered subtree")]
    MissingSubtree { component: &'static str },

    /// Updates kept scheduling further updates past the configured tick limit.
    #[error("updates did not settle after {ticks} ticks")]
    Unsettled { ticks: usize },
}
