//! Document - The primitives the engine renders through.
//!
//! The engine never inspects the document. It creates nodes, sets
//! attributes and text, inserts before an anchor, and removes. Anything
//! that can do those seven things can host a rendered tree.
//!
//! [`MemoryDocument`] is the in-crate backend used by tests and demos.

mod memory;

pub use memory::MemoryDocument;

use crate::error::DocumentError;
use crate::types::{NodeId, Value};

/// Document node primitives.
///
/// `insert_before` with an anchor of `None` appends. Inserting a node that
/// already has a parent moves it.
pub trait Document {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, DocumentError>;

    fn create_text(&mut self, value: &str) -> Result<NodeId, DocumentError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &Value) -> Result<(), DocumentError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError>;

    fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DocumentError>;

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), DocumentError>;

    /// Detach `node` from `parent`. The handle is invalid afterwards.
    fn remove_node(&mut self, parent: NodeId, node: NodeId) -> Result<(), DocumentError>;
}
