//! MemoryDocument - Arena-backed in-memory document.
//!
//! Nodes live in a slot vector indexed by [`NodeId`]. Removed subtrees return
//! their slots to a free list for O(1) reuse.
//!
//! Besides the [`Document`] primitives it offers the read side tests need:
//! HTML serialization, attribute and text lookup, and bubbling event dispatch
//! to `on<event>` handler attributes.

use std::fmt::Write as _;

use super::Document;
use crate::error::DocumentError;
use crate::types::{Attributes, Event, Handler, NodeId, Value};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug)]
enum Content {
    Element { tag: String, attributes: Attributes },
    Text(String),
}

#[derive(Debug)]
struct Slot {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory [`Document`] implementation.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to render into.
    pub fn create_container(&mut self) -> Result<NodeId, DocumentError> {
        self.allocate(Content::Element {
            tag: "root".to_string(),
            attributes: Attributes::new(),
        })
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn allocate(&mut self, content: Content) -> Result<NodeId, DocumentError> {
        let slot = Slot {
            content,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(slot);
                Ok(NodeId::new(index))
            }
            None => {
                let index =
                    u32::try_from(self.slots.len()).map_err(|_| DocumentError::Exhausted)?;
                self.slots.push(Some(slot));
                Ok(NodeId::new(index))
            }
        }
    }

    fn slot(&self, node: NodeId) -> Result<&Slot, DocumentError> {
        self.slots
            .get(node.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(DocumentError::UnknownNode(node))
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut Slot, DocumentError> {
        self.slots
            .get_mut(node.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(DocumentError::UnknownNode(node))
    }

    fn attributes_mut(&mut self, node: NodeId) -> Result<&mut Attributes, DocumentError> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { attributes, .. } => Ok(attributes),
            Content::Text(_) => Err(DocumentError::NotAnElement(node)),
        }
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let Some(parent) = self.slot(node)?.parent else {
            return Ok(());
        };
        self.slot_mut(parent)?.children.retain(|&child| child != node);
        self.slot_mut(node)?.parent = None;
        Ok(())
    }

    fn free_subtree(&mut self, node: NodeId) {
        let Some(slot) = self.slots.get_mut(node.index() as usize).and_then(Option::take) else {
            return;
        };
        self.free.push(node.index());
        for child in slot.children {
            self.free_subtree(child);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.slot(node).ok().and_then(|slot| slot.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of allocated nodes, containers included.
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_ok()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).ok().and_then(|slot| slot.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node).map(|slot| slot.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node).ok()?.content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&Value> {
        match &self.slot(node).ok()?.content {
            Content::Element { attributes, .. } => attributes.get(name),
            Content::Text(_) => None,
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Ok(slot) = self.slot(node) else {
            return;
        };
        if let Content::Text(text) = &slot.content {
            out.push_str(text);
        }
        for &child in &slot.children {
            self.collect_text(child, out);
        }
    }

    /// Descendants of `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.tag(node) == Some(tag) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        found
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// HTML of the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// HTML of `node` itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Ok(slot) = self.slot(node) else {
            return;
        };
        match &slot.content {
            Content::Text(text) => escape_into(text, false, out),
            Content::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    write_attribute(name, value, out);
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &slot.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatch `event` at `target`, bubbling to ancestors.
    ///
    /// Every ancestor-or-self element carrying an `on<event>` handler
    /// attribute is invoked, innermost first. Returns the number of handlers
    /// called.
    pub fn dispatch(&self, target: NodeId, event: &str) -> Result<usize, DocumentError> {
        self.slot(target)?;
        let name = format!("on{event}");

        let mut handlers: Vec<(NodeId, Handler)> = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(handler) = self.attribute(node, &name).and_then(Value::as_handler) {
                handlers.push((node, handler.clone()));
            }
            current = self.parent(node);
        }

        for (node, handler) in &handlers {
            handler.call(&Event {
                name: event.to_string(),
                target,
                current_target: *node,
            });
        }
        Ok(handlers.len())
    }
}

fn write_attribute(name: &str, value: &Value, out: &mut String) {
    let rendered = match value {
        Value::Null | Value::Bool(false) | Value::Handler(_) | Value::Opaque(_) => return,
        Value::Bool(true) => {
            let _ = write!(out, " {name}");
            return;
        }
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Str(s) => s.to_string(),
    };
    let _ = write!(out, " {name}=\"");
    escape_into(&rendered, true, out);
    out.push('"');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// =============================================================================
// Document impl
// =============================================================================

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, DocumentError> {
        self.allocate(Content::Element {
            tag: tag.to_string(),
            attributes: Attributes::new(),
        })
    }

    fn create_text(&mut self, value: &str) -> Result<NodeId, DocumentError> {
        self.allocate(Content::Text(value.to_string()))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &Value) -> Result<(), DocumentError> {
        self.attributes_mut(node)?.insert(name, value.clone());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        self.attributes_mut(node)?.remove(name);
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DocumentError> {
        match &mut self.slot_mut(node)?.content {
            Content::Text(text) => {
                value.clone_into(text);
                Ok(())
            }
            Content::Element { .. } => Err(DocumentError::NotText(node)),
        }
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        if let Content::Text(_) = self.slot(parent)?.content {
            return Err(DocumentError::NotAnElement(parent));
        }
        self.slot(node)?;
        if self.is_ancestor(node, parent) {
            return Err(DocumentError::HierarchyRequest { parent, child: node });
        }
        if anchor == Some(node) {
            return Ok(());
        }
        if let Some(anchor) = anchor
            && self.slot(anchor)?.parent != Some(parent)
        {
            return Err(DocumentError::NotAChild { parent, child: anchor });
        }

        self.detach(node)?;
        let siblings = &mut self.slot_mut(parent)?.children;
        let position = anchor
            .and_then(|anchor| siblings.iter().position(|&child| child == anchor))
            .unwrap_or(siblings.len());
        siblings.insert(position, node);
        self.slot_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn remove_node(&mut self, parent: NodeId, node: NodeId) -> Result<(), DocumentError> {
        if self.slot(node)?.parent != Some(parent) {
            return Err(DocumentError::NotAChild { parent, child: node });
        }
        self.detach(node)?;
        self.free_subtree(node);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_insert_and_serialize() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_container().unwrap();
        let div = doc.create_element("div").unwrap();
        let text = doc.create_text("a < b").unwrap();
        let input = doc.create_element("input").unwrap();

        doc.insert_before(root, div, None).unwrap();
        doc.insert_before(div, input, None).unwrap();
        doc.insert_before(div, text, Some(input)).unwrap();
        doc.set_attribute(div, "class", &Value::from("x")).unwrap();
        doc.set_attribute(input, "disabled", &Value::Bool(true)).unwrap();
        doc.set_attribute(input, "hidden", &Value::Bool(false)).unwrap();

        assert_eq!(
            doc.inner_html(root),
            "<div class=\"x\">a &lt; b<input disabled></div>"
        );
        assert_eq!(doc.text_content(root), "a < b");
    }

    #[test]
    fn test_move_and_remove() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_container().unwrap();
        let a = doc.create_text("a").unwrap();
        let b = doc.create_text("b").unwrap();
        doc.insert_before(root, a, None).unwrap();
        doc.insert_before(root, b, None).unwrap();

        doc.insert_before(root, b, Some(a)).unwrap();
        assert_eq!(doc.inner_html(root), "ba");

        doc.remove_node(root, a).unwrap();
        assert_eq!(doc.inner_html(root), "b");
        assert!(!doc.contains(a));
        assert_eq!(doc.live_nodes(), 2);
    }

    #[test]
    fn test_errors() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_container().unwrap();
        let div = doc.create_element("div").unwrap();
        let text = doc.create_text("t").unwrap();
        doc.insert_before(root, div, None).unwrap();

        assert_eq!(
            doc.insert_before(text, div, None),
            Err(DocumentError::NotAnElement(text))
        );
        assert_eq!(
            doc.insert_before(div, root, None),
            Err(DocumentError::HierarchyRequest { parent: div, child: root })
        );
        assert_eq!(
            doc.remove_node(div, text),
            Err(DocumentError::NotAChild { parent: div, child: text })
        );
        assert_eq!(doc.set_text(div, "x"), Err(DocumentError::NotText(div)));
        assert_eq!(
            doc.set_text(NodeId::new(99), "x"),
            Err(DocumentError::UnknownNode(NodeId::new(99)))
        );
    }

    #[test]
    fn test_dispatch_bubbles() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_container().unwrap();
        let outer = doc.create_element("div").unwrap();
        let button = doc.create_element("button").unwrap();
        doc.insert_before(root, outer, None).unwrap();
        doc.insert_before(outer, button, None).unwrap();

        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        let handler = Handler::new(move |event| {
            assert_eq!(event.name, "click");
            counter.set(counter.get() + 1);
        });
        doc.set_attribute(outer, "onclick", &Value::from(handler)).unwrap();

        assert_eq!(doc.dispatch(button, "click"), Ok(1));
        assert_eq!(seen.get(), 1);
        assert_eq!(doc.dispatch(button, "keydown"), Ok(0));
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_container().unwrap();
        let a = doc.create_element("p").unwrap();
        doc.insert_before(root, a, None).unwrap();
        doc.remove_node(root, a).unwrap();

        let b = doc.create_element("p").unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.find_by_tag(root, "p"), Vec::<NodeId>::new());
    }
}
