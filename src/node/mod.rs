//! Node Model - Declarative description of a renderable tree.
//!
//! A [`Node`] is a plain value. Render logic produces a fresh tree every pass,
//! the engine moves it in and compares it against the previous snapshot, and
//! nothing ever mutates a node after construction.
//!
//! ```text
//! Node::Element   <div class="row"> ... </div>
//! Node::Text      "hello"
//! Node::Component <Counter car="Saab"/>
//! Node::Fragment  [a, b, c]           (no wrapper in the document)
//! Node::Empty     null                (renders nothing visible)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let tree: Node = Node::element("ul")
//!     .children(items.iter().map(|item| {
//!         Node::element("li").key(item.id).text(&item.label)
//!     }))
//!     .into();
//! ```

use std::rc::Rc;

use crate::component::{ComponentDef, ComponentType};
use crate::types::{Attributes, Key, Props, RefCallback, Value};

// =============================================================================
// Node
// =============================================================================

/// One renderable unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    Element(Element),
    Text(String),
    Component(ComponentNode),
    Fragment(Vec<Node>),
    #[default]
    Empty,
}

impl Node {
    /// Start building an element.
    pub fn element(tag: &str) -> Element {
        Element::new(tag)
    }

    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(value.into())
    }

    /// Start building a component node for `C`.
    pub fn component<C: ComponentDef>(props: Props) -> ComponentNode {
        ComponentNode::new(ComponentType::of::<C>(), props)
    }

    pub fn fragment<I>(children: I) -> Node
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        Node::Fragment(children.into_iter().map(Into::into).collect())
    }

    pub fn empty() -> Node {
        Node::Empty
    }

    /// Sibling key, if this kind of node carries one.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Node::Element(el) => el.key.as_ref(),
            Node::Component(c) => c.key.as_ref(),
            Node::Text(_) | Node::Fragment(_) | Node::Empty => None,
        }
    }

    /// Identity check used by reconciliation.
    ///
    /// Two nodes are the same logical node when they share kind, tag or
    /// component type, and key. Attributes, props and children are ignored.
    pub fn same_identity(&self, other: &Node) -> bool {
        self.identity() == other.identity()
    }

    pub fn identity(&self) -> Identity<'_> {
        match self {
            Node::Element(el) => Identity::Element {
                tag: &el.tag,
                key: el.key.as_ref(),
            },
            Node::Component(c) => Identity::Component {
                ty: c.component,
                key: c.key.as_ref(),
            },
            Node::Text(_) => Identity::Text,
            Node::Fragment(_) => Identity::Fragment,
            Node::Empty => Identity::Empty,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::Component(_) => NodeKind::Component,
            Node::Fragment(_) => NodeKind::Fragment,
            Node::Empty => NodeKind::Empty,
        }
    }
}

/// Discriminant of [`Node`], used in logs and diagnostics.
/// The part of a node that decides reuse: kind, tag or component type, key.
///
/// Mounted snapshots report the same shape, so a new node matches its
/// predecessor exactly when both identities are equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Identity<'a> {
    Element { tag: &'a str, key: Option<&'a Key> },
    Component { ty: ComponentType, key: Option<&'a Key> },
    Text,
    Fragment,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Component,
    Fragment,
    Empty,
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<ComponentNode> for Node {
    fn from(value: ComponentNode) -> Self {
        Node::Component(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Empty, Into::into)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Fragment(value)
    }
}

// =============================================================================
// Element
// =============================================================================

/// Element description: tag, attributes, children, optional key and ref.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Rc<str>,
    pub attributes: Attributes,
    pub children: Vec<Node>,
    pub key: Option<Key>,
    pub node_ref: Option<RefCallback>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            key: None,
            node_ref: None,
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn attrs(mut self, attributes: Attributes) -> Self {
        self.attributes.merge(attributes);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text child.
    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::Text(value.into()))
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach a ref callback receiving this element's handle.
    pub fn node_ref(mut self, callback: RefCallback) -> Self {
        self.node_ref = Some(callback);
        self
    }
}

// =============================================================================
// ComponentNode
// =============================================================================

/// Placement of a component in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub component: ComponentType,
    pub props: Props,
    pub key: Option<Key>,
    /// Receives the first handle of the component's rendered subtree.
    pub node_ref: Option<RefCallback>,
}

impl ComponentNode {
    pub fn new(component: ComponentType, props: Props) -> Self {
        Self {
            component,
            props,
            key: None,
            node_ref: None,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn node_ref(mut self, callback: RefCallback) -> Self {
        self.node_ref = Some(callback);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
