//! Mounted snapshot - The previous tree, paired with live handles.
//!
//! Every mounted node owns at least one document node. `Empty` holds an
//! empty text placeholder and `Fragment` holds an empty text end marker
//! after its children, so any subtree can name its first handle and any
//! child list has an anchor to insert before.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{ComponentType, Instance, InstanceId};
use crate::node::{Identity, Node};
use crate::types::{Attributes, Key, NodeId, RefCallback};

pub(crate) enum Mounted {
    Element {
        tag: Rc<str>,
        key: Option<Key>,
        handle: NodeId,
        attributes: Attributes,
        children: Vec<Mounted>,
        node_ref: Option<RefCallback>,
    },
    Text {
        handle: NodeId,
        value: String,
    },
    Component {
        ty: ComponentType,
        key: Option<Key>,
        instance: Rc<RefCell<Instance>>,
    },
    Fragment {
        children: Vec<Mounted>,
        end: NodeId,
    },
    Empty {
        handle: NodeId,
    },
}

impl Mounted {
    pub fn key(&self) -> Option<&Key> {
        match self {
            Mounted::Element { key, .. } | Mounted::Component { key, .. } => key.as_ref(),
            Mounted::Text { .. } | Mounted::Fragment { .. } | Mounted::Empty { .. } => None,
        }
    }

    pub fn identity(&self) -> Identity<'_> {
        match self {
            Mounted::Element { tag, key, .. } => Identity::Element {
                tag,
                key: key.as_ref(),
            },
            Mounted::Component { ty, key, .. } => Identity::Component {
                ty: *ty,
                key: key.as_ref(),
            },
            Mounted::Text { .. } => Identity::Text,
            Mounted::Fragment { .. } => Identity::Fragment,
            Mounted::Empty { .. } => Identity::Empty,
        }
    }

    /// Whether `node` is the same logical node as this snapshot.
    pub fn matches(&self, node: &Node) -> bool {
        self.identity() == node.identity()
    }

    /// First document node of this subtree.
    ///
    /// `None` only for a component whose subtree is detached mid-update.
    pub fn first_handle(&self) -> Option<NodeId> {
        match self {
            Mounted::Element { handle, .. }
            | Mounted::Text { handle, .. }
            | Mounted::Empty { handle } => Some(*handle),
            Mounted::Fragment { children, end } => {
                children.first().and_then(Mounted::first_handle).or(Some(*end))
            }
            Mounted::Component { instance, .. } => {
                instance.borrow().rendered.as_ref().and_then(Mounted::first_handle)
            }
        }
    }

    /// Top-level document nodes of this subtree, in document order.
    pub fn collect_handles(&self, out: &mut Vec<NodeId>) {
        match self {
            Mounted::Element { handle, .. }
            | Mounted::Text { handle, .. }
            | Mounted::Empty { handle } => out.push(*handle),
            Mounted::Fragment { children, end } => {
                for child in children {
                    child.collect_handles(out);
                }
                out.push(*end);
            }
            Mounted::Component { instance, .. } => {
                if let Some(rendered) = &instance.borrow().rendered {
                    rendered.collect_handles(out);
                }
            }
        }
    }

    pub fn handles(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_handles(&mut out);
        out
    }

    /// Find a component instance in this tree.
    ///
    /// Returns the enclosing component instances (outermost first) and the
    /// document node its subtree ends before, `None` meaning the end of its
    /// parent element.
    pub fn locate(&self, target: InstanceId) -> Option<Placement> {
        match self.search(target) {
            Search::Missing => None,
            Search::Trailing(ancestors) => Some(Placement {
                ancestors,
                before: None,
            }),
            Search::Found(placement) => Some(placement),
        }
    }

    fn search(&self, target: InstanceId) -> Search {
        match self {
            Mounted::Element { children, .. } => match search_list(children, target) {
                Search::Trailing(ancestors) => Search::Found(Placement {
                    ancestors,
                    before: None,
                }),
                other => other,
            },
            Mounted::Fragment { children, end } => match search_list(children, target) {
                Search::Trailing(ancestors) => Search::Found(Placement {
                    ancestors,
                    before: Some(*end),
                }),
                other => other,
            },
            Mounted::Component { instance, .. } => {
                let inst = instance.borrow();
                if inst.id == target {
                    return Search::Trailing(Vec::new());
                }
                let Some(rendered) = &inst.rendered else {
                    return Search::Missing;
                };
                let mut found = rendered.search(target);
                if let Search::Trailing(ancestors)
                | Search::Found(Placement { ancestors, .. }) = &mut found
                {
                    ancestors.insert(0, instance.clone());
                }
                found
            }
            Mounted::Text { .. } | Mounted::Empty { .. } => Search::Missing,
        }
    }
}

/// Where a component instance sits in a mounted tree.
pub(crate) struct Placement {
    pub ancestors: Vec<Rc<RefCell<Instance>>>,
    pub before: Option<NodeId>,
}

enum Search {
    Missing,
    /// Found as the last node of its level; the successor lies further out.
    Trailing(Vec<Rc<RefCell<Instance>>>),
    Found(Placement),
}

fn search_list(children: &[Mounted], target: InstanceId) -> Search {
    for (index, child) in children.iter().enumerate() {
        match child.search(target) {
            Search::Missing => continue,
            Search::Trailing(ancestors) => {
                return match children[index + 1..].iter().find_map(Mounted::first_handle) {
                    Some(next) => Search::Found(Placement {
                        ancestors,
                        before: Some(next),
                    }),
                    None => Search::Trailing(ancestors),
                };
            }
            found => return found,
        }
    }
    Search::Missing
}
