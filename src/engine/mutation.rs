//! Mutation log - What a pass did, in order.
//!
//! Every document primitive the engine applies, every ref invocation and
//! every lifecycle hook is recorded here. Tests assert on the log; hosts can
//! use it to mirror changes elsewhere.

use std::rc::Rc;

use crate::component::InstanceId;
use crate::types::{NodeId, Value};

/// Lifecycle hook recorded in an [`Mutation::InvokeLifecycle`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    WillMount,
    DidMount,
    WillReceiveProps,
    WillUpdate,
    DidUpdate,
    WillUnmount,
}

/// What a [`Mutation::CreateNode`] created.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatedNode {
    Element(Rc<str>),
    Text(String),
}

/// One step of a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateNode {
        handle: NodeId,
        node: CreatedNode,
        parent: NodeId,
        before: Option<NodeId>,
    },
    RemoveNode {
        handle: NodeId,
        parent: NodeId,
    },
    MoveNode {
        handle: NodeId,
        parent: NodeId,
        before: Option<NodeId>,
    },
    SetAttribute {
        handle: NodeId,
        name: Rc<str>,
        value: Value,
    },
    RemoveAttribute {
        handle: NodeId,
        name: Rc<str>,
    },
    SetText {
        handle: NodeId,
        value: String,
    },
    /// A ref callback was called with `handle` (`None` on detach).
    InvokeRef {
        handle: Option<NodeId>,
    },
    InvokeLifecycle {
        hook: LifecycleHook,
        instance: InstanceId,
        component: &'static str,
    },
}

bitflags::bitflags! {
    /// Mask over [`Mutation`] variants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MutationKinds: u8 {
        const CREATE = 1 << 0;
        const REMOVE = 1 << 1;
        const MOVE = 1 << 2;
        const SET_ATTRIBUTE = 1 << 3;
        const REMOVE_ATTRIBUTE = 1 << 4;
        const SET_TEXT = 1 << 5;
        const REF = 1 << 6;
        const LIFECYCLE = 1 << 7;

        /// Kinds that change the document or hand out handles.
        const DOCUMENT = Self::CREATE.bits()
            | Self::REMOVE.bits()
            | Self::MOVE.bits()
            | Self::SET_ATTRIBUTE.bits()
            | Self::REMOVE_ATTRIBUTE.bits()
            | Self::SET_TEXT.bits()
            | Self::REF.bits();
    }
}

impl Mutation {
    pub fn kind(&self) -> MutationKinds {
        match self {
            Mutation::CreateNode { .. } => MutationKinds::CREATE,
            Mutation::RemoveNode { .. } => MutationKinds::REMOVE,
            Mutation::MoveNode { .. } => MutationKinds::MOVE,
            Mutation::SetAttribute { .. } => MutationKinds::SET_ATTRIBUTE,
            Mutation::RemoveAttribute { .. } => MutationKinds::REMOVE_ATTRIBUTE,
            Mutation::SetText { .. } => MutationKinds::SET_TEXT,
            Mutation::InvokeRef { .. } => MutationKinds::REF,
            Mutation::InvokeLifecycle { .. } => MutationKinds::LIFECYCLE,
        }
    }
}

/// Ordered record of one render or flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationLog {
    entries: Vec<Mutation>,
}

impl MutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, mutation: Mutation) {
        self.entries.push(mutation);
    }

    pub(crate) fn append(&mut self, other: MutationLog) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Mutation] {
        &self.entries
    }

    /// Number of entries whose kind intersects `mask`.
    pub fn count(&self, mask: MutationKinds) -> usize {
        self.filter(mask).count()
    }

    pub fn filter(&self, mask: MutationKinds) -> impl Iterator<Item = &Mutation> {
        self.entries.iter().filter(move |m| mask.intersects(m.kind()))
    }

    /// Lifecycle hooks in invocation order.
    pub fn hooks(&self) -> impl Iterator<Item = (LifecycleHook, &'static str)> + '_ {
        self.entries.iter().filter_map(|m| match m {
            Mutation::InvokeLifecycle { hook, component, .. } => Some((*hook, *component)),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a MutationLog {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for MutationLog {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
