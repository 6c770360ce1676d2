//! Reconciler - Diffs a new tree against the mounted snapshot.
//!
//! # Algorithm
//!
//! `reconcile(old, new)` picks one of three paths:
//!
//! 1. No old node: mount `new` before the anchor
//! 2. Same logical node (kind, tag or component type, key): patch in place
//! 3. Anything else: replace
//!
//! Replacing tears the old subtree down (`will_unmount` top-down, refs
//! nulled), removes its top-level nodes, then mounts the new subtree in front
//! of the anchor the old one ended before.
//!
//! # Child lists
//!
//! ```text
//! old:  a b c d          new: c a b e
//! match:                      c→2 a→0 b→1 e→∅
//! stays (old index ≥ last placed): c        → a, b move; e mounts
//! walk: each non-stay moves before the next stay's first handle (or the
//!       end), then is patched in place
//! after: unclaimed old children (d) are unmounted
//! ```
//!
//! Only non-stays move, so a reorder costs one `MoveNode` per displaced
//! subtree.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::mounted::Mounted;
use super::mutation::{LifecycleHook, MutationLog};
use super::patcher::Patcher;
use super::refs::{Effect, Watch};
use crate::component::{InstanceRegistry, Phase};
use crate::document::Document;
use crate::error::RenderError;
use crate::node::{Element, Node};
use crate::pipeline::RendererConfig;
use crate::scheduler::Scheduler;
use crate::types::{Attributes, Key, NodeId, Value};

/// One pass over the document.
///
/// Holds the pass log and the effect queue. Dropped (or [`commit`](Self::commit)ted)
/// at the end of a render, or after each instance in a flush.
pub(crate) struct Reconciler<'a, D: Document> {
    pub(crate) patcher: Patcher<'a, D>,
    pub(crate) instances: &'a mut InstanceRegistry,
    pub(crate) scheduler: &'a Scheduler,
    pub(crate) config: &'a RendererConfig,
    pub(crate) effects: Vec<Effect>,
    pub(crate) watched: Vec<Watch>,
}

impl<'a, D: Document> Reconciler<'a, D> {
    pub fn new(
        document: &'a mut D,
        instances: &'a mut InstanceRegistry,
        scheduler: &'a Scheduler,
        config: &'a RendererConfig,
    ) -> Self {
        Self {
            patcher: Patcher::new(document, config.trace_mutations),
            instances,
            scheduler,
            config,
            effects: Vec::new(),
            watched: Vec::new(),
        }
    }

    /// Run queued effects and hand back the pass log.
    pub fn commit(mut self) -> MutationLog {
        self.commit_effects();
        self.patcher.finish()
    }

    // =========================================================================
    // Entry
    // =========================================================================

    /// Bring `old` in line with `node` under `parent`.
    ///
    /// `before` is the document node the subtree ends before (`None`: the end
    /// of `parent`). Mounts and replacements insert in front of it; patches
    /// leave nodes where they are.
    pub fn reconcile(
        &mut self,
        old: Option<Mounted>,
        node: Node,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        match old {
            None => self.mount(node, parent, before),
            Some(old) if old.matches(&node) => self.patch(old, node, parent, before),
            Some(old) => self.replace(old, node, parent, before),
        }
    }

    // =========================================================================
    // Mount
    // =========================================================================

    pub fn mount(
        &mut self,
        node: Node,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        match node {
            Node::Element(el) => self.mount_element(el, parent, before),
            Node::Text(value) => {
                let handle = self.patcher.create_text(&value, parent, before)?;
                Ok(Mounted::Text { handle, value })
            }
            Node::Component(c) => self.mount_component(c, parent, before),
            Node::Fragment(nodes) => {
                let mut children = Vec::with_capacity(nodes.len());
                for child in nodes {
                    children.push(self.mount(child, parent, before)?);
                }
                let end = self.patcher.create_text("", parent, before)?;
                Ok(Mounted::Fragment { children, end })
            }
            Node::Empty => {
                let handle = self.patcher.create_text("", parent, before)?;
                Ok(Mounted::Empty { handle })
            }
        }
    }

    fn mount_element(
        &mut self,
        el: Element,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        let Element {
            tag,
            attributes,
            children,
            key,
            node_ref,
        } = el;

        let handle = self.patcher.create_element(&tag, parent, before)?;
        for (name, value) in &attributes {
            if !value.is_null() {
                self.patcher.set_attribute(handle, name, value)?;
            }
        }

        self.check_keys(&children);
        let mut mounted = Vec::with_capacity(children.len());
        for child in children {
            mounted.push(self.mount(child, handle, None)?);
        }

        self.queue_attach(&node_ref, Some(handle));
        Ok(Mounted::Element {
            tag,
            key,
            handle,
            attributes,
            children: mounted,
            node_ref,
        })
    }

    // =========================================================================
    // Patch
    // =========================================================================

    fn patch(
        &mut self,
        old: Mounted,
        node: Node,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        match (old, node) {
            (Mounted::Text { handle, value }, Node::Text(next)) => {
                if value != next {
                    self.patcher.set_text(handle, &next)?;
                }
                Ok(Mounted::Text {
                    handle,
                    value: next,
                })
            }
            (
                Mounted::Element {
                    tag,
                    key,
                    handle,
                    attributes,
                    children,
                    node_ref,
                },
                Node::Element(el),
            ) => {
                self.diff_attributes(handle, &attributes, &el.attributes)?;
                let children = self.reconcile_children(children, el.children, handle, None)?;
                self.rebind(node_ref, &el.node_ref, Some(handle));
                Ok(Mounted::Element {
                    tag,
                    key,
                    handle,
                    attributes: el.attributes,
                    children,
                    node_ref: el.node_ref,
                })
            }
            (Mounted::Fragment { children, end }, Node::Fragment(nodes)) => {
                let children = self.reconcile_children(children, nodes, parent, Some(end))?;
                Ok(Mounted::Fragment { children, end })
            }
            (old @ Mounted::Component { .. }, Node::Component(next)) => {
                self.update_component(old, next, parent, before)
            }
            (old @ Mounted::Empty { .. }, Node::Empty) => Ok(old),
            (old, node) => self.replace(old, node, parent, before),
        }
    }

    fn diff_attributes(
        &mut self,
        handle: NodeId,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), RenderError> {
        for (name, value) in new {
            if value.is_null() {
                continue;
            }
            if old.get(name) != Some(value) {
                self.patcher.set_attribute(handle, name, value)?;
            }
        }
        for (name, value) in old {
            if value.is_null() {
                continue;
            }
            if new.get(name).is_none_or(Value::is_null) {
                self.patcher.remove_attribute(handle, name)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Replace / Unmount
    // =========================================================================

    fn replace(
        &mut self,
        old: Mounted,
        node: Node,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        self.unmount(old, parent)?;
        self.mount(node, parent, before)
    }

    /// Tear down `old` and remove its top-level nodes from `parent`.
    pub fn unmount(&mut self, old: Mounted, parent: NodeId) -> Result<(), RenderError> {
        let handles = old.handles();
        self.teardown(old);
        for handle in handles {
            self.remove_top(parent, handle)?;
        }
        Ok(())
    }

    /// Fire `will_unmount` and null refs for a subtree, parents first.
    ///
    /// Document nodes are left in place; the caller removes the top level.
    pub(crate) fn teardown(&mut self, old: Mounted) {
        match old {
            Mounted::Element {
                children, node_ref, ..
            } => {
                self.detach_now(&node_ref);
                for child in children {
                    self.teardown(child);
                }
            }
            Mounted::Fragment { children, .. } => {
                for child in children {
                    self.teardown(child);
                }
            }
            Mounted::Component { instance, .. } => {
                let (rendered, node_ref) = {
                    let mut inst = instance.borrow_mut();
                    inst.transition(Phase::Unmounting);
                    self.patcher
                        .lifecycle(LifecycleHook::WillUnmount, inst.id, inst.ty.short_name());
                    inst.with_hook(|component, cx| component.will_unmount(cx));
                    (inst.rendered.take(), inst.node_ref.take())
                };
                self.detach_now(&node_ref);
                if let Some(rendered) = rendered {
                    self.teardown(rendered);
                }
                let mut inst = instance.borrow_mut();
                inst.transition(Phase::Unmounted);
                inst.pending_state = None;
                self.instances.remove(inst.id);
            }
            Mounted::Text { .. } | Mounted::Empty { .. } => {}
        }
    }

    // =========================================================================
    // Child lists
    // =========================================================================

    /// Reconcile a child list living in `parent`.
    ///
    /// `end` is the node the list ends before: `None` for an element's own
    /// children, the end marker for a fragment.
    pub(crate) fn reconcile_children(
        &mut self,
        old: Vec<Mounted>,
        new: Vec<Node>,
        parent: NodeId,
        end: Option<NodeId>,
    ) -> Result<Vec<Mounted>, RenderError> {
        self.check_keys(&new);

        let mut old: Vec<Option<Mounted>> = old.into_iter().map(Some).collect();

        let mut keyed: HashMap<Key, usize> = HashMap::new();
        for (index, child) in old.iter().enumerate() {
            if let Some(key) = child.as_ref().and_then(Mounted::key) {
                keyed.entry(key.clone()).or_insert(index);
            }
        }

        // Match new children to old ones
        let mut claimed = vec![false; old.len()];
        let matches: Vec<Option<usize>> = new
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let candidate = match node.key() {
                    Some(key) => keyed.get(key).copied(),
                    None => old
                        .get(index)
                        .and_then(Option::as_ref)
                        .filter(|child| child.key().is_none())
                        .map(|_| index),
                };
                let found = candidate.filter(|&slot| !claimed[slot])?;
                claimed[found] = true;
                Some(found)
            })
            .collect();

        // Stays keep their place; everything else moves in front of the next stay
        let mut stays = vec![false; new.len()];
        let mut last_placed = 0;
        for (index, matched) in matches.iter().enumerate() {
            if let Some(slot) = *matched
                && slot >= last_placed
            {
                stays[index] = true;
                last_placed = slot;
            }
        }

        let mut next_stay: Vec<Option<usize>> = vec![None; new.len()];
        let mut upcoming = None;
        for index in (0..new.len()).rev() {
            next_stay[index] = upcoming;
            if stays[index] {
                upcoming = matches[index];
            }
        }

        let mut result = Vec::with_capacity(new.len());
        for (index, node) in new.into_iter().enumerate() {
            let anchor = next_stay[index]
                .and_then(|slot| old[slot].as_ref())
                .and_then(Mounted::first_handle)
                .or(end);

            let mounted = match matches[index] {
                Some(slot) => {
                    let previous = old[slot].take();
                    // A replacement mounts at the anchor itself; only reused nodes move
                    if !stays[index]
                        && let Some(previous) = previous.as_ref().filter(|p| p.matches(&node))
                    {
                        for handle in previous.handles() {
                            self.patcher.move_node(parent, handle, anchor)?;
                        }
                    }
                    self.reconcile(previous, node, parent, anchor)?
                }
                None => self.mount(node, parent, anchor)?,
            };
            result.push(mounted);
        }

        for leftover in old.into_iter().flatten() {
            self.unmount(leftover, parent)?;
        }
        Ok(result)
    }

    fn check_keys(&self, children: &[Node]) {
        if !self.config.dev_checks {
            return;
        }
        let mut seen = HashSet::new();
        for key in children.iter().filter_map(Node::key) {
            if !seen.insert(key) {
                warn!(%key, "duplicate sibling key; later occurrences mount fresh");
            }
        }
    }
}
