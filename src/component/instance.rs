//! Component instances and their registry.
//!
//! The registry maps [`InstanceId`] to the live instance so the scheduler,
//! which only knows ids, can find the instance at flush time. Ids are never
//! reused: a stale update for an unmounted instance can't land on a newer one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Component, ComponentType, HookCx, RenderCx};
use crate::engine::Mounted;
use crate::node::Node;
use crate::scheduler::Updater;
use crate::types::{NodeId, Props, RefCallback, State};

// =============================================================================
// InstanceId / Phase
// =============================================================================

/// Identity of a mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Lifecycle phase of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unmounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
}

impl Phase {
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Unmounted, Phase::Mounting)
                | (Phase::Mounting, Phase::Mounted)
                | (Phase::Mounted, Phase::Updating)
                | (Phase::Updating, Phase::Mounted)
                | (Phase::Mounted, Phase::Unmounting)
                | (Phase::Unmounting, Phase::Unmounted)
        )
    }
}

// =============================================================================
// Instance
// =============================================================================

pub(crate) struct Instance {
    pub id: InstanceId,
    pub ty: ComponentType,
    pub component: Box<dyn Component>,
    pub props: Props,
    pub state: State,
    /// State staged by a flush, consumed by the next re-render.
    pub pending_state: Option<State>,
    pub force: bool,
    pub phase: Phase,
    /// Document node the rendered subtree lives in.
    pub parent: NodeId,
    pub rendered: Option<Mounted>,
    /// Ref bound to the first handle of `rendered`.
    pub node_ref: Option<RefCallback>,
    pub updater: Updater,
}

impl Instance {
    pub fn new(
        ty: ComponentType,
        component: Box<dyn Component>,
        props: Props,
        state: State,
        parent: NodeId,
        updater: Updater,
    ) -> Self {
        Self {
            id: updater.instance(),
            ty,
            component,
            props,
            state,
            pending_state: None,
            force: false,
            phase: Phase::Unmounted,
            parent,
            rendered: None,
            node_ref: None,
            updater,
        }
    }

    pub fn transition(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "{} ({}): invalid phase transition {:?} -> {:?}",
            self.ty.short_name(),
            self.id,
            self.phase,
            next
        );
        self.phase = next;
    }

    pub fn is_mounted(&self) -> bool {
        self.phase == Phase::Mounted
    }

    pub fn render(&self) -> Node {
        let cx = RenderCx {
            props: &self.props,
            state: &self.state,
            updater: &self.updater,
        };
        self.component.render(&cx)
    }

    /// Run a hook against the component with a context over current fields.
    pub fn with_hook<R>(&mut self, f: impl FnOnce(&mut dyn Component, &HookCx<'_>) -> R) -> R {
        let cx = HookCx {
            props: &self.props,
            state: &self.state,
            updater: &self.updater,
        };
        f(self.component.as_mut(), &cx)
    }
}

// =============================================================================
// InstanceRegistry
// =============================================================================

#[derive(Default)]
pub(crate) struct InstanceRegistry {
    live: HashMap<InstanceId, Rc<RefCell<Instance>>>,
    next_id: u64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    pub fn insert(&mut self, instance: Rc<RefCell<Instance>>) {
        let id = instance.borrow().id;
        self.live.insert(id, instance);
    }

    pub fn get(&self, id: InstanceId) -> Option<Rc<RefCell<Instance>>> {
        self.live.get(&id).cloned()
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<Rc<RefCell<Instance>>> {
        self.live.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        assert!(Phase::Unmounted.can_transition_to(Phase::Mounting));
        assert!(Phase::Mounted.can_transition_to(Phase::Updating));
        assert!(Phase::Updating.can_transition_to(Phase::Mounted));
        assert!(Phase::Unmounting.can_transition_to(Phase::Unmounted));

        assert!(!Phase::Unmounted.can_transition_to(Phase::Mounted));
        assert!(!Phase::Updating.can_transition_to(Phase::Unmounting));
        assert!(!Phase::Unmounted.can_transition_to(Phase::Updating));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = InstanceRegistry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 0);
        assert!(registry.get(a).is_none());
    }
}
