//! Component mount and update transitions.
//!
//! These run inside a reconcile pass. A component's subtree is reconciled
//! with no borrow of its instance held, so hooks and render of descendants
//! never observe an ancestor mid-borrow.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::debug;

use super::{Instance, Phase};
use crate::document::Document;
use crate::engine::{Effect, LifecycleHook, Mounted, Reconciler};
use crate::error::RenderError;
use crate::node::ComponentNode;
use crate::types::{NodeId, Props, State};

impl<D: Document> Reconciler<'_, D> {
    pub(crate) fn mount_component(
        &mut self,
        node: ComponentNode,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        let ComponentNode {
            component: ty,
            props,
            key,
            node_ref,
        } = node;

        let id = self.instances.allocate_id();
        let updater = self.scheduler.updater(id);
        let (component, state) = ty.construct(&props, &updater);
        let instance = Rc::new(RefCell::new(Instance::new(
            ty, component, props, state, parent, updater,
        )));

        let tree = {
            let mut inst = instance.borrow_mut();
            inst.transition(Phase::Mounting);
            self.patcher
                .lifecycle(LifecycleHook::WillMount, id, ty.short_name());
            inst.with_hook(|component, cx| component.will_mount(cx));
            inst.render()
        };

        let rendered = self.mount(tree, parent, before)?;
        let first = rendered.first_handle();
        {
            let mut inst = instance.borrow_mut();
            inst.rendered = Some(rendered);
            inst.node_ref = node_ref.clone();
            inst.transition(Phase::Mounted);
        }
        self.instances.insert(instance.clone());

        self.effects.push(Effect::DidMount(instance.clone()));
        self.queue_attach(&node_ref, first);

        Ok(Mounted::Component { ty, key, instance })
    }

    /// Parent-driven update with new props.
    ///
    /// State staged by the current flush is consumed here, so the instance
    /// is not rendered a second time when the flush reaches it.
    pub(crate) fn update_component(
        &mut self,
        old: Mounted,
        node: ComponentNode,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        let (ty, key, instance) = match old {
            Mounted::Component { ty, key, instance } => (ty, key, instance),
            other => return self.replace_with(other, node, parent, before),
        };
        let ComponentNode {
            props, node_ref, ..
        } = node;

        let (next_state, force, previous_ref) = {
            let mut inst = instance.borrow_mut();
            inst.parent = parent;
            self.patcher
                .lifecycle(LifecycleHook::WillReceiveProps, inst.id, ty.short_name());
            inst.with_hook(|component, cx| component.will_receive_props(&props, cx));
            let state = match inst.pending_state.take() {
                Some(state) => state,
                None => inst.state.clone(),
            };
            (state, mem::take(&mut inst.force), inst.node_ref.take())
        };

        // A new ref identity unbinds the old one while its handle is still live
        let rebinding = previous_ref != node_ref;
        if rebinding {
            self.detach_now(&previous_ref);
        } else {
            instance.borrow_mut().node_ref = previous_ref;
        }

        self.rerender_instance(&instance, props, next_state, force, before)?;

        if rebinding {
            let first = {
                let mut inst = instance.borrow_mut();
                inst.node_ref = node_ref.clone();
                inst.rendered.as_ref().and_then(Mounted::first_handle)
            };
            self.queue_attach(&node_ref, first);
        }

        Ok(Mounted::Component { ty, key, instance })
    }

    fn replace_with(
        &mut self,
        old: Mounted,
        node: ComponentNode,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<Mounted, RenderError> {
        self.unmount(old, parent)?;
        self.mount_component(node, parent, before)
    }

    /// Run the update transition of a mounted instance.
    ///
    /// `force` skips `should_update`. A veto still stores props and state.
    /// `before` is the node the instance's subtree ends before. The
    /// instance's ref follows the subtree's first handle if it changes.
    pub(crate) fn rerender_instance(
        &mut self,
        instance: &Rc<RefCell<Instance>>,
        next_props: Props,
        next_state: State,
        force: bool,
        before: Option<NodeId>,
    ) -> Result<(), RenderError> {
        let (tree, old, parent, prev_props, prev_state, node_ref) = {
            let mut inst = instance.borrow_mut();
            inst.transition(Phase::Updating);

            if !force && !inst.component.should_update(&next_props, &next_state) {
                debug!(component = inst.ty.short_name(), instance = %inst.id, "update vetoed");
                inst.props = next_props;
                inst.state = next_state;
                inst.transition(Phase::Mounted);
                return Ok(());
            }

            self.patcher
                .lifecycle(LifecycleHook::WillUpdate, inst.id, inst.ty.short_name());
            inst.with_hook(|component, cx| component.will_update(&next_props, &next_state, cx));

            let prev_props = mem::replace(&mut inst.props, next_props);
            let prev_state = mem::replace(&mut inst.state, next_state);
            let tree = inst.render();
            let old = inst.rendered.take().ok_or(RenderError::MissingSubtree {
                component: inst.ty.name(),
            })?;
            (tree, old, inst.parent, prev_props, prev_state, inst.node_ref.clone())
        };

        let watch = self.watch_ref(node_ref, old.first_handle());
        let rendered = self.reconcile(Some(old), tree, parent, before)?;
        let first = rendered.first_handle();

        {
            let mut inst = instance.borrow_mut();
            inst.rendered = Some(rendered);
            inst.transition(Phase::Mounted);
        }
        self.effects.push(Effect::DidUpdate {
            instance: instance.clone(),
            prev_props,
            prev_state,
        });
        self.release_ref(watch, first);
        Ok(())
    }
}
