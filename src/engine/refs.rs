//! Ref/Mount binder - Deferred attaches and mount-phase hooks.
//!
//! Attaches (`ref(Some(handle))`), `did_mount` and `did_update` are queued
//! while a pass mutates the document and run once it is done. Queue order is
//! post-order, so children bind before their parent component's `did_mount`.
//!
//! Detaches are not queued: a ref gets `None` the moment its node is torn
//! down, before the handle is removed from the document.
//!
//! Component refs point at the first handle of a subtree the component does
//! not own outright: a re-render can swap that node out from under it. While
//! a component re-renders, its ref is *watched*. Removing the watched handle
//! nulls the ref first, and releasing the watch binds the ref to whatever
//! the subtree starts with afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use super::diff::Reconciler;
use super::mutation::LifecycleHook;
use crate::component::Instance;
use crate::document::Document;
use crate::error::RenderError;
use crate::types::{NodeId, Props, RefCallback, State};

pub(crate) enum Effect {
    Ref {
        callback: RefCallback,
        handle: Option<NodeId>,
    },
    DidMount(Rc<RefCell<Instance>>),
    DidUpdate {
        instance: Rc<RefCell<Instance>>,
        prev_props: Props,
        prev_state: State,
    },
}

/// A component ref bound to a handle that may be removed during the pass.
pub(crate) struct Watch {
    handle: NodeId,
    callback: RefCallback,
    detached: bool,
}

/// Position of a [`Watch`] on the pass's watch stack.
pub(crate) struct WatchToken(usize);

impl<D: Document> Reconciler<'_, D> {
    pub(crate) fn queue_attach(&mut self, callback: &Option<RefCallback>, handle: Option<NodeId>) {
        if let Some(callback) = callback {
            self.effects.push(Effect::Ref {
                callback: callback.clone(),
                handle,
            });
        }
    }

    /// Null a ref right away.
    pub(crate) fn detach_now(&mut self, callback: &Option<RefCallback>) {
        if let Some(callback) = callback {
            self.patcher.invoke_ref(None);
            callback.call(None);
        }
    }

    /// Watch a ref currently bound to `handle`.
    ///
    /// Watches nest: release them in reverse order of creation.
    pub(crate) fn watch_ref(
        &mut self,
        callback: Option<RefCallback>,
        handle: Option<NodeId>,
    ) -> Option<WatchToken> {
        let (callback, handle) = callback.zip(handle)?;
        self.watched.push(Watch {
            handle,
            callback,
            detached: false,
        });
        Some(WatchToken(self.watched.len() - 1))
    }

    /// Stop watching and bind the ref to `first`, the subtree's first handle now.
    pub(crate) fn release_ref(&mut self, token: Option<WatchToken>, first: Option<NodeId>) {
        let Some(WatchToken(index)) = token else {
            return;
        };
        if index >= self.watched.len() {
            return;
        }
        let watch = self.watched.remove(index);
        self.watched.truncate(index);

        if !watch.detached {
            if first == Some(watch.handle) {
                return;
            }
            self.effects.push(Effect::Ref {
                callback: watch.callback.clone(),
                handle: None,
            });
        }
        if first.is_some() {
            self.effects.push(Effect::Ref {
                callback: watch.callback,
                handle: first,
            });
        }
    }

    /// Remove a top-level node, nulling any watched ref bound to it first.
    pub(crate) fn remove_top(&mut self, parent: NodeId, handle: NodeId) -> Result<(), RenderError> {
        let mut nulled = Vec::new();
        for watch in self.watched.iter_mut() {
            if watch.handle == handle && !watch.detached {
                watch.detached = true;
                nulled.push(watch.callback.clone());
            }
        }
        for callback in nulled {
            self.patcher.invoke_ref(None);
            callback.call(None);
        }
        self.patcher.remove_node(parent, handle)?;
        Ok(())
    }

    /// Move a node's binding from `old` to `new` if the ref identity changed.
    pub(crate) fn rebind(
        &mut self,
        old: Option<RefCallback>,
        new: &Option<RefCallback>,
        handle: Option<NodeId>,
    ) {
        if old == *new {
            return;
        }
        if let Some(old) = old {
            self.effects.push(Effect::Ref {
                callback: old,
                handle: None,
            });
        }
        self.queue_attach(new, handle);
    }

    /// Run queued effects in order.
    ///
    /// Hooks of instances that left the `Mounted` phase since being queued
    /// are skipped.
    pub(crate) fn commit_effects(&mut self) {
        for effect in std::mem::take(&mut self.effects) {
            match effect {
                Effect::Ref { callback, handle } => {
                    self.patcher.invoke_ref(handle);
                    callback.call(handle);
                }
                Effect::DidMount(instance) => {
                    let mut inst = instance.borrow_mut();
                    if !inst.is_mounted() {
                        continue;
                    }
                    self.patcher
                        .lifecycle(LifecycleHook::DidMount, inst.id, inst.ty.short_name());
                    inst.with_hook(|component, cx| component.did_mount(cx));
                }
                Effect::DidUpdate {
                    instance,
                    prev_props,
                    prev_state,
                } => {
                    let mut inst = instance.borrow_mut();
                    if !inst.is_mounted() {
                        continue;
                    }
                    self.patcher
                        .lifecycle(LifecycleHook::DidUpdate, inst.id, inst.ty.short_name());
                    inst.with_hook(|component, cx| component.did_update(&prev_props, &prev_state, cx));
                }
            }
        }
    }
}
