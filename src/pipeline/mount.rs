//! Renderer - Render entry point and flush loop.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{MemoryDocument, Node, Renderer};
//!
//! let mut document = MemoryDocument::new();
//! let container = document.create_container()?;
//! let mut renderer = Renderer::new(document);
//!
//! // Initial render
//! renderer.render(Some(app()), container)?;
//!
//! // Host loop: flush whenever a tick was requested
//! renderer.set_tick_source(move || wake_up_loop());
//! while renderer.has_pending_updates() {
//!     renderer.flush()?;
//! }
//!
//! // Tear everything down
//! renderer.render(None, container)?;
//! ```

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use spark_signals::Signal;
use tracing::{debug, debug_span};

use super::config::RendererConfig;
use crate::component::InstanceRegistry;
use crate::document::Document;
use crate::engine::{Mounted, MutationLog, Placement, Reconciler};
use crate::error::RenderError;
use crate::node::Node;
use crate::scheduler::{PendingUpdate, Scheduler, TickSource, apply_updates};
use crate::types::NodeId;

// =============================================================================
// Flush Report
// =============================================================================

/// Outcome of one or more flushes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Instances re-rendered by the flush itself (not by an ancestor).
    pub updated: usize,
    /// Requests dropped because their instance was no longer mounted.
    pub discarded: usize,
    pub mutations: MutationLog,
}

impl FlushReport {
    fn absorb(&mut self, other: FlushReport) {
        self.updated += other.updated;
        self.discarded += other.discarded;
        self.mutations.append(other.mutations);
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Owns a document, the mounted snapshots of its containers, and every live
/// component instance.
///
/// All methods take `&mut self`; user code reached from a pass can only
/// request updates, never re-enter reconciliation.
pub struct Renderer<D: Document> {
    document: D,
    roots: HashMap<NodeId, Mounted>,
    instances: InstanceRegistry,
    scheduler: Scheduler,
    config: RendererConfig,
}

impl<D: Document> Renderer<D> {
    pub fn new(document: D) -> Self {
        Self::with_config(document, RendererConfig::default())
    }

    pub fn with_config(document: D, config: RendererConfig) -> Self {
        Self {
            document,
            roots: HashMap::new(),
            instances: InstanceRegistry::new(),
            scheduler: Scheduler::new(),
            config,
        }
    }

    /// Render `node` into `container`, diffing against what is already there.
    ///
    /// `None` unmounts everything previously rendered into the container.
    /// On error the container's snapshot is dropped; render it again from
    /// scratch into a fresh container.
    pub fn render(&mut self, node: Option<Node>, container: NodeId) -> Result<MutationLog, RenderError> {
        let _span = debug_span!("render", %container).entered();

        let old = self.roots.remove(&container);
        let mut pass = Reconciler::new(
            &mut self.document,
            &mut self.instances,
            &self.scheduler,
            &self.config,
        );
        let mounted = match (old, node) {
            (None, None) => None,
            (Some(old), None) => {
                pass.unmount(old, container)?;
                None
            }
            (old, Some(node)) => Some(pass.reconcile(old, node, container, None)?),
        };
        let log = pass.commit();

        if let Some(mounted) = mounted {
            self.roots.insert(container, mounted);
        }
        debug!(mutations = log.len(), "render complete");
        Ok(log)
    }

    /// Shorthand for `render(None, container)`.
    pub fn unmount(&mut self, container: NodeId) -> Result<MutationLog, RenderError> {
        self.render(None, container)
    }

    /// Process the current update window.
    ///
    /// Every pending patch is staged first; then each instance is updated
    /// once, in first-requested order, and its hooks and refs are committed
    /// before the next instance runs. Requests made during the flush open a
    /// new window.
    pub fn flush(&mut self) -> Result<FlushReport, RenderError> {
        let _span = debug_span!("flush").entered();

        let window = self.scheduler.take_window();
        let mut report = FlushReport::default();

        let mut staged = Vec::with_capacity(window.len());
        for PendingUpdate { instance: id, updates } in window {
            let Some(instance) = self
                .instances
                .get(id)
                .filter(|instance| instance.borrow().is_mounted())
            else {
                debug!(instance = %id, "discarding update for unmounted instance");
                report.discarded += 1;
                continue;
            };

            let base = {
                let inst = instance.borrow();
                inst.pending_state.clone().unwrap_or_else(|| inst.state.clone())
            };
            let (next, force) = apply_updates(&base, updates);
            {
                let mut inst = instance.borrow_mut();
                inst.pending_state = Some(next);
                inst.force |= force;
            }
            staged.push(instance);
        }

        for instance in staged {
            let (props, state, force) = {
                let mut inst = instance.borrow_mut();
                if !inst.is_mounted() {
                    continue;
                }
                // Already consumed by an ancestor's re-render
                let Some(state) = inst.pending_state.take() else {
                    continue;
                };
                (inst.props.clone(), state, mem::take(&mut inst.force))
            };

            let id = instance.borrow().id;
            let Placement { ancestors, before } = self
                .roots
                .values()
                .find_map(|root| root.locate(id))
                .ok_or_else(|| RenderError::MissingSubtree {
                    component: instance.borrow().ty.name(),
                })?;

            let mut pass = Reconciler::new(
                &mut self.document,
                &mut self.instances,
                &self.scheduler,
                &self.config,
            );

            // Enclosing components whose refs share this subtree's first handle
            let first = instance.borrow().rendered.as_ref().and_then(Mounted::first_handle);
            let mut watches = Vec::new();
            for ancestor in ancestors {
                let (node_ref, shared) = {
                    let outer = ancestor.borrow();
                    let outer_first = outer.rendered.as_ref().and_then(Mounted::first_handle);
                    (outer.node_ref.clone(), outer_first == first)
                };
                if !shared {
                    continue;
                }
                if let Some(token) = pass.watch_ref(node_ref, first) {
                    watches.push((ancestor, token));
                }
            }

            pass.rerender_instance(&instance, props, state, force, before)?;

            for (ancestor, token) in watches.into_iter().rev() {
                let first = ancestor.borrow().rendered.as_ref().and_then(Mounted::first_handle);
                pass.release_ref(Some(token), first);
            }
            report.mutations.append(pass.commit());
            report.updated += 1;
        }

        debug!(
            updated = report.updated,
            discarded = report.discarded,
            mutations = report.mutations.len(),
            "flush complete"
        );
        Ok(report)
    }

    /// Flush until no update is pending.
    ///
    /// Fails with [`RenderError::Unsettled`] once `idle_tick_limit` flushes
    /// have run and updates keep arriving.
    pub fn run_until_idle(&mut self) -> Result<FlushReport, RenderError> {
        let mut report = FlushReport::default();
        let mut ticks = 0;
        while self.has_pending_updates() {
            if ticks >= self.config.idle_tick_limit {
                return Err(RenderError::Unsettled { ticks });
            }
            report.absorb(self.flush()?);
            ticks += 1;
        }
        Ok(report)
    }

    pub fn has_pending_updates(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Install the host's tick callback, called once per update window.
    pub fn set_tick_source(&mut self, source: impl TickSource + 'static) {
        self.scheduler.set_tick_source(Some(Rc::new(source)));
    }

    pub fn clear_tick_source(&mut self) {
        self.scheduler.set_tick_source(None);
    }

    /// Signal bumped whenever an update window opens.
    pub fn frame_signal(&self) -> Signal<u64> {
        self.scheduler.frame_signal()
    }

    /// Update windows opened so far.
    pub fn ticks_requested(&self) -> u64 {
        self.scheduler.ticks_requested()
    }

    pub fn is_rendered(&self, container: NodeId) -> bool {
        self.roots.contains_key(&container)
    }

    /// Live component instances across all containers.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Direct document access. Changes to rendered nodes are not tracked.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }
}
