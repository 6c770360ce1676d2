//! Update Scheduler - Batches state changes into flush windows.
//!
//! Components never re-render synchronously. Every `set_state` lands in the
//! current window's queue; the first request in an empty window bumps the
//! frame signal and asks the [`TickSource`] for a tick. The host answers that
//! tick by calling [`Renderer::flush`](crate::pipeline::Renderer::flush).
//!
//! # Architecture
//!
//! ```text
//! Updater::set_state ──► UpdateQueue (per-instance patches, request order)
//!        │                     │
//!        │ first in window     │ Renderer::flush
//!        ▼                     ▼
//! frame signal + tick     take_window() → stage → update each instance once
//! ```
//!
//! The queue lives behind its own `RefCell`, separate from the engine, so
//! handlers and hooks can request updates while a pass is running. Those
//! requests go to the next window.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{Signal, signal};

use crate::component::InstanceId;
use crate::types::State;

// =============================================================================
// Tick Source
// =============================================================================

/// Host hook invoked once per flush window.
///
/// The implementation should arrange for `Renderer::flush` to run "soon"
/// (next frame, next loop iteration). It must not flush synchronously: the
/// renderer is usually borrowed when requests are issued.
pub trait TickSource {
    fn request_tick(&self);
}

impl<F: Fn()> TickSource for F {
    fn request_tick(&self) {
        self()
    }
}

// =============================================================================
// State Updates
// =============================================================================

/// One queued change for an instance.
pub enum StateUpdate {
    /// Shallow-merge a patch into state.
    Merge(State),
    /// Compute a patch from the state as of this point in the window.
    Apply(Box<dyn FnOnce(&State) -> State>),
    /// Re-render even if `should_update` would veto.
    Force,
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Merge(patch) => f.debug_tuple("Merge").field(patch).finish(),
            StateUpdate::Apply(_) => f.write_str("Apply(..)"),
            StateUpdate::Force => f.write_str("Force"),
        }
    }
}

/// Fold queued updates into `state`, in request order.
///
/// Returns the merged state and whether a forced update was requested.
pub(crate) fn apply_updates(state: &State, updates: Vec<StateUpdate>) -> (State, bool) {
    let mut next = state.clone();
    let mut force = false;
    for update in updates {
        match update {
            StateUpdate::Merge(patch) => next.merge(patch),
            StateUpdate::Apply(f) => {
                let patch = f(&next);
                next.merge(patch);
            }
            StateUpdate::Force => force = true,
        }
    }
    (next, force)
}

/// All updates requested for one instance within a window.
#[derive(Debug)]
pub(crate) struct PendingUpdate {
    pub instance: InstanceId,
    pub updates: Vec<StateUpdate>,
}

// =============================================================================
// Update Queue
// =============================================================================

#[derive(Debug, Default)]
struct UpdateQueue {
    /// First-requested order.
    entries: Vec<PendingUpdate>,
    index: HashMap<InstanceId, usize>,
    /// A tick has been requested for the current window.
    scheduled: bool,
}

impl UpdateQueue {
    /// Queue an update. Returns true if this opened a new window.
    fn push(&mut self, instance: InstanceId, update: StateUpdate) -> bool {
        match self.index.get(&instance) {
            Some(&slot) => self.entries[slot].updates.push(update),
            None => {
                self.index.insert(instance, self.entries.len());
                self.entries.push(PendingUpdate {
                    instance,
                    updates: vec![update],
                });
            }
        }
        let opened = !self.scheduled;
        self.scheduled = true;
        opened
    }

    fn take(&mut self) -> Vec<PendingUpdate> {
        self.index.clear();
        self.scheduled = false;
        std::mem::take(&mut self.entries)
    }
}

// =============================================================================
// Scheduler
// =============================================================================

struct SchedulerInner {
    queue: RefCell<UpdateQueue>,
    /// Bumped once per opened window.
    frame: Signal<u64>,
    tick_source: RefCell<Option<Rc<dyn TickSource>>>,
    ticks_requested: Cell<u64>,
}

/// Shared handle to the update queue of one renderer.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(UpdateQueue::default()),
                frame: signal(0),
                tick_source: RefCell::new(None),
                ticks_requested: Cell::new(0),
            }),
        }
    }

    pub fn set_tick_source(&self, source: Option<Rc<dyn TickSource>>) {
        *self.inner.tick_source.borrow_mut() = source;
    }

    /// Updater bound to one instance.
    pub(crate) fn updater(&self, instance: InstanceId) -> Updater {
        Updater {
            instance,
            scheduler: Rc::downgrade(&self.inner),
        }
    }

    /// Frame-generation signal, incremented whenever a window opens.
    ///
    /// Hosts driven by spark-signals effects can watch it instead of
    /// installing a [`TickSource`].
    pub fn frame_signal(&self) -> Signal<u64> {
        self.inner.frame.clone()
    }

    /// Number of windows opened so far.
    pub fn ticks_requested(&self) -> u64 {
        self.inner.ticks_requested.get()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.queue.borrow().entries.is_empty()
    }

    /// Close the current window and hand its updates to the flush.
    pub(crate) fn take_window(&self) -> Vec<PendingUpdate> {
        self.inner.queue.borrow_mut().take()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerInner {
    fn request(&self, instance: InstanceId, update: StateUpdate) {
        // Borrow released before any user-visible side effect
        let opened = self.queue.borrow_mut().push(instance, update);
        if !opened {
            return;
        }

        self.ticks_requested.set(self.ticks_requested.get() + 1);
        let generation = self.frame.get();
        self.frame.set(generation + 1);

        let source = self.tick_source.borrow().clone();
        if let Some(source) = source {
            source.request_tick();
        }
    }
}

// =============================================================================
// Updater
// =============================================================================

/// A component instance's channel to the scheduler.
///
/// Cheap to clone. Requests made after the renderer is dropped are ignored.
#[derive(Clone)]
pub struct Updater {
    instance: InstanceId,
    scheduler: Weak<SchedulerInner>,
}

impl Updater {
    /// Queue a shallow state patch for the next flush.
    pub fn set_state(&self, patch: State) {
        self.request(StateUpdate::Merge(patch));
    }

    /// Queue a patch computed from the state at flush time.
    pub fn update_state(&self, f: impl FnOnce(&State) -> State + 'static) {
        self.request(StateUpdate::Apply(Box::new(f)));
    }

    /// Queue a re-render that bypasses `should_update`.
    pub fn force_update(&self) {
        self.request(StateUpdate::Force);
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    fn request(&self, update: StateUpdate) {
        if let Some(inner) = self.scheduler.upgrade() {
            inner.request(self.instance, update);
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_tick_per_window() {
        let scheduler = Scheduler::new();
        let ticks = Rc::new(Cell::new(0));
        let counter = ticks.clone();
        scheduler.set_tick_source(Some(Rc::new(move || counter.set(counter.get() + 1))));

        let a = scheduler.updater(InstanceId::new(1));
        let b = scheduler.updater(InstanceId::new(2));
        a.set_state(State::new().with("n", 1));
        b.set_state(State::new().with("n", 2));
        a.force_update();

        assert_eq!(ticks.get(), 1);
        assert_eq!(scheduler.frame_signal().get(), 1);

        let window = scheduler.take_window();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].instance, InstanceId::new(1));
        assert_eq!(window[0].updates.len(), 2);
        assert!(!scheduler.has_pending());

        a.set_state(State::new());
        assert_eq!(ticks.get(), 2);
        assert_eq!(scheduler.ticks_requested(), 2);
    }

    #[test]
    fn test_apply_updates_in_order() {
        let updates = vec![
            StateUpdate::Merge(State::new().with("n", 1).with("tag", "a")),
            StateUpdate::Apply(Box::new(|s| {
                State::new().with("n", s.int("n").unwrap_or(0) + 10)
            })),
            StateUpdate::Merge(State::new().with("tag", "b")),
        ];
        let (next, force) = apply_updates(&State::new().with("keep", true), updates);

        assert_eq!(next.int("n"), Some(11));
        assert_eq!(next.str("tag"), Some("b"));
        assert!(next.flag("keep"));
        assert!(!force);
    }

    #[test]
    fn test_updater_outlives_scheduler() {
        let updater = Scheduler::new().updater(InstanceId::new(9));
        // Scheduler already dropped; request is a no-op
        updater.set_state(State::new().with("x", 1));
        assert_eq!(updater.instance(), InstanceId::new(9));
    }
}
