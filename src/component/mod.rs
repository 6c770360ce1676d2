//! Components - Stateful, lifecycle-bearing tree nodes.
//!
//! A component is any type implementing [`Component`] (render + optional
//! hooks) and [`ComponentDef`] (construction). The engine owns every instance;
//! user code only ever sees `&self`/`&mut self` inside a hook and an
//! [`Updater`] for requesting state changes.
//!
//! # Lifecycle
//!
//! ```text
//! Unmounted → Mounting → Mounted ⇄ Updating
//!                           ↓
//!                      Unmounting → Unmounted
//! ```
//!
//! - Mount: `create` → `initial_state` → `will_mount` → `render` → subtree mounted
//!   → `did_mount` (after every descendant's `did_mount` and ref)
//! - Update: `will_receive_props` (parent-driven only) → `should_update`
//!   → `will_update` → `render` → subtree reconciled → `did_update`
//! - Unmount: `will_unmount` (parent before children) → refs nulled → nodes removed
//!
//! # Example
//!
//! ```ignore
//! struct Toggle { updater: Updater }
//!
//! impl ComponentDef for Toggle {
//!     fn create(_props: &Props, updater: &Updater) -> Self {
//!         Toggle { updater: updater.clone() }
//!     }
//! }
//!
//! impl Component for Toggle {
//!     fn render(&self, cx: &RenderCx<'_>) -> Node {
//!         let on = cx.state().flag("on");
//!         let updater = self.updater.clone();
//!         Node::element("button")
//!             .attr("onclick", Handler::new(move |_| {
//!                 updater.set_state(State::new().with("on", !on));
//!             }))
//!             .text(if on { "on" } else { "off" })
//!             .into()
//!     }
//! }
//! ```

mod instance;
mod lifecycle;

pub use instance::{InstanceId, Phase};
pub(crate) use instance::{Instance, InstanceRegistry};

use std::any::{TypeId, type_name};
use std::fmt;

use crate::node::Node;
use crate::scheduler::Updater;
use crate::types::{Props, State};

// =============================================================================
// Contexts
// =============================================================================

/// Read-only view handed to [`Component::render`].
///
/// Render receives everything it may depend on explicitly; there is no
/// ambient "current component".
pub struct RenderCx<'a> {
    pub(crate) props: &'a Props,
    pub(crate) state: &'a State,
    pub(crate) updater: &'a Updater,
}

impl<'a> RenderCx<'a> {
    pub fn props(&self) -> &'a Props {
        self.props
    }

    pub fn state(&self) -> &'a State {
        self.state
    }

    /// Handle for requesting state changes, e.g. from event handlers.
    pub fn updater(&self) -> &'a Updater {
        self.updater
    }
}

/// Context handed to lifecycle hooks.
pub struct HookCx<'a> {
    pub(crate) props: &'a Props,
    pub(crate) state: &'a State,
    pub(crate) updater: &'a Updater,
}

impl<'a> HookCx<'a> {
    /// Props current at the time of the hook.
    pub fn props(&self) -> &'a Props {
        self.props
    }

    /// State current at the time of the hook.
    pub fn state(&self) -> &'a State {
        self.state
    }

    pub fn updater(&self) -> &'a Updater {
        self.updater
    }
}

// =============================================================================
// Component contract
// =============================================================================

/// Render logic and lifecycle hooks of a component.
///
/// Every hook has a no-op default. A panic in any of them unwinds out of the
/// `render`/`flush` call that invoked it.
pub trait Component: 'static {
    /// Derive the subtree from current props and state.
    fn render(&self, cx: &RenderCx<'_>) -> Node;

    /// Before the first render.
    fn will_mount(&mut self, _cx: &HookCx<'_>) {}

    /// After the subtree (and all descendants' `did_mount`) is attached.
    fn did_mount(&mut self, _cx: &HookCx<'_>) {}

    /// A parent re-render is about to hand over `next_props`.
    fn will_receive_props(&mut self, _next_props: &Props, _cx: &HookCx<'_>) {}

    /// Return `false` to skip re-rendering. Props and state are stored either way.
    fn should_update(&self, _next_props: &Props, _next_state: &State) -> bool {
        true
    }

    /// Before re-rendering with `next_props`/`next_state`.
    fn will_update(&mut self, _next_props: &Props, _next_state: &State, _cx: &HookCx<'_>) {}

    /// After the re-rendered subtree is reconciled.
    fn did_update(&mut self, _prev_props: &Props, _prev_state: &State, _cx: &HookCx<'_>) {}

    /// Before the component's document nodes are removed.
    fn will_unmount(&mut self, _cx: &HookCx<'_>) {}
}

/// Construction half of the component contract.
pub trait ComponentDef: Component + Sized {
    /// Build an instance from its initial props.
    ///
    /// The updater is the instance's only channel to the scheduler; keep a
    /// clone if handlers or refs need to request updates.
    fn create(props: &Props, updater: &Updater) -> Self;

    fn initial_state(&self, _props: &Props) -> State {
        State::new()
    }
}

// =============================================================================
// ComponentType
// =============================================================================

type Constructor = fn(&Props, &Updater) -> (Box<dyn Component>, State);

/// Identity of a component definition.
///
/// Two component nodes refer to the same definition iff their types are equal.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    construct: Constructor,
}

impl ComponentType {
    pub fn of<C: ComponentDef>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
            construct: construct::<C>,
        }
    }

    /// Fully-qualified type name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Unqualified type name.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    pub(crate) fn construct(&self, props: &Props, updater: &Updater) -> (Box<dyn Component>, State) {
        (self.construct)(props, updater)
    }
}

fn construct<C: ComponentDef>(props: &Props, updater: &Updater) -> (Box<dyn Component>, State) {
    let component = C::create(props, updater);
    let state = component.initial_state(props);
    (Box::new(component), state)
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.short_name())
    }
}
