//! # spark-vdom
//!
//! Declarative UI reconciliation engine for Rust.
//!
//! Application code describes a tree of elements and stateful components;
//! the engine creates and incrementally updates a real document tree to
//! match it. Update windows are surfaced through a
//! [spark-signals](https://github.com/RLabs-Inc/spark-signals) frame signal.
//!
//! ## Architecture
//!
//! ```text
//! Node tree ──► Renderer::render ──► Reconciler ──► Document primitives
//!                                        │
//!                 Component instances ◄──┘ (lifecycle, render)
//!                        │
//!                 Updater::set_state ──► Scheduler ──► tick ──► Renderer::flush
//! ```
//!
//! Every pass returns a [`MutationLog`]: the document primitives applied, ref
//! invocations and lifecycle hooks, in order.
//!
//! ## Modules
//!
//! - [`types`] - Handles, keys, values, callbacks
//! - [`node`] - Declarative node model and builders
//! - [`component`] - Component traits, instances, lifecycle
//! - [`scheduler`] - Batched state updates
//! - [`engine`] - Diff/patch engine and mutation log
//! - [`document`] - Document primitives and the in-memory backend
//! - [`pipeline`] - `Renderer`, configuration, flush
//!
//! ## Example
//!
//! ```ignore
//! use spark_vdom::*;
//!
//! let mut document = MemoryDocument::new();
//! let container = document.create_container()?;
//! let mut renderer = Renderer::new(document);
//!
//! let tree = Node::element("ul")
//!     .children(["a", "b"].map(|label| Node::element("li").key(label).text(label)));
//! renderer.render(Some(tree.into()), container)?;
//! assert_eq!(renderer.document().inner_html(container), "<ul><li>a</li><li>b</li></ul>");
//! ```

pub mod component;
pub mod document;
pub mod engine;
pub mod error;
pub mod node;
pub mod pipeline;
pub mod scheduler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use component::{Component, ComponentDef, ComponentType, HookCx, InstanceId, Phase, RenderCx};

pub use document::{Document, MemoryDocument};

pub use engine::{CreatedNode, LifecycleHook, Mutation, MutationKinds, MutationLog};

pub use error::{DocumentError, RenderError};

pub use node::{ComponentNode, Element, Identity, Node, NodeKind};

pub use pipeline::{FlushReport, Renderer, RendererConfig};

pub use scheduler::{Scheduler, StateUpdate, TickSource, Updater};
