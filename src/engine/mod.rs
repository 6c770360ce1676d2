//! Diff/Patch Engine - Reconciliation against the mounted snapshot.
//!
//! The engine turns "old mounted tree + new node tree" into document
//! mutations and a fresh mounted tree:
//! - Reconciler: identity check, patch, replace, keyed child lists
//! - Patcher: applies document primitives and records them
//! - Mounted: the snapshot of what is in the document
//! - Refs: deferred ref attaches and mount-phase hooks
//! - Mutation: the ordered log of a pass
//!
//! # Architecture
//!
//! ```text
//! Node tree ──► Reconciler ──► Patcher ──► Document
//!                   │              │
//!                   │              └──► MutationLog
//!                   └──► Effect queue ──► refs, did_mount, did_update (after the pass)
//! ```
//!
//! Only the mutation log is public; hosts drive the engine through
//! [`Renderer`](crate::pipeline::Renderer).

mod diff;
mod mounted;
mod mutation;
mod patcher;
mod refs;

pub use mutation::{CreatedNode, LifecycleHook, Mutation, MutationKinds, MutationLog};

pub(crate) use diff::Reconciler;
pub(crate) use mounted::{Mounted, Placement};
pub(crate) use refs::Effect;
