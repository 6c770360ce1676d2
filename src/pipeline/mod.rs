//! Render Pipeline
//!
//! Entry points that drive the engine:
//!
//! ```text
//! render(tree, container) ──► Reconciler pass ──► commit effects ──► snapshot stored
//! Updater::set_state ──► Scheduler window ──► tick ──► flush() ──► per-instance passes
//! ```
//!
//! - [`Renderer`] - owns the document, snapshots and instances
//! - [`RendererConfig`] - dev checks, mutation tracing, idle limit
//! - [`FlushReport`] - what a flush did

mod config;
mod mount;

pub use config::RendererConfig;
pub use mount::{FlushReport, Renderer};
