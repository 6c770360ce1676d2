//! Renderer configuration.

/// Knobs for a [`Renderer`](super::Renderer).
///
/// ```ignore
/// let config = RendererConfig::new()
///     .dev_checks(true)
///     .trace_mutations(true)
///     .idle_tick_limit(16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Warn about duplicate sibling keys.
    pub dev_checks: bool,
    /// Emit a `trace!` event per recorded mutation.
    pub trace_mutations: bool,
    /// Flushes `run_until_idle` may perform before giving up.
    pub idle_tick_limit: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            dev_checks: cfg!(debug_assertions),
            trace_mutations: false,
            idle_tick_limit: 64,
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dev_checks(mut self, enabled: bool) -> Self {
        self.dev_checks = enabled;
        self
    }

    pub fn trace_mutations(mut self, enabled: bool) -> Self {
        self.trace_mutations = enabled;
        self
    }

    pub fn idle_tick_limit(mut self, limit: usize) -> Self {
        self.idle_tick_limit = limit;
        self
    }
}
