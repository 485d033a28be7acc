//! Engine-enforced runtime limits.
//!
//! The wall-clock deadline is a soft limit: a synchronous loop keeps its
//! worker thread busy after the deadline passes. These limits are enforced
//! inside the engine and stop such code for real, surfacing as an ordinary
//! runtime error when they trip before the deadline.

use boa_engine::vm::RuntimeLimits;
use boa_engine::Context;

use crate::sandbox::config::SandboxConfig;

/// Limits applied to every execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum iterations of any single loop.
    pub loop_iteration_limit: Option<u64>,
    /// Maximum call depth.
    pub recursion_limit: Option<usize>,
}

impl ExecutionLimits {
    /// Take the limits from a sandbox configuration.
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            loop_iteration_limit: config.loop_iteration_limit,
            recursion_limit: config.recursion_limit,
        }
    }

    /// Check if no engine limit is configured.
    pub fn is_unbounded(&self) -> bool {
        self.loop_iteration_limit.is_none() && self.recursion_limit.is_none()
    }

    /// Build the engine's limit set, keeping engine defaults for anything
    /// left unset.
    pub fn to_runtime_limits(&self) -> RuntimeLimits {
        let mut limits = RuntimeLimits::default();
        if let Some(limit) = self.loop_iteration_limit {
            limits.set_loop_iteration_limit(limit);
        }
        if let Some(limit) = self.recursion_limit {
            limits.set_recursion_limit(limit);
        }
        limits
    }
}

/// Extension trait for Context to apply execution limits.
pub trait ContextLimitsExt {
    /// Configure the context with the given limits.
    fn apply_limits(&mut self, limits: ExecutionLimits);
}

impl ContextLimitsExt for Context {
    fn apply_limits(&mut self, limits: ExecutionLimits) {
        if limits.is_unbounded() {
            return;
        }
        self.set_runtime_limits(limits.to_runtime_limits());
    }
}
