//! Sandbox configuration with builder pattern.

use std::time::Duration;

use crate::error::{Result, SandboxError};

/// Globals handed to untrusted code unless the allow-list is overridden.
pub const DEFAULT_ALLOWED_GLOBALS: &[&str] = &[
    "Math",
    "String",
    "Array",
    "Object",
    "Number",
    "RegExp",
    "Date",
    "JSON",
    "Boolean",
    "Promise",
    "Set",
    "Map",
    "WeakMap",
    "WeakSet",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
];

/// Default engine cap on a single loop's iterations.
///
/// Far beyond what the engine runs within the default deadline, so it never
/// changes a result; it ends worker threads left spinning after a timeout.
pub const DEFAULT_LOOP_ITERATION_LIMIT: u64 = 1_000_000_000;

/// Configuration for the JavaScript sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum wall-clock time before an execution is reported as timed out.
    pub timeout: Duration,
    /// Engine-enforced cap on loop iterations, if any.
    pub loop_iteration_limit: Option<u64>,
    /// Engine-enforced cap on call depth, if any.
    pub recursion_limit: Option<usize>,
    /// Global bindings left visible to the executed code.
    pub allowed_globals: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            loop_iteration_limit: Some(DEFAULT_LOOP_ITERATION_LIMIT),
            recursion_limit: None,
            allowed_globals: DEFAULT_ALLOWED_GLOBALS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Reject configurations the sandbox cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(SandboxError::Config("timeout must be non-zero".to_string()));
        }
        if self.loop_iteration_limit == Some(0) {
            return Err(SandboxError::Config(
                "loop iteration limit must be non-zero".to_string(),
            ));
        }
        if let Some(name) = self
            .allowed_globals
            .iter()
            .find(|name| name.trim().is_empty())
        {
            return Err(SandboxError::Config(format!(
                "invalid allowed global name: {name:?}"
            )));
        }
        Ok(())
    }
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    timeout: Option<Duration>,
    loop_iteration_limit: Option<Option<u64>>,
    recursion_limit: Option<usize>,
    allowed_globals: Option<Vec<String>>,
    extra_globals: Vec<String>,
}

impl SandboxConfigBuilder {
    /// Set the wall-clock timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cap the number of iterations any single loop may run.
    pub fn loop_iteration_limit(mut self, limit: u64) -> Self {
        self.loop_iteration_limit = Some(Some(limit));
        self
    }

    /// Let loops run until the deadline, with no engine cap.
    pub fn unbounded_loops(mut self) -> Self {
        self.loop_iteration_limit = Some(None);
        self
    }

    /// Cap the call depth of executed code.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Replace the default allow-list of globals.
    pub fn allowed_globals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_globals = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Add one global to the allow-list.
    pub fn allow_global(mut self, name: impl Into<String>) -> Self {
        self.extra_globals.push(name.into());
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        let mut allowed_globals = self.allowed_globals.unwrap_or(default.allowed_globals);
        for name in self.extra_globals {
            if !allowed_globals.contains(&name) {
                allowed_globals.push(name);
            }
        }
        SandboxConfig {
            timeout: self.timeout.unwrap_or(default.timeout),
            loop_iteration_limit: self
                .loop_iteration_limit
                .unwrap_or(default.loop_iteration_limit),
            recursion_limit: self.recursion_limit.or(default.recursion_limit),
            allowed_globals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(
            config.loop_iteration_limit,
            Some(DEFAULT_LOOP_ITERATION_LIMIT)
        );
        assert!(config.allowed_globals.iter().any(|g| g == "JSON"));
        assert!(!config.allowed_globals.iter().any(|g| g == "eval"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_millis(500))
            .loop_iteration_limit(1_000_000)
            .recursion_limit(64)
            .allowed_globals(["Math", "JSON"])
            .allow_global("Map")
            .allow_global("Math")
            .build();

        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.loop_iteration_limit, Some(1_000_000));
        assert_eq!(config.recursion_limit, Some(64));
        assert_eq!(config.allowed_globals, vec!["Math", "JSON", "Map"]);
    }

    #[test]
    fn test_unbounded_loops() {
        let config = SandboxConfig::builder().unbounded_loops().build();
        assert!(config.loop_iteration_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = SandboxConfig::builder().timeout(Duration::ZERO).build();
        assert!(matches!(config.validate(), Err(SandboxError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_global() {
        let config = SandboxConfig::builder().allow_global(" ").build();
        assert!(matches!(config.validate(), Err(SandboxError::Config(_))));
    }
}
