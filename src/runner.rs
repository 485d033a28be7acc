//! Dispatch of "Run" actions to the matching executor.
//!
//! The runner is what a code-snippet widget talks to: it picks the executor
//! for the declared language, keeps one run in flight at a time, pauses
//! briefly so a loading state is visible, and turns any unexpected failure
//! into a generic error result.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::Result;
use crate::protocol::{ExecutionRequest, ExecutionResult, Language, Rendered};
use crate::python::simulate_python;
use crate::sandbox::executor::JsSandbox;

/// Configuration for the [`CodeRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Pause before dispatching, so the loading state is perceivable.
    pub dispatch_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            dispatch_delay: Duration::from_millis(500),
        }
    }
}

impl RunnerConfig {
    /// Create a new builder for RunnerConfig.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }
}

/// Builder for creating RunnerConfig instances.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfigBuilder {
    dispatch_delay: Option<Duration>,
}

impl RunnerConfigBuilder {
    /// Set the pause before dispatching.
    pub fn dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = Some(delay);
        self
    }

    /// Build the RunnerConfig.
    pub fn build(self) -> RunnerConfig {
        let default = RunnerConfig::default();
        RunnerConfig {
            dispatch_delay: self.dispatch_delay.unwrap_or(default.dispatch_delay),
        }
    }
}

/// Message shown for languages that cannot be executed.
pub fn unsupported_language_message(language: &Language) -> String {
    format!("Execution for {language} is not supported in the browser.")
}

/// Runs snippets one at a time.
#[derive(Debug)]
pub struct CodeRunner {
    sandbox: JsSandbox,
    config: RunnerConfig,
    in_flight: Mutex<()>,
}

impl CodeRunner {
    /// Create a runner around the given JavaScript sandbox.
    pub fn new(sandbox: JsSandbox, config: RunnerConfig) -> Self {
        Self {
            sandbox,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// Check if a run is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run a request and return its result.
    ///
    /// Runs are serialized; a second call waits for the first to finish.
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let _guard = self.in_flight.lock().await;

        if !self.config.dispatch_delay.is_zero() {
            tokio::time::sleep(self.config.dispatch_delay).await;
        }

        debug!(language = %request.language, bytes = request.source.len(), "dispatching run");
        match self.dispatch(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, language = %request.language, "run failed unexpectedly");
                ExecutionResult::error(format!("Execution failed: {e}"))
            }
        }
    }

    /// Run a request and decide what to display for it.
    pub async fn run_and_render(&self, request: &ExecutionRequest) -> Rendered {
        self.run(request).await.render()
    }

    async fn dispatch(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        match &request.language {
            Language::JavaScript => self.sandbox.try_execute(&request.source).await,
            Language::Python => Ok(simulate_python(&request.source)),
            other => Ok(ExecutionResult::output(unsupported_language_message(other))),
        }
    }
}

impl Default for CodeRunner {
    fn default() -> Self {
        Self::new(JsSandbox::default(), RunnerConfig::default())
    }
}
