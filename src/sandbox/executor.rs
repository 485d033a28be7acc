//! Deadline-bounded JavaScript execution.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Result, SandboxError};
use crate::protocol::ExecutionResult;
use crate::sandbox::capture::{with_captured_output, CapturedOutput};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::detector;
use crate::sandbox::engine::{self, Completion};

/// Stack for execution workers; deep recursion in user code runs on it.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// A sandboxed JavaScript execution environment.
///
/// Every call to [`JsSandbox::execute`] runs on a fresh engine context in its
/// own worker thread, with its own output buffer, so executions never share
/// state and may run concurrently.
///
/// The deadline is soft. When it passes, the result is a timeout and the
/// worker's output is discarded, but a worker stuck in a synchronous loop is
/// not preempted. Each such timeout leaves one worker thread (with its 8 MiB
/// stack) spinning until the loop ends or
/// [`SandboxConfig::loop_iteration_limit`] stops it; with
/// [`unbounded_loops`](crate::SandboxConfigBuilder::unbounded_loops) it spins
/// until the process exits. Hard isolation of hostile code needs a process
/// boundary the host can kill.
#[derive(Debug, Clone)]
pub struct JsSandbox {
    config: SandboxConfig,
}

impl JsSandbox {
    /// Create a new JavaScript sandbox with the given configuration.
    pub fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this sandbox runs with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute JavaScript source and report its outcome.
    ///
    /// Never fails: restricted source, timeouts and internal failures are all
    /// reported through the result's `error` field, while exceptions thrown by
    /// the code itself appear in the transcript as `Error: <message>` lines.
    pub async fn execute(&self, source: &str) -> ExecutionResult {
        match self.try_execute(source).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "javascript execution failed internally");
                ExecutionResult::error(e.to_string())
            }
        }
    }

    /// Execute JavaScript source, returning internal failures as errors.
    ///
    /// Security violations and timeouts are part of the result protocol and
    /// come back as `Ok` with `error` set.
    pub async fn try_execute(&self, source: &str) -> Result<ExecutionResult> {
        match self.run(source).await {
            Ok(lines) => Ok(ExecutionResult::output(lines.join("\n"))),
            Err(e) if e.is_reportable() => Ok(ExecutionResult::error(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Run `source` and collect its transcript lines.
    async fn run(&self, source: &str) -> Result<Vec<String>> {
        if let Some(hit) = detector::find_restricted(source) {
            warn!(
                identifier = %hit.identifier,
                category = ?hit.category,
                "rejected restricted source"
            );
            return Err(SandboxError::SecurityViolation {
                identifier: hit.identifier,
            });
        }

        let (outcome, lines) =
            with_captured_output(|output| self.race_deadline(source, output)).await;
        outcome.map(|()| lines)
    }

    /// Start a worker for `source` and wait for it until the deadline.
    async fn race_deadline(&self, source: &str, output: CapturedOutput) -> Result<()> {
        let timeout = self.config.timeout;
        let deadline = Instant::now() + timeout;

        let (tx, rx) = oneshot::channel();
        let worker_source = source.to_string();
        let worker_config = self.config.clone();
        let worker_output = output.clone();
        std::thread::Builder::new()
            .name("js-sandbox".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let outcome = engine::run_unit(&worker_source, &worker_config, &worker_output);
                // The receiver is gone once the deadline has passed.
                let _ = tx.send(outcome);
            })?;

        // Race between the worker settling and the deadline
        let settled = tokio::select! {
            outcome = rx => Some(outcome),
            _ = tokio::time::sleep_until(deadline) => None,
        };

        match settled {
            Some(Ok(Ok(Completion::Settled))) => {
                debug!(lines = output.len(), "javascript execution settled");
                Ok(())
            }
            Some(Ok(Ok(Completion::Pending))) => {
                // Nothing left can resolve the unit; it loses the race.
                tokio::time::sleep_until(deadline).await;
                Err(self.timed_out(&output, timeout))
            }
            Some(Ok(Err(e))) => Err(e),
            Some(Err(_)) => Err(SandboxError::ExecutionFailed(
                "worker exited without reporting an outcome".to_string(),
            )),
            None => Err(self.timed_out(&output, timeout)),
        }
    }

    fn timed_out(&self, output: &CapturedOutput, timeout: Duration) -> SandboxError {
        output.seal();
        warn!(
            timeout_ms = timeout.as_millis() as u64,
            discarded_lines = output.len(),
            "javascript execution timed out"
        );
        SandboxError::Timeout(timeout)
    }
}

impl Default for JsSandbox {
    fn default() -> Self {
        Self {
            config: SandboxConfig::default(),
        }
    }
}

/// Execute JavaScript with the default configuration.
pub async fn execute_javascript(source: &str) -> ExecutionResult {
    JsSandbox::default().execute(source).await
}
