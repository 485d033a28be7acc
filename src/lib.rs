//! # Snippet Sandbox
//!
//! Time-bounded execution of untrusted code snippets with captured output.
//!
//! JavaScript runs on the Boa engine in a fresh context per execution, on its
//! own worker thread. Python is not executed: its `print(...)` calls are
//! scraped and echoed as a clearly labelled simulation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use snippet_sandbox::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SandboxConfig::builder()
//!         .timeout(Duration::from_secs(3))
//!         .build();
//!
//!     let sandbox = JsSandbox::new(config)?;
//!     let result = sandbox.execute("console.log(1 + 1)").await;
//!
//!     assert_eq!(result.result.as_deref(), Some("2"));
//!     assert!(result.is_success());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Security Model
//!
//! 1. **Denylist scan**: source naming browser, network, storage, timer,
//!    evaluation or module-system capabilities is rejected before it runs.
//!    This is a heuristic that catches honest mistakes, not a boundary.
//! 2. **Capability allow-list**: every global outside a curated list is
//!    deleted from the context; `console` only offers `log`.
//! 3. **Per-execution output**: each run writes into its own buffer, which
//!    is sealed once the run is over.
//! 4. **Soft deadline**: a run that has not settled after the timeout is
//!    reported as timed out. A synchronous loop is not preempted; configure
//!    an engine loop limit to bound it.

pub mod error;
pub mod prelude;
pub mod protocol;
pub mod python;
pub mod runner;
pub mod sandbox;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use protocol::{ExecutionRequest, ExecutionResult, Language, Rendered};
pub use python::simulate_python;
pub use runner::{CodeRunner, RunnerConfig, RunnerConfigBuilder};
pub use sandbox::capture::{with_captured_output, CapturedOutput};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::detector::{find_restricted, is_restricted, RestrictedMatch};
pub use sandbox::executor::{execute_javascript, JsSandbox};
