//! Prelude module for convenient imports.

pub use crate::error::{Result, SandboxError};
pub use crate::protocol::{ExecutionRequest, ExecutionResult, Language, Rendered};
pub use crate::python::simulate_python;
pub use crate::runner::{CodeRunner, RunnerConfig};
pub use crate::sandbox::{
    config::SandboxConfig,
    executor::{execute_javascript, JsSandbox},
};
