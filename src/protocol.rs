//! The request and result shapes shared by every executor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder shown when an execution succeeded but printed nothing.
pub const NO_OUTPUT: &str = "No output";

/// Language a snippet was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    /// Executed in the JavaScript sandbox.
    JavaScript,
    /// Handled by the print-statement simulator.
    Python,
    /// Anything else; never executed.
    Other(String),
}

impl Language {
    /// Map a declared language name onto a [`Language`].
    ///
    /// Only the exact names `javascript` and `python` are executable.
    pub fn parse(name: &str) -> Self {
        match name {
            "javascript" => Language::JavaScript,
            "python" => Language::Python,
            other => Language::Other(other.to_string()),
        }
    }

    /// The declared name of the language.
    pub fn as_str(&self) -> &str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Other(name) => name,
        }
    }

    /// Whether snippets in this language can be run at all.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Other(_))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Language {
    fn from(name: &str) -> Self {
        Language::parse(name)
    }
}

/// A single "Run" action: the source text and its declared language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// The untrusted source text.
    pub source: String,
    /// The declared language.
    pub language: Language,
}

impl ExecutionRequest {
    /// Create a new request.
    pub fn new(source: impl Into<String>, language: impl Into<Language>) -> Self {
        Self {
            source: source.into(),
            language: language.into(),
        }
    }
}

/// Outcome of one execution.
///
/// Normally exactly one of `result` and `error` is set. An empty `result`
/// means the snippet ran and printed nothing, which is distinct from `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The captured output transcript.
    pub result: Option<String>,
    /// A failure message; takes precedence over `result` for display.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A successful result carrying the output transcript.
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            result: Some(text.into()),
            error: None,
        }
    }

    /// A failed result carrying the error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }

    /// Check if the execution produced no error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Decide what should be shown for this result.
    pub fn render(&self) -> Rendered {
        match (&self.error, &self.result) {
            (Some(error), _) => Rendered::Error(error.clone()),
            (None, Some(output)) if !output.is_empty() => Rendered::Output(output.clone()),
            (None, _) => Rendered::Output(NO_OUTPUT.to_string()),
        }
    }
}

/// What the presentation layer displays for a settled execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// An output transcript block.
    Output(String),
    /// A highlighted error block.
    Error(String),
}

impl Rendered {
    /// The text of the block, whichever kind it is.
    pub fn text(&self) -> &str {
        match self {
            Rendered::Output(text) | Rendered::Error(text) => text,
        }
    }

    /// Check if this is an error block.
    pub fn is_error(&self) -> bool {
        matches!(self, Rendered::Error(_))
    }
}
