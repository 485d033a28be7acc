//! Denylist scan for source text that names restricted host capabilities.
//!
//! This is a usability heuristic, not a security boundary. It rejects the
//! obvious attempts early with a clear message; isolation comes from the
//! engine context only exposing allow-listed globals.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Identifier groups that are never allowed in submitted source.
const RESTRICTED_GROUPS: &[(Category, &[&str])] = &[
    (
        Category::BrowserGlobals,
        &["document", "window", "localStorage", "sessionStorage", "navigator"],
    ),
    (
        Category::Navigation,
        &["location", "history", "fetch", "XMLHttpRequest"],
    ),
    (
        Category::DynamicEvaluation,
        &["eval", "Function", "setTimeout", "setInterval"],
    ),
    (Category::FrameHierarchy, &["parent", "top", "frames", "opener"]),
    (
        Category::Storage,
        &["indexedDB", "webkitIndexedDB", "mozIndexedDB", "msIndexedDB"],
    ),
    (
        Category::ModuleSystem,
        &["require", "module", "exports", "__dirname", "__filename", "process"],
    ),
    (Category::Dialogs, &["alert", "confirm", "prompt"]),
];

/// Kind of capability a restricted identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Page and browser objects.
    BrowserGlobals,
    /// Navigation and network APIs.
    Navigation,
    /// Code evaluation and timers.
    DynamicEvaluation,
    /// References up or across the window hierarchy.
    FrameHierarchy,
    /// Persistent client-side storage.
    Storage,
    /// Reflective module and process access.
    ModuleSystem,
    /// User-interaction dialogs.
    Dialogs,
}

/// A restricted identifier found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedMatch {
    /// Capability group the identifier belongs to.
    pub category: Category,
    /// The identifier as written in the source.
    pub identifier: String,
}

/// The compiled, read-only pattern set.
#[derive(Debug)]
pub struct RestrictedPatterns {
    set: RegexSet,
    patterns: Vec<(Category, Regex)>,
}

impl RestrictedPatterns {
    fn compile() -> Self {
        let sources: Vec<String> = RESTRICTED_GROUPS
            .iter()
            .map(|(_, names)| word_pattern(names))
            .collect();
        let set = RegexSet::new(&sources).expect("restricted patterns are valid");
        let patterns = RESTRICTED_GROUPS
            .iter()
            .zip(&sources)
            .map(|((category, _), source)| {
                (*category, Regex::new(source).expect("restricted pattern is valid"))
            })
            .collect();
        Self { set, patterns }
    }

    /// Check if any restricted identifier occurs as a whole word.
    pub fn is_match(&self, source: &str) -> bool {
        self.set.is_match(source)
    }

    /// Find the restricted identifier from the first matching group.
    pub fn find(&self, source: &str) -> Option<RestrictedMatch> {
        let group = self.set.matches(source).into_iter().next()?;
        let (category, regex) = &self.patterns[group];
        let caps = regex.captures(source)?;
        Some(RestrictedMatch {
            category: *category,
            identifier: caps[1].to_string(),
        })
    }
}

/// Build a pattern matching any of `names` bounded by non-word characters or
/// the ends of the text. The boundary is ASCII-only, matching how browsers
/// define word characters for these checks.
fn word_pattern(names: &[&str]) -> String {
    format!(
        r"(?:^|[^A-Za-z0-9_])({})(?:[^A-Za-z0-9_]|$)",
        names.join("|")
    )
}

static PATTERNS: LazyLock<RestrictedPatterns> = LazyLock::new(RestrictedPatterns::compile);

/// The process-wide pattern set.
pub fn restricted_patterns() -> &'static RestrictedPatterns {
    &PATTERNS
}

/// Check if `source` references any restricted capability.
pub fn is_restricted(source: &str) -> bool {
    restricted_patterns().is_match(source)
}

/// Find the first restricted capability `source` references, if any.
pub fn find_restricted(source: &str) -> Option<RestrictedMatch> {
    restricted_patterns().find(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_whole_words() {
        assert!(is_restricted("window.alert(1)"));
        assert!(is_restricted("document"));
        assert!(is_restricted("const x = fetch('/api');"));
        assert!(is_restricted("new Function('return 1')"));
        assert!(is_restricted("eval(\"1\")"));
        assert!(is_restricted("setTimeout(() => {}, 0)"));
        assert!(is_restricted("top.location"));
        assert!(is_restricted("const fs = require('fs');"));
        assert!(is_restricted("process.exit(1)"));
        assert!(is_restricted("confirm('sure?')"));
        assert!(is_restricted("indexedDB.open('db')"));
    }

    #[test]
    fn test_ignores_substrings() {
        assert!(!is_restricted("const windowSize = 3;"));
        assert!(!is_restricted("let topScore = 10; let evaluate = 1;"));
        assert!(!is_restricted("const processed = [1, 2].map(x => x);"));
        assert!(!is_restricted("function alerted() {}"));
        assert!(!is_restricted("my_document"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!is_restricted("const Window = 1; const DOCUMENT = 2;"));
        // `function` the keyword is not `Function` the constructor.
        assert!(!is_restricted("async function run() { return 1; }"));
    }

    #[test]
    fn test_empty_source() {
        assert!(!is_restricted(""));
        assert!(find_restricted("").is_none());
    }

    #[test]
    fn test_dollar_is_a_boundary() {
        assert!(is_restricted("$window"));
    }

    #[test]
    fn test_find_reports_identifier() {
        let hit = find_restricted("const a = 1;\nlocalStorage.setItem('k', a);").unwrap();
        assert_eq!(hit.category, Category::BrowserGlobals);
        assert_eq!(hit.identifier, "localStorage");

        let hit = find_restricted("alert(1)").unwrap();
        assert_eq!(hit.category, Category::Dialogs);
        assert_eq!(hit.identifier, "alert");
    }
}
