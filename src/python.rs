//! Print-statement simulation for Python snippets.
//!
//! This is not an interpreter. It scrapes `print(...)` call shapes out of the
//! source and echoes their argument text: quoted string literals lose their
//! quotes, anything else (variables, expressions) is printed as written.

use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::ExecutionResult;

/// Banner that opens every simulated transcript.
pub const SIMULATION_BANNER: &str = "Python execution simulation:\n\n";

/// Line emitted when the source contains no print calls.
pub const NO_PRINT_STATEMENTS: &str = "No print statements found.";

// Non-greedy and single-line, so `print("a(b)")` captures `"a(b"`.
static PRINT_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"print\s*\((.*?)\)").expect("print pattern is valid"));

/// Simulate running `source` as Python.
///
/// Always returns a result and never an error.
pub fn simulate_python(source: &str) -> ExecutionResult {
    let lines: Vec<&str> = PRINT_CALL
        .captures_iter(source)
        .map(|caps| caps.get(1).map_or("", |m| strip_quotes(m.as_str().trim())))
        .collect();

    let body = if lines.is_empty() {
        NO_PRINT_STATEMENTS.to_string()
    } else {
        lines.join("\n")
    };

    ExecutionResult::output(format!("{SIMULATION_BANNER}{body}"))
}

/// Drop one pair of matching single or double quotes around `text`.
fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.starts_with(quote) && text.ends_with(quote) {
            // A lone quote character both starts and ends the text.
            return text.get(1..text.len().saturating_sub(1)).unwrap_or("");
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(source: &str) -> String {
        simulate_python(source).result.unwrap()
    }

    #[test]
    fn test_string_literal() {
        let result = simulate_python("print('hello')");
        assert_eq!(
            result.result.as_deref(),
            Some("Python execution simulation:\n\nhello")
        );
        assert!(result.error.is_none());
    }

    #[test]
    fn test_no_print_statements() {
        assert_eq!(
            transcript("x = 5"),
            "Python execution simulation:\n\nNo print statements found."
        );
        assert_eq!(
            transcript(""),
            "Python execution simulation:\n\nNo print statements found."
        );
    }

    #[test]
    fn test_multiple_prints_keep_order() {
        let source = "print(\"first\")\nx = 3\nprint( 'second' )\nprint(x)";
        assert_eq!(
            transcript(source),
            "Python execution simulation:\n\nfirst\nsecond\nx"
        );
    }

    #[test]
    fn test_expressions_are_not_evaluated() {
        assert_eq!(
            transcript("print(1 + 1)"),
            "Python execution simulation:\n\n1 + 1"
        );
        assert_eq!(
            transcript("print(f\"{name}\")"),
            "Python execution simulation:\n\nf\"{name}\""
        );
    }

    #[test]
    fn test_nested_parentheses_stop_at_first_close() {
        assert_eq!(
            transcript("print(\"a(b)\")"),
            "Python execution simulation:\n\n\"a(b"
        );
    }

    #[test]
    fn test_mismatched_quotes_are_kept() {
        assert_eq!(
            transcript("print(\"mixed')"),
            "Python execution simulation:\n\n\"mixed'"
        );
    }

    #[test]
    fn test_degenerate_arguments() {
        assert_eq!(transcript("print()"), "Python execution simulation:\n\n");
        assert_eq!(transcript("print(\")"), "Python execution simulation:\n\n");
        assert_eq!(transcript("print('')"), "Python execution simulation:\n\n");
    }

    #[test]
    fn test_print_inside_identifier_still_matches() {
        assert_eq!(
            transcript("blueprint('x')"),
            "Python execution simulation:\n\nx"
        );
    }
}
