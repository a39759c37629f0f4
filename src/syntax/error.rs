//! Lex and parse error types.
//!
//! Both carry spans relative to the block being compiled; the engine anchors them
//! in the full source before they reach the user.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::Span;

/// No lexer pattern matched at `span.start`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("unrecognized character sequence {snippet:?}")]
pub struct LexError {
    pub span: Span,
    pub snippet: String,
}

/// A grammar violation, aggregated over every alternative tried at the furthest
/// position the parser reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub span: Span,
    pub expected: BTreeSet<String>,
    pub found: String,
}

impl ParseError {
    /// "expected X" / "expected one of X, Y" label for diagnostics.
    pub fn expectation(&self) -> String {
        let items: Vec<&str> = self.expected.iter().map(String::as_str).collect();
        match items.as_slice() {
            [] => "unexpected input".to_string(),
            [only] => format!("expected {only}"),
            many => format!("expected one of {}", many.join(", ")),
        }
    }

    /// Hints for mistakes that are easy to make when coming from TypeScript.
    pub fn help(&self) -> Option<String> {
        if self
            .found
            .trim_start_matches('\'')
            .starts_with(|c: char| c.is_ascii_digit())
            && self.expected.contains("identifier")
        {
            return Some("names must start with a letter or '_'".to_string());
        }
        if self.found == "end of input" && self.expected.contains("'}'") {
            return Some("a block is missing its closing '}'".to_string());
        }
        None
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, found {}", self.expectation(), self.found)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_expectation_reads_naturally() {
        let err = ParseError {
            span: Span::new(7, 10),
            expected: ["identifier".to_string()].into_iter().collect(),
            found: "'123'".to_string(),
        };
        assert_eq!(err.to_string(), "expected identifier, found '123'");
    }

    #[test]
    fn alternatives_are_listed_in_order() {
        let err = ParseError {
            span: Span::default(),
            expected: ["'{'", "';'", "'<'"].iter().map(|s| s.to_string()).collect(),
            found: "end of input".to_string(),
        };
        assert_eq!(err.expectation(), "expected one of ';', '<', '{'");
    }
}
