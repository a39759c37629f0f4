//! Syntax module for Britescript
//!
//! Lexing and parsing of DSL blocks. The lexer turns block text into a flat token
//! stream; the parser consumes that stream and builds a concrete syntax tree with one
//! node per grammar rule invocation.

use serde::{Deserialize, Serialize};

pub mod cst;
pub mod error;
pub mod lexer;
pub mod parser;

pub use cst::{CstElement, CstNode, Rule};
pub use error::{LexError, ParseError};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;

/// Represents a byte span in the text of a code block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}
