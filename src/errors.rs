//! Britescript Error Handling
//!
//! Every failure that escapes the compiler surfaces as a [`CompileError`]. Stage-local
//! errors ([`LexError`], [`ParseError`], [`TransformError`]) stay small and carry
//! block-relative spans; the engine lifts them into a `CompileError` through an
//! [`ErrorReporting`] context that knows where the block sits in the full source.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::syntax::error::{LexError, ParseError};
use crate::syntax::Span;
use crate::transform::TransformError;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named source text used to anchor diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => offset - nl,
            None => offset + 1,
        };
        (line, column)
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::from_file("<input>", "")
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("lex error: {0}")]
    Lex(LexError),
    #[error("parse error: {0}")]
    Parse(ParseError),
    #[error("transform error: {0}")]
    Transform(TransformError),
    #[error("cannot access '{path}': {message}")]
    Io { path: String, message: String },
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("runtime failure: {message}")]
    Runtime { message: String },
}

impl ErrorKind {
    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::Lex(_) => "lex",
            Self::Parse(_) => "parse",
            Self::Transform(_) => "transform",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
            Self::Runtime { .. } => "runtime",
        }
    }

    fn primary_label(&self) -> String {
        match self {
            Self::Lex(_) => "unrecognized input".into(),
            Self::Parse(e) => e.expectation(),
            Self::Transform(e) => format!("unexpected {} shape", e.rule),
            Self::Io { .. } => "i/o failure".into(),
            Self::Config { .. } => "invalid value".into(),
            Self::Runtime { .. } => "runtime failure".into(),
        }
    }
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub line: usize,
    pub column: usize,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// The single error type returned by `compile()` and every collaborator.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub source_info: SourceInfo,
    pub diagnostic_info: DiagnosticInfo,
}

impl CompileError {
    /// 1-based line of the offending position.
    pub fn line(&self) -> usize {
        self.source_info.line
    }

    /// 1-based column of the offending position.
    pub fn column(&self) -> usize {
        self.source_info.column
    }

    /// Human-readable message without the location prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse(_))
    }

    pub fn is_lex_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Lex(_))
    }

    /// Error for a file that could not be read or written.
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        let path = path.into();
        Self::unanchored(
            ErrorKind::Io {
                path: path.clone(),
                message: err.to_string(),
            },
            &path,
        )
    }

    /// Error for a configuration file that failed to load.
    pub fn config(path: &str, message: impl Into<String>) -> Self {
        Self::unanchored(
            ErrorKind::Config {
                message: message.into(),
            },
            path,
        )
    }

    /// Error raised while executing generated code.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::unanchored(
            ErrorKind::Runtime {
                message: message.into(),
            },
            "<runtime>",
        )
    }

    /// Errors not tied to a source location (I/O, configuration, runtime).
    fn unanchored(kind: ErrorKind, name: &str) -> Self {
        let error_code = format!("britescript::{}", kind.code_suffix());
        Self {
            kind,
            source_info: SourceInfo {
                source: Arc::new(NamedSource::new(name, String::new())),
                primary_span: unspanned(),
                line: 1,
                column: 0,
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }

    /// Attach a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }
}

impl std::error::Error for CompileError {}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Lex(_) | ErrorKind::Parse(_) | ErrorKind::Transform(_) => write!(
                f,
                "Britescript compilation error at line {}: {}",
                self.source_info.line, self.kind
            ),
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl Diagnostic for CompileError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if matches!(
            self.kind,
            ErrorKind::Io { .. } | ErrorKind::Config { .. } | ErrorKind::Runtime { .. }
        ) {
            return None;
        }
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

// ============================================================================
// ERROR REPORTING CONTEXTS
// ============================================================================

/// Context-aware error creation: each context knows how to anchor block-relative spans.
pub trait ErrorReporting {
    /// Create an error at a block-relative span.
    fn report(&self, kind: ErrorKind, span: Span) -> CompileError;

    fn lex_error(&self, err: LexError) -> CompileError {
        let span = err.span;
        self.report(ErrorKind::Lex(err), span)
    }

    fn parse_error(&self, err: ParseError) -> CompileError {
        let span = err.span;
        let help = err.help();
        let error = self.report(ErrorKind::Parse(err), span);
        match help {
            Some(help) => error.with_help(help),
            None => error,
        }
    }

    /// Transform errors mean the parser and transformer disagree on a CST shape.
    fn transform_error(&self, err: TransformError) -> CompileError {
        let span = err.span;
        self.report(ErrorKind::Transform(err), span)
            .with_help("This is an internal compiler error. Please report it as a bug.")
    }
}

/// Reports errors for one DSL block inside a larger source file.
pub struct BlockContext<'a> {
    pub source: &'a SourceContext,
    pub start_offset: usize,
}

impl<'a> BlockContext<'a> {
    pub fn new(source: &'a SourceContext, start_offset: usize) -> Self {
        Self {
            source,
            start_offset,
        }
    }
}

impl ErrorReporting for BlockContext<'_> {
    fn report(&self, kind: ErrorKind, span: Span) -> CompileError {
        let start = self.start_offset + span.start;
        let len = span.len().max(1);
        let (line, column) = self.source.line_col(start);
        let error_code = format!("britescript::{}", kind.code_suffix());

        CompileError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: SourceSpan::from(start..start + len),
                line,
                column,
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

/// Creates a placeholder span for errors not tied to a specific source code
/// location, such as I/O errors or configuration failures.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Prints a CompileError with full miette diagnostics
pub fn print_error(error: CompileError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let source = SourceContext::from_file("t.bs", "ab\ncd\nef");
        assert_eq!(source.line_col(0), (1, 1));
        assert_eq!(source.line_col(4), (2, 2));
        assert_eq!(source.line_col(6), (3, 1));
    }

    #[test]
    fn block_context_offsets_spans() {
        let source = SourceContext::from_file("t.bs", "const a = 1;\nstruct 1 {}\n");
        let ctx = BlockContext::new(&source, 13);
        let err = ctx.lex_error(LexError {
            span: Span { start: 7, end: 8 },
            snippet: "1".into(),
        });
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 8);
        assert_eq!(err.source_info.primary_span, SourceSpan::from(20..21));
        assert!(err.to_string().starts_with("Britescript compilation error at line 2"));
    }

    #[test]
    fn io_errors_have_no_label() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = CompileError::io("nope.bs", &io);
        assert!(err.labels().is_none());
        assert_eq!(err.diagnostic_info.error_code, "britescript::io");
    }
}
