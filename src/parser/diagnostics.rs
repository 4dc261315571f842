//! Diagnostic types shared by the lexer and the parser
//!
//! Nothing in the front-end aborts on bad input. Every problem is turned into
//! a [`Diagnostic`] and returned alongside whatever tokens or AST could be
//! built. The error kinds below are the closed set of things that can go wrong;
//! their `Display` text becomes the diagnostic message.

use crate::parser::ast::{Program, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticClass {
    /// Unexpected characters, unterminated strings and other scan problems
    Lexical,
    /// Grammar violations found by the parser
    Syntax,
    /// Well-formed but suspicious input (duplicate names); warnings only
    Semantic,
}

impl fmt::Display for DiagnosticClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticClass::Lexical => write!(f, "lexical"),
            DiagnosticClass::Syntax => write!(f, "syntax"),
            DiagnosticClass::Semantic => write!(f, "semantic"),
        }
    }
}

/// A single reported problem with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{severity}[{class}] at line {line}, column {column}: {message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub class: DiagnosticClass,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn error(class: DiagnosticClass, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            class,
            message: message.into(),
            line: location.line,
            column: location.column,
        }
    }

    pub fn warning(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            class: DiagnosticClass::Semantic,
            message: message.into(),
            line: location.line,
            column: location.column,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Problems found while scanning characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("integer literal '{lexeme}' is out of range")]
    IntegerOutOfRange { lexeme: String },

    #[error("unknown escape sequence '\\{ch}' in string literal")]
    UnknownEscape { ch: char },
}

/// Grammar violations found by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("comparison operators are non-associative; '{op}' cannot follow another comparison without parentheses")]
    ChainedComparison { op: String },

    #[error("left side of '=' must be a variable")]
    InvalidAssignmentTarget,

    #[error("switch statement needs at least one 'case' or 'default' clause")]
    EmptySwitch,

    #[error("nesting is deeper than the limit of {limit}")]
    NestingTooDeep { limit: usize },
}

/// A syntax error with the position it was detected at.
///
/// Parse routines return this through `?`; it is converted into a
/// [`Diagnostic`] at the nearest statement or declaration boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Diagnostic::error(DiagnosticClass::Syntax, err.kind.to_string(), err.location)
    }
}

/// Returned by [`ParseOutput::into_result`](crate::parser::ParseOutput::into_result)
/// when the source had at least one error.
#[derive(Debug, Error)]
#[error("{} error(s), first: {}", error_count(.diagnostics), first_error(.diagnostics))]
pub struct ParseFailure {
    /// Every diagnostic, warnings included, in source order
    pub diagnostics: Vec<Diagnostic>,
    /// Whatever the parser managed to build
    pub partial: Program,
}

fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .find(|d| d.is_error())
        .map(ToString::to_string)
        .unwrap_or_default()
}
