//! # Introduction
//!
//! minic is the front end for a small C-like teaching language: a lexer that
//! turns source text into a token stream and a recursive descent parser that
//! turns tokens into an AST.  Neither stage aborts on bad input; both hand
//! back a complete result together with the [`Diagnostic`]s they collected.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser → AST + Diagnostics
//! ```
//!
//! 1. [`parser::lexer`]: tokenises the source; the token stream is exposed
//!    for tooling such as syntax highlighters.
//! 2. [`parser::parse`](mod@parser::parse): builds a [`Program`] with panic-mode recovery, so a
//!    broken construct yields one diagnostic rather than a cascade.
//! 3. [`parser::diagnostics`]: lexical, syntax and semantic diagnostics.
//!
//! ## Example
//!
//! ```
//! let output = minic::parse_source("int main() { return 1 + 2 * 3; }");
//! assert!(!output.has_errors());
//! assert_eq!(output.program.declarations[0].name(), "main");
//! ```
//!
//! Logging goes through [`tracing`]; no subscriber is installed here.

pub mod parser;

pub use parser::{
    parse, parse_source, parse_source_with, tokenize, Diagnostic, DiagnosticClass, ParseFailure,
    ParseOptions, ParseOutput, Parser, Program, Severity, Token, TokenKind,
};
