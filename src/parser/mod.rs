//! minic source code parser
//!
//! This module transforms minic source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`](mod@parse): Parser coordinator (tokens → AST)
//! - `declarations`, `statements`, `expressions`: grammar productions
//! - [`ast`]: AST node definitions
//! - [`diagnostics`]: lexical, syntax and semantic diagnostics
//!
//! # Supported language
//!
//! - Types: `int`, `float`, `double`, `boolean`, `char`, `void`, `struct Name`
//! - Declarations: globals, fixed-size arrays, functions, struct definitions
//! - Statements: blocks, `if`/`else`, `while`, `for`, `switch`/`case`,
//!   `break`, `continue`, `return`, expression statements
//! - Expressions: arithmetic, comparison, logical, unary, postfix `++`/`--`,
//!   assignment, function calls
//! - No preprocessor, pointers, or casts
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.
//!
//! Neither stage stops at the first problem: both always hand back a
//! complete result plus the diagnostics collected on the way.

pub mod ast;
mod declarations;
pub mod diagnostics;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

use serde::{Deserialize, Serialize};

pub use ast::Program;
pub use diagnostics::{Diagnostic, DiagnosticClass, ParseFailure, Severity};
pub use lexer::{tokenize, Token, TokenKind};
pub use parse::{ParseOptions, Parser};

/// Everything one parse produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub program: Program,
    /// The full token stream, `EndOfFile` included
    pub tokens: Vec<Token>,
    /// Lexical, syntax and semantic diagnostics in source order
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    /// True if any diagnostic has error severity
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// The program if the source was free of errors. Warnings are ignored.
    pub fn into_result(self) -> Result<Program, ParseFailure> {
        if self.has_errors() {
            Err(ParseFailure {
                diagnostics: self.diagnostics,
                partial: self.program,
            })
        } else {
            Ok(self.program)
        }
    }
}

/// Parse a token stream produced by [`tokenize`].
///
/// Only syntax and semantic diagnostics are returned; the lexical ones were
/// already handed out by `tokenize`.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::from_tokens(tokens);
    let program = parser.parse_program();
    (program, parser.take_diagnostics())
}

/// Tokenize and parse `source` with default options
pub fn parse_source(source: &str) -> ParseOutput {
    parse_source_with(source, ParseOptions::default())
}

/// Tokenize and parse `source`
pub fn parse_source_with(source: &str, options: ParseOptions) -> ParseOutput {
    let mut parser = Parser::new(source).with_options(options);
    let program = parser.parse_program();
    let diagnostics = parser.take_diagnostics();
    ParseOutput {
        program,
        tokens: parser.into_tokens(),
        diagnostics,
    }
}
