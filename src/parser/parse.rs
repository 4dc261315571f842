//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including options, helper methods, error recovery, and the main parse entry
//! point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `declarations`: Parsing variable, struct and function declarations
//! - `statements`: Parsing statements (if, while, for, etc.)
//! - `expressions`: Parsing expressions with precedence climbing
//!
//! # Error recovery
//!
//! Parse routines return `Result<_, SyntaxError>` and bail out with `?` on the
//! first mismatch. The error is caught only at statement and declaration
//! boundaries, recorded as a [`Diagnostic`], and the parser then skips tokens
//! until a synchronizing token (`;`, `}`, or a keyword that starts a new
//! construct). This keeps a broken construct to a single diagnostic.

use crate::parser::ast::*;
use crate::parser::diagnostics::{Diagnostic, SyntaxError, SyntaxErrorKind};
use crate::parser::lexer::{Keyword, Lexer, Punctuation, Token, TokenKind};
use tracing::{debug, trace};

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest nesting of blocks and expressions before a diagnostic is
    /// reported instead of recursing further
    pub max_nesting_depth: usize,
    /// Stop parsing at the next declaration boundary once this many
    /// diagnostics were recorded; later diagnostics are dropped
    pub max_diagnostics: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
            max_diagnostics: None,
        }
    }
}

/// Where a recovery should stop skipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncLevel {
    Declaration,
    Statement,
}

/// Recursive descent parser for minic
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) options: ParseOptions,
    pub(crate) depth: usize,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it. Lexical diagnostics are kept
    /// and returned together with the syntax diagnostics.
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        let mut parser = Self::from_tokens(tokens);
        parser.diagnostics = lexer.into_diagnostics();
        parser
    }

    /// Parse an already materialized token stream. A missing trailing
    /// `EndOfFile` token is supplied.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let end = tokens.last().map(Token::end_location).unwrap_or(SourceLocation::new(1, 1));
            tokens.push(Token {
                kind: TokenKind::EndOfFile,
                lexeme: String::new(),
                line: end.line,
                column: end.column,
                literal: None,
                malformed: false,
            });
        }
        Self {
            tokens,
            position: 0,
            diagnostics: Vec::new(),
            options: ParseOptions::default(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse the entire program (top-level declarations)
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.is_at_end() && !self.diagnostic_limit_reached() {
            let start = self.position;
            match self.parse_declaration() {
                Ok(decl) => program.declarations.push(decl),
                Err(err) => {
                    self.report(err);
                    self.synchronize(start, SyncLevel::Declaration);
                }
            }
        }

        self.check_duplicate_declarations(&program);

        debug!(
            declarations = program.declarations.len(),
            diagnostics = self.diagnostics.len(),
            "parsed program"
        );
        program
    }

    /// All diagnostics so far, lexical and syntax, in source order
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.sort_by_key(|d| (d.line, d.column));
        diagnostics
    }

    /// The token stream this parser reads; never modified by parsing
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    // ===== Diagnostics and recovery =====

    /// Record a syntax error without unwinding
    pub(crate) fn report(&mut self, err: SyntaxError) {
        debug!(line = err.location.line, column = err.location.column, error = %err, "syntax diagnostic");
        self.push_diagnostic(err.into());
    }

    pub(crate) fn warn(&mut self, message: String, location: SourceLocation) {
        debug!(line = location.line, column = location.column, %message, "warning");
        self.push_diagnostic(Diagnostic::warning(message, location));
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostic_limit_reached() {
            self.diagnostics.push(diagnostic);
        }
    }

    pub(crate) fn diagnostic_limit_reached(&self) -> bool {
        self.options
            .max_diagnostics
            .is_some_and(|max| self.diagnostics.len() >= max)
    }

    /// Panic-mode recovery: skip tokens until a synchronizing point.
    ///
    /// Always consumes at least one token when nothing was consumed since
    /// `start`, so a failing construct can never be retried forever. Braces
    /// opened while skipping are skipped as a whole.
    pub(crate) fn synchronize(&mut self, start: usize, level: SyncLevel) {
        let skip_from = self.position;
        if self.position == start && !self.is_at_end() && !self.check_punct(Punctuation::LBrace) {
            self.advance();
        }

        let mut brace_depth = 0usize;
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Punctuation(Punctuation::LBrace) => brace_depth += 1,
                TokenKind::Punctuation(Punctuation::RBrace) if brace_depth > 0 => {
                    brace_depth -= 1;
                    if brace_depth == 0 {
                        self.advance();
                        break;
                    }
                }
                TokenKind::Punctuation(Punctuation::RBrace) => {
                    // A block-level recovery leaves the brace to close the block
                    if level == SyncLevel::Declaration {
                        self.advance();
                    }
                    break;
                }
                TokenKind::Punctuation(Punctuation::Semicolon) if brace_depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::Keyword(kw) if brace_depth == 0 && self.starts_construct(kw, level) => break,
                _ => {}
            }
            self.advance();
        }

        debug!(skipped = self.position - skip_from, ?level, "synchronized");
    }

    fn starts_construct(&self, kw: Keyword, level: SyncLevel) -> bool {
        let starts_declaration = kw.is_type() || kw == Keyword::Struct;
        match level {
            SyncLevel::Declaration => starts_declaration,
            SyncLevel::Statement => {
                starts_declaration
                    || matches!(
                        kw,
                        Keyword::If
                            | Keyword::While
                            | Keyword::For
                            | Keyword::Switch
                            | Keyword::Return
                            | Keyword::Break
                            | Keyword::Continue
                            | Keyword::Case
                            | Keyword::Default
                    )
            }
        }
    }

    /// Run `f` one nesting level deeper, failing once the configured depth is
    /// exceeded
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        self.ensure_depth(0)?;
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Fail with `NestingTooDeep` if `extra` more levels on top of the
    /// current depth would reach the limit. Loops that deepen the tree
    /// without recursing (postfix and binary chains) count their levels here.
    pub(crate) fn ensure_depth(&self, extra: usize) -> Result<(), SyntaxError> {
        if self.depth + extra >= self.options.max_nesting_depth {
            return Err(SyntaxError::new(
                SyntaxErrorKind::NestingTooDeep {
                    limit: self.options.max_nesting_depth,
                },
                self.current_location(),
            ));
        }
        Ok(())
    }

    // ===== Helper methods =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        match self.peek().kind {
            TokenKind::Keyword(kw) => kw.is_type() || kw == Keyword::Struct,
            _ => false,
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn check_punct(&self, punct: Punctuation) -> bool {
        self.check(TokenKind::Punctuation(punct))
    }

    pub(crate) fn check_keyword(&self, kw: Keyword) -> bool {
        self.check(TokenKind::Keyword(kw))
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_punct(&mut self, punct: Punctuation) -> bool {
        self.match_token(TokenKind::Punctuation(punct))
    }

    pub(crate) fn match_keyword(&mut self, kw: Keyword) -> bool {
        self.match_token(TokenKind::Keyword(kw))
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            let token = &self.tokens[self.position];
            trace!(pos = self.position, kind = ?token.kind, line = token.line, column = token.column, "advance");
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: SourceLocation) -> Span {
        let end = if self.position == 0 {
            start
        } else {
            self.previous().end_location()
        };
        Span::new(start, end)
    }

    /// Error for "expected X" at the current token
    pub(crate) fn error_expected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        let kind = if token.is_eof() {
            SyntaxErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            SyntaxErrorKind::Expected {
                expected: expected.to_string(),
                found: token.to_string(),
            }
        };
        SyntaxError::new(kind, token.location())
    }

    pub(crate) fn expect_punct(&mut self, punct: Punctuation, ctx: &str) -> Result<(), SyntaxError> {
        if self.match_punct(punct) {
            Ok(())
        } else {
            Err(self.error_expected(&format!("'{}' {}", punct.as_char(), ctx)))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), SyntaxError> {
        self.expect_punct(Punctuation::Semicolon, ctx)
    }

    /// Expect a name. `main` is a keyword but is accepted wherever a name is.
    pub(crate) fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Main) => {
                Ok(self.advance().lexeme.clone())
            }
            _ => Err(self.error_expected("identifier")),
        }
    }
}
