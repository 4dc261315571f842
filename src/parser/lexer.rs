//! Lexer (tokenizer) for minic source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! The lexer never stops on bad input: an unexpected character is reported and
//! skipped, an unterminated string is reported and still emitted (flagged as
//! malformed) so the parser can keep going. The stream always ends with exactly
//! one [`TokenKind::EndOfFile`] token.
//!
//! [`Lexer`] is an [`Iterator`], so tokens can be pulled lazily; restarting means
//! building a new lexer over the same source.

use super::ast::{LiteralValue, SourceLocation, Span};
use super::diagnostics::{Diagnostic, DiagnosticClass, LexErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Reserved words. Matched only after a full identifier scan, so `integer`
/// stays an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Int,
    Else,
    If,
    While,
    Float,
    Double,
    Boolean,
    Char,
    Void,
    Return,
    For,
    Struct,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Main,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "int" => Keyword::Int,
            "else" => Keyword::Else,
            "if" => Keyword::If,
            "while" => Keyword::While,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "boolean" => Keyword::Boolean,
            "char" => Keyword::Char,
            "void" => Keyword::Void,
            "return" => Keyword::Return,
            "for" => Keyword::For,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "default" => Keyword::Default,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "main" => Keyword::Main,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Int => "int",
            Keyword::Else => "else",
            Keyword::If => "if",
            Keyword::While => "while",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::Boolean => "boolean",
            Keyword::Char => "char",
            Keyword::Void => "void",
            Keyword::Return => "return",
            Keyword::For => "for",
            Keyword::Struct => "struct",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Default => "default",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Main => "main",
        }
    }

    /// Keywords that name a built-in type (`struct` is handled separately).
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Keyword::Int
                | Keyword::Float
                | Keyword::Double
                | Keyword::Boolean
                | Keyword::Char
                | Keyword::Void
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    AndAnd,     // &&
    OrOr,       // ||
    Le,         // <=
    Ge,         // >=
    EqEq,       // ==
    NotEq,      // !=
    PlusPlus,   // ++
    MinusMinus, // --
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Eq,         // =
    Percent,    // %
    Amp,        // &
    Pipe,       // |
    Bang,       // !
    Lt,         // <
    Gt,         // >
}

/// Operator spellings in match priority order: every two-character operator
/// comes before any single-character prefix of it.
const OPERATORS: &[(&str, Operator)] = &[
    ("&&", Operator::AndAnd),
    ("||", Operator::OrOr),
    ("<=", Operator::Le),
    (">=", Operator::Ge),
    ("==", Operator::EqEq),
    ("!=", Operator::NotEq),
    ("++", Operator::PlusPlus),
    ("--", Operator::MinusMinus),
    ("+", Operator::Plus),
    ("-", Operator::Minus),
    ("*", Operator::Star),
    ("/", Operator::Slash),
    ("=", Operator::Eq),
    ("%", Operator::Percent),
    ("&", Operator::Amp),
    ("|", Operator::Pipe),
    ("!", Operator::Bang),
    ("<", Operator::Lt),
    (">", Operator::Gt),
];

impl Operator {
    pub fn as_str(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(text, _)| *text)
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punctuation {
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,
    Colon,     // :
}

impl Punctuation {
    fn from_char(ch: char) -> Option<Punctuation> {
        let punct = match ch {
            '(' => Punctuation::LParen,
            ')' => Punctuation::RParen,
            '{' => Punctuation::LBrace,
            '}' => Punctuation::RBrace,
            '[' => Punctuation::LBracket,
            ']' => Punctuation::RBracket,
            ';' => Punctuation::Semicolon,
            ',' => Punctuation::Comma,
            ':' => Punctuation::Colon,
            _ => return None,
        };
        Some(punct)
    }

    pub fn as_char(self) -> char {
        match self {
            Punctuation::LParen => '(',
            Punctuation::RParen => ')',
            Punctuation::LBrace => '{',
            Punctuation::RBrace => '}',
            Punctuation::LBracket => '[',
            Punctuation::RBracket => ']',
            Punctuation::Semicolon => ';',
            Punctuation::Comma => ',',
            Punctuation::Colon => ':',
        }
    }
}

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    Keyword(Keyword),
    Operator(Operator),
    Punctuation(Punctuation),
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::IntLiteral => write!(f, "integer literal"),
            TokenKind::FloatLiteral => write!(f, "float literal"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Operator(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Punctuation(p) => write!(f, "'{}'", p.as_char()),
            TokenKind::EndOfFile => write!(f, "end of input"),
        }
    }
}

/// A classified lexeme with its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text the token was matched from
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    /// Decoded value for numeric and string literals
    pub literal: Option<LiteralValue>,
    /// Set on best-effort tokens emitted after a lexical diagnostic
    pub malformed: bool,
}

impl Token {
    /// Returns the source location where this token starts.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Location one column past the last character. Tokens never span lines.
    pub fn end_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column + self.lexeme.chars().count())
    }

    pub fn span(&self) -> Span {
        Span::new(self.location(), self.end_location())
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfFile
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                write!(f, "{} {}", self.kind, self.lexeme)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Lexer for minic source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    diagnostics: Vec<Diagnostic>,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Tokenize the remaining input, ending with the `EndOfFile` token
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    /// Lexical diagnostics reported so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Scan the next token. Returns `EndOfFile` once input is exhausted.
    fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            let start = self.position;
            let loc = self.current_location();
            let Some(ch) = self.peek() else {
                return self.make_token(TokenKind::EndOfFile, start, loc, None);
            };

            match ch {
                'a'..='z' | 'A'..='Z' | '_' => return self.identifier_or_keyword(),
                '0'..='9' => return self.number_literal(),
                '"' => return self.string_literal(),
                _ => {}
            }

            if let Some(op) = self.match_operator() {
                return self.make_token(TokenKind::Operator(op), start, loc, None);
            }

            if let Some(punct) = Punctuation::from_char(ch) {
                self.advance();
                return self.make_token(TokenKind::Punctuation(punct), start, loc, None);
            }

            // Unknown character: report it, skip it and keep scanning
            self.advance();
            self.report(
                LexErrorKind::UnexpectedCharacter {
                    ch,
                    line: loc.line,
                    column: loc.column,
                },
                loc,
            );
        }
    }

    fn make_token(
        &self,
        kind: TokenKind,
        start: usize,
        loc: SourceLocation,
        literal: Option<LiteralValue>,
    ) -> Token {
        Token {
            kind,
            lexeme: self.input[start..self.position].iter().collect(),
            line: loc.line,
            column: loc.column,
            literal,
            malformed: false,
        }
    }

    fn report(&mut self, kind: LexErrorKind, location: SourceLocation) {
        debug!(line = location.line, column = location.column, error = %kind, "lexical diagnostic");
        self.diagnostics
            .push(Diagnostic::error(DiagnosticClass::Lexical, kind.to_string(), location));
    }

    /// Try the operator table at the current position, longest spelling first
    fn match_operator(&mut self) -> Option<Operator> {
        let (text, op) = OPERATORS.iter().find(|(text, _)| {
            text.chars()
                .enumerate()
                .all(|(i, c)| self.peek_ahead(i) == Some(c))
        })?;
        for _ in 0..text.len() {
            self.advance();
        }
        Some(*op)
    }

    /// Parse string literal. Stops at the closing quote, or at end of line /
    /// end of input, in which case the partial text is still returned.
    fn string_literal(&mut self) -> Token {
        let start = self.position;
        let loc = self.current_location();
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return self.make_token(TokenKind::StringLiteral, start, loc, Some(LiteralValue::Str(value)));
                }
                None | Some('\n') => break,
                Some('\\') => {
                    let escape_loc = self.current_location();
                    match self.peek_ahead(1) {
                        None | Some('\n') => {
                            // A trailing backslash belongs to the partial text
                            self.advance();
                            value.push('\\');
                            break;
                        }
                        Some(escaped) => {
                            self.advance();
                            self.advance();
                            match escaped {
                                '"' => value.push('"'),
                                '\\' => value.push('\\'),
                                'n' => value.push('\n'),
                                't' => value.push('\t'),
                                other => {
                                    self.report(LexErrorKind::UnknownEscape { ch: other }, escape_loc);
                                    value.push('\\');
                                    value.push(other);
                                }
                            }
                        }
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        self.report(LexErrorKind::UnterminatedString, loc);
        let mut token = self.make_token(TokenKind::StringLiteral, start, loc, Some(LiteralValue::Str(value)));
        token.malformed = true;
        token
    }

    /// Parse numeric literal. The integer part is not committed until we know
    /// whether a `.digit` fraction follows.
    fn number_literal(&mut self) -> Token {
        let start = self.position;
        let loc = self.current_location();

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let is_float = self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance(); // '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text: String = self.input[start..self.position].iter().collect();

        if is_float {
            // Digits-dot-digits always parses; overflow becomes infinity
            let value = text.parse::<f64>().unwrap_or(f64::INFINITY);
            return self.make_token(TokenKind::FloatLiteral, start, loc, Some(LiteralValue::Float(value)));
        }

        match text.parse::<i64>() {
            Ok(value) => self.make_token(TokenKind::IntLiteral, start, loc, Some(LiteralValue::Int(value))),
            Err(_) => {
                self.report(LexErrorKind::IntegerOutOfRange { lexeme: text }, loc);
                let mut token = self.make_token(TokenKind::IntLiteral, start, loc, Some(LiteralValue::Int(i64::MAX)));
                token.malformed = true;
                token
            }
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self) -> Token {
        let start = self.position;
        let loc = self.current_location();

        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }

        let word: String = self.input[start..self.position].iter().collect();
        let kind = match Keyword::lookup(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        };
        self.make_token(kind, start, loc, None)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_ahead(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return;
            }
            self.advance();
        }

        self.report(LexErrorKind::UnterminatedComment, start_loc);
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        trace!(kind = ?token.kind, line = token.line, column = token.column, "token");
        if token.is_eof() {
            self.finished = true;
        }
        Some(token)
    }
}

/// Tokenize a whole source string.
///
/// The token vector always ends with a single `EndOfFile` token; lexical
/// diagnostics are returned in source order.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    (tokens, lexer.into_diagnostics())
}
