//! Declaration parsing implementation
//!
//! This module handles parsing of top-level declarations:
//!
//! - Variable declarations: `int x;`, `float y = 3.14;`, `int a[10];`
//! - Struct definitions: `struct Name { ... };`
//! - Function definitions: `type name(params) { ... }`
//! - Type names: built-in type keywords and `struct Name`
//!
//! # Grammar
//!
//! ```text
//! declaration ::= var_decl | func_decl | struct_decl
//! var_decl    ::= type identifier ("[" int "]")? ("=" expression)? ";"
//! func_decl   ::= type identifier "(" param_list? ")" block
//! param_list  ::= param ("," param)*
//! param       ::= type identifier ("[" "]")?
//! struct_decl ::= "struct" identifier "{" var_decl* "}" ";"
//! type        ::= "int" | "float" | "double" | "boolean" | "char" | "void"
//!               | "struct" identifier
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::diagnostics::SyntaxError;
use crate::parser::lexer::{Keyword, Operator, Punctuation, TokenKind};
use crate::parser::parse::{Parser, SyncLevel};
use rustc_hash::FxHashMap;

impl Parser {
    /// Parse a top-level declaration (variable, function or struct definition)
    pub(crate) fn parse_declaration(&mut self) -> Result<Decl, SyntaxError> {
        // Check for struct definition vs a declaration with a struct type.
        // We need to distinguish:
        //   struct Name { ... };           <- struct definition
        //   struct Name func_name(...) ... <- function with struct return type
        //   struct Name var;               <- struct-typed variable
        if self.check_keyword(Keyword::Struct) {
            // Backtracking point: look past the struct name, then restore
            let saved_pos = self.position;
            self.advance(); // consume 'struct'
            let is_definition = matches!(
                self.peek().kind,
                TokenKind::Identifier | TokenKind::Keyword(Keyword::Main)
            )
                && self
                    .peek_ahead(1)
                    .is_some_and(|t| t.kind == TokenKind::Punctuation(Punctuation::LBrace));
            self.position = saved_pos;

            if is_definition {
                return self.parse_struct_declaration().map(Decl::Struct);
            }
        }

        if !self.is_type_keyword() {
            return Err(self.error_expected("declaration"));
        }

        let start = self.current_location();
        let decl_type = self.parse_type()?;
        let name = self.expect_identifier()?;

        if self.check_punct(Punctuation::LParen) {
            self.parse_function_rest(start, decl_type, name).map(Decl::Func)
        } else {
            self.parse_variable_rest(start, decl_type, name).map(Decl::Var)
        }
    }

    /// Parse variable declaration: type name [[size]] [= init];
    pub(crate) fn parse_variable_declaration(&mut self) -> Result<VarDecl, SyntaxError> {
        let start = self.current_location();
        let var_type = self.parse_type()?;
        let name = self.expect_identifier()?;
        self.parse_variable_rest(start, var_type, name)
    }

    /// Everything after `type name` in a variable declaration
    fn parse_variable_rest(
        &mut self,
        start: SourceLocation,
        var_type: TypeName,
        name: String,
    ) -> Result<VarDecl, SyntaxError> {
        let array_len = if self.match_punct(Punctuation::LBracket) {
            let len = match (self.peek().kind, &self.peek().literal) {
                (TokenKind::IntLiteral, Some(LiteralValue::Int(n))) if *n >= 0 => *n as u64,
                _ => return Err(self.error_expected("array length")),
            };
            self.advance();
            self.expect_punct(Punctuation::RBracket, "after array length")?;
            Some(len)
        } else {
            None
        };

        let init = if self.match_token(TokenKind::Operator(Operator::Eq)) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_semicolon("after variable declaration")?;

        Ok(VarDecl {
            var_type,
            name,
            array_len,
            init,
            span: self.span_from(start),
        })
    }

    /// Parse struct definition: struct Name { fields };
    pub(crate) fn parse_struct_declaration(&mut self) -> Result<StructDecl, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'struct'
        let name = self.expect_identifier()?;

        self.expect_punct(Punctuation::LBrace, "after struct name")?;

        let mut fields: Vec<VarDecl> = Vec::new();
        let mut seen: FxHashMap<String, SourceLocation> = FxHashMap::default();
        while !self.check_punct(Punctuation::RBrace) && !self.is_at_end() {
            let field_start = self.position;
            match self.parse_variable_declaration() {
                Ok(field) => {
                    if let Some(first) = seen.get(&field.name) {
                        self.warn(
                            format!(
                                "duplicate field '{}' in struct '{}' (first declared at line {}, column {})",
                                field.name, name, first.line, first.column
                            ),
                            field.span.start,
                        );
                    } else {
                        seen.insert(field.name.clone(), field.span.start);
                    }
                    fields.push(field);
                }
                Err(err) => {
                    self.report(err);
                    self.synchronize(field_start, SyncLevel::Statement);
                }
            }
        }

        self.expect_punct(Punctuation::RBrace, "after struct fields")?;
        self.expect_semicolon("after struct definition")?;

        Ok(StructDecl {
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// Everything after `type name` in a function definition: (params) { body }
    fn parse_function_rest(
        &mut self,
        start: SourceLocation,
        return_type: TypeName,
        name: String,
    ) -> Result<FuncDecl, SyntaxError> {
        self.expect_punct(Punctuation::LParen, "after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_punct(Punctuation::RParen, "after parameters")?;

        let body = self.parse_block("before function body")?;

        Ok(FuncDecl {
            return_type,
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse parameter list: (type name, type name[], ...)
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, SyntaxError> {
        let mut params: Vec<Param> = Vec::new();

        if self.check_punct(Punctuation::RParen) {
            return Ok(params);
        }

        // Special case: (void) means no parameters
        if self.check_keyword(Keyword::Void)
            && self
                .peek_ahead(1)
                .is_some_and(|t| t.kind == TokenKind::Punctuation(Punctuation::RParen))
        {
            self.advance(); // consume 'void'
            return Ok(params);
        }

        loop {
            let start = self.current_location();
            let param_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            let is_array = if self.match_punct(Punctuation::LBracket) {
                self.expect_punct(Punctuation::RBracket, "in array parameter")?;
                true
            } else {
                false
            };

            if params.iter().any(|p| p.name == name) {
                self.warn(format!("duplicate parameter '{}'", name), start);
            }

            params.push(Param {
                param_type,
                name,
                is_array,
                span: self.span_from(start),
            });

            if !self.match_punct(Punctuation::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse type: built-in type keyword or `struct Name`
    pub(crate) fn parse_type(&mut self) -> Result<TypeName, SyntaxError> {
        let type_name = match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => TypeName::Int,
            TokenKind::Keyword(Keyword::Float) => TypeName::Float,
            TokenKind::Keyword(Keyword::Double) => TypeName::Double,
            TokenKind::Keyword(Keyword::Boolean) => TypeName::Boolean,
            TokenKind::Keyword(Keyword::Char) => TypeName::Char,
            TokenKind::Keyword(Keyword::Void) => TypeName::Void,
            TokenKind::Keyword(Keyword::Struct) => {
                self.advance();
                return Ok(TypeName::Struct(self.expect_identifier()?));
            }
            _ => return Err(self.error_expected("type")),
        };
        self.advance();
        Ok(type_name)
    }

    /// Warn about top-level names declared more than once. Struct tags live
    /// in their own namespace.
    pub(crate) fn check_duplicate_declarations(&mut self, program: &Program) {
        let mut values: FxHashMap<&str, SourceLocation> = FxHashMap::default();
        let mut tags: FxHashMap<&str, SourceLocation> = FxHashMap::default();
        let mut warnings = Vec::new();

        for decl in &program.declarations {
            let namespace = match decl {
                Decl::Struct(_) => &mut tags,
                Decl::Var(_) | Decl::Func(_) => &mut values,
            };
            let here = decl.span().start;
            if let Some(first) = namespace.get(decl.name()) {
                warnings.push((
                    format!(
                        "duplicate declaration of '{}' (first declared at line {}, column {})",
                        decl.name(),
                        first.line,
                        first.column
                    ),
                    here,
                ));
            } else {
                namespace.insert(decl.name(), here);
            }
        }

        for (message, location) in warnings {
            self.warn(message, location);
        }
    }
}
