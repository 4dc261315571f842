//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Variable declarations: `int x = 42;`
//! - Control flow: `if`, `while`, `for`, `switch`
//! - Jump statements: `return`, `break`, `continue`
//! - Blocks: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | if_stmt | while_stmt | for_stmt | switch_stmt
//!             | return_stmt | break_stmt | continue_stmt | block | expr_stmt
//! if_stmt   ::= "if" "(" expression ")" block ("else" (block | if_stmt))?
//! for_stmt  ::= "for" "(" (var_decl | expression? ";") expression? ";" expression? ")" block
//! switch_stmt ::= "switch" "(" expression ")" "{" case_clause+ "}"
//! case_clause ::= "case" literal ":" statement* | "default" ":" statement*
//! ```
//!
//! Statements inside a block are the unit of error recovery: a broken
//! statement is reported once and parsing resumes with the next one.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::diagnostics::{SyntaxError, SyntaxErrorKind};
use crate::parser::lexer::{Keyword, Operator, Punctuation, TokenKind};
use crate::parser::parse::{Parser, SyncLevel};
use rustc_hash::FxHashSet;

impl Parser {
    /// Parse a braced block. A block left open at end of input is reported
    /// and returned with the statements read so far.
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Block, SyntaxError> {
        self.nested(|p| {
            let start = p.current_location();
            p.expect_punct(Punctuation::LBrace, ctx)?;
            let statements = p.parse_block_statements(|p| p.check_punct(Punctuation::RBrace));

            if !p.match_punct(Punctuation::RBrace) {
                let err = p.error_expected("'}' after block");
                p.report(err);
            }

            Ok(Block {
                statements,
                span: p.span_from(start),
            })
        })
    }

    /// Parse statements until `at_end` holds or input runs out, recovering
    /// from broken statements along the way
    pub(crate) fn parse_block_statements(&mut self, at_end: impl Fn(&Self) -> bool) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !at_end(self) && !self.is_at_end() {
            let start = self.position;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.report(err);
                    self.synchronize(start, SyncLevel::Statement);
                }
            }
        }

        statements
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.current_location();

        match self.peek().kind {
            TokenKind::Punctuation(Punctuation::LBrace) => {
                return self.parse_block("to open block").map(Stmt::Block);
            }
            TokenKind::Keyword(Keyword::If) => return self.parse_if_statement().map(Stmt::If),
            TokenKind::Keyword(Keyword::While) => return self.parse_while_statement().map(Stmt::While),
            TokenKind::Keyword(Keyword::For) => return self.parse_for_statement().map(Stmt::For),
            // Case bodies are not blocks, so a switch counts as its own level
            TokenKind::Keyword(Keyword::Switch) => {
                return self.nested(Self::parse_switch_statement).map(Stmt::Switch);
            }
            TokenKind::Keyword(Keyword::Return) => return self.parse_return_statement().map(Stmt::Return),
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                self.expect_semicolon("after 'break'")?;
                return Ok(Stmt::Break {
                    span: self.span_from(start),
                });
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                self.expect_semicolon("after 'continue'")?;
                return Ok(Stmt::Continue {
                    span: self.span_from(start),
                });
            }
            _ => {}
        }

        // Check for variable declaration (type followed by identifier)
        if self.is_type_keyword() {
            return self.parse_variable_declaration().map(Stmt::VarDecl);
        }

        // Otherwise, it's an expression statement
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Stmt::Expr {
            expr,
            span: self.span_from(start),
        })
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<ReturnStmt, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'return'

        let value = if self.check_punct(Punctuation::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_semicolon("after return")?;

        Ok(ReturnStmt {
            value,
            span: self.span_from(start),
        })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<IfStmt, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'if'

        self.expect_punct(Punctuation::LParen, "after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punctuation::RParen, "after if condition")?;

        let then_block = self.parse_block("after if condition")?;

        let else_branch = if self.match_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                // Each link of an else-if chain nests one level deeper
                Some(Box::new(Stmt::If(self.nested(Self::parse_if_statement)?)))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block("after 'else'")?)))
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_block,
            else_branch,
            span: self.span_from(start),
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<WhileStmt, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'while'

        self.expect_punct(Punctuation::LParen, "after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punctuation::RParen, "after while condition")?;

        let body = self.parse_block("after while condition")?;

        Ok(WhileStmt {
            condition,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse for statement
    fn parse_for_statement(&mut self) -> Result<ForStmt, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'for'

        self.expect_punct(Punctuation::LParen, "after 'for'")?;

        // Init (optional)
        let init = if self.match_punct(Punctuation::Semicolon) {
            None
        } else if self.is_type_keyword() {
            // Declaration includes semicolon, so don't expect another
            Some(Box::new(Stmt::VarDecl(self.parse_variable_declaration()?)))
        } else {
            let init_start = self.current_location();
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for init")?;
            Some(Box::new(Stmt::Expr {
                expr,
                span: self.span_from(init_start),
            }))
        };

        // Condition (optional)
        let condition = if self.check_punct(Punctuation::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after for condition")?;

        // Step (optional)
        let step = if self.check_punct(Punctuation::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_punct(Punctuation::RParen, "after for clauses")?;

        let body = self.parse_block("after for clauses")?;

        Ok(ForStmt {
            init,
            condition,
            step,
            body,
            span: self.span_from(start),
        })
    }

    /// Parse switch statement
    fn parse_switch_statement(&mut self) -> Result<SwitchStmt, SyntaxError> {
        let start = self.current_location();
        self.advance(); // 'switch'

        self.expect_punct(Punctuation::LParen, "after 'switch'")?;
        let scrutinee = self.parse_expression()?;
        self.expect_punct(Punctuation::RParen, "after switch expression")?;
        let body_start = self.current_location();
        self.expect_punct(Punctuation::LBrace, "before switch body")?;

        let mut cases = Vec::new();
        let mut seen_values: FxHashSet<String> = FxHashSet::default();
        let mut seen_default = false;
        let mut saw_clause = false;

        while !self.check_punct(Punctuation::RBrace) && !self.is_at_end() {
            let case_start = self.current_location();
            saw_clause = true;

            match self.parse_case_label(&mut seen_values, &mut seen_default) {
                Ok(label) => {
                    let statements = self.parse_case_statements();
                    cases.push(CaseClause {
                        label,
                        statements,
                        span: self.span_from(case_start),
                    });
                }
                Err(err) => {
                    self.report(err);
                    self.skip_to_case_body();
                    // Statements under a broken label are still checked, then dropped
                    self.parse_case_statements();
                }
            }
        }

        if !saw_clause {
            self.report(SyntaxError::new(SyntaxErrorKind::EmptySwitch, body_start));
        }

        self.expect_punct(Punctuation::RBrace, "after switch body")?;

        Ok(SwitchStmt {
            scrutinee,
            cases,
            span: self.span_from(start),
        })
    }

    /// Parse `case literal:` or `default:`, warning about repeated labels
    fn parse_case_label(
        &mut self,
        seen_values: &mut FxHashSet<String>,
        seen_default: &mut bool,
    ) -> Result<CaseLabel, SyntaxError> {
        let start = self.current_location();

        let label = if self.match_keyword(Keyword::Case) {
            let value = self.parse_case_value()?;
            if !seen_values.insert(value.to_string()) {
                self.warn(format!("duplicate case value {}", value), start);
            }
            CaseLabel::Case(value)
        } else if self.match_keyword(Keyword::Default) {
            if *seen_default {
                self.warn("multiple 'default' clauses in switch".to_string(), start);
            }
            *seen_default = true;
            CaseLabel::Default
        } else {
            return Err(self.error_expected("'case' or 'default' in switch body"));
        };

        self.expect_punct(Punctuation::Colon, "after case label")?;
        Ok(label)
    }

    /// Statements of one clause run until the next label or the closing brace
    fn parse_case_statements(&mut self) -> Vec<Stmt> {
        self.parse_block_statements(|p| {
            p.check_keyword(Keyword::Case) || p.check_keyword(Keyword::Default) || p.check_punct(Punctuation::RBrace)
        })
    }

    /// Recovery for a broken case label: skip past its `:`, or up to the next
    /// label or the end of the switch body
    fn skip_to_case_body(&mut self) {
        let mut brace_depth = 0usize;
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Punctuation(Punctuation::Colon) if brace_depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Keyword(Keyword::Case | Keyword::Default) if brace_depth == 0 => return,
                TokenKind::Punctuation(Punctuation::RBrace) if brace_depth == 0 => return,
                TokenKind::Punctuation(Punctuation::RBrace) => brace_depth -= 1,
                TokenKind::Punctuation(Punctuation::LBrace) => brace_depth += 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Case labels are literals; numeric ones may carry a leading `-`
    fn parse_case_value(&mut self) -> Result<LiteralValue, SyntaxError> {
        let negate = self.match_token(TokenKind::Operator(Operator::Minus));
        let value = match (self.peek().kind, &self.peek().literal) {
            (TokenKind::IntLiteral, Some(LiteralValue::Int(n))) if negate => LiteralValue::Int(n.wrapping_neg()),
            (TokenKind::FloatLiteral, Some(LiteralValue::Float(x))) if negate => LiteralValue::Float(-x),
            (TokenKind::IntLiteral | TokenKind::FloatLiteral, Some(value)) if !negate => value.clone(),
            (TokenKind::StringLiteral, Some(value)) if !negate => value.clone(),
            _ => return Err(self.error_expected("literal case value")),
        };
        self.advance();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::diagnostics::{Diagnostic, Severity};
    use crate::parser::parse::Parser;
    use pretty_assertions::assert_eq;

    fn parse_body(body: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
        let source = format!("void f() {{\n{}\n}}", body);
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        let diagnostics = parser.take_diagnostics();
        match program.declarations.into_iter().next() {
            Some(Decl::Func(func)) => (func.body.statements, diagnostics),
            other => panic!("Expected function declaration, got {:?}", other),
        }
    }

    fn var(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn test_parse_if_statement() {
        let (stmts, diagnostics) = parse_body("if (x > 0) { return 1; } else { return 0; }");
        assert!(diagnostics.is_empty());
        let Stmt::If(stmt) = &stmts[0] else {
            panic!("Expected if statement");
        };
        assert!(matches!(stmt.condition, Expr::Binary { op: BinOp::Gt, .. }));
        assert_eq!(stmt.then_block.statements.len(), 1);
        assert!(matches!(stmt.else_branch.as_deref(), Some(Stmt::Block(_))));
    }

    #[test]
    fn test_else_if_chain() {
        let (stmts, diagnostics) = parse_body("if (a) { } else if (b) { } else { x = 1; }");
        assert!(diagnostics.is_empty());
        let Stmt::If(outer) = &stmts[0] else {
            panic!("Expected if statement");
        };
        let Some(Stmt::If(inner)) = outer.else_branch.as_deref() else {
            panic!("Expected else-if");
        };
        assert!(matches!(inner.else_branch.as_deref(), Some(Stmt::Block(b)) if b.statements.len() == 1));
    }

    #[test]
    fn test_parse_while_and_jumps() {
        let (stmts, diagnostics) = parse_body("while (running) { if (done) { break; } continue; }");
        assert!(diagnostics.is_empty());
        let Stmt::While(stmt) = &stmts[0] else {
            panic!("Expected while statement");
        };
        assert!(matches!(&stmt.condition, Expr::VarRef { name, .. } if *name == var("running")));
        assert!(matches!(stmt.body.statements[1], Stmt::Continue { .. }));
    }

    #[test]
    fn test_parse_for_statement() {
        let (stmts, diagnostics) = parse_body("for (int i = 0; i < 10; i++) { total = total + i; }");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Stmt::For(stmt) = &stmts[0] else {
            panic!("Expected for statement");
        };
        assert!(matches!(stmt.init.as_deref(), Some(Stmt::VarDecl(decl)) if decl.name == "i"));
        assert!(matches!(stmt.condition, Some(Expr::Binary { op: BinOp::Lt, .. })));
        assert!(matches!(stmt.step, Some(Expr::Unary { op: UnOp::PostInc, .. })));
        assert_eq!(stmt.body.statements.len(), 1);
    }

    #[test]
    fn test_for_clauses_are_optional() {
        let (stmts, diagnostics) = parse_body("for (;;) { break; }\nfor (i = 0; ; ) { }");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Stmt::For(first) = &stmts[0] else {
            panic!("Expected for statement");
        };
        assert!(first.init.is_none() && first.condition.is_none() && first.step.is_none());
        let Stmt::For(second) = &stmts[1] else {
            panic!("Expected for statement");
        };
        assert!(matches!(second.init.as_deref(), Some(Stmt::Expr { .. })));
    }

    #[test]
    fn test_parse_switch_statement() {
        let source = "switch (c) { case 1: x = 1; break; case -2: case \"s\": default: y = 2; }";
        let (stmts, diagnostics) = parse_body(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Stmt::Switch(stmt) = &stmts[0] else {
            panic!("Expected switch statement");
        };
        let labels: Vec<&CaseLabel> = stmt.cases.iter().map(|c| &c.label).collect();
        assert_eq!(
            labels,
            vec![
                &CaseLabel::Case(LiteralValue::Int(1)),
                &CaseLabel::Case(LiteralValue::Int(-2)),
                &CaseLabel::Case(LiteralValue::Str("s".to_string())),
                &CaseLabel::Default,
            ]
        );
        assert_eq!(stmt.cases[0].statements.len(), 2);
        assert!(stmt.cases[1].statements.is_empty());
        assert_eq!(stmt.cases[3].statements.len(), 1);
    }

    #[test]
    fn test_switch_duplicates_warn() {
        let (_, diagnostics) = parse_body("switch (c) { case 1: case 1: default: default: }");
        let messages: Vec<(&str, Severity)> = diagnostics.iter().map(|d| (d.message.as_str(), d.severity)).collect();
        assert_eq!(
            messages,
            vec![
                ("duplicate case value 1", Severity::Warning),
                ("multiple 'default' clauses in switch", Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_empty_switch_is_an_error() {
        let (stmts, diagnostics) = parse_body("switch (c) { }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "switch statement needs at least one 'case' or 'default' clause"
        );
        assert!(matches!(&stmts[0], Stmt::Switch(s) if s.cases.is_empty()));
    }

    #[test]
    fn test_case_value_must_be_literal() {
        let (_, diagnostics) = parse_body("switch (c) { case x: break; }\nreturn;");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "expected literal case value, found identifier 'x'");
    }

    #[test]
    fn test_nested_switch_hits_depth_limit() {
        let body = format!("{}{}", "switch (a) { case 1: ".repeat(300), "} ".repeat(300));
        let (stmts, diagnostics) = parse_body(&body);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "nesting is deeper than the limit of 128");
        assert!(matches!(&stmts[0], Stmt::Switch(_)));

        let shallow = format!("{}{}", "switch (a) { case 1: ".repeat(20), "} ".repeat(20));
        let (_, diagnostics) = parse_body(&shallow);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_long_else_if_chain_hits_depth_limit() {
        let body = format!("if (a) {{ }} {}", "else if (a) { } ".repeat(1000));
        let (_, diagnostics) = parse_body(&body);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics
            .iter()
            .all(|d| d.message == "nesting is deeper than the limit of 128"));

        let body = format!("if (a) {{ }} {}else {{ }}", "else if (a) { } ".repeat(100));
        let (stmts, diagnostics) = parse_body(&body);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_return_forms() {
        let (stmts, diagnostics) = parse_body("return;\nreturn a + 1;");
        assert!(diagnostics.is_empty());
        assert!(matches!(&stmts[0], Stmt::Return(r) if r.value.is_none()));
        assert!(matches!(&stmts[1], Stmt::Return(r) if matches!(r.value, Some(Expr::Binary { op: BinOp::Add, .. }))));
    }

    #[test]
    fn test_nested_blocks_and_local_declarations() {
        let (stmts, diagnostics) = parse_body("{ int a; { double b = 1.5; } }");
        assert!(diagnostics.is_empty());
        let Stmt::Block(outer) = &stmts[0] else {
            panic!("Expected block");
        };
        assert!(matches!(&outer.statements[0], Stmt::VarDecl(d) if d.var_type == TypeName::Int));
        assert!(matches!(&outer.statements[1], Stmt::Block(b) if b.statements.len() == 1));
    }

    #[test]
    fn test_statement_recovery_continues_in_block() {
        let (stmts, diagnostics) = parse_body("x = ;\ny = 2;\nif (x < ) { z = 1; }\nreturn y;");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message, "expected expression, found ';'");
        assert_eq!(diagnostics[1].message, "expected expression, found ')'");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Expr { .. }));
        assert!(matches!(&stmts[1], Stmt::Return(_)));
    }

    #[test]
    fn test_unclosed_block_keeps_partial_body() {
        let mut parser = Parser::new("int main() { int x = 1;");
        let program = parser.parse_program();
        let diagnostics = parser.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unexpected end of input, expected '}' after block");
        let Some(Decl::Func(func)) = program.declarations.first() else {
            panic!("Expected function declaration");
        };
        assert_eq!(func.body.statements.len(), 1);
    }
}
