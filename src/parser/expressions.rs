//! Expression parsing implementation
//!
//! This module handles parsing of expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings
//! - Variable references and calls: `x`, `f(a, b)`
//! - Binary operators: `|| && == != < <= > >= + - * / %`
//! - Unary prefix operators: `-`, `!`
//! - Postfix operators: `++`, `--`
//! - Assignment: `x = y = 0` (right-associative, lowest precedence)
//!
//! # Precedence
//!
//! | Level | Operators            | Assoc            |
//! |-------|----------------------|------------------|
//! | 0     | `=`                  | right            |
//! | 1     | `\|\|`               | left             |
//! | 2     | `&&`                 | left             |
//! | 3     | `== != < <= > >=`    | none             |
//! | 4     | `+ -`                | left             |
//! | 5     | `* / %`              | left             |
//! | 6     | unary `- !`          | right (prefix)   |
//! | 7     | `++ --`              | left (postfix)   |
//!
//! Comparisons do not chain: `a < b < c` is reported once and parsed as
//! `(a < b) < c` so the rest of the statement is still checked.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::diagnostics::{SyntaxError, SyntaxErrorKind};
use crate::parser::lexer::{Keyword, Operator, Punctuation, TokenKind};
use crate::parser::parse::Parser;

/// Lowest precedence handled by the climbing loop; assignment sits below it
const MIN_BINARY_PRECEDENCE: u8 = 1;

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(|p| {
            let target = p.parse_binary(MIN_BINARY_PRECEDENCE)?;

            if !p.check(TokenKind::Operator(Operator::Eq)) {
                return Ok(target);
            }

            if !matches!(target, Expr::VarRef { .. }) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidAssignmentTarget,
                    p.current_location(),
                ));
            }
            p.advance(); // '='

            let value = p.parse_assignment()?;
            let span = Span::new(target.span().start, value.span().end);
            Ok(Expr::Binary {
                op: BinOp::Assign,
                left: Box::new(target),
                right: Box::new(value),
                span,
            })
        })
    }

    /// Precedence climbing over the binary operator table.
    ///
    /// Consumes operators whose precedence is at least `min_prec`; the right
    /// operand is parsed with `prec + 1` so equal-precedence operators group
    /// to the left.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        // True when `left` is a comparison built by this loop; a parenthesized
        // comparison comes back from parse_unary and may be compared again
        let mut left_is_comparison = false;
        let mut reported_chain = false;
        // Every operator consumed here pushes `left` one level deeper
        let mut chain = 0;

        while let Some(op) = self.peek_binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.ensure_depth(chain)?;
            chain += 1;
            let op_location = self.current_location();
            self.advance();

            let assoc = op.associativity();
            if assoc == Assoc::None && left_is_comparison && !reported_chain {
                reported_chain = true;
                self.report(SyntaxError::new(
                    SyntaxErrorKind::ChainedComparison {
                        op: op.symbol().to_string(),
                    },
                    op_location,
                ));
            }

            let next_min = match assoc {
                Assoc::Right => prec,
                Assoc::Left | Assoc::None => prec + 1,
            };
            let right = self.parse_binary(next_min)?;
            let span = Span::new(left.span().start, right.span().end);
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
            left_is_comparison = assoc == Assoc::None;
        }

        Ok(left)
    }

    /// Binary operator at the cursor, if any
    fn peek_binary_op(&self) -> Option<BinOp> {
        let TokenKind::Operator(op) = self.peek().kind else {
            return None;
        };
        let bin_op = match op {
            Operator::OrOr => BinOp::Or,
            Operator::AndAnd => BinOp::And,
            Operator::EqEq => BinOp::Eq,
            Operator::NotEq => BinOp::Ne,
            Operator::Lt => BinOp::Lt,
            Operator::Le => BinOp::Le,
            Operator::Gt => BinOp::Gt,
            Operator::Ge => BinOp::Ge,
            Operator::Plus => BinOp::Add,
            Operator::Minus => BinOp::Sub,
            Operator::Star => BinOp::Mul,
            Operator::Slash => BinOp::Div,
            Operator::Percent => BinOp::Mod,
            _ => return None,
        };
        Some(bin_op)
    }

    /// Parse unary prefix operators (- !)
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(|p| {
            let start = p.current_location();

            let op = match p.peek().kind {
                TokenKind::Operator(Operator::Minus) => UnOp::Neg,
                TokenKind::Operator(Operator::Bang) => UnOp::Not,
                _ => return p.parse_postfix(),
            };
            p.advance();

            let operand = p.parse_unary()?;
            let span = Span::new(start, operand.span().end);
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            })
        })
    }

    /// Parse postfix (++ --)
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        let mut wraps = 0;

        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::PlusPlus) => UnOp::PostInc,
                TokenKind::Operator(Operator::MinusMinus) => UnOp::PostDec,
                _ => break,
            };
            self.ensure_depth(wraps)?;
            wraps += 1;
            self.advance();
            let span = self.span_from(expr.span().start);
            expr = Expr::Unary {
                op,
                operand: Box::new(expr),
                span,
            };
        }

        Ok(expr)
    }

    /// Parse argument list: (expr, expr, ...)
    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();

        if self.check_punct(Punctuation::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if !self.match_punct(Punctuation::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, variables, calls, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_location();

        match self.peek().kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral => {
                let token = self.advance();
                let span = token.span();
                match token.literal.clone() {
                    Some(value) => Ok(Expr::Literal { value, span }),
                    None => Err(SyntaxError::new(
                        SyntaxErrorKind::Expected {
                            expected: "literal value".to_string(),
                            found: token.to_string(),
                        },
                        start,
                    )),
                }
            }

            // `main` is a keyword but names a function like any identifier
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Main) => {
                let name = self.advance().lexeme.clone();

                // Identifier immediately followed by '(' is a call
                if self.match_punct(Punctuation::LParen) {
                    let args = self.parse_argument_list()?;
                    self.expect_punct(Punctuation::RParen, "after function arguments")?;
                    return Ok(Expr::Call {
                        callee: name,
                        args,
                        span: self.span_from(start),
                    });
                }

                Ok(Expr::VarRef {
                    name,
                    span: self.span_from(start),
                })
            }

            TokenKind::Punctuation(Punctuation::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_punct(Punctuation::RParen, "after expression")?;
                Ok(expr)
            }

            _ => Err(self.error_expected("expression")),
        }
    }
}
