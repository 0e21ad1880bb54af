//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 6. `||`
//! 5. `&&`
//! 4. `==`, `!=`, `<`, `>`, `<=`, `>=` (no chaining)
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. unary `!`, `-`
//! 0. member access, `[index]`, `(call)`, `(grouping)`
//!
//! Parentheses group only; they leave no AST node behind.

use navlogic_lexer::token::TokenKind;
use navlogic_types::ast::*;
use navlogic_types::ErrorCode;

use crate::parser::Parser;

/// Maximum dotted-path depth (`override.vtx.power` is the deepest form).
const MAX_PATH_SEGMENTS: usize = 3;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > 16 {
            self.error_at_current(
                ErrorCode::UNSUPPORTED_EXPRESSION,
                "maximum expression nesting depth is 16",
            );
            self.expr_depth -= 1;
            return None;
        }
        let result = self.parse_or();
        self.expr_depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `OrExpr = AndExpr { "||" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `AndExpr = CompExpr { "&&" CompExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_comparison()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_comparison()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `CompExpr = AddExpr [ CompOp AddExpr ]`
    ///
    /// Comparison operators do NOT chain: `a < b < c` is a parse error.
    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut left = self.parse_add()?;
        if let Some(op) = self.match_comparison_op() {
            self.advance();
            let right = self.parse_add()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
            if self.match_comparison_op().is_some() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "comparison operators cannot be chained; use '&&' to combine: a < b && b < c",
                );
            }
        }
        Some(left)
    }

    /// Check if the current token is a comparison operator.
    fn match_comparison_op(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::BangEq => Some(BinOp::Ne),
            TokenKind::Less => Some(BinOp::Lt),
            TokenKind::Greater => Some(BinOp::Gt),
            TokenKind::LessEq => Some(BinOp::Le),
            TokenKind::GreaterEq => Some(BinOp::Ge),
            _ => None,
        }
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `UnaryExpr = { "!" | "-" } PrimaryExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_primary()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Literals, grouping, and identifier chains with optional index or
    /// call suffix.
    fn parse_primary(&mut self) -> Option<Expr> {
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::NumberLit(n), span))
            }
            TokenKind::True => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::BoolLit(true), span))
            }
            TokenKind::False => {
                let span = self.advance().span;
                Some(Expr::new(ExprKind::BoolLit(false), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Some(inner)
            }
            TokenKind::Identifier(_) => self.parse_path_expr(),
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Parse a dotted identifier chain and any `[index]` or `(args)`
    /// suffix: `flight.homeDistance`, `gvar[3]`, `Math.abs(x)`.
    pub(crate) fn parse_path_expr(&mut self) -> Option<Expr> {
        let segments = self.parse_path_segments()?;
        let start = segments[0].span;
        let end = segments.last().unwrap().span;

        match self.peek_kind() {
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_expression()?;
                let close = self.expect(&TokenKind::RBracket)?;
                Some(Expr::new(
                    ExprKind::Index {
                        base: segments,
                        index: Box::new(index),
                    },
                    start.merge(close.span),
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(&TokenKind::RParen)?;
                Some(Expr::new(
                    ExprKind::Call {
                        callee: segments,
                        args,
                    },
                    start.merge(close.span),
                ))
            }
            _ => Some(Expr::new(ExprKind::Path(segments), start.merge(end))),
        }
    }

    /// Parse `ident { "." ident }`, at most [`MAX_PATH_SEGMENTS`] deep.
    pub(crate) fn parse_path_segments(&mut self) -> Option<Vec<Ident>> {
        let mut segments = vec![self.expect_identifier()?];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.expect_identifier()?);
            if segments.len() > MAX_PATH_SEGMENTS {
                let span = segments[0].span.merge(self.previous_span());
                self.error_at(
                    ErrorCode::MEMBER_TOO_DEEP,
                    format!("member chains are at most {MAX_PATH_SEGMENTS} segments deep"),
                    span,
                );
                return None;
            }
        }
        Some(segments)
    }
}
