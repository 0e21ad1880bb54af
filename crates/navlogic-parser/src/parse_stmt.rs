//! Statement parsing: top-level forms, the event-handler DSL, and the
//! desugarings that keep the AST canonical.
//!
//! Surface sugar handled here:
//! - `x += e`, `x -= e`, `x *= e`, `x /= e` → `x = x op e`
//! - `++x`, `x++`, `--x`, `x--` → `x = x ± 1`
//! - `else` / `else if` chains → sibling handlers guarded by the
//!   negation of every preceding condition
//! - arrow functions → the condition/body fields of [`EventHandler`]

use navlogic_lexer::token::TokenKind;
use navlogic_types::ast::*;
use navlogic_types::{ErrorCode, Span};

use crate::parser::Parser;

/// A canonicalized arrow-function argument: an expression or a block body
/// plus its source location.
enum ArrowBody {
    Expression(Expr),
    Block(Vec<Stmt>, Span),
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_program(&mut self) -> Option<Program> {
        let start = self.current_span();
        let mut statements = Vec::new();

        while !self.at_end() && !self.too_many_errors() {
            let before = self.errors_total();
            if self.parse_statement_into(&mut statements).is_none()
                || self.errors_total() > before
            {
                self.synchronize();
            }
        }

        let span = start.merge(self.previous_span());
        Some(Program { statements, span })
    }

    /// Parse one statement, appending the resulting node(s) to `out`.
    ///
    /// An `if`/`else` chain appends one handler per branch, which is why
    /// this takes a sink instead of returning a single node.
    fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) -> Option<()> {
        match self.peek_kind() {
            TokenKind::Const if *self.look_ahead(1) == TokenKind::LBrace => {
                out.push(self.parse_import()?);
            }
            TokenKind::Const => {
                out.push(self.parse_binding(BindingKind::Const)?);
            }
            TokenKind::Let => {
                out.push(self.parse_binding(BindingKind::Let)?);
            }
            TokenKind::Var => {
                out.push(self.parse_binding(BindingKind::Var)?);
            }
            TokenKind::If => {
                self.parse_if_chain(out)?;
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                out.push(self.parse_prefix_increment()?);
            }
            TokenKind::Identifier(_) => {
                out.push(self.parse_assign_or_handler()?);
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected statement, got '{}'", self.peek_kind()),
                );
                return None;
            }
        }
        Some(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `const { flight, override } = inav;`
    fn parse_import(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // const
        self.expect(&TokenKind::LBrace)?;

        let mut roots = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                roots.push(self.expect_identifier()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                // Tolerate a trailing comma before `}`.
                if self.check(&TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::Eq)?;

        let source = self.expect_identifier()?;
        if source.name != "inav" {
            self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                format!(
                    "destructuring must import from 'inav', got '{}'",
                    source.name
                ),
                source.span,
            );
        }
        self.expect_semicolon();

        let span = start.merge(self.previous_span());
        Some(Stmt::Import(ImportStmt { roots, span }))
    }

    /// `let name = expr;` / `const name = expr;` / `var name = expr;`
    fn parse_binding(&mut self, kind: BindingKind) -> Option<Stmt> {
        let start = self.advance().span; // let | const | var
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let init = self.parse_expression()?;
        self.expect_semicolon();

        let span = start.merge(self.previous_span());
        Some(Stmt::Binding(BindingStmt {
            kind,
            name,
            init,
            span,
        }))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Assignments
    // ══════════════════════════════════════════════════════════════════════════

    /// `++x;` / `--x;`
    fn parse_prefix_increment(&mut self) -> Option<Stmt> {
        let op_token = self.advance();
        let op = if op_token.kind == TokenKind::PlusPlus {
            BinOp::Add
        } else {
            BinOp::Sub
        };
        let target = self.parse_assign_target()?;
        self.expect_semicolon();
        let span = op_token.span.merge(self.previous_span());
        Some(Self::desugar_step(target, op, span))
    }

    /// A statement starting with an identifier: either an assignment to a
    /// writable target or a handler-shaped call.
    fn parse_assign_or_handler(&mut self) -> Option<Stmt> {
        let segments = self.parse_path_segments()?;
        let start = segments[0].span;

        if self.check(&TokenKind::LParen) {
            self.advance();
            return self.parse_handler_call(segments, start);
        }

        let target = self.finish_assign_target(segments)?;
        self.finish_assignment(target)
    }

    /// Parse a fresh assignment target: a dotted path with an optional
    /// `[index]` suffix.
    fn parse_assign_target(&mut self) -> Option<Expr> {
        let segments = self.parse_path_segments()?;
        self.finish_assign_target(segments)
    }

    /// Attach an optional `[index]` suffix to already-parsed segments.
    fn finish_assign_target(&mut self, segments: Vec<Ident>) -> Option<Expr> {
        let start = segments[0].span;
        if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            let close = self.expect(&TokenKind::RBracket)?;
            Some(Expr::new(
                ExprKind::Index {
                    base: segments,
                    index: Box::new(index),
                },
                start.merge(close.span),
            ))
        } else {
            let end = segments.last().unwrap().span;
            Some(Expr::new(ExprKind::Path(segments), start.merge(end)))
        }
    }

    /// Consume the assignment operator and right-hand side.
    fn finish_assignment(&mut self, target: Expr) -> Option<Stmt> {
        let start = target.span;
        let value = match self.peek_kind().clone() {
            TokenKind::Eq => {
                self.advance();
                self.parse_expression()?
            }
            TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq => {
                let op = match self.advance().kind {
                    TokenKind::PlusEq => BinOp::Add,
                    TokenKind::MinusEq => BinOp::Sub,
                    TokenKind::StarEq => BinOp::Mul,
                    _ => BinOp::Div,
                };
                let rhs = self.parse_expression()?;
                let span = start.merge(rhs.span);
                Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(target.clone()),
                        right: Box::new(rhs),
                    },
                    span,
                )
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    BinOp::Add
                } else {
                    BinOp::Sub
                };
                self.expect_semicolon();
                let span = start.merge(self.previous_span());
                return Some(Self::desugar_step(target, op, span));
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected assignment operator, got '{other}'"),
                );
                return None;
            }
        };
        self.expect_semicolon();

        let span = start.merge(self.previous_span());
        Some(Stmt::Assign(AssignStmt {
            target,
            value,
            span,
        }))
    }

    /// Build `target = target op 1` for increment/decrement forms.
    fn desugar_step(target: Expr, op: BinOp, span: Span) -> Stmt {
        let one = Expr::new(ExprKind::NumberLit(1), span);
        let value = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(target.clone()),
                right: Box::new(one),
            },
            span,
        );
        Stmt::Assign(AssignStmt {
            target,
            value,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // if / else chains
    // ══════════════════════════════════════════════════════════════════════════

    /// `if (cond) { ... } else if (cond2) { ... } else { ... }`
    ///
    /// Each branch becomes its own handler; later branches are guarded by
    /// the conjunction of every preceding condition's negation, so the
    /// optimizer can share the underlying condition slots.
    fn parse_if_chain(&mut self, out: &mut Vec<Stmt>) -> Option<()> {
        let mut negated: Vec<Expr> = Vec::new();

        loop {
            let start = self.expect(&TokenKind::If)?.span;
            self.expect(&TokenKind::LParen)?;
            let condition = self.parse_expression()?;
            self.expect(&TokenKind::RParen)?;
            let body = self.parse_block()?;
            let span = start.merge(self.previous_span());

            let guard = Self::conjoin(&negated, Some(condition.clone()));
            out.push(Self::handler(
                HandlerKind::If,
                guard,
                None,
                None,
                HandlerConfig::default(),
                body,
                span,
            ));
            negated.push(Self::negate(condition));

            if !self.eat(&TokenKind::Else) {
                return Some(());
            }
            if self.check(&TokenKind::If) {
                continue;
            }

            // Final `else { ... }` — guarded by all accumulated negations.
            let body = self.parse_block()?;
            let span = self.previous_span();
            out.push(Self::handler(
                HandlerKind::If,
                Self::conjoin(&negated, None),
                None,
                None,
                HandlerConfig::default(),
                body,
                span,
            ));
            return Some(());
        }
    }

    /// Wrap an expression in `!(...)`.
    fn negate(expr: Expr) -> Expr {
        let span = expr.span;
        Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(expr),
            },
            span,
        )
    }

    /// AND together the accumulated guards plus an optional tail condition.
    fn conjoin(guards: &[Expr], tail: Option<Expr>) -> Option<Expr> {
        let mut iter = guards.iter().cloned().chain(tail);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| {
            let span = acc.span.merge(next.span);
            Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::And,
                    left: Box::new(acc),
                    right: Box::new(next),
                },
                span,
            )
        }))
    }

    /// `{ stmt* }`
    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() && !self.too_many_errors() {
            let before = self.errors_total();
            if self.parse_statement_into(&mut stmts).is_none() || self.errors_total() > before {
                self.synchronize();
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(stmts)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Event-handler DSL
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse the arguments of a handler-shaped call. The opening `(` has
    /// been consumed; each known handler name imposes its own shape.
    fn parse_handler_call(&mut self, callee: Vec<Ident>, start: Span) -> Option<Stmt> {
        let name: Vec<&str> = callee.iter().map(|s| s.name.as_str()).collect();
        let name = name.join(".");

        match name.as_str() {
            "on.always" => {
                let body = self.expect_arrow_block("on.always")?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        HandlerKind::Always,
                        None,
                        None,
                        None,
                        HandlerConfig::default(),
                        body,
                        span,
                    )
                })
            }
            "on.arm" => {
                let delay = self.parse_config_object("on.arm", "delay")?;
                self.expect(&TokenKind::Comma)?;
                let body = self.expect_arrow_block("on.arm")?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        HandlerKind::Arm,
                        None,
                        None,
                        None,
                        HandlerConfig {
                            delay: Some(delay),
                            ..Default::default()
                        },
                        body,
                        span,
                    )
                })
            }
            "edge" | "delay" => {
                let kind = if name == "edge" {
                    HandlerKind::Edge
                } else {
                    HandlerKind::Delay
                };
                let condition = self.expect_arrow_expression(&name)?;
                self.expect(&TokenKind::Comma)?;
                let duration = self.parse_config_object(&name, "duration")?;
                self.expect(&TokenKind::Comma)?;
                let body = self.expect_arrow_block(&name)?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        kind,
                        Some(condition),
                        None,
                        None,
                        HandlerConfig {
                            duration: Some(duration),
                            ..Default::default()
                        },
                        body,
                        span,
                    )
                })
            }
            "sticky" => {
                let on_condition = self.expect_arrow_expression("sticky")?;
                self.expect(&TokenKind::Comma)?;
                let off_condition = self.expect_arrow_expression("sticky")?;
                self.expect(&TokenKind::Comma)?;
                let body = self.expect_arrow_block("sticky")?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        HandlerKind::Sticky,
                        Some(on_condition),
                        Some(off_condition),
                        None,
                        HandlerConfig::default(),
                        body,
                        span,
                    )
                })
            }
            "timer" => {
                let on_ms = self.parse_expression()?;
                self.expect(&TokenKind::Comma)?;
                let off_ms = self.parse_expression()?;
                self.expect(&TokenKind::Comma)?;
                let body = self.expect_arrow_block("timer")?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        HandlerKind::Timer,
                        None,
                        None,
                        None,
                        HandlerConfig {
                            on_ms: Some(on_ms),
                            off_ms: Some(off_ms),
                            ..Default::default()
                        },
                        body,
                        span,
                    )
                })
            }
            "whenChanged" => {
                let value = self.parse_expression()?;
                self.expect(&TokenKind::Comma)?;
                let threshold = self.parse_expression()?;
                self.expect(&TokenKind::Comma)?;
                let body = self.expect_arrow_block("whenChanged")?;
                self.finish_handler_args(start, |span| {
                    Self::handler(
                        HandlerKind::WhenChanged,
                        None,
                        None,
                        Some(value),
                        HandlerConfig {
                            threshold: Some(threshold),
                            ..Default::default()
                        },
                        body,
                        span,
                    )
                })
            }
            _ => {
                self.error_at(
                    ErrorCode::UNKNOWN_HANDLER,
                    format!("unknown handler '{name}'"),
                    start,
                );
                None
            }
        }
    }

    /// Consume the closing `)` and `;`, then build the handler node with
    /// the final span.
    fn finish_handler_args(
        &mut self,
        start: Span,
        build: impl FnOnce(Span) -> Stmt,
    ) -> Option<Stmt> {
        self.expect(&TokenKind::RParen)?;
        self.expect_semicolon();
        Some(build(start.merge(self.previous_span())))
    }

    #[allow(clippy::too_many_arguments)]
    fn handler(
        kind: HandlerKind,
        condition: Option<Expr>,
        off_condition: Option<Expr>,
        value: Option<Expr>,
        config: HandlerConfig,
        body: Vec<Stmt>,
        span: Span,
    ) -> Stmt {
        Stmt::Handler(EventHandler {
            kind,
            condition,
            off_condition,
            value,
            config,
            body,
            reuse: None,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arrow functions & config objects
    // ══════════════════════════════════════════════════════════════════════════

    /// `() => expr` or `() => { block }`
    fn parse_arrow(&mut self) -> Option<ArrowBody> {
        let start = self.current_span();
        self.expect(&TokenKind::LParen)?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::FatArrow)?;
        if self.check(&TokenKind::LBrace) {
            let body = self.parse_block()?;
            let span = start.merge(self.previous_span());
            Some(ArrowBody::Block(body, span))
        } else {
            let expr = self.parse_expression()?;
            Some(ArrowBody::Expression(expr))
        }
    }

    /// Expect an arrow whose body is a single condition expression.
    fn expect_arrow_expression(&mut self, construct: &str) -> Option<Expr> {
        match self.parse_arrow()? {
            ArrowBody::Expression(e) => Some(e),
            ArrowBody::Block(_, span) => {
                self.error_at(
                    ErrorCode::WRONG_ARITY,
                    format!("{construct} expects '() => condition', not a block body"),
                    span,
                );
                None
            }
        }
    }

    /// Expect an arrow whose body is a block. A bare assignment
    /// expression is not accepted; bodies always use braces.
    fn expect_arrow_block(&mut self, construct: &str) -> Option<Vec<Stmt>> {
        match self.parse_arrow()? {
            ArrowBody::Block(stmts, _) => Some(stmts),
            ArrowBody::Expression(expr) => {
                self.error_at(
                    ErrorCode::WRONG_ARITY,
                    format!("{construct} expects '() => {{ assignments }}'"),
                    expr.span,
                );
                None
            }
        }
    }

    /// `{ key: expr }` — a single-key config object.
    fn parse_config_object(&mut self, construct: &str, key: &str) -> Option<Expr> {
        self.expect(&TokenKind::LBrace)?;
        let name = self.expect_identifier()?;
        if name.name != key {
            self.error_at(
                ErrorCode::WRONG_ARITY,
                format!(
                    "{construct} config expects '{{ {key}: ... }}', got '{}'",
                    name.name
                ),
                name.span,
            );
        }
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_expression()?;
        self.eat(&TokenKind::Comma);
        self.expect(&TokenKind::RBrace)?;
        Some(value)
    }
}
