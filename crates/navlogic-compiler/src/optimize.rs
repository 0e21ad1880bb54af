//! AST optimizer: constant folding and common-subexpression elimination
//! across sibling conditionals.
//!
//! Both passes are pure AST→AST and idempotent: running the optimizer on
//! its own output changes nothing.
//!
//! CSE works at the statement level. Conditions are keyed by a recursive
//! hash that ignores source positions; when a later `if` handler's
//! condition (or its exact negation) collides with an earlier one, the
//! later handler is marked to reuse the earlier statement's emitted slot
//! (plus one `NOT` record for the negated case). Hash hits are confirmed
//! by a span-insensitive structural comparison before marking.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use navlogic_types::ast::*;

/// Optimize a program: fold constants, then mark condition reuse.
pub fn optimize(program: Program) -> Program {
    let mut statements: Vec<Stmt> = program
        .statements
        .into_iter()
        .map(fold_statement)
        .collect();
    mark_condition_reuse(&mut statements);
    Program {
        statements,
        span: program.span,
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Constant folding
// ══════════════════════════════════════════════════════════════════════════

fn fold_statement(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Assign(assign) => Stmt::Assign(AssignStmt {
            target: assign.target,
            value: fold(assign.value),
            span: assign.span,
        }),
        Stmt::Binding(binding) => Stmt::Binding(BindingStmt {
            kind: binding.kind,
            name: binding.name,
            init: fold(binding.init),
            span: binding.span,
        }),
        Stmt::Handler(handler) => Stmt::Handler(EventHandler {
            kind: handler.kind,
            condition: handler.condition.map(fold),
            off_condition: handler.off_condition.map(fold),
            value: handler.value.map(fold),
            config: HandlerConfig {
                delay: handler.config.delay.map(fold),
                duration: handler.config.duration.map(fold),
                on_ms: handler.config.on_ms.map(fold),
                off_ms: handler.config.off_ms.map(fold),
                threshold: handler.config.threshold.map(fold),
            },
            body: handler.body.into_iter().map(fold_statement).collect(),
            reuse: handler.reuse,
            span: handler.span,
        }),
        other => other,
    }
}

/// Fold an expression bottom-up. Division and modulus by a literal zero
/// are left untouched for the analyzer's diagnostics to see.
pub fn fold(expr: Expr) -> Expr {
    let span = expr.span;
    match expr.kind {
        ExprKind::Binary { op, left, right } => {
            let left = fold(*left);
            let right = fold(*right);
            if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
                if let Some(kind) = fold_binary(op, l, r) {
                    return Expr::new(kind, span);
                }
            }
            Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            )
        }
        ExprKind::Logical { op, left, right } => {
            let left = fold(*left);
            let right = fold(*right);
            if let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) {
                let value = match op {
                    LogicalOp::And => l && r,
                    LogicalOp::Or => l || r,
                };
                return Expr::new(ExprKind::BoolLit(value), span);
            }
            Expr::new(
                ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            )
        }
        ExprKind::Unary { op, operand } => {
            let operand = fold(*operand);
            match op {
                UnaryOp::Not => {
                    if let Some(b) = operand.as_bool() {
                        return Expr::new(ExprKind::BoolLit(!b), span);
                    }
                }
                UnaryOp::Neg => {
                    if let Some(n) = operand.as_number() {
                        return Expr::new(ExprKind::NumberLit(n.wrapping_neg()), span);
                    }
                }
            }
            Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            )
        }
        ExprKind::Call { callee, args } => {
            let args: Vec<Expr> = args.into_iter().map(fold).collect();
            let is_abs = callee.len() == 2
                && callee[0].name == "Math"
                && callee[1].name == "abs";
            if is_abs && args.len() == 1 {
                if let Some(n) = args[0].as_number() {
                    return Expr::new(ExprKind::NumberLit(n.saturating_abs()), span);
                }
            }
            Expr::new(ExprKind::Call { callee, args }, span)
        }
        ExprKind::Index { base, index } => Expr::new(
            ExprKind::Index {
                base,
                index: Box::new(fold(*index)),
            },
            span,
        ),
        other => Expr::new(other, span),
    }
}

fn fold_binary(op: BinOp, l: i32, r: i32) -> Option<ExprKind> {
    Some(match op {
        BinOp::Add => ExprKind::NumberLit(l.wrapping_add(r)),
        BinOp::Sub => ExprKind::NumberLit(l.wrapping_sub(r)),
        BinOp::Mul => ExprKind::NumberLit(l.wrapping_mul(r)),
        BinOp::Div if r != 0 => ExprKind::NumberLit(l.wrapping_div(r)),
        BinOp::Mod if r != 0 => ExprKind::NumberLit(l.wrapping_rem(r)),
        BinOp::Div | BinOp::Mod => return None,
        BinOp::Eq => ExprKind::BoolLit(l == r),
        BinOp::Ne => ExprKind::BoolLit(l != r),
        BinOp::Gt => ExprKind::BoolLit(l > r),
        BinOp::Lt => ExprKind::BoolLit(l < r),
        BinOp::Ge => ExprKind::BoolLit(l >= r),
        BinOp::Le => ExprKind::BoolLit(l <= r),
    })
}

// ══════════════════════════════════════════════════════════════════════════
// Common-subexpression elimination
// ══════════════════════════════════════════════════════════════════════════

fn mark_condition_reuse(statements: &mut [Stmt]) {
    // condition hash → (statement index, condition clone for confirmation)
    let mut seen: HashMap<u64, (usize, Expr)> = HashMap::new();

    for index in 0..statements.len() {
        let Stmt::Handler(handler) = &statements[index] else {
            continue;
        };
        if handler.kind != HandlerKind::If || handler.reuse.is_some() {
            continue;
        }
        let Some(condition) = handler.condition.clone() else {
            continue;
        };

        let key = condition_hash(&condition);
        let reuse = if let Some((earlier, original)) = seen.get(&key) {
            ast_eq(&condition, original).then_some(CondReuse {
                statement: *earlier,
                negated: false,
            })
        } else {
            None
        };

        // `if (!cond)` after `if (cond)`: reuse the base slot through NOT.
        let reuse = reuse.or_else(|| {
            let ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } = &condition.kind
            else {
                return None;
            };
            let inner_key = condition_hash(operand);
            seen.get(&inner_key).and_then(|(earlier, original)| {
                ast_eq(operand, original).then_some(CondReuse {
                    statement: *earlier,
                    negated: true,
                })
            })
        });

        if let Some(reuse) = reuse {
            if let Stmt::Handler(handler) = &mut statements[index] {
                handler.reuse = Some(reuse);
            }
        } else {
            seen.entry(key).or_insert((index, condition));
        }
    }
}

/// Recursive hash over an expression's structure, ignoring spans.
pub fn condition_hash(expr: &Expr) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_expr(expr, &mut hasher);
    hasher.finish()
}

fn hash_expr(expr: &Expr, hasher: &mut DefaultHasher) {
    std::mem::discriminant(&expr.kind).hash(hasher);
    match &expr.kind {
        ExprKind::NumberLit(n) => n.hash(hasher),
        ExprKind::BoolLit(b) => b.hash(hasher),
        ExprKind::Path(segments) => {
            for s in segments {
                s.name.hash(hasher);
            }
        }
        ExprKind::Index { base, index } => {
            for s in base {
                s.name.hash(hasher);
            }
            hash_expr(index, hasher);
        }
        ExprKind::Binary { op, left, right } => {
            op.hash(hasher);
            hash_expr(left, hasher);
            hash_expr(right, hasher);
        }
        ExprKind::Logical { op, left, right } => {
            op.hash(hasher);
            hash_expr(left, hasher);
            hash_expr(right, hasher);
        }
        ExprKind::Unary { op, operand } => {
            op.hash(hasher);
            hash_expr(operand, hasher);
        }
        ExprKind::Call { callee, args } => {
            for s in callee {
                s.name.hash(hasher);
            }
            for a in args {
                hash_expr(a, hasher);
            }
        }
    }
}

/// Span-insensitive structural equality.
pub fn ast_eq(a: &Expr, b: &Expr) -> bool {
    match (&a.kind, &b.kind) {
        (ExprKind::NumberLit(x), ExprKind::NumberLit(y)) => x == y,
        (ExprKind::BoolLit(x), ExprKind::BoolLit(y)) => x == y,
        (ExprKind::Path(x), ExprKind::Path(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| l.name == r.name)
        }
        (
            ExprKind::Index { base: xb, index: xi },
            ExprKind::Index { base: yb, index: yi },
        ) => {
            xb.len() == yb.len()
                && xb.iter().zip(yb).all(|(l, r)| l.name == r.name)
                && ast_eq(xi, yi)
        }
        (
            ExprKind::Binary {
                op: xo,
                left: xl,
                right: xr,
            },
            ExprKind::Binary {
                op: yo,
                left: yl,
                right: yr,
            },
        ) => xo == yo && ast_eq(xl, yl) && ast_eq(xr, yr),
        (
            ExprKind::Logical {
                op: xo,
                left: xl,
                right: xr,
            },
            ExprKind::Logical {
                op: yo,
                left: yl,
                right: yr,
            },
        ) => xo == yo && ast_eq(xl, yl) && ast_eq(xr, yr),
        (
            ExprKind::Unary {
                op: xo,
                operand: xp,
            },
            ExprKind::Unary {
                op: yo,
                operand: yp,
            },
        ) => xo == yo && ast_eq(xp, yp),
        (
            ExprKind::Call {
                callee: xc,
                args: xa,
            },
            ExprKind::Call {
                callee: yc,
                args: ya,
            },
        ) => {
            xc.len() == yc.len()
                && xc.iter().zip(yc).all(|(l, r)| l.name == r.name)
                && xa.len() == ya.len()
                && xa.iter().zip(ya).all(|(l, r)| ast_eq(l, r))
        }
        _ => false,
    }
}
