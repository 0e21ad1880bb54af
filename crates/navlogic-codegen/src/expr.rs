//! Expression lowering: conditions to boolean slots, arithmetic to value
//! slots, and leaf operand resolution against the catalog.
//!
//! Every lowering function returns the slot index holding its result so
//! parent scopes can reference it through an `LcResult` operand; the AST
//! itself stores no cross-links.

use navlogic_types::ast::{BinOp, Expr, ExprKind, LogicalOp, UnaryOp};
use navlogic_types::{Operand, Operation};

use crate::compiler::CodeGenerator;
use crate::error::{CodegenError, CodegenResult};

impl<'a> CodeGenerator<'a> {
    // ══════════════════════════════════════════════════════════════════════════
    // Conditions
    // ══════════════════════════════════════════════════════════════════════════

    /// Lower a boolean condition, returning the slot index holding its
    /// 1/0 result. Condition records are never gated; only actions are.
    pub(crate) fn lower_condition(&mut self, expr: &Expr) -> CodegenResult<i32> {
        match &expr.kind {
            ExprKind::BoolLit(true) => self.emit_ungated(Operation::True, Operand::zero(), Operand::zero()),
            // `false` has no dedicated opcode; NOT over a truthy literal.
            ExprKind::BoolLit(false) => {
                self.emit_ungated(Operation::Not, Operand::value(1), Operand::zero())
            }

            ExprKind::Logical { op, left, right } => {
                let lhs = self.lower_condition(left)?;
                let rhs = self.lower_condition(right)?;
                let operation = match op {
                    LogicalOp::And => Operation::And,
                    LogicalOp::Or => Operation::Or,
                };
                self.emit_ungated(operation, Operand::lc(lhs), Operand::lc(rhs))
            }

            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let inner = self.lower_condition(operand)?;
                self.emit_ungated(Operation::Not, Operand::lc(inner), Operand::zero())
            }

            ExprKind::Binary { op, left, right } if op.is_comparison() => {
                let a = self.resolve_value_operand(left)?;
                let b = self.resolve_value_operand(right)?;
                match op {
                    BinOp::Eq => self.emit_ungated(Operation::Equal, a, b),
                    BinOp::Gt => self.emit_ungated(Operation::GreaterThan, a, b),
                    BinOp::Lt => self.emit_ungated(Operation::LowerThan, a, b),
                    // The engine has no direct !=, >=, <= — negate the
                    // complementary comparison, exact over integers.
                    BinOp::Ne => {
                        let eq = self.emit_ungated(Operation::Equal, a, b)?;
                        self.emit_ungated(Operation::Not, Operand::lc(eq), Operand::zero())
                    }
                    BinOp::Ge => {
                        let lt = self.emit_ungated(Operation::LowerThan, a, b)?;
                        self.emit_ungated(Operation::Not, Operand::lc(lt), Operand::zero())
                    }
                    BinOp::Le => {
                        let gt = self.emit_ungated(Operation::GreaterThan, a, b)?;
                        self.emit_ungated(Operation::Not, Operand::lc(gt), Operand::zero())
                    }
                    _ => unreachable!("is_comparison covers exactly these operators"),
                }
            }

            // A boolean member (or anything else operand-shaped) used as a
            // whole condition: compare against 1.
            ExprKind::Path(_) | ExprKind::Index { .. } => {
                let operand = self.resolve_value_operand(expr)?;
                self.emit_ungated(Operation::Equal, operand, Operand::value(1))
            }

            _ => Err(CodegenError::Unsupported(format!(
                "'{expr}' cannot be used as a condition"
            ))),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Operand resolution
    // ══════════════════════════════════════════════════════════════════════════

    /// Resolve an expression to a single operand pair, lowering compound
    /// subexpressions to slots referenced through `LcResult`.
    pub(crate) fn resolve_value_operand(&mut self, expr: &Expr) -> CodegenResult<Operand> {
        if let Some(n) = expr.as_number() {
            return Ok(Operand::value(n));
        }
        match &expr.kind {
            ExprKind::BoolLit(b) => Ok(Operand::value(*b as i32)),

            ExprKind::Path(segments) => {
                let path: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
                let path = path.join(".");
                let leaf = self.catalog.leaf(&path).ok_or_else(|| {
                    CodegenError::Internal(format!("unresolved identifier '{path}'"))
                })?;
                let (kind, value) = leaf.read.ok_or_else(|| {
                    CodegenError::Internal(format!("'{path}' is not readable"))
                })?;
                Ok(Operand::new(kind, value))
            }

            ExprKind::Index { base, index } => {
                let root: Vec<&str> = base.iter().map(|s| s.name.as_str()).collect();
                let root = root.join(".");
                let idx = index.as_number().ok_or_else(|| {
                    CodegenError::Internal(format!("'{root}' index must be a literal"))
                })?;
                match root.as_str() {
                    "gvar" => Ok(Operand::gvar(idx)),
                    "rc" => Ok(Operand::rc_channel(idx)),
                    _ => Err(CodegenError::Internal(format!(
                        "'{root}' cannot be read by index"
                    ))),
                }
            }

            ExprKind::Call { callee, args } => {
                let name: Vec<&str> = callee.iter().map(|s| s.name.as_str()).collect();
                if name == ["Math", "abs"] && args.len() == 1 {
                    let slot = self.lower_abs(&args[0])?;
                    Ok(Operand::lc(slot))
                } else {
                    Err(CodegenError::Unsupported(format!(
                        "call '{}' in expression position",
                        name.join(".")
                    )))
                }
            }

            ExprKind::Binary { .. } => {
                let slot = self.lower_arithmetic(expr)?;
                Ok(Operand::lc(slot))
            }

            // A negated non-literal: 0 - x.
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                let inner = self.resolve_value_operand(operand)?;
                let slot = self.emit_ungated(Operation::Sub, Operand::value(0), inner)?;
                Ok(Operand::lc(slot))
            }

            // Boolean-valued subexpressions read back as their 1/0 slot.
            ExprKind::Logical { .. } | ExprKind::Unary { .. } => {
                let slot = self.lower_condition(expr)?;
                Ok(Operand::lc(slot))
            }

            ExprKind::NumberLit(_) => unreachable!("handled by as_number above"),
        }
    }

    /// Lower an arithmetic expression to a value-producing slot.
    fn lower_arithmetic(&mut self, expr: &Expr) -> CodegenResult<i32> {
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            return Err(CodegenError::Internal(format!(
                "'{expr}' is not an arithmetic expression"
            )));
        };
        if op.is_comparison() {
            // A comparison in value position is its boolean slot.
            return self.lower_condition(expr);
        }
        let a = self.resolve_value_operand(left)?;
        let b = self.resolve_value_operand(right)?;
        let operation = match op {
            BinOp::Add => Operation::Add,
            BinOp::Sub => Operation::Sub,
            BinOp::Mul => Operation::Mul,
            BinOp::Div => Operation::Div,
            BinOp::Mod => Operation::Modulus,
            _ => unreachable!("comparisons handled above"),
        };
        self.emit_ungated(operation, a, b)
    }

    /// `Math.abs(x)` — the engine has no abs opcode: emit `0 - x`, then
    /// `max(x, -x)`, and return the `max` slot.
    fn lower_abs(&mut self, arg: &Expr) -> CodegenResult<i32> {
        let x = self.resolve_value_operand(arg)?;
        let negated = self.emit_ungated(Operation::Sub, Operand::value(0), x)?;
        self.emit_ungated(Operation::Max, x, Operand::lc(negated))
    }
}
