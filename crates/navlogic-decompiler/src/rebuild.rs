//! Condition, value, and action rebuilding: from records and operand
//! pairs back to source-level AST expressions.
//!
//! Expressions are rebuilt as [`navlogic_types::ast::Expr`] nodes with
//! placeholder spans and rendered through the shared `Display`
//! implementation, so the decompiler and the compiler agree on operator
//! precedence and parenthesization.

use navlogic_types::ast::{BinOp, Expr, ExprKind, Ident, LogicalOp, UnaryOp};
use navlogic_types::catalog::LeafKind;
use navlogic_types::{ErrorCode, Instruction, Operand, OperandType, Operation, Span};

use crate::decompiler::Decompiler;

fn sp() -> Span {
    Span::point(1, 1)
}

fn path_expr(segments: &[&str]) -> Expr {
    Expr::new(
        ExprKind::Path(segments.iter().map(|s| Ident::new(*s, sp())).collect()),
        sp(),
    )
}

fn index_expr(root: &str, index: i32) -> Expr {
    Expr::new(
        ExprKind::Index {
            base: root.split('.').map(|s| Ident::new(s, sp())).collect(),
            index: Box::new(Expr::new(ExprKind::NumberLit(index), sp())),
        },
        sp(),
    )
}

fn num(n: i32) -> Expr {
    Expr::new(ExprKind::NumberLit(n), sp())
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        sp(),
    )
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        sp(),
    )
}

fn not(operand: Expr) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        sp(),
    )
}

fn call(callee: &[&str], args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: callee.iter().map(|s| Ident::new(*s, sp())).collect(),
            args,
        },
        sp(),
    )
}

impl<'a> Decompiler<'a> {
    // ══════════════════════════════════════════════════════════════════════
    // Conditions
    // ══════════════════════════════════════════════════════════════════════

    /// Rebuild the boolean expression computed by `slot`.
    pub(crate) fn condition_slot_expr(&mut self, slot: i32) -> Expr {
        let Some(record) = self.table.get(slot).copied() else {
            self.warn(
                ErrorCode::LOSSY_DECOMPILE,
                format!("reference to missing slot {slot}; substituted 'true'"),
            );
            return Expr::new(ExprKind::BoolLit(true), sp());
        };
        self.mark_used(slot);

        match record.op {
            Operation::True => Expr::new(ExprKind::BoolLit(true), sp()),

            Operation::Equal => {
                // `member == 1` over a boolean leaf folds back to the
                // bare member.
                if record.b == Operand::value(1) {
                    if let Some(expr) = self.boolish_operand(record.a) {
                        return expr;
                    }
                }
                let a = self.value_operand_expr(record.a);
                let b = self.value_operand_expr(record.b);
                binary(BinOp::Eq, a, b)
            }
            Operation::GreaterThan => {
                let a = self.value_operand_expr(record.a);
                let b = self.value_operand_expr(record.b);
                binary(BinOp::Gt, a, b)
            }
            Operation::LowerThan => {
                let a = self.value_operand_expr(record.a);
                let b = self.value_operand_expr(record.b);
                binary(BinOp::Lt, a, b)
            }
            Operation::ApproxEqual => {
                self.warn(
                    ErrorCode::LOSSY_DECOMPILE,
                    format!("slot {slot}: approximate equality rendered as '=='"),
                );
                let a = self.value_operand_expr(record.a);
                let b = self.value_operand_expr(record.b);
                binary(BinOp::Eq, a, b)
            }

            // `NOT` over a comparison folds to the combined operator the
            // compiler lowered it from.
            Operation::Not => self.rebuild_not(record),

            Operation::And => {
                let a = self.condition_operand(record.a);
                let b = self.condition_operand(record.b);
                logical(LogicalOp::And, a, b)
            }
            Operation::Or => {
                let a = self.condition_operand(record.a);
                let b = self.condition_operand(record.b);
                logical(LogicalOp::Or, a, b)
            }
            Operation::Xor => {
                let a = self.condition_operand(record.a);
                let b = self.condition_operand(record.b);
                binary(BinOp::Ne, a, b)
            }
            Operation::Nand => {
                let a = self.condition_operand(record.a);
                let b = self.condition_operand(record.b);
                not(logical(LogicalOp::And, a, b))
            }
            Operation::Nor => {
                let a = self.condition_operand(record.a);
                let b = self.condition_operand(record.b);
                not(logical(LogicalOp::Or, a, b))
            }

            op if op.produces_value() => self.value_slot_expr(slot),

            op => {
                self.warn(
                    ErrorCode::UNSUPPORTED_OPCODE,
                    format!("slot {slot}: operation '{op:?}' cannot appear in a condition; substituted 'true'"),
                );
                Expr::new(ExprKind::BoolLit(true), sp())
            }
        }
    }

    fn rebuild_not(&mut self, record: Instruction) -> Expr {
        if record.a.kind == OperandType::LcResult {
            if let Some(inner) = self.table.get(record.a.value).copied() {
                let folded = match inner.op {
                    Operation::Equal => Some(BinOp::Ne),
                    Operation::LowerThan => Some(BinOp::Ge),
                    Operation::GreaterThan => Some(BinOp::Le),
                    _ => None,
                };
                if let Some(op) = folded {
                    self.mark_used(inner.slot);
                    let a = self.value_operand_expr(inner.a);
                    let b = self.value_operand_expr(inner.b);
                    return binary(op, a, b);
                }
                return not(self.condition_slot_expr(inner.slot));
            }
        }
        // `NOT 1` is the canonical literal false.
        if record.a == Operand::value(1) {
            return Expr::new(ExprKind::BoolLit(false), sp());
        }
        not(self.condition_operand(record.a))
    }

    /// A condition-position operand: an `LcResult` chases the producing
    /// slot; anything else reads as a boolean member.
    pub(crate) fn condition_operand(&mut self, operand: Operand) -> Expr {
        if operand.kind == OperandType::LcResult {
            return self.condition_slot_expr(operand.value);
        }
        self.boolish_operand(operand)
            .unwrap_or_else(|| self.value_operand_expr(operand))
    }

    /// A boolean-kind catalog leaf for this operand, if there is one.
    fn boolish_operand(&mut self, operand: Operand) -> Option<Expr> {
        let path = self.catalog.path_for_operand(operand)?;
        let leaf = self.catalog.leaf(path)?;
        if leaf.kind != LeafKind::Bool {
            return None;
        }
        let segments: Vec<&str> = path.split('.').collect();
        self.roots.insert(segments[0].to_string());
        Some(path_expr(&segments))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Values
    // ══════════════════════════════════════════════════════════════════════

    /// Map an operand pair back to a source-level expression.
    pub(crate) fn value_operand_expr(&mut self, operand: Operand) -> Expr {
        match operand.kind {
            OperandType::Value => num(operand.value),
            OperandType::Gvar => {
                self.roots.insert("gvar".into());
                index_expr("gvar", operand.value)
            }
            OperandType::RcChannel => {
                self.roots.insert("rc".into());
                // Wire channels are 1-based; the source level is 0-based.
                index_expr("rc", operand.value - 1)
            }
            OperandType::Flight => match self.catalog.path_for_operand(operand) {
                Some(path) => {
                    let segments: Vec<&str> = path.split('.').collect();
                    self.roots.insert(segments[0].to_string());
                    path_expr(&segments)
                }
                None => {
                    self.warn(
                        ErrorCode::SYNTHESIZED_NAME,
                        format!("no catalog name for telemetry value {}", operand.value),
                    );
                    self.roots.insert("flight".into());
                    let synthesized = format!("telemetry{}", operand.value);
                    path_expr(&["flight", &synthesized])
                }
            },
            OperandType::FlightMode => {
                self.roots.insert("flight".into());
                match self.catalog.mode_name(operand.value) {
                    Some(mode) => path_expr(&["flight", "mode", mode]),
                    None => {
                        self.warn(
                            ErrorCode::SYNTHESIZED_NAME,
                            format!("no name for flight mode index {}", operand.value),
                        );
                        let synthesized = format!("mode{}", operand.value);
                        path_expr(&["flight", "mode", &synthesized])
                    }
                }
            }
            OperandType::LcResult => self.value_slot_expr(operand.value),
            OperandType::Pid => {
                self.warn(
                    ErrorCode::SYNTHESIZED_NAME,
                    format!("PID output {} has no importable source name", operand.value),
                );
                index_expr("pid", operand.value)
            }
            OperandType::Waypoints => match self.catalog.path_for_operand(operand) {
                Some(path) => {
                    let segments: Vec<&str> = path.split('.').collect();
                    self.roots.insert(segments[0].to_string());
                    path_expr(&segments)
                }
                None => {
                    self.warn(
                        ErrorCode::SYNTHESIZED_NAME,
                        format!("no catalog name for waypoint value {}", operand.value),
                    );
                    self.roots.insert("waypoint".into());
                    let synthesized = format!("value{}", operand.value);
                    path_expr(&["waypoint", &synthesized])
                }
            },
        }
    }

    /// Rebuild the numeric expression computed by `slot`.
    pub(crate) fn value_slot_expr(&mut self, slot: i32) -> Expr {
        let Some(record) = self.table.get(slot).copied() else {
            self.warn(
                ErrorCode::LOSSY_DECOMPILE,
                format!("reference to missing slot {slot}; substituted 0"),
            );
            return num(0);
        };
        self.mark_used(slot);

        // `max(x, 0 - x)` is the compiler's expansion of Math.abs.
        if record.op == Operation::Max {
            if let Some(expr) = self.try_rebuild_abs(&record) {
                return expr;
            }
        }

        let arith = match record.op {
            Operation::Add => Some(BinOp::Add),
            Operation::Sub => Some(BinOp::Sub),
            Operation::Mul => Some(BinOp::Mul),
            Operation::Div => Some(BinOp::Div),
            Operation::Modulus => Some(BinOp::Mod),
            _ => None,
        };
        if let Some(op) = arith {
            let a = self.value_operand_expr(record.a);
            let b = self.value_operand_expr(record.b);
            return binary(op, a, b);
        }

        match record.op {
            Operation::Min | Operation::Max => {
                let name = if record.op == Operation::Min {
                    "min"
                } else {
                    "max"
                };
                self.warn(
                    ErrorCode::UNSUPPORTED_OPCODE,
                    format!("slot {slot}: 'Math.{name}' has no compilable source form"),
                );
                let a = self.value_operand_expr(record.a);
                let b = self.value_operand_expr(record.b);
                call(&["Math", name], vec![a, b])
            }
            Operation::Sin | Operation::Cos | Operation::Tan => {
                let name = match record.op {
                    Operation::Sin => "sin",
                    Operation::Cos => "cos",
                    _ => "tan",
                };
                self.warn(
                    ErrorCode::UNSUPPORTED_OPCODE,
                    format!("slot {slot}: 'Math.{name}' has no compilable source form"),
                );
                let a = self.value_operand_expr(record.a);
                call(&["Math", name], vec![a])
            }
            op if op.produces_boolean() => self.condition_slot_expr(slot),
            op => {
                self.warn(
                    ErrorCode::UNSUPPORTED_OPCODE,
                    format!("slot {slot}: operation '{op:?}' cannot appear in an expression; substituted 0"),
                );
                num(0)
            }
        }
    }

    /// `Max(x, lc)` where `lc = Sub(0, x)` folds back to `Math.abs(x)`.
    fn try_rebuild_abs(&mut self, record: &Instruction) -> Option<Expr> {
        if record.b.kind != OperandType::LcResult {
            return None;
        }
        let negation = self.table.get(record.b.value).copied()?;
        let is_negation = negation.op == Operation::Sub
            && negation.a == Operand::value(0)
            && negation.b == record.a;
        if !is_negation {
            return None;
        }
        self.mark_used(negation.slot);
        self.roots.insert("Math".into());
        let x = self.value_operand_expr(record.a);
        Some(call(&["Math", "abs"], vec![x]))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Actions
    // ══════════════════════════════════════════════════════════════════════

    /// Rebuild one action record as a source statement line.
    pub(crate) fn rebuild_action(&mut self, record: &Instruction) -> Option<String> {
        match record.op {
            Operation::GvarSet => {
                self.roots.insert("gvar".into());
                let value = self.value_operand_expr(record.b);
                Some(format!("gvar[{}] = {value};", record.a.value))
            }
            Operation::GvarInc => {
                self.roots.insert("gvar".into());
                let index = record.a.value;
                let step = self.value_operand_expr(record.b);
                Some(format!("gvar[{index}] = gvar[{index}] + {step};"))
            }
            Operation::GvarDec => {
                self.roots.insert("gvar".into());
                let index = record.a.value;
                let step = self.value_operand_expr(record.b);
                Some(format!("gvar[{index}] = gvar[{index}] - {step};"))
            }
            Operation::RcChannelOverride => {
                self.roots.insert("override".into());
                let value = self.value_operand_expr(record.b);
                Some(format!("override.rc[{}] = {value};", record.a.value - 1))
            }
            op => {
                let Some(path) = self.catalog.path_for_write_op(op) else {
                    self.warn(
                        ErrorCode::UNSUPPORTED_OPCODE,
                        format!("slot {}: action '{op:?}' has no source form", record.slot),
                    );
                    return Some(format!(
                        "// slot {}: unsupported action '{op:?}'",
                        record.slot
                    ));
                };
                self.roots.insert("override".into());
                let is_bool = self
                    .catalog
                    .leaf(path)
                    .map(|l| l.kind == LeafKind::Bool)
                    .unwrap_or(false);
                if is_bool && record.a.kind == OperandType::Value {
                    let flag = record.a.value != 0;
                    return Some(format!("{path} = {flag};"));
                }
                let value = self.value_operand_expr(record.a);
                Some(format!("{path} = {value};"))
            }
        }
    }
}
