//! The code generator core: walks a validated, optimized, binding-resolved
//! AST and grows an append-only instruction list.
//!
//! By this stage the variable handler has already substituted `let`/`const`
//! bindings and rewritten `var` references to `gvar[..]` indices, so every
//! name here is a catalog path, a register, an RC channel, or a literal.
//!
//! Slot discipline: `next_slot` is simply the list length; references
//! between records always point backwards, so the dependency graph stays
//! acyclic by construction.

use std::collections::HashMap;

use navlogic_types::ast::*;
use navlogic_types::{ApiCatalog, Instruction, Operand, Operation, MAX_SLOTS, NO_ACTIVATOR};

use crate::error::{CodegenError, CodegenResult};

/// Flight telemetry index of the arm timer, used by `on.arm` lowering.
const FLIGHT_ARM_TIMER: i32 = 0;

/// The NavLogic code generator.
pub struct CodeGenerator<'a> {
    pub(crate) catalog: &'a ApiCatalog,
    instructions: Vec<Instruction>,
    /// Top-level statement index → slot of its lowered condition, for
    /// optimizer-marked reuse.
    condition_slots: HashMap<usize, i32>,
    /// Human-readable context for resource errors.
    context: String,
}

/// Lower a program to its rule-table records.
pub fn generate(program: &Program, catalog: &ApiCatalog) -> CodegenResult<Vec<Instruction>> {
    let mut gen = CodeGenerator::new(catalog);
    gen.lower_program(program)?;
    Ok(gen.into_instructions())
}

impl<'a> CodeGenerator<'a> {
    pub fn new(catalog: &'a ApiCatalog) -> Self {
        Self {
            catalog,
            instructions: Vec::new(),
            condition_slots: HashMap::new(),
            context: String::from("program start"),
        }
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Emission
    // ══════════════════════════════════════════════════════════════════════════

    /// Append a record gated by `activator`, returning its slot index.
    pub(crate) fn emit(
        &mut self,
        activator: i32,
        op: Operation,
        a: Operand,
        b: Operand,
    ) -> CodegenResult<i32> {
        if self.instructions.len() >= MAX_SLOTS {
            return Err(CodegenError::TableOverflow {
                cap: MAX_SLOTS,
                context: self.context.clone(),
            });
        }
        let slot = self.instructions.len() as i32;
        self.instructions.push(Instruction::new(slot, activator, op, a, b));
        Ok(slot)
    }

    /// Append an ungated record (conditions and intermediate values).
    pub(crate) fn emit_ungated(
        &mut self,
        op: Operation,
        a: Operand,
        b: Operand,
    ) -> CodegenResult<i32> {
        self.emit(NO_ACTIVATOR, op, a, b)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Program & statements
    // ══════════════════════════════════════════════════════════════════════════

    fn lower_program(&mut self, program: &Program) -> CodegenResult<()> {
        for (index, stmt) in program.statements.iter().enumerate() {
            match stmt {
                // Imports carry no code; bindings were consumed by the
                // variable handler before this stage.
                Stmt::Import(_) | Stmt::Binding(_) => {}
                Stmt::Assign(assign) => {
                    self.context = format!("assignment at line {}", assign.span.line);
                    self.lower_assignment(assign, NO_ACTIVATOR)?;
                }
                Stmt::Handler(handler) => {
                    self.context =
                        format!("'{}' at line {}", handler.kind.as_str(), handler.span.line);
                    self.lower_handler(index, handler)?;
                }
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Event handlers
    // ══════════════════════════════════════════════════════════════════════════

    fn lower_handler(&mut self, index: usize, handler: &EventHandler) -> CodegenResult<()> {
        let activator = match handler.kind {
            HandlerKind::Always => {
                self.emit_ungated(Operation::True, Operand::zero(), Operand::zero())?
            }

            HandlerKind::Arm => {
                let delay = self.literal_config(&handler.config.delay, "on.arm", "delay")?;
                let timer_positive = self.emit_ungated(
                    Operation::GreaterThan,
                    Operand::flight(FLIGHT_ARM_TIMER),
                    Operand::value(0),
                )?;
                self.emit_ungated(
                    Operation::Edge,
                    Operand::lc(timer_positive),
                    Operand::value(delay),
                )?
            }

            HandlerKind::If => self.lower_if_condition(index, handler)?,

            HandlerKind::Edge | HandlerKind::Delay => {
                let construct = handler.kind.as_str();
                let duration = self.literal_config(&handler.config.duration, construct, "duration")?;
                let condition = handler.condition.as_ref().ok_or_else(|| {
                    CodegenError::Internal(format!("{construct} without a condition"))
                })?;
                let cond_slot = self.lower_condition(condition)?;
                let op = if handler.kind == HandlerKind::Edge {
                    Operation::Edge
                } else {
                    Operation::Delay
                };
                self.emit_ungated(op, Operand::lc(cond_slot), Operand::value(duration))?
            }

            HandlerKind::Sticky => {
                let on = handler.condition.as_ref().ok_or_else(|| {
                    CodegenError::Internal("sticky without an on-condition".into())
                })?;
                let off = handler.off_condition.as_ref().ok_or_else(|| {
                    CodegenError::Internal("sticky without an off-condition".into())
                })?;
                let on_slot = self.lower_condition(on)?;
                let off_slot = self.lower_condition(off)?;
                self.emit_ungated(Operation::Sticky, Operand::lc(on_slot), Operand::lc(off_slot))?
            }

            HandlerKind::Timer => {
                let on_ms = self.literal_config(&handler.config.on_ms, "timer", "duration")?;
                let off_ms = self.literal_config(&handler.config.off_ms, "timer", "duration")?;
                self.emit_ungated(Operation::Timer, Operand::value(on_ms), Operand::value(off_ms))?
            }

            HandlerKind::WhenChanged => {
                let threshold = handler
                    .config
                    .threshold
                    .as_ref()
                    .and_then(|e| e.as_number())
                    .ok_or_else(|| CodegenError::NonLiteralThreshold {
                        construct: "whenChanged".into(),
                    })?;
                let value = handler.value.as_ref().ok_or_else(|| {
                    CodegenError::Internal("whenChanged without a value".into())
                })?;
                let monitored = self.resolve_value_operand(value)?;
                self.emit_ungated(Operation::Delta, monitored, Operand::value(threshold))?
            }
        };

        self.condition_slots.insert(index, activator);

        for stmt in &handler.body {
            match stmt {
                Stmt::Assign(assign) => self.lower_assignment(assign, activator)?,
                other => {
                    return Err(CodegenError::Internal(format!(
                        "handler body statement at line {} is not an assignment",
                        other.span().line
                    )))
                }
            }
        }
        Ok(())
    }

    /// Lower an `if` handler's condition, honoring an optimizer-assigned
    /// reuse mark.
    fn lower_if_condition(&mut self, index: usize, handler: &EventHandler) -> CodegenResult<i32> {
        if let Some(reuse) = handler.reuse {
            let base = *self
                .condition_slots
                .get(&reuse.statement)
                .ok_or_else(|| {
                    CodegenError::Internal(format!(
                        "condition reuse points at statement {} with no emitted slot",
                        reuse.statement
                    ))
                })?;
            return if reuse.negated {
                self.emit_ungated(Operation::Not, Operand::lc(base), Operand::zero())
            } else {
                Ok(base)
            };
        }
        let condition = handler
            .condition
            .as_ref()
            .ok_or_else(|| CodegenError::Internal("if handler without a condition".into()))?;
        self.lower_condition(condition)
    }

    /// Extract a required literal config value.
    fn literal_config(
        &self,
        value: &Option<Expr>,
        construct: &str,
        _key: &str,
    ) -> CodegenResult<i32> {
        value
            .as_ref()
            .and_then(|e| e.as_number())
            .ok_or_else(|| CodegenError::NonLiteralDuration {
                construct: construct.into(),
            })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Actions
    // ══════════════════════════════════════════════════════════════════════════

    /// Lower one assignment, gated by `activator`.
    pub(crate) fn lower_assignment(
        &mut self,
        assign: &AssignStmt,
        activator: i32,
    ) -> CodegenResult<()> {
        match &assign.target.kind {
            ExprKind::Index { base, index } => {
                let root: Vec<&str> = base.iter().map(|s| s.name.as_str()).collect();
                let root = root.join(".");
                let idx = index.as_number().ok_or_else(|| {
                    CodegenError::Internal(format!("'{root}' write index must be a literal"))
                })?;
                match root.as_str() {
                    "gvar" => self.lower_register_write(idx, &assign.value, activator),
                    "override.rc" => {
                        let value = self.resolve_write_value(&assign.value, None)?;
                        // Channel numbers are 1-based on the wire.
                        self.emit(
                            activator,
                            Operation::RcChannelOverride,
                            Operand::value(idx + 1),
                            value,
                        )?;
                        Ok(())
                    }
                    _ => Err(CodegenError::Internal(format!(
                        "'{root}' is not an indexed write target"
                    ))),
                }
            }
            ExprKind::Path(segments) => {
                let path: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
                let path = path.join(".");
                let leaf = self.catalog.leaf(&path).ok_or_else(|| {
                    CodegenError::Internal(format!("unresolved write target '{path}'"))
                })?;
                let op = leaf.write_op.ok_or_else(|| {
                    CodegenError::Internal(format!("'{path}' is not writable"))
                })?;
                let value = self.resolve_write_value(&assign.value, leaf.range)?;
                self.emit(activator, op, value, Operand::zero())?;
                Ok(())
            }
            _ => Err(CodegenError::Internal(format!(
                "'{}' is not a writable target",
                assign.target
            ))),
        }
    }

    /// Register writes get the short increment/decrement forms when the
    /// right-hand side is arithmetic over the same register.
    fn lower_register_write(
        &mut self,
        index: i32,
        value: &Expr,
        activator: i32,
    ) -> CodegenResult<()> {
        if let ExprKind::Binary { op, left, right } = &value.kind {
            let self_op = matches!(op, BinOp::Add | BinOp::Sub) && is_gvar_read(left, index);
            if self_op {
                let operation = if *op == BinOp::Add {
                    Operation::GvarInc
                } else {
                    Operation::GvarDec
                };
                let step = self.resolve_value_operand(right)?;
                self.emit(activator, operation, Operand::value(index), step)?;
                return Ok(());
            }
        }
        let operand = self.resolve_write_value(value, self.catalog.indexed("gvar").and_then(|f| f.range))?;
        self.emit(activator, Operation::GvarSet, Operand::value(index), operand)?;
        Ok(())
    }

    /// Resolve an assignment's right-hand side, clamping literal values
    /// into the target's declared range.
    fn resolve_write_value(
        &mut self,
        value: &Expr,
        range: Option<navlogic_types::catalog::Range>,
    ) -> CodegenResult<Operand> {
        let operand = self.resolve_value_operand(value)?;
        if let (Some(range), navlogic_types::OperandType::Value) = (range, operand.kind) {
            let clamped = operand.value.clamp(range.min, range.max);
            return Ok(Operand::value(clamped));
        }
        Ok(operand)
    }
}

/// Returns `true` if `expr` reads exactly `gvar[index]`.
fn is_gvar_read(expr: &Expr, index: i32) -> bool {
    match &expr.kind {
        ExprKind::Index { base, index: idx } => {
            base.len() == 1 && base[0].name == "gvar" && idx.as_number() == Some(index)
        }
        _ => false,
    }
}
