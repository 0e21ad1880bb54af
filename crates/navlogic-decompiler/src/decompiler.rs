//! Table scanning, activator grouping, and statement emission.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write;

use navlogic_types::{
    ApiCatalog, ErrorCode, Instruction, Operand, OperandType, Operation, ScriptError, Span,
    NO_ACTIVATOR,
};

use crate::{DecompileResult, DecompileStats};

/// File name attached to decompiler warnings.
const TABLE_NAME: &str = "rule-table";

/// The indexed view of the enabled rule table.
pub(crate) struct RuleTable {
    /// Enabled records up to the unused tail, in slot order.
    records: Vec<Instruction>,
    by_slot: HashMap<i32, Instruction>,
    /// Activator slot → slots it gates, in slot order.
    children: HashMap<i32, Vec<i32>>,
    total: usize,
    enabled: usize,
}

impl RuleTable {
    /// Scan the raw table: keep enabled records, stopping at the first
    /// clearly-unused tail record (disabled, default opcode, no
    /// activator).
    fn scan(input: &[Instruction]) -> Self {
        let mut records = Vec::new();
        for record in input {
            let unused_tail =
                !record.enabled && record.op == Operation::True && record.activator == NO_ACTIVATOR;
            if unused_tail {
                break;
            }
            if record.enabled {
                records.push(*record);
            }
        }

        let by_slot: HashMap<i32, Instruction> =
            records.iter().map(|r| (r.slot, *r)).collect();
        let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
        for record in &records {
            if record.activator != NO_ACTIVATOR {
                children.entry(record.activator).or_default().push(record.slot);
            }
        }

        Self {
            enabled: records.len(),
            records,
            by_slot,
            children,
            total: input.len(),
        }
    }

    pub(crate) fn get(&self, slot: i32) -> Option<&Instruction> {
        self.by_slot.get(&slot)
    }

    fn gated_by(&self, slot: i32) -> &[i32] {
        self.children.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Decompiler state threaded through grouping and rebuilding.
pub(crate) struct Decompiler<'a> {
    pub(crate) catalog: &'a ApiCatalog,
    pub(crate) table: RuleTable,
    pub(crate) warnings: Vec<ScriptError>,
    /// Import roots referenced by the reconstructed program.
    pub(crate) roots: BTreeSet<String>,
    /// Slots folded into an emitted construct.
    used: HashSet<i32>,
}

impl<'a> Decompiler<'a> {
    pub(crate) fn new(catalog: &'a ApiCatalog, input: &[Instruction]) -> Self {
        Self {
            catalog,
            table: RuleTable::scan(input),
            warnings: Vec::new(),
            roots: BTreeSet::new(),
            used: HashSet::new(),
        }
    }

    pub(crate) fn run(mut self) -> DecompileResult {
        let mut body = String::new();
        let mut groups = 0usize;

        let records: Vec<Instruction> = self.table.records.clone();
        for record in &records {
            if self.used.contains(&record.slot) {
                continue;
            }
            let gates_something = !self.table.gated_by(record.slot).is_empty();
            if gates_something {
                groups += 1;
                self.emit_group(record, &mut body);
            } else if record.op.is_action() {
                // An action gated by a live slot is emitted with its
                // group, even when the activator sits at a higher slot.
                if record.activator != NO_ACTIVATOR && self.table.get(record.activator).is_some() {
                    continue;
                }
                if record.activator != NO_ACTIVATOR {
                    self.warn(
                        ErrorCode::ORPHANED_ACTION,
                        format!(
                            "slot {}: activator {} is missing or disabled; emitted at top level",
                            record.slot, record.activator
                        ),
                    );
                }
                if let Some(stmt) = self.rebuild_action(record) {
                    let _ = writeln!(body, "{stmt}");
                }
                self.used.insert(record.slot);
            }
        }

        // Boolean or arithmetic records nothing ever consumed.
        for record in &records {
            if !self.used.contains(&record.slot) {
                self.warn(
                    ErrorCode::LOSSY_DECOMPILE,
                    format!(
                        "slot {}: result of '{:?}' is never consumed; dropped",
                        record.slot, record.op
                    ),
                );
            }
        }

        let mut code = String::new();
        if !self.roots.is_empty() {
            let roots: Vec<&str> = self.roots.iter().map(String::as_str).collect();
            let _ = writeln!(code, "const {{ {} }} = inav;", roots.join(", "));
            code.push('\n');
        }
        code.push_str(&body);
        if !self.warnings.is_empty() {
            code.push('\n');
            for warning in &self.warnings {
                let _ = writeln!(code, "// warning: {}", warning.message);
            }
        }

        DecompileResult {
            success: true,
            code,
            warnings: self.warnings,
            stats: DecompileStats {
                total: self.table.total,
                enabled: self.table.enabled,
                groups,
            },
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Groups
    // ══════════════════════════════════════════════════════════════════════

    /// Emit one activator group: the handler header from the activator
    /// record, then one body line per gated action.
    fn emit_group(&mut self, activator: &Instruction, out: &mut String) {
        self.used.insert(activator.slot);
        let header = self.rebuild_header(activator);

        let Some(header) = header else {
            // Unknown activator shape: placeholder comment, keep going.
            let _ = writeln!(
                out,
                "// slot {}: unsupported activator operation '{:?}'",
                activator.slot, activator.op
            );
            self.warn(
                ErrorCode::UNSUPPORTED_OPCODE,
                format!(
                    "slot {}: operation '{:?}' has no source form",
                    activator.slot, activator.op
                ),
            );
            // Its actions still need a home.
            for slot in self.table.gated_by(activator.slot).to_vec() {
                if let Some(record) = self.table.get(slot).copied() {
                    if let Some(stmt) = self.rebuild_action(&record) {
                        let _ = writeln!(out, "{stmt}");
                    }
                    self.used.insert(slot);
                }
            }
            return;
        };

        let mut lines = Vec::new();
        for slot in self.table.gated_by(activator.slot).to_vec() {
            let Some(record) = self.table.get(slot).copied() else {
                continue;
            };
            self.used.insert(slot);
            if let Some(stmt) = self.rebuild_action(&record) {
                lines.push(stmt);
            }
        }

        match header {
            GroupHeader::Always => {
                self.roots.insert("on".into());
                let _ = writeln!(out, "on.always(() => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::Arm { delay } => {
                self.roots.insert("on".into());
                let _ = writeln!(out, "on.arm({{ delay: {delay} }}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::If { condition } => {
                let _ = writeln!(out, "if ({condition}) {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}}");
            }
            GroupHeader::Edge {
                condition,
                duration,
            } => {
                self.roots.insert("edge".into());
                let _ = writeln!(out, "edge(() => {condition}, {{ duration: {duration} }}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::Delay {
                condition,
                duration,
            } => {
                self.roots.insert("delay".into());
                let _ = writeln!(out, "delay(() => {condition}, {{ duration: {duration} }}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::Sticky { on, off } => {
                self.roots.insert("sticky".into());
                let _ = writeln!(out, "sticky(() => {on}, () => {off}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::Timer { on_ms, off_ms } => {
                self.roots.insert("timer".into());
                let _ = writeln!(out, "timer({on_ms}, {off_ms}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
            GroupHeader::WhenChanged { value, threshold } => {
                self.roots.insert("whenChanged".into());
                let _ = writeln!(out, "whenChanged({value}, {threshold}, () => {{");
                self.write_body(out, &lines);
                let _ = writeln!(out, "}});");
            }
        }
    }

    fn write_body(&self, out: &mut String, lines: &[String]) {
        for line in lines {
            let _ = writeln!(out, "  {line}");
        }
    }

    /// Recognize the handler form of an activator record.
    fn rebuild_header(&mut self, record: &Instruction) -> Option<GroupHeader> {
        match record.op {
            Operation::True => Some(GroupHeader::Always),

            Operation::Edge => {
                let duration = record.b.value;
                // The on-arm idiom: EDGE over `armTimer > 0`.
                if record.a.kind == OperandType::LcResult {
                    if let Some(cond) = self.table.get(record.a.value).copied() {
                        let is_arm_timer = cond.op == Operation::GreaterThan
                            && cond.a == Operand::flight(0)
                            && cond.b == Operand::value(0);
                        if is_arm_timer {
                            self.used.insert(cond.slot);
                            return Some(GroupHeader::Arm { delay: duration });
                        }
                    }
                }
                let condition = self.condition_operand(record.a).to_string();
                Some(GroupHeader::Edge {
                    condition,
                    duration,
                })
            }

            Operation::Delay => {
                let condition = self.condition_operand(record.a).to_string();
                Some(GroupHeader::Delay {
                    condition,
                    duration: record.b.value,
                })
            }

            Operation::Sticky => Some(GroupHeader::Sticky {
                on: self.condition_operand(record.a).to_string(),
                off: self.condition_operand(record.b).to_string(),
            }),

            Operation::Timer => Some(GroupHeader::Timer {
                on_ms: record.a.value,
                off_ms: record.b.value,
            }),

            Operation::Delta => Some(GroupHeader::WhenChanged {
                value: self.value_operand_expr(record.a).to_string(),
                threshold: record.b.value,
            }),

            op if op.produces_boolean() => Some(GroupHeader::If {
                condition: self.condition_slot_expr(record.slot).to_string(),
            }),

            _ => None,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Diagnostics
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn warn(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.warnings.push(ScriptError::warning(
            TABLE_NAME,
            code,
            message,
            Span::point(1, 1),
            "",
        ));
    }

    pub(crate) fn mark_used(&mut self, slot: i32) {
        self.used.insert(slot);
    }
}

/// The recognized source form of an activator record.
enum GroupHeader {
    Always,
    Arm { delay: i32 },
    If { condition: String },
    Edge { condition: String, duration: i32 },
    Delay { condition: String, duration: i32 },
    Sticky { on: String, off: String },
    Timer { on_ms: i32, off_ms: i32 },
    WhenChanged { value: String, threshold: i32 },
}
