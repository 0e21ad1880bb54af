//! Integration tests for the NavLogic code generator.
//!
//! Tests validate:
//! - Condition lowering shapes (comparisons, logic, negation)
//! - The DAG invariant: back-references only
//! - Activator validity on every gated record
//! - Special-construct lowering and operand resolution

use navlogic_codegen::{generate, CodegenError};
use navlogic_lexer::Lexer;
use navlogic_parser::Parser;
use navlogic_types::{
    ApiCatalog, Instruction, OperandType, Operation, SourceFile, NO_ACTIVATOR,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse source into a Program AST (panics on parse errors). Codegen
/// inputs here avoid `let`/`var` so no binding resolution is needed.
fn parse(source: &str) -> navlogic_types::ast::Program {
    let sf = SourceFile::new("test.js", source);
    let lex = Lexer::new(&sf).lex();
    let result = Parser::new(lex.tokens, &sf).parse();
    if result.errors.has_errors() {
        panic!(
            "parse errors:\n{}",
            result
                .errors
                .errors
                .iter()
                .map(|e| format!("  [{}] {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
    result.program.expect("no program after successful parse")
}

fn lower(source: &str) -> Vec<Instruction> {
    let catalog = ApiCatalog::new();
    generate(&parse(source), &catalog).expect("codegen should succeed")
}

fn lower_err(source: &str) -> CodegenError {
    let catalog = ApiCatalog::new();
    generate(&parse(source), &catalog).expect_err("codegen should fail")
}

// ══════════════════════════════════════════════════════════════════════════════
// Structural invariants
// ══════════════════════════════════════════════════════════════════════════════

/// Every `LcResult` operand must reference an earlier slot.
fn assert_dag(instructions: &[Instruction]) {
    for inst in instructions {
        for operand in [inst.a, inst.b] {
            if operand.kind == OperandType::LcResult {
                assert!(
                    operand.value < inst.slot,
                    "slot {} references slot {} (not a back-reference)",
                    inst.slot,
                    operand.value
                );
            }
        }
    }
}

/// Every non-(-1) activator must name an earlier, enabled, boolean slot.
fn assert_activators(instructions: &[Instruction]) {
    for inst in instructions {
        if inst.activator == NO_ACTIVATOR {
            continue;
        }
        let activator = instructions
            .iter()
            .find(|i| i.slot == inst.activator)
            .unwrap_or_else(|| panic!("slot {} gated by missing slot", inst.slot));
        assert!(activator.enabled);
        assert!(
            activator.op.produces_boolean(),
            "activator {:?} is not boolean",
            activator.op
        );
        assert!(activator.slot < inst.slot);
    }
}

#[test]
fn test_dag_and_activator_invariants_hold() {
    let sources = [
        "if (flight.homeDistance > 100) { override.vtx.power = 3; }",
        "if (flight.mode.failsafe || (flight.cellVoltage < 330 && flight.homeDistance > 500)) { override.throttleScale = 50; }",
        "gvar[0] = Math.abs(flight.roll - 1500);",
        "on.arm({ delay: 1 }, () => { gvar[0] = flight.yaw; });",
        "sticky(() => flight.isArmed, () => flight.mode.failsafe, () => { gvar[1] = 1; });",
        "edge(() => flight.rssi < 50, { duration: 500 }, () => { override.vtx.power = 1; });",
    ];
    for source in sources {
        let instructions = lower(source);
        assert_dag(&instructions);
        assert_activators(&instructions);
    }
}

#[test]
fn test_slots_are_dense_from_zero() {
    let instructions = lower(
        "if (flight.rssi < 50) { override.vtx.power = 1; gvar[0] = 2; }",
    );
    for (i, inst) in instructions.iter().enumerate() {
        assert_eq!(inst.slot, i as i32);
        assert!(inst.enabled);
        assert_eq!(inst.flags, 0);
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Condition lowering
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_comparison_opcodes() {
    let eq = lower("if (flight.gpsSats == 6) { gvar[0] = 1; }");
    assert_eq!(eq[0].op, Operation::Equal);

    let gt = lower("if (flight.gpsSats > 6) { gvar[0] = 1; }");
    assert_eq!(gt[0].op, Operation::GreaterThan);

    let lt = lower("if (flight.gpsSats < 6) { gvar[0] = 1; }");
    assert_eq!(lt[0].op, Operation::LowerThan);
}

#[test]
fn test_not_equal_is_negated_equal() {
    let instructions = lower("if (flight.gpsSats != 6) { gvar[0] = 1; }");
    assert_eq!(instructions[0].op, Operation::Equal);
    assert_eq!(instructions[1].op, Operation::Not);
    assert_eq!(instructions[1].a.kind, OperandType::LcResult);
    assert_eq!(instructions[2].activator, 1);
}

#[test]
fn test_boolean_member_compares_to_one() {
    let instructions = lower("if (flight.mode.failsafe) { gvar[0] = 1; }");
    assert_eq!(instructions[0].op, Operation::Equal);
    assert_eq!(instructions[0].a.kind, OperandType::FlightMode);
    assert_eq!(instructions[0].a.value, 0);
    assert_eq!(instructions[0].b.kind, OperandType::Value);
    assert_eq!(instructions[0].b.value, 1);
}

#[test]
fn test_literal_true_condition() {
    let instructions = lower("if (true) { gvar[0] = 1; }");
    assert_eq!(instructions[0].op, Operation::True);
}

#[test]
fn test_literal_false_condition_is_not_one() {
    let instructions = lower("if (false) { gvar[0] = 1; }");
    assert_eq!(instructions[0].op, Operation::Not);
    assert_eq!(instructions[0].a.kind, OperandType::Value);
    assert_eq!(instructions[0].a.value, 1);
}

#[test]
fn test_logical_operands_point_at_slots() {
    let instructions =
        lower("if (flight.isArmed && flight.gpsSats > 5) { gvar[0] = 1; }");
    let and = &instructions[2];
    assert_eq!(and.op, Operation::And);
    assert_eq!(and.a.kind, OperandType::LcResult);
    assert_eq!(and.a.value, 0);
    assert_eq!(and.b.kind, OperandType::LcResult);
    assert_eq!(and.b.value, 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Operand resolution
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rc_channel_translated_once() {
    let instructions = lower("if (rc[5] > 1700) { gvar[0] = 1; }");
    assert_eq!(instructions[0].a.kind, OperandType::RcChannel);
    // 0-based source index 5 is wire channel 6.
    assert_eq!(instructions[0].a.value, 6);
}

#[test]
fn test_override_rc_write_shape() {
    let instructions = lower("override.rc[4] = 1500;");
    let inst = &instructions[0];
    assert_eq!(inst.op, Operation::RcChannelOverride);
    assert_eq!(inst.a.value, 5);
    assert_eq!(inst.b.value, 1500);
}

#[test]
fn test_waypoint_operands() {
    let instructions = lower("if (waypoint.distanceToWaypoint < 100) { gvar[0] = 1; }");
    assert_eq!(instructions[0].a.kind, OperandType::Waypoints);
    assert_eq!(instructions[0].a.value, 4);
}

#[test]
fn test_boolean_override_writes_one() {
    let instructions = lower("override.armingSafety = true;");
    let inst = &instructions[0];
    assert_eq!(inst.op, Operation::OverrideArmingSafety);
    assert_eq!(inst.a.kind, OperandType::Value);
    assert_eq!(inst.a.value, 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Special constructs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_timer_operand_shape() {
    let instructions = lower("timer(250, 750, () => { gvar[0] = 1; });");
    let timer = &instructions[0];
    assert_eq!(timer.op, Operation::Timer);
    assert_eq!((timer.a.value, timer.b.value), (250, 750));
    assert_eq!(instructions[1].activator, 0);
}

#[test]
fn test_delta_monitors_resolved_operand() {
    let instructions = lower("whenChanged(flight.altitude, 25, () => { gvar[0] = 1; });");
    let delta = &instructions[0];
    assert_eq!(delta.op, Operation::Delta);
    assert_eq!(delta.a.kind, OperandType::Flight);
    assert_eq!(delta.b.value, 25);
}

#[test]
fn test_non_literal_duration_is_shape_error() {
    let err = lower_err(
        "edge(() => flight.isArmed, { duration: flight.rssi }, () => { gvar[0] = 1; });",
    );
    assert!(matches!(err, CodegenError::NonLiteralDuration { .. }));
}

#[test]
fn test_non_literal_threshold_is_shape_error() {
    let err =
        lower_err("whenChanged(flight.altitude, flight.rssi, () => { gvar[0] = 1; });");
    assert!(matches!(err, CodegenError::NonLiteralThreshold { .. }));
}

#[test]
fn test_table_overflow_error() {
    let mut source = String::new();
    for i in 0..33 {
        source.push_str(&format!("if (flight.rssi > {i}) {{ gvar[0] = 1; }}\n"));
    }
    let err = lower_err(&source);
    assert!(matches!(err, CodegenError::TableOverflow { cap: 64, .. }));
}
