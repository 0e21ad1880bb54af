//! Integration tests for the NavLogic decompiler.
//!
//! Tables are built record-by-record, the way they arrive from the
//! device CLI, and the reconstructed source is checked structurally.

use navlogic_decompiler::decompile_to_result;
use navlogic_types::{ErrorCode, Instruction, Operand, Operation, NO_ACTIVATOR};

fn record(slot: i32, activator: i32, op: Operation, a: Operand, b: Operand) -> Instruction {
    Instruction::new(slot, activator, op, a, b)
}

fn disabled(slot: i32) -> Instruction {
    Instruction {
        enabled: false,
        ..record(
            slot,
            NO_ACTIVATOR,
            Operation::True,
            Operand::zero(),
            Operand::zero(),
        )
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Basic grouping
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_table() {
    let result = decompile_to_result(&[]);
    assert!(result.success);
    assert!(result.code.is_empty());
    assert_eq!(result.stats.total, 0);
    assert_eq!(result.stats.groups, 0);
}

#[test]
fn test_simple_if_group() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::GreaterThan,
            Operand::flight(1),
            Operand::value(100),
        ),
        record(
            1,
            0,
            Operation::SetVtxPowerLevel,
            Operand::value(3),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("const { flight, override } = inav;"));
    assert!(result.code.contains("if (flight.homeDistance > 100) {"));
    assert!(result.code.contains("  override.vtx.power = 3;"));
    assert_eq!(result.stats.groups, 1);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_true_activator_becomes_on_always() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::True,
            Operand::zero(),
            Operand::zero(),
        ),
        record(
            1,
            0,
            Operation::GvarInc,
            Operand::value(0),
            Operand::value(1),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("on.always(() => {"));
    assert!(result.code.contains("gvar[0] = gvar[0] + 1;"));
}

#[test]
fn test_ungated_action_is_top_level() {
    let table = vec![record(
        0,
        NO_ACTIVATOR,
        Operation::OverrideThrottleScale,
        Operand::value(75),
        Operand::zero(),
    )];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("override.throttleScale = 75;"));
    assert_eq!(result.stats.groups, 0);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_scan_stops_at_unused_tail() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::OverrideThrottleScale,
            Operand::value(75),
            Operand::zero(),
        ),
        disabled(1),
        // Garbage after the tail marker must be ignored.
        record(
            2,
            NO_ACTIVATOR,
            Operation::SetVtxPowerLevel,
            Operand::value(1),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert_eq!(result.stats.enabled, 1);
    assert!(!result.code.contains("vtx"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Condition rebuilding
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_logic_rebuilds_inline() {
    // failsafe == 1; cellVoltage < 330; AND; OR; action.
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::Equal,
            Operand::flight_mode(0),
            Operand::value(1),
        ),
        record(
            1,
            NO_ACTIVATOR,
            Operation::LowerThan,
            Operand::flight(5),
            Operand::value(330),
        ),
        record(
            2,
            NO_ACTIVATOR,
            Operation::GreaterThan,
            Operand::flight(1),
            Operand::value(500),
        ),
        record(3, NO_ACTIVATOR, Operation::And, Operand::lc(1), Operand::lc(2)),
        record(4, NO_ACTIVATOR, Operation::Or, Operand::lc(0), Operand::lc(3)),
        record(
            5,
            4,
            Operation::OverrideThrottleScale,
            Operand::value(50),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(
        result.code.contains(
            "if (flight.mode.failsafe || flight.cellVoltage < 330 && flight.homeDistance > 500) {"
        ),
        "{}",
        result.code
    );
    assert_eq!(result.stats.groups, 1);
}

#[test]
fn test_not_over_comparison_folds_to_combined_operator() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::LowerThan,
            Operand::flight(3),
            Operand::value(50),
        ),
        record(1, NO_ACTIVATOR, Operation::Not, Operand::lc(0), Operand::zero()),
        record(
            2,
            1,
            Operation::SetVtxPowerLevel,
            Operand::value(1),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(
        result.code.contains("if (flight.rssi >= 50) {"),
        "{}",
        result.code
    );
}

#[test]
fn test_xor_nand_nor_reconstructions() {
    let leaf = |slot: i32, code: i32| {
        record(
            slot,
            NO_ACTIVATOR,
            Operation::Equal,
            Operand::flight(code),
            Operand::value(1),
        )
    };
    let table = vec![
        leaf(0, 17),
        leaf(1, 24),
        record(2, NO_ACTIVATOR, Operation::Xor, Operand::lc(0), Operand::lc(1)),
        record(
            3,
            2,
            Operation::SetVtxPowerLevel,
            Operand::value(1),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(
        result
            .code
            .contains("if (flight.isArmed != flight.isFailsafe) {"),
        "{}",
        result.code
    );
}

#[test]
fn test_abs_pattern_recognition() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::Sub,
            Operand::value(0),
            Operand::flight(15),
        ),
        record(1, NO_ACTIVATOR, Operation::Max, Operand::flight(15), Operand::lc(0)),
        record(2, NO_ACTIVATOR, Operation::GvarSet, Operand::value(0), Operand::lc(1)),
    ];
    let result = decompile_to_result(&table);
    assert!(
        result.code.contains("gvar[0] = Math.abs(flight.roll);"),
        "{}",
        result.code
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Special patterns
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_edge_pattern() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::LowerThan,
            Operand::flight(3),
            Operand::value(50),
        ),
        record(1, NO_ACTIVATOR, Operation::Edge, Operand::lc(0), Operand::value(1000)),
        record(
            2,
            1,
            Operation::SetVtxPowerLevel,
            Operand::value(1),
            Operand::zero(),
        ),
    ];
    let result = decompile_to_result(&table);
    assert!(result
        .code
        .contains("edge(() => flight.rssi < 50, { duration: 1000 }, () => {"));
}

#[test]
fn test_arm_idiom_wins_over_plain_edge() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::GreaterThan,
            Operand::flight(0),
            Operand::value(0),
        ),
        record(1, NO_ACTIVATOR, Operation::Edge, Operand::lc(0), Operand::value(2)),
        record(2, 1, Operation::GvarSet, Operand::value(0), Operand::flight(40)),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("on.arm({ delay: 2 }, () => {"));
    assert!(result.code.contains("gvar[0] = flight.yaw;"));
}

#[test]
fn test_sticky_pattern() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::Equal,
            Operand::flight(17),
            Operand::value(1),
        ),
        record(
            1,
            NO_ACTIVATOR,
            Operation::Equal,
            Operand::flight_mode(0),
            Operand::value(1),
        ),
        record(2, NO_ACTIVATOR, Operation::Sticky, Operand::lc(0), Operand::lc(1)),
        record(3, 2, Operation::GvarSet, Operand::value(1), Operand::value(1)),
    ];
    let result = decompile_to_result(&table);
    assert!(result
        .code
        .contains("sticky(() => flight.isArmed, () => flight.mode.failsafe, () => {"));
}

#[test]
fn test_timer_and_delta_patterns() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::Timer,
            Operand::value(500),
            Operand::value(1500),
        ),
        record(1, 0, Operation::LedPinPwm, Operand::value(50), Operand::zero()),
        record(
            2,
            NO_ACTIVATOR,
            Operation::Delta,
            Operand::flight(12),
            Operand::value(10),
        ),
        record(3, 2, Operation::GvarSet, Operand::value(2), Operand::flight(12)),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("timer(500, 1500, () => {"));
    assert!(result
        .code
        .contains("whenChanged(flight.altitude, 10, () => {"));
    assert_eq!(result.stats.groups, 2);
}

// ══════════════════════════════════════════════════════════════════════════════
// Degraded inputs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_orphaned_action_warns_and_surfaces() {
    let table = vec![record(
        0,
        7, // activator slot 7 does not exist
        Operation::SetVtxPowerLevel,
        Operand::value(2),
        Operand::zero(),
    )];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("override.vtx.power = 2;"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == ErrorCode::ORPHANED_ACTION));
}

#[test]
fn test_unsupported_action_becomes_placeholder() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::True,
            Operand::zero(),
            Operand::zero(),
        ),
        record(1, 0, Operation::PortSet, Operand::value(1), Operand::value(1)),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("// slot 1: unsupported action"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == ErrorCode::UNSUPPORTED_OPCODE));
}

#[test]
fn test_unknown_telemetry_synthesizes_name() {
    let table = vec![
        record(
            0,
            NO_ACTIVATOR,
            Operation::GreaterThan,
            Operand::flight(39),
            Operand::value(5),
        ),
        record(1, 0, Operation::GvarSet, Operand::value(0), Operand::value(1)),
    ];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("flight.telemetry39"));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == ErrorCode::SYNTHESIZED_NAME));
}

#[test]
fn test_dangling_condition_warns_lossy() {
    let table = vec![record(
        0,
        NO_ACTIVATOR,
        Operation::Equal,
        Operand::flight(17),
        Operand::value(1),
    )];
    let result = decompile_to_result(&table);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == ErrorCode::LOSSY_DECOMPILE));
}

#[test]
fn test_warnings_are_appended_as_comments() {
    let table = vec![record(
        0,
        7,
        Operation::SetVtxPowerLevel,
        Operand::value(2),
        Operand::zero(),
    )];
    let result = decompile_to_result(&table);
    assert!(result.code.contains("// warning:"));
}
