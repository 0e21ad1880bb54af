//! Semantic analyzer tests: identifier resolution, writability, handler
//! shape, and the global warning passes.

use navlogic_compiler::analyze;
use navlogic_types::{ErrorCode, Severity};

fn error_codes(source: &str) -> Vec<ErrorCode> {
    analyze(source, "test.js")
        .errors
        .iter()
        .map(|e| e.code)
        .collect()
}

fn warning_codes(source: &str) -> Vec<ErrorCode> {
    let result = analyze(source, "test.js");
    assert!(
        !result.has_errors(),
        "unexpected hard errors: {:?}",
        result.errors
    );
    result.warnings.iter().map(|e| e.code).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifier resolution
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_clean_program_has_no_diagnostics() {
    let result = analyze(
        "const { flight, override } = inav;\n\
         if (flight.homeDistance > 100) { override.vtx.power = 3; }",
        "test.js",
    );
    assert!(!result.has_errors());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_unknown_identifier() {
    let codes = error_codes("if (flight.homeDist > 100) { override.vtx.power = 3; }");
    assert_eq!(codes, vec![ErrorCode::UNKNOWN_IDENTIFIER]);
}

#[test]
fn test_unknown_import_root() {
    let codes = error_codes("const { flight, baro } = inav;");
    assert_eq!(codes, vec![ErrorCode::UNKNOWN_IDENTIFIER]);
}

#[test]
fn test_unbound_root() {
    let codes = error_codes(
        "const { flight } = inav;\n\
         if (flight.isArmed) { override.vtx.power = 1; }",
    );
    assert_eq!(codes, vec![ErrorCode::UNBOUND_ROOT]);
}

#[test]
fn test_unbound_handler_name() {
    let codes = error_codes(
        "const { flight, gvar } = inav;\n\
         timer(100, 200, () => { gvar[0] = 1; });",
    );
    assert_eq!(codes, vec![ErrorCode::UNBOUND_ROOT]);
}

#[test]
fn test_missing_import_binds_everything() {
    let result = analyze("if (flight.isArmed) { override.vtx.power = 1; }", "test.js");
    assert!(!result.has_errors());
}

// ══════════════════════════════════════════════════════════════════════════════
// Writability
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_telemetry_is_read_only() {
    let codes = error_codes("flight.homeDistance = 5;");
    assert_eq!(codes, vec![ErrorCode::NOT_WRITABLE]);
}

#[test]
fn test_rc_channels_are_read_only() {
    let codes = error_codes("rc[3] = 1500;");
    assert_eq!(codes, vec![ErrorCode::NOT_WRITABLE]);
}

#[test]
fn test_override_rc_is_writable() {
    let result = analyze("override.rc[3] = 1500;", "test.js");
    assert!(!result.has_errors());
}

#[test]
fn test_write_only_override_cannot_be_read() {
    let codes = error_codes("if (override.throttleScale > 50) { gvar[0] = 1; }");
    assert_eq!(codes, vec![ErrorCode::UNKNOWN_IDENTIFIER]);
}

#[test]
fn test_register_index_out_of_range() {
    let codes = error_codes("gvar[8] = 1;");
    assert_eq!(codes, vec![ErrorCode::REGISTER_INDEX_OUT_OF_RANGE]);
}

#[test]
fn test_rc_index_out_of_range() {
    let codes = error_codes("override.rc[18] = 1500;");
    assert_eq!(codes, vec![ErrorCode::REGISTER_INDEX_OUT_OF_RANGE]);
}

#[test]
fn test_computed_register_index_rejected() {
    let codes = error_codes("gvar[0] = gvar[gvar[1]];");
    assert_eq!(codes, vec![ErrorCode::UNSUPPORTED_EXPRESSION]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Bindings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_declaration() {
    let codes = error_codes("var a = 1; var a = 2;");
    assert_eq!(codes, vec![ErrorCode::DUPLICATE_DECLARATION]);
}

#[test]
fn test_immutable_binding_reassignment() {
    let codes = error_codes("let a = 1; a = 2;");
    assert_eq!(codes, vec![ErrorCode::ASSIGN_TO_CONST]);
}

#[test]
fn test_var_reassignment_allowed() {
    let result = analyze("var a = 1; on.always(() => { a = a + 1; });", "test.js");
    assert!(!result.has_errors());
}

#[test]
fn test_let_initializer_must_be_constant() {
    let codes = error_codes("let a = flight.rssi;");
    assert_eq!(codes, vec![ErrorCode::NON_CONSTANT_INITIALIZER]);
}

#[test]
fn test_let_initializer_may_reference_earlier_let() {
    let result = analyze("let base = 100; let limit = base * 2;", "test.js");
    assert!(!result.has_errors());
}

#[test]
fn test_var_initializer_may_read_telemetry() {
    let result = analyze("var snapshot = flight.altitude;", "test.js");
    assert!(!result.has_errors());
}

// ══════════════════════════════════════════════════════════════════════════════
// Handler shape
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_handler_body_must_be_assignments() {
    let codes = error_codes(
        "on.always(() => { if (flight.isArmed) { gvar[0] = 1; } });",
    );
    assert_eq!(codes, vec![ErrorCode::NON_ASSIGNMENT_IN_HANDLER]);
}

#[test]
fn test_binding_inside_handler_rejected() {
    let codes = error_codes("on.always(() => { var x = 1; });");
    assert_eq!(codes, vec![ErrorCode::NON_ASSIGNMENT_IN_HANDLER]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Warning passes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_always_true_condition() {
    let codes = warning_codes("if (1 == 1) { gvar[0] = 1; }");
    assert!(codes.contains(&ErrorCode::ALWAYS_TRUE));
}

#[test]
fn test_always_false_condition_is_dead() {
    let codes = warning_codes("if (2 < 1) { gvar[0] = 1; }");
    assert!(codes.contains(&ErrorCode::DEAD_CODE));
}

#[test]
fn test_contradictory_conjunction_is_dead() {
    let codes =
        warning_codes("if (flight.rssi > 50 && flight.rssi < 20) { gvar[0] = 1; }");
    assert!(codes.contains(&ErrorCode::DEAD_CODE));
}

#[test]
fn test_satisfiable_conjunction_is_live() {
    let codes =
        warning_codes("if (flight.rssi > 20 && flight.rssi < 50) { gvar[0] = 1; }");
    assert!(!codes.contains(&ErrorCode::DEAD_CODE));
}

#[test]
fn test_write_write_conflict_in_handler() {
    let codes = warning_codes(
        "if (flight.isArmed) { gvar[0] = 1; gvar[0] = 2; }",
    );
    assert!(codes.contains(&ErrorCode::WRITE_CONFLICT));
}

#[test]
fn test_race_between_always_handlers() {
    let codes = warning_codes(
        "on.always(() => { gvar[0] = 1; });\n\
         on.always(() => { gvar[0] = 2; });",
    );
    assert!(codes.contains(&ErrorCode::HANDLER_RACE));
}

#[test]
fn test_uninitialized_register_read() {
    let codes = warning_codes("if (gvar[3] > 100) { override.vtx.power = 1; }");
    assert!(codes.contains(&ErrorCode::UNINITIALIZED_REGISTER));
}

#[test]
fn test_initialized_register_not_flagged() {
    let codes = warning_codes(
        "gvar[3] = 0;\n\
         if (gvar[3] > 100) { override.vtx.power = 1; }",
    );
    assert!(!codes.contains(&ErrorCode::UNINITIALIZED_REGISTER));
}

#[test]
fn test_range_clip_warning() {
    let codes = warning_codes("override.vtx.power = 9;");
    assert!(codes.contains(&ErrorCode::RANGE_CLIPPED));
}

#[test]
fn test_warnings_have_warning_severity() {
    let result = analyze("if (true) { gvar[0] = 1; }", "test.js");
    assert!(result
        .warnings
        .iter()
        .all(|w| w.severity == Severity::Warning));
}
