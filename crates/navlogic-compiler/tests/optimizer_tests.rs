//! Optimizer tests: constant folding, sibling-condition reuse, and
//! idempotence.

use navlogic_compiler::optimize::optimize;
use navlogic_parser::parse_source;
use navlogic_types::ast::*;
use navlogic_types::SourceFile;

fn parse(source: &str) -> Program {
    let file = SourceFile::new("test.js", source);
    let result = parse_source(&file);
    assert!(
        !result.errors.has_errors(),
        "unexpected parse errors: {:?}",
        result.errors.errors
    );
    result.program.expect("program")
}

fn handlers(program: &Program) -> Vec<&EventHandler> {
    program
        .statements
        .iter()
        .filter_map(|s| match s {
            Stmt::Handler(h) => Some(h),
            _ => None,
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Constant folding
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic_folds() {
    let program = optimize(parse("gvar[0] = 2 + 3 * 4;"));
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.as_number(), Some(14));
}

#[test]
fn test_literal_comparison_folds_to_bool() {
    let program = optimize(parse("if (2 > 1) { gvar[0] = 1; }"));
    let handler = handlers(&program)[0];
    assert_eq!(handler.condition.as_ref().unwrap().as_bool(), Some(true));
}

#[test]
fn test_negation_folds() {
    let program = optimize(parse("gvar[0] = -(2 + 3);"));
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.as_number(), Some(-5));
}

#[test]
fn test_math_abs_of_literal_folds() {
    let program = optimize(parse("gvar[0] = Math.abs(0 - 9);"));
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.as_number(), Some(9));
}

#[test]
fn test_division_by_zero_left_unfolded() {
    let program = optimize(parse("gvar[0] = 1 / 0;"));
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert!(assign.value.as_number().is_none());
}

#[test]
fn test_folding_preserves_runtime_operands() {
    let program = optimize(parse("if (flight.rssi < 30 + 20) { gvar[0] = 1; }"));
    let handler = handlers(&program)[0];
    assert_eq!(
        handler.condition.as_ref().unwrap().to_string(),
        "flight.rssi < 50"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Common-subexpression elimination
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_equal_sibling_conditions_share_slot() {
    let program = optimize(parse(
        "if (flight.homeDistance > 100) { override.vtx.power = 3; }\n\
         if (flight.homeDistance > 100) { override.vtx.band = 2; }",
    ));
    let hs = handlers(&program);
    assert!(hs[0].reuse.is_none());
    assert_eq!(
        hs[1].reuse,
        Some(CondReuse {
            statement: 0,
            negated: false
        })
    );
}

#[test]
fn test_negated_sibling_reuses_with_not() {
    let program = optimize(parse(
        "if (flight.isArmed) { override.vtx.power = 3; }\n\
         if (!flight.isArmed) { override.vtx.power = 1; }",
    ));
    let hs = handlers(&program);
    assert_eq!(
        hs[1].reuse,
        Some(CondReuse {
            statement: 0,
            negated: true
        })
    );
}

#[test]
fn test_different_conditions_do_not_alias() {
    let program = optimize(parse(
        "if (flight.homeDistance > 100) { override.vtx.power = 3; }\n\
         if (flight.homeDistance > 200) { override.vtx.power = 4; }",
    ));
    let hs = handlers(&program);
    assert!(hs[1].reuse.is_none());
}

#[test]
fn test_spans_do_not_affect_cse() {
    // Same condition with different whitespace (hence spans) still hits.
    let program = optimize(parse(
        "if (flight.rssi < 40) { gvar[0] = 1; }\n\
         if (flight.rssi   <   40) { gvar[1] = 1; }",
    ));
    let hs = handlers(&program);
    assert!(hs[1].reuse.is_some());
}

#[test]
fn test_else_chain_benefits_from_reuse() {
    // The desugared `else` guard starts with !(cond), whose inner
    // expression matches the first branch's condition.
    let program = optimize(parse(
        "if (flight.isArmed) { gvar[0] = 1; } else { gvar[1] = 1; }",
    ));
    let hs = handlers(&program);
    assert_eq!(
        hs[1].reuse,
        Some(CondReuse {
            statement: 0,
            negated: true
        })
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Idempotence
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_optimize_is_idempotent() {
    let sources = [
        "gvar[0] = 2 + 3 * 4;",
        "if (flight.homeDistance > 100) { override.vtx.power = 3; }\n\
         if (flight.homeDistance > 100) { override.vtx.band = 2; }\n\
         if (!(flight.homeDistance > 100)) { override.vtx.channel = 1; }",
        "edge(() => flight.rssi < 50, { duration: 1000 }, () => { gvar[0] = 1; });",
    ];
    for source in sources {
        let once = optimize(parse(source));
        let twice = optimize(once.clone());
        assert_eq!(once, twice, "optimize must converge for: {source}");
    }
}
