//! Integration tests for the NavLogic parser.
//!
//! Tests cover: top-level forms, the event-handler DSL, desugarings
//! (compound assignment, increments, else-chains), and error reporting.

use navlogic_parser::parse_source;
use navlogic_types::ast::*;
use navlogic_types::{ErrorCode, SourceFile};

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

fn parse_errors(source: &str) -> Vec<ErrorCode> {
    let file = SourceFile::new("test.js", source);
    let result = parse_source(&file);
    result.errors.errors.iter().map(|e| e.code).collect()
}

fn first_handler(program: &Program) -> &EventHandler {
    program
        .statements
        .iter()
        .find_map(|s| match s {
            Stmt::Handler(h) => Some(h),
            _ => None,
        })
        .expect("a handler statement")
}

// ══════════════════════════════════════════════════════════════════════════════
// Top-level forms
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_source_parses() {
    let program = parse("");
    assert!(program.statements.is_empty());
}

#[test]
fn test_destructuring_import() {
    let program = parse("const { flight, override, on } = inav;");
    let Stmt::Import(import) = &program.statements[0] else {
        panic!("expected import");
    };
    let roots: Vec<&str> = import.roots.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(roots, vec!["flight", "override", "on"]);
}

#[test]
fn test_import_requires_inav_source() {
    let errors = parse_errors("const { flight } = betaflight;");
    assert_eq!(errors, vec![ErrorCode::UNEXPECTED_TOKEN]);
}

#[test]
fn test_binding_kinds() {
    let program = parse("let a = 1; const b = 2; var c = 3;");
    let kinds: Vec<BindingKind> = program
        .statements
        .iter()
        .map(|s| match s {
            Stmt::Binding(b) => b.kind,
            _ => panic!("expected binding"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![BindingKind::Let, BindingKind::Const, BindingKind::Var]
    );
}

#[test]
fn test_top_level_assignment() {
    let program = parse("override.throttleScale = 50;");
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.target.to_string(), "override.throttleScale");
    assert_eq!(assign.value.as_number(), Some(50));
}

// ══════════════════════════════════════════════════════════════════════════════
// Desugarings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_compound_assignment_desugars() {
    let program = parse("gvar[0] += 5;");
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.target.to_string(), "gvar[0]");
    assert_eq!(assign.value.to_string(), "gvar[0] + 5");
}

#[test]
fn test_postfix_increment_desugars() {
    let program = parse("gvar[3]++;");
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.to_string(), "gvar[3] + 1");
}

#[test]
fn test_prefix_decrement_desugars() {
    let program = parse("--gvar[3];");
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.to_string(), "gvar[3] - 1");
}

#[test]
fn test_else_chain_lowers_to_sibling_handlers() {
    let program = parse(
        "if (flight.rssi < 30) { override.vtx.power = 3; } \
         else if (flight.rssi < 60) { override.vtx.power = 2; } \
         else { override.vtx.power = 1; }",
    );
    let handlers: Vec<&EventHandler> = program
        .statements
        .iter()
        .filter_map(|s| match s {
            Stmt::Handler(h) => Some(h),
            _ => None,
        })
        .collect();
    assert_eq!(handlers.len(), 3);
    assert!(handlers.iter().all(|h| h.kind == HandlerKind::If));

    let guards: Vec<String> = handlers
        .iter()
        .map(|h| h.condition.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(guards[0], "flight.rssi < 30");
    assert_eq!(guards[1], "!(flight.rssi < 30) && flight.rssi < 60");
    assert_eq!(
        guards[2],
        "!(flight.rssi < 30) && !(flight.rssi < 60)"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Event-handler DSL
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_on_always() {
    let program = parse("on.always(() => { gvar[0] = 1; });");
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::Always);
    assert!(handler.condition.is_none());
    assert_eq!(handler.body.len(), 1);
}

#[test]
fn test_on_arm_carries_delay() {
    let program = parse("on.arm({ delay: 2 }, () => { gvar[0] = flight.yaw; });");
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::Arm);
    let delay = handler.config.delay.as_ref().unwrap();
    assert_eq!(delay.as_number(), Some(2));
}

#[test]
fn test_edge_shape() {
    let program = parse(
        "edge(() => flight.rssi < 50, { duration: 1000 }, () => { override.vtx.power = 1; });",
    );
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::Edge);
    assert_eq!(
        handler.condition.as_ref().unwrap().to_string(),
        "flight.rssi < 50"
    );
    assert_eq!(
        handler.config.duration.as_ref().unwrap().as_number(),
        Some(1000)
    );
}

#[test]
fn test_sticky_two_conditions() {
    let program = parse(
        "sticky(() => flight.isArmed, () => flight.mode.failsafe, () => { gvar[1] = 1; });",
    );
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::Sticky);
    assert_eq!(
        handler.condition.as_ref().unwrap().to_string(),
        "flight.isArmed"
    );
    assert_eq!(
        handler.off_condition.as_ref().unwrap().to_string(),
        "flight.mode.failsafe"
    );
}

#[test]
fn test_timer_positional_args() {
    let program = parse("timer(500, 1500, () => { override.ledPinPwm = 50; });");
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::Timer);
    assert_eq!(handler.config.on_ms.as_ref().unwrap().as_number(), Some(500));
    assert_eq!(
        handler.config.off_ms.as_ref().unwrap().as_number(),
        Some(1500)
    );
}

#[test]
fn test_when_changed_value_and_threshold() {
    let program = parse("whenChanged(flight.altitude, 10, () => { gvar[2] = 0; });");
    let handler = first_handler(&program);
    assert_eq!(handler.kind, HandlerKind::WhenChanged);
    assert_eq!(
        handler.value.as_ref().unwrap().to_string(),
        "flight.altitude"
    );
    assert_eq!(
        handler.config.threshold.as_ref().unwrap().as_number(),
        Some(10)
    );
}

#[test]
fn test_unknown_handler_rejected() {
    let errors = parse_errors("onArmed(() => { gvar[0] = 1; });");
    assert_eq!(errors, vec![ErrorCode::UNKNOWN_HANDLER]);
}

#[test]
fn test_edge_with_block_condition_rejected() {
    let errors =
        parse_errors("edge(() => { gvar[0] = 1; }, { duration: 5 }, () => { gvar[1] = 1; });");
    assert!(errors.contains(&ErrorCode::WRONG_ARITY));
}

#[test]
fn test_wrong_config_key_rejected() {
    let errors = parse_errors("on.arm({ wait: 2 }, () => { gvar[0] = 1; });");
    assert!(errors.contains(&ErrorCode::WRONG_ARITY));
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_precedence_or_over_and() {
    let program = parse("if (flight.mode.failsafe || flight.cellVoltage < 330 && flight.homeDistance > 500) { gvar[0] = 1; }");
    let handler = first_handler(&program);
    // && binds tighter than ||.
    assert_eq!(
        handler.condition.as_ref().unwrap().to_string(),
        "flight.mode.failsafe || flight.cellVoltage < 330 && flight.homeDistance > 500"
    );
    let ExprKind::Logical { op, .. } = &handler.condition.as_ref().unwrap().kind else {
        panic!("expected logical expression");
    };
    assert_eq!(*op, LogicalOp::Or);
}

#[test]
fn test_parenthesized_grouping() {
    let program = parse("if ((flight.rssi < 50 || flight.rssi > 90) && flight.isArmed) { gvar[0] = 1; }");
    let handler = first_handler(&program);
    let ExprKind::Logical { op, .. } = &handler.condition.as_ref().unwrap().kind else {
        panic!("expected logical expression");
    };
    assert_eq!(*op, LogicalOp::And);
}

#[test]
fn test_math_abs_call() {
    let program = parse("gvar[0] = Math.abs(flight.roll - 1500);");
    let Stmt::Assign(assign) = &program.statements[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.value.to_string(), "Math.abs(flight.roll - 1500)");
}

#[test]
fn test_comparison_chaining_rejected() {
    let errors = parse_errors("if (1 < gvar[0] < 3) { gvar[1] = 1; }");
    assert!(errors.contains(&ErrorCode::UNEXPECTED_TOKEN));
}

#[test]
fn test_member_chain_depth_limit() {
    let errors = parse_errors("override.vtx.power.max = 1;");
    assert!(errors.contains(&ErrorCode::MEMBER_TOO_DEEP));
}

#[test]
fn test_missing_semicolon_reported() {
    let errors = parse_errors("gvar[0] = 1");
    assert!(errors.contains(&ErrorCode::UNEXPECTED_TOKEN));
}

#[test]
fn test_error_recovery_parses_following_statement() {
    let file = SourceFile::new("test.js", "gvar[0] = ;\ngvar[1] = 2;");
    let result = parse_source(&file);
    assert!(result.errors.has_errors());
    let program = result.program.expect("program with recovery");
    assert!(program
        .statements
        .iter()
        .any(|s| matches!(s, Stmt::Assign(a) if a.target.to_string() == "gvar[1]")));
}
