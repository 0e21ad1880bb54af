//! Variable handler: inlines `let`/`const` bindings and allocates
//! persistent registers for `var` declarations.
//!
//! Two modes:
//! - **Inline** (`let`/`const`): the initializer AST is substituted at
//!   every use site. Expansion is depth-bounded so cyclic references
//!   (`let x = y; let y = x;`) fail with a hard error instead of looping.
//! - **Register** (`var`): a `gvar` slot is assigned from the highest
//!   unused index downward, skipping indices the script names explicitly.
//!   Every use site becomes a `gvar[i]` read/write, and non-zero
//!   initializers produce an ungated register-set prelude at program
//!   start (device registers reset to 0).

use std::collections::{HashMap, HashSet};

use navlogic_types::ast::*;
use navlogic_types::{CompileErrors, ErrorCode, ScriptError, SourceFile, Span, GVAR_COUNT};

/// Expansion depth after which a `let`/`const` reference chain is
/// declared cyclic.
const MAX_EXPANSION_DEPTH: u32 = 32;

/// What binding resolution produced, alongside the rewritten program.
#[derive(Debug, Clone, Default)]
pub struct BindingSummary {
    /// `var` name → allocated register index, in declaration order.
    pub allocations: Vec<(String, i32)>,
    /// Register indices the script names explicitly.
    pub explicit_registers: HashSet<i32>,
}

impl BindingSummary {
    /// Total registers in use: allocated plus explicitly named.
    pub fn registers_used(&self) -> usize {
        self.allocations.len() + self.explicit_registers.len()
    }
}

enum Binding {
    Inline(Expr),
    Register(i32),
}

/// Resolve all bindings in `program`, returning the rewritten program and
/// an allocation summary. Errors (cyclic constants, register exhaustion)
/// land in `errors`; the caller aborts when any are present.
pub fn resolve_bindings(
    program: &Program,
    source: &SourceFile,
    errors: &mut CompileErrors,
) -> (Program, BindingSummary) {
    let mut summary = BindingSummary {
        explicit_registers: collect_explicit_registers(program),
        ..Default::default()
    };

    // Pass 1: inline bindings and register allocations.
    let mut bindings: HashMap<String, Binding> = HashMap::new();
    let mut next_register: i32 = GVAR_COUNT as i32 - 1;
    for stmt in &program.statements {
        let Stmt::Binding(binding) = stmt else {
            continue;
        };
        match binding.kind {
            BindingKind::Let | BindingKind::Const => {
                bindings.insert(
                    binding.name.name.clone(),
                    Binding::Inline(binding.init.clone()),
                );
            }
            BindingKind::Var => {
                while next_register >= 0
                    && summary.explicit_registers.contains(&next_register)
                {
                    next_register -= 1;
                }
                if next_register < 0 {
                    push_error(
                        errors,
                        source,
                        ErrorCode::NO_AVAILABLE_REGISTER,
                        format!(
                            "no available register for '{}': all {GVAR_COUNT} are in use",
                            binding.name.name
                        ),
                        binding.name.span,
                    );
                    continue;
                }
                summary
                    .allocations
                    .push((binding.name.name.clone(), next_register));
                bindings.insert(binding.name.name.clone(), Binding::Register(next_register));
                next_register -= 1;
            }
        }
    }

    // Force-expand every inline initializer once so cyclic reference
    // chains are reported even when the binding is never used.
    for stmt in &program.statements {
        if let Stmt::Binding(binding) = stmt {
            if binding.kind != BindingKind::Var {
                substitute(&binding.init, &bindings, 0, source, errors);
            }
        }
    }

    // Pass 2: rewrite the statement list. `var` initializers become an
    // ungated prelude at program start; `let`/`const` declarations vanish.
    let mut statements = Vec::with_capacity(program.statements.len());
    for stmt in &program.statements {
        let Stmt::Binding(binding) = stmt else {
            continue;
        };
        if binding.kind != BindingKind::Var {
            continue;
        }
        let Some(Binding::Register(index)) = bindings.get(&binding.name.name) else {
            continue;
        };
        let init = substitute(&binding.init, &bindings, 0, source, errors);
        if init.as_number() == Some(0) {
            continue;
        }
        let span = binding.span;
        statements.push(Stmt::Assign(AssignStmt {
            target: gvar_index_expr(*index, span),
            value: init,
            span,
        }));
    }

    for stmt in &program.statements {
        match stmt {
            Stmt::Binding(_) => {}
            Stmt::Import(_) => statements.push(stmt.clone()),
            Stmt::Assign(assign) => {
                statements.push(Stmt::Assign(rewrite_assign(
                    assign, &bindings, source, errors,
                )));
            }
            Stmt::Handler(handler) => {
                statements.push(Stmt::Handler(rewrite_handler(
                    handler, &bindings, source, errors,
                )));
            }
        }
    }

    (
        Program {
            statements,
            span: program.span,
        },
        summary,
    )
}

/// Every `gvar[i]` index that appears literally anywhere in the program.
fn collect_explicit_registers(program: &Program) -> HashSet<i32> {
    fn walk_expr(expr: &Expr, out: &mut HashSet<i32>) {
        match &expr.kind {
            ExprKind::Index { base, index } => {
                if base.len() == 1 && base[0].name == "gvar" {
                    if let Some(i) = index.as_number() {
                        if (0..GVAR_COUNT as i32).contains(&i) {
                            out.insert(i);
                        }
                    }
                }
                walk_expr(index, out);
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                walk_expr(left, out);
                walk_expr(right, out);
            }
            ExprKind::Unary { operand, .. } => walk_expr(operand, out),
            ExprKind::Call { args, .. } => {
                for arg in args {
                    walk_expr(arg, out);
                }
            }
            _ => {}
        }
    }

    fn walk_stmt(stmt: &Stmt, out: &mut HashSet<i32>) {
        match stmt {
            Stmt::Import(_) => {}
            Stmt::Binding(b) => walk_expr(&b.init, out),
            Stmt::Assign(a) => {
                walk_expr(&a.target, out);
                walk_expr(&a.value, out);
            }
            Stmt::Handler(h) => {
                for expr in [&h.condition, &h.off_condition, &h.value]
                    .into_iter()
                    .flatten()
                {
                    walk_expr(expr, out);
                }
                for stmt in &h.body {
                    walk_stmt(stmt, out);
                }
            }
        }
    }

    let mut out = HashSet::new();
    for stmt in &program.statements {
        walk_stmt(stmt, &mut out);
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════
// Rewriting
// ══════════════════════════════════════════════════════════════════════════

fn rewrite_assign(
    assign: &AssignStmt,
    bindings: &HashMap<String, Binding>,
    source: &SourceFile,
    errors: &mut CompileErrors,
) -> AssignStmt {
    AssignStmt {
        target: substitute(&assign.target, bindings, 0, source, errors),
        value: substitute(&assign.value, bindings, 0, source, errors),
        span: assign.span,
    }
}

fn rewrite_handler(
    handler: &EventHandler,
    bindings: &HashMap<String, Binding>,
    source: &SourceFile,
    errors: &mut CompileErrors,
) -> EventHandler {
    let sub = |expr: &Option<Expr>, errors: &mut CompileErrors| {
        expr.as_ref()
            .map(|e| substitute(e, bindings, 0, source, errors))
    };
    EventHandler {
        kind: handler.kind,
        condition: sub(&handler.condition, errors),
        off_condition: sub(&handler.off_condition, errors),
        value: sub(&handler.value, errors),
        config: HandlerConfig {
            delay: sub(&handler.config.delay, errors),
            duration: sub(&handler.config.duration, errors),
            on_ms: sub(&handler.config.on_ms, errors),
            off_ms: sub(&handler.config.off_ms, errors),
            threshold: sub(&handler.config.threshold, errors),
        },
        body: handler
            .body
            .iter()
            .map(|stmt| match stmt {
                Stmt::Assign(a) => Stmt::Assign(rewrite_assign(a, bindings, source, errors)),
                other => other.clone(),
            })
            .collect(),
        reuse: handler.reuse,
        span: handler.span,
    }
}

/// Substitute bound names throughout an expression, expanding inline
/// bindings up to [`MAX_EXPANSION_DEPTH`].
fn substitute(
    expr: &Expr,
    bindings: &HashMap<String, Binding>,
    depth: u32,
    source: &SourceFile,
    errors: &mut CompileErrors,
) -> Expr {
    if depth > MAX_EXPANSION_DEPTH {
        push_error(
            errors,
            source,
            ErrorCode::CYCLIC_CONSTANT,
            format!("cyclic constant reference while expanding '{expr}'"),
            expr.span,
        );
        return Expr::new(ExprKind::NumberLit(0), expr.span);
    }

    let kind = match &expr.kind {
        ExprKind::Path(segments) if segments.len() == 1 => {
            match bindings.get(&segments[0].name) {
                Some(Binding::Inline(init)) => {
                    return substitute(&init.clone(), bindings, depth + 1, source, errors);
                }
                Some(Binding::Register(index)) => {
                    return gvar_index_expr(*index, expr.span);
                }
                None => expr.kind.clone(),
            }
        }
        ExprKind::Binary { op, left, right } => ExprKind::Binary {
            op: *op,
            left: Box::new(substitute(left, bindings, depth, source, errors)),
            right: Box::new(substitute(right, bindings, depth, source, errors)),
        },
        ExprKind::Logical { op, left, right } => ExprKind::Logical {
            op: *op,
            left: Box::new(substitute(left, bindings, depth, source, errors)),
            right: Box::new(substitute(right, bindings, depth, source, errors)),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op: *op,
            operand: Box::new(substitute(operand, bindings, depth, source, errors)),
        },
        ExprKind::Index { base, index } => ExprKind::Index {
            base: base.clone(),
            index: Box::new(substitute(index, bindings, depth, source, errors)),
        },
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee: callee.clone(),
            args: args
                .iter()
                .map(|a| substitute(a, bindings, depth, source, errors))
                .collect(),
        },
        other => other.clone(),
    };
    Expr::new(kind, expr.span)
}

fn gvar_index_expr(index: i32, span: Span) -> Expr {
    Expr::new(
        ExprKind::Index {
            base: vec![Ident::new("gvar", span)],
            index: Box::new(Expr::new(ExprKind::NumberLit(index), span)),
        },
        span,
    )
}

fn push_error(
    errors: &mut CompileErrors,
    source: &SourceFile,
    code: ErrorCode,
    message: String,
    span: Span,
) {
    let source_line = source.line(span.line).unwrap_or("").to_string();
    errors.push_error(ScriptError::new(&source.name, code, message, span, source_line));
}
