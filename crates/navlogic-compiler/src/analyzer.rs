//! Semantic analyzer — walks a parsed AST and validates it against the
//! API catalog and the declared bindings.
//!
//! Entry point: [`Analyzer::analyze`].
//!
//! Hard errors emitted:
//! - E200: unknown identifier
//! - E201: unwritable target
//! - E203: duplicate declaration
//! - E204: reassignment of an immutable binding
//! - E205: non-constant `let`/`const` initializer
//! - E207: handler body statement is not an assignment
//! - E208: identifier root not imported
//! - E210: register index out of range
//!
//! Soft warnings (global passes):
//! - E900: literal write clipped to the target's range
//! - E901: dead code (contradictory or always-false conditions)
//! - E902: provably-true condition (suggests `on.always`)
//! - E903: multiple writes to one target within a handler
//! - E904: write races between `on.always` handlers
//! - E905: register read but never assigned

use std::collections::{HashMap, HashSet};

use navlogic_types::ast::*;
use navlogic_types::{ApiCatalog, CompileErrors, ErrorCode, ScriptError, SourceFile, Span};

/// Walks a parsed [`Program`] and validates identifier use, writability,
/// ranges, and handler shape.
pub struct Analyzer<'a> {
    catalog: &'a ApiCatalog,
    errors: &'a mut CompileErrors,
    source: &'a SourceFile,
    /// Roots bound by the destructuring import (all roots when absent).
    bound_roots: HashSet<String>,
    /// Declared binding names → kind, collected in a pre-pass so
    /// forward references resolve.
    bindings: HashMap<String, BindingKind>,
    /// Explicit `gvar[i]` reads, for the uninitialized-register pass.
    gvar_reads: HashMap<i32, Span>,
    /// Explicit `gvar[i]` writes (including `var` initializers later).
    gvar_writes: HashSet<i32>,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        catalog: &'a ApiCatalog,
        errors: &'a mut CompileErrors,
        source: &'a SourceFile,
    ) -> Self {
        Self {
            catalog,
            errors,
            source,
            bound_roots: HashSet::new(),
            bindings: HashMap::new(),
            gvar_reads: HashMap::new(),
            gvar_writes: HashSet::new(),
        }
    }

    /// Analyze a complete program.
    pub fn analyze(&mut self, program: &Program) {
        self.collect_declarations(program);
        for stmt in &program.statements {
            self.check_statement(stmt, true);
        }
        self.check_write_conflicts(program);
        self.check_uninitialized_registers();
    }

    // ══════════════════════════════════════════════════════════════════════
    // Pre-pass: declarations & imports
    // ══════════════════════════════════════════════════════════════════════

    fn collect_declarations(&mut self, program: &Program) {
        let mut saw_import = false;
        for stmt in &program.statements {
            match stmt {
                Stmt::Import(import) => {
                    saw_import = true;
                    for root in &import.roots {
                        if !self.catalog.is_import_root(&root.name) {
                            self.error(
                                ErrorCode::UNKNOWN_IDENTIFIER,
                                format!("'{}' is not an importable root", root.name),
                                root.span,
                            );
                        }
                        self.bound_roots.insert(root.name.clone());
                    }
                }
                Stmt::Binding(binding) => {
                    if self.bindings.contains_key(&binding.name.name) {
                        self.error(
                            ErrorCode::DUPLICATE_DECLARATION,
                            format!("'{}' is already declared", binding.name.name),
                            binding.name.span,
                        );
                    } else {
                        self.bindings
                            .insert(binding.name.name.clone(), binding.kind);
                    }
                }
                _ => {}
            }
        }
        // No import-like binding present: bind every root implicitly
        // (keeps reported line numbers matching the user's source).
        if !saw_import {
            for root in navlogic_types::catalog::IMPORT_ROOTS {
                self.bound_roots.insert((*root).to_string());
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn check_statement(&mut self, stmt: &Stmt, top_level: bool) {
        match stmt {
            Stmt::Import(import) => {
                if !top_level {
                    self.error(
                        ErrorCode::NON_ASSIGNMENT_IN_HANDLER,
                        "imports must appear at the top level",
                        import.span,
                    );
                }
            }
            Stmt::Binding(binding) => self.check_binding(binding, top_level),
            Stmt::Assign(assign) => self.check_assignment(assign),
            Stmt::Handler(handler) => self.check_handler(handler, top_level),
        }
    }

    fn check_binding(&mut self, binding: &BindingStmt, top_level: bool) {
        if !top_level {
            self.error(
                ErrorCode::NON_ASSIGNMENT_IN_HANDLER,
                format!(
                    "'{}' declarations must appear at the top level",
                    binding.kind.as_str()
                ),
                binding.span,
            );
            return;
        }
        match binding.kind {
            BindingKind::Let | BindingKind::Const => {
                if !self.is_const_expr(&binding.init) {
                    self.error(
                        ErrorCode::NON_CONSTANT_INITIALIZER,
                        format!(
                            "'{}' initializer must be a compile-time constant",
                            binding.name.name
                        ),
                        binding.init.span,
                    );
                }
            }
            BindingKind::Var => {
                self.check_expression(&binding.init);
            }
        }
    }

    /// Effectively-constant check for `let`/`const` initializers:
    /// literals, arithmetic over literals, and references to other
    /// `let`/`const` bindings (cycles are caught by the variable handler).
    fn is_const_expr(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::NumberLit(_) | ExprKind::BoolLit(_) => true,
            ExprKind::Binary { left, right, .. } => {
                self.is_const_expr(left) && self.is_const_expr(right)
            }
            ExprKind::Unary { operand, .. } => self.is_const_expr(operand),
            ExprKind::Path(segments) if segments.len() == 1 => matches!(
                self.bindings.get(&segments[0].name),
                Some(BindingKind::Let | BindingKind::Const)
            ),
            _ => false,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Assignments
    // ══════════════════════════════════════════════════════════════════════

    fn check_assignment(&mut self, assign: &AssignStmt) {
        self.check_assign_target(&assign.target);
        self.check_expression(&assign.value);
        self.check_range(assign);
        self.record_register_write(&assign.target);
    }

    fn check_assign_target(&mut self, target: &Expr) {
        match &target.kind {
            ExprKind::Path(segments) => {
                let first = &segments[0].name;
                // A bare name: must be a declared binding.
                if segments.len() == 1 && self.bindings.contains_key(first) {
                    if self.bindings[first] != BindingKind::Var {
                        self.error(
                            ErrorCode::ASSIGN_TO_CONST,
                            format!("cannot reassign immutable binding '{first}'"),
                            target.span,
                        );
                    }
                    return;
                }
                self.check_root_bound(&segments[0]);
                let path = join_path(segments);
                match self.catalog.leaf(&path) {
                    Some(leaf) if leaf.writable() => {}
                    Some(_) => {
                        self.error(
                            ErrorCode::NOT_WRITABLE,
                            format!("'{path}' is read-only"),
                            target.span,
                        );
                    }
                    None => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("unknown identifier '{path}'"),
                            target.span,
                        );
                    }
                }
            }
            ExprKind::Index { base, index } => {
                self.check_root_bound(&base[0]);
                let root = join_path(base);
                match self.catalog.indexed(&root) {
                    Some(family) if family.write_op.is_some() => {
                        self.check_index_literal(&root, index, family.index_max, target.span);
                    }
                    Some(_) => {
                        self.error(
                            ErrorCode::NOT_WRITABLE,
                            format!("'{root}' is read-only"),
                            target.span,
                        );
                    }
                    None => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("unknown identifier '{root}'"),
                            target.span,
                        );
                    }
                }
            }
            _ => {
                self.error(
                    ErrorCode::NOT_WRITABLE,
                    format!("'{target}' is not an assignable target"),
                    target.span,
                );
            }
        }
    }

    /// Warn when a literal write is outside the target leaf's range.
    fn check_range(&mut self, assign: &AssignStmt) {
        let Some(value) = assign.value.as_number() else {
            return;
        };
        let range = match &assign.target.kind {
            ExprKind::Path(segments) => self
                .catalog
                .leaf(&join_path(segments))
                .and_then(|l| l.range),
            ExprKind::Index { base, .. } => self
                .catalog
                .indexed(&join_path(base))
                .and_then(|f| f.range),
            _ => None,
        };
        if let Some(range) = range {
            if !range.contains(value) {
                self.warn(
                    ErrorCode::RANGE_CLIPPED,
                    format!(
                        "value {value} is outside [{}, {}] for '{}' and will be clipped",
                        range.min, range.max, assign.target
                    ),
                    assign.value.span,
                );
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Event handlers
    // ══════════════════════════════════════════════════════════════════════

    fn check_handler(&mut self, handler: &EventHandler, top_level: bool) {
        if !top_level {
            self.error(
                ErrorCode::NON_ASSIGNMENT_IN_HANDLER,
                format!("'{}' cannot be nested inside a handler body", handler.kind.as_str()),
                handler.span,
            );
            return;
        }
        let handler_root = match handler.kind {
            HandlerKind::Always | HandlerKind::Arm => Some("on"),
            HandlerKind::If => None,
            HandlerKind::Edge => Some("edge"),
            HandlerKind::Sticky => Some("sticky"),
            HandlerKind::Delay => Some("delay"),
            HandlerKind::Timer => Some("timer"),
            HandlerKind::WhenChanged => Some("whenChanged"),
        };
        if let Some(root) = handler_root {
            if !self.bound_roots.contains(root) {
                self.error(
                    ErrorCode::UNBOUND_ROOT,
                    format!("'{root}' is not bound; add it to the destructuring import"),
                    handler.span,
                );
            }
        }
        if let Some(cond) = &handler.condition {
            self.check_expression(cond);
            self.check_condition_liveness(cond);
        }
        if let Some(cond) = &handler.off_condition {
            self.check_expression(cond);
        }
        if let Some(value) = &handler.value {
            self.check_expression(value);
        }
        for config in [
            &handler.config.delay,
            &handler.config.duration,
            &handler.config.on_ms,
            &handler.config.off_ms,
            &handler.config.threshold,
        ]
        .into_iter()
        .flatten()
        {
            self.check_expression(config);
        }
        for stmt in &handler.body {
            match stmt {
                Stmt::Assign(_) => self.check_statement(stmt, false),
                other => {
                    self.error(
                        ErrorCode::NON_ASSIGNMENT_IN_HANDLER,
                        format!(
                            "'{}' bodies may only contain assignments",
                            handler.kind.as_str()
                        ),
                        other.span(),
                    );
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn check_expression(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::NumberLit(_) | ExprKind::BoolLit(_) => {}

            ExprKind::Path(segments) => {
                let first = &segments[0].name;
                if segments.len() == 1 && self.bindings.contains_key(first) {
                    return;
                }
                self.check_root_bound(&segments[0]);
                let path = join_path(segments);
                match self.catalog.leaf(&path) {
                    Some(leaf) if leaf.read.is_some() => {}
                    Some(_) => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("'{path}' is write-only and cannot be read"),
                            expr.span,
                        );
                    }
                    None => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("unknown identifier '{path}'"),
                            expr.span,
                        );
                    }
                }
            }

            ExprKind::Index { base, index } => {
                self.check_root_bound(&base[0]);
                let root = join_path(base);
                match self.catalog.indexed(&root) {
                    Some(family) if family.read.is_some() => {
                        self.check_index_literal(&root, index, family.index_max, expr.span);
                        if root == "gvar" {
                            if let Some(i) = index.as_number() {
                                self.gvar_reads.entry(i).or_insert(expr.span);
                            }
                        }
                    }
                    Some(_) => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("'{root}' is write-only and cannot be read"),
                            expr.span,
                        );
                    }
                    None => {
                        self.error(
                            ErrorCode::UNKNOWN_IDENTIFIER,
                            format!("unknown identifier '{root}'"),
                            expr.span,
                        );
                    }
                }
            }

            ExprKind::Binary { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            ExprKind::Logical { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            ExprKind::Unary { operand, .. } => self.check_expression(operand),

            ExprKind::Call { callee, args } => {
                let name = join_path(callee);
                if name != "Math.abs" {
                    self.error(
                        ErrorCode::UNKNOWN_IDENTIFIER,
                        format!("'{name}' is not callable in an expression"),
                        expr.span,
                    );
                    return;
                }
                self.check_root_bound(&callee[0]);
                if args.len() != 1 {
                    self.error(
                        ErrorCode::WRONG_ARITY,
                        format!("Math.abs takes one argument, got {}", args.len()),
                        expr.span,
                    );
                }
                for arg in args {
                    self.check_expression(arg);
                }
            }
        }
    }

    fn check_root_bound(&mut self, root: &Ident) {
        if self.catalog.is_import_root(&root.name) && !self.bound_roots.contains(&root.name) {
            self.error(
                ErrorCode::UNBOUND_ROOT,
                format!("'{}' is not bound; add it to the destructuring import", root.name),
                root.span,
            );
        }
    }

    fn check_index_literal(&mut self, root: &str, index: &Expr, max: i32, span: Span) {
        match index.as_number() {
            Some(i) if (0..=max).contains(&i) => {}
            Some(i) => {
                self.error(
                    ErrorCode::REGISTER_INDEX_OUT_OF_RANGE,
                    format!("'{root}[{i}]' is out of range; valid indices are 0..={max}"),
                    span,
                );
            }
            None => {
                // Indices into the register file and channel map are
                // physical addresses; they cannot be computed.
                self.error(
                    ErrorCode::UNSUPPORTED_EXPRESSION,
                    format!("'{root}' index must be an integer literal"),
                    span,
                );
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Global passes
    // ══════════════════════════════════════════════════════════════════════

    /// Dead-code and always-true detection over a handler condition.
    fn check_condition_liveness(&mut self, cond: &Expr) {
        match literal_truth(cond) {
            Some(true) => {
                self.warn(
                    ErrorCode::ALWAYS_TRUE,
                    "condition is provably true; use on.always instead",
                    cond.span,
                );
            }
            Some(false) => {
                self.warn(
                    ErrorCode::DEAD_CODE,
                    "condition is provably false; this handler never fires",
                    cond.span,
                );
            }
            None => {
                if has_contradictory_conjunction(cond) {
                    self.warn(
                        ErrorCode::DEAD_CODE,
                        "contradictory comparisons; this condition can never hold",
                        cond.span,
                    );
                }
            }
        }
    }

    /// Write–write conflicts within a handler ("last wins") and races
    /// across `on.always` handlers (evaluation order is undefined).
    fn check_write_conflicts(&mut self, program: &Program) {
        let mut always_writes: HashMap<String, Span> = HashMap::new();

        for stmt in &program.statements {
            let Stmt::Handler(handler) = stmt else {
                continue;
            };
            let mut seen: HashMap<String, Span> = HashMap::new();
            for body_stmt in &handler.body {
                let Stmt::Assign(assign) = body_stmt else {
                    continue;
                };
                let target = assign.target.to_string();
                if let Some(_first) = seen.insert(target.clone(), assign.span) {
                    self.warn(
                        ErrorCode::WRITE_CONFLICT,
                        format!("'{target}' is written more than once in this handler; last wins"),
                        assign.span,
                    );
                }
            }
            if handler.kind == HandlerKind::Always {
                for (target, span) in seen {
                    if always_writes.insert(target.clone(), span).is_some() {
                        self.warn(
                            ErrorCode::HANDLER_RACE,
                            format!(
                                "'{target}' is written by multiple on.always handlers; \
                                 evaluation order is undefined"
                            ),
                            span,
                        );
                    }
                }
            }
        }
    }

    /// A register that is read somewhere but assigned nowhere.
    fn check_uninitialized_registers(&mut self) {
        let mut unread: Vec<(i32, Span)> = self
            .gvar_reads
            .iter()
            .filter(|(i, _)| !self.gvar_writes.contains(i))
            .map(|(i, s)| (*i, *s))
            .collect();
        unread.sort_by_key(|(i, _)| *i);
        for (index, span) in unread {
            self.warn(
                ErrorCode::UNINITIALIZED_REGISTER,
                format!("gvar[{index}] is read but never assigned"),
                span,
            );
        }
    }

    fn record_register_write(&mut self, target: &Expr) {
        if let ExprKind::Index { base, index } = &target.kind {
            if base.len() == 1 && base[0].name == "gvar" {
                if let Some(i) = index.as_number() {
                    self.gvar_writes.insert(i);
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Diagnostics plumbing
    // ══════════════════════════════════════════════════════════════════════

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source.line(span.line).unwrap_or("").to_string();
        self.errors.push_error(ScriptError::new(
            &self.source.name,
            code,
            message,
            span,
            source_line,
        ));
    }

    fn warn(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source.line(span.line).unwrap_or("").to_string();
        self.errors.push_warning(ScriptError::warning(
            &self.source.name,
            code,
            message,
            span,
            source_line,
        ));
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Condition analysis helpers
// ══════════════════════════════════════════════════════════════════════════

fn join_path(segments: &[Ident]) -> String {
    let parts: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
    parts.join(".")
}

/// Evaluate a condition made purely of literals. `None` when the truth
/// value depends on runtime state.
fn literal_truth(expr: &Expr) -> Option<bool> {
    if let Some(b) = expr.as_bool() {
        return Some(b);
    }
    match &expr.kind {
        ExprKind::Binary { op, left, right } if op.is_comparison() => {
            let l = left.as_number()?;
            let r = right.as_number()?;
            Some(match op {
                BinOp::Eq => l == r,
                BinOp::Ne => l != r,
                BinOp::Gt => l > r,
                BinOp::Lt => l < r,
                BinOp::Ge => l >= r,
                BinOp::Le => l <= r,
                _ => return None,
            })
        }
        ExprKind::Logical { op, left, right } => {
            let l = literal_truth(left);
            let r = literal_truth(right);
            match op {
                LogicalOp::And => match (l, r) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                },
                LogicalOp::Or => match (l, r) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                },
            }
        }
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => literal_truth(operand).map(|b| !b),
        _ => None,
    }
}

/// Detect `x > 5 && x < 3`-style contradictions: collect the conjuncts,
/// group comparisons against literals by their left-hand side, and check
/// the implied interval is non-empty.
fn has_contradictory_conjunction(expr: &Expr) -> bool {
    let mut conjuncts = Vec::new();
    collect_conjuncts(expr, &mut conjuncts);
    if conjuncts.len() < 2 {
        return false;
    }

    // lhs rendering → (lower bound, upper bound, required point)
    let mut intervals: HashMap<String, (i64, i64)> = HashMap::new();
    for conjunct in conjuncts {
        let ExprKind::Binary { op, left, right } = &conjunct.kind else {
            continue;
        };
        let Some(rhs) = right.as_number() else {
            continue;
        };
        let rhs = rhs as i64;
        let key = left.to_string();
        let entry = intervals.entry(key).or_insert((i64::MIN, i64::MAX));
        match op {
            BinOp::Gt => entry.0 = entry.0.max(rhs + 1),
            BinOp::Ge => entry.0 = entry.0.max(rhs),
            BinOp::Lt => entry.1 = entry.1.min(rhs - 1),
            BinOp::Le => entry.1 = entry.1.min(rhs),
            BinOp::Eq => {
                entry.0 = entry.0.max(rhs);
                entry.1 = entry.1.min(rhs);
            }
            _ => {}
        }
        if entry.0 > entry.1 {
            return true;
        }
    }
    false
}

fn collect_conjuncts<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    if let ExprKind::Logical {
        op: LogicalOp::And,
        left,
        right,
    } = &expr.kind
    {
        collect_conjuncts(left, out);
        collect_conjuncts(right, out);
    } else {
        out.push(expr);
    }
}
