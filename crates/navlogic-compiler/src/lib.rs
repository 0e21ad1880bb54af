//! NavLogic compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Source → Lexer → Parser → Analyzer → Variable Handler → Optimizer
//!        → Codegen → rule-table records → CLI `logic` lines
//! ```
//!
//! # Entry points
//!
//! - [`analyze`] — Parse + semantic analysis only, returning structured
//!   errors.
//! - [`compile`] — Full pipeline returning the instruction list.
//! - [`compile_to_result`] — Full pipeline returning a JSON-serializable
//!   [`CompileResult`] for the editor host.
//! - [`decompile_to_result`] — Re-exported from `navlogic-decompiler` so
//!   hosts need only this crate.

pub mod analyzer;
pub mod optimize;
pub mod vars;

use navlogic_codegen::CodegenError;
use navlogic_types::ast::{Program, Stmt};
use navlogic_types::{
    ApiCatalog, CompileErrors, ErrorCode, Instruction, ScriptError, SourceFile, Span,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use navlogic_decompiler::{decompile_to_result, DecompileResult, DecompileStats};

/// Language version of the scripting subset.
pub const LANGUAGE_VERSION: &str = "1.0.0";

/// Compiler version (matches the Cargo package version).
pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── CompileResult ─────────────────────────────────────────────────────────────

/// Pipeline counters reported to the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompileStats {
    /// Event handlers in the source (including desugared `else` branches).
    pub handlers: usize,
    /// Boolean-producing records emitted.
    pub conditions: usize,
    /// Action records emitted.
    pub actions: usize,
    /// Total rule-table slots used.
    pub slots_used: usize,
    /// Registers in use: allocated variables plus explicit `gvar` indices.
    pub gvars_used: usize,
}

/// The result of a full compilation pipeline. Serializable to JSON for
/// the editor host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    /// Whether compilation succeeded.
    pub success: bool,
    /// One CLI `logic` command per emitted record, in slot order.
    pub commands: Vec<String>,
    /// The emitted records (same content as `commands`, structured).
    pub instructions: Vec<Instruction>,
    /// Structured compile errors, if any.
    pub errors: CompileErrors,
    /// Warnings (also present inside `errors`; duplicated for hosts that
    /// only render one list).
    pub warnings: Vec<ScriptError>,
    /// Pipeline counters; present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CompileStats>,
    /// SHA-256 hash of the source text (hex-encoded).
    pub source_hash: String,
    /// Language version.
    pub language_version: String,
    /// Compiler version.
    pub compiler_version: String,
}

impl CompileResult {
    fn failure(errors: CompileErrors, source_hash: String) -> Self {
        let warnings = errors.warnings.clone();
        Self {
            success: false,
            commands: Vec::new(),
            instructions: Vec::new(),
            errors,
            warnings,
            stats: None,
            source_hash,
            language_version: LANGUAGE_VERSION.to_string(),
            compiler_version: COMPILER_VERSION.to_string(),
        }
    }
}

// ── analyze ───────────────────────────────────────────────────────────────────

/// Parse and semantically analyze a source file, returning any errors.
pub fn analyze(source: &str, name: &str) -> CompileErrors {
    let source_file = SourceFile::new(name, source);
    let parse_result = navlogic_parser::parse_source(&source_file);
    if parse_result.errors.has_errors() {
        return parse_result.errors;
    }
    let Some(program) = parse_result.program else {
        return parse_result.errors;
    };

    let catalog = ApiCatalog::new();
    let mut errors = parse_result.errors;
    analyzer::Analyzer::new(&catalog, &mut errors, &source_file).analyze(&program);
    errors
}

// ── compile ───────────────────────────────────────────────────────────────────

/// Full compilation pipeline: source → rule-table records.
///
/// Returns the instruction list on success, or the diagnostic buffer if
/// any stage reported a hard error.
pub fn compile(source: &str, name: &str) -> Result<Vec<Instruction>, CompileErrors> {
    let result = compile_to_result(source, name);
    if result.success {
        Ok(result.instructions)
    } else {
        Err(result.errors)
    }
}

/// Full compilation pipeline, returning a [`CompileResult`].
pub fn compile_to_result(source: &str, name: &str) -> CompileResult {
    let source_hash = sha256_hex(source.as_bytes());
    let source_file = SourceFile::new(name, source);

    // 1. Lex + parse.
    let parse_result = navlogic_parser::parse_source(&source_file);
    if parse_result.errors.has_errors() {
        return CompileResult::failure(parse_result.errors, source_hash);
    }
    let Some(program) = parse_result.program else {
        return CompileResult::failure(parse_result.errors, source_hash);
    };
    let mut errors = parse_result.errors;

    // 2. Semantic analysis.
    let catalog = ApiCatalog::new();
    analyzer::Analyzer::new(&catalog, &mut errors, &source_file).analyze(&program);
    if errors.has_errors() {
        return CompileResult::failure(errors, source_hash);
    }

    // 3. Binding resolution (inline substitution + register allocation).
    let (program, bindings) = vars::resolve_bindings(&program, &source_file, &mut errors);
    if errors.has_errors() {
        return CompileResult::failure(errors, source_hash);
    }

    // 4. Optimization.
    let program = optimize::optimize(program);
    let handlers = count_handlers(&program);

    // 5. Codegen.
    let instructions = match navlogic_codegen::generate(&program, &catalog) {
        Ok(instructions) => instructions,
        Err(e) => {
            errors.push_error(codegen_error_to_script_error(&e, name));
            return CompileResult::failure(errors, source_hash);
        }
    };

    let stats = CompileStats {
        handlers,
        conditions: instructions
            .iter()
            .filter(|i| i.op.produces_boolean())
            .count(),
        actions: instructions.iter().filter(|i| i.op.is_action()).count(),
        slots_used: instructions.len(),
        gvars_used: bindings.registers_used(),
    };
    let commands = instructions.iter().map(|i| i.to_cli_line()).collect();
    let warnings = errors.warnings.clone();

    CompileResult {
        success: true,
        commands,
        instructions,
        errors,
        warnings,
        stats: Some(stats),
        source_hash,
        language_version: LANGUAGE_VERSION.to_string(),
        compiler_version: COMPILER_VERSION.to_string(),
    }
}

fn count_handlers(program: &Program) -> usize {
    program
        .statements
        .iter()
        .filter(|s| matches!(s, Stmt::Handler(_)))
        .count()
}

// ── Hashing ───────────────────────────────────────────────────────────────────

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        write!(out, "{byte:02x}").unwrap();
    }
    out
}

/// Convert a codegen error to a [`ScriptError`] for structured output.
fn codegen_error_to_script_error(e: &CodegenError, file: &str) -> ScriptError {
    let code = match e {
        CodegenError::TableOverflow { .. } => ErrorCode::TABLE_OVERFLOW,
        CodegenError::NonLiteralDuration { .. } => ErrorCode::NON_LITERAL_DURATION,
        CodegenError::NonLiteralThreshold { .. } => ErrorCode::NON_LITERAL_THRESHOLD,
        CodegenError::Unsupported(_) => ErrorCode::UNSUPPORTED_EXPRESSION,
        CodegenError::Internal(_) => ErrorCode::INTERNAL,
    };
    ScriptError::new(file, code, e.to_string(), Span::point(1, 1), "")
}
