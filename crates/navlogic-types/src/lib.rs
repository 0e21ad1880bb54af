//! Shared types for the NavLogic toolchain: source spans, structured
//! diagnostics, the AST, the rule-table instruction model, and the static
//! API catalog.

pub mod ast;
pub mod catalog;
pub mod error;
pub mod instruction;
pub mod span;

pub use catalog::ApiCatalog;
pub use error::{CompileErrors, ErrorCategory, ErrorCode, ScriptError, Severity, MAX_ERRORS};
pub use instruction::{
    Instruction, Operand, OperandType, Operation, GVAR_COUNT, GVAR_MAX, GVAR_MIN, MAX_SLOTS,
    NO_ACTIVATOR,
};
pub use span::{SourceFile, Span};
