//! Codegen error types.

use thiserror::Error;

/// Errors that can occur while lowering a validated AST to rule-table
/// records.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The program needs more than the engine's 64 slots.
    #[error("rule table overflow: the engine caps at {cap} slots ({context})")]
    TableOverflow { cap: usize, context: String },

    /// A special construct was given a computed duration where a literal
    /// is required.
    #[error("{construct} requires a literal duration")]
    NonLiteralDuration { construct: String },

    /// `whenChanged` was given a computed threshold.
    #[error("{construct} requires a literal threshold")]
    NonLiteralThreshold { construct: String },

    /// An expression shape the instruction set cannot express.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// An internal consistency check failed; earlier stages should have
    /// rejected the input.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
