use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of hard errors reported before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic severity.
///
/// Hard errors abort later pipeline stages; warnings are buffered and
/// returned alongside successful output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Semantic,
    Resource,
    Shape,
    Internal,
    Warning,
}

/// Numeric error code.
///
/// Ranges: E100–E199 syntax, E200–E299 semantic, E300–E399 resource,
/// E400–E499 shape, E500–E599 internal, E900–E999 soft warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNEXPECTED_CHARACTER: Self = Self(101);
    pub const INVALID_NUMBER: Self = Self(102);
    pub const UNTERMINATED_COMMENT: Self = Self(103);
    pub const MEMBER_TOO_DEEP: Self = Self(104);

    // ── Semantic errors (E200–E299) ──
    pub const UNKNOWN_IDENTIFIER: Self = Self(200);
    pub const NOT_WRITABLE: Self = Self(201);
    pub const VALUE_OUT_OF_RANGE: Self = Self(202);
    pub const DUPLICATE_DECLARATION: Self = Self(203);
    pub const ASSIGN_TO_CONST: Self = Self(204);
    pub const NON_CONSTANT_INITIALIZER: Self = Self(205);
    pub const UNKNOWN_HANDLER: Self = Self(206);
    pub const NON_ASSIGNMENT_IN_HANDLER: Self = Self(207);
    pub const UNBOUND_ROOT: Self = Self(208);
    pub const CYCLIC_CONSTANT: Self = Self(209);
    pub const REGISTER_INDEX_OUT_OF_RANGE: Self = Self(210);

    // ── Resource errors (E300–E399) ──
    pub const NO_AVAILABLE_REGISTER: Self = Self(300);
    pub const TABLE_OVERFLOW: Self = Self(301);

    // ── Shape errors (E400–E499) ──
    pub const WRONG_ARITY: Self = Self(400);
    pub const NON_LITERAL_DURATION: Self = Self(401);
    pub const NON_LITERAL_THRESHOLD: Self = Self(402);
    pub const UNSUPPORTED_EXPRESSION: Self = Self(403);

    // ── Internal errors (E500–E599) ──
    pub const INTERNAL: Self = Self(500);

    // ── Soft warnings (E900–E999) ──
    pub const RANGE_CLIPPED: Self = Self(900);
    pub const DEAD_CODE: Self = Self(901);
    pub const ALWAYS_TRUE: Self = Self(902);
    pub const WRITE_CONFLICT: Self = Self(903);
    pub const HANDLER_RACE: Self = Self(904);
    pub const UNINITIALIZED_REGISTER: Self = Self(905);
    pub const LOSSY_DECOMPILE: Self = Self(906);
    pub const UNSUPPORTED_OPCODE: Self = Self(907);
    pub const SYNTHESIZED_NAME: Self = Self(908);
    pub const ORPHANED_ACTION: Self = Self(909);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Semantic,
            300..=399 => ErrorCategory::Resource,
            400..=499 => ErrorCategory::Shape,
            900..=999 => ErrorCategory::Warning,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured NavLogic diagnostic.
///
/// The editor surface renders these directly; it must never have to parse
/// free-form strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E201).
    pub code: ErrorCode,
    /// Diagnostic severity.
    pub severity: Severity,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ScriptError {
    /// Create a new hard error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Create a new warning.
    pub fn warning(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        let mut err = Self::new(file, code, message, span, source_line);
        err.severity = Severity::Warning;
        err
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for ScriptError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Semantic => write!(f, "semantic"),
            Self::Resource => write!(f, "resource"),
            Self::Shape => write!(f, "shape"),
            Self::Internal => write!(f, "internal"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Diagnostics collected across pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<ScriptError>,
    pub warnings: Vec<ScriptError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            total_errors: 0,
            total_warnings: 0,
        }
    }

    /// Check if there are any hard errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add a hard error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning.
    pub fn push_warning(&mut self, warning: ScriptError) {
        self.warnings.push(warning);
        self.total_warnings += 1;
    }
}
