//! NavLogic code generator: lowers a validated AST to rule-table records.
//!
//! # Architecture
//!
//! The generator takes a program that has already been through semantic
//! analysis, binding resolution, and optimization, and produces an
//! append-only list of up to 64 [`navlogic_types::Instruction`] records.
//! Conditions lower to chains of boolean-producing records referenced by
//! slot index; actions lower to records gated on their handler's
//! condition slot through the `activator` field.

pub mod compiler;
pub mod error;
pub mod expr;

pub use compiler::{generate, CodeGenerator};
pub use error::{CodegenError, CodegenResult};
