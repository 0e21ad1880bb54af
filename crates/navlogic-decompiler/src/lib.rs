//! NavLogic decompiler: reconstructs a readable source program from a
//! rule table read back from the device.
//!
//! Decompilation is structural: special-shape records (`edge`, `sticky`,
//! `delay`, `timer`, `delta`) are recognized before generic grouping, the
//! remaining activators become `if` statements, and conditions are
//! rebuilt recursively by chasing `LcResult` operands. It is lossy by
//! design — comments, variable names, and the compiler's slot ordering
//! are not preserved — and it never aborts: unknown opcodes become
//! placeholder comments plus warnings.

mod decompiler;
mod rebuild;

use navlogic_types::{ApiCatalog, Instruction, ScriptError};
use serde::{Deserialize, Serialize};

/// Decompile counters reported to the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DecompileStats {
    /// Records in the input table.
    pub total: usize,
    /// Enabled records considered by the scan.
    pub enabled: usize,
    /// Activator groups (handlers) recognized.
    pub groups: usize,
}

/// The result of decompiling a rule table. Serializable to JSON for the
/// editor host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompileResult {
    /// Always `true`: decompilation degrades instead of failing.
    pub success: bool,
    /// The reconstructed source program.
    pub code: String,
    /// Lossy-reconstruction and unknown-opcode warnings.
    pub warnings: Vec<ScriptError>,
    pub stats: DecompileStats,
}

/// Decompile a rule table into source text.
pub fn decompile_to_result(records: &[Instruction]) -> DecompileResult {
    let catalog = ApiCatalog::new();
    decompiler::Decompiler::new(&catalog, records).run()
}
