//! MIR (Mid-level Intermediate Representation) crate.
//!
//! Provides MIR constructs, CFG builder, AST lowering, and optimizations.

pub mod analysis;
pub mod builder;
pub mod lower;
pub mod mir;
pub mod opt;

#[cfg(test)]
mod edge_cases;

pub use analysis::*;
pub use builder::*;
pub use lower::*;
pub use mir::*;

use faxc_util::Idx;
use thiserror::Error;

/// Internal, programmer-facing failures: an index out of range on a
/// malformed module, or an invariant violated (e.g. a dangling block
/// reference) that best-effort recovery cannot route around. The
/// optimizer's per-pass entry points otherwise never fail: a constant
/// division by zero yields `Top`, never an error.
#[derive(Debug, Error)]
pub enum MirError {
    #[error("function `{name}` has no basic blocks")]
    EmptyFunction { name: String },

    #[error("function `{function}` references non-existent block {block:?}")]
    DanglingBlock { function: String, block: mir::BlockId },

    #[error("local index out of range: {index} (function has {length} locals)")]
    LocalOutOfRange { index: usize, length: usize },
}

/// Fallible local lookup for callers outside the optimizer's best-effort
/// internals, where an out-of-range index is a bug worth surfacing as a
/// `MirError` rather than a panic.
pub fn try_get_local(func: &mir::Function, id: mir::LocalId) -> Result<&mir::Local, MirError> {
    func.locals
        .get(id)
        .ok_or(MirError::LocalOutOfRange { index: id.index(), length: func.locals.len() })
}
