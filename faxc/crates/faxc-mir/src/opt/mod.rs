//! MIR Optimization Passes
//!
//! The three contractually-specified passes (constant propagation, dead
//! code elimination, loop-invariant code motion) plus an optional
//! peephole group callers may run afterward.

pub mod const_prop;
pub mod dce;
pub mod licm;
pub mod peephole;

pub use const_prop::{propagate_constants, propagate_function, LatticeValue};
pub use dce::{eliminate_dead_code, eliminate_function};
pub use licm::{hoist_function, hoist_invariants};
pub use peephole::{run_peephole, run_peephole_function};

use crate::mir::Module;

/// Runs the three required passes in sequence: constant propagation,
/// dead code elimination, loop-invariant code motion. Each is pure; the
/// input module is never mutated.
pub fn optimize(module: &Module) -> Module {
    log::debug!("optimizing {} function(s)", module.functions.len());
    let module = propagate_constants(module);
    let module = eliminate_dead_code(&module);
    hoist_invariants(&module)
}
