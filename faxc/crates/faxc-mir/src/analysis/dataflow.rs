//! Data Flow Analysis for MIR
//!
//! Provides various data flow analyses for optimization:
//! - Liveness Analysis
//! - Available Expressions Analysis
//! - Reaching Definitions Analysis

use crate::analysis::cfg::ControlFlowGraph;
use crate::mir::*;
use faxc_util::Symbol;
use std::collections::{HashMap, HashSet};

pub struct LivenessAnalysis {
    pub block_entry: HashMap<BlockId, HashSet<LocalId>>,
    pub block_exit: HashMap<BlockId, HashSet<LocalId>>,
}

impl LivenessAnalysis {
    pub fn new() -> Self {
        Self {
            block_entry: HashMap::new(),
            block_exit: HashMap::new(),
        }
    }

    pub fn is_live_in(&self, block: BlockId, local: LocalId) -> bool {
        self.block_entry.get(&block).is_some_and(|s| s.contains(&local))
    }
}

impl Default for LivenessAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard backward fixpoint over block-entry/block-exit live sets,
/// shared by C13's liveness check and C14's invariance analysis.
pub fn analyze_liveness(func: &Function, cfg: &ControlFlowGraph) -> LivenessAnalysis {
    let block_count = func.blocks.len();
    let mut block_entry: HashMap<BlockId, HashSet<LocalId>> = HashMap::new();
    let mut block_exit: HashMap<BlockId, HashSet<LocalId>> = HashMap::new();

    for (block_id, _) in func.blocks.iter_enumerated() {
        block_entry.insert(block_id, HashSet::new());
        block_exit.insert(block_id, HashSet::new());
    }

    let mut changed = true;
    let max_iterations = (block_count * block_count).max(1);
    let mut iterations = 0;

    while changed && iterations < max_iterations {
        changed = false;
        iterations += 1;

        for (block_id, block) in func.blocks.iter_enumerated() {
            let mut out = HashSet::new();

            if let Some(succs) = cfg.successors.get(&block_id) {
                for &succ in succs {
                    if let Some(entry) = block_entry.get(&succ) {
                        out.extend(entry.iter());
                    }
                }
            }

            let in_set = compute_block_in(block, &out);

            if let Some(old_in) = block_entry.get(&block_id) {
                if &in_set != old_in {
                    changed = true;
                }
            }
            block_entry.insert(block_id, in_set.clone());
            block_exit.insert(block_id, out);
        }
    }

    LivenessAnalysis { block_entry, block_exit }
}

fn compute_block_in(block: &BasicBlock, out: &HashSet<LocalId>) -> HashSet<LocalId> {
    let mut uses = HashSet::new();
    let mut defines = HashSet::new();

    for stmt in &block.statements {
        for used in stmt.used_locals() {
            uses.insert(used);
        }
        if let Some(dest) = stmt.defined_local() {
            defines.insert(dest);
        }
    }

    let mut term_uses = HashSet::new();
    collect_terminator_uses(&block.terminator, &mut term_uses);
    uses.extend(term_uses);

    let mut result = uses;
    for id in out {
        if !defines.contains(id) {
            result.insert(*id);
        }
    }
    result
}

fn collect_terminator_uses(term: &Terminator, uses: &mut HashSet<LocalId>) {
    term.for_each_operand(|op| {
        if let Operand::LocalRef(id) = op {
            uses.insert(*id);
        }
    });
}

/// Key identifying a recognized-intrinsic binary call for common
/// subexpression detection within a block.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ExprKey {
    pub op: Symbol,
    pub left: LocalId,
    pub right: LocalId,
}

pub struct AvailableExpressions {
    pub gen: HashMap<BlockId, HashSet<ExprKey>>,
    pub kill: HashMap<BlockId, HashSet<ExprKey>>,
    pub block_entry: HashMap<BlockId, HashSet<ExprKey>>,
    pub block_exit: HashMap<BlockId, HashSet<ExprKey>>,
}

impl Default for AvailableExpressions {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailableExpressions {
    pub fn new() -> Self {
        Self {
            gen: HashMap::new(),
            kill: HashMap::new(),
            block_entry: HashMap::new(),
            block_exit: HashMap::new(),
        }
    }
}

/// Flow-insensitive-within-block available-expressions analysis, grounded
/// on the same fixpoint shape as liveness. Feeds the optional CSE peephole
/// pass; not itself one of the three required passes.
pub fn analyze_available_expressions(
    func: &Function,
    cfg: &ControlFlowGraph,
) -> AvailableExpressions {
    let mut analysis = AvailableExpressions::new();

    for (block_id, block) in func.blocks.iter_enumerated() {
        let mut gen = HashSet::new();
        let mut defined = HashSet::new();

        for stmt in &block.statements {
            if let Some(dest) = stmt.defined_local() {
                if !defined.contains(&dest) {
                    if let Some(expr) = compute_expr_key(stmt) {
                        gen.insert(expr);
                    }
                }
                defined.insert(dest);
            }
        }

        analysis.gen.insert(block_id, gen);
        analysis.kill.insert(block_id, HashSet::new());
    }

    analysis.block_entry.insert(func.entry_block, HashSet::new());

    let mut changed = true;
    let max_iterations = (func.blocks.len() * func.blocks.len()).max(1);
    let mut iterations = 0;

    while changed && iterations < max_iterations {
        changed = false;
        iterations += 1;

        for (block_id, _) in func.blocks.iter_enumerated() {
            let mut in_set = HashSet::new();

            if let Some(preds) = cfg.predecessors.get(&block_id) {
                for &pred in preds {
                    if let Some(pred_out) = analysis.block_exit.get(&pred) {
                        for expr in pred_out {
                            in_set.insert(expr.clone());
                        }
                    }
                }
            }

            let old_entry = analysis.block_entry.get(&block_id).cloned();
            if old_entry.as_ref() != Some(&in_set) {
                changed = true;
                analysis.block_entry.insert(block_id, in_set.clone());
            }

            analysis.block_exit.insert(block_id, in_set);
        }
    }

    analysis
}

fn compute_expr_key(stmt: &Statement) -> Option<ExprKey> {
    match stmt {
        Statement::Call { func, args, .. } if is_reserved_intrinsic(func.as_str()) => {
            if let [Operand::LocalRef(l), Operand::LocalRef(r)] = args.as_slice() {
                Some(ExprKey { op: *func, left: *l, right: *r })
            } else {
                None
            }
        }
        _ => None,
    }
}

/// A single reaching definition: a `(block, stmt index)` site that defines
/// `local`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReachingDef {
    pub block: BlockId,
    pub local: LocalId,
    pub stmt_idx: usize,
}

pub struct ReachingDefinitions {
    pub block_entry: HashMap<BlockId, HashSet<ReachingDef>>,
    pub block_exit: HashMap<BlockId, HashSet<ReachingDef>>,
}

impl Default for ReachingDefinitions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachingDefinitions {
    pub fn new() -> Self {
        Self { block_entry: HashMap::new(), block_exit: HashMap::new() }
    }
}

pub fn analyze_reaching_definitions(func: &Function, cfg: &ControlFlowGraph) -> ReachingDefinitions {
    let mut analysis = ReachingDefinitions::new();

    for (block_id, _) in func.blocks.iter_enumerated() {
        analysis.block_entry.insert(block_id, HashSet::new());
        analysis.block_exit.insert(block_id, HashSet::new());
    }

    analysis.block_entry.insert(func.entry_block, HashSet::new());

    let mut changed = true;
    while changed {
        changed = false;

        for (block_id, block) in func.blocks.iter_enumerated() {
            let mut in_set = HashSet::new();

            if let Some(preds) = cfg.predecessors.get(&block_id) {
                for &pred in preds {
                    if let Some(pred_out) = analysis.block_exit.get(&pred) {
                        for def in pred_out {
                            in_set.insert(def.clone());
                        }
                    }
                }
            }

            let mut out_set = in_set.clone();

            for (stmt_idx, stmt) in block.statements.iter().enumerate() {
                if let Some(local) = stmt.defined_local() {
                    out_set.retain(|d| d.local != local);
                    out_set.insert(ReachingDef { block: block_id, local, stmt_idx });
                }
            }

            let old_entry = analysis.block_entry.get(&block_id).cloned();
            if old_entry.as_ref() != Some(&in_set) {
                changed = true;
                analysis.block_entry.insert(block_id, in_set);
            }

            analysis.block_exit.insert(block_id, out_set);
        }
    }

    analysis
}
