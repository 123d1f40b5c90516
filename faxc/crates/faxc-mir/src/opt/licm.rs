//! Loop-invariant code motion (C14).
//!
//! Loop headers are found directly off the predecessor map (not through
//! `analysis::cfg::find_loops`, which only flags a block as its own
//! predecessor): a deterministic preorder visit from the entry block
//! numbers every block, and any edge `P -> B` where `P` was visited at or
//! after `B` is a back-edge with `B` as the header. Loop members are
//! collected by walking predecessors backward from `P` and stopping at
//! `B`. LICM additionally needs, per loop, the single external
//! predecessor of the header (the preheader) to hoist into: when a header
//! has more than one external predecessor a fresh preheader block is
//! synthesized and spliced in as the sole entry to the loop, and a header
//! with exactly one external predecessor reuses it directly.

use crate::analysis::cfg::ControlFlowGraph;
use crate::mir::*;
use faxc_util::{Idx, IndexVec};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

struct LoopInfo {
    blocks: HashSet<BlockId>,
}

/// Functions hoist independently, so the module-wide pass folds them in
/// parallel.
pub fn hoist_invariants(module: &Module) -> Module {
    Module { functions: module.functions.par_iter().map(hoist_function).collect() }
}

pub fn hoist_function(func: &Function) -> Function {
    let cfg = ControlFlowGraph::new(func);
    let loops = find_loops(func, &cfg);
    if loops.is_empty() {
        return func.clone();
    }
    log::trace!("hoisting invariants out of {} loop(s) in `{}`", loops.len(), func.name.as_str());

    let def_blocks = definition_blocks(func);
    let mut out = func.clone();

    // Process headers in a deterministic order (by block id) so repeated
    // runs over the same input are reproducible.
    let mut headers: Vec<BlockId> = loops.keys().copied().collect();
    headers.sort_by_key(|b| b.index());

    for header in headers {
        let info = &loops[&header];
        let external_preds: Vec<BlockId> = cfg
            .predecessors
            .get(&header)
            .into_iter()
            .flatten()
            .copied()
            .filter(|p| !info.blocks.contains(p) && *p != header)
            .collect();

        if external_preds.is_empty() {
            continue;
        }

        let preheader = if external_preds.len() == 1 {
            external_preds[0]
        } else {
            synthesize_preheader(&mut out, header, &external_preds)
        };

        hoist_loop(&mut out, header, info, preheader, &def_blocks);
    }

    out
}

/// Deterministic preorder over `successors`, starting from `entry`,
/// visiting successors in ascending block-id order so the result is
/// stable regardless of the CFG's native iteration order.
fn preorder(func: &Function, cfg: &ControlFlowGraph) -> HashMap<BlockId, usize> {
    let mut order = HashMap::new();
    let mut visited = HashSet::new();
    let mut stack = vec![func.entry_block];
    let mut next = 0usize;
    while let Some(block) = stack.pop() {
        if !visited.insert(block) {
            continue;
        }
        order.insert(block, next);
        next += 1;
        let mut succs: Vec<BlockId> = cfg.successors.get(&block).into_iter().flatten().copied().collect();
        succs.sort_by_key(|b| std::cmp::Reverse(b.index()));
        stack.extend(succs);
    }
    order
}

fn find_loops(func: &Function, cfg: &ControlFlowGraph) -> HashMap<BlockId, LoopInfo> {
    let order = preorder(func, cfg);
    let mut loops: HashMap<BlockId, LoopInfo> = HashMap::new();

    for (block, _) in func.blocks.iter_enumerated() {
        let Some(&block_order) = order.get(&block) else { continue };
        let Some(preds) = cfg.predecessors.get(&block) else { continue };
        for &pred in preds {
            let Some(&pred_order) = order.get(&pred) else { continue };
            if pred_order < block_order {
                continue;
            }
            // `pred -> block` is a back-edge; collect members by walking
            // predecessors backward from `pred`, stopping at `block`.
            let mut members = HashSet::new();
            let mut queue = VecDeque::new();
            queue.push_back(pred);
            while let Some(b) = queue.pop_front() {
                if b == block || !members.insert(b) {
                    continue;
                }
                for &p in cfg.predecessors.get(&b).into_iter().flatten() {
                    queue.push_back(p);
                }
            }
            loops.entry(block).or_insert_with(|| LoopInfo { blocks: HashSet::new() }).blocks.extend(members);
        }
    }

    loops
}

/// Map from local to the block that defines it, computed once per
/// function (a local is expected to have at most one definition site in
/// this SSA-like model).
fn definition_blocks(func: &Function) -> HashMap<LocalId, BlockId> {
    let mut map = HashMap::new();
    for block in func.blocks.as_slice() {
        for stmt in &block.statements {
            if let Some(dest) = stmt.defined_local() {
                map.entry(dest).or_insert(block.label);
            }
        }
    }
    map
}

/// Creates a new block that jumps straight to `header`, and redirects
/// every block in `external_preds` to target it instead of `header`
/// directly.
fn synthesize_preheader(func: &mut Function, header: BlockId, external_preds: &[BlockId]) -> BlockId {
    let preheader_id = BlockId::from_usize(func.blocks.len());
    func.blocks.push(BasicBlock {
        label: preheader_id,
        statements: Vec::new(),
        terminator: Terminator::Goto { target: header },
    });

    let preds: HashSet<BlockId> = external_preds.iter().copied().collect();
    let mut blocks = IndexVec::new();
    for block in func.blocks.as_slice() {
        if preds.contains(&block.label) {
            let terminator = retarget(&block.terminator, header, preheader_id);
            blocks.push(BasicBlock {
                label: block.label,
                statements: block.statements.clone(),
                terminator,
            });
        } else {
            blocks.push(block.clone());
        }
    }
    func.blocks = blocks;
    preheader_id
}

fn retarget(term: &Terminator, from: BlockId, to: BlockId) -> Terminator {
    match term {
        Terminator::Goto { target } if *target == from => Terminator::Goto { target: to },
        Terminator::Branch { cond, then_block, else_block } => Terminator::Branch {
            cond: cond.clone(),
            then_block: if *then_block == from { to } else { *then_block },
            else_block: if *else_block == from { to } else { *else_block },
        },
        other => other.clone(),
    }
}

fn hoist_loop(
    func: &mut Function,
    header: BlockId,
    info: &LoopInfo,
    preheader: BlockId,
    def_blocks: &HashMap<LocalId, BlockId>,
) {
    let mut loop_blocks = info.blocks.clone();
    loop_blocks.insert(header);

    let mut hoisted = Vec::new();
    let mut blocks = IndexVec::new();
    for block in func.blocks.as_slice() {
        if loop_blocks.contains(&block.label) {
            let mut remaining = Vec::new();
            for stmt in &block.statements {
                if is_invariant(stmt, &loop_blocks, def_blocks) {
                    hoisted.push(stmt.clone());
                } else {
                    remaining.push(stmt.clone());
                }
            }
            blocks.push(BasicBlock {
                label: block.label,
                statements: remaining,
                terminator: block.terminator.clone(),
            });
        } else {
            blocks.push(block.clone());
        }
    }

    if !hoisted.is_empty() {
        if let Some(ph) = blocks.get_mut(preheader) {
            ph.statements.extend(hoisted);
        }
    }

    func.blocks = blocks;
}

fn is_invariant(
    stmt: &Statement,
    loop_blocks: &HashSet<BlockId>,
    def_blocks: &HashMap<LocalId, BlockId>,
) -> bool {
    if !stmt.is_side_effect_free() {
        return false;
    }
    stmt.used_locals().iter().all(|local| match def_blocks.get(local) {
        Some(def_block) => !loop_blocks.contains(def_block),
        // No recorded definition (e.g. a parameter) is outside the loop
        // by construction.
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_sem::{PrimitiveKind, Type};
    use faxc_util::{Idx, Span, Symbol};

    fn int_ty() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    /// entry -> header -> {body, exit}; body -> header (back edge). The
    /// header's only external predecessor is entry, so entry is reused
    /// directly as the preheader rather than synthesizing a new block.
    #[test]
    fn hoists_invariant_into_sole_external_predecessor() {
        let mut func = Function::new(Symbol::intern("loopy"), int_ty(), 1);
        let invariant = func.locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: None });
        let cond = func.locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: None });

        let entry = BlockId::from_usize(0);
        let header = BlockId::from_usize(1);
        let body = BlockId::from_usize(2);
        let exit = BlockId::from_usize(3);

        func.blocks.push(BasicBlock {
            label: entry,
            statements: vec![],
            terminator: Terminator::Goto { target: header },
        });
        func.blocks.push(BasicBlock {
            label: header,
            statements: vec![Statement::Assign {
                dest: invariant,
                value: Operand::Literal(Literal::int(int_ty(), 1)),
            }],
            terminator: Terminator::Branch {
                cond: Operand::LocalRef(cond),
                then_block: body,
                else_block: exit,
            },
        });
        func.blocks.push(BasicBlock {
            label: body,
            statements: vec![],
            terminator: Terminator::Goto { target: header },
        });
        func.blocks.push(BasicBlock { label: exit, statements: vec![], terminator: Terminator::Return(None) });
        func.entry_block = entry;

        let result = hoist_function(&func);
        let entry_block = &result.blocks.as_slice()[0];
        assert!(entry_block.statements.iter().any(|s| s.defined_local() == Some(invariant)));
        let header_block = result.blocks.as_slice().iter().find(|b| b.label == header).unwrap();
        assert!(header_block.statements.is_empty());
    }
}
