//! Dead code elimination (C13): unreachable-block pruning followed by
//! use-def liveness over the survivors.

use crate::mir::*;
use faxc_util::{Idx, IndexVec};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

/// Functions are eliminated independently, so the module-wide pass folds
/// them in parallel.
pub fn eliminate_dead_code(module: &Module) -> Module {
    Module { functions: module.functions.par_iter().map(eliminate_function).collect() }
}

pub fn eliminate_function(func: &Function) -> Function {
    log::trace!("eliminating dead code in `{}`", func.name.as_str());
    let reachable = reachable_blocks(func);
    let live_locals = live_locals(func, &reachable);

    let mut remap: HashMap<BlockId, BlockId> = HashMap::new();
    let mut blocks = IndexVec::new();
    for block in func.blocks.as_slice() {
        if reachable.contains(&block.label) {
            let new_id = BlockId::from_usize(blocks.len());
            remap.insert(block.label, new_id);
        }
    }

    for block in func.blocks.as_slice() {
        if !reachable.contains(&block.label) {
            continue;
        }
        let statements = block
            .statements
            .iter()
            .filter(|stmt| match stmt.defined_local() {
                Some(local) => live_locals.contains(&local),
                // Stores have no definition of their own and are always
                // kept: they are visible through the object/array they
                // write, not through a local this pass tracks.
                None => true,
            })
            .cloned()
            .collect();
        let terminator = remap_terminator(&block.terminator, &remap);
        blocks.push(BasicBlock { label: remap[&block.label], statements, terminator });
    }

    let mut out = func.clone();
    out.entry_block = remap.get(&func.entry_block).copied().unwrap_or(func.entry_block);
    out.blocks = blocks;
    out
}

fn remap_terminator(term: &Terminator, remap: &HashMap<BlockId, BlockId>) -> Terminator {
    match term {
        Terminator::Return(op) => Terminator::Return(op.clone()),
        Terminator::Branch { cond, then_block, else_block } => Terminator::Branch {
            cond: cond.clone(),
            then_block: remap.get(then_block).copied().unwrap_or(*then_block),
            else_block: remap.get(else_block).copied().unwrap_or(*else_block),
        },
        Terminator::Goto { target } => {
            Terminator::Goto { target: remap.get(target).copied().unwrap_or(*target) }
        }
    }
}

fn reachable_blocks(func: &Function) -> HashSet<BlockId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(func.entry_block);
    visited.insert(func.entry_block);

    while let Some(current) = queue.pop_front() {
        let Some(block) = func.blocks.get(current) else { continue };
        for target in block.terminator.targets() {
            if visited.insert(target) {
                queue.push_back(target);
            }
        }
    }
    visited
}

fn live_locals(func: &Function, reachable: &HashSet<BlockId>) -> HashSet<LocalId> {
    let mut live: HashSet<LocalId> = func.param_locals().collect();
    for block in func.blocks.as_slice() {
        if !reachable.contains(&block.label) {
            continue;
        }
        for stmt in &block.statements {
            for used in stmt.used_locals() {
                live.insert(used);
            }
        }
        block.terminator.for_each_operand(|op| {
            if let Operand::LocalRef(id) = op {
                live.insert(*id);
            }
        });
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_sem::{PrimitiveKind, Type};
    use faxc_util::{Idx, Span, Symbol};

    fn int_ty() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    #[test]
    fn drops_unreachable_block_and_dead_local() {
        let mut func = Function::new(Symbol::intern("f"), int_ty(), 0);
        let live = func.locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: None });
        let dead = func.locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: None });

        func.blocks.push(BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![Statement::Assign {
                dest: live,
                value: Operand::Literal(Literal::int(int_ty(), 1)),
            }],
            terminator: Terminator::Return(Some(Operand::LocalRef(live))),
        });
        // An unreachable block defining `dead`.
        func.blocks.push(BasicBlock {
            label: BlockId::from_usize(1),
            statements: vec![Statement::Assign {
                dest: dead,
                value: Operand::Literal(Literal::int(int_ty(), 2)),
            }],
            terminator: Terminator::Return(None),
        });
        func.entry_block = BlockId::from_usize(0);

        let result = eliminate_function(&func);
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks.as_slice()[0].statements.len(), 1);
    }

    #[test]
    fn parameters_always_retained() {
        let mut func = Function::new(Symbol::intern("f"), int_ty(), 1);
        func.blocks.push(BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![],
            terminator: Terminator::Return(None),
        });
        func.entry_block = BlockId::from_usize(0);

        let result = eliminate_function(&func);
        assert_eq!(result.locals.len(), 1);
        assert!(result.is_param(LocalId::from_usize(0)));
    }
}
