//! Sparse conditional constant propagation (C12).
//!
//! Operates per function. Every local starts at `Bottom`; a fixpoint over
//! statements tightens each local's lattice entry until nothing changes,
//! then a substitution pass rewrites constant `LocalRef` operands to
//! `Literal`s.

use crate::mir::*;
use faxc_util::IndexVec;
use rayon::prelude::*;
use std::collections::HashMap;

/// The constant-propagation lattice: `Bottom ⊑ Constant(v) ⊑ Top`.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeValue {
    Bottom,
    Constant(LiteralValue),
    Top,
}

impl LatticeValue {
    /// The lattice meet: disagreeing constants or any `Top` input forces
    /// `Top`; `Bottom` is the identity.
    fn meet(a: &LatticeValue, b: &LatticeValue) -> LatticeValue {
        match (a, b) {
            (LatticeValue::Bottom, other) | (other, LatticeValue::Bottom) => other.clone(),
            (LatticeValue::Top, _) | (_, LatticeValue::Top) => LatticeValue::Top,
            (LatticeValue::Constant(x), LatticeValue::Constant(y)) => {
                if x == y {
                    LatticeValue::Constant(x.clone())
                } else {
                    LatticeValue::Top
                }
            }
        }
    }
}

/// Runs constant propagation over every function in `module`, returning a
/// new module. The pass never mutates its input. Functions are independent,
/// so they fold in parallel.
pub fn propagate_constants(module: &Module) -> Module {
    Module { functions: module.functions.par_iter().map(propagate_function).collect() }
}

pub fn propagate_function(func: &Function) -> Function {
    log::trace!("constant-propagating `{}`", func.name.as_str());
    let lattice = run_fixpoint(func);
    substitute(func, &lattice)
}

fn run_fixpoint(func: &Function) -> HashMap<LocalId, LatticeValue> {
    let mut lattice: HashMap<LocalId, LatticeValue> = HashMap::new();
    for (id, _) in func.locals.iter_enumerated() {
        let initial = if func.is_param(id) { LatticeValue::Top } else { LatticeValue::Bottom };
        lattice.insert(id, initial);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for block in func.blocks.as_slice() {
            for stmt in &block.statements {
                if let Some(new_value) = eval_statement(stmt, &lattice) {
                    if let Some(dest) = stmt.defined_local() {
                        let current = lattice.get(&dest).cloned().unwrap_or(LatticeValue::Bottom);
                        let merged = LatticeValue::meet(&current, &new_value);
                        // Monotone widening: never revert a value once it
                        // becomes more precise than the fresh evaluation,
                        // only move toward Top on disagreement.
                        let next = widen(&current, &merged, &new_value);
                        if next != current {
                            lattice.insert(dest, next);
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    lattice
}

/// Combines the freshly evaluated value for this iteration with the
/// running lattice entry. A statement like `Assign`/`Call` simply takes
/// its own evaluation (the lattice never needs `meet` across iterations
/// for single-definition locals); `Phi` always merges across its inputs.
fn widen(current: &LatticeValue, _merged: &LatticeValue, fresh: &LatticeValue) -> LatticeValue {
    match (current, fresh) {
        (LatticeValue::Top, _) => LatticeValue::Top,
        _ => fresh.clone(),
    }
}

fn eval_statement(
    stmt: &Statement,
    lattice: &HashMap<LocalId, LatticeValue>,
) -> Option<LatticeValue> {
    match stmt {
        Statement::Assign { value, .. } => Some(eval_operand(value, lattice)),
        Statement::Call { func, args, .. } => Some(eval_call(func.as_str(), args, lattice)),
        Statement::LoadField { .. }
        | Statement::LoadIndex { .. }
        | Statement::ConstructStruct { .. }
        | Statement::ConstructArray { .. }
        | Statement::ConstructTuple { .. } => Some(LatticeValue::Top),
        Statement::Discriminant { .. } => Some(LatticeValue::Top),
        Statement::Phi { inputs, .. } => {
            let mut acc = LatticeValue::Bottom;
            for (_, operand) in inputs {
                acc = LatticeValue::meet(&acc, &eval_operand(operand, lattice));
            }
            Some(acc)
        }
        Statement::StoreField { .. } | Statement::StoreIndex { .. } => None,
    }
}

fn eval_operand(op: &Operand, lattice: &HashMap<LocalId, LatticeValue>) -> LatticeValue {
    match op {
        Operand::Literal(lit) => LatticeValue::Constant(lit.value.clone()),
        Operand::LocalRef(id) => lattice.get(id).cloned().unwrap_or(LatticeValue::Bottom),
    }
}

fn eval_call(
    name: &str,
    args: &[Operand],
    lattice: &HashMap<LocalId, LatticeValue>,
) -> LatticeValue {
    if !is_reserved_intrinsic(name) {
        return LatticeValue::Top;
    }
    let values: Vec<LatticeValue> = args.iter().map(|a| eval_operand(a, lattice)).collect();
    let [a, b] = match values.as_slice() {
        [a, b] => [a.clone(), b.clone()],
        _ => return LatticeValue::Top,
    };
    let (LatticeValue::Constant(LiteralValue::Int(x)), LatticeValue::Constant(LiteralValue::Int(y))) =
        (&a, &b)
    else {
        return if matches!(a, LatticeValue::Top) || matches!(b, LatticeValue::Top) {
            LatticeValue::Top
        } else {
            LatticeValue::Bottom
        };
    };
    let result = match name {
        "__add__" => Some(x + y),
        "__sub__" => Some(x - y),
        "__mul__" => Some(x * y),
        "__div__" => {
            if *y == 0 {
                return LatticeValue::Top;
            }
            Some(x / y)
        }
        "__eq__" => Some((x == y) as i64),
        "__ne__" => Some((x != y) as i64),
        "__lt__" => Some((x < y) as i64),
        "__le__" => Some((x <= y) as i64),
        "__gt__" => Some((x > y) as i64),
        "__ge__" => Some((x >= y) as i64),
        _ => None,
    };
    match result {
        Some(v) => LatticeValue::Constant(LiteralValue::Int(v)),
        None => LatticeValue::Top,
    }
}

/// Rewrites every `LocalRef` operand whose local resolved to `Constant`
/// into the equivalent `Literal`, rebuilding every block through a
/// block-id map so `Phi` predecessor references stay valid.
fn substitute(func: &Function, lattice: &HashMap<LocalId, LatticeValue>) -> Function {
    let mut out = func.clone();
    let mut blocks = IndexVec::new();
    for block in func.blocks.as_slice() {
        let statements =
            block.statements.iter().map(|s| substitute_statement(s, func, lattice)).collect();
        let terminator = substitute_terminator(&block.terminator, func, lattice);
        blocks.push(BasicBlock { label: block.label, statements, terminator });
    }
    out.blocks = blocks;
    out
}

fn substitute_operand(
    op: &Operand,
    func: &Function,
    lattice: &HashMap<LocalId, LatticeValue>,
) -> Operand {
    if let Operand::LocalRef(id) = op {
        if let Some(LatticeValue::Constant(v)) = lattice.get(id) {
            let ty = func.locals.get(*id).map(|l| l.ty.clone()).unwrap_or(func.return_ty.clone());
            return Operand::Literal(Literal { ty, value: v.clone() });
        }
    }
    op.clone()
}

fn substitute_statement(
    stmt: &Statement,
    func: &Function,
    lattice: &HashMap<LocalId, LatticeValue>,
) -> Statement {
    let sub = |op: &Operand| substitute_operand(op, func, lattice);
    match stmt {
        Statement::Assign { dest, value } => Statement::Assign { dest: *dest, value: sub(value) },
        Statement::Call { dest, func: name, args } => {
            Statement::Call { dest: *dest, func: *name, args: args.iter().map(sub).collect() }
        }
        Statement::LoadField { dest, object, field } => {
            Statement::LoadField { dest: *dest, object: *object, field: *field }
        }
        Statement::StoreField { object, field, value } => {
            Statement::StoreField { object: *object, field: *field, value: sub(value) }
        }
        Statement::LoadIndex { dest, array, index } => {
            Statement::LoadIndex { dest: *dest, array: *array, index: sub(index) }
        }
        Statement::StoreIndex { array, index, value } => {
            Statement::StoreIndex { array: *array, index: sub(index), value: sub(value) }
        }
        Statement::ConstructStruct { dest, def_id, fields } => Statement::ConstructStruct {
            dest: *dest,
            def_id: *def_id,
            fields: fields.iter().map(|(name, op)| (*name, sub(op))).collect(),
        },
        Statement::ConstructArray { dest, elem_ty, values } => Statement::ConstructArray {
            dest: *dest,
            elem_ty: elem_ty.clone(),
            values: values.iter().map(sub).collect(),
        },
        Statement::ConstructTuple { dest, values } => {
            Statement::ConstructTuple { dest: *dest, values: values.iter().map(sub).collect() }
        }
        Statement::Discriminant { dest, value } => {
            Statement::Discriminant { dest: *dest, value: *value }
        }
        Statement::Phi { dest, inputs } => Statement::Phi {
            dest: *dest,
            inputs: inputs.iter().map(|(pred, op)| (*pred, sub(op))).collect(),
        },
    }
}

fn substitute_terminator(
    term: &Terminator,
    func: &Function,
    lattice: &HashMap<LocalId, LatticeValue>,
) -> Terminator {
    match term {
        Terminator::Return(op) => {
            Terminator::Return(op.as_ref().map(|o| substitute_operand(o, func, lattice)))
        }
        Terminator::Branch { cond, then_block, else_block } => Terminator::Branch {
            cond: substitute_operand(cond, func, lattice),
            then_block: *then_block,
            else_block: *else_block,
        },
        Terminator::Goto { target } => Terminator::Goto { target: *target },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_sem::{PrimitiveKind, Type};
    use faxc_util::{Idx, Symbol};

    fn int_ty() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    #[test]
    fn folds_constant_addition() {
        let mut func = Function::new(Symbol::intern("add_consts"), int_ty(), 0);
        let a = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let b = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let c = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let block = BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![
                Statement::Assign { dest: a, value: Operand::Literal(Literal::int(int_ty(), 2)) },
                Statement::Assign { dest: b, value: Operand::Literal(Literal::int(int_ty(), 3)) },
                Statement::Call {
                    dest: c,
                    func: Symbol::intern("__add__"),
                    args: vec![Operand::LocalRef(a), Operand::LocalRef(b)],
                },
            ],
            terminator: Terminator::Return(Some(Operand::LocalRef(c))),
        };
        func.blocks.push(block);
        func.entry_block = BlockId::from_usize(0);

        let result = propagate_function(&func);
        match &result.blocks.as_slice()[0].terminator {
            Terminator::Return(Some(Operand::Literal(lit))) => {
                assert_eq!(lit.value, LiteralValue::Int(5));
            }
            other => panic!("expected folded literal return, got {:?}", other),
        }
    }

    #[test]
    fn division_by_zero_forces_top() {
        let mut func = Function::new(Symbol::intern("div_zero"), int_ty(), 0);
        let a = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let b = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let c = func.locals.push(Local { ty: int_ty(), span: faxc_util::Span::DUMMY, name: None });
        let block = BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![
                Statement::Assign { dest: a, value: Operand::Literal(Literal::int(int_ty(), 7)) },
                Statement::Assign { dest: b, value: Operand::Literal(Literal::int(int_ty(), 0)) },
                Statement::Call {
                    dest: c,
                    func: Symbol::intern("__div__"),
                    args: vec![Operand::LocalRef(a), Operand::LocalRef(b)],
                },
            ],
            terminator: Terminator::Return(Some(Operand::LocalRef(c))),
        };
        func.blocks.push(block);
        func.entry_block = BlockId::from_usize(0);

        let result = propagate_function(&func);
        match &result.blocks.as_slice()[0].terminator {
            Terminator::Return(Some(Operand::LocalRef(_))) => {}
            other => panic!("division by zero should not fold, got {:?}", other),
        }
    }

    #[test]
    fn phi_merges_disagreeing_constants_to_top() {
        let lattice_a = LatticeValue::Constant(LiteralValue::Int(1));
        let lattice_b = LatticeValue::Constant(LiteralValue::Int(2));
        assert_eq!(LatticeValue::meet(&lattice_a, &lattice_b), LatticeValue::Top);
        assert_eq!(
            LatticeValue::meet(&LatticeValue::Bottom, &lattice_a),
            LatticeValue::Constant(LiteralValue::Int(1))
        );
    }
}
