//! MIR (Mid-level Intermediate Representation) for the Fax compiler.
//!
//! Canonical, SSA-adjacent data model consumed and produced by every pass
//! in `opt`: a module owns functions, a function owns locals and blocks,
//! a block owns statements and exactly one terminator.

use faxc_sem::Type;
use faxc_util::{define_idx, DefId, IndexVec, Span, Symbol};

/// A MIR module: the unit the optimizer consumes and produces. Passes are
/// pure: each takes a `&Module` and returns a new owned `Module`.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self { functions: Vec::new() }
    }

    /// Checks internal invariants that recovery cannot route around:
    /// every block reference must resolve within its function, and every
    /// function must have at least an entry block.
    pub fn verify(&self) -> Result<(), crate::MirError> {
        for func in &self.functions {
            if func.blocks.is_empty() {
                return Err(crate::MirError::EmptyFunction { name: func.name.as_str().to_string() });
            }
            if func.blocks.get(func.entry_block).is_none() {
                return Err(crate::MirError::DanglingBlock {
                    function: func.name.as_str().to_string(),
                    block: func.entry_block,
                });
            }
            for block in func.blocks.as_slice() {
                for target in block.terminator.targets() {
                    if func.blocks.get(target).is_none() {
                        return Err(crate::MirError::DanglingBlock {
                            function: func.name.as_str().to_string(),
                            block: target,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// MIR function: its type parameters, parameter locals, return type, the
/// full set of locals (parameters included, at the front), its blocks, and
/// the entry block pointer.
#[derive(Clone)]
pub struct Function {
    pub name: Symbol,
    pub type_params: Vec<Symbol>,
    pub locals: IndexVec<LocalId, Local>,
    pub param_count: usize,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub entry_block: BlockId,
    pub return_ty: Type,
}

impl Function {
    pub fn new(name: Symbol, return_ty: Type, param_count: usize) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            locals: IndexVec::new(),
            param_count,
            blocks: IndexVec::new(),
            entry_block: BlockId(0),
            return_ty,
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Parameters are locals `0..param_count` by the construction
    /// convention used throughout `build`/`lower`.
    pub fn param_locals(&self) -> impl Iterator<Item = LocalId> {
        (0..self.param_count).map(|i| LocalId(i as u32))
    }

    pub fn is_param(&self, local: LocalId) -> bool {
        (local.0 as usize) < self.param_count
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("block_count", &self.block_count())
            .field("local_count", &self.local_count())
            .field("return_ty", &self.return_ty)
            .finish()
    }
}

/// Local variable slot
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub ty: Type,
    pub span: Span,
    pub name: Option<Symbol>,
}

define_idx!(LocalId);
define_idx!(BlockId);

/// Basic block: a label, its statements in order, and exactly one terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: BlockId,
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(label: BlockId) -> Self {
        Self { label, statements: Vec::new(), terminator: Terminator::Return(None) }
    }
}

/// A statement, always either defining a local or having an effect visible
/// only through that definition (field/index stores are the exception:
/// they write through an existing local rather than defining a new one).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `dest = operand`
    Assign { dest: LocalId, value: Operand },
    /// `dest = func(args...)`. `func` names either a reserved operator
    /// intrinsic or a user-defined function by symbol.
    Call { dest: LocalId, func: Symbol, args: Vec<Operand> },
    /// `dest = object.field`
    LoadField { dest: LocalId, object: LocalId, field: Symbol },
    /// `object.field = value`
    StoreField { object: LocalId, field: Symbol, value: Operand },
    /// `dest = array[index]`
    LoadIndex { dest: LocalId, array: LocalId, index: Operand },
    /// `array[index] = value`
    StoreIndex { array: LocalId, index: Operand, value: Operand },
    /// `dest = StructName { field: value, ... }`
    ConstructStruct { dest: LocalId, def_id: DefId, fields: Vec<(Symbol, Operand)> },
    /// `dest = [values...]`
    ConstructArray { dest: LocalId, elem_ty: Type, values: Vec<Operand> },
    /// `dest = (values...)`
    ConstructTuple { dest: LocalId, values: Vec<Operand> },
    /// `dest = discriminant(enum_value)`
    Discriminant { dest: LocalId, value: LocalId },
    /// `dest = phi [pred -> operand, ...]`, one input per predecessor block.
    Phi { dest: LocalId, inputs: Vec<(BlockId, Operand)> },
}

impl Statement {
    /// The local this statement defines, if any (store statements write
    /// through an existing local and define nothing new).
    pub fn defined_local(&self) -> Option<LocalId> {
        match self {
            Statement::Assign { dest, .. }
            | Statement::Call { dest, .. }
            | Statement::LoadField { dest, .. }
            | Statement::LoadIndex { dest, .. }
            | Statement::ConstructStruct { dest, .. }
            | Statement::ConstructArray { dest, .. }
            | Statement::ConstructTuple { dest, .. }
            | Statement::Discriminant { dest, .. }
            | Statement::Phi { dest, .. } => Some(*dest),
            Statement::StoreField { .. } | Statement::StoreIndex { .. } => None,
        }
    }

    /// Whether this statement can have a visible effect beyond defining its
    /// local, per the LICM invariance rule: only Assign/LoadField/LoadIndex
    /// are side-effect-free.
    pub fn is_side_effect_free(&self) -> bool {
        matches!(
            self,
            Statement::Assign { .. } | Statement::LoadField { .. } | Statement::LoadIndex { .. }
        )
    }

    /// Visits every operand slot read by this statement (not including the
    /// defined local itself, nor the base object/array of a load/store,
    /// which are visited separately since they are bare `LocalId`s).
    pub fn for_each_operand<F: FnMut(&Operand)>(&self, mut f: F) {
        match self {
            Statement::Assign { value, .. } => f(value),
            Statement::Call { args, .. } => args.iter().for_each(f),
            Statement::LoadField { .. } => {}
            Statement::StoreField { value, .. } => f(value),
            Statement::LoadIndex { index, .. } => f(index),
            Statement::StoreIndex { index, value, .. } => {
                f(index);
                f(value);
            }
            Statement::ConstructStruct { fields, .. } => {
                fields.iter().for_each(|(_, op)| f(op))
            }
            Statement::ConstructArray { values, .. } => values.iter().for_each(f),
            Statement::ConstructTuple { values, .. } => values.iter().for_each(f),
            Statement::Discriminant { .. } => {}
            Statement::Phi { inputs, .. } => inputs.iter().for_each(|(_, op)| f(op)),
        }
    }

    /// Every `LocalId` this statement reads, whether through an operand or
    /// as a bare object/array base.
    pub fn used_locals(&self) -> Vec<LocalId> {
        let mut out = Vec::new();
        match self {
            Statement::LoadField { object, .. } => out.push(*object),
            Statement::StoreField { object, .. } => out.push(*object),
            Statement::LoadIndex { array, .. } => out.push(*array),
            Statement::StoreIndex { array, .. } => out.push(*array),
            Statement::Discriminant { value, .. } => out.push(*value),
            _ => {}
        }
        self.for_each_operand(|op| {
            if let Operand::LocalRef(id) = op {
                out.push(*id);
            }
        });
        out
    }
}

/// An operand: either an immediate literal or a reference to a local,
/// semantically SSA-like (reassignment happens through new Assign
/// statements, not in-place mutation of what an operand names).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    LocalRef(LocalId),
}

/// A literal value, carrying its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub ty: Type,
    pub value: LiteralValue,
}

impl Literal {
    pub fn int(ty: Type, v: i64) -> Self {
        Self { ty, value: LiteralValue::Int(v) }
    }

    pub fn bool(v: bool) -> Self {
        Self { ty: Type::Primitive(faxc_sem::PrimitiveKind::Bool), value: LiteralValue::Bool(v) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    String(Symbol),
    Bool(bool),
    Void,
}

/// A block's terminator: exactly one per block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Returns from the function, optionally with a value.
    Return(Option<Operand>),
    /// Conditional branch on a boolean operand.
    Branch { cond: Operand, then_block: BlockId, else_block: BlockId },
    /// Unconditional jump.
    Goto { target: BlockId },
}

impl Terminator {
    /// The set of blocks this terminator can transfer control to.
    pub fn targets(&self) -> Vec<BlockId> {
        match self {
            Terminator::Return(_) => Vec::new(),
            Terminator::Branch { then_block, else_block, .. } => vec![*then_block, *else_block],
            Terminator::Goto { target } => vec![*target],
        }
    }

    pub fn for_each_operand<F: FnMut(&Operand)>(&self, mut f: F) {
        match self {
            Terminator::Return(Some(op)) => f(op),
            Terminator::Return(None) => {}
            Terminator::Branch { cond, .. } => f(cond),
            Terminator::Goto { .. } => {}
        }
    }
}

/// Reserved intrinsic operator names recognized by the constant
/// propagation pass. A call to any other name is treated as potentially
/// impure by every pass.
pub const RESERVED_INTRINSICS: &[&str] = &[
    "__add__", "__sub__", "__mul__", "__div__", "__eq__", "__ne__", "__lt__", "__le__", "__gt__",
    "__ge__",
];

pub fn is_reserved_intrinsic(name: &str) -> bool {
    RESERVED_INTRINSICS.contains(&name)
}
