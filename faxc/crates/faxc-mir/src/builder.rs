use crate::mir::*;
use faxc_sem::Type;
use faxc_util::{Idx, Span, Symbol};

/// Incrementally constructs a `Function`: tracks the block currently being
/// appended to and hands out fresh locals/blocks.
pub struct Builder {
    pub function: Function,
    pub current_block: BlockId,
}

impl Builder {
    /// Starts a function with `param_count` parameter locals already
    /// pushed (locals `0..param_count`, in order, typed from `param_tys`).
    pub fn new(name: Symbol, return_ty: Type, param_tys: Vec<Type>) -> Self {
        let param_count = param_tys.len();
        let mut function = Function::new(name, return_ty, param_count);
        for ty in param_tys {
            function.locals.push(Local { ty, span: Span::DUMMY, name: None });
        }
        Self { function, current_block: BlockId(0) }
    }

    pub fn add_local(&mut self, ty: Type, name: Option<Symbol>) -> LocalId {
        self.function.locals.push(Local { ty, span: Span::DUMMY, name })
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::from_usize(self.function.blocks.len());
        self.function.blocks.push(BasicBlock::new(id));
        id
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.current_block = block;
    }

    pub fn statement(&mut self, stmt: Statement) {
        self.function.blocks[self.current_block].statements.push(stmt);
    }

    pub fn assign(&mut self, dest: LocalId, value: Operand) {
        self.statement(Statement::Assign { dest, value });
    }

    pub fn terminator(&mut self, terminator: Terminator) {
        self.function.blocks[self.current_block].terminator = terminator;
    }

    pub fn build(mut self) -> Function {
        if self.function.blocks.is_empty() {
            let entry = self.new_block();
            self.function.entry_block = entry;
        }
        self.function
    }
}
