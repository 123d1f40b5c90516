//! Edge case tests for faxc-mir

#[cfg(test)]
mod tests {
    use crate::{BasicBlock, BlockId, Function, Local, LocalId, Statement, Terminator};
    use crate::{Literal, LiteralValue, Operand};
    use faxc_sem::{PrimitiveKind, Type};
    use faxc_util::{Idx, IndexVec, Span, Symbol};

    fn int_ty() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    // ==================== FUNCTION TESTS ====================

    #[test]
    fn test_edge_empty_function() {
        let func = Function::new(Symbol::intern("empty"), Type::Primitive(PrimitiveKind::Void), 0);
        assert_eq!(func.name, Symbol::intern("empty"));
        assert_eq!(func.local_count(), 0);
    }

    #[test]
    fn test_edge_single_local() {
        let mut locals: IndexVec<LocalId, Local> = IndexVec::new();
        locals.push(Local { ty: int_ty(), span: Span::DUMMY, name: Some(Symbol::intern("x")) });
        assert_eq!(locals.len(), 1);
    }

    #[test]
    fn test_edge_many_locals() {
        let mut locals: IndexVec<LocalId, Local> = IndexVec::new();
        for i in 0..100 {
            locals.push(Local {
                ty: int_ty(),
                span: Span::DUMMY,
                name: Some(Symbol::intern(&format!("var{}", i))),
            });
        }
        assert_eq!(locals.len(), 100);
    }

    // ==================== BASIC BLOCK TESTS ====================

    #[test]
    fn test_edge_empty_block() {
        let block = BasicBlock::new(BlockId::from_usize(0));
        assert!(block.statements.is_empty());
    }

    #[test]
    fn test_edge_single_stmt() {
        let block = BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![Statement::Assign {
                dest: LocalId::from_usize(0),
                value: Operand::Literal(Literal::int(int_ty(), 1)),
            }],
            terminator: Terminator::Return(None),
        };
        assert_eq!(block.statements.len(), 1);
    }

    #[test]
    fn test_edge_many_stmts() {
        let stmts: Vec<_> = (0..100)
            .map(|i| Statement::Assign {
                dest: LocalId::from_usize(i),
                value: Operand::Literal(Literal::int(int_ty(), i as i64)),
            })
            .collect();
        let block =
            BasicBlock { label: BlockId::from_usize(0), statements: stmts, terminator: Terminator::Return(None) };
        assert_eq!(block.statements.len(), 100);
    }

    // ==================== TERMINATOR TESTS ====================

    #[test]
    fn test_edge_goto() {
        let term = Terminator::Goto { target: BlockId::from_usize(1) };
        assert_eq!(term.targets(), vec![BlockId::from_usize(1)]);
    }

    #[test]
    fn test_edge_branch_term() {
        let term = Terminator::Branch {
            cond: Operand::Literal(Literal::bool(true)),
            then_block: BlockId::from_usize(1),
            else_block: BlockId::from_usize(2),
        };
        assert_eq!(term.targets(), vec![BlockId::from_usize(1), BlockId::from_usize(2)]);
    }

    #[test]
    fn test_edge_return_none() {
        let term = Terminator::Return(None);
        assert!(term.targets().is_empty());
    }

    #[test]
    fn test_edge_return_value() {
        let term = Terminator::Return(Some(Operand::Literal(Literal::int(int_ty(), 7))));
        assert!(matches!(term, Terminator::Return(Some(_))));
    }

    // ==================== STATEMENT TESTS ====================

    #[test]
    fn test_edge_assign() {
        let stmt = Statement::Assign {
            dest: LocalId::from_usize(0),
            value: Operand::Literal(Literal::int(int_ty(), 42)),
        };
        assert_eq!(stmt.defined_local(), Some(LocalId::from_usize(0)));
    }

    #[test]
    fn test_edge_call() {
        let stmt = Statement::Call {
            dest: LocalId::from_usize(2),
            func: Symbol::intern("__add__"),
            args: vec![Operand::LocalRef(LocalId::from_usize(0)), Operand::LocalRef(LocalId::from_usize(1))],
        };
        assert_eq!(stmt.used_locals(), vec![LocalId::from_usize(0), LocalId::from_usize(1)]);
        assert!(!stmt.is_side_effect_free());
    }

    #[test]
    fn test_edge_load_store_field() {
        let load = Statement::LoadField {
            dest: LocalId::from_usize(1),
            object: LocalId::from_usize(0),
            field: Symbol::intern("x"),
        };
        assert!(load.is_side_effect_free());

        let store = Statement::StoreField {
            object: LocalId::from_usize(0),
            field: Symbol::intern("x"),
            value: Operand::Literal(Literal::int(int_ty(), 1)),
        };
        assert_eq!(store.defined_local(), None);
        assert!(!store.is_side_effect_free());
    }

    #[test]
    fn test_edge_phi_zero_and_many_inputs() {
        let empty_phi = Statement::Phi { dest: LocalId::from_usize(0), inputs: vec![] };
        assert_eq!(empty_phi.used_locals(), Vec::<LocalId>::new());

        let phi = Statement::Phi {
            dest: LocalId::from_usize(0),
            inputs: vec![
                (BlockId::from_usize(1), Operand::LocalRef(LocalId::from_usize(1))),
                (BlockId::from_usize(2), Operand::LocalRef(LocalId::from_usize(2))),
            ],
        };
        assert_eq!(phi.used_locals(), vec![LocalId::from_usize(1), LocalId::from_usize(2)]);
    }

    #[test]
    fn test_edge_construct_struct_array_tuple() {
        let array = Statement::ConstructArray { dest: LocalId::from_usize(0), elem_ty: int_ty(), values: vec![] };
        assert_eq!(array.defined_local(), Some(LocalId::from_usize(0)));

        let tuple = Statement::ConstructTuple {
            dest: LocalId::from_usize(1),
            values: vec![Operand::LocalRef(LocalId::from_usize(0))],
        };
        assert_eq!(tuple.used_locals(), vec![LocalId::from_usize(0)]);
    }

    // ==================== LITERAL TESTS ====================

    #[test]
    fn test_edge_int_literal() {
        let lit = Literal::int(int_ty(), 42);
        assert_eq!(lit.value, LiteralValue::Int(42));
    }

    #[test]
    fn test_edge_bool_literal() {
        let lit = Literal::bool(true);
        assert_eq!(lit.value, LiteralValue::Bool(true));
    }

    #[test]
    fn test_edge_void_literal() {
        let lit = Literal { ty: Type::Primitive(PrimitiveKind::Void), value: LiteralValue::Void };
        assert_eq!(lit.value, LiteralValue::Void);
    }

    // ==================== ERROR / RECOVERY CASES ====================

    #[test]
    fn test_edge_dangling_block_ref_detected_by_verify() {
        let mut func = Function::new(Symbol::intern("f"), int_ty(), 0);
        func.blocks.push(BasicBlock {
            label: BlockId::from_usize(0),
            statements: vec![],
            terminator: Terminator::Goto { target: BlockId::from_usize(999) },
        });
        func.entry_block = BlockId::from_usize(0);

        let module = crate::Module { functions: vec![func] };
        assert!(module.verify().is_err());
    }

    #[test]
    fn test_edge_reserved_intrinsics_are_recognized() {
        assert!(crate::is_reserved_intrinsic("__add__"));
        assert!(!crate::is_reserved_intrinsic("user_fn"));
    }
}
