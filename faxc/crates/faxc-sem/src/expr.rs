//! Expression checker (C8).
//!
//! Infers a type for every expression, lowers it to [`hir::Expr`], and
//! records the inferred type keyed by the AST node's identity so later
//! passes (and diagnostics) can recover it without re-checking. Also
//! implements 4.4.1 assignability (by delegating to [`crate::resolve`])
//! and 4.4.2 generic inference (by delegating to [`crate::infer`]) at
//! their two call sites: function calls and struct literals.

use crate::hir;
use crate::infer::{infer_call_args, infer_struct_fields, substitute_params};
use crate::resolve::is_assignable;
use crate::scope::BorrowKind;
use crate::types::*;
use crate::Checker;
use faxc_par::ast;
use faxc_util::{DefId, DiagnosticCode, Span, Symbol};

/// Operator method names reserved for user-defined overloading, looked
/// up on the method table when a binary operator's built-in primitive
/// rule doesn't apply.
fn intrinsic_for(op: ast::BinOp) -> &'static str {
    match op {
        ast::BinOp::Add => "__add__",
        ast::BinOp::Sub => "__sub__",
        ast::BinOp::Mul => "__mul__",
        ast::BinOp::Div => "__div__",
        ast::BinOp::Eq => "__eq__",
        ast::BinOp::Ne => "__ne__",
        ast::BinOp::Lt => "__lt__",
        ast::BinOp::Le => "__le__",
        ast::BinOp::Gt => "__gt__",
        ast::BinOp::Ge => "__ge__",
        _ => "",
    }
}

/// Falls back to the span of the nearest enclosing statement/block when
/// an expression carries none of its own; several `ast::Expr` variants
/// have no attached span at all.
fn span_of(expr: &ast::Expr, fallback: Span) -> Span {
    expr.span().unwrap_or(fallback)
}

/// Checks `expr`, returning its lowered HIR form. `in_unsafe` is
/// threaded down from the enclosing statement context rather than
/// tracked as checker state, since it's a purely lexical property.
pub fn check_expr(checker: &mut Checker, expr: &ast::Expr, fallback_span: Span, in_unsafe: bool) -> hir::Expr {
    let span = span_of(expr, fallback_span);
    let lowered = match expr {
        ast::Expr::Literal(lit) => check_literal(lit),
        ast::Expr::Path(path) => check_path(checker, path, span),
        ast::Expr::Binary(b) => check_binary(checker, b, in_unsafe),
        ast::Expr::Unary(u) => check_unary(checker, u, in_unsafe),
        ast::Expr::Call(c) => check_call(checker, c, fallback_span, in_unsafe),
        ast::Expr::MethodCall(m) => check_method_call(checker, m, span, in_unsafe),
        ast::Expr::Field(f) => check_field(checker, f, in_unsafe),
        ast::Expr::Index(i) => check_index(checker, i, span, in_unsafe),
        ast::Expr::Block(b) => crate::stmt::check_block(checker, b, in_unsafe),
        ast::Expr::If(i) => check_if(checker, i, span, in_unsafe),
        ast::Expr::Match(m) => check_match(checker, m, span, in_unsafe),
        ast::Expr::Closure(c) => check_closure(checker, c, span, in_unsafe),
        ast::Expr::Assign(a) => check_assign(checker, a, span, in_unsafe),
        ast::Expr::CompoundAssign(a) => check_compound_assign(checker, a, span, in_unsafe),
        ast::Expr::Return(e) => {
            let inner = e.as_ref().map(|e| Box::new(check_expr(checker, e, span, in_unsafe)));
            let expected = checker.current_fn.as_ref().map(|f| f.return_ty.clone()).unwrap_or(Type::Primitive(PrimitiveKind::Void));
            let got = inner.as_ref().map(|e| e.ty()).unwrap_or(Type::Primitive(PrimitiveKind::Void));
            if !is_assignable(&got, &expected, &checker.ctx, &checker.env) {
                type_mismatch(checker, &expected, &got, span);
            }
            hir::Expr::Return(inner)
        }
        ast::Expr::Break(e, label) => {
            let inner = e.as_ref().map(|e| Box::new(check_expr(checker, e, span, in_unsafe)));
            hir::Expr::Break(inner, label.map(|s| checker.resolve_label(s)))
        }
        ast::Expr::Continue(label) => hir::Expr::Continue(label.map(|s| checker.resolve_label(s))),
        ast::Expr::Tuple(elems) => {
            let checked: Vec<hir::Expr> = elems.iter().map(|e| check_expr(checker, e, span, in_unsafe)).collect();
            let ty = Type::Tuple(checked.iter().map(|e| e.ty()).collect());
            hir::Expr::Tuple { elems: checked, ty }
        }
        ast::Expr::Array(elems) => {
            let checked: Vec<hir::Expr> = elems.iter().map(|e| check_expr(checker, e, span, in_unsafe)).collect();
            let elem_ty = checked.first().map(|e| e.ty()).unwrap_or(Type::Error);
            for e in &checked {
                if !is_assignable(&e.ty(), &elem_ty, &checker.ctx, &checker.env) {
                    type_mismatch(checker, &elem_ty, &e.ty(), span);
                }
            }
            let len = checked.len();
            let ty = Type::Array(Box::new(elem_ty), len);
            hir::Expr::Array { elems: checked, ty }
        }
        ast::Expr::Range(r) => check_range(checker, r, span, in_unsafe),
        ast::Expr::Cast(e, ty) => {
            let checked = check_expr(checker, e, span, in_unsafe);
            let names = checker.type_names();
            let target = crate::resolve::resolve_type(ty, &checker.ctx, &checker.env, &names, checker.handler, span);
            hir::Expr::Cast { expr: Box::new(checked), ty: target }
        }
        ast::Expr::Async(a) => {
            let body = crate::stmt::check_block(checker, &a.body, in_unsafe);
            let ty = Type::Future(Box::new(body.ty()));
            hir::Expr::Async { body: Box::new(body), ty }
        }
        ast::Expr::Await(e) => {
            let checked = check_expr(checker, e, span, in_unsafe);
            let ty = match checker.ctx.normalize(&checked.ty()) {
                Type::Future(inner) => (**inner).clone(),
                other => {
                    checker
                        .handler
                        .build_error(span, format!("cannot `await` non-future type `{:?}`", other))
                        .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                        .emit(checker.handler);
                    Type::Error
                }
            };
            hir::Expr::Await { expr: Box::new(checked), ty }
        }
        ast::Expr::StructLiteral(s) => check_struct_literal(checker, s, span, in_unsafe),
        ast::Expr::EnumVariant(e) => check_enum_variant(checker, e, span, in_unsafe),
        ast::Expr::Send(s) => check_send(checker, s, in_unsafe),
    };
    checker.record_expr_type(expr as *const ast::Expr as usize, lowered.ty());
    lowered
}

fn type_mismatch(checker: &Checker, expected: &Type, found: &Type, span: Span) {
    checker
        .handler
        .build_error(span, format!("expected type `{:?}`, found `{:?}`", expected, found))
        .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
        .emit(checker.handler);
}

fn check_literal(lit: &ast::Literal) -> hir::Expr {
    let (lowered, ty) = match lit {
        ast::Literal::Int(v) => (hir::Literal::Int(*v), Type::Primitive(PrimitiveKind::Int)),
        ast::Literal::Float(v) => (hir::Literal::Float(*v), Type::Primitive(PrimitiveKind::Float)),
        ast::Literal::String(s) => (hir::Literal::String(*s), Type::Primitive(PrimitiveKind::String)),
        ast::Literal::Char(c) => (hir::Literal::Char(*c), Type::Primitive(PrimitiveKind::Int)),
        ast::Literal::Bool(b) => (hir::Literal::Bool(*b), Type::Primitive(PrimitiveKind::Bool)),
        ast::Literal::Unit => (hir::Literal::Unit, Type::Primitive(PrimitiveKind::Void)),
    };
    hir::Expr::Literal { lit: lowered, ty }
}

fn check_path(checker: &mut Checker, path: &ast::Path, span: Span) -> hir::Expr {
    let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern(""));
    if let Some(def_id) = checker.scope.resolve(name) {
        let ty = checker.ctx.type_of_def(def_id).cloned().unwrap_or(Type::Error);
        return hir::Expr::Var { def_id, ty };
    }
    if let Some((def_id, ty)) = checker.globals.values.get(name.as_str()) {
        return hir::Expr::Var { def_id: *def_id, ty: ty.clone() };
    }
    let candidates: Vec<&str> = checker.globals.values.keys().map(|s| s.as_str()).collect();
    let suggestion = faxc_util::find_closest(name.as_str(), candidates, 3);
    let mut builder = checker
        .handler
        .build_error(span, format!("undefined name `{}`", name))
        .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_VAR);
    if let Some(s) = suggestion {
        builder = builder.with_help(format!("did you mean `{}`?", s));
    }
    builder.emit(checker.handler);
    hir::Expr::Var { def_id: DefId::DUMMY, ty: Type::Error }
}

fn check_binary(checker: &mut Checker, b: &ast::BinaryExpr, in_unsafe: bool) -> hir::Expr {
    let left = check_expr(checker, &b.left, b.span, in_unsafe);
    let right = check_expr(checker, &b.right, b.span, in_unsafe);
    let lt = left.ty();
    let rt = right.ty();

    let ty = if is_primitive_op_ok(&lt, &rt, b.op, &checker.ctx) {
        result_type_of(b.op, &lt)
    } else if let Some(ty) = try_operator_overload(checker, intrinsic_for(b.op), &lt, &[rt.clone()], b.span) {
        ty
    } else {
        checker
            .handler
            .build_error(b.span, format!("operator `{:?}` is not defined for `{:?}` and `{:?}`", b.op, lt, rt))
            .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
            .emit(checker.handler);
        Type::Error
    };
    hir::Expr::Binary { op: lower_binop(b.op), left: Box::new(left), right: Box::new(right), ty }
}

fn is_primitive_op_ok(lt: &Type, rt: &Type, op: ast::BinOp, ctx: &TypeContext) -> bool {
    let lt = ctx.normalize(lt);
    let rt = ctx.normalize(rt);
    if matches!(lt, Type::Error) || matches!(rt, Type::Error) {
        return true;
    }
    match op {
        ast::BinOp::And | ast::BinOp::Or => {
            matches!(lt, Type::Primitive(PrimitiveKind::Bool)) && matches!(rt, Type::Primitive(PrimitiveKind::Bool))
        }
        ast::BinOp::Eq | ast::BinOp::Ne => lt == rt,
        ast::BinOp::Lt | ast::BinOp::Le | ast::BinOp::Gt | ast::BinOp::Ge => lt == rt && is_ordered_primitive(lt),
        ast::BinOp::Add | ast::BinOp::Sub | ast::BinOp::Mul | ast::BinOp::Div | ast::BinOp::Mod => lt == rt && is_numeric_primitive(lt),
        ast::BinOp::BitAnd | ast::BinOp::BitOr | ast::BinOp::BitXor | ast::BinOp::Shl | ast::BinOp::Shr => {
            lt == rt && is_integer_primitive(lt)
        }
    }
}

fn is_numeric_primitive(t: &Type) -> bool {
    matches!(t, Type::Primitive(k) if !matches!(k, PrimitiveKind::Bool | PrimitiveKind::String | PrimitiveKind::Null | PrimitiveKind::Void))
}
fn is_ordered_primitive(t: &Type) -> bool {
    matches!(t, Type::Primitive(k) if !matches!(k, PrimitiveKind::Bool | PrimitiveKind::Null | PrimitiveKind::Void))
}
fn is_integer_primitive(t: &Type) -> bool {
    matches!(
        t,
        Type::Primitive(
            PrimitiveKind::Int
                | PrimitiveKind::Int8
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
                | PrimitiveKind::U128
                | PrimitiveKind::USize
        )
    )
}

fn result_type_of(op: ast::BinOp, operand_ty: &Type) -> Type {
    match op {
        ast::BinOp::Eq
        | ast::BinOp::Ne
        | ast::BinOp::Lt
        | ast::BinOp::Le
        | ast::BinOp::Gt
        | ast::BinOp::Ge
        | ast::BinOp::And
        | ast::BinOp::Or => Type::Primitive(PrimitiveKind::Bool),
        _ => operand_ty.clone(),
    }
}

/// Looks up `method` on `recv_ty`'s method table and, if found, checks
/// `args` against its declared parameters the same way an ordinary
/// method call would.
fn try_operator_overload(checker: &mut Checker, method: &str, recv_ty: &Type, args: &[Type], span: Span) -> Option<Type> {
    if method.is_empty() {
        return None;
    }
    let type_name = crate::decl_type_name(&checker.ctx, recv_ty);
    let (_, sig) = checker.globals.methods.get(&type_name)?.get(method)?.clone();
    if sig.params.len() != args.len() {
        return None;
    }
    for (p, a) in sig.params.iter().zip(args.iter()) {
        if !is_assignable(a, p, &checker.ctx, &checker.env) {
            checker
                .handler
                .build_error(span, format!("argument of type `{:?}` does not match `{:?}` expected by `{}`", a, p, method))
                .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                .emit(checker.handler);
        }
    }
    Some(sig.ret)
}

fn lower_binop(op: ast::BinOp) -> hir::BinOp {
    match op {
        ast::BinOp::Add => hir::BinOp::Add,
        ast::BinOp::Sub => hir::BinOp::Sub,
        ast::BinOp::Mul => hir::BinOp::Mul,
        ast::BinOp::Div => hir::BinOp::Div,
        ast::BinOp::Mod => hir::BinOp::Mod,
        ast::BinOp::Eq => hir::BinOp::Eq,
        ast::BinOp::Ne => hir::BinOp::Ne,
        ast::BinOp::Lt => hir::BinOp::Lt,
        ast::BinOp::Gt => hir::BinOp::Gt,
        ast::BinOp::Le => hir::BinOp::Le,
        ast::BinOp::Ge => hir::BinOp::Ge,
        ast::BinOp::And => hir::BinOp::And,
        ast::BinOp::Or => hir::BinOp::Or,
        ast::BinOp::BitAnd => hir::BinOp::BitAnd,
        ast::BinOp::BitOr => hir::BinOp::BitOr,
        ast::BinOp::BitXor => hir::BinOp::BitXor,
        ast::BinOp::Shl => hir::BinOp::Shl,
        ast::BinOp::Shr => hir::BinOp::Shr,
    }
}

fn check_unary(checker: &mut Checker, u: &ast::UnaryExpr, in_unsafe: bool) -> hir::Expr {
    let operand = check_expr(checker, &u.expr, u.span, in_unsafe);
    let operand_ty = operand.ty();
    let ty = match u.op {
        ast::UnOp::Neg => {
            if is_numeric_primitive(checker.ctx.normalize(&operand_ty)) {
                operand_ty.clone()
            } else {
                invalid_unary(checker, "-", &operand_ty, u.span)
            }
        }
        ast::UnOp::Not => {
            if matches!(checker.ctx.normalize(&operand_ty), Type::Primitive(PrimitiveKind::Bool)) {
                operand_ty.clone()
            } else {
                invalid_unary(checker, "!", &operand_ty, u.span)
            }
        }
        ast::UnOp::BitNot => {
            if is_integer_primitive(checker.ctx.normalize(&operand_ty)) {
                operand_ty.clone()
            } else {
                invalid_unary(checker, "~", &operand_ty, u.span)
            }
        }
        ast::UnOp::Deref => match checker.ctx.normalize(&operand_ty) {
            Type::Ref(inner, _) | Type::Pointer(inner, _) => (**inner).clone(),
            _ => invalid_unary(checker, "*", &operand_ty, u.span),
        },
        ast::UnOp::Ref(mutable) => {
            if let ast::Expr::Path(path) = u.expr.as_ref() {
                let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern(""));
                if let Some(def_id) = checker.scope.resolve(name) {
                    let kind = if mutable { BorrowKind::Exclusive } else { BorrowKind::Shared };
                    if let Some(existing) = checker.scope.conflicting_borrow(def_id, kind) {
                        checker
                            .handler
                            .build_error(u.span, format!("cannot borrow `{}`: conflicts with an existing borrow", name))
                            .code(DiagnosticCode::E_SEMANTIC_BORROW_CONFLICT)
                            .with_secondary_span(existing.span, "existing borrow here")
                            .emit(checker.handler);
                    } else {
                        checker.scope.add_borrow(def_id, kind, u.span);
                    }
                }
            }
            Type::Ref(Box::new(operand_ty.clone()), mutable)
        }
        ast::UnOp::Receive => {
            if !in_unsafe {
                // Channel receive is a blocking operation outside of
                // `select`; checked for completeness but not gated
                // behind `unsafe` (concurrency, not memory safety).
            }
            match checker.ctx.normalize(&operand_ty) {
                Type::Channel(inner, dir) if !matches!(dir, ChannelDirection::SendOnly) => (**inner).clone(),
                _ => invalid_unary(checker, "<-", &operand_ty, u.span),
            }
        }
    };
    hir::Expr::Unary { op: lower_unop(u.op), expr: Box::new(operand), ty }
}

fn invalid_unary(checker: &Checker, op: &str, ty: &Type, span: Span) -> Type {
    checker
        .handler
        .build_error(span, format!("operator `{}` is not defined for `{:?}`", op, ty))
        .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
        .emit(checker.handler);
    Type::Error
}

fn lower_unop(op: ast::UnOp) -> hir::UnOp {
    match op {
        ast::UnOp::Neg => hir::UnOp::Neg,
        ast::UnOp::Not => hir::UnOp::Not,
        ast::UnOp::BitNot => hir::UnOp::BitNot,
        ast::UnOp::Deref => hir::UnOp::Deref,
        ast::UnOp::Ref(m) => hir::UnOp::Ref(m),
        ast::UnOp::Receive => hir::UnOp::Receive,
    }
}

/// Strips any number of `Ref`/`Pointer` layers, for auto-deref on field
/// access, method calls, and indexing.
fn auto_deref<'a>(ctx: &'a TypeContext, ty: &'a Type) -> &'a Type {
    match ctx.normalize(ty) {
        Type::Ref(inner, _) | Type::Pointer(inner, _) => auto_deref(ctx, inner),
        other => other,
    }
}

fn check_call(checker: &mut Checker, c: &ast::CallExpr, fallback: Span, in_unsafe: bool) -> hir::Expr {
    let func = check_expr(checker, &c.func, c.span, in_unsafe);
    let args: Vec<hir::Expr> = c.args.iter().map(|a| check_expr(checker, a, fallback, in_unsafe)).collect();
    let arg_tys: Vec<Type> = args.iter().map(|a| a.ty()).collect();

    let ft = match checker.ctx.normalize(&func.ty()) {
        Type::Function(ft) => Some((**ft).clone()),
        Type::Error => None,
        other => {
            checker
                .handler
                .build_error(c.span, format!("cannot call value of type `{:?}`", other))
                .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                .emit(checker.handler);
            None
        }
    };

    let Some(ft) = ft else {
        return hir::Expr::Call { func: Box::new(func), args, ty: Type::Error };
    };

    if ft.is_unsafe && !in_unsafe {
        checker
            .handler
            .build_error(c.span, "call to unsafe function requires an unsafe context")
            .code(DiagnosticCode::E_SEMANTIC_UNSAFE_REQUIRED)
            .emit(checker.handler);
    }

    if ft.params.len() != args.len() {
        checker
            .handler
            .build_error(c.span, format!("expected {} argument(s), found {}", ft.params.len(), args.len()))
            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
            .emit(checker.handler);
        return hir::Expr::Call { func: Box::new(func), args, ty: ft.ret };
    }

    let ret = if !ft.type_params.is_empty() {
        let (bindings, missing) = infer_call_args(&ft.type_params, &ft.params, &arg_tys, &checker.ctx);
        if !missing.is_empty() {
            checker
                .handler
                .build_error(c.span, "could not infer all type parameters for this call")
                .code(DiagnosticCode::E_SEMANTIC_INVALID_GENERIC_ARGS)
                .emit(checker.handler);
        }
        for (param_ty, arg_ty) in ft.params.iter().zip(arg_tys.iter()) {
            let expected = substitute_params(param_ty, &bindings);
            if !is_assignable(arg_ty, &expected, &checker.ctx, &checker.env) {
                type_mismatch(checker, &expected, arg_ty, c.span);
            }
        }
        substitute_params(&ft.ret, &bindings)
    } else {
        for (param_ty, arg_ty) in ft.params.iter().zip(arg_tys.iter()) {
            if !is_assignable(arg_ty, param_ty, &checker.ctx, &checker.env) {
                type_mismatch(checker, param_ty, arg_ty, c.span);
            }
        }
        ft.ret
    };

    hir::Expr::Call { func: Box::new(func), args, ty: ret }
}

fn check_method_call(checker: &mut Checker, m: &ast::MethodCallExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let receiver = check_expr(checker, &m.receiver, span, in_unsafe);
    let recv_ty = auto_deref(&checker.ctx, &receiver.ty()).clone();
    let args: Vec<hir::Expr> = m.call_args.iter().map(|a| check_expr(checker, a, span, in_unsafe)).collect();
    let arg_tys: Vec<Type> = args.iter().map(|a| a.ty()).collect();

    let type_name = crate::decl_type_name(&checker.ctx, &recv_ty);
    let Some((def_id, sig)) = checker.globals.methods.get(&type_name).and_then(|m2| m2.get(m.method.as_str())).cloned() else {
        let candidates: Vec<&str> = checker.globals.methods.get(&type_name).map(|m2| m2.keys().map(|s| s.as_str()).collect()).unwrap_or_default();
        let suggestion = faxc_util::find_closest(m.method.as_str(), candidates, 3);
        let mut builder = checker
            .handler
            .build_error(span, format!("no method `{}` found on type `{}`", m.method, type_name))
            .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_FN);
        if let Some(s) = suggestion {
            builder = builder.with_help(format!("did you mean `{}`?", s));
        }
        builder.emit(checker.handler);
        return hir::Expr::MethodCall { receiver: Box::new(receiver), method: DefId::DUMMY, args, ty: Type::Error };
    };

    if sig.is_unsafe && !in_unsafe {
        checker
            .handler
            .build_error(span, "call to unsafe method requires an unsafe context")
            .code(DiagnosticCode::E_SEMANTIC_UNSAFE_REQUIRED)
            .emit(checker.handler);
    }
    if let Some(recv) = &sig.receiver {
        if recv.mutable {
            if let ast::Expr::Path(path) = m.receiver.as_ref() {
                let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern(""));
                if let Some(def) = checker.scope.resolve(name) {
                    if checker.scope.conflicting_borrow(def, BorrowKind::Exclusive).is_some() {
                        checker
                            .handler
                            .build_error(span, format!("cannot call mutable method on `{}`: already borrowed", name))
                            .code(DiagnosticCode::E_SEMANTIC_BORROW_CONFLICT)
                            .emit(checker.handler);
                    }
                }
            }
        }
    }

    if sig.params.len() != args.len() {
        checker
            .handler
            .build_error(span, format!("expected {} argument(s), found {}", sig.params.len(), args.len()))
            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
            .emit(checker.handler);
        return hir::Expr::MethodCall { receiver: Box::new(receiver), method: def_id, args, ty: sig.ret };
    }

    let ret = if !sig.type_params.is_empty() {
        let (bindings, _missing) = infer_call_args(&sig.type_params, &sig.params, &arg_tys, &checker.ctx);
        for (p, a) in sig.params.iter().zip(arg_tys.iter()) {
            let expected = substitute_params(p, &bindings);
            if !is_assignable(a, &expected, &checker.ctx, &checker.env) {
                type_mismatch(checker, &expected, a, span);
            }
        }
        substitute_params(&sig.ret, &bindings)
    } else {
        for (p, a) in sig.params.iter().zip(arg_tys.iter()) {
            if !is_assignable(a, p, &checker.ctx, &checker.env) {
                type_mismatch(checker, p, a, span);
            }
        }
        sig.ret
    };

    hir::Expr::MethodCall { receiver: Box::new(receiver), method: def_id, args, ty: ret }
}

fn check_field(checker: &mut Checker, f: &ast::FieldExpr, in_unsafe: bool) -> hir::Expr {
    let object = check_expr(checker, &f.object, f.span, in_unsafe);
    let base_ty = auto_deref(&checker.ctx, &object.ty()).clone();

    let fields = match &base_ty {
        Type::Struct(id) => checker.ctx.structs.get(id).map(|d| d.fields.clone()),
        Type::GenericInstance(base, targs) => match checker.ctx.normalize(base) {
            Type::Struct(id) => checker.ctx.structs.get(id).cloned().map(|d| {
                let mut bindings = crate::infer::Bindings::new();
                for (p, a) in d.type_params.iter().zip(targs.iter()) {
                    bindings.insert(p.id, a.clone());
                }
                d.fields.iter().map(|fd| FieldDef { name: fd.name.clone(), ty: substitute_params(&fd.ty, &bindings) }).collect()
            }),
            _ => None,
        },
        _ => None,
    };

    let ty = match fields.and_then(|fs| fs.iter().find(|fd| fd.name == f.field.as_str()).map(|fd| fd.ty.clone())) {
        Some(ty) => ty,
        None => {
            if !matches!(base_ty, Type::Error) {
                checker
                    .handler
                    .build_error(f.span, format!("no field `{}` on type `{:?}`", f.field, base_ty))
                    .code(DiagnosticCode::E_SEMANTIC_UNKNOWN_FIELD)
                    .emit(checker.handler);
            }
            Type::Error
        }
    };
    hir::Expr::Field { object: Box::new(object), field: DefId::DUMMY, ty }
}

fn check_index(checker: &mut Checker, i: &ast::IndexExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let object = check_expr(checker, &i.object, span, in_unsafe);
    let index = check_expr(checker, &i.index, span, in_unsafe);
    let base_ty = auto_deref(&checker.ctx, &object.ty()).clone();

    let ty = match &base_ty {
        Type::Slice(t) | Type::Array(t, _) => (**t).clone(),
        Type::Map(k, v) => {
            if !is_assignable(&index.ty(), k, &checker.ctx, &checker.env) {
                type_mismatch(checker, k, &index.ty(), span);
            }
            (**v).clone()
        }
        other => {
            let type_name = crate::decl_type_name(&checker.ctx, other);
            match try_operator_overload(checker, "get", other, &[index.ty()], span) {
                Some(ty) => ty,
                None => {
                    if !matches!(other, Type::Error) {
                        checker
                            .handler
                            .build_error(span, format!("type `{}` cannot be indexed", type_name))
                            .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                            .emit(checker.handler);
                    }
                    Type::Error
                }
            }
        }
    };
    hir::Expr::Index { object: Box::new(object), index: Box::new(index), ty }
}

fn check_if(checker: &mut Checker, i: &ast::IfExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let cond = check_expr(checker, &i.cond, span, in_unsafe);
    if !matches!(checker.ctx.normalize(&cond.ty()), Type::Primitive(PrimitiveKind::Bool) | Type::Error) {
        type_mismatch(checker, &Type::Primitive(PrimitiveKind::Bool), &cond.ty(), span);
    }
    let then_expr = crate::stmt::check_block(checker, &i.then_block, in_unsafe);
    let else_expr = i.else_block.as_ref().map(|e| Box::new(check_expr(checker, e, span, in_unsafe)));

    let ty = match &else_expr {
        Some(e) => common_branch_type(checker, &then_expr.ty(), &e.ty(), span),
        None => Type::Primitive(PrimitiveKind::Void),
    };
    hir::Expr::If { cond: Box::new(cond), then_expr: Box::new(then_expr), else_expr, ty }
}

fn common_branch_type(checker: &Checker, a: &Type, b: &Type, span: Span) -> Type {
    if is_assignable(a, b, &checker.ctx, &checker.env) {
        b.clone()
    } else if is_assignable(b, a, &checker.ctx, &checker.env) {
        a.clone()
    } else {
        type_mismatch(checker, a, b, span);
        Type::Error
    }
}

fn check_match(checker: &mut Checker, m: &ast::MatchExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let scrutinee = check_expr(checker, &m.scrutinee, span, in_unsafe);
    let scrutinee_ty = scrutinee.ty();

    let arm_patterns: Vec<&ast::Pattern> = m.arms.iter().map(|a| &a.pattern).collect();
    crate::pattern::check_exhaustiveness(checker, &scrutinee_ty, &arm_patterns, span);

    let mut arms = Vec::new();
    let mut result_ty: Option<Type> = None;
    for arm in &m.arms {
        checker.scope.enter_scope(crate::scope::RibKind::Block);
        let pat = crate::pattern::check_pattern(checker, &arm.pattern, &scrutinee_ty, span);
        let guard = arm.guard.as_ref().map(|g| check_expr(checker, g, span, in_unsafe));
        let body = check_expr(checker, &arm.body, span, in_unsafe);
        checker.scope.exit_scope();
        result_ty = Some(match result_ty {
            Some(prev) => common_branch_type(checker, &prev, &body.ty(), span),
            None => body.ty(),
        });
        arms.push(hir::Arm { pat, guard, body });
    }

    hir::Expr::Match { scrutinee: Box::new(scrutinee), arms, ty: result_ty.unwrap_or(Type::Primitive(PrimitiveKind::Void)) }
}

fn check_closure(checker: &mut Checker, c: &ast::ClosureExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    checker.scope.enter_scope(crate::scope::RibKind::Function);
    let names = checker.type_names();
    let mut params = Vec::new();
    let mut param_tys = Vec::new();
    for p in &c.params {
        let ty = crate::resolve::resolve_type(&p.ty, &checker.ctx, &checker.env, &names, checker.handler, span);
        let def_id = checker.ids.next();
        checker.ctx.set_def_type(def_id, ty.clone());
        checker.scope.add_binding(p.name, def_id);
        params.push(hir::Pattern::Binding { def_id, name: p.name, ty: ty.clone(), mutability: p.mutable });
        param_tys.push(ty);
    }
    let body = check_expr(checker, &c.body, span, in_unsafe);
    checker.scope.exit_scope();
    let ret = body.ty();
    let ty = Type::Function(Box::new(FunctionType { is_unsafe: false, type_params: vec![], params: param_tys, ret, receiver: None }));
    hir::Expr::Closure { params, body: Box::new(body), ty }
}

fn check_assign(checker: &mut Checker, a: &ast::AssignExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    check_place_mutability(checker, &a.place, span);
    let place = check_expr(checker, &a.place, span, in_unsafe);
    let value = check_expr(checker, &a.value, span, in_unsafe);
    if !is_assignable(&value.ty(), &place.ty(), &checker.ctx, &checker.env) {
        checker
            .handler
            .build_error(span, format!("cannot assign `{:?}` to place of type `{:?}`", value.ty(), place.ty()))
            .code(DiagnosticCode::E_SEMANTIC_CANNOT_ASSIGN)
            .emit(checker.handler);
    }
    hir::Expr::Assign { place: Box::new(place), value: Box::new(value) }
}

fn check_compound_assign(checker: &mut Checker, a: &ast::CompoundAssignExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    check_place_mutability(checker, &a.place, span);
    let place = check_expr(checker, &a.place, span, in_unsafe);
    let value = check_expr(checker, &a.value, span, in_unsafe);
    if !is_primitive_op_ok(&place.ty(), &value.ty(), a.op, &checker.ctx) {
        checker
            .handler
            .build_error(span, format!("operator `{:?}=` is not defined for `{:?}` and `{:?}`", a.op, place.ty(), value.ty()))
            .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
            .emit(checker.handler);
    }
    hir::Expr::Assign { place: Box::new(place), value: Box::new(value) }
}

/// If `place` is a bare local, checks it was declared `mut`. Anything
/// else (a field, an index, a deref) is left to the field/index/deref
/// checks themselves, which already require an exclusive borrow path.
fn check_place_mutability(checker: &Checker, place: &ast::Expr, span: Span) {
    if let ast::Expr::Path(path) = place {
        let name = path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern(""));
        if let Some(def_id) = checker.scope.resolve(name) {
            if !checker.mutable_bindings.contains(&def_id) {
                checker
                    .handler
                    .build_error(span, format!("cannot assign to `{}`: not declared mutable", name))
                    .code(DiagnosticCode::E_SEMANTIC_MUT_REQUIRED)
                    .emit(checker.handler);
            }
        }
    }
}

fn check_range(checker: &mut Checker, r: &ast::RangeExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let start = r.start.as_ref().map(|e| Box::new(check_expr(checker, e, span, in_unsafe)));
    let end = r.end.as_ref().map(|e| Box::new(check_expr(checker, e, span, in_unsafe)));
    let elem_ty = start
        .as_ref()
        .map(|e| e.ty())
        .or_else(|| end.as_ref().map(|e| e.ty()))
        .unwrap_or(Type::Primitive(PrimitiveKind::Int));
    let ty = Type::Range(Box::new(elem_ty));
    hir::Expr::Range { start, end, inclusive: r.inclusive, ty }
}

fn check_struct_literal(checker: &mut Checker, s: &ast::StructLiteralExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let name = s.path.segments.last().map(|seg| seg.ident.as_str().to_string()).unwrap_or_default();
    let Some(Type::Struct(def_id)) = checker.globals.type_names.get(&name).cloned() else {
        checker
            .handler
            .build_error(span, format!("`{}` is not a struct", name))
            .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_IDENT)
            .emit(checker.handler);
        return hir::Expr::StructLiteral { def_id: DefId::DUMMY, fields: vec![], ty: Type::Error };
    };
    let Some(def) = checker.ctx.structs.get(&def_id).cloned() else {
        return hir::Expr::StructLiteral { def_id, fields: vec![], ty: Type::Struct(def_id) };
    };

    let mut checked_fields = Vec::new();
    let mut unify_pairs = Vec::new();
    for field in &s.fields {
        let decl_ty = def.fields.iter().find(|fd| fd.name == field.name.as_str()).map(|fd| fd.ty.clone());
        let value = check_expr(checker, &field.expr, span, in_unsafe);
        if let Some(decl_ty) = &decl_ty {
            unify_pairs.push((decl_ty.clone(), value.ty()));
        } else {
            checker
                .handler
                .build_error(span, format!("struct `{}` has no field `{}`", name, field.name))
                .code(DiagnosticCode::E_SEMANTIC_UNKNOWN_FIELD)
                .emit(checker.handler);
        }
        checked_fields.push((DefId::DUMMY, value));
    }

    for fd in &def.fields {
        if !s.fields.iter().any(|f| f.name.as_str() == fd.name) && s.base.is_none() {
            checker
                .handler
                .build_error(span, format!("missing field `{}` in struct literal for `{}`", fd.name, name))
                .code(DiagnosticCode::E_SEMANTIC_MISSING_FIELD)
                .emit(checker.handler);
        }
    }

    let ty = if !def.type_params.is_empty() {
        let param_ids: Vec<ParamId> = def.type_params.iter().map(|p| p.id).collect();
        let (bindings, _missing) = infer_struct_fields(&param_ids, &unify_pairs, &checker.ctx);
        for (decl_ty, value_ty) in &unify_pairs {
            let expected = substitute_params(decl_ty, &bindings);
            if !is_assignable(value_ty, &expected, &checker.ctx, &checker.env) {
                type_mismatch(checker, &expected, value_ty, span);
            }
        }
        let args: Vec<Type> = param_ids.iter().map(|p| bindings.get(p).cloned().unwrap_or(Type::Error)).collect();
        Type::GenericInstance(Box::new(Type::Struct(def_id)), args)
    } else {
        for (decl_ty, value_ty) in &unify_pairs {
            if !is_assignable(value_ty, decl_ty, &checker.ctx, &checker.env) {
                type_mismatch(checker, decl_ty, value_ty, span);
            }
        }
        Type::Struct(def_id)
    };

    hir::Expr::StructLiteral { def_id, fields: checked_fields, ty }
}

fn check_enum_variant(checker: &mut Checker, e: &ast::EnumVariantExpr, span: Span, in_unsafe: bool) -> hir::Expr {
    let enum_name = e.path.segments.last().map(|seg| seg.ident.as_str().to_string()).unwrap_or_default();
    let Some(Type::Enum(enum_id)) = checker.globals.type_names.get(&enum_name).cloned() else {
        checker
            .handler
            .build_error(span, format!("`{}` is not an enum", enum_name))
            .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_IDENT)
            .emit(checker.handler);
        return hir::Expr::EnumVariant { enum_id: DefId::DUMMY, variant_id: DefId::DUMMY, args: vec![], ty: Type::Error };
    };
    let Some(def) = checker.ctx.enums.get(&enum_id).cloned() else {
        return hir::Expr::EnumVariant { enum_id, variant_id: DefId::DUMMY, args: vec![], ty: Type::Enum(enum_id) };
    };
    let variant_name = e.variant.as_str();
    let Some(variant) = def.variants.iter().find(|v| v.name == variant_name).cloned() else {
        checker
            .handler
            .build_error(span, format!("enum `{}` has no variant `{}`", enum_name, variant_name))
            .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_IDENT)
            .emit(checker.handler);
        return hir::Expr::EnumVariant { enum_id, variant_id: DefId::DUMMY, args: vec![], ty: Type::Enum(enum_id) };
    };

    let arg_exprs: Vec<ast::Expr> = match &e.data {
        ast::EnumVariantData::Unit => vec![],
        ast::EnumVariantData::Tuple(args) => args.clone(),
        ast::EnumVariantData::Struct(fields) => fields.iter().map(|f| f.expr.clone()).collect(),
    };
    let args: Vec<hir::Expr> = arg_exprs.iter().map(|a| check_expr(checker, a, span, in_unsafe)).collect();

    if args.len() != variant.payload.len() {
        checker
            .handler
            .build_error(span, format!("variant `{}` expects {} field(s), found {}", variant_name, variant.payload.len(), args.len()))
            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
            .emit(checker.handler);
    }

    let ty = if !def.type_params.is_empty() {
        let param_ids: Vec<ParamId> = def.type_params.iter().map(|p| p.id).collect();
        let pairs: Vec<(Type, Type)> = variant.payload.iter().cloned().zip(args.iter().map(|a| a.ty())).collect();
        let (bindings, _missing) = infer_struct_fields(&param_ids, &pairs, &checker.ctx);
        for (decl_ty, value_ty) in &pairs {
            let expected = substitute_params(decl_ty, &bindings);
            if !is_assignable(value_ty, &expected, &checker.ctx, &checker.env) {
                type_mismatch(checker, &expected, value_ty, span);
            }
        }
        variant
            .gadt_return
            .as_ref()
            .map(|r| substitute_params(r, &bindings))
            .unwrap_or_else(|| Type::GenericInstance(Box::new(Type::Enum(enum_id)), param_ids.iter().map(|p| bindings.get(p).cloned().unwrap_or(Type::Error)).collect()))
    } else {
        for (decl_ty, value) in variant.payload.iter().zip(args.iter()) {
            if !is_assignable(&value.ty(), decl_ty, &checker.ctx, &checker.env) {
                type_mismatch(checker, decl_ty, &value.ty(), span);
            }
        }
        Type::Enum(enum_id)
    };

    hir::Expr::EnumVariant { enum_id, variant_id: DefId::DUMMY, args, ty }
}

fn check_send(checker: &mut Checker, s: &ast::SendExpr, in_unsafe: bool) -> hir::Expr {
    let channel = check_expr(checker, &s.channel, s.span, in_unsafe);
    let value = check_expr(checker, &s.value, s.span, in_unsafe);
    match checker.ctx.normalize(&channel.ty()) {
        Type::Channel(elem, dir) if !matches!(dir, ChannelDirection::ReceiveOnly) => {
            if !is_assignable(&value.ty(), elem, &checker.ctx, &checker.env) {
                type_mismatch(checker, elem, &value.ty(), s.span);
            }
        }
        Type::Error => {}
        other => {
            checker
                .handler
                .build_error(s.span, format!("cannot send on non-channel type `{:?}`", other))
                .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                .emit(checker.handler);
        }
    }
    hir::Expr::Send { channel: Box::new(channel), value: Box::new(value) }
}
