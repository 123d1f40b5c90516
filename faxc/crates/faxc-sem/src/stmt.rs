//! Statement checker (C7).
//!
//! Checks a function body's block-level constructs: `let`, `return`
//! (delegated to `expr::check_expr` since it's expression-shaped in
//! this grammar), `if`/`while`/`for` as statements, `spawn`/`select`,
//! and unreachable-code-after-terminator detection.

use crate::expr::check_expr;
use crate::hir;
use crate::resolve::is_assignable;
use crate::types::*;
use crate::Checker;
use faxc_par::ast;
use faxc_util::{DiagnosticCode, Span, Symbol};

/// Does this statement unconditionally transfer control away, making
/// anything lexically after it in the same block unreachable?
fn is_terminator(stmt: &ast::Stmt) -> bool {
    match stmt {
        ast::Stmt::Return(_) | ast::Stmt::Break(_) | ast::Stmt::Continue(_) => true,
        ast::Stmt::Expr(e) => is_panic_call(e),
        _ => false,
    }
}

/// Is this expression a call to the reserved `panic` intrinsic, i.e. a
/// bare single-segment path named `panic`? Such a call diverges, so it
/// terminates control flow the same as `return`/`break`/`continue`.
fn is_panic_call(expr: &ast::Expr) -> bool {
    let ast::Expr::Call(call) = expr else { return false };
    let ast::Expr::Path(path) = call.func.as_ref() else { return false };
    matches!(path.segments.as_slice(), [seg] if seg.ident.as_str() == "panic")
}

/// Best-effort span for a statement, used to point unreachable-code
/// diagnostics at the offending statement rather than the whole block.
/// Several statement kinds (`let`, `if`, `while`, `for`) don't carry an
/// own span field in this AST, so the nearest inner expression's span
/// stands in; `fallback` (the enclosing block's span) covers the rest.
fn stmt_span(stmt: &ast::Stmt, fallback: Span) -> Span {
    match stmt {
        ast::Stmt::Let(l) => l.init.as_ref().and_then(|e| e.span()).unwrap_or(fallback),
        ast::Stmt::Expr(e) => e.span().unwrap_or(fallback),
        ast::Stmt::Return(e) => e.as_ref().and_then(|e| e.span()).unwrap_or(fallback),
        ast::Stmt::If(s) => s.cond.span().unwrap_or(fallback),
        ast::Stmt::While(s) => s.cond.span().unwrap_or(fallback),
        ast::Stmt::For(s) => s.iter.span().unwrap_or(fallback),
        ast::Stmt::Spawn(s) => s.span,
        ast::Stmt::Select(s) => s.span,
        ast::Stmt::Break(_) | ast::Stmt::Continue(_) | ast::Stmt::Item(_) => fallback,
    }
}

/// Checks every statement in `block`, threading `in_unsafe` down, and
/// returns the lowered `hir::Expr::Block`. Only the first statement
/// after a terminator is reported; once flagged, the rest of the block
/// is still checked (so later errors aren't hidden) but silently.
pub fn check_block(checker: &mut Checker, block: &ast::Block, in_unsafe: bool) -> hir::Expr {
    checker.scope.enter_scope(crate::scope::RibKind::Block);

    let mut stmts = Vec::new();
    let mut reported_unreachable = false;
    for (i, stmt) in block.stmts.iter().enumerate() {
        if let Some(prev) = block.stmts.get(i.wrapping_sub(1)) {
            if i > 0 && is_terminator(prev) && !reported_unreachable {
                checker
                    .handler
                    .build_warning(stmt_span(stmt, block.span), "unreachable code after this point")
                    .code(DiagnosticCode::W_UNREACHABLE_CODE)
                    .emit(checker.handler);
                reported_unreachable = true;
            }
        }
        stmts.push(check_stmt(checker, stmt, block.span, in_unsafe));
    }

    let expr = block.trailing.as_ref().map(|e| Box::new(check_expr(checker, e, block.span, in_unsafe)));
    let ty = expr.as_ref().map(|e| e.ty()).unwrap_or(Type::Primitive(PrimitiveKind::Void));

    checker.scope.exit_scope();
    hir::Expr::Block { stmts, expr, ty }
}

fn check_stmt(checker: &mut Checker, stmt: &ast::Stmt, fallback_span: Span, in_unsafe: bool) -> hir::Stmt {
    match stmt {
        ast::Stmt::Let(l) => check_let(checker, l, fallback_span, in_unsafe),
        ast::Stmt::Expr(e) => hir::Stmt::Expr(check_expr(checker, e, fallback_span, in_unsafe)),
        ast::Stmt::Return(e) => {
            let inner = e.as_ref().map(|e| check_expr(checker, e, fallback_span, in_unsafe));
            check_return_type(checker, &inner, fallback_span);
            hir::Stmt::Expr(hir::Expr::Return(inner.map(Box::new)))
        }
        ast::Stmt::If(i) => hir::Stmt::Expr(check_if_stmt(checker, i, fallback_span, in_unsafe)),
        ast::Stmt::While(w) => hir::Stmt::Expr(check_while(checker, w, in_unsafe)),
        ast::Stmt::For(f) => hir::Stmt::Expr(check_for(checker, f, in_unsafe)),
        ast::Stmt::Break(label) => hir::Stmt::Expr(hir::Expr::Break(None, label.map(|s| checker.resolve_label(s)))),
        ast::Stmt::Continue(label) => hir::Stmt::Expr(hir::Expr::Continue(label.map(|s| checker.resolve_label(s)))),
        ast::Stmt::Item(_) => {
            // Nested item declarations (local fns/structs) would need
            // their own declaration pass; the grammar emits these rarely
            // and they're out of scope for this pass's module-level
            // collector, so they're skipped rather than silently
            // misdeclared.
            hir::Stmt::Expr(hir::Expr::Literal { lit: hir::Literal::Unit, ty: Type::Primitive(PrimitiveKind::Void) })
        }
        ast::Stmt::Spawn(s) => {
            let inner = check_expr(checker, &s.body, s.span, in_unsafe);
            hir::Stmt::Expr(hir::Expr::Async { ty: Type::Future(Box::new(inner.ty())), body: Box::new(inner) })
        }
        ast::Stmt::Select(s) => hir::Stmt::Expr(check_select(checker, s, in_unsafe)),
    }
}

fn check_let(checker: &mut Checker, l: &ast::LetStmt, span: Span, in_unsafe: bool) -> hir::Stmt {
    let init = l.init.as_ref().map(|e| check_expr(checker, e, span, in_unsafe));
    let declared_ty = l.ty.as_ref().map(|t| {
        let names = checker.type_names();
        crate::resolve::resolve_type(t, &checker.ctx, &checker.env, &names, checker.handler, span)
    });

    let ty = match (&declared_ty, &init) {
        (Some(declared), Some(init)) => {
            if !is_assignable(&init.ty(), declared, &checker.ctx, &checker.env) {
                checker
                    .handler
                    .build_error(span, format!("expected `{:?}`, found `{:?}`", declared, init.ty()))
                    .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                    .emit(checker.handler);
            }
            declared.clone()
        }
        (Some(declared), None) => declared.clone(),
        (None, Some(init)) => init.ty(),
        (None, None) => {
            checker
                .handler
                .build_error(span, "cannot infer type of `let` binding without an initializer or annotation")
                .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                .emit(checker.handler);
            Type::Error
        }
    };

    let pat = crate::pattern::check_pattern(checker, &l.pattern, &ty, span);
    if l.mutable {
        if let ast::Pattern::Ident(_, _) = &l.pattern {
            if let hir::Pattern::Binding { name, .. } = &pat {
                if let Some(def_id) = checker.scope.resolve(*name) {
                    checker.mutable_bindings.insert(def_id);
                }
            }
        }
    }
    hir::Stmt::Let { pat, ty, init }
}

fn check_return_type(checker: &Checker, value: &Option<hir::Expr>, span: Span) {
    let expected = checker.current_fn.as_ref().map(|f| f.return_ty.clone()).unwrap_or(Type::Primitive(PrimitiveKind::Void));
    let got = value.as_ref().map(|e| e.ty()).unwrap_or(Type::Primitive(PrimitiveKind::Void));
    if !is_assignable(&got, &expected, &checker.ctx, &checker.env) {
        checker
            .handler
            .build_error(span, format!("expected return type `{:?}`, found `{:?}`", expected, got))
            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
            .emit(checker.handler);
    }
}

fn check_bool_cond(checker: &Checker, cond_ty: &Type, span: Span) {
    if !matches!(checker.ctx.normalize(cond_ty), Type::Primitive(PrimitiveKind::Bool) | Type::Error) {
        checker
            .handler
            .build_error(span, format!("expected `bool` condition, found `{:?}`", cond_ty))
            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
            .emit(checker.handler);
    }
}

fn check_if_stmt(checker: &mut Checker, i: &ast::IfStmt, span: Span, in_unsafe: bool) -> hir::Expr {
    let cond = check_expr(checker, &i.cond, span, in_unsafe);
    check_bool_cond(checker, &cond.ty(), span);
    let then_expr = check_block(checker, &i.then_block, in_unsafe);
    let else_expr = i.else_clause.as_ref().map(|clause| match clause.as_ref() {
        ast::ElseClause::Block(b) => Box::new(check_block(checker, b, in_unsafe)),
        ast::ElseClause::If(nested) => Box::new(check_if_stmt(checker, nested, span, in_unsafe)),
    });
    hir::Expr::If { cond: Box::new(cond), then_expr: Box::new(then_expr), else_expr, ty: Type::Primitive(PrimitiveKind::Void) }
}

fn check_while(checker: &mut Checker, w: &ast::WhileStmt, in_unsafe: bool) -> hir::Expr {
    let cond = check_expr(checker, &w.cond, w.body.span, in_unsafe);
    check_bool_cond(checker, &cond.ty(), w.body.span);
    checker.scope.enter_scope(crate::scope::RibKind::Loop(w.label.map(|s| checker.bind_label(s))));
    let body = check_block(checker, &w.body, in_unsafe);
    checker.scope.exit_scope();
    hir::Expr::If { cond: Box::new(cond), then_expr: Box::new(body), else_expr: None, ty: Type::Primitive(PrimitiveKind::Void) }
}

/// Lowers `for pat in iter { body }` by requiring `iter`'s type to be a
/// slice/array/range and checking `body` with `pat` bound to its
/// element type. There's no dedicated `hir::Expr::For`, so this reuses
/// the same `If`-as-loop-shell representation `check_while` does,
/// keeping the pattern's binding scoped to the loop body.
fn check_for(checker: &mut Checker, f: &ast::ForStmt, in_unsafe: bool) -> hir::Expr {
    let iter = check_expr(checker, &f.iter, f.body.span, in_unsafe);
    let elem_ty = match checker.ctx.normalize(&iter.ty()) {
        Type::Slice(t) | Type::Array(t, _) => (**t).clone(),
        Type::Range(t) => (**t).clone(),
        Type::Error => Type::Error,
        other => {
            checker
                .handler
                .build_error(f.body.span, format!("type `{:?}` is not iterable", other))
                .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                .emit(checker.handler);
            Type::Error
        }
    };

    checker.scope.enter_scope(crate::scope::RibKind::Loop(f.label.map(|s| checker.bind_label(s))));
    let pat = crate::pattern::check_pattern(checker, &f.pattern, &elem_ty, f.body.span);
    let body = check_block(checker, &f.body, in_unsafe);
    checker.scope.exit_scope();

    let arm = hir::Arm { pat, guard: None, body };
    hir::Expr::Match { scrutinee: Box::new(iter), arms: vec![arm], ty: Type::Primitive(PrimitiveKind::Void) }
}

fn check_select(checker: &mut Checker, s: &ast::SelectStmt, in_unsafe: bool) -> hir::Expr {
    let mut arms = Vec::new();
    for arm in &s.arms {
        checker.scope.enter_scope(crate::scope::RibKind::Block);
        let (pat, guard_expr) = match &arm.kind {
            ast::SelectArmKind::Recv { pattern, channel } => {
                let channel = check_expr(checker, channel, s.span, in_unsafe);
                let elem_ty = match checker.ctx.normalize(&channel.ty()) {
                    Type::Channel(t, dir) if !matches!(dir, ChannelDirection::SendOnly) => (**t).clone(),
                    Type::Error => Type::Error,
                    other => {
                        checker
                            .handler
                            .build_error(s.span, format!("`select` receive case requires a channel, found `{:?}`", other))
                            .code(DiagnosticCode::E_SEMANTIC_INVALID_OPERATION)
                            .emit(checker.handler);
                        Type::Error
                    }
                };
                let pat = match pattern {
                    Some(p) => crate::pattern::check_pattern(checker, p, &elem_ty, s.span),
                    None => hir::Pattern::Wildcard,
                };
                (pat, Some(channel))
            }
            ast::SelectArmKind::Send { channel, value } => {
                let channel = check_expr(checker, channel, s.span, in_unsafe);
                let value = check_expr(checker, value, s.span, in_unsafe);
                if let Type::Channel(elem, dir) = checker.ctx.normalize(&channel.ty()) {
                    if !matches!(dir, ChannelDirection::ReceiveOnly) && !is_assignable(&value.ty(), elem, &checker.ctx, &checker.env) {
                        checker
                            .handler
                            .build_error(s.span, format!("expected `{:?}` sent on channel, found `{:?}`", elem, value.ty()))
                            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                            .emit(checker.handler);
                    }
                }
                (hir::Pattern::Wildcard, Some(channel))
            }
            ast::SelectArmKind::Default => (hir::Pattern::Wildcard, None),
        };
        let body = check_block(checker, &arm.body, in_unsafe);
        checker.scope.exit_scope();
        arms.push(hir::Arm { pat, guard: guard_expr, body });
    }
    let scrutinee = Box::new(hir::Expr::Literal { lit: hir::Literal::Unit, ty: Type::Primitive(PrimitiveKind::Void) });
    hir::Expr::Match { scrutinee, arms, ty: Type::Primitive(PrimitiveKind::Void) }
}
