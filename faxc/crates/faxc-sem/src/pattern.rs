//! Pattern matcher (C9).
//!
//! Checks a single pattern against an expected type, binding names into
//! the current scope and lowering to [`hir::Pattern`]. A separate pass
//! over a match's arms checks exhaustiveness: every variant of an enum
//! subject (or both `None`/`Some` of an optional subject, or both
//! booleans of a `bool` subject) must be covered, or a wildcard/binding
//! arm must catch the rest.

use crate::hir;
use crate::infer::{substitute_params, unify, Bindings};
use crate::resolve::is_assignable;
use crate::types::*;
use crate::Checker;
use faxc_par::ast;
use faxc_util::{DefId, DiagnosticCode, Span, Symbol};

/// Checks `pat` against `expected`, binding any names it introduces into
/// the checker's current scope, and returns the lowered pattern.
pub fn check_pattern(checker: &mut Checker, pat: &ast::Pattern, expected: &Type, span: Span) -> hir::Pattern {
    match pat {
        ast::Pattern::Wildcard => hir::Pattern::Wildcard,
        ast::Pattern::Ident(name, mutability) => {
            let def_id = checker.ids.next();
            checker.ctx.set_def_type(def_id, expected.clone());
            checker.scope.add_binding(*name, def_id);
            hir::Pattern::Binding {
                def_id,
                name: *name,
                ty: expected.clone(),
                mutability: matches!(mutability, ast::Mutability::Mutable),
            }
        }
        ast::Pattern::Literal(lit) => {
            let lit_ty = literal_type(lit);
            if !is_assignable(&lit_ty, expected, &checker.ctx, &checker.env) {
                checker
                    .handler
                    .build_error(span, format!("pattern of type `{:?}` cannot match scrutinee of type `{:?}`", lit_ty, expected))
                    .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
                    .emit(checker.handler);
            }
            hir::Pattern::Literal(lower_literal(lit))
        }
        ast::Pattern::Path(path) => check_path_pattern(checker, path, &[], expected, span),
        ast::Pattern::TupleStruct(path, elems) => {
            let elem_pats: Vec<&ast::Pattern> = elems.iter().collect();
            check_path_pattern(checker, path, &elem_pats, expected, span)
        }
        ast::Pattern::Struct(path, fields) => check_struct_pattern(checker, path, fields, expected, span),
        ast::Pattern::Tuple(pats) => {
            let elem_tys = match checker.ctx.normalize(expected) {
                Type::Tuple(tys) if tys.len() == pats.len() => tys.clone(),
                _ => {
                    checker
                        .handler
                        .build_error(span, format!("expected a {}-tuple pattern, scrutinee has type `{:?}`", pats.len(), expected))
                        .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
                        .emit(checker.handler);
                    vec![Type::Error; pats.len()]
                }
            };
            let lowered = pats.iter().zip(elem_tys.iter()).map(|(p, t)| check_pattern(checker, p, t, span)).collect();
            hir::Pattern::Tuple { pats: lowered }
        }
        ast::Pattern::Slice(pats) => {
            let elem_ty = match checker.ctx.normalize(expected) {
                Type::Slice(t) | Type::Array(t, _) => (**t).clone(),
                _ => {
                    checker
                        .handler
                        .build_error(span, format!("expected a slice/array pattern, scrutinee has type `{:?}`", expected))
                        .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
                        .emit(checker.handler);
                    Type::Error
                }
            };
            let lowered = pats.iter().map(|p| check_pattern(checker, p, &elem_ty, span)).collect();
            hir::Pattern::Tuple { pats: lowered }
        }
    }
}

fn literal_type(lit: &ast::Literal) -> Type {
    match lit {
        ast::Literal::Int(_) => Type::Primitive(PrimitiveKind::Int),
        ast::Literal::Float(_) => Type::Primitive(PrimitiveKind::Float),
        ast::Literal::String(_) => Type::Primitive(PrimitiveKind::String),
        ast::Literal::Char(_) => Type::Primitive(PrimitiveKind::Int),
        ast::Literal::Bool(_) => Type::Primitive(PrimitiveKind::Bool),
        ast::Literal::Unit => Type::Primitive(PrimitiveKind::Void),
    }
}

fn lower_literal(lit: &ast::Literal) -> hir::Literal {
    match lit {
        ast::Literal::Int(v) => hir::Literal::Int(*v),
        ast::Literal::Float(v) => hir::Literal::Float(*v),
        ast::Literal::String(s) => hir::Literal::String(*s),
        ast::Literal::Char(c) => hir::Literal::Char(*c),
        ast::Literal::Bool(b) => hir::Literal::Bool(*b),
        ast::Literal::Unit => hir::Literal::Unit,
    }
}

fn last_segment(path: &ast::Path) -> Symbol {
    path.segments.last().map(|s| s.ident).unwrap_or_else(|| Symbol::intern(""))
}

/// `None` has no sub-patterns and `Some(x)` has exactly one; both travel
/// through this same entry since `ast::Pattern::Path` and
/// `ast::Pattern::TupleStruct` only differ in whether parens were
/// written.
fn check_path_pattern(
    checker: &mut Checker,
    path: &ast::Path,
    sub_pats: &[&ast::Pattern],
    expected: &Type,
    span: Span,
) -> hir::Pattern {
    let name = last_segment(path).as_str().to_string();

    if let Type::Optional(inner) = checker.ctx.normalize(expected).clone() {
        if name == "None" {
            return hir::Pattern::Path { def_id: DefId::DUMMY };
        }
        if name == "Some" {
            if sub_pats.len() != 1 {
                checker
                    .handler
                    .build_error(span, "`Some` pattern takes exactly one argument")
                    .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
                    .emit(checker.handler);
                return hir::Pattern::Path { def_id: DefId::DUMMY };
            }
            let inner_pat = check_pattern(checker, sub_pats[0], &inner, span);
            return hir::Pattern::Tuple { pats: vec![inner_pat] };
        }
    }

    let (enum_id, type_args) = match checker.ctx.normalize(expected) {
        Type::Enum(id) => (*id, Vec::new()),
        Type::GenericInstance(base, args) => match checker.ctx.normalize(base) {
            Type::Enum(id) => (*id, args.clone()),
            _ => {
                emit_not_enum(checker, expected, span);
                return hir::Pattern::Wildcard;
            }
        },
        _ => {
            emit_not_enum(checker, expected, span);
            return hir::Pattern::Wildcard;
        }
    };

    let Some(enum_def) = checker.ctx.enums.get(&enum_id).cloned() else {
        return hir::Pattern::Wildcard;
    };
    let Some(variant) = enum_def.variants.iter().find(|v| v.name == name) else {
        checker
            .handler
            .build_error(span, format!("enum `{}` has no variant `{}`", enum_def.name, name))
            .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
            .emit(checker.handler);
        return hir::Pattern::Wildcard;
    };

    // GADT refinement: unify the variant's declared return instance
    // against the scrutinee's actual type arguments to recover what
    // each enum type parameter stands for in this arm, then substitute
    // that into the variant's payload types before checking
    // sub-patterns against them.
    let mut bindings: Bindings = Bindings::new();
    if let Some(gadt_ret) = &variant.gadt_return {
        if !type_args.is_empty() {
            let scrutinee_instance = Type::GenericInstance(Box::new(Type::Enum(enum_id)), type_args.clone());
            let _ = unify(gadt_ret, &scrutinee_instance, &checker.ctx, &mut bindings);
        }
    } else {
        for (param, arg) in enum_def.type_params.iter().zip(type_args.iter()) {
            bindings.insert(param.id, arg.clone());
        }
    }
    let payload: Vec<Type> = variant.payload.iter().map(|t| substitute_params(t, &bindings)).collect();

    if sub_pats.len() != payload.len() {
        checker
            .handler
            .build_error(span, format!("variant `{}` expects {} field(s), found {}", name, payload.len(), sub_pats.len()))
            .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
            .emit(checker.handler);
    }
    let lowered: Vec<hir::Pattern> = sub_pats
        .iter()
        .zip(payload.iter())
        .map(|(p, t)| check_pattern(checker, p, t, span))
        .collect();
    if lowered.is_empty() {
        hir::Pattern::Path { def_id: DefId::DUMMY }
    } else {
        hir::Pattern::Tuple { pats: lowered }
    }
}

fn check_struct_pattern(
    checker: &mut Checker,
    path: &ast::Path,
    fields: &[ast::FieldPattern],
    expected: &Type,
    span: Span,
) -> hir::Pattern {
    let name = last_segment(path).as_str().to_string();
    let normalized = checker.ctx.normalize(expected).clone();

    let struct_fields = match &normalized {
        Type::Struct(id) => checker.ctx.structs.get(id).map(|d| d.fields.clone()),
        Type::GenericInstance(base, _) => match checker.ctx.normalize(base) {
            Type::Struct(id) => checker.ctx.structs.get(id).map(|d| d.fields.clone()),
            _ => None,
        },
        _ => None,
    };

    let Some(struct_fields) = struct_fields else {
        // An enum variant's struct-form pattern, e.g. `Expr::Pair { a, b }`.
        // Variant payloads carry no field names, so the fields are
        // matched positionally in their written order.
        let sub_pats: Vec<&ast::Pattern> = fields.iter().map(|f| &f.pattern).collect();
        return check_path_pattern(checker, path, &sub_pats, expected, span);
    };

    let mut lowered = Vec::new();
    for fp in fields {
        let field_ty = struct_fields
            .iter()
            .find(|f| f.name == fp.field.as_str())
            .map(|f| f.ty.clone())
            .unwrap_or_else(|| {
                checker
                    .handler
                    .build_error(span, format!("struct `{}` has no field `{}`", name, fp.field))
                    .code(DiagnosticCode::E_SEMANTIC_UNKNOWN_FIELD)
                    .emit(checker.handler);
                Type::Error
            });
        let pat = check_pattern(checker, &fp.pattern, &field_ty, span);
        lowered.push(hir::FieldPattern { field: DefId::DUMMY, pat });
    }
    hir::Pattern::Struct { def_id: DefId::DUMMY, fields: lowered }
}

fn emit_not_enum(checker: &Checker, expected: &Type, span: Span) {
    checker
        .handler
        .build_error(span, format!("cannot match a variant pattern against non-enum type `{:?}`", expected))
        .code(DiagnosticCode::E_SEMANTIC_INVALID_PATTERN)
        .emit(checker.handler);
}

/// Checks that `patterns` (one per match arm, in order) cover every case
/// of `scrutinee_ty`. Emits a single non-exhaustive-match diagnostic if
/// not; a wildcard or bare binding pattern always counts as covering
/// every remaining case.
pub fn check_exhaustiveness(checker: &Checker, scrutinee_ty: &Type, patterns: &[&ast::Pattern], span: Span) {
    if patterns.iter().any(|p| matches!(p, ast::Pattern::Wildcard | ast::Pattern::Ident(_, _))) {
        return;
    }

    let normalized = checker.ctx.normalize(scrutinee_ty).clone();
    match normalized {
        Type::Optional(_) => {
            let covers_none = patterns.iter().any(|p| pattern_names(p).contains(&"None".to_string()));
            let covers_some = patterns.iter().any(|p| pattern_names(p).contains(&"Some".to_string()));
            if !(covers_none && covers_some) {
                report_non_exhaustive(checker, "missing `None` or `Some` arm", span);
            }
        }
        Type::Primitive(PrimitiveKind::Bool) => {
            let mut seen_true = false;
            let mut seen_false = false;
            for p in patterns {
                if let ast::Pattern::Literal(ast::Literal::Bool(b)) = p {
                    if *b {
                        seen_true = true;
                    } else {
                        seen_false = true;
                    }
                }
            }
            if !(seen_true && seen_false) {
                report_non_exhaustive(checker, "missing `true` or `false` arm", span);
            }
        }
        Type::Enum(_) | Type::GenericInstance(_, _) => {
            let id = match &normalized {
                Type::Enum(id) => Some(*id),
                Type::GenericInstance(base, _) => match checker.ctx.normalize(base) {
                    Type::Enum(id) => Some(*id),
                    _ => None,
                },
                _ => unreachable!(),
            };
            let Some(id) = id else { return };
            if let Some(def) = checker.ctx.enums.get(&id) {
                let covered: Vec<String> = patterns.iter().flat_map(pattern_names).collect();
                let missing: Vec<&str> =
                    def.variants.iter().filter(|v| !covered.contains(&v.name)).map(|v| v.name.as_str()).collect();
                if !missing.is_empty() {
                    report_non_exhaustive(checker, &format!("missing variant(s): {}", missing.join(", ")), span);
                }
            }
        }
        _ => {
            // Unbounded domains (int, string, ...) are only exhaustive
            // via a wildcard/binding arm, already handled above.
            report_non_exhaustive(checker, "match is not exhaustive", span);
        }
    }
}

fn pattern_names(pat: &ast::Pattern) -> Vec<String> {
    match pat {
        ast::Pattern::Path(p) => vec![last_segment(p).as_str().to_string()],
        ast::Pattern::TupleStruct(p, _) | ast::Pattern::Struct(p, _) => vec![last_segment(p).as_str().to_string()],
        _ => Vec::new(),
    }
}

fn report_non_exhaustive(checker: &Checker, detail: &str, span: Span) {
    checker
        .handler
        .build_error(span, format!("non-exhaustive match: {}", detail))
        .code(DiagnosticCode::E_SEMANTIC_NON_EXHAUSTIVE_MATCH)
        .emit(checker.handler);
}
