//! Type resolver (C4) and assignability (C8.4.4.1).
//!
//! Turns an AST type expression into a semantic [`Type`], and decides
//! whether one semantic type may flow into another.

use crate::env::Env;
use crate::types::*;
use faxc_par::ast;
use faxc_util::{find_closest, DiagnosticCode, Handler, Span};
use std::collections::HashMap;

/// Names visible while resolving a type expression: top-level
/// declarations (structs, enums, traits, aliases) plus whatever local
/// bindings are in scope (`Self`, a function's own type parameters).
pub struct TypeNames<'a> {
    pub global: &'a HashMap<String, Type>,
    pub local: &'a HashMap<String, Type>,
}

impl<'a> TypeNames<'a> {
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.local.get(name).or_else(|| self.global.get(name))
    }

    fn all_names(&self) -> Vec<&str> {
        self.global
            .keys()
            .chain(self.local.keys())
            .map(|s| s.as_str())
            .collect()
    }
}

fn primitive_kind(name: &str) -> Option<PrimitiveKind> {
    Some(match name {
        "int" => PrimitiveKind::Int,
        "int8" => PrimitiveKind::Int8,
        "int32" => PrimitiveKind::Int32,
        "int64" => PrimitiveKind::Int64,
        "u8" => PrimitiveKind::U8,
        "u16" => PrimitiveKind::U16,
        "u32" => PrimitiveKind::U32,
        "u64" => PrimitiveKind::U64,
        "u128" => PrimitiveKind::U128,
        "usize" => PrimitiveKind::USize,
        "float" => PrimitiveKind::Float,
        "bool" => PrimitiveKind::Bool,
        "string" => PrimitiveKind::String,
        "null" | "nil" => PrimitiveKind::Null,
        "void" => PrimitiveKind::Void,
        _ => return None,
    })
}

/// Resolves a single path segment name (no generic arguments) against
/// primitives, `any`, and declared names, emitting an unknown-type
/// diagnostic with a did-you-mean suggestion on failure.
fn resolve_name(name: &str, names: &TypeNames, handler: &Handler, span: Span) -> Type {
    if let Some(kind) = primitive_kind(name) {
        return Type::Primitive(kind);
    }
    if name == "any" {
        return Type::Named(NamedType::unresolved("any"));
    }
    if let Some(ty) = names.lookup(name) {
        return ty.clone();
    }
    let suggestion = find_closest(name, names.all_names(), 3);
    let mut builder = handler
        .build_error(span, format!("unknown type `{}`", name))
        .code(DiagnosticCode::E_SEMANTIC_UNDEFINED_IDENT);
    if let Some(s) = suggestion {
        builder = builder.with_help(format!("did you mean `{}`?", s));
    }
    builder.emit(handler);
    Type::Named(NamedType::unresolved(name))
}

/// Resolves an AST type expression into a semantic type.
pub fn resolve_type(
    ast_ty: &ast::Type,
    ctx: &TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
) -> Type {
    match ast_ty {
        ast::Type::Unit => Type::Primitive(PrimitiveKind::Void),
        ast::Type::Never => Type::Never,
        ast::Type::Inferred => Type::Error,
        ast::Type::Path(path) => resolve_path(path, ctx, env, names, handler, span),
        ast::Type::Generic(base, args) => resolve_generic(base, args, ctx, env, names, handler, span),
        ast::Type::Reference(inner, m) => Type::Ref(
            Box::new(resolve_type(inner, ctx, env, names, handler, span)),
            matches!(m, ast::Mutability::Mutable),
        ),
        ast::Type::Pointer(inner, m) => Type::Pointer(
            Box::new(resolve_type(inner, ctx, env, names, handler, span)),
            matches!(m, ast::Mutability::Mutable),
        ),
        ast::Type::Slice(inner) => Type::Slice(Box::new(resolve_type(inner, ctx, env, names, handler, span))),
        ast::Type::Array(inner, len) => {
            // The grammar already requires a literal length at parse
            // time, so there is no "non-literal length" case to reject
            // here; `len` only ever arrives as a resolved usize.
            Type::Array(Box::new(resolve_type(inner, ctx, env, names, handler, span)), *len)
        }
        ast::Type::Tuple(elems) => {
            Type::Tuple(elems.iter().map(|t| resolve_type(t, ctx, env, names, handler, span)).collect())
        }
        ast::Type::Fn(params, ret) => Type::Function(Box::new(FunctionType {
            is_unsafe: false,
            type_params: Vec::new(),
            params: params.iter().map(|t| resolve_type(t, ctx, env, names, handler, span)).collect(),
            ret: resolve_type(ret, ctx, env, names, handler, span),
            receiver: None,
        })),
        ast::Type::TraitObject(bounds) | ast::Type::ImplTrait(bounds) => {
            resolve_existential(bounds, ctx, env, names, handler, span)
        }
    }
}

fn resolve_existential(
    bounds: &[ast::Type],
    ctx: &TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
) -> Type {
    let resolved_bounds: Vec<Type> = bounds
        .iter()
        .map(|b| {
            let bound = resolve_type(b, ctx, env, names, handler, span);
            if !is_trait_like(&bound, ctx) {
                handler
                    .build_error(span, "bound in `dyn`/`impl` position must be a trait")
                    .code(DiagnosticCode::E_SEMANTIC_INVALID_GENERIC_ARGS)
                    .emit(handler);
            }
            bound
        })
        .collect();
    let param = ParamId(u32::MAX);
    Type::Existential(Box::new(Existential {
        bound_param: param,
        bounds: resolved_bounds,
        body: Type::Param(param),
    }))
}

fn is_trait_like(ty: &Type, ctx: &TypeContext) -> bool {
    match ty {
        Type::Trait(_) => true,
        Type::Named(NamedType { referent: Some(r), .. }) => is_trait_like(r, ctx),
        Type::Named(n) => ctx.traits.values().any(|t| t.name == n.name),
        _ => false,
    }
}

fn resolve_path(
    path: &ast::Path,
    ctx: &TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
) -> Type {
    let seg = match path.segments.last() {
        Some(s) => s,
        None => return Type::Error,
    };
    let name = seg.ident.as_str();
    if let Some(args) = &seg.args {
        return resolve_args(name, args, ctx, env, names, handler, span);
    }
    resolve_name(name, names, handler, span)
}

fn resolve_generic(
    base: &ast::Type,
    args: &[ast::Type],
    ctx: &TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
) -> Type {
    if let ast::Type::Path(path) = base {
        if let Some(seg) = path.segments.last() {
            return resolve_args(seg.ident.as_str(), args, ctx, env, names, handler, span);
        }
    }
    let base_ty = resolve_type(base, ctx, env, names, handler, span);
    let arg_tys: Vec<Type> = args.iter().map(|a| resolve_type(a, ctx, env, names, handler, span)).collect();
    Type::GenericInstance(Box::new(base_ty), arg_tys)
}

fn resolve_args(
    name: &str,
    args: &[ast::Type],
    ctx: &TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
) -> Type {
    if name == "map" {
        if args.len() != 2 {
            handler
                .build_error(span, "`map` requires exactly two type arguments")
                .code(DiagnosticCode::E_SEMANTIC_INVALID_GENERIC_ARGS)
                .emit(handler);
            return Type::Error;
        }
        let k = resolve_type(&args[0], ctx, env, names, handler, span);
        let v = resolve_type(&args[1], ctx, env, names, handler, span);
        return Type::Map(Box::new(k), Box::new(v));
    }

    let base = resolve_name(name, names, handler, span);
    let arg_tys: Vec<Type> = args.iter().map(|a| resolve_type(a, ctx, env, names, handler, span)).collect();

    check_generic_arity(&base, &arg_tys, ctx, handler, span);
    check_generic_bounds(&arg_tys, &base, ctx, env, handler, span);

    Type::GenericInstance(Box::new(base), arg_tys)
}

fn declared_type_params<'a>(base: &Type, ctx: &'a TypeContext) -> Option<&'a [TypeParamDef]> {
    match base {
        Type::Struct(id) => ctx.structs.get(id).map(|d| d.type_params.as_slice()),
        Type::Enum(id) => ctx.enums.get(id).map(|d| d.type_params.as_slice()),
        Type::Trait(id) => ctx.traits.get(id).map(|d| d.type_params.as_slice()),
        Type::Named(NamedType { referent: Some(r), .. }) => declared_type_params(r, ctx),
        _ => None,
    }
}

fn check_generic_arity(base: &Type, args: &[Type], ctx: &TypeContext, handler: &Handler, span: Span) {
    if let Some(params) = declared_type_params(base, ctx) {
        if params.len() != args.len() {
            handler
                .build_error(
                    span,
                    format!("expected {} type argument(s), found {}", params.len(), args.len()),
                )
                .code(DiagnosticCode::E_SEMANTIC_INVALID_GENERIC_ARGS)
                .emit(handler);
        }
    }
}

fn check_generic_bounds(args: &[Type], base: &Type, ctx: &TypeContext, env: &Env, handler: &Handler, span: Span) {
    let params = match declared_type_params(base, ctx) {
        Some(p) => p,
        None => return,
    };
    for (arg, param) in args.iter().zip(params.iter()) {
        for bound in &param.bounds {
            let trait_name = trait_name_of(bound, ctx);
            let satisfied = trait_name.as_deref().map(|n| env.satisfies(arg, n)).unwrap_or(true);
            if !satisfied {
                handler
                    .build_error(
                        span,
                        format!("type `{:?}` does not satisfy bound `{}`", arg, trait_name.unwrap_or_default()),
                    )
                    .code(DiagnosticCode::E_SEMANTIC_CONSTRAINT_NOT_SATISFIED)
                    .proof_step(format!("type parameter `{}` declared here", param.name), span)
                    .proof_step("bound declared here", span)
                    .emit(handler);
            }
        }
    }
}

fn trait_name_of(ty: &Type, ctx: &TypeContext) -> Option<String> {
    match ty {
        Type::Trait(id) => ctx.traits.get(id).map(|t| t.name.clone()),
        Type::Named(NamedType { referent: Some(r), .. }) => trait_name_of(r, ctx),
        Type::Named(n) => Some(n.name.clone()),
        _ => None,
    }
}

/// Assignability (C8.4.4.1): is a value of type `src` assignable where
/// `dst` is expected? Asymmetric: `is_assignable(a, b)` does not imply
/// `is_assignable(b, a)`.
pub fn is_assignable(src: &Type, dst: &Type, ctx: &TypeContext, env: &Env) -> bool {
    let src = ctx.normalize(src);
    let dst = ctx.normalize(dst);

    if let Type::Named(n) = dst {
        if n.is_wildcard() {
            return true;
        }
    }
    if let Type::Named(n) = src {
        if n.is_wildcard() {
            return true;
        }
    }
    if src == dst {
        return true;
    }
    if matches!(src, Type::Error) || matches!(dst, Type::Error) {
        return true;
    }
    if matches!(src, Type::Never) {
        return true;
    }

    match (src, dst) {
        (Type::Primitive(PrimitiveKind::Null), Type::Optional(_)) => true,
        (Type::Primitive(PrimitiveKind::Null), Type::Pointer(_, _)) => true,
        (s, Type::Optional(inner)) => is_assignable(s, inner, ctx, env),
        (Type::Array(e1, _), Type::Slice(e2)) => is_assignable(e1, e2, ctx, env),
        (Type::Slice(e1), Type::Slice(e2)) => is_assignable(e1, e2, ctx, env),
        (Type::Array(e1, n1), Type::Array(e2, n2)) => n1 == n2 && is_assignable(e1, e2, ctx, env),
        (Type::Map(k1, v1), Type::Map(k2, v2)) => {
            is_assignable(k1, k2, ctx, env) && is_assignable(v1, v2, ctx, env)
        }
        (Type::Channel(e1, d1), Type::Channel(e2, d2)) => {
            d1.assignable_to(*d2) && is_assignable(e1, e2, ctx, env)
        }
        (Type::Tuple(t1), Type::Tuple(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2.iter()).all(|(a, b)| is_assignable(a, b, ctx, env))
        }
        (Type::Function(f1), Type::Function(f2)) => {
            f1.params.len() == f2.params.len()
                && is_assignable(&f1.ret, &f2.ret, ctx, env)
                && f1.params.iter().zip(f2.params.iter()).all(|(a, b)| is_assignable(b, a, ctx, env))
        }
        (Type::GenericInstance(b1, a1), Type::GenericInstance(b2, a2)) => {
            generic_base_eq(b1, b2, ctx)
                && a1.len() == a2.len()
                && a1.iter().zip(a2.iter()).all(|(x, y)| is_assignable(x, y, ctx, env))
        }
        // Existential packing: the source satisfies every trait bound
        // the destination existential carries.
        (s, Type::Existential(e)) => e
            .bounds
            .iter()
            .all(|b| trait_name_of(b, ctx).map(|n| env.satisfies(s, &n)).unwrap_or(true)),
        (Type::Param(p1), Type::Param(p2)) => p1 == p2,
        (Type::Ref(t1, m1), Type::Ref(t2, m2)) => (*m1 || !*m2) && is_assignable(t1, t2, ctx, env),
        (Type::Pointer(t1, m1), Type::Pointer(t2, m2)) => (*m1 || !*m2) && is_assignable(t1, t2, ctx, env),
        _ => false,
    }
}

fn generic_base_eq(b1: &Type, b2: &Type, ctx: &TypeContext) -> bool {
    let b1 = ctx.normalize(b1);
    let b2 = ctx.normalize(b2);
    match (b1, b2) {
        (Type::Struct(d1), Type::Struct(d2)) => d1 == d2,
        (Type::Enum(d1), Type::Enum(d2)) => d1 == d2,
        (Type::Named(n1), Type::Named(n2)) => n1.name == n2.name,
        _ => b1 == b2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Span;

    fn empty_names() -> (HashMap<String, Type>, HashMap<String, Type>) {
        (HashMap::new(), HashMap::new())
    }

    #[test]
    fn resolves_primitive_names() {
        let ctx = TypeContext::default();
        let env = Env::new();
        let handler = Handler::new();
        let (g, l) = empty_names();
        let names = TypeNames { global: &g, local: &l };
        let ty = resolve_type(&ast::Type::Path(ast::Path {
            segments: vec![ast::PathSegment { ident: faxc_util::Symbol::intern("int"), args: None }],
        }), &ctx, &env, &names, &handler, Span::DUMMY);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::Int));
        assert!(!handler.has_errors());
    }

    #[test]
    fn unknown_name_suggests_closest_match() {
        let ctx = TypeContext::default();
        let env = Env::new();
        let handler = Handler::new();
        let mut g = HashMap::new();
        g.insert("Point".to_string(), Type::Struct(faxc_util::DefId(1)));
        let l = HashMap::new();
        let names = TypeNames { global: &g, local: &l };
        let _ = resolve_type(&ast::Type::Path(ast::Path {
            segments: vec![ast::PathSegment { ident: faxc_util::Symbol::intern("Pont"), args: None }],
        }), &ctx, &env, &names, &handler, Span::DUMMY);
        let diags = handler.diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].helps[0].contains("Point"));
    }

    #[test]
    fn map_requires_two_args() {
        let ctx = TypeContext::default();
        let env = Env::new();
        let handler = Handler::new();
        let (g, l) = empty_names();
        let names = TypeNames { global: &g, local: &l };
        let int_path =
            ast::Type::Path(ast::Path { segments: vec![ast::PathSegment { ident: faxc_util::Symbol::intern("int"), args: None }] });
        let ty = resolve_args("map", &[int_path], &ctx, &env, &names, &handler, Span::DUMMY);
        assert_eq!(ty, Type::Error);
        assert!(handler.has_errors());
    }

    #[test]
    fn null_assignable_to_optional() {
        let ctx = TypeContext::default();
        let env = Env::new();
        assert!(is_assignable(
            &Type::Primitive(PrimitiveKind::Null),
            &Type::Optional(Box::new(Type::Primitive(PrimitiveKind::Int))),
            &ctx,
            &env,
        ));
    }

    #[test]
    fn array_assignable_to_slice_but_not_reverse() {
        let ctx = TypeContext::default();
        let env = Env::new();
        let arr = Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 3);
        let slice = Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert!(is_assignable(&arr, &slice, &ctx, &env));
        assert!(!is_assignable(&slice, &arr, &ctx, &env));
    }

    #[test]
    fn channel_narrows_bidi_to_unidirectional_only() {
        let ctx = TypeContext::default();
        let env = Env::new();
        let bidi = Type::Channel(Box::new(Type::Primitive(PrimitiveKind::Int)), ChannelDirection::Bidirectional);
        let send = Type::Channel(Box::new(Type::Primitive(PrimitiveKind::Int)), ChannelDirection::SendOnly);
        assert!(is_assignable(&bidi, &send, &ctx, &env));
        assert!(!is_assignable(&send, &bidi, &ctx, &env));
    }
}
