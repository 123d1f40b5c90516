//! Generics & inference (C6).
//!
//! First-order unification used at exactly two call sites: matching a
//! function call's arguments against parameter types expressed in
//! TypeParams, and matching a struct literal's field values against
//! parameterized field types. Both produce a binding from `ParamId` to
//! `Type`; callers re-check bounds against the inferred types afterward.

use crate::types::*;
use std::collections::HashMap;

/// A substitution from declared type parameters to the types inference
/// decided they stand for.
pub type Bindings = HashMap<ParamId, Type>;

/// Why unification failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    /// `T` occurs inside the type it would be bound to, e.g. `T = F[T]`.
    Occurs(ParamId, Type),
    /// Two concrete types disagree and neither side is a TypeParam.
    Mismatch(Type, Type),
}

/// Unifies `a` against `b`, extending `bindings` in place. TypeParams on
/// either side unify with any type, subject to an occurs check. Container
/// types unify elementwise; Array and Slice unify on their element type
/// regardless of length (the length isn't part of the parameter).
pub fn unify(a: &Type, b: &Type, ctx: &TypeContext, bindings: &mut Bindings) -> Result<(), UnifyError> {
    let a = normalize_param(a, bindings, ctx);
    let b = normalize_param(b, bindings, ctx);

    if let Type::Param(p) = &a {
        return bind(*p, b, bindings);
    }
    if let Type::Param(p) = &b {
        return bind(*p, a, bindings);
    }
    if a == b {
        return Ok(());
    }
    if matches!(a, Type::Error) || matches!(b, Type::Error) {
        return Ok(());
    }

    match (&a, &b) {
        (Type::Ref(t1, _), Type::Ref(t2, _)) => unify(t1, t2, ctx, bindings),
        (Type::Pointer(t1, _), Type::Pointer(t2, _)) => unify(t1, t2, ctx, bindings),
        (Type::Optional(t1), Type::Optional(t2)) => unify(t1, t2, ctx, bindings),
        (Type::Slice(t1), Type::Slice(t2))
        | (Type::Array(t1, _), Type::Array(t2, _))
        | (Type::Array(t1, _), Type::Slice(t2))
        | (Type::Slice(t1), Type::Array(t2, _)) => unify(t1, t2, ctx, bindings),
        (Type::Map(k1, v1), Type::Map(k2, v2)) => {
            unify(k1, k2, ctx, bindings)?;
            unify(v1, v2, ctx, bindings)
        }
        (Type::Channel(t1, d1), Type::Channel(t2, d2)) => {
            if d1 != d2 {
                return Err(UnifyError::Mismatch(a.clone(), b.clone()));
            }
            unify(t1, t2, ctx, bindings)
        }
        (Type::Tuple(t1), Type::Tuple(t2)) => {
            if t1.len() != t2.len() {
                return Err(UnifyError::Mismatch(a.clone(), b.clone()));
            }
            for (x, y) in t1.iter().zip(t2.iter()) {
                unify(x, y, ctx, bindings)?;
            }
            Ok(())
        }
        (Type::GenericInstance(b1, a1), Type::GenericInstance(b2, a2)) => {
            if !generic_base_eq(b1, b2, ctx) || a1.len() != a2.len() {
                return Err(UnifyError::Mismatch(a.clone(), b.clone()));
            }
            for (x, y) in a1.iter().zip(a2.iter()) {
                unify(x, y, ctx, bindings)?;
            }
            Ok(())
        }
        (Type::Function(f1), Type::Function(f2)) => {
            if f1.params.len() != f2.params.len() {
                return Err(UnifyError::Mismatch(a.clone(), b.clone()));
            }
            for (x, y) in f1.params.iter().zip(f2.params.iter()) {
                unify(x, y, ctx, bindings)?;
            }
            unify(&f1.ret, &f2.ret, ctx, bindings)
        }
        _ => Err(UnifyError::Mismatch(a.clone(), b.clone())),
    }
}

fn normalize_param(ty: &Type, bindings: &Bindings, ctx: &TypeContext) -> Type {
    let ty = ctx.normalize(ty);
    match ty {
        Type::Param(p) => match bindings.get(p) {
            Some(bound) => normalize_param(bound, bindings, ctx),
            None => ty.clone(),
        },
        _ => ty.clone(),
    }
}

fn bind(param: ParamId, ty: Type, bindings: &mut Bindings) -> Result<(), UnifyError> {
    if let Type::Param(p2) = &ty {
        if *p2 == param {
            return Ok(());
        }
    }
    if occurs(param, &ty, bindings) {
        return Err(UnifyError::Occurs(param, ty));
    }
    bindings.insert(param, ty);
    Ok(())
}

fn occurs(param: ParamId, ty: &Type, bindings: &Bindings) -> bool {
    match ty {
        Type::Param(p) => {
            *p == param
                || bindings
                    .get(p)
                    .map(|bound| occurs(param, bound, bindings))
                    .unwrap_or(false)
        }
        Type::Ref(t, _) | Type::Pointer(t, _) | Type::Optional(t) | Type::Slice(t)
        | Type::Array(t, _) | Type::Future(t) | Type::Range(t) => occurs(param, t, bindings),
        Type::Map(k, v) => occurs(param, k, bindings) || occurs(param, v, bindings),
        Type::Result(t, e) => occurs(param, t, bindings) || occurs(param, e, bindings),
        Type::Channel(t, _) => occurs(param, t, bindings),
        Type::Tuple(ts) => ts.iter().any(|t| occurs(param, t, bindings)),
        Type::GenericInstance(base, args) => {
            occurs(param, base, bindings) || args.iter().any(|a| occurs(param, a, bindings))
        }
        Type::Function(f) => {
            occurs(param, &f.ret, bindings) || f.params.iter().any(|p| occurs(param, p, bindings))
        }
        Type::ProjectedType(base, _) => occurs(param, base, bindings),
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

/// Replaces every `Type::Param` appearing in `ty` with its binding,
/// recursing through every composite variant. Renames a Function's own
/// type parameters out of the way first so substituting into a
/// polymorphic function body can never capture them.
pub fn substitute_params(ty: &Type, bindings: &Bindings) -> Type {
    match ty {
        Type::Param(p) => bindings.get(p).cloned().unwrap_or_else(|| ty.clone()),
        Type::Named(n) => Type::Named(NamedType {
            name: n.name.clone(),
            referent: n.referent.as_ref().map(|r| Box::new(substitute_params(r, bindings))),
        }),
        Type::Ref(t, m) => Type::Ref(Box::new(substitute_params(t, bindings)), *m),
        Type::Pointer(t, m) => Type::Pointer(Box::new(substitute_params(t, bindings)), *m),
        Type::Optional(t) => Type::Optional(Box::new(substitute_params(t, bindings))),
        Type::Slice(t) => Type::Slice(Box::new(substitute_params(t, bindings))),
        Type::Array(t, n) => Type::Array(Box::new(substitute_params(t, bindings)), *n),
        Type::Future(t) => Type::Future(Box::new(substitute_params(t, bindings))),
        Type::Range(t) => Type::Range(Box::new(substitute_params(t, bindings))),
        Type::Map(k, v) => Type::Map(Box::new(substitute_params(k, bindings)), Box::new(substitute_params(v, bindings))),
        Type::Result(t, e) => Type::Result(Box::new(substitute_params(t, bindings)), Box::new(substitute_params(e, bindings))),
        Type::Channel(t, d) => Type::Channel(Box::new(substitute_params(t, bindings)), *d),
        Type::Tuple(ts) => Type::Tuple(ts.iter().map(|t| substitute_params(t, bindings)).collect()),
        Type::GenericInstance(base, args) => Type::GenericInstance(
            Box::new(substitute_params(base, bindings)),
            args.iter().map(|a| substitute_params(a, bindings)).collect(),
        ),
        Type::ProjectedType(base, assoc) => {
            Type::ProjectedType(Box::new(substitute_params(base, bindings)), assoc.clone())
        }
        Type::Function(f) => {
            // Own type parameters shadow the incoming bindings: drop them
            // from the map used for this function's own signature so a
            // caller's substitution never reaches inside.
            let mut inner = bindings.clone();
            for p in &f.type_params {
                inner.remove(p);
            }
            Type::Function(Box::new(FunctionType {
                is_unsafe: f.is_unsafe,
                type_params: f.type_params.clone(),
                params: f.params.iter().map(|p| substitute_params(p, &inner)).collect(),
                ret: substitute_params(&f.ret, &inner),
                receiver: f.receiver.as_ref().map(|r| Receiver {
                    mutable: r.mutable,
                    ty: Box::new(substitute_params(&r.ty, &inner)),
                }),
            }))
        }
        Type::Existential(e) => Type::Existential(Box::new(Existential {
            bound_param: e.bound_param,
            bounds: e.bounds.iter().map(|b| substitute_params(b, bindings)).collect(),
            body: substitute_params(&e.body, bindings),
        })),
        Type::Forall(f) => Type::Forall(Box::new(Forall {
            params: f.params.clone(),
            body: substitute_params(&f.body, bindings),
        })),
        _ => ty.clone(),
    }
}

/// Infers bindings for `type_params` by unifying each declared parameter
/// type against the corresponding argument type. Returns the parameters
/// left with no resulting binding.
pub fn infer_call_args(
    type_params: &[ParamId],
    param_tys: &[Type],
    arg_tys: &[Type],
    ctx: &TypeContext,
) -> (Bindings, Vec<ParamId>) {
    let mut bindings = Bindings::new();
    for (p, a) in param_tys.iter().zip(arg_tys.iter()) {
        let _ = unify(p, a, ctx, &mut bindings);
    }
    let missing = type_params
        .iter()
        .copied()
        .filter(|p| !bindings.contains_key(p))
        .collect();
    (bindings, missing)
}

/// Infers bindings for a struct literal: unifies each present field's
/// parameterized declared type against the value expression's type.
pub fn infer_struct_fields(
    type_params: &[ParamId],
    fields: &[(Type, Type)],
    ctx: &TypeContext,
) -> (Bindings, Vec<ParamId>) {
    let mut bindings = Bindings::new();
    for (declared, value) in fields {
        let _ = unify(declared, value, ctx, &mut bindings);
    }
    let missing = type_params
        .iter()
        .copied()
        .filter(|p| !bindings.contains_key(p))
        .collect();
    (bindings, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_param_with_concrete_type() {
        let ctx = TypeContext::default();
        let mut bindings = Bindings::new();
        let p = ParamId(0);
        unify(&Type::Param(p), &Type::Primitive(PrimitiveKind::Int), &ctx, &mut bindings).unwrap();
        assert_eq!(bindings.get(&p), Some(&Type::Primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn occurs_check_rejects_self_referential_binding() {
        let ctx = TypeContext::default();
        let mut bindings = Bindings::new();
        let p = ParamId(0);
        let list_of_t = Type::GenericInstance(
            Box::new(Type::Named(NamedType::unresolved("List"))),
            vec![Type::Param(p)],
        );
        let result = unify(&Type::Param(p), &list_of_t, &ctx, &mut bindings);
        assert!(matches!(result, Err(UnifyError::Occurs(id, _)) if id == p));
    }

    #[test]
    fn array_and_slice_unify_ignoring_length() {
        let ctx = TypeContext::default();
        let mut bindings = Bindings::new();
        let arr = Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 10);
        let slice = Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert!(unify(&arr, &slice, &ctx, &mut bindings).is_ok());
    }

    #[test]
    fn mismatched_primitives_fail_unification() {
        let ctx = TypeContext::default();
        let mut bindings = Bindings::new();
        let result = unify(
            &Type::Primitive(PrimitiveKind::Int),
            &Type::Primitive(PrimitiveKind::Bool),
            &ctx,
            &mut bindings,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_bindings_are_reported() {
        let ctx = TypeContext::default();
        let p0 = ParamId(0);
        let p1 = ParamId(1);
        let (bindings, missing) = infer_call_args(
            &[p0, p1],
            &[Type::Param(p0)],
            &[Type::Primitive(PrimitiveKind::Int)],
            &ctx,
        );
        assert_eq!(bindings.get(&p0), Some(&Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(missing, vec![p1]);
    }

    #[test]
    fn substitute_params_rewrites_nested_containers() {
        let p = ParamId(0);
        let mut bindings = Bindings::new();
        bindings.insert(p, Type::Primitive(PrimitiveKind::Int));
        let ty = Type::Slice(Box::new(Type::Param(p)));
        assert_eq!(
            substitute_params(&ty, &bindings),
            Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int)))
        );
    }
}
