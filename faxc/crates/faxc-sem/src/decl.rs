//! Declaration collector (C5).
//!
//! Walks top-level items twice. The first pass inserts a placeholder
//! `DefId` and an empty `TypeContext` side-table entry for every
//! struct/enum/trait, so field and variant types can refer forward to
//! any other top-level type (including themselves) regardless of
//! declaration order. The second pass resolves field/variant/method
//! types for real and installs functions, constants, and impls.

use crate::env::Env;
use crate::resolve::{is_assignable, resolve_type, TypeNames};
use crate::scope::ScopeTree;
use crate::types::*;
use faxc_par::ast;
use faxc_util::{DefId, DefIdGenerator, DiagnosticCode, Handler, Span};
use std::collections::HashMap;

/// Global namespace tables built by declaration collection, consumed by
/// every later checking pass.
#[derive(Default)]
pub struct Globals {
    /// Type-level names: structs, enums, traits, type aliases.
    pub type_names: HashMap<String, Type>,
    /// Value-level names: free functions and constants, by DefId.
    pub values: HashMap<String, (DefId, Type)>,
    /// Method table: target type name -> method name -> (DefId, signature).
    pub methods: HashMap<String, HashMap<String, (DefId, FunctionType)>>,
}

struct FnHeader {
    item: ast::FnItem,
    def_id: DefId,
}

struct StructHeader {
    item: ast::StructItem,
    def_id: DefId,
}

struct EnumHeader {
    item: ast::EnumItem,
    def_id: DefId,
}

struct TraitHeader {
    item: ast::TraitItem,
    def_id: DefId,
}

/// Collects every top-level declaration in `items` into `ctx`/`env` and
/// returns the resulting global namespace. Scope bindings for functions
/// and constants are also installed into `scope`'s module rib.
pub fn collect(
    items: &[ast::Item],
    ctx: &mut TypeContext,
    env: &mut Env,
    scope: &mut ScopeTree,
    ids: &mut DefIdGenerator,
    handler: &Handler,
) -> Globals {
    let mut globals = Globals::default();

    let mut fns = Vec::new();
    let mut structs = Vec::new();
    let mut enums = Vec::new();
    let mut traits = Vec::new();
    let mut impls = Vec::new();
    let mut consts = Vec::new();
    let mut statics = Vec::new();

    // Phase 1: reserve a DefId and a stub placeholder for every
    // type-level name so forward/recursive references resolve.
    for item in items {
        match item {
            ast::Item::Struct(s) => {
                let def_id = ids.next();
                globals.type_names.insert(s.name.as_str().to_string(), Type::Struct(def_id));
                ctx.declare_struct(def_id, StructDef { name: s.name.as_str().to_string(), type_params: vec![], fields: vec![] });
                structs.push(StructHeader { item: s.clone(), def_id });
            }
            ast::Item::Enum(e) => {
                let def_id = ids.next();
                globals.type_names.insert(e.name.as_str().to_string(), Type::Enum(def_id));
                ctx.declare_enum(def_id, EnumDef { name: e.name.as_str().to_string(), type_params: vec![], variants: vec![] });
                enums.push(EnumHeader { item: e.clone(), def_id });
            }
            ast::Item::Trait(t) => {
                let def_id = ids.next();
                globals.type_names.insert(t.name.as_str().to_string(), Type::Trait(def_id));
                ctx.declare_trait(def_id, TraitDef { name: t.name.as_str().to_string(), type_params: vec![], methods: vec![], assoc_types: vec![] });
                traits.push(TraitHeader { item: t.clone(), def_id });
            }
            ast::Item::Fn(f) => {
                let def_id = ids.next();
                fns.push(FnHeader { item: f.clone(), def_id });
            }
            ast::Item::Impl(i) => impls.push(i.clone()),
            ast::Item::Const(c) => consts.push(c.clone()),
            ast::Item::Static(s) => statics.push(s.clone()),
            ast::Item::Use(_) => {
                // Module loading from the filesystem is out of scope;
                // `use` only needs to not be an error at this layer.
            }
        }
    }

    // Phase 2a: materialize each type's own generic parameters before
    // resolving anything that could mention them (bounds, fields,
    // variants, where-clauses all live in the same scope).
    for s in &structs {
        let params = declare_generics(&s.item.generics, ctx, env, &globals, ids, handler);
        if let Some(def) = ctx.structs.get_mut(&s.def_id) {
            def.type_params = params;
        }
    }
    for e in &enums {
        let params = declare_generics(&e.item.generics, ctx, env, &globals, ids, handler);
        if let Some(def) = ctx.enums.get_mut(&e.def_id) {
            def.type_params = params;
        }
    }
    for t in &traits {
        let params = declare_generics(&t.item.generics, ctx, env, &globals, ids, handler);
        if let Some(def) = ctx.traits.get_mut(&t.def_id) {
            def.type_params = params;
        }
    }

    // Phase 2b: resolve field/variant/method bodies now that every
    // top-level name and its own generics are visible.
    for s in &structs {
        resolve_struct_body(s, ctx, env, &globals, handler);
    }
    for e in &enums {
        resolve_enum_body(e, ctx, env, &globals, handler);
    }
    for t in &traits {
        resolve_trait_body(t, ctx, env, &globals, handler);
    }

    // Phase 2c: functions and constants become ordinary values.
    for f in &fns {
        let local = local_names_for(&f.item.generics, ctx, env, &globals, handler);
        let names = TypeNames { global: &globals.type_names, local: &local };
        let fn_ty = function_type(&f.item.params, f.item.ret_type.as_ref(), &f.item.generics, ctx, env, &names, handler, f.item.span, None);
        ctx.set_def_type(f.def_id, fn_ty.clone());
        globals.values.insert(f.item.name.as_str().to_string(), (f.def_id, fn_ty));
        scope.add_binding(f.item.name, f.def_id);
    }
    for c in &consts {
        let def_id = ids.next();
        let local = HashMap::new();
        let names = TypeNames { global: &globals.type_names, local: &local };
        let ty = resolve_type(&c.ty, ctx, env, &names, handler, c.span);
        ctx.set_def_type(def_id, ty.clone());
        globals.values.insert(c.name.as_str().to_string(), (def_id, ty));
        scope.add_binding(c.name, def_id);
    }
    for s in &statics {
        let def_id = ids.next();
        let local = HashMap::new();
        let names = TypeNames { global: &globals.type_names, local: &local };
        let ty = resolve_type(&s.ty, ctx, env, &names, handler, s.span);
        ctx.set_def_type(def_id, ty.clone());
        globals.values.insert(s.name.as_str().to_string(), (def_id, ty));
        scope.add_binding(s.name, def_id);
    }

    // Phase 3: impl blocks, after every trait and inherent type is
    // fully resolved so trait satisfaction and associated-type checks
    // have real signatures to compare against.
    for i in &impls {
        process_impl(i, ctx, env, &mut globals, ids, handler);
    }

    globals
}

/// Declares a fresh `ParamId` for each generic parameter and resolves
/// its bounds, which may reference the type's own other parameters
/// (`fn pair<A, B: Into<A>>`) but not outer names, since bounds are
/// resolved before any field/variant type that could supply those.
fn declare_generics(
    generics: &[ast::GenericParam],
    ctx: &mut TypeContext,
    env: &Env,
    globals: &Globals,
    ids: &mut DefIdGenerator,
    handler: &Handler,
) -> Vec<TypeParamDef> {
    let mut local: HashMap<String, Type> = HashMap::new();
    let mut defs = Vec::new();
    for g in generics {
        let param_id = ParamId(ids.next().0);
        local.insert(g.name.as_str().to_string(), Type::Param(param_id));
        defs.push((g, param_id));
    }
    let names = TypeNames { global: &globals.type_names, local: &local };
    let mut result = Vec::new();
    for (g, param_id) in defs {
        let bounds: Vec<Type> = g
            .bounds
            .iter()
            .map(|b| resolve_type(b, ctx, env, &names, handler, Span::DUMMY))
            .collect();
        let def = TypeParamDef { id: param_id, name: g.name.as_str().to_string(), bounds, kind: Kind::Star };
        ctx.declare_type_param(def.clone());
        result.push(def);
    }
    result
}

/// Rebuilds the local-name map for an already-declared generics list,
/// for use in passes after the type parameters were declared.
fn local_names_for(
    generics: &[ast::GenericParam],
    ctx: &TypeContext,
    _env: &Env,
    globals: &Globals,
    _handler: &Handler,
) -> HashMap<String, Type> {
    let mut local = HashMap::new();
    for g in generics {
        if let Some(def) = ctx.type_params.iter().flatten().find(|d| d.name == g.name.as_str()) {
            local.insert(g.name.as_str().to_string(), Type::Param(def.id));
        }
    }
    let _ = globals;
    local
}

fn resolve_struct_body(s: &StructHeader, ctx: &mut TypeContext, env: &Env, globals: &Globals, handler: &Handler) {
    let local = local_names_for(&s.item.generics, ctx, env, globals, handler);
    let names = TypeNames { global: &globals.type_names, local: &local };
    let fields: Vec<FieldDef> = s
        .item
        .fields
        .iter()
        .map(|f| FieldDef {
            name: f.name.as_str().to_string(),
            ty: resolve_type(&f.ty, ctx, env, &names, handler, s.item.span),
        })
        .collect();
    if let Some(def) = ctx.structs.get_mut(&s.def_id) {
        def.fields = fields;
    }
}

fn resolve_enum_body(e: &EnumHeader, ctx: &mut TypeContext, env: &Env, globals: &Globals, handler: &Handler) {
    let local = local_names_for(&e.item.generics, ctx, env, globals, handler);
    let names = TypeNames { global: &globals.type_names, local: &local };
    let own_type_params: Vec<ParamId> = ctx
        .enums
        .get(&e.def_id)
        .map(|d| d.type_params.iter().map(|p| p.id).collect())
        .unwrap_or_default();
    let variants: Vec<VariantDef> = e
        .item
        .variants
        .iter()
        .map(|v| {
            let payload = match &v.data {
                ast::VariantData::Unit => vec![],
                ast::VariantData::Tuple(tys) => tys.iter().map(|t| resolve_type(t, ctx, env, &names, handler, e.item.span)).collect(),
                ast::VariantData::Struct(fields) => {
                    fields.iter().map(|f| resolve_type(&f.ty, ctx, env, &names, handler, e.item.span)).collect()
                }
            };
            // No surface syntax distinguishes a GADT-refined variant
            // return from the ordinary instantiation; the refined form
            // is only reachable by a variant whose payload types fix
            // the enum's own parameters to something other than the
            // bare parameter list. Absent that syntax, every variant
            // constructs the enum applied to its own declared params.
            let gadt_return = if own_type_params.is_empty() {
                None
            } else {
                Some(Type::GenericInstance(
                    Box::new(Type::Enum(e.def_id)),
                    own_type_params.iter().map(|p| Type::Param(*p)).collect(),
                ))
            };
            VariantDef { name: v.name.as_str().to_string(), payload, gadt_return }
        })
        .collect();
    if let Some(def) = ctx.enums.get_mut(&e.def_id) {
        def.variants = variants;
    }
}

fn resolve_trait_body(t: &TraitHeader, ctx: &mut TypeContext, env: &Env, globals: &Globals, handler: &Handler) {
    let local = local_names_for(&t.item.generics, ctx, env, globals, handler);
    let names = TypeNames { global: &globals.type_names, local: &local };
    let mut methods = Vec::new();
    let mut assoc_types = Vec::new();
    for member in &t.item.items {
        match member {
            ast::TraitMember::Method(sig) => {
                let method_locals = local_names_for(&sig.generics, ctx, env, globals, handler);
                let mut combined = local.clone();
                combined.extend(method_locals);
                let method_names = TypeNames { global: &globals.type_names, local: &combined };
                let params = sig.params.iter().map(|p| resolve_type(&p.ty, ctx, env, &method_names, handler, Span::DUMMY)).collect();
                let ret = sig
                    .ret_type
                    .as_ref()
                    .map(|rt| resolve_type(rt, ctx, env, &method_names, handler, Span::DUMMY))
                    .unwrap_or(Type::Primitive(PrimitiveKind::Void));
                let type_params = sig
                    .generics
                    .iter()
                    .filter_map(|g| ctx.type_params.iter().flatten().find(|d| d.name == g.name.as_str()).cloned())
                    .collect();
                methods.push(MethodSig { name: sig.name.as_str().to_string(), type_params, params, ret });
            }
            ast::TraitMember::Type(name, bounds) => {
                let resolved: Vec<Type> = bounds.iter().map(|b| resolve_type(b, ctx, env, &names, handler, Span::DUMMY)).collect();
                assoc_types.push(AssocTypeDef { name: name.as_str().to_string(), bounds: resolved, trait_id: t.def_id });
            }
            ast::TraitMember::Const(name, ty, _) => {
                let resolved = resolve_type(ty, ctx, env, &names, handler, Span::DUMMY);
                methods.push(MethodSig { name: name.as_str().to_string(), type_params: vec![], params: vec![], ret: resolved });
            }
        }
    }
    if let Some(def) = ctx.traits.get_mut(&t.def_id) {
        def.methods = methods;
        def.assoc_types = assoc_types;
    }
}

/// Builds a `FunctionType` from an AST parameter list, return type, and
/// generics list, optionally attaching a receiver descriptor derived
/// from `self`/`&self`/`&mut self`.
fn function_type(
    params: &[ast::Param],
    ret_type: Option<&ast::Type>,
    generics: &[ast::GenericParam],
    ctx: &mut TypeContext,
    env: &Env,
    names: &TypeNames,
    handler: &Handler,
    span: Span,
    self_ty: Option<&Type>,
) -> Type {
    let mut receiver = None;
    let mut resolved_params = Vec::new();
    for p in params {
        if p.name.as_str() == "self" {
            if let Some(ty) = self_ty {
                receiver = Some(Receiver { mutable: p.mutable, ty: Box::new(ty.clone()) });
            }
            continue;
        }
        resolved_params.push(resolve_type(&p.ty, ctx, env, names, handler, span));
    }
    let ret = ret_type.map(|rt| resolve_type(rt, ctx, env, names, handler, span)).unwrap_or(Type::Primitive(PrimitiveKind::Void));
    let type_params = generics
        .iter()
        .filter_map(|g| ctx.type_params.iter().flatten().find(|d| d.name == g.name.as_str()).map(|d| d.id))
        .collect();
    Type::Function(Box::new(FunctionType { is_unsafe: false, type_params, params: resolved_params, ret, receiver }))
}

/// Processes an `impl` block: resolves `Self`, registers trait
/// satisfaction, checks associated-type and method coverage against
/// the trait's declared surface, and installs methods into the method
/// table.
fn process_impl(
    item: &ast::ImplItem,
    ctx: &mut TypeContext,
    env: &mut Env,
    globals: &mut Globals,
    ids: &mut DefIdGenerator,
    handler: &Handler,
) {
    let mut local: HashMap<String, Type> = HashMap::new();
    for g in &item.generics {
        let param_id = ParamId(ids.next().0);
        local.insert(g.name.as_str().to_string(), Type::Param(param_id));
        ctx.declare_type_param(TypeParamDef { id: param_id, name: g.name.as_str().to_string(), bounds: vec![], kind: Kind::Star });
    }
    let names = TypeNames { global: &globals.type_names, local: &local };
    let self_ty = resolve_type(&item.self_ty, ctx, env, &names, handler, Span::DUMMY);
    let self_name = type_display_name(&self_ty, ctx);

    let trait_ty = item.trait_ref.as_ref().map(|t| resolve_type(t, ctx, env, &names, handler, Span::DUMMY));
    let trait_def = trait_ty.as_ref().and_then(|t| match ctx.normalize(t) {
        Type::Trait(id) => ctx.traits.get(id).cloned(),
        _ => None,
    });

    if let (Some(trait_ty), Some(trait_def)) = (&trait_ty, &trait_def) {
        if let Type::Trait(trait_id) = ctx.normalize(trait_ty) {
            let mut provided: Vec<String> = Vec::new();
            let mut provided_types: Vec<String> = Vec::new();
            for member in &item.items {
                match member {
                    ast::ImplMember::Method(f) => provided.push(f.name.as_str().to_string()),
                    ast::ImplMember::Type(name, _) => provided_types.push(name.as_str().to_string()),
                    ast::ImplMember::Const(name, _, _) => provided.push(name.as_str().to_string()),
                }
            }
            for method in &trait_def.methods {
                if !provided.contains(&method.name) {
                    handler
                        .build_error(Span::DUMMY, format!("missing implementation of `{}` required by trait", method.name))
                        .code(DiagnosticCode::E_SEMANTIC_MISSING_FIELD)
                        .emit(handler);
                }
            }
            for assoc in &trait_def.assoc_types {
                if !provided_types.contains(&assoc.name) {
                    handler
                        .build_error(Span::DUMMY, format!("missing associated type `{}` required by trait", assoc.name))
                        .code(DiagnosticCode::E_SEMANTIC_MISSING_ASSOC_TYPE)
                        .emit(handler);
                }
            }
            for (name, _) in provided_types.iter().zip(std::iter::repeat(())) {
                if !trait_def.assoc_types.iter().any(|a| &a.name == name) {
                    handler
                        .build_error(Span::DUMMY, format!("trait has no associated type `{}`", name))
                        .code(DiagnosticCode::E_SEMANTIC_UNKNOWN_ASSOC_TYPE)
                        .emit(handler);
                }
            }
            let _ = trait_id;
            env.register_impl(&trait_def.name, &self_ty);
        }
    }

    let table = globals.methods.entry(self_name).or_default();
    for member in &item.items {
        if let ast::ImplMember::Method(f) = member {
            let def_id = ids.next();
            let mut method_local = local.clone();
            for g in &f.generics {
                let param_id = ParamId(ids.next().0);
                method_local.insert(g.name.as_str().to_string(), Type::Param(param_id));
                ctx.declare_type_param(TypeParamDef { id: param_id, name: g.name.as_str().to_string(), bounds: vec![], kind: Kind::Star });
            }
            let method_names = TypeNames { global: &globals.type_names, local: &method_local };
            let fn_ty = function_type(&f.params, f.ret_type.as_ref(), &f.generics, ctx, env, &method_names, handler, f.span, Some(&self_ty));
            ctx.set_def_type(def_id, fn_ty.clone());

            if let (Some(trait_def), Type::Function(ft)) = (&trait_def, &fn_ty) {
                if let Some(required) = trait_def.methods.iter().find(|m| m.name == f.name.as_str()) {
                    if !is_assignable(&ft.ret, &required.ret, ctx, env) {
                        handler
                            .build_error(f.span, format!("method `{}` returns `{:?}`, trait requires `{:?}`", f.name, ft.ret, required.ret))
                            .code(DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                            .emit(handler);
                    }
                }
            }

            if let Type::Function(ft) = fn_ty {
                table.insert(f.name.as_str().to_string(), (def_id, *ft));
            }
        }
    }
}

pub(crate) fn type_display_name(ty: &Type, ctx: &TypeContext) -> String {
    match ctx.normalize(ty) {
        Type::Struct(id) => ctx.structs.get(id).map(|d| d.name.clone()).unwrap_or_default(),
        Type::Enum(id) => ctx.enums.get(id).map(|d| d.name.clone()).unwrap_or_default(),
        Type::Named(n) => n.name.clone(),
        Type::Primitive(p) => format!("{:?}", p),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Symbol;

    fn span() -> Span {
        Span::DUMMY
    }

    fn path_ty(name: &str) -> ast::Type {
        ast::Type::Path(ast::Path { segments: vec![ast::PathSegment { ident: Symbol::intern(name), args: None }] })
    }

    #[test]
    fn collects_struct_with_self_referential_field_via_reference() {
        let item = ast::Item::Struct(ast::StructItem {
            name: Symbol::intern("Node"),
            generics: vec![],
            fields: vec![ast::Field {
                name: Symbol::intern("next"),
                ty: ast::Type::Reference(Box::new(path_ty("Node")), ast::Mutability::Immutable),
                visibility: ast::Visibility::Public,
            }],
            visibility: ast::Visibility::Public,
            span: span(),
            where_clause: None,
        });

        let mut ctx = TypeContext::default();
        let mut env = Env::new();
        let mut scope = ScopeTree::new();
        let mut ids = DefIdGenerator::new();
        let handler = Handler::new();
        let globals = collect(&[item], &mut ctx, &mut env, &mut scope, &mut ids, &handler);

        assert!(!handler.has_errors());
        let node_ty = globals.type_names.get("Node").expect("Node registered");
        match node_ty {
            Type::Struct(id) => {
                let def = ctx.structs.get(id).unwrap();
                assert_eq!(def.fields.len(), 1);
                assert!(matches!(def.fields[0].ty, Type::Ref(_, false)));
            }
            _ => panic!("expected struct type"),
        }
    }

    #[test]
    fn collects_function_signature_into_scope() {
        let item = ast::Item::Fn(ast::FnItem {
            name: Symbol::intern("identity"),
            generics: vec![],
            params: vec![ast::Param { name: Symbol::intern("x"), ty: path_ty("int"), mutable: false }],
            ret_type: Some(path_ty("int")),
            body: ast::Block { stmts: vec![], trailing: None, span: span() },
            visibility: ast::Visibility::Public,
            span: span(),
            async_kw: false,
            where_clause: None,
        });

        let mut ctx = TypeContext::default();
        let mut env = Env::new();
        let mut scope = ScopeTree::new();
        let mut ids = DefIdGenerator::new();
        let handler = Handler::new();
        let globals = collect(&[item], &mut ctx, &mut env, &mut scope, &mut ids, &handler);

        let (def_id, ty) = globals.values.get("identity").expect("function registered");
        assert_eq!(scope.resolve(Symbol::intern("identity")), Some(*def_id));
        match ty {
            Type::Function(f) => {
                assert_eq!(f.params, vec![Type::Primitive(PrimitiveKind::Int)]);
                assert_eq!(f.ret, Type::Primitive(PrimitiveKind::Int));
            }
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn enum_variants_carry_gadt_return_for_generic_enum() {
        let item = ast::Item::Enum(ast::EnumItem {
            name: Symbol::intern("Box"),
            generics: vec![ast::GenericParam { name: Symbol::intern("T"), bounds: vec![] }],
            variants: vec![ast::Variant { name: Symbol::intern("Wrap"), data: ast::VariantData::Tuple(vec![path_ty("T")]) }],
            visibility: ast::Visibility::Public,
            span: span(),
            where_clause: None,
        });

        let mut ctx = TypeContext::default();
        let mut env = Env::new();
        let mut scope = ScopeTree::new();
        let mut ids = DefIdGenerator::new();
        let handler = Handler::new();
        let globals = collect(&[item], &mut ctx, &mut env, &mut scope, &mut ids, &handler);

        let box_ty = globals.type_names.get("Box").unwrap();
        if let Type::Enum(id) = box_ty {
            let def = ctx.enums.get(id).unwrap();
            assert!(def.variants[0].gadt_return.is_some());
        } else {
            panic!("expected enum type");
        }
    }
}
