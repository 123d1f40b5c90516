//! faxc-sem - semantic analysis core.
//!
//! Owns the type checker (C1-C10): a nominal/structural type model with
//! a side-table arena for recursive struct/enum/trait bodies, a scope
//! tree with lexical borrow tracking, a two-phase declaration collector,
//! first-order unification for generics, and checkers for statements,
//! expressions, and patterns. Surface syntax, tokenization, codegen,
//! and filesystem module loading live in other crates; this crate
//! consumes an already-parsed `faxc_par::ast` tree and produces typed
//! [`hir`] plus a stream of diagnostics.

pub mod decl;
pub mod env;
pub mod expr;
pub mod hir;
pub mod infer;
pub mod pattern;
pub mod resolve;
pub mod scope;
pub mod stmt;
pub mod types;

use env::Env;
use faxc_par::ast;
use faxc_util::{DefId, DefIdGenerator, Handler, Symbol};
use rustc_hash::FxHashMap;
use scope::ScopeTree;
use types::{FunctionType, Type, TypeContext};

/// The function (or closure) currently being checked, used to validate
/// `return` expressions against the declared return type.
struct FnFrame {
    #[allow(dead_code)]
    name: Symbol,
    return_ty: Type,
}

/// Top-level driver for semantic analysis. Holds every piece of state
/// a single module's worth of checking needs: the type arena, the
/// trait-impl environment, the lexical scope/borrow tree, a diagnostic
/// sink, and the DefId/label counters.
pub struct Checker<'a> {
    pub ctx: TypeContext,
    pub env: Env,
    pub scope: ScopeTree,
    pub handler: &'a Handler,
    pub ids: DefIdGenerator,
    pub globals: decl::Globals,
    /// Inferred type of every checked expression, keyed by the AST
    /// node's address. A side table rather than a field on `ast::Expr`
    /// itself, since the AST is produced by a crate this one doesn't own.
    expr_types: FxHashMap<usize, Type>,
    /// Local generic-parameter name map for whatever function body is
    /// currently being checked, so nested `as`-casts and closures can
    /// still resolve `T` the way the declaration pass did.
    current_locals: FxHashMap<String, Type>,
    current_fn: Option<FnFrame>,
    mutable_bindings: rustc_hash::FxHashSet<DefId>,
    labels: Vec<(Symbol, hir::LabelId)>,
    next_label: u32,
}

impl<'a> Checker<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            ctx: TypeContext::default(),
            env: Env::new(),
            scope: ScopeTree::new(),
            handler,
            ids: DefIdGenerator::new(),
            globals: decl::Globals::default(),
            expr_types: FxHashMap::default(),
            current_locals: FxHashMap::default(),
            current_fn: None,
            mutable_bindings: rustc_hash::FxHashSet::default(),
            labels: Vec::new(),
            next_label: 0,
        }
    }

    /// Checks every item in a module: declarations first (so every
    /// forward reference resolves), then bodies.
    pub fn check_module(&mut self, items: &[ast::Item]) {
        log::debug!("collecting declarations for {} top-level item(s)", items.len());
        let globals = decl::collect(items, &mut self.ctx, &mut self.env, &mut self.scope, &mut self.ids, self.handler);
        self.globals = globals;

        for item in items {
            match item {
                ast::Item::Fn(f) => self.check_fn(f, None),
                ast::Item::Impl(impl_item) => {
                    let names = self.type_names_with(&[]);
                    let self_ty = resolve::resolve_type(&impl_item.self_ty, &self.ctx, &self.env, &names, self.handler, faxc_util::Span::DUMMY);
                    for member in &impl_item.items {
                        if let ast::ImplMember::Method(f) = member {
                            self.check_fn(f, Some(&self_ty));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn check_fn(&mut self, f: &ast::FnItem, self_ty: Option<&Type>) {
        let fn_ty = self.globals.values.get(f.name.as_str()).map(|(_, ty)| ty.clone()).or_else(|| {
            self_ty.and_then(|ty| {
                let type_name = decl::type_display_name(ty, &self.ctx);
                self.globals.methods.get(&type_name).and_then(|m| m.get(f.name.as_str())).map(|(_, ft)| Type::Function(Box::new(ft.clone())))
            })
        });
        let Some(Type::Function(ft)) = fn_ty else { return };
        log::trace!("checking body of `{}`", f.name);

        self.current_locals = local_param_names(&f.generics, &self.ctx);
        self.current_fn = Some(FnFrame { name: f.name, return_ty: ft.ret.clone() });
        self.scope.enter_scope(scope::RibKind::Function);

        bind_params(self, &f.params, &ft, self_ty);

        let body = stmt::check_block(self, &f.body, false);
        if !resolve::is_assignable(&body.ty(), &ft.ret, &self.ctx, &self.env) && !matches!(ft.ret, Type::Primitive(types::PrimitiveKind::Void)) {
            self.handler
                .build_error(f.span, format!("function `{}` returns `{:?}`, body produces `{:?}`", f.name, ft.ret, body.ty()))
                .code(faxc_util::DiagnosticCode::E_SEMANTIC_TYPE_MISMATCH)
                .emit(self.handler);
        }

        self.scope.exit_scope();
        self.current_fn = None;
        self.current_locals.clear();
    }

    pub fn type_names(&self) -> resolve::TypeNames<'_> {
        resolve::TypeNames { global: &self.globals.type_names, local: &self.current_locals }
    }

    fn type_names_with(&self, _extra: &[(String, Type)]) -> resolve::TypeNames<'_> {
        resolve::TypeNames { global: &self.globals.type_names, local: &self.current_locals }
    }

    pub fn record_expr_type(&mut self, key: usize, ty: Type) {
        self.expr_types.insert(key, ty);
    }

    pub fn expr_type(&self, key: usize) -> Option<&Type> {
        self.expr_types.get(&key)
    }

    /// Mints a fresh label for a `loop`/`while`/`for` statement carrying
    /// an explicit label name, pushing it onto the lookup stack.
    pub fn bind_label(&mut self, name: Symbol) -> hir::LabelId {
        let id = hir::LabelId(self.next_label);
        self.next_label += 1;
        self.labels.push((name, id));
        id
    }

    /// Resolves a `break 'label`/`continue 'label` name to the nearest
    /// enclosing loop that bound it, searching innermost-first. Falls
    /// back to a fresh unbound id (rather than panicking) if the label
    /// doesn't match any enclosing loop; that mismatch is a resolver-
    /// level concern this pass doesn't re-validate.
    pub fn resolve_label(&mut self, name: Symbol) -> hir::LabelId {
        self.labels.iter().rev().find(|(n, _)| *n == name).map(|(_, id)| *id).unwrap_or_else(|| self.bind_label(name))
    }
}

fn local_param_names(generics: &[ast::GenericParam], ctx: &TypeContext) -> FxHashMap<String, Type> {
    let mut local = FxHashMap::default();
    for g in generics {
        if let Some(def) = ctx.type_params.iter().flatten().find(|d| d.name == g.name.as_str()) {
            local.insert(g.name.as_str().to_string(), Type::Param(def.id));
        }
    }
    local
}

/// Binds every declared parameter (minus `self`, which is implicit) to
/// a fresh `DefId` positionally against the function's already-resolved
/// `FunctionType::params`, in the same order `decl::function_type`
/// built them in.
fn bind_params(checker: &mut Checker, params: &[ast::Param], ft: &FunctionType, self_ty: Option<&Type>) {
    let mut resolved = ft.params.iter();
    for p in params {
        if p.name.as_str() == "self" {
            if let Some(ty) = self_ty {
                let def_id = checker.ids.next();
                checker.ctx.set_def_type(def_id, ty.clone());
                checker.scope.add_binding(p.name, def_id);
                if p.mutable {
                    checker.mutable_bindings.insert(def_id);
                }
            }
            continue;
        }
        let Some(ty) = resolved.next() else { continue };
        let def_id = checker.ids.next();
        checker.ctx.set_def_type(def_id, ty.clone());
        checker.scope.add_binding(p.name, def_id);
        if p.mutable {
            checker.mutable_bindings.insert(def_id);
        }
    }
}

/// Stringifies a type for use as a method-table / operator-overload
/// lookup key. Thin wrapper over [`decl::type_display_name`] with the
/// argument order [`expr`] and [`pattern`] both expect.
pub(crate) fn decl_type_name(ctx: &TypeContext, ty: &Type) -> String {
    decl::type_display_name(ty, ctx)
}
