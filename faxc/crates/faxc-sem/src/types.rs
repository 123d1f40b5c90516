use faxc_util::{DefId, Idx, IndexVec};
use std::collections::HashMap;

/// A type in the type system.
///
/// Struct/Enum/Trait/TypeParam bodies live in [`TypeContext`] side tables
/// keyed by [`DefId`]/[`ParamId`] rather than inline, so that recursive and
/// mutually-recursive definitions (an enum variant referencing its own
/// enum, a struct field referencing the struct itself) don't require the
/// `Type` enum to own a cycle. Everything else recurses through `Box`,
/// matching the rest of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Error type (for recovery)
    Error,
    /// Never type (!) - diverges
    Never,
    /// A primitive, tagged by kind
    Primitive(PrimitiveKind),
    /// A name with an optional lazily-resolved referent. `any` is the
    /// wildcard name; `Self` is resolved against the enclosing scope.
    Named(NamedType),
    /// Struct type, looked up by DefId in `TypeContext::structs`
    Struct(DefId),
    /// Enum type, looked up by DefId in `TypeContext::enums`
    Enum(DefId),
    /// Trait type, looked up by DefId in `TypeContext::traits`
    Trait(DefId),
    /// Function type
    Function(Box<FunctionType>),
    /// Universally quantified type variable
    Param(ParamId),
    /// A base type applied to type arguments, e.g. `List[int]`. The base is
    /// often a `Named` placeholder until resolved.
    GenericInstance(Box<Type>, Vec<Type>),
    /// Raw pointer
    Pointer(Box<Type>, bool),
    /// Reference, with mutability
    Ref(Box<Type>, bool),
    /// Optional type `T?`
    Optional(Box<Type>),
    /// Slice type `[T]`
    Slice(Box<Type>),
    /// Array type `[T; N]`
    Array(Box<Type>, usize),
    /// Map type, key and value
    Map(Box<Type>, Box<Type>),
    /// Tuple type
    Tuple(Vec<Type>),
    /// Channel, element type and direction
    Channel(Box<Type>, ChannelDirection),
    /// `exists T: Bounds. Body`
    Existential(Box<Existential>),
    /// Rank-N universally quantified type
    Forall(Box<Forall>),
    /// Range produced by a range expression
    Range(Box<Type>),
    /// `Base::AssocName` projection
    ProjectedType(Box<Type>, String),
    /// Higher-kinded named type-level function
    TypeConstructor(DefId, Kind),
    /// Future type (async)
    Future(Box<Type>),
    /// Result type Result<T, E>
    Result(Box<Type>, Box<Type>),
    /// Type variable (for inference)
    Infer(InferId),
}

/// Primitive type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int,
    Int8,
    Int32,
    Int64,
    U8,
    U16,
    U32,
    U64,
    U128,
    USize,
    Float,
    Bool,
    String,
    Null,
    Void,
}

/// A named, possibly-unresolved reference. `referent` starts `None` and is
/// filled in once the name is looked up; until then the type behaves as an
/// opaque forward reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    pub referent: Option<Box<Type>>,
}

impl NamedType {
    pub fn unresolved(name: impl Into<String>) -> Self {
        NamedType {
            name: name.into(),
            referent: None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "any"
    }
}

/// Function type: unsafe flag, parameters, return type, optional receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub is_unsafe: bool,
    pub type_params: Vec<ParamId>,
    pub params: Vec<Type>,
    pub ret: Type,
    pub receiver: Option<Receiver>,
}

/// The `self` parameter of a method, encoded as (mutability, receiver type)
/// rather than a literal first parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub mutable: bool,
    pub ty: Box<Type>,
}

/// Channel direction. Bidirectional narrows to either unidirectional form;
/// the two unidirectional forms are not assignable to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelDirection {
    SendOnly,
    ReceiveOnly,
    Bidirectional,
}

impl ChannelDirection {
    pub fn assignable_to(self, target: ChannelDirection) -> bool {
        match (self, target) {
            (a, b) if a == b => true,
            (ChannelDirection::Bidirectional, _) => true,
            _ => false,
        }
    }
}

/// `exists T: Bounds. Body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Existential {
    pub bound_param: ParamId,
    pub bounds: Vec<Type>,
    pub body: Type,
}

/// Rank-N universally quantified type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forall {
    pub params: Vec<ParamId>,
    pub body: Type,
}

/// A kind: `*`, an arrow `k -> k'`, or an inference variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Star,
    Arrow(Box<Kind>, Box<Kind>),
    Var(KindVarId),
}

impl Kind {
    /// Builds `* -> (* -> (... -> *))` for `arity` unbound type parameters.
    pub fn of_arity(arity: usize) -> Kind {
        (0..arity).fold(Kind::Star, |acc, _| Kind::Arrow(Box::new(Kind::Star), Box::new(acc)))
    }
}

/// Kind inference variable ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindVarId(pub u32);

impl Idx for KindVarId {
    fn from_usize(idx: usize) -> Self {
        KindVarId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type parameter ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

impl Idx for ParamId {
    fn from_usize(idx: usize) -> Self {
        ParamId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type inference variable ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InferId(pub u32);

impl Idx for InferId {
    fn from_usize(idx: usize) -> Self {
        InferId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Side-table entry for a struct type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub type_params: Vec<TypeParamDef>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
}

/// Side-table entry for an enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub type_params: Vec<TypeParamDef>,
    pub variants: Vec<VariantDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDef {
    pub name: String,
    pub payload: Vec<Type>,
    /// The refined instance this variant constructs, when it's a GADT
    /// variant (e.g. `Expr::Lit : Expr[int]`). Must be an instance of the
    /// defining enum.
    pub gadt_return: Option<Type>,
}

/// Side-table entry for a trait type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitDef {
    pub name: String,
    pub type_params: Vec<TypeParamDef>,
    pub methods: Vec<MethodSig>,
    pub assoc_types: Vec<AssocTypeDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub type_params: Vec<TypeParamDef>,
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssocTypeDef {
    pub name: String,
    pub bounds: Vec<Type>,
    pub trait_id: DefId,
}

/// Side-table entry for a TypeParam: name, bounds, and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    pub id: ParamId,
    pub name: String,
    pub bounds: Vec<Type>,
    pub kind: Kind,
}

/// Type context - stores all type information
#[derive(Default)]
pub struct TypeContext {
    /// Type of each definition
    pub def_types: HashMap<DefId, Type>,
    /// Type of each expression
    pub expr_types: HashMap<ExprId, Type>,
    /// Inference variable substitutions
    pub substitutions: IndexVec<InferId, Option<Type>>,
    /// Constraints to solve
    pub constraints: Vec<Constraint>,
    /// Struct bodies, keyed by DefId, so struct types can be recursive
    pub structs: HashMap<DefId, StructDef>,
    /// Enum bodies, keyed by DefId
    pub enums: HashMap<DefId, EnumDef>,
    /// Trait bodies, keyed by DefId
    pub traits: HashMap<DefId, TraitDef>,
    /// Type parameter definitions, keyed by ParamId
    pub type_params: IndexVec<ParamId, Option<TypeParamDef>>,
    /// Kind inference variable substitutions
    pub kind_substitutions: IndexVec<KindVarId, Option<Kind>>,
}

/// Expression ID (placeholder, should match HIR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Type constraint
#[derive(Debug, Clone)]
pub enum Constraint {
    Eq(Type, Type),
    Trait(Type, DefId),
}

impl TypeContext {
    pub fn type_of_def(&self, def_id: DefId) -> Option<&Type> {
        self.def_types.get(&def_id)
    }

    pub fn set_def_type(&mut self, def_id: DefId, ty: Type) {
        self.def_types.insert(def_id, ty);
    }

    pub fn add_eq_constraint(&mut self, t1: Type, t2: Type) {
        self.constraints.push(Constraint::Eq(t1, t2));
    }

    pub fn add_trait_constraint(&mut self, t: Type, trait_id: DefId) {
        self.constraints.push(Constraint::Trait(t, trait_id));
    }

    pub fn new_infer_var(&mut self) -> InferId {
        self.substitutions.push(None)
    }

    pub fn new_kind_var(&mut self) -> KindVarId {
        self.kind_substitutions.push(None)
    }

    pub fn declare_struct(&mut self, def_id: DefId, def: StructDef) {
        self.structs.insert(def_id, def);
    }

    pub fn declare_enum(&mut self, def_id: DefId, def: EnumDef) {
        self.enums.insert(def_id, def);
    }

    pub fn declare_trait(&mut self, def_id: DefId, def: TraitDef) {
        self.traits.insert(def_id, def);
    }

    pub fn declare_type_param(&mut self, def: TypeParamDef) -> ParamId {
        let id = def.id;
        while self.type_params.len() <= id.index() {
            self.type_params.push(None);
        }
        self.type_params[id] = Some(def);
        id
    }

    pub fn type_param(&self, id: ParamId) -> Option<&TypeParamDef> {
        self.type_params.get(id).and_then(|d| d.as_ref())
    }

    /// Resolves a `Named` type against its referent, recursively unwrapping
    /// transparent layers. Returns the original type if it has no referent.
    pub fn normalize<'a>(&self, ty: &'a Type) -> &'a Type {
        match ty {
            Type::Named(NamedType {
                referent: Some(inner),
                ..
            }) => self.normalize(inner),
            _ => ty,
        }
    }

    pub fn substitute(&self, ty: &Type) -> Type {
        match ty {
            Type::Infer(id) => match self.substitutions.get(*id) {
                Some(Some(t)) => self.substitute(t),
                _ => ty.clone(),
            },
            Type::Named(n) => Type::Named(NamedType {
                name: n.name.clone(),
                referent: n.referent.as_ref().map(|r| Box::new(self.substitute(r))),
            }),
            Type::Tuple(tys) => Type::Tuple(tys.iter().map(|t| self.substitute(t)).collect()),
            Type::Ref(t, m) => Type::Ref(Box::new(self.substitute(t)), *m),
            Type::Pointer(t, m) => Type::Pointer(Box::new(self.substitute(t)), *m),
            Type::Array(t, n) => Type::Array(Box::new(self.substitute(t)), *n),
            Type::Slice(t) => Type::Slice(Box::new(self.substitute(t))),
            Type::Optional(t) => Type::Optional(Box::new(self.substitute(t))),
            Type::Future(t) => Type::Future(Box::new(self.substitute(t))),
            Type::Range(t) => Type::Range(Box::new(self.substitute(t))),
            Type::Map(k, v) => Type::Map(Box::new(self.substitute(k)), Box::new(self.substitute(v))),
            Type::Result(t, e) => Type::Result(Box::new(self.substitute(t)), Box::new(self.substitute(e))),
            Type::Channel(t, dir) => Type::Channel(Box::new(self.substitute(t)), *dir),
            Type::GenericInstance(base, args) => Type::GenericInstance(
                Box::new(self.substitute(base)),
                args.iter().map(|a| self.substitute(a)).collect(),
            ),
            Type::ProjectedType(base, assoc) => {
                Type::ProjectedType(Box::new(self.substitute(base)), assoc.clone())
            }
            Type::Function(f) => Type::Function(Box::new(FunctionType {
                is_unsafe: f.is_unsafe,
                type_params: f.type_params.clone(),
                params: f.params.iter().map(|p| self.substitute(p)).collect(),
                ret: self.substitute(&f.ret),
                receiver: f.receiver.as_ref().map(|r| Receiver {
                    mutable: r.mutable,
                    ty: Box::new(self.substitute(&r.ty)),
                }),
            })),
            Type::Existential(e) => Type::Existential(Box::new(Existential {
                bound_param: e.bound_param,
                bounds: e.bounds.iter().map(|b| self.substitute(b)).collect(),
                body: self.substitute(&e.body),
            })),
            Type::Forall(f) => Type::Forall(Box::new(Forall {
                params: f.params.clone(),
                body: self.substitute(&f.body),
            })),
            _ => ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Type Enum Tests
    // ========================================================================

    #[test]
    fn test_type_error() {
        let ty = Type::Error;
        assert_eq!(ty, Type::Error);
    }

    #[test]
    fn test_type_unit() {
        let ty = Type::Primitive(PrimitiveKind::Void);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::Void));
    }

    #[test]
    fn test_type_never() {
        let ty = Type::Never;
        assert_eq!(ty, Type::Never);
    }

    #[test]
    fn test_type_int() {
        let ty = Type::Primitive(PrimitiveKind::Int);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::Int));
    }

    #[test]
    fn test_type_float() {
        let ty = Type::Primitive(PrimitiveKind::Float);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::Float));
    }

    #[test]
    fn test_type_bool() {
        let ty = Type::Primitive(PrimitiveKind::Bool);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::Bool));
    }

    #[test]
    fn test_type_string() {
        let ty = Type::Primitive(PrimitiveKind::String);
        assert_eq!(ty, Type::Primitive(PrimitiveKind::String));
    }

    #[test]
    fn test_type_named_wildcard() {
        let ty = NamedType::unresolved("any");
        assert!(ty.is_wildcard());
        let named = NamedType::unresolved("Foo");
        assert!(!named.is_wildcard());
    }

    #[test]
    fn test_type_struct_enum_trait_by_defid() {
        let def_id = DefId(42);
        assert_eq!(Type::Struct(def_id), Type::Struct(def_id));
        assert_eq!(Type::Enum(def_id), Type::Enum(def_id));
        assert_eq!(Type::Trait(def_id), Type::Trait(def_id));
        assert_ne!(Type::Struct(def_id), Type::Enum(def_id));
    }

    #[test]
    fn test_type_param() {
        let param_id = ParamId(0);
        let ty = Type::Param(param_id);
        assert_eq!(ty, Type::Param(param_id));
    }

    #[test]
    fn test_type_ref() {
        let ty = Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), false);
        assert_eq!(ty, Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), false));

        let mutable_ref = Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), true);
        assert_eq!(mutable_ref, Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), true));
    }

    #[test]
    fn test_type_pointer() {
        let ty = Type::Pointer(Box::new(Type::Primitive(PrimitiveKind::Int)), true);
        assert_eq!(ty, Type::Pointer(Box::new(Type::Primitive(PrimitiveKind::Int)), true));
    }

    #[test]
    fn test_type_tuple() {
        let ty = Type::Tuple(vec![
            Type::Primitive(PrimitiveKind::Int),
            Type::Primitive(PrimitiveKind::Bool),
            Type::Primitive(PrimitiveKind::String),
        ]);
        assert_eq!(
            ty,
            Type::Tuple(vec![
                Type::Primitive(PrimitiveKind::Int),
                Type::Primitive(PrimitiveKind::Bool),
                Type::Primitive(PrimitiveKind::String)
            ])
        );

        let empty_tuple = Type::Tuple(vec![]);
        assert_eq!(empty_tuple, Type::Tuple(vec![]));
    }

    #[test]
    fn test_type_array() {
        let ty = Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 10);
        assert_eq!(ty, Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 10));
    }

    #[test]
    fn test_type_slice() {
        let ty = Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ty, Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int))));
    }

    #[test]
    fn test_type_map() {
        let ty = Type::Map(
            Box::new(Type::Primitive(PrimitiveKind::String)),
            Box::new(Type::Primitive(PrimitiveKind::Int)),
        );
        assert_eq!(
            ty,
            Type::Map(
                Box::new(Type::Primitive(PrimitiveKind::String)),
                Box::new(Type::Primitive(PrimitiveKind::Int))
            )
        );
    }

    #[test]
    fn test_type_optional() {
        let ty = Type::Optional(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ty, Type::Optional(Box::new(Type::Primitive(PrimitiveKind::Int))));
    }

    #[test]
    fn test_type_function() {
        let ty = Type::Function(Box::new(FunctionType {
            is_unsafe: false,
            type_params: vec![],
            params: vec![Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::String)],
            ret: Type::Primitive(PrimitiveKind::Bool),
            receiver: None,
        }));
        match ty {
            Type::Function(f) => {
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.ret, Type::Primitive(PrimitiveKind::Bool));
                assert!(f.receiver.is_none());
            }
            _ => panic!("expected Function"),
        }
    }

    #[test]
    fn test_type_function_with_receiver() {
        let recv_ty = Type::Struct(DefId(1));
        let ty = FunctionType {
            is_unsafe: false,
            type_params: vec![],
            params: vec![],
            ret: Type::Primitive(PrimitiveKind::Void),
            receiver: Some(Receiver {
                mutable: true,
                ty: Box::new(recv_ty.clone()),
            }),
        };
        assert_eq!(ty.receiver.unwrap().ty, Box::new(recv_ty));
    }

    #[test]
    fn test_type_future() {
        let ty = Type::Future(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ty, Type::Future(Box::new(Type::Primitive(PrimitiveKind::Int))));
    }

    #[test]
    fn test_type_infer() {
        let infer_id = InferId(0);
        let ty = Type::Infer(infer_id);
        assert_eq!(ty, Type::Infer(infer_id));
    }

    #[test]
    fn test_type_clone() {
        let ty = Type::Tuple(vec![Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool)]);
        let cloned = ty.clone();
        assert_eq!(ty, cloned);
    }

    #[test]
    fn test_type_debug() {
        let ty = Type::Primitive(PrimitiveKind::Int);
        let debug_str = format!("{:?}", ty);
        assert!(debug_str.contains("Int"));
    }

    #[test]
    fn test_type_generic_instance() {
        let base = Type::Named(NamedType::unresolved("List"));
        let ty = Type::GenericInstance(Box::new(base.clone()), vec![Type::Primitive(PrimitiveKind::Int)]);
        match ty {
            Type::GenericInstance(b, args) => {
                assert_eq!(*b, base);
                assert_eq!(args.len(), 1);
            }
            _ => panic!("expected GenericInstance"),
        }
    }

    #[test]
    fn test_type_existential() {
        let ty = Type::Existential(Box::new(Existential {
            bound_param: ParamId(0),
            bounds: vec![Type::Trait(DefId(1))],
            body: Type::Param(ParamId(0)),
        }));
        match ty {
            Type::Existential(e) => {
                assert_eq!(e.bounds.len(), 1);
                assert_eq!(e.body, Type::Param(ParamId(0)));
            }
            _ => panic!("expected Existential"),
        }
    }

    #[test]
    fn test_type_forall() {
        let ty = Type::Forall(Box::new(Forall {
            params: vec![ParamId(0), ParamId(1)],
            body: Type::Param(ParamId(0)),
        }));
        match ty {
            Type::Forall(f) => assert_eq!(f.params.len(), 2),
            _ => panic!("expected Forall"),
        }
    }

    #[test]
    fn test_type_range() {
        let ty = Type::Range(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ty, Type::Range(Box::new(Type::Primitive(PrimitiveKind::Int))));
    }

    #[test]
    fn test_type_projected_type() {
        let base = Type::Param(ParamId(0));
        let ty = Type::ProjectedType(Box::new(base.clone()), "Item".to_string());
        match ty {
            Type::ProjectedType(b, name) => {
                assert_eq!(*b, base);
                assert_eq!(name, "Item");
            }
            _ => panic!("expected ProjectedType"),
        }
    }

    #[test]
    fn test_type_constructor() {
        let ty = Type::TypeConstructor(DefId(1), Kind::of_arity(1));
        match ty {
            Type::TypeConstructor(id, kind) => {
                assert_eq!(id, DefId(1));
                assert_eq!(kind, Kind::Arrow(Box::new(Kind::Star), Box::new(Kind::Star)));
            }
            _ => panic!("expected TypeConstructor"),
        }
    }

    // ========================================================================
    // Channel direction assignability
    // ========================================================================

    #[test]
    fn test_channel_direction_same_assignable() {
        assert!(ChannelDirection::SendOnly.assignable_to(ChannelDirection::SendOnly));
        assert!(ChannelDirection::ReceiveOnly.assignable_to(ChannelDirection::ReceiveOnly));
    }

    #[test]
    fn test_channel_direction_bidi_narrows() {
        assert!(ChannelDirection::Bidirectional.assignable_to(ChannelDirection::SendOnly));
        assert!(ChannelDirection::Bidirectional.assignable_to(ChannelDirection::ReceiveOnly));
    }

    #[test]
    fn test_channel_direction_unidirectional_not_cross_assignable() {
        assert!(!ChannelDirection::SendOnly.assignable_to(ChannelDirection::ReceiveOnly));
        assert!(!ChannelDirection::ReceiveOnly.assignable_to(ChannelDirection::SendOnly));
        assert!(!ChannelDirection::SendOnly.assignable_to(ChannelDirection::Bidirectional));
    }

    #[test]
    fn test_type_channel() {
        let ty = Type::Channel(Box::new(Type::Primitive(PrimitiveKind::Int)), ChannelDirection::Bidirectional);
        assert_eq!(
            ty,
            Type::Channel(Box::new(Type::Primitive(PrimitiveKind::Int)), ChannelDirection::Bidirectional)
        );
    }

    // ========================================================================
    // Kind tests
    // ========================================================================

    #[test]
    fn test_kind_of_arity_zero() {
        assert_eq!(Kind::of_arity(0), Kind::Star);
    }

    #[test]
    fn test_kind_of_arity_two() {
        let kind = Kind::of_arity(2);
        assert_eq!(
            kind,
            Kind::Arrow(
                Box::new(Kind::Star),
                Box::new(Kind::Arrow(Box::new(Kind::Star), Box::new(Kind::Star)))
            )
        );
    }

    #[test]
    fn test_kind_var_id() {
        let id = KindVarId::from_usize(3);
        assert_eq!(id.index(), 3);
    }

    // ========================================================================
    // ParamId Tests
    // ========================================================================

    #[test]
    fn test_param_id_from_usize() {
        let param_id = ParamId::from_usize(42);
        assert_eq!(param_id.0, 42);
    }

    #[test]
    fn test_param_id_index() {
        let param_id = ParamId(100);
        assert_eq!(param_id.index(), 100);
    }

    #[test]
    fn test_param_id_equality() {
        let p1 = ParamId(1);
        let p2 = ParamId(1);
        let p3 = ParamId(2);

        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
    }

    #[test]
    fn test_param_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let p1 = ParamId(1);
        let p2 = ParamId(2);
        let p3 = ParamId(1);

        set.insert(p1);
        set.insert(p2);
        set.insert(p3);

        assert_eq!(set.len(), 2);
    }

    // ========================================================================
    // InferId Tests
    // ========================================================================

    #[test]
    fn test_infer_id_from_usize() {
        let infer_id = InferId::from_usize(42);
        assert_eq!(infer_id.0, 42);
    }

    #[test]
    fn test_infer_id_index() {
        let infer_id = InferId(100);
        assert_eq!(infer_id.index(), 100);
    }

    #[test]
    fn test_infer_id_equality() {
        let i1 = InferId(1);
        let i2 = InferId(1);
        let i3 = InferId(2);

        assert_eq!(i1, i2);
        assert_ne!(i1, i3);
    }

    #[test]
    fn test_infer_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let i1 = InferId(1);
        let i2 = InferId(2);
        let i3 = InferId(1);

        set.insert(i1);
        set.insert(i2);
        set.insert(i3);

        assert_eq!(set.len(), 2);
    }

    // ========================================================================
    // ExprId Tests
    // ========================================================================

    #[test]
    fn test_expr_id_creation() {
        let expr_id = ExprId(42);
        assert_eq!(expr_id.0, 42);
    }

    #[test]
    fn test_expr_id_equality() {
        let e1 = ExprId(1);
        let e2 = ExprId(1);
        let e3 = ExprId(2);

        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
    }

    #[test]
    fn test_expr_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let e1 = ExprId(1);
        let e2 = ExprId(2);
        let e3 = ExprId(1);

        set.insert(e1);
        set.insert(e2);
        set.insert(e3);

        assert_eq!(set.len(), 2);
    }

    // ========================================================================
    // Constraint Tests
    // ========================================================================

    #[test]
    fn test_constraint_eq() {
        let c = Constraint::Eq(Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Int));
        match c {
            Constraint::Eq(t1, t2) => {
                assert_eq!(t1, Type::Primitive(PrimitiveKind::Int));
                assert_eq!(t2, Type::Primitive(PrimitiveKind::Int));
            }
            _ => panic!("Expected Eq constraint"),
        }
    }

    #[test]
    fn test_constraint_trait() {
        let def_id = DefId(42);
        let c = Constraint::Trait(Type::Primitive(PrimitiveKind::Int), def_id);
        match c {
            Constraint::Trait(t, d) => {
                assert_eq!(t, Type::Primitive(PrimitiveKind::Int));
                assert_eq!(d, def_id);
            }
            _ => panic!("Expected Trait constraint"),
        }
    }

    #[test]
    fn test_constraint_clone() {
        let c = Constraint::Eq(Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool));
        let cloned = c.clone();
        match cloned {
            Constraint::Eq(t1, t2) => {
                assert_eq!(t1, Type::Primitive(PrimitiveKind::Int));
                assert_eq!(t2, Type::Primitive(PrimitiveKind::Bool));
            }
            _ => panic!("Expected Eq constraint"),
        }
    }

    #[test]
    fn test_constraint_debug() {
        let c = Constraint::Eq(Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool));
        let debug_str = format!("{:?}", c);
        assert!(debug_str.contains("Eq"));
    }

    // ========================================================================
    // TypeContext Tests
    // ========================================================================

    #[test]
    fn test_type_context_default() {
        let ctx: TypeContext = TypeContext::default();
        assert!(ctx.def_types.is_empty());
        assert!(ctx.expr_types.is_empty());
        assert!(ctx.constraints.is_empty());
        assert!(ctx.structs.is_empty());
        assert!(ctx.enums.is_empty());
        assert!(ctx.traits.is_empty());
    }

    #[test]
    fn test_type_context_set_def_type() {
        let mut ctx = TypeContext::default();
        let def_id = DefId(1);

        ctx.set_def_type(def_id, Type::Primitive(PrimitiveKind::Int));

        let ty = ctx.type_of_def(def_id);
        assert_eq!(ty, Some(&Type::Primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn test_type_context_type_of_def_not_found() {
        let ctx = TypeContext::default();
        let def_id = DefId(1);

        let ty = ctx.type_of_def(def_id);
        assert_eq!(ty, None);
    }

    #[test]
    fn test_type_context_multiple_def_types() {
        let mut ctx = TypeContext::default();

        ctx.set_def_type(DefId(1), Type::Primitive(PrimitiveKind::Int));
        ctx.set_def_type(DefId(2), Type::Primitive(PrimitiveKind::Bool));
        ctx.set_def_type(DefId(3), Type::Primitive(PrimitiveKind::String));

        assert_eq!(ctx.type_of_def(DefId(1)), Some(&Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ctx.type_of_def(DefId(2)), Some(&Type::Primitive(PrimitiveKind::Bool)));
        assert_eq!(ctx.type_of_def(DefId(3)), Some(&Type::Primitive(PrimitiveKind::String)));
        assert_eq!(ctx.type_of_def(DefId(4)), None);
    }

    #[test]
    fn test_type_context_add_eq_constraint() {
        let mut ctx = TypeContext::default();

        ctx.add_eq_constraint(Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Int));

        assert_eq!(ctx.constraints.len(), 1);
        match &ctx.constraints[0] {
            Constraint::Eq(t1, t2) => {
                assert_eq!(t1, &Type::Primitive(PrimitiveKind::Int));
                assert_eq!(t2, &Type::Primitive(PrimitiveKind::Int));
            }
            _ => panic!("Expected Eq constraint"),
        }
    }

    #[test]
    fn test_type_context_add_trait_constraint() {
        let mut ctx = TypeContext::default();
        ctx.add_trait_constraint(Type::Primitive(PrimitiveKind::Int), DefId(7));
        assert_eq!(ctx.constraints.len(), 1);
        match &ctx.constraints[0] {
            Constraint::Trait(_, d) => assert_eq!(*d, DefId(7)),
            _ => panic!("Expected Trait constraint"),
        }
    }

    #[test]
    fn test_type_context_multiple_constraints() {
        let mut ctx = TypeContext::default();

        ctx.add_eq_constraint(Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Int));
        ctx.add_eq_constraint(Type::Primitive(PrimitiveKind::Bool), Type::Primitive(PrimitiveKind::Bool));

        assert_eq!(ctx.constraints.len(), 2);
    }

    #[test]
    fn test_type_context_new_infer_var() {
        let mut ctx = TypeContext::default();

        let id1 = ctx.new_infer_var();
        let id2 = ctx.new_infer_var();
        let id3 = ctx.new_infer_var();

        assert_eq!(id1, InferId(0));
        assert_eq!(id2, InferId(1));
        assert_eq!(id3, InferId(2));
    }

    #[test]
    fn test_type_context_new_kind_var() {
        let mut ctx = TypeContext::default();
        let id1 = ctx.new_kind_var();
        let id2 = ctx.new_kind_var();
        assert_eq!(id1, KindVarId(0));
        assert_eq!(id2, KindVarId(1));
    }

    #[test]
    fn test_type_context_substitute_infer() {
        let mut ctx = TypeContext::default();
        let infer_id = ctx.new_infer_var();

        // Without substitution, should return the same infer type
        let ty = Type::Infer(infer_id);
        let result = ctx.substitute(&ty);
        assert_eq!(result, Type::Infer(infer_id));
    }

    #[test]
    fn test_type_context_substitute_tuple() {
        let ctx = TypeContext::default();
        let ty = Type::Tuple(vec![Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool)]);

        let result = ctx.substitute(&ty);
        assert_eq!(result, Type::Tuple(vec![Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool)]));
    }

    #[test]
    fn test_type_context_substitute_ref() {
        let ctx = TypeContext::default();
        let ty = Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), false);

        let result = ctx.substitute(&ty);
        assert_eq!(result, Type::Ref(Box::new(Type::Primitive(PrimitiveKind::Int)), false));
    }

    #[test]
    fn test_type_context_substitute_array() {
        let ctx = TypeContext::default();
        let ty = Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 10);

        let result = ctx.substitute(&ty);
        assert_eq!(result, Type::Array(Box::new(Type::Primitive(PrimitiveKind::Int)), 10));
    }

    #[test]
    fn test_type_context_substitute_fn() {
        let ctx = TypeContext::default();
        let ty = Type::Function(Box::new(FunctionType {
            is_unsafe: false,
            type_params: vec![],
            params: vec![Type::Primitive(PrimitiveKind::Int), Type::Primitive(PrimitiveKind::Bool)],
            ret: Type::Primitive(PrimitiveKind::String),
            receiver: None,
        }));

        let result = ctx.substitute(&ty);
        assert_eq!(result, ty);
    }

    #[test]
    fn test_type_context_substitute_option_result_slice_future() {
        let ctx = TypeContext::default();
        let opt = Type::Optional(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ctx.substitute(&opt), opt);

        let res = Type::Result(
            Box::new(Type::Primitive(PrimitiveKind::Int)),
            Box::new(Type::Primitive(PrimitiveKind::String)),
        );
        assert_eq!(ctx.substitute(&res), res);

        let slice = Type::Slice(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ctx.substitute(&slice), slice);

        let future = Type::Future(Box::new(Type::Primitive(PrimitiveKind::Int)));
        assert_eq!(ctx.substitute(&future), future);
    }

    #[test]
    fn test_type_context_substitute_primitive() {
        let ctx = TypeContext::default();

        assert_eq!(ctx.substitute(&Type::Primitive(PrimitiveKind::Int)), Type::Primitive(PrimitiveKind::Int));
        assert_eq!(ctx.substitute(&Type::Primitive(PrimitiveKind::Bool)), Type::Primitive(PrimitiveKind::Bool));
        assert_eq!(ctx.substitute(&Type::Primitive(PrimitiveKind::String)), Type::Primitive(PrimitiveKind::String));
        assert_eq!(ctx.substitute(&Type::Primitive(PrimitiveKind::Void)), Type::Primitive(PrimitiveKind::Void));
    }

    #[test]
    fn test_type_context_declare_and_lookup_struct() {
        let mut ctx = TypeContext::default();
        let def_id = DefId(5);
        ctx.declare_struct(
            def_id,
            StructDef {
                name: "Point".to_string(),
                type_params: vec![],
                fields: vec![FieldDef {
                    name: "x".to_string(),
                    ty: Type::Primitive(PrimitiveKind::Int),
                }],
            },
        );
        assert_eq!(ctx.structs.get(&def_id).unwrap().name, "Point");
    }

    #[test]
    fn test_type_context_declare_enum_with_gadt_variant() {
        let mut ctx = TypeContext::default();
        let def_id = DefId(6);
        ctx.declare_enum(
            def_id,
            EnumDef {
                name: "Expr".to_string(),
                type_params: vec![],
                variants: vec![VariantDef {
                    name: "Lit".to_string(),
                    payload: vec![Type::Primitive(PrimitiveKind::Int)],
                    gadt_return: Some(Type::GenericInstance(
                        Box::new(Type::Enum(def_id)),
                        vec![Type::Primitive(PrimitiveKind::Int)],
                    )),
                }],
            },
        );
        let def = ctx.enums.get(&def_id).unwrap();
        assert!(def.variants[0].gadt_return.is_some());
    }

    #[test]
    fn test_type_context_declare_type_param() {
        let mut ctx = TypeContext::default();
        let id = ctx.declare_type_param(TypeParamDef {
            id: ParamId(0),
            name: "T".to_string(),
            bounds: vec![],
            kind: Kind::Star,
        });
        assert_eq!(ctx.type_param(id).unwrap().name, "T");
        assert!(ctx.type_param(ParamId(1)).is_none());
    }

    #[test]
    fn test_type_context_normalize_transparent_named() {
        let ctx = TypeContext::default();
        let named = Type::Named(NamedType {
            name: "Alias".to_string(),
            referent: Some(Box::new(Type::Primitive(PrimitiveKind::Int))),
        });
        assert_eq!(ctx.normalize(&named), &Type::Primitive(PrimitiveKind::Int));
    }

    #[test]
    fn test_type_context_normalize_unresolved_named_is_identity() {
        let ctx = TypeContext::default();
        let named = Type::Named(NamedType::unresolved("Self"));
        assert_eq!(ctx.normalize(&named), &named);
    }
}
