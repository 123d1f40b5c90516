//! Trait implementation environment (C2).
//!
//! A map from trait name to the set of type-string keys known to
//! implement it. Populated during the declaration pass; read-only once
//! body-checking begins.

use crate::types::Type;
use std::collections::{HashMap, HashSet};

/// Stringifies a type into a stable key for the environment. Two types
/// that are structurally equal (by [`Type`]'s own `PartialEq`) produce
/// the same key; this is coarser than full equality but sufficient for
/// trait-membership lookups, which only care about nominal identity.
pub fn type_key(ty: &Type) -> String {
    format!("{:?}", ty)
}

#[derive(Debug, Default)]
pub struct Env {
    impls: HashMap<String, HashSet<String>>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `ty` implements `trait_name`. Append-only: called
    /// only from the declaration pass.
    pub fn register_impl(&mut self, trait_name: &str, ty: &Type) {
        self.impls
            .entry(trait_name.to_string())
            .or_default()
            .insert(type_key(ty));
    }

    /// Does `ty` satisfy `trait_name`? The `any` wildcard and primitives
    /// with no declared impls never satisfy a trait bound implicitly;
    /// membership must have been registered during declaration.
    pub fn satisfies(&self, ty: &Type, trait_name: &str) -> bool {
        self.impls
            .get(trait_name)
            .map(|set| set.contains(&type_key(ty)))
            .unwrap_or(false)
    }

    /// Does `ty` satisfy every bound in `bounds`? Bounds that aren't
    /// `Type::Trait`/`Type::Named` resolving to a trait are treated as
    /// unsatisfiable here; the resolver (C4) is responsible for
    /// rejecting non-trait bounds before they reach this check.
    pub fn satisfies_all(&self, ty: &Type, bounds: &[(String, Type)]) -> bool {
        bounds.iter().all(|(name, _)| self.satisfies(ty, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    #[test]
    fn registers_and_satisfies() {
        let mut env = Env::new();
        let ty = Type::Primitive(PrimitiveKind::Int);
        env.register_impl("Ord", &ty);
        assert!(env.satisfies(&ty, "Ord"));
        assert!(!env.satisfies(&ty, "Display"));
    }

    #[test]
    fn distinct_types_do_not_cross_satisfy() {
        let mut env = Env::new();
        env.register_impl("Ord", &Type::Primitive(PrimitiveKind::Int));
        assert!(!env.satisfies(&Type::Primitive(PrimitiveKind::Bool), "Ord"));
    }

    #[test]
    fn append_only_accumulates_multiple_types() {
        let mut env = Env::new();
        env.register_impl("Ord", &Type::Primitive(PrimitiveKind::Int));
        env.register_impl("Ord", &Type::Primitive(PrimitiveKind::Float));
        assert!(env.satisfies(&Type::Primitive(PrimitiveKind::Int), "Ord"));
        assert!(env.satisfies(&Type::Primitive(PrimitiveKind::Float), "Ord"));
    }
}
