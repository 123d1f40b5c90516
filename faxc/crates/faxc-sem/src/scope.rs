use faxc_util::{Idx, IndexVec, Symbol, DefId, Span};
use crate::hir::LabelId;
use std::collections::HashMap;

/// Rib ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(pub u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single scope (rib)
#[derive(Debug)]
pub struct Rib {
    /// Bindings in this scope
    pub bindings: HashMap<Symbol, DefId>,
    /// Parent rib
    pub parent: Option<RibId>,
    /// Kind of rib
    pub kind: RibKind,
    /// Borrows taken out within this scope. Dropped when the scope closes,
    /// so a borrow never leaks into the parent's view of what's live.
    pub borrows: Vec<Borrow>,
}

/// Whether a borrow permits concurrent readers or demands sole access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowKind {
    Shared,
    Exclusive,
}

/// A single active borrow: which symbol, what kind, and where it was taken.
#[derive(Debug, Clone, Copy)]
pub struct Borrow {
    pub symbol: DefId,
    pub kind: BorrowKind,
    pub span: Span,
}

/// Kind of rib
#[derive(Debug, Clone, Copy)]
pub enum RibKind {
    Module,
    Function,
    Block,
    Loop(Option<LabelId>),
}

/// Scope tree for name resolution
pub struct ScopeTree {
    /// All ribs (scopes)
    pub ribs: IndexVec<RibId, Rib>,
    /// Current rib stack
    pub current_rib: RibId,
}

impl ScopeTree {
    /// Create new scope tree
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib {
            bindings: HashMap::new(),
            parent: None,
            kind: RibKind::Module,
            borrows: Vec::new(),
        });

        Self {
            ribs,
            current_rib: root,
        }
    }

    /// Enter new scope
    pub fn enter_scope(&mut self, kind: RibKind) -> RibId {
        let new_rib = self.ribs.push(Rib {
            bindings: HashMap::new(),
            parent: Some(self.current_rib),
            kind,
            borrows: Vec::new(),
        });
        self.current_rib = new_rib;
        new_rib
    }

    /// Exit current scope. Its borrows are dropped: the parent never sees
    /// them once this returns, enforcing strict stack discipline.
    pub fn exit_scope(&mut self) {
        self.ribs[self.current_rib].borrows.clear();
        if let Some(parent) = self.ribs[self.current_rib].parent {
            self.current_rib = parent;
        }
    }

    /// Add binding to current scope
    pub fn add_binding(&mut self, name: Symbol, def_id: DefId) {
        self.ribs[self.current_rib].bindings.insert(name, def_id);
    }

    /// Resolve name to definition
    pub fn resolve(&self, name: Symbol) -> Option<DefId> {
        let mut rib_id = self.current_rib;

        loop {
            let rib = &self.ribs[rib_id];

            if let Some(&def_id) = rib.bindings.get(&name) {
                return Some(def_id);
            }

            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// Records a new borrow of `symbol` in the current scope. Callers
    /// should check `conflicting_borrow` first; this does not itself
    /// reject conflicts.
    pub fn add_borrow(&mut self, symbol: DefId, kind: BorrowKind, span: Span) {
        self.ribs[self.current_rib].borrows.push(Borrow { symbol, kind, span });
    }

    /// Returns an existing borrow of `symbol` that conflicts with taking a
    /// new borrow of `kind`, if any, searching from the current scope
    /// outward. Two shared borrows never conflict; anything else sharing a
    /// symbol with an exclusive borrow does.
    pub fn conflicting_borrow(&self, symbol: DefId, kind: BorrowKind) -> Option<Borrow> {
        let mut rib_id = self.current_rib;
        loop {
            let rib = &self.ribs[rib_id];
            for borrow in &rib.borrows {
                if borrow.symbol != symbol {
                    continue;
                }
                let conflicts = match (borrow.kind, kind) {
                    (BorrowKind::Shared, BorrowKind::Shared) => false,
                    _ => true,
                };
                if conflicts {
                    return Some(*borrow);
                }
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }
}
