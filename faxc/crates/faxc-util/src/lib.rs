//! faxc-util - Core Utilities and Foundation Types
//!
//! Fundamental substrate shared by every later compiler phase: string
//! interning (`symbol`), typed index vectors (`index_vec`), source
//! positions (`span`), structured error reporting (`diagnostic`), unique
//! definition identifiers (`def_id`), and the crate's own internal error
//! types (`error`).
//!
//! Identifiers, keywords, and type names repeat constantly across a
//! source file; `Symbol` interns them once so comparisons become integer
//! comparisons instead of string comparisons. `IndexVec<I, T>` keeps the
//! compiler's many index spaces (locals, blocks, type parameters, ...)
//! from being accidentally mixed, since each carries its own `Idx`-typed
//! newtype.

pub mod def_id;
pub mod diagnostic;
pub mod edit_distance;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use edit_distance::{edit_distance, find_closest};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

pub use error::{DiagnosticError, IndexVecError, SourceMapError, SymbolError};

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
