//! Common definitions shared by the analysis phases
//!
//! Symbols, scopes and types live in the [`symtab::Symtab`] arena; the
//! phases in [`crate::wash`] refer to them by handle.

pub mod attribute;
pub mod class_provider;
pub mod const_fold;
pub mod diag;
pub mod env;
pub mod flags;
pub mod opcodes;
pub mod scope;
pub mod symbol;
pub mod symtab;
pub mod types;

pub use attribute::{AttrValue, Compound, TypeCompound};
pub use class_provider::{ClassProvider, MemoryClassProvider};
pub use diag::{DiagArg, DiagKind, Diagnostic, DiagnosticSink, Log, Severity};
pub use env::{Env, EnvKind, ResultInfo};
pub use flags::Flags;
pub use scope::{Scope, ScopeId};
pub use symbol::{CompletionState, Symbol, SymbolId, SymbolKind};
pub use symtab::Symtab;
pub use types::{Type, TypeTag, Types};
