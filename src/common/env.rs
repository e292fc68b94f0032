//! Attribution environments
//!
//! An [`Env`] pairs the current position in the tree (class, method,
//! block, lambda) with an [`AttrContext`]. Environments are cheap to clone;
//! `dup` keeps the current scope while `dup_with_scope` installs a new one,
//! so a nested construct never writes into its parent's scope by accident.

use std::cell::Cell;
use std::rc::Rc;

use super::scope::ScopeId;
use super::symbol::SymbolId;
use super::types::Type;
use crate::ast::ImportDecl;
use crate::config::LintCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    TopLevel,
    Class,
    Method,
    Block,
    Lambda,
}

/// What kind of entity a name is expected to denote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelector {
    Value,
    Type,
    Package,
    /// Either a value or a type (qualifiers of selects)
    ValueOrType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Ordinary assignment context
    Check,
    /// Method argument position checked against a candidate signature
    MethodArg,
}

/// Expected result of attributing a tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResultInfo {
    pub kind: KindSelector,
    /// Prototype (expected) type; `Type::None` when unconstrained
    pub pt: Type,
    pub mode: CheckMode,
    /// Boxing allowed (loose method phase or assignment context)
    pub loose: bool,
}

impl ResultInfo {
    pub fn value(pt: Type) -> Self {
        Self {
            kind: KindSelector::Value,
            pt,
            mode: CheckMode::Check,
            loose: true,
        }
    }

    pub fn unknown() -> Self {
        Self::value(Type::None)
    }

    pub fn type_kind() -> Self {
        Self {
            kind: KindSelector::Type,
            pt: Type::None,
            mode: CheckMode::Check,
            loose: true,
        }
    }

    pub fn method_arg(pt: Type, loose: bool) -> Self {
        Self {
            kind: KindSelector::Value,
            pt,
            mode: CheckMode::MethodArg,
            loose,
        }
    }

    pub fn with_pt(&self, pt: Type) -> Self {
        Self { pt, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributionMode {
    #[default]
    Full,
    /// Tentative attribution whose results may be thrown away
    Speculative,
}

/// Lint categories currently suppressed by `@SuppressWarnings`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintState {
    pub suppressed: Vec<LintCategory>,
}

impl LintState {
    pub fn suppress(&self, categories: &[LintCategory]) -> Self {
        let mut suppressed = self.suppressed.clone();
        for c in categories {
            if !suppressed.contains(c) {
                suppressed.push(*c);
            }
        }
        Self { suppressed }
    }

    pub fn is_suppressed(&self, category: LintCategory) -> bool {
        self.suppressed.contains(&category)
    }
}

#[derive(Debug, Clone)]
pub struct AttrContext {
    pub scope: ScopeId,
    /// Number of static contexts between here and the enclosing class
    pub static_level: u32,
    /// Inside the argument list of `this(...)` / `super(...)`
    pub is_self_call: bool,
    pub lint: LintState,
    /// Expected type of `return` expressions
    pub return_result: Option<ResultInfo>,
    /// Expected type of `yield` values in the innermost switch expression
    pub yield_result: Option<ResultInfo>,
    pub mode: AttributionMode,
}

impl AttrContext {
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            static_level: 0,
            is_self_call: false,
            lint: LintState::default(),
            return_result: None,
            yield_result: None,
            mode: AttributionMode::Full,
        }
    }

    pub fn is_speculative(&self) -> bool {
        self.mode == AttributionMode::Speculative
    }
}

/// Per compilation unit data shared by every environment of the unit
#[derive(Debug)]
pub struct Toplevel {
    pub package: SymbolId,
    pub source_file: String,
    /// Single-type imports
    pub named_imports: ScopeId,
    /// Packages and classes imported on demand, `java.lang` first
    pub star_imports: ScopeId,
    pub imports: Vec<ImportDecl>,
    pub imports_resolved: Cell<bool>,
}

#[derive(Debug, Clone)]
pub struct Env {
    pub kind: EnvKind,
    pub toplevel: Rc<Toplevel>,
    pub enclosing_class: Option<SymbolId>,
    pub enclosing_method: Option<SymbolId>,
    pub info: AttrContext,
}

impl Env {
    pub fn toplevel(toplevel: Rc<Toplevel>, scope: ScopeId) -> Self {
        Self {
            kind: EnvKind::TopLevel,
            toplevel,
            enclosing_class: None,
            enclosing_method: None,
            info: AttrContext::new(scope),
        }
    }

    /// Copy sharing the current scope
    pub fn dup(&self, kind: EnvKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Copy with a new current scope
    pub fn dup_with_scope(&self, kind: EnvKind, scope: ScopeId) -> Self {
        let mut env = self.dup(kind);
        env.info.scope = scope;
        env
    }

    pub fn speculative(&self) -> Self {
        let mut env = self.clone();
        env.info.mode = AttributionMode::Speculative;
        env
    }

    pub fn is_static(&self) -> bool {
        self.info.static_level > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toplevel() -> Rc<Toplevel> {
        Rc::new(Toplevel {
            package: SymbolId(0),
            source_file: "A.java".into(),
            named_imports: ScopeId(0),
            star_imports: ScopeId(1),
            imports: Vec::new(),
            imports_resolved: Cell::new(false),
        })
    }

    #[test]
    fn dup_keeps_scope_and_dup_with_scope_replaces_it() {
        let env = Env::toplevel(toplevel(), ScopeId(2));
        let same = env.dup(EnvKind::Block);
        assert_eq!(same.info.scope, ScopeId(2));
        let nested = env.dup_with_scope(EnvKind::Block, ScopeId(3));
        assert_eq!(nested.info.scope, ScopeId(3));
        assert_eq!(env.info.scope, ScopeId(2));
        assert!(Rc::ptr_eq(&env.toplevel, &nested.toplevel));
    }

    #[test]
    fn lint_suppression_accumulates() {
        let lint = LintState::default().suppress(&[LintCategory::Deprecation]);
        let lint = lint.suppress(&[LintCategory::Deprecation, LintCategory::Preview]);
        assert_eq!(lint.suppressed.len(), 2);
        assert!(lint.is_suppressed(LintCategory::Preview));
        assert!(!lint.is_suppressed(LintCategory::Removal));
    }
}
