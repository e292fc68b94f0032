//! Scopes - name to symbols mappings chained outward
//!
//! Scopes live in the symbol table arena next to the symbols. A scope maps
//! a simple name to every symbol entered under it (methods overload), keeps
//! entry order for deterministic iteration, and links to its enclosing
//! scope. Class and package member scopes have no `next`; member lookup
//! through supertypes is done by resolution, not by chaining.

use std::collections::HashMap;
use std::fmt;

use super::symbol::SymbolId;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    /// Symbol whose declarations this scope holds
    pub owner: SymbolId,
    pub next: Option<ScopeId>,
    by_name: HashMap<String, Vec<SymbolId>>,
    order: Vec<SymbolId>,
}

impl Scope {
    pub fn new(owner: SymbolId, next: Option<ScopeId>) -> Self {
        Self {
            owner,
            next,
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn enter(&mut self, name: &str, sym: SymbolId) {
        self.by_name.entry(name.to_string()).or_default().push(sym);
        self.order.push(sym);
    }

    /// Enter unless the symbol is already present under this name
    pub fn enter_if_absent(&mut self, name: &str, sym: SymbolId) -> bool {
        if self.lookup(name).contains(&sym) {
            return false;
        }
        self.enter(name, sym);
        true
    }

    /// Remove a symbol; returns whether it was present
    pub fn remove(&mut self, name: &str, sym: SymbolId) -> bool {
        let mut found = false;
        if let Some(syms) = self.by_name.get_mut(name) {
            let before = syms.len();
            syms.retain(|s| *s != sym);
            found = syms.len() != before;
            if syms.is_empty() {
                self.by_name.remove(name);
            }
        }
        if found {
            self.order.retain(|s| *s != sym);
        }
        found
    }

    pub fn lookup(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn includes(&self, sym: SymbolId) -> bool {
        self.order.contains(&sym)
    }

    /// Symbols in entry order
    pub fn symbols(&self) -> &[SymbolId] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloads_share_a_name() {
        let mut scope = Scope::new(SymbolId(0), None);
        scope.enter("m", SymbolId(1));
        scope.enter("m", SymbolId(2));
        scope.enter("f", SymbolId(3));
        assert_eq!(scope.lookup("m"), &[SymbolId(1), SymbolId(2)]);
        assert_eq!(scope.symbols(), &[SymbolId(1), SymbolId(2), SymbolId(3)]);
    }

    #[test]
    fn remove_is_inverse_of_enter() {
        let mut scope = Scope::new(SymbolId(0), None);
        scope.enter("A", SymbolId(7));
        assert!(scope.remove("A", SymbolId(7)));
        assert!(scope.lookup("A").is_empty());
        assert!(scope.is_empty());
        assert!(!scope.remove("A", SymbolId(7)));
    }

    #[test]
    fn enter_if_absent_does_not_duplicate() {
        let mut scope = Scope::new(SymbolId(0), None);
        assert!(scope.enter_if_absent("x", SymbolId(4)));
        assert!(!scope.enter_if_absent("x", SymbolId(4)));
        assert_eq!(scope.len(), 1);
    }
}
