//! On-demand class supply
//!
//! When name resolution meets a class that is neither predefined nor part
//! of the current batch, the analyzer asks its [`ClassProvider`]. Providers
//! hand back already parsed declarations; the analyzer enters them like
//! source classes. A provider may itself trigger further lookups, and it
//! signals a broken class with [`Error::CompletionFailure`].

use std::collections::HashMap;

use crate::ast::CompilationUnit;
use crate::error::{Error, Result};

pub trait ClassProvider {
    /// Supply the unit declaring the class with this canonical name.
    ///
    /// `Ok(None)` means the class does not exist; `Err` with a completion
    /// failure means it exists but cannot be loaded.
    fn find_class(&mut self, qualified_name: &str) -> Result<Option<CompilationUnit>>;

    /// Whether a package of this name is known to the provider
    fn has_package(&self, _package: &str) -> bool {
        false
    }
}

/// Provider that knows nothing
#[derive(Debug, Default)]
pub struct EmptyClassProvider;

impl ClassProvider for EmptyClassProvider {
    fn find_class(&mut self, _qualified_name: &str) -> Result<Option<CompilationUnit>> {
        Ok(None)
    }
}

/// Provider backed by in-memory units, keyed by canonical class name
#[derive(Debug, Default)]
pub struct MemoryClassProvider {
    units: HashMap<String, CompilationUnit>,
    broken: HashMap<String, String>,
    requests: Vec<String>,
}

impl MemoryClassProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, qualified_name: impl Into<String>, unit: CompilationUnit) {
        self.units.insert(qualified_name.into(), unit);
    }

    /// Make lookups of this class fail with a completion failure
    pub fn add_broken(&mut self, qualified_name: impl Into<String>, reason: impl Into<String>) {
        self.broken.insert(qualified_name.into(), reason.into());
    }

    /// Names requested so far, in order
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl ClassProvider for MemoryClassProvider {
    fn find_class(&mut self, qualified_name: &str) -> Result<Option<CompilationUnit>> {
        self.requests.push(qualified_name.to_string());
        if let Some(reason) = self.broken.get(qualified_name) {
            return Err(Error::completion_failure(qualified_name, reason.clone()));
        }
        Ok(self.units.get(qualified_name).cloned())
    }

    fn has_package(&self, package: &str) -> bool {
        let prefix = format!("{}.", package);
        self.units
            .keys()
            .chain(self.broken.keys())
            .any(|name| name.strip_prefix(&prefix).map(|rest| !rest.contains('.')).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_supplies_and_fails() {
        let mut provider = MemoryClassProvider::new();
        provider.add("p.A", CompilationUnit::new("A.java"));
        provider.add_broken("p.B", "bad class file");
        assert!(provider.find_class("p.A").unwrap().is_some());
        assert!(provider.find_class("p.C").unwrap().is_none());
        assert!(provider.find_class("p.B").unwrap_err().is_completion_failure());
        assert!(provider.has_package("p"));
        assert!(!provider.has_package("q"));
        assert_eq!(provider.requests(), &["p.A", "p.C", "p.B"]);
    }
}
