//! Enter phase - class symbols for compilation units
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.Enter` class.
//! Entering creates a symbol for every class declared in a unit (member
//! classes included), enters it into its home scope, builds the class
//! environment and installs a completer. Headers and members are filled in
//! later by [`SemanticAnalyzer::complete`]. Local and anonymous classes are
//! entered on demand while their enclosing body is attributed.

use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use log::{debug, trace};

use super::SemanticAnalyzer;
use crate::ast::{tree_info, ClassDecl, ClassKind, ClassMember, CompilationUnit, Modifier};
use crate::common::diag::DiagKind;
use crate::common::env::{AttrContext, Env, EnvKind, Toplevel};
use crate::common::flags::Flags;
use crate::common::scope::ScopeId;
use crate::common::symbol::{Completer, CompletionState, SymbolId, SymbolKind};
use crate::common::types::Type;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct EnterState {
    /// Classes entered but not completed yet, in entry order
    pub(crate) uncompleted: VecDeque<SymbolId>,
    /// Canonical names the class provider does not know
    pub(crate) missing: HashSet<String>,
    /// Units supplied by the class provider
    pub(crate) library_units: Vec<CompilationUnit>,
}

impl EnterState {
    pub(crate) fn clear(&mut self) {
        self.uncompleted.clear();
        self.missing.clear();
    }
}

/// Position of a class declaration relative to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassOwner {
    Toplevel,
    Member(SymbolId),
    Local,
    Anonymous,
}

impl SemanticAnalyzer {
    /// Enter every class of `units`, then complete all of them.
    ///
    /// Annotation processing is held back until the whole batch is
    /// complete, so annotation values may refer to any class of the batch.
    pub fn enter_units(&mut self, units: &mut [CompilationUnit]) -> Result<()> {
        self.block_annotations();
        let entered = self.enter_and_complete(units);
        let flushed = self.unblock_annotations();
        entered?;
        flushed
    }

    fn enter_and_complete(&mut self, units: &mut [CompilationUnit]) -> Result<()> {
        for unit in units.iter_mut() {
            self.enter_unit(unit, Flags::NONE)?;
        }
        self.complete_uncompleted()
    }

    /// Complete everything entered so far
    pub(crate) fn complete_uncompleted(&mut self) -> Result<()> {
        while let Some(c) = self.enter.uncompleted.pop_front() {
            self.complete(c)?;
        }
        Ok(())
    }

    pub(crate) fn enter_unit(&mut self, unit: &mut CompilationUnit, extra_flags: Flags) -> Result<()> {
        let package = self.symtab.enter_package(unit.package_name());
        let named_imports = self.symtab.new_scope(package, None);
        let star_imports = self.symtab.new_scope(package, None);
        let toplevel_scope = self.symtab.new_scope(package, None);
        let toplevel = Rc::new(Toplevel {
            package,
            source_file: unit.source_file.clone(),
            named_imports,
            star_imports,
            imports: unit.imports.clone(),
            imports_resolved: Cell::new(false),
        });
        let env = Env::toplevel(toplevel, toplevel_scope);
        debug!("ENTER: unit {} (package '{}')", unit.source_file, unit.package_name());

        if let Some(decl) = &unit.package {
            if let Some(first) = decl.annotations.first() {
                if unit.is_package_info() {
                    self.queue_annotations(decl.annotations.clone(), package, env.clone());
                } else {
                    self.log.error(DiagKind::PkgAnnotationsSbInPackageInfo, first.span, vec![]);
                }
            }
        }

        let stem = unit.file_stem().to_string();
        let from_library = extra_flags.contains(Flags::FROM_LIBRARY);
        for class in unit.type_decls.iter_mut() {
            if !from_library && class.modifiers.contains(&Modifier::Public) && class.name != stem {
                self.log
                    .error(DiagKind::ClassPublicShouldBeInFile, class.span, vec![class.name.clone().into()]);
            }
            self.class_enter(class, &env, ClassOwner::Toplevel, extra_flags)?;
        }
        Ok(())
    }

    /// Enter a class declared in a block; completes it right away
    pub(crate) fn enter_local_class(&mut self, tree: &mut ClassDecl, env: &Env) -> Result<SymbolId> {
        let c = self.class_enter(tree, env, ClassOwner::Local, Flags::NONE)?;
        self.complete_uncompleted()?;
        self.flush_annotations()?;
        Ok(c)
    }

    /// Enter the body of `new T(...) { ... }` as a subclass (or
    /// implementation) of `super_type`
    pub(crate) fn enter_anonymous_class(&mut self, tree: &mut ClassDecl, env: &Env, super_type: &Type) -> Result<SymbolId> {
        let c = self.class_enter(tree, env, ClassOwner::Anonymous, Flags::NONE)?;
        let is_interface = self.types().is_interface(super_type);
        let object = self.types().object_type();
        if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
            if is_interface {
                details.supertype = Some(object);
                details.interfaces = vec![super_type.clone()];
            } else {
                details.supertype = Some(super_type.clone());
            }
        }
        self.complete_uncompleted()?;
        self.flush_annotations()?;
        Ok(c)
    }

    fn class_enter(&mut self, tree: &mut ClassDecl, env: &Env, owner: ClassOwner, extra_flags: Flags) -> Result<SymbolId> {
        let mut flags = Modifier::flags_of(&tree.modifiers) | extra_flags;
        let enclosing = env.enclosing_class.unwrap_or(self.symtab.root_package);
        let (owner_sym, flat_name, full_name, home) = match owner {
            ClassOwner::Toplevel => {
                let package = env.toplevel.package;
                let package_name = self.symtab.qualified_name(package);
                let full = if package_name.is_empty() {
                    tree.name.clone()
                } else {
                    format!("{}.{}", package_name, tree.name)
                };
                (package, full.clone(), full, self.symtab.sym(package).members())
            }
            ClassOwner::Member(outer) => {
                let outer_sym = self.symtab.sym(outer);
                let outer_is_interface = outer_sym.is_interface();
                let (outer_flat, outer_full, members) = match outer_sym.class_details() {
                    Some(d) => (d.flat_name.clone(), d.full_name.clone(), d.members),
                    None => return Ok(self.symtab.error_symbol),
                };
                if tree.kind != ClassKind::Class || outer_is_interface {
                    flags |= Flags::STATIC;
                }
                if outer_is_interface {
                    flags |= Flags::PUBLIC;
                }
                (
                    outer,
                    format!("{}${}", outer_flat, tree.name),
                    format!("{}.{}", outer_full, tree.name),
                    Some(members),
                )
            }
            ClassOwner::Local => {
                if tree.kind != ClassKind::Class {
                    flags |= Flags::STATIC;
                }
                let owner = env.enclosing_method.unwrap_or(enclosing);
                (owner, self.local_class_name(enclosing, &tree.name), tree.name.clone(), Some(env.info.scope))
            }
            ClassOwner::Anonymous => {
                flags |= Flags::ANONYMOUS;
                let owner = env.enclosing_method.unwrap_or(enclosing);
                (owner, self.local_class_name(enclosing, ""), String::new(), None)
            }
        };

        if self.is_duplicate_class(owner, &tree.name, &flat_name, home, env) {
            let kind = match owner {
                ClassOwner::Local => DiagKind::AlreadyDefined,
                _ => DiagKind::DuplicateClass,
            };
            let args = match kind {
                DiagKind::AlreadyDefined => vec!["class".into(), tree.name.clone().into()],
                _ => vec![full_name.clone().into()],
            };
            self.log.error(kind, tree.span, args);
            let placeholder = self
                .symtab
                .new_class(owner_sym, &tree.name, flat_name, full_name, tree.kind, flags);
            let sym = self.symtab.sym_mut(placeholder);
            sym.state = CompletionState::Error;
            sym.ty = Type::Error;
            sym.span = tree.span;
            tree.sym = Some(placeholder);
            return Ok(placeholder);
        }

        let c = self
            .symtab
            .new_class(owner_sym, &tree.name, flat_name.clone(), full_name, tree.kind, flags);
        self.symtab.sym_mut(c).span = tree.span;
        if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
            details.source_file = Some(env.toplevel.source_file.clone());
            details.home_scope = home;
        }
        if let Some(home) = home {
            self.symtab.scope_mut(home).enter(&tree.name, c);
        }
        if owner == ClassOwner::Toplevel {
            self.symtab.scope_mut(env.info.scope).enter(&tree.name, c);
        }
        self.symtab.register_class(&flat_name, c);
        tree.sym = Some(c);

        let scope = self.symtab.new_scope(c, Some(env.info.scope));
        let mut tvars = Vec::with_capacity(tree.type_params.len());
        for tp in tree.type_params.iter_mut() {
            let tv = self.symtab.new_type_var(c, &tp.name, Vec::new());
            self.symtab.sym_mut(tv).span = tp.span;
            self.symtab.scope_mut(scope).enter(&tp.name, tv);
            tp.sym = Some(tv);
            tvars.push(Type::TypeVar(tv));
        }
        let tvar_syms: Vec<SymbolId> = tree.type_params.iter().filter_map(|tp| tp.sym).collect();
        if !tvars.is_empty() {
            self.symtab.sym_mut(c).ty = Type::generic(c, tvars);
        }

        let mut info = AttrContext::new(scope);
        info.lint = env.info.lint.clone();
        info.mode = env.info.mode;
        let class_env = Env {
            kind: EnvKind::Class,
            toplevel: env.toplevel.clone(),
            enclosing_class: Some(c),
            enclosing_method: None,
            info,
        };

        let inherited = extra_flags & Flags::FROM_LIBRARY;
        for member in tree.members.iter_mut() {
            if let ClassMember::Class(inner) = member {
                self.class_enter(inner, &class_env, ClassOwner::Member(c), inherited)?;
            }
        }

        if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
            details.type_params = tvar_syms;
            details.env = Some(class_env.clone());
            details.completer = Completer::Source {
                tree: Rc::new(tree.clone()),
                env: class_env,
            };
        }
        self.symtab.sym_mut(c).state = CompletionState::Entered;
        self.enter.uncompleted.push_back(c);
        trace!("ENTER: class {} ({:?})", flat_name, owner);
        Ok(c)
    }

    fn is_duplicate_class(&self, owner: ClassOwner, name: &str, flat_name: &str, home: Option<ScopeId>, env: &Env) -> bool {
        match owner {
            ClassOwner::Toplevel => self
                .symtab
                .class_by_flat_name(flat_name)
                .map(|c| self.symtab.sym(c).state != CompletionState::Unentered)
                .unwrap_or(false),
            ClassOwner::Member(_) => home
                .map(|scope| self.scope_has_class(scope, name))
                .unwrap_or(false),
            ClassOwner::Local => {
                let mut scope = Some(env.info.scope);
                while let Some(s) = scope {
                    let owner = self.symtab.scope(s).owner;
                    if self.symtab.sym(owner).kind == SymbolKind::Class {
                        break;
                    }
                    if self.scope_has_class(s, name) {
                        return true;
                    }
                    scope = self.symtab.scope(s).next;
                }
                false
            }
            ClassOwner::Anonymous => false,
        }
    }

    fn scope_has_class(&self, scope: ScopeId, name: &str) -> bool {
        self.symtab
            .scope(scope)
            .lookup(name)
            .iter()
            .any(|s| self.symtab.sym(*s).kind == SymbolKind::Class)
    }

    /// `Outer$1Local`, `Outer$1` for anonymous classes; the index is the
    /// first one not taken yet
    fn local_class_name(&self, enclosing: SymbolId, name: &str) -> String {
        let base = self.symtab.flat_name(enclosing);
        let mut index = 1;
        loop {
            let candidate = format!("{}${}{}", base, index, name);
            if self.symtab.class_by_flat_name(&candidate).is_none() {
                return candidate;
            }
            index += 1;
        }
    }

    /// Undo the entry of `unit`, or only of `tree` when given.
    ///
    /// Every class declared in the subtree is removed: member classes and
    /// the local and anonymous classes entered while bodies were
    /// attributed. Afterwards no lookup finds any of them.
    pub fn unenter(&mut self, unit: &CompilationUnit, tree: Option<&ClassDecl>) {
        let roots: Vec<&ClassDecl> = match tree {
            Some(tree) => vec![tree],
            None => unit.type_decls.iter().collect(),
        };
        debug!("ENTER: unentering {} class tree(s) of {}", roots.len(), unit.source_file);
        for root in roots {
            for c in tree_info::declared_classes(root) {
                self.unenter_class(c);
            }
        }
    }

    /// Undo the entry of one class and of its member classes: they leave
    /// their home scopes, the class registry and the completion queue
    pub(crate) fn unenter_class(&mut self, c: SymbolId) {
        let sym = self.symtab.sym(c);
        if sym.state == CompletionState::Unentered {
            return;
        }
        let name = sym.name.clone();
        let toplevel = sym
            .owner
            .map(|o| self.symtab.sym(o).kind == SymbolKind::Package)
            .unwrap_or(false);
        let (flat_name, home, members, body_scope) = match sym.class_details() {
            Some(d) => (
                d.flat_name.clone(),
                d.home_scope,
                d.members,
                d.env.as_ref().map(|e| e.info.scope),
            ),
            None => return,
        };
        if let Some(home) = home {
            self.symtab.scope_mut(home).remove(&name, c);
        }
        if toplevel {
            // the unit's toplevel scope encloses the class body scope
            if let Some(unit_scope) = body_scope.and_then(|s| self.symtab.scope(s).next) {
                self.symtab.scope_mut(unit_scope).remove(&name, c);
            }
        }
        self.symtab.unregister_class(&flat_name, c);
        self.enter.uncompleted.retain(|x| *x != c);
        self.symtab.sym_mut(c).state = CompletionState::Unentered;
        trace!("ENTER: unentered {}", flat_name);

        let inner: Vec<SymbolId> = self
            .symtab
            .scope(members)
            .symbols()
            .iter()
            .copied()
            .filter(|m| {
                let m = self.symtab.sym(*m);
                m.kind == SymbolKind::Class && m.owner == Some(c)
            })
            .collect();
        for m in inner {
            self.unenter_class(m);
        }
    }
}
