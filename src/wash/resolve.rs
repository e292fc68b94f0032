//! Resolve - name lookup and overload resolution
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.Resolve`. Simple names
//! are looked up along the scope chain of the current environment: local
//! scopes first, then the members (own and inherited) of each enclosing
//! class, then the compilation unit's imports. Methods are selected in
//! three phases (strict, loose, varargs); the first phase with an
//! applicable candidate wins and the most specific candidate of that phase
//! is chosen.

use std::collections::HashSet;

use log::trace;

use super::infer::{self, Bounds};
use super::SemanticAnalyzer;
use crate::ast::Span;
use crate::common::diag::{DiagArg, DiagKind, Diagnostic};
use crate::common::env::Env;
use crate::common::flags::Flags;
use crate::common::scope::ScopeId;
use crate::common::symbol::{SymbolId, SymbolKind};
use crate::common::types::{MethodType, Type};
use crate::config::LintCategory;
use crate::error::Result;

/// Overload resolution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MethodPhase {
    /// Subtyping only
    Basic,
    /// Boxing and unboxing allowed
    Box,
    /// Variable arity invocation
    Varargs,
}

impl MethodPhase {
    pub(crate) const ALL: [MethodPhase; 3] = [MethodPhase::Basic, MethodPhase::Box, MethodPhase::Varargs];

    pub(crate) fn is_loose(self) -> bool {
        self != MethodPhase::Basic
    }
}

/// A method considered for an invocation, with the type it is a member of
#[derive(Debug, Clone)]
pub(crate) struct MethodCandidate {
    pub sym: SymbolId,
    pub site: Type,
}

/// A candidate found applicable to the actual argument types
#[derive(Debug, Clone)]
pub(crate) struct Applicable {
    pub sym: SymbolId,
    pub site: Type,
    /// Signature as seen from the site, inference variables substituted
    /// where they were solved
    pub mtype: MethodType,
    /// Formal parameter type for each actual argument (varargs expanded)
    pub formals: Vec<Type>,
    pub phase: MethodPhase,
    pub vars: Vec<SymbolId>,
    pub bounds: Bounds,
}

impl Applicable {
    pub(crate) fn is_varargs_call(&self) -> bool {
        self.phase == MethodPhase::Varargs
    }
}

#[derive(Debug, Clone)]
pub(crate) enum MethodResolution {
    Found(Applicable),
    /// No candidate is applicable; the diagnostic is not reported yet
    Inapplicable {
        candidate: Option<SymbolId>,
        site: Type,
        diag: Diagnostic,
    },
    /// Nothing of that name exists; already reported
    NotFound,
}

/// What an unqualified variable name denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VarLookup {
    pub sym: SymbolId,
    /// Class whose member the variable is, when it is a field
    pub owner_class: Option<SymbolId>,
}

impl SemanticAnalyzer {
    // ---- types ----

    /// Find a type (type variable or class) by simple name
    pub(crate) fn find_type(&mut self, env: &Env, name: &str) -> Result<Option<SymbolId>> {
        let mut scope = Some(env.info.scope);
        while let Some(s) = scope {
            let found = self
                .symtab
                .scope(s)
                .lookup(name)
                .iter()
                .copied()
                .find(|sym| matches!(self.symtab.sym(*sym).kind, SymbolKind::Class | SymbolKind::TypeVar));
            if let Some(found) = found {
                return Ok(Some(found));
            }
            if let Some(c) = self.class_of_env_scope(s) {
                if let Some(member) = self.find_member_type(c, name)? {
                    return Ok(Some(member));
                }
            }
            scope = self.symtab.scope(s).next;
        }
        self.ensure_imports(env)?;
        let toplevel = env.toplevel.clone();

        if let Some(found) = self.first_of_kind(toplevel.named_imports, name, SymbolKind::Class) {
            return Ok(Some(found));
        }

        let package = toplevel.package;
        if let Some(found) = self.symtab.sym(package).members().and_then(|m| self.first_of_kind(m, name, SymbolKind::Class)) {
            return Ok(Some(found));
        }
        let package_name = self.symtab.qualified_name(package);
        let qualified = if package_name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package_name, name)
        };
        if let Some(found) = self.load_class(&qualified, Span::default())? {
            return Ok(Some(found));
        }

        let mut found: Vec<SymbolId> = Vec::new();
        let on_demand = self.symtab.scope(toplevel.star_imports).symbols().to_vec();
        for imported in on_demand {
            let candidate = match self.symtab.sym(imported).kind {
                SymbolKind::Package => {
                    let local = self
                        .symtab
                        .sym(imported)
                        .members()
                        .and_then(|m| self.first_of_kind(m, name, SymbolKind::Class));
                    match local {
                        Some(c) => Some(c),
                        None => {
                            let qualified = format!("{}.{}", self.symtab.qualified_name(imported), name);
                            self.load_class(&qualified, Span::default())?
                        }
                    }
                }
                SymbolKind::Class if self.symtab.sym(imported).name == name && self.symtab.sym(imported).is_static() => {
                    Some(imported)
                }
                SymbolKind::Class => self.find_member_type(imported, name)?,
                _ => None,
            };
            if let Some(c) = candidate {
                if !found.contains(&c) {
                    found.push(c);
                }
            }
        }
        if found.len() > 1 {
            self.log.error(
                DiagKind::RefAmbiguous,
                Span::default(),
                vec![name.into(), found[0].into(), found[1].into()],
            );
        }
        Ok(found.first().copied())
    }

    /// Member class `name` of `c` or of one of its supertypes
    pub(crate) fn find_member_type(&mut self, c: SymbolId, name: &str) -> Result<Option<SymbolId>> {
        let mut seen = HashSet::new();
        self.find_member_type_in(c, name, &mut seen)
    }

    fn find_member_type_in(&mut self, c: SymbolId, name: &str, seen: &mut HashSet<SymbolId>) -> Result<Option<SymbolId>> {
        if !seen.insert(c) {
            return Ok(None);
        }
        self.complete(c)?;
        if let Some(found) = self
            .symtab
            .members_named(c, name)
            .into_iter()
            .find(|m| self.symtab.sym(*m).kind == SymbolKind::Class)
        {
            return Ok(Some(found));
        }
        for sup in self.direct_super_classes(c) {
            if let Some(found) = self.find_member_type_in(sup, name, seen)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn direct_super_classes(&self, c: SymbolId) -> Vec<SymbolId> {
        let Some(details) = self.symtab.sym(c).class_details() else {
            return Vec::new();
        };
        details
            .supertype
            .iter()
            .chain(&details.interfaces)
            .filter_map(Type::class_sym)
            .collect()
    }

    /// The class whose body environment uses `scope`, if any
    pub(crate) fn class_of_env_scope(&self, scope: ScopeId) -> Option<SymbolId> {
        let owner = self.symtab.scope(scope).owner;
        let details = self.symtab.sym(owner).class_details()?;
        match &details.env {
            Some(env) if env.info.scope == scope => Some(owner),
            _ => None,
        }
    }

    fn first_of_kind(&self, scope: ScopeId, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        self.symtab
            .scope(scope)
            .lookup(name)
            .iter()
            .copied()
            .find(|s| self.symtab.sym(*s).kind == kind)
    }

    // ---- variables ----

    /// Find a variable by simple name: locals, fields of enclosing
    /// classes, then statically imported fields
    pub(crate) fn find_var(&mut self, env: &Env, name: &str) -> Result<Option<VarLookup>> {
        let mut scope = Some(env.info.scope);
        while let Some(s) = scope {
            if let Some(c) = self.class_of_env_scope(s) {
                let this_type = self.symtab.sym(c).ty.clone();
                if let Some(field) = self.find_field(&this_type, name)? {
                    return Ok(Some(VarLookup {
                        sym: field,
                        owner_class: Some(c),
                    }));
                }
            } else if let Some(local) = self.first_of_kind(s, name, SymbolKind::Var) {
                return Ok(Some(VarLookup {
                    sym: local,
                    owner_class: None,
                }));
            }
            scope = self.symtab.scope(s).next;
        }
        self.ensure_imports(env)?;
        let toplevel = env.toplevel.clone();
        let imported = self.first_of_kind(toplevel.named_imports, name, SymbolKind::Var).or_else(|| {
            self.symtab
                .scope(toplevel.star_imports)
                .symbols()
                .iter()
                .copied()
                .find(|s| self.symtab.sym(*s).kind == SymbolKind::Var && self.symtab.sym(*s).name == name)
        });
        Ok(imported.map(|sym| VarLookup { sym, owner_class: None }))
    }

    /// Field `name` of `site`'s class or one of its supertypes
    pub(crate) fn find_field(&mut self, site: &Type, name: &str) -> Result<Option<SymbolId>> {
        let start = match site {
            Type::Class(ct) => ct.sym,
            Type::TypeVar(_) => match self.types().upper_bound(site).class_sym() {
                Some(c) => c,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        let mut seen = HashSet::new();
        let mut queue = vec![start];
        while let Some(c) = queue.pop() {
            if !seen.insert(c) {
                continue;
            }
            self.complete(c)?;
            if let Some(field) = self
                .symtab
                .members_named(c, name)
                .into_iter()
                .find(|m| self.symtab.sym(*m).kind == SymbolKind::Var)
            {
                return Ok(Some(field));
            }
            let supers = self.direct_super_classes(c);
            queue.extend(supers.into_iter().rev());
        }
        Ok(None)
    }

    /// Whether instance members of `c` are out of reach from `env`
    pub(crate) fn is_static_context_for(&self, env: &Env, c: SymbolId) -> bool {
        let mut is_static = env.is_static();
        let mut current = env.enclosing_class;
        while let Some(k) = current {
            if k == c {
                return is_static;
            }
            let sym = self.symtab.sym(k);
            let owner = sym.owner;
            is_static = sym.is_static()
                || owner
                    .map(|o| {
                        let owner_sym = self.symtab.sym(o);
                        owner_sym.is_method() && owner_sym.is_static()
                    })
                    .unwrap_or(false);
            current = owner.and_then(|o| self.symtab.enclosing_class(o));
        }
        is_static
    }

    // ---- methods ----

    /// Methods named `name` that are members of `site`, overridden ones
    /// left out
    pub(crate) fn find_methods(&mut self, site: &Type, name: &str) -> Result<Vec<MethodCandidate>> {
        let start = match site {
            Type::Class(ct) => ct.sym,
            Type::Array(_) => self.symtab.predef.object,
            Type::TypeVar(_) => match self.types().upper_bound(site).class_sym() {
                Some(c) => c,
                None => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };
        let mut found: Vec<SymbolId> = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = std::collections::VecDeque::from([start]);
        if self.symtab.sym(start).is_interface() {
            queue.push_back(self.symtab.predef.object);
        }
        while let Some(c) = queue.pop_front() {
            if !seen.insert(c) {
                continue;
            }
            self.complete(c)?;
            for m in self.symtab.members_named(c, name) {
                if self.symtab.sym(m).kind != SymbolKind::Method {
                    continue;
                }
                let overridden = found.iter().any(|f| self.types().same_erased_params(*f, m));
                if !overridden {
                    found.push(m);
                }
            }
            queue.extend(self.direct_super_classes(c));
        }
        let site = match site {
            Type::Array(_) => self.types().object_type(),
            other => other.clone(),
        };
        Ok(found
            .into_iter()
            .map(|sym| MethodCandidate { sym, site: site.clone() })
            .collect())
    }

    /// Candidates for an unqualified invocation: the innermost enclosing
    /// class declaring (or inheriting) the name, then static imports.
    /// Returns the class the candidates were found in.
    pub(crate) fn find_unqualified_methods(
        &mut self,
        env: &Env,
        name: &str,
    ) -> Result<(Vec<MethodCandidate>, Option<SymbolId>)> {
        let mut current = env.enclosing_class;
        while let Some(c) = current {
            let this_type = self.symtab.sym(c).ty.clone();
            let found = self.find_methods(&this_type, name)?;
            if !found.is_empty() {
                return Ok((found, Some(c)));
            }
            current = self.symtab.sym(c).owner.and_then(|o| self.symtab.enclosing_class(o));
        }
        self.ensure_imports(env)?;
        let toplevel = env.toplevel.clone();
        let mut imported: Vec<SymbolId> = self
            .symtab
            .scope(toplevel.named_imports)
            .lookup(name)
            .iter()
            .copied()
            .filter(|m| self.symtab.sym(*m).is_method())
            .collect();
        if imported.is_empty() {
            imported = self
                .symtab
                .scope(toplevel.star_imports)
                .symbols()
                .iter()
                .copied()
                .filter(|m| self.symtab.sym(*m).is_method() && self.symtab.sym(*m).name == name)
                .collect();
        }
        let candidates = imported
            .into_iter()
            .map(|sym| {
                let owner = self.symtab.sym(sym).owner.unwrap_or(self.symtab.predef.object);
                MethodCandidate {
                    sym,
                    site: self.symtab.sym(owner).ty.clone(),
                }
            })
            .collect();
        Ok((candidates, None))
    }

    pub(crate) fn find_constructors(&mut self, site: &Type) -> Result<Vec<MethodCandidate>> {
        let Some(c) = site.class_sym() else {
            return Ok(Vec::new());
        };
        self.complete(c)?;
        Ok(self
            .symtab
            .members_named(c, "<init>")
            .into_iter()
            .map(|sym| MethodCandidate { sym, site: site.clone() })
            .collect())
    }

    /// Select the method to invoke among `candidates`.
    ///
    /// `extra_vars` are inference variables already present in the
    /// candidates' site (the class type parameters of a diamond).
    /// Inapplicability is returned, not reported.
    pub(crate) fn select_method(
        &mut self,
        env: &Env,
        candidates: &[MethodCandidate],
        name: &str,
        argtypes: &[Type],
        extra_vars: &[SymbolId],
        span: Span,
    ) -> Result<MethodResolution> {
        let mut last_failure: Vec<Option<Diagnostic>> = vec![None; candidates.len()];
        for phase in MethodPhase::ALL {
            let mut applicable = Vec::new();
            for (i, cand) in candidates.iter().enumerate() {
                match self.check_applicable(env, cand, argtypes, extra_vars, phase)? {
                    Ok(app) => applicable.push(app),
                    // a fixed arity candidate keeps its loose phase failure
                    Err(reason) => {
                        if phase != MethodPhase::Varargs || self.symtab.sym(cand.sym).flags.contains(Flags::VARARGS) {
                            last_failure[i] = Some(reason);
                        }
                    }
                }
            }
            if !applicable.is_empty() {
                trace!("ATTR: {} applicable candidate(s) for {} in phase {:?}", applicable.len(), name, phase);
                return Ok(MethodResolution::Found(self.most_specific(applicable, name, span)));
            }
        }

        let kind = if name == "<init>" { "constructor" } else { "method" };
        if candidates.len() == 1 {
            let cand = &candidates[0];
            let reason = last_failure[0]
                .take()
                .unwrap_or_else(|| Diagnostic::fragment(DiagKind::ArgLengthMismatch, vec![]));
            let diag = Diagnostic::error(
                DiagKind::CantApplySymbol,
                span,
                vec![
                    kind.into(),
                    name.into(),
                    cand.sym.into(),
                    self.argtypes_arg(argtypes),
                    DiagArg::Fragment(Box::new(reason)),
                ],
            );
            return Ok(MethodResolution::Inapplicable {
                candidate: Some(cand.sym),
                site: cand.site.clone(),
                diag,
            });
        }
        let mut args = vec![kind.into(), name.into(), self.argtypes_arg(argtypes)];
        args.extend(
            last_failure
                .into_iter()
                .flatten()
                .map(|reason| DiagArg::Fragment(Box::new(reason))),
        );
        let site = candidates.first().map(|c| c.site.clone()).unwrap_or_default();
        Ok(MethodResolution::Inapplicable {
            candidate: None,
            site,
            diag: Diagnostic::error(DiagKind::CantApplySymbols, span, args),
        })
    }

    fn argtypes_arg(&self, argtypes: &[Type]) -> DiagArg {
        let types = self.types();
        let shown: Vec<String> = argtypes
            .iter()
            .map(|t| match t {
                Type::Deferred(_) => "<poly>".to_string(),
                other => types.to_string(other),
            })
            .collect();
        DiagArg::Name(shown.join(","))
    }

    /// Check one candidate in one phase; the error is the fragment
    /// explaining why it is not applicable
    pub(crate) fn check_applicable(
        &mut self,
        env: &Env,
        cand: &MethodCandidate,
        argtypes: &[Type],
        extra_vars: &[SymbolId],
        phase: MethodPhase,
    ) -> Result<std::result::Result<Applicable, Diagnostic>> {
        let declared = self.types().member_type(&cand.site, cand.sym);
        let Some(mt) = declared.method_type().cloned() else {
            return Ok(Err(Diagnostic::fragment(DiagKind::ArgLengthMismatch, vec![])));
        };
        let own_vars = mt.tvars.clone();
        let mt = infer::instantiate(&self.types(), &mt, &own_vars);
        let mut vars = own_vars;
        vars.extend_from_slice(extra_vars);

        let is_varargs = self.symtab.sym(cand.sym).flags.contains(Flags::VARARGS);
        let formals: Vec<Type> = match phase {
            MethodPhase::Varargs => {
                let n = mt.params.len();
                if !is_varargs || n == 0 || argtypes.len() + 1 < n {
                    return Ok(Err(Diagnostic::fragment(DiagKind::ArgLengthMismatch, vec![])));
                }
                let elem = self.types().elem_type(&mt.params[n - 1]).unwrap_or(Type::Error);
                let mut formals = mt.params[..n - 1].to_vec();
                formals.resize(argtypes.len(), elem);
                formals
            }
            _ => {
                if argtypes.len() != mt.params.len() {
                    return Ok(Err(Diagnostic::fragment(DiagKind::ArgLengthMismatch, vec![])));
                }
                mt.params.clone()
            }
        };
        let loose = phase.is_loose();

        let mut bounds = Bounds::new();
        {
            let types = self.types();
            for (actual, formal) in argtypes.iter().zip(&formals) {
                if actual.is_deferred() {
                    continue;
                }
                let actual = match actual {
                    Type::Partial(p) => (*p.mtype.ret).clone(),
                    other => other.clone(),
                };
                if !types.is_convertible(&actual, formal, loose) && !actual.has_undet() {
                    return Ok(Err(Diagnostic::fragment(
                        DiagKind::NoConformAssignExists,
                        vec![actual.into(), formal.clone().into()],
                    )));
                }
                infer::collect_bounds(&types, &actual, formal, &mut bounds);
            }
        }
        for (actual, formal) in argtypes.iter().zip(&formals) {
            let Type::Deferred(id) = actual else { continue };
            let target = {
                let types = self.types();
                let solution = infer::solve(&types, &vars, &bounds);
                infer::apply(&types, formal, &vars, &solution)
            };
            let result = self.check_deferred(env, *id, &target, loose)?;
            if !result.ok {
                let reason = result.diag.unwrap_or_else(|| {
                    Diagnostic::fragment(DiagKind::NoConformAssignExists, vec![actual.clone().into(), target.clone().into()])
                });
                return Ok(Err(reason));
            }
            bounds.extend(result.bounds);
        }

        let types = self.types();
        let solution = infer::solve(&types, &vars, &bounds);
        let mtype = match infer::apply(&types, &Type::Method(mt.clone()), &vars, &solution) {
            Type::Method(m) => m,
            _ => mt,
        };
        let formals = formals
            .iter()
            .map(|f| infer::apply(&types, f, &vars, &solution))
            .collect();
        Ok(Ok(Applicable {
            sym: cand.sym,
            site: cand.site.clone(),
            mtype,
            formals,
            phase,
            vars,
            bounds,
        }))
    }

    fn most_specific(&mut self, mut applicable: Vec<Applicable>, name: &str, span: Span) -> Applicable {
        if applicable.len() == 1 {
            return applicable.remove(0);
        }
        let maximal: Vec<usize> = (0..applicable.len())
            .filter(|&i| {
                (0..applicable.len()).all(|j| i == j || self.is_more_specific(&applicable[i], &applicable[j]))
            })
            .collect();
        let chosen = match maximal.as_slice() {
            [only] => *only,
            _ => {
                // same signature inherited twice: prefer a concrete method
                let same_signature = (1..applicable.len())
                    .all(|j| self.types().same_erased_params(applicable[0].sym, applicable[j].sym));
                if same_signature {
                    applicable
                        .iter()
                        .position(|a| !self.symtab.sym(a.sym).flags.contains(Flags::ABSTRACT))
                        .unwrap_or(0)
                } else {
                    let first = applicable[0].sym;
                    let second = applicable[1].sym;
                    self.log
                        .error(DiagKind::RefAmbiguous, span, vec![name.into(), first.into(), second.into()]);
                    0
                }
            }
        };
        applicable.swap_remove(chosen)
    }

    fn is_more_specific(&self, a: &Applicable, b: &Applicable) -> bool {
        let types = self.types();
        let (Some(ma), Some(mb)) = (self.symtab.sym(a.sym).ty.method_type(), self.symtab.sym(b.sym).ty.method_type())
        else {
            return false;
        };
        let n = a.formals.len().max(ma.params.len());
        (0..n).all(|i| {
            let pa = declared_param(&types, ma, i, a.is_varargs_call());
            let pb = declared_param(&types, mb, i, b.is_varargs_call());
            match (pa, pb) {
                (Some(pa), Some(pb)) => types.is_subtype(&types.erasure(&pa), &types.erasure(&pb)),
                (None, None) => true,
                _ => false,
            }
        })
    }

    // ---- lint ----

    /// Warn about uses of deprecated and preview APIs
    pub(crate) fn check_use(&mut self, env: &Env, sym: SymbolId, span: Span) {
        if env.info.is_speculative() {
            return;
        }
        let flags = self.symtab.sym(sym).flags;
        let same_outermost = match (self.symtab.outermost_class(sym), env.enclosing_class) {
            (Some(a), Some(c)) => self.symtab.outermost_class(c) == Some(a),
            _ => false,
        };
        if same_outermost {
            return;
        }
        let owner = self.symtab.sym(sym).owner.unwrap_or(self.symtab.root_package);
        if flags.contains(Flags::DEPRECATED_REMOVAL) {
            if self.config.is_lint_enabled(LintCategory::Removal) && !env.info.lint.is_suppressed(LintCategory::Removal) {
                self.log
                    .warning(DiagKind::HasBeenDeprecatedForRemoval, span, vec![sym.into(), owner.into()]);
            }
        } else if flags.contains(Flags::DEPRECATED)
            && self.config.is_lint_enabled(LintCategory::Deprecation)
            && !env.info.lint.is_suppressed(LintCategory::Deprecation)
        {
            self.log.warning(DiagKind::HasBeenDeprecated, span, vec![sym.into(), owner.into()]);
        }
        if flags.contains(Flags::PREVIEW_API) {
            if !self.config.preview_enabled {
                self.log.error(DiagKind::IsPreview, span, vec![sym.into()]);
            } else if self.config.is_lint_enabled(LintCategory::Preview) && !env.info.lint.is_suppressed(LintCategory::Preview) {
                self.log.warning(DiagKind::IsPreview, span, vec![sym.into()]);
            }
        } else if flags.contains(Flags::PREVIEW_REFLECTIVE) && !env.info.lint.is_suppressed(LintCategory::Preview) {
            self.log.warning(DiagKind::IsPreviewReflective, span, vec![sym.into()]);
        }
    }
}

/// Declared parameter `i`, with the varargs element type past the last
/// fixed parameter of a variable arity call
fn declared_param(types: &crate::common::types::Types, mt: &MethodType, i: usize, varargs_call: bool) -> Option<Type> {
    let n = mt.params.len();
    if varargs_call && n > 0 && i + 1 >= n {
        return types.elem_type(&mt.params[n - 1]);
    }
    mt.params.get(i).cloned()
}
