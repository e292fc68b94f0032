//! MemberEnter - class headers, member symbols and imports
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.TypeEnter` and
//! `MemberEnter`. Completing a class resolves its imports (once per
//! unit), the bounds of its type parameters and its supertypes, then
//! enters a symbol for every field, method, enum constant and record
//! component, and finally synthesizes the implicit members: default
//! constructors, `values()`/`valueOf()` and record accessors.

use std::rc::Rc;

use log::{debug, trace, warn};

use super::SemanticAnalyzer;
use crate::ast::{ClassDecl, ClassKind, ClassMember, CompilationUnit, MethodDecl, Modifier, Span, TypeExpr, VarDecl};
use crate::common::diag::DiagKind;
use crate::common::env::{Env, EnvKind};
use crate::common::flags::Flags;
use crate::common::symbol::{Completer, CompletionState, ConstValue, SymbolDetails, SymbolId, SymbolKind};
use crate::common::types::{MethodType, Type};
use crate::error::Result;

impl SemanticAnalyzer {
    /// Complete an entered class; a no-op in any other state
    pub(crate) fn complete(&mut self, c: SymbolId) -> Result<()> {
        if self.symtab.sym(c).state != CompletionState::Entered {
            return Ok(());
        }
        let completer = self
            .symtab
            .sym_mut(c)
            .class_details_mut()
            .map(|d| std::mem::take(&mut d.completer));
        let Some(Completer::Source { tree, env }) = completer else {
            self.symtab.sym_mut(c).state = CompletionState::Complete;
            return Ok(());
        };
        debug!("ENTER: completing {}", self.symtab.flat_name(c));
        self.symtab.sym_mut(c).state = CompletionState::Completing;
        self.ensure_imports(&env)?;
        self.complete_header(c, &tree, &env)?;
        // members see a complete header; the class no longer counts as
        // being on the inheritance path
        self.symtab.sym_mut(c).state = CompletionState::Complete;
        self.enter_members(c, &tree, &env)?;
        self.add_implicit_members(c, &tree)?;

        if !tree.annotations.is_empty() {
            self.queue_annotations(tree.annotations.clone(), c, env.clone());
            if tree.kind == ClassKind::Interface {
                self.queue_functional_check(c, tree.span);
            }
        }
        self.queue_type_annotations(c, tree, env);
        Ok(())
    }

    fn complete_header(&mut self, c: SymbolId, tree: &ClassDecl, env: &Env) -> Result<()> {
        for tp in &tree.type_params {
            let Some(tv) = tp.sym else { continue };
            let mut bounds = Vec::with_capacity(tp.bounds.len());
            for bound in &tp.bounds {
                bounds.push(self.attrib_type(bound, env)?);
            }
            self.symtab.sym_mut(tv).details = SymbolDetails::TypeVar { bounds };
        }

        if self.symtab.sym(c).flags.contains(Flags::ANONYMOUS) {
            return Ok(());
        }

        let mut supertype = None;
        let mut interfaces = Vec::new();
        match tree.kind {
            ClassKind::Class => {
                if let Some(ext) = &tree.extends {
                    supertype = self.attrib_super(c, ext, env)?;
                }
                for imp in &tree.implements {
                    interfaces.extend(self.attrib_super(c, imp, env)?);
                }
            }
            ClassKind::Interface => {
                for ext in tree.extends.iter().chain(&tree.implements) {
                    interfaces.extend(self.attrib_super(c, ext, env)?);
                }
            }
            ClassKind::Enum => {
                supertype = Some(Type::generic(self.symtab.predef.enum_, vec![Type::class(c)]));
                for imp in &tree.implements {
                    interfaces.extend(self.attrib_super(c, imp, env)?);
                }
            }
            ClassKind::Record => {
                supertype = Some(Type::class(self.symtab.predef.record));
                for imp in &tree.implements {
                    interfaces.extend(self.attrib_super(c, imp, env)?);
                }
            }
            ClassKind::Annotation => {
                interfaces.push(Type::class(self.symtab.predef.annotation));
            }
        }
        if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
            details.supertype = supertype;
            details.interfaces = interfaces;
        }
        Ok(())
    }

    /// Resolve one supertype; a class already on the completion path
    /// closes an inheritance cycle
    fn attrib_super(&mut self, c: SymbolId, tree: &TypeExpr, env: &Env) -> Result<Option<Type>> {
        let t = self.attrib_type(tree, env)?;
        if self.types().is_erroneous(&t) {
            return Ok(None);
        }
        let Some(sup) = t.class_sym() else {
            self.log
                .error(DiagKind::UnexpectedType, tree.span, vec!["class".into(), t.clone().into()]);
            return Ok(None);
        };
        self.complete(sup)?;
        let sup_sym = self.symtab.sym(sup);
        if sup == c || sup_sym.state == CompletionState::Completing || sup_sym.flags.contains(Flags::CYCLIC) {
            self.log.error(DiagKind::CyclicInheritance, tree.span, vec![c.into()]);
            self.symtab.sym_mut(c).flags.insert(Flags::CYCLIC);
            warn!("ENTER: cyclic inheritance involving {}", self.symtab.flat_name(c));
            return Ok(None);
        }
        Ok(Some(t))
    }

    fn enter_members(&mut self, c: SymbolId, tree: &ClassDecl, env: &Env) -> Result<()> {
        let class_flags = self.symtab.sym(c).flags;
        let in_interface = class_flags.contains(Flags::INTERFACE);

        for component in &tree.record_components {
            let ty = self.attrib_var_type(component, env)?;
            let field = self.symtab.new_var(c, &component.name, Flags::PRIVATE | Flags::FINAL, ty);
            self.symtab.sym_mut(field).span = component.span;
            self.enter_member(c, field, component.span);
            if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
                details.record_components.push(field);
            }
            if !component.annotations.is_empty() {
                self.queue_annotations(component.annotations.clone(), field, env.clone());
            }
        }

        for member in &tree.members {
            match member {
                ClassMember::Field(var) => {
                    let mut flags = Modifier::flags_of(&var.modifiers);
                    if in_interface {
                        flags |= Flags::PUBLIC | Flags::STATIC | Flags::FINAL;
                    }
                    self.enter_field(c, var, flags, env)?;
                }
                ClassMember::Method(method) => {
                    self.enter_method(c, method, env)?;
                }
                ClassMember::EnumConstant(constant) => {
                    let flags = Flags::PUBLIC | Flags::STATIC | Flags::FINAL | Flags::ENUM;
                    let var = self.symtab.new_var(c, &constant.name, flags, Type::class(c));
                    self.symtab.sym_mut(var).span = constant.span;
                    if self.check_unique_member(c, var, constant.span) {
                        self.enter_member(c, var, constant.span);
                    }
                    if !constant.annotations.is_empty() {
                        self.queue_annotations(constant.annotations.clone(), var, env.clone());
                    }
                }
                ClassMember::Class(_) | ClassMember::Initializer(_) => {}
            }
        }
        Ok(())
    }

    fn enter_field(&mut self, c: SymbolId, var: &VarDecl, mut flags: Flags, env: &Env) -> Result<()> {
        let ty = self.attrib_var_type(var, env)?;
        if var.init.is_some() {
            flags |= Flags::HAS_INIT;
        }
        let v = self.symtab.new_var(c, &var.name, flags, ty.clone());
        self.symtab.sym_mut(v).span = var.span;
        if let Some(init) = &var.init {
            let constant_type = ty.is_primitive() || self.types().is_string(&ty);
            if flags.contains(Flags::FINAL) && constant_type {
                let mut field_env = env.dup(EnvKind::Block);
                if flags.contains(Flags::STATIC) {
                    field_env.info.static_level += 1;
                }
                self.symtab.sym_mut(v).details = SymbolDetails::Var {
                    const_value: ConstValue::Pending {
                        init: Rc::new(init.clone()),
                        env: field_env,
                    },
                };
            }
        }
        if self.check_unique_member(c, v, var.span) {
            self.enter_member(c, v, var.span);
        }
        if !var.annotations.is_empty() {
            self.queue_annotations(var.annotations.clone(), v, env.clone());
        }
        Ok(())
    }

    fn enter_method(&mut self, c: SymbolId, tree: &MethodDecl, env: &Env) -> Result<()> {
        let class_sym = self.symtab.sym(c);
        let in_interface = class_sym.is_interface();
        let in_annotation = class_sym.is_annotation_type();
        let mut flags = Modifier::flags_of(&tree.modifiers);
        if in_annotation {
            flags |= Flags::PUBLIC | Flags::ABSTRACT;
        } else if in_interface {
            if !flags.contains(Flags::PRIVATE) {
                flags |= Flags::PUBLIC;
            }
            if tree.body.is_none() && !flags.intersects(Flags::STATIC | Flags::PRIVATE) {
                flags |= Flags::ABSTRACT;
            } else if tree.body.is_some() && !flags.intersects(Flags::STATIC | Flags::PRIVATE) {
                flags |= Flags::DEFAULT;
            }
        }
        if tree.params.last().map(|p| p.is_varargs).unwrap_or(false) {
            flags |= Flags::VARARGS;
        }
        if tree.default_value.is_some() {
            flags |= Flags::HAS_INIT;
        }

        let m = self
            .symtab
            .new_method(c, &tree.name, flags, MethodType::new(Vec::new(), Type::Void));
        self.symtab.sym_mut(m).span = tree.span;
        let scope = self.symtab.new_scope(m, Some(env.info.scope));
        let mut method_env = env.dup_with_scope(EnvKind::Method, scope);
        method_env.enclosing_method = Some(m);

        let mut tvars = Vec::with_capacity(tree.type_params.len());
        for tp in &tree.type_params {
            let tv = self.symtab.new_type_var(m, &tp.name, Vec::new());
            self.symtab.sym_mut(tv).span = tp.span;
            self.symtab.scope_mut(scope).enter(&tp.name, tv);
            self.index_decl(c, tp.span.pos(), tv);
            tvars.push(tv);
        }
        for (tp, &tv) in tree.type_params.iter().zip(&tvars) {
            let mut bounds = Vec::with_capacity(tp.bounds.len());
            for bound in &tp.bounds {
                bounds.push(self.attrib_type(bound, &method_env)?);
            }
            self.symtab.sym_mut(tv).details = SymbolDetails::TypeVar { bounds };
        }

        let mut params = Vec::with_capacity(tree.params.len());
        let mut param_types = Vec::with_capacity(tree.params.len());
        for param in &tree.params {
            let mut ty = self.attrib_var_type(param, &method_env)?;
            if param.is_varargs {
                ty = Type::array_of(ty);
            }
            let flags = Modifier::flags_of(&param.modifiers) | Flags::PARAMETER;
            let p = self.symtab.new_var(m, &param.name, flags, ty.clone());
            self.symtab.sym_mut(p).span = param.span;
            self.index_decl(c, param.span.pos(), p);
            if !param.annotations.is_empty() {
                self.queue_annotations(param.annotations.clone(), p, method_env.clone());
            }
            params.push(p);
            param_types.push(ty);
        }
        let ret = match &tree.return_type {
            Some(rt) => self.attrib_type(rt, &method_env)?,
            None => Type::Void,
        };
        let mut thrown = Vec::with_capacity(tree.throws.len());
        for t in &tree.throws {
            thrown.push(self.attrib_type(t, &method_env)?);
        }

        let sym = self.symtab.sym_mut(m);
        sym.ty = Type::Method(MethodType {
            params: param_types,
            ret: Box::new(ret),
            thrown,
            tvars: tvars.clone(),
        });
        if let Some(details) = sym.method_details_mut() {
            details.params = params;
            details.type_params = tvars;
        }

        if self.check_unique_member(c, m, tree.span) {
            self.enter_member(c, m, tree.span);
        }
        if !tree.annotations.is_empty() {
            self.queue_annotations(tree.annotations.clone(), m, method_env.clone());
        }
        if let Some(value) = &tree.default_value {
            self.queue_element_default(m, value.clone(), method_env);
        }
        trace!("ENTER: method {}.{}", self.symtab.sym(c).name, tree.name);
        Ok(())
    }

    fn attrib_var_type(&mut self, var: &VarDecl, env: &Env) -> Result<Type> {
        match &var.var_type {
            Some(t) => self.attrib_type(t, env),
            None => Ok(Type::Error),
        }
    }

    fn enter_member(&mut self, c: SymbolId, member: SymbolId, span: Span) {
        if let Some(members) = self.symtab.sym(c).members() {
            self.symtab.enter(members, member);
        }
        self.index_decl(c, span.pos(), member);
    }

    pub(crate) fn index_decl(&mut self, c: SymbolId, pos: usize, member: SymbolId) {
        if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
            details.decl_index.insert(pos, member);
        }
    }

    /// Report a member clashing with one already entered; variables clash
    /// by name, methods by name and erased parameter types
    fn check_unique_member(&mut self, c: SymbolId, member: SymbolId, span: Span) -> bool {
        let name = self.symtab.sym(member).name.clone();
        let kind = self.symtab.sym(member).kind;
        let clash = self.symtab.members_named(c, &name).into_iter().any(|other| {
            let other_kind = self.symtab.sym(other).kind;
            other_kind == kind && (kind != SymbolKind::Method || self.types().same_erased_params(other, member))
        });
        if clash {
            let what = match kind {
                SymbolKind::Method if name == "<init>" => "constructor",
                SymbolKind::Method => "method",
                _ => "variable",
            };
            self.log.error(DiagKind::AlreadyDefined, span, vec![what.into(), name.into(), c.into()]);
            return false;
        }
        true
    }

    fn has_method(&self, c: SymbolId, name: &str, params: &[Type]) -> bool {
        let types = self.types();
        self.symtab.members_named(c, name).into_iter().any(|m| {
            self.symtab
                .sym(m)
                .ty
                .method_type()
                .map(|mt| {
                    mt.params.len() == params.len()
                        && mt.params.iter().zip(params).all(|(p, q)| types.erasure(p) == types.erasure(q))
                })
                .unwrap_or(false)
        })
    }

    fn add_implicit_members(&mut self, c: SymbolId, tree: &ClassDecl) -> Result<()> {
        let class_flags = self.symtab.sym(c).flags;
        let this_type = self.symtab.sym(c).ty.clone();
        match tree.kind {
            ClassKind::Class | ClassKind::Enum if !class_flags.contains(Flags::ANONYMOUS) => {
                if self.symtab.members_named(c, "<init>").is_empty() {
                    let access = if tree.kind == ClassKind::Enum {
                        Flags::PRIVATE
                    } else {
                        class_flags & Flags::ACCESS
                    };
                    let ctor = self.symtab.new_method(
                        c,
                        "<init>",
                        access | Flags::GENERATED_CONSTR,
                        MethodType::new(Vec::new(), Type::Void),
                    );
                    self.enter_synthetic(c, ctor);
                    trace!("ENTER: default constructor for {}", self.symtab.sym(c).name);
                }
            }
            ClassKind::Record => {
                let components = self
                    .symtab
                    .sym(c)
                    .class_details()
                    .map(|d| d.record_components.clone())
                    .unwrap_or_default();
                let types: Vec<Type> = components.iter().map(|f| self.symtab.sym(*f).ty.clone()).collect();
                for (&field, ty) in components.iter().zip(&types) {
                    let name = self.symtab.sym(field).name.clone();
                    if !self.has_method(c, &name, &[]) {
                        let accessor = self
                            .symtab
                            .new_method(c, &name, Flags::PUBLIC | Flags::RECORD, MethodType::new(Vec::new(), ty.clone()));
                        self.enter_synthetic(c, accessor);
                    }
                }
                if !self.has_method(c, "<init>", &types) {
                    let ctor = self.symtab.new_method(
                        c,
                        "<init>",
                        Flags::PUBLIC | Flags::RECORD | Flags::GENERATED_CONSTR,
                        MethodType::new(types.clone(), Type::Void),
                    );
                    let mut params = Vec::with_capacity(components.len());
                    for (&field, ty) in components.iter().zip(&types) {
                        let name = self.symtab.sym(field).name.clone();
                        params.push(self.symtab.new_var(ctor, &name, Flags::PARAMETER, ty.clone()));
                    }
                    if let Some(details) = self.symtab.sym_mut(ctor).method_details_mut() {
                        details.params = params;
                    }
                    self.enter_synthetic(c, ctor);
                }
            }
            _ => {}
        }

        if tree.kind == ClassKind::Enum {
            let statics = Flags::PUBLIC | Flags::STATIC;
            if !self.has_method(c, "values", &[]) {
                let values = self
                    .symtab
                    .new_method(c, "values", statics, MethodType::new(Vec::new(), Type::array_of(this_type.clone())));
                self.enter_synthetic(c, values);
            }
            let string = self.types().string_type();
            if !self.has_method(c, "valueOf", std::slice::from_ref(&string)) {
                let value_of = self
                    .symtab
                    .new_method(c, "valueOf", statics, MethodType::new(vec![string.clone()], this_type));
                let param = self.symtab.new_var(value_of, "name", Flags::PARAMETER, string);
                if let Some(details) = self.symtab.sym_mut(value_of).method_details_mut() {
                    details.params = vec![param];
                }
                self.enter_synthetic(c, value_of);
            }
        }
        Ok(())
    }

    fn enter_synthetic(&mut self, c: SymbolId, member: SymbolId) {
        if let Some(members) = self.symtab.sym(c).members() {
            self.symtab.enter(members, member);
        }
    }

    /// Resolve the imports of a unit; runs once per unit
    pub(crate) fn ensure_imports(&mut self, env: &Env) -> Result<()> {
        let toplevel = env.toplevel.clone();
        if toplevel.imports_resolved.replace(true) {
            return Ok(());
        }
        let java_lang = self.symtab.predef.java_lang;
        self.symtab.enter(toplevel.star_imports, java_lang);
        for import in &toplevel.imports {
            let span = import.span;
            if import.is_static {
                let Some((class_name, member)) = import.name.rsplit_once('.').map(|(a, b)| (a.to_string(), b.to_string()))
                else {
                    continue;
                };
                let class_name = if import.is_wildcard { import.name.clone() } else { class_name };
                let Some(cls) = self.load_class(&class_name, span)? else {
                    self.log.error(DiagKind::CantResolve, span, vec!["class".into(), class_name.into()]);
                    continue;
                };
                self.complete(cls)?;
                let statics: Vec<SymbolId> = self
                    .symtab
                    .sym(cls)
                    .members()
                    .map(|s| self.symtab.scope(s).symbols().to_vec())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|m| self.symtab.sym(*m).is_static())
                    .collect();
                if import.is_wildcard {
                    for m in statics {
                        self.symtab.enter(toplevel.star_imports, m);
                    }
                } else {
                    let named: Vec<SymbolId> = statics
                        .into_iter()
                        .filter(|m| self.symtab.sym(*m).name == member)
                        .collect();
                    if named.is_empty() {
                        self.log.error(
                            DiagKind::CantResolveLocation,
                            span,
                            vec!["static".into(), member.into(), cls.into()],
                        );
                    }
                    for m in named {
                        self.symtab.enter(toplevel.named_imports, m);
                    }
                }
            } else if import.is_wildcard {
                if self.symtab.lookup_package(&import.name).is_some() || self.provider.has_package(&import.name) {
                    let package = self.symtab.enter_package(&import.name);
                    self.symtab.enter(toplevel.star_imports, package);
                } else if let Some(cls) = self.load_class(&import.name, span)? {
                    self.symtab.enter(toplevel.star_imports, cls);
                } else {
                    self.log.error(DiagKind::DoesntExist, span, vec![import.name.clone().into()]);
                }
            } else {
                match self.load_class(&import.name, span)? {
                    Some(cls) => {
                        let simple = import.name.rsplit('.').next().unwrap_or(&import.name).to_string();
                        self.symtab.scope_mut(toplevel.named_imports).enter(&simple, cls);
                    }
                    None => {
                        let (package, simple) = import.name.rsplit_once('.').unwrap_or(("", import.name.as_str()));
                        if package.is_empty()
                            || self.symtab.lookup_package(package).is_some()
                            || self.provider.has_package(package)
                        {
                            self.log.error(DiagKind::CantResolveLocation, span, vec!["class".into(), simple.into()]);
                        } else {
                            self.log.error(DiagKind::DoesntExist, span, vec![package.into()]);
                        }
                    }
                }
            }
        }
        trace!("ENTER: imports of {} resolved", toplevel.source_file);
        Ok(())
    }

    /// Find a class by canonical name: already known classes first, then
    /// member classes of known classes, then the class provider.
    ///
    /// A provider failure is reported once and yields an erroneous class
    /// symbol, so later lookups of the same name stay quiet.
    pub(crate) fn load_class(&mut self, name: &str, span: Span) -> Result<Option<SymbolId>> {
        if let Some(c) = self.symtab.class_by_flat_name(name) {
            return Ok(Some(c));
        }
        if let Some((outer, simple)) = name.rsplit_once('.') {
            if let Some(outer_class) = self.symtab.class_by_flat_name(outer) {
                self.complete(outer_class)?;
                if let Some(member) = self.find_member_type(outer_class, simple)? {
                    return Ok(Some(member));
                }
            }
        }
        if self.enter.missing.contains(name) {
            return Ok(None);
        }
        let unit = match self.provider.find_class(name) {
            Ok(Some(unit)) => unit,
            Ok(None) => {
                self.enter.missing.insert(name.to_string());
                return Ok(None);
            }
            Err(err) if err.is_completion_failure() => {
                warn!("ENTER: {}", err);
                self.log
                    .error(DiagKind::CantAccessClass, span, vec![name.into(), err.to_string().into()]);
                let (package, simple) = name.rsplit_once('.').unwrap_or(("", name));
                let package = self.symtab.enter_package(package);
                let broken = self
                    .symtab
                    .new_class(package, simple, name.to_string(), name.to_string(), ClassKind::Class, Flags::NONE);
                let sym = self.symtab.sym_mut(broken);
                sym.state = CompletionState::Error;
                sym.ty = Type::Error;
                self.symtab.register_class(name, broken);
                return Ok(Some(broken));
            }
            Err(err) => return Err(err),
        };
        debug!("ENTER: loading {} from the class provider", name);
        self.enter_library_unit(unit)?;
        match self.symtab.class_by_flat_name(name) {
            Some(c) => Ok(Some(c)),
            None => {
                warn!("ENTER: provider unit for {} does not declare it", name);
                self.enter.missing.insert(name.to_string());
                Ok(None)
            }
        }
    }

    fn enter_library_unit(&mut self, mut unit: CompilationUnit) -> Result<()> {
        self.enter_unit(&mut unit, Flags::FROM_LIBRARY)?;
        self.enter.library_units.push(unit);
        self.complete_uncompleted()?;
        self.flush_annotations()
    }
}
