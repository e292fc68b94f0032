//! Symbol table - arena of symbols and scopes plus the predefined classes
//!
//! The arena owns every [`Symbol`] and [`Scope`] for one compilation
//! session. Predefined `java.lang` (and friends) classes are entered
//! complete at construction, so attribution of ordinary programs never has
//! to go to a class provider for them.

use std::collections::HashMap;

use super::attribute::{AttrValue, Compound};
use super::flags::Flags;
use super::scope::{Scope, ScopeId};
use super::symbol::{ClassDetails, CompletionState, MethodDetails, Symbol, SymbolDetails, SymbolId, SymbolKind};
use super::types::{BoundKind, MethodType, Type, TypeTag, WildcardType};
use crate::ast::{ClassKind, Literal, Span};

/// Handles of predefined classes the compiler refers to directly
#[derive(Debug, Clone)]
pub struct Predefined {
    pub java_lang: SymbolId,
    pub object: SymbolId,
    pub string: SymbolId,
    pub class: SymbolId,
    pub number: SymbolId,
    pub boxes: [SymbolId; 8],
    pub void_class: SymbolId,
    pub enum_: SymbolId,
    pub record: SymbolId,
    pub cloneable: SymbolId,
    pub serializable: SymbolId,
    pub comparable: SymbolId,
    pub iterable: SymbolId,
    pub runnable: SymbolId,
    pub throwable: SymbolId,
    pub exception: SymbolId,
    pub runtime_exception: SymbolId,
    pub null_pointer_exception: SymbolId,
    pub match_exception: SymbolId,
    pub annotation: SymbolId,
    pub deprecated: SymbolId,
    pub functional_interface: SymbolId,
    pub suppress_warnings: SymbolId,
    pub override_: SymbolId,
    pub safe_varargs: SymbolId,
    pub repeatable: SymbolId,
    pub target: SymbolId,
    pub retention: SymbolId,
    pub documented: SymbolId,
    pub inherited: SymbolId,
    pub element_type: SymbolId,
    pub retention_policy: SymbolId,
    pub preview_feature: SymbolId,
    pub value_based: SymbolId,
    pub function: SymbolId,
    pub bi_function: SymbolId,
    pub supplier: SymbolId,
    pub consumer: SymbolId,
    pub predicate: SymbolId,
    pub list: SymbolId,
    pub array_list: SymbolId,
    pub objects: SymbolId,
    pub switch_bootstraps: SymbolId,
}

impl Predefined {
    pub fn box_class(&self, tag: TypeTag) -> SymbolId {
        let index = TypeTag::ALL.iter().position(|t| *t == tag).unwrap_or(0);
        self.boxes[index]
    }
}

#[derive(Debug, Clone)]
pub struct Symtab {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    packages: HashMap<String, SymbolId>,
    /// Classes by flat name
    classes: HashMap<String, SymbolId>,
    pub root_package: SymbolId,
    /// Owner of symbols synthesized for unresolvable names
    pub error_symbol: SymbolId,
    pub predef: Predefined,
}

impl Default for Symtab {
    fn default() -> Self {
        Self::new()
    }
}

impl Symtab {
    pub fn new() -> Self {
        let mut symtab = Symtab {
            symbols: Vec::new(),
            scopes: Vec::new(),
            packages: HashMap::new(),
            classes: HashMap::new(),
            root_package: SymbolId(0),
            error_symbol: SymbolId(0),
            predef: Predefined::placeholder(),
        };
        symtab.root_package = symtab.enter_package("");
        let mut error = Symbol::new(SymbolKind::Error, "<any>", Some(symtab.root_package), SymbolDetails::Error);
        error.ty = Type::Error;
        error.state = CompletionState::Error;
        symtab.error_symbol = symtab.add_symbol(error);
        symtab.predef = PredefBuilder { symtab: &mut symtab }.build();
        symtab
    }

    // ---- arena ----

    pub fn add_symbol(&mut self, sym: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(sym);
        id
    }

    pub fn sym(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn sym_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn new_scope(&mut self, owner: SymbolId, next: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(owner, next));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Enter a symbol into a scope under its own name
    pub fn enter(&mut self, scope: ScopeId, sym: SymbolId) {
        let name = self.sym(sym).name.clone();
        self.scope_mut(scope).enter(&name, sym);
    }

    // ---- packages and classes ----

    /// Find or create a package, creating enclosing packages as needed
    pub fn enter_package(&mut self, full_name: &str) -> SymbolId {
        if let Some(&id) = self.packages.get(full_name) {
            return id;
        }
        let (owner, simple) = match full_name.rfind('.') {
            Some(dot) => (Some(self.enter_package(&full_name[..dot])), &full_name[dot + 1..]),
            None if full_name.is_empty() => (None, ""),
            None => (Some(self.root_package), full_name),
        };
        let placeholder = SymbolId(self.symbols.len() as u32);
        let members = self.new_scope(placeholder, None);
        let mut sym = Symbol::new(
            SymbolKind::Package,
            simple,
            owner,
            SymbolDetails::Package {
                full_name: full_name.to_string(),
                members,
            },
        );
        sym.state = CompletionState::Complete;
        let id = self.add_symbol(sym);
        self.sym_mut(id).ty = Type::Package(id);
        if let Some(owner) = owner {
            if let Some(owner_members) = self.sym(owner).members() {
                self.scope_mut(owner_members).enter(simple, id);
            }
        }
        self.packages.insert(full_name.to_string(), id);
        id
    }

    pub fn lookup_package(&self, full_name: &str) -> Option<SymbolId> {
        self.packages.get(full_name).copied()
    }

    pub fn class_by_flat_name(&self, flat_name: &str) -> Option<SymbolId> {
        self.classes.get(flat_name).copied()
    }

    pub fn register_class(&mut self, flat_name: &str, sym: SymbolId) {
        self.classes.insert(flat_name.to_string(), sym);
    }

    pub fn unregister_class(&mut self, flat_name: &str, sym: SymbolId) {
        if self.classes.get(flat_name) == Some(&sym) {
            self.classes.remove(flat_name);
        }
    }

    /// Create a class symbol with an empty member scope; not entered anywhere
    pub fn new_class(
        &mut self,
        owner: SymbolId,
        name: &str,
        flat_name: String,
        full_name: String,
        kind: ClassKind,
        flags: Flags,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let members = self.new_scope(id, None);
        let details = ClassDetails::new(kind, flat_name, full_name, members);
        let mut sym = Symbol::new(SymbolKind::Class, name, Some(owner), SymbolDetails::Class(Box::new(details)));
        sym.flags = flags | kind_flags(kind);
        sym.ty = Type::class(id);
        let added = self.add_symbol(sym);
        debug_assert_eq!(added, id);
        id
    }

    pub fn new_type_var(&mut self, owner: SymbolId, name: &str, bounds: Vec<Type>) -> SymbolId {
        let mut sym = Symbol::new(SymbolKind::TypeVar, name, Some(owner), SymbolDetails::TypeVar { bounds });
        sym.state = CompletionState::Complete;
        let id = self.add_symbol(sym);
        self.sym_mut(id).ty = Type::TypeVar(id);
        id
    }

    pub fn new_var(&mut self, owner: SymbolId, name: &str, flags: Flags, ty: Type) -> SymbolId {
        let mut sym = Symbol::new(
            SymbolKind::Var,
            name,
            Some(owner),
            SymbolDetails::Var {
                const_value: Default::default(),
            },
        );
        sym.flags = flags;
        sym.ty = ty;
        sym.state = CompletionState::Complete;
        self.add_symbol(sym)
    }

    pub fn new_method(&mut self, owner: SymbolId, name: &str, flags: Flags, mtype: MethodType) -> SymbolId {
        let mut sym = Symbol::new(SymbolKind::Method, name, Some(owner), SymbolDetails::Method(MethodDetails::default()));
        sym.flags = flags;
        sym.ty = Type::Method(mtype);
        sym.state = CompletionState::Complete;
        self.add_symbol(sym)
    }

    /// Symbol standing in for something that failed to resolve
    pub fn new_error_symbol(&mut self, name: &str, owner: SymbolId) -> SymbolId {
        let mut sym = Symbol::new(SymbolKind::Error, name, Some(owner), SymbolDetails::Error);
        sym.ty = Type::Error;
        sym.state = CompletionState::Error;
        self.add_symbol(sym)
    }

    // ---- queries ----

    pub fn qualified_name(&self, id: SymbolId) -> String {
        let sym = self.sym(id);
        match &sym.details {
            SymbolDetails::Package { full_name, .. } => full_name.clone(),
            SymbolDetails::Class(details) => details.full_name.clone(),
            _ => sym.name.clone(),
        }
    }

    pub fn flat_name(&self, id: SymbolId) -> String {
        match self.sym(id).class_details() {
            Some(details) => details.flat_name.clone(),
            None => self.sym(id).name.clone(),
        }
    }

    /// Nearest class symbol enclosing (or equal to) `id`
    pub fn enclosing_class(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.sym(c).kind == SymbolKind::Class {
                return Some(c);
            }
            current = self.sym(c).owner;
        }
        None
    }

    pub fn outermost_class(&self, id: SymbolId) -> Option<SymbolId> {
        let mut result = None;
        let mut current = Some(id);
        while let Some(c) = current {
            if self.sym(c).kind == SymbolKind::Class {
                result = Some(c);
            }
            current = self.sym(c).owner;
        }
        result
    }

    pub fn enclosing_package(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        loop {
            if self.sym(current).kind == SymbolKind::Package {
                return current;
            }
            match self.sym(current).owner {
                Some(owner) => current = owner,
                None => return self.root_package,
            }
        }
    }

    /// Whether `id` is owned by a method (a local variable or local class)
    pub fn is_local(&self, id: SymbolId) -> bool {
        match self.sym(id).owner {
            Some(owner) => matches!(self.sym(owner).kind, SymbolKind::Method | SymbolKind::Var),
            None => false,
        }
    }

    /// Members of a class declared (not inherited) under `name`
    pub fn members_named(&self, class: SymbolId, name: &str) -> Vec<SymbolId> {
        match self.sym(class).members() {
            Some(scope) => self.scope(scope).lookup(name).to_vec(),
            None => Vec::new(),
        }
    }

    /// Enum constant or element of a predefined class by name
    pub fn member(&self, class: SymbolId, name: &str) -> Option<SymbolId> {
        self.members_named(class, name).into_iter().next()
    }

    pub fn class_type_params(&self, class: SymbolId) -> Vec<SymbolId> {
        self.sym(class)
            .class_details()
            .map(|d| d.type_params.clone())
            .unwrap_or_default()
    }

    pub fn method_params(&self, method: SymbolId) -> Vec<SymbolId> {
        self.sym(method)
            .method_details()
            .map(|d| d.params.clone())
            .unwrap_or_default()
    }
}

fn kind_flags(kind: ClassKind) -> Flags {
    match kind {
        ClassKind::Class => Flags::NONE,
        ClassKind::Interface => Flags::INTERFACE | Flags::ABSTRACT,
        ClassKind::Annotation => Flags::INTERFACE | Flags::ABSTRACT | Flags::ANNOTATION,
        ClassKind::Enum => Flags::ENUM,
        ClassKind::Record => Flags::RECORD | Flags::FINAL,
    }
}

impl Predefined {
    fn placeholder() -> Self {
        let z = SymbolId(0);
        Predefined {
            java_lang: z,
            object: z,
            string: z,
            class: z,
            number: z,
            boxes: [z; 8],
            void_class: z,
            enum_: z,
            record: z,
            cloneable: z,
            serializable: z,
            comparable: z,
            iterable: z,
            runnable: z,
            throwable: z,
            exception: z,
            runtime_exception: z,
            null_pointer_exception: z,
            match_exception: z,
            annotation: z,
            deprecated: z,
            functional_interface: z,
            suppress_warnings: z,
            override_: z,
            safe_varargs: z,
            repeatable: z,
            target: z,
            retention: z,
            documented: z,
            inherited: z,
            element_type: z,
            retention_policy: z,
            preview_feature: z,
            value_based: z,
            function: z,
            bi_function: z,
            supplier: z,
            consumer: z,
            predicate: z,
            list: z,
            array_list: z,
            objects: z,
            switch_bootstraps: z,
        }
    }
}

const PUBLIC: Flags = Flags::PUBLIC;
const PUBLIC_FINAL: Flags = Flags::PUBLIC.union(Flags::FINAL);
const PUBLIC_STATIC: Flags = Flags::PUBLIC.union(Flags::STATIC);
const PUBLIC_ABSTRACT: Flags = Flags::PUBLIC.union(Flags::ABSTRACT);

const ELEMENT_TYPES: &[&str] = &[
    "TYPE",
    "FIELD",
    "METHOD",
    "PARAMETER",
    "CONSTRUCTOR",
    "LOCAL_VARIABLE",
    "ANNOTATION_TYPE",
    "PACKAGE",
    "TYPE_PARAMETER",
    "TYPE_USE",
    "MODULE",
    "RECORD_COMPONENT",
];

/// Enters the predefined classes, all complete
struct PredefBuilder<'a> {
    symtab: &'a mut Symtab,
}

impl<'a> PredefBuilder<'a> {
    fn class(&mut self, package: &str, name: &str, kind: ClassKind, flags: Flags, tparams: &[&str]) -> SymbolId {
        let pkg = self.symtab.enter_package(package);
        let full = format!("{}.{}", package, name);
        let id = self.symtab.new_class(pkg, name, full.clone(), full.clone(), kind, flags);
        let params: Vec<SymbolId> = tparams.iter().map(|p| self.symtab.new_type_var(id, p, Vec::new())).collect();
        {
            let sym = self.symtab.sym_mut(id);
            sym.state = CompletionState::Complete;
            sym.ty = Type::generic(id, params.iter().map(|p| Type::TypeVar(*p)).collect());
            if let Some(details) = sym.class_details_mut() {
                details.type_params = params;
            }
        }
        if let Some(members) = self.symtab.sym(pkg).members() {
            self.symtab.scope_mut(members).enter(name, id);
        }
        self.symtab.register_class(&full, id);
        id
    }

    fn extends(&mut self, class: SymbolId, supertype: Type, interfaces: Vec<Type>) {
        if let Some(details) = self.symtab.sym_mut(class).class_details_mut() {
            details.supertype = Some(supertype);
            details.interfaces = interfaces;
        }
    }

    fn method(&mut self, owner: SymbolId, name: &str, flags: Flags, params: Vec<Type>, ret: Type) -> SymbolId {
        let id = self.symtab.new_method(owner, name, flags, MethodType::new(params.clone(), ret));
        let param_syms: Vec<SymbolId> = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| self.symtab.new_var(id, &format!("arg{}", i), Flags::PARAMETER, ty))
            .collect();
        if let Some(details) = self.symtab.sym_mut(id).method_details_mut() {
            details.params = param_syms;
        }
        if let Some(members) = self.symtab.sym(owner).members() {
            self.symtab.scope_mut(members).enter(name, id);
        }
        id
    }

    /// Generic method `<T..> ret name(params)`; `build` maps the fresh
    /// type variables to the parameter and return types
    fn generic_method(
        &mut self,
        owner: SymbolId,
        name: &str,
        flags: Flags,
        tparams: &[&str],
        build: impl Fn(&[Type]) -> (Vec<Type>, Type),
    ) -> SymbolId {
        let id = self.method(owner, name, flags, Vec::new(), Type::Void);
        let vars: Vec<SymbolId> = tparams.iter().map(|p| self.symtab.new_type_var(id, p, Vec::new())).collect();
        let var_types: Vec<Type> = vars.iter().map(|v| Type::TypeVar(*v)).collect();
        let (params, ret) = build(&var_types);
        let param_syms: Vec<SymbolId> = params
            .iter()
            .enumerate()
            .map(|(i, ty)| self.symtab.new_var(id, &format!("arg{}", i), Flags::PARAMETER, ty.clone()))
            .collect();
        let sym = self.symtab.sym_mut(id);
        sym.ty = Type::Method(MethodType {
            params,
            ret: Box::new(ret),
            thrown: Vec::new(),
            tvars: vars.clone(),
        });
        if let Some(details) = sym.method_details_mut() {
            details.params = param_syms;
            details.type_params = vars;
        }
        id
    }

    fn ctor(&mut self, owner: SymbolId, params: Vec<Type>) -> SymbolId {
        self.method(owner, "<init>", PUBLIC, params, Type::Void)
    }

    fn enum_constants(&mut self, owner: SymbolId, names: &[&str]) {
        for name in names {
            let var = self.symtab.new_var(owner, name, PUBLIC_STATIC | Flags::FINAL | Flags::ENUM, Type::class(owner));
            if let Some(members) = self.symtab.sym(owner).members() {
                self.symtab.scope_mut(members).enter(name, var);
            }
        }
    }

    fn element(&mut self, owner: SymbolId, name: &str, ret: Type, default: Option<AttrValue>) -> SymbolId {
        let id = self.method(owner, name, PUBLIC_ABSTRACT, Vec::new(), ret);
        if let Some(details) = self.symtab.sym_mut(id).method_details_mut() {
            details.default_value = default;
        }
        id
    }

    fn annotation_type(&mut self, package: &str, name: &str) -> SymbolId {
        self.class(package, name, ClassKind::Annotation, PUBLIC, &[])
    }

    fn set_target(&mut self, annotation: SymbolId, target: SymbolId, element_type: SymbolId, kinds: &[&str]) {
        let value_elem = self.symtab.member(target, "value").unwrap_or(target);
        let values = kinds
            .iter()
            .filter_map(|k| {
                self.symtab.member(element_type, k).map(|constant| AttrValue::Enum {
                    ty: Type::class(element_type),
                    constant,
                    name: k.to_string(),
                })
            })
            .collect();
        let compound = Compound::new(target, Span::default()).with_value("value", value_elem, AttrValue::Array(values));
        self.symtab.sym_mut(annotation).attributes.push(compound);
    }

    fn build(mut self) -> Predefined {
        let object = self.class("java.lang", "Object", ClassKind::Class, PUBLIC, &[]);
        let object_t = Type::class(object);
        let string = self.class("java.lang", "String", ClassKind::Class, PUBLIC_FINAL, &[]);
        let string_t = Type::class(string);
        let serializable = self.class("java.io", "Serializable", ClassKind::Interface, PUBLIC, &[]);
        let cloneable = self.class("java.lang", "Cloneable", ClassKind::Interface, PUBLIC, &[]);
        let comparable = self.class("java.lang", "Comparable", ClassKind::Interface, PUBLIC, &["T"]);
        let comparable_t = self.symtab.sym(comparable).ty.clone();
        let class = self.class("java.lang", "Class", ClassKind::Class, PUBLIC_FINAL, &["T"]);

        self.extends(string, object_t.clone(), vec![
            Type::class(serializable),
            Type::generic(comparable, vec![string_t.clone()]),
        ]);
        self.extends(class, object_t.clone(), vec![]);
        let t = comparable_t.type_args()[0].clone();
        self.method(comparable, "compareTo", PUBLIC_ABSTRACT, vec![t], Type::Prim(TypeTag::Int));

        self.ctor(object, vec![]);
        self.method(object, "equals", PUBLIC, vec![object_t.clone()], Type::Prim(TypeTag::Boolean));
        self.method(object, "hashCode", PUBLIC, vec![], Type::Prim(TypeTag::Int));
        self.method(object, "toString", PUBLIC, vec![], string_t.clone());
        let unbounded = Type::Wildcard(WildcardType { kind: BoundKind::Unbound, bound: None });
        self.method(object, "getClass", PUBLIC_FINAL, vec![], Type::generic(class, vec![unbounded]));

        self.ctor(string, vec![]);
        self.method(string, "length", PUBLIC, vec![], Type::Prim(TypeTag::Int));
        self.method(string, "isEmpty", PUBLIC, vec![], Type::Prim(TypeTag::Boolean));
        self.method(string, "charAt", PUBLIC, vec![Type::Prim(TypeTag::Int)], Type::Prim(TypeTag::Char));
        self.method(string, "concat", PUBLIC, vec![string_t.clone()], string_t.clone());
        self.method(string, "valueOf", PUBLIC_STATIC, vec![object_t.clone()], string_t.clone());
        self.method(string, "valueOf", PUBLIC_STATIC, vec![Type::Prim(TypeTag::Int)], string_t.clone());
        self.method(string, "hashCode", PUBLIC, vec![], Type::Prim(TypeTag::Int));

        let number = self.class("java.lang", "Number", ClassKind::Class, PUBLIC_ABSTRACT, &[]);
        self.extends(number, object_t.clone(), vec![Type::class(serializable)]);
        self.method(number, "intValue", PUBLIC_ABSTRACT, vec![], Type::Prim(TypeTag::Int));
        self.method(number, "longValue", PUBLIC_ABSTRACT, vec![], Type::Prim(TypeTag::Long));
        self.method(number, "doubleValue", PUBLIC_ABSTRACT, vec![], Type::Prim(TypeTag::Double));

        let mut boxes = [object; 8];
        for (i, tag) in TypeTag::ALL.iter().enumerate() {
            let b = self.class("java.lang", tag.box_name(), ClassKind::Class, PUBLIC_FINAL, &[]);
            let sup = if tag.is_numeric() && *tag != TypeTag::Char { Type::class(number) } else { object_t.clone() };
            self.extends(b, sup, vec![Type::generic(comparable, vec![Type::class(b)])]);
            self.method(b, "valueOf", PUBLIC_STATIC, vec![Type::Prim(*tag)], Type::class(b));
            self.method(b, &format!("{}Value", tag.name()), PUBLIC, vec![], Type::Prim(*tag));
            self.method(b, "compareTo", PUBLIC, vec![Type::class(b)], Type::Prim(TypeTag::Int));
            boxes[i] = b;
        }
        let void_class = self.class("java.lang", "Void", ClassKind::Class, PUBLIC_FINAL, &[]);
        self.extends(void_class, object_t.clone(), vec![]);

        let enum_ = self.class("java.lang", "Enum", ClassKind::Class, PUBLIC_ABSTRACT, &["E"]);
        let enum_e = self.symtab.sym(enum_).ty.clone();
        self.extends(enum_, object_t.clone(), vec![Type::generic(comparable, vec![enum_e]), Type::class(serializable)]);
        self.method(enum_, "name", PUBLIC_FINAL, vec![], string_t.clone());
        self.method(enum_, "ordinal", PUBLIC_FINAL, vec![], Type::Prim(TypeTag::Int));
        let record = self.class("java.lang", "Record", ClassKind::Class, PUBLIC_ABSTRACT, &[]);
        self.extends(record, object_t.clone(), vec![]);

        let iterable = self.class("java.lang", "Iterable", ClassKind::Interface, PUBLIC, &["T"]);
        let runnable = self.class("java.lang", "Runnable", ClassKind::Interface, PUBLIC, &[]);
        self.method(runnable, "run", PUBLIC_ABSTRACT, vec![], Type::Void);

        let throwable = self.class("java.lang", "Throwable", ClassKind::Class, PUBLIC, &[]);
        self.extends(throwable, object_t.clone(), vec![Type::class(serializable)]);
        self.ctor(throwable, vec![]);
        self.method(throwable, "getMessage", PUBLIC, vec![], string_t.clone());
        let exception = self.class("java.lang", "Exception", ClassKind::Class, PUBLIC, &[]);
        self.extends(exception, Type::class(throwable), vec![]);
        self.ctor(exception, vec![]);
        let runtime_exception = self.class("java.lang", "RuntimeException", ClassKind::Class, PUBLIC, &[]);
        self.extends(runtime_exception, Type::class(exception), vec![]);
        self.ctor(runtime_exception, vec![]);
        self.ctor(runtime_exception, vec![string_t.clone()]);
        let npe = self.class("java.lang", "NullPointerException", ClassKind::Class, PUBLIC, &[]);
        self.extends(npe, Type::class(runtime_exception), vec![]);
        self.ctor(npe, vec![]);
        let match_exception = self.class("java.lang", "MatchException", ClassKind::Class, PUBLIC_FINAL, &[]);
        self.extends(match_exception, Type::class(runtime_exception), vec![]);
        self.ctor(match_exception, vec![string_t.clone(), Type::class(throwable)]);

        // java.lang.annotation
        let annotation = self.class("java.lang.annotation", "Annotation", ClassKind::Interface, PUBLIC, &[]);
        self.method(annotation, "annotationType", PUBLIC_ABSTRACT, vec![], Type::generic(class, vec![
            Type::Wildcard(WildcardType { kind: BoundKind::Extends, bound: Some(Box::new(Type::class(annotation))) }),
        ]));
        let element_type = self.class("java.lang.annotation", "ElementType", ClassKind::Enum, PUBLIC_FINAL, &[]);
        self.extends(element_type, Type::generic(enum_, vec![Type::class(element_type)]), vec![]);
        self.enum_constants(element_type, ELEMENT_TYPES);
        let retention_policy = self.class("java.lang.annotation", "RetentionPolicy", ClassKind::Enum, PUBLIC_FINAL, &[]);
        self.extends(retention_policy, Type::generic(enum_, vec![Type::class(retention_policy)]), vec![]);
        self.enum_constants(retention_policy, &["SOURCE", "CLASS", "RUNTIME"]);

        let target = self.annotation_type("java.lang.annotation", "Target");
        self.element(target, "value", Type::array_of(Type::class(element_type)), None);
        let retention = self.annotation_type("java.lang.annotation", "Retention");
        self.element(retention, "value", Type::class(retention_policy), None);
        let repeatable = self.annotation_type("java.lang.annotation", "Repeatable");
        self.element(repeatable, "value", Type::generic(class, vec![Type::Wildcard(WildcardType {
            kind: BoundKind::Extends,
            bound: Some(Box::new(Type::class(annotation))),
        })]), None);
        let documented = self.annotation_type("java.lang.annotation", "Documented");
        let inherited = self.annotation_type("java.lang.annotation", "Inherited");

        let deprecated = self.annotation_type("java.lang", "Deprecated");
        self.element(deprecated, "since", string_t.clone(), Some(AttrValue::Constant(Literal::String(String::new()))));
        self.element(deprecated, "forRemoval", Type::Prim(TypeTag::Boolean), Some(AttrValue::Constant(Literal::Boolean(false))));
        let functional_interface = self.annotation_type("java.lang", "FunctionalInterface");
        let suppress_warnings = self.annotation_type("java.lang", "SuppressWarnings");
        self.element(suppress_warnings, "value", Type::array_of(string_t.clone()), None);
        let override_ = self.annotation_type("java.lang", "Override");
        let safe_varargs = self.annotation_type("java.lang", "SafeVarargs");

        let preview_feature = self.annotation_type("jdk.internal.javac", "PreviewFeature");
        self.element(preview_feature, "feature", string_t.clone(), Some(AttrValue::Constant(Literal::String(String::new()))));
        self.element(preview_feature, "reflective", Type::Prim(TypeTag::Boolean), Some(AttrValue::Constant(Literal::Boolean(false))));
        let value_based = self.annotation_type("jdk.internal", "ValueBased");

        let anno_types = ["ANNOTATION_TYPE"];
        for meta in [target, retention, repeatable, documented, inherited] {
            self.set_target(meta, target, element_type, &anno_types);
        }
        self.set_target(deprecated, target, element_type, &[
            "CONSTRUCTOR", "FIELD", "LOCAL_VARIABLE", "METHOD", "PACKAGE", "MODULE", "PARAMETER", "TYPE",
        ]);
        self.set_target(functional_interface, target, element_type, &["TYPE"]);
        self.set_target(suppress_warnings, target, element_type, &[
            "TYPE", "FIELD", "METHOD", "PARAMETER", "CONSTRUCTOR", "LOCAL_VARIABLE", "MODULE",
        ]);
        self.set_target(override_, target, element_type, &["METHOD"]);
        self.set_target(safe_varargs, target, element_type, &["CONSTRUCTOR", "METHOD"]);
        self.set_target(preview_feature, target, element_type, &[
            "METHOD", "CONSTRUCTOR", "FIELD", "PACKAGE", "MODULE", "TYPE",
        ]);
        self.set_target(value_based, target, element_type, &["TYPE"]);

        // java.util.function
        let function = self.class("java.util.function", "Function", ClassKind::Interface, PUBLIC, &["T", "R"]);
        let fargs = self.symtab.sym(function).ty.type_args().to_vec();
        self.method(function, "apply", PUBLIC_ABSTRACT, vec![fargs[0].clone()], fargs[1].clone());
        let bi_function = self.class("java.util.function", "BiFunction", ClassKind::Interface, PUBLIC, &["T", "U", "R"]);
        let bargs = self.symtab.sym(bi_function).ty.type_args().to_vec();
        self.method(bi_function, "apply", PUBLIC_ABSTRACT, vec![bargs[0].clone(), bargs[1].clone()], bargs[2].clone());
        let supplier = self.class("java.util.function", "Supplier", ClassKind::Interface, PUBLIC, &["T"]);
        let sargs = self.symtab.sym(supplier).ty.type_args().to_vec();
        self.method(supplier, "get", PUBLIC_ABSTRACT, vec![], sargs[0].clone());
        let consumer = self.class("java.util.function", "Consumer", ClassKind::Interface, PUBLIC, &["T"]);
        let cargs = self.symtab.sym(consumer).ty.type_args().to_vec();
        self.method(consumer, "accept", PUBLIC_ABSTRACT, vec![cargs[0].clone()], Type::Void);
        let predicate = self.class("java.util.function", "Predicate", ClassKind::Interface, PUBLIC, &["T"]);
        let pargs = self.symtab.sym(predicate).ty.type_args().to_vec();
        self.method(predicate, "test", PUBLIC_ABSTRACT, vec![pargs[0].clone()], Type::Prim(TypeTag::Boolean));
        for fi in [function, bi_function, supplier, consumer, predicate, runnable] {
            let compound = Compound::new(functional_interface, Span::default());
            self.symtab.sym_mut(fi).attributes.push(compound);
        }

        // java.util
        let list = self.class("java.util", "List", ClassKind::Interface, PUBLIC, &["E"]);
        let e = self.symtab.sym(list).ty.type_args()[0].clone();
        if let Some(details) = self.symtab.sym_mut(list).class_details_mut() {
            details.interfaces = vec![Type::generic(iterable, vec![e.clone()])];
        }
        self.method(list, "get", PUBLIC_ABSTRACT, vec![Type::Prim(TypeTag::Int)], e.clone());
        self.method(list, "size", PUBLIC_ABSTRACT, vec![], Type::Prim(TypeTag::Int));
        self.method(list, "add", PUBLIC_ABSTRACT, vec![e.clone()], Type::Prim(TypeTag::Boolean));
        self.generic_method(list, "of", PUBLIC_STATIC, &["E"], |vars| {
            (Vec::new(), Type::generic(list, vec![vars[0].clone()]))
        });
        self.generic_method(list, "of", PUBLIC_STATIC, &["E"], |vars| {
            (vec![vars[0].clone()], Type::generic(list, vec![vars[0].clone()]))
        });
        let array_list = self.class("java.util", "ArrayList", ClassKind::Class, PUBLIC, &["E"]);
        let ae = self.symtab.sym(array_list).ty.type_args()[0].clone();
        self.extends(array_list, object_t.clone(), vec![Type::generic(list, vec![ae.clone()])]);
        self.ctor(array_list, vec![]);
        self.method(array_list, "get", PUBLIC, vec![Type::Prim(TypeTag::Int)], ae.clone());
        self.method(array_list, "size", PUBLIC, vec![], Type::Prim(TypeTag::Int));
        self.method(array_list, "add", PUBLIC, vec![ae], Type::Prim(TypeTag::Boolean));
        let objects = self.class("java.util", "Objects", ClassKind::Class, PUBLIC_FINAL, &[]);
        self.extends(objects, object_t.clone(), vec![]);
        self.generic_method(objects, "requireNonNull", PUBLIC_STATIC, &["T"], |vars| {
            (vec![vars[0].clone()], vars[0].clone())
        });

        let switch_bootstraps = self.class("java.lang.runtime", "SwitchBootstraps", ClassKind::Class, PUBLIC_FINAL, &[]);
        self.extends(switch_bootstraps, object_t.clone(), vec![]);
        self.method(switch_bootstraps, "typeSwitch", PUBLIC_STATIC, vec![object_t.clone(), Type::Prim(TypeTag::Int)], Type::Prim(TypeTag::Int));
        self.method(switch_bootstraps, "enumSwitch", PUBLIC_STATIC, vec![object_t.clone(), Type::Prim(TypeTag::Int)], Type::Prim(TypeTag::Int));

        for c in [cloneable, serializable, comparable, annotation, iterable, runnable, target, retention, repeatable,
                  documented, inherited, deprecated, functional_interface, suppress_warnings, override_, safe_varargs,
                  preview_feature, value_based, function, bi_function, supplier, consumer, predicate]
        {
            let interface_super = if self.symtab.sym(c).is_annotation_type() {
                vec![Type::class(annotation)]
            } else {
                Vec::new()
            };
            if let Some(details) = self.symtab.sym_mut(c).class_details_mut() {
                if details.interfaces.is_empty() {
                    details.interfaces = interface_super;
                }
            }
        }

        Predefined {
            java_lang: self.symtab.enter_package("java.lang"),
            object,
            string,
            class,
            number,
            boxes,
            void_class,
            enum_,
            record,
            cloneable,
            serializable,
            comparable,
            iterable,
            runnable,
            throwable,
            exception,
            runtime_exception,
            null_pointer_exception: npe,
            match_exception,
            annotation,
            deprecated,
            functional_interface,
            suppress_warnings,
            override_,
            safe_varargs,
            repeatable,
            target,
            retention,
            documented,
            inherited,
            element_type,
            retention_policy,
            preview_feature,
            value_based,
            function,
            bi_function,
            supplier,
            consumer,
            predicate,
            list,
            array_list,
            objects,
            switch_bootstraps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_lang_classes_are_entered_complete() {
        let symtab = Symtab::new();
        let java_lang = symtab.lookup_package("java.lang").unwrap();
        let members = symtab.sym(java_lang).members().unwrap();
        let found = symtab.scope(members).lookup("String");
        assert_eq!(found, &[symtab.predef.string]);
        assert_eq!(symtab.sym(symtab.predef.string).state, CompletionState::Complete);
        assert_eq!(symtab.qualified_name(symtab.predef.string), "java.lang.String");
        assert_eq!(symtab.class_by_flat_name("java.util.List"), Some(symtab.predef.list));
    }

    #[test]
    fn nested_packages_are_linked() {
        let mut symtab = Symtab::new();
        let pkg = symtab.enter_package("a.b.c");
        let b = symtab.lookup_package("a.b").unwrap();
        assert_eq!(symtab.sym(pkg).owner, Some(b));
        assert_eq!(symtab.sym(pkg).name, "c");
        assert_eq!(symtab.enter_package("a.b.c"), pkg);
    }

    #[test]
    fn meta_annotations_carry_targets() {
        let symtab = Symtab::new();
        let target = symtab.sym(symtab.predef.functional_interface).attribute(symtab.predef.target).unwrap();
        let values = target.member("value").unwrap().as_array();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].enum_name(), Some("TYPE"));
    }
}
