//! Type representation and type relations
//!
//! [`Type`] is a plain value; class, type-variable and package types refer
//! to their symbols by id. [`Types`] borrows the symbol table and answers
//! the relational questions (subtyping, conversion, erasure, boxing,
//! functional descriptors) the attribution phases ask.

use std::fmt;

use super::flags::Flags;
use super::symbol::{SymbolDetails, SymbolId, SymbolKind};
use super::symtab::Symtab;

/// Primitive type tags, ordered by the widening lattice where it applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

impl TypeTag {
    pub const ALL: [TypeTag; 8] = [
        TypeTag::Byte,
        TypeTag::Short,
        TypeTag::Char,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::Boolean,
    ];

    pub const NUMERIC: [TypeTag; 7] = [
        TypeTag::Byte,
        TypeTag::Short,
        TypeTag::Char,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Float,
        TypeTag::Double,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Byte => "byte",
            TypeTag::Short => "short",
            TypeTag::Char => "char",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Boolean => "boolean",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeTag> {
        TypeTag::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn box_name(&self) -> &'static str {
        match self {
            TypeTag::Byte => "Byte",
            TypeTag::Short => "Short",
            TypeTag::Char => "Character",
            TypeTag::Int => "Integer",
            TypeTag::Long => "Long",
            TypeTag::Float => "Float",
            TypeTag::Double => "Double",
            TypeTag::Boolean => "Boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        *self != TypeTag::Boolean
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, TypeTag::Byte | TypeTag::Short | TypeTag::Char | TypeTag::Int | TypeTag::Long)
    }

    /// Primitive widening: `self` converts to `other` without a cast
    pub fn is_subrange_of(&self, other: TypeTag) -> bool {
        if *self == other {
            return true;
        }
        match self {
            TypeTag::Byte => matches!(other, TypeTag::Short | TypeTag::Int | TypeTag::Long | TypeTag::Float | TypeTag::Double),
            TypeTag::Short | TypeTag::Char => matches!(other, TypeTag::Int | TypeTag::Long | TypeTag::Float | TypeTag::Double),
            TypeTag::Int => matches!(other, TypeTag::Long | TypeTag::Float | TypeTag::Double),
            TypeTag::Long => matches!(other, TypeTag::Float | TypeTag::Double),
            TypeTag::Float => matches!(other, TypeTag::Double),
            TypeTag::Double | TypeTag::Boolean => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeferredId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Unbound,
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub sym: SymbolId,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub kind: BoundKind,
    pub bound: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub thrown: Vec<Type>,
    /// Method type parameters, free in `params` and `ret`
    pub tvars: Vec<SymbolId>,
}

impl MethodType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
            thrown: Vec::new(),
            tvars: Vec::new(),
        }
    }
}

/// A generic method type whose return type still mentions inference
/// variables; completed once a target type is known
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialType {
    pub method: SymbolId,
    pub mtype: MethodType,
    pub vars: Vec<SymbolId>,
    /// Lower bounds gathered from the arguments
    pub bounds: Vec<(SymbolId, Type)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Type {
    Prim(TypeTag),
    Void,
    /// The type of the `null` literal
    Null,
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(SymbolId),
    Wildcard(WildcardType),
    Method(MethodType),
    Partial(Box<PartialType>),
    /// Inference variable during overload resolution
    Undet(SymbolId),
    /// Placeholder for a poly expression argument
    Deferred(DeferredId),
    Package(SymbolId),
    Error,
    /// Target used when re-attributing after a resolution failure
    Recovery,
    /// No type (statements, absent expectations)
    #[default]
    None,
}

impl Type {
    pub fn class(sym: SymbolId) -> Type {
        Type::Class(ClassType { sym, args: Vec::new() })
    }

    pub fn generic(sym: SymbolId, args: Vec<Type>) -> Type {
        Type::Class(ClassType { sym, args })
    }

    pub fn array_of(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Prim(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Prim(tag) if tag.is_numeric())
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Prim(TypeTag::Boolean))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Type::Deferred(_))
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Type::Partial(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_) | Type::TypeVar(_) | Type::Null | Type::Undet(_))
    }

    pub fn tag(&self) -> Option<TypeTag> {
        match self {
            Type::Prim(tag) => Some(*tag),
            _ => None,
        }
    }

    pub fn class_sym(&self) -> Option<SymbolId> {
        match self {
            Type::Class(ct) => Some(ct.sym),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[Type] {
        match self {
            Type::Class(ct) => &ct.args,
            _ => &[],
        }
    }

    pub fn method_type(&self) -> Option<&MethodType> {
        match self {
            Type::Method(mt) => Some(mt),
            _ => None,
        }
    }

    /// Whether an inference variable occurs anywhere in this type
    pub fn has_undet(&self) -> bool {
        match self {
            Type::Undet(_) => true,
            Type::Class(ct) => ct.args.iter().any(Type::has_undet),
            Type::Array(elem) => elem.has_undet(),
            Type::Wildcard(w) => w.bound.as_ref().map(|b| b.has_undet()).unwrap_or(false),
            Type::Method(mt) => mt.params.iter().any(Type::has_undet) || mt.ret.has_undet(),
            _ => false,
        }
    }

    /// Whether any of `vars` occurs free in this type
    pub fn mentions(&self, vars: &[SymbolId]) -> bool {
        match self {
            Type::TypeVar(v) | Type::Undet(v) => vars.contains(v),
            Type::Class(ct) => ct.args.iter().any(|a| a.mentions(vars)),
            Type::Array(elem) => elem.mentions(vars),
            Type::Wildcard(w) => w.bound.as_ref().map(|b| b.mentions(vars)).unwrap_or(false),
            Type::Method(mt) => mt.params.iter().any(|p| p.mentions(vars)) || mt.ret.mentions(vars),
            _ => false,
        }
    }
}

/// Type relations over the symbol table
pub struct Types<'a> {
    symtab: &'a Symtab,
}

impl<'a> Types<'a> {
    pub fn new(symtab: &'a Symtab) -> Self {
        Self { symtab }
    }

    pub fn is_erroneous(&self, t: &Type) -> bool {
        match t {
            Type::Error | Type::Recovery => true,
            Type::Class(ct) => self.symtab.sym(ct.sym).is_erroneous() || ct.args.iter().any(|a| self.is_erroneous(a)),
            Type::Array(elem) => self.is_erroneous(elem),
            _ => false,
        }
    }

    pub fn object_type(&self) -> Type {
        Type::class(self.symtab.predef.object)
    }

    pub fn string_type(&self) -> Type {
        Type::class(self.symtab.predef.string)
    }

    pub fn is_string(&self, t: &Type) -> bool {
        t.class_sym() == Some(self.symtab.predef.string)
    }

    pub fn is_object(&self, t: &Type) -> bool {
        t.class_sym() == Some(self.symtab.predef.object)
    }

    pub fn is_interface(&self, t: &Type) -> bool {
        t.class_sym().map(|s| self.symtab.sym(s).is_interface()).unwrap_or(false)
    }

    pub fn is_final(&self, t: &Type) -> bool {
        t.class_sym().map(|s| self.symtab.sym(s).flags.contains(Flags::FINAL)).unwrap_or(false)
    }

    pub fn boxed_class(&self, tag: TypeTag) -> SymbolId {
        self.symtab.predef.box_class(tag)
    }

    pub fn boxed_type(&self, tag: TypeTag) -> Type {
        Type::class(self.boxed_class(tag))
    }

    pub fn boxed_type_or_type(&self, t: &Type) -> Type {
        match t {
            Type::Prim(tag) => self.boxed_type(*tag),
            other => other.clone(),
        }
    }

    /// Primitive a box class unboxes to
    pub fn unboxed_tag(&self, t: &Type) -> Option<TypeTag> {
        let sym = t.class_sym()?;
        TypeTag::ALL.iter().copied().find(|tag| self.boxed_class(*tag) == sym)
    }

    pub fn unboxed_type_or_type(&self, t: &Type) -> Type {
        match self.unboxed_tag(t) {
            Some(tag) => Type::Prim(tag),
            None => t.clone(),
        }
    }

    /// Primitive tag after optional unboxing
    pub fn primitive_tag(&self, t: &Type) -> Option<TypeTag> {
        t.tag().or_else(|| self.unboxed_tag(t))
    }

    pub fn type_var_bounds(&self, var: SymbolId) -> Vec<Type> {
        match &self.symtab.sym(var).details {
            SymbolDetails::TypeVar { bounds } if !bounds.is_empty() => bounds.clone(),
            _ => vec![self.object_type()],
        }
    }

    pub fn upper_bound(&self, t: &Type) -> Type {
        match t {
            Type::TypeVar(v) => self.type_var_bounds(*v).into_iter().next().unwrap_or_else(|| self.object_type()),
            Type::Wildcard(w) => match (&w.kind, &w.bound) {
                (BoundKind::Extends, Some(b)) => (**b).clone(),
                _ => self.object_type(),
            },
            other => other.clone(),
        }
    }

    pub fn erasure(&self, t: &Type) -> Type {
        match t {
            Type::Class(ct) => Type::class(ct.sym),
            Type::Array(elem) => Type::array_of(self.erasure(elem)),
            Type::TypeVar(_) | Type::Wildcard(_) => self.erasure(&self.upper_bound(t)),
            Type::Undet(v) => self.erasure(&self.upper_bound(&Type::TypeVar(*v))),
            Type::Method(mt) => Type::Method(MethodType {
                params: mt.params.iter().map(|p| self.erasure(p)).collect(),
                ret: Box::new(self.erasure(&mt.ret)),
                thrown: mt.thrown.iter().map(|p| self.erasure(p)).collect(),
                tvars: Vec::new(),
            }),
            other => other.clone(),
        }
    }

    pub fn elem_type(&self, t: &Type) -> Option<Type> {
        match t {
            Type::Array(elem) => Some((**elem).clone()),
            _ => None,
        }
    }

    /// Replace type variables `from[i]` with `to[i]`
    pub fn subst(&self, t: &Type, from: &[SymbolId], to: &[Type]) -> Type {
        if from.is_empty() {
            return t.clone();
        }
        match t {
            Type::TypeVar(v) => match from.iter().position(|f| f == v) {
                Some(i) => to.get(i).cloned().unwrap_or_else(|| t.clone()),
                None => t.clone(),
            },
            Type::Class(ct) => Type::Class(ClassType {
                sym: ct.sym,
                args: ct.args.iter().map(|a| self.subst(a, from, to)).collect(),
            }),
            Type::Array(elem) => Type::array_of(self.subst(elem, from, to)),
            Type::Wildcard(w) => Type::Wildcard(WildcardType {
                kind: w.kind,
                bound: w.bound.as_ref().map(|b| Box::new(self.subst(b, from, to))),
            }),
            Type::Method(mt) => Type::Method(self.subst_method(mt, from, to)),
            other => other.clone(),
        }
    }

    pub fn subst_method(&self, mt: &MethodType, from: &[SymbolId], to: &[Type]) -> MethodType {
        MethodType {
            params: mt.params.iter().map(|p| self.subst(p, from, to)).collect(),
            ret: Box::new(self.subst(&mt.ret, from, to)),
            thrown: mt.thrown.iter().map(|p| self.subst(p, from, to)).collect(),
            tvars: mt.tvars.iter().filter(|v| !from.contains(v)).copied().collect(),
        }
    }

    fn class_type_params(&self, sym: SymbolId) -> &[SymbolId] {
        self.symtab
            .sym(sym)
            .class_details()
            .map(|d| d.type_params.as_slice())
            .unwrap_or(&[])
    }

    /// Substitute a parameterized class type's arguments into a type
    /// declared inside that class; raw sites erase
    fn subst_site(&self, site: &ClassType, t: &Type) -> Type {
        let params = self.class_type_params(site.sym);
        if params.is_empty() {
            return t.clone();
        }
        if site.args.len() != params.len() {
            return self.erasure(t);
        }
        let args: Vec<Type> = site.args.iter().map(|a| self.capture_arg(a)).collect();
        self.subst(t, params, &args)
    }

    fn capture_arg(&self, arg: &Type) -> Type {
        match arg {
            Type::Wildcard(w) => match (&w.kind, &w.bound) {
                (BoundKind::Extends, Some(b)) | (BoundKind::Super, Some(b)) => (**b).clone(),
                _ => self.object_type(),
            },
            other => other.clone(),
        }
    }

    pub fn supertype(&self, t: &Type) -> Option<Type> {
        match t {
            Type::Class(ct) => {
                if ct.sym == self.symtab.predef.object {
                    return None;
                }
                let details = self.symtab.sym(ct.sym).class_details()?;
                let declared = match &details.supertype {
                    Some(st) => st.clone(),
                    None if self.symtab.sym(ct.sym).is_interface() => return None,
                    None => self.object_type(),
                };
                Some(self.subst_site(ct, &declared))
            }
            Type::TypeVar(_) => Some(self.upper_bound(t)),
            Type::Array(_) => Some(self.object_type()),
            _ => None,
        }
    }

    pub fn interfaces(&self, t: &Type) -> Vec<Type> {
        match t {
            Type::Class(ct) => self
                .symtab
                .sym(ct.sym)
                .class_details()
                .map(|d| d.interfaces.iter().map(|i| self.subst_site(ct, i)).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn direct_supertypes(&self, t: &Type) -> Vec<Type> {
        let mut supers = Vec::new();
        if let Some(st) = self.supertype(t) {
            supers.push(st);
        }
        supers.extend(self.interfaces(t));
        if supers.is_empty() && self.is_interface(t) {
            supers.push(self.object_type());
        }
        supers
    }

    /// The supertype of `t` whose class is `sym`, with `t`'s parameterization
    pub fn as_super(&self, t: &Type, sym: SymbolId) -> Option<Type> {
        self.as_super_depth(t, sym, 0)
    }

    fn as_super_depth(&self, t: &Type, sym: SymbolId, depth: usize) -> Option<Type> {
        if depth > 64 {
            return None;
        }
        match t {
            Type::Class(ct) if ct.sym == sym => Some(t.clone()),
            Type::Class(_) => self
                .direct_supertypes(t)
                .iter()
                .find_map(|st| self.as_super_depth(st, sym, depth + 1)),
            Type::TypeVar(_) => self.as_super_depth(&self.upper_bound(t), sym, depth + 1),
            Type::Array(_) if sym == self.symtab.predef.object => Some(self.object_type()),
            _ => None,
        }
    }

    pub fn is_same_type(&self, t: &Type, s: &Type) -> bool {
        match (t, s) {
            (Type::Class(a), Type::Class(b)) => {
                a.sym == b.sym
                    && a.args.len() == b.args.len()
                    && a.args.iter().zip(&b.args).all(|(x, y)| self.is_same_type(x, y))
            }
            (Type::Array(a), Type::Array(b)) => self.is_same_type(a, b),
            (Type::Wildcard(a), Type::Wildcard(b)) => {
                a.kind == b.kind
                    && match (&a.bound, &b.bound) {
                        (Some(x), Some(y)) => self.is_same_type(x, y),
                        (None, None) => true,
                        _ => false,
                    }
            }
            _ => t == s,
        }
    }

    /// Type argument containment: `t` is contained by `s`
    fn contains_type_arg(&self, s: &Type, t: &Type) -> bool {
        match s {
            Type::Wildcard(w) => match (&w.kind, &w.bound) {
                (BoundKind::Unbound, _) | (_, None) => true,
                (BoundKind::Extends, Some(b)) => self.is_subtype(&self.upper_bound(t), b),
                (BoundKind::Super, Some(b)) => match t {
                    Type::Wildcard(tw) if tw.kind == BoundKind::Super => {
                        tw.bound.as_ref().map(|tb| self.is_subtype(b, tb)).unwrap_or(false)
                    }
                    Type::Wildcard(_) => false,
                    _ => self.is_subtype(b, t),
                },
            },
            Type::Undet(_) => true,
            _ => matches!(t, Type::Undet(_)) || self.is_same_type(s, t),
        }
    }

    pub fn is_subtype(&self, t: &Type, s: &Type) -> bool {
        if self.is_erroneous(t) || self.is_erroneous(s) {
            return true;
        }
        match (t, s) {
            (_, Type::Undet(_)) | (Type::Undet(_), _) => !t.is_void() && !s.is_void(),
            (Type::Prim(a), Type::Prim(b)) => a.is_subrange_of(*b),
            (Type::Prim(_), _) | (_, Type::Prim(_)) => false,
            (Type::Null, _) => s.is_reference(),
            (Type::Array(a), Type::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_subtype(a, b)
                }
            }
            (Type::Array(_), Type::Class(ct)) => {
                ct.sym == self.symtab.predef.object
                    || ct.sym == self.symtab.predef.cloneable
                    || ct.sym == self.symtab.predef.serializable
            }
            (Type::TypeVar(a), Type::TypeVar(b)) if a == b => true,
            (Type::TypeVar(v), _) => self.type_var_bounds(*v).iter().any(|b| self.is_subtype(b, s)),
            (Type::Class(_), Type::Class(sc)) => match self.as_super(t, sc.sym) {
                Some(Type::Class(sup)) => {
                    sc.args.is_empty()
                        || sup.args.is_empty()
                        || (sup.args.len() == sc.args.len()
                            && sc.args.iter().zip(&sup.args).all(|(x, y)| self.contains_type_arg(x, y)))
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Method invocation conversion; boxing only in loose contexts
    pub fn is_convertible(&self, t: &Type, s: &Type, allow_boxing: bool) -> bool {
        if self.is_erroneous(t) || self.is_erroneous(s) || matches!(s, Type::Recovery) {
            return true;
        }
        if t.is_void() || s.is_void() {
            return false;
        }
        if matches!(s, Type::Undet(_)) {
            return true;
        }
        let t_prim = t.is_primitive();
        let s_prim = s.is_primitive();
        if t_prim == s_prim {
            return self.is_subtype(t, s);
        }
        if !allow_boxing {
            return false;
        }
        if t_prim {
            let boxed = self.boxed_type_or_type(t);
            self.is_subtype(&boxed, s)
        } else {
            match (self.unboxed_tag(t), s.tag()) {
                (Some(tag), Some(target)) => tag.is_subrange_of(target),
                _ => false,
            }
        }
    }

    pub fn is_assignable(&self, t: &Type, s: &Type) -> bool {
        if matches!(s, Type::Undet(_)) {
            return !t.is_void();
        }
        self.is_convertible(t, s, true)
    }

    pub fn is_castable(&self, t: &Type, s: &Type) -> bool {
        if self.is_erroneous(t) || self.is_erroneous(s) {
            return true;
        }
        match (t, s) {
            (Type::Prim(a), Type::Prim(b)) => a.is_numeric() == b.is_numeric(),
            (Type::Prim(tag), _) => self.is_subtype(&self.boxed_type(*tag), s),
            (_, Type::Prim(tag)) => {
                self.unboxed_tag(t) == Some(*tag) || self.is_subtype(&self.boxed_type(*tag), t)
            }
            (Type::Null, _) => s.is_reference(),
            _ => {
                if self.is_subtype(t, s) || self.is_subtype(s, t) {
                    return true;
                }
                let t_erased = self.erasure(t);
                let s_erased = self.erasure(s);
                if self.is_subtype(&t_erased, &s_erased) || self.is_subtype(&s_erased, &t_erased) {
                    return true;
                }
                // an interface can be cast to any non-final class type
                (self.is_interface(t) && !self.is_final(s)) || (self.is_interface(s) && !self.is_final(t))
                    || matches!(t, Type::TypeVar(_))
                    || matches!(s, Type::TypeVar(_))
            }
        }
    }

    /// Least upper bound, simplified to the first common class supertype
    pub fn lub(&self, a: &Type, b: &Type) -> Type {
        if self.is_erroneous(a) || self.is_erroneous(b) {
            return Type::Error;
        }
        if matches!(a, Type::Null) {
            return self.boxed_type_or_type(b);
        }
        if matches!(b, Type::Null) {
            return self.boxed_type_or_type(a);
        }
        let a = self.boxed_type_or_type(a);
        let b = self.boxed_type_or_type(b);
        if self.is_subtype(&a, &b) {
            return b;
        }
        if self.is_subtype(&b, &a) {
            return a;
        }
        let mut current = self.supertype(&a);
        while let Some(candidate) = current {
            if self.is_subtype(&b, &self.erasure(&candidate)) {
                return self.erasure(&candidate);
            }
            current = self.supertype(&candidate);
        }
        self.object_type()
    }

    /// Type of member `sym` as seen from `site`
    pub fn member_type(&self, site: &Type, sym: SymbolId) -> Type {
        let member = self.symtab.sym(sym);
        let owner = match member.owner {
            Some(owner) => owner,
            None => return member.ty.clone(),
        };
        match self.as_super(site, owner) {
            Some(Type::Class(ct)) => self.subst_site(&ct, &member.ty),
            _ => member.ty.clone(),
        }
    }

    /// Abstract methods of an interface that are not public Object methods
    fn abstract_methods(&self, t: &Type, out: &mut Vec<SymbolId>, depth: usize) {
        let Some(sym) = t.class_sym() else { return };
        if depth > 32 {
            return;
        }
        if let Some(members) = self.symtab.sym(sym).members() {
            for &m in self.symtab.scope(members).symbols() {
                let msym = self.symtab.sym(m);
                if msym.kind == SymbolKind::Method
                    && msym.flags.contains(Flags::ABSTRACT)
                    && !self.overrides_object_method(m)
                    && !out.iter().any(|o| self.symtab.sym(*o).name == msym.name && self.same_erased_params(*o, m))
                {
                    out.push(m);
                }
            }
        }
        for sup in self.interfaces(t) {
            self.abstract_methods(&sup, out, depth + 1);
        }
    }

    fn overrides_object_method(&self, m: SymbolId) -> bool {
        let msym = self.symtab.sym(m);
        let params = msym.ty.method_type().map(|mt| mt.params.len()).unwrap_or(0);
        matches!(
            (msym.name.as_str(), params),
            ("equals", 1) | ("hashCode", 0) | ("toString", 0)
        )
    }

    pub fn same_erased_params(&self, a: SymbolId, b: SymbolId) -> bool {
        match (self.symtab.sym(a).ty.method_type(), self.symtab.sym(b).ty.method_type()) {
            (Some(x), Some(y)) => {
                x.params.len() == y.params.len()
                    && x.params.iter().zip(&y.params).all(|(p, q)| self.erasure(p) == self.erasure(q))
            }
            _ => false,
        }
    }

    /// The single abstract method of a functional interface type
    pub fn find_descriptor_symbol(&self, t: &Type) -> Option<SymbolId> {
        if !self.is_interface(t) || self.symtab.sym(t.class_sym()?).is_annotation_type() {
            return None;
        }
        let mut methods = Vec::new();
        self.abstract_methods(t, &mut methods, 0);
        if methods.len() == 1 {
            methods.pop()
        } else {
            None
        }
    }

    /// Function type of a functional interface, as seen from `t`
    pub fn find_descriptor(&self, t: &Type) -> Option<MethodType> {
        let sym = self.find_descriptor_symbol(t)?;
        let site = self.non_wildcard_parameterization(t);
        match self.member_type(&site, sym) {
            Type::Method(mt) => Some(mt),
            _ => None,
        }
    }

    pub fn is_functional_interface(&self, t: &Type) -> bool {
        self.find_descriptor_symbol(t).is_some()
    }

    fn non_wildcard_parameterization(&self, t: &Type) -> Type {
        match t {
            Type::Class(ct) => Type::Class(ClassType {
                sym: ct.sym,
                args: ct.args.iter().map(|a| self.capture_arg(a)).collect(),
            }),
            other => other.clone(),
        }
    }

    pub fn to_string(&self, t: &Type) -> String {
        match t {
            Type::Prim(tag) => tag.name().to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "<nulltype>".to_string(),
            Type::Class(ct) => {
                let name = &self.symtab.sym(ct.sym).name;
                if ct.args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<String> = ct.args.iter().map(|a| self.to_string(a)).collect();
                    format!("{}<{}>", name, args.join(","))
                }
            }
            Type::Array(elem) => format!("{}[]", self.to_string(elem)),
            Type::TypeVar(v) | Type::Undet(v) => self.symtab.sym(*v).name.clone(),
            Type::Wildcard(w) => match (&w.kind, &w.bound) {
                (BoundKind::Extends, Some(b)) => format!("? extends {}", self.to_string(b)),
                (BoundKind::Super, Some(b)) => format!("? super {}", self.to_string(b)),
                _ => "?".to_string(),
            },
            Type::Method(mt) => {
                let params: Vec<String> = mt.params.iter().map(|p| self.to_string(p)).collect();
                format!("({}){}", params.join(","), self.to_string(&mt.ret))
            }
            Type::Partial(p) => self.to_string(&p.mtype.ret),
            Type::Package(p) => self.symtab.qualified_name(*p),
            Type::Deferred(_) => "<deferred>".to_string(),
            Type::Error | Type::Recovery => "<any>".to_string(),
            Type::None => "<none>".to_string(),
        }
    }
}

impl Type {
    pub fn as_type_var(&self) -> Option<SymbolId> {
        match self {
            Type::TypeVar(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_lattice() {
        assert!(TypeTag::Byte.is_subrange_of(TypeTag::Int));
        assert!(TypeTag::Char.is_subrange_of(TypeTag::Long));
        assert!(!TypeTag::Char.is_subrange_of(TypeTag::Short));
        assert!(!TypeTag::Short.is_subrange_of(TypeTag::Char));
        assert!(TypeTag::Long.is_subrange_of(TypeTag::Float));
        assert!(!TypeTag::Double.is_subrange_of(TypeTag::Float));
        assert!(!TypeTag::Boolean.is_subrange_of(TypeTag::Int));
    }

    #[test]
    fn subtyping_and_boxing() {
        let symtab = Symtab::new();
        let types = Types::new(&symtab);
        let integer = types.boxed_type(TypeTag::Int);
        let number = Type::class(symtab.predef.number);
        assert!(types.is_subtype(&integer, &number));
        assert!(types.is_subtype(&integer, &types.object_type()));
        assert!(!types.is_subtype(&number, &integer));
        assert!(types.is_convertible(&Type::Prim(TypeTag::Int), &integer, true));
        assert!(!types.is_convertible(&Type::Prim(TypeTag::Int), &integer, false));
        assert!(types.is_convertible(&integer, &Type::Prim(TypeTag::Long), true));
        assert_eq!(types.unboxed_tag(&integer), Some(TypeTag::Int));
    }

    #[test]
    fn parameterized_subtyping_uses_containment() {
        let symtab = Symtab::new();
        let types = Types::new(&symtab);
        let list = symtab.predef.list;
        let list_string = Type::generic(list, vec![types.string_type()]);
        let list_object = Type::generic(list, vec![types.object_type()]);
        let list_extends_object = Type::generic(
            list,
            vec![Type::Wildcard(WildcardType {
                kind: BoundKind::Extends,
                bound: Some(Box::new(types.object_type())),
            })],
        );
        assert!(!types.is_subtype(&list_string, &list_object));
        assert!(types.is_subtype(&list_string, &list_extends_object));
        assert!(types.is_subtype(&list_string, &Type::class(list)));
    }

    #[test]
    fn function_descriptor_is_substituted() {
        let symtab = Symtab::new();
        let types = Types::new(&symtab);
        let function = Type::generic(
            symtab.predef.function,
            vec![types.string_type(), types.boxed_type(TypeTag::Int)],
        );
        let descriptor = types.find_descriptor(&function).unwrap();
        assert_eq!(descriptor.params, vec![types.string_type()]);
        assert_eq!(*descriptor.ret, types.boxed_type(TypeTag::Int));
        assert!(!types.is_functional_interface(&types.string_type()));
    }

    #[test]
    fn lub_of_boxes_is_common_superclass() {
        let symtab = Symtab::new();
        let types = Types::new(&symtab);
        let lub = types.lub(&types.boxed_type(TypeTag::Int), &types.boxed_type(TypeTag::Long));
        assert_eq!(lub, Type::class(symtab.predef.number));
    }
}
