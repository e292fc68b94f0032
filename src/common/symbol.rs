//! Symbols - semantic entities living in the symbol arena
//!
//! Every declared entity (package, class, method, variable, type variable)
//! is a [`Symbol`] stored in the [`Symtab`](super::symtab::Symtab) arena and
//! referenced by [`SymbolId`]. Owner links point toward the root package;
//! children are found through member scopes, never through stored pointers.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::attribute::{AttrValue, Compound, TypeCompound};
use super::env::Env;
use super::flags::Flags;
use super::scope::ScopeId;
use super::types::Type;
use crate::ast::{ClassDecl, ClassKind, Expr, Literal, Pos, Span};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

/// Handle of an operator symbol in the operator tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Package,
    Class,
    Method,
    Var,
    TypeVar,
    /// Placeholder produced by failed resolution
    Error,
}

/// Where a symbol stands in the entry pipeline.
///
/// Lookups that need members or supertypes must check the state first;
/// `Completing` marks a class whose header is being resolved right now and
/// is the cycle guard for inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionState {
    Unentered,
    Entering,
    Entered,
    Completing,
    Complete,
    Error,
}

/// Deferred work that fills in a class symbol on first use
#[derive(Debug, Clone, Default)]
pub enum Completer {
    #[default]
    None,
    /// Member entry from a source (or provider supplied) class declaration
    Source { tree: Rc<ClassDecl>, env: Env },
}

/// Lazily evaluated constant value of a final variable
#[derive(Debug, Clone, Default)]
pub enum ConstValue {
    #[default]
    None,
    Pending { init: Rc<Expr>, env: Env },
    Evaluating,
    Value(Literal),
}

impl ConstValue {
    pub fn value(&self) -> Option<&Literal> {
        match self {
            ConstValue::Value(lit) => Some(lit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDetails {
    pub class_kind: ClassKind,
    /// Binary name, e.g. `p.Outer$Inner` or `p.Outer$1`
    pub flat_name: String,
    /// Canonical name, e.g. `p.Outer.Inner`
    pub full_name: String,
    pub members: ScopeId,
    pub supertype: Option<Type>,
    pub interfaces: Vec<Type>,
    pub type_params: Vec<SymbolId>,
    pub completer: Completer,
    /// Environment of the class body, available once entered
    pub env: Option<Env>,
    /// Scope the class symbol itself was entered into
    pub home_scope: Option<ScopeId>,
    pub source_file: Option<String>,
    /// Member symbols keyed by the source position of their declaration
    pub decl_index: HashMap<Pos, SymbolId>,
    /// Counter for synthesized local and anonymous class names
    pub local_classes: u32,
    pub record_components: Vec<SymbolId>,
}

impl ClassDetails {
    pub fn new(class_kind: ClassKind, flat_name: String, full_name: String, members: ScopeId) -> Self {
        Self {
            class_kind,
            flat_name,
            full_name,
            members,
            supertype: None,
            interfaces: Vec::new(),
            type_params: Vec::new(),
            completer: Completer::None,
            env: None,
            home_scope: None,
            source_file: None,
            decl_index: HashMap::new(),
            local_classes: 0,
            record_components: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MethodDetails {
    pub params: Vec<SymbolId>,
    pub type_params: Vec<SymbolId>,
    /// Default value of an annotation type element
    pub default_value: Option<AttrValue>,
}

#[derive(Debug, Clone)]
pub enum SymbolDetails {
    Package { full_name: String, members: ScopeId },
    Class(Box<ClassDetails>),
    Method(MethodDetails),
    Var { const_value: ConstValue },
    TypeVar { bounds: Vec<Type> },
    Error,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub owner: Option<SymbolId>,
    pub flags: Flags,
    pub ty: Type,
    pub state: CompletionState,
    pub span: Span,
    /// Declaration annotations
    pub attributes: Vec<Compound>,
    /// Type-use annotations found in the signature
    pub type_attributes: Vec<TypeCompound>,
    pub details: SymbolDetails,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, owner: Option<SymbolId>, details: SymbolDetails) -> Self {
        Self {
            kind,
            name: name.into(),
            owner,
            flags: Flags::NONE,
            ty: Type::None,
            state: CompletionState::Entering,
            span: Span::default(),
            attributes: Vec::new(),
            type_attributes: Vec::new(),
            details,
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind == SymbolKind::Class
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    pub fn is_var(&self) -> bool {
        self.kind == SymbolKind::Var
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == SymbolKind::Method && self.name == "<init>"
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(Flags::STATIC)
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(Flags::INTERFACE)
    }

    pub fn is_enum(&self) -> bool {
        self.flags.contains(Flags::ENUM)
    }

    pub fn is_annotation_type(&self) -> bool {
        self.flags.contains(Flags::ANNOTATION)
    }

    pub fn is_erroneous(&self) -> bool {
        self.kind == SymbolKind::Error || self.state == CompletionState::Error
    }

    pub fn class_details(&self) -> Option<&ClassDetails> {
        match &self.details {
            SymbolDetails::Class(details) => Some(details),
            _ => None,
        }
    }

    pub fn class_details_mut(&mut self) -> Option<&mut ClassDetails> {
        match &mut self.details {
            SymbolDetails::Class(details) => Some(details),
            _ => None,
        }
    }

    pub fn method_details(&self) -> Option<&MethodDetails> {
        match &self.details {
            SymbolDetails::Method(details) => Some(details),
            _ => None,
        }
    }

    pub fn method_details_mut(&mut self) -> Option<&mut MethodDetails> {
        match &mut self.details {
            SymbolDetails::Method(details) => Some(details),
            _ => None,
        }
    }

    /// Member scope of a class or package
    pub fn members(&self) -> Option<ScopeId> {
        match &self.details {
            SymbolDetails::Class(details) => Some(details.members),
            SymbolDetails::Package { members, .. } => Some(*members),
            _ => None,
        }
    }

    /// Folded value of a constant variable
    pub fn const_value(&self) -> Option<&Literal> {
        match &self.details {
            SymbolDetails::Var { const_value } => const_value.value(),
            _ => None,
        }
    }

    pub fn has_attribute(&self, annotation_type: SymbolId) -> bool {
        self.attributes.iter().any(|c| c.type_sym == annotation_type)
    }

    pub fn attribute(&self, annotation_type: SymbolId) -> Option<&Compound> {
        self.attributes.iter().find(|c| c.type_sym == annotation_type)
    }
}
