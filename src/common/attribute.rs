//! Typed annotation values attached to symbols

use super::symbol::SymbolId;
use super::types::Type;
use crate::ast::{Literal, Span};

/// Value of one annotation element
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Constant(Literal),
    Class(Type),
    Enum { ty: Type, constant: SymbolId, name: String },
    Array(Vec<AttrValue>),
    Compound(Box<Compound>),
    Error,
}

impl AttrValue {
    pub fn as_array(&self) -> &[AttrValue] {
        match self {
            AttrValue::Array(values) => values,
            single => std::slice::from_ref(single),
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            AttrValue::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self {
            AttrValue::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Constant(Literal::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Type> {
        match self {
            AttrValue::Class(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AttrValue::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementValue {
    pub name: String,
    pub element: SymbolId,
    pub value: AttrValue,
}

/// An attributed annotation: `@T(name = value, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub type_sym: SymbolId,
    pub ty: Type,
    pub values: Vec<ElementValue>,
    pub span: Span,
    /// Container annotation synthesized from repeated annotations
    pub synthesized: bool,
}

impl Compound {
    pub fn new(type_sym: SymbolId, span: Span) -> Self {
        Self {
            type_sym,
            ty: Type::class(type_sym),
            values: Vec::new(),
            span,
            synthesized: false,
        }
    }

    pub fn member(&self, name: &str) -> Option<&AttrValue> {
        self.values.iter().find(|v| v.name == name).map(|v| &v.value)
    }

    pub fn with_value(mut self, name: &str, element: SymbolId, value: AttrValue) -> Self {
        self.values.push(ElementValue {
            name: name.to_string(),
            element,
            value,
        });
        self
    }
}

/// Position of a type-use annotation within a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTarget {
    Field,
    MethodReturn,
    MethodParameter(usize),
    Throws(usize),
    ClassExtends(Option<usize>),
    ClassTypeParameterBound { param: usize, bound: usize },
    MethodTypeParameterBound { param: usize, bound: usize },
    Unknown,
}

/// One step into a nested type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypePathEntry {
    Array,
    TypeArgument(usize),
    WildcardBound,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeAnnotationPosition {
    pub target: TypeTarget,
    pub location: Vec<TypePathEntry>,
}

impl TypeAnnotationPosition {
    pub fn new(target: TypeTarget) -> Self {
        Self {
            target,
            location: Vec::new(),
        }
    }

    pub fn nested(&self, step: TypePathEntry) -> Self {
        let mut location = self.location.clone();
        location.push(step);
        Self {
            target: self.target.clone(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCompound {
    pub compound: Compound,
    pub position: TypeAnnotationPosition,
}
