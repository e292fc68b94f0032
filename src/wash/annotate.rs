//! Annotate - queued attribution of annotations
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.Annotate`. Member entry
//! does not attribute annotations directly; it queues jobs, and the queue
//! is drained once nothing blocks it. Jobs run in tiers: every declaration
//! annotation job first, then type annotations, then the checks that need
//! all annotations in place (repeated annotation containers,
//! `@FunctionalInterface`), and validation (`@Target`) last. A job may
//! queue more jobs, including jobs of an earlier tier, which then run
//! before anything else.

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace};

use super::type_annotations::{self, AnnotatedDecl};
use super::SemanticAnalyzer;
use crate::ast::{tree_info, Annotation, AnnotationArg, ClassDecl, Expr, ExprKind, Span, TypeExpr, TypeExprKind};
use crate::common::attribute::{AttrValue, Compound, ElementValue, TypeCompound};
use crate::common::const_fold::ConstFold;
use crate::common::diag::{DiagKind, Diagnostic};
use crate::common::env::{Env, ResultInfo};
use crate::common::flags::Flags;
use crate::common::symbol::{SymbolId, SymbolKind};
use crate::common::types::Type;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Normal = 0,
    TypeAnnotations = 1,
    AfterTypes = 2,
    Validate = 3,
}

/// `java.lang.annotation.RetentionPolicy`, ordered by how long an
/// annotation is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RetentionPolicy {
    Source,
    Class,
    Runtime,
}

impl RetentionPolicy {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "SOURCE" => Some(Self::Source),
            "CLASS" => Some(Self::Class),
            "RUNTIME" => Some(Self::Runtime),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Source => "SOURCE",
            Self::Class => "CLASS",
            Self::Runtime => "RUNTIME",
        }
    }
}

#[derive(Debug)]
enum AnnotateJob {
    Annotations {
        annotations: Vec<Annotation>,
        target: SymbolId,
        env: Env,
    },
    ElementDefault {
        method: SymbolId,
        value: Expr,
        env: Env,
    },
    TypeAnnotations {
        class: SymbolId,
        tree: Rc<ClassDecl>,
        env: Env,
    },
    Repeated {
        target: SymbolId,
    },
    FunctionalCheck {
        class: SymbolId,
        span: Span,
    },
    Validate {
        target: SymbolId,
    },
}

#[derive(Debug, Default)]
pub struct AnnotateQueue {
    blocked: u32,
    draining: bool,
    queues: [VecDeque<AnnotateJob>; 4],
}

impl AnnotateQueue {
    fn push(&mut self, tier: Tier, job: AnnotateJob) {
        self.queues[tier as usize].push_back(job);
    }

    fn pop(&mut self) -> Option<AnnotateJob> {
        self.queues.iter_mut().find_map(VecDeque::pop_front)
    }

    pub fn pending(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked > 0
    }

    pub(crate) fn clear(&mut self) {
        self.blocked = 0;
        self.draining = false;
        for q in self.queues.iter_mut() {
            q.clear();
        }
    }
}

impl SemanticAnalyzer {
    pub fn block_annotations(&mut self) {
        self.annotate.blocked += 1;
    }

    /// Release one block; the last release drains the queue
    pub fn unblock_annotations(&mut self) -> Result<()> {
        self.annotate.blocked = self.annotate.blocked.saturating_sub(1);
        self.flush_annotations()
    }

    /// Run queued jobs unless blocked or already draining
    pub fn flush_annotations(&mut self) -> Result<()> {
        if self.annotate.blocked > 0 || self.annotate.draining {
            return Ok(());
        }
        self.annotate.draining = true;
        let result = self.drain_annotations();
        self.annotate.draining = false;
        result
    }

    fn drain_annotations(&mut self) -> Result<()> {
        let pending = self.annotate.pending();
        if pending > 0 {
            debug!("ANNOTATE: flush ({} jobs)", pending);
        }
        while let Some(job) = self.annotate.pop() {
            self.run_annotate_job(job)?;
        }
        Ok(())
    }

    pub(crate) fn queue_annotations(&mut self, annotations: Vec<Annotation>, target: SymbolId, env: Env) {
        self.annotate.push(
            Tier::Normal,
            AnnotateJob::Annotations {
                annotations,
                target,
                env,
            },
        );
    }

    pub(crate) fn queue_element_default(&mut self, method: SymbolId, value: Expr, env: Env) {
        self.annotate
            .push(Tier::Normal, AnnotateJob::ElementDefault { method, value, env });
    }

    pub(crate) fn queue_type_annotations(&mut self, class: SymbolId, tree: Rc<ClassDecl>, env: Env) {
        self.annotate
            .push(Tier::TypeAnnotations, AnnotateJob::TypeAnnotations { class, tree, env });
    }

    pub(crate) fn queue_functional_check(&mut self, class: SymbolId, span: Span) {
        self.annotate
            .push(Tier::AfterTypes, AnnotateJob::FunctionalCheck { class, span });
    }

    fn run_annotate_job(&mut self, job: AnnotateJob) -> Result<()> {
        match job {
            AnnotateJob::Annotations {
                annotations,
                target,
                env,
            } => {
                let mut compounds = Vec::with_capacity(annotations.len());
                for annotation in &annotations {
                    if let Some(compound) = self.attribute_annotation(annotation, &env)? {
                        compounds.push(compound);
                    }
                }
                let repeated = compounds
                    .iter()
                    .enumerate()
                    .any(|(i, c)| compounds[..i].iter().any(|p| p.type_sym == c.type_sym));
                trace!(
                    "ANNOTATE: {} annotations on {}",
                    compounds.len(),
                    self.symtab.sym(target).name
                );
                self.symtab.sym_mut(target).attributes.extend(compounds);
                self.apply_annotation_flags(target);
                if repeated {
                    self.annotate
                        .push(Tier::AfterTypes, AnnotateJob::Repeated { target });
                }
                self.annotate.push(Tier::Validate, AnnotateJob::Validate { target });
            }
            AnnotateJob::ElementDefault { method, value, env } => {
                let ret = self
                    .symtab
                    .sym(method)
                    .ty
                    .method_type()
                    .map(|mt| (*mt.ret).clone())
                    .unwrap_or(Type::Error);
                let value = self.attribute_element_value(&value, &ret, &env)?;
                if let Some(details) = self.symtab.sym_mut(method).method_details_mut() {
                    details.default_value = Some(value);
                }
            }
            AnnotateJob::TypeAnnotations { class, tree, env } => {
                for found in type_annotations::collect(&tree) {
                    let owner = match found.decl {
                        AnnotatedDecl::Class => Some(class),
                        AnnotatedDecl::Member(pos) => self
                            .symtab
                            .sym(class)
                            .class_details()
                            .and_then(|d| d.decl_index.get(&pos).copied()),
                    };
                    let Some(owner) = owner else { continue };
                    if let Some(compound) = self.attribute_annotation(&found.annotation, &env)? {
                        self.symtab.sym_mut(owner).type_attributes.push(TypeCompound {
                            compound,
                            position: found.position,
                        });
                    }
                }
            }
            AnnotateJob::Repeated { target } => self.process_repeated(target)?,
            AnnotateJob::FunctionalCheck { class, span } => {
                let functional = self.symtab.predef.functional_interface;
                let sym = self.symtab.sym(class);
                if let Some(compound) = sym.attribute(functional) {
                    let span = if compound.span == Span::default() { span } else { compound.span };
                    let ty = sym.ty.clone();
                    if !self.types().is_functional_interface(&ty) {
                        let reason = Diagnostic::fragment(DiagKind::NotAFunctionalIntf, vec![class.into()]);
                        self.log.error(
                            DiagKind::BadFunctionalIntfAnno,
                            span,
                            vec![class.into(), crate::common::diag::DiagArg::Fragment(Box::new(reason))],
                        );
                    }
                }
            }
            AnnotateJob::Validate { target } => self.validate_targets(target),
        }
        Ok(())
    }

    /// Attribute one annotation; `None` when its type does not resolve
    pub(crate) fn attribute_annotation(&mut self, annotation: &Annotation, env: &Env) -> Result<Option<Compound>> {
        let type_tree = TypeExpr::new(
            TypeExprKind::Named {
                name: annotation.name.clone(),
                args: Vec::new(),
            },
            annotation.span,
        );
        let ty = self.attrib_type(&type_tree, env)?;
        let Some(type_sym) = ty.class_sym() else {
            return Ok(None);
        };
        if self.symtab.sym(type_sym).is_erroneous() {
            return Ok(None);
        }
        if !self.symtab.sym(type_sym).is_annotation_type() {
            self.log
                .error(DiagKind::NotAnnotationType, annotation.span, vec![annotation.name.clone().into()]);
            return Ok(None);
        }
        self.complete(type_sym)?;

        let mut compound = Compound::new(type_sym, annotation.span);
        for arg in &annotation.arguments {
            let (name, expr) = match arg {
                AnnotationArg::Value(e) => ("value", e),
                AnnotationArg::Named(n, e) => (n.as_str(), e),
            };
            if compound.values.iter().any(|v| v.name == name) {
                self.log
                    .error(DiagKind::DuplicateAnnotationMember, expr.span, vec![name.into(), type_sym.into()]);
                continue;
            }
            let element = self
                .symtab
                .members_named(type_sym, name)
                .into_iter()
                .find(|m| self.symtab.sym(*m).is_method());
            let Some(element) = element else {
                self.log
                    .error(DiagKind::CantResolveAnnotationElement, expr.span, vec![name.into(), type_sym.into()]);
                continue;
            };
            let expected = self
                .symtab
                .sym(element)
                .ty
                .method_type()
                .map(|mt| (*mt.ret).clone())
                .unwrap_or(Type::Error);
            let value = self.attribute_element_value(expr, &expected, env)?;
            compound.values.push(ElementValue {
                name: name.to_string(),
                element,
                value,
            });
        }

        let elements: Vec<SymbolId> = self
            .symtab
            .sym(type_sym)
            .members()
            .map(|s| self.symtab.scope(s).symbols().to_vec())
            .unwrap_or_default();
        for element in elements {
            let sym = self.symtab.sym(element);
            if !sym.is_method() || sym.is_constructor() {
                continue;
            }
            let has_default = sym.flags.contains(Flags::HAS_INIT)
                || sym.method_details().map(|d| d.default_value.is_some()).unwrap_or(false);
            if !has_default && compound.member(&sym.name).is_none() {
                let name = sym.name.clone();
                self.log.error(
                    DiagKind::AnnotationMissingDefaultValue,
                    annotation.span,
                    vec![type_sym.into(), name.into()],
                );
            }
        }
        Ok(Some(compound))
    }

    /// Attribute an element value against the element's return type
    pub(crate) fn attribute_element_value(&mut self, expr: &Expr, expected: &Type, env: &Env) -> Result<AttrValue> {
        if self.types().is_erroneous(expected) {
            return Ok(AttrValue::Error);
        }
        if let Type::Array(elem) = expected {
            if let ExprKind::NewArray(array) = &expr.kind {
                if array.elem_type.is_none() {
                    let mut values = Vec::new();
                    for item in array.init.iter().flatten() {
                        values.push(self.attribute_element_value(item, elem, env)?);
                    }
                    return Ok(AttrValue::Array(values));
                }
            }
            let single = self.attribute_element_value(expr, elem, env)?;
            return Ok(AttrValue::Array(vec![single]));
        }
        if let ExprKind::NewArray(array) = &expr.kind {
            if array.elem_type.is_none() {
                self.log
                    .error(DiagKind::AnnotationValueNotAllowableType, expr.span, vec![expected.clone().into()]);
                return Ok(AttrValue::Error);
            }
        }

        let predef_class = self.symtab.predef.class;
        match expected {
            Type::Class(ct) if ct.sym == predef_class => match &expr.kind {
                ExprKind::ClassLit(t) => Ok(AttrValue::Class(self.attrib_type(t, env)?)),
                _ => {
                    self.log.error(DiagKind::AnnotationValueMustBeClassLiteral, expr.span, vec![]);
                    Ok(AttrValue::Error)
                }
            },
            Type::Class(ct) if self.symtab.sym(ct.sym).is_enum() => {
                let constant = tree_info::name(expr).and_then(|name| {
                    self.symtab
                        .members_named(ct.sym, name)
                        .into_iter()
                        .find(|m| self.symtab.sym(*m).flags.contains(Flags::ENUM) && self.symtab.sym(*m).is_var())
                });
                match constant {
                    Some(constant) => Ok(AttrValue::Enum {
                        ty: expected.clone(),
                        constant,
                        name: self.symtab.sym(constant).name.clone(),
                    }),
                    None => {
                        self.log
                            .error(DiagKind::AnnotationValueMustBeEnumConstant, expr.span, vec![]);
                        Ok(AttrValue::Error)
                    }
                }
            }
            Type::Class(ct) if self.symtab.sym(ct.sym).is_annotation_type() => match &expr.kind {
                ExprKind::Annotation(nested) => match self.attribute_annotation(nested, env)? {
                    Some(compound) if compound.type_sym == ct.sym => Ok(AttrValue::Compound(Box::new(compound))),
                    Some(compound) => {
                        self.log.error(
                            DiagKind::IncompatibleTypes,
                            expr.span,
                            vec![compound.ty.clone().into(), expected.clone().into()],
                        );
                        Ok(AttrValue::Error)
                    }
                    None => Ok(AttrValue::Error),
                },
                _ => {
                    self.log
                        .error(DiagKind::AnnotationValueNotAllowableType, expr.span, vec![expected.clone().into()]);
                    Ok(AttrValue::Error)
                }
            },
            _ if expected.is_primitive() || self.types().is_string(expected) => {
                let mut value = expr.clone();
                let found = self.attrib_expr(&mut value, env, &ResultInfo::value(expected.clone()))?;
                if self.types().is_erroneous(&found) {
                    return Ok(AttrValue::Error);
                }
                let constant = match (&value.constant, expected.tag()) {
                    (Some(lit), Some(tag)) => ConstFold::coerce(lit, tag),
                    (Some(lit), None) => Some(lit.clone()),
                    (None, _) => None,
                };
                match constant {
                    Some(lit) => Ok(AttrValue::Constant(lit)),
                    None => {
                        self.log.error(DiagKind::AttributeValueMustBeConstant, expr.span, vec![]);
                        Ok(AttrValue::Error)
                    }
                }
            }
            _ => {
                self.log
                    .error(DiagKind::AnnotationValueNotAllowableType, expr.span, vec![expected.clone().into()]);
                Ok(AttrValue::Error)
            }
        }
    }

    /// Flags implied by well-known annotations
    fn apply_annotation_flags(&mut self, target: SymbolId) {
        let predef = &self.symtab.predef;
        let (deprecated, preview, value_based) = (predef.deprecated, predef.preview_feature, predef.value_based);
        let mut flags = Flags::NONE;
        for compound in &self.symtab.sym(target).attributes {
            if compound.type_sym == deprecated {
                flags |= Flags::DEPRECATED | Flags::DEPRECATED_ANNOTATION;
                if compound.member("forRemoval").and_then(AttrValue::as_bool) == Some(true) {
                    flags |= Flags::DEPRECATED_REMOVAL;
                }
            } else if compound.type_sym == preview {
                flags |= Flags::PREVIEW_API;
                if compound.member("reflective").and_then(AttrValue::as_bool) == Some(true) {
                    flags |= Flags::PREVIEW_REFLECTIVE;
                }
            } else if compound.type_sym == value_based {
                flags |= Flags::VALUE_BASED;
            }
        }
        self.symtab.sym_mut(target).flags |= flags;
    }

    /// Replace repeated annotations of one type by their container
    fn process_repeated(&mut self, target: SymbolId) -> Result<()> {
        let compounds = std::mem::take(&mut self.symtab.sym_mut(target).attributes);
        let mut groups: Vec<(SymbolId, Vec<Compound>)> = Vec::new();
        for compound in compounds {
            match groups.iter_mut().find(|(t, _)| *t == compound.type_sym) {
                Some((_, group)) => group.push(compound),
                None => groups.push((compound.type_sym, vec![compound])),
            }
        }
        let mut result = Vec::with_capacity(groups.len());
        for (type_sym, mut group) in groups {
            if group.len() == 1 {
                result.extend(group);
                continue;
            }
            let span = group[1].span;
            match self.repeatable_container(type_sym, span)? {
                Some((container, value_element)) => {
                    trace!(
                        "ANNOTATE: {} repeated {} times, contained in {}",
                        self.symtab.sym(type_sym).name,
                        group.len(),
                        self.symtab.sym(container).name
                    );
                    let first_span = group[0].span;
                    let values = group.into_iter().map(|c| AttrValue::Compound(Box::new(c))).collect();
                    let mut synthesized =
                        Compound::new(container, first_span).with_value("value", value_element, AttrValue::Array(values));
                    synthesized.synthesized = true;
                    result.push(synthesized);
                }
                None => {
                    group.truncate(1);
                    result.extend(group);
                }
            }
        }
        self.symtab.sym_mut(target).attributes = result;
        self.apply_annotation_flags(target);
        Ok(())
    }

    /// Container of a repeatable annotation type, validated; the second
    /// value is the container's `value` element
    fn repeatable_container(&mut self, contained: SymbolId, span: Span) -> Result<Option<(SymbolId, SymbolId)>> {
        let repeatable = self.symtab.predef.repeatable;
        let container_type = self
            .symtab
            .sym(contained)
            .attribute(repeatable)
            .and_then(|c| c.member("value"))
            .and_then(AttrValue::as_class)
            .cloned();
        let Some(container_type) = container_type else {
            self.log
                .error(DiagKind::DuplicateAnnotationMissingContainer, span, vec![contained.into()]);
            return Ok(None);
        };
        let Some(container) = container_type.class_sym() else {
            return Ok(None);
        };
        self.complete(container)?;

        let value = self
            .symtab
            .members_named(container, "value")
            .into_iter()
            .find(|m| self.symtab.sym(*m).is_method());
        let Some(value) = value else {
            self.log.error(
                DiagKind::InvalidRepeatableAnnotationNoValue,
                span,
                vec![container.into(), contained.into()],
            );
            return Ok(None);
        };
        let ret = self
            .symtab
            .sym(value)
            .ty
            .method_type()
            .map(|mt| (*mt.ret).clone())
            .unwrap_or(Type::Error);
        let expected = Type::array_of(Type::class(contained));
        if !self.types().is_same_type(&self.types().erasure(&ret), &expected) {
            self.log.error(
                DiagKind::InvalidRepeatableAnnotationValueReturn,
                span,
                vec![container.into(), ret.into(), expected.into()],
            );
            return Ok(None);
        }

        let elements: Vec<SymbolId> = self
            .symtab
            .sym(container)
            .members()
            .map(|s| self.symtab.scope(s).symbols().to_vec())
            .unwrap_or_default();
        for element in elements {
            let sym = self.symtab.sym(element);
            if !sym.is_method() || sym.is_constructor() || element == value {
                continue;
            }
            let has_default = sym.flags.contains(Flags::HAS_INIT)
                || sym.method_details().map(|d| d.default_value.is_some()).unwrap_or(false);
            if !has_default {
                self.log.error(
                    DiagKind::InvalidRepeatableAnnotation,
                    span,
                    vec![container.into(), element.into()],
                );
                return Ok(None);
            }
        }

        let container_retention = self.retention(container);
        let contained_retention = self.retention(contained);
        if container_retention < contained_retention {
            self.log.error(
                DiagKind::InvalidRepeatableAnnotationRetention,
                span,
                vec![
                    container.into(),
                    container_retention.name().into(),
                    contained.into(),
                    contained_retention.name().into(),
                ],
            );
            return Ok(None);
        }
        for (meta, kind) in [
            (self.symtab.predef.documented, DiagKind::InvalidRepeatableAnnotationNotDocumented),
            (self.symtab.predef.inherited, DiagKind::InvalidRepeatableAnnotationNotInherited),
        ] {
            let on_contained = self.symtab.sym(contained).attribute(meta).is_some();
            if on_contained && self.symtab.sym(container).attribute(meta).is_none() {
                self.log.error(kind, span, vec![container.into(), contained.into()]);
                return Ok(None);
            }
        }

        if let (Some(container_targets), Some(contained_targets)) =
            (self.annotation_targets(container), self.annotation_targets(contained))
        {
            if !container_targets.iter().all(|t| contained_targets.contains(t)) {
                self.log.error(
                    DiagKind::InvalidRepeatableAnnotationNotApplicable,
                    span,
                    vec![container.into(), contained.into()],
                );
                return Ok(None);
            }
        }
        Ok(Some((container, value)))
    }

    /// Retention policy from `@Retention`, `CLASS` when absent
    fn retention(&self, annotation_type: SymbolId) -> RetentionPolicy {
        let retention = self.symtab.predef.retention;
        self.symtab
            .sym(annotation_type)
            .attribute(retention)
            .and_then(|c| c.member("value"))
            .and_then(AttrValue::enum_name)
            .and_then(RetentionPolicy::from_name)
            .unwrap_or(RetentionPolicy::Class)
    }

    /// Element kinds named by an annotation type's `@Target`, if any
    fn annotation_targets(&self, annotation_type: SymbolId) -> Option<Vec<String>> {
        let target = self.symtab.predef.target;
        let value = self.symtab.sym(annotation_type).attribute(target)?.member("value")?;
        Some(
            value
                .as_array()
                .iter()
                .filter_map(|v| v.enum_name().map(str::to_string))
                .collect(),
        )
    }

    /// Element kinds a declaration counts as for `@Target` checks
    fn element_kinds(&self, target: SymbolId) -> Vec<&'static str> {
        let sym = self.symtab.sym(target);
        match sym.kind {
            SymbolKind::Package => vec!["PACKAGE"],
            SymbolKind::Class if sym.is_annotation_type() => vec!["ANNOTATION_TYPE", "TYPE"],
            SymbolKind::Class => vec!["TYPE"],
            SymbolKind::Method if sym.is_constructor() => vec!["CONSTRUCTOR"],
            SymbolKind::Method => vec!["METHOD"],
            SymbolKind::TypeVar => vec!["TYPE_PARAMETER"],
            SymbolKind::Var if sym.flags.contains(Flags::PARAMETER) => vec!["PARAMETER"],
            SymbolKind::Var => {
                let owner_is_class = sym
                    .owner
                    .map(|o| self.symtab.sym(o).kind == SymbolKind::Class)
                    .unwrap_or(false);
                if !owner_is_class {
                    return vec!["LOCAL_VARIABLE"];
                }
                let is_component = sym
                    .owner
                    .and_then(|o| self.symtab.sym(o).class_details())
                    .map(|d| d.record_components.contains(&target))
                    .unwrap_or(false);
                if is_component {
                    vec!["RECORD_COMPONENT", "FIELD", "METHOD", "PARAMETER"]
                } else {
                    vec!["FIELD"]
                }
            }
            SymbolKind::Error => Vec::new(),
        }
    }

    fn validate_targets(&mut self, target: SymbolId) {
        let kinds = self.element_kinds(target);
        if kinds.is_empty() {
            return;
        }
        let type_use_ok = kinds.iter().any(|k| {
            matches!(
                *k,
                "TYPE" | "FIELD" | "METHOD" | "PARAMETER" | "LOCAL_VARIABLE" | "TYPE_PARAMETER" | "RECORD_COMPONENT"
            )
        });
        let checks: Vec<(SymbolId, Span)> = self
            .symtab
            .sym(target)
            .attributes
            .iter()
            .map(|c| (c.type_sym, c.span))
            .collect();
        for (type_sym, span) in checks {
            let Some(targets) = self.annotation_targets(type_sym) else {
                continue;
            };
            let applicable = targets
                .iter()
                .any(|t| kinds.contains(&t.as_str()) || (t == "TYPE_USE" && type_use_ok));
            if !applicable {
                self.log
                    .error(DiagKind::AnnotationTypeNotApplicable, span, vec![type_sym.into()]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn target_of(job: AnnotateJob) -> SymbolId {
        match job {
            AnnotateJob::Validate { target } | AnnotateJob::Repeated { target } => target,
            AnnotateJob::FunctionalCheck { class, .. } => class,
            other => panic!("unexpected job {:?}", other),
        }
    }

    #[test]
    fn earlier_tiers_run_first() {
        let mut queue = AnnotateQueue::default();
        queue.push(Tier::Validate, AnnotateJob::Validate { target: SymbolId(1) });
        queue.push(Tier::AfterTypes, AnnotateJob::Repeated { target: SymbolId(2) });
        queue.push(
            Tier::TypeAnnotations,
            AnnotateJob::FunctionalCheck {
                class: SymbolId(3),
                span: Span::default(),
            },
        );
        queue.push(Tier::Normal, AnnotateJob::Validate { target: SymbolId(4) });
        queue.push(Tier::Normal, AnnotateJob::Validate { target: SymbolId(5) });

        let order: Vec<SymbolId> = std::iter::from_fn(|| queue.pop()).map(target_of).collect();
        assert_eq!(order, vec![SymbolId(4), SymbolId(5), SymbolId(3), SymbolId(2), SymbolId(1)]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn queue_drains_on_last_unblock() {
        let mut sa = SemanticAnalyzer::new(Config::default());
        let object = sa.symtab.predef.object;
        sa.block_annotations();
        sa.block_annotations();
        sa.annotate.push(Tier::Validate, AnnotateJob::Validate { target: object });

        sa.flush_annotations().unwrap();
        assert_eq!(sa.pending_annotations(), 1);
        sa.unblock_annotations().unwrap();
        assert!(sa.annotate.is_blocked());
        assert_eq!(sa.pending_annotations(), 1);
        sa.unblock_annotations().unwrap();
        assert!(!sa.annotate.is_blocked());
        assert_eq!(sa.pending_annotations(), 0);
    }

    #[test]
    fn flush_while_draining_is_ignored() {
        let mut sa = SemanticAnalyzer::new(Config::default());
        let object = sa.symtab.predef.object;
        sa.annotate.push(Tier::Validate, AnnotateJob::Validate { target: object });
        sa.annotate.draining = true;
        sa.flush_annotations().unwrap();
        assert_eq!(sa.pending_annotations(), 1);

        sa.annotate.draining = false;
        sa.flush_annotations().unwrap();
        assert_eq!(sa.pending_annotations(), 0);
        assert!(!sa.log.has_errors());
    }

    #[test]
    fn retention_policies_are_ordered() {
        assert!(RetentionPolicy::Source < RetentionPolicy::Class);
        assert!(RetentionPolicy::Class < RetentionPolicy::Runtime);
        assert_eq!(RetentionPolicy::from_name("RUNTIME"), Some(RetentionPolicy::Runtime));
        assert_eq!(RetentionPolicy::from_name("LATER"), None);
    }
}
