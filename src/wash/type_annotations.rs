//! Type annotations in class and member signatures
//!
//! Corresponds to JavaC's `com.sun.tools.javac.code.TypeAnnotations`.
//! The scanner walks the signature parts of a class declaration (not
//! bodies, not nested classes) and records every annotation written on a
//! type together with its [`TypeAnnotationPosition`]: which part of the
//! signature it sits in and the path into nested array, type argument and
//! wildcard types.

use crate::ast::{Annotation, ClassDecl, ClassMember, Pos, TypeExpr, TypeExprKind, TypeParam};
use crate::common::attribute::{TypeAnnotationPosition, TypePathEntry, TypeTarget};

/// Declaration whose signature holds a type annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotatedDecl {
    Class,
    /// Field or method, by declaration position
    Member(Pos),
}

#[derive(Debug, Clone)]
pub struct SignatureAnnotation {
    pub decl: AnnotatedDecl,
    pub position: TypeAnnotationPosition,
    pub annotation: Annotation,
}

/// Collect the type annotations of `class`'s own signatures
pub fn collect(class: &ClassDecl) -> Vec<SignatureAnnotation> {
    let mut scanner = SignatureScanner { found: Vec::new() };
    scanner.scan_class(class);
    scanner.found
}

struct SignatureScanner {
    found: Vec<SignatureAnnotation>,
}

impl SignatureScanner {
    fn scan_class(&mut self, class: &ClassDecl) {
        if let Some(ext) = &class.extends {
            self.scan_type(AnnotatedDecl::Class, ext, TypeAnnotationPosition::new(TypeTarget::ClassExtends(None)));
        }
        for (i, imp) in class.implements.iter().enumerate() {
            self.scan_type(
                AnnotatedDecl::Class,
                imp,
                TypeAnnotationPosition::new(TypeTarget::ClassExtends(Some(i))),
            );
        }
        self.scan_type_params(AnnotatedDecl::Class, &class.type_params, true);

        for member in &class.members {
            match member {
                ClassMember::Field(var) => {
                    if let Some(t) = &var.var_type {
                        let decl = AnnotatedDecl::Member(var.span.pos());
                        self.scan_type(decl, t, TypeAnnotationPosition::new(TypeTarget::Field));
                    }
                }
                ClassMember::Method(method) => {
                    let decl = AnnotatedDecl::Member(method.span.pos());
                    if let Some(rt) = &method.return_type {
                        self.scan_type(decl, rt, TypeAnnotationPosition::new(TypeTarget::MethodReturn));
                    }
                    for (i, param) in method.params.iter().enumerate() {
                        if let Some(t) = &param.var_type {
                            self.scan_type(decl, t, TypeAnnotationPosition::new(TypeTarget::MethodParameter(i)));
                        }
                    }
                    for (i, thrown) in method.throws.iter().enumerate() {
                        self.scan_type(decl, thrown, TypeAnnotationPosition::new(TypeTarget::Throws(i)));
                    }
                    self.scan_type_params(decl, &method.type_params, false);
                }
                _ => {}
            }
        }
    }

    fn scan_type_params(&mut self, decl: AnnotatedDecl, params: &[TypeParam], class_level: bool) {
        for (param, tp) in params.iter().enumerate() {
            for (bound, t) in tp.bounds.iter().enumerate() {
                let target = if class_level {
                    TypeTarget::ClassTypeParameterBound { param, bound }
                } else {
                    TypeTarget::MethodTypeParameterBound { param, bound }
                };
                self.scan_type(decl, t, TypeAnnotationPosition::new(target));
            }
        }
    }

    fn scan_type(&mut self, decl: AnnotatedDecl, t: &TypeExpr, position: TypeAnnotationPosition) {
        match &t.kind {
            TypeExprKind::Annotated { annotations, underlying } => {
                for annotation in annotations {
                    self.found.push(SignatureAnnotation {
                        decl,
                        position: position.clone(),
                        annotation: annotation.clone(),
                    });
                }
                self.scan_type(decl, underlying, position);
            }
            TypeExprKind::Array(elem) => self.scan_type(decl, elem, position.nested(TypePathEntry::Array)),
            TypeExprKind::Named { args, .. } => {
                for (i, arg) in args.iter().enumerate() {
                    self.scan_type(decl, arg, position.nested(TypePathEntry::TypeArgument(i)));
                }
            }
            TypeExprKind::Wildcard { bound: Some(bound), .. } => {
                self.scan_type(decl, bound, position.nested(TypePathEntry::WildcardBound));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Modifier, TreeMaker};
    use crate::common::types::BoundKind;

    #[test]
    fn finds_annotations_with_their_paths() {
        let m = TreeMaker::new();
        let nonnull = m.marker("NonNull");
        let elem = m.annotated_type(vec![nonnull.clone()], m.named("String"));
        let list = m.generic("List", vec![elem]);
        let field = m.field(&[Modifier::Private], list, "names", None);
        let ret = m.array_type(m.annotated_type(vec![nonnull], m.named("Object")));
        let method = m.abstract_method(&[], ret, "all", vec![]);
        let class = m.class(&[], "Holder", vec![field, method]);

        let found = collect(&class);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].position.target, TypeTarget::Field);
        assert_eq!(found[0].position.location, vec![TypePathEntry::TypeArgument(0)]);
        assert_eq!(found[1].position.target, TypeTarget::MethodReturn);
        assert_eq!(found[1].position.location, vec![TypePathEntry::Array]);
    }

    #[test]
    fn wildcard_bounds_and_supertypes() {
        let m = TreeMaker::new();
        let bound = m.annotated_type(vec![m.marker("A")], m.named("Number"));
        let sup = m.generic("Base", vec![m.wildcard(BoundKind::Extends, Some(bound))]);
        let mut class = m.class(&[], "C", vec![]);
        class.extends = Some(sup);

        let found = collect(&class);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].decl, AnnotatedDecl::Class);
        assert_eq!(found[0].position.target, TypeTarget::ClassExtends(None));
        assert_eq!(
            found[0].position.location,
            vec![TypePathEntry::TypeArgument(0), TypePathEntry::WildcardBound]
        );
    }
}
