//! Declaration annotations, their validation and deprecation lint

mod common;

use common::*;
use tolc_sema::ast::{Annotation, AnnotationArg, ClassDecl, ClassMember, CompilationUnit, Literal, TreeMaker};
use tolc_sema::common::AttrValue;
use tolc_sema::common::DiagKind;
use tolc_sema::config::LintCategory;
use tolc_sema::Config;

/// `@Deprecated[(forRemoval = true)] class Old {}` and a class declaring an `Old` local
fn deprecated_use(m: &TreeMaker, for_removal: bool, suppress: Option<&str>) -> Vec<CompilationUnit> {
    let mut old = m.class(&[], "Old", vec![]);
    old.annotations.push(if for_removal {
        m.annotation("Deprecated", vec![AnnotationArg::Named("forRemoval".into(), m.boolean(true))])
    } else {
        m.marker("Deprecated")
    });
    let body = vec![m.local(m.named("Old"), "o", Some(m.null()))];
    let mut user = m.class(&[], "User", vec![m.method(&[], m.void_type(), "use", vec![], body)]);
    if let Some(category) = suppress {
        user.annotations
            .push(m.annotation("SuppressWarnings", vec![AnnotationArg::Value(m.string(category))]));
    }
    vec![unit_of(m, old), unit_of(m, user)]
}

fn annotated(mut class: ClassDecl, annotations: Vec<Annotation>) -> ClassDecl {
    class.annotations.extend(annotations);
    class
}

#[test]
fn test_deprecation_lint_is_off_by_default() {
    let m = TreeMaker::new();
    let mut units = deprecated_use(&m, false, None);
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
    assert_eq!(sa.log().count_of(DiagKind::HasBeenDeprecated), 0);
}

#[test]
fn test_deprecated_class_use_warns() {
    let m = TreeMaker::new();
    let mut units = deprecated_use(&m, false, None);
    let sa = analyze_with(Config::default().with_lint(vec![LintCategory::Deprecation]), &mut units);
    assert_no_errors(&sa);
    assert_eq!(sa.log().count_of(DiagKind::HasBeenDeprecated), 1);
}

#[test]
fn test_removal_warns_by_default() {
    let m = TreeMaker::new();
    let mut units = deprecated_use(&m, true, None);
    let sa = analyze(&mut units);
    assert_eq!(sa.log().count_of(DiagKind::HasBeenDeprecatedForRemoval), 1);
    assert_eq!(sa.log().count_of(DiagKind::HasBeenDeprecated), 0);
}

#[test]
fn test_suppress_warnings_silences_removal() {
    let m = TreeMaker::new();
    let mut units = deprecated_use(&m, true, Some("removal"));
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
    assert_eq!(sa.log().warning_count(), 0);
}

#[test]
fn test_override_is_not_applicable_to_fields() {
    let m = TreeMaker::new();
    let mut field = m.field(&[], m.int_type(), "count", None);
    if let ClassMember::Field(var) = &mut field {
        var.annotations.push(m.marker("Override"));
    }
    let mut units = vec![unit_of(&m, m.class(&[], "Counter", vec![field]))];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::AnnotationTypeNotApplicable]);
}

#[test]
fn test_functional_interface_needs_one_abstract_method() {
    let m = TreeMaker::new();
    let two = m.interface(
        &[],
        "Two",
        vec![
            m.abstract_method(&[], m.void_type(), "first", vec![]),
            m.abstract_method(&[], m.void_type(), "second", vec![]),
        ],
    );
    let one = m.interface(&[], "One", vec![m.abstract_method(&[], m.void_type(), "only", vec![])]);
    let mut units = vec![
        unit_of(&m, annotated(two, vec![m.marker("FunctionalInterface")])),
        unit_of(&m, annotated(one, vec![m.marker("FunctionalInterface")])),
    ];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::BadFunctionalIntfAnno]);
}

#[test]
fn test_repeated_annotation_without_container() {
    let m = TreeMaker::new();
    let tag = m.annotation_type(&[], "Tag", vec![]);
    let tagged = annotated(m.class(&[], "Tagged", vec![]), vec![m.marker("Tag"), m.marker("Tag")]);
    let mut units = vec![unit_of(&m, tag), unit_of(&m, tagged)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::DuplicateAnnotationMissingContainer]);
}

#[test]
fn test_element_without_default_must_be_given() {
    let m = TreeMaker::new();
    let named = m.annotation_type(
        &[],
        "Named",
        vec![
            m.element(m.named("String"), "value", None),
            m.element(m.int_type(), "rank", Some(m.int(0))),
        ],
    );
    let bare = annotated(m.class(&[], "Bare", vec![]), vec![m.marker("Named")]);
    let given = annotated(
        m.class(&[], "Given", vec![]),
        vec![m.annotation("Named", vec![AnnotationArg::Value(m.string("x"))])],
    );
    let mut units = vec![unit_of(&m, named), unit_of(&m, bare), unit_of(&m, given)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::AnnotationMissingDefaultValue]);
}

#[test]
fn test_unknown_element_name() {
    let m = TreeMaker::new();
    let old = annotated(
        m.class(&[], "Old", vec![]),
        vec![m.annotation("Deprecated", vec![AnnotationArg::Named("reason".into(), m.string("x"))])],
    );
    let mut units = vec![unit_of(&m, old)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantResolveAnnotationElement]);
}

/// `@interface Tag { String value(); }` marked `@Repeatable(Tags.class)`,
/// `@interface Tags { Tag[] value(); }`, and a class tagged "a" then "b".
/// Both unit lists import `java.lang.annotation.*`.
fn repeated_tags(m: &TreeMaker, tag_meta: Vec<Annotation>, tags_meta: Vec<Annotation>) -> Vec<CompilationUnit> {
    let mut tag = m.annotation_type(&[], "Tag", vec![m.element(m.named("String"), "value", None)]);
    tag.annotations
        .push(m.annotation("Repeatable", vec![AnnotationArg::Value(m.class_lit(m.named("Tags")))]));
    tag.annotations.extend(tag_meta);
    let tags = annotated(
        m.annotation_type(&[], "Tags", vec![m.element(m.array_type(m.named("Tag")), "value", None)]),
        tags_meta,
    );
    let tagged = annotated(
        m.class(&[], "Tagged", vec![]),
        vec![
            m.annotation("Tag", vec![AnnotationArg::Value(m.string("a"))]),
            m.annotation("Tag", vec![AnnotationArg::Value(m.string("b"))]),
        ],
    );
    [tag, tags, tagged]
        .into_iter()
        .map(|class| {
            let file = format!("{}.java", class.name);
            m.unit(&file, None, vec![m.import("java.lang.annotation", true)], vec![class])
        })
        .collect()
}

fn runtime(m: &TreeMaker) -> Annotation {
    m.annotation("Retention", vec![AnnotationArg::Value(m.ident("RUNTIME"))])
}

#[test]
fn test_repeated_annotations_are_contained_in_source_order() {
    let m = TreeMaker::new();
    let mut units = repeated_tags(&m, vec![runtime(&m)], vec![runtime(&m)]);
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let symtab = sa.symtab();
    let tagged = symtab.sym(class_sym(&sa, "Tagged"));
    assert_eq!(tagged.attributes.len(), 1);
    let container = &tagged.attributes[0];
    assert_eq!(container.type_sym, class_sym(&sa, "Tags"));
    assert!(container.synthesized);
    let values: Vec<&AttrValue> = container
        .member("value")
        .expect("container value")
        .as_array()
        .iter()
        .map(|v| v.as_compound().and_then(|c| c.member("value")).expect("tag value"))
        .collect();
    assert_eq!(
        values,
        vec![
            &AttrValue::Constant(Literal::String("a".into())),
            &AttrValue::Constant(Literal::String("b".into())),
        ]
    );
}

#[test]
fn test_container_retention_must_cover_contained() {
    let m = TreeMaker::new();
    // Tags keeps the default CLASS retention
    let mut units = repeated_tags(&m, vec![runtime(&m)], vec![]);
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::InvalidRepeatableAnnotationRetention]);
    // the annotations are kept as written, minus the repetition
    let tagged = sa.symtab().sym(class_sym(&sa, "Tagged"));
    assert_eq!(tagged.attributes.len(), 1);
    assert_eq!(tagged.attributes[0].type_sym, class_sym(&sa, "Tag"));
}

#[test]
fn test_container_must_be_documented_like_contained() {
    let m = TreeMaker::new();
    let mut units = repeated_tags(&m, vec![m.marker("Documented")], vec![]);
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::InvalidRepeatableAnnotationNotDocumented]);
}

#[test]
fn test_container_must_be_inherited_like_contained() {
    let m = TreeMaker::new();
    let mut units = repeated_tags(&m, vec![m.marker("Inherited")], vec![m.marker("Documented")]);
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::InvalidRepeatableAnnotationNotInherited]);
}
