//! Pattern binding scopes and instanceof lowering

mod common;

use common::*;
use tolc_sema::ast::{AstPrinter, Modifier, Stmt, TreeMaker};
use tolc_sema::common::DiagKind;

/// `static void test(Object o) { <body> }`
fn with_object_param(m: &TreeMaker, name: &str, body: Vec<Stmt>) -> tolc_sema::ast::CompilationUnit {
    let method = m.method(
        &[Modifier::Static],
        m.void_type(),
        "test",
        vec![m.param(m.named("Object"), "o")],
        body,
    );
    unit_of(m, m.class(&[], name, vec![method]))
}

#[test]
fn test_negated_instanceof_binding_flows_past_if() {
    let m = TreeMaker::new();
    let test = m.not(m.parens(m.instance_of_binding(m.ident("o"), m.named("String"), "s")));
    let body = vec![
        m.if_stmt(test, m.ret_void(), None),
        m.local(m.int_type(), "n", Some(m.call_on(m.ident("s"), "length", vec![]))),
    ];
    let mut units = vec![with_object_param(&m, "Guarded", body)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let printed = AstPrinter::with_symtab(sa.symtab()).print_class(&units[0].type_decls[0]);
    assert!(printed.contains("(String)o"), "{}", printed);
    assert!(!printed.contains("instanceof String s"), "{}", printed);
}

#[test]
fn test_positive_instanceof_binding_does_not_flow_past_if() {
    let m = TreeMaker::new();
    let test = m.instance_of_binding(m.ident("o"), m.named("String"), "s");
    let body = vec![
        m.if_stmt(test, m.ret_void(), None),
        m.local(m.named("Object"), "t", Some(m.ident("s"))),
    ];
    let mut units = vec![with_object_param(&m, "Leaky", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantResolveLocation]);
}

#[test]
fn test_binding_in_then_branch() {
    let m = TreeMaker::new();
    let test = m.instance_of_binding(m.ident("o"), m.named("String"), "s");
    let then = m.block_stmt(vec![m.local(
        m.prim(tolc_sema::common::TypeTag::Char),
        "c",
        Some(m.call_on(m.ident("s"), "charAt", vec![m.int(0)])),
    )]);
    let mut units = vec![with_object_param(&m, "Then", vec![m.if_stmt(test, then, None)])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_binding_visible_in_conditional_and() {
    let m = TreeMaker::new();
    let cond = m.and(
        m.instance_of_binding(m.ident("o"), m.named("String"), "s"),
        m.call_on(m.ident("s"), "isEmpty", vec![]),
    );
    let body = vec![m.local(m.boolean_type(), "empty", Some(cond))];
    let mut units = vec![with_object_param(&m, "Both", body)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_binding_visible_after_conditional_or_negation() {
    let m = TreeMaker::new();
    let cond = m.or(
        m.not(m.parens(m.instance_of_binding(m.ident("o"), m.named("String"), "s"))),
        m.call_on(m.ident("s"), "isEmpty", vec![]),
    );
    let body = vec![
        m.if_stmt(cond, m.ret_void(), None),
        m.local(m.int_type(), "n", Some(m.call_on(m.ident("s"), "length", vec![]))),
    ];
    let mut units = vec![with_object_param(&m, "Either", body)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_binding_not_visible_in_conditional_or_right_operand() {
    let m = TreeMaker::new();
    let cond = m.or(
        m.instance_of_binding(m.ident("o"), m.named("String"), "s"),
        m.call_on(m.ident("s"), "isEmpty", vec![]),
    );
    let body = vec![m.local(m.boolean_type(), "either", Some(cond))];
    let mut units = vec![with_object_param(&m, "Wrong", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantResolveLocation]);
}
