//! Lambdas, generic method inference and recovery of bad calls

mod common;

use common::*;
use tolc_sema::ast::{ClassMember, Modifier, Stmt, TreeMaker};
use tolc_sema::common::{DiagKind, Type, TypeTag};

/// `class <name> { static void run(Runnable r) {} static void test() { <body> } }`
fn with_runner(m: &TreeMaker, name: &str, body: Vec<Stmt>, imports: &[&str]) -> tolc_sema::ast::CompilationUnit {
    let runner = m.method(
        &[Modifier::Static],
        m.void_type(),
        "run",
        vec![m.param(m.named("Runnable"), "r")],
        vec![],
    );
    let test = m.method(&[Modifier::Static], m.void_type(), "test", vec![], body);
    let imports = imports.iter().map(|i| m.import(i, false)).collect();
    m.unit(&format!("{}.java", name), None, imports, vec![m.class(&[], name, vec![runner, test])])
}

#[test]
fn test_implicit_lambda_against_function() {
    let m = TreeMaker::new();
    let target = m.generic("Function", vec![m.named("String"), m.named("Integer")]);
    let lambda = m.lambda_implicit(&["s"], m.call_on(m.ident("s"), "length", vec![]));
    let body = vec![m.local(target, "f", Some(lambda))];
    let mut units = vec![with_runner(&m, "Fn", body, &["java.util.function.Function"])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_block_lambda_against_supplier() {
    let m = TreeMaker::new();
    let target = m.generic("Supplier", vec![m.named("String")]);
    let lambda = m.lambda_implicit_block(&[], vec![m.ret(m.string("x"))]);
    let body = vec![m.local(target, "s", Some(lambda))];
    let mut units = vec![with_runner(&m, "Supply", body, &["java.util.function.Supplier"])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_statement_lambda_is_void_compatible() {
    let m = TreeMaker::new();
    let lambda = m.lambda_implicit(&[], m.call_on(m.string("a"), "length", vec![]));
    let body = vec![m.exec(m.call("run", vec![lambda]))];
    let mut units = vec![with_runner(&m, "Stmt", body, &[])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_var_cannot_infer_from_lambda() {
    let m = TreeMaker::new();
    let body = vec![m.local_var("f", m.lambda_implicit(&["x"], m.ident("x")))];
    let mut units = vec![with_runner(&m, "NoTarget", body, &[])];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantInferLocalVarType]);
}

#[test]
fn test_value_lambda_passed_to_runnable_is_reported_once() {
    let m = TreeMaker::new();
    let body = vec![m.exec(m.call("run", vec![m.lambda_implicit(&[], m.int(5))]))];
    let mut units = vec![with_runner(&m, "Recover", body, &[])];
    let sa = analyze(&mut units);
    assert_eq!(sa.log().error_count(), 1);
    assert_eq!(sa.log().count_of(DiagKind::CantApplySymbol), 1);
    assert_eq!(sa.pending_recoveries(), 0);
}

#[test]
fn test_value_lambda_assigned_to_runnable() {
    let m = TreeMaker::new();
    let body = vec![m.local(m.named("Runnable"), "r", Some(m.lambda_implicit(&[], m.int(5))))];
    let mut units = vec![with_runner(&m, "Assign", body, &[])];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::IncompatibleTypes]);
}

#[test]
fn test_generic_method_infers_from_argument() {
    let m = TreeMaker::new();
    let call = m.call_on(m.ident("Objects"), "requireNonNull", vec![m.string("a")]);
    let body = vec![m.local(m.named("String"), "s", Some(call))];
    let mut units = vec![with_runner(&m, "Generic", body, &["java.util.Objects"])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_generic_method_result_checked_against_target() {
    let m = TreeMaker::new();
    let call = m.call_on(m.ident("Objects"), "requireNonNull", vec![m.string("a")]);
    let body = vec![m.local(m.named("Integer"), "i", Some(call))];
    let mut units = vec![with_runner(&m, "Mismatch", body, &["java.util.Objects"])];
    let sa = analyze(&mut units);
    assert!(sa.log().error_count() >= 1);
}

#[test]
fn test_unpatchable_call_keeps_the_candidate_result_type() {
    let m = TreeMaker::new();
    let take = m.method(
        &[Modifier::Static],
        m.int_type(),
        "take",
        vec![m.param(m.named("String"), "s")],
        vec![m.ret(m.int(0))],
    );
    let call = m.call("take", vec![m.lambda_implicit(&[], m.int(5)), m.int(1)]);
    let test = m.method(
        &[Modifier::Static],
        m.void_type(),
        "test",
        vec![],
        vec![m.local(m.int_type(), "n", Some(call))],
    );
    let mut units = vec![unit_of(&m, m.class(&[], "Basic", vec![take, test]))];
    let sa = analyze(&mut units);
    assert_eq!(sa.log().error_count(), 1);
    assert_eq!(sa.log().count_of(DiagKind::CantApplySymbol), 1);
    assert_eq!(sa.pending_recoveries(), 0);

    let Some(ClassMember::Method(method)) = units[0].type_decls[0].members.get(1) else {
        panic!("test method")
    };
    let Some(Stmt::LocalVar(n)) = method.body.as_ref().and_then(|b| b.statements.first()) else {
        panic!("local")
    };
    assert_eq!(n.init.as_ref().and_then(|e| e.ty.clone()), Some(Type::Prim(TypeTag::Int)));
}
