//! Expression and statement attribution

mod common;

use common::*;
use tolc_sema::ast::{BinaryOp, ClassMember, Literal, Modifier, Stmt, TreeMaker, TypeExpr};
use tolc_sema::common::{DiagKind, Type, TypeTag};

fn constant(m: &TreeMaker, ty: TypeExpr, name: &str, init: tolc_sema::ast::Expr) -> ClassMember {
    m.field(&[Modifier::Static, Modifier::Final], ty, name, Some(init))
}

/// `class <name> { void run() { <body> } }`
fn with_body(m: &TreeMaker, name: &str, body: Vec<Stmt>) -> tolc_sema::ast::CompilationUnit {
    let class = m.class(&[], name, vec![m.method(&[], m.void_type(), "run", vec![], body)]);
    unit_of(m, class)
}

#[test]
fn test_constant_fields_are_folded() {
    let m = TreeMaker::new();
    let class = m.class(
        &[],
        "K",
        vec![
            constant(&m, m.int_type(), "A", m.binary(m.int(1), BinaryOp::Add, m.int(2))),
            constant(&m, m.int_type(), "B", m.binary(m.ident("A"), BinaryOp::Mul, m.int(2))),
            constant(&m, m.named("String"), "S", m.binary(m.string("v"), BinaryOp::Add, m.ident("B"))),
        ],
    );
    let mut units = vec![unit_of(&m, class)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let k = class_sym(&sa, "K");
    let value = |name: &str| {
        let v = sa.symtab().member(k, name).expect("field");
        sa.symtab().sym(v).const_value().cloned()
    };
    assert_eq!(value("A"), Some(Literal::Int(3)));
    assert_eq!(value("B"), Some(Literal::Int(6)));
    assert_eq!(value("S"), Some(Literal::String("v6".into())));
}

#[test]
fn test_qualified_forward_constant_reference() {
    let m = TreeMaker::new();
    let class = m.class(
        &[],
        "Fwd",
        vec![
            constant(&m, m.int_type(), "FIRST", m.binary(m.select(m.ident("Fwd"), "SECOND"), BinaryOp::Add, m.int(1))),
            constant(&m, m.int_type(), "SECOND", m.int(41)),
        ],
    );
    let mut units = vec![unit_of(&m, class)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
    let c = class_sym(&sa, "Fwd");
    let first = sa.symtab().member(c, "FIRST").unwrap();
    assert_eq!(sa.symtab().sym(first).const_value(), Some(&Literal::Int(42)));
}

#[test]
fn test_incompatible_initializer() {
    let m = TreeMaker::new();
    let body = vec![m.local(m.int_type(), "x", Some(m.string("s")))];
    let mut units = vec![with_body(&m, "Bad", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::IncompatibleTypes]);
}

#[test]
fn test_int_constant_narrows_to_byte() {
    let m = TreeMaker::new();
    let body = vec![
        m.local(m.prim(TypeTag::Byte), "ok", Some(m.int(10))),
        m.local(m.prim(TypeTag::Byte), "too_big", Some(m.int(300))),
    ];
    let mut units = vec![with_body(&m, "Narrow", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::IncompatibleTypes]);
}

#[test]
fn test_unresolved_variable() {
    let m = TreeMaker::new();
    let body = vec![m.local(m.int_type(), "y", Some(m.ident("missing")))];
    let mut units = vec![with_body(&m, "Lost", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantResolveLocation]);
}

#[test]
fn test_var_needs_an_initializer_type() {
    let m = TreeMaker::new();
    let body = vec![
        m.local_var("fine", m.int(1)),
        m.local_var("nothing", m.null()),
    ];
    let mut units = vec![with_body(&m, "Infer", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantInferLocalVarType]);

    let Some(ClassMember::Method(run)) = units[0].type_decls[0].members.first() else {
        panic!("method")
    };
    let Stmt::LocalVar(fine) = &run.body.as_ref().unwrap().statements[0] else {
        panic!("local")
    };
    let ty = fine.var_type.as_ref().and_then(|t| t.ty.clone());
    assert_eq!(ty, Some(Type::Prim(TypeTag::Int)));
}

#[test]
fn test_return_value_from_void_method() {
    let m = TreeMaker::new();
    let mut units = vec![with_body(&m, "Ret", vec![m.ret(m.int(1))])];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::IncompatibleTypes]);
}

#[test]
fn test_missing_return_value() {
    let m = TreeMaker::new();
    let method = m.method(&[], m.int_type(), "f", vec![], vec![m.ret_void()]);
    let mut units = vec![unit_of(&m, m.class(&[], "Missing", vec![method]))];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::IncompatibleTypes]);
}

#[test]
fn test_overloads_pick_by_argument_type() {
    let m = TreeMaker::new();
    let by_int = m.method(
        &[Modifier::Static],
        m.int_type(),
        "f",
        vec![m.param(m.int_type(), "i")],
        vec![m.ret(m.ident("i"))],
    );
    let by_string = m.method(
        &[Modifier::Static],
        m.named("String"),
        "f",
        vec![m.param(m.named("String"), "s")],
        vec![m.ret(m.ident("s"))],
    );
    let run = m.method(
        &[Modifier::Static],
        m.void_type(),
        "run",
        vec![],
        vec![
            m.local(m.named("String"), "s", Some(m.call("f", vec![m.string("a")]))),
            m.local(m.int_type(), "i", Some(m.call("f", vec![m.int(1)]))),
        ],
    );
    let mut units = vec![unit_of(&m, m.class(&[], "Over", vec![by_int, by_string, run]))];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_inapplicable_method() {
    let m = TreeMaker::new();
    let target = m.method(
        &[Modifier::Static],
        m.void_type(),
        "take",
        vec![m.param(m.int_type(), "i")],
        vec![],
    );
    let run = m.method(
        &[Modifier::Static],
        m.void_type(),
        "run",
        vec![],
        vec![m.exec(m.call("take", vec![m.string("no")]))],
    );
    let mut units = vec![unit_of(&m, m.class(&[], "Apply", vec![target, run]))];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantApplySymbol]);
}

#[test]
fn test_string_methods_and_boxing() {
    let m = TreeMaker::new();
    let body = vec![
        m.local(m.named("String"), "s", Some(m.string("abc"))),
        m.local(m.int_type(), "n", Some(m.call_on(m.ident("s"), "length", vec![]))),
        m.local(m.named("Integer"), "boxed", Some(m.ident("n"))),
        m.local(m.int_type(), "back", Some(m.binary(m.ident("boxed"), BinaryOp::Add, m.int(1)))),
        m.local(m.prim(TypeTag::Char), "first", Some(m.call_on(m.ident("s"), "charAt", vec![m.int(0)]))),
    ];
    let mut units = vec![with_body(&m, "Strings", body)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
}

#[test]
fn test_local_redeclaration() {
    let m = TreeMaker::new();
    let body = vec![
        m.local(m.int_type(), "x", Some(m.int(1))),
        m.block_stmt(vec![m.local(m.int_type(), "x", Some(m.int(2)))]),
    ];
    let mut units = vec![with_body(&m, "Shadow", body)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::AlreadyDefined]);
}
