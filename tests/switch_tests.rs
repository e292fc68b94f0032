//! Switch attribution and pattern switch lowering

mod common;

use common::*;
use tolc_sema::ast::{
    AstPrinter, BinaryOp, CaseLabel, ClassMember, CompilationUnit, Expr, ExprKind, Literal, Modifier, Stmt, TreeMaker,
    TypeExpr, UnaryOp,
};
use tolc_sema::common::DiagKind;
use tolc_sema::Config;

/// `static int classify(<param_type> o) { return <switch>; }`
fn classify(m: &TreeMaker, class: &str, param_type: TypeExpr, switch: Expr) -> CompilationUnit {
    let method = m.method(
        &[Modifier::Static],
        m.int_type(),
        "classify",
        vec![m.param(param_type, "o")],
        vec![m.ret(switch)],
    );
    unit_of(m, m.class(&[], class, vec![method]))
}

fn returned_switch(unit: &CompilationUnit) -> &Expr {
    let Some(ClassMember::Method(method)) = unit.type_decls[0].members.first() else {
        panic!("method")
    };
    let Some(Stmt::Return(ret)) = method.body.as_ref().and_then(|b| b.statements.first()) else {
        panic!("return")
    };
    ret.expr.as_ref().expect("value")
}

#[test]
fn test_pattern_switch_is_lowered_to_type_switch() {
    let m = TreeMaker::new();
    let is_empty = m.call_on(m.ident("s"), "isEmpty", vec![]);
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.pattern_rule(m.named("String"), "s", Some(is_empty), vec![m.yield_stmt(m.int(0))]),
            m.pattern_rule(m.named("String"), "s", None, vec![m.yield_stmt(m.call_on(m.ident("s"), "length", vec![]))]),
            m.default_rule(vec![m.yield_stmt(m.unary(UnaryOp::Minus, m.int(1)))]),
        ],
    );
    let mut units = vec![classify(&m, "Shapes", m.named("Object"), switch)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let lowered = returned_switch(&units[0]);
    let ExprKind::Let(let_expr) = &lowered.kind else {
        panic!("pattern switch expression should be wrapped in a let, got {:?}", lowered.kind)
    };
    assert_eq!(let_expr.defs.len(), 2);
    let ExprKind::Switch(sw) = &let_expr.expr.kind else {
        panic!("switch")
    };
    assert!(!sw.pattern_switch);
    assert!(sw
        .cases
        .iter()
        .flat_map(|c| &c.labels)
        .all(|l| !matches!(l, CaseLabel::Pattern(_))));

    let printed = AstPrinter::with_symtab(sa.symtab()).print_expr(lowered);
    assert!(printed.contains("indy typeSwitch[String.class, String.class]"), "{}", printed);
    assert!(printed.contains("continue <switch>;"), "{}", printed);
    assert!(printed.contains("(String)selector"), "{}", printed);
}

#[test]
fn test_missing_default_throws_match_exception() {
    let m = TreeMaker::new();
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.pattern_rule(m.named("String"), "s", None, vec![m.yield_stmt(m.int(1))]),
            m.pattern_rule(m.named("Object"), "any", None, vec![m.yield_stmt(m.int(2))]),
        ],
    );
    let mut units = vec![classify(&m, "Total", m.named("Object"), switch)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let printed = AstPrinter::with_symtab(sa.symtab()).print_expr(returned_switch(&units[0]));
    assert!(printed.contains("throw new MatchException(null, null);"), "{}", printed);
    // the unconditional pattern also takes null
    assert!(printed.contains("case 1, -1 ->"), "{}", printed);
    assert!(!printed.contains("NullPointerException"), "{}", printed);
}

#[test]
fn test_null_selector_does_not_reach_default() {
    let m = TreeMaker::new();
    let positive = m.binary(m.ident("i"), BinaryOp::Gt, m.int(0));
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.pattern_rule(m.named("Integer"), "i", Some(positive), vec![m.yield_stmt(m.int(1))]),
            m.pattern_rule(m.named("String"), "s", None, vec![m.yield_stmt(m.int(2))]),
            m.default_rule(vec![m.yield_stmt(m.int(3))]),
        ],
    );
    let mut units = vec![classify(&m, "Nullable", m.named("Object"), switch)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let lowered = returned_switch(&units[0]);
    let ExprKind::Let(let_expr) = &lowered.kind else {
        panic!("let")
    };
    let ExprKind::Switch(sw) = &let_expr.expr.kind else {
        panic!("switch")
    };
    let null_case = sw
        .cases
        .iter()
        .find(|c| c.labels.iter().any(|l| matches!(l, CaseLabel::Constant(e) if e.constant == Some(Literal::Int(-1)))))
        .expect("null selector gets its own case");
    assert!(!null_case.is_default());
    assert!(matches!(null_case.stats.as_slice(), [Stmt::Throw(_)]));

    let printed = AstPrinter::with_symtab(sa.symtab()).print_expr(lowered);
    assert!(printed.contains("throw new NullPointerException();"), "{}", printed);
}

#[test]
fn test_switch_expression_must_be_exhaustive() {
    let m = TreeMaker::new();
    let switch = m.switch_expr(
        m.ident("o"),
        vec![m.pattern_rule(m.named("String"), "s", None, vec![m.yield_stmt(m.int(1))])],
    );
    let mut units = vec![classify(&m, "Partial", m.named("Object"), switch)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::NotExhaustive]);
}

#[test]
fn test_unconditional_pattern_and_default() {
    let m = TreeMaker::new();
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.pattern_rule(m.named("Object"), "any", None, vec![m.yield_stmt(m.int(1))]),
            m.default_rule(vec![m.yield_stmt(m.int(2))]),
        ],
    );
    let mut units = vec![classify(&m, "Both", m.named("Object"), switch)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::UnconditionalPatternAndDefault]);
}

#[test]
fn test_enum_switch_covering_all_constants() {
    let m = TreeMaker::new();
    let color = m.enum_decl(&[], "Color", &["RED", "GREEN"], vec![]);
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.constant_rule(vec![m.ident("RED")], vec![m.yield_stmt(m.int(1))]),
            m.constant_rule(vec![m.ident("GREEN")], vec![m.yield_stmt(m.int(2))]),
        ],
    );
    let mut units = vec![unit_of(&m, color), classify(&m, "Paint", m.named("Color"), switch)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
    // constant switches are left for the back end
    let ExprKind::Switch(sw) = &returned_switch(&units[1]).kind else {
        panic!("enum switch should not be lowered")
    };
    assert!(!sw.pattern_switch);
}

#[test]
fn test_enum_switch_with_unknown_constant() {
    let m = TreeMaker::new();
    let color = m.enum_decl(&[], "Color", &["RED"], vec![]);
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.constant_rule(vec![m.ident("BLUE")], vec![m.yield_stmt(m.int(1))]),
            m.default_rule(vec![m.yield_stmt(m.int(0))]),
        ],
    );
    let mut units = vec![unit_of(&m, color), classify(&m, "Paint", m.named("Color"), switch)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::CantResolveLocation]);
}

#[test]
fn test_duplicate_labels() {
    let m = TreeMaker::new();
    let body = vec![m.switch_stmt(
        m.ident("o"),
        vec![
            m.constant_rule(vec![m.int(1)], vec![m.block_stmt(vec![])]),
            m.constant_rule(vec![m.int(1)], vec![m.block_stmt(vec![])]),
            m.default_rule(vec![m.block_stmt(vec![])]),
            m.default_rule(vec![m.block_stmt(vec![])]),
        ],
    )];
    let method = m.method(&[], m.void_type(), "run", vec![m.param(m.int_type(), "o")], body);
    let mut units = vec![unit_of(&m, m.class(&[], "Dups", vec![method]))];
    let sa = analyze(&mut units);
    assert_eq!(
        error_kinds(&sa),
        vec![DiagKind::DuplicateCaseLabel, DiagKind::DuplicateDefaultLabel]
    );
}

#[test]
fn test_switch_expression_case_must_yield() {
    let m = TreeMaker::new();
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.constant_rule(vec![m.int(1)], vec![m.block_stmt(vec![])]),
            m.default_rule(vec![m.yield_stmt(m.int(0))]),
        ],
    );
    let mut units = vec![classify(&m, "NoYield", m.int_type(), switch)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::NoSwitchExpressionYield]);
}

#[test]
fn test_pattern_switch_needs_release_21() {
    init();
    let m = TreeMaker::new();
    let switch = m.switch_expr(
        m.ident("o"),
        vec![
            m.pattern_rule(m.named("String"), "s", None, vec![m.yield_stmt(m.int(1))]),
            m.default_rule(vec![m.yield_stmt(m.int(0))]),
        ],
    );
    let mut units = vec![classify(&m, "Old", m.named("Object"), switch)];
    let sa = analyze_with(Config::default().with_source_level(17), &mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::FeatureDisabled]);
}
