//! Class entry and member completion

mod common;

use common::*;
use tolc_sema::ast::{BinaryOp, ClassMember, Modifier, TreeMaker};
use tolc_sema::common::{CompletionState, DiagKind, Flags, MemoryClassProvider, Type, TypeTag};
use tolc_sema::{Config, SemanticAnalyzer};

#[test]
fn test_duplicate_toplevel_class() {
    let m = TreeMaker::new();
    let mut units = vec![
        m.unit("A.java", None, vec![], vec![m.class(&[], "Dup", vec![])]),
        m.unit("B.java", None, vec![], vec![m.class(&[], "Dup", vec![])]),
    ];
    let sa = analyze(&mut units);
    assert_eq!(sa.log().count_of(DiagKind::DuplicateClass), 1);
    // the first declaration keeps the name
    assert_eq!(units[0].type_decls[0].sym, Some(class_sym(&sa, "Dup")));
    let placeholder = units[1].type_decls[0].sym.expect("placeholder symbol");
    assert_ne!(placeholder, class_sym(&sa, "Dup"));
    let sym = sa.symtab().sym(placeholder);
    assert_eq!(sym.ty, Type::Error);
    assert_eq!(sym.state, CompletionState::Error);
}

#[test]
fn test_public_class_in_wrong_file() {
    let m = TreeMaker::new();
    let class = m.class(&[Modifier::Public], "Shown", vec![]);
    let mut units = vec![m.unit("Other.java", None, vec![], vec![class])];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::ClassPublicShouldBeInFile]);
}

#[test]
fn test_member_classes_get_binary_names() {
    let m = TreeMaker::new();
    let inner = m.class(&[Modifier::Static], "Inner", vec![]);
    let outer = m.class(&[], "Outer", vec![ClassMember::Class(inner)]);
    let mut units = vec![m.unit("Outer.java", Some("p"), vec![], vec![outer])];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);
    let inner = class_sym(&sa, "p.Outer$Inner");
    assert_eq!(sa.symtab().qualified_name(inner), "p.Outer.Inner");
    assert_eq!(sa.symtab().sym(inner).owner, Some(class_sym(&sa, "p.Outer")));
}

#[test]
fn test_enum_gets_values_and_value_of() {
    let m = TreeMaker::new();
    let color = m.enum_decl(&[], "Color", &["RED", "GREEN"], vec![]);
    let mut units = vec![unit_of(&m, color)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let c = class_sym(&sa, "Color");
    let symtab = sa.symtab();
    let values = symtab.members_named(c, "values");
    assert_eq!(values.len(), 1);
    assert!(symtab.sym(values[0]).is_static());
    let value_of = symtab.members_named(c, "valueOf");
    assert_eq!(value_of.len(), 1);
    assert_eq!(symtab.method_params(value_of[0]).len(), 1);

    let red = symtab.member(c, "RED").expect("enum constant");
    assert!(symtab.sym(red).flags.contains(Flags::ENUM));
    assert!(symtab.sym(red).is_static());
}

#[test]
fn test_record_gets_accessors_and_canonical_constructor() {
    let m = TreeMaker::new();
    let point = m.record(
        &[],
        "Point",
        vec![m.var(m.int_type(), "x"), m.var(m.int_type(), "y")],
        vec![],
    );
    let mut units = vec![unit_of(&m, point)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let c = class_sym(&sa, "Point");
    let symtab = sa.symtab();
    let x = symtab
        .members_named(c, "x")
        .into_iter()
        .find(|s| symtab.sym(*s).is_method())
        .expect("accessor x()");
    let ret = symtab.sym(x).ty.method_type().map(|mt| (*mt.ret).clone());
    assert_eq!(ret, Some(Type::Prim(TypeTag::Int)));
    let ctors = symtab.members_named(c, "<init>");
    assert_eq!(ctors.len(), 1);
    assert_eq!(symtab.method_params(ctors[0]).len(), 2);
}

#[test]
fn test_default_constructor_is_added_once() {
    let m = TreeMaker::new();
    let explicit = m.class(
        &[],
        "WithCtor",
        vec![m.constructor(&[], vec![m.param(m.int_type(), "v")], vec![])],
    );
    let plain = m.class(&[], "Plain", vec![]);
    let mut units = vec![unit_of(&m, explicit), unit_of(&m, plain)];
    let sa = analyze(&mut units);
    assert_no_errors(&sa);

    let symtab = sa.symtab();
    let with_ctor = symtab.members_named(class_sym(&sa, "WithCtor"), "<init>");
    assert_eq!(with_ctor.len(), 1);
    assert_eq!(symtab.method_params(with_ctor[0]).len(), 1);
    let plain = symtab.members_named(class_sym(&sa, "Plain"), "<init>");
    assert_eq!(plain.len(), 1);
    assert!(symtab.sym(plain[0]).flags.contains(Flags::GENERATED_CONSTR));
}

#[test]
fn test_duplicate_member_is_already_defined() {
    let m = TreeMaker::new();
    let class = m.class(
        &[],
        "Twice",
        vec![
            m.field(&[], m.int_type(), "f", None),
            m.field(&[], m.boolean_type(), "f", None),
        ],
    );
    let mut units = vec![unit_of(&m, class)];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::AlreadyDefined]);
}

#[test]
fn test_cyclic_inheritance() {
    let m = TreeMaker::new();
    let mut a = m.class(&[], "A", vec![]);
    a.extends = Some(m.named("B"));
    let mut b = m.class(&[], "B", vec![]);
    b.extends = Some(m.named("A"));
    let mut units = vec![unit_of(&m, a), unit_of(&m, b)];
    let sa = analyze(&mut units);
    // both headers see the cycle: B while A is completing, A once B is flagged
    assert_eq!(sa.log().count_of(DiagKind::CyclicInheritance), 2);
    let symtab = sa.symtab();
    assert!(symtab.sym(class_sym(&sa, "A")).flags.contains(Flags::CYCLIC));
    assert!(symtab.sym(class_sym(&sa, "B")).flags.contains(Flags::CYCLIC));
}

#[test]
fn test_provider_supplies_imported_class() {
    init();
    let m = TreeMaker::new();
    let twice = m.method(
        &[Modifier::Public, Modifier::Static],
        m.int_type(),
        "twice",
        vec![m.param(m.int_type(), "x")],
        vec![m.ret(m.binary(m.ident("x"), BinaryOp::Mul, m.int(2)))],
    );
    let util = m.class(&[Modifier::Public], "Util", vec![twice]);
    let mut provider = MemoryClassProvider::new();
    provider.add("lib.Util", m.unit("Util.java", Some("lib"), vec![], vec![util]));

    let call = m.call_on(m.ident("Util"), "twice", vec![m.int(21)]);
    let main = m.class(&[], "Main", vec![m.method(&[], m.int_type(), "run", vec![], vec![m.ret(call)])]);
    let mut units = vec![m.unit("Main.java", None, vec![m.import("lib.Util", false)], vec![main])];

    let mut sa = SemanticAnalyzer::with_provider(Config::default(), Box::new(provider));
    sa.analyze(&mut units).unwrap();
    assert_no_errors(&sa);
    let util = class_sym(&sa, "lib.Util");
    assert!(!sa.symtab().members_named(util, "twice").is_empty());
}

#[test]
fn test_broken_class_is_reported_once() {
    init();
    let mut provider = MemoryClassProvider::new();
    provider.add_broken("lib.Broken", "truncated class file");

    let m = TreeMaker::new();
    let body = vec![
        m.local(m.named("Broken"), "a", Some(m.null())),
        m.local(m.named("Broken"), "b", Some(m.null())),
    ];
    let main = m.class(&[], "Main", vec![m.method(&[], m.void_type(), "run", vec![], body)]);
    let mut units = vec![m.unit("Main.java", None, vec![m.import("lib.Broken", false)], vec![main])];

    let mut sa = SemanticAnalyzer::with_provider(Config::default(), Box::new(provider));
    sa.analyze(&mut units).unwrap();
    assert_eq!(sa.log().count_of(DiagKind::CantAccessClass), 1);
}

#[test]
fn test_import_from_missing_package() {
    let m = TreeMaker::new();
    let main = m.class(&[], "Main", vec![]);
    let mut units = vec![m.unit("Main.java", None, vec![m.import("nowhere.Thing", false)], vec![main])];
    let sa = analyze(&mut units);
    assert_eq!(error_kinds(&sa), vec![DiagKind::DoesntExist]);
}

#[test]
fn test_unenter_removes_member_classes() {
    init();
    let m = TreeMaker::new();
    let inner = m.class(&[Modifier::Static], "Inner", vec![]);
    let outer = m.class(&[], "Outer", vec![ClassMember::Class(inner)]);
    let mut units = vec![m.unit("Outer.java", Some("p"), vec![], vec![outer])];
    let mut sa = SemanticAnalyzer::new(Config::default());
    sa.enter_units(&mut units).unwrap();
    let outer = class_sym(&sa, "p.Outer");
    let inner = class_sym(&sa, "p.Outer$Inner");

    sa.unenter(&units[0], None);
    let symtab = sa.symtab();
    assert_eq!(symtab.class_by_flat_name("p.Outer"), None);
    assert_eq!(symtab.class_by_flat_name("p.Outer$Inner"), None);
    let package = symtab.lookup_package("p").expect("package p");
    let package_members = symtab.sym(package).members().expect("package scope");
    assert!(symtab.scope(package_members).lookup("Outer").is_empty());
    assert_eq!(symtab.member(outer, "Inner"), None);
    assert_eq!(symtab.sym(inner).state, CompletionState::Unentered);

    // entering the same unit again is not a duplicate
    sa.enter_units(&mut units).unwrap();
    assert_no_errors(&sa);
    assert_ne!(class_sym(&sa, "p.Outer"), outer);
}

#[test]
fn test_unenter_subtree_keeps_the_rest() {
    init();
    let m = TreeMaker::new();
    let inner = m.class(&[Modifier::Static], "Inner", vec![]);
    let outer = m.class(&[], "Outer", vec![ClassMember::Class(inner)]);
    let mut units = vec![unit_of(&m, outer)];
    let mut sa = SemanticAnalyzer::new(Config::default());
    sa.enter_units(&mut units).unwrap();
    let outer = class_sym(&sa, "Outer");

    let ClassMember::Class(inner_tree) = &units[0].type_decls[0].members[0] else {
        panic!("member class")
    };
    sa.unenter(&units[0], Some(inner_tree));
    assert_eq!(sa.symtab().class_by_flat_name("Outer$Inner"), None);
    assert_eq!(sa.symtab().member(outer, "Inner"), None);
    assert_eq!(class_sym(&sa, "Outer"), outer);
}

#[test]
fn test_unenter_removes_local_classes() {
    let m = TreeMaker::new();
    let local = m.local_class(m.class(&[], "Helper", vec![]));
    let body = vec![local, m.local(m.named("Helper"), "h", Some(m.null()))];
    let outer = m.class(&[], "Host", vec![m.method(&[], m.void_type(), "run", vec![], body)]);
    let mut units = vec![unit_of(&m, outer)];
    let mut sa = analyze(&mut units);
    assert_no_errors(&sa);
    assert!(sa.symtab().class_by_flat_name("Host$1Helper").is_some());

    sa.unenter(&units[0], None);
    assert_eq!(sa.symtab().class_by_flat_name("Host$1Helper"), None);
    assert_eq!(sa.symtab().class_by_flat_name("Host"), None);
}
