// Common test utilities

#![allow(dead_code)]

use tolc_sema::ast::{ClassDecl, CompilationUnit, TreeMaker};
use tolc_sema::common::{DiagKind, SymbolId};
use tolc_sema::{Config, SemanticAnalyzer};

/// Route `log` output through the test harness; `RUST_LOG=debug` shows the
/// phase traces
pub fn init() {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
}

pub fn analyze(units: &mut [CompilationUnit]) -> SemanticAnalyzer {
    analyze_with(Config::default(), units)
}

pub fn analyze_with(config: Config, units: &mut [CompilationUnit]) -> SemanticAnalyzer {
    init();
    let mut sa = SemanticAnalyzer::new(config);
    sa.analyze(units).expect("analysis session failed");
    sa
}

/// Unit in the unnamed package whose file is named after its class
pub fn unit_of(make: &TreeMaker, class: ClassDecl) -> CompilationUnit {
    let file = format!("{}.java", class.name);
    make.unit(&file, None, vec![], vec![class])
}

pub fn error_kinds(sa: &SemanticAnalyzer) -> Vec<DiagKind> {
    sa.log().errors().map(|d| d.kind).collect()
}

pub fn assert_no_errors(sa: &SemanticAnalyzer) {
    let kinds = error_kinds(sa);
    assert!(kinds.is_empty(), "unexpected errors: {:?}", kinds);
}

pub fn class_sym(sa: &SemanticAnalyzer, flat_name: &str) -> SymbolId {
    sa.symtab()
        .class_by_flat_name(flat_name)
        .unwrap_or_else(|| panic!("class {} was not entered", flat_name))
}
