//! Semantic core of the Terminos Language Compiler (tolc)
//!
//! Takes parsed Java compilation units and gives them meaning, following
//! the JavaC phases:
//!
//! - **ast**: tree model, `TreeMaker`, visitors, printer
//! - **common**: symbols, scopes, types, diagnostics, environments
//! - **wash**: Enter → MemberEnter → Annotate → Attr → TransPatterns
//!
//! ## Analysis Flow
//!
//! ```text
//! AST → Enter → MemberEnter → Annotate → Attr (+ AttrRecover) → TransPatterns
//!                                           ↓
//!                         Resolve / Infer / ArgumentAttr / MatchBindings
//! ```
//!
//! There is no parser here; trees come from the front end or are built
//! with [`ast::TreeMaker`].

pub mod ast;
pub mod common;
pub mod config;
pub mod error;
pub mod wash;

pub use config::{Config, LintCategory};
pub use error::{Error, Result};
pub use wash::SemanticAnalyzer;

/// Analyze `units` in a fresh session configured from the environment
pub fn analyze(units: &mut [ast::CompilationUnit]) -> Result<SemanticAnalyzer> {
    let config = Config::from_env()?;
    let mut analyzer = SemanticAnalyzer::new(config);
    analyzer.analyze(units)?;
    Ok(analyzer)
}
