//! Semantic analysis - JavaC-aligned compilation phases
//!
//! The phases between parsing and code generation that give a program its
//! meaning:
//!
//! - Enter / MemberEnter: class symbols, then their headers and members
//! - Annotate: queued annotation attribution and meta-annotation checks
//! - Attr: type checking, with Resolve, Infer and deferred argument
//!   attribution; AttrRecover retries calls broken by lambda shapes
//! - TransPatterns: lowering of `instanceof` patterns and pattern switches
//!
//! All phases share one [`SemanticAnalyzer`], the compilation session. It
//! owns the symbol table, the diagnostic log and the per-phase queues.

pub mod operators;
pub mod enter;
pub mod member_enter;
pub mod annotate;
pub mod type_annotations;
pub mod resolve;
pub mod infer;
pub mod attr;
pub mod argument_attr;
pub mod attr_recover;
pub mod match_bindings;
pub mod trans_patterns;

use log::{debug, info};

use crate::ast::CompilationUnit;
use crate::common::class_provider::{ClassProvider, EmptyClassProvider};
use crate::common::diag::Log;
use crate::common::symtab::Symtab;
use crate::common::types::Types;
use crate::config::Config;
use crate::error::Result;

use annotate::AnnotateQueue;
use argument_attr::DeferredAttrState;
use attr_recover::RecoveryQueue;
use enter::EnterState;
use match_bindings::MatchBindings;
use operators::Operators;

/// A compilation session.
///
/// Follows JavaC's flow: Enter → Annotate → Attr → TransPatterns. Symbols
/// survive across [`analyze`](Self::analyze) calls, so later batches can
/// refer to classes entered by earlier ones.
pub struct SemanticAnalyzer {
    pub config: Config,
    pub symtab: Symtab,
    pub log: Log,
    pub operators: Operators,
    pub(crate) enter: EnterState,
    pub(crate) annotate: AnnotateQueue,
    pub(crate) deferred: DeferredAttrState,
    pub(crate) recovery: RecoveryQueue,
    /// Bindings introduced by the expression attributed last
    pub(crate) bindings: MatchBindings,
    pub(crate) provider: Box<dyn ClassProvider>,
}

impl SemanticAnalyzer {
    pub fn new(config: Config) -> Self {
        Self::with_provider(config, Box::new(EmptyClassProvider))
    }

    /// Session that asks `provider` for classes missing from the sources
    pub fn with_provider(config: Config, provider: Box<dyn ClassProvider>) -> Self {
        let log = Log::new(config.max_errors, config.max_warnings);
        Self {
            config,
            symtab: Symtab::new(),
            log,
            operators: Operators::new(),
            enter: EnterState::default(),
            annotate: AnnotateQueue::default(),
            deferred: DeferredAttrState::default(),
            recovery: RecoveryQueue::default(),
            bindings: MatchBindings::default(),
            provider,
        }
    }

    pub(crate) fn types(&self) -> Types<'_> {
        Types::new(&self.symtab)
    }

    pub fn symtab(&self) -> &Symtab {
        &self.symtab
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Arguments currently held by the deferred attribution cache
    pub fn deferred_args(&self) -> usize {
        self.deferred.len()
    }

    /// Calls still waiting for error recovery
    pub fn pending_recoveries(&self) -> usize {
        self.recovery.len()
    }

    /// Annotation jobs not yet run
    pub fn pending_annotations(&self) -> usize {
        self.annotate.pending()
    }

    /// Enter, attribute and lower `units`.
    ///
    /// Trees are modified in place: names get their symbols, expressions
    /// their types, and pattern matching is lowered. Problems in the
    /// program end up in [`log`](Self::log); `Err` means the session
    /// itself failed.
    pub fn analyze(&mut self, units: &mut [CompilationUnit]) -> Result<()> {
        info!("WASH: analyzing {} compilation unit(s)", units.len());
        self.attribute(units)?;
        for unit in units.iter_mut() {
            for class in unit.type_decls.iter_mut() {
                self.lower_patterns(class);
            }
        }
        debug!(
            "WASH: done, {} error(s), {} warning(s)",
            self.log.error_count(),
            self.log.warning_count()
        );
        Ok(())
    }

    /// Enter and attribute without lowering
    pub fn attribute(&mut self, units: &mut [CompilationUnit]) -> Result<()> {
        self.enter_units(units)?;
        for unit in units.iter_mut() {
            for class in unit.type_decls.iter_mut() {
                self.attrib_class(class)?;
                self.recover_invocations(class)?;
                self.flush_annotations()?;
            }
        }
        self.deferred.clear();
        Ok(())
    }

    /// Reset per-round caches and queues. Entered symbols are kept.
    pub fn new_round(&mut self) {
        debug!("WASH: new round");
        self.operators.clear();
        self.deferred.clear();
        self.recovery.clear();
        self.annotate.clear();
        self.enter.clear();
        self.bindings = MatchBindings::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, TreeMaker};
    use crate::common::types::{Type, TypeTag};

    #[test]
    fn new_round_drops_operator_symbols() {
        let mut sa = SemanticAnalyzer::new(Config::default());
        let int = Type::Prim(TypeTag::Int);
        let span = TreeMaker::new().span();
        let id = sa
            .operators
            .resolve_binary(&sa.symtab, &mut sa.log, span, BinaryOp::Add, &int, &int);
        assert!(!sa.operators.get(id).is_noop());
        assert!(sa.operators.materialized() > 1);
        sa.new_round();
        assert_eq!(sa.operators.materialized(), 1);
        assert_eq!(sa.pending_recoveries(), 0);
        assert_eq!(sa.deferred_args(), 0);

        let again = sa
            .operators
            .resolve_binary(&sa.symtab, &mut sa.log, span, BinaryOp::Add, &int, &int);
        assert_eq!(sa.operators.get(again).ret, int);
        assert!(!sa.log.has_errors());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut sa = SemanticAnalyzer::new(Config::default());
        sa.analyze(&mut []).unwrap();
        assert!(!sa.log().has_errors());
    }
}
