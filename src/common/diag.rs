//! Typed diagnostics and the diagnostic log
//!
//! The core never formats messages. It raises [`Diagnostic`] values carrying
//! a [`DiagKind`] (whose `key()` is the usual `compiler.err.*` key) and
//! structured arguments; a [`DiagnosticSink`] downstream decides how to
//! render them.
//!
//! Speculative attribution pushes a deferred handler with
//! [`Log::push_deferred`]; everything reported until the matching
//! [`Log::pop_deferred`] is buffered there instead of reaching the sink.

use std::collections::HashSet;
use std::fmt;

use super::symbol::SymbolId;
use super::types::Type;
use crate::ast::{Pos, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKind {
    // Entry
    DuplicateClass,
    ClassPublicShouldBeInFile,
    PkgAnnotationsSbInPackageInfo,
    CyclicInheritance,
    AlreadyDefined,
    CantAccessClass,
    DoesntExist,

    // Resolution
    CantResolve,
    CantResolveLocation,
    CantApplySymbol,
    CantApplySymbols,
    RefAmbiguous,
    NonStaticCantBeRef,
    CantDeref,
    AbstractCantBeInstantiated,
    CantApplyDiamond,

    // Operators
    OperatorCantBeApplied,
    OperatorCantBeApplied1,

    // Type checking
    IncompatibleTypes,
    CantInferLocalVarType,
    VoidNotAllowedHere,
    RetOutsideMeth,
    UnexpectedType,
    ConstExprReq,
    DuplicateCaseLabel,
    DuplicateDefaultLabel,
    NotExhaustive,
    NoSwitchExpressionYield,
    UnconditionalPatternAndDefault,
    DuplicateUnconditionalPattern,
    FeatureDisabled,
    MatchBindingExists,
    UnexpectedLambda,

    // Annotations
    NotAnnotationType,
    CantResolveAnnotationElement,
    AttributeValueMustBeConstant,
    AnnotationValueMustBeClassLiteral,
    AnnotationValueMustBeEnumConstant,
    AnnotationValueNotAllowableType,
    AnnotationMissingDefaultValue,
    DuplicateAnnotationMember,
    DuplicateAnnotationMissingContainer,
    InvalidRepeatableAnnotation,
    InvalidRepeatableAnnotationNoValue,
    InvalidRepeatableAnnotationValueReturn,
    InvalidRepeatableAnnotationNotApplicable,
    InvalidRepeatableAnnotationRetention,
    InvalidRepeatableAnnotationNotDocumented,
    InvalidRepeatableAnnotationNotInherited,
    AnnotationTypeNotApplicable,
    BadFunctionalIntfAnno,

    // Lint
    HasBeenDeprecated,
    HasBeenDeprecatedForRemoval,
    IsPreview,
    IsPreviewReflective,

    // Fragments
    ArgLengthMismatch,
    NoConformAssignExists,
    IncompatibleRetTypeInLambda,
    MissingRetVal,
    UnexpectedRetVal,
    NotAFunctionalIntf,
    IncompatibleArgTypesInLambda,
}

impl DiagKind {
    pub fn key(&self) -> &'static str {
        match self {
            DiagKind::DuplicateClass => "duplicate.class",
            DiagKind::ClassPublicShouldBeInFile => "class.public.should.be.in.file",
            DiagKind::PkgAnnotationsSbInPackageInfo => "pkg.annotations.sb.in.package-info.java",
            DiagKind::CyclicInheritance => "cyclic.inheritance",
            DiagKind::AlreadyDefined => "already.defined",
            DiagKind::CantAccessClass => "cant.access",
            DiagKind::DoesntExist => "doesnt.exist",
            DiagKind::CantResolve => "cant.resolve",
            DiagKind::CantResolveLocation => "cant.resolve.location",
            DiagKind::CantApplySymbol => "cant.apply.symbol",
            DiagKind::CantApplySymbols => "cant.apply.symbols",
            DiagKind::RefAmbiguous => "ref.ambiguous",
            DiagKind::NonStaticCantBeRef => "non-static.cant.be.ref",
            DiagKind::CantDeref => "cant.deref",
            DiagKind::AbstractCantBeInstantiated => "abstract.cant.be.instantiated",
            DiagKind::CantApplyDiamond => "cant.apply.diamond.1",
            DiagKind::OperatorCantBeApplied => "operator.cant.be.applied",
            DiagKind::OperatorCantBeApplied1 => "operator.cant.be.applied.1",
            DiagKind::IncompatibleTypes => "prob.found.req",
            DiagKind::CantInferLocalVarType => "cant.infer.local.var.type",
            DiagKind::VoidNotAllowedHere => "void.not.allowed.here",
            DiagKind::RetOutsideMeth => "ret.outside.meth",
            DiagKind::UnexpectedType => "unexpected.type",
            DiagKind::ConstExprReq => "const.expr.req",
            DiagKind::DuplicateCaseLabel => "duplicate.case.label",
            DiagKind::DuplicateDefaultLabel => "duplicate.default.label",
            DiagKind::NotExhaustive => "not.exhaustive",
            DiagKind::NoSwitchExpressionYield => "switch.expression.completes.normally",
            DiagKind::UnconditionalPatternAndDefault => "unconditional.pattern.and.default",
            DiagKind::DuplicateUnconditionalPattern => "duplicate.unconditional.pattern",
            DiagKind::FeatureDisabled => "feature.not.supported",
            DiagKind::MatchBindingExists => "match.binding.exists",
            DiagKind::UnexpectedLambda => "unexpected.lambda",
            DiagKind::NotAnnotationType => "not.annotation.type",
            DiagKind::CantResolveAnnotationElement => "cant.resolve.location.args",
            DiagKind::AttributeValueMustBeConstant => "attribute.value.must.be.constant",
            DiagKind::AnnotationValueMustBeClassLiteral => "annotation.value.must.be.class.literal",
            DiagKind::AnnotationValueMustBeEnumConstant => "enum.annotation.must.be.enum.constant",
            DiagKind::AnnotationValueNotAllowableType => "annotation.value.not.allowable.type",
            DiagKind::AnnotationMissingDefaultValue => "annotation.missing.default.value",
            DiagKind::DuplicateAnnotationMember => "duplicate.annotation.member.value",
            DiagKind::DuplicateAnnotationMissingContainer => "duplicate.annotation.missing.container",
            DiagKind::InvalidRepeatableAnnotation => "invalid.repeatable.annotation",
            DiagKind::InvalidRepeatableAnnotationNoValue => "invalid.repeatable.annotation.no.value",
            DiagKind::InvalidRepeatableAnnotationValueReturn => "invalid.repeatable.annotation.value.return",
            DiagKind::InvalidRepeatableAnnotationNotApplicable => "invalid.repeatable.annotation.not.applicable",
            DiagKind::InvalidRepeatableAnnotationRetention => "invalid.repeatable.annotation.retention",
            DiagKind::InvalidRepeatableAnnotationNotDocumented => "invalid.repeatable.annotation.not.documented",
            DiagKind::InvalidRepeatableAnnotationNotInherited => "invalid.repeatable.annotation.not.inherited",
            DiagKind::AnnotationTypeNotApplicable => "annotation.type.not.applicable",
            DiagKind::BadFunctionalIntfAnno => "bad.functional.intf.anno.1",
            DiagKind::HasBeenDeprecated => "has.been.deprecated",
            DiagKind::HasBeenDeprecatedForRemoval => "has.been.deprecated.for.removal",
            DiagKind::IsPreview => "is.preview",
            DiagKind::IsPreviewReflective => "is.preview.reflective",
            DiagKind::ArgLengthMismatch => "arg.length.mismatch",
            DiagKind::NoConformAssignExists => "no.conforming.assignment.exists",
            DiagKind::IncompatibleRetTypeInLambda => "incompatible.ret.type.in.lambda",
            DiagKind::MissingRetVal => "missing.ret.val",
            DiagKind::UnexpectedRetVal => "unexpected.ret.val",
            DiagKind::NotAFunctionalIntf => "not.a.functional.intf",
            DiagKind::IncompatibleArgTypesInLambda => "incompatible.arg.types.in.lambda",
        }
    }
}

/// Structured diagnostic argument
#[derive(Debug, Clone, PartialEq)]
pub enum DiagArg {
    Name(String),
    Type(Type),
    Symbol(SymbolId),
    Number(i64),
    Fragment(Box<Diagnostic>),
}

impl From<&str> for DiagArg {
    fn from(s: &str) -> Self {
        DiagArg::Name(s.to_string())
    }
}

impl From<String> for DiagArg {
    fn from(s: String) -> Self {
        DiagArg::Name(s)
    }
}

impl From<Type> for DiagArg {
    fn from(t: Type) -> Self {
        DiagArg::Type(t)
    }
}

impl From<SymbolId> for DiagArg {
    fn from(s: SymbolId) -> Self {
        DiagArg::Symbol(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagKind,
    pub span: Span,
    pub args: Vec<DiagArg>,
}

impl Diagnostic {
    pub fn error(kind: DiagKind, span: Span, args: Vec<DiagArg>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            span,
            args,
        }
    }

    pub fn warning(kind: DiagKind, span: Span, args: Vec<DiagArg>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            span,
            args,
        }
    }

    /// Nested detail of another diagnostic; severity is irrelevant
    pub fn fragment(kind: DiagKind, args: Vec<DiagArg>) -> Self {
        Self {
            severity: Severity::Note,
            kind,
            span: Span::default(),
            args,
        }
    }

    pub fn pos(&self) -> Pos {
        self.span.pos()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Fragment arguments of this diagnostic
    pub fn fragments(&self) -> impl Iterator<Item = &Diagnostic> {
        self.args.iter().filter_map(|a| match a {
            DiagArg::Fragment(f) => Some(f.as_ref()),
            _ => None,
        })
    }

    /// Whether `kind` occurs in this diagnostic or any nested fragment
    pub fn mentions(&self, kind: DiagKind) -> bool {
        self.kind == kind || self.fragments().any(|f| f.mentions(kind))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "compiler.err",
            Severity::Warning => "compiler.warn",
            Severity::Note => "compiler.misc",
        };
        write!(f, "{}:{}: {}.{}", self.span.start.line, self.span.start.column, prefix, self.kind.key())
    }
}

/// Receiver of diagnostics that survive deferral
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Sink collecting everything, used by tests and embedders
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Buffered diagnostics of one speculative region
#[derive(Debug, Default, Clone)]
pub struct DeferredDiagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl DeferredDiagnostics {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.is_error())
    }
}

pub struct Log {
    reported: Vec<Diagnostic>,
    deferred: Vec<DeferredDiagnostics>,
    /// (position, key) pairs already reported; one diagnostic per root cause
    recorded: HashSet<(Pos, &'static str)>,
    errors: usize,
    warnings: usize,
    max_errors: usize,
    max_warnings: usize,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("reported", &self.reported.len())
            .field("deferred_depth", &self.deferred.len())
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for Log {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Log {
    pub fn new(max_errors: usize, max_warnings: usize) -> Self {
        Self {
            reported: Vec::new(),
            deferred: Vec::new(),
            recorded: HashSet::new(),
            errors: 0,
            warnings: 0,
            max_errors,
            max_warnings,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = Some(sink);
    }

    pub fn error(&mut self, kind: DiagKind, span: Span, args: Vec<DiagArg>) {
        self.report(Diagnostic::error(kind, span, args));
    }

    pub fn warning(&mut self, kind: DiagKind, span: Span, args: Vec<DiagArg>) {
        self.report(Diagnostic::warning(kind, span, args));
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(handler) = self.deferred.last_mut() {
            handler.diagnostics.push(diagnostic);
            return;
        }
        if !self.recorded.insert((diagnostic.pos(), diagnostic.kind.key())) {
            return;
        }
        match diagnostic.severity {
            Severity::Error => {
                self.errors += 1;
                if self.max_errors != 0 && self.errors > self.max_errors {
                    return;
                }
            }
            Severity::Warning => {
                self.warnings += 1;
                if self.max_warnings != 0 && self.warnings > self.max_warnings {
                    return;
                }
            }
            Severity::Note => {}
        }
        log::debug!("DIAG: {}", diagnostic);
        if let Some(sink) = self.sink.as_mut() {
            sink.report(&diagnostic);
        }
        self.reported.push(diagnostic);
    }

    /// Start buffering diagnostics
    pub fn push_deferred(&mut self) {
        self.deferred.push(DeferredDiagnostics::default());
    }

    /// Stop buffering and hand back what was buffered
    pub fn pop_deferred(&mut self) -> DeferredDiagnostics {
        self.deferred.pop().unwrap_or_default()
    }

    /// Report previously buffered diagnostics for real
    pub fn replay(&mut self, deferred: DeferredDiagnostics) {
        for d in deferred.diagnostics {
            self.report(d);
        }
    }

    pub fn is_deferring(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.reported
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reported.iter().filter(|d| d.is_error())
    }

    pub fn count_of(&self, kind: DiagKind) -> usize {
        self.reported.iter().filter(|d| d.kind == kind).count()
    }

    /// Forget everything reported so far (between compilation rounds)
    pub fn clear(&mut self) {
        self.reported.clear();
        self.deferred.clear();
        self.recorded.clear();
        self.errors = 0;
        self.warnings = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_diagnostics_do_not_reach_the_log() {
        let mut log = Log::default();
        log.push_deferred();
        log.error(DiagKind::CantResolve, Span::at(3), vec!["x".into()]);
        let deferred = log.pop_deferred();
        assert!(deferred.has_errors());
        assert_eq!(log.error_count(), 0);
        log.replay(deferred);
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn one_diagnostic_per_position_and_key() {
        let mut log = Log::default();
        log.error(DiagKind::CantResolve, Span::at(7), vec![]);
        log.error(DiagKind::CantResolve, Span::at(7), vec![]);
        log.error(DiagKind::IncompatibleTypes, Span::at(7), vec![]);
        assert_eq!(log.error_count(), 2);
    }

    #[test]
    fn fragments_are_searched() {
        let inner = Diagnostic::fragment(DiagKind::MissingRetVal, vec![]);
        let diag = Diagnostic::error(
            DiagKind::CantApplySymbol,
            Span::at(1),
            vec![DiagArg::Fragment(Box::new(Diagnostic::fragment(
                DiagKind::IncompatibleRetTypeInLambda,
                vec![DiagArg::Fragment(Box::new(inner))],
            )))],
        );
        assert!(diag.mentions(DiagKind::MissingRetVal));
        assert!(!diag.mentions(DiagKind::ArgLengthMismatch));
    }
}
