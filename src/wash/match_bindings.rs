//! Match bindings - the variables a pattern-bearing condition introduces
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.MatchBindingsComputer`.
//! Every boolean expression has a pair of binding sets: the variables in
//! scope when it evaluates to true and those in scope when it evaluates to
//! false. The combinators below propagate the pairs through `!`, `&&`,
//! `||`, `?:` and case labels.

use log::trace;

use crate::ast::{Expr, ExprKind, Span};
use crate::common::diag::{DiagKind, Log};
use crate::common::flags::Flags;
use crate::common::symbol::SymbolId;
use crate::common::symtab::Symtab;
use crate::ast::BinaryOp;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchBindings {
    pub when_true: Vec<SymbolId>,
    pub when_false: Vec<SymbolId>,
    /// Set for a `case null` label, which constrains nothing
    pub null_pattern: bool,
}

impl MatchBindings {
    pub const EMPTY: MatchBindings = MatchBindings {
        when_true: Vec::new(),
        when_false: Vec::new(),
        null_pattern: false,
    };

    pub fn new(when_true: Vec<SymbolId>, when_false: Vec<SymbolId>) -> Self {
        Self {
            when_true,
            when_false,
            null_pattern: false,
        }
    }

    /// Bindings of a type test pattern: true only when it matched
    pub fn of_pattern(binding: SymbolId) -> Self {
        Self::new(vec![binding], Vec::new())
    }

    pub fn null_case() -> Self {
        Self {
            null_pattern: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.when_true.is_empty() && self.when_false.is_empty()
    }
}

pub struct MatchBindingsComputer<'a> {
    symtab: &'a mut Symtab,
    log: &'a mut Log,
}

impl<'a> MatchBindingsComputer<'a> {
    pub fn new(symtab: &'a mut Symtab, log: &'a mut Log) -> Self {
        Self { symtab, log }
    }

    /// `!e`
    pub fn unary_not(&mut self, operand: &MatchBindings) -> MatchBindings {
        MatchBindings::new(operand.when_false.clone(), operand.when_true.clone())
    }

    pub fn binary(&mut self, span: Span, op: BinaryOp, lhs: &MatchBindings, rhs: &MatchBindings) -> MatchBindings {
        match op {
            BinaryOp::And => {
                // e.T = union(x.T, y.T)
                // e.F = intersection(x.F, y.F) (error recovery)
                let when_true = self.union(span, &lhs.when_true, &rhs.when_true);
                let when_false = self.intersection(span, &lhs.when_false, &rhs.when_false);
                MatchBindings::new(when_true, when_false)
            }
            BinaryOp::Or => {
                // e.T = intersection(x.T, y.T) (error recovery)
                // e.F = union(x.F, y.F)
                let when_true = self.intersection(span, &lhs.when_true, &rhs.when_true);
                let when_false = self.union(span, &lhs.when_false, &rhs.when_false);
                MatchBindings::new(when_true, when_false)
            }
            _ => MatchBindings::EMPTY,
        }
    }

    /// `c ? t : f`.
    ///
    /// Bindings of a conditional never escape it; the unions only report
    /// names declared twice across the operands.
    pub fn conditional(
        &mut self,
        span: Span,
        cond: &MatchBindings,
        then: &MatchBindings,
        otherwise: &MatchBindings,
    ) -> MatchBindings {
        if cond.is_empty() && then.is_empty() && otherwise.is_empty() {
            return MatchBindings::EMPTY;
        }
        // x.T, y.T / x.T, z.T / x.F, y.T / x.F, z.T / y.T, z.T / y.F, z.F
        self.union(span, &cond.when_true, &then.when_true);
        self.union(span, &cond.when_true, &otherwise.when_true);
        self.union(span, &cond.when_false, &then.when_true);
        self.union(span, &cond.when_false, &otherwise.when_true);
        self.union(span, &then.when_true, &otherwise.when_true);
        self.union(span, &then.when_false, &otherwise.when_false);
        MatchBindings::EMPTY
    }

    /// Bindings after two case labels joined by fallthrough
    pub fn switch_case(&mut self, span: Span, prev: &MatchBindings, current: &MatchBindings) -> MatchBindings {
        if prev.null_pattern {
            return current.clone();
        }
        if current.null_pattern {
            return prev.clone();
        }
        let when_true = self.intersection(span, &prev.when_true, &current.when_true);
        let when_false = self.intersection(span, &prev.when_false, &current.when_false);
        MatchBindings::new(when_true, when_false)
    }

    /// Bindings kept past `expr`; only condition shapes carry them
    pub fn finish_bindings(&mut self, expr: &Expr, bindings: MatchBindings) -> MatchBindings {
        match &expr.kind {
            ExprKind::Unary(u) if u.op == crate::ast::UnaryOp::Not => bindings,
            ExprKind::Binary(b) if matches!(b.op, BinaryOp::And | BinaryOp::Or) => bindings,
            ExprKind::Parens(_) | ExprKind::InstanceOf(_) | ExprKind::Conditional(_) => bindings,
            _ => MatchBindings::EMPTY,
        }
    }

    fn intersection(&mut self, span: Span, lhs: &[SymbolId], rhs: &[SymbolId]) -> Vec<SymbolId> {
        // lhs and rhs are disjoint sets of declarations; a shared name is a
        // redeclaration in the same scope
        let mut list = Vec::new();
        for &v1 in lhs {
            for &v2 in rhs {
                if self.symtab.sym(v1).name == self.symtab.sym(v2).name
                    && !self.symtab.sym(v1).flags.contains(Flags::CLASH)
                    && !self.symtab.sym(v2).flags.contains(Flags::CLASH)
                {
                    let name = self.symtab.sym(v2).name.clone();
                    self.log.error(DiagKind::MatchBindingExists, span, vec![name.into()]);
                    self.symtab.sym_mut(v2).flags.insert(Flags::CLASH);
                    trace!("MATCH: {} clashes", self.symtab.sym(v2).name);
                    list.push(v2);
                }
            }
        }
        list.retain(|v| !self.symtab.sym(*v).flags.contains(Flags::CLASH));
        list
    }

    fn union(&mut self, span: Span, lhs: &[SymbolId], rhs: &[SymbolId]) -> Vec<SymbolId> {
        let mut list: Vec<SymbolId> = lhs.to_vec();
        for &v2 in rhs {
            let clashes = list.iter().any(|&v1| {
                self.symtab.sym(v1).name == self.symtab.sym(v2).name
                    && !self.symtab.sym(v1).flags.contains(Flags::CLASH)
            });
            if clashes && !self.symtab.sym(v2).flags.contains(Flags::CLASH) {
                let name = self.symtab.sym(v2).name.clone();
                self.log.error(DiagKind::MatchBindingExists, span, vec![name.into()]);
                self.symtab.sym_mut(v2).flags.insert(Flags::CLASH);
            }
            list.push(v2);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Type;

    fn binding(symtab: &mut Symtab, name: &str) -> SymbolId {
        let owner = symtab.predef.object;
        symtab.new_var(owner, name, Flags::MATCH_BINDING, Type::class(symtab.predef.string))
    }

    #[test]
    fn not_swaps_sets() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let s = binding(&mut symtab, "s");
        let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
        let negated = mb.unary_not(&MatchBindings::of_pattern(s));
        assert!(negated.when_true.is_empty());
        assert_eq!(negated.when_false, vec![s]);
    }

    #[test]
    fn and_unions_true_sets() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let s = binding(&mut symtab, "s");
        let t = binding(&mut symtab, "t");
        let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
        let result = mb.binary(
            Span::at(1),
            BinaryOp::And,
            &MatchBindings::of_pattern(s),
            &MatchBindings::of_pattern(t),
        );
        assert_eq!(result.when_true, vec![s, t]);
        assert!(result.when_false.is_empty());
        assert!(!log.has_errors());
    }

    #[test]
    fn duplicate_names_in_union_are_reported_but_kept() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let a = binding(&mut symtab, "x");
        let b = binding(&mut symtab, "x");
        let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
        let result = mb.binary(
            Span::at(4),
            BinaryOp::And,
            &MatchBindings::of_pattern(a),
            &MatchBindings::of_pattern(b),
        );
        assert_eq!(result.when_true.len(), 2);
        assert_eq!(log.count_of(DiagKind::MatchBindingExists), 1);
    }

    #[test]
    fn clashing_binding_is_reported_once() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let a = binding(&mut symtab, "x");
        let b = binding(&mut symtab, "x");
        let c = binding(&mut symtab, "x");
        {
            let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
            let first = mb.binary(
                Span::at(1),
                BinaryOp::And,
                &MatchBindings::of_pattern(a),
                &MatchBindings::of_pattern(b),
            );
            // `b` clashed already; combining it again is quiet
            mb.binary(Span::at(2), BinaryOp::And, &MatchBindings::of_pattern(c), &first);
        }
        assert!(symtab.sym(b).flags.contains(Flags::CLASH));
        assert_eq!(log.count_of(DiagKind::MatchBindingExists), 2);
    }

    #[test]
    fn intersection_marks_clash_and_drops_it() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let a = binding(&mut symtab, "x");
        let b = binding(&mut symtab, "x");
        let result = {
            let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
            mb.binary(
                Span::at(2),
                BinaryOp::Or,
                &MatchBindings::of_pattern(a),
                &MatchBindings::of_pattern(b),
            )
        };
        assert!(result.when_true.is_empty());
        assert!(symtab.sym(b).flags.contains(Flags::CLASH));
        assert_eq!(log.count_of(DiagKind::MatchBindingExists), 1);
    }

    #[test]
    fn null_case_passes_other_side_through() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let s = binding(&mut symtab, "s");
        let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
        let merged = mb.switch_case(Span::at(1), &MatchBindings::null_case(), &MatchBindings::of_pattern(s));
        assert_eq!(merged.when_true, vec![s]);
    }

    #[test]
    fn conditional_bindings_do_not_escape() {
        let mut symtab = Symtab::new();
        let mut log = Log::default();
        let s = binding(&mut symtab, "s");
        let mut mb = MatchBindingsComputer::new(&mut symtab, &mut log);
        let result = mb.conditional(
            Span::at(1),
            &MatchBindings::of_pattern(s),
            &MatchBindings::EMPTY,
            &MatchBindings::EMPTY,
        );
        assert!(result.is_empty());
    }
}
