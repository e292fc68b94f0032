//! Structural tree equality
//!
//! Two trees are equivalent when they have the same shape and names.
//! Positions, attributed types and folded constants are ignored. Symbols
//! are compared only when both sides are attributed. Parameters declared
//! by the compared trees (lambda parameters, pattern bindings, locals) are
//! matched up by declaration order, so `x -> x + 1` and `y -> y + 1` are
//! equivalent.

use std::collections::HashMap;

use super::*;
use crate::common::symbol::SymbolId;

#[derive(Default)]
pub struct TreeDiffer {
    /// Names bound on the left mapped to their counterparts on the right
    equiv: HashMap<String, String>,
}

impl TreeDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Differ that treats each `(left, right)` name pair as the same variable
    pub fn with_equivalent_names(pairs: &[(&str, &str)]) -> Self {
        Self {
            equiv: pairs.iter().map(|(l, r)| (l.to_string(), r.to_string())).collect(),
        }
    }

    pub fn expr_equiv(&mut self, a: &Expr, b: &Expr) -> bool {
        match (&a.kind, &b.kind) {
            (ExprKind::Literal(x), ExprKind::Literal(y)) => literal_equiv(x, y),
            (ExprKind::Ident(x), ExprKind::Ident(y)) => {
                self.name_equiv(&x.name, &y.name) && sym_equiv(x.sym, y.sym)
            }
            (ExprKind::Select(x), ExprKind::Select(y)) => {
                x.name == y.name && sym_equiv(x.sym, y.sym) && self.expr_equiv(&x.target, &y.target)
            }
            (ExprKind::Parens(x), ExprKind::Parens(y)) => self.expr_equiv(x, y),
            (ExprKind::Unary(x), ExprKind::Unary(y)) => x.op == y.op && self.expr_equiv(&x.operand, &y.operand),
            (ExprKind::Binary(x), ExprKind::Binary(y)) => {
                x.op == y.op && self.expr_equiv(&x.left, &y.left) && self.expr_equiv(&x.right, &y.right)
            }
            (ExprKind::Assign(x), ExprKind::Assign(y)) => {
                self.expr_equiv(&x.target, &y.target) && self.expr_equiv(&x.value, &y.value)
            }
            (ExprKind::CompoundAssign(x), ExprKind::CompoundAssign(y)) => {
                x.op == y.op && self.expr_equiv(&x.target, &y.target) && self.expr_equiv(&x.value, &y.value)
            }
            (ExprKind::Conditional(x), ExprKind::Conditional(y)) => {
                self.expr_equiv(&x.cond, &y.cond)
                    && self.expr_equiv(&x.then_expr, &y.then_expr)
                    && self.expr_equiv(&x.else_expr, &y.else_expr)
            }
            (ExprKind::InstanceOf(x), ExprKind::InstanceOf(y)) => {
                self.expr_equiv(&x.expr, &y.expr)
                    && match (&x.target, &y.target) {
                        (InstanceOfTarget::Type(s), InstanceOfTarget::Type(t)) => self.type_equiv(s, t),
                        (InstanceOfTarget::Pattern(p), InstanceOfTarget::Pattern(q)) => self.pattern_equiv(p, q),
                        _ => false,
                    }
            }
            (ExprKind::Cast(x), ExprKind::Cast(y)) => {
                self.type_equiv(&x.target_type, &y.target_type) && self.expr_equiv(&x.expr, &y.expr)
            }
            (ExprKind::Invoke(x), ExprKind::Invoke(y)) => {
                x.name == y.name
                    && sym_equiv(x.sym, y.sym)
                    && self.opt_expr_equiv(x.target.as_deref(), y.target.as_deref())
                    && self.types_equiv(&x.type_args, &y.type_args)
                    && self.exprs_equiv(&x.args, &y.args)
            }
            (ExprKind::NewClass(x), ExprKind::NewClass(y)) => {
                x.diamond == y.diamond
                    && self.opt_expr_equiv(x.outer.as_deref(), y.outer.as_deref())
                    && self.type_equiv(&x.class_type, &y.class_type)
                    && self.exprs_equiv(&x.args, &y.args)
                    && match (&x.body, &y.body) {
                        (Some(p), Some(q)) => self.class_equiv(p, q),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (ExprKind::NewArray(x), ExprKind::NewArray(y)) => {
                match (&x.elem_type, &y.elem_type) {
                    (Some(s), Some(t)) if !self.type_equiv(s, t) => return false,
                    (Some(_), None) | (None, Some(_)) => return false,
                    _ => {}
                }
                self.exprs_equiv(&x.dims, &y.dims)
                    && match (&x.init, &y.init) {
                        (Some(p), Some(q)) => self.exprs_equiv(p, q),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (ExprKind::Index(x), ExprKind::Index(y)) => {
                self.expr_equiv(&x.array, &y.array) && self.expr_equiv(&x.index, &y.index)
            }
            (ExprKind::Lambda(x), ExprKind::Lambda(y)) => self.lambda_equiv(x, y),
            (ExprKind::Switch(x), ExprKind::Switch(y)) => self.switch_equiv(x, y),
            (ExprKind::ClassLit(x), ExprKind::ClassLit(y)) => self.type_equiv(x, y),
            (ExprKind::Annotation(x), ExprKind::Annotation(y)) => self.annotation_equiv(x, y),
            (ExprKind::This, ExprKind::This) => true,
            (ExprKind::Let(x), ExprKind::Let(y)) => {
                self.stmts_equiv(&x.defs, &y.defs) && self.expr_equiv(&x.expr, &y.expr)
            }
            (ExprKind::Indy(x), ExprKind::Indy(y)) => {
                x.bootstrap == y.bootstrap && x.static_args == y.static_args && self.exprs_equiv(&x.args, &y.args)
            }
            (ExprKind::Erroneous(x), ExprKind::Erroneous(y)) => self.exprs_equiv(&x.exprs, &y.exprs),
            _ => false,
        }
    }

    pub fn stmt_equiv(&mut self, a: &Stmt, b: &Stmt) -> bool {
        match (a, b) {
            (Stmt::Block(x), Stmt::Block(y)) => self.block_equiv(x, y),
            (Stmt::LocalVar(x), Stmt::LocalVar(y)) => self.var_equiv(x, y),
            (Stmt::LocalClass(x), Stmt::LocalClass(y)) => self.class_equiv(x, y),
            (Stmt::Expr(x), Stmt::Expr(y)) => self.expr_equiv(&x.expr, &y.expr),
            (Stmt::If(x), Stmt::If(y)) => {
                self.expr_equiv(&x.cond, &y.cond)
                    && self.stmt_equiv(&x.then_branch, &y.then_branch)
                    && match (&x.else_branch, &y.else_branch) {
                        (Some(p), Some(q)) => self.stmt_equiv(p, q),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (Stmt::While(x), Stmt::While(y)) => self.expr_equiv(&x.cond, &y.cond) && self.stmt_equiv(&x.body, &y.body),
            (Stmt::DoWhile(x), Stmt::DoWhile(y)) => {
                self.stmt_equiv(&x.body, &y.body) && self.expr_equiv(&x.cond, &y.cond)
            }
            (Stmt::For(x), Stmt::For(y)) => {
                self.stmts_equiv(&x.init, &y.init)
                    && self.opt_expr_equiv(x.cond.as_ref(), y.cond.as_ref())
                    && self.exprs_equiv(&x.update, &y.update)
                    && self.stmt_equiv(&x.body, &y.body)
            }
            (Stmt::ForEach(x), Stmt::ForEach(y)) => {
                self.expr_equiv(&x.iterable, &y.iterable) && self.var_equiv(&x.var, &y.var) && self.stmt_equiv(&x.body, &y.body)
            }
            (Stmt::Switch(x), Stmt::Switch(y)) => self.switch_equiv(x, y),
            (Stmt::Return(x), Stmt::Return(y)) => self.opt_expr_equiv(x.expr.as_ref(), y.expr.as_ref()),
            (Stmt::Yield(x), Stmt::Yield(y)) => self.expr_equiv(&x.value, &y.value),
            (Stmt::Break(x), Stmt::Break(y)) => x.label == y.label,
            (Stmt::Continue(x), Stmt::Continue(y)) => x.label == y.label,
            (Stmt::Throw(x), Stmt::Throw(y)) => self.expr_equiv(&x.expr, &y.expr),
            (Stmt::Labeled(x), Stmt::Labeled(y)) => x.label == y.label && self.stmt_equiv(&x.body, &y.body),
            (Stmt::Empty(_), Stmt::Empty(_)) => true,
            _ => false,
        }
    }

    pub fn block_equiv(&mut self, a: &Block, b: &Block) -> bool {
        self.stmts_equiv(&a.statements, &b.statements)
    }

    pub fn type_equiv(&mut self, a: &TypeExpr, b: &TypeExpr) -> bool {
        if let (Some(s), Some(t)) = (&a.ty, &b.ty) {
            return s == t;
        }
        match (&a.kind, &b.kind) {
            (TypeExprKind::Primitive(s), TypeExprKind::Primitive(t)) => s == t,
            (TypeExprKind::Void, TypeExprKind::Void) | (TypeExprKind::Var, TypeExprKind::Var) => true,
            (TypeExprKind::Named { name: n, args: xs }, TypeExprKind::Named { name: m, args: ys }) => {
                n == m && self.types_equiv(xs, ys)
            }
            (TypeExprKind::Array(s), TypeExprKind::Array(t)) => self.type_equiv(s, t),
            (TypeExprKind::Wildcard { kind: k, bound: x }, TypeExprKind::Wildcard { kind: l, bound: y }) => {
                k == l
                    && match (x, y) {
                        (Some(s), Some(t)) => self.type_equiv(s, t),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (
                TypeExprKind::Annotated { annotations: xs, underlying: s },
                TypeExprKind::Annotated { annotations: ys, underlying: t },
            ) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(x, y)| self.annotation_equiv(x, y))
                    && self.type_equiv(s, t)
            }
            _ => false,
        }
    }

    pub fn class_equiv(&mut self, a: &ClassDecl, b: &ClassDecl) -> bool {
        if a.kind != b.kind || a.name != b.name || a.modifiers != b.modifiers || a.members.len() != b.members.len() {
            return false;
        }
        let extends = match (&a.extends, &b.extends) {
            (Some(s), Some(t)) => self.type_equiv(s, t),
            (None, None) => true,
            _ => false,
        };
        extends
            && self.types_equiv(&a.implements, &b.implements)
            && a.members.iter().zip(&b.members).all(|(x, y)| self.member_equiv(x, y))
    }

    fn member_equiv(&mut self, a: &ClassMember, b: &ClassMember) -> bool {
        match (a, b) {
            (ClassMember::Field(x), ClassMember::Field(y)) => self.var_equiv(x, y),
            (ClassMember::Method(x), ClassMember::Method(y)) => {
                if x.name != y.name || x.modifiers != y.modifiers || x.params.len() != y.params.len() {
                    return false;
                }
                let ret = match (&x.return_type, &y.return_type) {
                    (Some(s), Some(t)) => self.type_equiv(s, t),
                    (None, None) => true,
                    _ => false,
                };
                ret && x.params.iter().zip(&y.params).all(|(p, q)| self.var_equiv(p, q))
                    && match (&x.body, &y.body) {
                        (Some(p), Some(q)) => self.block_equiv(p, q),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (ClassMember::Class(x), ClassMember::Class(y)) => self.class_equiv(x, y),
            (ClassMember::Initializer(x), ClassMember::Initializer(y)) => {
                x.is_static == y.is_static && self.block_equiv(&x.body, &y.body)
            }
            (ClassMember::EnumConstant(x), ClassMember::EnumConstant(y)) => {
                x.name == y.name && self.exprs_equiv(&x.args, &y.args)
            }
            _ => false,
        }
    }

    /// Declarations bind their names for the rest of the comparison
    fn var_equiv(&mut self, a: &VarDecl, b: &VarDecl) -> bool {
        let types = match (&a.var_type, &b.var_type) {
            (Some(s), Some(t)) => self.type_equiv(s, t),
            (None, None) => true,
            _ => false,
        };
        if !types || a.modifiers != b.modifiers || a.is_varargs != b.is_varargs {
            return false;
        }
        if !self.opt_expr_equiv(a.init.as_ref(), b.init.as_ref()) {
            return false;
        }
        self.equiv.insert(a.name.clone(), b.name.clone());
        true
    }

    fn pattern_equiv(&mut self, a: &Pattern, b: &Pattern) -> bool {
        match (&a.kind, &b.kind) {
            (PatternKind::Binding(x), PatternKind::Binding(y)) => self.var_equiv(x, y),
            (PatternKind::Parenthesized(x), PatternKind::Parenthesized(y)) => self.pattern_equiv(x, y),
            _ => false,
        }
    }

    fn lambda_equiv(&mut self, a: &LambdaExpr, b: &LambdaExpr) -> bool {
        if a.param_kind != b.param_kind || a.params.len() != b.params.len() {
            return false;
        }
        if !a.params.iter().zip(&b.params).all(|(p, q)| self.var_equiv(p, q)) {
            return false;
        }
        match (&a.body, &b.body) {
            (LambdaBody::Expr(x), LambdaBody::Expr(y)) => self.expr_equiv(x, y),
            (LambdaBody::Block(x), LambdaBody::Block(y)) => self.block_equiv(x, y),
            _ => false,
        }
    }

    fn switch_equiv(&mut self, a: &Switch, b: &Switch) -> bool {
        if !self.expr_equiv(&a.selector, &b.selector) || a.cases.len() != b.cases.len() {
            return false;
        }
        a.cases.iter().zip(&b.cases).all(|(x, y)| {
            x.kind == y.kind
                && x.labels.len() == y.labels.len()
                && x.labels.iter().zip(&y.labels).all(|(l, m)| match (l, m) {
                    (CaseLabel::Default(_), CaseLabel::Default(_)) => true,
                    (CaseLabel::Constant(p), CaseLabel::Constant(q)) => self.expr_equiv(p, q),
                    (CaseLabel::Pattern(p), CaseLabel::Pattern(q)) => self.pattern_equiv(p, q),
                    _ => false,
                })
                && self.opt_expr_equiv(x.guard.as_ref(), y.guard.as_ref())
                && self.stmts_equiv(&x.stats, &y.stats)
        })
    }

    fn annotation_equiv(&mut self, a: &Annotation, b: &Annotation) -> bool {
        a.name == b.name
            && a.arguments.len() == b.arguments.len()
            && a.arguments.iter().zip(&b.arguments).all(|(x, y)| match (x, y) {
                (AnnotationArg::Value(p), AnnotationArg::Value(q)) => self.expr_equiv(p, q),
                (AnnotationArg::Named(n, p), AnnotationArg::Named(m, q)) => n == m && self.expr_equiv(p, q),
                _ => false,
            })
    }

    fn name_equiv(&self, a: &str, b: &str) -> bool {
        match self.equiv.get(a) {
            Some(mapped) => mapped == b,
            None => a == b,
        }
    }

    fn opt_expr_equiv(&mut self, a: Option<&Expr>, b: Option<&Expr>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => self.expr_equiv(x, y),
            (None, None) => true,
            _ => false,
        }
    }

    fn exprs_equiv(&mut self, a: &[Expr], b: &[Expr]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.expr_equiv(x, y))
    }

    fn stmts_equiv(&mut self, a: &[Stmt], b: &[Stmt]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.stmt_equiv(x, y))
    }

    fn types_equiv(&mut self, a: &[TypeExpr], b: &[TypeExpr]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.type_equiv(x, y))
    }
}

fn sym_equiv(a: Option<SymbolId>, b: Option<SymbolId>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// Bitwise for floating point so `NaN` equals itself
fn literal_equiv(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (Literal::Float(x), Literal::Float(y)) => x.to_bits() == y.to_bits(),
        (Literal::Double(x), Literal::Double(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeMaker;

    #[test]
    fn lambdas_differing_only_in_parameter_names_are_equivalent() {
        let m = TreeMaker::new();
        let a = m.lambda_implicit(&["x"], m.binary(m.ident("x"), BinaryOp::Add, m.int(1)));
        let b = m.lambda_implicit(&["y"], m.binary(m.ident("y"), BinaryOp::Add, m.int(1)));
        let c = m.lambda_implicit(&["y"], m.binary(m.ident("y"), BinaryOp::Add, m.int(2)));
        assert!(TreeDiffer::new().expr_equiv(&a, &b));
        assert!(!TreeDiffer::new().expr_equiv(&a, &c));
    }

    #[test]
    fn free_names_must_match() {
        let m = TreeMaker::new();
        let a = m.call_on(m.ident("list"), "size", vec![]);
        let b = m.call_on(m.ident("other"), "size", vec![]);
        assert!(!TreeDiffer::new().expr_equiv(&a, &b));
        assert!(TreeDiffer::with_equivalent_names(&[("list", "other")]).expr_equiv(&a, &b));
    }
}
