//! Structural tree hashing, consistent with [`TreeDiffer::new`]
//!
//! Trees that the differ considers equivalent hash to the same value:
//! positions, types and symbols are skipped, and variables declared inside
//! the hashed tree contribute their declaration index instead of their name.
//!
//! [`TreeDiffer::new`]: super::TreeDiffer::new

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::mem;

use super::*;

pub struct TreeHasher {
    state: DefaultHasher,
    bound: HashMap<String, usize>,
}

impl Default for TreeHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeHasher {
    pub fn new() -> Self {
        Self {
            state: DefaultHasher::new(),
            bound: HashMap::new(),
        }
    }

    pub fn hash_expr(expr: &Expr) -> u64 {
        let mut h = Self::new();
        h.visit_expr(expr);
        h.state.finish()
    }

    pub fn hash_stmt(stmt: &Stmt) -> u64 {
        let mut h = Self::new();
        h.visit_stmt(stmt);
        h.state.finish()
    }

    pub fn hash_block(block: &Block) -> u64 {
        let mut h = Self::new();
        h.visit_block(block);
        h.state.finish()
    }

    fn literal(&mut self, lit: &Literal) {
        mem::discriminant(lit).hash(&mut self.state);
        match lit {
            Literal::Int(v) => v.hash(&mut self.state),
            Literal::Long(v) => v.hash(&mut self.state),
            Literal::Float(v) => v.to_bits().hash(&mut self.state),
            Literal::Double(v) => v.to_bits().hash(&mut self.state),
            Literal::Char(v) => v.hash(&mut self.state),
            Literal::Boolean(v) => v.hash(&mut self.state),
            Literal::String(v) => v.hash(&mut self.state),
            Literal::Null => {}
        }
    }

    fn name(&mut self, name: &str) {
        match self.bound.get(name) {
            Some(index) => index.hash(&mut self.state),
            None => name.hash(&mut self.state),
        }
    }
}

impl TreeScanner for TreeHasher {
    fn visit_expr(&mut self, expr: &Expr) {
        mem::discriminant(&expr.kind).hash(&mut self.state);
        match &expr.kind {
            ExprKind::Literal(lit) => self.literal(lit),
            ExprKind::Ident(id) => self.name(&id.name),
            ExprKind::Select(sel) => sel.name.hash(&mut self.state),
            ExprKind::Unary(u) => u.op.hash(&mut self.state),
            ExprKind::Binary(b) => b.op.hash(&mut self.state),
            ExprKind::CompoundAssign(a) => a.op.hash(&mut self.state),
            ExprKind::Invoke(inv) => {
                inv.name.hash(&mut self.state);
                inv.args.len().hash(&mut self.state);
            }
            ExprKind::NewClass(nc) => nc.diamond.hash(&mut self.state),
            ExprKind::Indy(indy) => indy.bootstrap.hash(&mut self.state),
            ExprKind::Annotation(a) => a.name.hash(&mut self.state),
            _ => {}
        }
        walk_expr(self, expr)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        mem::discriminant(stmt).hash(&mut self.state);
        match stmt {
            Stmt::Break(b) => b.label.hash(&mut self.state),
            Stmt::Continue(c) => c.label.hash(&mut self.state),
            Stmt::Labeled(l) => l.label.hash(&mut self.state),
            _ => {}
        }
        walk_stmt(self, stmt)
    }

    fn visit_var(&mut self, var: &VarDecl) {
        var.is_varargs.hash(&mut self.state);
        if let Some(init) = &var.init {
            self.visit_expr(init);
        }
        let index = self.bound.len();
        self.bound.insert(var.name.clone(), index);
    }

    fn visit_class(&mut self, class: &ClassDecl) {
        class.kind.hash(&mut self.state);
        class.name.hash(&mut self.state);
        walk_class(self, class)
    }

    fn visit_lambda(&mut self, lambda: &LambdaExpr) {
        lambda.params.len().hash(&mut self.state);
        walk_lambda(self, lambda)
    }

    // resolved and unresolved spellings of a type compare equal
    fn visit_type_expr(&mut self, _ty: &TypeExpr) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{TreeDiffer, TreeMaker};

    #[test]
    fn equivalent_lambdas_hash_alike() {
        let m = TreeMaker::new();
        let a = m.lambda_implicit(&["x"], m.binary(m.ident("x"), BinaryOp::Mul, m.ident("k")));
        let b = m.lambda_implicit(&["y"], m.binary(m.ident("y"), BinaryOp::Mul, m.ident("k")));
        assert!(TreeDiffer::new().expr_equiv(&a, &b));
        assert_eq!(TreeHasher::hash_expr(&a), TreeHasher::hash_expr(&b));
    }

    #[test]
    fn different_operators_hash_apart() {
        let m = TreeMaker::new();
        let a = m.binary(m.ident("a"), BinaryOp::Add, m.int(1));
        let b = m.binary(m.ident("a"), BinaryOp::Sub, m.int(1));
        assert_ne!(TreeHasher::hash_expr(&a), TreeHasher::hash_expr(&b));
    }
}
