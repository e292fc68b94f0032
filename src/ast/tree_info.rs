//! Small queries over trees shared by attribution and desugaring

use super::*;
use crate::common::symbol::SymbolId;

/// Strip any number of enclosing parentheses
pub fn skip_parens(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Parens(inner) => skip_parens(inner),
        _ => expr,
    }
}

/// Symbol a name expression refers to, if attributed
pub fn symbol(expr: &Expr) -> Option<SymbolId> {
    match &skip_parens(expr).kind {
        ExprKind::Ident(id) => id.sym,
        ExprKind::Select(sel) => sel.sym,
        _ => None,
    }
}

/// Simple name of an identifier or the last segment of a select
pub fn name(expr: &Expr) -> Option<&str> {
    match &skip_parens(expr).kind {
        ExprKind::Ident(id) => Some(&id.name),
        ExprKind::Select(sel) => Some(&sel.name),
        _ => None,
    }
}

/// Dotted name of an identifier or select chain, `None` for anything else
pub fn dotted_name(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Ident(id) => Some(id.name.clone()),
        ExprKind::Select(sel) => dotted_name(&sel.target).map(|q| format!("{}.{}", q, sel.name)),
        _ => None,
    }
}

/// Expressions allowed as the body of a void lambda or as a statement
pub fn is_statement_expression(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Invoke(_) | ExprKind::NewClass(_) | ExprKind::Assign(_) | ExprKind::CompoundAssign(_) => true,
        ExprKind::Unary(u) => matches!(
            u.op,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        ),
        ExprKind::Erroneous(_) => true,
        _ => false,
    }
}

/// Whether a literal `null` (possibly parenthesized)
pub fn is_null(expr: &Expr) -> bool {
    matches!(skip_parens(expr).kind, ExprKind::Literal(Literal::Null))
}

/// Whether `expr` was inserted by error recovery
pub fn is_synthetic(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Erroneous(e) if e.synthetic)
}

/// Conservative reachability: can control fall out of `stmt`
pub fn completes_normally(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Yield(_) => false,
        Stmt::Block(b) => stats_complete_normally(&b.statements),
        Stmt::If(i) => match &i.else_branch {
            Some(e) => completes_normally(&i.then_branch) || completes_normally(e),
            None => true,
        },
        Stmt::While(w) => !is_true_literal(&w.cond) || contains_break(&w.body),
        Stmt::DoWhile(d) => {
            (completes_normally(&d.body) && !is_true_literal(&d.cond)) || contains_break(&d.body)
        }
        Stmt::For(f) => f.cond.as_ref().map(|c| !is_true_literal(c)).unwrap_or(false) || contains_break(&f.body),
        Stmt::Labeled(l) => completes_normally(&l.body) || contains_break(&l.body),
        Stmt::Switch(sw) => switch_completes_normally(sw),
        _ => true,
    }
}

pub fn stats_complete_normally(stats: &[Stmt]) -> bool {
    stats.iter().all(completes_normally)
}

fn switch_completes_normally(sw: &Switch) -> bool {
    let exhaustive = sw.cases.iter().any(Case::is_default) || sw.has_unconditional_pattern;
    if !exhaustive || sw.cases.is_empty() {
        return true;
    }
    sw.cases.iter().any(|c| {
        c.stats.iter().any(contains_break)
            || match c.kind {
                CaseKind::Rule => stats_complete_normally(&c.stats),
                CaseKind::Statement => false,
            }
    }) || sw
        .cases
        .last()
        .map(|c| c.kind == CaseKind::Statement && stats_complete_normally(&c.stats))
        .unwrap_or(true)
}

fn is_true_literal(expr: &Expr) -> bool {
    matches!(skip_parens(expr).kind, ExprKind::Literal(Literal::Boolean(true)))
        || matches!(skip_parens(expr).constant, Some(Literal::Boolean(true)))
}

/// Whether an unlabeled or labeled `break` occurs outside nested loops,
/// switches, lambdas and classes
pub fn contains_break(stmt: &Stmt) -> bool {
    struct BreakFinder {
        depth: usize,
        found: bool,
    }
    impl TreeScanner for BreakFinder {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            match stmt {
                Stmt::Break(b) if b.label.is_some() || self.depth == 0 => self.found = true,
                Stmt::While(_) | Stmt::DoWhile(_) | Stmt::For(_) | Stmt::ForEach(_) | Stmt::Switch(_) => {
                    self.depth += 1;
                    walk_stmt(self, stmt);
                    self.depth -= 1;
                }
                _ => walk_stmt(self, stmt),
            }
        }
        fn visit_class(&mut self, _class: &ClassDecl) {}
        fn visit_lambda(&mut self, _lambda: &LambdaExpr) {}
    }
    let mut finder = BreakFinder { depth: 0, found: false };
    finder.visit_stmt(stmt);
    finder.found
}

/// `return` statements of a lambda body, not descending into nested
/// lambdas or classes
pub fn lambda_returns(body: &Block) -> Vec<ReturnStmt> {
    struct ReturnCollector {
        returns: Vec<ReturnStmt>,
    }
    impl TreeScanner for ReturnCollector {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let Stmt::Return(r) = stmt {
                self.returns.push(r.clone());
            }
            walk_stmt(self, stmt)
        }
        fn visit_class(&mut self, _class: &ClassDecl) {}
        fn visit_lambda(&mut self, _lambda: &LambdaExpr) {}
    }
    let mut collector = ReturnCollector { returns: Vec::new() };
    collector.visit_block(body);
    collector.returns
}

/// Values of the `yield` statements that belong to this switch expression
pub fn switch_yields(switch: &Switch) -> Vec<Expr> {
    struct YieldCollector {
        values: Vec<Expr>,
    }
    impl TreeScanner for YieldCollector {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let Stmt::Yield(y) = stmt {
                self.values.push(y.value.clone());
                return;
            }
            walk_stmt(self, stmt)
        }
        fn visit_expr(&mut self, expr: &Expr) {
            // yields inside a nested switch expression belong to it
            if !matches!(expr.kind, ExprKind::Switch(_)) {
                walk_expr(self, expr)
            }
        }
        fn visit_class(&mut self, _class: &ClassDecl) {}
        fn visit_lambda(&mut self, _lambda: &LambdaExpr) {}
    }
    let mut collector = YieldCollector { values: Vec::new() };
    for case in &switch.cases {
        for stmt in &case.stats {
            collector.visit_stmt(stmt);
        }
    }
    collector.values
}

/// Symbols of every class declared in a subtree: the class itself, member
/// classes, local classes and anonymous classes
pub fn declared_classes(class: &ClassDecl) -> Vec<SymbolId> {
    struct ClassCollector {
        syms: Vec<SymbolId>,
    }
    impl TreeScanner for ClassCollector {
        fn visit_class(&mut self, class: &ClassDecl) {
            if let Some(sym) = class.sym {
                self.syms.push(sym);
            }
            walk_class(self, class)
        }
    }
    let mut collector = ClassCollector { syms: Vec::new() };
    collector.visit_class(class);
    collector.syms
}

/// Classes declared anywhere inside an expression (anonymous and local)
pub fn declared_classes_in_expr(expr: &Expr) -> Vec<SymbolId> {
    struct ClassCollector {
        syms: Vec<SymbolId>,
    }
    impl TreeScanner for ClassCollector {
        fn visit_class(&mut self, class: &ClassDecl) {
            if let Some(sym) = class.sym {
                self.syms.push(sym);
            }
            walk_class(self, class)
        }
    }
    let mut collector = ClassCollector { syms: Vec::new() };
    collector.visit_expr(expr);
    collector.syms
}

/// Run `f` on the method invocation or instance creation at `pos`.
/// Returns whether it was found.
pub fn with_invocation_mut<F: FnOnce(&mut Expr)>(class: &mut ClassDecl, pos: Pos, f: F) -> bool {
    struct Finder<F> {
        pos: Pos,
        action: Option<F>,
    }
    impl<F: FnOnce(&mut Expr)> TreeVisitorMut for Finder<F> {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            if self.action.is_none() {
                return;
            }
            if expr.pos() == self.pos && matches!(expr.kind, ExprKind::Invoke(_) | ExprKind::NewClass(_)) {
                if let Some(action) = self.action.take() {
                    action(expr);
                }
                return;
            }
            walk_expr_mut(self, expr)
        }
    }
    let mut finder = Finder {
        pos,
        action: Some(f),
    };
    finder.visit_class_mut(class);
    finder.action.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeMaker;

    #[test]
    fn return_in_both_branches_does_not_complete() {
        let m = TreeMaker::new();
        let stmt = m.if_stmt(m.ident("c"), m.ret_void(), Some(m.ret_void()));
        assert!(!completes_normally(&stmt));
        let stmt = m.if_stmt(m.ident("c"), m.ret_void(), None);
        assert!(completes_normally(&stmt));
        let forever = m.while_stmt(m.boolean(true), m.block_stmt(vec![]));
        assert!(!completes_normally(&forever));
        let broken = m.while_stmt(m.boolean(true), m.block_stmt(vec![m.break_stmt(None)]));
        assert!(completes_normally(&broken));
    }

    #[test]
    fn lambda_returns_skip_nested_lambdas() {
        let m = TreeMaker::new();
        let inner = m.lambda_implicit_block(&["y"], vec![m.ret(m.int(2))]);
        let body = m.block(vec![m.exec(m.call("f", vec![inner])), m.ret(m.int(1))]);
        let returns = lambda_returns(&body);
        assert_eq!(returns.len(), 1);
        assert!(matches!(returns[0].expr.as_ref().unwrap().kind, ExprKind::Literal(Literal::Int(1))));
    }

    #[test]
    fn yields_of_nested_switch_expressions_are_excluded() {
        let m = TreeMaker::new();
        let inner = m.switch_expr(m.ident("b"), vec![m.default_rule(vec![m.yield_stmt(m.int(9))])]);
        let sw = m.switch(
            m.ident("a"),
            vec![
                m.constant_rule(vec![m.int(1)], vec![m.yield_stmt(inner)]),
                m.default_rule(vec![m.yield_stmt(m.int(2))]),
            ],
        );
        let yields = switch_yields(&sw);
        assert_eq!(yields.len(), 2);
        assert!(matches!(yields[0].kind, ExprKind::Switch(_)));
    }

    #[test]
    fn finds_invocation_by_position() {
        let m = TreeMaker::new();
        let call = m.call("g", vec![]);
        let pos = call.pos();
        let method = m.method(&[], m.void_type(), "f", vec![], vec![m.exec(call)]);
        let mut class = m.class(&[], "A", vec![method]);
        let mut seen = None;
        assert!(with_invocation_mut(&mut class, pos, |e| seen = Some(e.pos())));
        assert_eq!(seen, Some(pos));
        assert!(!with_invocation_mut(&mut class, pos + 1000, |_| {}));
    }
}
