//! AttrRecover - retry of calls whose lambda arguments broke resolution
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.AttrRecover`. When a
//! call is inapplicable only because a lambda argument has the wrong shape
//! (a missing or unexpected return value, a missing argument) the failure
//! is queued instead of reported. Once the enclosing class is attributed
//! each queued call is patched to fit the candidate's signature, attributed
//! again so the lambda bodies get checked against real target types, and
//! the patches are rolled back. The original diagnostic is reported
//! exactly once.

use std::collections::VecDeque;

use log::{debug, warn};

use super::SemanticAnalyzer;
use crate::ast::{
    tree_info, walk_block_mut, walk_expr_mut, walk_stmt_mut, Block, ClassDecl, ErroneousExpr, Expr, ExprKind,
    LambdaBody, LambdaExpr, LambdaParamKind, Pos, ReturnStmt, Span, Stmt, TreeHasher, TreeVisitorMut,
};
use crate::common::diag::{DiagKind, Diagnostic};
use crate::common::env::{Env, ResultInfo};
use crate::common::flags::Flags;
use crate::common::symbol::SymbolId;
use crate::common::types::Type;
use crate::error::Result;

/// A call waiting to be retried
#[derive(Debug, Clone)]
pub(crate) struct RecoverTodo {
    /// Position of the invocation or instance creation
    pub pos: Pos,
    pub candidate: SymbolId,
    pub site: Type,
    pub env: Env,
    pub ri: ResultInfo,
    /// The resolution failure, reported when recovery is done
    pub diag: Diagnostic,
}

#[derive(Debug, Default)]
pub struct RecoveryQueue {
    todo: VecDeque<RecoverTodo>,
    retrying: bool,
}

impl RecoveryQueue {
    pub fn len(&self) -> usize {
        self.todo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todo.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.todo.clear();
        self.retrying = false;
    }
}

fn wrap_synthetic(expr: &mut Expr) {
    let inner = std::mem::take(expr);
    let span = inner.span;
    *expr = Expr::new(
        ExprKind::Erroneous(ErroneousExpr {
            exprs: vec![inner],
            synthetic: true,
        }),
        span,
    );
}

/// Placeholder for a missing argument or return value
fn is_placeholder(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Erroneous(e) if e.synthetic && e.exprs.is_empty())
}

fn call_args(call: &mut Expr) -> Option<&mut Vec<Expr>> {
    match &mut call.kind {
        ExprKind::Invoke(inv) => Some(&mut inv.args),
        ExprKind::NewClass(nc) => Some(&mut nc.args),
        _ => None,
    }
}

/// Fixes the `return` statements of one lambda body; nested lambdas and
/// classes keep theirs
struct ReturnPatcher {
    void_result: bool,
}

impl TreeVisitorMut for ReturnPatcher {
    fn visit_class_mut(&mut self, _class: &mut ClassDecl) {}

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if matches!(expr.kind, ExprKind::Lambda(_)) {
            return;
        }
        walk_expr_mut(self, expr)
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Return(ReturnStmt { expr, .. }) = stmt {
            match expr {
                Some(value) if self.void_result => wrap_synthetic(value),
                None if !self.void_result => *expr = Some(Expr::default()),
                _ => {}
            }
            return;
        }
        walk_stmt_mut(self, stmt)
    }
}

/// Removes everything recovery inserted
struct Rollback;

impl TreeVisitorMut for Rollback {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if let Some(args) = call_args(expr) {
            args.retain(|a| !is_placeholder(a));
        }
        if let ExprKind::Erroneous(e) = &mut expr.kind {
            if e.synthetic && e.exprs.len() == 1 {
                if let Some(inner) = e.exprs.pop() {
                    *expr = inner;
                }
            }
        }
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
        if let Stmt::Return(r) = stmt {
            if r.expr.as_ref().map(is_placeholder).unwrap_or(false) {
                r.expr = None;
            }
        }
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
        block
            .statements
            .retain(|s| !matches!(s, Stmt::Return(r) if r.span == Span::default()));
    }
}

impl SemanticAnalyzer {
    /// Queue an inapplicable call for recovery if its failure looks like a
    /// lambda shape problem. Hands the diagnostic back when it is not.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn try_defer_recovery(
        &mut self,
        pos: Pos,
        env: &Env,
        ri: &ResultInfo,
        candidate: Option<SymbolId>,
        site: Type,
        diag: Diagnostic,
        args: &[Expr],
    ) -> Option<Diagnostic> {
        let Some(candidate) = candidate else {
            return Some(diag);
        };
        let shape_problem = [DiagKind::MissingRetVal, DiagKind::UnexpectedRetVal, DiagKind::ArgLengthMismatch]
            .into_iter()
            .any(|k| diag.mentions(k));
        let has_lambda = args
            .iter()
            .any(|a| matches!(tree_info::skip_parens(a).kind, ExprKind::Lambda(_)));
        if !shape_problem || !has_lambda || env.info.is_speculative() || self.recovery.retrying {
            return Some(diag);
        }
        debug!("ATTR: deferring recovery of call at {}", pos);
        self.recovery.todo.push_back(RecoverTodo {
            pos,
            candidate,
            site,
            env: env.clone(),
            ri: ri.clone(),
            diag,
        });
        None
    }

    /// Retry every queued call found in `class`. Calls that cannot be
    /// found get their diagnostic reported as is.
    pub(crate) fn recover_invocations(&mut self, class: &mut ClassDecl) -> Result<()> {
        while let Some(todo) = self.recovery.todo.pop_front() {
            let mut original: Option<Expr> = None;
            tree_info::with_invocation_mut(class, todo.pos, |call| original = Some(call.clone()));
            let Some(mut call) = original else {
                self.log.report(todo.diag);
                continue;
            };
            let pristine = TreeHasher::hash_expr(&call);
            if self.patch_call(&mut call, &todo) {
                self.recover(&mut call, &todo)?;
                if TreeHasher::hash_expr(&call) != pristine {
                    warn!("ATTR: call at {} changed shape during recovery", todo.pos);
                }
            } else {
                self.recover_basic(&mut call, &todo)?;
            }
            tree_info::with_invocation_mut(class, todo.pos, |slot| *slot = call);
        }
        Ok(())
    }

    /// Make the arguments of `call` fit the candidate; false when the call
    /// has nothing a patch can fix
    fn patch_call(&mut self, call: &mut Expr, todo: &RecoverTodo) -> bool {
        let (formals, is_varargs) = {
            let types = self.types();
            let Some(mt) = types.member_type(&todo.site, todo.candidate).method_type().cloned() else {
                return false;
            };
            let formals: Vec<Type> = mt.params.iter().map(|p| types.erasure(p)).collect();
            (formals, self.symtab.sym(todo.candidate).flags.contains(Flags::VARARGS))
        };
        let fixed = if is_varargs { formals.len().saturating_sub(1) } else { formals.len() };
        let Some(args) = call_args(call) else {
            return false;
        };
        let mut patched = false;
        while args.len() < fixed {
            args.push(Expr::default());
            patched = true;
        }
        for (i, arg) in args.iter_mut().enumerate() {
            let ExprKind::Lambda(lambda) = &mut arg.kind else {
                continue;
            };
            let formal = match formals.get(i) {
                Some(f) if !(is_varargs && i + 1 >= formals.len()) => f.clone(),
                _ => match formals.last() {
                    Some(last) if is_varargs => self.types().elem_type(last).unwrap_or_else(|| last.clone()),
                    _ => continue,
                },
            };
            let Ok(desc) = self.lambda_descriptor(&formal) else {
                continue;
            };
            patch_lambda(lambda, desc.ret.is_void());
            patched = true;
        }
        patched
    }

    /// Attribute the patched call again, then undo the patches
    fn recover(&mut self, call: &mut Expr, todo: &RecoverTodo) -> Result<()> {
        debug!("ATTR: retrying call at {}", todo.pos);
        let saved_bindings = std::mem::take(&mut self.bindings);
        self.recovery.retrying = true;
        self.log.push_deferred();
        let result = self.with_local_cache(|sa| sa.attrib_expr(call, &todo.env, &todo.ri));
        let deferred = self.log.pop_deferred();
        self.recovery.retrying = false;
        self.bindings = saved_bindings;
        Rollback.visit_expr_mut(call);
        self.log.report(todo.diag.clone());
        for d in deferred.diagnostics {
            if d.pos() != todo.pos {
                self.log.report(d);
            }
        }
        result.map(|_| ())
    }

    /// Nothing to patch: report, then type the call as the candidate
    /// would have so the enclosing expression checks on
    fn recover_basic(&mut self, call: &mut Expr, todo: &RecoverTodo) -> Result<()> {
        self.log.report(todo.diag.clone());
        if let Some(args) = call_args(call) {
            self.commit_erroneous_args(args, &todo.env)?;
        }
        call.ty = Some(self.recovery_type(call, todo));
        Ok(())
    }

    /// Result type of a call whose arguments never fit the candidate.
    /// Results that depend on the candidate's own type variables stay
    /// a recovery type.
    fn recovery_type(&self, call: &Expr, todo: &RecoverTodo) -> Type {
        if matches!(call.kind, ExprKind::NewClass(_)) || self.symtab.sym(todo.candidate).is_constructor() {
            return todo.site.clone();
        }
        let types = self.types();
        match types.member_type(&todo.site, todo.candidate).method_type() {
            Some(mt) if !mt.ret.mentions(&mt.tvars) => (*mt.ret).clone(),
            _ => Type::Recovery,
        }
    }
}

fn patch_lambda(lambda: &mut LambdaExpr, void_result: bool) {
    if lambda.param_kind == LambdaParamKind::Implicit {
        for param in lambda.params.iter_mut() {
            param.sym = None;
            if let Some(te) = param.var_type.as_mut() {
                te.ty = None;
            }
        }
    }
    match &mut lambda.body {
        LambdaBody::Expr(body) => {
            let is_stmt = tree_info::is_statement_expression(body);
            let may_be_void = matches!(body.kind, ExprKind::Invoke(_));
            if (void_result && !is_stmt) || (!void_result && may_be_void) {
                wrap_synthetic(body);
            }
        }
        LambdaBody::Block(block) => {
            let mut patcher = ReturnPatcher { void_result };
            patcher.visit_block_mut(block);
            if !void_result && tree_info::stats_complete_normally(&block.statements) {
                block.statements.push(Stmt::Return(ReturnStmt {
                    expr: Some(Expr::default()),
                    span: Span::default(),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TreeMaker;

    #[test]
    fn rollback_removes_patches() {
        let make = TreeMaker::new();
        let body = make.call("run", vec![]);
        let mut lambda = make.lambda_implicit_block(&["x"], vec![make.exec(body), make.ret_void()]);
        let original = format!("{:?}", lambda.kind);
        if let ExprKind::Lambda(l) = &mut lambda.kind {
            patch_lambda(l, false);
            let LambdaBody::Block(b) = &l.body else { panic!("block body") };
            assert_eq!(b.statements.len(), 2);
            assert!(matches!(&b.statements[1], Stmt::Return(r) if r.expr.as_ref().map(is_placeholder) == Some(true)));
        }
        let mut call = make.call("apply", vec![lambda, Expr::default()]);
        Rollback.visit_expr_mut(&mut call);
        let ExprKind::Invoke(inv) = &call.kind else { panic!("invocation") };
        assert_eq!(inv.args.len(), 1);
        assert_eq!(format!("{:?}", inv.args[0].kind), original);
    }

    #[test]
    fn void_lambdas_wrap_value_bodies() {
        let make = TreeMaker::new();
        let mut lambda = make.lambda_implicit(&["x"], make.int(1));
        if let ExprKind::Lambda(l) = &mut lambda.kind {
            patch_lambda(l, true);
            let LambdaBody::Expr(body) = &l.body else { panic!("expression body") };
            assert!(tree_info::is_synthetic(body));
        }
        Rollback.visit_expr_mut(&mut lambda);
        let ExprKind::Lambda(l) = &lambda.kind else { panic!("lambda") };
        let LambdaBody::Expr(body) = &l.body else { panic!("expression body") };
        assert!(matches!(body.kind, ExprKind::Literal(_)));
    }
}
