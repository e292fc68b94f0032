//! ArgumentAttr - deferred attribution of poly expression arguments
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.ArgumentAttr` together
//! with the parts of `DeferredAttr` it relies on. A poly expression in
//! argument position cannot be typed before the invoked method is known.
//! It is attributed once speculatively, and what overload resolution needs
//! to know about it is kept as an [`ArgShape`]. The argument's type is
//! then a [`Type::Deferred`] handle; [`SemanticAnalyzer::check_deferred`]
//! answers "is this argument compatible with target T" for as many
//! targets as resolution asks about, caching each answer.
//!
//! Handles are cached by source position so that re-attributing the same
//! invocation reuses the speculative work instead of repeating it.

use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use super::infer::{self, Bounds};
use super::SemanticAnalyzer;
use crate::ast::{tree_info, Expr, ExprKind, LambdaParamKind, Pos, TreeDiffer};
use crate::common::diag::{DeferredDiagnostics, DiagArg, DiagKind, Diagnostic};
use crate::common::env::{Env, ResultInfo};
use crate::common::types::{DeferredId, MethodType, Type};
use crate::error::Result;
use crate::internal_error;

/// What overload checking needs to know about a speculatively attributed
/// poly argument
#[derive(Debug, Clone)]
pub(crate) enum ArgShape {
    Parens(Box<ArgShape>),
    Conditional {
        then: Box<ArgShape>,
        otherwise: Box<ArgShape>,
    },
    /// Switch expression; one shape per `yield` value
    Switch { yields: Vec<ArgShape> },
    ExplicitLambda { params: Vec<Type>, body: LambdaShape },
    /// Parameter types come from the target, so the body is attributed
    /// anew for each target
    ImplicitLambda { tree: Rc<Expr>, arity: usize },
    /// Expression whose type does not depend on the target
    Standalone(Type),
    /// Invocation or instance creation whose type may still be partial
    ResolvedMethod(Type),
}

#[derive(Debug, Clone)]
pub(crate) enum LambdaShape {
    Expr { ty: Type, is_stmt: bool },
    Block {
        /// Type of each `return` value, `None` for a bare `return;`
        returns: Vec<Option<Type>>,
        can_complete: bool,
    },
}

/// Outcome of checking a deferred argument against one target
#[derive(Debug, Clone, Default)]
pub(crate) struct CheckResult {
    pub ok: bool,
    /// Why the check failed
    pub diag: Option<Diagnostic>,
    /// Bounds for inference variables of the enclosing invocation
    pub bounds: Bounds,
}

impl CheckResult {
    fn success(bounds: Bounds) -> Self {
        Self {
            ok: true,
            diag: None,
            bounds,
        }
    }

    fn failure(diag: Diagnostic) -> Self {
        Self {
            ok: false,
            diag: Some(diag),
            bounds: Bounds::new(),
        }
    }

    fn and(mut self, other: CheckResult) -> Self {
        if !other.ok {
            return other;
        }
        self.bounds.extend(other.bounds);
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DeferredArg {
    pub pos: Pos,
    /// The argument as first seen, unattributed
    pub tree: Rc<Expr>,
    pub shape: ArgShape,
    pub env: Env,
    checks: HashMap<(Type, bool), CheckResult>,
}

/// Deferred arguments of the calls being resolved. An entry lives from the
/// first attribution of its argument until the call is committed or fails.
#[derive(Debug, Default)]
pub struct DeferredAttrState {
    args: HashMap<DeferredId, DeferredArg>,
    next_id: u32,
    cache: HashMap<Pos, DeferredId>,
    /// Positions being attributed speculatively right now
    guard: Vec<Pos>,
}

impl DeferredAttrState {
    /// Number of deferred arguments currently alive
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub(crate) fn get(&self, id: DeferredId) -> Option<&DeferredArg> {
        self.args.get(&id)
    }

    fn insert(&mut self, arg: DeferredArg) -> DeferredId {
        let id = DeferredId(self.next_id);
        self.next_id += 1;
        self.cache.insert(arg.pos, id);
        self.args.insert(id, arg);
        id
    }

    /// Forget the argument cached at `pos`; returns whether there was one
    pub(crate) fn evict(&mut self, pos: Pos) -> bool {
        match self.cache.remove(&pos) {
            Some(id) => {
                if let Some(arg) = self.args.remove(&id) {
                    trace!("ATTR: evicting deferred argument {:?} at {}", id, arg.pos);
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.args.clear();
        self.cache.clear();
        self.guard.clear();
    }
}

/// Whether the type of `expr` in argument position depends on the target
pub(crate) fn is_poly_expression(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Parens(inner) => is_poly_expression(inner),
        ExprKind::Conditional(c) => is_poly_expression(&c.then_expr) || is_poly_expression(&c.else_expr),
        ExprKind::Switch(_) | ExprKind::Lambda(_) | ExprKind::Invoke(_) => true,
        ExprKind::NewClass(nc) => nc.diamond,
        _ => false,
    }
}

impl SemanticAnalyzer {
    /// Attribute the arguments of an invocation. Standalone arguments get
    /// their type; poly arguments get a deferred handle.
    pub(crate) fn attrib_args(&mut self, args: &mut [Expr], env: &Env) -> Result<Vec<Type>> {
        let mut argtypes = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            argtypes.push(self.attrib_arg(arg, env)?);
        }
        Ok(argtypes)
    }

    fn attrib_arg(&mut self, arg: &mut Expr, env: &Env) -> Result<Type> {
        if !is_poly_expression(arg) {
            return self.attrib_expr(arg, env, &ResultInfo::unknown());
        }
        let pos = arg.pos();
        if let Some(&id) = self.deferred.cache.get(&pos) {
            // same argument seen again: keep the shape, use the new env
            if let Some(entry) = self.deferred.args.get_mut(&id) {
                if TreeDiffer::new().expr_equiv(&entry.tree, arg) {
                    entry.env = env.clone();
                    return Ok(Type::Deferred(id));
                }
                trace!("ATTR: argument at {} was rewritten, attributing again", pos);
            }
            self.deferred.evict(pos);
        }
        if self.deferred.guard.contains(&pos) {
            trace!("ATTR: recursive speculative attribution at {}", pos);
            return Ok(Type::Error);
        }
        let tree = Rc::new(arg.clone());
        self.deferred.guard.push(pos);
        let shape = self.with_local_cache(|sa| sa.build_shape(arg, env));
        self.deferred.guard.pop();
        let shape = shape?;
        let id = self.deferred.insert(DeferredArg {
            pos,
            tree,
            shape,
            env: env.clone(),
            checks: HashMap::new(),
        });
        trace!("ATTR: deferred argument {:?} at {}", id, pos);
        Ok(Type::Deferred(id))
    }

    /// Drop the cached deferred arguments of a call whose resolution is
    /// over
    pub(crate) fn evict_deferred_args(&mut self, args: &[Expr]) {
        for arg in args.iter().filter(|a| is_poly_expression(a)) {
            self.deferred.evict(arg.pos());
        }
    }

    /// Run `f` with an empty argument cache, restoring the current one
    /// afterwards
    pub(crate) fn with_local_cache<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.deferred.cache);
        let result = f(self);
        self.deferred.cache = saved;
        result
    }

    fn build_shape(&mut self, arg: &Expr, env: &Env) -> Result<ArgShape> {
        match &arg.kind {
            ExprKind::Parens(inner) => Ok(ArgShape::Parens(Box::new(self.build_sub_shape(inner, env)?))),
            ExprKind::Conditional(c) => {
                let then = self.build_sub_shape(&c.then_expr, env)?;
                let otherwise = self.build_sub_shape(&c.else_expr, env)?;
                Ok(ArgShape::Conditional {
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                })
            }
            ExprKind::Switch(_) => {
                let (copy, ty, _) = self.attrib_speculative(arg, env, &ResultInfo::unknown())?;
                let ExprKind::Switch(attributed) = &copy.kind else {
                    return Ok(ArgShape::Standalone(ty));
                };
                let mut yields = Vec::new();
                for value in tree_info::switch_yields(attributed) {
                    let shape = if is_poly_expression(&value) {
                        self.build_shape(&value, env)?
                    } else {
                        ArgShape::Standalone(value.ty())
                    };
                    yields.push(shape);
                }
                Ok(ArgShape::Switch { yields })
            }
            ExprKind::Lambda(lambda) if lambda.param_kind == LambdaParamKind::Implicit => Ok(ArgShape::ImplicitLambda {
                tree: Rc::new(arg.clone()),
                arity: lambda.params.len(),
            }),
            ExprKind::Lambda(_) => {
                let mut copy = arg.clone();
                let ExprKind::Lambda(lambda) = &mut copy.kind else {
                    return Err(internal_error!("building a lambda argument", "lambda changed shape"));
                };
                let spec_env = env.speculative();
                let (result, _) = self.speculatively(|sa| {
                    let mut params = Vec::with_capacity(lambda.params.len());
                    for param in lambda.params.iter_mut() {
                        let ty = match param.var_type.as_mut() {
                            Some(t) => {
                                let ty = sa.attrib_type(t, &spec_env)?;
                                t.ty = Some(ty.clone());
                                ty
                            }
                            None => Type::Error,
                        };
                        params.push(ty);
                    }
                    let body = sa.attrib_lambda_body(lambda, &spec_env, &params, None)?;
                    Ok((params, body))
                });
                for c in tree_info::declared_classes_in_expr(&copy) {
                    self.unenter_class(c);
                }
                let (params, body) = result?;
                Ok(ArgShape::ExplicitLambda { params, body })
            }
            ExprKind::Invoke(_) | ExprKind::NewClass(_) => {
                let (_, ty, _) = self.attrib_speculative(arg, env, &ResultInfo::method_arg(Type::None, true))?;
                if ty.is_partial() {
                    Ok(ArgShape::ResolvedMethod(ty))
                } else {
                    Ok(ArgShape::Standalone(ty))
                }
            }
            _ => {
                let (_, ty, _) = self.attrib_speculative(arg, env, &ResultInfo::unknown())?;
                Ok(ArgShape::Standalone(ty))
            }
        }
    }

    fn build_sub_shape(&mut self, expr: &Expr, env: &Env) -> Result<ArgShape> {
        if is_poly_expression(expr) {
            return self.build_shape(expr, env);
        }
        let (_, ty, _) = self.attrib_speculative(expr, env, &ResultInfo::unknown())?;
        Ok(ArgShape::Standalone(ty))
    }

    /// Attribute a copy of `expr`; diagnostics are buffered and returned,
    /// classes declared in the copy are removed again
    pub(crate) fn attrib_speculative(
        &mut self,
        expr: &Expr,
        env: &Env,
        ri: &ResultInfo,
    ) -> Result<(Expr, Type, DeferredDiagnostics)> {
        let mut copy = expr.clone();
        let spec_env = env.speculative();
        let saved = std::mem::take(&mut self.bindings);
        self.log.push_deferred();
        let result = self.attrib_expr(&mut copy, &spec_env, ri);
        let diags = self.log.pop_deferred();
        self.bindings = saved;
        for c in tree_info::declared_classes_in_expr(&copy) {
            self.unenter_class(c);
        }
        let ty = result?;
        Ok((copy, ty, diags))
    }

    /// Run `f` with diagnostics buffered and match bindings saved
    fn speculatively<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> (Result<T>, DeferredDiagnostics) {
        let saved = std::mem::take(&mut self.bindings);
        self.log.push_deferred();
        let result = f(self);
        let diags = self.log.pop_deferred();
        self.bindings = saved;
        (result, diags)
    }

    /// Check deferred argument `id` against `target`
    pub(crate) fn check_deferred(&mut self, _env: &Env, id: DeferredId, target: &Type, loose: bool) -> Result<CheckResult> {
        let key = (target.clone(), loose);
        let Some(entry) = self.deferred.get(id) else {
            return Err(internal_error!("checking a deferred argument", "unknown handle {:?}", id));
        };
        if let Some(done) = entry.checks.get(&key) {
            return Ok(done.clone());
        }
        let shape = entry.shape.clone();
        let arg_env = entry.env.clone();
        let result = self.check_shape(&shape, &arg_env, target, loose)?;
        trace!("ATTR: deferred {:?} against {:?}: {}", id, target, result.ok);
        if let Some(entry) = self.deferred.args.get_mut(&id) {
            entry.checks.insert(key, result.clone());
        }
        Ok(result)
    }

    fn check_shape(&mut self, shape: &ArgShape, env: &Env, target: &Type, loose: bool) -> Result<CheckResult> {
        match shape {
            ArgShape::Parens(inner) => self.check_shape(inner, env, target, loose),
            ArgShape::Conditional { then, otherwise } => {
                if target.is_void() {
                    return Ok(CheckResult::failure(Diagnostic::fragment(
                        DiagKind::NoConformAssignExists,
                        vec![DiagArg::Name("<conditional>".into()), Type::Void.into()],
                    )));
                }
                let first = self.check_shape(then, env, target, loose)?;
                if !first.ok {
                    return Ok(first);
                }
                let second = self.check_shape(otherwise, env, target, loose)?;
                Ok(first.and(second))
            }
            ArgShape::Switch { yields } => {
                let mut result = CheckResult::success(Bounds::new());
                for value in yields {
                    result = result.and(self.check_shape(value, env, target, loose)?);
                    if !result.ok {
                        break;
                    }
                }
                Ok(result)
            }
            ArgShape::Standalone(ty) => Ok(self.check_compatible(ty, target, loose)),
            ArgShape::ResolvedMethod(ty) => Ok(self.check_compatible(ty, target, loose)),
            ArgShape::ExplicitLambda { params, body } => {
                let desc = match self.lambda_descriptor(target) {
                    Ok(desc) => desc,
                    Err(diag) => return Ok(CheckResult::failure(diag)),
                };
                if desc.params.len() != params.len() {
                    return Ok(CheckResult::failure(Diagnostic::fragment(
                        DiagKind::IncompatibleArgTypesInLambda,
                        vec![],
                    )));
                }
                let mut bounds = Bounds::new();
                {
                    let types = self.types();
                    for (declared, expected) in params.iter().zip(&desc.params) {
                        if expected.has_undet() {
                            infer::collect_bounds(&types, declared, expected, &mut bounds);
                        } else if !types.is_same_type(declared, expected) && !types.is_erroneous(declared) {
                            return Ok(CheckResult::failure(Diagnostic::fragment(
                                DiagKind::IncompatibleArgTypesInLambda,
                                vec![],
                            )));
                        }
                    }
                }
                Ok(CheckResult::success(bounds).and(self.check_lambda_shape(body, &desc.ret, loose)))
            }
            ArgShape::ImplicitLambda { tree, arity } => {
                let desc = match self.lambda_descriptor(target) {
                    Ok(desc) => desc,
                    Err(diag) => return Ok(CheckResult::failure(diag)),
                };
                if desc.params.len() != *arity {
                    return Ok(CheckResult::failure(Diagnostic::fragment(
                        DiagKind::IncompatibleArgTypesInLambda,
                        vec![],
                    )));
                }
                let params: Vec<Type> = {
                    let types = self.types();
                    desc.params
                        .iter()
                        .map(|p| if p.has_undet() { types.erasure(p) } else { p.clone() })
                        .collect()
                };
                let mut copy = (**tree).clone();
                let ExprKind::Lambda(lambda) = &mut copy.kind else {
                    return Err(internal_error!("checking a deferred argument", "implicit lambda changed shape"));
                };
                let spec_env = env.speculative();
                let (shape, diags) = self.speculatively(|sa| {
                    sa.with_local_cache(|sa| sa.attrib_lambda_body(lambda, &spec_env, &params, None))
                });
                for c in tree_info::declared_classes_in_expr(&copy) {
                    self.unenter_class(c);
                }
                let shape = shape?;
                if let Some(error) = diags.first_error() {
                    return Ok(CheckResult::failure(error.clone()));
                }
                Ok(self.check_lambda_shape(&shape, &desc.ret, loose))
            }
        }
    }

    /// Function type of `target`, or why a lambda cannot have that type
    pub(crate) fn lambda_descriptor(&self, target: &Type) -> std::result::Result<MethodType, Diagnostic> {
        let types = self.types();
        if types.is_erroneous(target) || target.is_none() {
            return Err(Diagnostic::fragment(DiagKind::NotAFunctionalIntf, vec![target.clone().into()]));
        }
        types
            .find_descriptor(target)
            .ok_or_else(|| Diagnostic::fragment(DiagKind::NotAFunctionalIntf, vec![target.clone().into()]))
    }

    fn check_lambda_shape(&self, shape: &LambdaShape, ret: &Type, loose: bool) -> CheckResult {
        let bad_return = |reason: Diagnostic| {
            CheckResult::failure(Diagnostic::fragment(
                DiagKind::IncompatibleRetTypeInLambda,
                vec![DiagArg::Fragment(Box::new(reason))],
            ))
        };
        match shape {
            LambdaShape::Expr { ty, is_stmt } => {
                if ret.is_void() {
                    if *is_stmt || self.types().is_erroneous(ty) {
                        return CheckResult::success(Bounds::new());
                    }
                    return bad_return(Diagnostic::fragment(DiagKind::UnexpectedRetVal, vec![]));
                }
                if ty.is_void() {
                    return bad_return(Diagnostic::fragment(DiagKind::MissingRetVal, vec![ret.clone().into()]));
                }
                let result = self.check_compatible(ty, ret, loose);
                match result.diag {
                    Some(reason) if !result.ok => bad_return(reason),
                    _ => result,
                }
            }
            LambdaShape::Block { returns, can_complete } => {
                if ret.is_void() {
                    if returns.iter().any(Option::is_some) {
                        return bad_return(Diagnostic::fragment(DiagKind::UnexpectedRetVal, vec![]));
                    }
                    return CheckResult::success(Bounds::new());
                }
                if *can_complete || returns.iter().any(Option::is_none) {
                    return bad_return(Diagnostic::fragment(DiagKind::MissingRetVal, vec![ret.clone().into()]));
                }
                let mut result = CheckResult::success(Bounds::new());
                for ty in returns.iter().flatten() {
                    let checked = self.check_compatible(ty, ret, loose);
                    if !checked.ok {
                        return match checked.diag {
                            Some(reason) => bad_return(reason),
                            None => checked,
                        };
                    }
                    result = result.and(checked);
                }
                result
            }
        }
    }

    /// Check a type already computed for an argument against `target`.
    /// Partial method types are completed; inference variables of the
    /// enclosing invocation in `target` receive bounds.
    fn check_compatible(&self, found: &Type, target: &Type, loose: bool) -> CheckResult {
        let types = self.types();
        if let Type::Partial(partial) = found {
            let mut outer = Bounds::new();
            return match infer::complete_partial(&types, partial, target, loose, &mut outer) {
                Some(_) => CheckResult::success(outer),
                None => CheckResult::failure(Diagnostic::fragment(
                    DiagKind::NoConformAssignExists,
                    vec![(*partial.mtype.ret).clone().into(), target.clone().into()],
                )),
            };
        }
        if target.has_undet() {
            if found.is_void() {
                return CheckResult::failure(Diagnostic::fragment(
                    DiagKind::NoConformAssignExists,
                    vec![found.clone().into(), target.clone().into()],
                ));
            }
            let mut bounds = Bounds::new();
            infer::collect_bounds(&types, found, target, &mut bounds);
            return CheckResult::success(bounds);
        }
        if types.is_convertible(found, target, loose) {
            CheckResult::success(Bounds::new())
        } else {
            CheckResult::failure(Diagnostic::fragment(
                DiagKind::NoConformAssignExists,
                vec![found.clone().into(), target.clone().into()],
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassMember, LambdaBody, Modifier, TreeMaker};
    use crate::config::Config;

    /// Session with `class Host { <members> }` entered; returns the class env
    fn entered(m: &TreeMaker, members: Vec<ClassMember>) -> (SemanticAnalyzer, Vec<crate::ast::CompilationUnit>, Env) {
        let mut sa = SemanticAnalyzer::new(Config::default());
        let mut units = vec![m.unit("Host.java", None, vec![], vec![m.class(&[], "Host", members)])];
        sa.enter_units(&mut units).unwrap();
        let host = sa.symtab.class_by_flat_name("Host").unwrap();
        let env = sa.symtab.sym(host).class_details().and_then(|d| d.env.clone()).unwrap();
        (sa, units, env)
    }

    #[test]
    fn same_argument_reuses_its_handle() {
        let m = TreeMaker::new();
        let (mut sa, _, env) = entered(&m, vec![]);
        let arg = m.lambda_implicit(&["x"], m.ident("x"));

        let first = sa.attrib_arg(&mut arg.clone(), &env).unwrap();
        assert!(matches!(first, Type::Deferred(_)));
        assert_eq!(sa.attrib_arg(&mut arg.clone(), &env).unwrap(), first);
        assert_eq!(sa.deferred_args(), 1);
    }

    #[test]
    fn local_cache_is_restored() {
        let m = TreeMaker::new();
        let (mut sa, _, env) = entered(&m, vec![]);
        let arg = m.lambda_implicit(&["x"], m.ident("x"));
        let outer = sa.attrib_arg(&mut arg.clone(), &env).unwrap();

        let inner = sa.with_local_cache(|sa| sa.attrib_arg(&mut arg.clone(), &env)).unwrap();
        assert_ne!(inner, outer);
        assert_eq!(sa.attrib_arg(&mut arg.clone(), &env).unwrap(), outer);
    }

    #[test]
    fn rewritten_argument_replaces_the_entry() {
        let m = TreeMaker::new();
        let (mut sa, _, env) = entered(&m, vec![]);
        let arg = m.lambda_implicit(&["x"], m.ident("x"));
        let before = sa.attrib_arg(&mut arg.clone(), &env).unwrap();

        let mut changed = arg.clone();
        if let ExprKind::Lambda(lambda) = &mut changed.kind {
            lambda.body = LambdaBody::Expr(Box::new(m.int(1)));
        }
        let after = sa.attrib_arg(&mut changed, &env).unwrap();
        assert_ne!(after, before);
        assert_eq!(sa.deferred_args(), 1);
    }

    #[test]
    fn evicted_argument_is_attributed_again() {
        let m = TreeMaker::new();
        let (mut sa, _, env) = entered(&m, vec![]);
        let arg = m.lambda_implicit(&["x"], m.ident("x"));
        let before = sa.attrib_arg(&mut arg.clone(), &env).unwrap();

        sa.evict_deferred_args(std::slice::from_ref(&arg));
        assert_eq!(sa.deferred_args(), 0);
        let after = sa.attrib_arg(&mut arg.clone(), &env).unwrap();
        assert_ne!(after, before);
    }

    #[test]
    fn resolved_calls_leave_nothing_cached() {
        let m = TreeMaker::new();
        let run = m.method(
            &[Modifier::Static],
            m.void_type(),
            "run",
            vec![m.param(m.named("Runnable"), "r")],
            vec![],
        );
        let body = vec![
            m.exec(m.call("run", vec![m.lambda_implicit_block(&[], vec![])])),
            m.exec(m.call("run", vec![m.lambda_implicit(&[], m.call("test", vec![]))])),
        ];
        let test = m.method(&[], m.void_type(), "test", vec![], body);
        let (mut sa, mut units, _) = entered(&m, vec![run, test]);
        sa.attrib_class(&mut units[0].type_decls[0]).unwrap();
        assert!(!sa.log.has_errors());
        assert_eq!(sa.deferred_args(), 0);
    }
}
