//! Attr phase - type checking of expressions, statements and class bodies
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.Attr`. Attribution
//! walks the trees of each class in place: identifiers and selections get
//! their symbols, every expression its type, constant expressions their
//! folded value. Each expression is checked against a [`ResultInfo`]
//! describing what the context expects. Method arguments that are poly
//! expressions are deferred (see `argument_attr`) until overload
//! resolution has picked a target type for them.

use std::collections::HashSet;

use log::{debug, trace};

use super::argument_attr::{is_poly_expression, LambdaShape};
use super::infer;
use super::match_bindings::{MatchBindings, MatchBindingsComputer};
use super::operators::{binary_promotion, OperatorSymbol};
use super::resolve::{Applicable, MethodCandidate, MethodResolution};
use super::SemanticAnalyzer;
use crate::ast::{
    tree_info, BinaryExpr, BinaryOp, Block, CaseKind, CaseLabel, ClassDecl, ClassMember, ConditionalExpr, EnumConstant,
    Expr, ExprKind, ExprStmt, ForEachStmt, IdentExpr, IfStmt, InstanceOfExpr, InstanceOfTarget, InvokeExpr, LambdaBody,
    LambdaExpr, LambdaParamKind, Literal, MethodDecl, Modifier, NewArrayExpr, NewClassExpr, Pattern, PatternKind, Pos,
    ReturnStmt, SelectExpr, Span, Stmt, Switch, TypeExpr, TypeExprKind, UnaryExpr, UnaryOp, VarDecl, YieldStmt,
};
use crate::common::const_fold::{int_value, ConstFold};
use crate::common::diag::{DiagArg, DiagKind, Diagnostic};
use crate::common::env::{CheckMode, Env, EnvKind, KindSelector, LintState, ResultInfo};
use crate::common::flags::Flags;
use crate::common::attribute::AttrValue;
use crate::common::symbol::{ConstValue, SymbolDetails, SymbolId, SymbolKind};
use crate::common::types::{MethodType, PartialType, Type, TypeTag, Types, WildcardType};
use crate::config::LintCategory;
use crate::error::Result;

/// Result info for the qualifier of a selection: a value, a type or a
/// package are all acceptable
fn qualifier_info() -> ResultInfo {
    ResultInfo {
        kind: KindSelector::ValueOrType,
        ..ResultInfo::unknown()
    }
}

fn boolean_type() -> Type {
    Type::Prim(TypeTag::Boolean)
}

fn literal_type(types: &Types, lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Prim(TypeTag::Int),
        Literal::Long(_) => Type::Prim(TypeTag::Long),
        Literal::Float(_) => Type::Prim(TypeTag::Float),
        Literal::Double(_) => Type::Prim(TypeTag::Double),
        Literal::Char(_) => Type::Prim(TypeTag::Char),
        Literal::Boolean(_) => boolean_type(),
        Literal::String(_) => types.string_type(),
        Literal::Null => Type::Null,
    }
}

/// Convert a constant to the type of the variable or operand it flows into
fn coerce_constant(types: &Types, lit: &Literal, ty: &Type) -> Option<Literal> {
    match ty.tag() {
        Some(tag) => ConstFold::coerce(lit, tag),
        None if types.is_string(ty) && matches!(lit, Literal::String(_)) => Some(lit.clone()),
        None => None,
    }
}

fn fold_unary(op: &OperatorSymbol, operand: &Literal) -> Option<Literal> {
    let operand = coerce_operand(operand, op.params.first()?)?;
    let folded = ConstFold::fold1(op.opcode, &operand)?;
    coerce_operand(&folded, &op.ret)
}

fn fold_binary(op: &OperatorSymbol, left: &Literal, right: &Literal) -> Option<Literal> {
    let left = coerce_operand(left, op.params.first()?)?;
    let right = coerce_operand(right, op.params.get(1)?)?;
    let folded = ConstFold::fold2(op.opcode, &left, &right)?;
    coerce_operand(&folded, &op.ret)
}

fn coerce_operand(lit: &Literal, ty: &Type) -> Option<Literal> {
    match ty.tag() {
        Some(tag) => ConstFold::coerce(lit, tag),
        None => Some(lit.clone()),
    }
}

/// Whether an int constant fits a narrower integral type
fn fits_in(value: i32, tag: TypeTag) -> bool {
    match tag {
        TypeTag::Byte => (i8::MIN as i32..=i8::MAX as i32).contains(&value),
        TypeTag::Short => (i16::MIN as i32..=i16::MAX as i32).contains(&value),
        TypeTag::Char => (0..=u16::MAX as i32).contains(&value),
        _ => false,
    }
}

/// Assignment of an int constant to byte, short, char (or their boxes)
fn is_narrowable_constant(types: &Types, found: &Type, pt: &Type, constant: Option<&Literal>) -> bool {
    let Some(value) = constant.and_then(int_value) else {
        return false;
    };
    if !matches!(found.tag(), Some(TypeTag::Byte | TypeTag::Short | TypeTag::Char | TypeTag::Int)) {
        return false;
    }
    let target = match pt.tag() {
        Some(tag) => tag,
        None => match types.unboxed_tag(pt) {
            Some(tag @ (TypeTag::Byte | TypeTag::Short | TypeTag::Char)) => tag,
            _ => return false,
        },
    };
    fits_in(value, target)
}

fn is_variable(expr: &Expr) -> bool {
    matches!(
        tree_info::skip_parens(expr).kind,
        ExprKind::Ident(_) | ExprKind::Select(_) | ExprKind::Index(_)
    )
}

impl SemanticAnalyzer {
    // ---- helpers ----

    fn computer(&mut self) -> MatchBindingsComputer<'_> {
        MatchBindingsComputer::new(&mut self.symtab, &mut self.log)
    }

    /// Symbol owning variables declared in `env`
    pub(crate) fn scope_owner(&self, env: &Env) -> SymbolId {
        env.enclosing_method
            .or(env.enclosing_class)
            .unwrap_or(self.symtab.root_package)
    }

    /// `env` extended by a fresh scope holding `bindings`
    pub(crate) fn env_with_bindings(&mut self, env: &Env, bindings: &[SymbolId]) -> Env {
        if bindings.is_empty() {
            return env.clone();
        }
        let owner = self.scope_owner(env);
        let scope = self.symtab.new_scope(owner, Some(env.info.scope));
        for b in bindings {
            self.symtab.enter(scope, *b);
        }
        env.dup_with_scope(env.kind, scope)
    }

    /// Report a local variable redeclared within its method, lambda or
    /// initializer; returns whether `name` is still free
    fn check_unique_local(&mut self, env: &Env, name: &str, span: Span) -> bool {
        let mut scope = Some(env.info.scope);
        while let Some(s) = scope {
            if self.class_of_env_scope(s).is_some() {
                break;
            }
            let clash = self
                .symtab
                .scope(s)
                .lookup(name)
                .iter()
                .any(|sym| self.symtab.sym(*sym).kind == SymbolKind::Var);
            if clash {
                let owner = self.scope_owner(env);
                self.log.error(
                    DiagKind::AlreadyDefined,
                    span,
                    vec!["variable".into(), name.into(), owner.into()],
                );
                return false;
            }
            scope = self.symtab.scope(s).next;
        }
        true
    }

    fn location_arg(&self, env: &Env) -> DiagArg {
        env.enclosing_class.unwrap_or(env.toplevel.package).into()
    }

    fn type_of_type_symbol(&self, sym: SymbolId) -> Type {
        match self.symtab.sym(sym).kind {
            SymbolKind::TypeVar => Type::TypeVar(sym),
            SymbolKind::Class if self.symtab.sym(sym).is_erroneous() => Type::Error,
            SymbolKind::Class => Type::class(sym),
            _ => Type::Error,
        }
    }

    fn denotes_type(&self, expr: &Expr) -> bool {
        tree_info::symbol(tree_info::skip_parens(expr))
            .map(|s| matches!(self.symtab.sym(s).kind, SymbolKind::Class | SymbolKind::TypeVar))
            .unwrap_or(false)
    }

    fn set_const_value(&mut self, v: SymbolId, value: ConstValue) {
        self.symtab.sym_mut(v).details = SymbolDetails::Var { const_value: value };
    }

    /// Constant value of final variable `v`, evaluating a pending
    /// initializer on first use
    pub(crate) fn var_constant(&mut self, v: SymbolId) -> Result<Option<Literal>> {
        let (init, env) = match &self.symtab.sym(v).details {
            SymbolDetails::Var {
                const_value: ConstValue::Value(lit),
            } => return Ok(Some(lit.clone())),
            SymbolDetails::Var {
                const_value: ConstValue::Pending { init, env },
            } => (init.clone(), env.clone()),
            _ => return Ok(None),
        };
        trace!("ATTR: evaluating constant {}", self.symtab.sym(v).name);
        self.set_const_value(v, ConstValue::Evaluating);
        let ty = self.symtab.sym(v).ty.clone();
        let mut copy = (*init).clone();
        let saved = std::mem::take(&mut self.bindings);
        self.log.push_deferred();
        let result = self.attrib_expr(&mut copy, &env.speculative(), &ResultInfo::value(ty.clone()));
        // diagnostics come again when the declaration itself is attributed
        self.log.pop_deferred();
        self.bindings = saved;
        for c in tree_info::declared_classes_in_expr(&copy) {
            self.unenter_class(c);
        }
        result?;
        let value = copy
            .constant
            .as_ref()
            .and_then(|c| coerce_constant(&self.types(), c, &ty));
        self.set_const_value(v, value.clone().map(ConstValue::Value).unwrap_or_default());
        Ok(value)
    }

    /// Lint settings in force inside declaration `sym`
    fn lint_for(&self, base: &LintState, sym: SymbolId) -> LintState {
        let symbol = self.symtab.sym(sym);
        let mut categories: Vec<LintCategory> = symbol
            .attribute(self.symtab.predef.suppress_warnings)
            .and_then(|c| c.member("value"))
            .map(|v| {
                v.as_array()
                    .iter()
                    .filter_map(|x| match x {
                        AttrValue::Constant(Literal::String(s)) => LintCategory::from_option(s),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        if symbol.flags.contains(Flags::DEPRECATED) {
            categories.push(LintCategory::Deprecation);
        }
        if categories.is_empty() {
            base.clone()
        } else {
            base.suppress(&categories)
        }
    }

    // ---- types ----

    /// Attribute a type tree; the cached type is returned when present
    pub(crate) fn attrib_type(&mut self, t: &TypeExpr, env: &Env) -> Result<Type> {
        if let Some(ty) = &t.ty {
            return Ok(ty.clone());
        }
        match &t.kind {
            TypeExprKind::Primitive(tag) => Ok(Type::Prim(*tag)),
            TypeExprKind::Void => Ok(Type::Void),
            TypeExprKind::Var => {
                self.log.error(
                    DiagKind::UnexpectedType,
                    t.span,
                    vec!["type".into(), "var".into()],
                );
                Ok(Type::Error)
            }
            TypeExprKind::Array(elem) => Ok(Type::array_of(self.attrib_type(elem, env)?)),
            TypeExprKind::Wildcard { kind, bound } => {
                let bound = match bound {
                    Some(b) => Some(Box::new(self.attrib_type(b, env)?)),
                    None => None,
                };
                Ok(Type::Wildcard(WildcardType { kind: *kind, bound }))
            }
            TypeExprKind::Annotated { underlying, .. } => self.attrib_type(underlying, env),
            TypeExprKind::Named { name, args } => {
                let base = self.resolve_type_name(name, t.span, env)?;
                if args.is_empty() || self.types().is_erroneous(&base) {
                    return Ok(base);
                }
                let Some(c) = base.class_sym() else {
                    self.log
                        .error(DiagKind::UnexpectedType, t.span, vec!["class".into(), base.into()]);
                    return Ok(Type::Error);
                };
                let mut targs = Vec::with_capacity(args.len());
                for a in args {
                    targs.push(self.attrib_type(a, env)?);
                }
                Ok(Type::generic(c, targs))
            }
        }
    }

    /// Attribute a type tree and remember the result in it
    pub(crate) fn attrib_type_mut(&mut self, t: &mut TypeExpr, env: &Env) -> Result<Type> {
        let ty = self.attrib_type(t, env)?;
        t.ty = Some(ty.clone());
        Ok(ty)
    }

    /// Simple names go through scope lookup; dotted names start either
    /// from a type in scope or from the longest loadable class prefix
    fn resolve_type_name(&mut self, name: &str, span: Span, env: &Env) -> Result<Type> {
        let parts: Vec<&str> = name.split('.').collect();
        if let Some(first) = self.find_type(env, parts[0])? {
            return self.select_member_types(first, &parts[1..], span, env);
        }
        for k in 1..parts.len() {
            let prefix = parts[..=k].join(".");
            if let Some(c) = self.load_class(&prefix, span)? {
                return self.select_member_types(c, &parts[k + 1..], span, env);
            }
        }
        if parts.len() > 1 {
            let package = parts[..parts.len() - 1].join(".");
            self.log.error(DiagKind::DoesntExist, span, vec![package.into()]);
        } else {
            let location = self.location_arg(env);
            self.log.error(
                DiagKind::CantResolveLocation,
                span,
                vec!["class".into(), name.into(), location],
            );
        }
        Ok(Type::Error)
    }

    fn select_member_types(&mut self, start: SymbolId, rest: &[&str], span: Span, env: &Env) -> Result<Type> {
        let mut current = start;
        for part in rest {
            match self.find_member_type(current, part)? {
                Some(member) => current = member,
                None => {
                    self.log.error(
                        DiagKind::CantResolveLocation,
                        span,
                        vec!["class".into(), (*part).into(), current.into()],
                    );
                    return Ok(Type::Error);
                }
            }
        }
        self.check_use(env, current, span);
        Ok(self.type_of_type_symbol(current))
    }

    // ---- expressions ----

    /// Attribute `expr` and check its type against `ri`.
    ///
    /// The returned type is also stored in the tree. Match bindings the
    /// expression introduces are left in `self.bindings`.
    pub(crate) fn attrib_expr(&mut self, expr: &mut Expr, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let span = expr.span;
        let found = self.attrib_tree(expr, env, ri)?;
        let bindings = std::mem::take(&mut self.bindings);
        self.bindings = self.computer().finish_bindings(expr, bindings);
        let constant = expr.constant.clone();
        let checked = self.check_type(found, ri, span, constant.as_ref());
        expr.ty = Some(checked.clone());
        Ok(checked)
    }

    fn check_type(&mut self, found: Type, ri: &ResultInfo, span: Span, constant: Option<&Literal>) -> Type {
        if ri.kind != KindSelector::Value || ri.pt.is_none() || found.is_none() {
            return found;
        }
        let ok = {
            let types = Types::new(&self.symtab);
            if types.is_erroneous(&found) || types.is_erroneous(&ri.pt) || found.is_partial() || found.is_deferred() {
                return found;
            }
            match ri.mode {
                CheckMode::Check => {
                    types.is_assignable(&found, &ri.pt) || is_narrowable_constant(&types, &found, &ri.pt, constant)
                }
                CheckMode::MethodArg => types.is_convertible(&found, &ri.pt, ri.loose),
            }
        };
        if ok {
            return found;
        }
        self.log.error(
            DiagKind::IncompatibleTypes,
            span,
            vec![found.into(), ri.pt.clone().into()],
        );
        Type::Error
    }

    fn attrib_tree(&mut self, expr: &mut Expr, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let Expr {
            kind, span, constant, ..
        } = expr;
        let span = *span;
        match kind {
            ExprKind::Literal(lit) => {
                let ty = literal_type(&self.types(), lit);
                if !matches!(lit, Literal::Null) {
                    *constant = Some(lit.clone());
                }
                Ok(ty)
            }
            ExprKind::Ident(id) => self.attrib_ident(id, span, constant, env, ri),
            ExprKind::Select(sel) => self.attrib_select(sel, span, constant, env, ri),
            ExprKind::Parens(inner) => {
                let ty = self.attrib_expr(inner, env, ri)?;
                *constant = inner.constant.clone();
                Ok(ty)
            }
            ExprKind::This => {
                let Some(c) = env.enclosing_class else {
                    return Ok(Type::Error);
                };
                if env.is_static() || env.info.is_self_call {
                    self.log.error(
                        DiagKind::NonStaticCantBeRef,
                        span,
                        vec!["variable".into(), "this".into()],
                    );
                }
                Ok(self.symtab.sym(c).ty.clone())
            }
            ExprKind::Unary(u) => self.attrib_unary(u, span, constant, env),
            ExprKind::Binary(b) => self.attrib_binary(b, span, constant, env),
            ExprKind::Assign(a) => {
                let target = self.attrib_expr(&mut a.target, env, &ResultInfo::unknown())?;
                if !is_variable(&a.target) && !self.types().is_erroneous(&target) {
                    self.log.error(
                        DiagKind::UnexpectedType,
                        a.target.span,
                        vec!["variable".into(), "value".into()],
                    );
                }
                self.attrib_expr(&mut a.value, env, &ResultInfo::value(target.clone()))?;
                Ok(target)
            }
            ExprKind::CompoundAssign(c) => {
                let target = self.attrib_expr(&mut c.target, env, &ResultInfo::unknown())?;
                let value = self.attrib_expr(&mut c.value, env, &ResultInfo::unknown())?;
                if self.types().is_erroneous(&target) || self.types().is_erroneous(&value) {
                    return Ok(Type::Error);
                }
                let id = self
                    .operators
                    .resolve_binary(&self.symtab, &mut self.log, span, c.op, &target, &value);
                c.operator = Some(id);
                let op = self.operators.get(id);
                if !op.is_noop() && !self.types().is_castable(&op.ret, &target) {
                    self.log.error(
                        DiagKind::IncompatibleTypes,
                        span,
                        vec![op.ret.clone().into(), target.clone().into()],
                    );
                }
                Ok(target)
            }
            ExprKind::Conditional(c) => self.attrib_conditional(c, span, constant, env, ri),
            ExprKind::InstanceOf(io) => self.attrib_instance_of(io, span, env),
            ExprKind::Cast(c) => {
                let target = self.attrib_type_mut(&mut c.target_type, env)?;
                let is_lambda = matches!(tree_info::skip_parens(&c.expr).kind, ExprKind::Lambda(_));
                let inner_ri = if is_lambda {
                    ResultInfo::value(target.clone())
                } else {
                    ResultInfo::unknown()
                };
                let found = self.attrib_expr(&mut c.expr, env, &inner_ri)?;
                let types = Types::new(&self.symtab);
                if !is_lambda
                    && !types.is_erroneous(&found)
                    && !types.is_erroneous(&target)
                    && !types.is_castable(&found, &target)
                {
                    self.log.error(
                        DiagKind::IncompatibleTypes,
                        span,
                        vec![found.into(), target.clone().into()],
                    );
                    return Ok(Type::Error);
                }
                if let Some(k) = &c.expr.constant {
                    *constant = coerce_constant(&types, k, &target);
                }
                Ok(target)
            }
            ExprKind::Invoke(inv) => self.attrib_invoke(inv, span, env, ri),
            ExprKind::NewClass(nc) => self.attrib_new_class(nc, span, env, ri),
            ExprKind::NewArray(na) => self.attrib_new_array(na, span, env, ri),
            ExprKind::Index(ix) => {
                let array = self.attrib_expr(&mut ix.array, env, &ResultInfo::unknown())?;
                self.attrib_expr(&mut ix.index, env, &ResultInfo::value(Type::Prim(TypeTag::Int)))?;
                match array {
                    Type::Array(elem) => Ok(*elem),
                    t if self.types().is_erroneous(&t) => Ok(Type::Error),
                    t => {
                        self.log
                            .error(DiagKind::UnexpectedType, span, vec!["array".into(), t.into()]);
                        Ok(Type::Error)
                    }
                }
            }
            ExprKind::Lambda(lambda) => self.attrib_lambda(lambda, span, env, ri),
            ExprKind::Switch(sw) => self.attrib_switch_expr(sw, span, env, ri),
            ExprKind::ClassLit(te) => {
                let t = self.attrib_type_mut(te, env)?;
                let types = self.types();
                if types.is_erroneous(&t) {
                    return Ok(Type::Error);
                }
                let arg = if t.is_void() {
                    Type::class(self.symtab.predef.void_class)
                } else {
                    types.boxed_type_or_type(&t)
                };
                Ok(Type::generic(self.symtab.predef.class, vec![arg]))
            }
            // only meaningful as an annotation element value
            ExprKind::Annotation(_) => Ok(Type::Error),
            ExprKind::Let(l) => {
                let owner = self.scope_owner(env);
                let scope = self.symtab.new_scope(owner, Some(env.info.scope));
                let let_env = env.dup_with_scope(EnvKind::Block, scope);
                for def in l.defs.iter_mut() {
                    self.attrib_stmt(def, &let_env)?;
                }
                self.attrib_expr(&mut l.expr, &let_env, &ResultInfo::unknown())
            }
            ExprKind::Indy(indy) => {
                for arg in indy.args.iter_mut() {
                    self.attrib_expr(arg, env, &ResultInfo::unknown())?;
                }
                Ok(Type::Prim(TypeTag::Int))
            }
            ExprKind::Erroneous(err) => {
                for e in err.exprs.iter_mut() {
                    self.attrib_expr(e, env, &ResultInfo::unknown())?;
                }
                Ok(Type::Error)
            }
        }
    }

    fn attrib_ident(
        &mut self,
        id: &mut IdentExpr,
        span: Span,
        constant: &mut Option<Literal>,
        env: &Env,
        ri: &ResultInfo,
    ) -> Result<Type> {
        let name = id.name.clone();
        if name == "super" {
            let Some(c) = env.enclosing_class else {
                return Ok(Type::Error);
            };
            let types = self.types();
            let this_type = &self.symtab.sym(c).ty;
            return Ok(types.supertype(this_type).unwrap_or_else(|| types.object_type()));
        }
        if matches!(ri.kind, KindSelector::Value | KindSelector::ValueOrType) {
            if let Some(found) = self.find_var(env, &name)? {
                id.sym = Some(found.sym);
                return self.var_reference(found.sym, found.owner_class, span, constant, env);
            }
        }
        if matches!(ri.kind, KindSelector::Type | KindSelector::ValueOrType) {
            if let Some(t) = self.find_type(env, &name)? {
                id.sym = Some(t);
                self.check_use(env, t, span);
                return Ok(self.type_of_type_symbol(t));
            }
        }
        if matches!(ri.kind, KindSelector::Package | KindSelector::ValueOrType)
            && (self.symtab.lookup_package(&name).is_some() || self.provider.has_package(&name))
        {
            let p = self.symtab.enter_package(&name);
            id.sym = Some(p);
            return Ok(Type::Package(p));
        }
        let kind = match ri.kind {
            KindSelector::Value => "variable",
            KindSelector::Type => "class",
            KindSelector::Package => "package",
            KindSelector::ValueOrType => "symbol",
        };
        let location = self.location_arg(env);
        self.log.error(
            DiagKind::CantResolveLocation,
            span,
            vec![kind.into(), name.into(), location],
        );
        Ok(Type::Error)
    }

    fn var_reference(
        &mut self,
        v: SymbolId,
        owner_class: Option<SymbolId>,
        span: Span,
        constant: &mut Option<Literal>,
        env: &Env,
    ) -> Result<Type> {
        let sym = self.symtab.sym(v);
        let (is_static, is_final, name) = (sym.is_static(), sym.flags.contains(Flags::FINAL), sym.name.clone());
        if let Some(c) = owner_class {
            let own_field = env.info.is_self_call && env.enclosing_class == Some(c);
            if !is_static && (self.is_static_context_for(env, c) || own_field) {
                self.log.error(
                    DiagKind::NonStaticCantBeRef,
                    span,
                    vec!["variable".into(), name.into()],
                );
            }
        }
        self.check_use(env, v, span);
        let ty = match owner_class {
            Some(c) => {
                let site = self.symtab.sym(c).ty.clone();
                self.types().member_type(&site, v)
            }
            None => self.symtab.sym(v).ty.clone(),
        };
        if is_final {
            *constant = self.var_constant(v)?;
        }
        Ok(ty)
    }

    fn attrib_select(
        &mut self,
        sel: &mut SelectExpr,
        span: Span,
        constant: &mut Option<Literal>,
        env: &Env,
        ri: &ResultInfo,
    ) -> Result<Type> {
        let name = sel.name.clone();
        let site = self.attrib_expr(&mut sel.target, env, &qualifier_info())?;
        if self.types().is_erroneous(&site) {
            return Ok(Type::Error);
        }
        let target_is_type = self.denotes_type(&sel.target);
        match &site {
            Type::Package(p) => {
                let p = *p;
                let qualified = format!("{}.{}", self.symtab.qualified_name(p), name);
                if ri.kind != KindSelector::Value {
                    if let Some(c) = self.load_class(&qualified, span)? {
                        sel.sym = Some(c);
                        self.check_use(env, c, span);
                        return Ok(self.type_of_type_symbol(c));
                    }
                    if self.symtab.lookup_package(&qualified).is_some() || self.provider.has_package(&qualified) {
                        let sub = self.symtab.enter_package(&qualified);
                        sel.sym = Some(sub);
                        return Ok(Type::Package(sub));
                    }
                }
                self.log.error(
                    DiagKind::CantResolveLocation,
                    span,
                    vec!["class".into(), name.into(), p.into()],
                );
                Ok(Type::Error)
            }
            Type::Prim(_) | Type::Void | Type::Null => {
                self.log.error(DiagKind::CantDeref, span, vec![site.clone().into()]);
                Ok(Type::Error)
            }
            Type::Array(_) if name == "length" && !target_is_type => Ok(Type::Prim(TypeTag::Int)),
            _ if name == "this" && target_is_type => {
                let Some(c) = site.class_sym() else {
                    return Ok(Type::Error);
                };
                sel.sym = Some(c);
                if self.is_static_context_for(env, c) {
                    self.log.error(
                        DiagKind::NonStaticCantBeRef,
                        span,
                        vec!["variable".into(), "this".into()],
                    );
                }
                Ok(self.symtab.sym(c).ty.clone())
            }
            _ => {
                if matches!(ri.kind, KindSelector::Value | KindSelector::ValueOrType) {
                    if let Some(f) = self.find_field(&site, &name)? {
                        sel.sym = Some(f);
                        let field = self.symtab.sym(f);
                        let (is_static, is_final) = (field.is_static(), field.flags.contains(Flags::FINAL));
                        if target_is_type && !is_static {
                            self.log.error(
                                DiagKind::NonStaticCantBeRef,
                                span,
                                vec!["variable".into(), name.into()],
                            );
                        }
                        self.check_use(env, f, span);
                        if is_final {
                            *constant = self.var_constant(f)?;
                        }
                        return Ok(self.types().member_type(&site, f));
                    }
                }
                if matches!(ri.kind, KindSelector::Type | KindSelector::ValueOrType) {
                    if let Some(c) = site.class_sym() {
                        if let Some(member) = self.find_member_type(c, &name)? {
                            sel.sym = Some(member);
                            self.check_use(env, member, span);
                            return Ok(self.type_of_type_symbol(member));
                        }
                    }
                }
                let kind = if ri.kind == KindSelector::Type { "class" } else { "variable" };
                self.log.error(
                    DiagKind::CantResolveLocation,
                    span,
                    vec![kind.into(), name.into(), site.into()],
                );
                Ok(Type::Error)
            }
        }
    }

    fn attrib_unary(&mut self, u: &mut UnaryExpr, span: Span, constant: &mut Option<Literal>, env: &Env) -> Result<Type> {
        let arg = self.attrib_expr(&mut u.operand, env, &ResultInfo::unknown())?;
        let operand_bindings = std::mem::take(&mut self.bindings);
        if self.types().is_erroneous(&arg) {
            return Ok(Type::Error);
        }
        let id = self.operators.resolve_unary(&self.symtab, &mut self.log, span, u.op, &arg);
        u.operator = Some(id);
        let op = self.operators.get(id);
        if op.is_noop() {
            return Ok(Type::Error);
        }
        if u.op == UnaryOp::Not {
            self.bindings = self.computer().unary_not(&operand_bindings);
        }
        if matches!(u.op, UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec) {
            if !is_variable(&u.operand) {
                self.log.error(
                    DiagKind::UnexpectedType,
                    u.operand.span,
                    vec!["variable".into(), "value".into()],
                );
            }
            return Ok(arg);
        }
        if let Some(c) = &u.operand.constant {
            *constant = fold_unary(&op, c);
        }
        Ok(op.ret.clone())
    }

    fn attrib_binary(&mut self, b: &mut BinaryExpr, span: Span, constant: &mut Option<Literal>, env: &Env) -> Result<Type> {
        let left = self.attrib_expr(&mut b.left, env, &ResultInfo::unknown())?;
        let lhs = std::mem::take(&mut self.bindings);
        let right_env = match b.op {
            BinaryOp::And => self.env_with_bindings(env, &lhs.when_true),
            BinaryOp::Or => self.env_with_bindings(env, &lhs.when_false),
            _ => env.clone(),
        };
        let right = self.attrib_expr(&mut b.right, &right_env, &ResultInfo::unknown())?;
        let rhs = std::mem::take(&mut self.bindings);
        if matches!(b.op, BinaryOp::And | BinaryOp::Or) {
            self.bindings = self.computer().binary(span, b.op, &lhs, &rhs);
        }
        if self.types().is_erroneous(&left) || self.types().is_erroneous(&right) {
            return Ok(Type::Error);
        }
        let id = self
            .operators
            .resolve_binary(&self.symtab, &mut self.log, span, b.op, &left, &right);
        b.operator = Some(id);
        let op = self.operators.get(id);
        if op.is_noop() {
            return Ok(Type::Error);
        }
        if let (Some(l), Some(r)) = (&b.left.constant, &b.right.constant) {
            *constant = fold_binary(&op, l, r);
        }
        Ok(op.ret.clone())
    }

    fn attrib_conditional(
        &mut self,
        c: &mut ConditionalExpr,
        span: Span,
        constant: &mut Option<Literal>,
        env: &Env,
        ri: &ResultInfo,
    ) -> Result<Type> {
        self.attrib_expr(&mut c.cond, env, &ResultInfo::value(boolean_type()))?;
        let cond = std::mem::take(&mut self.bindings);
        let then_env = self.env_with_bindings(env, &cond.when_true);
        let else_env = self.env_with_bindings(env, &cond.when_false);
        let poly = ri.kind == KindSelector::Value
            && !ri.pt.is_none()
            && !self.types().is_erroneous(&ri.pt)
            && (ri.pt.is_reference()
                || matches!(ri.pt, Type::Undet(_))
                || is_poly_expression(&c.then_expr)
                || is_poly_expression(&c.else_expr));
        if poly {
            self.attrib_expr(&mut c.then_expr, &then_env, ri)?;
            let then = std::mem::take(&mut self.bindings);
            self.attrib_expr(&mut c.else_expr, &else_env, ri)?;
            let otherwise = std::mem::take(&mut self.bindings);
            self.bindings = self.computer().conditional(span, &cond, &then, &otherwise);
            return Ok(ri.pt.clone());
        }
        let t1 = self.attrib_expr(&mut c.then_expr, &then_env, &ResultInfo::unknown())?;
        let then = std::mem::take(&mut self.bindings);
        let t2 = self.attrib_expr(&mut c.else_expr, &else_env, &ResultInfo::unknown())?;
        let otherwise = std::mem::take(&mut self.bindings);
        self.bindings = self.computer().conditional(span, &cond, &then, &otherwise);
        let ty = self.condtype(
            span,
            &t1,
            &t2,
            c.then_expr.constant.as_ref(),
            c.else_expr.constant.as_ref(),
        );
        if let Some(Literal::Boolean(which)) = &c.cond.constant {
            let picked = if *which { &c.then_expr.constant } else { &c.else_expr.constant };
            *constant = picked.as_ref().and_then(|k| coerce_constant(&self.types(), k, &ty));
        }
        Ok(ty)
    }

    /// Type of a standalone conditional (or switch) with result types
    /// `t1` and `t2`
    fn condtype(&mut self, span: Span, t1: &Type, t2: &Type, c1: Option<&Literal>, c2: Option<&Literal>) -> Type {
        let types = Types::new(&self.symtab);
        if types.is_erroneous(t1) || types.is_erroneous(t2) {
            return Type::Error;
        }
        if t1.is_void() || t2.is_void() {
            self.log.error(DiagKind::VoidNotAllowedHere, span, vec![]);
            return Type::Error;
        }
        if types.is_same_type(t1, t2) {
            return t1.clone();
        }
        let u1 = types.unboxed_type_or_type(t1);
        let u2 = types.unboxed_type_or_type(t2);
        if u1.is_boolean() && u2.is_boolean() {
            return boolean_type();
        }
        if u1.is_numeric() && u2.is_numeric() {
            if types.is_same_type(&u1, &u2) {
                return u1;
            }
            for (narrow, wide, k) in [(&u1, &u2, c2), (&u2, &u1, c1)] {
                if let (Some(tag @ (TypeTag::Byte | TypeTag::Short | TypeTag::Char)), Some(TypeTag::Int)) =
                    (narrow.tag(), wide.tag())
                {
                    if k.and_then(int_value).map(|v| fits_in(v, tag)).unwrap_or(false) {
                        return narrow.clone();
                    }
                }
            }
            return binary_promotion(&u1, &u2, &types);
        }
        match (t1, t2) {
            (Type::Null, other) | (other, Type::Null) => types.boxed_type_or_type(other),
            _ => types.lub(&types.boxed_type_or_type(t1), &types.boxed_type_or_type(t2)),
        }
    }

    fn attrib_instance_of(&mut self, io: &mut InstanceOfExpr, span: Span, env: &Env) -> Result<Type> {
        let expr_t = self.attrib_expr(&mut io.expr, env, &ResultInfo::unknown())?;
        let (target, bindings) = match &mut io.target {
            InstanceOfTarget::Type(te) => (self.attrib_type_mut(te, env)?, MatchBindings::EMPTY),
            InstanceOfTarget::Pattern(p) => {
                let (t, binding) = self.attrib_pattern(p, env, &expr_t)?;
                (t, MatchBindings::of_pattern(binding))
            }
        };
        let types = Types::new(&self.symtab);
        if !types.is_erroneous(&expr_t) && !types.is_erroneous(&target) {
            if expr_t.is_primitive() {
                self.log.error(
                    DiagKind::UnexpectedType,
                    io.expr.span,
                    vec!["reference".into(), expr_t.into()],
                );
            } else if !types.is_castable(&expr_t, &target) {
                self.log.error(
                    DiagKind::IncompatibleTypes,
                    span,
                    vec![expr_t.into(), target.into()],
                );
            }
        }
        self.bindings = bindings;
        Ok(boolean_type())
    }

    /// Attribute a pattern matched against `selector`; returns the tested
    /// type and the binding variable
    pub(crate) fn attrib_pattern(&mut self, p: &mut Pattern, env: &Env, selector: &Type) -> Result<(Type, SymbolId)> {
        let (ty, binding) = match &mut p.kind {
            PatternKind::Parenthesized(inner) => self.attrib_pattern(inner, env, selector)?,
            PatternKind::Binding(var) => {
                let ty = match var.var_type.as_mut() {
                    Some(te) if te.is_var() => {
                        te.ty = Some(selector.clone());
                        selector.clone()
                    }
                    Some(te) => self.attrib_type_mut(te, env)?,
                    None => selector.clone(),
                };
                self.check_unique_local(env, &var.name, var.span);
                let owner = self.scope_owner(env);
                let flags = Modifier::flags_of(&var.modifiers) | Flags::MATCH_BINDING;
                let v = self.symtab.new_var(owner, &var.name, flags, ty.clone());
                self.symtab.sym_mut(v).span = var.span;
                var.sym = Some(v);
                if !var.annotations.is_empty() {
                    self.queue_annotations(var.annotations.clone(), v, env.clone());
                    self.flush_annotations()?;
                }
                (ty, v)
            }
        };
        p.ty = Some(ty.clone());
        Ok((ty, binding))
    }

    fn attrib_new_array(&mut self, na: &mut NewArrayExpr, span: Span, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let owntype = match na.elem_type.as_mut() {
            Some(te) => {
                let mut t = self.attrib_type_mut(te, env)?;
                for d in na.dims.iter_mut() {
                    self.attrib_expr(d, env, &ResultInfo::value(Type::Prim(TypeTag::Int)))?;
                }
                let depth = na.dims.len().max(1);
                if !self.types().is_erroneous(&t) {
                    for _ in 0..depth {
                        t = Type::array_of(t);
                    }
                }
                t
            }
            None => match &ri.pt {
                Type::Array(_) => ri.pt.clone(),
                pt if pt.is_none() || self.types().is_erroneous(pt) => Type::Error,
                pt => {
                    self.log
                        .error(DiagKind::UnexpectedType, span, vec![pt.clone().into(), "array".into()]);
                    Type::Error
                }
            },
        };
        if let Some(init) = na.init.as_mut() {
            let elem = self.types().elem_type(&owntype).unwrap_or(Type::Recovery);
            for e in init.iter_mut() {
                self.attrib_expr(e, env, &ResultInfo::value(elem.clone()))?;
            }
        }
        Ok(owntype)
    }

    // ---- invocations ----

    fn attrib_invoke(&mut self, inv: &mut InvokeExpr, span: Span, env: &Env, ri: &ResultInfo) -> Result<Type> {
        for t in inv.type_args.iter_mut() {
            self.attrib_type_mut(t, env)?;
        }
        if inv.target.is_none() && (inv.name == "this" || inv.name == "super") {
            return self.attrib_ctor_call(inv, span, env);
        }
        let argtypes = self.attrib_args(&mut inv.args, env)?;
        let name = inv.name.clone();
        let (candidates, static_only, location) = match inv.target.as_mut() {
            None => {
                let (candidates, owner) = self.find_unqualified_methods(env, &name)?;
                let static_only = owner
                    .map(|c| {
                        self.is_static_context_for(env, c)
                            || (env.info.is_self_call && env.enclosing_class == Some(c))
                    })
                    .unwrap_or(false);
                (candidates, static_only, self.location_arg(env))
            }
            Some(target) => {
                let site = self.attrib_expr(target, env, &qualifier_info())?;
                if self.types().is_erroneous(&site) {
                    self.commit_erroneous_args(&mut inv.args, env)?;
                    return Ok(Type::Error);
                }
                if site.is_primitive() || site.is_void() || matches!(site, Type::Package(_) | Type::Null) {
                    self.log.error(DiagKind::CantDeref, span, vec![site.into()]);
                    self.commit_erroneous_args(&mut inv.args, env)?;
                    return Ok(Type::Error);
                }
                let static_only = self.denotes_type(target);
                let candidates = self.find_methods(&site, &name)?;
                (candidates, static_only, site.into())
            }
        };
        if candidates.is_empty() {
            self.log.error(
                DiagKind::CantResolveLocation,
                span,
                vec!["method".into(), name.into(), location],
            );
            self.commit_erroneous_args(&mut inv.args, env)?;
            return Ok(Type::Error);
        }
        match self.select_method(env, &candidates, &name, &argtypes, &[], span)? {
            MethodResolution::Found(app) => {
                if static_only && !self.symtab.sym(app.sym).is_static() {
                    self.log.error(
                        DiagKind::NonStaticCantBeRef,
                        span,
                        vec!["method".into(), name.into()],
                    );
                }
                inv.sym = Some(app.sym);
                inv.varargs = app.is_varargs_call();
                self.check_use(env, app.sym, span);
                let (ty, formals) = self.instantiate_result(&app, ri);
                self.commit_args(&mut inv.args, &formals, env)?;
                Ok(ty)
            }
            MethodResolution::Inapplicable { candidate, site, diag } => {
                self.method_failure(span.pos(), &mut inv.args, env, ri, candidate, site, diag)
            }
            MethodResolution::NotFound => {
                self.commit_erroneous_args(&mut inv.args, env)?;
                Ok(Type::Error)
            }
        }
    }

    /// `this(...)` or `super(...)` as the first statement of a constructor
    fn attrib_ctor_call(&mut self, inv: &mut InvokeExpr, span: Span, env: &Env) -> Result<Type> {
        let Some(c) = env.enclosing_class else {
            return Ok(Type::Error);
        };
        let mut self_env = env.clone();
        self_env.info.is_self_call = true;
        let argtypes = self.attrib_args(&mut inv.args, &self_env)?;
        let site = if inv.name == "this" {
            self.symtab.sym(c).ty.clone()
        } else {
            let types = self.types();
            types
                .supertype(&self.symtab.sym(c).ty)
                .unwrap_or_else(|| types.object_type())
        };
        let candidates = self.find_constructors(&site)?;
        if candidates.is_empty() {
            self.log.error(
                DiagKind::CantResolveLocation,
                span,
                vec!["constructor".into(), inv.name.clone().into(), site.into()],
            );
            self.commit_erroneous_args(&mut inv.args, &self_env)?;
            return Ok(Type::Void);
        }
        match self.select_method(&self_env, &candidates, "<init>", &argtypes, &[], span)? {
            MethodResolution::Found(app) => {
                inv.sym = Some(app.sym);
                inv.varargs = app.is_varargs_call();
                self.check_use(&self_env, app.sym, span);
                let (_, formals) = self.instantiate_result(&app, &ResultInfo::unknown());
                self.commit_args(&mut inv.args, &formals, &self_env)?;
            }
            MethodResolution::Inapplicable { diag, .. } => {
                self.log.report(diag);
                self.commit_erroneous_args(&mut inv.args, &self_env)?;
            }
            MethodResolution::NotFound => self.commit_erroneous_args(&mut inv.args, &self_env)?,
        }
        Ok(Type::Void)
    }

    /// Result type and formals of a selected method, inference variables
    /// solved. In argument position without a target, a generic result is
    /// left partially inferred for the enclosing call to complete.
    fn instantiate_result(&self, app: &Applicable, ri: &ResultInfo) -> (Type, Vec<Type>) {
        let types = self.types();
        let ret = (*app.mtype.ret).clone();
        if !ret.has_undet() && !app.formals.iter().any(Type::has_undet) {
            return (ret, app.formals.clone());
        }
        let partial = ri.mode == CheckMode::MethodArg && ri.pt.is_none() && ret.has_undet();
        let mut bounds = app.bounds.clone();
        if !partial && !ri.pt.is_none() && !types.is_erroneous(&ri.pt) && !ri.pt.has_undet() {
            infer::collect_target_bounds(&types, &ret, &ri.pt, &mut bounds);
        }
        let mut solution = infer::solve(&types, &app.vars, &bounds);
        infer::default_solution(&types, &app.vars, &mut solution);
        let formals = app
            .formals
            .iter()
            .map(|f| infer::apply(&types, f, &app.vars, &solution))
            .collect();
        let result = if partial {
            Type::Partial(Box::new(PartialType {
                method: app.sym,
                mtype: app.mtype.clone(),
                vars: app.vars.clone(),
                bounds: app.bounds.clone(),
            }))
        } else {
            infer::apply(&types, &ret, &app.vars, &solution)
        };
        (result, formals)
    }

    /// Attribute the deferred arguments of a resolved call against their
    /// formals
    fn commit_args(&mut self, args: &mut [Expr], formals: &[Type], env: &Env) -> Result<()> {
        self.evict_deferred_args(args);
        for (i, arg) in args.iter_mut().enumerate() {
            if !is_poly_expression(arg) {
                continue;
            }
            let formal = formals.get(i).cloned().unwrap_or(Type::Recovery);
            self.attrib_expr(arg, env, &ResultInfo::value(formal))?;
        }
        Ok(())
    }

    /// Attribute deferred arguments of a call that could not be resolved
    pub(crate) fn commit_erroneous_args(&mut self, args: &mut [Expr], env: &Env) -> Result<()> {
        self.evict_deferred_args(args);
        for arg in args.iter_mut() {
            if is_poly_expression(arg) {
                self.attrib_expr(arg, env, &ResultInfo::value(Type::Recovery))?;
            }
        }
        Ok(())
    }

    /// An inapplicable call: queued for recovery when a lambda argument's
    /// shape is the likely culprit, reported otherwise
    #[allow(clippy::too_many_arguments)]
    fn method_failure(
        &mut self,
        pos: Pos,
        args: &mut [Expr],
        env: &Env,
        ri: &ResultInfo,
        candidate: Option<SymbolId>,
        site: Type,
        diag: Diagnostic,
    ) -> Result<Type> {
        match self.try_defer_recovery(pos, env, ri, candidate, site, diag, args) {
            None => {
                // the retry attributes the arguments afresh
                self.evict_deferred_args(args);
                Ok(Type::Recovery)
            }
            Some(diag) => {
                self.log.report(diag);
                self.commit_erroneous_args(args, env)?;
                Ok(Type::Error)
            }
        }
    }

    fn attrib_new_class(&mut self, nc: &mut NewClassExpr, span: Span, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let clazz = match nc.outer.as_mut() {
            Some(outer) => {
                let outer_t = self.attrib_expr(outer, env, &ResultInfo::unknown())?;
                let t = self.attrib_inner_class_type(&mut nc.class_type, &outer_t, env)?;
                nc.class_type.ty = Some(t.clone());
                t
            }
            None => self.attrib_type_mut(&mut nc.class_type, env)?,
        };
        if self.types().is_erroneous(&clazz) {
            self.commit_erroneous_args(&mut nc.args, env)?;
            return Ok(Type::Error);
        }
        let Some(c) = clazz.class_sym() else {
            self.log.error(
                DiagKind::UnexpectedType,
                nc.class_type.span,
                vec!["class".into(), clazz.into()],
            );
            self.commit_erroneous_args(&mut nc.args, env)?;
            return Ok(Type::Error);
        };
        self.complete(c)?;
        self.check_use(env, c, span);
        let flags = self.symtab.sym(c).flags;
        if nc.body.is_none() && flags.intersects(Flags::ABSTRACT.union(Flags::INTERFACE)) {
            self.log
                .error(DiagKind::AbstractCantBeInstantiated, span, vec![c.into()]);
        }
        let argtypes = self.attrib_args(&mut nc.args, env)?;
        let (site, extra_vars) = if nc.diamond {
            let tvars = self.symtab.class_type_params(c);
            let undets = tvars.iter().map(|v| Type::Undet(*v)).collect();
            (Type::generic(c, undets), tvars)
        } else {
            (clazz.clone(), Vec::new())
        };
        let ctor_site = if nc.body.is_some() && flags.contains(Flags::INTERFACE) {
            self.types().object_type()
        } else {
            site.clone()
        };
        let candidates = self.find_constructors(&ctor_site)?;
        if candidates.is_empty() {
            self.log.error(
                DiagKind::CantResolveLocation,
                span,
                vec!["constructor".into(), self.symtab.sym(c).name.clone().into(), c.into()],
            );
            self.commit_erroneous_args(&mut nc.args, env)?;
            return Ok(Type::Error);
        }
        let owntype = match self.select_method(env, &candidates, "<init>", &argtypes, &extra_vars, span)? {
            MethodResolution::Found(mut app) => {
                nc.ctor = Some(app.sym);
                self.check_use(env, app.sym, span);
                if nc.diamond {
                    app.mtype.ret = Box::new(site);
                }
                let (ty, formals) = self.instantiate_result(&app, ri);
                self.commit_args(&mut nc.args, &formals, env)?;
                if nc.diamond {
                    ty
                } else {
                    clazz
                }
            }
            MethodResolution::Inapplicable { candidate, site, diag } => {
                let diag = if nc.diamond {
                    Diagnostic::error(
                        DiagKind::CantApplyDiamond,
                        span,
                        vec![c.into(), DiagArg::Fragment(Box::new(diag))],
                    )
                } else {
                    diag
                };
                return self.method_failure(span.pos(), &mut nc.args, env, ri, candidate, site, diag);
            }
            MethodResolution::NotFound => {
                self.commit_erroneous_args(&mut nc.args, env)?;
                return Ok(Type::Error);
            }
        };
        match nc.body.as_mut() {
            Some(body) if !owntype.is_partial() => {
                let anon = self.enter_anonymous_class(body, env, &owntype)?;
                self.attrib_class(body)?;
                Ok(self.symtab.sym(anon).ty.clone())
            }
            _ => Ok(owntype),
        }
    }

    /// `outer.new Inner<...>()`: the class name is looked up as a member
    /// of the outer instance's type
    fn attrib_inner_class_type(&mut self, te: &mut TypeExpr, outer: &Type, env: &Env) -> Result<Type> {
        if self.types().is_erroneous(outer) {
            return Ok(Type::Error);
        }
        let TypeExprKind::Named { name, args } = &mut te.kind else {
            return self.attrib_type_mut(te, env);
        };
        let Some(oc) = outer.class_sym() else {
            self.log.error(DiagKind::CantDeref, te.span, vec![outer.clone().into()]);
            return Ok(Type::Error);
        };
        let Some(inner) = self.find_member_type(oc, name)? else {
            self.log.error(
                DiagKind::CantResolveLocation,
                te.span,
                vec!["class".into(), name.clone().into(), outer.clone().into()],
            );
            return Ok(Type::Error);
        };
        if args.is_empty() {
            return Ok(Type::class(inner));
        }
        let mut targs = Vec::with_capacity(args.len());
        for a in args.iter_mut() {
            targs.push(self.attrib_type_mut(a, env)?);
        }
        Ok(Type::generic(inner, targs))
    }

    // ---- lambdas ----

    fn attrib_lambda(&mut self, lambda: &mut LambdaExpr, span: Span, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let pt = ri.pt.clone();
        if pt.is_none() {
            self.log.error(DiagKind::UnexpectedLambda, span, vec![]);
            self.attrib_lambda_recovery(lambda, env)?;
            return Ok(Type::Error);
        }
        if self.types().is_erroneous(&pt) {
            self.attrib_lambda_recovery(lambda, env)?;
            return Ok(pt);
        }
        let desc = match self.lambda_descriptor(&pt) {
            Ok(desc) => desc,
            Err(reason) => {
                self.log.error(
                    DiagKind::IncompatibleTypes,
                    span,
                    vec![DiagArg::Fragment(Box::new(reason))],
                );
                self.attrib_lambda_recovery(lambda, env)?;
                return Ok(Type::Error);
            }
        };
        let desc = self.erase_undet(desc);
        if desc.params.len() != lambda.params.len() {
            self.log.error(DiagKind::IncompatibleArgTypesInLambda, span, vec![]);
            self.attrib_lambda_recovery(lambda, env)?;
            return Ok(Type::Error);
        }
        let params = match lambda.param_kind {
            LambdaParamKind::Implicit => desc.params.clone(),
            LambdaParamKind::Explicit => {
                let mut params = Vec::with_capacity(lambda.params.len());
                let mut mismatch = false;
                for (param, expected) in lambda.params.iter_mut().zip(&desc.params) {
                    let ty = match param.var_type.as_mut() {
                        Some(te) => self.attrib_type_mut(te, env)?,
                        None => expected.clone(),
                    };
                    let types = self.types();
                    if !types.is_erroneous(&ty) && !types.is_same_type(&ty, expected) {
                        mismatch = true;
                    }
                    params.push(ty);
                }
                if mismatch {
                    self.log.error(DiagKind::IncompatibleArgTypesInLambda, span, vec![]);
                }
                params
            }
        };
        self.attrib_lambda_body(lambda, env, &params, Some(&desc.ret))?;
        Ok(pt)
    }

    /// Descriptor of a target still mentioning inference variables, with
    /// those variables erased
    fn erase_undet(&self, desc: MethodType) -> MethodType {
        if !desc.params.iter().any(Type::has_undet) && !desc.ret.has_undet() {
            return desc;
        }
        let types = self.types();
        MethodType {
            params: desc.params.iter().map(|p| types.erasure(p)).collect(),
            ret: Box::new(types.erasure(&desc.ret)),
            thrown: desc.thrown,
            tvars: desc.tvars,
        }
    }

    /// Attribute a lambda with no usable target, for the diagnostics its
    /// body produces
    fn attrib_lambda_recovery(&mut self, lambda: &mut LambdaExpr, env: &Env) -> Result<()> {
        let mut params = Vec::with_capacity(lambda.params.len());
        for param in lambda.params.iter_mut() {
            let ty = match param.var_type.as_mut() {
                Some(te) if !te.is_var() => self.attrib_type_mut(te, env)?,
                _ => Type::Error,
            };
            params.push(ty);
        }
        self.attrib_lambda_body(lambda, env, &params, Some(&Type::Recovery))?;
        Ok(())
    }

    /// Attribute the body of `lambda` with the given parameter types.
    ///
    /// With `ret` unknown, return expressions are attributed standalone
    /// and the body's shape is reported for deferred checking.
    pub(crate) fn attrib_lambda_body(
        &mut self,
        lambda: &mut LambdaExpr,
        env: &Env,
        params: &[Type],
        ret: Option<&Type>,
    ) -> Result<LambdaShape> {
        let owner = self.scope_owner(env);
        let scope = self.symtab.new_scope(owner, Some(env.info.scope));
        let mut lambda_env = env.dup_with_scope(EnvKind::Lambda, scope);
        lambda_env.info.yield_result = None;
        lambda_env.info.return_result = Some(match ret {
            Some(t) => ResultInfo::value(t.clone()),
            None => ResultInfo::method_arg(Type::None, true),
        });
        for (param, ty) in lambda.params.iter_mut().zip(params) {
            self.check_unique_local(&lambda_env, &param.name, param.span);
            let flags = Modifier::flags_of(&param.modifiers) | Flags::PARAMETER;
            let v = self.symtab.new_var(owner, &param.name, flags, ty.clone());
            self.symtab.sym_mut(v).span = param.span;
            self.symtab.enter(scope, v);
            param.sym = Some(v);
        }
        let recovery = ret.map(|t| self.types().is_erroneous(t)).unwrap_or(false);
        match &mut lambda.body {
            LambdaBody::Expr(body) => {
                let is_stmt = tree_info::is_statement_expression(body);
                let ty = match ret {
                    None => self.attrib_expr(body, &lambda_env, &ResultInfo::method_arg(Type::None, true))?,
                    Some(t) if t.is_void() => {
                        let ty = self.attrib_expr(body, &lambda_env, &ResultInfo::unknown())?;
                        if !is_stmt && !self.types().is_erroneous(&ty) {
                            self.bad_lambda_return(body.span, Diagnostic::fragment(DiagKind::UnexpectedRetVal, vec![]));
                        }
                        ty
                    }
                    Some(t) => self.attrib_expr(body, &lambda_env, &ResultInfo::value(t.clone()))?,
                };
                Ok(LambdaShape::Expr { ty, is_stmt })
            }
            LambdaBody::Block(block) => {
                self.attrib_block(block, &lambda_env)?;
                let returns = tree_info::lambda_returns(block)
                    .iter()
                    .map(|r| r.expr.as_ref().map(Expr::ty))
                    .collect();
                let can_complete = tree_info::stats_complete_normally(&block.statements);
                if let Some(t) = ret {
                    if !t.is_void() && !recovery && can_complete {
                        self.bad_lambda_return(
                            block.span,
                            Diagnostic::fragment(DiagKind::MissingRetVal, vec![t.clone().into()]),
                        );
                    }
                }
                Ok(LambdaShape::Block { returns, can_complete })
            }
        }
    }

    fn bad_lambda_return(&mut self, span: Span, reason: Diagnostic) {
        let fragment = Diagnostic::fragment(
            DiagKind::IncompatibleRetTypeInLambda,
            vec![DiagArg::Fragment(Box::new(reason))],
        );
        self.log.error(
            DiagKind::IncompatibleTypes,
            span,
            vec![DiagArg::Fragment(Box::new(fragment))],
        );
    }

    // ---- statements ----

    /// Attribute a block in a fresh scope
    pub(crate) fn attrib_block(&mut self, block: &mut Block, env: &Env) -> Result<()> {
        let owner = self.scope_owner(env);
        let scope = self.symtab.new_scope(owner, Some(env.info.scope));
        let block_env = env.dup_with_scope(EnvKind::Block, scope);
        self.attrib_stats(&mut block.statements, &block_env)
    }

    /// Attribute a statement list; bindings a statement introduces are in
    /// scope for the statements after it
    fn attrib_stats(&mut self, stats: &mut [Stmt], env: &Env) -> Result<()> {
        let mut current = env.clone();
        for stmt in stats.iter_mut() {
            let introduced = self.attrib_stmt(stmt, &current)?;
            if !introduced.is_empty() {
                for b in &introduced {
                    self.symtab.sym_mut(*b).flags.insert(Flags::MATCH_BINDING_TO_OUTER);
                }
                current = self.env_with_bindings(&current, &introduced);
            }
        }
        Ok(())
    }

    fn attrib_cond(&mut self, cond: &mut Expr, env: &Env) -> Result<MatchBindings> {
        self.attrib_expr(cond, env, &ResultInfo::value(boolean_type()))?;
        Ok(std::mem::take(&mut self.bindings))
    }

    /// Attribute one statement; returns the match bindings it introduces
    /// into the enclosing block
    pub(crate) fn attrib_stmt(&mut self, stmt: &mut Stmt, env: &Env) -> Result<Vec<SymbolId>> {
        match stmt {
            Stmt::Block(b) => self.attrib_block(b, env)?,
            Stmt::LocalVar(v) => self.attrib_local_var(v, env)?,
            Stmt::LocalClass(c) => {
                self.enter_local_class(c, env)?;
                self.attrib_class(c)?;
            }
            Stmt::Expr(e) => {
                self.attrib_expr(&mut e.expr, env, &ResultInfo::unknown())?;
            }
            Stmt::If(s) => return self.attrib_if(s, env),
            Stmt::While(s) => {
                let cond = self.attrib_cond(&mut s.cond, env)?;
                let body_env = self.env_with_bindings(env, &cond.when_true);
                self.attrib_stmt(&mut s.body, &body_env)?;
                if !tree_info::contains_break(&s.body) {
                    return Ok(cond.when_false);
                }
            }
            Stmt::DoWhile(s) => {
                self.attrib_stmt(&mut s.body, env)?;
                let cond = self.attrib_cond(&mut s.cond, env)?;
                if !tree_info::contains_break(&s.body) {
                    return Ok(cond.when_false);
                }
            }
            Stmt::For(s) => {
                let owner = self.scope_owner(env);
                let scope = self.symtab.new_scope(owner, Some(env.info.scope));
                let for_env = env.dup_with_scope(EnvKind::Block, scope);
                for init in s.init.iter_mut() {
                    self.attrib_stmt(init, &for_env)?;
                }
                let cond = match s.cond.as_mut() {
                    Some(c) => self.attrib_cond(c, &for_env)?,
                    None => MatchBindings::EMPTY,
                };
                let body_env = self.env_with_bindings(&for_env, &cond.when_true);
                for u in s.update.iter_mut() {
                    self.attrib_expr(u, &body_env, &ResultInfo::unknown())?;
                }
                self.attrib_stmt(&mut s.body, &body_env)?;
                if s.cond.is_some() && !tree_info::contains_break(&s.body) {
                    return Ok(cond.when_false);
                }
            }
            Stmt::ForEach(s) => self.attrib_foreach(s, env)?,
            Stmt::Switch(sw) => self.attrib_switch(sw, env, None)?,
            Stmt::Return(r) => self.attrib_return(r, env)?,
            Stmt::Yield(y) => {
                let ri = env.info.yield_result.clone().unwrap_or_else(ResultInfo::unknown);
                self.attrib_expr(&mut y.value, env, &ri)?;
            }
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
            Stmt::Throw(t) => {
                let thrown = self.attrib_expr(&mut t.expr, env, &ResultInfo::unknown())?;
                let throwable = Type::class(self.symtab.predef.throwable);
                let types = Types::new(&self.symtab);
                if !types.is_erroneous(&thrown) && !types.is_subtype(&thrown, &throwable) {
                    self.log.error(
                        DiagKind::IncompatibleTypes,
                        t.expr.span,
                        vec![thrown.into(), throwable.into()],
                    );
                }
            }
            Stmt::Labeled(l) => {
                self.attrib_stmt(&mut l.body, env)?;
            }
        }
        Ok(Vec::new())
    }

    fn attrib_if(&mut self, s: &mut IfStmt, env: &Env) -> Result<Vec<SymbolId>> {
        let cond = self.attrib_cond(&mut s.cond, env)?;
        let then_env = self.env_with_bindings(env, &cond.when_true);
        self.attrib_stmt(&mut s.then_branch, &then_env)?;
        if let Some(otherwise) = s.else_branch.as_mut() {
            let else_env = self.env_with_bindings(env, &cond.when_false);
            self.attrib_stmt(otherwise, &else_env)?;
        }
        let then_completes = tree_info::completes_normally(&s.then_branch);
        let else_completes = s
            .else_branch
            .as_deref()
            .map(tree_info::completes_normally)
            .unwrap_or(true);
        Ok(match (then_completes, else_completes) {
            (false, true) => cond.when_false,
            (true, false) => cond.when_true,
            _ => Vec::new(),
        })
    }

    fn attrib_foreach(&mut self, s: &mut ForEachStmt, env: &Env) -> Result<()> {
        let iterable = self.attrib_expr(&mut s.iterable, env, &ResultInfo::unknown())?;
        let elem = {
            let types = Types::new(&self.symtab);
            match &iterable {
                Type::Array(elem) => Some((**elem).clone()),
                t if types.is_erroneous(t) => Some(Type::Error),
                t => match types.as_super(t, self.symtab.predef.iterable) {
                    Some(Type::Class(ct)) => Some(match ct.args.first() {
                        Some(w @ Type::Wildcard(_)) => types.upper_bound(w),
                        Some(arg) => arg.clone(),
                        None => types.object_type(),
                    }),
                    _ => None,
                },
            }
        };
        let elem = match elem {
            Some(e) => e,
            None => {
                let iterable_class = Type::class(self.symtab.predef.iterable);
                self.log.error(
                    DiagKind::IncompatibleTypes,
                    s.iterable.span,
                    vec![iterable.into(), iterable_class.into()],
                );
                Type::Error
            }
        };
        let owner = self.scope_owner(env);
        let scope = self.symtab.new_scope(owner, Some(env.info.scope));
        let loop_env = env.dup_with_scope(EnvKind::Block, scope);
        let var = &mut s.var;
        let ty = match var.var_type.as_mut() {
            Some(te) if te.is_var() => {
                te.ty = Some(elem.clone());
                elem
            }
            Some(te) => {
                let t = self.attrib_type_mut(te, env)?;
                let types = Types::new(&self.symtab);
                if !types.is_erroneous(&elem) && !types.is_erroneous(&t) && !types.is_assignable(&elem, &t) {
                    self.log.error(
                        DiagKind::IncompatibleTypes,
                        var.span,
                        vec![elem.into(), t.clone().into()],
                    );
                }
                t
            }
            None => elem,
        };
        self.check_unique_local(env, &var.name, var.span);
        let flags = Modifier::flags_of(&var.modifiers);
        let v = self.symtab.new_var(owner, &var.name, flags, ty);
        self.symtab.sym_mut(v).span = var.span;
        self.symtab.enter(scope, v);
        var.sym = Some(v);
        self.attrib_stmt(&mut s.body, &loop_env)?;
        Ok(())
    }

    fn attrib_return(&mut self, r: &mut ReturnStmt, env: &Env) -> Result<()> {
        let Some(ri) = env.info.return_result.clone() else {
            self.log.error(DiagKind::RetOutsideMeth, r.span, vec![]);
            if let Some(e) = r.expr.as_mut() {
                self.attrib_expr(e, env, &ResultInfo::unknown())?;
            }
            return Ok(());
        };
        let pt = ri.pt.clone();
        if pt.is_none() || self.types().is_erroneous(&pt) {
            if let Some(e) = r.expr.as_mut() {
                self.attrib_expr(e, env, &ri)?;
            }
        } else if pt.is_void() {
            if let Some(e) = r.expr.as_mut() {
                self.attrib_expr(e, env, &ResultInfo::unknown())?;
                if tree_info::is_synthetic(e) {
                    return Ok(());
                }
                let reason = Diagnostic::fragment(DiagKind::UnexpectedRetVal, vec![]);
                self.log.error(
                    DiagKind::IncompatibleTypes,
                    e.span,
                    vec![DiagArg::Fragment(Box::new(reason))],
                );
            }
        } else {
            match r.expr.as_mut() {
                Some(e) => {
                    self.attrib_expr(e, env, &ri)?;
                }
                None => {
                    let reason = Diagnostic::fragment(DiagKind::MissingRetVal, vec![pt.into()]);
                    self.log.error(
                        DiagKind::IncompatibleTypes,
                        r.span,
                        vec![DiagArg::Fragment(Box::new(reason))],
                    );
                }
            }
        }
        Ok(())
    }

    fn attrib_local_var(&mut self, var: &mut VarDecl, env: &Env) -> Result<()> {
        let flags = Modifier::flags_of(&var.modifiers);
        let owner = self.scope_owner(env);
        let declared = match var.var_type.as_mut() {
            Some(te) if te.is_var() => None,
            Some(te) => Some(self.attrib_type_mut(te, env)?),
            None => Some(Type::Error),
        };
        let ty = match declared {
            Some(t) => {
                if let Some(init) = var.init.as_mut() {
                    self.attrib_expr(init, env, &ResultInfo::value(t.clone()))?;
                }
                t
            }
            None => {
                let t = self.infer_local_type(var, env)?;
                if let Some(te) = var.var_type.as_mut() {
                    te.ty = Some(t.clone());
                }
                t
            }
        };
        let unique = self.check_unique_local(env, &var.name, var.span);
        let v = self.symtab.new_var(owner, &var.name, flags, ty.clone());
        self.symtab.sym_mut(v).span = var.span;
        if flags.contains(Flags::FINAL) {
            let value = var
                .init
                .as_ref()
                .and_then(|i| i.constant.as_ref())
                .and_then(|k| coerce_constant(&self.types(), k, &ty));
            if let Some(value) = value {
                self.set_const_value(v, ConstValue::Value(value));
            }
        }
        if unique {
            self.symtab.enter(env.info.scope, v);
        }
        var.sym = Some(v);
        if !var.annotations.is_empty() {
            self.queue_annotations(var.annotations.clone(), v, env.clone());
            self.flush_annotations()?;
        }
        Ok(())
    }

    /// Type of a `var` local from its initializer
    fn infer_local_type(&mut self, var: &mut VarDecl, env: &Env) -> Result<Type> {
        let name = var.name.clone();
        let Some(init) = var.init.as_mut() else {
            self.log.error(
                DiagKind::CantInferLocalVarType,
                var.span,
                vec![name.into(), "local.missing.init".into()],
            );
            return Ok(Type::Error);
        };
        let reason = match &tree_info::skip_parens(init).kind {
            ExprKind::Lambda(_) => Some("local.lambda.missing.target"),
            ExprKind::NewArray(na) if na.elem_type.is_none() => Some("local.array.missing.target"),
            _ if tree_info::is_null(init) => Some("local.cant.infer.null"),
            _ => None,
        };
        if let Some(reason) = reason {
            self.log.error(
                DiagKind::CantInferLocalVarType,
                var.span,
                vec![name.into(), reason.into()],
            );
            self.attrib_expr(init, env, &ResultInfo::value(Type::Recovery))?;
            return Ok(Type::Error);
        }
        let t = self.attrib_expr(init, env, &ResultInfo::unknown())?;
        if t.is_void() {
            self.log.error(
                DiagKind::CantInferLocalVarType,
                var.span,
                vec![name.into(), "local.cant.infer.void".into()],
            );
            return Ok(Type::Error);
        }
        Ok(t)
    }

    // ---- switch ----

    fn attrib_switch_expr(&mut self, sw: &mut Switch, span: Span, env: &Env, ri: &ResultInfo) -> Result<Type> {
        let standalone = ri.kind != KindSelector::Value || ri.pt.is_none();
        let yield_ri = if standalone {
            ResultInfo::unknown()
        } else {
            ResultInfo::value(ri.pt.clone())
        };
        self.attrib_switch(sw, env, Some(yield_ri))?;
        if !standalone {
            return Ok(ri.pt.clone());
        }
        let yields = tree_info::switch_yields(sw);
        let mut result: Option<Type> = None;
        for value in &yields {
            let t = value.ty();
            result = Some(match result {
                None => t,
                Some(acc) => self.condtype(span, &acc, &t, None, value.constant.as_ref()),
            });
        }
        Ok(result.unwrap_or(Type::Error))
    }

    /// Attribute a switch statement (`yield_ri` is `None`) or a switch
    /// expression
    pub(crate) fn attrib_switch(&mut self, sw: &mut Switch, env: &Env, yield_ri: Option<ResultInfo>) -> Result<()> {
        let sel = self.attrib_expr(&mut sw.selector, env, &ResultInfo::unknown())?;
        let (sel_unboxed, enum_class, is_string, erroneous) = {
            let types = self.types();
            let unboxed = types.unboxed_type_or_type(&sel);
            let enum_class = sel.class_sym().filter(|c| self.symtab.sym(*c).is_enum());
            (unboxed, enum_class, types.is_string(&sel), types.is_erroneous(&sel))
        };
        let int_like = matches!(
            sel_unboxed.tag(),
            Some(TypeTag::Byte | TypeTag::Short | TypeTag::Char | TypeTag::Int)
        );
        let constant_switch = enum_class.is_some() || is_string || int_like;
        let has_patterns = sw.cases.iter().any(|c| {
            c.labels.iter().any(|l| match l {
                CaseLabel::Pattern(_) => true,
                CaseLabel::Constant(e) => tree_info::is_null(e),
                CaseLabel::Default(_) => false,
            })
        });
        sw.pattern_switch = has_patterns || (!constant_switch && !erroneous && sel.is_reference());
        if !constant_switch && !erroneous && sel.is_primitive() {
            self.log.error(
                DiagKind::UnexpectedType,
                sw.selector.span,
                vec!["int".into(), sel.clone().into()],
            );
        }
        if sw.pattern_switch && !self.config.allows_pattern_switch() {
            self.log
                .error(DiagKind::FeatureDisabled, sw.span, vec!["pattern.switch".into()]);
        }

        let owner = self.scope_owner(env);
        let switch_scope = self.symtab.new_scope(owner, Some(env.info.scope));
        let mut switch_env = env.dup_with_scope(EnvKind::Block, switch_scope);
        if let Some(ri) = &yield_ri {
            switch_env.info.yield_result = Some(ri.clone());
        }

        let mut seen_default = false;
        let mut seen_null = false;
        let mut has_unconditional = false;
        let mut constants: Vec<Literal> = Vec::new();
        let mut covered: HashSet<SymbolId> = HashSet::new();
        let is_expression = yield_ri.is_some();

        for case in sw.cases.iter_mut() {
            let mut bindings: Option<MatchBindings> = None;
            let mut unconditional = false;
            for label in case.labels.iter_mut() {
                let (current, label_span) = match label {
                    CaseLabel::Default(span) => {
                        if seen_default {
                            self.log.error(DiagKind::DuplicateDefaultLabel, *span, vec![]);
                        } else if has_unconditional {
                            self.log.error(DiagKind::UnconditionalPatternAndDefault, *span, vec![]);
                        }
                        seen_default = true;
                        (MatchBindings::EMPTY, *span)
                    }
                    CaseLabel::Constant(expr) if tree_info::is_null(expr) => {
                        expr.ty = Some(Type::Null);
                        if sel.is_primitive() {
                            self.log.error(
                                DiagKind::IncompatibleTypes,
                                expr.span,
                                vec![Type::Null.into(), sel.clone().into()],
                            );
                        }
                        if seen_null {
                            self.log.error(DiagKind::DuplicateCaseLabel, expr.span, vec![]);
                        }
                        seen_null = true;
                        (MatchBindings::null_case(), expr.span)
                    }
                    CaseLabel::Constant(expr) => {
                        if let Some(ec) = enum_class {
                            if let Some(constant) = self.attrib_enum_label(expr, ec, &sel) {
                                if !covered.insert(constant) {
                                    self.log.error(DiagKind::DuplicateCaseLabel, expr.span, vec![]);
                                }
                            }
                        } else {
                            self.attrib_constant_label(expr, &switch_env, &sel, &sel_unboxed, constant_switch, &mut constants)?;
                        }
                        (MatchBindings::EMPTY, expr.span)
                    }
                    CaseLabel::Pattern(p) => {
                        let (pt, binding) = self.attrib_pattern(p, &switch_env, &sel)?;
                        let types = Types::new(&self.symtab);
                        if !erroneous && !types.is_erroneous(&pt) {
                            if !types.is_castable(&sel, &pt) {
                                self.log.error(
                                    DiagKind::IncompatibleTypes,
                                    p.span,
                                    vec![sel.clone().into(), pt.clone().into()],
                                );
                            } else if types.is_subtype(&types.erasure(&types.boxed_type_or_type(&sel)), &types.erasure(&pt)) {
                                unconditional = true;
                            }
                        }
                        (MatchBindings::of_pattern(binding), p.span)
                    }
                };
                bindings = Some(match bindings {
                    None => current,
                    Some(prev) => self.computer().switch_case(label_span, &prev, &current),
                });
            }
            let bindings = bindings.unwrap_or_default();
            let mut body_bindings = bindings.when_true.clone();
            if let Some(guard) = case.guard.as_mut() {
                let guard_env = self.env_with_bindings(&switch_env, &bindings.when_true);
                self.attrib_expr(guard, &guard_env, &ResultInfo::value(boolean_type()))?;
                let guard_bindings = std::mem::take(&mut self.bindings);
                body_bindings.extend(guard_bindings.when_true);
                if guard.constant != Some(Literal::Boolean(true)) {
                    unconditional = false;
                }
            }
            if unconditional {
                if has_unconditional {
                    self.log.error(DiagKind::DuplicateUnconditionalPattern, case.span, vec![]);
                } else if seen_default {
                    self.log.error(DiagKind::UnconditionalPatternAndDefault, case.span, vec![]);
                }
                has_unconditional = true;
            }

            let case_scope = self.symtab.new_scope(owner, Some(switch_scope));
            for b in &body_bindings {
                self.symtab.enter(case_scope, *b);
            }
            let case_env = switch_env.dup_with_scope(EnvKind::Block, case_scope);
            if is_expression && case.kind == CaseKind::Rule {
                if let [Stmt::Expr(_)] = case.stats.as_slice() {
                    if let Some(Stmt::Expr(ExprStmt { expr, span })) = case.stats.pop() {
                        case.stats.push(Stmt::Yield(YieldStmt { value: expr, span }));
                    }
                }
            }
            self.attrib_stats(&mut case.stats, &case_env)?;
            case.completes_normally = tree_info::stats_complete_normally(&case.stats);
        }
        sw.has_unconditional_pattern = has_unconditional;

        let all_constants = match enum_class {
            Some(ec) => {
                let constants = self.enum_constants(ec);
                !constants.is_empty() && constants.iter().all(|c| covered.contains(c))
            }
            None => false,
        };
        let exhaustive = seen_default || has_unconditional || all_constants;
        if (is_expression || sw.pattern_switch) && !exhaustive && !erroneous {
            self.log.error(DiagKind::NotExhaustive, sw.span, vec![]);
        }
        if is_expression {
            let last = sw.cases.len().saturating_sub(1);
            for (i, case) in sw.cases.iter().enumerate() {
                let falls_out = match case.kind {
                    CaseKind::Rule => case.completes_normally,
                    CaseKind::Statement => i == last && case.completes_normally,
                };
                if falls_out {
                    self.log.error(DiagKind::NoSwitchExpressionYield, case.span, vec![]);
                }
            }
        }
        Ok(())
    }

    fn enum_constants(&self, ec: SymbolId) -> Vec<SymbolId> {
        let Some(members) = self.symtab.sym(ec).members() else {
            return Vec::new();
        };
        self.symtab
            .scope(members)
            .symbols()
            .iter()
            .copied()
            .filter(|s| {
                let sym = self.symtab.sym(*s);
                sym.is_var() && sym.flags.contains(Flags::ENUM)
            })
            .collect()
    }

    /// An enum switch label names the constant without qualification
    fn attrib_enum_label(&mut self, expr: &mut Expr, ec: SymbolId, sel: &Type) -> Option<SymbolId> {
        let name = match &expr.kind {
            ExprKind::Ident(id) => id.name.clone(),
            ExprKind::Select(s) => s.name.clone(),
            _ => {
                self.log.error(DiagKind::ConstExprReq, expr.span, vec![]);
                expr.ty = Some(Type::Error);
                return None;
            }
        };
        let found = self.symtab.members_named(ec, &name).into_iter().find(|m| {
            let sym = self.symtab.sym(*m);
            sym.is_var() && sym.flags.contains(Flags::ENUM)
        });
        match found {
            Some(c) => {
                match &mut expr.kind {
                    ExprKind::Ident(id) => id.sym = Some(c),
                    ExprKind::Select(s) => s.sym = Some(c),
                    _ => {}
                }
                expr.ty = Some(sel.clone());
                Some(c)
            }
            None => {
                self.log.error(
                    DiagKind::CantResolveLocation,
                    expr.span,
                    vec!["variable".into(), name.into(), ec.into()],
                );
                expr.ty = Some(Type::Error);
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn attrib_constant_label(
        &mut self,
        expr: &mut Expr,
        env: &Env,
        sel: &Type,
        sel_unboxed: &Type,
        constant_switch: bool,
        seen: &mut Vec<Literal>,
    ) -> Result<()> {
        let expected = if constant_switch {
            if sel_unboxed.is_primitive() {
                sel_unboxed.clone()
            } else {
                sel.clone()
            }
        } else {
            Type::None
        };
        let found = self.attrib_expr(expr, env, &ResultInfo::value(expected.clone()))?;
        if self.types().is_erroneous(&found) || self.types().is_erroneous(sel) {
            return Ok(());
        }
        if !constant_switch {
            self.log.error(
                DiagKind::IncompatibleTypes,
                expr.span,
                vec![found.into(), sel.clone().into()],
            );
            return Ok(());
        }
        let value = expr
            .constant
            .as_ref()
            .and_then(|k| coerce_constant(&self.types(), k, &expected));
        match value {
            None => self.log.error(DiagKind::ConstExprReq, expr.span, vec![]),
            Some(v) if seen.contains(&v) => self.log.error(DiagKind::DuplicateCaseLabel, expr.span, vec![]),
            Some(v) => seen.push(v),
        }
        Ok(())
    }

    // ---- classes ----

    /// Attribute the bodies of a class and its nested classes
    pub fn attrib_class(&mut self, tree: &mut ClassDecl) -> Result<()> {
        let Some(c) = tree.sym else {
            return Ok(());
        };
        if self.symtab.sym(c).is_erroneous() {
            return Ok(());
        }
        self.complete(c)?;
        let Some(env) = self.symtab.sym(c).class_details().and_then(|d| d.env.clone()) else {
            return Ok(());
        };
        debug!("ATTR: attributing {}", self.symtab.flat_name(c));
        let mut class_env = env;
        class_env.info.lint = self.lint_for(&class_env.info.lint, c);
        for member in tree.members.iter_mut() {
            match member {
                ClassMember::Field(var) => self.attrib_field(c, var, &class_env)?,
                ClassMember::Method(m) => self.attrib_method(c, m, &class_env)?,
                ClassMember::Class(inner) => self.attrib_class(inner)?,
                ClassMember::Initializer(init) => {
                    let mut init_env = class_env.dup(EnvKind::Block);
                    if init.is_static {
                        init_env.info.static_level += 1;
                    }
                    init_env.info.return_result = None;
                    self.attrib_block(&mut init.body, &init_env)?;
                }
                ClassMember::EnumConstant(ec) => self.attrib_enum_constant(c, ec, &class_env)?,
            }
        }
        Ok(())
    }

    fn member_at(&self, c: SymbolId, pos: Pos) -> Option<SymbolId> {
        self.symtab
            .sym(c)
            .class_details()
            .and_then(|d| d.decl_index.get(&pos).copied())
    }

    fn attrib_field(&mut self, c: SymbolId, var: &mut VarDecl, class_env: &Env) -> Result<()> {
        let Some(v) = self.member_at(c, var.span.pos()) else {
            return Ok(());
        };
        var.sym = Some(v);
        let ty = self.symtab.sym(v).ty.clone();
        if let Some(te) = var.var_type.as_mut() {
            te.ty = Some(ty.clone());
        }
        let Some(init) = var.init.as_mut() else {
            return Ok(());
        };
        let mut field_env = class_env.dup(EnvKind::Block);
        if self.symtab.sym(v).is_static() {
            field_env.info.static_level += 1;
        }
        field_env.info.return_result = None;
        field_env.info.lint = self.lint_for(&field_env.info.lint, v);
        trace!("ATTR: field {}", var.name);
        self.attrib_expr(init, &field_env, &ResultInfo::value(ty.clone()))?;
        let pending = matches!(
            self.symtab.sym(v).details,
            SymbolDetails::Var {
                const_value: ConstValue::Pending { .. }
            }
        );
        if pending {
            let value = init.constant.as_ref().and_then(|k| coerce_constant(&self.types(), k, &ty));
            self.set_const_value(v, value.map(ConstValue::Value).unwrap_or_default());
        }
        Ok(())
    }

    fn attrib_method(&mut self, c: SymbolId, method: &mut MethodDecl, class_env: &Env) -> Result<()> {
        let Some(m) = self.member_at(c, method.span.pos()) else {
            return Ok(());
        };
        method.sym = Some(m);
        let msym = self.symtab.sym(m);
        let ret = msym
            .ty
            .method_type()
            .map(|mt| (*mt.ret).clone())
            .unwrap_or(Type::Void);
        let is_static = msym.is_static();
        let (params, tvars) = msym
            .method_details()
            .map(|d| (d.params.clone(), d.type_params.clone()))
            .unwrap_or_default();

        let scope = self.symtab.new_scope(m, Some(class_env.info.scope));
        for (tp, tv) in method.type_params.iter_mut().zip(&tvars) {
            tp.sym = Some(*tv);
            self.symtab.enter(scope, *tv);
        }
        for (param, p) in method.params.iter_mut().zip(&params) {
            param.sym = Some(*p);
            let pty = self.symtab.sym(*p).ty.clone();
            if let Some(te) = param.var_type.as_mut() {
                let declared = if param.is_varargs {
                    self.types().elem_type(&pty).unwrap_or(pty)
                } else {
                    pty
                };
                te.ty = Some(declared);
            }
            self.symtab.enter(scope, *p);
        }
        if let Some(rt) = method.return_type.as_mut() {
            rt.ty = Some(ret.clone());
        }
        let mut method_env = class_env.dup_with_scope(EnvKind::Method, scope);
        method_env.enclosing_method = Some(m);
        if is_static {
            method_env.info.static_level += 1;
        }
        method_env.info.return_result = Some(ResultInfo::value(ret));
        method_env.info.yield_result = None;
        method_env.info.lint = self.lint_for(&method_env.info.lint, m);
        if let Some(body) = method.body.as_mut() {
            trace!("ATTR: method {}", method.name);
            self.attrib_block(body, &method_env)?;
        }
        Ok(())
    }

    fn attrib_enum_constant(&mut self, c: SymbolId, ec: &mut EnumConstant, class_env: &Env) -> Result<()> {
        let Some(v) = self.member_at(c, ec.span.pos()) else {
            return Ok(());
        };
        ec.sym = Some(v);
        let mut const_env = class_env.dup(EnvKind::Block);
        const_env.info.static_level += 1;
        const_env.info.return_result = None;
        let argtypes = self.attrib_args(&mut ec.args, &const_env)?;
        let site = self.symtab.sym(c).ty.clone();
        let candidates: Vec<MethodCandidate> = self.find_constructors(&site)?;
        if candidates.is_empty() {
            return Ok(());
        }
        match self.select_method(&const_env, &candidates, "<init>", &argtypes, &[], ec.span)? {
            MethodResolution::Found(app) => {
                let (_, formals) = self.instantiate_result(&app, &ResultInfo::unknown());
                self.commit_args(&mut ec.args, &formals, &const_env)?;
            }
            MethodResolution::Inapplicable { diag, .. } => {
                self.log.report(diag);
                self.commit_erroneous_args(&mut ec.args, &const_env)?;
            }
            MethodResolution::NotFound => self.commit_erroneous_args(&mut ec.args, &const_env)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_constants_narrow_when_in_range() {
        assert!(fits_in(127, TypeTag::Byte));
        assert!(!fits_in(128, TypeTag::Byte));
        assert!(fits_in(65535, TypeTag::Char));
        assert!(!fits_in(-1, TypeTag::Char));
        assert!(fits_in(-32768, TypeTag::Short));
        assert!(!fits_in(1, TypeTag::Int));
    }

    #[test]
    fn only_lvalues_are_variables() {
        let ident = Expr::new(
            ExprKind::Ident(IdentExpr {
                name: "x".into(),
                sym: None,
            }),
            Span::default(),
        );
        assert!(is_variable(&ident));
        let parens = Expr::new(ExprKind::Parens(Box::new(ident)), Span::default());
        assert!(is_variable(&parens));
        assert!(!is_variable(&Expr::new(ExprKind::Literal(Literal::Int(1)), Span::default())));
    }
}
