//! TransPatterns - lowering of pattern matching
//!
//! Corresponds to JavaC's `com.sun.tools.javac.comp.TransPatterns`. Runs on
//! fully attributed trees and rewrites
//!
//! - `e instanceof T x` into a plain type test followed by a cast that
//!   assigns the binding variable inside a let expression yielding `true`;
//! - pattern `switch` statements and expressions into an `int` switch over
//!   a type-switch bootstrap call, restarted with a higher index when a
//!   guard fails.
//!
//! Binding variables are declared at the closest enclosing statement: in
//! front of it when attribution let them escape into the enclosing block,
//! otherwise in a block wrapped around the statement. Variable
//! initialisers and lambda bodies fence the declarations off, wrapping
//! them in a let expression instead.

use log::{debug, trace};

use super::SemanticAnalyzer;
use crate::ast::{
    tree_info, walk_expr_mut, walk_pattern, walk_stmt_mut, walk_var_mut, Block, Bootstrap, CaseKind, CaseLabel,
    ClassDecl, ClassMember, ContinueStmt, Expr, ExprKind, ExprStmt, InstanceOfExpr, InstanceOfTarget, LambdaBody,
    Literal, LoadableConstant, NewClassExpr, Pattern, Stmt, Switch, TreeMaker, TreeScanner, TreeVisitorMut, TypeExpr,
    VarDecl,
};
use crate::common::const_fold::int_value;
use crate::common::flags::Flags;
use crate::common::symbol::SymbolId;
use crate::common::symtab::Symtab;
use crate::common::types::{Type, TypeTag, Types};

/// Binding variables declared in a guard
struct GuardBindings(Vec<SymbolId>);

impl TreeScanner for GuardBindings {
    fn visit_pattern(&mut self, pattern: &Pattern) {
        if let Some(sym) = pattern.binding().sym {
            self.0.push(sym);
        }
        walk_pattern(self, pattern)
    }
}

pub struct TransPatterns<'a> {
    symtab: &'a mut Symtab,
    /// Hoisted binding declarations, one frame per statement or fence
    binding_contexts: Vec<Vec<VarDecl>>,
    /// Method or class owning the synthetic variables
    owner: Option<SymbolId>,
}

impl<'a> TransPatterns<'a> {
    pub fn new(symtab: &'a mut Symtab) -> Self {
        Self {
            symtab,
            binding_contexts: Vec::new(),
            owner: None,
        }
    }

    pub fn translate_class(&mut self, class: &mut ClassDecl) {
        self.visit_class_mut(class);
    }

    fn owner(&self) -> SymbolId {
        self.owner.unwrap_or(self.symtab.root_package)
    }

    fn type_name(&self, ty: &Type) -> String {
        Types::new(self.symtab).to_string(ty)
    }

    fn type_tree(&self, make: &TreeMaker, ty: &Type) -> TypeExpr {
        make.type_of(ty.clone(), &self.type_name(ty))
    }

    fn synthetic_var(&mut self, make: &TreeMaker, name: &str, ty: &Type, init: Expr) -> (VarDecl, Expr) {
        let owner = self.owner();
        let sym = self.symtab.new_var(owner, name, Flags::SYNTHETIC, ty.clone());
        let mut decl = make.var(self.type_tree(make, ty), name);
        decl.init = Some(init);
        decl.sym = Some(sym);
        (decl, make.ident_sym(name, sym, ty.clone()))
    }

    /// Translate a statement list, declaring hoisted bindings around the
    /// statement that introduced them
    fn translate_stats(&mut self, stats: &mut Vec<Stmt>) {
        let old = std::mem::take(stats);
        for mut stmt in old {
            self.binding_contexts.push(Vec::new());
            self.visit_stmt_mut(&mut stmt);
            let hoisted = self.binding_contexts.pop().unwrap_or_default();
            if hoisted.is_empty() {
                stats.push(stmt);
                continue;
            }
            let (outer, inner): (Vec<VarDecl>, Vec<VarDecl>) = hoisted.into_iter().partition(|v| {
                v.sym
                    .map(|s| self.symtab.sym(s).flags.contains(Flags::MATCH_BINDING_TO_OUTER))
                    .unwrap_or(false)
            });
            stats.extend(outer.into_iter().map(Stmt::LocalVar));
            if inner.is_empty() {
                stats.push(stmt);
            } else {
                let span = stmt.span();
                let mut statements: Vec<Stmt> = inner.into_iter().map(Stmt::LocalVar).collect();
                statements.push(stmt);
                stats.push(Stmt::Block(Block { statements, span }));
            }
        }
    }

    /// Run `f` with a fresh binding context and wrap `expr` in a let
    /// declaring whatever it hoisted
    fn fenced(&mut self, expr: &mut Expr, f: impl FnOnce(&mut Self, &mut Expr)) {
        self.binding_contexts.push(Vec::new());
        f(self, expr);
        let hoisted = self.binding_contexts.pop().unwrap_or_default();
        if hoisted.is_empty() {
            return;
        }
        let make = TreeMaker::at(expr.pos());
        let inner = std::mem::take(expr);
        let ty = inner.ty.clone();
        *expr = make.let_expr(hoisted.into_iter().map(Stmt::LocalVar).collect(), inner);
        expr.ty = ty;
    }

    /// Statement assigning `value` to binding `var`; the declaration goes
    /// to the current binding context when there is one
    fn bind(&mut self, make: &TreeMaker, var: &VarDecl, sym: SymbolId, value: Expr) -> Stmt {
        let ty = self.symtab.sym(sym).ty.clone();
        let mut decl = make.var(self.type_tree(make, &ty), &var.name);
        decl.sym = Some(sym);
        match self.binding_contexts.last_mut() {
            Some(context) => {
                context.push(decl);
                let target = make.ident_sym(&var.name, sym, ty.clone());
                let mut assign = make.assign(target, value);
                assign.ty = Some(ty);
                Stmt::Expr(ExprStmt {
                    expr: assign,
                    span: make.span(),
                })
            }
            None => {
                decl.init = Some(value);
                Stmt::LocalVar(decl)
            }
        }
    }

    fn cast(&self, make: &TreeMaker, ty: &Type, value: Expr) -> Expr {
        let mut cast = make.cast(self.type_tree(make, ty), value);
        cast.ty = Some(ty.clone());
        cast
    }

    /// `e instanceof T x` to `(let E tmp = e; in tmp instanceof T && (let x = (T)tmp; in true))`
    fn lower_instance_of(&mut self, expr: &mut Expr) {
        let ExprKind::InstanceOf(InstanceOfExpr {
            expr: tested,
            target: InstanceOfTarget::Pattern(pattern),
        }) = &mut expr.kind
        else {
            return;
        };
        let var = pattern.binding().clone();
        let Some(binding) = var.sym else {
            return;
        };
        let pos = expr.span.pos();
        let make = TreeMaker::at(pos);
        let tested = std::mem::take(tested.as_mut());
        let pattern_ty = pattern.ty.clone().unwrap_or_else(|| self.symtab.sym(binding).ty.clone());
        let (tested_ty, principal) = {
            let types = Types::new(self.symtab);
            (
                types.erasure(&types.boxed_type_or_type(&tested.ty())),
                types.erasure(&pattern_ty),
            )
        };
        trace!("TRANS: instanceof pattern binding {} at {}", var.name, pos);

        let reuse = match &tested.kind {
            ExprKind::Ident(id) => id
                .sym
                .map(|s| self.symtab.sym(s).is_var() && self.symtab.is_local(s))
                .unwrap_or(false),
            _ => false,
        };
        let (temp, temp_decl) = if reuse {
            (tested, None)
        } else {
            let name = format!("e{}$temp", pos);
            let (decl, temp) = self.synthetic_var(&make, &name, &tested_ty, tested);
            (temp, Some(decl))
        };

        let mut test = make.instance_of(temp.clone(), self.type_tree(&make, &principal));
        test.ty = Some(Type::Prim(TypeTag::Boolean));
        let value = self.cast(&make, &principal, temp);
        let assign = self.bind(&make, &var, binding, value);
        let mut yes = make.boolean(true);
        yes.ty = Some(Type::Prim(TypeTag::Boolean));
        let mut binder = make.let_expr(vec![assign], yes);
        binder.ty = Some(Type::Prim(TypeTag::Boolean));
        let mut result = make.and(test, binder);
        result.ty = Some(Type::Prim(TypeTag::Boolean));
        if let Some(decl) = temp_decl {
            result = make.let_expr(vec![Stmt::LocalVar(decl)], result);
            result.ty = Some(Type::Prim(TypeTag::Boolean));
        }
        *expr = result;
    }

    /// Rewrite a pattern switch in place; returns the declarations of the
    /// selector and restart index temporaries
    fn lower_switch(&mut self, sw: &mut Switch) -> Vec<Stmt> {
        self.visit_expr_mut(&mut sw.selector);
        let pos = sw.span.pos();
        let make = TreeMaker::at(pos);
        let selector = std::mem::take(sw.selector.as_mut());
        let (sel_ty, is_enum) = {
            let types = Types::new(self.symtab);
            let raw = selector.ty();
            let is_enum = raw.class_sym().map(|c| self.symtab.sym(c).is_enum()).unwrap_or(false);
            (types.erasure(&types.boxed_type_or_type(&raw)), is_enum)
        };
        debug!("TRANS: lowering pattern switch at {} over {}", pos, self.type_name(&sel_ty));

        let (sel_decl, sel_ref) = self.synthetic_var(&make, &format!("selector{}$temp", pos), &sel_ty, selector);
        let int_type = Type::Prim(TypeTag::Int);
        let mut zero = make.int(0);
        zero.ty = Some(int_type.clone());
        let (index_decl, index_ref) = self.synthetic_var(&make, &format!("index${}", pos), &int_type, zero);

        let has_null = sw.cases.iter().any(|c| {
            c.labels
                .iter()
                .any(|l| matches!(l, CaseLabel::Constant(e) if tree_info::is_null(e)))
        });
        let mut null_routed = has_null;
        let mut static_args: Vec<LoadableConstant> = Vec::new();
        let mut has_default = false;

        for case in sw.cases.iter_mut() {
            let mut labels = Vec::with_capacity(case.labels.len());
            let mut prologue = Vec::new();
            let mut last_index = None;
            let mut unconditional = false;
            for label in std::mem::take(&mut case.labels) {
                match label {
                    CaseLabel::Default(span) => {
                        has_default = true;
                        labels.push(CaseLabel::Default(span));
                    }
                    CaseLabel::Constant(e) if tree_info::is_null(&e) => {
                        labels.push(CaseLabel::Constant(int_label(&make, -1)));
                    }
                    CaseLabel::Constant(e) => {
                        static_args.push(constant_label(&e, is_enum));
                        let index = static_args.len() as i32 - 1;
                        last_index = Some(index);
                        labels.push(CaseLabel::Constant(int_label(&make, index)));
                    }
                    CaseLabel::Pattern(p) => {
                        let pattern_ty = p.ty.clone().unwrap_or(Type::Error);
                        let (label_ty, covers) = {
                            let types = Types::new(self.symtab);
                            let principal = types.erasure(&types.boxed_type_or_type(&pattern_ty));
                            if types.is_subtype(&sel_ty, &principal) {
                                (sel_ty.clone(), true)
                            } else {
                                (principal, false)
                            }
                        };
                        unconditional |= covers;
                        static_args.push(LoadableConstant::Class(label_ty));
                        let index = static_args.len() as i32 - 1;
                        last_index = Some(index);
                        labels.push(CaseLabel::Constant(int_label(&make, index)));
                        let var = p.binding();
                        if let Some(binding) = var.sym {
                            let ty = self.symtab.sym(binding).ty.clone();
                            let value = self.cast(&make, &ty, sel_ref.clone());
                            let mut decl = make.var(self.type_tree(&make, &ty), &var.name);
                            decl.init = Some(value);
                            decl.sym = Some(binding);
                            prologue.push(Stmt::LocalVar(decl));
                        }
                    }
                }
            }
            if unconditional && case.guard.is_none() && sw.has_unconditional_pattern && !null_routed {
                labels.push(CaseLabel::Constant(int_label(&make, -1)));
                null_routed = true;
            }
            if let Some(guard) = case.guard.take() {
                let mut bindings = GuardBindings(Vec::new());
                bindings.visit_expr(&guard);
                for b in bindings.0 {
                    self.symtab.sym_mut(b).flags.insert(Flags::MATCH_BINDING_TO_OUTER);
                }
                let restart = last_index.map(|i| i + 1).unwrap_or(0);
                prologue.push(self.guard_check(&make, guard, &index_ref, restart, pos));
            }
            case.labels = labels;
            prologue.append(&mut case.stats);
            case.stats = prologue;
            self.translate_stats(&mut case.stats);
        }

        let kind = sw.cases.first().map(|c| c.kind).unwrap_or(CaseKind::Statement);
        if !null_routed {
            // a null selector is only matched by `case null` or an unconditional pattern
            let throw = make.throw(self.null_pointer_exception(&make));
            let label = CaseLabel::Constant(int_label(&make, -1));
            sw.cases.push(make.case(vec![label], None, vec![throw], kind));
        }
        if !has_default {
            let throw = make.throw(self.match_exception(&make));
            sw.cases.push(make.case(vec![CaseLabel::Default(make.span())], None, vec![throw], kind));
        }

        let bootstrap = if is_enum { Bootstrap::EnumSwitch } else { Bootstrap::TypeSwitch };
        let mut dispatch = make.indy(bootstrap, static_args, vec![sel_ref, index_ref]);
        dispatch.ty = Some(int_type);
        *sw.selector = dispatch;
        sw.pattern_switch = false;
        vec![Stmt::LocalVar(sel_decl), Stmt::LocalVar(index_decl)]
    }

    /// `if (!(guard)) { index = restart; continue <switch>; }`
    fn guard_check(&self, make: &TreeMaker, guard: Expr, index: &Expr, restart: i32, pos: usize) -> Stmt {
        let mut set_index = make.assign(index.clone(), int_label(make, restart));
        set_index.ty = Some(Type::Prim(TypeTag::Int));
        let again = Stmt::Continue(ContinueStmt {
            label: None,
            restart_switch: Some(pos),
            span: make.span(),
        });
        let body = make.block_stmt(vec![make.exec(set_index), again]);
        let mut failed = make.not(make.parens(guard));
        failed.ty = Some(Type::Prim(TypeTag::Boolean));
        make.if_stmt(failed, body, None)
    }

    /// `new MatchException(null, null)`
    fn match_exception(&self, make: &TreeMaker) -> Expr {
        self.new_exception(make, self.symtab.predef.match_exception, vec![make.null(), make.null()])
    }

    /// `new NullPointerException()`
    fn null_pointer_exception(&self, make: &TreeMaker) -> Expr {
        self.new_exception(make, self.symtab.predef.null_pointer_exception, Vec::new())
    }

    fn new_exception(&self, make: &TreeMaker, class: SymbolId, args: Vec<Expr>) -> Expr {
        let ty = Type::class(class);
        let ctor = self
            .symtab
            .members_named(class, "<init>")
            .into_iter()
            .find(|c| self.symtab.method_params(*c).len() == args.len());
        let mut expr = Expr::new(
            ExprKind::NewClass(NewClassExpr {
                outer: None,
                class_type: self.type_tree(make, &ty),
                diamond: false,
                args,
                body: None,
                ctor,
            }),
            make.span(),
        );
        expr.ty = Some(ty);
        expr
    }
}

fn int_label(make: &TreeMaker, value: i32) -> Expr {
    let mut e = make.int(value);
    e.ty = Some(Type::Prim(TypeTag::Int));
    e.constant = Some(Literal::Int(value));
    e
}

/// Bootstrap argument for a constant case label
fn constant_label(label: &Expr, is_enum: bool) -> LoadableConstant {
    if is_enum {
        if let Some(name) = tree_info::name(label) {
            return LoadableConstant::String(name.to_string());
        }
    }
    match &label.constant {
        Some(Literal::String(s)) => LoadableConstant::String(s.clone()),
        Some(lit) => match int_value(lit) {
            Some(v) => LoadableConstant::Int(v),
            None => LoadableConstant::String(format!("{:?}", lit)),
        },
        None => LoadableConstant::Class(label.ty()),
    }
}

impl TreeVisitorMut for TransPatterns<'_> {
    fn visit_class_mut(&mut self, class: &mut ClassDecl) {
        let saved_owner = self.owner;
        let saved_contexts = std::mem::take(&mut self.binding_contexts);
        if class.sym.is_some() {
            self.owner = class.sym;
        }
        for member in class.members.iter_mut() {
            match member {
                ClassMember::Field(f) => self.visit_var_mut(f),
                ClassMember::Method(m) => {
                    let class_owner = self.owner;
                    if m.sym.is_some() {
                        self.owner = m.sym;
                    }
                    if let Some(body) = m.body.as_mut() {
                        self.visit_block_mut(body);
                    }
                    self.owner = class_owner;
                }
                ClassMember::Class(c) => self.visit_class_mut(c),
                ClassMember::Initializer(init) => self.visit_block_mut(&mut init.body),
                ClassMember::EnumConstant(ec) => {
                    for arg in ec.args.iter_mut() {
                        self.fenced(arg, |tp, e| tp.visit_expr_mut(e));
                    }
                }
            }
        }
        self.binding_contexts = saved_contexts;
        self.owner = saved_owner;
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        self.translate_stats(&mut block.statements);
    }

    fn visit_var_mut(&mut self, var: &mut VarDecl) {
        if let Some(init) = var.init.as_mut() {
            self.fenced(init, |tp, e| tp.visit_expr_mut(e));
        } else {
            walk_var_mut(self, var);
        }
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Switch(sw) = stmt {
            if sw.pattern_switch {
                let span = sw.span;
                let mut statements = self.lower_switch(sw);
                let lowered = std::mem::replace(stmt, Stmt::Empty(span));
                statements.push(lowered);
                *stmt = Stmt::Block(Block { statements, span });
                return;
            }
        }
        walk_stmt_mut(self, stmt)
    }

    fn visit_switch_mut(&mut self, switch: &mut Switch) {
        self.visit_expr_mut(&mut switch.selector);
        for case in switch.cases.iter_mut() {
            for label in case.labels.iter_mut() {
                if let CaseLabel::Constant(e) = label {
                    self.visit_expr_mut(e);
                }
            }
            self.translate_stats(&mut case.stats);
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Lambda(lambda) => match &mut lambda.body {
                LambdaBody::Expr(body) => self.fenced(body, |tp, e| tp.visit_expr_mut(e)),
                LambdaBody::Block(block) => {
                    let saved = std::mem::take(&mut self.binding_contexts);
                    self.visit_block_mut(block);
                    self.binding_contexts = saved;
                }
            },
            ExprKind::Switch(sw) if sw.pattern_switch => {
                let defs = self.lower_switch(sw);
                let make = TreeMaker::at(expr.pos());
                let inner = std::mem::take(expr);
                let ty = inner.ty.clone();
                *expr = make.let_expr(defs, inner);
                expr.ty = ty;
            }
            ExprKind::Switch(sw) => self.visit_switch_mut(sw),
            ExprKind::InstanceOf(io) if matches!(io.target, InstanceOfTarget::Pattern(_)) => {
                walk_expr_mut(self, expr);
                self.lower_instance_of(expr);
            }
            _ => walk_expr_mut(self, expr),
        }
    }
}

impl SemanticAnalyzer {
    /// Lower the pattern matching constructs of an attributed class
    pub fn lower_patterns(&mut self, class: &mut ClassDecl) {
        debug!("TRANS: {}", class.name);
        TransPatterns::new(&mut self.symtab).translate_class(class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_labels_pass_their_names() {
        let make = TreeMaker::new();
        let label = make.ident("RED");
        assert!(matches!(constant_label(&label, true), LoadableConstant::String(s) if s == "RED"));
    }

    #[test]
    fn integral_labels_pass_ints() {
        let make = TreeMaker::new();
        let mut label = make.char_lit('a');
        label.constant = Some(Literal::Char('a' as u16));
        assert!(matches!(constant_label(&label, false), LoadableConstant::Int(97)));
        let mut label = make.string("x");
        label.constant = Some(Literal::String("x".into()));
        assert!(matches!(constant_label(&label, false), LoadableConstant::String(s) if s == "x"));
    }
}
