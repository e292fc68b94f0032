//! Tree construction helpers
//!
//! Desugaring uses a maker fixed at one position (`TreeMaker::at`), so every
//! synthesized node points back at the construct it replaces. Callers that
//! build trees from scratch (embedders without a parser, tests) use
//! `TreeMaker::new`, which hands out a fresh position per node; positions
//! are node identities for the caches keyed by them.
//!
//! Methods take `&self` so calls nest freely.

use std::cell::Cell;

use super::*;
use crate::common::symbol::SymbolId;
use crate::common::types::{BoundKind, Type, TypeTag};

pub struct TreeMaker {
    pos: Cell<Pos>,
    auto: bool,
}

impl Default for TreeMaker {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeMaker {
    /// Maker assigning increasing positions starting at 1
    pub fn new() -> Self {
        Self {
            pos: Cell::new(1),
            auto: true,
        }
    }

    /// Maker placing every node at `pos`
    pub fn at(pos: Pos) -> Self {
        Self {
            pos: Cell::new(pos),
            auto: false,
        }
    }

    pub fn span(&self) -> Span {
        let pos = self.pos.get();
        if self.auto {
            self.pos.set(pos + 1);
        }
        Span::at(pos)
    }

    /// Position the next node will get
    pub fn peek_pos(&self) -> Pos {
        self.pos.get()
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(kind, self.span())
    }

    // ---- literals and names ----

    pub fn literal(&self, lit: Literal) -> Expr {
        self.expr(ExprKind::Literal(lit))
    }

    pub fn int(&self, v: i32) -> Expr {
        self.literal(Literal::Int(v))
    }

    pub fn long(&self, v: i64) -> Expr {
        self.literal(Literal::Long(v))
    }

    pub fn double(&self, v: f64) -> Expr {
        self.literal(Literal::Double(v))
    }

    pub fn boolean(&self, v: bool) -> Expr {
        self.literal(Literal::Boolean(v))
    }

    pub fn string(&self, v: &str) -> Expr {
        self.literal(Literal::String(v.to_string()))
    }

    pub fn char_lit(&self, c: char) -> Expr {
        self.literal(Literal::Char(c as u16))
    }

    pub fn null(&self) -> Expr {
        self.literal(Literal::Null)
    }

    pub fn ident(&self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(IdentExpr {
            name: name.to_string(),
            sym: None,
        }))
    }

    /// Identifier already bound to a symbol
    pub fn ident_sym(&self, name: &str, sym: SymbolId, ty: Type) -> Expr {
        let mut e = self.expr(ExprKind::Ident(IdentExpr {
            name: name.to_string(),
            sym: Some(sym),
        }));
        e.ty = Some(ty);
        e
    }

    /// `a.b.c` as nested selects
    pub fn qualified(&self, dotted: &str) -> Expr {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        parts.fold(self.ident(first), |acc, name| self.select(acc, name))
    }

    pub fn select(&self, target: Expr, name: &str) -> Expr {
        self.expr(ExprKind::Select(SelectExpr {
            target: Box::new(target),
            name: name.to_string(),
            sym: None,
        }))
    }

    pub fn this(&self) -> Expr {
        self.expr(ExprKind::This)
    }

    // ---- operators ----

    pub fn parens(&self, e: Expr) -> Expr {
        self.expr(ExprKind::Parens(Box::new(e)))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            operator: None,
        }))
    }

    pub fn not(&self, operand: Expr) -> Expr {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn binary(&self, left: Expr, op: BinaryOp, right: Expr) -> Expr {
        self.expr(ExprKind::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            operator: None,
        }))
    }

    pub fn and(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::And, right)
    }

    pub fn or(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Or, right)
    }

    pub fn assign(&self, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign(AssignExpr {
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    pub fn compound_assign(&self, target: Expr, op: BinaryOp, value: Expr) -> Expr {
        self.expr(ExprKind::CompoundAssign(CompoundAssignExpr {
            target: Box::new(target),
            op,
            value: Box::new(value),
            operator: None,
        }))
    }

    pub fn conditional(&self, cond: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
        self.expr(ExprKind::Conditional(ConditionalExpr {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }))
    }

    pub fn instance_of(&self, expr: Expr, ty: TypeExpr) -> Expr {
        self.expr(ExprKind::InstanceOf(InstanceOfExpr {
            expr: Box::new(expr),
            target: InstanceOfTarget::Type(ty),
        }))
    }

    /// `expr instanceof T name`
    pub fn instance_of_binding(&self, expr: Expr, ty: TypeExpr, name: &str) -> Expr {
        let pattern = self.binding_pattern(ty, name);
        self.instance_of_pattern(expr, pattern)
    }

    pub fn instance_of_pattern(&self, expr: Expr, pattern: Pattern) -> Expr {
        self.expr(ExprKind::InstanceOf(InstanceOfExpr {
            expr: Box::new(expr),
            target: InstanceOfTarget::Pattern(Box::new(pattern)),
        }))
    }

    pub fn cast(&self, ty: TypeExpr, expr: Expr) -> Expr {
        self.expr(ExprKind::Cast(CastExpr {
            target_type: ty,
            expr: Box::new(expr),
        }))
    }

    // ---- invocations and creation ----

    pub fn call(&self, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Invoke(InvokeExpr {
            target: None,
            name: name.to_string(),
            type_args: Vec::new(),
            args,
            sym: None,
            varargs: false,
        }))
    }

    pub fn call_on(&self, target: Expr, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Invoke(InvokeExpr {
            target: Some(Box::new(target)),
            name: name.to_string(),
            type_args: Vec::new(),
            args,
            sym: None,
            varargs: false,
        }))
    }

    pub fn new_class(&self, class_type: TypeExpr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::NewClass(NewClassExpr {
            outer: None,
            class_type,
            diamond: false,
            args,
            body: None,
            ctor: None,
        }))
    }

    /// `new C<>(args)`
    pub fn new_diamond(&self, class_type: TypeExpr, args: Vec<Expr>) -> Expr {
        let mut e = self.new_class(class_type, args);
        if let ExprKind::NewClass(nc) = &mut e.kind {
            nc.diamond = true;
        }
        e
    }

    /// `new C(args) { members }`
    pub fn new_anonymous(&self, class_type: TypeExpr, args: Vec<Expr>, members: Vec<ClassMember>) -> Expr {
        let body = self.class_decl(ClassKind::Class, &[], "", members);
        let mut e = self.new_class(class_type, args);
        if let ExprKind::NewClass(nc) = &mut e.kind {
            nc.body = Some(Box::new(body));
        }
        e
    }

    pub fn new_array(&self, elem_type: TypeExpr, dims: Vec<Expr>) -> Expr {
        self.expr(ExprKind::NewArray(NewArrayExpr {
            elem_type: Some(elem_type),
            dims,
            init: None,
        }))
    }

    /// Bare array initializer `{a, b}`
    pub fn array_init(&self, items: Vec<Expr>) -> Expr {
        self.expr(ExprKind::NewArray(NewArrayExpr {
            elem_type: None,
            dims: Vec::new(),
            init: Some(items),
        }))
    }

    pub fn index(&self, array: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index(IndexExpr {
            array: Box::new(array),
            index: Box::new(index),
        }))
    }

    pub fn class_lit(&self, ty: TypeExpr) -> Expr {
        self.expr(ExprKind::ClassLit(ty))
    }

    /// Lambda with explicitly typed parameters and an expression body
    pub fn lambda(&self, params: Vec<VarDecl>, body: Expr) -> Expr {
        self.expr(ExprKind::Lambda(LambdaExpr {
            params,
            param_kind: LambdaParamKind::Explicit,
            body: LambdaBody::Expr(Box::new(body)),
        }))
    }

    pub fn lambda_block(&self, params: Vec<VarDecl>, body: Vec<Stmt>) -> Expr {
        let block = self.block(body);
        self.expr(ExprKind::Lambda(LambdaExpr {
            params,
            param_kind: LambdaParamKind::Explicit,
            body: LambdaBody::Block(block),
        }))
    }

    /// Lambda whose parameter types are inferred, `x -> body`
    pub fn lambda_implicit(&self, names: &[&str], body: Expr) -> Expr {
        let params = names.iter().map(|n| self.implicit_param(n)).collect();
        self.expr(ExprKind::Lambda(LambdaExpr {
            params,
            param_kind: LambdaParamKind::Implicit,
            body: LambdaBody::Expr(Box::new(body)),
        }))
    }

    pub fn lambda_implicit_block(&self, names: &[&str], body: Vec<Stmt>) -> Expr {
        let params = names.iter().map(|n| self.implicit_param(n)).collect();
        let block = self.block(body);
        self.expr(ExprKind::Lambda(LambdaExpr {
            params,
            param_kind: LambdaParamKind::Implicit,
            body: LambdaBody::Block(block),
        }))
    }

    fn implicit_param(&self, name: &str) -> VarDecl {
        VarDecl {
            modifiers: Vec::new(),
            annotations: Vec::new(),
            var_type: None,
            name: name.to_string(),
            init: None,
            is_varargs: false,
            span: self.span(),
            sym: None,
        }
    }

    pub fn switch_expr(&self, selector: Expr, cases: Vec<Case>) -> Expr {
        let switch = self.switch(selector, cases);
        self.expr(ExprKind::Switch(switch))
    }

    pub fn let_expr(&self, defs: Vec<Stmt>, expr: Expr) -> Expr {
        self.expr(ExprKind::Let(LetExpr {
            defs,
            expr: Box::new(expr),
        }))
    }

    pub fn indy(&self, bootstrap: Bootstrap, static_args: Vec<LoadableConstant>, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Indy(IndyCall {
            bootstrap,
            static_args,
            args,
        }))
    }

    pub fn erroneous(&self, exprs: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Erroneous(ErroneousExpr {
            exprs,
            synthetic: false,
        }))
    }

    // ---- types ----

    pub fn prim(&self, tag: TypeTag) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Primitive(tag), self.span())
    }

    pub fn int_type(&self) -> TypeExpr {
        self.prim(TypeTag::Int)
    }

    pub fn boolean_type(&self) -> TypeExpr {
        self.prim(TypeTag::Boolean)
    }

    pub fn void_type(&self) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Void, self.span())
    }

    pub fn var_type(&self) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Var, self.span())
    }

    pub fn named(&self, name: &str) -> TypeExpr {
        self.generic(name, Vec::new())
    }

    pub fn generic(&self, name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::new(
            TypeExprKind::Named {
                name: name.to_string(),
                args,
            },
            self.span(),
        )
    }

    pub fn array_type(&self, elem: TypeExpr) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Array(Box::new(elem)), self.span())
    }

    pub fn wildcard(&self, kind: BoundKind, bound: Option<TypeExpr>) -> TypeExpr {
        TypeExpr::new(
            TypeExprKind::Wildcard {
                kind,
                bound: bound.map(Box::new),
            },
            self.span(),
        )
    }

    pub fn annotated_type(&self, annotations: Vec<Annotation>, underlying: TypeExpr) -> TypeExpr {
        TypeExpr::new(
            TypeExprKind::Annotated {
                annotations,
                underlying: Box::new(underlying),
            },
            self.span(),
        )
    }

    /// Type tree for an already resolved type
    pub fn type_of(&self, ty: Type, name: &str) -> TypeExpr {
        TypeExpr::resolved(ty, name, self.span())
    }

    // ---- patterns and cases ----

    pub fn binding_pattern(&self, ty: TypeExpr, name: &str) -> Pattern {
        let var = self.var(ty, name);
        Pattern {
            kind: PatternKind::Binding(var),
            span: self.span(),
            ty: None,
        }
    }

    pub fn parenthesized_pattern(&self, inner: Pattern) -> Pattern {
        Pattern {
            kind: PatternKind::Parenthesized(Box::new(inner)),
            span: self.span(),
            ty: None,
        }
    }

    pub fn case(&self, labels: Vec<CaseLabel>, guard: Option<Expr>, stats: Vec<Stmt>, kind: CaseKind) -> Case {
        Case {
            labels,
            guard,
            stats,
            kind,
            completes_normally: true,
            span: self.span(),
        }
    }

    /// `case T name -> stats`, optionally guarded
    pub fn pattern_rule(&self, ty: TypeExpr, name: &str, guard: Option<Expr>, stats: Vec<Stmt>) -> Case {
        let label = CaseLabel::Pattern(self.binding_pattern(ty, name));
        self.case(vec![label], guard, stats, CaseKind::Rule)
    }

    pub fn constant_rule(&self, constants: Vec<Expr>, stats: Vec<Stmt>) -> Case {
        let labels = constants.into_iter().map(CaseLabel::Constant).collect();
        self.case(labels, None, stats, CaseKind::Rule)
    }

    pub fn default_rule(&self, stats: Vec<Stmt>) -> Case {
        let label = CaseLabel::Default(self.span());
        self.case(vec![label], None, stats, CaseKind::Rule)
    }

    pub fn constant_case(&self, constants: Vec<Expr>, stats: Vec<Stmt>) -> Case {
        let labels = constants.into_iter().map(CaseLabel::Constant).collect();
        self.case(labels, None, stats, CaseKind::Statement)
    }

    pub fn default_case(&self, stats: Vec<Stmt>) -> Case {
        let label = CaseLabel::Default(self.span());
        self.case(vec![label], None, stats, CaseKind::Statement)
    }

    pub fn switch(&self, selector: Expr, cases: Vec<Case>) -> Switch {
        Switch {
            selector: Box::new(selector),
            cases,
            pattern_switch: false,
            has_unconditional_pattern: false,
            span: self.span(),
        }
    }

    // ---- statements ----

    pub fn block(&self, statements: Vec<Stmt>) -> Block {
        Block {
            statements,
            span: self.span(),
        }
    }

    pub fn block_stmt(&self, statements: Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block(statements))
    }

    pub fn exec(&self, expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt { expr, span: self.span() })
    }

    pub fn local(&self, ty: TypeExpr, name: &str, init: Option<Expr>) -> Stmt {
        let mut var = self.var(ty, name);
        var.init = init;
        Stmt::LocalVar(var)
    }

    /// `var name = init;`
    pub fn local_var(&self, name: &str, init: Expr) -> Stmt {
        let ty = self.var_type();
        self.local(ty, name, Some(init))
    }

    pub fn if_stmt(&self, cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        Stmt::If(IfStmt {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            span: self.span(),
        })
    }

    pub fn while_stmt(&self, cond: Expr, body: Stmt) -> Stmt {
        Stmt::While(WhileStmt {
            cond,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn for_each(&self, var: VarDecl, iterable: Expr, body: Stmt) -> Stmt {
        Stmt::ForEach(ForEachStmt {
            var,
            iterable,
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn switch_stmt(&self, selector: Expr, cases: Vec<Case>) -> Stmt {
        Stmt::Switch(self.switch(selector, cases))
    }

    pub fn ret(&self, expr: Expr) -> Stmt {
        Stmt::Return(ReturnStmt {
            expr: Some(expr),
            span: self.span(),
        })
    }

    pub fn ret_void(&self) -> Stmt {
        Stmt::Return(ReturnStmt {
            expr: None,
            span: self.span(),
        })
    }

    pub fn yield_stmt(&self, value: Expr) -> Stmt {
        Stmt::Yield(YieldStmt { value, span: self.span() })
    }

    pub fn break_stmt(&self, label: Option<&str>) -> Stmt {
        Stmt::Break(BreakStmt {
            label: label.map(str::to_string),
            span: self.span(),
        })
    }

    pub fn continue_stmt(&self, label: Option<&str>) -> Stmt {
        Stmt::Continue(ContinueStmt {
            label: label.map(str::to_string),
            restart_switch: None,
            span: self.span(),
        })
    }

    pub fn throw(&self, expr: Expr) -> Stmt {
        Stmt::Throw(ThrowStmt { expr, span: self.span() })
    }

    pub fn labeled(&self, label: &str, body: Stmt) -> Stmt {
        Stmt::Labeled(LabeledStmt {
            label: label.to_string(),
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn local_class(&self, class: ClassDecl) -> Stmt {
        Stmt::LocalClass(class)
    }

    // ---- declarations ----

    pub fn var(&self, ty: TypeExpr, name: &str) -> VarDecl {
        VarDecl {
            modifiers: Vec::new(),
            annotations: Vec::new(),
            var_type: Some(ty),
            name: name.to_string(),
            init: None,
            is_varargs: false,
            span: self.span(),
            sym: None,
        }
    }

    pub fn param(&self, ty: TypeExpr, name: &str) -> VarDecl {
        self.var(ty, name)
    }

    pub fn field(&self, modifiers: &[Modifier], ty: TypeExpr, name: &str, init: Option<Expr>) -> ClassMember {
        let mut var = self.var(ty, name);
        var.modifiers = modifiers.to_vec();
        var.init = init;
        ClassMember::Field(var)
    }

    pub fn method_decl(
        &self,
        modifiers: &[Modifier],
        return_type: TypeExpr,
        name: &str,
        params: Vec<VarDecl>,
        body: Option<Vec<Stmt>>,
    ) -> MethodDecl {
        MethodDecl {
            modifiers: modifiers.to_vec(),
            annotations: Vec::new(),
            type_params: Vec::new(),
            return_type: Some(return_type),
            name: name.to_string(),
            params,
            throws: Vec::new(),
            body: body.map(|stmts| self.block(stmts)),
            default_value: None,
            span: self.span(),
            sym: None,
        }
    }

    pub fn method(
        &self,
        modifiers: &[Modifier],
        return_type: TypeExpr,
        name: &str,
        params: Vec<VarDecl>,
        body: Vec<Stmt>,
    ) -> ClassMember {
        ClassMember::Method(self.method_decl(modifiers, return_type, name, params, Some(body)))
    }

    pub fn abstract_method(&self, modifiers: &[Modifier], return_type: TypeExpr, name: &str, params: Vec<VarDecl>) -> ClassMember {
        ClassMember::Method(self.method_decl(modifiers, return_type, name, params, None))
    }

    pub fn constructor(&self, modifiers: &[Modifier], params: Vec<VarDecl>, body: Vec<Stmt>) -> ClassMember {
        let mut m = self.method_decl(modifiers, self.void_type(), "<init>", params, Some(body));
        m.return_type = None;
        ClassMember::Method(m)
    }

    /// Annotation type element `T name() [default value];`
    pub fn element(&self, return_type: TypeExpr, name: &str, default_value: Option<Expr>) -> ClassMember {
        let mut m = self.method_decl(&[], return_type, name, Vec::new(), None);
        m.default_value = default_value;
        ClassMember::Method(m)
    }

    pub fn type_param(&self, name: &str, bounds: Vec<TypeExpr>) -> TypeParam {
        TypeParam {
            name: name.to_string(),
            bounds,
            annotations: Vec::new(),
            span: self.span(),
            sym: None,
        }
    }

    pub fn class_decl(&self, kind: ClassKind, modifiers: &[Modifier], name: &str, members: Vec<ClassMember>) -> ClassDecl {
        ClassDecl {
            modifiers: modifiers.to_vec(),
            annotations: Vec::new(),
            kind,
            name: name.to_string(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            record_components: Vec::new(),
            members,
            span: self.span(),
            sym: None,
        }
    }

    pub fn class(&self, modifiers: &[Modifier], name: &str, members: Vec<ClassMember>) -> ClassDecl {
        self.class_decl(ClassKind::Class, modifiers, name, members)
    }

    pub fn interface(&self, modifiers: &[Modifier], name: &str, members: Vec<ClassMember>) -> ClassDecl {
        self.class_decl(ClassKind::Interface, modifiers, name, members)
    }

    pub fn annotation_type(&self, modifiers: &[Modifier], name: &str, elements: Vec<ClassMember>) -> ClassDecl {
        self.class_decl(ClassKind::Annotation, modifiers, name, elements)
    }

    pub fn enum_decl(&self, modifiers: &[Modifier], name: &str, constants: &[&str], members: Vec<ClassMember>) -> ClassDecl {
        let mut all: Vec<ClassMember> = constants
            .iter()
            .map(|c| {
                ClassMember::EnumConstant(EnumConstant {
                    annotations: Vec::new(),
                    name: c.to_string(),
                    args: Vec::new(),
                    span: self.span(),
                    sym: None,
                })
            })
            .collect();
        all.extend(members);
        self.class_decl(ClassKind::Enum, modifiers, name, all)
    }

    pub fn record(&self, modifiers: &[Modifier], name: &str, components: Vec<VarDecl>, members: Vec<ClassMember>) -> ClassDecl {
        let mut decl = self.class_decl(ClassKind::Record, modifiers, name, members);
        decl.record_components = components;
        decl
    }

    pub fn annotation(&self, name: &str, arguments: Vec<AnnotationArg>) -> Annotation {
        Annotation {
            name: name.to_string(),
            arguments,
            span: self.span(),
        }
    }

    /// Annotation used as an element value, `@A(@B)`
    pub fn annotation_expr(&self, annotation: Annotation) -> Expr {
        self.expr(ExprKind::Annotation(Box::new(annotation)))
    }

    /// Marker annotation `@Name`
    pub fn marker(&self, name: &str) -> Annotation {
        self.annotation(name, Vec::new())
    }

    pub fn unit(&self, source_file: &str, package: Option<&str>, imports: Vec<ImportDecl>, classes: Vec<ClassDecl>) -> CompilationUnit {
        CompilationUnit {
            package: package.map(|p| PackageDecl {
                name: p.to_string(),
                annotations: Vec::new(),
                span: self.span(),
            }),
            imports,
            type_decls: classes,
            source_file: source_file.to_string(),
            span: self.span(),
        }
    }

    pub fn import(&self, name: &str, is_wildcard: bool) -> ImportDecl {
        ImportDecl {
            name: name.to_string(),
            is_static: false,
            is_wildcard,
            span: self.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_positions_are_unique_and_nested_calls_work() {
        let m = TreeMaker::new();
        let e = m.binary(m.ident("x"), BinaryOp::Add, m.int(1));
        let ExprKind::Binary(b) = &e.kind else { panic!("expected binary") };
        assert_ne!(b.left.pos(), b.right.pos());
        assert_ne!(e.pos(), b.left.pos());
    }

    #[test]
    fn fixed_maker_reuses_position() {
        let m = TreeMaker::at(42);
        assert_eq!(m.ident("a").pos(), 42);
        assert_eq!(m.int(0).pos(), 42);
    }
}
