use super::*;

/// Read-only tree walk.
///
/// Every `visit_*` method defaults to the matching `walk_*` function, which
/// visits the children. Implementors override the node kinds they care
/// about and call `walk_*` themselves to keep descending.
pub trait TreeScanner {
    fn visit_unit(&mut self, unit: &CompilationUnit) {
        walk_unit(self, unit)
    }

    fn visit_class(&mut self, class: &ClassDecl) {
        walk_class(self, class)
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        walk_method(self, method)
    }

    fn visit_var(&mut self, var: &VarDecl) {
        walk_var(self, var)
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        walk_type_expr(self, ty)
    }

    fn visit_pattern(&mut self, pattern: &Pattern) {
        walk_pattern(self, pattern)
    }

    fn visit_annotation(&mut self, annotation: &Annotation) {
        walk_annotation(self, annotation)
    }

    fn visit_switch(&mut self, switch: &Switch) {
        walk_switch(self, switch)
    }

    fn visit_lambda(&mut self, lambda: &LambdaExpr) {
        walk_lambda(self, lambda)
    }
}

pub fn walk_unit<S: TreeScanner + ?Sized>(s: &mut S, unit: &CompilationUnit) {
    if let Some(pkg) = &unit.package {
        for a in &pkg.annotations {
            s.visit_annotation(a);
        }
    }
    for class in &unit.type_decls {
        s.visit_class(class);
    }
}

pub fn walk_class<S: TreeScanner + ?Sized>(s: &mut S, class: &ClassDecl) {
    for a in &class.annotations {
        s.visit_annotation(a);
    }
    for tp in &class.type_params {
        walk_type_param(s, tp);
    }
    if let Some(ext) = &class.extends {
        s.visit_type_expr(ext);
    }
    for i in &class.implements {
        s.visit_type_expr(i);
    }
    for c in &class.record_components {
        s.visit_var(c);
    }
    for member in &class.members {
        match member {
            ClassMember::Field(v) => s.visit_var(v),
            ClassMember::Method(m) => s.visit_method(m),
            ClassMember::Class(c) => s.visit_class(c),
            ClassMember::Initializer(init) => s.visit_block(&init.body),
            ClassMember::EnumConstant(ec) => {
                for a in &ec.annotations {
                    s.visit_annotation(a);
                }
                for arg in &ec.args {
                    s.visit_expr(arg);
                }
            }
        }
    }
}

pub fn walk_type_param<S: TreeScanner + ?Sized>(s: &mut S, tp: &TypeParam) {
    for a in &tp.annotations {
        s.visit_annotation(a);
    }
    for b in &tp.bounds {
        s.visit_type_expr(b);
    }
}

pub fn walk_method<S: TreeScanner + ?Sized>(s: &mut S, method: &MethodDecl) {
    for a in &method.annotations {
        s.visit_annotation(a);
    }
    for tp in &method.type_params {
        walk_type_param(s, tp);
    }
    if let Some(ret) = &method.return_type {
        s.visit_type_expr(ret);
    }
    for p in &method.params {
        s.visit_var(p);
    }
    for t in &method.throws {
        s.visit_type_expr(t);
    }
    if let Some(body) = &method.body {
        s.visit_block(body);
    }
    if let Some(default) = &method.default_value {
        s.visit_expr(default);
    }
}

pub fn walk_var<S: TreeScanner + ?Sized>(s: &mut S, var: &VarDecl) {
    for a in &var.annotations {
        s.visit_annotation(a);
    }
    if let Some(t) = &var.var_type {
        s.visit_type_expr(t);
    }
    if let Some(init) = &var.init {
        s.visit_expr(init);
    }
}

pub fn walk_block<S: TreeScanner + ?Sized>(s: &mut S, block: &Block) {
    for stmt in &block.statements {
        s.visit_stmt(stmt);
    }
}

pub fn walk_stmt<S: TreeScanner + ?Sized>(s: &mut S, stmt: &Stmt) {
    match stmt {
        Stmt::Block(b) => s.visit_block(b),
        Stmt::LocalVar(v) => s.visit_var(v),
        Stmt::LocalClass(c) => s.visit_class(c),
        Stmt::Expr(e) => s.visit_expr(&e.expr),
        Stmt::If(i) => {
            s.visit_expr(&i.cond);
            s.visit_stmt(&i.then_branch);
            if let Some(e) = &i.else_branch {
                s.visit_stmt(e);
            }
        }
        Stmt::While(w) => {
            s.visit_expr(&w.cond);
            s.visit_stmt(&w.body);
        }
        Stmt::DoWhile(d) => {
            s.visit_stmt(&d.body);
            s.visit_expr(&d.cond);
        }
        Stmt::For(f) => {
            for init in &f.init {
                s.visit_stmt(init);
            }
            if let Some(c) = &f.cond {
                s.visit_expr(c);
            }
            for u in &f.update {
                s.visit_expr(u);
            }
            s.visit_stmt(&f.body);
        }
        Stmt::ForEach(f) => {
            s.visit_var(&f.var);
            s.visit_expr(&f.iterable);
            s.visit_stmt(&f.body);
        }
        Stmt::Switch(sw) => s.visit_switch(sw),
        Stmt::Return(r) => {
            if let Some(e) = &r.expr {
                s.visit_expr(e);
            }
        }
        Stmt::Yield(y) => s.visit_expr(&y.value),
        Stmt::Throw(t) => s.visit_expr(&t.expr),
        Stmt::Labeled(l) => s.visit_stmt(&l.body),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
    }
}

pub fn walk_switch<S: TreeScanner + ?Sized>(s: &mut S, switch: &Switch) {
    s.visit_expr(&switch.selector);
    for case in &switch.cases {
        for label in &case.labels {
            match label {
                CaseLabel::Constant(e) => s.visit_expr(e),
                CaseLabel::Pattern(p) => s.visit_pattern(p),
                CaseLabel::Default(_) => {}
            }
        }
        if let Some(g) = &case.guard {
            s.visit_expr(g);
        }
        for stmt in &case.stats {
            s.visit_stmt(stmt);
        }
    }
}

pub fn walk_pattern<S: TreeScanner + ?Sized>(s: &mut S, pattern: &Pattern) {
    match &pattern.kind {
        PatternKind::Binding(var) => s.visit_var(var),
        PatternKind::Parenthesized(inner) => s.visit_pattern(inner),
    }
}

pub fn walk_lambda<S: TreeScanner + ?Sized>(s: &mut S, lambda: &LambdaExpr) {
    for p in &lambda.params {
        s.visit_var(p);
    }
    match &lambda.body {
        LambdaBody::Expr(e) => s.visit_expr(e),
        LambdaBody::Block(b) => s.visit_block(b),
    }
}

pub fn walk_annotation<S: TreeScanner + ?Sized>(s: &mut S, annotation: &Annotation) {
    for arg in &annotation.arguments {
        match arg {
            AnnotationArg::Value(e) | AnnotationArg::Named(_, e) => s.visit_expr(e),
        }
    }
}

pub fn walk_type_expr<S: TreeScanner + ?Sized>(s: &mut S, ty: &TypeExpr) {
    match &ty.kind {
        TypeExprKind::Named { args, .. } => {
            for a in args {
                s.visit_type_expr(a);
            }
        }
        TypeExprKind::Array(elem) => s.visit_type_expr(elem),
        TypeExprKind::Wildcard { bound: Some(b), .. } => s.visit_type_expr(b),
        TypeExprKind::Annotated { annotations, underlying } => {
            for a in annotations {
                s.visit_annotation(a);
            }
            s.visit_type_expr(underlying);
        }
        TypeExprKind::Primitive(_) | TypeExprKind::Void | TypeExprKind::Var | TypeExprKind::Wildcard { .. } => {}
    }
}

pub fn walk_expr<S: TreeScanner + ?Sized>(s: &mut S, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This => {}
        ExprKind::Select(sel) => s.visit_expr(&sel.target),
        ExprKind::Parens(inner) => s.visit_expr(inner),
        ExprKind::Unary(u) => s.visit_expr(&u.operand),
        ExprKind::Binary(b) => {
            s.visit_expr(&b.left);
            s.visit_expr(&b.right);
        }
        ExprKind::Assign(a) => {
            s.visit_expr(&a.target);
            s.visit_expr(&a.value);
        }
        ExprKind::CompoundAssign(a) => {
            s.visit_expr(&a.target);
            s.visit_expr(&a.value);
        }
        ExprKind::Conditional(c) => {
            s.visit_expr(&c.cond);
            s.visit_expr(&c.then_expr);
            s.visit_expr(&c.else_expr);
        }
        ExprKind::InstanceOf(i) => {
            s.visit_expr(&i.expr);
            match &i.target {
                InstanceOfTarget::Type(t) => s.visit_type_expr(t),
                InstanceOfTarget::Pattern(p) => s.visit_pattern(p),
            }
        }
        ExprKind::Cast(c) => {
            s.visit_type_expr(&c.target_type);
            s.visit_expr(&c.expr);
        }
        ExprKind::Invoke(inv) => {
            if let Some(t) = &inv.target {
                s.visit_expr(t);
            }
            for ta in &inv.type_args {
                s.visit_type_expr(ta);
            }
            for a in &inv.args {
                s.visit_expr(a);
            }
        }
        ExprKind::NewClass(nc) => {
            if let Some(o) = &nc.outer {
                s.visit_expr(o);
            }
            s.visit_type_expr(&nc.class_type);
            for a in &nc.args {
                s.visit_expr(a);
            }
            if let Some(body) = &nc.body {
                s.visit_class(body);
            }
        }
        ExprKind::NewArray(na) => {
            if let Some(t) = &na.elem_type {
                s.visit_type_expr(t);
            }
            for d in &na.dims {
                s.visit_expr(d);
            }
            if let Some(init) = &na.init {
                for e in init {
                    s.visit_expr(e);
                }
            }
        }
        ExprKind::Index(ix) => {
            s.visit_expr(&ix.array);
            s.visit_expr(&ix.index);
        }
        ExprKind::Lambda(l) => s.visit_lambda(l),
        ExprKind::Switch(sw) => s.visit_switch(sw),
        ExprKind::ClassLit(t) => s.visit_type_expr(t),
        ExprKind::Annotation(a) => s.visit_annotation(a),
        ExprKind::Let(l) => {
            for d in &l.defs {
                s.visit_stmt(d);
            }
            s.visit_expr(&l.expr);
        }
        ExprKind::Indy(indy) => {
            for a in &indy.args {
                s.visit_expr(a);
            }
        }
        ExprKind::Erroneous(err) => {
            for e in &err.exprs {
                s.visit_expr(e);
            }
        }
    }
}

/// In-place tree walk; same shape as [`TreeScanner`] over mutable nodes
pub trait TreeVisitorMut {
    fn visit_class_mut(&mut self, class: &mut ClassDecl) {
        walk_class_mut(self, class)
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block)
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }

    fn visit_var_mut(&mut self, var: &mut VarDecl) {
        walk_var_mut(self, var)
    }

    fn visit_switch_mut(&mut self, switch: &mut Switch) {
        walk_switch_mut(self, switch)
    }
}

pub fn walk_class_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, class: &mut ClassDecl) {
    for member in &mut class.members {
        match member {
            ClassMember::Field(f) => v.visit_var_mut(f),
            ClassMember::Method(m) => {
                if let Some(body) = &mut m.body {
                    v.visit_block_mut(body);
                }
            }
            ClassMember::Class(c) => v.visit_class_mut(c),
            ClassMember::Initializer(init) => v.visit_block_mut(&mut init.body),
            ClassMember::EnumConstant(ec) => {
                for arg in &mut ec.args {
                    v.visit_expr_mut(arg);
                }
            }
        }
    }
}

pub fn walk_block_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.statements {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_var_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, var: &mut VarDecl) {
    if let Some(init) = &mut var.init {
        v.visit_expr_mut(init);
    }
}

pub fn walk_stmt_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Block(b) => v.visit_block_mut(b),
        Stmt::LocalVar(var) => v.visit_var_mut(var),
        Stmt::LocalClass(c) => v.visit_class_mut(c),
        Stmt::Expr(e) => v.visit_expr_mut(&mut e.expr),
        Stmt::If(i) => {
            v.visit_expr_mut(&mut i.cond);
            v.visit_stmt_mut(&mut i.then_branch);
            if let Some(e) = &mut i.else_branch {
                v.visit_stmt_mut(e);
            }
        }
        Stmt::While(w) => {
            v.visit_expr_mut(&mut w.cond);
            v.visit_stmt_mut(&mut w.body);
        }
        Stmt::DoWhile(d) => {
            v.visit_stmt_mut(&mut d.body);
            v.visit_expr_mut(&mut d.cond);
        }
        Stmt::For(f) => {
            for init in &mut f.init {
                v.visit_stmt_mut(init);
            }
            if let Some(c) = &mut f.cond {
                v.visit_expr_mut(c);
            }
            for u in &mut f.update {
                v.visit_expr_mut(u);
            }
            v.visit_stmt_mut(&mut f.body);
        }
        Stmt::ForEach(f) => {
            v.visit_var_mut(&mut f.var);
            v.visit_expr_mut(&mut f.iterable);
            v.visit_stmt_mut(&mut f.body);
        }
        Stmt::Switch(sw) => v.visit_switch_mut(sw),
        Stmt::Return(r) => {
            if let Some(e) = &mut r.expr {
                v.visit_expr_mut(e);
            }
        }
        Stmt::Yield(y) => v.visit_expr_mut(&mut y.value),
        Stmt::Throw(t) => v.visit_expr_mut(&mut t.expr),
        Stmt::Labeled(l) => v.visit_stmt_mut(&mut l.body),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
    }
}

pub fn walk_switch_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, switch: &mut Switch) {
    v.visit_expr_mut(&mut switch.selector);
    for case in &mut switch.cases {
        for label in &mut case.labels {
            if let CaseLabel::Constant(e) = label {
                v.visit_expr_mut(e);
            }
        }
        if let Some(g) = &mut case.guard {
            v.visit_expr_mut(g);
        }
        for stmt in &mut case.stats {
            v.visit_stmt_mut(stmt);
        }
    }
}

pub fn walk_expr_mut<V: TreeVisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::This | ExprKind::ClassLit(_) | ExprKind::Annotation(_) => {}
        ExprKind::Select(sel) => v.visit_expr_mut(&mut sel.target),
        ExprKind::Parens(inner) => v.visit_expr_mut(inner),
        ExprKind::Unary(u) => v.visit_expr_mut(&mut u.operand),
        ExprKind::Binary(b) => {
            v.visit_expr_mut(&mut b.left);
            v.visit_expr_mut(&mut b.right);
        }
        ExprKind::Assign(a) => {
            v.visit_expr_mut(&mut a.target);
            v.visit_expr_mut(&mut a.value);
        }
        ExprKind::CompoundAssign(a) => {
            v.visit_expr_mut(&mut a.target);
            v.visit_expr_mut(&mut a.value);
        }
        ExprKind::Conditional(c) => {
            v.visit_expr_mut(&mut c.cond);
            v.visit_expr_mut(&mut c.then_expr);
            v.visit_expr_mut(&mut c.else_expr);
        }
        ExprKind::InstanceOf(i) => v.visit_expr_mut(&mut i.expr),
        ExprKind::Cast(c) => v.visit_expr_mut(&mut c.expr),
        ExprKind::Invoke(inv) => {
            if let Some(t) = &mut inv.target {
                v.visit_expr_mut(t);
            }
            for a in &mut inv.args {
                v.visit_expr_mut(a);
            }
        }
        ExprKind::NewClass(nc) => {
            if let Some(o) = &mut nc.outer {
                v.visit_expr_mut(o);
            }
            for a in &mut nc.args {
                v.visit_expr_mut(a);
            }
            if let Some(body) = &mut nc.body {
                v.visit_class_mut(body);
            }
        }
        ExprKind::NewArray(na) => {
            for d in &mut na.dims {
                v.visit_expr_mut(d);
            }
            if let Some(init) = &mut na.init {
                for e in init {
                    v.visit_expr_mut(e);
                }
            }
        }
        ExprKind::Index(ix) => {
            v.visit_expr_mut(&mut ix.array);
            v.visit_expr_mut(&mut ix.index);
        }
        ExprKind::Lambda(l) => match &mut l.body {
            LambdaBody::Expr(e) => v.visit_expr_mut(e),
            LambdaBody::Block(b) => v.visit_block_mut(b),
        },
        ExprKind::Switch(sw) => v.visit_switch_mut(sw),
        ExprKind::Let(l) => {
            for d in &mut l.defs {
                v.visit_stmt_mut(d);
            }
            v.visit_expr_mut(&mut l.expr);
        }
        ExprKind::Indy(indy) => {
            for a in &mut indy.args {
                v.visit_expr_mut(a);
            }
        }
        ExprKind::Erroneous(err) => {
            for e in &mut err.exprs {
                v.visit_expr_mut(e);
            }
        }
    }
}
