use super::nodes::*;
use super::CompilationUnit;
use crate::common::symtab::Symtab;
use crate::common::types::{BoundKind, Type, Types};

/// Java-like source printer, mainly for debugging and for asserting on
/// desugared trees. Synthetic nodes print as `(let ... in ...)` and
/// `indy name[static args](args)`.
pub struct AstPrinter<'a> {
    indent_level: usize,
    output: String,
    symtab: Option<&'a Symtab>,
}

impl Default for AstPrinter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AstPrinter<'a> {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            output: String::new(),
            symtab: None,
        }
    }

    /// Printer that can name class types of synthesized constants
    pub fn with_symtab(symtab: &'a Symtab) -> Self {
        Self {
            symtab: Some(symtab),
            ..Self::new()
        }
    }

    pub fn print_unit(mut self, unit: &CompilationUnit) -> String {
        if let Some(pkg) = &unit.package {
            self.writeln(&format!("package {};", pkg.name));
        }
        for import in &unit.imports {
            let stat = if import.is_static { "static " } else { "" };
            let star = if import.is_wildcard { ".*" } else { "" };
            self.writeln(&format!("import {}{}{};", stat, import.name, star));
        }
        for class in &unit.type_decls {
            self.class(class);
        }
        self.output
    }

    pub fn print_class(mut self, class: &ClassDecl) -> String {
        self.class(class);
        self.output
    }

    pub fn print_stmt(mut self, stmt: &Stmt) -> String {
        self.stmt(stmt);
        self.output
    }

    pub fn print_block(mut self, block: &Block) -> String {
        self.block_lines(block);
        self.output
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        self.expr(expr)
    }

    fn indent(&mut self) {
        self.indent_level += 2;
    }

    fn dedent(&mut self) {
        if self.indent_level >= 2 {
            self.indent_level -= 2;
        }
    }

    fn writeln(&mut self, s: &str) {
        for _ in 0..self.indent_level {
            self.output.push(' ');
        }
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn modifiers(modifiers: &[Modifier]) -> String {
        modifiers
            .iter()
            .map(|m| format!("{:?} ", m).to_lowercase())
            .collect()
    }

    fn annotations(&self, annotations: &[Annotation]) -> String {
        annotations.iter().map(|a| format!("{} ", self.annotation(a))).collect()
    }

    fn annotation(&self, a: &Annotation) -> String {
        if a.arguments.is_empty() {
            return format!("@{}", a.name);
        }
        let args: Vec<String> = a
            .arguments
            .iter()
            .map(|arg| match arg {
                AnnotationArg::Value(e) => self.expr(e),
                AnnotationArg::Named(n, e) => format!("{} = {}", n, self.expr(e)),
            })
            .collect();
        format!("@{}({})", a.name, args.join(", "))
    }

    fn class(&mut self, class: &ClassDecl) {
        let keyword = match class.kind {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
            ClassKind::Annotation => "@interface",
        };
        let mut header = format!(
            "{}{}{} {}",
            self.annotations(&class.annotations),
            Self::modifiers(&class.modifiers),
            keyword,
            class.name
        );
        if !class.type_params.is_empty() {
            let params: Vec<String> = class.type_params.iter().map(|p| self.type_param(p)).collect();
            header.push_str(&format!("<{}>", params.join(", ")));
        }
        if class.kind == ClassKind::Record {
            let comps: Vec<String> = class.record_components.iter().map(|c| self.var_inline(c)).collect();
            header.push_str(&format!("({})", comps.join(", ")));
        }
        if let Some(ext) = &class.extends {
            header.push_str(&format!(" extends {}", self.type_expr(ext)));
        }
        if !class.implements.is_empty() {
            let impls: Vec<String> = class.implements.iter().map(|t| self.type_expr(t)).collect();
            header.push_str(&format!(" implements {}", impls.join(", ")));
        }
        header.push_str(" {");
        self.writeln(&header);
        self.indent();
        for member in &class.members {
            self.member(member);
        }
        self.dedent();
        self.writeln("}");
    }

    fn type_param(&self, p: &TypeParam) -> String {
        if p.bounds.is_empty() {
            p.name.clone()
        } else {
            let bounds: Vec<String> = p.bounds.iter().map(|b| self.type_expr(b)).collect();
            format!("{} extends {}", p.name, bounds.join(" & "))
        }
    }

    fn member(&mut self, member: &ClassMember) {
        match member {
            ClassMember::Field(f) => {
                let line = format!("{};", self.var_inline(f));
                self.writeln(&line);
            }
            ClassMember::Method(m) => self.method(m),
            ClassMember::Class(c) => self.class(c),
            ClassMember::Initializer(init) => {
                self.writeln(if init.is_static { "static {" } else { "{" });
                self.indent();
                self.block_lines(&init.body);
                self.dedent();
                self.writeln("}");
            }
            ClassMember::EnumConstant(ec) => {
                let args: Vec<String> = ec.args.iter().map(|a| self.expr(a)).collect();
                let line = if args.is_empty() {
                    format!("{}{},", self.annotations(&ec.annotations), ec.name)
                } else {
                    format!("{}{}({}),", self.annotations(&ec.annotations), ec.name, args.join(", "))
                };
                self.writeln(&line);
            }
        }
    }

    fn method(&mut self, m: &MethodDecl) {
        let mut header = format!("{}{}", self.annotations(&m.annotations), Self::modifiers(&m.modifiers));
        if !m.type_params.is_empty() {
            let params: Vec<String> = m.type_params.iter().map(|p| self.type_param(p)).collect();
            header.push_str(&format!("<{}> ", params.join(", ")));
        }
        if let Some(ret) = &m.return_type {
            header.push_str(&format!("{} ", self.type_expr(ret)));
        }
        let params: Vec<String> = m.params.iter().map(|p| self.var_inline(p)).collect();
        header.push_str(&format!("{}({})", m.name, params.join(", ")));
        if !m.throws.is_empty() {
            let thrown: Vec<String> = m.throws.iter().map(|t| self.type_expr(t)).collect();
            header.push_str(&format!(" throws {}", thrown.join(", ")));
        }
        if let Some(default) = &m.default_value {
            header.push_str(&format!(" default {}", self.expr(default)));
        }
        match &m.body {
            Some(body) => {
                header.push_str(" {");
                self.writeln(&header);
                self.indent();
                self.block_lines(body);
                self.dedent();
                self.writeln("}");
            }
            None => {
                header.push(';');
                self.writeln(&header);
            }
        }
    }

    fn var_inline(&self, v: &VarDecl) -> String {
        let ty = match &v.var_type {
            Some(t) if v.is_varargs => format!("{}... ", self.type_expr(t)),
            Some(t) => format!("{} ", self.type_expr(t)),
            None => String::new(),
        };
        let mut s = format!("{}{}{}{}", self.annotations(&v.annotations), Self::modifiers(&v.modifiers), ty, v.name);
        if let Some(init) = &v.init {
            s.push_str(&format!(" = {}", self.expr(init)));
        }
        s
    }

    fn block_lines(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.stmt(stmt);
        }
    }

    fn nested(&mut self, header: String, body: &Stmt) {
        match body {
            Stmt::Block(b) => {
                self.writeln(&format!("{} {{", header));
                self.indent();
                self.block_lines(b);
                self.dedent();
                self.writeln("}");
            }
            other => {
                self.writeln(&header);
                self.indent();
                self.stmt(other);
                self.dedent();
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(b) => {
                self.writeln("{");
                self.indent();
                self.block_lines(b);
                self.dedent();
                self.writeln("}");
            }
            Stmt::LocalVar(v) => {
                let line = format!("{};", self.var_inline(v));
                self.writeln(&line);
            }
            Stmt::LocalClass(c) => self.class(c),
            Stmt::Expr(e) => {
                let line = format!("{};", self.expr(&e.expr));
                self.writeln(&line);
            }
            Stmt::If(i) => {
                let header = format!("if ({})", self.expr(&i.cond));
                self.nested(header, &i.then_branch);
                if let Some(e) = &i.else_branch {
                    self.nested("else".to_string(), e);
                }
            }
            Stmt::While(w) => {
                let header = format!("while ({})", self.expr(&w.cond));
                self.nested(header, &w.body);
            }
            Stmt::DoWhile(d) => {
                self.nested("do".to_string(), &d.body);
                let line = format!("while ({});", self.expr(&d.cond));
                self.writeln(&line);
            }
            Stmt::For(f) => {
                let init: Vec<String> = f
                    .init
                    .iter()
                    .map(|s| match s {
                        Stmt::LocalVar(v) => self.var_inline(v),
                        Stmt::Expr(e) => self.expr(&e.expr),
                        _ => String::new(),
                    })
                    .collect();
                let cond = f.cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                let update: Vec<String> = f.update.iter().map(|u| self.expr(u)).collect();
                let header = format!("for ({}; {}; {})", init.join(", "), cond, update.join(", "));
                self.nested(header, &f.body);
            }
            Stmt::ForEach(f) => {
                let header = format!("for ({} : {})", self.var_inline(&f.var), self.expr(&f.iterable));
                self.nested(header, &f.body);
            }
            Stmt::Switch(sw) => self.switch(sw),
            Stmt::Return(r) => match &r.expr {
                Some(e) => {
                    let line = format!("return {};", self.expr(e));
                    self.writeln(&line);
                }
                None => self.writeln("return;"),
            },
            Stmt::Yield(y) => {
                let line = format!("yield {};", self.expr(&y.value));
                self.writeln(&line);
            }
            Stmt::Break(b) => match &b.label {
                Some(l) => self.writeln(&format!("break {};", l)),
                None => self.writeln("break;"),
            },
            Stmt::Continue(c) => match (&c.label, c.restart_switch) {
                (Some(l), _) => self.writeln(&format!("continue {};", l)),
                (None, Some(_)) => self.writeln("continue <switch>;"),
                (None, None) => self.writeln("continue;"),
            },
            Stmt::Throw(t) => {
                let line = format!("throw {};", self.expr(&t.expr));
                self.writeln(&line);
            }
            Stmt::Labeled(l) => {
                self.writeln(&format!("{}:", l.label));
                self.stmt(&l.body);
            }
            Stmt::Empty(_) => self.writeln(";"),
        }
    }

    fn switch(&mut self, sw: &Switch) {
        let header = format!("switch ({}) {{", self.expr(&sw.selector));
        self.writeln(&header);
        self.indent();
        for case in &sw.cases {
            let labels: Vec<String> = case.labels.iter().map(|l| self.case_label(l)).collect();
            let mut head = if case.is_default() && labels.len() == 1 {
                "default".to_string()
            } else {
                format!("case {}", labels.join(", "))
            };
            if let Some(g) = &case.guard {
                head.push_str(&format!(" when {}", self.expr(g)));
            }
            head.push_str(if case.kind == CaseKind::Rule { " ->" } else { ":" });
            self.writeln(&head);
            self.indent();
            for s in &case.stats {
                self.stmt(s);
            }
            self.dedent();
        }
        self.dedent();
        self.writeln("}");
    }

    fn case_label(&self, label: &CaseLabel) -> String {
        match label {
            CaseLabel::Default(_) => "default".to_string(),
            CaseLabel::Constant(e) => self.expr(e),
            CaseLabel::Pattern(p) => self.pattern(p),
        }
    }

    fn pattern(&self, p: &Pattern) -> String {
        match &p.kind {
            PatternKind::Binding(v) => self.var_inline(v),
            PatternKind::Parenthesized(inner) => format!("({})", self.pattern(inner)),
        }
    }

    pub fn type_expr(&self, t: &TypeExpr) -> String {
        match &t.kind {
            TypeExprKind::Primitive(tag) => tag.name().to_string(),
            TypeExprKind::Void => "void".to_string(),
            TypeExprKind::Var => "var".to_string(),
            TypeExprKind::Named { name, args } if args.is_empty() => name.clone(),
            TypeExprKind::Named { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.type_expr(a)).collect();
                format!("{}<{}>", name, args.join(", "))
            }
            TypeExprKind::Array(elem) => format!("{}[]", self.type_expr(elem)),
            TypeExprKind::Wildcard { kind, bound } => match (kind, bound) {
                (BoundKind::Extends, Some(b)) => format!("? extends {}", self.type_expr(b)),
                (BoundKind::Super, Some(b)) => format!("? super {}", self.type_expr(b)),
                _ => "?".to_string(),
            },
            TypeExprKind::Annotated { annotations, underlying } => {
                format!("{}{}", self.annotations(annotations), self.type_expr(underlying))
            }
        }
    }

    fn type_name(&self, t: &Type) -> String {
        match self.symtab {
            Some(symtab) => Types::new(symtab).to_string(t),
            None => format!("{:?}", t),
        }
    }

    fn literal(lit: &Literal) -> String {
        match lit {
            Literal::Int(v) => v.to_string(),
            Literal::Long(v) => format!("{}L", v),
            Literal::Float(v) => format!("{}F", v),
            Literal::Double(v) => format!("{:?}", v),
            Literal::Char(c) => format!("'{}'", String::from_utf16_lossy(&[*c])),
            Literal::Boolean(b) => b.to_string(),
            Literal::String(s) => format!("{:?}", s),
            Literal::Null => "null".to_string(),
        }
    }

    fn expr(&self, e: &Expr) -> String {
        match &e.kind {
            ExprKind::Literal(lit) => Self::literal(lit),
            ExprKind::Ident(id) => id.name.clone(),
            ExprKind::Select(sel) => format!("{}.{}", self.expr(&sel.target), sel.name),
            ExprKind::Parens(inner) => format!("({})", self.expr(inner)),
            ExprKind::Unary(u) => match u.op {
                UnaryOp::PostInc | UnaryOp::PostDec => format!("{}{}", self.expr(&u.operand), u.op.symbol()),
                UnaryOp::NullCheck => format!("<*nullchk*>{}", self.expr(&u.operand)),
                _ => format!("{}{}", u.op.symbol(), self.expr(&u.operand)),
            },
            ExprKind::Binary(b) => format!("{} {} {}", self.expr(&b.left), b.op.symbol(), self.expr(&b.right)),
            ExprKind::Assign(a) => format!("{} = {}", self.expr(&a.target), self.expr(&a.value)),
            ExprKind::CompoundAssign(a) => {
                format!("{} {}= {}", self.expr(&a.target), a.op.symbol(), self.expr(&a.value))
            }
            ExprKind::Conditional(c) => format!(
                "{} ? {} : {}",
                self.expr(&c.cond),
                self.expr(&c.then_expr),
                self.expr(&c.else_expr)
            ),
            ExprKind::InstanceOf(i) => {
                let target = match &i.target {
                    InstanceOfTarget::Type(t) => self.type_expr(t),
                    InstanceOfTarget::Pattern(p) => self.pattern(p),
                };
                format!("{} instanceof {}", self.expr(&i.expr), target)
            }
            ExprKind::Cast(c) => format!("({}){}", self.type_expr(&c.target_type), self.expr(&c.expr)),
            ExprKind::Invoke(inv) => {
                let args: Vec<String> = inv.args.iter().map(|a| self.expr(a)).collect();
                match &inv.target {
                    Some(t) => format!("{}.{}({})", self.expr(t), inv.name, args.join(", ")),
                    None => format!("{}({})", inv.name, args.join(", ")),
                }
            }
            ExprKind::NewClass(nc) => {
                let args: Vec<String> = nc.args.iter().map(|a| self.expr(a)).collect();
                let diamond = if nc.diamond { "<>" } else { "" };
                let body = if nc.body.is_some() { "{ ... }" } else { "" };
                format!("new {}{}({}){}", self.type_expr(&nc.class_type), diamond, args.join(", "), body)
            }
            ExprKind::NewArray(na) => {
                let elem = na.elem_type.as_ref().map(|t| self.type_expr(t));
                let dims: String = na.dims.iter().map(|d| format!("[{}]", self.expr(d))).collect();
                let init = na.init.as_ref().map(|items| {
                    let items: Vec<String> = items.iter().map(|i| self.expr(i)).collect();
                    format!("{{{}}}", items.join(", "))
                });
                match (elem, init) {
                    (Some(t), Some(init)) => format!("new {}[]{}", t, init),
                    (Some(t), None) => format!("new {}{}", t, dims),
                    (None, Some(init)) => init,
                    (None, None) => "{}".to_string(),
                }
            }
            ExprKind::Index(ix) => format!("{}[{}]", self.expr(&ix.array), self.expr(&ix.index)),
            ExprKind::Lambda(l) => {
                let params: Vec<String> = l.params.iter().map(|p| self.var_inline(p)).collect();
                let body = match &l.body {
                    LambdaBody::Expr(e) => self.expr(e),
                    LambdaBody::Block(b) => {
                        let mut inner = AstPrinter {
                            indent_level: 0,
                            output: String::new(),
                            symtab: self.symtab,
                        };
                        inner.block_lines(b);
                        format!("{{ {} }}", inner.output.lines().map(str::trim).collect::<Vec<_>>().join(" "))
                    }
                };
                format!("({}) -> {}", params.join(", "), body)
            }
            ExprKind::Switch(sw) => {
                let mut inner = AstPrinter {
                    indent_level: 0,
                    output: String::new(),
                    symtab: self.symtab,
                };
                inner.switch(sw);
                inner.output.lines().map(str::trim).collect::<Vec<_>>().join(" ")
            }
            ExprKind::ClassLit(t) => format!("{}.class", self.type_expr(t)),
            ExprKind::Annotation(a) => self.annotation(a),
            ExprKind::This => "this".to_string(),
            ExprKind::Let(l) => {
                let defs: Vec<String> = l
                    .defs
                    .iter()
                    .map(|d| {
                        let mut inner = AstPrinter {
                            indent_level: 0,
                            output: String::new(),
                            symtab: self.symtab,
                        };
                        inner.stmt(d);
                        inner.output.lines().map(str::trim).collect::<Vec<_>>().join(" ")
                    })
                    .collect();
                format!("(let {} in {})", defs.join(" "), self.expr(&l.expr))
            }
            ExprKind::Indy(indy) => {
                let statics: Vec<String> = indy
                    .static_args
                    .iter()
                    .map(|c| match c {
                        LoadableConstant::Int(v) => v.to_string(),
                        LoadableConstant::String(s) => format!("{:?}", s),
                        LoadableConstant::Class(t) => format!("{}.class", self.type_name(t)),
                    })
                    .collect();
                let args: Vec<String> = indy.args.iter().map(|a| self.expr(a)).collect();
                format!("indy {}[{}]({})", indy.bootstrap.method_name(), statics.join(", "), args.join(", "))
            }
            ExprKind::Erroneous(_) => "<error>".to_string(),
        }
    }
}
