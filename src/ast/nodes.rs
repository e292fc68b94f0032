use super::{Pos, Span};
use crate::common::flags::Flags;
use crate::common::symbol::{OperatorId, SymbolId};
use crate::common::types::{BoundKind, Type, TypeTag};

// Package and Import Declarations
#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub name: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub span: Span,
}

// Modifiers and Annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
}

impl Modifier {
    pub fn flag(&self) -> Flags {
        match self {
            Modifier::Public => Flags::PUBLIC,
            Modifier::Protected => Flags::PROTECTED,
            Modifier::Private => Flags::PRIVATE,
            Modifier::Abstract => Flags::ABSTRACT,
            Modifier::Static => Flags::STATIC,
            Modifier::Final => Flags::FINAL,
            Modifier::Native => Flags::NATIVE,
            Modifier::Synchronized => Flags::SYNCHRONIZED,
            Modifier::Transient => Flags::TRANSIENT,
            Modifier::Volatile => Flags::VOLATILE,
            Modifier::Strictfp => Flags::STRICTFP,
            Modifier::Default => Flags::DEFAULT,
        }
    }

    pub fn flags_of(modifiers: &[Modifier]) -> Flags {
        modifiers.iter().fold(Flags::NONE, |acc, m| acc | m.flag())
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    /// Simple or qualified name of the annotation type
    pub name: String,
    pub arguments: Vec<AnnotationArg>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum AnnotationArg {
    Value(Expr),
    Named(String, Expr),
}

// Type Declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub kind: ClassKind,
    /// Empty for anonymous classes
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<TypeExpr>,
    pub implements: Vec<TypeExpr>,
    pub record_components: Vec<VarDecl>,
    pub members: Vec<ClassMember>,
    pub span: Span,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeExpr>,
    pub annotations: Vec<Annotation>,
    pub span: Span,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Field(VarDecl),
    Method(MethodDecl),
    Class(ClassDecl),
    Initializer(InitializerBlock),
    EnumConstant(EnumConstant),
}

impl ClassMember {
    pub fn span(&self) -> Span {
        match self {
            ClassMember::Field(v) => v.span,
            ClassMember::Method(m) => m.span,
            ClassMember::Class(c) => c.span,
            ClassMember::Initializer(i) => i.span,
            ClassMember::EnumConstant(e) => e.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    /// `None` for constructors
    pub return_type: Option<TypeExpr>,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub throws: Vec<TypeExpr>,
    pub body: Option<Block>,
    /// Default value of an annotation type element
    pub default_value: Option<Expr>,
    pub span: Span,
    pub sym: Option<SymbolId>,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

/// Field, local variable, parameter or binding variable
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    /// `None` for implicitly typed lambda parameters
    pub var_type: Option<TypeExpr>,
    pub name: String,
    pub init: Option<Expr>,
    pub is_varargs: bool,
    pub span: Span,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct InitializerBlock {
    pub is_static: bool,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
    pub sym: Option<SymbolId>,
}

// Type expressions
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Primitive(TypeTag),
    Void,
    /// Simple or dotted name with optional type arguments
    Named { name: String, args: Vec<TypeExpr> },
    Array(Box<TypeExpr>),
    Wildcard { kind: BoundKind, bound: Option<Box<TypeExpr>> },
    Annotated { annotations: Vec<Annotation>, underlying: Box<TypeExpr> },
    /// Local variable type inference
    Var,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span, ty: None }
    }

    /// Synthetic type tree carrying an already resolved type
    pub fn resolved(ty: Type, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: TypeExprKind::Named {
                name: name.into(),
                args: Vec::new(),
            },
            span,
            ty: Some(ty),
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, TypeExprKind::Var)
    }
}

// Statements
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    LocalVar(VarDecl),
    LocalClass(ClassDecl),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForEach(ForEachStmt),
    Switch(Switch),
    Return(ReturnStmt),
    Yield(YieldStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Throw(ThrowStmt),
    Labeled(LabeledStmt),
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(b) => b.span,
            Stmt::LocalVar(v) => v.span,
            Stmt::LocalClass(c) => c.span,
            Stmt::Expr(e) => e.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::DoWhile(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForEach(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Yield(s) => s.span,
            Stmt::Break(s) => s.span,
            Stmt::Continue(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Labeled(s) => s.span,
            Stmt::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub cond: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Vec<Stmt>,
    pub cond: Option<Expr>,
    pub update: Vec<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForEachStmt {
    pub var: VarDecl,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct YieldStmt {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub label: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContinueStmt {
    pub label: Option<String>,
    /// Position of the switch a lowered pattern case restarts
    pub restart_switch: Option<Pos>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LabeledStmt {
    pub label: String,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// Switch statement or switch expression
#[derive(Debug, Clone)]
pub struct Switch {
    pub selector: Box<Expr>,
    pub cases: Vec<Case>,
    /// Set by attribution when any label is a pattern or `null`
    pub pattern_switch: bool,
    /// Set by attribution when a pattern label matches every selector value
    pub has_unconditional_pattern: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Statement,
    Rule,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub labels: Vec<CaseLabel>,
    pub guard: Option<Expr>,
    pub stats: Vec<Stmt>,
    pub kind: CaseKind,
    /// Set by attribution: control can fall out of the case body
    pub completes_normally: bool,
    pub span: Span,
}

impl Case {
    pub fn is_default(&self) -> bool {
        self.labels.iter().any(|l| matches!(l, CaseLabel::Default(_)))
    }
}

#[derive(Debug, Clone)]
pub enum CaseLabel {
    Default(Span),
    Constant(Expr),
    Pattern(Pattern),
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    Binding(VarDecl),
    Parenthesized(Box<Pattern>),
}

impl Pattern {
    /// The binding variable at the core of this pattern
    pub fn binding(&self) -> &VarDecl {
        match &self.kind {
            PatternKind::Binding(var) => var,
            PatternKind::Parenthesized(inner) => inner.binding(),
        }
    }
}

// Expressions
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Attributed type
    pub ty: Option<Type>,
    /// Folded compile-time constant value
    pub constant: Option<Literal>,
}

impl Default for Expr {
    fn default() -> Self {
        Self::new(
            ExprKind::Erroneous(ErroneousExpr {
                exprs: Vec::new(),
                synthetic: true,
            }),
            Span::default(),
        )
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
            constant: None,
        }
    }

    pub fn typed(kind: ExprKind, span: Span, ty: Type) -> Self {
        Self {
            kind,
            span,
            ty: Some(ty),
            constant: None,
        }
    }

    pub fn pos(&self) -> Pos {
        self.span.pos()
    }

    pub fn ty(&self) -> Type {
        self.ty.clone().unwrap_or(Type::None)
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Ident(IdentExpr),
    Select(SelectExpr),
    Parens(Box<Expr>),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    CompoundAssign(CompoundAssignExpr),
    Conditional(ConditionalExpr),
    InstanceOf(InstanceOfExpr),
    Cast(CastExpr),
    Invoke(InvokeExpr),
    NewClass(NewClassExpr),
    NewArray(NewArrayExpr),
    Index(IndexExpr),
    Lambda(LambdaExpr),
    Switch(Switch),
    ClassLit(TypeExpr),
    /// Nested annotation used as an annotation element value
    Annotation(Box<Annotation>),
    This,
    /// `let defs in expr`, produced by desugaring
    Let(LetExpr),
    /// Invokedynamic call site, produced by desugaring
    Indy(IndyCall),
    Erroneous(ErroneousExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// UTF-16 code unit
    Char(u16),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, Clone)]
pub struct IdentExpr {
    pub name: String,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct SelectExpr {
    pub target: Box<Expr>,
    pub name: String,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    /// Synthetic null check
    NullCheck,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
            UnaryOp::NullCheck => "<*nullchk*>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub operator: Option<OperatorId>,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
    pub operator: Option<OperatorId>,
}

#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CompoundAssignExpr {
    pub target: Box<Expr>,
    pub op: BinaryOp,
    pub value: Box<Expr>,
    pub operator: Option<OperatorId>,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub cond: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub enum InstanceOfTarget {
    Type(TypeExpr),
    Pattern(Box<Pattern>),
}

#[derive(Debug, Clone)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub target: InstanceOfTarget,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target_type: TypeExpr,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct InvokeExpr {
    /// Qualifier, `None` for unqualified calls
    pub target: Option<Box<Expr>>,
    /// Method name; `this` / `super` for constructor calls
    pub name: String,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Expr>,
    pub sym: Option<SymbolId>,
    /// Set when resolved in the varargs phase
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct NewClassExpr {
    pub outer: Option<Box<Expr>>,
    pub class_type: TypeExpr,
    /// `new C<>(...)`
    pub diamond: bool,
    pub args: Vec<Expr>,
    /// Anonymous class body
    pub body: Option<Box<ClassDecl>>,
    pub ctor: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct NewArrayExpr {
    /// `None` for bare initializers such as annotation values `{a, b}`
    pub elem_type: Option<TypeExpr>,
    pub dims: Vec<Expr>,
    pub init: Option<Vec<Expr>>,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaParamKind {
    Explicit,
    Implicit,
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<VarDecl>,
    pub param_kind: LambdaParamKind,
    pub body: LambdaBody,
}

#[derive(Debug, Clone)]
pub struct LetExpr {
    pub defs: Vec<Stmt>,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bootstrap {
    TypeSwitch,
    EnumSwitch,
}

impl Bootstrap {
    pub fn method_name(&self) -> &'static str {
        match self {
            Bootstrap::TypeSwitch => "typeSwitch",
            Bootstrap::EnumSwitch => "enumSwitch",
        }
    }
}

/// Static argument of a bootstrap method
#[derive(Debug, Clone, PartialEq)]
pub enum LoadableConstant {
    Int(i32),
    String(String),
    Class(Type),
}

#[derive(Debug, Clone)]
pub struct IndyCall {
    pub bootstrap: Bootstrap,
    pub static_args: Vec<LoadableConstant>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct ErroneousExpr {
    pub exprs: Vec<Expr>,
    /// Inserted by error recovery; removed again by rollback
    pub synthetic: bool,
}
