//! Abstract syntax tree of one source unit.

use crate::core::diag::Span;

/// Top-level shape of a parsed source unit.
#[derive(Debug, Clone)]
pub enum UnitTree {
    Function(FunctionDef),
    Class(ClassDef),
}

impl UnitTree {
    pub fn name(&self) -> &str {
        match self {
            UnitTree::Function(def) => &def.name,
            UnitTree::Class(def) => &def.name,
        }
    }

    /// All function definitions in the unit, methods included, in
    /// declaration order.
    pub fn defs(&self) -> Vec<&FunctionDef> {
        match self {
            UnitTree::Function(def) => vec![def],
            UnitTree::Class(def) => def.methods.iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_annotation: Option<String>,
    pub docstring: Option<DocString>,
    pub body: Vec<Stmt>,
    /// Set for defs that live inside a class body.
    pub is_method: bool,
    /// Lines of the `def` header, decorators included.
    pub header_span: Span,
    /// Lines of the whole definition.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
    pub has_default: bool,
    pub span: Span,
}

impl Param {
    /// Implicit instance-binding receivers are exempt from annotation checks.
    pub fn is_receiver(&self, is_method: bool, index: usize) -> bool {
        is_method && index == 0 && (self.name == "self" || self.name == "cls")
    }
}

#[derive(Debug, Clone)]
pub struct DocString {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<String>,
    pub docstring: Option<DocString>,
    pub methods: Vec<FunctionDef>,
    /// Class-body statements that are not methods (class attributes etc.).
    pub body: Vec<Stmt>,
    pub header_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        augmented: Option<BinaryOp>,
    },
    Return(Option<Expr>),
    Raise(Option<Expr>),
    Assert(Expr),
    If {
        /// `(condition, body)` per arm; the trailing `else` arm has no
        /// condition.
        arms: Vec<(Option<Expr>, Vec<Stmt>)>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        finally_body: Vec<Stmt>,
    },
    With {
        body: Vec<Stmt>,
    },
    FuncDef(Box<FunctionDef>),
    Import,
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Name(String),
    Int(i64),
    Float(String),
    Str(String),
    Bool(bool),
    NoneLit,
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        target: Box<Expr>,
        attr: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        target: Box<Expr>,
        parts: Vec<Option<Expr>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Lambda {
        body: Box<Expr>,
    },
    /// Conditional expression `then if cond else or_else`.
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        or_else: Box<Expr>,
    },
    /// List/set/generator comprehension; structurally a loop.
    Comprehension {
        elem: Box<Expr>,
        iter: Box<Expr>,
        cond: Option<Box<Expr>>,
    },
    Yield(Option<Box<Expr>>),
    Starred(Box<Expr>),
}

impl Expr {
    /// A literal or a bare name: nothing a learner would have to compute.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Int(_)
                | ExprKind::Float(_)
                | ExprKind::Str(_)
                | ExprKind::Bool(_)
                | ExprKind::NoneLit
                | ExprKind::Name(_)
        )
    }

    /// Dotted callee name as written (`self.helper`, `items.sort`).
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name(name) => Some(name.clone()),
            ExprKind::Attribute { target, attr } => {
                target.dotted_name().map(|base| format!("{base}.{attr}"))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Pow,
    Div,
    FloorDiv,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}
