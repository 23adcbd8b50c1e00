#![forbid(unsafe_code)]

use crate::{Ident, Span};

/// Compiled invariant expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Bare property or relation name (`age`, `ITEMS`).
    Name(String),
    /// `$name`; `$self` is `Var("self")`.
    Var(String),
    /// `base.member`
    Member {
        base: Box<Expr>,
        member: Ident,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `lhs -> Op(args) |$a, $b| { body }`
    Pipeline {
        lhs: Box<Expr>,
        op: PipeOp,
        args: Vec<Expr>,
        lambda: Option<Lambda>,
    },
    /// Free-standing built-in call such as `Len(name)`.
    Call {
        func: Ident,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Option<Box<Expr>>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub span: Span,
    /// Parameter names without the leading `$`.
    pub params: Vec<Ident>,
    pub body: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    And,
    Or,
    Xor,

    In,
    Match,
    NotMatch,
}

/// Pipeline operators. The first nine take a lambda.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipeOp {
    All,
    Any,
    AllOrNone,
    Filter,
    Map,
    Count,
    Reduce,
    Then,
    With,

    Len,
    Sum,
    Min,
    Max,
    First,
    Last,
    Unique,
    Sort,
    Reverse,
    Compact,
}

impl PipeOp {
    pub fn takes_lambda(&self) -> bool {
        matches!(
            self,
            PipeOp::All
                | PipeOp::Any
                | PipeOp::AllOrNone
                | PipeOp::Filter
                | PipeOp::Map
                | PipeOp::Count
                | PipeOp::Reduce
                | PipeOp::Then
                | PipeOp::With
        )
    }

    /// Operators whose result holds the same kind of element as their input.
    pub fn preserves_element(&self) -> bool {
        matches!(
            self,
            PipeOp::Filter
                | PipeOp::First
                | PipeOp::Last
                | PipeOp::Unique
                | PipeOp::Sort
                | PipeOp::Reverse
                | PipeOp::Compact
        )
    }
}

impl Expr {
    pub fn new(span: Span, kind: ExprKind) -> Self {
        Self { span, kind }
    }
}
