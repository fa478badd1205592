//! The lowered form that the interpreter runs.
//!
//! Expressions live in an arena owned by [`Body`]; statements own their
//! nested blocks directly.

use la_arena::{Arena, Idx};

pub type Expr = Idx<ExprData>;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
    Bytes(Box<[u8]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Eq,
    GtE,
    LtE,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Index(Expr),
    Slice { lower: Option<Expr>, upper: Option<Expr>, step: Option<Expr> },
}

/// One `for ... in ... if ...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub target: Target,
    pub iter: Expr,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprData {
    Const(Constant),
    Name(Box<str>),
    Unary(UnaryOp, Expr),
    Binary(Expr, BinaryOp, Expr),
    Compare(Expr, Vec<(CompareOp, Expr)>),
    Bool(BoolOp, Vec<Expr>),
    IfElse { test: Expr, body: Expr, orelse: Expr },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// `element` is the key for dict comprehensions, `value` its value.
    Comprehension {
        kind: ComprehensionKind,
        element: Expr,
        value: Option<Expr>,
        generators: Vec<Generator>,
    },
    Subscript(Expr, Subscript),
    Call(Expr, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(Box<str>),
    Subscript(Expr, Subscript),
    Sequence(Vec<Target>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Assign { targets: Vec<Target>, value: Expr },
    AugAssign { target: Target, op: BinaryOp, value: Expr },
    Delete(Vec<Target>),
    Pass,
    /// `if` and `elif` arms in source order.
    If { branches: Vec<(Expr, Vec<Stmt>)>, orelse: Vec<Stmt> },
    While { test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt> },
    For { target: Target, iter: Expr, body: Vec<Stmt>, orelse: Vec<Stmt> },
    Break,
    Continue,
    Assert { test: Expr, message: Option<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Expression(Expr),
    Module(Vec<Stmt>),
}

/// A lowered tree: the expression arena plus what to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub exprs: Arena<ExprData>,
    pub entry: Entry,
}
