//! Expression tree.
//!
//! Expressions are plain data. Equality is structural, and `Display`
//! produces the canonical rendering used in plans, in the field names of
//! grouped results and in diagnostics.

use std::fmt;

use tessera_core::{Path, Type, Value};

use crate::functions::{AggregateCall, AggregateFunction, FunctionCall};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    In,
    NotIn,
    Concat,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::In => "IN",
            BinaryOp::NotIn => "NOT IN",
            BinaryOp::Concat => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::NotIn => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// An expression paired with the name it is projected under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedExpr {
    pub name: String,
    pub expr: Box<Expr>,
}

impl NamedExpr {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr: Box::new(expr),
        }
    }
}

/// A scalar or aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Value),
    Path(Path),
    /// `*` in a projection list.
    Wildcard,
    Named(NamedExpr),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Array(Vec<Expr>),
    Document(Vec<(String, Expr)>),
    /// `?`, numbered from 1 in order of appearance.
    PositionalParam(usize),
    /// `$name`.
    NamedParam(String),
    Cast {
        expr: Box<Expr>,
        target: Type,
    },
    Function(FunctionCall),
    Aggregate(AggregateCall),
    /// `NEXT VALUE FOR seq`.
    NextValueFor(String),
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// A single top-level field, named verbatim.
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Path(Path::field(name))
    }

    pub fn path(path: Path) -> Self {
        Expr::Path(path)
    }

    pub fn named(name: impl Into<String>, expr: Expr) -> Self {
        Expr::Named(NamedExpr::new(name, expr))
    }

    /// Name an expression after its own rendering, the way an unaliased
    /// projection is named.
    pub fn auto_named(expr: Expr) -> Self {
        let name = expr.to_string();
        Expr::named(name, expr)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOp::Eq, left, right)
    }

    pub fn cast(expr: Expr, target: Type) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            target,
        }
    }

    /// `COUNT(*)`.
    pub fn count_all() -> Self {
        Expr::Aggregate(AggregateCall::count_all())
    }

    pub fn aggregate(function: AggregateFunction, arg: Expr) -> Self {
        Expr::Aggregate(AggregateCall::new(function, arg))
    }

    pub fn next_value_for(sequence: impl Into<String>) -> Self {
        Expr::NextValueFor(sequence.into())
    }

    /// Strip any `Named` wrappers.
    pub fn unwrap_named(&self) -> &Expr {
        match self {
            Expr::Named(named) => named.expr.unwrap_named(),
            other => other,
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_)
            | Expr::Path(_)
            | Expr::Wildcard
            | Expr::PositionalParam(_)
            | Expr::NamedParam(_)
            | Expr::NextValueFor(_) => Vec::new(),
            Expr::Named(named) => vec![named.expr.as_ref()],
            Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Unary { operand, .. } => vec![operand.as_ref()],
            Expr::Array(items) => items.iter().collect(),
            Expr::Document(fields) => fields.iter().map(|(_, e)| e).collect(),
            Expr::Cast { expr, .. } => vec![expr.as_ref()],
            Expr::Function(call) => call.args.iter().collect(),
            Expr::Aggregate(call) => call.arg.iter().map(|a| a.as_ref()).collect(),
        }
    }

    /// Pre-order traversal. The visitor returns false to stop; `walk`
    /// returns false when it was stopped.
    pub fn walk<F>(&self, visitor: &mut F) -> bool
    where
        F: FnMut(&Expr) -> bool,
    {
        if !visitor(self) {
            return false;
        }
        self.children().into_iter().all(|child| child.walk(visitor))
    }

    /// Returns true when any node satisfies `pred`.
    pub fn any<F>(&self, mut pred: F) -> bool
    where
        F: FnMut(&Expr) -> bool,
    {
        !self.walk(&mut |e| !pred(e))
    }

    /// Returns the aggregator builder this expression is, looking through
    /// aliases.
    pub fn as_aggregator(&self) -> Option<&AggregateCall> {
        match self.unwrap_named() {
            Expr::Aggregate(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_aggregator(&self) -> bool {
        self.as_aggregator().is_some()
    }

    /// Returns true when evaluating the expression mutates storage.
    pub fn requires_write(&self) -> bool {
        self.any(|e| matches!(e, Expr::NextValueFor(_)))
    }

    /// Returns true when the expression reads the current document.
    pub fn references_document(&self) -> bool {
        self.any(|e| matches!(e, Expr::Path(_) | Expr::Wildcard))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<Path> for Expr {
    fn from(path: Path) -> Self {
        Expr::Path(path)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, parent: BinaryOp) -> fmt::Result {
    match operand {
        Expr::Binary { op, .. } if op.precedence() < parent.precedence() => {
            write!(f, "({})", operand)
        }
        _ => write!(f, "{}", operand),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Path(p) => write!(f, "{}", p),
            Expr::Wildcard => write!(f, "*"),
            Expr::Named(named) => {
                let inner = named.expr.to_string();
                if inner == named.name {
                    f.write_str(&inner)
                } else {
                    write!(f, "{} AS {}", inner, Path::field(named.name.as_str()))
                }
            }
            Expr::Binary { op, left, right } => {
                write_operand(f, left, *op)?;
                write!(f, " {} ", op.as_str())?;
                write_operand(f, right, *op)
            }
            Expr::Unary { op, operand } => {
                let wrap = matches!(operand.as_ref(), Expr::Binary { .. });
                match op {
                    UnaryOp::Not => write!(f, "NOT ")?,
                    UnaryOp::Neg => write!(f, "-")?,
                }
                if wrap {
                    write!(f, "({})", operand)
                } else {
                    write!(f, "{}", operand)
                }
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::Document(fields) => {
                write!(f, "{{")?;
                for (i, (name, expr)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", Path::field(name.as_str()), expr)?;
                }
                write!(f, "}}")
            }
            Expr::PositionalParam(_) => write!(f, "?"),
            Expr::NamedParam(name) => write!(f, "${}", name),
            Expr::Cast { expr, target } => {
                write!(f, "CAST({} AS {})", expr, target.as_str().to_uppercase())
            }
            Expr::Function(call) => {
                write!(f, "{}(", call.function.name())?;
                write_list(f, &call.args)?;
                write!(f, ")")
            }
            Expr::Aggregate(call) => write!(f, "{}", call),
            Expr::NextValueFor(seq) => write!(f, "NEXT VALUE FOR {}", Path::field(seq.as_str())),
        }
    }
}
