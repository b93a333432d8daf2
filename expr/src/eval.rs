//! Expression evaluation.

use std::cmp::Ordering;

use tessera_core::{Document, Value};
use tracing::trace;

use crate::{BinaryOp, Environment, EvalError, EvalResult, Expr, UnaryOp};

impl Expr {
    /// Evaluate against an environment.
    ///
    /// Paths read the nearest document; a missing field evaluates to null.
    /// Aggregates read the field their rendering names, which is where a
    /// grouping stage stores finished aggregate values.
    pub fn eval(&self, env: &Environment<'_>) -> EvalResult<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path(path) => {
                let doc = env.document().ok_or(EvalError::NoDocument)?;
                Ok(doc.get_path(path).cloned().unwrap_or(Value::Null))
            }
            Expr::Wildcard => Err(EvalError::not_scalar("*")),
            Expr::Named(named) => named.expr.eval(env),
            Expr::Binary { op, left, right } => eval_binary(*op, left, right, env),
            Expr::Unary { op, operand } => {
                let v = operand.eval(env)?;
                Ok(match (*op, v) {
                    (_, Value::Null) => Value::Null,
                    (UnaryOp::Not, v) => Value::Bool(!v.is_truthy()),
                    (UnaryOp::Neg, Value::Integer(i)) => match i.checked_neg() {
                        Some(n) => Value::Integer(n),
                        None => Value::Double(-(i as f64)),
                    },
                    (UnaryOp::Neg, Value::Double(d)) => Value::Double(-d),
                    (UnaryOp::Neg, _) => Value::Null,
                })
            }
            Expr::Array(items) => items
                .iter()
                .map(|item| item.eval(env))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            Expr::Document(fields) => {
                let mut doc = Document::with_capacity(fields.len());
                for (name, expr) in fields {
                    doc.set(name.clone(), expr.eval(env)?);
                }
                Ok(Value::Document(doc))
            }
            Expr::PositionalParam(index) => env.positional_param(*index),
            Expr::NamedParam(name) => env.named_param(name),
            Expr::Cast { expr, target } => Ok(expr.eval(env)?.cast(*target)?),
            Expr::Function(call) => call.eval(env),
            Expr::Aggregate(call) => call.eval_stored(env),
            Expr::NextValueFor(sequence) => {
                let value = env.catalog()?.next_sequence_value(sequence)?;
                trace!(sequence = %sequence, value, "sequence advanced");
                Ok(Value::Integer(value))
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, env: &Environment<'_>) -> EvalResult<Value> {
    // AND and OR short-circuit on the left operand.
    match op {
        BinaryOp::And => {
            let l = left.eval(env)?;
            if !l.is_truthy() {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(right.eval(env)?.is_truthy()));
        }
        BinaryOp::Or => {
            let l = left.eval(env)?;
            if l.is_truthy() {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(right.eval(env)?.is_truthy()));
        }
        _ => {}
    }

    let l = left.eval(env)?;
    let r = right.eval(env)?;
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }

    Ok(match op {
        BinaryOp::Eq => Value::Bool(values_equal(&l, &r)),
        BinaryOp::NotEq => Value::Bool(!values_equal(&l, &r)),
        BinaryOp::Lt => compare(&l, &r, |o| o == Ordering::Less),
        BinaryOp::LtEq => compare(&l, &r, |o| o != Ordering::Greater),
        BinaryOp::Gt => compare(&l, &r, |o| o == Ordering::Greater),
        BinaryOp::GtEq => compare(&l, &r, |o| o != Ordering::Less),
        BinaryOp::In => Value::Bool(contains(&r, &l)),
        BinaryOp::NotIn => Value::Bool(!contains(&r, &l)),
        BinaryOp::Concat => match (l, r) {
            (Value::Text(a), Value::Text(b)) => Value::Text(a + &b),
            _ => Value::Null,
        },
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &l, &r)
        }
        BinaryOp::And => Value::Bool(l.is_truthy() && r.is_truthy()),
        BinaryOp::Or => Value::Bool(l.is_truthy() || r.is_truthy()),
    })
}

/// Equality across the numeric domain; other types must match exactly.
fn values_equal(l: &Value, r: &Value) -> bool {
    l.value_type().is_comparable_with(r.value_type()) && l.compare(r) == Ordering::Equal
}

/// Ordering comparisons between values of unrelated types are false.
fn compare(l: &Value, r: &Value, accept: impl Fn(Ordering) -> bool) -> Value {
    if !l.value_type().is_comparable_with(r.value_type()) {
        return Value::Bool(false);
    }
    Value::Bool(accept(l.compare(r)))
}

/// `x IN y`: membership when `y` is an array, equality otherwise.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        other => values_equal(other, needle),
    }
}

/// Integer arithmetic that overflows falls back to doubles. Division or
/// modulo by zero and non-numeric operands yield null.
fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            let checked = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div if b == 0 => return Value::Null,
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Mod if b == 0 => return Value::Null,
                BinaryOp::Mod => a.checked_rem(b),
                _ => return Value::Null,
            };
            match checked {
                Some(v) => Value::Integer(v),
                None => double_arithmetic(op, a as f64, b as f64),
            }
        }
        (Value::Integer(_) | Value::Double(_), Value::Integer(_) | Value::Double(_)) => {
            double_arithmetic(op, to_f64(l), to_f64(r))
        }
        _ => Value::Null,
    }
}

fn double_arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Double(a + b),
        BinaryOp::Sub => Value::Double(a - b),
        BinaryOp::Mul => Value::Double(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => Value::Null,
        BinaryOp::Div => Value::Double(a / b),
        BinaryOp::Mod => Value::Double(a % b),
        _ => Value::Null,
    }
}

fn to_f64(v: &Value) -> f64 {
    match v {
        Value::Integer(i) => *i as f64,
        Value::Double(d) => *d,
        _ => f64::NAN,
    }
}
