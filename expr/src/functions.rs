//! Built-in scalar functions and aggregate functions.
//!
//! Aggregates are described by an [`AggregateCall`] in the expression tree.
//! The call is a builder: each group gets a fresh [`Aggregator`] from
//! [`AggregateCall::aggregator`], fed one environment per input document.

use std::cmp::Ordering;
use std::fmt;

use tessera_core::Value;

use crate::{Environment, EvalError, EvalResult, Expr};

/// Scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    /// Lower-case type name of the argument.
    TypeOf,
    /// Length of text (in characters), blob, array or document.
    Len,
    /// First non-null argument.
    Coalesce,
}

impl ScalarFunction {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunction::TypeOf => "TYPEOF",
            ScalarFunction::Len => "LEN",
            ScalarFunction::Coalesce => "COALESCE",
        }
    }

    /// Resolve a function by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TYPEOF" => Some(ScalarFunction::TypeOf),
            "LEN" => Some(ScalarFunction::Len),
            "COALESCE" => Some(ScalarFunction::Coalesce),
            _ => None,
        }
    }

    fn check_arity(&self, actual: usize) -> EvalResult<()> {
        let (ok, expected) = match self {
            ScalarFunction::TypeOf | ScalarFunction::Len => (actual == 1, "1"),
            ScalarFunction::Coalesce => (actual >= 1, "at least 1"),
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::Arity {
                function: self.name().to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
    }
}

/// A call to a scalar function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub function: ScalarFunction,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(function: ScalarFunction, args: Vec<Expr>) -> Self {
        Self { function, args }
    }

    pub(crate) fn eval(&self, env: &Environment<'_>) -> EvalResult<Value> {
        self.function.check_arity(self.args.len())?;

        match self.function {
            ScalarFunction::TypeOf => {
                let v = self.args[0].eval(env)?;
                Ok(Value::Text(v.value_type().as_str().to_string()))
            }
            ScalarFunction::Len => {
                let len = match self.args[0].eval(env)? {
                    Value::Text(s) => s.chars().count(),
                    Value::Blob(b) => b.len(),
                    Value::Array(items) => items.len(),
                    Value::Document(d) => d.len(),
                    _ => return Ok(Value::Null),
                };
                Ok(Value::Integer(len as i64))
            }
            ScalarFunction::Coalesce => {
                for arg in &self.args {
                    let v = arg.eval(env)?;
                    if !v.is_null() {
                        return Ok(v);
                    }
                }
                Ok(Value::Null)
            }
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
        }
    }
}

/// An aggregate function applied to an argument. `arg` is `None` only for
/// `COUNT(*)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    pub arg: Option<Box<Expr>>,
}

impl AggregateCall {
    pub fn new(function: AggregateFunction, arg: Expr) -> Self {
        Self {
            function,
            arg: Some(Box::new(arg)),
        }
    }

    /// `COUNT(*)`.
    pub fn count_all() -> Self {
        Self {
            function: AggregateFunction::Count,
            arg: None,
        }
    }

    /// Build a fresh running aggregator.
    pub fn aggregator(&self) -> Box<dyn Aggregator> {
        let arg = self.arg.as_deref().cloned();
        match (self.function, arg) {
            (AggregateFunction::Count, arg) => Box::new(CountAggregator { arg, count: 0 }),
            (AggregateFunction::Min, Some(arg)) => Box::new(ExtremumAggregator {
                arg,
                keep: Ordering::Less,
                current: None,
            }),
            (AggregateFunction::Max, Some(arg)) => Box::new(ExtremumAggregator {
                arg,
                keep: Ordering::Greater,
                current: None,
            }),
            (AggregateFunction::Sum, Some(arg)) => Box::new(SumAggregator {
                arg,
                sum: None,
            }),
            (AggregateFunction::Avg, Some(arg)) => Box::new(AvgAggregator {
                arg,
                sum: 0.0,
                count: 0,
            }),
            // Only COUNT takes `*`; other functions over `*` see every row as null.
            (_, None) => Box::new(ExtremumAggregator {
                arg: Expr::Literal(Value::Null),
                keep: Ordering::Less,
                current: None,
            }),
        }
    }

    /// Read the finished value of this aggregate from a grouped document,
    /// where it is stored under its rendering.
    pub(crate) fn eval_stored(&self, env: &Environment<'_>) -> EvalResult<Value> {
        let doc = env.document().ok_or(EvalError::NoDocument)?;
        Ok(doc.get(&self.to_string()).cloned().unwrap_or(Value::Null))
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}({})", self.function.name(), arg),
            None => write!(f, "{}(*)", self.function.name()),
        }
    }
}

/// Running state of one aggregate over one group.
pub trait Aggregator {
    /// Fold the document of `env` into the running state.
    fn aggregate(&mut self, env: &Environment<'_>) -> EvalResult<()>;

    /// The aggregate value for everything folded so far.
    fn finish(&self) -> Value;
}

struct CountAggregator {
    arg: Option<Expr>,
    count: i64,
}

impl Aggregator for CountAggregator {
    fn aggregate(&mut self, env: &Environment<'_>) -> EvalResult<()> {
        let counted = match &self.arg {
            None => true,
            Some(arg) => !arg.eval(env)?.is_null(),
        };
        if counted {
            self.count += 1;
        }
        Ok(())
    }

    fn finish(&self) -> Value {
        Value::Integer(self.count)
    }
}

struct ExtremumAggregator {
    arg: Expr,
    keep: Ordering,
    current: Option<Value>,
}

impl Aggregator for ExtremumAggregator {
    fn aggregate(&mut self, env: &Environment<'_>) -> EvalResult<()> {
        let v = self.arg.eval(env)?;
        if v.is_null() {
            return Ok(());
        }
        let replace = match &self.current {
            None => true,
            Some(current) => v.compare(current) == self.keep,
        };
        if replace {
            self.current = Some(v);
        }
        Ok(())
    }

    fn finish(&self) -> Value {
        self.current.clone().unwrap_or(Value::Null)
    }
}

/// Integer sums stay integers until a double is seen or the sum overflows.
struct SumAggregator {
    arg: Expr,
    sum: Option<Value>,
}

impl Aggregator for SumAggregator {
    fn aggregate(&mut self, env: &Environment<'_>) -> EvalResult<()> {
        let v = self.arg.eval(env)?;
        if !v.is_number() {
            return Ok(());
        }
        self.sum = Some(match (self.sum.take(), v) {
            (None, v) => v,
            (Some(Value::Integer(a)), Value::Integer(b)) => match a.checked_add(b) {
                Some(sum) => Value::Integer(sum),
                None => Value::Double(a as f64 + b as f64),
            },
            (Some(a), b) => Value::Double(as_f64(&a) + as_f64(&b)),
        });
        Ok(())
    }

    fn finish(&self) -> Value {
        self.sum.clone().unwrap_or(Value::Null)
    }
}

struct AvgAggregator {
    arg: Expr,
    sum: f64,
    count: u64,
}

impl Aggregator for AvgAggregator {
    fn aggregate(&mut self, env: &Environment<'_>) -> EvalResult<()> {
        let v = self.arg.eval(env)?;
        if v.is_number() {
            self.sum += as_f64(&v);
            self.count += 1;
        }
        Ok(())
    }

    fn finish(&self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Double(self.sum / self.count as f64)
        }
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Integer(i) => *i as f64,
        Value::Double(d) => *d,
        _ => 0.0,
    }
}
