//! Conversions between value types.
//!
//! `CAST(x AS type)` and the LIMIT/OFFSET evaluation both go through
//! these functions.

use crate::{Type, Value, ValueError, ValueResult};

/// Cast to an integer.
///
/// Doubles are truncated toward zero and must fit in an i64; bools become
/// 0 or 1; text must hold a number.
pub fn cast_as_integer(v: &Value) -> ValueResult<i64> {
    match v {
        Value::Integer(i) => Ok(*i),
        Value::Bool(b) => Ok(*b as i64),
        Value::Double(d) => double_to_integer(*d).ok_or_else(|| fail(v, Type::Integer)),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            s.parse::<f64>()
                .ok()
                .and_then(double_to_integer)
                .ok_or_else(|| fail(v, Type::Integer))
        }
        _ => Err(fail(v, Type::Integer)),
    }
}

/// Cast to a double.
pub fn cast_as_double(v: &Value) -> ValueResult<f64> {
    match v {
        Value::Double(d) => Ok(*d),
        Value::Integer(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s.trim().parse::<f64>().map_err(|_| fail(v, Type::Double)),
        _ => Err(fail(v, Type::Double)),
    }
}

/// Cast to a bool.
pub fn cast_as_bool(v: &Value) -> ValueResult<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::Double(d) => Ok(*d != 0.0),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(fail(v, Type::Bool)),
        },
        _ => Err(fail(v, Type::Bool)),
    }
}

/// Cast to text. Text is returned as-is; other scalars and containers use
/// their canonical rendering.
pub fn cast_as_text(v: &Value) -> ValueResult<String> {
    match v {
        Value::Text(s) => Ok(s.clone()),
        Value::Null => Err(fail(v, Type::Text)),
        Value::Blob(bytes) => String::from_utf8(bytes.clone()).map_err(|_| fail(v, Type::Text)),
        other => Ok(other.to_string()),
    }
}

impl Value {
    /// Cast to the target type. Null casts to null for every target.
    pub fn cast(&self, target: Type) -> ValueResult<Value> {
        if self.is_null() || self.value_type() == target {
            return Ok(self.clone());
        }
        match target {
            Type::Integer => cast_as_integer(self).map(Value::Integer),
            Type::Double => cast_as_double(self).map(Value::Double),
            Type::Bool => cast_as_bool(self).map(Value::Bool),
            Type::Text => cast_as_text(self).map(Value::Text),
            Type::Blob => match self {
                Value::Text(s) => Ok(Value::Blob(s.as_bytes().to_vec())),
                _ => Err(fail(self, target)),
            },
            Type::Null | Type::Array | Type::Document => Err(fail(self, target)),
        }
    }
}

fn double_to_integer(d: f64) -> Option<i64> {
    let truncated = d.trunc();
    // i64::MAX is not representable as f64; the bound is exclusive.
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

fn fail(v: &Value, to: Type) -> ValueError {
    ValueError::cast(v.value_type(), to, v.to_string())
}
