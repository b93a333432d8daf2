//! Value types for Tessera documents.
//!
//! Values are the immutable data flowing through query pipelines.
//! Tessera supports scalar types (Null, Bool, Integer, Double, Text, Blob)
//! and container types (Array, Document) nested to any depth.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Document, Path, PathSegment};

/// The type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Bool,
    Integer,
    Double,
    Text,
    Blob,
    Array,
    Document,
}

impl Type {
    /// Returns true for integer and double.
    pub fn is_number(&self) -> bool {
        matches!(self, Type::Integer | Type::Double)
    }

    /// Returns true when values of the two types can be ordered against
    /// each other by value rather than by type rank.
    pub fn is_comparable_with(&self, other: Type) -> bool {
        self.rank() == other.rank()
    }

    /// Lower-case name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Bool => "bool",
            Type::Integer => "integer",
            Type::Double => "double",
            Type::Text => "text",
            Type::Blob => "blob",
            Type::Array => "array",
            Type::Document => "document",
        }
    }

    /// Sort rank across types. Integers and doubles share a rank so they
    /// compare numerically with each other.
    fn rank(&self) -> u8 {
        match self {
            Type::Null => 0,
            Type::Bool => 1,
            Type::Integer | Type::Double => 2,
            Type::Text => 3,
            Type::Blob => 4,
            Type::Array => 5,
            Type::Document => 6,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored in a document field or produced by an expression.
///
/// Equality and hashing are structural: two values are equal when they have
/// the same type and the same contents, recursively. Doubles compare by
/// their bit pattern so that equality stays reflexive and usable as a hash
/// key. Use [`Value::compare`] for the ordering used by sorting, which
/// treats integers and doubles as one numeric domain.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null/missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested document.
    Document(Document),
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Integer(_) => Type::Integer,
            Value::Double(_) => Type::Double,
            Value::Text(_) => Type::Text,
            Value::Blob(_) => Type::Blob,
            Value::Array(_) => Type::Array,
            Value::Document(_) => Type::Document,
        }
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for integer and double values.
    pub fn is_number(&self) -> bool {
        self.value_type().is_number()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Truthiness used by filters and logical operators.
    ///
    /// Null, false, zero, and empty text/blob/array/document are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Double(d) => *d != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Blob(b) => !b.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Document(d) => !d.is_empty(),
        }
    }

    /// Look up a nested value. Returns None when any segment is missing or
    /// addresses the wrong container kind.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Field(name), Value::Document(d)) => d.get(name)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Total ordering used by sorting and MIN/MAX.
    ///
    /// Values are ranked by type first (null < bool < numbers < text < blob
    /// < array < document). Integers and doubles compare numerically with
    /// each other; arrays and documents compare element by element.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => compare_doubles(*a, *b),
            (Value::Integer(a), Value::Double(b)) => compare_integer_double(*a, *b),
            (Value::Double(a), Value::Integer(b)) => compare_integer_double(*b, *a).reverse(),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => compare_seq(a.iter(), b.iter()),
            (Value::Document(a), Value::Document(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.compare(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.value_type().rank().cmp(&other.value_type().rank()),
        }
    }
}

/// Numeric order on doubles. Zeroes of either sign are equal and NaN sorts
/// after every other number.
fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer against a double, without rounding the
/// integer through `f64`.
fn compare_integer_double(i: i64, d: f64) -> Ordering {
    // 2^63, the first double above i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if d.is_nan() || d >= LIMIT {
        return Ordering::Less;
    }
    if d < -LIMIT {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    i.cmp(&(whole as i64)).then_with(|| compare_doubles(whole, d))
}

fn compare_seq<'a>(
    a: impl Iterator<Item = &'a Value>,
    mut b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    for left in a {
        match b.next() {
            None => return Ordering::Greater,
            Some(right) => {
                let ord = left.compare(right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
    if b.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Blob(b) => b.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Document(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{:?}", d),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Blob(bytes) => {
                write!(f, "\"\\x")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, "\"")
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Document(d) => write!(f, "{}", d),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Value::Document(d)
    }
}
