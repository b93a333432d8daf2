//! Documents: ordered field-name to value mappings.

use std::fmt;

use crate::{Path, PathSegment, Type, Value, ValueError, ValueResult};

/// An ordered mapping from field name to value.
///
/// Field names are unique and iteration follows insertion order. Replacing
/// an existing field keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a top-level field, replacing it in place or appending it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove a top-level field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let position = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Look up a nested value by path.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let PathSegment::Field(name) = first else {
            return None;
        };
        let mut current = self.get(name)?;
        for segment in rest {
            current = match (segment, current) {
                (PathSegment::Field(name), Value::Document(d)) => d.get(name)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace the value at `path`, creating what is missing along the way.
    ///
    /// Missing or null intermediate slots become an empty document (before a
    /// field segment) or an empty array (before an index segment). Array
    /// indexes past the end extend the array, padding the gap with nulls.
    /// An existing non-null slot of the wrong kind is an error and leaves
    /// the document untouched.
    pub fn set_path(&mut self, path: &Path, value: Value) -> ValueResult<()> {
        let segments = path.segments();
        let Some((first, rest)) = segments.split_first() else {
            return Err(ValueError::invalid_path("", "cannot replace the whole document"));
        };
        let PathSegment::Field(name) = first else {
            return Err(ValueError::incompatible_path(
                path.to_string(),
                first.to_string(),
                Type::Array,
                Type::Document,
            ));
        };

        check_settable(self.get(name), rest, path)?;
        let slot = self.entry(name);
        set_in_value(slot, rest, value);
        Ok(())
    }

    /// Remove the value at `path`. Returns false, leaving the document
    /// unchanged, when nothing exists there.
    pub fn unset_path(&mut self, path: &Path) -> bool {
        let segments = path.segments();
        let Some((PathSegment::Field(name), rest)) = segments.split_first() else {
            return false;
        };
        if rest.is_empty() {
            return self.remove(name).is_some();
        }
        match self.get_mut(name) {
            Some(slot) => unset_in_value(slot, rest),
            None => false,
        }
    }

    /// Get the slot for `name`, appending a null field when absent.
    fn entry(&mut self, name: &str) -> &mut Value {
        let position = match self.fields.iter().position(|(k, _)| k == name) {
            Some(position) => position,
            None => {
                self.fields.push((name.to_string(), Value::Null));
                self.fields.len() - 1
            }
        };
        &mut self.fields[position].1
    }
}

/// Largest number of null slots a single assignment may pad an array with.
pub const MAX_ARRAY_PADDING: usize = 1 << 16;

/// Walk the existing part of the tree and reject the first non-null slot
/// whose kind does not match the next segment, or an index that would pad
/// an array past `MAX_ARRAY_PADDING`.
fn check_settable(mut current: Option<&Value>, rest: &[PathSegment], path: &Path) -> ValueResult<()> {
    for segment in rest {
        let next = match (segment, current) {
            (PathSegment::Field(_), None | Some(Value::Null)) => None,
            (PathSegment::Index(i), None | Some(Value::Null)) => {
                check_index(path, *i, 0)?;
                None
            }
            (PathSegment::Field(name), Some(Value::Document(d))) => d.get(name),
            (PathSegment::Index(i), Some(Value::Array(items))) => {
                check_index(path, *i, items.len())?;
                items.get(*i)
            }
            (PathSegment::Field(_), Some(other)) => {
                return Err(ValueError::incompatible_path(
                    path.to_string(),
                    segment.to_string(),
                    Type::Document,
                    other.value_type(),
                ))
            }
            (PathSegment::Index(_), Some(other)) => {
                return Err(ValueError::incompatible_path(
                    path.to_string(),
                    segment.to_string(),
                    Type::Array,
                    other.value_type(),
                ))
            }
        };
        current = next;
    }
    Ok(())
}

fn check_index(path: &Path, index: usize, len: usize) -> ValueResult<()> {
    match index.checked_add(1) {
        Some(end) if end.saturating_sub(len) <= MAX_ARRAY_PADDING => Ok(()),
        _ => Err(ValueError::invalid_path(
            path.to_string(),
            format!("index {index} is too far past the end of an array of length {len}"),
        )),
    }
}

/// Assign along a path already validated by `check_settable`.
fn set_in_value(slot: &mut Value, rest: &[PathSegment], value: Value) {
    let Some((segment, rest)) = rest.split_first() else {
        *slot = value;
        return;
    };

    match segment {
        PathSegment::Field(name) => {
            if !matches!(slot, Value::Document(_)) {
                *slot = Value::Document(Document::new());
            }
            if let Value::Document(d) = slot {
                set_in_value(d.entry(name), rest, value);
            }
        }
        PathSegment::Index(index) => {
            if !matches!(slot, Value::Array(_)) {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                if *index >= items.len() {
                    items.resize(*index + 1, Value::Null);
                }
                set_in_value(&mut items[*index], rest, value);
            }
        }
    }
}

fn unset_in_value(slot: &mut Value, rest: &[PathSegment]) -> bool {
    let Some((segment, rest)) = rest.split_first() else {
        return false;
    };

    match (segment, slot) {
        (PathSegment::Field(name), Value::Document(d)) => {
            if rest.is_empty() {
                d.remove(name).is_some()
            } else {
                d.get_mut(name).is_some_and(|child| unset_in_value(child, rest))
            }
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            if *index >= items.len() {
                false
            } else if rest.is_empty() {
                items.remove(*index);
                true
            } else {
                unset_in_value(&mut items[*index], rest)
            }
        }
        _ => false,
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.set(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
