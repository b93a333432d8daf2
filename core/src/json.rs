//! JSON interop for values and documents.

use serde_json::{Map, Number};

use crate::{Document, Value, ValueError, ValueResult};

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    /// Convert to JSON. Blobs become arrays of bytes; non-finite doubles
    /// become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Double(d) => Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Blob(bytes) => serde_json::Value::Array(
                bytes.iter().map(|b| serde_json::Value::Number((*b).into())).collect(),
            ),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Document(d) => d.to_json(),
        }
    }
}

impl Document {
    /// Parse a JSON object into a document, keeping field order.
    pub fn from_json_str(input: &str) -> ValueResult<Document> {
        let json: serde_json::Value = serde_json::from_str(input).map_err(|e| ValueError::Json {
            message: e.to_string(),
        })?;
        Document::try_from(json)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = Map::with_capacity(self.len());
        for (k, v) in self.iter() {
            map.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = ValueError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Document(d) => Ok(d),
            other => Err(ValueError::Json {
                message: format!("expected an object, got {}", other.value_type()),
            }),
        }
    }
}
