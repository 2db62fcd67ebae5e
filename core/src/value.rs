//! The tagged value store used for entity fields.
//!
//! # Design
//! A field holds one of a closed set of kinds: JSON primitives, arrays and
//! plain mappings, or one of the special types from [`crate::datatypes`].
//! Nested entities are held by value in `Object`.
//!
//! `From<serde_json::Value>` is a plain conversion that does not interpret
//! `__type` tags; use [`crate::codec::decode`] for wire data.

use std::collections::BTreeMap;

use serde_json::{Number, Value as Json};

use crate::datatypes::{ArrayOp, Bytes, Date, File, GeoPoint, Increment, Pointer};
use crate::object::RemoteObject;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Pointer(Pointer),
    Date(Date),
    Bytes(Bytes),
    GeoPoint(GeoPoint),
    File(File),
    Object(Box<RemoteObject>),
    Increment(Increment),
    ArrayOp(ArrayOp),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_geopoint(&self) -> Option<&GeoPoint> {
        match self {
            Value::GeoPoint(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Value::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RemoteObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut RemoteObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<RemoteObject> {
        match self {
            Value::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// True for a plain mapping tagged as a relation. Relations are
    /// server-managed and never written back.
    pub fn is_relation(&self) -> bool {
        match self {
            Value::Map(map) => {
                map.get(crate::protocol::KEY_TYPE).and_then(Value::as_str)
                    == Some(crate::protocol::TYPE_RELATION)
            }
            _ => false,
        }
    }

    /// Full JSON representation. Nested entities render in full, not as
    /// pointers; see [`crate::codec::encode`] for the outgoing form.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Pointer(p) => p.to_json(),
            Value::Date(d) => d.to_json(),
            Value::Bytes(b) => b.to_json(),
            Value::GeoPoint(g) => g.to_json(),
            Value::File(f) => f.to_json(),
            Value::Object(o) => o.to_json(),
            Value::Increment(i) => i.to_json(),
            Value::ArrayOp(op) => op.to_json(),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Pointer> for Value {
    fn from(p: Pointer) -> Self {
        Value::Pointer(p)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<GeoPoint> for Value {
    fn from(g: GeoPoint) -> Self {
        Value::GeoPoint(g)
    }
}

impl From<File> for Value {
    fn from(f: File) -> Self {
        Value::File(f)
    }
}

impl From<RemoteObject> for Value {
    fn from(o: RemoteObject) -> Self {
        Value::Object(Box::new(o))
    }
}

impl From<Increment> for Value {
    fn from(i: Increment) -> Self {
        Value::Increment(i)
    }
}

impl From<ArrayOp> for Value {
    fn from(op: ArrayOp) -> Self {
        Value::ArrayOp(op)
    }
}
