//! Conversion between wire JSON and typed [`Value`]s.
//!
//! # Design
//! - `decode` is tolerant: a mapping with an unknown `__type` tag decodes to
//!   `None` (absent) so newer servers do not break older clients.
//! - `encode` is strict: an unsaved entity cannot be referenced, so it fails
//!   with an argument error instead of silently sending a body.
//! - `Response` inspects a response body once and tells results envelopes
//!   apart from bare objects.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};

use crate::client::Client;
use crate::datatypes::{Bytes, Date, File, GeoPoint, Pointer};
use crate::error::{ClientError, Result};
use crate::object::RemoteObject;
use crate::protocol::{self, KEY_CLASS_NAME, KEY_RESULTS, KEY_TYPE};
use crate::value::Value;

/// Decode a wire value. `class_name` is the hint used for untagged
/// mappings; it applies to the top level and to array elements, while
/// fields of a decoded entity are decoded without a hint.
pub fn decode(class_name: Option<&str>, raw: &Json) -> Option<Value> {
    match raw {
        Json::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| decode(class_name, item).unwrap_or(Value::Null))
                .collect(),
        )),
        Json::Object(map) if map.contains_key(KEY_TYPE) => decode_datatype(map),
        Json::Object(map) => match class_name {
            Some(class_name) => Some(Value::from(decode_object(class_name, map))),
            None => Some(Value::from(raw.clone())),
        },
        primitive => Some(Value::from(primitive.clone())),
    }
}

fn decode_datatype(map: &Map<String, Json>) -> Option<Value> {
    let tag = map.get(KEY_TYPE)?.as_str()?;
    match tag {
        protocol::TYPE_POINTER => Pointer::from_json(map).map(Value::Pointer),
        protocol::TYPE_BYTES => Bytes::from_json(map).map(Value::Bytes),
        protocol::TYPE_DATE => Date::from_json(map).map(Value::Date),
        protocol::TYPE_GEOPOINT => GeoPoint::from_json(map).map(Value::GeoPoint),
        protocol::TYPE_FILE => Some(Value::File(File::from_json(map))),
        // Included relations arrive as full objects carrying their class.
        protocol::TYPE_OBJECT => {
            let class_name = map.get(KEY_CLASS_NAME)?.as_str()?;
            Some(Value::from(decode_object(class_name, map)))
        }
        _ => None,
    }
}

/// Build an entity of `class_name` from an untagged mapping, decoding
/// each field without a class hint.
pub fn decode_object(class_name: &str, map: &Map<String, Json>) -> RemoteObject {
    let fields: BTreeMap<String, Value> = map
        .iter()
        .filter_map(|(k, v)| decode(None, v).map(|v| (k.clone(), v)))
        .collect();
    let mut object = RemoteObject::new(class_name);
    object.hydrate(fields);
    object
}

/// Convert a value to its outgoing wire form. Entities become pointers
/// and must have been saved.
pub fn encode(value: &Value) -> Result<Json> {
    match value {
        Value::Object(object) => object
            .pointer()
            .map(|p| p.to_json())
            .ok_or_else(|| {
                ClientError::Argument(format!(
                    "new object used in context requiring pointer {}",
                    object.class_name()
                ))
            }),
        Value::Array(items) => items.iter().map(encode).collect::<Result<Vec<_>>>().map(Json::Array),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| encode(v).map(|v| (k.clone(), v)))
            .collect::<Result<Map<_, _>>>()
            .map(Json::Object),
        other => Ok(other.to_json()),
    }
}

/// Re-attach `client` to every entity reachable from `value`.
pub fn attach_client(value: &mut Value, client: &Client) {
    match value {
        Value::Object(object) => object.attach_client(client),
        Value::Array(items) => items.iter_mut().for_each(|item| attach_client(item, client)),
        Value::Map(map) => map.values_mut().for_each(|item| attach_client(item, client)),
        _ => {}
    }
}

/// Shape of a response body from a collection or instance endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `{"results": [...], ...}`; `extra` holds the other top-level keys.
    Envelope {
        results: Vec<Json>,
        extra: Map<String, Json>,
    },
    /// A single object.
    Bare(Map<String, Json>),
}

impl Response {
    pub fn from_json(body: Json) -> Result<Self> {
        match body {
            Json::Object(mut map) => match map.remove(KEY_RESULTS) {
                Some(Json::Array(results)) => Ok(Response::Envelope {
                    results,
                    extra: map,
                }),
                Some(other) => {
                    map.insert(KEY_RESULTS.to_string(), other);
                    Ok(Response::Bare(map))
                }
                None => Ok(Response::Bare(map)),
            },
            other => Err(ClientError::ResponseShape(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}
