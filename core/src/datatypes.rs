//! Special value types carried inside entity fields.
//!
//! Each type knows its own `{"__type": ...}` (or `{"__op": ...}`) wire form
//! via `to_json`, and the tagged ones can be rebuilt from a wire mapping via
//! `from_json`. Decoding of arbitrary values is the codec's job.

use std::fmt;
use std::hash::{Hash, Hasher};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value as Json};

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::object::RemoteObject;
use crate::protocol::{self, KEY_CLASS_NAME, KEY_OBJECT_ID, KEY_OP, KEY_TYPE};

/// Reference to a stored entity by class name and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    class_name: String,
    object_id: String,
}

impl Pointer {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn id(&self) -> &str {
        &self.object_id
    }

    pub fn from_json(data: &Map<String, Json>) -> Option<Self> {
        let class_name = data.get(KEY_CLASS_NAME)?.as_str()?;
        let object_id = data.get(KEY_OBJECT_ID)?.as_str()?;
        Some(Self::new(class_name, object_id))
    }

    pub fn to_json(&self) -> Json {
        json!({
            KEY_TYPE: protocol::TYPE_POINTER,
            KEY_CLASS_NAME: self.class_name,
            KEY_OBJECT_ID: self.object_id,
        })
    }

    /// Retrieve the entity this pointer references.
    pub fn fetch(&self, client: &Client) -> Result<RemoteObject> {
        client.get_object(&self.class_name, &self.object_id)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_name, self.object_id)
    }
}

/// A UTC instant. Wire form is ISO-8601 with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(DateTime<Utc>);

impl Date {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn parse(iso: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(iso)
            .map(|d| Self(d.with_timezone(&Utc)))
            .map_err(|e| ClientError::Deserialization(format!("invalid date {iso:?}: {e}")))
    }

    pub fn from_json(data: &Map<String, Json>) -> Option<Self> {
        let iso = data.get(protocol::KEY_ISO)?.as_str()?;
        Self::parse(iso).ok()
    }

    pub fn iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_json(&self) -> Json {
        json!({ KEY_TYPE: protocol::TYPE_DATE, protocol::KEY_ISO: self.iso8601() })
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso8601())
    }
}

/// Binary payload, base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn from_json(data: &Map<String, Json>) -> Option<Self> {
        let encoded = data.get(protocol::KEY_BASE64)?.as_str()?;
        // Servers may wrap long payloads across lines.
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        BASE64.decode(compact).ok().map(Self)
    }

    pub fn to_json(&self) -> Json {
        json!({ KEY_TYPE: protocol::TYPE_BYTES, protocol::KEY_BASE64: BASE64.encode(&self.0) })
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn from_json(data: &Map<String, Json>) -> Option<Self> {
        let latitude = data.get(protocol::KEY_LATITUDE)?.as_f64()?;
        let longitude = data.get(protocol::KEY_LONGITUDE)?.as_f64()?;
        Some(Self::new(latitude, longitude))
    }

    pub fn to_json(&self) -> Json {
        json!({
            KEY_TYPE: protocol::TYPE_GEOPOINT,
            protocol::KEY_LATITUDE: self.latitude,
            protocol::KEY_LONGITUDE: self.longitude,
        })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    name: String,
    url: String,
}

/// A file attachment. Local files carry a body until uploaded; decoded
/// files only carry the remote name and URL.
#[derive(Debug, Clone, Default)]
pub struct File {
    pub local_name: Option<String>,
    pub remote_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub url: Option<String>,
}

impl File {
    pub fn new(local_name: impl Into<String>, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            local_name: Some(local_name.into()),
            content_type: Some(content_type.into()),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn from_json(data: &Map<String, Json>) -> Self {
        let text = |key: &str| data.get(key).and_then(Json::as_str).map(str::to_string);
        Self {
            remote_name: text(protocol::KEY_NAME),
            url: text(protocol::KEY_URL),
            ..Self::default()
        }
    }

    /// Upload the body and record the remote name and URL.
    pub fn save(&mut self, client: &Client) -> Result<()> {
        let local_name = self
            .local_name
            .as_deref()
            .ok_or_else(|| ClientError::Argument("file has no local name to upload".into()))?;
        let content_type = self
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let response = client.upload(&protocol::file_uri(local_name), self.body.clone(), content_type)?;
        let uploaded: UploadResponse = serde_json::from_value(response)
            .map_err(|e| ClientError::ResponseShape(format!("file upload response: {e}")))?;
        self.remote_name = Some(uploaded.name);
        self.url = Some(uploaded.url);
        Ok(())
    }

    pub fn to_json(&self) -> Json {
        json!({
            KEY_TYPE: protocol::TYPE_FILE,
            protocol::KEY_NAME: self.remote_name,
            protocol::KEY_URL: self.url,
        })
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Hash for File {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// Signed delta applied to a numeric field by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Increment {
    pub amount: i64,
}

impl Increment {
    pub fn new(amount: i64) -> Self {
        Self { amount }
    }

    pub fn to_json(&self) -> Json {
        json!({ KEY_OP: protocol::OP_INCREMENT, protocol::KEY_AMOUNT: self.amount })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayOperation {
    Add,
    AddUnique,
    Remove,
    AddRelation,
    RemoveRelation,
}

impl ArrayOperation {
    pub fn name(self) -> &'static str {
        match self {
            ArrayOperation::Add => protocol::OP_ADD,
            ArrayOperation::AddUnique => protocol::OP_ADD_UNIQUE,
            ArrayOperation::Remove => protocol::OP_REMOVE,
            ArrayOperation::AddRelation => protocol::OP_ADD_RELATION,
            ArrayOperation::RemoveRelation => protocol::OP_REMOVE_RELATION,
        }
    }
}

impl fmt::Display for ArrayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pending array mutation. `objects` already hold wire values.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayOp {
    pub operation: ArrayOperation,
    pub objects: Vec<Json>,
}

impl ArrayOp {
    pub fn new(operation: ArrayOperation, objects: Vec<Json>) -> Self {
        Self { operation, objects }
    }

    pub fn to_json(&self) -> Json {
        json!({ KEY_OP: self.operation.name(), protocol::KEY_OBJECTS: self.objects })
    }
}
