//! A stored entity with local field state and pending array operations.
//!
//! # Design
//! - The object id is assigned once, from the first create response, and
//!   never changes afterwards.
//! - Array helpers update the local view eagerly because the server does
//!   not echo field values on create. Once the object has an id they also
//!   queue one operation kind per field until the next save.
//! - Equality is by (class name, id) for saved objects and by identity for
//!   unsaved ones. A clone of an unsaved object is a new identity.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value as Json};

use crate::client::Client;
use crate::codec;
use crate::datatypes::{ArrayOp, ArrayOperation, Date, Increment, Pointer};
use crate::error::{ClientError, Result};
use crate::http::HttpMethod;
use crate::protocol::{self, KEY_CLASS_NAME, KEY_CREATED_AT, KEY_OBJECT_ID, KEY_TYPE, KEY_UPDATED_AT};
use crate::value::Value;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

fn next_instance() -> u64 {
    NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
}

/// Fields removed from a user after every successful save.
const USER_SENSITIVE_FIELDS: [&str; 2] = ["password", "username"];

pub struct RemoteObject {
    class_name: String,
    id: Option<String>,
    created_at: Option<Date>,
    updated_at: Option<Date>,
    fields: BTreeMap<String, Value>,
    op_fields: BTreeMap<String, ArrayOp>,
    client: Option<Client>,
    instance: u64,
}

impl RemoteObject {
    /// An unsaved object with no client. Remote operations fail with
    /// `NotInitialized` until a client is attached.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            id: None,
            created_at: None,
            updated_at: None,
            fields: BTreeMap::new(),
            op_fields: BTreeMap::new(),
            client: None,
            instance: next_instance(),
        }
    }

    pub fn with_client(class_name: impl Into<String>, client: &Client) -> Self {
        let mut object = Self::new(class_name);
        object.client = Some(client.clone());
        object
    }

    /// A handle to an existing object known only by id.
    pub fn with_id(class_name: impl Into<String>, id: impl Into<String>, client: &Client) -> Self {
        let mut object = Self::with_client(class_name, client);
        object.id = Some(id.into());
        object
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created_at(&self) -> Option<&Date> {
        self.created_at.as_ref()
    }

    pub fn updated_at(&self) -> Option<&Date> {
        self.updated_at.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    /// Bind this object, and every entity nested in its fields, to `client`.
    pub fn attach_client(&mut self, client: &Client) {
        self.client = Some(client.clone());
        for value in self.fields.values_mut() {
            codec::attach_client(value, client);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Array operations queued for the next save.
    pub fn pending_ops(&self) -> &BTreeMap<String, ArrayOp> {
        &self.op_fields
    }

    pub fn pointer(&self) -> Option<Pointer> {
        self.id
            .as_ref()
            .map(|id| Pointer::new(self.class_name.clone(), id.clone()))
    }

    pub fn uri(&self) -> String {
        protocol::entity_uri(&self.class_name, self.id.as_deref())
    }

    fn require_client(&self) -> Result<Client> {
        self.client.clone().ok_or(ClientError::NotInitialized)
    }

    fn require_id(&self, action: &str) -> Result<String> {
        self.id
            .clone()
            .ok_or_else(|| ClientError::Argument(format!("cannot {action} unsaved {} object", self.class_name)))
    }

    /// The body sent on create: reserved keys and relations dropped, nulls
    /// turned into delete markers, entities turned into pointers.
    pub fn safe_body(&self) -> Result<Map<String, Json>> {
        let mut body = Map::new();
        for (key, value) in &self.fields {
            if protocol::is_reserved_key(key) || value.is_relation() {
                continue;
            }
            let wire = match value {
                Value::Null => protocol::delete_op(),
                other => codec::encode(other)?,
            };
            body.insert(key.clone(), wire);
        }
        Ok(body)
    }

    /// The body sent on update: the safe body with pending operations
    /// replacing the local view of their fields.
    pub fn update_body(&self) -> Result<Map<String, Json>> {
        let mut body = self.safe_body()?;
        for (field, op) in &self.op_fields {
            body.insert(field.clone(), op.to_json());
        }
        Ok(body)
    }

    /// Full representation: fields plus class name, id and timestamps.
    pub fn to_json(&self) -> Json {
        let mut map: Map<String, Json> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        map.insert(KEY_CLASS_NAME.to_string(), Json::String(self.class_name.clone()));
        if let Some(id) = &self.id {
            map.insert(KEY_OBJECT_ID.to_string(), Json::String(id.clone()));
        }
        if let Some(created) = &self.created_at {
            map.insert(KEY_CREATED_AT.to_string(), Json::String(created.iso8601()));
        }
        if let Some(updated) = &self.updated_at {
            map.insert(KEY_UPDATED_AT.to_string(), Json::String(updated.iso8601()));
        }
        Json::Object(map)
    }

    /// Merge decoded fields into this object. Identity and timestamp keys
    /// are lifted out of the field map; the id is only taken if unset.
    pub(crate) fn hydrate(&mut self, data: BTreeMap<String, Value>) {
        for (key, value) in data {
            match key.as_str() {
                KEY_OBJECT_ID => {
                    if self.id.is_none() {
                        if let Value::String(id) = value {
                            self.id = Some(id);
                        }
                    }
                }
                KEY_CREATED_AT => {
                    if let Some(date) = timestamp(&value) {
                        self.created_at = Some(date);
                    }
                }
                KEY_UPDATED_AT => {
                    if let Some(date) = timestamp(&value) {
                        self.updated_at = Some(date);
                    }
                }
                KEY_TYPE | KEY_CLASS_NAME => {}
                _ => {
                    self.fields.insert(key, value);
                }
            }
        }
    }

    /// Merge a raw response body, keeping nested entities on `client`.
    pub(crate) fn absorb(&mut self, data: &Json, client: &Client) {
        if let Json::Object(map) = data {
            let mut fields: BTreeMap<String, Value> = map
                .iter()
                .filter_map(|(k, v)| codec::decode(None, v).map(|v| (k.clone(), v)))
                .collect();
            for value in fields.values_mut() {
                codec::attach_client(value, client);
            }
            self.hydrate(fields);
        }
    }

    /// Create the object (POST) or write its changes (PUT).
    pub fn save(&mut self) -> Result<&mut Self> {
        let client = self.require_client()?;
        let (method, body) = if self.id.is_some() {
            (HttpMethod::Put, self.update_body()?)
        } else {
            (HttpMethod::Post, self.safe_body()?)
        };

        tracing::debug!("{method} {} ({} fields)", self.uri(), body.len());
        let data = client.request(method, &self.uri(), Some(Json::Object(body)))?;
        self.absorb(&data, &client);
        self.op_fields.clear();

        if self.class_name == protocol::CLASS_USER {
            for field in USER_SENSITIVE_FIELDS {
                self.fields.remove(field);
            }
        }
        Ok(self)
    }

    /// Set every given field, then save.
    pub fn update_attributes<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in data {
            self.set(k, v);
        }
        self.save()
    }

    /// Replace local state with the server's. A failed fetch leaves the
    /// object untouched.
    pub fn refresh(&mut self) -> Result<&mut Self> {
        let Some(id) = self.id.clone() else {
            return Ok(self);
        };
        let client = self.require_client()?;
        let fresh = client
            .fetch(&self.class_name, Some(&id))?
            .into_object()
            .ok_or_else(|| ClientError::ResponseShape(format!("expected a single {} object", self.class_name)))?;

        self.op_fields.clear();
        self.fields.clear();
        self.created_at = fresh.created_at.or(self.created_at);
        self.updated_at = fresh.updated_at.or(self.updated_at);
        self.fields = fresh.fields;
        Ok(self)
    }

    /// Remove the remote record and clear local state. Unsaved objects are
    /// left as they are.
    pub fn delete(&mut self) -> Result<()> {
        if self.id.is_none() {
            return Ok(());
        }
        let client = self.require_client()?;
        client.delete(&self.uri())?;
        self.fields.clear();
        self.op_fields.clear();
        Ok(())
    }

    /// Atomically add `amount` to a numeric field on the server and take
    /// the server's view of the object.
    pub fn increment(&mut self, field: &str, amount: i64) -> Result<&mut Self> {
        self.require_id("increment")?;
        let client = self.require_client()?;
        let mut body = Map::new();
        body.insert(field.to_string(), Increment::new(amount).to_json());
        let data = client.put(&self.uri(), Json::Object(body))?;
        self.absorb(&data, &client);
        Ok(self)
    }

    pub fn decrement(&mut self, field: &str, amount: i64) -> Result<&mut Self> {
        self.increment(field, -amount)
    }

    pub fn add(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.array_op(field, ArrayOperation::Add, value.into())
    }

    pub fn add_unique(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.array_op(field, ArrayOperation::AddUnique, value.into())
    }

    pub fn remove_value(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.array_op(field, ArrayOperation::Remove, value.into())
    }

    pub fn add_relation(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.array_op(field, ArrayOperation::AddRelation, value.into())
    }

    pub fn remove_relation(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.array_op(field, ArrayOperation::RemoveRelation, value.into())
    }

    fn array_op(&mut self, field: &str, operation: ArrayOperation, value: Value) -> Result<()> {
        if let Some(current) = self.fields.get(field) {
            if !matches!(current, Value::Array(_) | Value::Null) {
                return Err(ClientError::Argument(format!("field {field} not an array")));
            }
        }

        if self.id.is_some() {
            let wire = codec::encode(&value)?;
            match self.op_fields.get_mut(field) {
                Some(pending) if pending.operation != operation => {
                    return Err(ClientError::Argument(format!(
                        "only one operation type allowed per array {field}: {} already pending, got {operation}",
                        pending.operation
                    )));
                }
                Some(pending) => pending.objects.push(wire),
                None => {
                    self.op_fields
                        .insert(field.to_string(), ArrayOp::new(operation, vec![wire]));
                }
            }
        }

        match operation {
            ArrayOperation::Add | ArrayOperation::AddRelation => match self.fields.get_mut(field) {
                Some(Value::Array(items)) => items.push(value),
                _ => {
                    self.fields.insert(field.to_string(), Value::Array(vec![value]));
                }
            },
            ArrayOperation::AddUnique => match self.fields.get_mut(field) {
                Some(Value::Array(items)) => {
                    if !items.iter().any(|item| same_value(item, &value)) {
                        items.push(value);
                    }
                }
                _ => {
                    self.fields.insert(field.to_string(), Value::Array(vec![value]));
                }
            },
            ArrayOperation::Remove | ArrayOperation::RemoveRelation => {
                if let Some(Value::Array(items)) = self.fields.get_mut(field) {
                    items.retain(|item| !same_value(item, &value));
                }
            }
        }
        Ok(())
    }
}

/// Array membership for the local view: a saved object and a pointer to it
/// are the same element.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(o), Value::Pointer(p)) | (Value::Pointer(p), Value::Object(o)) => **o == *p,
        _ => a == b,
    }
}

fn timestamp(value: &Value) -> Option<Date> {
    match value {
        Value::String(s) => Date::parse(s).ok(),
        Value::Date(d) => Some(*d),
        _ => None,
    }
}

impl Clone for RemoteObject {
    fn clone(&self) -> Self {
        Self {
            class_name: self.class_name.clone(),
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields: self.fields.clone(),
            op_fields: self.op_fields.clone(),
            client: self.client.clone(),
            instance: next_instance(),
        }
    }
}

impl PartialEq for RemoteObject {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b && self.class_name == other.class_name,
            _ => self.instance == other.instance,
        }
    }
}

impl Eq for RemoteObject {}

impl Hash for RemoteObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.id {
            Some(id) => {
                self.class_name.hash(state);
                id.hash(state);
            }
            None => self.instance.hash(state),
        }
    }
}

impl PartialEq<Pointer> for RemoteObject {
    fn eq(&self, other: &Pointer) -> bool {
        self.id.as_deref() == Some(other.id()) && self.class_name == other.class_name()
    }
}

impl PartialEq<RemoteObject> for Pointer {
    fn eq(&self, other: &RemoteObject) -> bool {
        other == self
    }
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("class_name", &self.class_name)
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("fields", &self.fields)
            .field("op_fields", &self.op_fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_name, self.id.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use serde_json::json;

    fn saved(class_name: &str, id: &str) -> RemoteObject {
        codec::decode_object(class_name, json!({ "id": id }).as_object().unwrap())
    }

    fn hash_of(object: &RemoteObject) -> u64 {
        let mut hasher = DefaultHasher::new();
        object.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn saved_objects_compare_by_class_and_id() {
        let mut a = saved("Room", "r1");
        let b = saved("Room", "r1");
        a.set("seats", 4);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, saved("Desk", "r1"));
    }

    #[test]
    fn unsaved_objects_are_only_equal_to_themselves() {
        let a = RemoteObject::new("Room");
        let b = RemoteObject::new("Room");
        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_ne!(a, a.clone());
    }

    #[test]
    fn pointer_equals_its_object() {
        let room = saved("Room", "r1");
        let pointer = room.pointer().unwrap();
        assert_eq!(room, pointer);
        assert_eq!(pointer, room);
        assert!(RemoteObject::new("Room").pointer().is_none());
    }

    #[test]
    fn hydrate_assigns_id_once() {
        let mut room = saved("Room", "r1");
        let mut update = BTreeMap::new();
        update.insert("id".to_string(), Value::from("r2"));
        update.insert("updatedAt".to_string(), Value::from("2021-05-01T00:00:00.000Z"));
        room.hydrate(update);
        assert_eq!(room.id(), Some("r1"));
        assert!(room.updated_at().is_some());
        assert!(!room.contains_key("id"));
        assert!(!room.contains_key("updatedAt"));
    }

    #[test]
    fn safe_body_strips_reserved_keys_and_relations() {
        let mut room = RemoteObject::new("Room");
        room.set("name", "Blue");
        room.set("sessionToken", "secret");
        room.set("className", "Other");
        room.set("gone", Value::Null);
        room.set("members", Value::from(json!({"__type": "Relation", "className": "user"})));
        room.set("owner", saved("user", "u1"));
        let body = room.safe_body().unwrap();
        assert_eq!(
            Json::Object(body),
            json!({
                "name": "Blue",
                "gone": {"__op": "Delete"},
                "owner": {"__type": "Pointer", "className": "user", "id": "u1"},
            })
        );
    }

    #[test]
    fn safe_body_rejects_unsaved_references() {
        let mut room = RemoteObject::new("Room");
        room.set("owner", RemoteObject::new("user"));
        assert!(matches!(room.safe_body(), Err(ClientError::Argument(_))));
    }

    #[test]
    fn array_helpers_update_local_view_before_first_save() {
        let mut room = RemoteObject::new("Room");
        room.add("tags", "a").unwrap();
        room.add_unique("tags", "a").unwrap();
        room.add_unique("tags", "b").unwrap();
        room.add("tags", "a").unwrap();
        assert_eq!(room.get("tags").unwrap().to_json(), json!(["a", "a", "b", "a"]));
        room.remove_value("tags", "a").unwrap();
        assert_eq!(room.get("tags").unwrap().to_json(), json!(["b"]));
        assert!(room.pending_ops().is_empty());
    }

    #[test]
    fn array_helpers_reject_non_array_fields() {
        let mut room = RemoteObject::new("Room");
        room.set("tags", "not a list");
        assert!(matches!(room.add("tags", "a"), Err(ClientError::Argument(_))));
    }

    #[test]
    fn pending_ops_accumulate_per_kind() {
        let mut room = saved("Room", "r1");
        room.add("tags", "a").unwrap();
        room.add("tags", "b").unwrap();
        let op = &room.pending_ops()["tags"];
        assert_eq!(op.operation, ArrayOperation::Add);
        assert_eq!(op.objects, vec![json!("a"), json!("b")]);

        let err = room.remove_value("tags", "a").unwrap_err();
        assert!(matches!(err, ClientError::Argument(_)));
        // the rejected operation leaves the local view alone
        assert_eq!(room.get("tags").unwrap().to_json(), json!(["a", "b"]));
    }

    #[test]
    fn array_view_matches_saved_objects_against_pointers() {
        let team = || {
            codec::decode_object(
                "Team",
                json!({
                    "id": "t1",
                    "members": [{"__type": "Pointer", "className": "user", "id": "u1"}]
                })
                .as_object()
                .unwrap(),
            )
        };
        let member = saved("user", "u1");

        let mut joined = team();
        joined.add_unique("members", member.clone()).unwrap();
        assert_eq!(joined.get("members").and_then(Value::as_array).map(Vec::len), Some(1));

        let mut left = team();
        left.remove_value("members", member).unwrap();
        assert_eq!(left.get("members").unwrap().to_json(), json!([]));
        assert_eq!(
            Json::Object(left.update_body().unwrap()),
            json!({"members": {"__op": "Remove", "objects": [
                {"__type": "Pointer", "className": "user", "id": "u1"}
            ]}})
        );
    }

    #[test]
    fn update_body_prefers_pending_ops() {
        let mut room = saved("Room", "r1");
        room.set("name", "Blue");
        room.add_unique("tags", "x").unwrap();
        let body = room.update_body().unwrap();
        assert_eq!(
            Json::Object(body),
            json!({"name": "Blue", "tags": {"__op": "AddUnique", "objects": ["x"]}})
        );
    }

    #[test]
    fn remote_operations_need_a_client() {
        let mut room = RemoteObject::new("Room");
        assert!(matches!(room.save(), Err(ClientError::NotInitialized)));
        // unsaved refresh and delete are no-ops
        assert!(room.refresh().is_ok());
        assert!(room.delete().is_ok());
    }

    #[test]
    fn increment_requires_an_id() {
        let mut room = RemoteObject::new("Room");
        assert!(matches!(room.increment("count", 1), Err(ClientError::Argument(_))));
    }

    #[test]
    fn full_representation() {
        let mut room = saved("Room", "r1");
        room.set("seats", 4);
        assert_eq!(room.to_json(), json!({"className": "Room", "id": "r1", "seats": 4}));
        assert_eq!(room.to_string(), "Room:r1");
    }
}
