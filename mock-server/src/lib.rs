//! In-memory Booked REST server for tests and local development.
//!
//! Generic classes live under `/classes/{class}`; users, resources,
//! reservations and accessories use their fixed endpoints and require a
//! session from `/Authentication/Authenticate`. The store understands the
//! `__op` field operations and a subset of query operators.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const BASE_PATH: &str = "/booked/Web/Services/index.php";
pub const HEADER_USER_ID: &str = "X-Booked-UserId";
pub const HEADER_SESSION_TOKEN: &str = "X-Booked-SessionToken";

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";
pub const ADMIN_ID: &str = "1";

const RESERVED_KEYS: [&str; 5] = ["id", "className", "createdAt", "updatedAt", "sessionToken"];

pub type Object = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: Option<i64>,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(101), "object not found for get")
    }

    fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(102), message)
    }

    fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(111), message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, None, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message });
        if let Some(code) = self.code {
            body["code"] = json!(code);
        }
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

struct Credentials {
    password: String,
    user_id: String,
}

struct StoredFile {
    content_type: String,
    body: Vec<u8>,
}

#[derive(Default)]
pub struct Store {
    classes: HashMap<String, BTreeMap<String, Object>>,
    credentials: HashMap<String, Credentials>,
    /// session token -> user id
    sessions: HashMap<String, String>,
    files: HashMap<String, StoredFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    #[serde(rename = "where")]
    pub constraints: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub count: Option<String>,
    pub keys: Option<String>,
    pub include: Option<String>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Store {
    /// A store holding the admin account and one resource and accessory.
    pub fn seeded() -> Self {
        let mut store = Self::default();
        store.insert(
            "user",
            ADMIN_ID,
            json!({"username": ADMIN_USERNAME, "firstName": "Admin", "lastName": "User"}),
        );
        store.credentials.insert(
            ADMIN_USERNAME.to_string(),
            Credentials {
                password: ADMIN_PASSWORD.to_string(),
                user_id: ADMIN_ID.to_string(),
            },
        );
        store.insert(
            "resource",
            "1",
            json!({"name": "Conference Room", "statusId": 1, "typeId": 1}),
        );
        store.insert("accessory", "1", json!({"name": "Projector", "quantityAvailable": 2}));
        store
    }

    fn insert(&mut self, class_name: &str, id: &str, fields: Value) {
        let mut object = match fields {
            Value::Object(map) => map,
            _ => Object::new(),
        };
        let ts = now();
        object.insert("id".into(), json!(id));
        object.insert("createdAt".into(), json!(ts));
        object.insert("updatedAt".into(), json!(ts));
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .insert(id.to_string(), object);
    }

    pub fn create(&mut self, class_name: &str, body: Object) -> ApiResult<Object> {
        let mut object = Object::new();
        apply_update(&mut object, body)?;

        let id = new_id();
        if class_name == "user" {
            let password = object.remove("password");
            if let (Some(Value::String(username)), Some(Value::String(password))) =
                (object.get("username"), password)
            {
                self.credentials.insert(
                    username.clone(),
                    Credentials {
                        password,
                        user_id: id.clone(),
                    },
                );
            }
        }

        let ts = now();
        object.insert("id".into(), json!(id));
        object.insert("createdAt".into(), json!(ts));
        object.insert("updatedAt".into(), json!(ts));
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .insert(id.clone(), object);
        tracing::info!("created {class_name}:{id}");

        let mut response = Object::new();
        response.insert("id".into(), json!(id));
        response.insert("createdAt".into(), json!(ts));
        Ok(response)
    }

    pub fn get(&self, class_name: &str, id: &str) -> ApiResult<Object> {
        self.classes
            .get(class_name)
            .and_then(|objects| objects.get(id))
            .cloned()
            .ok_or_else(ApiError::not_found)
    }

    /// Apply `body` and answer with the new `updatedAt` plus the resulting
    /// values of every field changed by an operation.
    pub fn update(&mut self, class_name: &str, id: &str, body: Object) -> ApiResult<Object> {
        let object = self
            .classes
            .get_mut(class_name)
            .and_then(|objects| objects.get_mut(id))
            .ok_or_else(ApiError::not_found)?;

        let mut updated = object.clone();
        let touched = apply_update(&mut updated, body)?;
        let ts = now();
        updated.insert("updatedAt".into(), json!(ts));

        let mut response = Object::new();
        response.insert("updatedAt".into(), json!(ts));
        for field in touched {
            if let Some(value) = updated.get(&field) {
                response.insert(field, value.clone());
            }
        }
        *object = updated;
        tracing::info!("updated {class_name}:{id}");
        Ok(response)
    }

    pub fn delete(&mut self, class_name: &str, id: &str) -> ApiResult<()> {
        self.classes
            .get_mut(class_name)
            .and_then(|objects| objects.remove(id))
            .map(|_| tracing::info!("deleted {class_name}:{id}"))
            .ok_or_else(ApiError::not_found)
    }

    pub fn query(&self, class_name: &str, params: &QueryParams) -> ApiResult<Value> {
        let constraints = match params.constraints.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ApiError::invalid_query(format!("invalid where: {e}")))?,
            None => json!({}),
        };

        let mut matched = Vec::new();
        for object in self.objects(class_name) {
            if matches(object, &constraints)? {
                matched.push(object.clone());
            }
        }
        if let Some(order) = &params.order {
            sort_by_order(&mut matched, order);
        }

        let total = matched.len();
        let results: Vec<Value> = matched
            .into_iter()
            .skip(params.skip.unwrap_or(0))
            .take(params.limit.unwrap_or(usize::MAX))
            .map(|object| match &params.keys {
                Some(keys) => Value::Object(select_keys(object, keys)),
                None => Value::Object(object),
            })
            .collect();

        let mut response = json!({ "results": results });
        if matches!(params.count.as_deref(), Some("1") | Some("true")) {
            response["count"] = json!(total);
        }
        Ok(response)
    }

    fn objects(&self, class_name: &str) -> impl Iterator<Item = &Object> {
        self.classes.get(class_name).into_iter().flat_map(BTreeMap::values)
    }

    fn authenticate(&mut self, username: &str, password: &str) -> ApiResult<(String, String)> {
        let user_id = self
            .credentials
            .get(username)
            .filter(|c| c.password == password)
            .map(|c| c.user_id.clone())
            .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;
        let token = new_id();
        self.sessions.insert(token.clone(), user_id.clone());
        Ok((token, user_id))
    }

    fn authorize(&self, headers: &HeaderMap) -> ApiResult<()> {
        match (header_str(headers, HEADER_USER_ID), header_str(headers, HEADER_SESSION_TOKEN)) {
            (Some(user_id), Some(token))
                if self.sessions.get(token).is_some_and(|owner| owner == user_id) =>
            {
                Ok(())
            }
            _ => Err(ApiError::unauthorized("not authenticated")),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Apply a request body to `object`. Returns the fields changed by an
/// `__op` other than `Delete`.
fn apply_update(object: &mut Object, body: Object) -> ApiResult<Vec<String>> {
    let mut touched = Vec::new();
    for (key, value) in body {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let op = value.get("__op").and_then(Value::as_str).map(str::to_string);
        match op.as_deref() {
            None => {
                object.insert(key, value);
            }
            Some("Delete") => {
                object.remove(&key);
            }
            Some("Increment") => {
                let amount = value
                    .get("amount")
                    .filter(|a| a.is_number())
                    .ok_or_else(|| ApiError::invalid_operation("Increment needs a numeric amount"))?;
                let current = object.get(&key).cloned().unwrap_or(json!(0));
                let next = match (current.as_i64(), amount.as_i64()) {
                    (Some(c), Some(a)) => json!(c + a),
                    _ => match (current.as_f64(), amount.as_f64()) {
                        (Some(c), Some(a)) => json!(c + a),
                        _ => return Err(ApiError::invalid_operation(format!("{key} is not a number"))),
                    },
                };
                object.insert(key.clone(), next);
                touched.push(key);
            }
            Some(name @ ("Add" | "AddUnique" | "Remove")) => {
                let objects = value
                    .get("objects")
                    .and_then(Value::as_array)
                    .cloned()
                    .ok_or_else(|| ApiError::invalid_operation(format!("{name} needs objects")))?;
                let Value::Array(items) = object.entry(key.clone()).or_insert_with(|| json!([])) else {
                    return Err(ApiError::invalid_operation(format!("{key} is not an array")));
                };
                match name {
                    "Add" => items.extend(objects),
                    "AddUnique" => {
                        for item in objects {
                            if !items.contains(&item) {
                                items.push(item);
                            }
                        }
                    }
                    _ => items.retain(|item| !objects.contains(item)),
                }
                touched.push(key);
            }
            Some("AddRelation") => {
                let class_name = value
                    .pointer("/objects/0/className")
                    .cloned()
                    .unwrap_or(Value::Null);
                object
                    .entry(key)
                    .or_insert_with(|| json!({"__type": "Relation", "className": class_name}));
            }
            Some("RemoveRelation") => {}
            Some(other) => {
                return Err(ApiError::invalid_operation(format!("unknown operation {other}")));
            }
        }
    }
    Ok(touched)
}

fn matches(object: &Object, constraints: &Value) -> ApiResult<bool> {
    let Value::Object(constraints) = constraints else {
        return Err(ApiError::invalid_query("where must be an object"));
    };
    for (field, constraint) in constraints {
        if field == "$or" {
            let Value::Array(branches) = constraint else {
                return Err(ApiError::invalid_query("$or must be an array"));
            };
            let mut any = false;
            for branch in branches {
                if matches(object, branch)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
            continue;
        }
        if field.starts_with('$') {
            return Err(ApiError::invalid_query(format!("unsupported operator {field}")));
        }

        let value = object.get(field);
        let ok = match constraint {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                let mut all = true;
                for (op, operand) in ops {
                    if !check(op, value, operand)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            expected => equals(value, expected),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality, where an array field matches any of its elements.
fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(value) => value == expected,
        None => false,
    }
}

fn check(op: &str, value: Option<&Value>, operand: &Value) -> ApiResult<bool> {
    let ordered = |accept: fn(Ordering) -> bool| {
        value
            .and_then(|v| compare(v, operand))
            .is_some_and(accept)
    };
    let list = || {
        operand
            .as_array()
            .ok_or_else(|| ApiError::invalid_query(format!("{op} needs an array")))
    };
    Ok(match op {
        "$ne" => !equals(value, operand),
        "$lt" => ordered(Ordering::is_lt),
        "$lte" => ordered(Ordering::is_le),
        "$gt" => ordered(Ordering::is_gt),
        "$gte" => ordered(Ordering::is_ge),
        "$in" => list()?.iter().any(|candidate| equals(value, candidate)),
        "$nin" => !list()?.iter().any(|candidate| equals(value, candidate)),
        "$all" => {
            let wanted = list()?;
            match value {
                Some(Value::Array(items)) => wanted.iter().all(|w| items.contains(w)),
                _ => false,
            }
        }
        "$exists" => operand.as_bool().unwrap_or(true) == value.is_some(),
        other => return Err(ApiError::invalid_query(format!("unsupported operator {other}"))),
    })
}

/// Numbers and strings compare naturally; tagged dates compare by `iso`.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Object(x), Value::Object(y)) => compare(x.get("iso")?, y.get("iso")?),
        _ => None,
    }
}

fn sort_by_order(objects: &mut [Object], order: &str) {
    let keys: Vec<(&str, bool)> = order
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| match k.strip_prefix('-') {
            Some(field) => (field, true),
            None => (k, false),
        })
        .collect();
    objects.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ord = match (a.get(*field), b.get(*field)) {
                (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn select_keys(object: Object, keys: &str) -> Object {
    let wanted: Vec<&str> = keys.split(',').map(str::trim).collect();
    object
        .into_iter()
        .filter(|(k, _)| RESERVED_KEYS.contains(&k.as_str()) || wanted.contains(&k.as_str()))
        .collect()
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_store(Store::seeded())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/classes/{class}", get(list_objects).post(create_object))
        .route(
            "/classes/{class}/{id}",
            get(get_object).put(update_object).delete(delete_object),
        )
        .route("/Authentication/Authenticate", post(authenticate))
        .route("/Users/", fixed_collection("user"))
        .route("/Users/{id}", fixed_instance("user"))
        .route("/Resources/", fixed_collection("resource"))
        .route("/Resources/{id}", fixed_instance("resource"))
        .route("/Resources/Status", get(resource_statuses))
        .route("/Resources/Status/Reasons", get(resource_status_reasons))
        .route("/Resources/Types", get(resource_types))
        .route("/Resources/Availability", get(resource_availability))
        .route("/Resources/Groups", get(resource_groups))
        .route("/Reservations/", fixed_collection("reservation"))
        .route("/Reservations/{id}", fixed_instance("reservation"))
        .route("/Reservations/{id}/Approval", post(approve_reservation))
        .route("/Accessories/", fixed_collection("accessory"))
        .route("/Accessories/{id}", fixed_instance("accessory"))
        .route("/files/{name}", post(upload_file).get(download_file))
        .with_state(db);
    Router::new().nest(BASE_PATH, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- generic classes ---

async fn list_objects(
    State(db): State<Db>,
    Path(class_name): Path<String>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Value>> {
    db.read().await.query(&class_name, &params).map(Json)
}

async fn create_object(
    State(db): State<Db>,
    Path(class_name): Path<String>,
    Json(body): Json<Object>,
) -> ApiResult<(StatusCode, Json<Object>)> {
    let created = db.write().await.create(&class_name, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_object(
    State(db): State<Db>,
    Path((class_name, id)): Path<(String, String)>,
) -> ApiResult<Json<Object>> {
    db.read().await.get(&class_name, &id).map(Json)
}

async fn update_object(
    State(db): State<Db>,
    Path((class_name, id)): Path<(String, String)>,
    Json(body): Json<Object>,
) -> ApiResult<Json<Object>> {
    db.write().await.update(&class_name, &id, body).map(Json)
}

async fn delete_object(
    State(db): State<Db>,
    Path((class_name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    db.write().await.delete(&class_name, &id)?;
    Ok(Json(json!({})))
}

// --- fixed endpoints ---

fn fixed_collection(class_name: &'static str) -> MethodRouter<Db> {
    get(
        move |State(db): State<Db>, headers: HeaderMap, Query(params): Query<QueryParams>| {
            fixed_list(db, class_name, headers, params)
        },
    )
    .post(
        move |State(db): State<Db>, headers: HeaderMap, Json(body): Json<Object>| {
            fixed_create(db, class_name, headers, body)
        },
    )
}

fn fixed_instance(class_name: &'static str) -> MethodRouter<Db> {
    get(move |State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>| {
        fixed_get(db, class_name, headers, id)
    })
    .put(
        move |State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Object>| {
            fixed_update(db, class_name, headers, id, body)
        },
    )
    .delete(move |State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>| {
        fixed_delete(db, class_name, headers, id)
    })
}

async fn fixed_list(
    db: Db,
    class_name: &'static str,
    headers: HeaderMap,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    store.authorize(&headers)?;
    store.query(class_name, &params).map(Json)
}

async fn fixed_create(
    db: Db,
    class_name: &'static str,
    headers: HeaderMap,
    body: Object,
) -> ApiResult<(StatusCode, Json<Object>)> {
    let mut store = db.write().await;
    store.authorize(&headers)?;
    let created = store.create(class_name, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn fixed_get(
    db: Db,
    class_name: &'static str,
    headers: HeaderMap,
    id: String,
) -> ApiResult<Json<Object>> {
    let store = db.read().await;
    store.authorize(&headers)?;
    store.get(class_name, &id).map(Json)
}

async fn fixed_update(
    db: Db,
    class_name: &'static str,
    headers: HeaderMap,
    id: String,
    body: Object,
) -> ApiResult<Json<Object>> {
    let mut store = db.write().await;
    store.authorize(&headers)?;
    store.update(class_name, &id, body).map(Json)
}

async fn fixed_delete(
    db: Db,
    class_name: &'static str,
    headers: HeaderMap,
    id: String,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    store.authorize(&headers)?;
    store.delete(class_name, &id)?;
    Ok(Json(json!({})))
}

// --- authentication ---

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

async fn authenticate(State(db): State<Db>, Json(login): Json<Login>) -> ApiResult<Json<Value>> {
    let (token, user_id) = db.write().await.authenticate(&login.username, &login.password)?;
    tracing::info!("session opened for {}", login.username);
    Ok(Json(json!({
        "sessionToken": token,
        "userId": user_id,
        "isAuthenticated": true,
    })))
}

// --- resources ---

async fn resource_statuses(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    db.read().await.authorize(&headers)?;
    Ok(Json(json!({
        "statuses": [
            {"id": 0, "name": "Hidden"},
            {"id": 1, "name": "Available"},
            {"id": 2, "name": "Unavailable"},
        ]
    })))
}

async fn resource_status_reasons(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    db.read().await.authorize(&headers)?;
    Ok(Json(json!({
        "reasons": [{"id": 1, "description": "Under maintenance", "statusId": 2}]
    })))
}

async fn resource_types(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    db.read().await.authorize(&headers)?;
    Ok(Json(json!({
        "types": [{"id": 1, "name": "Room", "description": "Meeting room"}]
    })))
}

#[derive(Deserialize)]
struct AvailabilityParams {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

async fn resource_availability(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<AvailabilityParams>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    store.authorize(&headers)?;
    let at = params.date_time.unwrap_or_else(now);
    let resources: Vec<Value> = store
        .objects("resource")
        .map(|resource| {
            json!({
                "available": true,
                "resource": {"id": resource.get("id"), "name": resource.get("name")},
                "availableAt": at,
            })
        })
        .collect();
    Ok(Json(json!({ "resources": resources })))
}

async fn resource_groups(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    db.read().await.authorize(&headers)?;
    Ok(Json(json!({
        "groups": [{"id": 1, "name": "Main building", "type": "group", "children": []}]
    })))
}

// --- reservations ---

async fn approve_reservation(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    store.authorize(&headers)?;
    let mut body = Object::new();
    body.insert("requiresApproval".into(), json!(false));
    store.update("reservation", &id, body)?;
    Ok(Json(json!({
        "referenceNumber": id,
        "requiresApproval": false,
        "message": "The reservation was approved",
    })))
}

// --- files ---

async fn upload_file(
    State(db): State<Db>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let stored = format!("{}-{name}", new_id());
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str())
        .unwrap_or("application/octet-stream")
        .to_string();
    db.write().await.files.insert(
        stored.clone(),
        StoredFile {
            content_type,
            body: body.to_vec(),
        },
    );
    tracing::info!("stored file {stored} ({} bytes)", body.len());
    let url = format!("{BASE_PATH}/files/{stored}");
    (StatusCode::CREATED, Json(json!({ "name": stored, "url": url })))
}

async fn download_file(State(db): State<Db>, Path(name): Path<String>) -> Response {
    match db.read().await.files.get(&name) {
        Some(file) => (
            [(header::CONTENT_TYPE, file.content_type.clone())],
            file.body.clone(),
        )
            .into_response(),
        None => ApiError::not_found().into_response(),
    }
}
