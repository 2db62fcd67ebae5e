//! Transport client for the booking REST API.
//!
//! # Design
//! `Client` is a cheap, clonable handle (`Arc` inside) that entities and
//! queries hold on to. Each call is split into three steps:
//! - `build_request` produces an `HttpRequest` with the auth headers,
//! - the configured [`Transport`] executes it,
//! - `parse_response` classifies the `HttpResponse` into JSON or a
//!   [`ClientError`].
//!
//! `request` wraps the last two in the retry loop. Every call runs its own
//! loop; the only shared state is the read-only config and the session,
//! which is written solely by the login flow.

use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use serde_json::{Map, Value as Json};

use crate::codec::{self, Response};
use crate::config::ClientConfig;
use crate::error::{ClientError, ProtocolError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::object::RemoteObject;
use crate::protocol;
use crate::query::Query;
use crate::transport::UreqTransport;
use crate::value::Value;

/// Authentication context attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub session_token: Option<String>,
}

struct Inner {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    session: RwLock<Session>,
}

#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// A client using the blocking `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let session = Session {
            user_id: config.user_id.clone(),
            session_token: config.session_token.clone(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                transport: Box::new(transport),
                session: RwLock::new(session),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Session {
        self.inner.session.read().clone()
    }

    pub(crate) fn set_session(&self, session: Session) {
        *self.inner.session.write() = session;
    }

    /// An unsaved entity bound to this client.
    pub fn object(&self, class_name: impl Into<String>) -> RemoteObject {
        RemoteObject::with_client(class_name, self)
    }

    /// A query over `class_name` bound to this client.
    pub fn query(&self, class_name: impl Into<String>) -> Query {
        Query::with_client(class_name, self)
    }

    /// Build the request for `uri`. Auth headers are omitted when unset.
    pub fn build_request(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<Vec<u8>>,
        query: Vec<(String, String)>,
        content_type: Option<&str>,
    ) -> HttpRequest {
        let config = &self.inner.config;
        let session = self.session();

        let mut headers = vec![
            (
                protocol::HEADER_CONTENT_TYPE.to_string(),
                content_type.unwrap_or(protocol::CONTENT_TYPE_JSON).to_string(),
            ),
            (protocol::HEADER_USER_AGENT.to_string(), config.user_agent.clone()),
        ];
        if let Some(user_id) = session.user_id {
            headers.push((protocol::HEADER_USER_ID.to_string(), user_id));
        }
        if let Some(token) = session.session_token {
            headers.push((protocol::HEADER_SESSION_TOKEN.to_string(), token));
        }

        HttpRequest {
            method,
            path: config.url_for(uri),
            query,
            headers,
            body,
        }
    }

    /// Send `request`, retrying transient failures per the retry policy.
    pub fn send(&self, request: &HttpRequest) -> Result<Json> {
        let policy = &self.inner.config.retry;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            tracing::debug!(
                "{} {} (attempt {attempt}/{})",
                request.method,
                request.path,
                policy.max_attempts
            );

            let result = self
                .inner
                .transport
                .send(request)
                .map_err(ClientError::from)
                .and_then(|response| parse_response(&response));

            let err = match result {
                Ok(data) => return Ok(data),
                Err(err) => err,
            };

            let retryable = err.failure_kind().is_some_and(|kind| policy.retries(kind));
            if !retryable || attempt >= policy.max_attempts {
                return Err(err.into_fatal());
            }

            if err.is_rate_limited() {
                tracing::warn!(
                    "rate limit exceeded on {}, cooling down for {:?}",
                    request.path,
                    policy.rate_limit_cooldown
                );
                thread::sleep(policy.rate_limit_cooldown);
            }

            let delay = policy.delay_for(attempt - 1);
            tracing::warn!(
                "{} {} failed (attempt {attempt}): {err}, retrying in {delay:?}",
                request.method,
                request.path
            );
            thread::sleep(delay);
        }
    }

    /// Issue a JSON request and return the decoded success body.
    pub fn request(&self, method: HttpMethod, uri: &str, body: Option<Json>) -> Result<Json> {
        let body = body.map(|b| serde_json::to_vec(&b)).transpose()?;
        let request = self.build_request(method, uri, body, Vec::new(), None);
        self.send(&request)
    }

    pub fn get(&self, uri: &str) -> Result<Json> {
        self.request(HttpMethod::Get, uri, None)
    }

    pub fn get_with_query(&self, uri: &str, query: Vec<(String, String)>) -> Result<Json> {
        let request = self.build_request(HttpMethod::Get, uri, None, query, None);
        self.send(&request)
    }

    pub fn post(&self, uri: &str, body: Json) -> Result<Json> {
        self.request(HttpMethod::Post, uri, Some(body))
    }

    pub fn put(&self, uri: &str, body: Json) -> Result<Json> {
        self.request(HttpMethod::Put, uri, Some(body))
    }

    pub fn delete(&self, uri: &str) -> Result<Json> {
        self.request(HttpMethod::Delete, uri, None)
    }

    /// POST a raw body with its own content type.
    pub fn upload(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<Json> {
        let request = self.build_request(HttpMethod::Post, uri, Some(body), Vec::new(), Some(content_type));
        self.send(&request)
    }

    /// GET a class collection (`id` = `None`) or a single instance, decoded
    /// with `class_name` as the hint and bound to this client.
    pub fn fetch(&self, class_name: &str, id: Option<&str>) -> Result<Value> {
        let uri = protocol::entity_uri(class_name, id);
        let data = self
            .get(&uri)
            .map_err(|e| e.with_lookup_context(class_name, id))?;

        let mut value = match Response::from_json(data)? {
            Response::Envelope { results, .. } => Value::Array(
                results
                    .iter()
                    .map(|r| codec::decode(Some(class_name), r).unwrap_or(Value::Null))
                    .collect(),
            ),
            Response::Bare(map) => Value::from(codec::decode_object(class_name, &map)),
        };
        codec::attach_client(&mut value, self);
        Ok(value)
    }

    pub fn get_object(&self, class_name: &str, id: &str) -> Result<RemoteObject> {
        self.fetch(class_name, Some(id))?
            .into_object()
            .ok_or_else(|| ClientError::ResponseShape(format!("expected a single {class_name} object")))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.config.host)
            .field("path", &self.inner.config.path)
            .field("session", &*self.inner.session.read())
            .finish_non_exhaustive()
    }
}

/// Classify a response: below 400 is success; recognized error codes and
/// 5xx statuses are retryable; everything else is a plain protocol error.
pub fn parse_response(response: &HttpResponse) -> Result<Json> {
    let status = response.status;
    if status < 400 {
        if response.body.trim().is_empty() {
            return Ok(Json::Null);
        }
        return serde_json::from_str(&response.body)
            .map_err(|e| ClientError::Deserialization(e.to_string()));
    }

    // Undecodable error bodies count as empty ones. Fields are read one at a
    // time so a mistyped `error` cannot hide a valid `code`.
    let mut details = match serde_json::from_str::<Json>(&response.body) {
        Ok(Json::Object(map)) => map,
        _ => Map::new(),
    };
    let code = details.remove(protocol::KEY_CODE).and_then(|code| code.as_i64());
    let message = match details.remove(protocol::KEY_ERROR) {
        Some(Json::String(message)) => message,
        Some(other) => {
            details.insert(protocol::KEY_ERROR.to_string(), other);
            format!("HTTP Status {status} Body {}", response.body)
        }
        None => format!("HTTP Status {status} Body {}", response.body),
    };
    let error = ProtocolError {
        code,
        message,
        http_status: status,
        details,
    };

    let recognized = error
        .code
        .is_some_and(|code| protocol::RETRYABLE_CODES.contains(&code));
    if recognized || status >= 500 {
        Err(ClientError::RetryableProtocol(error))
    } else {
        Err(ClientError::Protocol(error))
    }
}

static GLOBAL: RwLock<Option<Client>> = parking_lot::const_rwlock(None);

/// Install a process-wide client for single-client applications.
pub fn init(config: ClientConfig) -> Client {
    let client = Client::new(config);
    install(client.clone());
    client
}

pub fn install(client: Client) {
    *GLOBAL.write() = Some(client);
}

/// The process-wide client, if one was installed.
pub fn global() -> Result<Client> {
    GLOBAL.read().clone().ok_or(ClientError::NotInitialized)
}

pub fn destroy() {
    *GLOBAL.write() = None;
}
