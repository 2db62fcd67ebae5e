//! Entities served from fixed endpoints instead of `/classes/{class}`.
//!
//! Each wrapper derefs to [`RemoteObject`], so field access, `save`,
//! `refresh` and `delete` behave the same as for any other class; only the
//! URI differs (see [`protocol::entity_uri`]).

use std::ops::{Deref, DerefMut};

use serde::Deserialize;
use serde_json::Value as Json;

use crate::client::{Client, Session};
use crate::codec;
use crate::datatypes::Date;
use crate::error::{ClientError, Result};
use crate::http::HttpMethod;
use crate::object::RemoteObject;
use crate::protocol;
use crate::value::Value;

macro_rules! fixed_entity {
    ($(#[$meta:meta])* $name:ident, $class:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(RemoteObject);

        impl $name {
            pub const CLASS_NAME: &'static str = $class;

            /// An unsaved instance bound to `client`.
            pub fn new(client: &Client) -> Self {
                Self(RemoteObject::with_client($class, client))
            }

            /// Fetch a single instance by id.
            pub fn get(client: &Client, id: &str) -> Result<Self> {
                client.get_object($class, id).map(Self)
            }

            pub fn into_inner(self) -> RemoteObject {
                self.0
            }
        }

        impl Deref for $name {
            type Target = RemoteObject;

            fn deref(&self) -> &RemoteObject {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut RemoteObject {
                &mut self.0
            }
        }

        impl TryFrom<RemoteObject> for $name {
            type Error = ClientError;

            fn try_from(object: RemoteObject) -> Result<Self> {
                if object.class_name() == $class {
                    Ok(Self(object))
                } else {
                    Err(ClientError::Argument(format!(
                        "expected a {} object, got {}",
                        $class,
                        object.class_name()
                    )))
                }
            }
        }

        impl From<$name> for RemoteObject {
            fn from(entity: $name) -> RemoteObject {
                entity.0
            }
        }

        impl From<$name> for Value {
            fn from(entity: $name) -> Value {
                Value::from(entity.0)
            }
        }
    };
}

fixed_entity!(
    /// An account, stored under `/Users/`.
    User,
    protocol::CLASS_USER
);
fixed_entity!(
    /// A bookable resource, stored under `/Resources/`.
    Resource,
    protocol::CLASS_RESOURCE
);
fixed_entity!(
    /// A booking of one or more resources, stored under `/Reservations/`.
    Reservation,
    protocol::CLASS_RESERVATION
);
fixed_entity!(Accessory, protocol::CLASS_ACCESSORY);

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "sessionToken")]
    session_token: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<Json>,
}

/// Ids arrive as strings or numbers depending on the server version.
fn id_string(raw: &Json) -> Option<String> {
    match raw {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl User {
    /// Log in and store the issued session on `client`. Every later request
    /// through `client` carries the session headers.
    pub fn authenticate(client: &Client, username: &str, password: &str) -> Result<Self> {
        let body = serde_json::json!({ "username": username, "password": password });
        let data = client.post(protocol::USER_LOGIN_URI, body)?;

        let login: LoginResponse = serde_json::from_value(data.clone())
            .map_err(|e| ClientError::ResponseShape(format!("login response: {e}")))?;
        let user_id = login.user_id.as_ref().and_then(id_string);
        client.set_session(Session {
            user_id: user_id.clone(),
            session_token: login.session_token,
        });

        let mut user = RemoteObject::with_client(protocol::CLASS_USER, client);
        user.absorb(&data, client);
        if let (true, Some(id)) = (user.is_new(), user_id) {
            user.hydrate([(protocol::KEY_OBJECT_ID.to_string(), Value::String(id))].into());
        }
        tracing::debug!("authenticated {username} as {user}");
        Ok(Self(user))
    }
}

fn get_decoded(client: &Client, uri: &str, query: Vec<(String, String)>) -> Result<Value> {
    let data = client.get_with_query(uri, query)?;
    let mut value = codec::decode(None, &data).unwrap_or(Value::Null);
    codec::attach_client(&mut value, client);
    Ok(value)
}

impl Resource {
    /// All resource statuses known to the server.
    pub fn statuses(client: &Client) -> Result<Value> {
        get_decoded(client, protocol::RESOURCE_STATUSES_URI, Vec::new())
    }

    pub fn status_reasons(client: &Client) -> Result<Value> {
        get_decoded(client, protocol::RESOURCE_STATUS_REASONS_URI, Vec::new())
    }

    pub fn types(client: &Client) -> Result<Value> {
        get_decoded(client, protocol::RESOURCE_TYPES_URI, Vec::new())
    }

    /// Availability at `at`, or now when `None`. The server reports
    /// availability windows up to seven days ahead.
    pub fn availability(client: &Client, at: Option<&Date>) -> Result<Value> {
        let query = at
            .map(|date| vec![("dateTime".to_string(), date.iso8601())])
            .unwrap_or_default();
        get_decoded(client, protocol::RESOURCE_AVAILABILITY_URI, query)
    }

    /// The full resource group tree.
    pub fn groups(client: &Client) -> Result<Value> {
        get_decoded(client, protocol::RESOURCE_GROUPS_URI, Vec::new())
    }
}

impl Reservation {
    /// Approve a pending reservation and take the server's view of it.
    pub fn approve(&mut self) -> Result<&mut Self> {
        let id = self
            .id()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Argument("cannot approve unsaved reservation".to_string()))?;
        let client = self.client().cloned().ok_or(ClientError::NotInitialized)?;
        let data = client.request(HttpMethod::Post, &protocol::reservation_approval_uri(&id), None)?;
        self.0.absorb(&data, &client);
        Ok(self)
    }

    pub fn by_reference_number(client: &Client, reference_number: &str) -> Result<Self> {
        client
            .get_object(protocol::CLASS_RESERVATION, reference_number)
            .map(Self)
    }
}
