//! Constraint-based queries over a class collection.
//!
//! # Design
//! A query is either a conjunction of field constraints or a top-level
//! disjunction of whole sub-queries (`$or`), never both. Constraints on the
//! same field merge into one mapping. Operands are converted with
//! [`codec::encode`], so saved entities become pointers and unsaved ones
//! are rejected up front.

use serde_json::{json, Map, Value as Json};

use crate::client::Client;
use crate::codec::{self, Response};
use crate::error::{ClientError, Result};
use crate::object::RemoteObject;
use crate::protocol::{self, KEY_CLASS_NAME, KEY_COUNT};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct Query {
    class_name: String,
    constraints: Map<String, Json>,
    ors: Vec<Query>,
    order_by: Option<String>,
    order: Order,
    limit: Option<u64>,
    skip: Option<u64>,
    count: bool,
    include: Option<String>,
    keys: Option<String>,
    client: Option<Client>,
}

/// Decoded results of [`Query::execute`].
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    pub results: Vec<Value>,
    /// Total match count, when requested with [`Query::count`].
    pub count: Option<u64>,
    /// Envelope keys other than `results` and `count`.
    pub extra: Map<String, Json>,
}

impl QueryResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The decoded entities, skipping results that are not entities.
    pub fn objects(self) -> Vec<RemoteObject> {
        self.results.into_iter().filter_map(Value::into_object).collect()
    }
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Map::new(),
            ors: Vec::new(),
            order_by: None,
            order: Order::Ascending,
            limit: None,
            skip: None,
            count: false,
            include: None,
            keys: None,
            client: None,
        }
    }

    pub fn with_client(class_name: impl Into<String>, client: &Client) -> Self {
        let mut query = Self::new(class_name);
        query.client = Some(client.clone());
        query
    }

    pub fn set_client(&mut self, client: &Client) -> &mut Self {
        self.client = Some(client.clone());
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    fn add_constraint(&mut self, field: &str, constraint: Json) -> Result<&mut Self> {
        if !self.ors.is_empty() {
            return Err(ClientError::Argument(format!(
                "cannot add constraint on {field} to an $or query"
            )));
        }
        let merged = match (self.constraints.get_mut(field), &constraint) {
            (Some(Json::Object(current)), Json::Object(extra)) => {
                current.extend(extra.clone());
                true
            }
            _ => false,
        };
        if !merged {
            self.constraints.insert(field.to_string(), constraint);
        }
        Ok(self)
    }

    fn operator(&mut self, field: &str, op: &str, value: Value) -> Result<&mut Self> {
        let operand = codec::encode(&value)?;
        self.add_constraint(field, json!({ op: operand }))
    }

    fn list_operator<V: Into<Value>>(
        &mut self,
        field: &str,
        op: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        let operands = values
            .into_iter()
            .map(|v| codec::encode(&v.into()))
            .collect::<Result<Vec<_>>>()?;
        self.add_constraint(field, json!({ op: operands }))
    }

    pub fn eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let operand = codec::encode(&value.into())?;
        self.add_constraint(field, operand)
    }

    pub fn eq_all<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field, value) in pairs {
            self.eq(field.as_ref(), value)?;
        }
        Ok(self)
    }

    pub fn not_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.operator(field, "$ne", value.into())
    }

    pub fn less_than(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.operator(field, "$lt", value.into())
    }

    pub fn less_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.operator(field, "$lte", value.into())
    }

    pub fn greater_than(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.operator(field, "$gt", value.into())
    }

    pub fn greater_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.operator(field, "$gte", value.into())
    }

    pub fn value_in<V: Into<Value>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.list_operator(field, "$in", values)
    }

    pub fn value_not_in<V: Into<Value>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.list_operator(field, "$nin", values)
    }

    pub fn contains_all<V: Into<Value>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.list_operator(field, "$all", values)
    }

    pub fn regex(&mut self, field: &str, expression: &str) -> Result<&mut Self> {
        self.add_constraint(field, json!({ "$regex": expression }))
    }

    pub fn exists(&mut self, field: &str, exists: bool) -> Result<&mut Self> {
        self.add_constraint(field, json!({ "$exists": exists }))
    }

    /// Match objects that `value`'s relation `field` points to.
    pub fn related_to(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let object = codec::encode(&value.into())?;
        self.add_constraint("$relatedTo", json!({ "object": object, "key": field }))
    }

    /// Match objects whose `field` points into the results of `subquery`.
    pub fn in_query(&mut self, field: &str, subquery: &Query) -> Result<&mut Self> {
        let inner = json!({
            KEY_CLASS_NAME: subquery.class_name,
            "where": subquery.where_as_json(),
        });
        self.add_constraint(field, json!({ "$inQuery": inner }))
    }

    /// Add an alternative. Only valid on a query with no direct constraints.
    pub fn or(&mut self, alternative: Query) -> Result<&mut Self> {
        if !self.constraints.is_empty() {
            return Err(ClientError::Argument(
                "cannot combine $or with direct constraints".to_string(),
            ));
        }
        self.ors.push(alternative);
        Ok(self)
    }

    pub fn order_by(&mut self, field: impl Into<String>, order: Order) -> &mut Self {
        self.order_by = Some(field.into());
        self.order = order;
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(&mut self, skip: u64) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    /// Ask the server for the total number of matches.
    pub fn count(&mut self) -> &mut Self {
        self.count = true;
        self
    }

    /// Comma-separated relation paths to include in full.
    pub fn include(&mut self, include: impl Into<String>) -> &mut Self {
        self.include = Some(include.into());
        self
    }

    /// Comma-separated subset of keys to return.
    pub fn keys(&mut self, keys: impl Into<String>) -> &mut Self {
        self.keys = Some(keys.into());
        self
    }

    pub fn where_as_json(&self) -> Json {
        if self.ors.is_empty() {
            Json::Object(self.constraints.clone())
        } else {
            json!({ "$or": self.ors.iter().map(Query::where_as_json).collect::<Vec<_>>() })
        }
    }

    /// Query-string parameters for the GET request.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("where".to_string(), self.where_as_json().to_string())];
        if let Some(field) = &self.order_by {
            let order = match self.order {
                Order::Ascending => field.clone(),
                Order::Descending => format!("-{field}"),
            };
            params.push(("order".to_string(), order));
        }
        if self.count {
            params.push((KEY_COUNT.to_string(), "1".to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(include) = &self.include {
            params.push(("include".to_string(), include.clone()));
        }
        if let Some(keys) = &self.keys {
            params.push(("keys".to_string(), keys.clone()));
        }
        params
    }

    pub fn execute(&self) -> Result<QueryResults> {
        let client = self.client.clone().ok_or(ClientError::NotInitialized)?;
        let uri = protocol::entity_uri(&self.class_name, None);
        let params = self.params();
        tracing::info!("query for {uri} {params:?}");

        let data = client.get_with_query(&uri, params)?;
        let (results, mut extra) = match Response::from_json(data) {
            Ok(Response::Envelope { results, extra }) => (results, extra),
            Ok(Response::Bare(map)) => {
                return Err(ClientError::ResponseShape(format!(
                    "query response has no {} array: {}",
                    protocol::KEY_RESULTS,
                    Json::Object(map)
                )))
            }
            Err(e) => return Err(e),
        };

        let results = results
            .iter()
            .map(|raw| {
                let mut value = codec::decode(Some(&self.class_name), raw).unwrap_or(Value::Null);
                codec::attach_client(&mut value, &client);
                value
            })
            .collect();
        let count = extra.remove(KEY_COUNT).and_then(|c| c.as_u64());

        Ok(QueryResults {
            results,
            count,
            extra,
        })
    }

    /// The first match, if any. Sets the limit to one.
    pub fn first(&mut self) -> Result<Option<Value>> {
        self.limit = Some(1);
        Ok(self.execute()?.results.into_iter().next())
    }
}
