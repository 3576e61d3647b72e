//! Record-store collaborator contract.
//!
//! The hosted backend exposes plain row CRUD over the logical [`Table`]s.
//! Rows travel as JSON objects; typed entities convert through
//! [`to_row`]/[`from_row`].

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{EntityId, Table};

/// One stored row.
pub type Row = Map<String, Value>;

/// Errors from record-store calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("record not found in {table}")]
    NotFound { table: Table },
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The auth service, not a table, refused the request.
    #[error("auth service rejected request ({status}): {message}")]
    AuthRejected { status: u16, message: String },
    #[error("could not decode row: {0}")]
    Decode(String),
}

/// Equality conditions joined with AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &EntityId) -> Self {
        Self::new().eq("id", id.as_str())
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| row.get(column).unwrap_or(&Value::Null) == expected)
    }
}

/// Sort order for list queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: true }
    }

    pub fn desc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: false }
    }

    /// Compare two rows on this column; missing values sort first.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ord = compare_values(
            a.get(&self.column).unwrap_or(&Value::Null),
            b.get(&self.column).unwrap_or(&Value::Null),
        );
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

/// Row CRUD against the hosted backend.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First row matching `filter`, if any.
    async fn get(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError>;

    async fn list(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert a row; the returned representation carries the assigned `id`.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    async fn update(&self, table: Table, id: &EntityId, patch: Row) -> Result<(), StoreError>;

    async fn delete(&self, table: Table, id: &EntityId) -> Result<(), StoreError>;

    /// Insert, or update the row whose `conflict_key` column matches.
    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<Row, StoreError>;

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize, StoreError>;
}

/// Serialize an entity into a row. Entities must serialize to JSON objects.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!("expected an object, got {}", other))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode(e.to_string()))
}

/// `deserialize_with` helper: a null column reads as the type's default,
/// like a missing one does under `#[serde(default)]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `id` column of a row, accepting string or numeric keys.
pub fn row_id(row: &Row) -> Option<EntityId> {
    match row.get("id")? {
        Value::String(s) if !s.is_empty() => Some(EntityId::new(s.clone())),
        Value::Number(n) => Some(EntityId::new(n.to_string())),
        _ => None,
    }
}

/// Like [`row_id`] but failing with a decode error.
pub fn require_row_id(row: &Row, table: Table) -> Result<EntityId, StoreError> {
    row_id(row).ok_or_else(|| StoreError::Decode(format!("{} row returned without an id", table)))
}

/// Text column as edited in a draft. Missing and null read as empty.
pub fn text_field(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub fn bool_field(row: &Row, column: &str, default: bool) -> bool {
    row.get(column).and_then(Value::as_bool).unwrap_or(default)
}

pub fn int_field(row: &Row, column: &str, default: i64) -> i64 {
    row.get(column).and_then(Value::as_i64).unwrap_or(default)
}

/// Draft text as a column value; blank is stored as null.
pub fn text_value(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}
