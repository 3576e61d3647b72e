//! PostgREST query strings and response parsing.

use serde_json::Value;

use navegar_shared::{Filter, OrderBy, Row, StoreError, Table};

pub const PREFER_REPRESENTATION: &str = "return=representation";
pub const PREFER_MINIMAL: &str = "return=minimal";
pub const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
pub const PREFER_COUNT: &str = "count=exact";

/// Scalar rendering used inside `eq.` operands
fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `col=eq.value` pairs; a null value becomes `col=is.null`.
pub fn filter_params(filter: &Filter) -> Vec<(String, String)> {
    filter
        .conditions()
        .iter()
        .map(|(column, value)| match value {
            Value::Null => (column.clone(), "is.null".to_string()),
            other => (column.clone(), format!("eq.{}", operand(other))),
        })
        .collect()
}

pub fn order_param(order: &OrderBy) -> (String, String) {
    let direction = if order.ascending { "asc" } else { "desc" };
    ("order".to_string(), format!("{}.{}", order.column, direction))
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
pub fn parse_content_range(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// The `message` (or auth `msg`) of an error body, else the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg"]
                .into_iter()
                .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a non-2xx table response to a store error.
pub fn status_error(table: Table, status: u16, body: &str) -> StoreError {
    let message = error_message(body);
    match status {
        401 | 403 => StoreError::PermissionDenied(message),
        404 => StoreError::NotFound { table },
        409 => StoreError::Conflict(message),
        _ => StoreError::Rejected { status, message },
    }
}

/// Map a non-2xx response from the auth service.
pub fn auth_error(status: u16, body: &str) -> StoreError {
    StoreError::AuthRejected { status, message: error_message(body) }
}

/// Rows from a representation body, which is always a JSON array.
pub fn parse_rows(body: Value) -> Result<Vec<Row>, StoreError> {
    let Value::Array(items) = body else {
        return Err(StoreError::Decode("expected an array of rows".to_string()));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(StoreError::Decode(format!("expected a row object, got {}", other))),
        })
        .collect()
}

/// The single row a write returned
pub fn single_row(body: Value) -> Result<Row, StoreError> {
    parse_rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Decode("write returned no rows".to_string()))
}
