//! Generic table CRUD over the default external database.
//!
//! Method-driven list/get/insert/update/delete against the table named by
//! the endpoint's data model. Identifiers (table and column names) come
//! from stored descriptors and request bodies, never from raw SQL, and are
//! validated before interpolation; all values travel as bind parameters.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};
use weave_core::types::RequestContext;
use weave_postgres::model::DataModel;

use crate::error::{RuntimeError, RuntimeResult};
use crate::registry::DbHandle;

const DEFAULT_PAGE_SIZE: i64 = 20;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"))
}

/// Executes one CRUD operation for the given method.
pub(crate) async fn execute(
    handle: &DbHandle,
    model: &DataModel,
    method: &str,
    context: &RequestContext,
) -> RuntimeResult<Value> {
    let table = validate_identifier(&model.table_name)?;

    match method {
        "GET" => match context.path.get("id") {
            Some(id) => get_one(handle, table, id).await,
            None => get_list(handle, table, context).await,
        },
        "POST" => insert(handle, table, &context.body).await,
        "PUT" => {
            let id = required_id(context)?;
            update(handle, table, id, &context.body).await
        }
        "DELETE" => {
            let id = required_id(context)?;
            delete(handle, table, id).await
        }
        other => Err(RuntimeError::InvalidEndpoint(format!(
            "unsupported CRUD method: {other}"
        ))),
    }
}

async fn get_one(handle: &DbHandle, table: &str, id: &str) -> RuntimeResult<Value> {
    let rows = handle
        .execute(&format!("SELECT * FROM {table} WHERE id = ?"), &[json!(id)])
        .await?;

    match rows.as_array().and_then(|rows| rows.first()) {
        Some(row) => Ok(row.clone()),
        None => Ok(json!({"error": "record not found"})),
    }
}

async fn get_list(
    handle: &DbHandle,
    table: &str,
    context: &RequestContext,
) -> RuntimeResult<Value> {
    let page = query_number(context, "page", 1).max(1);
    let page_size = query_number(context, "page_size", DEFAULT_PAGE_SIZE).clamp(1, 500);
    let offset = (page - 1) * page_size;

    let total_rows = handle
        .execute(&format!("SELECT COUNT(*) AS total FROM {table}"), &[])
        .await?;
    let total = total_rows
        .as_array()
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("total"))
        .cloned()
        .unwrap_or(Value::Null);

    let items = handle
        .execute(
            &format!("SELECT * FROM {table} LIMIT ? OFFSET ?"),
            &[json!(page_size), json!(offset)],
        )
        .await?;

    Ok(json!({
        "items": items,
        "total": total,
        "page": page,
        "page_size": page_size,
    }))
}

async fn insert(handle: &DbHandle, table: &str, body: &Value) -> RuntimeResult<Value> {
    let fields = body_fields(body)?;

    let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    let placeholders = vec!["?"; fields.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );

    let params: Vec<Value> = fields.iter().map(|(_, value)| (*value).clone()).collect();
    let affected = handle.execute(&sql, &params).await?;

    Ok(json!({"message": "record created", "rows_affected": affected}))
}

async fn update(handle: &DbHandle, table: &str, id: &str, body: &Value) -> RuntimeResult<Value> {
    let fields = body_fields(body)?;

    let assignments: Vec<String> = fields
        .iter()
        .map(|(name, _)| format!("{name} = ?"))
        .collect();
    let sql = format!(
        "UPDATE {table} SET {} WHERE id = ?",
        assignments.join(", ")
    );

    let mut params: Vec<Value> = fields.iter().map(|(_, value)| (*value).clone()).collect();
    params.push(json!(id));
    let affected = handle.execute(&sql, &params).await?;

    Ok(json!({"message": "record updated", "rows_affected": affected}))
}

async fn delete(handle: &DbHandle, table: &str, id: &str) -> RuntimeResult<Value> {
    let affected = handle
        .execute(&format!("DELETE FROM {table} WHERE id = ?"), &[json!(id)])
        .await?;

    Ok(json!({"message": "record deleted", "rows_affected": affected}))
}

fn required_id(context: &RequestContext) -> RuntimeResult<&str> {
    context
        .path
        .get("id")
        .map(String::as_str)
        .ok_or_else(|| RuntimeError::InvalidEndpoint("operation requires an id".into()))
}

fn query_number(context: &RequestContext, name: &str, default: i64) -> i64 {
    context
        .query
        .get(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn body_fields(body: &Value) -> RuntimeResult<Vec<(&str, &Value)>> {
    let object = body.as_object().filter(|object| !object.is_empty()).ok_or_else(|| {
        RuntimeError::InvalidEndpoint("request body must be a non-empty JSON object".into())
    })?;

    object
        .iter()
        .map(|(name, value)| Ok((validate_identifier(name)?, value)))
        .collect()
}

fn validate_identifier(name: &str) -> RuntimeResult<&str> {
    if identifier_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(RuntimeError::InvalidEndpoint(format!(
            "invalid identifier: {name}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_validated() {
        assert!(validate_identifier("orders").is_ok());
        assert!(validate_identifier("order_items2").is_ok());
        assert!(validate_identifier("_hidden").is_ok());
        assert!(validate_identifier("1bad").is_err());
        assert!(validate_identifier("drop table;").is_err());
        assert!(validate_identifier("a-b").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn body_fields_require_a_json_object() {
        assert!(body_fields(&json!({"a": 1})).is_ok());
        assert!(body_fields(&json!({})).is_err());
        assert!(body_fields(&json!([1, 2])).is_err());
        assert!(body_fields(&Value::Null).is_err());
        assert!(body_fields(&json!({"bad name": 1})).is_err());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let context = RequestContext::new();
        assert_eq!(query_number(&context, "page", 1), 1);

        let context = RequestContext::new()
            .with_query_param("page", "3")
            .with_query_param("page_size", "oops");
        assert_eq!(query_number(&context, "page", 1), 3);
        assert_eq!(query_number(&context, "page_size", DEFAULT_PAGE_SIZE), 20);
    }
}
