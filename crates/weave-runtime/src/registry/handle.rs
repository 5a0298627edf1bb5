//! Pooled handle over one runtime-configured database.

use serde_json::{Map, Value};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Column, Row};
use weave_postgres::types::DbKind;

use crate::error::RuntimeResult;

/// A live, pooled connection handle for one database config.
///
/// Cheap to clone; clones share the underlying pool. This is the object
/// injected into script environments under the config's name.
#[derive(Debug, Clone)]
pub struct DbHandle {
    name: String,
    kind: DbKind,
    pool: AnyPool,
    is_default: bool,
}

impl DbHandle {
    /// Creates a handle over an established pool.
    pub(crate) fn new(name: String, kind: DbKind, pool: AnyPool, is_default: bool) -> Self {
        Self {
            name,
            kind,
            pool,
            is_default,
        }
    }

    /// Returns the config name this handle serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the database kind behind this handle.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Returns whether this handle backs the `db` default alias.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs one statement with positional binds and implicit commit.
    ///
    /// Returns the fetched rows (array of objects) when the statement
    /// produces a result set, otherwise the affected-row count. The
    /// connection is acquired, used and released within this one call.
    ///
    /// Statement classification is lexical: a leading
    /// select/with/show/pragma/explain/values keyword, or a `returning`
    /// clause, marks the statement as row-producing. The dynamic driver
    /// cannot probe for rows after the fact.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> RuntimeResult<Value> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }

        if returns_rows(sql) {
            let rows = query.fetch_all(&self.pool).await?;
            let rows = rows.iter().map(row_to_value).collect();
            Ok(Value::Array(rows))
        } else {
            let result = query.execute(&self.pool).await?;
            Ok(Value::from(result.rows_affected()))
        }
    }
}

type AnyQuery<'q> = sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>;

/// Binds one JSON value positionally.
///
/// The dynamic driver carries a small scalar type set; arrays and objects
/// are bound as their JSON text.
fn bind_value<'q>(query: AnyQuery<'q>, value: &'q Value) -> AnyQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

/// Decodes one dynamic row into a JSON object.
fn row_to_value(row: &AnyRow) -> Value {
    let mut object = Map::with_capacity(row.columns().len());

    for (index, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else {
            Value::Null
        };

        object.insert(column.name().to_owned(), value);
    }

    Value::Object(object)
}

/// Returns whether a statement produces a result set.
fn returns_rows(sql: &str) -> bool {
    let lowered = sql.trim_start().to_ascii_lowercase();
    let leading = lowered.split_whitespace().next().unwrap_or_default();

    matches!(leading, "select" | "with" | "show" | "pragma" | "explain" | "values")
        || lowered.contains("returning")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_row_producing_statements() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  with t as (select 1) select * from t"));
        assert!(returns_rows("PRAGMA table_info(items)"));
        assert!(returns_rows("INSERT INTO t (a) VALUES (1) RETURNING id"));
        assert!(!returns_rows("INSERT INTO t (a) VALUES (1)"));
        assert!(!returns_rows("UPDATE t SET a = 2"));
        assert!(!returns_rows("DELETE FROM t"));
    }
}
