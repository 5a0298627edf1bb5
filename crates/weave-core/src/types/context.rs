//! Request context carried from the HTTP layer into script execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request-scoped data made available to executing scripts.
///
/// Built once per inbound call by the HTTP layer and handed to the runtime,
/// which serializes it into the script environment as the `context` global.
/// `BTreeMap` keeps the serialized form stable for traces and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// HTTP method of the inbound request.
    #[serde(default)]
    pub method: String,
    /// Path parameters extracted from the matched route.
    pub path: BTreeMap<String, String>,
    /// Query string parameters.
    pub query: BTreeMap<String, String>,
    /// Parsed JSON request body, or `null` when the body was absent/invalid.
    pub body: Value,
    /// Request headers (lowercased names).
    pub headers: BTreeMap<String, String>,
}

impl RequestContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets a path parameter.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Sets a query parameter.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Sets a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Serializes the context into a JSON value for script injection.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Looks up a dotted path (e.g. `query.name`) against the context.
    ///
    /// Returns `None` when any segment is missing or a non-object value is
    /// traversed into.
    pub fn lookup(&self, dotted: &str) -> Option<Value> {
        let mut current = self.to_value();
        for part in dotted.split('.') {
            current = current.as_object()?.get(part.trim())?.clone();
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_walks_nested_values() {
        let ctx = RequestContext::new()
            .with_query_param("name", "ada")
            .with_body(json!({"user": {"id": 7}}));

        assert_eq!(ctx.lookup("query.name"), Some(json!("ada")));
        assert_eq!(ctx.lookup("body.user.id"), Some(json!(7)));
        assert_eq!(ctx.lookup("body.user.missing"), None);
        assert_eq!(ctx.lookup("path.anything"), None);
    }

    #[test]
    fn to_value_is_stable() {
        let ctx = RequestContext::new().with_header("x-test", "1");
        let value = ctx.to_value();
        assert_eq!(value["headers"]["x-test"], json!("1"));
        assert_eq!(value["body"], Value::Null);
    }
}
