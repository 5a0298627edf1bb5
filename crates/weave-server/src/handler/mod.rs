//! All `axum::`[`Router`]s with related handlers.
//!
//! The fixed surface covers the workflow invocation API, database-config
//! liveness tests, trace browsing and health; one additional route per
//! enabled endpoint record is registered at startup.
//!
//! [`Router`]: axum::routing::Router

mod database_configs;
mod dynamic;
mod error;
mod workflows;

use std::collections::BTreeMap;

use axum::Json;
use axum::http::{HeaderMap, Method};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use weave_core::types::RequestContext;

pub use crate::handler::error::{Error, Result};
use crate::service::{ServiceError, ServiceState};

/// Builds the complete application router.
///
/// Loads the enabled endpoint records and registers their dynamic routes
/// alongside the fixed surface.
pub async fn routes(state: ServiceState) -> Result<Router, ServiceError> {
    let dynamic = dynamic::load_routes(&state).await?;

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/workflow/api", post(workflows::invoke_by_name))
        .route(
            "/database-configs/{config_id}/test",
            post(database_configs::test_connection),
        )
        .route("/workflows/{workflow_id}/logs", get(workflows::list_logs))
        .route(
            "/workflows/{workflow_id}/logs/{filename}",
            get(workflows::log_detail),
        )
        .merge(dynamic)
        .with_state(state);

    Ok(router)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "weave",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "declarative API platform",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Assembles the request context handed to the runtime.
pub(crate) fn build_context(
    method: &Method,
    path: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    headers: &HeaderMap,
    body: Value,
) -> RequestContext {
    let mut context = RequestContext::new().with_method(method.as_str()).with_body(body);

    context.path = path;
    context.query = query;
    context.headers = headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_owned(), value.to_owned()))
        })
        .collect();

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_carries_method_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());

        let context = build_context(
            &Method::POST,
            BTreeMap::from([("id".to_owned(), "7".to_owned())]),
            BTreeMap::from([("page".to_owned(), "2".to_owned())]),
            &headers,
            json!({"a": 1}),
        );

        assert_eq!(context.method, "POST");
        assert_eq!(context.path.get("id").unwrap(), "7");
        assert_eq!(context.query.get("page").unwrap(), "2");
        assert_eq!(context.headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(context.body, json!({"a": 1}));
    }
}
