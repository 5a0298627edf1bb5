//! Dynamic endpoint routes.
//!
//! Every enabled endpoint record yields one route at its configured
//! path/method. Handler failures are caught and surfaced as a 500 response
//! with `{"error": <message>}`; workflow-node failures never reach this
//! layer (they come back as normal payloads from the dispatcher).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, RawPathParams, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, on};
use axum::{Extension, Json, Router, body::Bytes};
use serde_json::{Value, json};
use weave_postgres::model::Endpoint;
use weave_postgres::query::EndpointRepository;
use weave_runtime::dispatch::Dispatcher;

use crate::handler::{Error, build_context};
use crate::service::{ServiceError, ServiceState};

/// Tracing target for dynamic route registration.
const TRACING_TARGET: &str = "weave_server::handler::dynamic";

/// Builds one router holding all enabled endpoint routes.
pub(crate) async fn load_routes(
    state: &ServiceState,
) -> Result<Router<ServiceState>, ServiceError> {
    let endpoints = {
        let mut conn = state.pg_client().get_connection().await?;
        conn.list_enabled_endpoints().await?
    };

    let mut router = Router::new();
    for endpoint in endpoints {
        let Some(filter) = method_filter(&endpoint.method) else {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %endpoint.path,
                method = %endpoint.method,
                "skipping endpoint with unsupported method"
            );
            continue;
        };

        tracing::info!(
            target: TRACING_TARGET,
            path = %endpoint.path,
            method = %endpoint.method,
            logic = %endpoint.logic_type,
            "registered dynamic endpoint"
        );

        let path = endpoint.path.clone();
        let method_router = on(filter, handle).layer(Extension(Arc::new(endpoint)));
        router = router.route(&path, method_router);
    }

    Ok(router)
}

async fn handle(
    Extension(endpoint): Extension<Arc<Endpoint>>,
    State(dispatcher): State<Dispatcher>,
    method: Method,
    params: RawPathParams,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // An absent or non-JSON body degrades to an empty object.
    let body: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    let path = params
        .iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();

    let context = build_context(&method, path, query, &headers, body);

    match dispatcher.dispatch(&endpoint, &context).await {
        Ok(payload) => Json(payload).into_response(),
        Err(error) => Error::Internal(error.to_string()).into_response(),
    }
}

fn method_filter(method: &str) -> Option<MethodFilter> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Some(MethodFilter::GET),
        "POST" => Some(MethodFilter::POST),
        "PUT" => Some(MethodFilter::PUT),
        "PATCH" => Some(MethodFilter::PATCH),
        "DELETE" => Some(MethodFilter::DELETE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_cover_the_supported_methods() {
        assert!(method_filter("get").is_some());
        assert!(method_filter("POST").is_some());
        assert!(method_filter("Delete").is_some());
        assert!(method_filter("TRACE").is_none());
        assert!(method_filter("").is_none());
    }
}
