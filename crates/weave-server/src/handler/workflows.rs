//! Workflow invocation and trace browsing handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method};
use serde::Deserialize;
use serde_json::{Value, json};
use weave_postgres::query::WorkflowRepository;
use weave_runtime::RuntimeError;

use crate::handler::{Error, Result, build_context};
use crate::service::ServiceState;

/// Default number of trace summaries returned per listing.
const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct LogsQuery {
    limit: Option<usize>,
}

/// `POST /workflow/api` — invoke a workflow by name.
///
/// The JSON body must carry a string `workflow_name`; any extra fields
/// ride along into the scripts' `context.body`.
pub(crate) async fn invoke_by_name(
    State(state): State<ServiceState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| Error::BadRequest("request body must be valid JSON".into()))?;

    let Some(name) = body.get("workflow_name").and_then(Value::as_str) else {
        return Err(Error::BadRequest(
            "missing required field 'workflow_name'".into(),
        ));
    };
    let name = name.to_owned();

    let path = BTreeMap::from([("workflow_name".to_owned(), name.clone())]);
    let context = build_context(&Method::POST, path, query, &headers, body);

    let payload = state
        .dispatcher()
        .invoke_workflow_by_name(&name, &context)
        .await?;

    Ok(Json(payload))
}

/// `GET /workflows/{workflow_id}/logs` — list a workflow's trace files.
pub(crate) async fn list_logs(
    State(state): State<ServiceState>,
    Path(workflow_id): Path<i32>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<Value>> {
    let workflow = {
        let mut conn = state.pg_client().get_connection().await?;
        conn.find_workflow_by_id(workflow_id)
            .await?
            .ok_or_else(|| Error::NotFound("workflow not found".into()))?
    };

    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let logs = state
        .dispatcher()
        .traces()
        .list_for_workflow(&workflow.name, limit)
        .await;

    Ok(Json(json!({
        "workflow_id": workflow_id,
        "workflow_name": workflow.name,
        "total_logs": logs.len(),
        "logs": logs,
    })))
}

/// `GET /workflows/{workflow_id}/logs/{filename}` — one trace's content.
pub(crate) async fn log_detail(
    State(state): State<ServiceState>,
    Path((workflow_id, filename)): Path<(i32, String)>,
) -> Result<Json<Value>> {
    let workflow = {
        let mut conn = state.pg_client().get_connection().await?;
        conn.find_workflow_by_id(workflow_id)
            .await?
            .ok_or_else(|| Error::NotFound("workflow not found".into()))?
    };

    let (content, summary) = state
        .dispatcher()
        .traces()
        .read(&filename)
        .await
        .map_err(|error| match error {
            RuntimeError::InvalidEndpoint(message) => Error::BadRequest(message),
            _ => Error::NotFound("trace file not found".into()),
        })?;

    Ok(Json(json!({
        "filename": filename,
        "workflow_name": workflow.name,
        "content": content,
        "summary": summary,
    })))
}
