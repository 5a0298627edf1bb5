//! Endpoint dispatch: resolves a declared endpoint to its execution
//! strategy and produces the response payload.

mod crud;
mod template;

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Value, json};
use weave_core::types::RequestContext;
use weave_postgres::PgClient;
use weave_postgres::model::{Endpoint, Workflow};
use weave_postgres::query::{DataModelRepository, WorkflowRepository};
use weave_postgres::types::LogicType;

pub use self::template::{render_endpoint, render_template};
use crate::engine::WorkflowEngine;
use crate::error::{RuntimeError, RuntimeResult};
use crate::program::NodeProgram;
use crate::registry::{ConnectionRegistry, DbHandle};
use crate::sandbox;
use crate::trace::{ExecutionTrace, TraceStore};

/// Tracing target for dispatch operations.
const TRACING_TARGET: &str = "weave_runtime::dispatch";

/// Resolves endpoints and workflow invocations to runtime executions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pg: PgClient,
    registry: Arc<ConnectionRegistry>,
    engine: WorkflowEngine,
    traces: TraceStore,
}

impl Dispatcher {
    /// Creates a dispatcher over the shared runtime services.
    pub fn new(
        pg: PgClient,
        registry: Arc<ConnectionRegistry>,
        engine: WorkflowEngine,
        traces: TraceStore,
    ) -> Self {
        Self {
            pg,
            registry,
            engine,
            traces,
        }
    }

    /// Returns the trace store backing this dispatcher.
    pub fn traces(&self) -> &TraceStore {
        &self.traces
    }

    /// Returns the connection registry backing this dispatcher.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Executes a declared endpoint.
    ///
    /// Resolves `logic_type` to exactly one strategy. Unknown logic types
    /// are reported, not raised. Workflow-node failures come back as
    /// terminal run payloads; scripted and CRUD failures propagate to the
    /// HTTP layer.
    pub async fn dispatch(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let logic = match LogicType::from_str(&endpoint.logic_type) {
            Ok(logic) => logic,
            Err(_) => return Ok(unknown_logic_payload(&endpoint.logic_type)),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint.path,
            logic = %logic,
            "dispatching endpoint"
        );

        match logic {
            LogicType::Templated => Ok(template::render_endpoint(endpoint, context)),
            LogicType::Scripted => self.execute_scripted(endpoint, context).await,
            LogicType::Workflow => self.execute_workflow_endpoint(endpoint, context).await,
            LogicType::GenericCrud => self.execute_crud(endpoint, context).await,
        }
    }

    /// Invokes an enabled workflow by its unique name.
    pub async fn invoke_workflow_by_name(
        &self,
        name: &str,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let workflow = {
            let mut conn = self.pg.get_connection().await?;
            conn.find_enabled_workflow_by_name(name)
                .await?
                .ok_or_else(|| RuntimeError::WorkflowNotFound(name.to_owned()))?
        };

        self.run_workflow(&workflow, context).await
    }

    async fn execute_workflow_endpoint(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let workflow_id = endpoint.workflow_id.ok_or_else(|| {
            RuntimeError::InvalidEndpoint("workflow endpoint missing workflow_id".into())
        })?;

        let workflow = {
            let mut conn = self.pg.get_connection().await?;
            conn.find_workflow_by_id(workflow_id).await?.ok_or_else(|| {
                RuntimeError::InvalidEndpoint(format!("workflow {workflow_id} does not exist"))
            })?
        };

        self.run_workflow(&workflow, context).await
    }

    /// Runs one workflow to completion and attaches the trace id.
    async fn run_workflow(
        &self,
        workflow: &Workflow,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let (program, handles) = {
            let mut conn = self.pg.get_connection().await?;

            let nodes = conn.list_workflow_nodes(workflow.id).await?;
            if nodes.is_empty() {
                return Ok(json!({
                    "error": "workflow has no nodes",
                    "workflow": workflow.name,
                }));
            }

            (NodeProgram::from_nodes(&nodes), self.active_handles(&mut conn).await)
        };

        let mut trace = ExecutionTrace::begin(
            workflow.id,
            &workflow.name,
            if context.method.is_empty() { "POST" } else { &context.method },
            format!("/workflow/api/{}", workflow.name),
            context
                .query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            context.body.clone(),
        );

        let report = self.engine.run(&program, context, handles, &mut trace).await;

        if workflow.logging_enabled {
            self.traces.save(&trace).await;
        }

        let mut payload = report.payload;
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "execution_id".into(),
                Value::String(trace.execution_id.to_string()),
            );
        }

        Ok(payload)
    }

    /// Collects handles for all enabled configs.
    ///
    /// Enumeration failure costs the run its database handles, never the
    /// run itself.
    async fn active_handles(&self, conn: &mut weave_postgres::PgConnection) -> Vec<DbHandle> {
        match self.registry.list_active(conn).await {
            Ok(active) => active
                .into_values()
                .map(|connection| connection.handle)
                .collect(),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "failed to enumerate database handles; executing without them"
                );
                Vec::new()
            }
        }
    }

    async fn execute_scripted(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let code = endpoint
            .custom_code
            .clone()
            .ok_or_else(|| {
                RuntimeError::InvalidEndpoint("scripted endpoint missing custom_code".into())
            })?;
        let context = context.clone();

        tokio::task::spawn_blocking(move || sandbox::execute_inline(&code, &context))
            .await
            .map_err(|join_error| {
                RuntimeError::Internal(format!("script task failed: {join_error}"))
            })?
    }

    async fn execute_crud(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> RuntimeResult<Value> {
        let model_id = endpoint.model_id.ok_or_else(|| {
            RuntimeError::InvalidEndpoint("generic-crud endpoint missing model_id".into())
        })?;

        let mut conn = self.pg.get_connection().await?;
        let model = conn.find_data_model_by_id(model_id).await?.ok_or_else(|| {
            RuntimeError::InvalidEndpoint(format!("data model {model_id} does not exist"))
        })?;

        let active = self.registry.list_active(&mut conn).await?;
        let handle = active
            .values()
            .find(|connection| connection.config.is_default)
            .map(|connection| connection.handle.clone())
            .ok_or_else(|| {
                RuntimeError::InvalidEndpoint("no default database config is active".into())
            })?;
        drop(conn);

        crud::execute(&handle, &model, &endpoint.method, context).await
    }
}

/// The reported (not raised) payload for an unknown logic type.
fn unknown_logic_payload(logic_type: &str) -> Value {
    json!({"error": format!("unknown logic type: {logic_type}")})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_logic_types_are_reported_not_raised() {
        let payload = unknown_logic_payload("graphql");
        assert_eq!(payload, json!({"error": "unknown logic type: graphql"}));
    }
}
