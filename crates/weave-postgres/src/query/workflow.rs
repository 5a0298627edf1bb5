//! Workflows repository for definitions, nodes and canvas connections.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{
    NewWorkflow, NewWorkflowConnection, NewWorkflowNode, Workflow, WorkflowConnection,
    WorkflowNode,
};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for workflow database operations.
pub trait WorkflowRepository {
    /// Creates a new workflow record.
    fn create_workflow(
        &mut self,
        new_workflow: NewWorkflow,
    ) -> impl Future<Output = PgResult<Workflow>> + Send;

    /// Finds a workflow by its unique identifier.
    fn find_workflow_by_id(
        &mut self,
        workflow_id: i32,
    ) -> impl Future<Output = PgResult<Option<Workflow>>> + Send;

    /// Finds an enabled workflow by its unique name.
    fn find_enabled_workflow_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = PgResult<Option<Workflow>>> + Send;

    /// Creates a node for a workflow.
    fn create_workflow_node(
        &mut self,
        new_node: NewWorkflowNode,
    ) -> impl Future<Output = PgResult<WorkflowNode>> + Send;

    /// Lists a workflow's nodes ordered by canvas X coordinate.
    ///
    /// The order matters: when two nodes derive the same execution-order
    /// key, the later one (greater `position_x`) wins the map slot.
    fn list_workflow_nodes(
        &mut self,
        workflow_id: i32,
    ) -> impl Future<Output = PgResult<Vec<WorkflowNode>>> + Send;

    /// Creates a canvas connection for a workflow.
    fn create_workflow_connection(
        &mut self,
        new_connection: NewWorkflowConnection,
    ) -> impl Future<Output = PgResult<WorkflowConnection>> + Send;

    /// Lists a workflow's canvas connections.
    fn list_workflow_connections(
        &mut self,
        workflow_id: i32,
    ) -> impl Future<Output = PgResult<Vec<WorkflowConnection>>> + Send;
}

impl WorkflowRepository for PgConnection {
    async fn create_workflow(&mut self, new_workflow: NewWorkflow) -> PgResult<Workflow> {
        use schema::workflows;

        let workflow = diesel::insert_into(workflows::table)
            .values(&new_workflow)
            .returning(Workflow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn find_workflow_by_id(&mut self, workflow_id: i32) -> PgResult<Option<Workflow>> {
        use schema::workflows::{self, dsl};

        let workflow = workflows::table
            .filter(dsl::id.eq(workflow_id))
            .select(Workflow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn find_enabled_workflow_by_name(&mut self, name: &str) -> PgResult<Option<Workflow>> {
        use schema::workflows::{self, dsl};

        let workflow = workflows::table
            .filter(dsl::name.eq(name))
            .filter(dsl::enabled.eq(true))
            .select(Workflow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn create_workflow_node(
        &mut self,
        new_node: NewWorkflowNode,
    ) -> PgResult<WorkflowNode> {
        use schema::workflow_nodes;

        let node = diesel::insert_into(workflow_nodes::table)
            .values(&new_node)
            .returning(WorkflowNode::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(node)
    }

    async fn list_workflow_nodes(&mut self, workflow_id: i32) -> PgResult<Vec<WorkflowNode>> {
        use schema::workflow_nodes::{self, dsl};

        let nodes = workflow_nodes::table
            .filter(dsl::workflow_id.eq(workflow_id))
            .order(dsl::position_x.asc())
            .select(WorkflowNode::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(nodes)
    }

    async fn create_workflow_connection(
        &mut self,
        new_connection: NewWorkflowConnection,
    ) -> PgResult<WorkflowConnection> {
        use schema::workflow_connections;

        let connection = diesel::insert_into(workflow_connections::table)
            .values(&new_connection)
            .returning(WorkflowConnection::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(connection)
    }

    async fn list_workflow_connections(
        &mut self,
        workflow_id: i32,
    ) -> PgResult<Vec<WorkflowConnection>> {
        use schema::workflow_connections::{self, dsl};

        let connections = workflow_connections::table
            .filter(dsl::workflow_id.eq(workflow_id))
            .select(WorkflowConnection::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(connections)
    }
}
