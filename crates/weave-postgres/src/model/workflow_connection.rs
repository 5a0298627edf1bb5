//! Workflow connection model for PostgreSQL database operations.

use diesel::prelude::*;

use crate::schema::workflow_connections;

/// A canvas edge between two workflow nodes.
///
/// Connections are persisted for the editor but the executing state machine
/// never traverses them; the next node comes solely from the value each
/// node's script returns.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowConnection {
    /// Unique row identifier.
    pub id: i32,
    /// Reference to the owning workflow.
    pub workflow_id: i32,
    /// Canvas identifier of the source node.
    pub source_node: String,
    /// Canvas identifier of the target node.
    pub target_node: String,
    /// Optional edge condition label.
    pub condition: Option<String>,
}

/// Data for creating a new workflow connection.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = workflow_connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowConnection {
    /// Owning workflow (required).
    pub workflow_id: i32,
    /// Canvas identifier of the source node.
    pub source_node: String,
    /// Canvas identifier of the target node.
    pub target_node: String,
    /// Optional edge condition label.
    pub condition: Option<String>,
}
