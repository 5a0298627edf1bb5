//! Workflow model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::workflows;

/// A declared workflow: a named, orderable collection of script nodes.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Workflow {
    /// Unique workflow identifier.
    pub id: i32,
    /// Workflow name (unique; the invoke-by-name key).
    pub name: String,
    /// Workflow description.
    pub description: Option<String>,
    /// Whether the workflow may be invoked.
    pub enabled: bool,
    /// Whether finished runs are persisted as trace files.
    pub logging_enabled: bool,
    /// Timestamp when the workflow was created.
    pub created_at: Timestamp,
    /// Timestamp when the workflow was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new workflow.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflow {
    /// Workflow name (required, unique).
    pub name: String,
    /// Workflow description.
    pub description: Option<String>,
    /// Whether the workflow may be invoked.
    pub enabled: Option<bool>,
    /// Whether finished runs are persisted as trace files.
    pub logging_enabled: Option<bool>,
}
