//! Endpoint model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::endpoints;

/// A declared API endpoint and its execution strategy.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = endpoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Endpoint {
    /// Unique endpoint identifier.
    pub id: i32,
    /// Endpoint name.
    pub name: String,
    /// Route path (unique), in axum syntax (`/items/{id}`).
    pub path: String,
    /// HTTP method.
    pub method: String,
    /// Endpoint description.
    pub description: Option<String>,
    /// Short documentation summary.
    pub summary: Option<String>,
    /// Whether the endpoint is routed.
    pub enabled: bool,
    /// Execution strategy selector (stored as text, parsed at dispatch).
    pub logic_type: String,
    /// Workflow backing this endpoint, for workflow logic.
    pub workflow_id: Option<i32>,
    /// Data model backing this endpoint, for generic-CRUD logic.
    pub model_id: Option<i32>,
    /// Inline script source, for scripted logic.
    pub custom_code: Option<String>,
    /// Literal response template (JSON text), for templated logic.
    pub response_template: Option<String>,
    /// Timestamp when the endpoint was created.
    pub created_at: Timestamp,
    /// Timestamp when the endpoint was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new endpoint.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = endpoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewEndpoint {
    /// Endpoint name.
    pub name: String,
    /// Route path (required, unique).
    pub path: String,
    /// HTTP method.
    pub method: String,
    /// Endpoint description.
    pub description: Option<String>,
    /// Short documentation summary.
    pub summary: Option<String>,
    /// Whether the endpoint is routed.
    pub enabled: Option<bool>,
    /// Execution strategy selector.
    pub logic_type: String,
    /// Workflow backing this endpoint.
    pub workflow_id: Option<i32>,
    /// Data model backing this endpoint.
    pub model_id: Option<i32>,
    /// Inline script source.
    pub custom_code: Option<String>,
    /// Literal response template.
    pub response_template: Option<String>,
}
