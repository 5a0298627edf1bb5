//! Workflow node model for PostgreSQL database operations.

use diesel::prelude::*;

use crate::schema::workflow_nodes;

/// One node of a workflow's canvas graph.
///
/// The execution-order key is not stored directly: it is either declared in
/// `config["number"]` or derived from the canvas X coordinate (see the
/// runtime's program builder). `position_y` is pure UI layout.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_nodes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowNode {
    /// Unique row identifier.
    pub id: i32,
    /// Reference to the owning workflow.
    pub workflow_id: i32,
    /// Canvas-level node identifier.
    pub node_id: String,
    /// Node type tag (e.g. `script`).
    pub node_type: String,
    /// Human-readable node name.
    pub name: String,
    /// Canvas X coordinate.
    pub position_x: i32,
    /// Canvas Y coordinate.
    pub position_y: i32,
    /// Node configuration map; `code` holds the script source.
    pub config: serde_json::Value,
}

/// Data for creating a new workflow node.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = workflow_nodes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowNode {
    /// Owning workflow (required).
    pub workflow_id: i32,
    /// Canvas-level node identifier.
    pub node_id: String,
    /// Node type tag.
    pub node_type: String,
    /// Human-readable node name.
    pub name: String,
    /// Canvas X coordinate.
    pub position_x: i32,
    /// Canvas Y coordinate.
    pub position_y: i32,
    /// Node configuration map.
    pub config: serde_json::Value,
}

impl WorkflowNode {
    /// Returns the node's script source, if any.
    pub fn code(&self) -> Option<&str> {
        self.config.get("code").and_then(|code| code.as_str())
    }

    /// Returns the explicitly declared execution-order key, if any.
    pub fn configured_number(&self) -> Option<i64> {
        self.config.get("number").and_then(|number| number.as_i64())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(config: serde_json::Value) -> WorkflowNode {
        WorkflowNode {
            id: 1,
            workflow_id: 1,
            node_id: "n1".into(),
            node_type: "script".into(),
            name: "first".into(),
            position_x: 200,
            position_y: 0,
            config,
        }
    }

    #[test]
    fn reads_code_and_number_from_config() {
        let node = node(json!({"code": "({ next: 0 })", "number": 7}));
        assert_eq!(node.code(), Some("({ next: 0 })"));
        assert_eq!(node.configured_number(), Some(7));
    }

    #[test]
    fn missing_config_entries_are_none() {
        let node = node(json!({}));
        assert_eq!(node.code(), None);
        assert_eq!(node.configured_number(), None);
    }
}
