//! Node programs: the `{node_number → node}` map driving one run.

use std::collections::BTreeMap;

use weave_postgres::model::WorkflowNode;

/// Horizontal canvas distance between consecutive node slots.
const NODE_SLOT_WIDTH: i64 = 200;

/// Returns the execution-order key for a node.
///
/// An explicit `config["number"]` wins; otherwise the key is derived from
/// the canvas X coordinate. Euclidean division keeps the derivation a true
/// floor for negative coordinates.
pub fn node_number(node: &WorkflowNode) -> i64 {
    node.configured_number()
        .unwrap_or_else(|| i64::from(node.position_x).div_euclid(NODE_SLOT_WIDTH))
}

/// One executable node of a resolved program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramNode {
    /// Execution-order key.
    pub number: i64,
    /// Human-readable node name.
    pub name: String,
    /// Script source; empty when the node declares no code.
    pub code: String,
}

/// The resolved, jump-addressable form of one workflow.
///
/// Built fresh for every run; concurrent runs of the same workflow never
/// share a program.
#[derive(Debug, Clone, Default)]
pub struct NodeProgram {
    nodes: BTreeMap<i64, ProgramNode>,
}

impl NodeProgram {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a program from persisted nodes.
    ///
    /// `nodes` must already be ordered by `position_x` (the repository
    /// guarantees this); when two nodes derive the same number the later
    /// one deterministically wins the slot.
    pub fn from_nodes(nodes: &[WorkflowNode]) -> Self {
        let mut program = Self::new();
        for node in nodes {
            program.insert(ProgramNode {
                number: node_number(node),
                name: node.name.clone(),
                code: node.code().unwrap_or_default().to_owned(),
            });
        }
        program
    }

    /// Inserts a node, replacing any previous holder of its number.
    pub fn insert(&mut self, node: ProgramNode) {
        self.nodes.insert(node.number, node);
    }

    /// Looks up a node by number.
    pub fn get(&self, number: i64) -> Option<&ProgramNode> {
        self.nodes.get(&number)
    }

    /// Returns whether a node with the given number exists.
    pub fn contains(&self, number: i64) -> bool {
        self.nodes.contains_key(&number)
    }

    /// Returns the number of distinct node slots.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the program has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stored_node(position_x: i32, name: &str, config: serde_json::Value) -> WorkflowNode {
        WorkflowNode {
            id: 0,
            workflow_id: 1,
            node_id: format!("node-{position_x}"),
            node_type: "script".into(),
            name: name.into(),
            position_x,
            position_y: 40,
            config,
        }
    }

    #[test]
    fn derives_number_from_canvas_x() {
        let node = stored_node(450, "n", json!({}));
        assert_eq!(node_number(&node), 2);

        let node = stored_node(199, "n", json!({}));
        assert_eq!(node_number(&node), 0);

        let node = stored_node(-50, "n", json!({}));
        assert_eq!(node_number(&node), -1);
    }

    #[test]
    fn explicit_number_overrides_position() {
        let node = stored_node(450, "n", json!({"number": 9}));
        assert_eq!(node_number(&node), 9);
    }

    #[test]
    fn colliding_numbers_resolve_last_wins() {
        // 150 and 250 both land on slot 1; the later row keeps it.
        let nodes = vec![
            stored_node(150, "first", json!({"code": "a"})),
            stored_node(250, "second", json!({"code": "b"})),
        ];

        let program = NodeProgram::from_nodes(&nodes);
        assert_eq!(program.len(), 1);
        assert_eq!(program.get(1).unwrap().name, "second");
        assert_eq!(program.get(1).unwrap().code, "b");
    }

    #[test]
    fn missing_code_becomes_empty_string() {
        let nodes = vec![stored_node(200, "bare", json!({}))];
        let program = NodeProgram::from_nodes(&nodes);
        assert_eq!(program.get(1).unwrap().code, "");
    }
}
