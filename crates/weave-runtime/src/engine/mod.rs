//! The workflow state machine.
//!
//! Drives node-to-node control flow for one run: start at node 1 with
//! empty input data, execute the current node's script, follow its
//! declared `next` value, and stop on the first terminal condition. The
//! visited set and a hard iteration ceiling are the only loop guards;
//! there is no execution timeout.

mod config;

use std::collections::HashSet;

use jiff::Zoned;
use serde_json::{Value, json};
use weave_core::types::RequestContext;
use weave_postgres::types::RunStatus;

pub use self::config::EngineConfig;
use crate::error::RuntimeError;
use crate::program::NodeProgram;
use crate::registry::DbHandle;
use crate::sandbox::Sandbox;
use crate::trace::{ExecutionTrace, NodeTrace};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "weave_runtime::engine";

/// Terminal states of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// A node declared `next <= 0` or a jump to an absent node.
    Done,
    /// The starting node did not exist; a successful completion.
    MissingNodeEnd,
    /// A node was reached twice.
    CycleDetected,
    /// The current node declares no script.
    EmptyNodeScript,
    /// A node's script failed.
    ExecutionFailed,
    /// The iteration ceiling was hit before any other terminal state.
    IterationLimit,
}

impl TerminalState {
    /// Returns whether this state records a successful completion.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Done | Self::MissingNodeEnd)
    }

    /// Maps the terminal state onto the persisted run status.
    pub fn run_status(self) -> RunStatus {
        if self.is_success() {
            RunStatus::Success
        } else {
            RunStatus::Error
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// How the run terminated.
    pub state: TerminalState,
    /// The payload returned to the caller.
    pub payload: Value,
    /// Number of executed iterations.
    pub iterations: u32,
    /// Final node for successful completions.
    pub final_node: Option<i64>,
}

/// The workflow execution engine.
///
/// Stateless across runs; concurrent runs interleave freely and each gets
/// its own program, data and visited set. Within one run, nodes execute
/// strictly sequentially.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    config: EngineConfig,
    http: reqwest::Client,
}

impl WorkflowEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            max_iterations = config.max_iterations,
            "workflow engine initialized"
        );

        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a new engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one workflow program to a terminal state.
    ///
    /// Node scripts execute on blocking worker threads; the engine records
    /// every node into `trace` and seals it with the terminal result.
    pub async fn run(
        &self,
        program: &NodeProgram,
        context: &RequestContext,
        handles: Vec<DbHandle>,
        trace: &mut ExecutionTrace,
    ) -> RunReport {
        let sandbox = Sandbox::new(handles, self.http.clone());

        let mut current: i64 = 1;
        let mut data = Value::Object(serde_json::Map::new());
        let mut visited: HashSet<i64> = HashSet::new();
        let mut iterations: u32 = 0;

        let report = loop {
            if iterations >= self.config.max_iterations {
                break RunReport {
                    state: TerminalState::IterationLimit,
                    payload: json!({
                        "error": "workflow exceeded the maximum iteration count",
                        "iterations": iterations,
                    }),
                    iterations,
                    final_node: None,
                };
            }
            iterations += 1;

            let Some(node) = program.get(current) else {
                // The canonical "ran out of declared nodes" completion.
                break RunReport {
                    state: TerminalState::MissingNodeEnd,
                    payload: json!({
                        "message": format!("workflow ended: node {current} does not exist"),
                        "final_node": current - 1,
                        "data": data,
                    }),
                    iterations,
                    final_node: Some(current - 1),
                };
            };

            if !visited.insert(current) {
                break RunReport {
                    state: TerminalState::CycleDetected,
                    payload: json!({
                        "error": format!("cycle detected: node {current} already visited"),
                        "current_node": current,
                        "data": data,
                    }),
                    iterations,
                    final_node: None,
                };
            }

            if node.code.trim().is_empty() {
                break RunReport {
                    state: TerminalState::EmptyNodeScript,
                    payload: json!({
                        "error": format!("node {current} has no code"),
                        "node": current,
                    }),
                    iterations,
                    final_node: None,
                };
            }

            tracing::debug!(
                target: TRACING_TARGET,
                node = current,
                name = %node.name,
                iteration = iterations,
                "executing node"
            );

            let started = Zoned::now();
            let result = {
                let sandbox = sandbox.clone();
                let code = node.code.clone();
                let name = node.name.clone();
                let input = data.clone();
                let context = context.clone();

                tokio::task::spawn_blocking(move || {
                    sandbox.execute_node(&code, current, &name, &input, &context)
                })
                .await
                .unwrap_or_else(|join_error| {
                    Err(RuntimeError::Internal(format!(
                        "node execution task failed: {join_error}"
                    )))
                })
            };

            let ended = Zoned::now();
            let duration = ended
                .timestamp()
                .duration_since(started.timestamp())
                .as_secs_f64();

            match result {
                Ok(output) => {
                    trace.record_node(NodeTrace {
                        number: current,
                        name: node.name.clone(),
                        start_time: started,
                        end_time: Some(ended),
                        duration_secs: Some(duration),
                        status: RunStatus::Success,
                        next: Some(output.next),
                        output_preview: Some(preview(&output.data, self.config.output_preview_len)),
                        error: None,
                    });

                    data = output.data;

                    if output.next <= 0 || !program.contains(output.next) {
                        break RunReport {
                            state: TerminalState::Done,
                            payload: json!({
                                "message": "workflow completed",
                                "final_node": current,
                                "data": data,
                                "iterations": iterations,
                            }),
                            iterations,
                            final_node: Some(current),
                        };
                    }

                    current = output.next;
                }
                Err(error) => {
                    let chain = error.chain();

                    trace.record_node(NodeTrace {
                        number: current,
                        name: node.name.clone(),
                        start_time: started,
                        end_time: Some(ended),
                        duration_secs: Some(duration),
                        status: RunStatus::Error,
                        next: None,
                        output_preview: None,
                        error: Some(error.to_string()),
                    });

                    break RunReport {
                        state: TerminalState::ExecutionFailed,
                        payload: json!({
                            "error": format!("node {current} failed: {error}"),
                            "node": current,
                            "traceback": chain,
                        }),
                        iterations,
                        final_node: None,
                    };
                }
            }
        };

        trace.finish(
            report.state.run_status(),
            report.final_node,
            report.iterations,
            report.payload.clone(),
        );

        tracing::debug!(
            target: TRACING_TARGET,
            state = ?report.state,
            iterations = report.iterations,
            "run finished"
        );

        report
    }
}

/// Truncated textual preview of a node's output, for the trace record.
fn preview(data: &Value, max_len: usize) -> String {
    let mut rendered = data.to_string();
    if rendered.len() > max_len {
        let mut end = max_len;
        while !rendered.is_char_boundary(end) {
            end -= 1;
        }
        rendered.truncate(end);
    }
    rendered
}

#[cfg(test)]
mod tests;
