use serde_json::{Value, json};
use weave_core::types::RequestContext;
use weave_postgres::types::RunStatus;

use super::*;
use crate::program::{NodeProgram, ProgramNode};
use crate::trace::ExecutionTrace;

fn program(nodes: &[(i64, &str)]) -> NodeProgram {
    let mut program = NodeProgram::new();
    for (number, code) in nodes {
        program.insert(ProgramNode {
            number: *number,
            name: format!("node-{number}"),
            code: (*code).to_owned(),
        });
    }
    program
}

fn test_trace() -> ExecutionTrace {
    ExecutionTrace::begin(1, "test", "POST", "/workflow/api/test", vec![], Value::Null)
}

async fn run(program: &NodeProgram) -> (RunReport, ExecutionTrace) {
    let engine = WorkflowEngine::with_defaults();
    let mut trace = test_trace();
    let report = engine
        .run(program, &RequestContext::new(), Vec::new(), &mut trace)
        .await;
    (report, trace)
}

#[tokio::test(flavor = "multi_thread")]
async fn linear_chain_completes_in_three_iterations() {
    let program = program(&[
        (1, "({ next: 2, data: { steps: 1 } })"),
        (2, "({ next: 3, data: { steps: data.steps + 1 } })"),
        (3, "({ next: 0, data: { steps: data.steps + 1 } })"),
    ]);

    let (report, trace) = run(&program).await;

    assert_eq!(report.state, TerminalState::Done);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.final_node, Some(3));
    assert_eq!(report.payload["data"], json!({"steps": 3}));
    assert_eq!(report.payload["message"], json!("workflow completed"));
    assert_eq!(trace.nodes.len(), 3);
    assert_eq!(trace.status, RunStatus::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn revisiting_a_node_is_a_cycle_error() {
    let program = program(&[
        (1, "({ next: 2, data: data })"),
        (2, "({ next: 1, data: data })"),
    ]);

    let (report, _) = run(&program).await;

    assert_eq!(report.state, TerminalState::CycleDetected);
    // Caught on the revisit, far below the iteration ceiling.
    assert_eq!(report.iterations, 3);
    assert_eq!(
        report.payload["error"],
        json!("cycle detected: node 1 already visited")
    );
    assert_eq!(report.payload["current_node"], json!(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_start_node_ends_successfully_at_zero() {
    let program = program(&[(2, "({ next: 0 })")]);

    let (report, trace) = run(&program).await;

    assert_eq!(report.state, TerminalState::MissingNodeEnd);
    assert_eq!(report.final_node, Some(0));
    assert_eq!(
        report.payload["message"],
        json!("workflow ended: node 1 does not exist")
    );
    // Not an error: the canonical no-next-step termination.
    assert_eq!(trace.status, RunStatus::Success);
    assert!(trace.nodes.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn jump_to_absent_node_is_done_not_missing() {
    let program = program(&[(1, "({ next: 99, data: { from: 1 } })")]);

    let (report, _) = run(&program).await;

    assert_eq!(report.state, TerminalState::Done);
    assert_eq!(report.final_node, Some(1));
    assert_eq!(report.payload["data"], json!({"from": 1}));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_node_script_is_an_error() {
    let program = program(&[(1, "   ")]);

    let (report, trace) = run(&program).await;

    assert_eq!(report.state, TerminalState::EmptyNodeScript);
    assert_eq!(report.payload["error"], json!("node 1 has no code"));
    assert_eq!(trace.status, RunStatus::Error);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_node_reports_error_with_diagnostics() {
    let program = program(&[
        (1, "({ next: 2, data: { ok: true } })"),
        (2, "undefinedFunction();"),
    ]);

    let (report, trace) = run(&program).await;

    assert_eq!(report.state, TerminalState::ExecutionFailed);
    assert_eq!(report.payload["node"], json!(2));
    let message = report.payload["error"].as_str().unwrap();
    assert!(message.starts_with("node 2 failed:"));
    assert!(report.payload["traceback"].is_string());

    // The failing node is recorded alongside the successful one.
    assert_eq!(trace.nodes.len(), 2);
    assert_eq!(trace.nodes[1].status, RunStatus::Error);
    assert_eq!(trace.status, RunStatus::Error);
}

#[tokio::test(flavor = "multi_thread")]
async fn forced_forward_jumps_hit_the_iteration_limit() {
    // More nodes than the ceiling, each jumping to the next: the run must
    // stop at the limit, never looping indefinitely.
    let mut nodes = NodeProgram::new();
    for number in 1..=1200_i64 {
        nodes.insert(ProgramNode {
            number,
            name: format!("node-{number}"),
            code: "({ next: node + 1, data: data })".into(),
        });
    }

    let (report, _) = run(&nodes).await;

    assert_eq!(report.state, TerminalState::IterationLimit);
    assert_eq!(report.iterations, 1000);
    assert_eq!(
        report.payload["error"],
        json!("workflow exceeded the maximum iteration count")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn two_node_scenario_produces_merged_payload() {
    // Node 1 declares data {a: 1}; node 2 extends it and stops.
    let program = program(&[
        (1, "({ next: 2, data: { a: 1 } })"),
        (2, "let out = Object.assign({}, data, { b: 2 }); ({ next: 0, data: out })"),
    ]);

    let (report, _) = run(&program).await;

    assert_eq!(report.state, TerminalState::Done);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.payload["data"], json!({"a": 1, "b": 2}));
}

#[tokio::test(flavor = "multi_thread")]
async fn trace_records_timing_and_next_per_node() {
    let program = program(&[(1, "({ next: 0, data: { done: true } })")]);

    let (_, trace) = run(&program).await;

    assert_eq!(trace.nodes.len(), 1);
    let node = &trace.nodes[0];
    assert_eq!(node.number, 1);
    assert_eq!(node.next, Some(0));
    assert!(node.end_time.is_some());
    assert!(node.duration_secs.is_some());
    assert_eq!(node.output_preview.as_deref(), Some(r#"{"done":true}"#));
}
