//! Durable execution traces.
//!
//! One run produces one plain-text trace file under the trace directory,
//! named `{startTimeYYYYMMDD_HHMMSS}_{executionIdWithoutHyphens}.log`. The
//! textual layout uses fixed section labels that the log-browsing endpoint
//! parses back by substring matching: the labels are a compatibility wire
//! format carried over from the previous generation of the platform and
//! must stay byte-for-byte identical, localized text included.

mod store;

use jiff::Zoned;
use serde_json::Value;
use uuid::Uuid;
use weave_postgres::types::RunStatus;

pub use self::store::{TraceStore, TraceSummary};

// Labels parsed back by the log browser. Do not edit: wire format.
pub(crate) const LABEL_EXECUTION_ID: &str = "执行ID:";
pub(crate) const LABEL_WORKFLOW_ID: &str = "工作流ID:";
pub(crate) const LABEL_WORKFLOW_NAME: &str = "工作流名称:";
pub(crate) const LABEL_START_TIME: &str = "开始时间:";
pub(crate) const LABEL_END_TIME: &str = "结束时间:";
pub(crate) const LABEL_DURATION: &str = "执行时长:";
pub(crate) const LABEL_STATUS: &str = "状态:";

const SECTION_RULE: &str =
    "================================================================================";

/// Timestamp layout used in the trace header.
const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Record of one node execution within a run.
#[derive(Debug, Clone)]
pub struct NodeTrace {
    /// Execution-order key of the node.
    pub number: i64,
    /// Node name.
    pub name: String,
    /// When the node started.
    pub start_time: Zoned,
    /// When the node finished.
    pub end_time: Option<Zoned>,
    /// Wall-clock duration in seconds.
    pub duration_secs: Option<f64>,
    /// Terminal node status.
    pub status: RunStatus,
    /// The next-node value the script declared.
    pub next: Option<i64>,
    /// Truncated preview of the node's output data.
    ///
    /// Recorded in the structured record; not rendered into the text
    /// artifact (the layout predates the field).
    pub output_preview: Option<String>,
    /// Error text when the node failed.
    pub error: Option<String>,
}

/// The assembled record of one workflow run.
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    /// Unique id of this run.
    pub execution_id: Uuid,
    /// Id of the executed workflow.
    pub workflow_id: i32,
    /// Name of the executed workflow.
    pub workflow_name: String,
    /// When the run started.
    pub start_time: Zoned,
    /// When the run finished.
    pub end_time: Option<Zoned>,
    /// Wall-clock duration in seconds.
    pub duration_secs: Option<f64>,
    /// Run status; `Running` until [`finish`] is called.
    ///
    /// [`finish`]: Self::finish
    pub status: RunStatus,
    /// Final node of a completed run.
    pub final_node: Option<i64>,
    /// Number of executed iterations.
    pub iterations: u32,
    /// HTTP method of the triggering request.
    pub request_method: String,
    /// Path of the triggering request.
    pub request_path: String,
    /// Query parameters of the triggering request.
    pub request_query: Vec<(String, String)>,
    /// JSON body of the triggering request.
    pub request_body: Value,
    /// Final run payload.
    pub result: Value,
    /// Error message for failed runs.
    pub error_message: Option<String>,
    /// Diagnostic chain for failed runs.
    pub error_traceback: Option<String>,
    /// Per-node sub-records, in execution order.
    pub nodes: Vec<NodeTrace>,
}

impl ExecutionTrace {
    /// Opens a new trace at the start of a run.
    pub fn begin(
        workflow_id: i32,
        workflow_name: impl Into<String>,
        request_method: impl Into<String>,
        request_path: impl Into<String>,
        request_query: Vec<(String, String)>,
        request_body: Value,
    ) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            workflow_id,
            workflow_name: workflow_name.into(),
            start_time: Zoned::now(),
            end_time: None,
            duration_secs: None,
            status: RunStatus::Running,
            final_node: None,
            iterations: 0,
            request_method: request_method.into(),
            request_path: request_path.into(),
            request_query,
            request_body,
            result: Value::Null,
            error_message: None,
            error_traceback: None,
            nodes: Vec::new(),
        }
    }

    /// Appends one node record.
    pub fn record_node(&mut self, node: NodeTrace) {
        self.nodes.push(node);
    }

    /// Seals the trace with the run's terminal state.
    ///
    /// The error message and diagnostic chain are lifted from the payload's
    /// `error`/`traceback` entries when present.
    pub fn finish(
        &mut self,
        status: RunStatus,
        final_node: Option<i64>,
        iterations: u32,
        result: Value,
    ) {
        let end_time = Zoned::now();
        self.duration_secs = Some(
            end_time
                .timestamp()
                .duration_since(self.start_time.timestamp())
                .as_secs_f64(),
        );
        self.end_time = Some(end_time);
        self.status = status;
        self.final_node = final_node;
        self.iterations = iterations;

        self.error_message = result
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_owned);
        self.error_traceback = result
            .get("traceback")
            .and_then(Value::as_str)
            .map(str::to_owned);
        self.result = result;
    }

    /// Returns the artifact file name for this trace.
    pub fn file_name(&self) -> String {
        let time = self.start_time.strftime("%Y%m%d_%H%M%S");
        let id = self.execution_id.simple();
        format!("{time}_{id}.log")
    }

    /// Renders the trace into its textual artifact form.
    pub fn format(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(SECTION_RULE.into());
        lines.push("工作流执行日志".into());
        lines.push(SECTION_RULE.into());
        lines.push(String::new());

        lines.push("【基本信息】".into());
        lines.push(format!("  {LABEL_EXECUTION_ID}     {}", self.execution_id));
        lines.push(format!("  {LABEL_WORKFLOW_ID}   {}", self.workflow_id));
        lines.push(format!("  {LABEL_WORKFLOW_NAME} {}", self.workflow_name));
        lines.push(format!(
            "  {LABEL_START_TIME}   {}",
            self.start_time.strftime(HEADER_TIME_FORMAT)
        ));
        if let Some(end_time) = &self.end_time {
            lines.push(format!(
                "  {LABEL_END_TIME}   {}",
                end_time.strftime(HEADER_TIME_FORMAT)
            ));
        }
        if let Some(duration) = self.duration_secs {
            lines.push(format!("  {LABEL_DURATION}   {duration:.3} 秒"));
        }
        lines.push(format!(
            "  {LABEL_STATUS}       {}",
            self.status.as_ref().to_uppercase()
        ));
        if let Some(final_node) = self.final_node
            && final_node != 0
        {
            lines.push(format!("  最终节点:   {final_node}"));
        }
        if self.iterations != 0 {
            lines.push(format!("  迭代次数:   {}", self.iterations));
        }
        lines.push(String::new());

        lines.push("【请求信息】".into());
        lines.push(format!("  请求方法:   {}", self.request_method));
        lines.push(format!("  请求路径:   {}", self.request_path));
        if !self.request_query.is_empty() {
            lines.push("  查询参数:".into());
            for (key, value) in &self.request_query {
                lines.push(format!("    {key}: {value}"));
            }
        }
        if !matches!(self.request_body, Value::Null) {
            lines.push("  请求体:".into());
            push_pretty_json(&mut lines, &self.request_body, "    ");
        }
        lines.push(String::new());

        if !self.nodes.is_empty() {
            lines.push("【节点执行详情】".into());
            for (index, node) in self.nodes.iter().enumerate() {
                lines.push(format!("  节点 {}: {}", index + 1, node.name));
                lines.push(format!("    编号:     {}", node.number));
                lines.push(format!(
                    "    开始时间: {}",
                    node.start_time.timestamp()
                ));
                if let Some(end_time) = &node.end_time {
                    lines.push(format!("    结束时间: {}", end_time.timestamp()));
                }
                if let Some(duration) = node.duration_secs {
                    lines.push(format!("    耗时:     {duration:.3}秒"));
                }
                lines.push(format!(
                    "    状态:     {}",
                    node.status.as_ref().to_uppercase()
                ));
                if let Some(error) = &node.error {
                    lines.push(format!("    错误:     {error}"));
                }
                lines.push(String::new());
            }
        }

        if !matches!(self.result, Value::Null) {
            lines.push("【执行结果】".into());
            push_pretty_json(&mut lines, &self.result, "  ");
            lines.push(String::new());
        }

        if let Some(message) = &self.error_message {
            lines.push("【错误信息】".into());
            lines.push(format!("  {message}"));
            lines.push(String::new());
        }

        if let Some(traceback) = &self.error_traceback {
            lines.push("【错误堆栈】".into());
            for line in traceback.lines() {
                lines.push(format!("  {line}"));
            }
            lines.push(String::new());
        }

        lines.push(SECTION_RULE.into());
        lines.push(format!(
            "日志生成时间: {}",
            Zoned::now().strftime(HEADER_TIME_FORMAT)
        ));
        lines.push(SECTION_RULE.into());

        lines.join("\n")
    }
}

fn push_pretty_json(lines: &mut Vec<String>, value: &Value, prefix: &str) {
    let rendered =
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    for line in rendered.lines() {
        lines.push(format!("{prefix}{line}"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn finished_trace() -> ExecutionTrace {
        let mut trace = ExecutionTrace::begin(
            42,
            "orders",
            "POST",
            "/workflow/api/orders",
            vec![("verbose".into(), "1".into())],
            json!({"workflow_name": "orders"}),
        );

        trace.record_node(NodeTrace {
            number: 1,
            name: "load".into(),
            start_time: trace.start_time.clone(),
            end_time: Some(trace.start_time.clone()),
            duration_secs: Some(0.012),
            status: RunStatus::Success,
            next: Some(0),
            output_preview: Some("{}".into()),
            error: None,
        });

        trace.finish(
            RunStatus::Success,
            Some(1),
            1,
            json!({"message": "workflow completed", "final_node": 1, "data": {}, "iterations": 1}),
        );

        trace
    }

    #[test]
    fn file_name_strips_uuid_hyphens() {
        let trace = finished_trace();
        let name = trace.file_name();

        assert!(name.ends_with(".log"));
        assert!(!name.contains('-'));
        assert!(name.contains(&trace.execution_id.simple().to_string()));
        // YYYYMMDD_HHMMSS prefix.
        assert_eq!(name.split('_').next().unwrap().len(), 8);
    }

    #[test]
    fn format_carries_the_parsed_labels() {
        let trace = finished_trace();
        let rendered = trace.format();

        assert!(rendered.contains("工作流执行日志"));
        assert!(rendered.contains(&format!("{LABEL_EXECUTION_ID}     {}", trace.execution_id)));
        assert!(rendered.contains(&format!("{LABEL_WORKFLOW_NAME} orders")));
        assert!(rendered.contains(&format!("{LABEL_STATUS}       SUCCESS")));
        assert!(rendered.contains("【节点执行详情】"));
        assert!(rendered.contains("节点 1: load"));
        assert!(rendered.contains("【执行结果】"));
    }

    #[test]
    fn finish_lifts_error_fields_from_payload() {
        let mut trace = ExecutionTrace::begin(1, "w", "POST", "/workflow/api/w", vec![], Value::Null);
        trace.finish(
            RunStatus::Error,
            None,
            2,
            json!({"error": "node 2 failed: boom", "node": 2, "traceback": "script error: boom"}),
        );

        assert_eq!(trace.error_message.as_deref(), Some("node 2 failed: boom"));
        assert_eq!(trace.error_traceback.as_deref(), Some("script error: boom"));

        let rendered = trace.format();
        assert!(rendered.contains("【错误信息】"));
        assert!(rendered.contains("【错误堆栈】"));
        assert!(rendered.contains(&format!("{LABEL_STATUS}       ERROR")));
    }
}
