//! Trace file persistence and browsing.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use weave_postgres::types::RunStatus;

use super::{
    ExecutionTrace, LABEL_DURATION, LABEL_EXECUTION_ID, LABEL_START_TIME, LABEL_STATUS,
    LABEL_WORKFLOW_NAME,
};
use crate::error::{RuntimeError, RuntimeResult};

/// Tracing target for trace persistence.
const TRACING_TARGET: &str = "weave_runtime::trace";

/// How many leading lines carry the parseable header metadata.
const HEADER_LINE_COUNT: usize = 20;

/// Metadata parsed back out of a trace file's labeled header.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TraceSummary {
    /// Artifact file name.
    pub filename: String,
    /// Parsed execution id.
    pub execution_id: Option<String>,
    /// Parsed workflow name.
    pub workflow_name: Option<String>,
    /// Parsed start time (as rendered).
    pub start_time: Option<String>,
    /// Parsed terminal status.
    pub status: Option<RunStatus>,
    /// Parsed duration in seconds.
    pub duration_secs: Option<f64>,
}

/// File-system store for execution traces.
#[derive(Debug, Clone)]
pub struct TraceStore {
    dir: PathBuf,
}

impl TraceStore {
    /// Creates a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists a finished trace, best-effort.
    ///
    /// Returns the written path, or `None` when persistence failed; a
    /// failed write never fails the run it records.
    pub async fn save(&self, trace: &ExecutionTrace) -> Option<PathBuf> {
        let path = self.dir.join(trace.file_name());
        let content = trace.format();

        let result = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, content).await
        }
        .await;

        match result {
            Ok(()) => Some(path),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    execution_id = %trace.execution_id,
                    path = %path.display(),
                    error = %error,
                    "failed to persist execution trace"
                );
                None
            }
        }
    }

    /// Lists stored traces for one workflow, newest first.
    ///
    /// Files that cannot be read or parsed are skipped.
    pub async fn list_for_workflow(
        &self,
        workflow_name: &str,
        limit: usize,
    ) -> Vec<TraceSummary> {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return Vec::new();
        };

        let mut summaries = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
                continue;
            }

            let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };

            let summary = parse_summary(filename, &content);
            if summary.workflow_name.as_deref() == Some(workflow_name) {
                summaries.push(summary);
            }
        }

        summaries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        summaries.truncate(limit);
        summaries
    }

    /// Reads one trace file's raw content plus parsed metadata.
    pub async fn read(&self, filename: &str) -> RuntimeResult<(String, TraceSummary)> {
        validate_filename(filename)?;

        let path = self.dir.join(filename);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            RuntimeError::Internal(format!("failed to read trace file '{filename}': {e}"))
        })?;

        let summary = parse_summary(filename, &content);
        Ok((content, summary))
    }
}

/// Extracts header metadata from a trace file by substring matching on the
/// fixed labels.
pub fn parse_summary(filename: &str, content: &str) -> TraceSummary {
    let mut summary = TraceSummary {
        filename: filename.to_owned(),
        ..TraceSummary::default()
    };

    for line in content.lines().take(HEADER_LINE_COUNT) {
        let line = line.trim();

        if let Some(rest) = split_label(line, LABEL_EXECUTION_ID) {
            summary.execution_id = Some(rest);
        } else if let Some(rest) = split_label(line, LABEL_WORKFLOW_NAME) {
            summary.workflow_name = Some(rest);
        } else if let Some(rest) = split_label(line, LABEL_START_TIME) {
            summary.start_time = Some(rest);
        } else if let Some(rest) = split_label(line, LABEL_DURATION) {
            let rest = rest.replace(" 秒", "");
            summary.duration_secs = rest.parse().ok();
        } else if let Some(rest) = split_label(line, LABEL_STATUS) {
            summary.status = RunStatus::from_str(&rest.to_lowercase()).ok();
        }
    }

    summary
}

fn split_label(line: &str, label: &str) -> Option<String> {
    line.contains(label)
        .then(|| line.rsplit(label).next().unwrap_or_default().trim().to_owned())
}

/// Rejects file names that could escape the trace directory.
fn validate_filename(filename: &str) -> RuntimeResult<()> {
    let valid = filename.ends_with(".log")
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(RuntimeError::InvalidEndpoint(format!(
            "invalid trace file name '{filename}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weave_postgres::types::RunStatus;

    use super::*;

    fn sample_trace(name: &str) -> ExecutionTrace {
        let mut trace = ExecutionTrace::begin(
            7,
            name,
            "POST",
            format!("/workflow/api/{name}"),
            vec![],
            json!({"workflow_name": name}),
        );
        trace.finish(
            RunStatus::Success,
            Some(2),
            2,
            json!({"message": "workflow completed", "final_node": 2, "data": {}, "iterations": 2}),
        );
        trace
    }

    #[test]
    fn summary_round_trips_through_the_text_format() {
        let trace = sample_trace("billing");
        let summary = parse_summary(&trace.file_name(), &trace.format());

        assert_eq!(
            summary.execution_id.as_deref(),
            Some(trace.execution_id.to_string().as_str())
        );
        assert_eq!(summary.workflow_name.as_deref(), Some("billing"));
        assert_eq!(summary.status, Some(RunStatus::Success));
        assert!(summary.start_time.is_some());
        assert!(summary.duration_secs.is_some());
    }

    #[tokio::test]
    async fn save_list_and_read_a_trace() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path());

        let trace = sample_trace("billing");
        let path = store.save(&trace).await.expect("trace should persist");
        assert!(path.exists());

        let listed = store.list_for_workflow("billing", 50).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, trace.file_name());

        let other = store.list_for_workflow("unrelated", 50).await;
        assert!(other.is_empty());

        let (content, summary) = store.read(&trace.file_name()).await.unwrap();
        assert!(content.contains("工作流执行日志"));
        assert_eq!(summary.workflow_name.as_deref(), Some("billing"));
    }

    #[tokio::test]
    async fn read_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path());

        assert!(store.read("../etc/passwd.log").await.is_err());
        assert!(store.read("notes.txt").await.is_err());
        assert!(store.read("a/b.log").await.is_err());
    }

    #[tokio::test]
    async fn save_failure_is_swallowed() {
        // A file where the directory should be makes create_dir_all fail.
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        tokio::fs::write(&blocked, b"file").await.unwrap();

        let store = TraceStore::new(&blocked);
        assert!(store.save(&sample_trace("billing")).await.is_none());
    }
}
