//! JSON export of a workflow run
//!
//! The only persisted artifact in the system: an explicit snapshot of the
//! run written to `workflow_{workflow_id}.json`. Nothing is saved
//! automatically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::types::{ExecutionResult, HistoryEntry, WorkflowState};

/// Error types for export operations
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk document layout
#[derive(Serialize)]
struct ExportDocument<'a> {
    workflow_id: &'a str,
    /// ISO-8601 timestamp, or null when the run never started
    started_at: Option<DateTime<Utc>>,
    /// Last result per process id
    processes: &'a BTreeMap<String, ExecutionResult>,
    history: &'a [HistoryEntry],
}

/// Write the run state as pretty-printed JSON into `dir`, returning the
/// path of the written file. Parent directories are created as needed.
pub fn export_state(state: &WorkflowState, dir: &Path) -> Result<PathBuf, ExportError> {
    let document = ExportDocument {
        workflow_id: &state.workflow_id,
        started_at: state.started_at,
        processes: &state.process_outputs,
        history: &state.history,
    };

    fs::create_dir_all(dir)?;

    let filepath = dir.join(format!("workflow_{}.json", state.workflow_id));
    let serialized = serde_json::to_string_pretty(&document)?;
    fs::write(&filepath, serialized)?;

    tracing::info!(path = %filepath.display(), "workflow exported");
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{HistoryAction, ProcessStatus};

    fn state_with_one_result() -> WorkflowState {
        let mut state = WorkflowState::new(["a", "b"]);
        state.started_at = Some(Utc::now());
        state.process_outputs.insert(
            "a".to_string(),
            ExecutionResult::Success {
                output: "X".to_string(),
                process_id: "a".to_string(),
                timestamp: Utc::now(),
                inputs: BTreeMap::new(),
            },
        );
        state
            .process_status
            .insert("a".to_string(), ProcessStatus::Completed);
        state.history.push(HistoryEntry {
            process: "a".to_string(),
            action: HistoryAction::Executed,
            timestamp: Utc::now(),
        });
        state
    }

    #[test]
    fn exports_expected_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_one_result();

        let path = export_state(&state, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("workflow_{}.json", state.workflow_id)
        );

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["workflow_id"], state.workflow_id.as_str());
        assert!(document["started_at"].is_string());
        assert_eq!(document["processes"]["a"]["output"], "X");
        assert_eq!(document["history"][0]["action"], "executed");
        // statuses are runtime state, not part of the export contract
        assert!(document.get("process_status").is_none());
    }

    #[test]
    fn never_started_run_exports_null_started_at() {
        let dir = tempfile::tempdir().unwrap();
        let state = WorkflowState::new(["a"]);

        let path = export_state(&state, dir.path()).unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert!(document["started_at"].is_null());
        assert!(document["processes"].as_object().unwrap().is_empty());
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exports").join("runs");

        let path = export_state(&WorkflowState::new(["a"]), &nested).unwrap();
        assert!(path.exists());
    }
}
