//! Type definitions for the workflow system
//!
//! Defines process definitions, the process status state machine, execution
//! results, and the run state owned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for a single workflow process
///
/// Immutable once constructed; a pipeline is a fixed total order of these,
/// defined statically or loaded from a YAML pipeline file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDefinition {
    /// Stable identifier, unique within a pipeline
    pub id: String,

    /// Display name used when labeling context sections
    pub name: String,

    /// Free-text task description, included in every prompt
    pub description: String,

    /// Declared input names
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Declared output names
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Model identifier, e.g. "gemini-2.0-flash-exp"
    #[serde(default = "default_model")]
    pub model: String,

    /// System instruction for the model
    #[serde(default)]
    pub system_prompt: String,

    /// Whether a human must approve the output before it counts as completed
    #[serde(default)]
    pub requires_approval: bool,

    /// Whether the run loop may feed this process automatically
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

impl ProcessDefinition {
    /// Create a definition with default model and flags
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            model: default_model(),
            system_prompt: String::new(),
            requires_approval: false,
            auto_advance: true,
        }
    }

    pub fn with_io(mut self, inputs: &[&str], outputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self.outputs = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn require_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

/// Status of a single process
///
/// Legal transitions: `Pending -> Running`,
/// `Running -> Completed | Failed | WaitingApproval`,
/// `WaitingApproval -> Completed | Failed` (via explicit approval), and
/// re-execution `Completed | Failed -> Running`. Anything else is rejected
/// by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Pending,
    Running,
    Completed,
    Failed,
    WaitingApproval,
}

impl ProcessStatus {
    /// All status values, in display order
    pub const ALL: [ProcessStatus; 5] = [
        ProcessStatus::Pending,
        ProcessStatus::Running,
        ProcessStatus::Completed,
        ProcessStatus::Failed,
        ProcessStatus::WaitingApproval,
    ];

    /// Whether a process in this status may start (or restart) executing
    pub fn may_execute(self) -> bool {
        matches!(
            self,
            ProcessStatus::Pending | ProcessStatus::Completed | ProcessStatus::Failed
        )
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessStatus::Pending => write!(f, "pending"),
            ProcessStatus::Running => write!(f, "running"),
            ProcessStatus::Completed => write!(f, "completed"),
            ProcessStatus::Failed => write!(f, "failed"),
            ProcessStatus::WaitingApproval => write!(f, "waiting_approval"),
        }
    }
}

/// Outcome of one process execution
///
/// A tagged value rather than an exception: the model invocation boundary
/// returns this, and the run never raises on a failed generation. Success
/// serializes with an `output` field, failure with an `error` field and no
/// `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    Success {
        output: String,
        process_id: String,
        timestamp: DateTime<Utc>,
        inputs: BTreeMap<String, String>,
    },
    Failure {
        error: String,
        process_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionResult {
    #[allow(dead_code)]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Generated text, if this was a success
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { output, .. } => Some(output),
            ExecutionResult::Failure { .. } => None,
        }
    }

    /// Error message, if this was a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failure { error, .. } => Some(error),
        }
    }

    #[allow(dead_code)]
    pub fn process_id(&self) -> &str {
        match self {
            ExecutionResult::Success { process_id, .. } => process_id,
            ExecutionResult::Failure { process_id, .. } => process_id,
        }
    }
}

/// Action recorded in the workflow history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Executed,
    Approved,
    Rejected,
}

/// One append-only history record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub process: String,
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
}

/// State of a workflow run
///
/// Owned exclusively by the orchestrator and mutated only through its
/// methods. Never persisted automatically; only the explicit export writes
/// it out.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    /// Timestamp-derived run identifier
    pub workflow_id: String,

    /// Set when the first process executes
    pub started_at: Option<DateTime<Utc>>,

    /// Latest successful result per process id
    pub process_outputs: BTreeMap<String, ExecutionResult>,

    /// Current status per process id
    pub process_status: BTreeMap<String, ProcessStatus>,

    /// Append-only log of executed actions
    pub history: Vec<HistoryEntry>,
}

impl WorkflowState {
    /// Create a fresh run state with every process pending
    pub fn new<'a>(process_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            workflow_id: format!("wf_{}", Utc::now().timestamp()),
            started_at: None,
            process_outputs: BTreeMap::new(),
            process_status: process_ids
                .into_iter()
                .map(|id| (id.to_string(), ProcessStatus::Pending))
                .collect(),
            history: Vec::new(),
        }
    }
}

/// Per-status tally of a workflow run
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub workflow_id: String,
    pub total: usize,
    counts: BTreeMap<ProcessStatus, usize>,
}

impl StatusSummary {
    pub fn from_state(state: &WorkflowState) -> Self {
        let mut counts = BTreeMap::new();
        for status in ProcessStatus::ALL {
            counts.insert(status, 0);
        }
        for status in state.process_status.values() {
            *counts.entry(*status).or_insert(0) += 1;
        }

        Self {
            workflow_id: state.workflow_id.clone(),
            total: state.process_status.len(),
            counts,
        }
    }

    pub fn count(&self, status: ProcessStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Workflow ID: {}", self.workflow_id)?;
        writeln!(f, "Total processes: {}", self.total)?;
        writeln!(f, "Completed: {}", self.count(ProcessStatus::Completed))?;
        writeln!(f, "Running: {}", self.count(ProcessStatus::Running))?;
        writeln!(f, "Pending: {}", self.count(ProcessStatus::Pending))?;
        writeln!(f, "Failed: {}", self.count(ProcessStatus::Failed))?;
        write!(
            f,
            "Waiting approval: {}",
            self.count(ProcessStatus::WaitingApproval)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_deserializes_with_defaults() {
        let yaml = r#"
id: analyzer
name: Analyzer
description: Analyze the input
inputs: [requirements]
outputs: [specifications]
"#;
        let definition: ProcessDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(definition.id, "analyzer");
        assert_eq!(definition.model, "gemini-2.0-flash-exp");
        assert!(!definition.requires_approval);
        assert!(definition.auto_advance);
        assert!(definition.system_prompt.is_empty());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ProcessStatus::WaitingApproval).unwrap();
        assert_eq!(json, "\"waiting_approval\"");
        assert_eq!(ProcessStatus::WaitingApproval.to_string(), "waiting_approval");
    }

    #[test]
    fn success_result_serializes_with_output_field() {
        let result = ExecutionResult::Success {
            output: "generated".to_string(),
            process_id: "p1".to_string(),
            timestamp: Utc::now(),
            inputs: BTreeMap::from([("requirements".to_string(), "a cli tool".to_string())]),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["output"], "generated");
        assert_eq!(json["process_id"], "p1");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_result_serializes_with_error_and_no_output() {
        let result = ExecutionResult::Failure {
            error: "API error: quota exceeded".to_string(),
            process_id: "p1".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "API error: quota exceeded");
        assert!(json.get("output").is_none());
    }

    #[test]
    fn fresh_state_marks_every_process_pending() {
        let state = WorkflowState::new(["a", "b", "c"]);
        assert_eq!(state.process_status.len(), 3);
        assert!(state
            .process_status
            .values()
            .all(|s| *s == ProcessStatus::Pending));
        assert!(state.workflow_id.starts_with("wf_"));
        assert!(state.started_at.is_none());
    }

    #[test]
    fn summary_counts_statuses() {
        let mut state = WorkflowState::new(["a", "b", "c"]);
        state
            .process_status
            .insert("a".to_string(), ProcessStatus::Completed);
        state
            .process_status
            .insert("b".to_string(), ProcessStatus::Failed);

        let summary = StatusSummary::from_state(&state);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(ProcessStatus::Completed), 1);
        assert_eq!(summary.count(ProcessStatus::Failed), 1);
        assert_eq!(summary.count(ProcessStatus::Pending), 1);
        assert_eq!(summary.count(ProcessStatus::Running), 0);
    }
}
