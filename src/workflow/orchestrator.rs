//! Workflow orchestrator
//!
//! Holds an ordered list of process definitions and executes them one at a
//! time: each execution formats a prompt from the accumulated outputs of
//! earlier processes plus the caller's inputs, and forwards it to that
//! process's model backend. Statuses move through the explicit state machine
//! in [`ProcessStatus`]; illegal transitions are rejected rather than
//! silently applied.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;

use crate::llm::Backend;
use crate::workflow::types::{
    ExecutionResult, HistoryAction, HistoryEntry, ProcessDefinition, ProcessStatus, StatusSummary,
    WorkflowState,
};

/// Delimiter between context sections from different processes
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Error types for orchestrator operations
///
/// These are caller mistakes (unknown ids, illegal transitions, bad
/// pipeline construction). A failed model call is not an error here; it is
/// an [`ExecutionResult::Failure`].
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    #[error("Process '{id}' is {status} and cannot be executed")]
    NotExecutable { id: String, status: ProcessStatus },

    #[error("Process '{id}' is {status}, not waiting for approval")]
    NotAwaitingApproval { id: String, status: ProcessStatus },

    #[error("Pipeline has no processes")]
    EmptyPipeline,

    #[error("Duplicate process id: {0}")]
    DuplicateProcess(String),

    #[error("No backend configured for process '{0}'")]
    MissingBackend(String),
}

/// Manages workflow execution across an ordered sequence of processes
///
/// An explicit value passed to whoever drives the run; there is no global
/// instance. Execution is synchronous and single-threaded: one process at a
/// time, each call blocking on its model invocation.
pub struct WorkflowOrchestrator {
    processes: HashMap<String, ProcessDefinition>,
    process_order: Vec<String>,
    backends: HashMap<String, Arc<dyn Backend>>,
    state: WorkflowState,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator from an ordered process list and the backends
    /// built for it, one per process id. Every process starts `pending`.
    pub fn new(
        definitions: Vec<ProcessDefinition>,
        backends: HashMap<String, Arc<dyn Backend>>,
    ) -> Result<Self, OrchestratorError> {
        if definitions.is_empty() {
            return Err(OrchestratorError::EmptyPipeline);
        }

        let mut processes = HashMap::new();
        let mut process_order = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if !backends.contains_key(&definition.id) {
                return Err(OrchestratorError::MissingBackend(definition.id));
            }
            process_order.push(definition.id.clone());
            if processes
                .insert(definition.id.clone(), definition)
                .is_some()
            {
                let id = process_order.pop().unwrap_or_default();
                return Err(OrchestratorError::DuplicateProcess(id));
            }
        }

        let state = WorkflowState::new(process_order.iter().map(String::as_str));

        Ok(Self {
            processes,
            process_order,
            backends,
            state,
        })
    }

    /// Process ids in declared order
    pub fn process_order(&self) -> &[String] {
        &self.process_order
    }

    /// Look up a process definition by id
    pub fn definition(&self, process_id: &str) -> Option<&ProcessDefinition> {
        self.processes.get(process_id)
    }

    /// Read-only view of the run state
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Current status of a process
    pub fn status(&self, process_id: &str) -> Option<ProcessStatus> {
        self.state.process_status.get(process_id).copied()
    }

    /// Execute a single process
    ///
    /// Marks the process `running`, builds its prompt from prior outputs and
    /// the given inputs, and invokes its backend. On success the status
    /// becomes `waiting_approval` (when the definition requires approval) or
    /// `completed` and the result is stored. On a model failure the status
    /// becomes `failed` and a failure payload is returned — never raised,
    /// never retried.
    pub async fn execute(
        &mut self,
        process_id: &str,
        inputs: BTreeMap<String, String>,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let definition = self
            .processes
            .get(process_id)
            .ok_or_else(|| OrchestratorError::UnknownProcess(process_id.to_string()))?
            .clone();

        let current = self
            .status(process_id)
            .ok_or_else(|| OrchestratorError::UnknownProcess(process_id.to_string()))?;
        if !current.may_execute() {
            return Err(OrchestratorError::NotExecutable {
                id: process_id.to_string(),
                status: current,
            });
        }

        let backend = self
            .backends
            .get(process_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::MissingBackend(process_id.to_string()))?;

        if self.state.started_at.is_none() {
            self.state.started_at = Some(Utc::now());
        }
        self.set_status(process_id, ProcessStatus::Running);

        let context = self.build_context(process_id)?;
        let prompt = format_prompt(&definition, &inputs, &context);

        tracing::info!(process = %process_id, model = %definition.model, "executing process");

        match backend.generate(&prompt).await {
            Ok(generation) => {
                let result = ExecutionResult::Success {
                    output: generation.text,
                    process_id: process_id.to_string(),
                    timestamp: Utc::now(),
                    inputs,
                };

                self.state
                    .process_outputs
                    .insert(process_id.to_string(), result.clone());

                let next_status = if definition.requires_approval {
                    ProcessStatus::WaitingApproval
                } else {
                    ProcessStatus::Completed
                };
                self.set_status(process_id, next_status);
                self.log_history(process_id, HistoryAction::Executed);

                tracing::info!(process = %process_id, status = %next_status, "process executed");
                Ok(result)
            }
            Err(e) => {
                self.set_status(process_id, ProcessStatus::Failed);
                tracing::warn!(process = %process_id, error = %e, "process failed");

                Ok(ExecutionResult::Failure {
                    error: e.to_string(),
                    process_id: process_id.to_string(),
                    timestamp: Utc::now(),
                })
            }
        }
    }

    /// Approve or reject a process waiting for approval
    ///
    /// The process id is explicit: only the named process is affected, and
    /// only while it is actually `waiting_approval`.
    pub fn approve(
        &mut self,
        process_id: &str,
        approved: bool,
    ) -> Result<String, OrchestratorError> {
        let name = self
            .processes
            .get(process_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| OrchestratorError::UnknownProcess(process_id.to_string()))?;

        let current = self
            .status(process_id)
            .ok_or_else(|| OrchestratorError::UnknownProcess(process_id.to_string()))?;
        if current != ProcessStatus::WaitingApproval {
            return Err(OrchestratorError::NotAwaitingApproval {
                id: process_id.to_string(),
                status: current,
            });
        }

        let message = if approved {
            self.set_status(process_id, ProcessStatus::Completed);
            self.log_history(process_id, HistoryAction::Approved);
            format!("Process '{}' approved", name)
        } else {
            self.set_status(process_id, ProcessStatus::Failed);
            self.log_history(process_id, HistoryAction::Rejected);
            format!("Process '{}' rejected", name)
        };

        tracing::info!(process = %process_id, approved, "approval recorded");
        Ok(message)
    }

    /// First process in declared order whose status is still `pending`
    ///
    /// Earlier failures do not block later processes.
    pub fn next_pending(&self) -> Option<&str> {
        self.process_order
            .iter()
            .find(|id| self.status(id) == Some(ProcessStatus::Pending))
            .map(String::as_str)
    }

    /// Tally of processes per status
    pub fn status_summary(&self) -> StatusSummary {
        StatusSummary::from_state(&self.state)
    }

    /// Build the grounding context for a process: the stored outputs of all
    /// earlier processes, in declared order, each labeled with its display
    /// name. Processes with no recorded output are skipped.
    pub fn build_context(&self, process_id: &str) -> Result<String, OrchestratorError> {
        let position = self
            .process_order
            .iter()
            .position(|id| id == process_id)
            .ok_or_else(|| OrchestratorError::UnknownProcess(process_id.to_string()))?;

        let mut context_parts = Vec::new();
        for id in &self.process_order[..position] {
            if let Some(output) = self.last_output(id) {
                let name = self.processes.get(id).map(|p| p.name.as_str()).unwrap_or(id);
                context_parts.push(format!("[{}]\n{}", name, output));
            }
        }

        Ok(context_parts.join(CONTEXT_DELIMITER))
    }

    /// Last recorded output text for a process, if any
    pub fn last_output(&self, process_id: &str) -> Option<&str> {
        self.state
            .process_outputs
            .get(process_id)
            .and_then(|result| result.output())
    }

    fn set_status(&mut self, process_id: &str, status: ProcessStatus) {
        self.state
            .process_status
            .insert(process_id.to_string(), status);
    }

    fn log_history(&mut self, process_id: &str, action: HistoryAction) {
        self.state.history.push(HistoryEntry {
            process: process_id.to_string(),
            action,
            timestamp: Utc::now(),
        });
    }
}

/// Format the prompt for one execution: context block (when any), the task
/// description, then the enumerated inputs.
fn format_prompt(
    definition: &ProcessDefinition,
    inputs: &BTreeMap<String, String>,
    context: &str,
) -> String {
    let mut prompt_parts = Vec::new();

    if !context.is_empty() {
        prompt_parts.push(format!("CONTEXT FROM PREVIOUS PROCESSES:\n{}\n", context));
    }

    prompt_parts.push(format!("CURRENT TASK: {}\n", definition.description));
    prompt_parts.push("INPUTS:".to_string());
    for (key, value) in inputs {
        prompt_parts.push(format!("- {}: {}", key, value));
    }

    prompt_parts.join("\n")
}
