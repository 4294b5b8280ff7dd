//! CLI integration for the workflow system
//!
//! Drives a whole run from the command line: execute the first process with
//! the user's input, auto-advance through the rest, prompt on approval
//! gates, and optionally export the run as JSON.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};

use crate::config::Config;
use crate::llm::build_backends;
use crate::workflow::builtin;
use crate::workflow::export::export_state;
use crate::workflow::loader::{list_pipelines, load_pipeline, Pipeline};
use crate::workflow::orchestrator::WorkflowOrchestrator;
use crate::workflow::types::ProcessStatus;

/// Resolve a pipeline by name: the built-in one when no name (or its name)
/// is given, otherwise a pipeline file from `.maestro/pipelines`.
pub fn resolve_pipeline(name: Option<&str>) -> anyhow::Result<Pipeline> {
    match name {
        None => Ok(builtin::code_generation()),
        Some(n) if n == builtin::CODE_GENERATION => Ok(builtin::code_generation()),
        Some(n) => Ok(load_pipeline(n)?),
    }
}

/// Handle the `run` command
pub async fn handle_run_command(
    config: &Config,
    pipeline_name: Option<&str>,
    initial_input: &str,
) -> anyhow::Result<()> {
    let pipeline = resolve_pipeline(pipeline_name)?;
    let mut processes = pipeline.processes;

    // A --model override replaces every process's model
    if let Some(model) = &config.model_override {
        for process in &mut processes {
            process.model = model.clone();
        }
    }

    let first = processes
        .first()
        .cloned()
        .context("pipeline has no processes")?;

    let backends = build_backends(&processes)?;
    let mut orchestrator = WorkflowOrchestrator::new(processes, backends)?;

    println!(
        "Starting workflow: {} - {}",
        pipeline.name,
        pipeline.description.as_deref().unwrap_or("")
    );

    // The first process receives the user's input under its first declared
    // input name.
    let input_name = first
        .inputs
        .first()
        .map(String::as_str)
        .unwrap_or("input")
        .to_string();
    let mut inputs = BTreeMap::new();
    inputs.insert(input_name, initial_input.to_string());
    run_process(&mut orchestrator, &first.id, inputs, config).await?;

    // Auto-advance: each later process is fed the output of its predecessor
    // in declared order. A failed predecessor feeds an empty input; it does
    // not halt the run.
    while let Some(next) = orchestrator.next_pending().map(str::to_string) {
        let auto_advance = orchestrator
            .definition(&next)
            .map(|d| d.auto_advance)
            .unwrap_or(false);
        if !auto_advance {
            println!(
                "Process '{}' does not auto-advance; stopping here.",
                next
            );
            break;
        }

        let mut inputs = BTreeMap::new();
        inputs.insert("input".to_string(), predecessor_output(&orchestrator, &next));
        run_process(&mut orchestrator, &next, inputs, config).await?;
    }

    println!();
    println!("{}", orchestrator.status_summary());

    if let Some(dir) = &config.export_dir {
        let path = export_state(orchestrator.state(), dir)?;
        println!("Exported run to {}", path.display());
    }

    Ok(())
}

/// Handle the `list` command
pub fn handle_list_command() -> anyhow::Result<()> {
    println!("Available pipelines:");
    println!("  - {} (built-in)", builtin::CODE_GENERATION);

    for name in list_pipelines()? {
        println!("  - {}", name);
    }

    println!("\nRun with: maestro run <pipeline> --input \"...\"");
    Ok(())
}

/// Handle the `show` command
pub fn handle_show_command(pipeline_name: Option<&str>) -> anyhow::Result<()> {
    let pipeline = resolve_pipeline(pipeline_name)?;

    println!(
        "{} - {}",
        pipeline.name,
        pipeline.description.as_deref().unwrap_or("")
    );
    for (index, process) in pipeline.processes.iter().enumerate() {
        println!(
            "{}. {} ({}){}",
            index + 1,
            process.name,
            process.id,
            if process.requires_approval {
                " [approval gate]"
            } else {
                ""
            }
        );
        println!("   model: {}", process.model);
        println!("   {}", process.description);
    }

    Ok(())
}

/// Execute one process, print its result, and walk it through an approval
/// gate when it lands in `waiting_approval`.
async fn run_process(
    orchestrator: &mut WorkflowOrchestrator,
    process_id: &str,
    inputs: BTreeMap<String, String>,
    config: &Config,
) -> anyhow::Result<()> {
    let (position, total) = step_position(orchestrator, process_id)?;
    let description = orchestrator
        .definition(process_id)
        .map(|d| d.description.clone())
        .unwrap_or_default();
    println!("Step {}/{}: {} - {}", position, total, process_id, description);

    let result = orchestrator.execute(process_id, inputs).await?;
    match result.output() {
        Some(output) => println!("{}\n", output),
        None => println!("Error: {}\n", result.error().unwrap_or("unknown")),
    }

    if orchestrator.status(process_id) == Some(ProcessStatus::WaitingApproval) {
        let approved = if config.auto_approve {
            println!("Auto-approving '{}' (--yes)", process_id);
            true
        } else {
            prompt_approval(process_id)?
        };

        let message = orchestrator.approve(process_id, approved)?;
        println!("{}", message);
    }

    Ok(())
}

fn step_position(
    orchestrator: &WorkflowOrchestrator,
    process_id: &str,
) -> anyhow::Result<(usize, usize)> {
    let order = orchestrator.process_order();
    match order.iter().position(|id| id == process_id) {
        Some(index) => Ok((index + 1, order.len())),
        None => bail!("unknown process '{}'", process_id),
    }
}

/// Ask on stdin whether the output is acceptable. Defaults to rejection.
fn prompt_approval(process_id: &str) -> anyhow::Result<bool> {
    print!("Approve output of '{}'? [y/N] ", process_id);
    io::stdout().flush()?;

    let mut buffer = String::new();
    io::stdin().lock().read_line(&mut buffer)?;

    Ok(matches!(buffer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Output text of the declared-order predecessor of `process_id`, or empty
/// when there is none (or it never produced output).
fn predecessor_output(orchestrator: &WorkflowOrchestrator, process_id: &str) -> String {
    let order = orchestrator.process_order();
    let Some(position) = order.iter().position(|id| id == process_id) else {
        return String::new();
    };
    if position == 0 {
        return String::new();
    }

    orchestrator
        .last_output(&order[position - 1])
        .unwrap_or_default()
        .to_string()
}
