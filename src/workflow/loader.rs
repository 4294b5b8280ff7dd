//! Loader for pipeline definitions
//!
//! Handles loading pipeline files from the `.maestro/pipelines` directory,
//! in the current directory first and then in the user's home directory.

use std::fs;
use std::path::{Path, PathBuf};

use dirs::home_dir;
use serde::Deserialize;

use crate::workflow::types::ProcessDefinition;

/// Error types for pipeline loading
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline not found: {0} (searched local and home .maestro/pipelines/ directories)")]
    NotFound(String),

    #[error("Invalid pipeline: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A complete pipeline definition
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    /// Name of the pipeline
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Processes to execute, in order
    pub processes: Vec<ProcessDefinition>,
}

impl Pipeline {
    /// Validate structural invariants: at least one process, unique ids.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.processes.is_empty() {
            return Err(PipelineError::Invalid(format!(
                "pipeline '{}' defines no processes",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for process in &self.processes {
            if !seen.insert(process.id.as_str()) {
                return Err(PipelineError::Invalid(format!(
                    "duplicate process id '{}' in pipeline '{}'",
                    process.id, self.name
                )));
            }
        }

        Ok(())
    }
}

/// Parse and validate a pipeline from YAML text
pub fn parse_pipeline(content: &str) -> Result<Pipeline, PipelineError> {
    let pipeline: Pipeline = serde_yaml::from_str(content)?;
    pipeline.validate()?;
    Ok(pipeline)
}

/// Load a pipeline by name
///
/// Looks for a pipeline file in the `.maestro/pipelines` directories with
/// the given name (with or without extension).
pub fn load_pipeline(name: &str) -> Result<Pipeline, PipelineError> {
    let path = find_pipeline_file(name, &search_dirs())?;
    let content = fs::read_to_string(&path)?;
    tracing::debug!(path = %path.display(), "loading pipeline");
    parse_pipeline(&content)
}

/// List all available pipeline names (without extensions), sorted and
/// deduplicated across the search directories.
pub fn list_pipelines() -> Result<Vec<String>, PipelineError> {
    list_in_dirs(&search_dirs())
}

fn get_local_pipelines_path() -> PathBuf {
    PathBuf::from(".maestro").join("pipelines")
}

fn get_home_pipelines_path() -> Option<PathBuf> {
    home_dir().map(|path| path.join(".maestro").join("pipelines"))
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![get_local_pipelines_path()];
    if let Some(home) = get_home_pipelines_path() {
        dirs.push(home);
    }
    dirs
}

/// Find a pipeline file by name in the given directories
fn find_pipeline_file(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, PipelineError> {
    // Normalize to a .yaml name and also try the .yml spelling
    let normalized_name = if name.ends_with(".yaml") || name.ends_with(".yml") {
        name.to_string()
    } else {
        format!("{}.yaml", name)
    };

    let alt_name = if normalized_name.ends_with(".yaml") {
        normalized_name.replace(".yaml", ".yml")
    } else {
        normalized_name.replace(".yml", ".yaml")
    };

    for dir in dirs {
        for candidate in [&normalized_name, &alt_name] {
            let path = dir.join(candidate);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(PipelineError::NotFound(name.to_string()))
}

fn list_in_dirs(dirs: &[PathBuf]) -> Result<Vec<String>, PipelineError> {
    let mut pipelines = Vec::new();

    for dir in dirs {
        if dir.exists() {
            add_pipelines_from_dir(dir, &mut pipelines)?;
        }
    }

    pipelines.sort();
    pipelines.dedup();
    Ok(pipelines)
}

fn add_pipelines_from_dir(dir: &Path, pipelines: &mut Vec<String>) -> Result<(), PipelineError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                    pipelines.push(name.to_string());
                }
            }
        }
    }

    Ok(())
}
