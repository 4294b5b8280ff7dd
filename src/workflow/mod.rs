//! Workflow system for orchestrating sequences of model-backed processes
//!
//! A pipeline is a fixed total order of process definitions. The
//! orchestrator executes them one at a time, feeding each one the
//! accumulated outputs of its predecessors, with manual approval gates and
//! an explicit JSON export of the run.

pub mod builtin;
pub mod cli;
pub mod export;
pub mod loader;
pub mod orchestrator;
pub mod types;
