//! Configuration for a workflow run
//!
//! Built from the command line; passed explicitly to the handlers rather
//! than held in any global.

use std::path::PathBuf;

/// Run configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Replace every process's model with this one
    pub model_override: Option<String>,

    /// Approve every approval gate without prompting
    pub auto_approve: bool,

    /// Where to write the JSON export, if requested
    pub export_dir: Option<PathBuf>,
}

