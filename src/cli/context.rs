//! Project context resolution.
//!
//! Commands act on exactly one project. Resolution order, first match wins:
//! explicit flag, nearest ancestor `.ticktick` link file, configured default
//! project. With none of the three present the command fails.

use std::path::Path;

use crate::cli::error::{CliError, CliResult};
use crate::config::Config;
use crate::project;

/// A resolved project target. The name is only known when it came from a
/// link file; callers needing one for display fetch it themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProject {
    pub id: String,
    pub name: Option<String>,
}

/// Resolve starting the link-file search from the given directory.
pub fn resolve_project_from(
    start: &Path,
    explicit: Option<&str>,
    config: &Config,
) -> CliResult<ResolvedProject> {
    if let Some(id) = explicit.filter(|id| !id.is_empty()) {
        return Ok(ResolvedProject {
            id: id.to_string(),
            name: None,
        });
    }

    if let Some(ctx) = project::context_from(start)? {
        return Ok(ResolvedProject {
            id: ctx.link.project_id,
            name: Some(ctx.link.project_name),
        });
    }

    if let Some(id) = config
        .preferences
        .default_project
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        return Ok(ResolvedProject {
            id: id.to_string(),
            name: None,
        });
    }

    Err(CliError::NoProject)
}
