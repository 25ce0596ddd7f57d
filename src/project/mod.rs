//! Project link files.
//!
//! A `.ticktick` file binds a directory (and its descendants) to a remote
//! project. Writes always target exactly one directory; reads search upward
//! so nested working directories inherit the nearest ancestor's link.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LINK_FILE_NAME: &str = ".ticktick";
const LINK_VERSION: &str = "1.0";

#[derive(Error, Diagnostic, Debug)]
pub enum LinkError {
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(ticktick::project::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(ticktick::project::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed .ticktick file: {message}")]
    #[diagnostic(code(ticktick::project::parse))]
    Parse { message: String },

    #[error(".ticktick file: {field} is required")]
    #[diagnostic(
        code(ticktick::project::missing_field),
        help("Re-create the link with 'ticktick init' or 'ticktick switch'.")
    )]
    MissingField { field: &'static str },
}

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLink {
    pub version: String,
    pub project_id: String,
    pub project_name: String,
    pub folder_path: String,
    pub created_at: String,
    pub synced_at: String,
}

impl ProjectLink {
    pub fn new(project_id: &str, project_name: &str, folder_path: &Path) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            version: LINK_VERSION.to_string(),
            project_id: project_id.to_string(),
            project_name: project_name.to_string(),
            folder_path: folder_path.display().to_string(),
            created_at: now.clone(),
            synced_at: now,
        }
    }

    /// Load and validate a link file.
    pub fn load(path: &Path) -> LinkResult<Self> {
        let data = fs::read_to_string(path).map_err(|source| LinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let link: Self = serde_json::from_str(&data).map_err(|e| LinkError::Parse {
            message: e.to_string(),
        })?;
        link.validate()?;
        Ok(link)
    }

    /// Write the link into a single directory, world-readable.
    pub fn save(&self, directory: &Path) -> LinkResult<PathBuf> {
        let path = directory.join(LINK_FILE_NAME);
        let write_err = |source| LinkError::Write {
            path: path.clone(),
            source,
        };
        let data = serde_json::to_string_pretty(self).map_err(|e| LinkError::Parse {
            message: e.to_string(),
        })?;
        fs::write(&path, data).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).map_err(write_err)?;
        }
        Ok(path)
    }

    pub fn validate(&self) -> LinkResult<()> {
        if self.version.is_empty() {
            return Err(LinkError::MissingField { field: "version" });
        }
        if self.project_id.is_empty() {
            return Err(LinkError::MissingField { field: "projectId" });
        }
        if self.project_name.is_empty() {
            return Err(LinkError::MissingField {
                field: "projectName",
            });
        }
        if self.folder_path.is_empty() {
            return Err(LinkError::MissingField { field: "folderPath" });
        }
        Ok(())
    }
}

/// Refresh a link's `syncedAt` timestamp in place; every other field is
/// immutable after creation.
pub fn touch_synced(path: &Path) -> LinkResult<()> {
    let mut link = ProjectLink::load(path)?;
    link.synced_at = Utc::now().to_rfc3339();
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    link.save(directory)?;
    Ok(())
}

/// Walk from `start` up to the filesystem root, returning the nearest
/// directory's link file. The walk ends when a directory has no parent.
pub fn find_link_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(LINK_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

pub fn has_link_file(directory: &Path) -> bool {
    directory.join(LINK_FILE_NAME).is_file()
}

/// A loaded link together with the file it came from.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub link: ProjectLink,
    pub path: PathBuf,
}

/// The project governing `start`, if any ancestor carries a link file.
pub fn context_from(start: &Path) -> LinkResult<Option<ProjectContext>> {
    match find_link_file(start) {
        Some(path) => {
            let link = ProjectLink::load(&path)?;
            Ok(Some(ProjectContext { link, path }))
        }
        None => Ok(None),
    }
}

/// The project governing the current working directory.
pub fn current_context() -> LinkResult<Option<ProjectContext>> {
    match std::env::current_dir() {
        Ok(cwd) => context_from(&cwd),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[path = "link_test.rs"]
mod link_test;
