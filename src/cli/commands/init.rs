//! Link management: init a directory against a project, or switch it.

use std::path::Path;

use crate::api::ApiClient;
use crate::cli::error::{CliError, CliResult};
use crate::project::{self, ProjectLink};
use crate::types::CreateProjectRequest;

/// Bind the given directory to a remote project by writing a `.ticktick`
/// file into it. Exactly one of `project_id`/`create` selects the project.
pub async fn init(
    client: &ApiClient,
    dir: &Path,
    project_id: Option<&str>,
    create: Option<&str>,
) -> CliResult<String> {
    if project::has_link_file(dir) {
        return Err(CliError::LinkExists);
    }

    let selected = match (project_id, create) {
        (_, Some(name)) => {
            client
                .create_project(&CreateProjectRequest {
                    name: name.to_string(),
                    color: None,
                    view_mode: None,
                })
                .await?
        }
        (Some(id), None) => client.get_project(id).await?,
        (None, None) => {
            return Err(CliError::validation(
                "pass --project-id to link an existing project or --create to make a new one",
            ));
        }
    };

    let link = ProjectLink::new(&selected.id, &selected.name, dir);
    link.save(dir)?;

    Ok(format!(
        "✓ Project initialized successfully!\n\nProject: {} (ID: {})\nDirectory: {}\n\n\
         You can now use project-aware commands like:\n  ticktick add \"My task\"\n  ticktick list",
        selected.name,
        selected.id,
        dir.display(),
    ))
}

/// Repoint an already-linked directory at a different project.
pub async fn switch(client: &ApiClient, dir: &Path, project_id: &str) -> CliResult<String> {
    if !project::has_link_file(dir) {
        return Err(CliError::LinkMissing);
    }

    let current = project::context_from(dir)?;
    let selected = client.get_project(project_id).await?;

    let link = ProjectLink::new(&selected.id, &selected.name, dir);
    link.save(dir)?;

    let mut out = String::from("✓ Successfully switched project!\n");
    if let Some(ctx) = current {
        out.push_str(&format!("\nPrevious project: {}", ctx.link.project_name));
    }
    out.push_str(&format!(
        "\nNew project: {} (ID: {})\nDirectory: {}",
        selected.name,
        selected.id,
        dir.display(),
    ));
    Ok(out)
}
