//! Project commands.

use tabled::{Table, Tabled};

use crate::api::ApiClient;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::apply_table_style;
use crate::types::Project;

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Sort Order")]
    sort_order: i64,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.chars().take(12).collect(),
            name: project.name.clone(),
            status: if project.closed {
                "Closed".to_string()
            } else {
                "Active".to_string()
            },
            sort_order: project.sort_order,
        }
    }
}

/// List every project, closed ones included; they stay addressable by ID.
pub async fn list(client: &ApiClient, format: &str) -> CliResult<String> {
    let projects = client.get_projects().await?;

    if projects.is_empty() {
        return Ok("No projects found.".to_string());
    }

    match format {
        "json" => Ok(serde_json::to_string_pretty(&projects)
            .map_err(|e| CliError::validation(e.to_string()))?),
        _ => {
            let rows: Vec<ProjectRow> = projects.iter().map(ProjectRow::from).collect();
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(format!("Your Projects ({} total)\n\n{}", projects.len(), table))
        }
    }
}
