//! Task commands: add, list, search, show, update, complete, delete.

use std::collections::HashMap;
use std::path::Path;

use tabled::{Table, Tabled};

use crate::api::ApiClient;
use crate::cli::context::resolve_project_from;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{apply_table_style, format_tags, parse_tags, truncate_with_ellipsis};
use crate::config::Config;
use crate::types::{
    CreateTaskRequest, STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_OPEN, Task, UpdateTaskRequest,
    priority_label, validate_due_date, validate_priority,
};

#[derive(Debug, Default)]
pub struct AddOptions {
    pub content: Option<String>,
    pub due: Option<String>,
    pub priority: Option<i32>,
    pub tags: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Default)]
pub struct ListOptions {
    pub all: bool,
    pub project: Option<String>,
    pub priority: Option<i32>,
    pub format: String,
}

#[derive(Debug, Default)]
pub struct SearchOptions {
    pub tags: Option<String>,
    pub priority: Option<i32>,
    pub all_projects: bool,
    pub format: String,
}

#[derive(Debug, Default)]
pub struct UpdateOptions {
    pub title: Option<String>,
    pub content: Option<String>,
    pub due: Option<String>,
    pub priority: Option<i32>,
    pub tags: Option<String>,
    pub clear_content: bool,
    pub clear_due: bool,
    pub clear_tags: bool,
    pub project: Option<String>,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Due Date")]
    due: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.short_id().to_string(),
            title: truncate_with_ellipsis(&task.title, 50),
            priority: if task.priority == 0 {
                "-".to_string()
            } else {
                task.priority.to_string()
            },
            due: task.due_date.clone().unwrap_or_else(|| "-".to_string()),
            tags: format_tags(task.tags.as_ref()),
        }
    }
}

fn validate_task_fields(priority: Option<i32>, due: Option<&str>) -> CliResult<()> {
    if let Some(p) = priority {
        validate_priority(p).map_err(CliError::validation)?;
    }
    if let Some(d) = due {
        validate_due_date(d).map_err(CliError::validation)?;
    }
    Ok(())
}

/// Create a task in the resolved project.
pub async fn add(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    title: &str,
    opts: AddOptions,
) -> CliResult<String> {
    validate_task_fields(opts.priority, opts.due.as_deref())?;

    let resolved = resolve_project_from(dir, opts.project.as_deref(), config)?;

    let req = CreateTaskRequest {
        title: title.to_string(),
        project_id: resolved.id,
        content: opts.content,
        due_date: opts.due,
        priority: opts.priority,
        tags: parse_tags(opts.tags.as_deref()),
    };
    let task = client.create_task(&req).await?;

    let mut out = String::from("✓ Task created successfully!\n");
    if let Some(name) = resolved.name {
        out.push_str(&format!("\nProject: {name}"));
    }
    out.push_str(&format!("\nTitle: {}\nID: {}", task.title, task.id));
    if let Some(content) = &task.content {
        out.push_str(&format!("\nContent: {content}"));
    }
    if let Some(due) = &task.due_date {
        out.push_str(&format!("\nDue: {due}"));
    }
    if task.priority != 0 {
        out.push_str(&format!("\nPriority: {}", task.priority));
    }
    if let Some(tags) = task.tags.as_ref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("\nTags: {}", tags.join(", ")));
    }
    Ok(out)
}

/// List open tasks from one project, or from every open project with `all`.
pub async fn list(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    opts: ListOptions,
) -> CliResult<String> {
    let (mut tasks, heading) = if opts.all {
        let projects = client.get_projects().await?;
        let mut all = Vec::new();
        // Sequential on purpose; one failing project aborts the aggregate
        // rather than passing off a partial listing as complete.
        for project in projects.iter().filter(|p| !p.closed) {
            all.extend(client.get_tasks(&project.id).await?);
        }
        (all, "All Projects".to_string())
    } else {
        let resolved = resolve_project_from(dir, opts.project.as_deref(), config)?;
        let heading = match resolved.name {
            Some(name) => name,
            None => client.get_project(&resolved.id).await?.name,
        };
        (client.get_tasks(&resolved.id).await?, heading)
    };

    tasks.retain(|t| !t.is_completed());
    if let Some(p) = opts.priority {
        tasks.retain(|t| t.priority == p);
    }

    if tasks.is_empty() {
        return Ok("No tasks found.".to_string());
    }

    match opts.format.as_str() {
        "json" => Ok(serde_json::to_string_pretty(&tasks)
            .map_err(|e| CliError::validation(e.to_string()))?),
        "compact" => {
            let mut out = format!("{} - {} task(s)\n", heading, tasks.len());
            for task in &tasks {
                out.push('\n');
                out.push_str(&compact_line(task, None));
            }
            Ok(out)
        }
        _ => {
            let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(format!(
                "{} - {} task(s)\n\n{}",
                heading,
                tasks.len(),
                table
            ))
        }
    }
}

/// Search open tasks by text, tags, and priority.
pub async fn search(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    query: Option<&str>,
    opts: SearchOptions,
) -> CliResult<String> {
    let mut tasks = Vec::new();
    let mut project_names: HashMap<String, String> = HashMap::new();

    if opts.all_projects {
        let projects = client.get_projects().await?;
        for project in projects.iter().filter(|p| !p.closed) {
            tasks.extend(client.get_tasks(&project.id).await?);
            project_names.insert(project.id.clone(), project.name.clone());
        }
    } else {
        let resolved = resolve_project_from(dir, None, config)?;
        let name = match resolved.name {
            Some(name) => name,
            None => client.get_project(&resolved.id).await?.name,
        };
        tasks = client.get_tasks(&resolved.id).await?;
        project_names.insert(resolved.id, name);
    }

    let tags = parse_tags(opts.tags.as_deref());
    let filtered = filter_tasks(tasks, query, tags.as_deref(), opts.priority);

    if filtered.is_empty() {
        return Ok("No tasks found matching your search criteria.".to_string());
    }

    match opts.format.as_str() {
        "json" => Ok(serde_json::to_string_pretty(&filtered)
            .map_err(|e| CliError::validation(e.to_string()))?),
        "compact" => {
            let mut out = format!("Found {} task(s)\n", filtered.len());
            for task in &filtered {
                let project = opts
                    .all_projects
                    .then(|| project_names.get(&task.project_id))
                    .flatten()
                    .map(String::as_str);
                out.push('\n');
                out.push_str(&compact_line(task, project));
            }
            Ok(out)
        }
        _ => {
            #[derive(Tabled)]
            struct SearchRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Title")]
                title: String,
                #[tabled(rename = "Project")]
                project: String,
                #[tabled(rename = "Priority")]
                priority: String,
                #[tabled(rename = "Tags")]
                tags: String,
            }

            let rows: Vec<SearchRow> = filtered
                .iter()
                .map(|task| SearchRow {
                    id: task.short_id().to_string(),
                    title: truncate_with_ellipsis(&task.title, 50),
                    project: project_names
                        .get(&task.project_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    priority: if task.priority == 0 {
                        "-".to_string()
                    } else {
                        task.priority.to_string()
                    },
                    tags: format_tags(task.tags.as_ref()),
                })
                .collect();
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(format!("Found {} task(s)\n\n{}", filtered.len(), table))
        }
    }
}

/// Shared search predicate: open tasks matching all supplied filters.
pub(crate) fn filter_tasks(
    tasks: Vec<Task>,
    query: Option<&str>,
    tags: Option<&[String]>,
    priority: Option<i32>,
) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|t| !t.is_completed())
        .filter(|t| query.is_none_or(|q| t.matches_text(q)))
        .filter(|t| tags.is_none_or(|tags| t.has_any_tag(tags)))
        .filter(|t| priority.is_none_or(|p| t.priority == p))
        .collect()
}

/// Show one task in full.
pub async fn show(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    task_id: &str,
    project: Option<&str>,
) -> CliResult<String> {
    let resolved = resolve_project_from(dir, project, config)?;
    let task = client
        .find_task_by_id(&resolved.id, task_id)
        .await?
        .ok_or_else(|| CliError::TaskNotFound {
            id: task_id.to_string(),
        })?;

    use tabled::builder::Builder;

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["Title", &task.title]);
    builder.push_record(["ID", &task.id]);
    builder.push_record(["Project ID", &task.project_id]);
    if let Some(content) = &task.content {
        builder.push_record(["Content", content]);
    }
    builder.push_record(["Priority", priority_label(task.priority)]);
    if let Some(due) = &task.due_date {
        builder.push_record(["Due Date", due]);
    }
    if let Some(start) = &task.start_date {
        builder.push_record(["Start Date", start]);
    }
    builder.push_record(["Tags", &format_tags(task.tags.as_ref())]);
    builder.push_record(["Status", status_label(task.status)]);
    builder.push_record(["Created", &task.created_time]);
    builder.push_record(["Modified", &task.modified_time]);
    if let Some(completed) = &task.completed_time {
        builder.push_record(["Completed", completed]);
    }

    let mut table = builder.build();
    apply_table_style(&mut table);
    Ok(table.to_string())
}

/// Update fields on an existing task.
pub async fn update(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    task_id: &str,
    opts: UpdateOptions,
) -> CliResult<String> {
    validate_task_fields(opts.priority, opts.due.as_deref())?;

    let req = UpdateTaskRequest {
        title: opts.title,
        content: if opts.clear_content {
            Some(String::new())
        } else {
            opts.content
        },
        due_date: if opts.clear_due {
            Some(String::new())
        } else {
            opts.due
        },
        priority: opts.priority,
        tags: if opts.clear_tags {
            Some(Vec::new())
        } else {
            parse_tags(opts.tags.as_deref())
        },
    };
    if req.is_empty() {
        return Err(CliError::validation(
            "no updates provided; pass at least one field to change",
        ));
    }

    let resolved = resolve_project_from(dir, opts.project.as_deref(), config)?;
    let task = client
        .find_task_by_id(&resolved.id, task_id)
        .await?
        .ok_or_else(|| CliError::TaskNotFound {
            id: task_id.to_string(),
        })?;

    let updated = client.update_task(&resolved.id, &task.id, &req).await?;
    Ok(format!("✓ Updated task: {} ({})", updated.title, updated.id))
}

/// Mark a task completed.
pub async fn complete(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    task_id: &str,
    project: Option<&str>,
) -> CliResult<String> {
    let resolved = resolve_project_from(dir, project, config)?;
    let task = client
        .find_task_by_id(&resolved.id, task_id)
        .await?
        .ok_or_else(|| CliError::TaskNotFound {
            id: task_id.to_string(),
        })?;

    client.complete_task(&resolved.id, &task.id).await?;
    Ok(format!("✓ Task completed: {} ({})", task.title, task.id))
}

/// Delete a task permanently (requires --force; there is no undo).
pub async fn delete(
    client: &ApiClient,
    config: &Config,
    dir: &Path,
    task_id: &str,
    project: Option<&str>,
    force: bool,
) -> CliResult<String> {
    if !force {
        return Err(CliError::validation(
            "delete requires --force; this action is destructive and cannot be undone",
        ));
    }

    let resolved = resolve_project_from(dir, project, config)?;
    let task = client
        .find_task_by_id(&resolved.id, task_id)
        .await?
        .ok_or_else(|| CliError::TaskNotFound {
            id: task_id.to_string(),
        })?;

    client.delete_task(&resolved.id, &task.id).await?;
    Ok(format!("✓ Task deleted: {} ({})", task.title, task.id))
}

fn compact_line(task: &Task, project: Option<&str>) -> String {
    let mut line = format!("{}: {}", task.short_id(), task.title);
    if task.priority != 0 {
        line.push_str(&format!(" [P{}]", task.priority));
    }
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" (due: {due})"));
    }
    if let Some(tags) = task.tags.as_ref().filter(|t| !t.is_empty()) {
        line.push_str(&format!(" #{}", tags.join(" #")));
    }
    if let Some(project) = project {
        line.push_str(&format!(" [{project}]"));
    }
    line
}

fn status_label(status: i32) -> &'static str {
    match status {
        STATUS_OPEN => "Open",
        STATUS_IN_PROGRESS => "In Progress",
        STATUS_COMPLETED => "Completed",
        _ => "Unknown",
    }
}
