//! MCP tools for TickTick task management.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars,
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::cli::commands::task::filter_tasks;
use crate::cli::error::{CliError, CliResult};
use crate::config::{ConfigError, ConfigStore};
use crate::project;
use crate::types::{
    CreateTaskRequest, Task, UpdateTaskRequest, priority_label, validate_due_date,
    validate_priority,
};

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskParams {
    #[schemars(description = "Task title (required)")]
    pub title: String,
    #[schemars(description = "Task description/content (optional)")]
    pub content: Option<String>,
    #[schemars(description = "Priority level: 0=none, 1=low, 3=medium, 5=high (optional)")]
    pub priority: Option<i32>,
    #[schemars(description = "Due date in YYYY-MM-DD format (optional)")]
    pub due_date: Option<String>,
    #[schemars(description = "List of tags (optional)")]
    pub tags: Option<Vec<String>>,
    #[schemars(
        description = "Project ID to create the task in (optional, uses the current project from the working directory if not specified)"
    )]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksParams {
    #[schemars(
        description = "Project ID to list tasks from (optional, uses the current project if not specified)"
    )]
    pub project_id: Option<String>,
    #[schemars(description = "Filter by priority level: 0, 1, 3 or 5 (optional)")]
    pub priority: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchTasksParams {
    #[schemars(description = "Search text (matches title and description)")]
    pub query: Option<String>,
    #[schemars(description = "Filter by tags (matches any)")]
    pub tags: Option<Vec<String>>,
    #[schemars(description = "Filter by priority level: 0, 1, 3 or 5")]
    pub priority: Option<i32>,
    #[schemars(
        description = "Search across all projects (default: false, searches the current project only)"
    )]
    pub all_projects: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetTaskParams {
    #[schemars(description = "Task ID (full or short ID)")]
    pub task_id: String,
    #[schemars(description = "Project ID (optional, uses the current project if not specified)")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskParams {
    #[schemars(description = "Task ID (full or short ID)")]
    pub task_id: String,
    #[schemars(description = "New task title")]
    pub title: Option<String>,
    #[schemars(description = "New task description (use an empty string to clear)")]
    pub content: Option<String>,
    #[schemars(description = "New priority level: 0, 1, 3 or 5")]
    pub priority: Option<i32>,
    #[schemars(description = "New due date in YYYY-MM-DD format (use an empty string to clear)")]
    pub due_date: Option<String>,
    #[schemars(description = "New tags (use an empty array to clear)")]
    pub tags: Option<Vec<String>>,
    #[schemars(description = "Project ID (optional, uses the current project if not specified)")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskParams {
    #[schemars(description = "Task ID (full or short ID)")]
    pub task_id: String,
    #[schemars(description = "Project ID (optional, uses the current project if not specified)")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskParams {
    #[schemars(description = "Task ID (full or short ID)")]
    pub task_id: String,
    #[schemars(description = "Project ID (optional, uses the current project if not specified)")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

// =============================================================================
// Server
// =============================================================================

#[derive(Clone)]
pub struct TickTickMcpServer {
    store: ConfigStore,
    api_url: Option<String>,
    tool_router: ToolRouter<Self>,
}

impl TickTickMcpServer {
    /// Server over the per-user config.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_store(ConfigStore::new()?, None))
    }

    /// Server over an explicit config store and API endpoint.
    pub fn with_store(store: ConfigStore, api_url: Option<String>) -> Self {
        Self {
            store,
            api_url,
            tool_router: Self::tool_router(),
        }
    }

    /// The config is re-read on every call; this process may outlive several
    /// logins from the CLI side.
    fn authed(&self) -> CliResult<ApiClient> {
        let config = self.store.load()?;
        if !config.is_authenticated() {
            return Err(CliError::NotAuthenticated);
        }
        Ok(ApiClient::new(
            &config.auth.access_token,
            self.api_url.clone(),
        )?)
    }
}

/// Resolve the project for a tool call: explicit parameter, then the nearest
/// `.ticktick` link above the working directory. Tool calls never fall back
/// to the configured default project.
fn resolve_tool_project(explicit: Option<String>) -> CliResult<(String, Option<String>)> {
    if let Some(id) = explicit.filter(|id| !id.is_empty()) {
        return Ok((id, None));
    }
    if let Some(ctx) = project::current_context()? {
        return Ok((ctx.link.project_id, Some(ctx.link.project_name)));
    }
    Err(CliError::NoProject)
}

fn text_result(outcome: CliResult<String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!("Error: {e}"))]),
    }
}

fn format_task(task: &Task) -> String {
    let mut lines = vec![
        format!("**{}**", task.title),
        format!("ID: {}", task.short_id()),
    ];
    if let Some(content) = task.content.as_ref().filter(|c| !c.is_empty()) {
        lines.push(format!("Description: {content}"));
    }
    if task.priority != 0 {
        lines.push(format!("Priority: {}", priority_label(task.priority)));
    }
    if let Some(due) = &task.due_date {
        lines.push(format!("Due: {due}"));
    }
    if let Some(tags) = task.tags.as_ref().filter(|t| !t.is_empty()) {
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    lines.join("\n")
}

fn format_task_blocks(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(format_task)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[tool_router]
impl TickTickMcpServer {
    #[tool(
        description = "Create a new task in TickTick. If no project is specified, uses the current project from the working directory (.ticktick file)."
    )]
    pub async fn create_task(
        &self,
        Parameters(params): Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_create_task(params).await))
    }

    #[tool(
        description = "List all incomplete tasks in a project. If no project is specified, uses the current project from the working directory."
    )]
    pub async fn list_tasks(
        &self,
        Parameters(params): Parameters<ListTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_list_tasks(params).await))
    }

    #[tool(
        description = "Search for tasks by text, tags, or priority. Can search across all projects or just the current project."
    )]
    pub async fn search_tasks(
        &self,
        Parameters(params): Parameters<SearchTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_search_tasks(params).await))
    }

    #[tool(
        description = "Get detailed information about a specific task by ID. Supports both full IDs and short IDs (first 8 characters)."
    )]
    pub async fn get_task(
        &self,
        Parameters(params): Parameters<GetTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_get_task(params).await))
    }

    #[tool(description = "Update an existing task. Only provided fields will be updated.")]
    pub async fn update_task(
        &self,
        Parameters(params): Parameters<UpdateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_update_task(params).await))
    }

    #[tool(description = "Mark a task as completed.")]
    pub async fn complete_task(
        &self,
        Parameters(params): Parameters<CompleteTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_complete_task(params).await))
    }

    #[tool(description = "Delete a task permanently.")]
    pub async fn delete_task(
        &self,
        Parameters(params): Parameters<DeleteTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_delete_task(params).await))
    }

    #[tool(description = "List all active TickTick projects.")]
    pub async fn get_projects(
        &self,
        Parameters(_): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_get_projects().await))
    }

    #[tool(
        description = "Get the current project linked to the working directory via its .ticktick file."
    )]
    pub async fn get_current_project(
        &self,
        Parameters(_): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(self.handle_get_current_project()))
    }
}

// =============================================================================
// Handlers
// =============================================================================

impl TickTickMcpServer {
    async fn handle_create_task(&self, params: CreateTaskParams) -> CliResult<String> {
        if let Some(p) = params.priority {
            validate_priority(p).map_err(CliError::validation)?;
        }
        if let Some(d) = params.due_date.as_deref() {
            validate_due_date(d).map_err(CliError::validation)?;
        }

        let client = self.authed()?;
        let (project_id, project_name) = resolve_tool_project(params.project_id)?;

        let task = client
            .create_task(&CreateTaskRequest {
                title: params.title,
                project_id,
                content: params.content,
                due_date: params.due_date,
                priority: params.priority,
                tags: params.tags,
            })
            .await?;

        let suffix = project_name
            .map(|name| format!(" in project \"{name}\""))
            .unwrap_or_default();
        Ok(format!(
            "✓ Task created successfully{suffix}!\n\n{}",
            format_task(&task)
        ))
    }

    async fn handle_list_tasks(&self, params: ListTasksParams) -> CliResult<String> {
        let client = self.authed()?;
        let (project_id, project_name) = resolve_tool_project(params.project_id)?;

        let mut tasks = client.get_tasks(&project_id).await?;
        tasks.retain(|t| !t.is_completed());
        if let Some(p) = params.priority {
            tasks.retain(|t| t.priority == p);
        }

        let suffix = project_name
            .map(|name| format!(" in \"{name}\""))
            .unwrap_or_default();
        if tasks.is_empty() {
            return Ok(format!("No tasks found{suffix}."));
        }
        Ok(format!(
            "Found {} task(s){suffix}:\n\n{}",
            tasks.len(),
            format_task_blocks(&tasks)
        ))
    }

    async fn handle_search_tasks(&self, params: SearchTasksParams) -> CliResult<String> {
        let client = self.authed()?;

        let mut tasks = Vec::new();
        if params.all_projects.unwrap_or(false) {
            let projects = client.get_projects().await?;
            for project in projects.iter().filter(|p| !p.closed) {
                tasks.extend(client.get_tasks(&project.id).await?);
            }
        } else {
            let (project_id, _) = resolve_tool_project(None)?;
            tasks = client.get_tasks(&project_id).await?;
        }

        let filtered = filter_tasks(
            tasks,
            params.query.as_deref(),
            params.tags.as_deref(),
            params.priority,
        );

        if filtered.is_empty() {
            return Ok("No tasks found matching your search criteria.".to_string());
        }
        Ok(format!(
            "Found {} task(s):\n\n{}",
            filtered.len(),
            format_task_blocks(&filtered)
        ))
    }

    async fn handle_get_task(&self, params: GetTaskParams) -> CliResult<String> {
        let client = self.authed()?;
        let (project_id, _) = resolve_tool_project(params.project_id)?;

        match client.find_task_by_id(&project_id, &params.task_id).await? {
            Some(task) => Ok(format_task(&task)),
            None => Ok(format!("Task not found with ID: {}", params.task_id)),
        }
    }

    async fn handle_update_task(&self, params: UpdateTaskParams) -> CliResult<String> {
        if let Some(p) = params.priority {
            validate_priority(p).map_err(CliError::validation)?;
        }
        if let Some(d) = params.due_date.as_deref().filter(|d| !d.is_empty()) {
            validate_due_date(d).map_err(CliError::validation)?;
        }

        let client = self.authed()?;
        let (project_id, _) = resolve_tool_project(params.project_id)?;

        let Some(task) = client.find_task_by_id(&project_id, &params.task_id).await? else {
            return Ok(format!("Task not found with ID: {}", params.task_id));
        };

        let req = UpdateTaskRequest {
            title: params.title,
            content: params.content,
            due_date: params.due_date,
            priority: params.priority,
            tags: params.tags,
        };
        let updated = client.update_task(&project_id, &task.id, &req).await?;

        Ok(format!(
            "✓ Task updated successfully!\n\n{}",
            format_task(&updated)
        ))
    }

    async fn handle_complete_task(&self, params: CompleteTaskParams) -> CliResult<String> {
        let client = self.authed()?;
        let (project_id, _) = resolve_tool_project(params.project_id)?;

        let Some(task) = client.find_task_by_id(&project_id, &params.task_id).await? else {
            return Ok(format!("Task not found with ID: {}", params.task_id));
        };

        client.complete_task(&project_id, &task.id).await?;
        Ok(format!("✓ Task completed: {}", task.title))
    }

    async fn handle_delete_task(&self, params: DeleteTaskParams) -> CliResult<String> {
        let client = self.authed()?;
        let (project_id, _) = resolve_tool_project(params.project_id)?;

        let Some(task) = client.find_task_by_id(&project_id, &params.task_id).await? else {
            return Ok(format!("Task not found with ID: {}", params.task_id));
        };

        client.delete_task(&project_id, &task.id).await?;
        Ok(format!("✓ Task deleted: {}", task.title))
    }

    async fn handle_get_projects(&self) -> CliResult<String> {
        let client = self.authed()?;
        let projects = client.get_projects().await?;

        let active: Vec<_> = projects.into_iter().filter(|p| !p.closed).collect();
        if active.is_empty() {
            return Ok("No active projects found.".to_string());
        }

        let listing = active
            .iter()
            .map(|p| {
                let short: String = p.id.chars().take(12).collect();
                format!("- **{}** (ID: {})", p.name, short)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Your TickTick Projects ({} total):\n\n{listing}",
            active.len()
        ))
    }

    fn handle_get_current_project(&self) -> CliResult<String> {
        match project::current_context()? {
            Some(ctx) => Ok(format!(
                "Current project: **{}**\nID: {}\nDirectory: {}",
                ctx.link.project_name, ctx.link.project_id, ctx.link.folder_path
            )),
            None => {
                Ok("No .ticktick file found in current directory or parent directories."
                    .to_string())
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for TickTickMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.instructions = Some(
            "TickTick MCP Server - create, search, and manage TickTick tasks and projects"
                .to_string(),
        );
        info
    }
}
