//! Remote entities and request payloads for the TickTick Open API.
//!
//! All wire names are camelCase; the remote owns every task's lifecycle, so
//! these types are plain data carriers with no local state.

use serde::{Deserialize, Serialize};

/// Task status values used by the remote API.
pub const STATUS_OPEN: i32 = 0;
pub const STATUS_IN_PROGRESS: i32 = 1;
pub const STATUS_COMPLETED: i32 = 2;

/// Priorities the remote API understands.
pub const VALID_PRIORITIES: [i32; 4] = [0, 1, 3, 5];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub modified_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// 0 = open, 1 = in progress, 2 = completed.
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<String>,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub modified_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Case-insensitive match against title and content.
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self
                .content
                .as_ref()
                .is_some_and(|c| c.to_lowercase().contains(&query))
    }

    /// True when the task carries at least one of the given tags,
    /// compared case-insensitively.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        let Some(task_tags) = self.tags.as_ref().filter(|t| !t.is_empty()) else {
            return false;
        };
        let task_tags: Vec<String> = task_tags.iter().map(|t| t.to_lowercase()).collect();
        tags.iter()
            .any(|wanted| task_tags.contains(&wanted.to_lowercase()))
    }

    /// Abbreviated ID shown in listings; full IDs remain accepted everywhere.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
    }
}

/// Human label for a priority value.
pub fn priority_label(priority: i32) -> &'static str {
    match priority {
        0 => "None",
        1 => "Low",
        3 => "Medium",
        5 => "High",
        _ => "Unknown",
    }
}

/// The remote accepts exactly these priority values; anything else is
/// rejected here before a request is built.
pub fn validate_priority(priority: i32) -> Result<(), String> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(format!(
            "priority must be one of 0 (none), 1 (low), 3 (medium), 5 (high); got {priority}"
        ))
    }
}

/// Due dates travel as plain `YYYY-MM-DD` strings.
pub fn validate_due_date(date: &str) -> Result<(), String> {
    match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("due date must be in YYYY-MM-DD format; got '{date}'")),
    }
}
