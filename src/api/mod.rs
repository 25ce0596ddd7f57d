//! HTTP client for the TickTick Open API.
//!
//! A thin wrapper over reqwest: every method maps one domain operation to
//! one REST call and normalizes failures through [`ApiError`]. Nothing is
//! cached or retried.

mod error;

pub use error::{ApiError, ApiResult};

use std::env;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{CreateProjectRequest, CreateTaskRequest, Project, Task, UpdateTaskRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.ticktick.com/open/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest task ID still treated as a prefix by [`ApiClient::find_task_by_id`].
pub const SHORT_ID_MAX_LEN: usize = 8;

/// Bearer-authenticated API client.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a client for the given access token.
    ///
    /// Priority for the base URL:
    /// 1. Explicit `base_url` parameter
    /// 2. TICKTICK_API_URL environment variable
    /// 3. The production endpoint
    pub fn new(access_token: &str, base_url: Option<String>) -> ApiResult<Self> {
        let base_url = base_url
            .or_else(|| env::var("TICKTICK_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
            ApiError::Authentication {
                message: "access token contains invalid characters".to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Project operations

    pub async fn get_projects(&self) -> ApiResult<Vec<Project>> {
        let response = self.client.get(self.url("/project")).send().await?;
        Self::handle_response(response).await
    }

    pub async fn get_project(&self, id: &str) -> ApiResult<Project> {
        let response = self
            .client
            .get(self.url(&format!("/project/{id}")))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn create_project(&self, req: &CreateProjectRequest) -> ApiResult<Project> {
        let response = self
            .client
            .post(self.url("/project"))
            .json(req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete_project(&self, id: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/project/{id}")))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    // Task operations

    /// Fetch a project's tasks.
    ///
    /// The endpoint returns either a bare array or an envelope object with a
    /// `tasks` field; both normalize to a vec. Any other shape is logged and
    /// treated as empty rather than failed.
    pub async fn get_tasks(&self, project_id: &str) -> ApiResult<Vec<Task>> {
        let response = self
            .client
            .get(self.url(&format!("/project/{project_id}/data")))
            .send()
            .await?;
        let value: Value = Self::handle_response(response).await?;

        let tasks = match value {
            Value::Array(_) => Some(value),
            Value::Object(mut map) => map.remove("tasks").filter(Value::is_array),
            _ => None,
        };
        match tasks {
            Some(tasks) => serde_json::from_value(tasks).map_err(|e| ApiError::InvalidResponse {
                message: e.to_string(),
            }),
            None => {
                tracing::warn!(project_id, "unexpected task list shape, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    pub async fn get_task(&self, project_id: &str, task_id: &str) -> ApiResult<Task> {
        let response = self
            .client
            .get(self.url(&format!("/project/{project_id}/task/{task_id}")))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn create_task(&self, req: &CreateTaskRequest) -> ApiResult<Task> {
        let response = self.client.post(self.url("/task")).json(req).send().await?;
        Self::handle_response(response).await
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        req: &UpdateTaskRequest,
    ) -> ApiResult<Task> {
        let response = self
            .client
            .post(self.url(&format!("/project/{project_id}/task/{task_id}")))
            .json(req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn complete_task(&self, project_id: &str, task_id: &str) -> ApiResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/project/{project_id}/task/{task_id}/complete")))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/project/{project_id}/task/{task_id}")))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Look a task up by full or short ID.
    ///
    /// Tries an exact fetch first. When that fails and the supplied ID is
    /// short enough to be a prefix, falls back to scanning the project's
    /// task list for the first ID starting with it. The fallback reports
    /// absence as `None`, never as an error.
    pub async fn find_task_by_id(&self, project_id: &str, id: &str) -> ApiResult<Option<Task>> {
        match self.get_task(project_id, id).await {
            Ok(task) => Ok(Some(task)),
            Err(_) if id.len() <= SHORT_ID_MAX_LEN => {
                let tasks = self.get_tasks(project_id).await?;
                Ok(tasks.into_iter().find(|t| t.id.starts_with(id)))
            }
            Err(_) => Ok(None),
        }
    }

    /// Deserialize a successful response body, or map the status to a typed
    /// error. Error bodies carry the message in an `errorMsg` field when the
    /// remote produced one.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse {
                    message: e.to_string(),
                })
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Like `handle_response` for endpoints that return no body.
    async fn expect_success(response: Response) -> ApiResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("errorMsg")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body
                }
            });

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Authentication { message },
            StatusCode::FORBIDDEN => ApiError::PermissionDenied { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { message },
            s if s.is_server_error() => ApiError::ServiceUnavailable { message },
            s => ApiError::Status {
                status: s.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
