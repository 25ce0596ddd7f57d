use miette::Diagnostic;
use thiserror::Error;

/// Errors from the TickTick Open API, normalized from HTTP status codes.
#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ticktick::api::authentication),
        help("Run 'ticktick auth login' to refresh your credentials.")
    )]
    Authentication { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(code(ticktick::api::permission_denied))]
    PermissionDenied { message: String },

    #[error("Resource not found: {message}")]
    #[diagnostic(code(ticktick::api::not_found))]
    NotFound { message: String },

    #[error("Rate limit exceeded: {message}")]
    #[diagnostic(code(ticktick::api::rate_limited), help("Wait a little and retry."))]
    RateLimited { message: String },

    #[error("TickTick service error: {message}")]
    #[diagnostic(
        code(ticktick::api::service_unavailable),
        help("The service is having trouble. Please try again later.")
    )]
    ServiceUnavailable { message: String },

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(ticktick::api::status))]
    Status { status: u16, message: String },

    #[error("Failed to reach the TickTick API")]
    #[diagnostic(
        code(ticktick::api::connection),
        help("Check your network connection, or set TICKTICK_API_URL if you are pointing at a different server.")
    )]
    Connection {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from the TickTick API: {message}")]
    #[diagnostic(code(ticktick::api::invalid_response))]
    InvalidResponse { message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ApiError::Connection { source: e }
        } else {
            ApiError::InvalidResponse {
                message: e.to_string(),
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
