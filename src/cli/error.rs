use miette::Diagnostic;
use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::project::LinkError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Not authenticated")]
    #[diagnostic(
        code(ticktick::cli::not_authenticated),
        help("Run 'ticktick auth login' first.")
    )]
    NotAuthenticated,

    #[error("No project specified")]
    #[diagnostic(
        code(ticktick::cli::no_project),
        help(
            "Run 'ticktick init' in this directory, set a default with 'ticktick config default set', or pass --project."
        )
    )]
    NoProject,

    #[error("Task not found with ID: {id}")]
    #[diagnostic(
        code(ticktick::cli::task_not_found),
        help("Short IDs match the first characters of a full task ID. Run 'ticktick list' to see them.")
    )]
    TaskNotFound { id: String },

    #[error("Validation error: {message}")]
    #[diagnostic(code(ticktick::cli::validation))]
    Validation { message: String },

    #[error("A .ticktick file already exists in this directory")]
    #[diagnostic(
        code(ticktick::cli::link_exists),
        help("Use 'ticktick switch' to point this directory at a different project.")
    )]
    LinkExists,

    #[error("No .ticktick file found in this directory")]
    #[diagnostic(
        code(ticktick::cli::link_missing),
        help("Run 'ticktick init' first to link a project.")
    )]
    LinkMissing,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Link(#[from] LinkError),
}

impl CliError {
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::Validation {
            message: message.into(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
