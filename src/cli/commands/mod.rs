pub mod auth;
pub mod config;
pub mod init;
pub mod project;
pub mod task;

use crate::api::ApiClient;
use crate::cli::error::{CliError, CliResult};
use crate::config::{Config, ConfigStore};

/// Load the config and build a bearer client, failing fast when the user has
/// not logged in.
pub(crate) fn authed_client(
    store: &ConfigStore,
    api_url: Option<String>,
) -> CliResult<(Config, ApiClient)> {
    let config = store.load()?;
    if !config.is_authenticated() {
        return Err(CliError::NotAuthenticated);
    }
    let client = ApiClient::new(&config.auth.access_token, api_url)?;
    Ok((config, client))
}
