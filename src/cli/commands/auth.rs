//! Auth commands: login, status, logout.

use chrono::{Duration, Utc};

use crate::auth;
use crate::cli::error::{CliError, CliResult};
use crate::config::ConfigStore;

/// Run the OAuth flow and persist the resulting credentials.
pub async fn login(
    store: &ConfigStore,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> CliResult<String> {
    let client_id = client_id.unwrap_or_default();
    let client_secret = client_secret.unwrap_or_default();
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(CliError::validation(
            "both Client ID and Client Secret are required; pass --client-id/--client-secret \
             or set TICKTICK_CLIENT_ID and TICKTICK_CLIENT_SECRET",
        ));
    }

    println!("Starting OAuth 2.0 authentication flow...\n");
    let tokens = auth::login(&client_id, &client_secret).await?;

    let expiry = Utc::now() + Duration::seconds(tokens.expires_in as i64);
    store.update_auth(
        &client_id,
        &client_secret,
        &tokens.access_token,
        &tokens.refresh_token,
        expiry,
    )?;

    Ok(format!(
        "✓ Authentication successful!\nCredentials saved to {}\nToken expires: {}",
        store.path().display(),
        expiry.to_rfc3339(),
    ))
}

pub fn status(store: &ConfigStore) -> CliResult<String> {
    let config = store.load()?;

    if !config.is_authenticated() {
        return Ok(
            "✗ Not authenticated\n\nRun 'ticktick auth login' to authenticate.".to_string(),
        );
    }

    let mut out = format!("✓ Authenticated\n\nClient ID: {}", config.auth.client_id);
    if let Some(expiry) = config.expiry() {
        out.push_str(&format!("\nToken expires: {}", expiry.to_rfc3339()));
        if config.is_token_expired() {
            out.push_str("\n\n⚠ Token is expired. Run 'ticktick auth login' again.");
        }
    }
    Ok(out)
}

pub fn logout(store: &ConfigStore) -> CliResult<String> {
    let config = store.load()?;

    if !config.is_authenticated() {
        return Ok("Already logged out (no credentials found)".to_string());
    }

    store.clear_auth()?;
    Ok(format!(
        "✓ Successfully logged out\nCredentials removed from {}",
        store.path().display(),
    ))
}
