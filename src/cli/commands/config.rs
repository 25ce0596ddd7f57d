//! Config commands: show, default set/clear/show.

use crate::api::ApiClient;
use crate::cli::error::CliResult;
use crate::config::ConfigStore;

/// Render the whole configuration. A client is supplied only when the user
/// is authenticated; project names are fetched best-effort.
pub async fn show(store: &ConfigStore, client: Option<&ApiClient>) -> CliResult<String> {
    let config = store.load()?;

    let mut out = String::from("=== Configuration ===\n\nAuthentication:\n");
    if config.is_authenticated() {
        out.push_str("  Status:       ✓ Authenticated\n");
        out.push_str(&format!("  Client ID:    {}\n", config.auth.client_id));
        if let Some(expiry) = config.expiry() {
            out.push_str(&format!("  Token Expiry: {}\n", expiry.to_rfc3339()));
            if config.is_token_expired() {
                out.push_str("  ⚠ Token is expired. Run 'ticktick auth login' again.\n");
            }
        }
    } else {
        out.push_str("  Status:       ✗ Not authenticated\n");
    }

    out.push_str("\nPreferences:\n");
    match config.preferences.default_project.as_deref() {
        Some(id) => {
            let display = match client {
                Some(client) => match client.get_project(id).await {
                    Ok(project) => format!("{} ({})", project.name, short(id)),
                    Err(_) => format!("{} (not found)", short(id)),
                },
                None => short(id),
            };
            out.push_str(&format!("  Default Project:  {display}\n"));
        }
        None => out.push_str("  Default Project:  (not set)\n"),
    }
    out.push_str(&format!(
        "  Date Format:      {}\n",
        config.preferences.date_format
    ));
    out.push_str(&format!(
        "  Time Format:      {}\n",
        config.preferences.time_format
    ));
    out.push_str(&format!(
        "  Default Priority: {}\n",
        config.preferences.default_priority
    ));
    out.push_str(&format!(
        "  Color Output:     {}\n",
        if config.preferences.color_output {
            "enabled"
        } else {
            "disabled"
        }
    ));

    out.push_str("\nCache:\n");
    out.push_str(&format!(
        "  Enabled:          {}\n",
        if config.cache.enabled { "yes" } else { "no" }
    ));
    out.push_str(&format!("  TTL:              {} seconds", config.cache.ttl));

    Ok(out)
}

/// Set the global default project after confirming it exists remotely.
pub async fn default_set(
    store: &ConfigStore,
    client: &ApiClient,
    project_id: &str,
) -> CliResult<String> {
    let project = client.get_project(project_id).await?;

    store.set_preference("defaultProject", &project.id)?;

    let mut out = format!(
        "✓ Default project set successfully!\n\nProject: {} ({})",
        project.name,
        short(&project.id),
    );
    if project.closed {
        out.push_str("\nNote: this project is closed.");
    }
    out.push_str(
        "\n\nAll commands will now use this project by default.\n\
         Directory .ticktick files and the --project flag still override it.",
    );
    Ok(out)
}

pub async fn default_clear(store: &ConfigStore, client: Option<&ApiClient>) -> CliResult<String> {
    let config = store.load()?;

    let Some(project_id) = config.preferences.default_project.clone() else {
        return Ok("No default project is currently set.".to_string());
    };

    // Fetch the name for the confirmation message; failure here is fine
    let name = match client {
        Some(client) => client
            .get_project(&project_id)
            .await
            .map(|p| p.name)
            .unwrap_or_else(|_| short(&project_id)),
        None => short(&project_id),
    };

    store.clear_default_project()?;
    Ok(format!(
        "✓ Default project cleared successfully!\n\nRemoved: {name}\n\n\
         You'll need a .ticktick file or the --project flag for commands now.",
    ))
}

pub async fn default_show(store: &ConfigStore, client: Option<&ApiClient>) -> CliResult<String> {
    let config = store.load()?;

    let Some(project_id) = config.preferences.default_project else {
        return Ok(
            "No default project is set.\n\nSet one with: ticktick config default set <project-id>"
                .to_string(),
        );
    };

    let mut out = String::from("Default Project:\n");
    match client {
        Some(client) => match client.get_project(&project_id).await {
            Ok(project) => {
                out.push_str(&format!("  Name:   {}\n", project.name));
                out.push_str(&format!("  ID:     {}\n", project.id));
                out.push_str(&format!(
                    "  Status: {}",
                    if project.closed { "Closed" } else { "Active" }
                ));
            }
            Err(_) => {
                out.push_str(&format!("  ID:     {project_id}\n"));
                out.push_str("  Status: Unable to fetch details (project may not exist)");
            }
        },
        None => {
            out.push_str(&format!("  ID:     {project_id}\n"));
            out.push_str("  Status: Not authenticated - cannot fetch details");
        }
    }
    Ok(out)
}

fn short(id: &str) -> String {
    id.chars().take(12).collect()
}
