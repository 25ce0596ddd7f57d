pub mod commands;
pub mod context;
pub mod error;
pub mod utils;


use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::config::ConfigStore;
use commands::task::{AddOptions, ListOptions, SearchOptions, UpdateOptions};
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "ticktick")]
#[command(author, version, about = "TickTick CLI - Manage your tasks from the command line", long_about = None)]
pub struct Cli {
    /// Override the API URL (default: TICKTICK_API_URL env or the production endpoint)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Link this directory to a TickTick project
    Init {
        /// Link to an existing project by ID
        #[arg(long)]
        project_id: Option<String>,
        /// Create a new project with this name and link to it
        #[arg(long)]
        create: Option<String>,
    },
    /// Switch this directory to a different project
    Switch {
        /// Project ID to switch to
        #[arg(long)]
        project_id: String,
    },
    /// Manage global configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Add a new task
    Add {
        /// Task title
        title: String,
        /// Task description/content
        #[arg(long, visible_alias = "desc")]
        content: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Priority (0=none, 1=low, 3=medium, 5=high)
        #[arg(long)]
        priority: Option<i32>,
        /// Task tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// Project ID (overrides the .ticktick file)
        #[arg(long)]
        project: Option<String>,
    },
    /// List tasks
    List {
        /// List tasks from all projects
        #[arg(long)]
        all: bool,
        /// List tasks from a specific project
        #[arg(long)]
        project: Option<String>,
        /// Filter by priority
        #[arg(long)]
        priority: Option<i32>,
        /// Output format (table, json, compact)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// Search for tasks
    Search {
        /// Search query (matches title and description)
        query: Option<String>,
        /// Filter by tags (comma-separated, matches any)
        #[arg(long)]
        tag: Option<String>,
        /// Filter by priority level
        #[arg(long)]
        priority: Option<i32>,
        /// Search across all projects
        #[arg(long)]
        all_projects: bool,
        /// Output format (table, json, compact)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Update an existing task
    Update {
        /// Task ID (full or short ID)
        task_id: String,
        /// New task title
        #[arg(long)]
        title: Option<String>,
        /// New task description
        #[arg(long, visible_alias = "desc")]
        content: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// New priority (0=none, 1=low, 3=medium, 5=high)
        #[arg(long)]
        priority: Option<i32>,
        /// New tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// Clear the task description
        #[arg(long)]
        clear_content: bool,
        /// Clear the due date
        #[arg(long)]
        clear_due: bool,
        /// Clear all tags
        #[arg(long)]
        clear_tags: bool,
        /// Project ID (overrides the .ticktick file)
        #[arg(long)]
        project: Option<String>,
    },
    /// Mark a task as complete
    Complete {
        /// Task ID (full or short ID)
        task_id: String,
        /// Project ID (overrides the .ticktick file)
        #[arg(long)]
        project: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID (full or short ID)
        task_id: String,
        /// Project ID (overrides the .ticktick file)
        #[arg(long)]
        project: Option<String>,
        /// Skip the safety check
        #[arg(short, long)]
        force: bool,
    },
    /// Show task details
    Show {
        /// Task ID (full or short ID)
        task_id: String,
        /// Project ID (overrides the .ticktick file)
        #[arg(long)]
        project: Option<String>,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Authenticate with TickTick
    Login {
        /// OAuth Client ID
        #[arg(long, env = "TICKTICK_CLIENT_ID")]
        client_id: Option<String>,
        /// OAuth Client Secret
        #[arg(long, env = "TICKTICK_CLIENT_SECRET")]
        client_secret: Option<String>,
    },
    /// Check authentication status
    Status,
    /// Remove stored credentials
    Logout,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show all configuration settings
    Show,
    /// Manage the default project
    Default {
        #[command(subcommand)]
        command: DefaultCommands,
    },
}

#[derive(Subcommand)]
enum DefaultCommands {
    /// Set the global default project
    Set {
        /// Project ID (full or first 12 characters)
        project_id: String,
    },
    /// Clear the global default project
    Clear,
    /// Show the current default project
    Show,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List all projects
    List {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

pub async fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let store = ConfigStore::new()?;
    let output = dispatch(cli, &store).await?;
    println!("{}", output);
    Ok(())
}

async fn dispatch(cli: Cli, store: &ConfigStore) -> CliResult<String> {
    let api_url = cli.api_url;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login {
                client_id,
                client_secret,
            } => commands::auth::login(store, client_id, client_secret).await,
            AuthCommands::Status => commands::auth::status(store),
            AuthCommands::Logout => commands::auth::logout(store),
        },

        Commands::Init { project_id, create } => {
            let (_, client) = commands::authed_client(store, api_url)?;
            commands::init::init(&client, &cwd()?, project_id.as_deref(), create.as_deref()).await
        }

        Commands::Switch { project_id } => {
            let (_, client) = commands::authed_client(store, api_url)?;
            commands::init::switch(&client, &cwd()?, &project_id).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let client = optional_client(store, api_url)?;
                commands::config::show(store, client.as_ref()).await
            }
            ConfigCommands::Default { command } => match command {
                DefaultCommands::Set { project_id } => {
                    let (_, client) = commands::authed_client(store, api_url)?;
                    commands::config::default_set(store, &client, &project_id).await
                }
                DefaultCommands::Clear => {
                    let client = optional_client(store, api_url)?;
                    commands::config::default_clear(store, client.as_ref()).await
                }
                DefaultCommands::Show => {
                    let client = optional_client(store, api_url)?;
                    commands::config::default_show(store, client.as_ref()).await
                }
            },
        },

        Commands::Add {
            title,
            content,
            due,
            priority,
            tags,
            project,
        } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::add(
                &client,
                &config,
                &cwd()?,
                &title,
                AddOptions {
                    content,
                    due,
                    priority,
                    tags,
                    project,
                },
            )
            .await
        }

        Commands::List {
            all,
            project,
            priority,
            format,
        } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::list(
                &client,
                &config,
                &cwd()?,
                ListOptions {
                    all,
                    project,
                    priority,
                    format,
                },
            )
            .await
        }

        Commands::Search {
            query,
            tag,
            priority,
            all_projects,
            format,
        } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::search(
                &client,
                &config,
                &cwd()?,
                query.as_deref(),
                SearchOptions {
                    tags: tag,
                    priority,
                    all_projects,
                    format,
                },
            )
            .await
        }

        Commands::Update {
            task_id,
            title,
            content,
            due,
            priority,
            tags,
            clear_content,
            clear_due,
            clear_tags,
            project,
        } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::update(
                &client,
                &config,
                &cwd()?,
                &task_id,
                UpdateOptions {
                    title,
                    content,
                    due,
                    priority,
                    tags,
                    clear_content,
                    clear_due,
                    clear_tags,
                    project,
                },
            )
            .await
        }

        Commands::Complete { task_id, project } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::complete(&client, &config, &cwd()?, &task_id, project.as_deref()).await
        }

        Commands::Delete {
            task_id,
            project,
            force,
        } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::delete(
                &client,
                &config,
                &cwd()?,
                &task_id,
                project.as_deref(),
                force,
            )
            .await
        }

        Commands::Show { task_id, project } => {
            let (config, client) = commands::authed_client(store, api_url)?;
            commands::task::show(&client, &config, &cwd()?, &task_id, project.as_deref()).await
        }

        Commands::Projects { command } => match command {
            ProjectCommands::List { format } => {
                let (_, client) = commands::authed_client(store, api_url)?;
                commands::project::list(&client, &format).await
            }
        },
    }
}

fn cwd() -> CliResult<PathBuf> {
    std::env::current_dir()
        .map_err(|e| CliError::validation(format!("cannot determine working directory: {e}")))
}

fn optional_client(store: &ConfigStore, api_url: Option<String>) -> CliResult<Option<ApiClient>> {
    let config = store.load()?;
    if config.is_authenticated() {
        Ok(Some(ApiClient::new(&config.auth.access_token, api_url)?))
    } else {
        Ok(None)
    }
}
