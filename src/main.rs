//! lectern CLI entry point

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use lectern::{
    commands::*,
    config::Config,
    error::Result,
    listing::{DateRange, DocumentFilter, DocumentSort, UserFilter},
    models::{DocumentType, QueryType, UpdateUserInput, UpdateWorkspaceInput, UserRole, WorkspaceRole},
    progress::LogWriterFactory,
    status::{DocumentStatus, IngestionStatus},
    validate::RegisterForm,
    ApiClient,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(version, about = "Command-line client for document search and Q&A", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Workspace to operate on (defaults to the configured or first available one)
    #[arg(short, long, global = true, env = "LECTERN_WORKSPACE")]
    workspace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,

        /// API base URL
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and its first workspace
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        workspace_name: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Change the signed-in user's password
    Password {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },

    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Avatar image URL (http or https)
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Manage documents
    #[command(alias = "docs")]
    Documents {
        #[command(subcommand)]
        action: DocumentAction,
    },

    /// Manage workspaces
    Workspaces {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Administer users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Semantic search over the workspace
    Search {
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<u32>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Ask a question answered from the workspace's documents
    Ask {
        question: String,

        /// Maximum number of source chunks
        #[arg(short, long)]
        limit: Option<u32>,

        /// Model to answer with
        #[arg(long)]
        model: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show past searches and questions
    History {
        #[arg(long = "type", value_enum)]
        query_type: Option<QueryType>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Workspace overview
    Dashboard,

    /// Document and storage usage against limits
    Limits,

    /// Usage metrics across users, documents and queries
    Metrics,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only documents whose name contains this text
    #[arg(long)]
    name: Option<String>,

    /// Only documents of this type (PDF, DOCX, ...)
    #[arg(long = "type")]
    doc_type: Option<DocumentType>,

    /// Only documents with this status
    #[arg(long)]
    status: Option<DocumentStatus>,

    /// Only documents at this ingestion status
    #[arg(long)]
    ingestion: Option<IngestionStatus>,

    /// Only documents created within this range
    #[arg(long, value_enum, default_value = "all")]
    date: DateRange,
}

impl From<FilterArgs> for DocumentFilter {
    fn from(args: FilterArgs) -> Self {
        DocumentFilter {
            search: args.name,
            doc_type: args.doc_type,
            status: args.status,
            ingestion_status: args.ingestion,
            date_range: args.date,
        }
    }
}

#[derive(Subcommand)]
enum DocumentAction {
    /// List documents
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value = "created")]
        sort: DocumentSort,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a document and its processing timeline
    Show {
        id: String,

        /// Keep polling until processing completes or fails
        #[arg(long)]
        watch: bool,
    },

    /// Upload files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Rename a document
    Rename { id: String, name: String },

    /// Delete a document
    Delete { id: String },

    /// Run the processing pipeline again
    Reindex { id: String },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// List workspaces
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(short, long, default_value = "100")]
        limit: u32,
    },

    /// Show a workspace
    Show { id: String },

    /// Create a workspace
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Update a workspace
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a workspace
    Delete { id: String },

    /// Manage workspace members
    Members {
        #[command(subcommand)]
        action: MemberAction,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    /// List members of the workspace
    List,

    /// Add a user to the workspace
    Add {
        user_id: String,

        #[arg(long, value_enum, default_value = "member")]
        role: WorkspaceRole,
    },

    /// Change a member's role
    Update {
        member_id: String,

        #[arg(long, value_enum)]
        role: WorkspaceRole,
    },

    /// Remove a member
    Remove { member_id: String },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        role: Option<UserRole>,

        /// Only active (true) or inactive (false) users
        #[arg(long)]
        active: Option<bool>,
    },

    /// Show a user
    Show { id: String },

    /// Re-enable a user
    Activate { id: String },

    /// Disable a user
    Deactivate { id: String },

    /// Delete a user
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn emit<T: Serialize>(json: bool, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "lectern", &mut std::io::stdout());
        return Ok(());
    }

    if let Commands::Init { force, api_url } = cli.command {
        let (base_dir, config_path) = resolve_paths(cli.config);
        let config = cmd_init(InitOptions {
            base_dir,
            config_path,
            api_url,
            workspace: cli.workspace,
            force,
        })?;
        println!("✓ lectern initialized successfully");
        println!("  Config: {}", config.paths.config_file.display());
        println!("  API: {}", config.api_url);
        println!("\nNext steps:");
        println!("  1. Sign in: lectern login --email you@example.com");
        println!("  2. Upload: lectern documents upload ./handbook.pdf");
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let client = Arc::new(ApiClient::from_config(&config)?);
    let json = cli.json;
    let show_progress = !json && std::io::stderr().is_terminal();
    let explicit_workspace = cli.workspace.or_else(|| config.workspace.clone());
    let api: &ApiClient = &client;
    let explicit = explicit_workspace.as_deref();
    let workspace = move || api.resolve_workspace(explicit);

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => {}

        Commands::Login { email, password } => {
            let payload = cmd_login(&client, &email, &password).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&payload.user)?);
            } else {
                print_auth(&payload);
            }
        }

        Commands::Register {
            name,
            email,
            password,
            workspace_name,
        } => {
            let form = RegisterForm {
                name,
                email,
                password,
                workspace_name,
            };
            let payload = cmd_register(&client, form).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&payload.user)?);
            } else {
                print_auth(&payload);
            }
        }

        Commands::Logout => {
            cmd_logout(&client)?;
            println!("✓ Signed out");
        }

        Commands::Whoami => {
            let user = cmd_whoami(&client).await?;
            emit(json, &user, print_user)?;
        }

        Commands::Password { current, new } => {
            cmd_change_password(&client, &current, &new).await?;
            println!("✓ Password changed");
        }

        Commands::Profile {
            first_name,
            last_name,
            avatar,
        } => {
            let input = UpdateUserInput {
                first_name,
                last_name,
                avatar,
                is_active: None,
            };
            let user = cmd_update_profile(&client, input).await?;
            emit(json, &user, print_user)?;
        }

        Commands::Documents { action } => {
            handle_documents(&client, &config, workspace, action, json, show_progress).await?;
        }

        Commands::Workspaces { action } => {
            handle_workspaces(&client, workspace, action, json).await?;
        }

        Commands::Users { action } => {
            handle_users(&client, action, json).await?;
        }

        Commands::Search {
            query,
            limit,
            filter,
        } => {
            let ws = workspace().await?;
            let options = SearchOptions {
                limit,
                filter: filter.into(),
                model: None,
            };
            let response = cmd_search(&client, &config, &ws, &query, &options).await?;
            emit(json, &response, print_search_results)?;
        }

        Commands::Ask {
            question,
            limit,
            model,
            filter,
        } => {
            let ws = workspace().await?;
            let options = SearchOptions {
                limit,
                filter: filter.into(),
                model,
            };
            let response = cmd_ask(&client, &config, &ws, &question, &options).await?;
            emit(json, &response, print_answer)?;
        }

        Commands::History {
            query_type,
            page,
            limit,
        } => {
            let ws = workspace().await?;
            let history = cmd_query_history(&client, &ws, query_type, page, limit).await?;
            emit(json, &history, print_query_history)?;
        }

        Commands::Dashboard => {
            let ws = workspace().await?;
            let report = cmd_dashboard(&client, &config, &ws).await?;
            emit(json, &report, print_dashboard)?;
        }

        Commands::Limits => {
            let ws = workspace().await?;
            let report = cmd_limits(&client, &config, &ws).await?;
            emit(json, &report, print_limits)?;
        }

        Commands::Metrics => {
            let ws = workspace().await?;
            let metrics = cmd_usage_metrics(&client, &config, &ws).await?;
            emit(json, &metrics, print_usage_metrics)?;
        }
    }

    Ok(())
}

async fn handle_documents<F, Fut>(
    client: &Arc<ApiClient>,
    config: &Config,
    workspace: F,
    action: DocumentAction,
    json: bool,
    show_progress: bool,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    match action {
        DocumentAction::List {
            filter,
            sort,
            asc,
            limit,
        } => {
            let ws = workspace().await?;
            let options = ListOptions {
                filter: filter.into(),
                sort,
                descending: !asc,
                limit,
            };
            let documents = cmd_list_documents(client, config, &ws, &options).await?;
            emit(json, &documents, |docs| print_documents(docs))?;
        }

        DocumentAction::Show { id, watch } => {
            let detail = if watch {
                cmd_watch_document(client, &id, config.watch_interval(), show_progress).await?
            } else {
                cmd_show_document(client, &id).await?
            };
            emit(json, &detail, print_document_detail)?;
        }

        DocumentAction::Upload { files } => {
            let ws = workspace().await?;
            let report = cmd_upload_documents(client, config, &ws, &files, show_progress).await?;
            emit(json, &report, print_upload_report)?;
        }

        DocumentAction::Rename { id, name } => {
            let document = cmd_rename_document(client, &id, &name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("✓ Renamed document {}: {}", document.id, document.name);
            }
        }

        DocumentAction::Delete { id } => {
            cmd_delete_document(client, &id).await?;
            println!("✓ Document {} deleted", id);
        }

        DocumentAction::Reindex { id } => {
            let detail = cmd_reindex_document(client.clone(), &id, config.refresh_delay()).await?;
            if !json {
                println!("✓ Reindex requested for {}", id);
            }
            emit(json, &detail, print_document_detail)?;
        }
    }

    Ok(())
}

async fn handle_workspaces<F, Fut>(
    client: &ApiClient,
    workspace: F,
    action: WorkspaceAction,
    json: bool,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    match action {
        WorkspaceAction::List { search, limit } => {
            let workspaces = cmd_list_workspaces(client, search, limit).await?;
            emit(json, &workspaces, |ws| print_workspaces(ws))?;
        }

        WorkspaceAction::Show { id } => {
            let ws = cmd_show_workspace(client, &id).await?;
            emit(json, &ws, print_workspace)?;
        }

        WorkspaceAction::Create { name, description } => {
            let ws = cmd_create_workspace(client, &name, description).await?;
            emit(json, &ws, print_workspace)?;
        }

        WorkspaceAction::Update {
            id,
            name,
            description,
        } => {
            let input = UpdateWorkspaceInput {
                name,
                description,
                ..Default::default()
            };
            let ws = cmd_update_workspace(client, &id, input).await?;
            emit(json, &ws, print_workspace)?;
        }

        WorkspaceAction::Delete { id } => {
            cmd_delete_workspace(client, &id).await?;
            println!("✓ Workspace {} deleted", id);
        }

        WorkspaceAction::Members { action } => {
            let ws = workspace().await?;
            match action {
                MemberAction::List => {
                    let members = cmd_list_members(client, &ws).await?;
                    emit(json, &members, |m| print_members(m))?;
                }
                MemberAction::Add { user_id, role } => {
                    let member = cmd_add_member(client, &ws, &user_id, role).await?;
                    emit(json, &vec![member], |m| print_members(m))?;
                }
                MemberAction::Update { member_id, role } => {
                    let member = cmd_update_member(client, &ws, &member_id, role).await?;
                    emit(json, &vec![member], |m| print_members(m))?;
                }
                MemberAction::Remove { member_id } => {
                    cmd_remove_member(client, &ws, &member_id).await?;
                    println!("✓ Member {} removed", member_id);
                }
            }
        }
    }

    Ok(())
}

async fn handle_users(client: &ApiClient, action: UserAction, json: bool) -> Result<()> {
    match action {
        UserAction::List {
            search,
            role,
            active,
        } => {
            let filter = UserFilter {
                search,
                role,
                active,
            };
            let users = cmd_list_users(client, &filter).await?;
            emit(json, &users, |u| print_users(u))?;
        }

        UserAction::Show { id } => {
            let user = cmd_show_user(client, &id).await?;
            emit(json, &user, print_user)?;
        }

        UserAction::Activate { id } => {
            let user = cmd_set_user_active(client, &id, true).await?;
            emit(json, &user, print_user)?;
        }

        UserAction::Deactivate { id } => {
            let user = cmd_set_user_active(client, &id, false).await?;
            emit(json, &user, print_user)?;
        }

        UserAction::Delete { id } => {
            cmd_delete_user(client, &id).await?;
            println!("✓ User {} deleted", id);
        }
    }

    Ok(())
}

/// Base directory and config file for `--config`, which may name either
fn resolve_paths(config: Option<PathBuf>) -> (PathBuf, PathBuf) {
    match config {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path)
        }
        Some(dir) => (dir.clone(), dir.join("config.toml")),
        None => {
            let base = Config::default_base_dir();
            (base.clone(), base.join("config.toml"))
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let (base_dir, config_path) = resolve_paths(Some(path.to_path_buf()));
            if config_path.exists() {
                Config::load(&config_path)
            } else {
                Config::load_from(Some(base_dir))
            }
        }
        None => Config::load_from(None),
    }
}
