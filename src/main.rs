mod board;
mod client;
mod commands;
mod config;
mod models;
mod page;
mod session;
mod view;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use client::Client;
use config::Config;
use session::SessionStore;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "A lean CLI client for kanban-style project boards")]
#[command(version)]
struct Cli {
    /// Backend base URL, overriding the configured one
    #[arg(long, global = true, env = "TASKDECK_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize taskdeck in the current directory
    Init {
        /// Backend base URL, e.g. http://localhost:8000
        server: String,
    },

    /// Log in and store the session
    Login {
        /// Username
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Register a new account
    Register {
        /// Username
        username: String,
        /// Display name
        full_name: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the authenticated user
    Whoami,

    /// Update the current user's profile
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// Path to a new avatar image
        #[arg(long)]
        avatar: Option<PathBuf>,
    },

    /// List workspaces
    Workspaces {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Workspaces per page
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },

    /// Workspace management
    Workspace {
        #[command(subcommand)]
        action: WorkspaceCommands,
    },

    /// Project management
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Task management
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Show a project's kanban board
    Board {
        /// Project ID
        project: i64,
    },

    /// Move a task to another column (drag and drop)
    Move {
        /// Task ID
        task: i64,
        /// Project the task belongs to
        #[arg(long)]
        project: i64,
        /// Destination column (not-started, ongoing, in-review)
        #[arg(long)]
        to: Option<String>,
        /// Drop onto another task, adopting its column
        #[arg(long)]
        onto: Option<i64>,
    },

    /// List a project's archived tasks
    Archived {
        /// Project ID
        project: i64,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Tasks per page
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
}

#[derive(Subcommand)]
enum WorkspaceCommands {
    /// Show a workspace with members and projects
    Show { id: i64 },
    /// Create a workspace
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update a workspace
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a workspace
    Delete {
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Invite a user
    Invite { id: i64, username: String },
    /// Remove a member
    Kick { id: i64, username: String },
    /// Change a member's role (owner, admin, editor, viewer)
    Role {
        id: i64,
        username: String,
        role: String,
    },
    /// List the workspace's labels
    Labels { id: i64 },
    /// Create a label
    AddLabel {
        id: i64,
        text: String,
        /// Display color, e.g. #1073AD
        #[arg(long, default_value = "#1073AD")]
        color: String,
    },
    /// Rename or recolor a label
    EditLabel {
        /// Workspace ID
        id: i64,
        /// Label ID
        label: i64,
        /// New label text
        #[arg(long)]
        text: Option<String>,
        /// New display color
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a label
    RemoveLabel {
        /// Label ID
        label: i64,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Show a project summary
    Show { id: i64 },
    /// Create a project in a workspace
    Create {
        /// Workspace ID
        workspace: i64,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
    },
    /// Update a project
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        goal: Option<String>,
    },
    /// Delete a project
    Delete {
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Create a task in a project
    Create {
        /// Project ID
        project: i64,
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Initial column (defaults to not-started)
        #[arg(short, long)]
        status: Option<String>,
        /// Assignee member IDs (repeatable)
        #[arg(short, long = "assignee")]
        assignees: Vec<i64>,
        /// Label ID
        #[arg(short, long)]
        label: Option<i64>,
    },
    /// Update a task
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        label: Option<i64>,
        /// Replace the assignee set (repeatable)
        #[arg(short, long = "assignee")]
        assignees: Option<Vec<i64>>,
    },
    /// Delete a task
    Delete {
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Archive a task (removes it from the board, keeps it retrievable)
    Archive { id: i64 },
    /// Restore an archived task to the board
    Unarchive { id: i64 },
}

fn find_taskdeck_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(".taskdeck");
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a taskdeck checkout (or any parent). Run 'taskdeck init <server>' first.");
        }
    }
}

fn get_client(server_override: Option<&str>) -> Result<Client> {
    let dir = find_taskdeck_dir()?;
    let session = SessionStore::open(&dir);
    let server = match server_override {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => Config::load(&dir)?.server,
    };
    Ok(Client::new(&server, session))
}

fn read_password(provided: Option<String>) -> Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { server } => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd, &server)
        }

        Commands::Login { username, password } => {
            let password = read_password(password)?;
            let mut client = get_client(cli.server.as_deref())?;
            commands::auth::login(&mut client, &username, &password)
        }

        Commands::Register {
            username,
            full_name,
            password,
        } => {
            let password = read_password(password)?;
            let mut client = get_client(cli.server.as_deref())?;
            commands::auth::register(&mut client, &username, &full_name, &password)
        }

        Commands::Logout => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::auth::logout(&mut client)
        }

        Commands::Whoami => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::auth::whoami(&mut client)
        }

        Commands::Profile { name, avatar } => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::auth::profile(&mut client, name.as_deref(), avatar.as_deref())
        }

        Commands::Workspaces { page, limit } => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::workspace::list(&mut client, page, limit)
        }

        Commands::Workspace { action } => {
            let mut client = get_client(cli.server.as_deref())?;
            match action {
                WorkspaceCommands::Show { id } => commands::workspace::show(&mut client, id),
                WorkspaceCommands::Create { name, description } => {
                    commands::workspace::create(&mut client, &name, description.as_deref())
                }
                WorkspaceCommands::Update {
                    id,
                    name,
                    description,
                } => commands::workspace::update(
                    &mut client,
                    id,
                    name.as_deref(),
                    description.as_deref(),
                ),
                WorkspaceCommands::Delete { id, force } => {
                    commands::workspace::delete(&mut client, id, force)
                }
                WorkspaceCommands::Invite { id, username } => {
                    commands::workspace::invite(&mut client, id, &username)
                }
                WorkspaceCommands::Kick { id, username } => {
                    commands::workspace::kick(&mut client, id, &username)
                }
                WorkspaceCommands::Role { id, username, role } => {
                    commands::workspace::role(&mut client, id, &username, &role)
                }
                WorkspaceCommands::Labels { id } => commands::workspace::labels(&mut client, id),
                WorkspaceCommands::AddLabel { id, text, color } => {
                    commands::workspace::add_label(&mut client, id, &text, &color)
                }
                WorkspaceCommands::EditLabel {
                    id,
                    label,
                    text,
                    color,
                } => commands::workspace::edit_label(
                    &mut client,
                    id,
                    label,
                    text.as_deref(),
                    color.as_deref(),
                ),
                WorkspaceCommands::RemoveLabel { label } => {
                    commands::workspace::remove_label(&mut client, label)
                }
            }
        }

        Commands::Project { action } => {
            let mut client = get_client(cli.server.as_deref())?;
            match action {
                ProjectCommands::Show { id } => commands::project::show(&mut client, id),
                ProjectCommands::Create {
                    workspace,
                    name,
                    description,
                    goal,
                } => commands::project::create(
                    &mut client,
                    workspace,
                    &name,
                    description.as_deref(),
                    goal.as_deref(),
                ),
                ProjectCommands::Update {
                    id,
                    name,
                    description,
                    goal,
                } => commands::project::update(
                    &mut client,
                    id,
                    name.as_deref(),
                    description.as_deref(),
                    goal.as_deref(),
                ),
                ProjectCommands::Delete { id, force } => {
                    commands::project::delete(&mut client, id, force)
                }
            }
        }

        Commands::Task { action } => {
            let mut client = get_client(cli.server.as_deref())?;
            match action {
                TaskCommands::Create {
                    project,
                    title,
                    description,
                    status,
                    assignees,
                    label,
                } => commands::task::create(
                    &mut client,
                    project,
                    &title,
                    description.as_deref(),
                    status.as_deref(),
                    assignees,
                    label,
                ),
                TaskCommands::Update {
                    id,
                    title,
                    description,
                    label,
                    assignees,
                } => commands::task::update(
                    &mut client,
                    id,
                    title.as_deref(),
                    description.as_deref(),
                    label,
                    assignees,
                ),
                TaskCommands::Delete { id, force } => {
                    commands::task::delete(&mut client, id, force)
                }
                TaskCommands::Archive { id } => commands::task::archive(&mut client, id),
                TaskCommands::Unarchive { id } => commands::task::unarchive(&mut client, id),
            }
        }

        Commands::Board { project } => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::board::show(&mut client, project)
        }

        Commands::Move {
            task,
            project,
            to,
            onto,
        } => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::board::move_task(&mut client, project, task, to.as_deref(), onto)
        }

        Commands::Archived {
            project,
            page,
            limit,
        } => {
            let mut client = get_client(cli.server.as_deref())?;
            commands::task::archived(&mut client, project, page, limit)
        }
    }
}
