//! dotask: personal task tracker on the command line
//!
//! Signs in against a DoTask server, then lists, creates, completes, edits
//! and deletes tasks through the task manager.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dotask_client::{AuthScheme, ClientConfig};
use dotask_core::task::TaskPriority;

mod commands;
mod render;

/// Personal task tracker
#[derive(Parser)]
#[command(name = "dotask")]
#[command(about = "Track personal tasks against a DoTask server", long_about = None)]
#[command(version)]
struct Cli {
    /// Server origin, e.g. http://localhost:8080
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// How requests identify the user (bearer, user-id)
    #[arg(long, global = true)]
    auth_scheme: Option<AuthScheme>,

    /// Directory holding the saved session
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and save the session
    Login {
        /// Username or email address
        username_or_email: String,

        #[arg(long, env = "DOTASK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in as it
    Register {
        username: String,

        email: String,

        #[arg(long, env = "DOTASK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Must match --password
        #[arg(long)]
        confirm_password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List tasks
    List {
        /// all, recent, completed, pending, high, medium or low
        #[arg(long, default_value = "all")]
        filter: String,

        /// Case-insensitive match on title or description
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Create a task
    Add {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: TaskPriority,

        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,
    },

    /// Mark a task as complete
    Complete { id: i64 },

    /// Change a task's fields; anything not given is left as is
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,

        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Move a completed task back to pending
        #[arg(long)]
        reopen: bool,
    },

    /// Delete a task
    Delete { id: i64 },

    /// Show dashboard counts
    Stats,

    /// Print dashboard counts every period until Ctrl-C
    Watch {
        /// Seconds between refreshes (defaults to DOTASK_REFRESH_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn parse_priority(raw: &str) -> std::result::Result<TaskPriority, String> {
    raw.parse().map_err(|e: dotask_core::Error| e.to_string())
}

fn parse_due(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date like 2024-05-03, got {}", raw))
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Invalid DOTASK_* environment")?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(scheme) = cli.auth_scheme {
        config = config.with_auth_scheme(scheme);
    }
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dotask=info,dotask_client=warn,dotask_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!("Using server {} ({})", config.base_url, config.auth_scheme);

    let app = commands::App::open(config).await?;

    match cli.command {
        Command::Login {
            username_or_email,
            password,
        } => app.login(&username_or_email, &password).await,
        Command::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            app.register(username, email, password, confirm_password)
                .await
        }
        Command::Logout => app.logout().await,
        Command::Whoami => app.whoami().await,
        Command::List { filter, search } => app.list(&filter, &search).await,
        Command::Add {
            title,
            description,
            priority,
            due,
        } => app.add(title, description, priority, due).await,
        Command::Complete { id } => app.complete(id).await,
        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
            clear_due,
            reopen,
        } => {
            let edit = commands::Edit {
                title,
                description,
                priority,
                due: if clear_due { Some(None) } else { due.map(Some) },
                reopen,
            };
            app.edit(id, edit).await
        }
        Command::Delete { id } => app.delete(id).await,
        Command::Stats => app.stats().await,
        Command::Watch { interval } => {
            let period = interval.map(|secs| Duration::from_secs(secs.max(1)));
            app.watch(period).await
        }
    }
}
