//! Command-line front end for the housekeeping task list.
//!
//! Wires configuration, logging and the HTTP gateway into a task list
//! session. Logs go to stderr, results to stdout.

mod output;

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hk_core::config::{GatewayConfig, SyncConfig};
use hk_core::gateway::{HttpTaskGateway, TaskGateway};
use hk_core::sync::{DateRange, FilterPatch, SortKey, TaskListSession};
use hk_core::task::{FinalizeRequest, MutationIntent, Priority, TaskId, UserRef};

#[derive(Debug, Parser)]
#[command(name = "hk", version, about = "Housekeeping task list")]
struct Cli {
    /// Base URL of the task service
    #[arg(long, env = "HK_API_URL")]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "HK_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "HK_PER_PAGE")]
    per_page: Option<u32>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List one page of tasks
    List(ListArgs),
    /// Show a single task
    Show { id: TaskId },
    /// Mark a task clean
    Finalize {
        id: TaskId,
        /// Finish time, RFC 3339. Defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a task dirty again
    Reopen { id: TaskId },
    /// Assign a task to a user
    Assign {
        id: TaskId,
        #[arg(long)]
        user_id: u64,
        #[arg(long)]
        user_name: String,
    },
    /// Remove the assignee of a task
    Unassign { id: TaskId },
    /// Set or clear the priority
    Priority {
        id: TaskId,
        /// low, medium, high or urgent. Omit to clear.
        priority: Option<Priority>,
    },
    /// Set or clear the notes
    Notes { id: TaskId, text: Option<String> },
    /// Move the start time
    Reschedule { id: TaskId, at: DateTime<Utc> },
    /// Delete a task
    Delete { id: TaskId },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    priority: Option<Priority>,
    /// Only tasks that are not finished
    #[arg(long)]
    pending: bool,
    #[arg(long)]
    room: Option<u64>,
    #[arg(long)]
    status_id: Option<u64>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Sort column
    #[arg(long)]
    sort: Option<SortKey>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hk=info,hk_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut gateway_config = GatewayConfig::from_env();
    if let Some(url) = cli.api_url.clone() {
        gateway_config.base_url = url;
    }
    if let Some(token) = cli.token.clone() {
        gateway_config.token = Some(token);
    }
    let mut sync_config = SyncConfig::from_env();
    if let Some(per_page) = cli.per_page {
        sync_config.per_page = per_page.max(1);
    }
    tracing::debug!(base_url = %gateway_config.base_url, "Using task service");

    let gateway: Arc<dyn TaskGateway> = Arc::new(HttpTaskGateway::new(gateway_config));
    let session = TaskListSession::new(Arc::clone(&gateway), sync_config);

    let result = run(&cli, &session, gateway.as_ref()).await;
    session.close();
    result
}

async fn run(cli: &Cli, session: &TaskListSession, gateway: &dyn TaskGateway) -> anyhow::Result<()> {
    match &cli.command {
        Command::List(args) => {
            let patch = FilterPatch::default()
                .priority(args.priority)
                .pending_only(args.pending)
                .room_id(args.room)
                .status_id(args.status_id)
                .date_range(DateRange::new(args.from, args.to));
            session
                .set_filter(patch)
                .await
                .context("Failed to load tasks")?;
            if args.page != 1 && session.goto_page(args.page).await?.is_none() {
                bail!("Page {} is out of range", args.page);
            }
            if let Some(key) = args.sort {
                session.set_sort(key);
                if args.desc {
                    session.set_sort(key);
                }
            }
            output::print_view(&session.view(), cli.json)?;
        }
        Command::Show { id } => {
            let task = gateway.get(*id).await.context("Failed to load task")?;
            output::print_task(&task, cli.json)?;
        }
        Command::Delete { id } => {
            session.refresh().await?;
            session.delete(*id).await.context("Failed to delete task")?;
            println!("Deleted task {id}");
        }
        Command::Finalize { id, at, notes } => {
            let mut request = FinalizeRequest::new((*at).unwrap_or_else(Utc::now));
            if let Some(notes) = notes {
                request = request.with_notes(notes.clone());
            }
            mutate(session, *id, MutationIntent::Finalize(request), cli.json).await?;
        }
        Command::Reopen { id } => {
            mutate(session, *id, MutationIntent::Reopen, cli.json).await?;
        }
        Command::Assign {
            id,
            user_id,
            user_name,
        } => {
            let user = UserRef {
                id: *user_id,
                name: user_name.clone(),
            };
            mutate(session, *id, MutationIntent::AssignTo(Some(user)), cli.json).await?;
        }
        Command::Unassign { id } => {
            mutate(session, *id, MutationIntent::AssignTo(None), cli.json).await?;
        }
        Command::Priority { id, priority } => {
            mutate(session, *id, MutationIntent::SetPriority(*priority), cli.json).await?;
        }
        Command::Notes { id, text } => {
            mutate(session, *id, MutationIntent::SetNotes(text.clone()), cli.json).await?;
        }
        Command::Reschedule { id, at } => {
            mutate(session, *id, MutationIntent::Reschedule(*at), cli.json).await?;
        }
    }
    Ok(())
}

async fn mutate(
    session: &TaskListSession,
    id: TaskId,
    intent: MutationIntent,
    json: bool,
) -> anyhow::Result<()> {
    let label = intent.name();
    session.refresh().await.context("Failed to load tasks")?;
    let task = session
        .update(id, intent)
        .await
        .with_context(|| format!("Failed to {label} task {id}"))?;
    output::print_task(&task, json)
}
