//! notebell entry point.

use notebell_client::config::ClientConfig;
use notebell_client::scheduler::SchedulerConfig;
use notebell_client::telemetry::init_tracing;
use notebell_client::{ClientError, NotesApp, Permission, SystemClock};
use notebell_core::format_wire;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run the reminder scheduler until Ctrl-C.
    Watch,
    /// Print the collection, optionally filtered.
    List { query: String },
}

fn parse_command(args: impl IntoIterator<Item = String>) -> Result<Command, ClientError> {
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
            continue;
        }
        positional.push(arg);
    }

    let mut positional = positional.into_iter();
    match positional.next().as_deref() {
        None => Ok(Command::Watch),
        Some("watch") => match positional.next() {
            None => Ok(Command::Watch),
            Some(extra) => Err(ClientError::Usage(format!(
                "unexpected argument '{extra}' for watch"
            ))),
        },
        Some("list") => Ok(Command::List {
            query: positional.collect::<Vec<_>>().join(" "),
        }),
        Some(other) => Err(ClientError::Usage(format!("unknown command '{other}'"))),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    run().await?;
    Ok(())
}

async fn run() -> Result<(), ClientError> {
    let command = parse_command(std::env::args().skip(1))?;
    let config = ClientConfig::load()?;
    init_tracing(&config.logging)?;

    let mut app = NotesApp::from_config(&config)?;
    match command {
        Command::Watch => run_watch(&mut app, &config).await,
        Command::List { query } => run_list(&mut app, query).await,
    }
}

async fn run_watch(app: &mut NotesApp, config: &ClientConfig) -> Result<(), ClientError> {
    if let Err(err) = app.load().await {
        tracing::error!(error = %err, "Initial load failed; watching an empty collection");
    }

    if app.request_notification_permission() != Permission::Granted {
        tracing::warn!("Notifications are not permitted; reminders will not fire");
    }

    let handle = app.spawn_scheduler(
        Arc::new(SystemClock),
        SchedulerConfig::from_config(&config.reminders),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    let metrics = handle.shutdown().await?;
    tracing::info!(
        scans = metrics.scans,
        delivered = metrics.delivered,
        failed = metrics.failed,
        "Scheduler metrics"
    );
    Ok(())
}

async fn run_list(app: &mut NotesApp, query: String) -> Result<(), ClientError> {
    app.load().await?;
    app.set_search_query(query);
    for note in app.visible_notes().await {
        let reminder = note
            .reminder_at
            .as_ref()
            .map(format_wire)
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}\t{}", note.id, note.title, reminder, note.content);
    }
    Ok(())
}
