use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::cli::error::{resolve_task_id, user_error, validate_non_empty};
use crate::cli::output::{
    format_due_notification, format_filter_bar, format_reminder_warning, format_task_line,
    format_task_list_table, format_task_summary, get_terminal_width, is_tty,
};
use crate::config::{Config, ParserStrategy, RemindersBackend};
use crate::db::DbConnection;
use crate::models::TaskFilter;
use crate::parser::{
    CommandExtractionService, DateDetector, LocalExtractor, NaturalLanguageParser,
    RemoteTaskExtractor, TaskExtractor,
};
use crate::pipeline::TaskIngestionPipeline;
use crate::reminder::{LedgerNotificationCenter, NoopScheduler, NotificationScheduler, ReminderScheduler};
use crate::store::TaskStore;
use crate::widget::StampWidgetCenter;

#[derive(Parser)]
#[command(name = "taskify")]
#[command(about = "Taskify - turn free-form text into tasks with reminders")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add tasks from free-form text (e.g., "Buy milk tomorrow at 6pm #errands")
    Add {
        /// Text to turn into tasks
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        text: Vec<String>,
    },
    /// List tasks
    List {
        /// Filter: all, upcoming, completed, today, quick-tics
        #[arg(long, short)]
        filter: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show a task in detail
    Show {
        /// Task ID (or unique prefix)
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done (drops its reminder)
    Done {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Mark a done task open again
    Reopen {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Toggle a task between open and done
    Toggle {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Toggle the quick tic flag
    Quick {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Change the title of a task
    Edit {
        /// Task ID (or unique prefix)
        id: String,
        /// New title
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        title: Vec<String>,
    },
    /// Set or clear the reminder of a task (e.g., "remind 3f2a tomorrow 9am")
    Remind {
        /// Task ID (or unique prefix)
        id: String,
        /// When to remind (date/time phrase)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        when: Vec<String>,
        /// Remove the reminder instead
        #[arg(long, conflicts_with = "when")]
        clear: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Deliver reminders that are due
    Notify {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| user_error(format!("{:#}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(handle_command(cli, config))
}

/// Everything a command needs, wired from configuration
struct App {
    config: Config,
    pipeline: TaskIngestionPipeline,
    ledger: Option<Arc<LedgerNotificationCenter>>,
}

fn open_app(config: Config) -> Result<App> {
    let conn = DbConnection::connect(&config.data_location)?;
    let widgets = Arc::new(StampWidgetCenter::new(config.widget_dir()));
    let store = TaskStore::new(conn, widgets);

    let extractor: Arc<dyn TaskExtractor> = match config.parser_strategy {
        ParserStrategy::Local => Arc::new(LocalExtractor::new(DateDetector::new(config.default_hour))),
        ParserStrategy::Remote => {
            let service = config
                .parser_command
                .as_deref()
                .and_then(|command| CommandExtractionService::from_command_line(command, config.parser_timeout))
                .ok_or_else(|| user_error("parser.strategy=remote requires parser.command in the rc file"))?;
            Arc::new(RemoteTaskExtractor::new(service))
        }
    };

    let mut ledger = None;
    let scheduler: Arc<dyn ReminderScheduler> = match config.reminders_backend {
        RemindersBackend::Notifications => {
            let center = Arc::new(LedgerNotificationCenter::new(
                DbConnection::connect(&config.data_location)?,
                config.notifications_permitted,
            ));
            ledger = Some(center.clone());
            Arc::new(NotificationScheduler::new(center))
        }
        RemindersBackend::None => Arc::new(NoopScheduler),
    };

    Ok(App {
        pipeline: TaskIngestionPipeline::new(store, extractor, scheduler),
        ledger,
        config,
    })
}

async fn handle_command(cli: Cli, config: Config) -> Result<()> {
    let app = open_app(config)?;
    match cli.command {
        Commands::Add { text } => handle_task_add(&app, text.join(" ")).await,
        Commands::List { filter, json } => handle_task_list(&app, filter, json).await,
        Commands::Show { id, json } => handle_task_show(&app, &id, json).await,
        Commands::Done { id } => handle_task_set_done(&app, &id, Some(true)).await,
        Commands::Reopen { id } => handle_task_set_done(&app, &id, Some(false)).await,
        Commands::Toggle { id } => handle_task_set_done(&app, &id, None).await,
        Commands::Quick { id } => handle_task_quick(&app, &id).await,
        Commands::Edit { id, title } => handle_task_edit(&app, &id, title.join(" ")).await,
        Commands::Remind { id, when, clear } => handle_task_remind(&app, &id, when.join(" "), clear).await,
        Commands::Delete { id } => handle_task_delete(&app, &id).await,
        Commands::Notify { json } => handle_notify(&app, json).await,
    }
}

async fn resolve(app: &App, spec: &str) -> Result<uuid::Uuid> {
    let tasks = app.pipeline.tasks().await;
    resolve_task_id(&tasks, spec).map_err(user_error)
}

async fn handle_task_add(app: &App, text: String) -> Result<()> {
    let ingestion = app.pipeline.submit(&text).await?;
    let now = Local::now();
    for task in &ingestion.created {
        println!("Created task {}", format_task_line(task, &now));
    }
    for warning in &ingestion.warnings {
        eprintln!("{}", format_reminder_warning(warning));
    }
    Ok(())
}

async fn handle_task_list(app: &App, filter: Option<String>, json: bool) -> Result<()> {
    let active = match filter {
        Some(name) => TaskFilter::from_str(&name).ok_or_else(|| {
            user_error(format!(
                "Unknown filter: '{}'. Valid filters: all, upcoming, completed, today, quick-tics",
                name
            ))
        })?,
        None => app.config.filters.primary(),
    };

    app.pipeline.reconcile_reminders().await;
    let tasks = app.pipeline.tasks().await;
    let now = Local::now();
    let visible = active.apply(&tasks, &now);

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    let tty = is_tty();
    println!("{}", format_filter_bar(&app.config.filters, active));
    println!();
    print!("{}", format_task_list_table(&visible, &now, get_terminal_width(), tty));
    Ok(())
}

async fn handle_task_show(app: &App, spec: &str, json: bool) -> Result<()> {
    let id = resolve(app, spec).await?;
    let tasks = app.pipeline.tasks().await;
    let task = tasks
        .iter()
        .find(|task| task.id == id)
        .ok_or_else(|| user_error(format!("Task {} not found", spec)))?;
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        print!("{}", format_task_summary(task, &Local::now()));
    }
    Ok(())
}

async fn handle_task_set_done(app: &App, spec: &str, done: Option<bool>) -> Result<()> {
    let id = resolve(app, spec).await?;
    let task = match done {
        Some(done) => app.pipeline.set_done(id, done).await?,
        None => app.pipeline.toggle_done(id).await?,
    };
    let state = if task.is_done() { "Completed" } else { "Reopened" };
    println!("{} task {}: {}", state, task.short_id(), task.title);
    Ok(())
}

async fn handle_task_quick(app: &App, spec: &str) -> Result<()> {
    let id = resolve(app, spec).await?;
    let task = app.pipeline.toggle_quick_tic(id).await?;
    if task.is_quick_tic {
        println!("Marked task {} as a quick tic", task.short_id());
    } else {
        println!("Task {} is no longer a quick tic", task.short_id());
    }
    Ok(())
}

async fn handle_task_edit(app: &App, spec: &str, title: String) -> Result<()> {
    validate_non_empty(&title, "Title").map_err(user_error)?;
    let id = resolve(app, spec).await?;
    let renamed = app.pipeline.rename(id, &title).await?;
    println!("Renamed task {}", format_task_line(&renamed.task, &Local::now()));
    if let Some(error) = renamed.warning {
        eprintln!("Warning: reminder saved without a notification: {}", error);
    }
    Ok(())
}

async fn handle_task_remind(app: &App, spec: &str, when: String, clear: bool) -> Result<()> {
    let id = resolve(app, spec).await?;
    if clear {
        let task = app.pipeline.clear_reminder(id).await?;
        println!("Cleared reminder of task {}", task.short_id());
        return Ok(());
    }

    validate_non_empty(&when, "Reminder time").map_err(user_error)?;
    let now = Local::now();
    let at = NaturalLanguageParser::new(now)
        .with_detector(DateDetector::new(app.config.default_hour))
        .parse_instant(&when)
        .ok_or_else(|| user_error(format!("Could not understand '{}' as a date or time", when)))?;

    let scheduled = app.pipeline.set_reminder(id, at).await?;
    println!("Reminder set for task {}", format_task_line(&scheduled.task, &now));
    if let Some(error) = scheduled.warning {
        eprintln!("Warning: reminder saved without a notification: {}", error);
    }
    Ok(())
}

async fn handle_task_delete(app: &App, spec: &str) -> Result<()> {
    let id = resolve(app, spec).await?;
    let task = app.pipeline.delete(id).await?;
    println!("Deleted task {}: {}", task.short_id(), task.title);
    Ok(())
}

async fn handle_notify(app: &App, json: bool) -> Result<()> {
    let Some(ledger) = &app.ledger else {
        if !json {
            println!("Reminders are disabled (reminders.backend=none).");
        } else {
            println!("[]");
        }
        return Ok(());
    };

    let due = ledger
        .take_due(Utc::now())
        .context("Failed to read due notifications")?;
    app.pipeline.reconcile_reminders().await;

    if json {
        let items: Vec<serde_json::Value> = due
            .iter()
            .map(|n| {
                serde_json::json!({
                    "handle": n.handle.as_str(),
                    "taskId": n.task_id,
                    "fireAt": n.fire_at,
                    "title": n.title,
                    "body": n.body,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if due.is_empty() {
        println!("No reminders due.");
    } else {
        for notification in &due {
            println!("{}", format_due_notification(notification));
        }
    }
    Ok(())
}
