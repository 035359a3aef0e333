//! Command-line surface: one subcommand per user operation, plus the
//! long-running `agent` mode hosting the periodic checker and the timer
//! service, controlled from stdin. All behavior lives in the library
//! modules; this file only parses, dispatches, and prints.

use crate::checker::CheckRunner;
use crate::config::AppConfig;
use crate::dashboard;
use crate::db::{self, DbPool};
use crate::errors::{Error, Result};
use crate::models::{Meeting, NewMeeting, Project, ProjectDraft};
use crate::notify::{LogNotifier, Notifier};
use crate::remote::RemoteStore;
use crate::settings;
use crate::timer::{TimerHandle, format_elapsed};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "datagov")]
#[command(about = "Government project watcher and meeting tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the agent: periodic new-project checks plus the timer service,
    /// controlled interactively from stdin
    Agent,
    /// Run one new-project check round immediately
    Check,
    /// Remote project listings
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
    /// List remote project categories
    Categories,
    /// Local meeting records
    Meetings {
        #[command(subcommand)]
        command: MeetingsCommand,
    },
    /// Show the aggregate overview
    Dashboard,
    /// Read or change stored preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
pub enum ProjectsCommand {
    /// List all projects, newest first
    List {
        /// Keep watching and reprint whenever the collection changes
        #[arg(long)]
        watch: bool,
    },
    /// Show one project by id
    Show { id: String },
    /// Create a project in the remote store
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        budget: i64,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
        progress: u8,
        #[arg(long, default_value = "")]
        image_url: String,
    },
}

#[derive(Subcommand)]
pub enum MeetingsCommand {
    /// List all meetings, newest first
    List,
    /// Show one meeting by id
    Show { id: i64 },
    /// Record a new meeting
    Add {
        #[arg(long)]
        title: String,
        /// Date and time in dd/MM/yyyy HH:mm
        #[arg(long)]
        date_time: String,
        #[arg(long)]
        municipality: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value_t = 0)]
        attendees: u32,
    },
    /// Update an existing meeting; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date_time: Option<String>,
        #[arg(long)]
        municipality: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        attendees: Option<u32>,
    },
    /// Delete a meeting by id
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show all stored preferences and state flags
    Show,
    /// Switch the dark-mode preference
    DarkMode {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

fn format_created_at(epoch_millis: i64) -> String {
    DateTime::from_timestamp_millis(epoch_millis)
        .map_or_else(|| "-".to_string(), |dt| dt.format("%d/%m/%Y %H:%M").to_string())
}

fn print_project(project: &Project) {
    println!("{} - {}", project.id, project.name);
    println!("  location:    {}", project.location);
    println!("  category:    {}", if project.category_id.is_empty() {
        "uncategorized"
    } else {
        project.category_id.as_str()
    });
    if !project.description.is_empty() {
        println!("  description: {}", project.description);
    }
    println!("  budget:      {}", project.budget);
    println!("  progress:    {}%", project.progress);
    println!("  created:     {}", format_created_at(project.created_at));
}

fn print_meeting(meeting: &Meeting) {
    println!("#{} {}", meeting.id, meeting.title);
    println!("  when:      {}", meeting.date_time);
    println!("  where:     {}, {}", meeting.specific_location, meeting.municipality);
    println!("  attendees: ~{}", meeting.estimated_attendees);
}

/// Dispatches a parsed command.
///
/// # Errors
///
/// Propagates any library error; the caller prints it once and exits
/// nonzero, with no retries (remote-write and validation failures surface
/// as a single transient message).
pub async fn run(command: Command, config: AppConfig, pool: DbPool) -> Result<()> {
    let remote = RemoteStore::new(&config.remote_base_url);
    match command {
        Command::Agent => run_agent(&config, remote, pool).await,
        Command::Check => {
            let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
            let runner = CheckRunner::new(remote, pool, notifier);
            runner.run_once().await
        }
        Command::Projects { command } => run_projects(command, &remote).await,
        Command::Categories => {
            let categories = remote.list_categories().await?;
            if categories.is_empty() {
                println!("No categories.");
            }
            for category in categories {
                println!("{} - {}", category.id, category.title);
            }
            Ok(())
        }
        Command::Meetings { command } => run_meetings(command, &pool).await,
        Command::Dashboard => {
            let projects = remote.list_projects().await?;
            let categories = remote.list_categories().await?;
            let meeting_count = db::list_meetings(&pool).await?.len();
            let summary = dashboard::summarize(&projects, &categories, meeting_count);
            println!("Projects:   {}", summary.project_count);
            println!("Categories: {}", summary.category_count);
            println!("Meetings:   {}", summary.meeting_count);
            match summary.latest_project {
                Some(latest) => {
                    println!("Latest project:");
                    print_project(&latest);
                }
                None => println!("Latest project: none"),
            }
            Ok(())
        }
        Command::Settings { command } => run_settings(command, &pool).await,
    }
}

async fn run_projects(command: ProjectsCommand, remote: &RemoteStore) -> Result<()> {
    match command {
        ProjectsCommand::List { watch } => {
            let projects = remote.list_projects().await?;
            if projects.is_empty() {
                println!("No projects available.");
            }
            for project in &projects {
                print_project(project);
            }
            if watch {
                watch_projects(remote).await;
            }
            Ok(())
        }
        ProjectsCommand::Show { id } => {
            let project = remote
                .get_project(&id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("project {id}")))?;
            print_project(&project);
            let category = if project.category_id.is_empty() {
                None
            } else {
                remote.get_category(&project.category_id).await?
            };
            match category {
                Some(category) => println!("  category title: {}", category.title),
                // Dangling or absent reference renders as uncategorized.
                None => println!("  category title: uncategorized"),
            }
            Ok(())
        }
        ProjectsCommand::Add {
            name,
            location,
            category,
            description,
            budget,
            progress,
            image_url,
        } => {
            if name.trim().is_empty() {
                return Err(Error::Validation("Project name must not be empty".to_string()));
            }
            if budget < 0 {
                return Err(Error::Validation("Budget must be non-negative".to_string()));
            }
            let draft = ProjectDraft {
                name,
                location,
                category_id: category,
                description,
                budget,
                progress,
                image_url,
            };
            let project = remote.create_project(&draft).await?;
            println!("Created project {}", project.id);
            Ok(())
        }
    }
}

async fn watch_projects(remote: &RemoteStore) {
    println!("Watching for changes (ctrl-c to stop)...");
    let mut rx = remote.watch_projects(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let projects = rx.borrow_and_update().clone();
                println!("--- {} projects ---", projects.len());
                for project in &projects {
                    println!("{} - {} ({})", project.id, project.name, project.location);
                }
            }
        }
    }
}

async fn run_meetings(command: MeetingsCommand, pool: &DbPool) -> Result<()> {
    match command {
        MeetingsCommand::List => {
            let meetings = db::list_meetings(pool).await?;
            if meetings.is_empty() {
                println!("No meetings recorded.");
            }
            for meeting in &meetings {
                print_meeting(meeting);
            }
            Ok(())
        }
        MeetingsCommand::Show { id } => {
            let meeting = db::get_meeting_by_id(pool, id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("meeting {id}")))?;
            print_meeting(&meeting);
            Ok(())
        }
        MeetingsCommand::Add {
            title,
            date_time,
            municipality,
            location,
            attendees,
        } => {
            let new_meeting = NewMeeting {
                title,
                date_time,
                municipality,
                specific_location: location,
                estimated_attendees: attendees,
            };
            let id = db::insert_meeting(pool, &new_meeting).await?;
            println!("Recorded meeting #{id}");
            Ok(())
        }
        MeetingsCommand::Update {
            id,
            title,
            date_time,
            municipality,
            location,
            attendees,
        } => {
            let current = db::get_meeting_by_id(pool, id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("meeting {id}")))?;
            let merged = NewMeeting {
                title: title.unwrap_or(current.title),
                date_time: date_time.unwrap_or(current.date_time),
                municipality: municipality.unwrap_or(current.municipality),
                specific_location: location.unwrap_or(current.specific_location),
                estimated_attendees: attendees.unwrap_or(current.estimated_attendees),
            };
            db::update_meeting(pool, id, &merged).await?;
            println!("Updated meeting #{id}");
            Ok(())
        }
        MeetingsCommand::Delete { id } => {
            db::delete_meeting(pool, id).await?;
            println!("Deleted meeting #{id}");
            Ok(())
        }
    }
}

async fn run_settings(command: SettingsCommand, pool: &DbPool) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!("dark mode:       {}", if settings::is_dark_mode(pool).await? {
                "on"
            } else {
                "off"
            });
            println!(
                "timer flag:      {}",
                if crate::timer::is_flag_running(pool).await? {
                    "running (hint only; reconciled at agent start)"
                } else {
                    "stopped"
                }
            );
            match crate::checker::load_watermark(pool).await? {
                Some(watermark) => println!(
                    "last notified:   {} ({})",
                    watermark.project_id,
                    format_created_at(watermark.created_at)
                ),
                None => println!("last notified:   never"),
            }
            Ok(())
        }
        SettingsCommand::DarkMode { state } => {
            let enabled = matches!(state, Toggle::On);
            settings::set_dark_mode(pool, enabled).await?;
            println!("Dark mode {}", if enabled { "enabled" } else { "disabled" });
            Ok(())
        }
    }
}

/// The long-running agent: schedules periodic checks, hosts the timer
/// service, and maps stdin lines onto timer and checker actions.
async fn run_agent(config: &AppConfig, remote: RemoteStore, pool: DbPool) -> Result<()> {
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let runner = Arc::new(CheckRunner::new(
        remote,
        Arc::clone(&pool),
        Arc::clone(&notifier),
    ));
    let timer = TimerHandle::new(Arc::clone(&pool), Arc::clone(&notifier));

    // The persisted flag is only a hint; correct it against reality before
    // anything reads it.
    let was_running = timer.reconcile_persisted_flag().await?;
    if was_running {
        info!("Timer flag was set from a previous run; now reconciled");
    }

    let scheduler = {
        let runner = Arc::clone(&runner);
        let initial_delay = config.check_initial_delay();
        let interval = config.check_interval();
        tokio::spawn(async move { runner.run_periodic(initial_delay, interval).await })
    };

    // Mirror timer state changes without polling the service directly.
    let mirror = {
        let mut updates = timer.subscribe();
        tokio::spawn(async move {
            while let Ok(update) = updates.recv().await {
                info!(
                    "Timer state: {} ({})",
                    format_elapsed(update.elapsed_seconds),
                    if update.is_running { "running" } else { "not running" }
                );
            }
        })
    };

    println!("datagov agent running.");
    println!("Commands: start | pause | resume | stop | check | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c; shutting down");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "start" => timer.start().await,
                    "pause" => timer.pause().await,
                    "resume" => timer.resume().await,
                    "stop" => timer.stop().await,
                    "check" => {
                        if let Err(e) = runner.run_once().await {
                            warn!("Manual check failed: {}", e);
                        }
                    }
                    "quit" | "exit" => break,
                    "" => {}
                    other => println!("Unknown command: {other}"),
                }
            }
        }
    }

    // Stop the timer so its teardown path persists running=false; give it
    // the stop grace before the process exits (best effort).
    timer.stop().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.abort();
    mirror.abort();
    Ok(())
}
