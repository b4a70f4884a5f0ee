use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jobtrack::api::{Endpoints, HttpRecordStore, RecordStore};
use jobtrack::app::App;
use jobtrack::calendar::{calendar_events, events_by_day, Month};
use jobtrack::config::{AppDirs, Config, API_URL_ENV};
use jobtrack::filter::{derive_view, SortConfig, SortDirection, SortKey, ViewQuery};
use jobtrack::models::JobApplication;
use jobtrack::report::{applications_over_time, status_summary};
use jobtrack::theme::ThemePreference;
use jobtrack::{logging, tui};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job applications - dashboard, calendar and reports over a jobtracker backend")]
struct Cli {
    /// Backend base URL (overrides config file and JOBTRACK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Tui,

    /// List applications
    List {
        /// Case-insensitive filter on position, company or location
        #[arg(short, long)]
        search: Option<String>,

        /// Sort column (jobPosition, company, location, status, dateSaved)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Show counts by status and applications per month
    Report,

    /// Show applications sent in a month
    Calendar {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dirs = AppDirs::discover();
    let config = Config::resolve(
        &dirs.config_file(),
        std::env::var(API_URL_ENV).ok(),
        cli.api_url.as_deref(),
    )?;
    let endpoints = Endpoints::new(&config.api_base_url);
    let store = HttpRecordStore::new(endpoints.clone());
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            logging::init_file(&dirs.log_file(), &config.log_level)?;
            tracing::info!(api = %config.api_base_url, "starting jobtrack");
            let theme = ThemePreference::load(&dirs.theme_file());
            let mut app = App::new(Arc::new(store), endpoints, theme, runtime.handle().clone());
            tui::run(&mut app)?;
        }

        Commands::List { search, sort, desc } => {
            logging::init_stderr(&config.log_level)?;
            let sort = match sort {
                Some(key) => {
                    let key = key.parse::<SortKey>().map_err(|e| anyhow!(e))?;
                    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                    SortConfig::new(key, direction)
                }
                None => SortConfig::default(),
            };
            let query = ViewQuery {
                search_term: search.unwrap_or_default(),
                sort,
            };
            let jobs = fetch(&runtime, &store)?;
            let view = derive_view(&jobs, &query);
            if view.is_empty() {
                println!("No job applications found.");
            } else {
                println!(
                    "{:<6} {:<28} {:<20} {:<16} {:<13} {:<10}",
                    "ID", "POSITION", "COMPANY", "LOCATION", "STATUS", "SAVED"
                );
                println!("{}", "-".repeat(98));
                for job in view {
                    println!(
                        "{:<6} {:<28} {:<20} {:<16} {:<13} {:<10}",
                        job.id.map(|id| id.to_string()).unwrap_or_default(),
                        truncate(&job.job_position, 26),
                        truncate(&job.company, 18),
                        truncate(job.location.as_deref().unwrap_or(""), 14),
                        job.status,
                        job.saved_at()
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }

        Commands::Report => {
            logging::init_stderr(&config.log_level)?;
            let jobs = fetch(&runtime, &store)?;
            println!("Applications by status ({} total):", jobs.len());
            for (status, count) in status_summary(&jobs) {
                println!("  {:<13} {:>4}", status, count);
            }
            let months = applications_over_time(&jobs);
            if !months.is_empty() {
                println!("\nApplications over time (by date saved):");
                for bucket in months {
                    println!("  {}  {:>4}  {}", bucket.name, bucket.count, "#".repeat(bucket.count));
                }
            }
        }

        Commands::Calendar { month } => {
            logging::init_stderr(&config.log_level)?;
            let month = match month {
                Some(raw) => Month::parse(&raw)?,
                None => Month::containing(chrono::Local::now().date_naive()),
            };
            let jobs = fetch(&runtime, &store)?;
            let events = calendar_events(&jobs);
            let by_day = events_by_day(&events, month);
            println!("{}", month.label());
            if by_day.is_empty() {
                println!("  No applications sent this month.");
            }
            for (day, day_events) in by_day {
                for event in day_events {
                    println!("  {:>2}  {}", day, event.title);
                }
            }
        }
    }

    Ok(())
}

fn fetch(runtime: &tokio::runtime::Runtime, store: &HttpRecordStore) -> Result<Vec<JobApplication>> {
    runtime
        .block_on(store.list_jobs())
        .with_context(|| format!("Failed to fetch applications from {}", store.endpoints().base()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let short: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", short)
    }
}
