//! `mailsweep` - scheduled mailbox retention purge
//!
//! Manages an ordered list of retention rules and runs the resumable purge
//! engine over them. The `run` subcommand is the scheduler's entry point:
//! invoke it from cron or a systemd timer on a fixed cadence and each
//! invocation processes one bounded batch of rules, resuming where the last
//! one stopped.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsweep_core::purge::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_SEARCH_PAGE_SIZE};
use mailsweep_core::{
    BatchOrchestrator, CheckpointManager, CheckpointRepository, MemoryMessageStore, PassOutcome,
    PurgeConfig, PurgeReport, RuleDraft, RuleRepository, SystemClock,
};

#[derive(Parser)]
#[command(name = "mailsweep")]
#[command(about = "Scheduled mailbox retention purge", version)]
struct Cli {
    /// Rules and checkpoint database (defaults to the platform data dir)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage retention rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Inspect or reset the purge checkpoint
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },
    /// Run one purge invocation against a mailbox snapshot
    Run {
        /// Mailbox snapshot file (JSON); rewritten with trashed state
        #[arg(long)]
        mailbox: PathBuf,

        /// Rule rows processed this invocation
        #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
        batch_size: u32,

        /// Threads searched per rule
        #[arg(long, default_value_t = DEFAULT_SEARCH_PAGE_SIZE)]
        page_size: u32,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Add a rule at the end of the list
    Add {
        /// Free-text description
        #[arg(long)]
        notes: String,

        /// Mail label the rule applies to
        #[arg(long)]
        label: String,

        /// Retention period in days
        #[arg(long)]
        days: u32,

        /// Keep starred messages
        #[arg(long)]
        keep_starred: bool,

        /// Keep important threads
        #[arg(long)]
        keep_important: bool,
    },
    /// List rules in store order
    List,
    /// Remove the rule at the given 1-based row
    Remove {
        /// Row to remove
        #[arg(long)]
        row: u32,
    },
}

#[derive(Subcommand)]
enum CheckpointCommand {
    /// Show where the next invocation resumes
    Show,
    /// Restart the pass from the first row
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsweep=info,mailsweep_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let database = database_path(cli.database)?;

    match cli.command {
        Commands::Rules { command } => rules_command(&database, command).await,
        Commands::Checkpoint { command } => checkpoint_command(&database, command).await,
        Commands::Run {
            mailbox,
            batch_size,
            page_size,
        } => run_command(&database, &mailbox, batch_size, page_size).await,
    }
}

fn database_path(flag: Option<PathBuf>) -> Result<String> {
    let path = match flag {
        Some(path) => path,
        None => {
            let dir = dirs::data_dir()
                .context("no data directory on this platform; pass --database")?
                .join("mailsweep");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            dir.join("mailsweep.db")
        }
    };
    path.to_str()
        .map(ToString::to_string)
        .context("database path is not valid UTF-8")
}

async fn rules_command(database: &str, command: RulesCommand) -> Result<()> {
    let repo = RuleRepository::new(database).await?;

    match command {
        RulesCommand::Add {
            notes,
            label,
            days,
            keep_starred,
            keep_important,
        } => {
            let draft = RuleDraft::new(notes, label, days, keep_starred, keep_important);
            let row = repo.add(&draft).await?;
            println!("Added rule at row {row}");
        }
        RulesCommand::List => {
            let rules = repo.list().await?;
            if rules.is_empty() {
                println!("No rules configured");
                return Ok(());
            }
            println!(
                "{:>4}  {:<24} {:>6} {:>13} {:>15}  notes",
                "row", "label", "days", "keep-starred", "keep-important"
            );
            for rule in rules {
                println!(
                    "{:>4}  {:<24} {:>6} {:>13} {:>15}  {}",
                    rule.row,
                    rule.label,
                    rule.retention_period_days,
                    rule.leave_starred,
                    rule.leave_important,
                    rule.notes,
                );
            }
        }
        RulesCommand::Remove { row } => {
            if repo.remove(row).await? {
                println!("Removed rule at row {row}");
            } else {
                println!("No rule at row {row}");
            }
        }
    }

    Ok(())
}

async fn checkpoint_command(database: &str, command: CheckpointCommand) -> Result<()> {
    let manager = CheckpointManager::new(CheckpointRepository::new(database).await?);

    match command {
        CheckpointCommand::Show => {
            let row = manager.cursor().await?;
            println!("Next invocation starts at row {row}");
        }
        CheckpointCommand::Reset => {
            manager.reset().await?;
            println!("Checkpoint reset; next invocation starts a fresh pass");
        }
    }

    Ok(())
}

async fn run_command(
    database: &str,
    mailbox_path: &std::path::Path,
    batch_size: u32,
    page_size: u32,
) -> Result<()> {
    let rules = RuleRepository::new(database).await?;
    let checkpoint = CheckpointRepository::new(database).await?;

    let threads = snapshot::load(mailbox_path)?;
    info!(
        threads = threads.len(),
        mailbox = %mailbox_path.display(),
        "loaded mailbox snapshot"
    );
    let mailbox = MemoryMessageStore::from_threads(threads);

    let orchestrator = BatchOrchestrator::with_config(
        rules,
        checkpoint,
        mailbox.clone(),
        SystemClock,
        PurgeConfig {
            max_batch_size: batch_size,
            search_page_size: page_size,
        },
    );

    let report = orchestrator.run_once().await?;
    snapshot::save(mailbox_path, &mailbox.snapshot())?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &PurgeReport) {
    println!(
        "Processed {} rule(s) ({} skipped), scanned {} thread(s), trashed {} message(s)",
        report.rules_processed,
        report.rules_skipped,
        report.threads_scanned,
        report.messages_deleted,
    );
    match report.outcome {
        PassOutcome::Completed => println!("Pass complete; next run starts from the first row"),
        PassOutcome::Partial { resume_row } => {
            println!("Pass in progress; next run resumes at row {resume_row}");
        }
    }
}
