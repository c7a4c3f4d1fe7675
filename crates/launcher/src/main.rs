//! Hearth launcher binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use hearth_core::config::AppConfig;
use hearth_launcher::bootstrap::{self, Foundation};
use hearth_launcher::{DomainOutcome, MigrationReport, TaskExit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hearth - migrates legacy launcher state and starts the launcher
#[derive(Parser, Debug)]
#[command(name = "hearthd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "HEARTH_CONFIG",
        default_value = "config/hearth.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrate legacy state if needed, then start the launcher (default)
    Run,
    /// Migrate legacy state if needed and exit
    Migrate,
    /// Show the migration flag and the last migration report
    Status,
    /// Clear the migration flag so the next run migrates again
    ResetMigration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Hearth v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let foundation = bootstrap::open_foundation(&config).await?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, &foundation).await,
        Command::Migrate => {
            let migrator = bootstrap::migrator(&config, &foundation).await?;
            let report = migrator.run_migration().await?;
            print_report(&report);
            Ok(())
        }
        Command::Status => {
            let migrator = bootstrap::migrator(&config, &foundation).await?;
            let status = migrator.migration_status().await?;
            println!("migration done: {}", status.done);
            match &status.last_report {
                Some(report) => print_report(report),
                None => println!("no migration report"),
            }
            Ok(())
        }
        Command::ResetMigration => {
            let migrator = bootstrap::migrator(&config, &foundation).await?;
            migrator.reset_migration().await?;
            println!("migration reset, the next run migrates the legacy database again");
            Ok(())
        }
    }
}

/// Load configuration from the optional file and `HEARTH_` env vars.
fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {path}, using defaults and environment");
    }

    figment
        .merge(Env::prefixed("HEARTH_").split("__"))
        .extract()
        .context("failed to load configuration")
}

async fn run(config: &AppConfig, foundation: &Foundation) -> Result<()> {
    hearth_launcher::metrics::register_metrics();

    let migrator = bootstrap::migrator(config, foundation).await?;
    let report = migrator
        .run_migration()
        .await
        .context("legacy migration failed")?;
    if !report.was_already_done() {
        print_report(&report);
    }

    let launcher = bootstrap::launcher(config, foundation)?;
    let result = launcher.load_state(&report).await;

    for (task, exit) in launcher.tasks().shutdown().await {
        if exit == TaskExit::Panicked {
            tracing::error!(task, "Detached task panicked during this run");
        }
    }
    match hearth_launcher::metrics::encode_metrics() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    result.context("startup failed")
}

fn print_report(report: &MigrationReport) {
    if report.was_already_done() {
        println!("migration already done");
        return;
    }
    for entry in report.domains() {
        match &entry.outcome {
            DomainOutcome::Migrated { records } => {
                println!("{:<13} migrated ({records} records)", entry.domain)
            }
            DomainOutcome::Skipped => println!("{:<13} skipped", entry.domain),
            DomainOutcome::Failed { error } => println!("{:<13} FAILED: {error}", entry.domain),
        }
    }
}
