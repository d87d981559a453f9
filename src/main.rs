//! Operator command line for the subscription lifecycle engine.
//!
//! Every command builds the same object graph from `AppConfig`: the
//! repository backend is PostgreSQL when a database is configured, else the
//! YAML state file, else an in-memory store that lives for one invocation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use subscription_lifecycle::adapters::{
    postgres, FileSubscriptionRepository, FixedClock, InMemorySubscriptionRepository,
    LogNotificationDispatcher, PostgresSubscriptionRepository, SystemClock,
};
use subscription_lifecycle::application::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, AdminHandler, BillingEvent,
    BillingEventCommand, BillingEventHandler, ExpiryBatchJob, JobScheduler,
    NotificationBatchJob, RunMode, SweepOptions,
};
use subscription_lifecycle::config::{AppConfig, ConfigError, ValidationError};
use subscription_lifecycle::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use subscription_lifecycle::domain::subscription::{BillingInterval, Scenario, SubscriptionError};
use subscription_lifecycle::ports::{Clock, SubscriptionRepository};

/// Subscription lifecycle engine - billing transitions, expiry and renewal notices
#[derive(Parser)]
#[command(name = "subscription-lifecycle", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// YAML state file, overrides SUBSCRIPTION_LIFECYCLE__STORAGE__STATE_FILE
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate a new subscription
    Create {
        #[arg(long)]
        user: String,
        /// monthly or annual; defaults to the configured interval
        #[arg(long)]
        interval: Option<BillingInterval>,
        #[arg(long)]
        id: Option<SubscriptionId>,
    },

    /// Expire subscriptions whose paid period or grace period has lapsed
    Expire {
        #[arg(long)]
        dry_run: bool,
        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long, value_parser = Timestamp::parse_rfc3339)]
        at: Option<Timestamp>,
    },

    /// Send renewal notices for subscriptions nearing their end date
    Notify {
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_parser = Timestamp::parse_rfc3339)]
        at: Option<Timestamp>,
    },

    /// Force a subscription into a named scenario (test environments only)
    Simulate {
        id: SubscriptionId,
        /// active, expiring-soon, cancelled, cancelled-lapsed, past-due, grace-elapsed, expired
        scenario: Scenario,
    },

    /// Apply a billing event: payment-succeeded, payment-failed, cancel, resume
    Billing { id: SubscriptionId, event: BillingEvent },

    /// Reinitialize a subscription to Active with a fresh period
    Reset { id: SubscriptionId },

    /// Show a subscription and its access evaluation
    Inspect { id: SubscriptionId },

    /// Run both sweeps on their intervals until Ctrl-C
    Run,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Infrastructure(#[from] DomainError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.state_file {
        config.storage.state_file = Some(path);
    }

    init_tracing(&config);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.telemetry.env_filter())
        .with_writer(std::io::stderr);

    if config.telemetry.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_repository(config: &AppConfig) -> Result<Arc<dyn SubscriptionRepository>, CliError> {
    if let Some(database) = &config.database {
        let pool = postgres::connect(database).await?;
        if database.run_migrations {
            postgres::run_migrations(&pool).await?;
        }
        return Ok(Arc::new(PostgresSubscriptionRepository::new(pool)));
    }

    if let Some(path) = &config.storage.state_file {
        tracing::debug!(path = %path.display(), "Using state file");
        return Ok(Arc::new(FileSubscriptionRepository::new(path)));
    }

    tracing::warn!("No database or state file configured; changes last for this run only");
    Ok(Arc::new(InMemorySubscriptionRepository::new()))
}

fn clock_at(at: Option<Timestamp>) -> Arc<dyn Clock> {
    match at {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(SystemClock),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, config: AppConfig) -> Result<(), CliError> {
    config.validate()?;

    let repository = open_repository(&config).await?;
    let engine = config.lifecycle.transition_engine();
    let renewal = config.lifecycle.renewal_scheduler();

    match command {
        Commands::Create { user, interval, id } => {
            let handler = ActivateSubscriptionHandler::new(repository, clock_at(None));
            let state = handler
                .handle(ActivateSubscriptionCommand {
                    subscription_id: id,
                    user_id: UserId::new(user).map_err(SubscriptionError::from)?,
                    billing_interval: interval.unwrap_or(config.lifecycle.default_interval),
                })
                .await?;
            print_json(&state)
        }

        Commands::Expire { dry_run, at } => {
            let now = clock_at(at).now();
            let options = SweepOptions::apply()
                .with_mode(RunMode::from_dry_run(dry_run))
                .with_time_budget(config.scheduler.sweep_deadline());
            let report = ExpiryBatchJob::new(repository, engine).run(now, options).await?;
            print_json(&report)
        }

        Commands::Notify { dry_run, at } => {
            let now = clock_at(at).now();
            let options = SweepOptions::apply()
                .with_mode(RunMode::from_dry_run(dry_run))
                .with_time_budget(config.scheduler.sweep_deadline());
            let report = NotificationBatchJob::new(
                repository,
                Arc::new(LogNotificationDispatcher::new()),
                renewal,
            )
            .with_max_concurrent(config.scheduler.max_concurrent_dispatches)
            .run(now, options)
            .await?;
            print_json(&report)
        }

        Commands::Simulate { id, scenario } => {
            let admin = AdminHandler::new(repository, clock_at(None), engine, renewal);
            print_json(&admin.simulate(&id, scenario).await?)
        }

        Commands::Billing { id, event } => {
            let handler = BillingEventHandler::new(repository, clock_at(None), engine)
                .with_max_attempts(config.lifecycle.max_conflict_attempts);
            let result = handler
                .handle(BillingEventCommand {
                    subscription_id: id,
                    event,
                })
                .await?;
            print_json(&result)
        }

        Commands::Reset { id } => {
            let admin = AdminHandler::new(repository, clock_at(None), engine, renewal);
            print_json(&admin.reset(&id).await?)
        }

        Commands::Inspect { id } => {
            let admin = AdminHandler::new(repository, clock_at(None), engine, renewal);
            print_json(&admin.inspect(&id).await?)
        }

        Commands::Run => {
            let scheduler = JobScheduler::new(
                ExpiryBatchJob::new(repository.clone(), engine),
                NotificationBatchJob::new(
                    repository,
                    Arc::new(LogNotificationDispatcher::new()),
                    renewal,
                )
                .with_max_concurrent(config.scheduler.max_concurrent_dispatches),
                clock_at(None),
                config.scheduler.job_scheduler_config(),
            );

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let signal = async move {
                let result = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown signal received");
                // Stop the scheduler even if the signal listener failed.
                let _ = shutdown_tx.send(true);
                result
            };

            let ((), signal_result) = tokio::join!(scheduler.run(shutdown_rx), signal);
            signal_result?;
            Ok(())
        }
    }
}
